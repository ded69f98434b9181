use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Payment provider error: {0}")]
    PaymentProvider(String),
    #[error("Webhook verification failed: {0}")]
    Verification(String),
    #[error("Internal error: {0}")]
    Internal(String),
}
