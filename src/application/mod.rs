pub mod cart_service;
pub mod cash_on_delivery;
pub mod checkout_service;
pub mod order_history;
pub mod reconciler;

use actix_web::web;

use crate::domain::errors::DomainError;

/// Run a blocking store call on the actix blocking pool.
pub(crate) async fn blocking<F, T>(f: F) -> Result<T, DomainError>
where
    F: FnOnce() -> Result<T, DomainError> + Send + 'static,
    T: Send + 'static,
{
    web::block(f)
        .await
        .map_err(|e| DomainError::Internal(e.to_string()))?
}
