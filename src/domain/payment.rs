//! Provider-agnostic payment gateway contract.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bigdecimal::BigDecimal;

use super::checkout::CheckoutIntent;
use super::errors::DomainError;
use super::transaction::ProviderKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderLink {
    pub href: String,
    pub rel: String,
    pub method: Option<String>,
}

/// What the client needs to continue paying at the provider.
#[derive(Debug, Clone)]
pub struct ProviderSession {
    pub id: String,
    pub url: Option<String>,
    pub links: Vec<ProviderLink>,
}

/// Inbound webhook delivery. Header names are lower-cased.
#[derive(Debug, Clone, Default)]
pub struct WebhookRequest {
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl WebhookRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

#[derive(Debug, Clone)]
pub enum ProviderEvent {
    Completed(PaymentNotice),
    Ignored { event_type: String },
}

/// A recognized completion event, before its line items are resolved.
#[derive(Debug, Clone)]
pub struct PaymentNotice {
    pub transaction_id: String,
    pub event_type: String,
    pub correlation_id: Option<String>,
    pub address_ref: Option<String>,
    pub payment_id: String,
    pub payment_status: String,
    pub resource: serde_json::Value,
}

/// A line item as the provider settled it. Amounts are in major units.
#[derive(Debug, Clone)]
pub struct PaidLine {
    pub product_ref: Option<String>,
    pub name: String,
    pub images: Vec<String>,
    pub quantity: i32,
    pub sub_total: BigDecimal,
    pub total: BigDecimal,
    pub currency: String,
    pub raw: serde_json::Value,
}

impl PaidLine {
    /// An item the provider reported but that could not be read. With no
    /// product reference it is dead-lettered instead of failing the delivery.
    pub fn unreadable(raw: serde_json::Value, currency: &str) -> Self {
        Self {
            product_ref: None,
            name: String::new(),
            images: vec![],
            quantity: 0,
            sub_total: BigDecimal::from(0),
            total: BigDecimal::from(0),
            currency: currency.to_string(),
            raw,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedPayment {
    pub correlation_id: Option<String>,
    pub address_ref: Option<String>,
    pub lines: Vec<PaidLine>,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync + 'static {
    async fn create_session(&self, intent: &CheckoutIntent) -> Result<ProviderSession, DomainError>;

    /// Must succeed before any field of the event body is trusted.
    async fn verify_webhook(&self, webhook: &WebhookRequest) -> Result<(), DomainError>;

    fn parse_event(&self, body: &[u8]) -> Result<ProviderEvent, DomainError>;

    async fn resolve_lines(&self, notice: &PaymentNotice) -> Result<ResolvedPayment, DomainError>;
}

#[derive(Clone)]
pub struct Gateways {
    card: Arc<dyn PaymentGateway>,
    paypal: Arc<dyn PaymentGateway>,
}

impl Gateways {
    pub fn new(card: Arc<dyn PaymentGateway>, paypal: Arc<dyn PaymentGateway>) -> Self {
        Self { card, paypal }
    }

    pub fn get(&self, kind: ProviderKind) -> Arc<dyn PaymentGateway> {
        match kind {
            ProviderKind::Card => Arc::clone(&self.card),
            ProviderKind::PayPal => Arc::clone(&self.paypal),
        }
    }
}
