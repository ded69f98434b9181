use std::fmt;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::catalog::Address;
use super::transaction::ProviderKind;

pub const ORDER_ID_PREFIX: &str = "ORD-";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentStatus {
    Pending,
    CashOnDelivery,
    /// Status string exactly as the provider reported it (`paid`, `APPROVED`, ...).
    Provider(String),
}

impl PaymentStatus {
    pub fn as_str(&self) -> &str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::CashOnDelivery => "CASH_ON_DELIVERY",
            PaymentStatus::Provider(status) => status,
        }
    }

    pub fn from_stored(value: &str) -> Self {
        match value {
            "PENDING" => PaymentStatus::Pending,
            "CASH_ON_DELIVERY" => PaymentStatus::CashOnDelivery,
            other => PaymentStatus::Provider(other.to_string()),
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fresh per-row order identifier, e.g. `ORD-3f2a...`.
pub fn generate_order_id() -> String {
    format!("{}{}", ORDER_ID_PREFIX, Uuid::new_v4().simple())
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_id: String,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub product_images: Vec<String>,
    pub payment_id: String,
    pub payment_status: PaymentStatus,
    pub provider: Option<ProviderKind>,
    pub provider_txn_id: Option<String>,
    pub delivery_address_id: Option<Uuid>,
    pub quantity: i32,
    pub sub_total_amt: BigDecimal,
    pub total_amt: BigDecimal,
    /// ISO 4217 code of both amounts.
    pub currency: String,
}

/// One persisted order row. A purchase of N products yields N rows.
#[derive(Debug, Clone)]
pub struct Order {
    pub id: Uuid,
    pub order_id: String,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub product_images: Vec<String>,
    pub payment_id: String,
    pub payment_status: PaymentStatus,
    pub provider: Option<ProviderKind>,
    pub provider_txn_id: Option<String>,
    pub delivery_address_id: Option<Uuid>,
    pub quantity: i32,
    pub sub_total_amt: BigDecimal,
    pub total_amt: BigDecimal,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct OrderView {
    pub order: Order,
    pub delivery_address: Option<Address>,
}
