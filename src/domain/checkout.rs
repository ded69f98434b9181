use bigdecimal::BigDecimal;
use uuid::Uuid;

use super::catalog::{Address, Customer, Product};

/// A product/quantity pair as submitted by the client.
#[derive(Debug, Clone)]
pub struct LineSelection {
    pub product_id: Uuid,
    pub quantity: i32,
}

/// Raw checkout input. Every field is optional so that validation can report
/// exactly what is missing.
#[derive(Debug, Clone, Default)]
pub struct CheckoutRequest {
    pub lines: Vec<LineSelection>,
    pub address_id: Option<Uuid>,
    pub sub_total: Option<BigDecimal>,
    pub total: Option<BigDecimal>,
}

#[derive(Debug, Clone)]
pub struct CheckoutLine {
    pub product: Product,
    pub quantity: i32,
}

impl CheckoutLine {
    pub fn unit_price(&self) -> BigDecimal {
        self.product.effective_price()
    }

    pub fn sub_total(&self) -> BigDecimal {
        &self.product.price * BigDecimal::from(self.quantity)
    }

    pub fn total(&self) -> BigDecimal {
        self.unit_price() * BigDecimal::from(self.quantity)
    }
}

/// Ephemeral snapshot of cart, address and totals. Never persisted.
#[derive(Debug, Clone)]
pub struct CheckoutIntent {
    pub customer: Customer,
    pub address: Address,
    pub lines: Vec<CheckoutLine>,
    pub sub_total: BigDecimal,
    pub total: BigDecimal,
}

impl CheckoutIntent {
    pub fn user_id(&self) -> Uuid {
        self.customer.id
    }

    pub fn computed_total(&self) -> BigDecimal {
        self.lines
            .iter()
            .fold(BigDecimal::from(0), |acc, line| acc + line.total())
    }
}
