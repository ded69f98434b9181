use bigdecimal::BigDecimal;
use uuid::Uuid;

use super::pricing::effective_price;

/// Live catalog entry as seen at checkout time.
#[derive(Debug, Clone)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub images: Vec<String>,
    pub price: BigDecimal,
    pub discount: i32,
    pub stock: Option<i32>,
}

impl Product {
    pub fn effective_price(&self) -> BigDecimal {
        effective_price(&self.price, self.discount)
    }
}

#[derive(Debug, Clone)]
pub struct Customer {
    pub id: Uuid,
    pub email: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct Address {
    pub id: Uuid,
    pub user_id: Uuid,
    pub address_line: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub country: String,
    pub mobile: Option<String>,
}
