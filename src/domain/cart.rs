use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::catalog::Product;

/// One unpurchased (user, product) selection. At most one per pair.
#[derive(Debug, Clone)]
pub struct CartLine {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CartItem {
    pub line: CartLine,
    pub product: Product,
}
