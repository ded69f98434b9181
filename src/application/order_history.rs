use std::sync::Arc;

use uuid::Uuid;

use super::blocking;
use crate::domain::errors::DomainError;
use crate::domain::order::OrderView;
use crate::domain::ports::OrderStore;

#[derive(Clone)]
pub struct OrderHistoryService {
    orders: Arc<dyn OrderStore>,
}

impl OrderHistoryService {
    pub fn new(orders: Arc<dyn OrderStore>) -> Self {
        Self { orders }
    }

    /// The user's orders, newest first, with delivery addresses attached.
    pub async fn list(&self, user_id: Uuid) -> Result<Vec<OrderView>, DomainError> {
        let orders = Arc::clone(&self.orders);
        blocking(move || orders.list_for_user(user_id)).await
    }
}
