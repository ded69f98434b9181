use std::sync::Arc;

use uuid::Uuid;

use super::blocking;
use crate::domain::cart::{CartItem, CartLine};
use crate::domain::errors::DomainError;
use crate::domain::ports::CartStore;

#[derive(Clone)]
pub struct CartService {
    store: Arc<dyn CartStore>,
}

impl CartService {
    pub fn new(store: Arc<dyn CartStore>) -> Self {
        Self { store }
    }

    pub async fn items(&self, user_id: Uuid) -> Result<Vec<CartItem>, DomainError> {
        let store = Arc::clone(&self.store);
        blocking(move || store.get(user_id)).await
    }

    pub async fn add(&self, user_id: Uuid, product_id: Option<Uuid>) -> Result<CartLine, DomainError> {
        let product_id =
            product_id.ok_or_else(|| DomainError::InvalidRequest("Provide productId".to_string()))?;
        let store = Arc::clone(&self.store);
        let line = blocking(move || store.add_line(user_id, product_id)).await?;
        log::info!("user {} added product {} to cart", user_id, product_id);
        Ok(line)
    }

    pub async fn set_quantity(
        &self,
        user_id: Uuid,
        line_id: Option<Uuid>,
        quantity: Option<i32>,
    ) -> Result<CartLine, DomainError> {
        let (Some(line_id), Some(quantity)) = (line_id, quantity) else {
            return Err(DomainError::InvalidRequest("Provide _id and qty".to_string()));
        };
        if quantity < 1 {
            return Err(DomainError::InvalidRequest(
                "qty must be at least 1".to_string(),
            ));
        }
        let store = Arc::clone(&self.store);
        blocking(move || store.set_quantity(user_id, line_id, quantity)).await
    }

    pub async fn remove(&self, user_id: Uuid, line_id: Option<Uuid>) -> Result<(), DomainError> {
        let line_id =
            line_id.ok_or_else(|| DomainError::InvalidRequest("Provide _id".to_string()))?;
        let store = Arc::clone(&self.store);
        blocking(move || store.remove_line(user_id, line_id)).await
    }
}
