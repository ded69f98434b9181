use uuid::Uuid;

use super::cart::{CartItem, CartLine};
use super::catalog::{Address, Customer, Product};
use super::errors::DomainError;
use super::order::{NewOrder, Order, OrderView};
use super::transaction::{Settlement, SettlementOutcome, TransactionKey, TransactionState};

pub trait CartStore: Send + Sync + 'static {
    fn get(&self, user_id: Uuid) -> Result<Vec<CartItem>, DomainError>;
    /// Rejects a second line for the same product with `Conflict`.
    fn add_line(&self, user_id: Uuid, product_id: Uuid) -> Result<CartLine, DomainError>;
    fn set_quantity(&self, user_id: Uuid, line_id: Uuid, quantity: i32) -> Result<CartLine, DomainError>;
    fn remove_line(&self, user_id: Uuid, line_id: Uuid) -> Result<(), DomainError>;
    fn clear_all(&self, user_id: Uuid) -> Result<usize, DomainError>;
}

pub trait Catalog: Send + Sync + 'static {
    fn find_customer(&self, user_id: Uuid) -> Result<Option<Customer>, DomainError>;
    fn find_address(&self, user_id: Uuid, address_id: Uuid) -> Result<Option<Address>, DomainError>;
    fn find_products(&self, ids: &[Uuid]) -> Result<Vec<Product>, DomainError>;
}

pub trait OrderStore: Send + Sync + 'static {
    fn list_for_user(&self, user_id: Uuid) -> Result<Vec<OrderView>, DomainError>;

    /// Writes the orders and empties the user's cart as one unit. Fails with
    /// `Conflict` when the cart no longer holds every ordered product, which
    /// is what a concurrent checkout of the same cart observes.
    fn commit_cash_on_delivery(
        &self,
        user_id: Uuid,
        checkout_id: Uuid,
        orders: Vec<NewOrder>,
    ) -> Result<Vec<Order>, DomainError>;

    fn transaction_state(&self, key: &TransactionKey) -> Result<Option<TransactionState>, DomainError>;

    /// Insert-if-absent on the transaction key, then orders, dead letters and
    /// cart clearing in the same database transaction.
    fn settle(&self, settlement: Settlement) -> Result<SettlementOutcome, DomainError>;
}
