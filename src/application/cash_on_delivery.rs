//! Synchronous commit path that needs no payment provider.

use std::sync::Arc;

use bigdecimal::{BigDecimal, Zero};
use uuid::Uuid;

use super::blocking;
use super::checkout_service::build_intent;
use crate::domain::checkout::{CheckoutIntent, CheckoutRequest};
use crate::domain::errors::DomainError;
use crate::domain::order::{generate_order_id, NewOrder, Order, PaymentStatus};
use crate::domain::ports::{Catalog, OrderStore};
use crate::domain::pricing::CATALOG_CURRENCY;

#[derive(Clone)]
pub struct CashOnDeliveryService {
    catalog: Arc<dyn Catalog>,
    orders: Arc<dyn OrderStore>,
}

impl CashOnDeliveryService {
    pub fn new(catalog: Arc<dyn Catalog>, orders: Arc<dyn OrderStore>) -> Self {
        Self { catalog, orders }
    }

    pub async fn place(&self, user_id: Uuid, request: CheckoutRequest) -> Result<Vec<Order>, DomainError> {
        if request.lines.is_empty() {
            return Err(DomainError::InvalidRequest("No items to order".to_string()));
        }
        match (&request.total, &request.address_id) {
            (Some(total), Some(_)) if *total > BigDecimal::zero() => {}
            _ => {
                return Err(DomainError::InvalidRequest(
                    "Total amount and addressId are required".to_string(),
                ))
            }
        }

        let intent = build_intent(&self.catalog, user_id, request).await?;
        let computed = intent.computed_total();
        if computed != intent.total {
            log::warn!(
                "cash-on-delivery total mismatch for user {}: client sent {}, catalog gives {}",
                user_id,
                intent.total,
                computed
            );
        }

        let checkout_id = Uuid::new_v4();
        let drafts = cash_on_delivery_orders(&intent);
        let orders = Arc::clone(&self.orders);
        let created =
            blocking(move || orders.commit_cash_on_delivery(user_id, checkout_id, drafts)).await?;

        log::info!(
            "cash-on-delivery checkout {} committed {} orders for user {}",
            checkout_id,
            created.len(),
            user_id
        );
        Ok(created)
    }
}

/// One order row per line, amounts recomputed from the live catalog.
fn cash_on_delivery_orders(intent: &CheckoutIntent) -> Vec<NewOrder> {
    intent
        .lines
        .iter()
        .map(|line| NewOrder {
            order_id: generate_order_id(),
            user_id: intent.user_id(),
            product_id: line.product.id,
            product_name: line.product.name.clone(),
            product_images: line.product.images.clone(),
            payment_id: String::new(),
            payment_status: PaymentStatus::CashOnDelivery,
            provider: None,
            provider_txn_id: None,
            delivery_address_id: Some(intent.address.id),
            quantity: line.quantity,
            sub_total_amt: line.sub_total(),
            total_amt: line.total(),
            currency: CATALOG_CURRENCY.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::checkout::LineSelection;
    use crate::domain::ports::CartStore;
    use crate::test_utils::{product, MemoryStore};

    struct Fixture {
        store: Arc<MemoryStore>,
        user: Uuid,
        address: Uuid,
        products: Vec<Uuid>,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::default());
        let user = store.add_customer("cod@example.com");
        let address = store.add_address(user, "India");
        let products = vec![
            store.add_product(product("Milk", "60", 0)),
            store.add_product(product("Eggs", "99", 10)),
        ];
        for p in &products {
            store.add_line(user, *p).expect("cart line");
        }
        Fixture {
            store,
            user,
            address,
            products,
        }
    }

    fn request(f: &Fixture) -> CheckoutRequest {
        CheckoutRequest {
            lines: f
                .products
                .iter()
                .map(|p| LineSelection {
                    product_id: *p,
                    quantity: 2,
                })
                .collect(),
            address_id: Some(f.address),
            sub_total: Some(BigDecimal::from(318)),
            total: Some(BigDecimal::from(298)),
        }
    }

    fn service(f: &Fixture) -> CashOnDeliveryService {
        CashOnDeliveryService::new(f.store.clone(), f.store.clone())
    }

    #[tokio::test]
    async fn one_order_per_line_and_cart_emptied() {
        let f = fixture();

        let orders = service(&f).place(f.user, request(&f)).await.expect("commit");

        assert_eq!(orders.len(), 2);
        assert!(orders
            .iter()
            .all(|o| o.payment_status == PaymentStatus::CashOnDelivery && o.payment_id.is_empty()));
        assert!(f.store.get(f.user).expect("cart").is_empty());
    }

    #[tokio::test]
    async fn amounts_are_recomputed_locally_per_line() {
        let f = fixture();

        let orders = service(&f).place(f.user, request(&f)).await.expect("commit");

        let eggs = orders
            .iter()
            .find(|o| o.product_id == f.products[1])
            .expect("eggs order");
        // 99 - ceil(9.9) = 89, times 2
        assert_eq!(eggs.total_amt, BigDecimal::from(178));
        assert_eq!(eggs.sub_total_amt, BigDecimal::from(198));
        assert_eq!(eggs.currency, "INR");
    }

    #[tokio::test]
    async fn missing_total_is_invalid() {
        let f = fixture();
        let mut req = request(&f);
        req.total = None;

        let err = service(&f).place(f.user, req).await.unwrap_err();

        assert!(matches!(err, DomainError::InvalidRequest(_)));
        assert_eq!(f.store.order_count(), 0);
    }

    #[tokio::test]
    async fn non_positive_total_is_invalid() {
        let f = fixture();
        let mut req = request(&f);
        req.total = Some(BigDecimal::zero());

        let err = service(&f).place(f.user, req).await.unwrap_err();

        assert!(matches!(err, DomainError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn second_commit_of_same_cart_conflicts() {
        let f = fixture();
        let svc = service(&f);

        let (first, second) = tokio::join!(
            svc.place(f.user, request(&f)),
            svc.place(f.user, request(&f))
        );

        let successes = [&first, &second].iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1, "exactly one checkout may consume the cart");
        assert_eq!(f.store.order_count(), 2);
        let failure = if first.is_err() { first } else { second };
        assert!(matches!(failure.unwrap_err(), DomainError::Conflict(_)));
    }
}
