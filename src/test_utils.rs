//! In-memory ports and a scriptable payment gateway for unit tests.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Mutex;

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::domain::cart::{CartItem, CartLine};
use crate::domain::catalog::{Address, Customer, Product};
use crate::domain::checkout::CheckoutIntent;
use crate::domain::errors::DomainError;
use crate::domain::order::{NewOrder, Order, OrderView};
use crate::domain::payment::{
    PaidLine, PaymentGateway, PaymentNotice, ProviderEvent, ProviderLink, ProviderSession,
    ResolvedPayment, WebhookRequest,
};
use crate::domain::ports::{CartStore, Catalog, OrderStore};
use crate::domain::pricing::CATALOG_CURRENCY;
use crate::domain::transaction::{
    DeadLetter, ProviderKind, Settlement, SettlementOutcome, TransactionKey, TransactionState,
};

pub fn product(name: &str, price: &str, discount: i32) -> Product {
    Product {
        id: Uuid::new_v4(),
        name: name.to_string(),
        images: vec![format!("https://cdn.example/{}.png", name.to_lowercase())],
        price: BigDecimal::from_str(price).expect("valid decimal"),
        discount,
        stock: Some(25),
    }
}

pub fn paid_line(product_id: Option<Uuid>, amount: &str) -> PaidLine {
    let amount = BigDecimal::from_str(amount).expect("valid decimal");
    let product_ref = product_id.map(|id| id.to_string());
    PaidLine {
        raw: json!({ "product_ref": product_ref, "amount": amount.to_string() }),
        product_ref,
        name: "Paid item".to_string(),
        images: vec![],
        quantity: 1,
        sub_total: amount.clone(),
        total: amount,
        currency: CATALOG_CURRENCY.to_string(),
    }
}

fn persist(new: NewOrder) -> Order {
    Order {
        id: Uuid::new_v4(),
        order_id: new.order_id,
        user_id: new.user_id,
        product_id: new.product_id,
        product_name: new.product_name,
        product_images: new.product_images,
        payment_id: new.payment_id,
        payment_status: new.payment_status,
        provider: new.provider,
        provider_txn_id: new.provider_txn_id,
        delivery_address_id: new.delivery_address_id,
        quantity: new.quantity,
        sub_total_amt: new.sub_total_amt,
        total_amt: new.total_amt,
        currency: new.currency,
        created_at: Utc::now(),
    }
}

#[derive(Default)]
struct Inner {
    customers: HashMap<Uuid, Customer>,
    addresses: HashMap<Uuid, Address>,
    products: HashMap<Uuid, Product>,
    cart: Vec<CartLine>,
    orders: Vec<Order>,
    transactions: HashMap<TransactionKey, TransactionState>,
    dead_letters: Vec<DeadLetter>,
}

/// Every port behind one mutex, so each operation is trivially atomic.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("memory store poisoned")
    }

    pub fn add_product(&self, product: Product) -> Uuid {
        let id = product.id;
        self.lock().products.insert(id, product);
        id
    }

    pub fn add_customer(&self, email: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.lock().customers.insert(
            id,
            Customer {
                id,
                email: email.to_string(),
                name: "Test Customer".to_string(),
            },
        );
        id
    }

    pub fn add_address(&self, user_id: Uuid, country: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.lock().addresses.insert(
            id,
            Address {
                id,
                user_id,
                address_line: "12 Market Road".to_string(),
                city: "Pune".to_string(),
                state: "Maharashtra".to_string(),
                pincode: "411001".to_string(),
                country: country.to_string(),
                mobile: Some("9999999999".to_string()),
            },
        );
        id
    }

    pub fn order_count(&self) -> usize {
        self.lock().orders.len()
    }

    pub fn dead_letter_count(&self) -> usize {
        self.lock().dead_letters.len()
    }

    pub fn state_of(&self, provider: ProviderKind, txn: &str) -> Option<TransactionState> {
        self.lock()
            .transactions
            .get(&TransactionKey::new(provider, txn))
            .copied()
    }
}

impl CartStore for MemoryStore {
    fn get(&self, user_id: Uuid) -> Result<Vec<CartItem>, DomainError> {
        let inner = self.lock();
        Ok(inner
            .cart
            .iter()
            .filter(|l| l.user_id == user_id)
            .filter_map(|l| {
                inner.products.get(&l.product_id).map(|p| CartItem {
                    line: l.clone(),
                    product: p.clone(),
                })
            })
            .collect())
    }

    fn add_line(&self, user_id: Uuid, product_id: Uuid) -> Result<CartLine, DomainError> {
        let mut inner = self.lock();
        if !inner.products.contains_key(&product_id) {
            return Err(DomainError::NotFound("Product not found".to_string()));
        }
        if inner
            .cart
            .iter()
            .any(|l| l.user_id == user_id && l.product_id == product_id)
        {
            return Err(DomainError::Conflict("Item already in cart".to_string()));
        }
        let line = CartLine {
            id: Uuid::new_v4(),
            user_id,
            product_id,
            quantity: 1,
            created_at: Utc::now(),
        };
        inner.cart.push(line.clone());
        Ok(line)
    }

    fn set_quantity(&self, user_id: Uuid, line_id: Uuid, quantity: i32) -> Result<CartLine, DomainError> {
        let mut inner = self.lock();
        let line = inner
            .cart
            .iter_mut()
            .find(|l| l.id == line_id && l.user_id == user_id)
            .ok_or_else(|| DomainError::NotFound("Cart item not found".to_string()))?;
        line.quantity = quantity;
        Ok(line.clone())
    }

    fn remove_line(&self, user_id: Uuid, line_id: Uuid) -> Result<(), DomainError> {
        let mut inner = self.lock();
        let before = inner.cart.len();
        inner.cart.retain(|l| !(l.id == line_id && l.user_id == user_id));
        if inner.cart.len() == before {
            return Err(DomainError::NotFound("Cart item not found".to_string()));
        }
        Ok(())
    }

    fn clear_all(&self, user_id: Uuid) -> Result<usize, DomainError> {
        let mut inner = self.lock();
        let before = inner.cart.len();
        inner.cart.retain(|l| l.user_id != user_id);
        Ok(before - inner.cart.len())
    }
}

impl Catalog for MemoryStore {
    fn find_customer(&self, user_id: Uuid) -> Result<Option<Customer>, DomainError> {
        Ok(self.lock().customers.get(&user_id).cloned())
    }

    fn find_address(&self, user_id: Uuid, address_id: Uuid) -> Result<Option<Address>, DomainError> {
        Ok(self
            .lock()
            .addresses
            .get(&address_id)
            .filter(|a| a.user_id == user_id)
            .cloned())
    }

    fn find_products(&self, ids: &[Uuid]) -> Result<Vec<Product>, DomainError> {
        let inner = self.lock();
        Ok(ids
            .iter()
            .filter_map(|id| inner.products.get(id).cloned())
            .collect())
    }
}

impl OrderStore for MemoryStore {
    fn list_for_user(&self, user_id: Uuid) -> Result<Vec<OrderView>, DomainError> {
        let inner = self.lock();
        let mut views: Vec<OrderView> = inner
            .orders
            .iter()
            .filter(|o| o.user_id == user_id)
            .map(|o| OrderView {
                order: o.clone(),
                delivery_address: o
                    .delivery_address_id
                    .and_then(|id| inner.addresses.get(&id).cloned()),
            })
            .collect();
        views.sort_by(|a, b| b.order.created_at.cmp(&a.order.created_at));
        Ok(views)
    }

    fn commit_cash_on_delivery(
        &self,
        user_id: Uuid,
        _checkout_id: Uuid,
        orders: Vec<NewOrder>,
    ) -> Result<Vec<Order>, DomainError> {
        let mut inner = self.lock();
        let all_present = orders.iter().all(|o| {
            inner
                .cart
                .iter()
                .any(|l| l.user_id == user_id && l.product_id == o.product_id)
        });
        if !all_present {
            return Err(DomainError::Conflict(
                "Cart no longer contains the submitted items".to_string(),
            ));
        }
        let created: Vec<Order> = orders.into_iter().map(persist).collect();
        inner.orders.extend(created.iter().cloned());
        inner.cart.retain(|l| l.user_id != user_id);
        Ok(created)
    }

    fn transaction_state(&self, key: &TransactionKey) -> Result<Option<TransactionState>, DomainError> {
        Ok(self.lock().transactions.get(key).copied())
    }

    fn settle(&self, settlement: Settlement) -> Result<SettlementOutcome, DomainError> {
        let mut inner = self.lock();
        if let Some(state) = inner.transactions.get(&settlement.key) {
            return Ok(SettlementOutcome::Duplicate { state: *state });
        }
        inner.dead_letters.extend(settlement.dead_letters);
        let user_id = match settlement.user_id {
            Some(user_id) if !settlement.orders.is_empty() => user_id,
            _ => {
                inner
                    .transactions
                    .insert(settlement.key, TransactionState::Rejected);
                return Ok(SettlementOutcome::Rejected {
                    reason: "nothing to materialize".to_string(),
                });
            }
        };
        let created: Vec<Order> = settlement.orders.into_iter().map(persist).collect();
        inner.orders.extend(created.iter().cloned());
        let before = inner.cart.len();
        inner.cart.retain(|l| l.user_id != user_id);
        let cleared = before - inner.cart.len();
        inner
            .transactions
            .insert(settlement.key, TransactionState::CartCleared);
        Ok(SettlementOutcome::Materialized {
            orders: created,
            cart_lines_cleared: cleared,
        })
    }
}

#[derive(Default)]
struct Script {
    event: Option<ProviderEvent>,
    lines: Vec<PaidLine>,
    reject_signatures: bool,
    fail_sessions: bool,
    last_intent: Option<CheckoutIntent>,
    sessions_created: usize,
    lines_resolved: usize,
}

/// Gateway whose verification, events and line items are set by the test.
pub struct FakeGateway {
    kind: ProviderKind,
    script: Mutex<Script>,
}

impl FakeGateway {
    pub fn new(kind: ProviderKind) -> Self {
        Self {
            kind,
            script: Mutex::new(Script::default()),
        }
    }

    fn script(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().expect("fake gateway poisoned")
    }

    pub fn failing_sessions(self) -> Self {
        self.script().fail_sessions = true;
        self
    }

    pub fn complete_with(&self, txn: &str, correlation_id: Option<String>, lines: Vec<PaidLine>) {
        let mut script = self.script();
        script.event = Some(ProviderEvent::Completed(PaymentNotice {
            transaction_id: txn.to_string(),
            event_type: "checkout.session.completed".to_string(),
            correlation_id,
            address_ref: None,
            payment_id: format!("pi_{}", txn),
            payment_status: "paid".to_string(),
            resource: serde_json::Value::Null,
        }));
        script.lines = lines;
    }

    pub fn ignore_events(&self, event_type: &str) {
        self.script().event = Some(ProviderEvent::Ignored {
            event_type: event_type.to_string(),
        });
    }

    pub fn reject_signatures(&self) {
        self.script().reject_signatures = true;
    }

    pub fn sessions_created(&self) -> usize {
        self.script().sessions_created
    }

    pub fn lines_resolved(&self) -> usize {
        self.script().lines_resolved
    }

    pub fn last_intent(&self) -> Option<CheckoutIntent> {
        self.script().last_intent.clone()
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_session(&self, intent: &CheckoutIntent) -> Result<ProviderSession, DomainError> {
        let mut script = self.script();
        script.last_intent = Some(intent.clone());
        if script.fail_sessions {
            return Err(DomainError::PaymentProvider("card declined by fake".to_string()));
        }
        script.sessions_created += 1;
        let id = format!("{}_sess_{}", self.kind, script.sessions_created);
        let href = format!("https://pay.example/{}", id);
        Ok(ProviderSession {
            url: Some(href.clone()),
            links: vec![ProviderLink {
                href,
                rel: "approve".to_string(),
                method: Some("GET".to_string()),
            }],
            id,
        })
    }

    async fn verify_webhook(&self, _webhook: &WebhookRequest) -> Result<(), DomainError> {
        if self.script().reject_signatures {
            return Err(DomainError::Verification("signature mismatch".to_string()));
        }
        Ok(())
    }

    fn parse_event(&self, _body: &[u8]) -> Result<ProviderEvent, DomainError> {
        Ok(self.script().event.clone().unwrap_or(ProviderEvent::Ignored {
            event_type: "unscripted".to_string(),
        }))
    }

    async fn resolve_lines(&self, notice: &PaymentNotice) -> Result<ResolvedPayment, DomainError> {
        let mut script = self.script();
        script.lines_resolved += 1;
        Ok(ResolvedPayment {
            correlation_id: notice.correlation_id.clone(),
            address_ref: notice.address_ref.clone(),
            lines: script.lines.clone(),
        })
    }
}
