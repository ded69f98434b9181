//! Turns verified provider notifications into order rows exactly once.
//!
//! Per provider transaction the flow is
//! `NOTIFIED -> VERIFIED -> MATERIALIZED -> CART_CLEARED`, with `REJECTED`
//! reachable on verification failure (nothing persisted) or when nothing
//! could be materialized (persisted, so redeliveries stay no-ops).
//!
//! Amounts come from the provider's settled line items, never from the
//! local catalog.

use std::collections::HashSet;
use std::sync::Arc;

use uuid::Uuid;

use super::blocking;
use crate::domain::errors::DomainError;
use crate::domain::order::{generate_order_id, NewOrder, Order, PaymentStatus};
use crate::domain::payment::{Gateways, PaymentNotice, ProviderEvent, ResolvedPayment, WebhookRequest};
use crate::domain::ports::{Catalog, OrderStore};
use crate::domain::transaction::{
    DeadLetter, ProviderKind, Settlement, SettlementOutcome, TransactionKey, TransactionState,
};

#[derive(Debug, Clone)]
pub enum ReconcileOutcome {
    Ignored { event_type: String },
    Duplicate { state: TransactionState },
    Materialized { orders: Vec<Order>, dead_letters: usize },
    Rejected { reason: String },
}

#[derive(Clone)]
pub struct WebhookReconciler {
    gateways: Gateways,
    orders: Arc<dyn OrderStore>,
    catalog: Arc<dyn Catalog>,
}

impl WebhookReconciler {
    pub fn new(gateways: Gateways, orders: Arc<dyn OrderStore>, catalog: Arc<dyn Catalog>) -> Self {
        Self {
            gateways,
            orders,
            catalog,
        }
    }

    pub async fn handle(
        &self,
        kind: ProviderKind,
        webhook: WebhookRequest,
    ) -> Result<ReconcileOutcome, DomainError> {
        let gateway = self.gateways.get(kind);

        if let Err(e) = gateway.verify_webhook(&webhook).await {
            log::warn!("{} webhook rejected before processing: {}", kind, e);
            return Err(e);
        }

        let notice = match gateway.parse_event(&webhook.body)? {
            ProviderEvent::Ignored { event_type } => {
                log::info!("{} webhook: unhandled event type {}", kind, event_type);
                return Ok(ReconcileOutcome::Ignored { event_type });
            }
            ProviderEvent::Completed(notice) => notice,
        };
        let key = TransactionKey::new(kind, notice.transaction_id.clone());
        log::info!(
            "{} transaction {} verified ({})",
            kind,
            key.transaction_id,
            notice.event_type
        );

        // Cheap short-circuit before any provider round trip. The atomic
        // insert in `settle` is what actually guarantees at-most-once.
        let orders = Arc::clone(&self.orders);
        let lookup = key.clone();
        if let Some(state) = blocking(move || orders.transaction_state(&lookup)).await? {
            log::info!(
                "{} transaction {} already {}, skipping redelivery",
                kind,
                key.transaction_id,
                state
            );
            return Ok(ReconcileOutcome::Duplicate { state });
        }

        let resolved = gateway.resolve_lines(&notice).await?;
        let settlement = self.build_settlement(key.clone(), &notice, resolved).await?;
        let dead_letters = settlement.dead_letters.len();

        let orders = Arc::clone(&self.orders);
        let outcome = blocking(move || orders.settle(settlement)).await?;

        Ok(match outcome {
            SettlementOutcome::Materialized {
                orders,
                cart_lines_cleared,
            } => {
                if dead_letters > 0 {
                    log::warn!(
                        "{} transaction {} partially materialized: {} line(s) dead-lettered",
                        kind,
                        key.transaction_id,
                        dead_letters
                    );
                }
                log::info!(
                    "{} transaction {} materialized {} order(s), cleared {} cart line(s)",
                    kind,
                    key.transaction_id,
                    orders.len(),
                    cart_lines_cleared
                );
                ReconcileOutcome::Materialized {
                    orders,
                    dead_letters,
                }
            }
            SettlementOutcome::Rejected { reason } => {
                log::warn!(
                    "{} transaction {} rejected: {}",
                    kind,
                    key.transaction_id,
                    reason
                );
                ReconcileOutcome::Rejected { reason }
            }
            SettlementOutcome::Duplicate { state } => {
                log::info!(
                    "{} transaction {} settled concurrently ({})",
                    kind,
                    key.transaction_id,
                    state
                );
                ReconcileOutcome::Duplicate { state }
            }
        })
    }

    async fn build_settlement(
        &self,
        key: TransactionKey,
        notice: &PaymentNotice,
        resolved: ResolvedPayment,
    ) -> Result<Settlement, DomainError> {
        let user_id = resolved
            .correlation_id
            .as_deref()
            .and_then(|id| Uuid::parse_str(id).ok());
        let Some(user_id) = user_id else {
            let dead_letters = resolved
                .lines
                .into_iter()
                .map(|line| DeadLetter {
                    reason: "missing correlation id".to_string(),
                    payload: line.raw,
                })
                .collect();
            return Ok(Settlement {
                key,
                user_id: None,
                orders: vec![],
                dead_letters,
            });
        };
        let delivery_address_id = resolved
            .address_ref
            .as_deref()
            .and_then(|id| Uuid::parse_str(id).ok());

        let candidates: Vec<Uuid> = resolved
            .lines
            .iter()
            .filter_map(|line| line.product_ref.as_deref())
            .filter_map(|id| Uuid::parse_str(id).ok())
            .collect();
        let catalog = Arc::clone(&self.catalog);
        let known: HashSet<Uuid> = blocking(move || catalog.find_products(&candidates))
            .await?
            .into_iter()
            .map(|p| p.id)
            .collect();

        let mut orders = Vec::new();
        let mut dead_letters = Vec::new();
        for line in resolved.lines {
            let product_id = line
                .product_ref
                .as_deref()
                .and_then(|id| Uuid::parse_str(id).ok())
                .filter(|id| known.contains(id));
            let Some(product_id) = product_id else {
                log::warn!(
                    "{} transaction {}: dropping line '{}' with unresolved product {:?}",
                    key.provider,
                    key.transaction_id,
                    line.name,
                    line.product_ref
                );
                dead_letters.push(DeadLetter {
                    reason: "unresolved product reference".to_string(),
                    payload: line.raw,
                });
                continue;
            };
            orders.push(NewOrder {
                order_id: generate_order_id(),
                user_id,
                product_id,
                product_name: line.name,
                product_images: line.images,
                payment_id: notice.payment_id.clone(),
                payment_status: PaymentStatus::Provider(notice.payment_status.clone()),
                provider: Some(key.provider),
                provider_txn_id: Some(key.transaction_id.clone()),
                delivery_address_id,
                quantity: line.quantity,
                sub_total_amt: line.sub_total,
                total_amt: line.total,
                currency: line.currency,
            });
        }

        Ok(Settlement {
            key,
            user_id: Some(user_id),
            orders,
            dead_letters,
        })
    }
}
