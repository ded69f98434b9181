use std::collections::HashMap;

use diesel::pg::PgConnection;
use diesel::prelude::*;
use serde_json::json;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::catalog::Address;
use crate::domain::errors::DomainError;
use crate::domain::order::{NewOrder, Order, OrderView};
use crate::domain::ports::OrderStore;
use crate::domain::transaction::{
    Settlement, SettlementOutcome, TransactionKey, TransactionState,
};
use crate::schema::{
    addresses, cart_lines, commerce_order_outbox, orders, payment_transactions,
    reconciliation_dead_letters,
};

use super::cart_repo::clear_cart;
use super::models::{
    AddressRow, NewDeadLetterRow, NewOrderRow, NewOutboxEventRow, NewPaymentTransactionRow,
    OrderRow,
};

const OUTBOX_AGGREGATE: &str = "Order";
const ORDERS_PLACED: &str = "OrdersPlaced";

fn insert_orders(conn: &mut PgConnection, drafts: &[NewOrder]) -> Result<Vec<Order>, DomainError> {
    let rows: Vec<NewOrderRow> = drafts
        .iter()
        .map(|o| NewOrderRow {
            id: Uuid::new_v4(),
            order_id: o.order_id.clone(),
            user_id: o.user_id,
            product_id: o.product_id,
            product_name: o.product_name.clone(),
            product_images: json!(o.product_images),
            payment_id: o.payment_id.clone(),
            payment_status: o.payment_status.to_string(),
            provider: o.provider.map(|p| p.to_string()),
            provider_txn_id: o.provider_txn_id.clone(),
            delivery_address_id: o.delivery_address_id,
            quantity: o.quantity,
            sub_total_amt: o.sub_total_amt.clone(),
            total_amt: o.total_amt.clone(),
            currency: o.currency.clone(),
        })
        .collect();

    let inserted = diesel::insert_into(orders::table)
        .values(&rows)
        .returning(OrderRow::as_returning())
        .get_results(conn)?;

    Ok(inserted.into_iter().map(Into::into).collect())
}

/// Same-transaction outbox write. A CDC relay publishes it; nothing here reads it.
fn write_outbox(
    conn: &mut PgConnection,
    aggregate_id: &str,
    user_id: Uuid,
    created: &[Order],
) -> Result<(), DomainError> {
    let lines: Vec<serde_json::Value> = created
        .iter()
        .map(|o| {
            json!({
                "order_id": o.order_id,
                "product_id": o.product_id,
                "quantity": o.quantity,
                "total_amt": o.total_amt.to_string(),
                "currency": o.currency,
                "payment_status": o.payment_status.as_str(),
            })
        })
        .collect();

    diesel::insert_into(commerce_order_outbox::table)
        .values(&NewOutboxEventRow {
            id: Uuid::new_v4(),
            aggregate_type: OUTBOX_AGGREGATE.to_string(),
            aggregate_id: aggregate_id.to_string(),
            event_type: ORDERS_PLACED.to_string(),
            payload: json!({
                "user_id": user_id,
                "orders": lines,
            }),
        })
        .execute(conn)?;
    Ok(())
}

fn load_state(conn: &mut PgConnection, key: &TransactionKey) -> Result<Option<TransactionState>, DomainError> {
    let state: Option<String> = payment_transactions::table
        .find((key.provider.to_string(), key.transaction_id.clone()))
        .select(payment_transactions::state)
        .first(conn)
        .optional()?;

    state
        .map(|s| s.parse::<TransactionState>().map_err(DomainError::Internal))
        .transpose()
}

fn set_state(conn: &mut PgConnection, key: &TransactionKey, state: TransactionState) -> Result<(), DomainError> {
    diesel::update(payment_transactions::table.find((key.provider.to_string(), key.transaction_id.clone())))
        .set((
            payment_transactions::state.eq(state.as_str()),
            payment_transactions::updated_at.eq(diesel::dsl::now),
        ))
        .execute(conn)?;
    log::debug!("{} transaction {} -> {}", key.provider, key.transaction_id, state);
    Ok(())
}

// ── Repository ────────────────────────────────────────────────────────────────

pub struct DieselOrderStore {
    pool: DbPool,
}

impl DieselOrderStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl OrderStore for DieselOrderStore {
    fn list_for_user(&self, user_id: Uuid) -> Result<Vec<OrderView>, DomainError> {
        let mut conn = self.pool.get()?;

        let rows = orders::table
            .filter(orders::user_id.eq(user_id))
            .order(orders::created_at.desc())
            .select(OrderRow::as_select())
            .load(&mut conn)?;

        let address_ids: Vec<Uuid> = rows.iter().filter_map(|o| o.delivery_address_id).collect();
        let by_id: HashMap<Uuid, Address> = addresses::table
            .filter(addresses::id.eq_any(address_ids))
            .select(AddressRow::as_select())
            .load(&mut conn)?
            .into_iter()
            .map(|a| (a.id, a.into()))
            .collect();

        Ok(rows
            .into_iter()
            .map(|row| {
                let delivery_address = row.delivery_address_id.and_then(|id| by_id.get(&id).cloned());
                OrderView {
                    order: row.into(),
                    delivery_address,
                }
            })
            .collect())
    }

    fn commit_cash_on_delivery(
        &self,
        user_id: Uuid,
        checkout_id: Uuid,
        drafts: Vec<NewOrder>,
    ) -> Result<Vec<Order>, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            // 1. Lock the cart. A racing checkout blocks here, then sees it empty.
            let in_cart: Vec<Uuid> = cart_lines::table
                .filter(cart_lines::user_id.eq(user_id))
                .select(cart_lines::product_id)
                .for_update()
                .load(conn)?;
            if let Some(missing) = drafts.iter().find(|d| !in_cart.contains(&d.product_id)) {
                return Err(DomainError::Conflict(format!(
                    "Cart no longer contains product {}",
                    missing.product_id
                )));
            }

            // 2. Orders and their outbox event
            let created = insert_orders(conn, &drafts)?;
            write_outbox(conn, &checkout_id.to_string(), user_id, &created)?;

            // 3. Empty the cart
            clear_cart(conn, user_id)?;

            Ok(created)
        })
    }

    fn transaction_state(&self, key: &TransactionKey) -> Result<Option<TransactionState>, DomainError> {
        let mut conn = self.pool.get()?;
        load_state(&mut conn, key)
    }

    fn settle(&self, settlement: Settlement) -> Result<SettlementOutcome, DomainError> {
        let mut conn = self.pool.get()?;
        let Settlement {
            key,
            user_id,
            orders: drafts,
            dead_letters,
        } = settlement;

        conn.transaction::<_, DomainError, _>(|conn| {
            // 1. Claim the transaction id. Zero rows means someone else has.
            let claimed = diesel::insert_into(payment_transactions::table)
                .values(&NewPaymentTransactionRow {
                    provider: key.provider.to_string(),
                    provider_txn_id: key.transaction_id.clone(),
                    user_id,
                    state: TransactionState::Verified.as_str().to_string(),
                })
                .on_conflict_do_nothing()
                .execute(conn)?;
            if claimed == 0 {
                let state = load_state(conn, &key)?.unwrap_or(TransactionState::Verified);
                return Ok(SettlementOutcome::Duplicate { state });
            }

            // 2. Dead letters are kept whatever happens next
            if !dead_letters.is_empty() {
                let rows: Vec<NewDeadLetterRow> = dead_letters
                    .iter()
                    .map(|d| NewDeadLetterRow {
                        id: Uuid::new_v4(),
                        provider: key.provider.to_string(),
                        provider_txn_id: key.transaction_id.clone(),
                        reason: d.reason.clone(),
                        payload: d.payload.clone(),
                    })
                    .collect();
                diesel::insert_into(reconciliation_dead_letters::table)
                    .values(&rows)
                    .execute(conn)?;
            }

            let user_id = match user_id {
                Some(id) if !drafts.is_empty() => id,
                Some(_) => {
                    set_state(conn, &key, TransactionState::Rejected)?;
                    return Ok(SettlementOutcome::Rejected {
                        reason: "no line item resolved to a product".to_string(),
                    });
                }
                None => {
                    set_state(conn, &key, TransactionState::Rejected)?;
                    return Ok(SettlementOutcome::Rejected {
                        reason: "missing correlation id".to_string(),
                    });
                }
            };

            // 3. Orders and their outbox event
            let created = insert_orders(conn, &drafts)?;
            write_outbox(conn, &key.transaction_id, user_id, &created)?;
            set_state(conn, &key, TransactionState::Materialized)?;

            // 4. Cart clearing only after the orders are in
            let cleared = clear_cart(conn, user_id)?;
            set_state(conn, &key, TransactionState::CartCleared)?;

            Ok(SettlementOutcome::Materialized {
                orders: created,
                cart_lines_cleared: cleared,
            })
        })
    }
}
