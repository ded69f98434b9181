use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::cart::CartLine;
use crate::domain::catalog::{Address, Customer, Product};
use crate::domain::order::{Order, PaymentStatus};
use crate::schema::{
    addresses, cart_lines, commerce_order_outbox, orders, payment_transactions, products,
    reconciliation_dead_letters, users,
};

pub(crate) fn images_from_json(value: Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        Value::String(single) => vec![single],
        _ => vec![],
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub name: String,
}

impl From<UserRow> for Customer {
    fn from(row: UserRow) -> Self {
        Customer {
            id: row.id,
            email: row.email,
            name: row.name,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUserRow {
    pub id: Uuid,
    pub email: String,
    pub name: String,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = addresses)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AddressRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub address_line: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub country: String,
    pub mobile: Option<String>,
}

impl From<AddressRow> for Address {
    fn from(row: AddressRow) -> Self {
        Address {
            id: row.id,
            user_id: row.user_id,
            address_line: row.address_line,
            city: row.city,
            state: row.state,
            pincode: row.pincode,
            country: row.country,
            mobile: row.mobile,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = addresses)]
pub struct NewAddressRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub address_line: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub country: String,
    pub mobile: Option<String>,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProductRow {
    pub id: Uuid,
    pub name: String,
    pub images: Value,
    pub price: BigDecimal,
    pub discount: i32,
    pub stock: Option<i32>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            name: row.name,
            images: images_from_json(row.images),
            price: row.price,
            discount: row.discount,
            stock: row.stock,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = products)]
pub struct NewProductRow {
    pub id: Uuid,
    pub name: String,
    pub images: Value,
    pub price: BigDecimal,
    pub discount: i32,
    pub stock: Option<i32>,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = cart_lines)]
#[diesel(belongs_to(ProductRow, foreign_key = product_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CartLineRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
}

impl From<CartLineRow> for CartLine {
    fn from(row: CartLineRow) -> Self {
        CartLine {
            id: row.id,
            user_id: row.user_id,
            product_id: row.product_id,
            quantity: row.quantity,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = cart_lines)]
pub struct NewCartLineRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderRow {
    pub id: Uuid,
    pub order_id: String,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub product_images: Value,
    pub payment_id: String,
    pub payment_status: String,
    pub provider: Option<String>,
    pub provider_txn_id: Option<String>,
    pub delivery_address_id: Option<Uuid>,
    pub quantity: i32,
    pub sub_total_amt: BigDecimal,
    pub total_amt: BigDecimal,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Order {
            id: row.id,
            order_id: row.order_id,
            user_id: row.user_id,
            product_id: row.product_id,
            product_name: row.product_name,
            product_images: images_from_json(row.product_images),
            payment_id: row.payment_id,
            payment_status: PaymentStatus::from_stored(&row.payment_status),
            provider: row.provider.and_then(|p| p.parse().ok()),
            provider_txn_id: row.provider_txn_id,
            delivery_address_id: row.delivery_address_id,
            quantity: row.quantity,
            sub_total_amt: row.sub_total_amt,
            total_amt: row.total_amt,
            currency: row.currency,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = orders)]
pub struct NewOrderRow {
    pub id: Uuid,
    pub order_id: String,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub product_images: Value,
    pub payment_id: String,
    pub payment_status: String,
    pub provider: Option<String>,
    pub provider_txn_id: Option<String>,
    pub delivery_address_id: Option<Uuid>,
    pub quantity: i32,
    pub sub_total_amt: BigDecimal,
    pub total_amt: BigDecimal,
    pub currency: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = payment_transactions)]
pub struct NewPaymentTransactionRow {
    pub provider: String,
    pub provider_txn_id: String,
    pub user_id: Option<Uuid>,
    pub state: String,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = reconciliation_dead_letters)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DeadLetterRow {
    pub id: Uuid,
    pub provider: String,
    pub provider_txn_id: String,
    pub reason: String,
    pub payload: Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = reconciliation_dead_letters)]
pub struct NewDeadLetterRow {
    pub id: Uuid,
    pub provider: String,
    pub provider_txn_id: String,
    pub reason: String,
    pub payload: Value,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = commerce_order_outbox)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OutboxEventRow {
    pub id: Uuid,
    pub aggregate_type: String,
    pub aggregate_id: String,
    pub event_type: String,
    pub payload: Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = commerce_order_outbox)]
pub struct NewOutboxEventRow {
    pub id: Uuid,
    pub aggregate_type: String,
    pub aggregate_id: String,
    pub event_type: String,
    pub payload: Value,
}
