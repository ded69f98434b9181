pub mod cart;
pub mod checkout;
pub mod orders;
pub mod webhooks;

use actix_web::web;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::catalog::{Address, Product};
use crate::domain::checkout::{CheckoutRequest, LineSelection};
use crate::domain::order::OrderView;
use crate::errors::AppError;

// ── Request / response DTOs ──────────────────────────────────────────────────

fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ListItemRequest {
    #[serde(rename = "productId", alias = "product_id")]
    pub product_id: Uuid,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

/// Shared by the card, PayPal and cash-on-delivery endpoints.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CheckoutBody {
    #[serde(default)]
    pub list_items: Vec<ListItemRequest>,
    #[serde(rename = "addressId")]
    pub address_id: Option<Uuid>,
    /// Decimal amount, e.g. "198.00"
    #[serde(rename = "subTotalAmt")]
    #[schema(value_type = Option<String>)]
    pub sub_total_amt: Option<BigDecimal>,
    #[serde(rename = "totalAmt")]
    #[schema(value_type = Option<String>)]
    pub total_amt: Option<BigDecimal>,
}

impl From<CheckoutBody> for CheckoutRequest {
    fn from(body: CheckoutBody) -> Self {
        CheckoutRequest {
            lines: body
                .list_items
                .into_iter()
                .map(|item| LineSelection {
                    product_id: item.product_id,
                    quantity: item.quantity,
                })
                .collect(),
            address_id: body.address_id,
            sub_total: body.sub_total_amt,
            total: body.total_amt,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductResponse {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub image: Vec<String>,
    #[schema(value_type = String)]
    pub price: BigDecimal,
    pub discount: i32,
    pub stock: Option<i32>,
}

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        Self {
            id: p.id,
            name: p.name,
            image: p.images,
            price: p.price,
            discount: p.discount,
            stock: p.stock,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AddressResponse {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub address_line: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub country: String,
    pub mobile: Option<String>,
}

impl From<Address> for AddressResponse {
    fn from(a: Address) -> Self {
        Self {
            id: a.id,
            address_line: a.address_line,
            city: a.city,
            state: a.state,
            pincode: a.pincode,
            country: a.country,
            mobile: a.mobile,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductDetails {
    pub name: String,
    pub image: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(rename = "orderId")]
    pub order_id: String,
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    #[serde(rename = "productId")]
    pub product_id: Uuid,
    pub product_details: ProductDetails,
    #[serde(rename = "paymentId")]
    pub payment_id: String,
    pub payment_status: String,
    pub provider: Option<String>,
    pub delivery_address: Option<AddressResponse>,
    pub quantity: i32,
    #[serde(rename = "subTotalAmt")]
    #[schema(value_type = String)]
    pub sub_total_amt: BigDecimal,
    #[serde(rename = "totalAmt")]
    #[schema(value_type = String)]
    pub total_amt: BigDecimal,
    pub currency: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl From<OrderView> for OrderResponse {
    fn from(view: OrderView) -> Self {
        let o = view.order;
        Self {
            id: o.id,
            order_id: o.order_id,
            user_id: o.user_id,
            product_id: o.product_id,
            product_details: ProductDetails {
                name: o.product_name,
                image: o.product_images,
            },
            payment_id: o.payment_id,
            payment_status: o.payment_status.to_string(),
            provider: o.provider.map(|p| p.to_string()),
            delivery_address: view.delivery_address.map(AddressResponse::from),
            quantity: o.quantity,
            sub_total_amt: o.sub_total_amt,
            total_amt: o.total_amt,
            currency: o.currency,
            created_at: o.created_at,
        }
    }
}

/// Malformed JSON bodies get the same error envelope as everything else.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| AppError::BadRequest(format!("Invalid request body: {}", err)).into())
}
