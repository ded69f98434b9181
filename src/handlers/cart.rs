use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use super::ProductResponse;
use crate::auth::AuthenticatedUser;
use crate::domain::cart::{CartItem, CartLine};
use crate::errors::AppError;
use crate::state::AppState;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddToCartRequest {
    #[serde(rename = "productId")]
    pub product_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateQuantityRequest {
    #[serde(rename = "_id")]
    pub id: Option<Uuid>,
    pub qty: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RemoveCartItemRequest {
    #[serde(rename = "_id")]
    pub id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartLineResponse {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(rename = "productId")]
    pub product_id: Uuid,
    pub quantity: i32,
}

impl From<CartLine> for CartLineResponse {
    fn from(line: CartLine) -> Self {
        Self {
            id: line.id,
            product_id: line.product_id,
            quantity: line.quantity,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartItemResponse {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub quantity: i32,
    #[serde(rename = "productId")]
    pub product: ProductResponse,
}

impl From<CartItem> for CartItemResponse {
    fn from(item: CartItem) -> Self {
        Self {
            id: item.line.id,
            quantity: item.line.quantity,
            product: item.product.into(),
        }
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /cart
#[utoipa::path(
    get,
    path = "/cart",
    responses(
        (status = 200, description = "Cart lines with their products", body = [CartItemResponse]),
        (status = 401, description = "Missing or invalid access token"),
    ),
    tag = "cart"
)]
pub async fn get_cart(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let items: Vec<CartItemResponse> = state
        .cart
        .items(user.0)
        .await?
        .into_iter()
        .map(CartItemResponse::from)
        .collect();
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "error": false,
        "message": "Cart items",
        "data": items,
    })))
}

/// POST /cart
///
/// Adds one unit of a product. A product already in the cart is a conflict,
/// use PUT to change its quantity.
#[utoipa::path(
    post,
    path = "/cart",
    request_body = AddToCartRequest,
    responses(
        (status = 200, description = "Line added", body = CartLineResponse),
        (status = 400, description = "productId missing"),
        (status = 404, description = "Unknown product"),
        (status = 409, description = "Product already in cart"),
    ),
    tag = "cart"
)]
pub async fn add_to_cart(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
    body: web::Json<AddToCartRequest>,
) -> Result<HttpResponse, AppError> {
    let line = state.cart.add(user.0, body.product_id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "error": false,
        "message": "Item added to cart",
        "data": CartLineResponse::from(line),
    })))
}

/// PUT /cart
#[utoipa::path(
    put,
    path = "/cart",
    request_body = UpdateQuantityRequest,
    responses(
        (status = 200, description = "Quantity updated", body = CartLineResponse),
        (status = 400, description = "_id or qty missing, or qty below 1"),
        (status = 404, description = "Unknown cart line"),
    ),
    tag = "cart"
)]
pub async fn update_cart_quantity(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
    body: web::Json<UpdateQuantityRequest>,
) -> Result<HttpResponse, AppError> {
    let line = state.cart.set_quantity(user.0, body.id, body.qty).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "error": false,
        "message": "Cart updated",
        "data": CartLineResponse::from(line),
    })))
}

/// DELETE /cart
#[utoipa::path(
    delete,
    path = "/cart",
    request_body = RemoveCartItemRequest,
    responses(
        (status = 200, description = "Line removed"),
        (status = 400, description = "_id missing"),
        (status = 404, description = "Unknown cart line"),
    ),
    tag = "cart"
)]
pub async fn remove_cart_item(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
    body: web::Json<RemoveCartItemRequest>,
) -> Result<HttpResponse, AppError> {
    state.cart.remove(user.0, body.id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "error": false,
        "message": "Item removed",
    })))
}
