use actix_web::{web, HttpResponse};
use serde_json::json;

use super::{CheckoutBody, OrderResponse};
use crate::auth::AuthenticatedUser;
use crate::domain::order::OrderView;
use crate::errors::AppError;
use crate::state::AppState;

/// POST /cash-on-delivery
///
/// Writes one order per line and empties the cart in a single transaction.
/// A second submission racing the first finds the cart gone and gets 409.
#[utoipa::path(
    post,
    path = "/cash-on-delivery",
    request_body = CheckoutBody,
    responses(
        (status = 200, description = "Orders placed", body = [OrderResponse]),
        (status = 400, description = "Missing items, totalAmt or addressId"),
        (status = 404, description = "Unknown user, address or product"),
        (status = 409, description = "Cart already checked out"),
    ),
    tag = "orders"
)]
pub async fn cash_on_delivery(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
    body: web::Json<CheckoutBody>,
) -> Result<HttpResponse, AppError> {
    let placed = state
        .cash_on_delivery
        .place(user.0, body.into_inner().into())
        .await?;
    let data: Vec<OrderResponse> = placed
        .into_iter()
        .map(|order| {
            OrderResponse::from(OrderView {
                order,
                delivery_address: None,
            })
        })
        .collect();
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "error": false,
        "message": "Order placed successfully",
        "data": data,
    })))
}

/// GET /orders
///
/// The caller's orders, newest first, with the delivery address populated.
#[utoipa::path(
    get,
    path = "/orders",
    responses(
        (status = 200, description = "Order history", body = [OrderResponse]),
        (status = 401, description = "Missing or invalid access token"),
    ),
    tag = "orders"
)]
pub async fn list_orders(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let data: Vec<OrderResponse> = state
        .history
        .list(user.0)
        .await?
        .into_iter()
        .map(OrderResponse::from)
        .collect();
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "error": false,
        "message": "Order list",
        "data": data,
    })))
}
