use actix_web::{web, HttpResponse};
use serde::Serialize;
use serde_json::json;
use utoipa::ToSchema;

use super::CheckoutBody;
use crate::auth::AuthenticatedUser;
use crate::domain::payment::ProviderLink;
use crate::domain::transaction::ProviderKind;
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    pub id: String,
    pub url: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LinkResponse {
    pub href: String,
    pub rel: String,
    pub method: Option<String>,
}

impl From<ProviderLink> for LinkResponse {
    fn from(l: ProviderLink) -> Self {
        Self {
            href: l.href,
            rel: l.rel,
            method: l.method,
        }
    }
}

/// POST /checkout
///
/// Opens a hosted card checkout session. Orders are only written once the
/// provider reports the payment through the webhook.
#[utoipa::path(
    post,
    path = "/checkout",
    request_body = CheckoutBody,
    responses(
        (status = 200, description = "Hosted session created", body = SessionResponse),
        (status = 400, description = "list_items or addressId missing"),
        (status = 404, description = "Unknown user, address or product"),
        (status = 502, description = "Payment provider failure"),
    ),
    tag = "checkout"
)]
pub async fn card_checkout(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
    body: web::Json<CheckoutBody>,
) -> Result<HttpResponse, AppError> {
    let session = state
        .checkout
        .create_session(ProviderKind::Card, user.0, body.into_inner().into())
        .await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "session": SessionResponse {
            id: session.id,
            url: session.url,
        },
    })))
}

/// POST /paypal-checkout
///
/// Creates a PayPal order; the client follows the `approve` link.
#[utoipa::path(
    post,
    path = "/paypal-checkout",
    request_body = CheckoutBody,
    responses(
        (status = 200, description = "PayPal order created", body = [LinkResponse]),
        (status = 400, description = "list_items or addressId missing"),
        (status = 404, description = "Unknown user, address or product"),
        (status = 502, description = "Payment provider failure"),
    ),
    tag = "checkout"
)]
pub async fn paypal_checkout(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
    body: web::Json<CheckoutBody>,
) -> Result<HttpResponse, AppError> {
    let session = state
        .checkout
        .create_session(ProviderKind::PayPal, user.0, body.into_inner().into())
        .await?;
    let links: Vec<LinkResponse> = session.links.into_iter().map(LinkResponse::from).collect();
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "orderID": session.id,
        "links": links,
    })))
}
