use std::collections::HashMap;

use actix_web::{web, HttpRequest, HttpResponse};
use serde::Serialize;
use utoipa::ToSchema;

use crate::application::reconciler::ReconcileOutcome;
use crate::domain::payment::WebhookRequest;
use crate::domain::transaction::ProviderKind;
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct WebhookAck {
    pub received: bool,
}

fn webhook_request(req: &HttpRequest, body: web::Bytes) -> WebhookRequest {
    let headers: HashMap<String, String> = req
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
        })
        .collect();
    WebhookRequest {
        headers,
        body: body.to_vec(),
    }
}

/// Ignored, duplicate and rejected deliveries are all acknowledged so the
/// provider stops redelivering. Verification failures are 400; provider or
/// database failures surface as 5xx so the provider retries.
async fn reconcile(
    state: web::Data<AppState>,
    kind: ProviderKind,
    req: HttpRequest,
    body: web::Bytes,
) -> Result<HttpResponse, AppError> {
    let outcome = state
        .reconciler
        .handle(kind, webhook_request(&req, body))
        .await?;
    if let ReconcileOutcome::Materialized { orders, .. } = &outcome {
        log::debug!("{} webhook produced {} order(s)", kind, orders.len());
    }
    Ok(HttpResponse::Ok().json(WebhookAck { received: true }))
}

/// POST /webhook
///
/// Card provider events, authenticated by the `Stripe-Signature` header.
#[utoipa::path(
    post,
    path = "/webhook",
    request_body(content = String, description = "Raw provider event", content_type = "application/json"),
    responses(
        (status = 200, description = "Event acknowledged", body = WebhookAck),
        (status = 400, description = "Signature verification failed or malformed event"),
        (status = 502, description = "Provider lookup failed; safe to redeliver"),
    ),
    tag = "webhooks"
)]
pub async fn card_webhook(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Bytes,
) -> Result<HttpResponse, AppError> {
    reconcile(state, ProviderKind::Card, req, body).await
}

/// POST /paypal-webhook
///
/// PayPal events, verified against the configured webhook id.
#[utoipa::path(
    post,
    path = "/paypal-webhook",
    request_body(content = String, description = "Raw provider event", content_type = "application/json"),
    responses(
        (status = 200, description = "Event acknowledged", body = WebhookAck),
        (status = 400, description = "Signature verification failed or malformed event"),
        (status = 502, description = "Provider lookup failed; safe to redeliver"),
    ),
    tag = "webhooks"
)]
pub async fn paypal_webhook(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Bytes,
) -> Result<HttpResponse, AppError> {
    reconcile(state, ProviderKind::PayPal, req, body).await
}
