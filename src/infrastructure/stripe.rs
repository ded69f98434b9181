//! Card payments through Stripe Checkout.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use sha2::Sha256;

use crate::domain::checkout::CheckoutIntent;
use crate::domain::errors::DomainError;
use crate::domain::payment::{
    PaidLine, PaymentGateway, PaymentNotice, ProviderEvent, ProviderSession, ResolvedPayment,
    WebhookRequest,
};
use crate::domain::pricing::{from_minor_units, to_minor_units, CATALOG_CURRENCY};

type HmacSha256 = Hmac<Sha256>;

pub const CHECKOUT_COMPLETED: &str = "checkout.session.completed";
pub const SIGNATURE_HEADER: &str = "stripe-signature";

const CURRENCY: &str = "inr";
const DEFAULT_QUANTITY_CEILING: i32 = 100;
const METADATA_PRODUCT_ID: &str = "productId";
const METADATA_USER_ID: &str = "userId";
const METADATA_ADDRESS_ID: &str = "addressId";

#[derive(Debug, Clone)]
pub struct StripeSettings {
    pub secret_key: String,
    pub webhook_secret: String,
    pub api_base: String,
    pub webhook_tolerance_secs: i64,
    pub frontend_url: String,
}

pub struct StripeGateway {
    http: Client,
    settings: StripeSettings,
}

impl StripeGateway {
    pub fn new(settings: StripeSettings) -> Result<Self, DomainError> {
        let http = Client::builder().timeout(Duration::from_secs(15)).build()?;
        Ok(Self { http, settings })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.settings.api_base.trim_end_matches('/'), path)
    }
}

/// Form body for `POST /v1/checkout/sessions`.
///
/// Each line's unit amount is the discounted catalog price in paise, and the
/// internal product id rides along as product metadata so the webhook can map
/// line items back to products.
pub(crate) fn session_form(
    intent: &CheckoutIntent,
    frontend_url: &str,
) -> Result<Vec<(String, String)>, DomainError> {
    let base = frontend_url.trim_end_matches('/');
    let mut form: Vec<(String, String)> = vec![
        ("submit_type".into(), "pay".into()),
        ("mode".into(), "payment".into()),
        ("payment_method_types[0]".into(), "card".into()),
        ("customer_email".into(), intent.customer.email.clone()),
        (format!("metadata[{}]", METADATA_USER_ID), intent.user_id().to_string()),
        (format!("metadata[{}]", METADATA_ADDRESS_ID), intent.address.id.to_string()),
        ("success_url".into(), format!("{}/success", base)),
        ("cancel_url".into(), format!("{}/cancel", base)),
    ];

    for (i, line) in intent.lines.iter().enumerate() {
        let p = format!("line_items[{}]", i);
        let product = &line.product;
        form.push((format!("{p}[price_data][currency]"), CURRENCY.into()));
        form.push((format!("{p}[price_data][product_data][name]"), product.name.clone()));
        for (j, image) in product.images.iter().enumerate() {
            form.push((format!("{p}[price_data][product_data][images][{j}]"), image.clone()));
        }
        form.push((
            format!("{p}[price_data][product_data][metadata][{}]", METADATA_PRODUCT_ID),
            product.id.to_string(),
        ));
        form.push((
            format!("{p}[price_data][unit_amount]"),
            to_minor_units(&line.unit_price())?.to_string(),
        ));
        let ceiling = product
            .stock
            .filter(|s| *s > 0)
            .unwrap_or(DEFAULT_QUANTITY_CEILING);
        form.push((format!("{p}[adjustable_quantity][enabled]"), "true".into()));
        form.push((format!("{p}[adjustable_quantity][minimum]"), "1".into()));
        form.push((format!("{p}[adjustable_quantity][maximum]"), ceiling.to_string()));
        form.push((format!("{p}[quantity]"), line.quantity.to_string()));
    }
    Ok(form)
}

/// Check a `Stripe-Signature` header (`t=<unix>,v1=<hex>[,v1=...]`).
pub(crate) fn verify_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    tolerance_secs: i64,
    now: i64,
) -> Result<(), DomainError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = Some(value),
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }

    let timestamp =
        timestamp.ok_or_else(|| DomainError::Verification("missing timestamp".to_string()))?;
    if signatures.is_empty() {
        return Err(DomainError::Verification("missing v1 signature".to_string()));
    }
    let issued: i64 = timestamp
        .parse()
        .map_err(|_| DomainError::Verification("malformed timestamp".to_string()))?;
    let within_tolerance = now
        .checked_sub(issued)
        .is_some_and(|age| age.unsigned_abs() <= tolerance_secs.unsigned_abs());
    if !within_tolerance {
        return Err(DomainError::Verification(
            "timestamp outside tolerance".to_string(),
        ));
    }

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| DomainError::Internal(e.to_string()))?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);

    let matched = signatures
        .iter()
        .filter_map(|s| hex::decode(s).ok())
        .any(|sig| mac.clone().verify_slice(&sig).is_ok());
    if matched {
        Ok(())
    } else {
        Err(DomainError::Verification("signature mismatch".to_string()))
    }
}

fn provider_error(status: StatusCode, body: &Value) -> DomainError {
    let message = body["error"]["message"].as_str().unwrap_or("no message");
    DomainError::PaymentProvider(format!("stripe returned {}: {}", status, message))
}

// ── Wire types ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct StripeEvent {
    #[serde(rename = "type")]
    event_type: String,
    data: StripeEventData,
}

#[derive(Debug, Deserialize)]
struct StripeEventData {
    object: Value,
}

#[derive(Debug, Deserialize)]
struct CheckoutSessionObject {
    id: String,
    #[serde(default)]
    metadata: HashMap<String, String>,
    payment_intent: Option<String>,
    payment_status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LineItemList {
    data: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct StripeLineItem {
    description: Option<String>,
    quantity: Option<i32>,
    amount_subtotal: Option<i64>,
    amount_total: Option<i64>,
    currency: Option<String>,
    price: Option<StripePrice>,
}

#[derive(Debug, Deserialize)]
struct StripePrice {
    product: Option<StripeProductRef>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StripeProductRef {
    Expanded(StripeProduct),
    Id(String),
}

#[derive(Debug, Deserialize)]
struct StripeProduct {
    name: Option<String>,
    #[serde(default)]
    images: Vec<String>,
    #[serde(default)]
    metadata: HashMap<String, String>,
}

pub(crate) fn parse_event(body: &[u8]) -> Result<ProviderEvent, DomainError> {
    let event: StripeEvent = serde_json::from_slice(body)
        .map_err(|e| DomainError::InvalidRequest(format!("malformed stripe event: {}", e)))?;
    if event.event_type != CHECKOUT_COMPLETED {
        return Ok(ProviderEvent::Ignored {
            event_type: event.event_type,
        });
    }

    let session: CheckoutSessionObject = serde_json::from_value(event.data.object.clone())
        .map_err(|e| DomainError::InvalidRequest(format!("malformed checkout session: {}", e)))?;
    Ok(ProviderEvent::Completed(PaymentNotice {
        transaction_id: session.id,
        event_type: event.event_type,
        correlation_id: session.metadata.get(METADATA_USER_ID).cloned(),
        address_ref: session.metadata.get(METADATA_ADDRESS_ID).cloned(),
        payment_id: session.payment_intent.unwrap_or_default(),
        payment_status: session.payment_status.unwrap_or_else(|| "unknown".to_string()),
        resource: event.data.object,
    }))
}

/// Line items that cannot be read become [`PaidLine::unreadable`] so the rest
/// of the session still settles.
pub(crate) fn paid_line(raw: Value) -> PaidLine {
    let item: StripeLineItem = match serde_json::from_value(raw.clone()) {
        Ok(item) => item,
        Err(e) => {
            log::warn!("unreadable stripe line item: {}", e);
            return PaidLine::unreadable(raw, CATALOG_CURRENCY);
        }
    };
    let (Some(sub_total), Some(total)) = (item.amount_subtotal, item.amount_total) else {
        log::warn!("stripe line item {:?} has no amounts", item.description);
        return PaidLine::unreadable(raw, CATALOG_CURRENCY);
    };
    let product = match item.price.and_then(|p| p.product) {
        Some(StripeProductRef::Expanded(product)) => Some(product),
        Some(StripeProductRef::Id(_)) | None => None,
    };
    let (product_ref, name, images) = match product {
        Some(product) => (
            product.metadata.get(METADATA_PRODUCT_ID).cloned(),
            product.name.or(item.description.clone()),
            product.images,
        ),
        None => (None, item.description.clone(), vec![]),
    };
    PaidLine {
        product_ref,
        name: name.unwrap_or_default(),
        images,
        quantity: item.quantity.unwrap_or(1),
        sub_total: from_minor_units(sub_total),
        total: from_minor_units(total),
        currency: item
            .currency
            .map(|c| c.to_ascii_uppercase())
            .unwrap_or_else(|| CATALOG_CURRENCY.to_string()),
        raw,
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_session(&self, intent: &CheckoutIntent) -> Result<ProviderSession, DomainError> {
        let form = session_form(intent, &self.settings.frontend_url)?;
        let resp = self
            .http
            .post(self.url("/v1/checkout/sessions"))
            .bearer_auth(&self.settings.secret_key)
            .form(&form)
            .send()
            .await?;
        let status = resp.status();
        let body: Value = resp.json().await?;
        if !status.is_success() {
            return Err(provider_error(status, &body));
        }

        let id = body["id"]
            .as_str()
            .ok_or_else(|| DomainError::PaymentProvider("session without id".to_string()))?
            .to_string();
        Ok(ProviderSession {
            id,
            url: body["url"].as_str().map(str::to_string),
            links: vec![],
        })
    }

    async fn verify_webhook(&self, webhook: &WebhookRequest) -> Result<(), DomainError> {
        let header = webhook.header(SIGNATURE_HEADER).ok_or_else(|| {
            DomainError::Verification(format!("missing {} header", SIGNATURE_HEADER))
        })?;
        verify_signature(
            &webhook.body,
            header,
            &self.settings.webhook_secret,
            self.settings.webhook_tolerance_secs,
            chrono::Utc::now().timestamp(),
        )
    }

    fn parse_event(&self, body: &[u8]) -> Result<ProviderEvent, DomainError> {
        parse_event(body)
    }

    async fn resolve_lines(&self, notice: &PaymentNotice) -> Result<ResolvedPayment, DomainError> {
        // A checkout session holds at most 100 line items, so one page is the whole session.
        let resp = self
            .http
            .get(self.url(&format!(
                "/v1/checkout/sessions/{}/line_items",
                notice.transaction_id
            )))
            .bearer_auth(&self.settings.secret_key)
            .query(&[("expand[]", "data.price.product"), ("limit", "100")])
            .send()
            .await?;
        let status = resp.status();
        let body: Value = resp.json().await?;
        if !status.is_success() {
            return Err(provider_error(status, &body));
        }

        let list: LineItemList = serde_json::from_value(body)
            .map_err(|e| DomainError::PaymentProvider(format!("malformed line items: {}", e)))?;
        let lines = list.data.into_iter().map(paid_line).collect();

        Ok(ResolvedPayment {
            correlation_id: notice.correlation_id.clone(),
            address_ref: notice.address_ref.clone(),
            lines,
        })
    }
}
