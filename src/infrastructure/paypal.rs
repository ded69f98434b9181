//! PayPal Orders v2 checkout.
//!
//! Orders settle in USD. INR catalog amounts are converted with a fixed rate
//! from configuration, so settled amounts drift from live exchange rates.

use std::time::Duration;

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::domain::checkout::CheckoutIntent;
use crate::domain::errors::DomainError;
use crate::domain::payment::{
    PaidLine, PaymentGateway, PaymentNotice, ProviderEvent, ProviderLink, ProviderSession,
    ResolvedPayment, WebhookRequest,
};
use crate::domain::pricing::convert;

pub const ORDER_APPROVED: &str = "CHECKOUT.ORDER.APPROVED";
pub const CAPTURE_COMPLETED: &str = "PAYMENT.CAPTURE.COMPLETED";
pub const FALLBACK_COUNTRY_CODE: &str = "IN";

const SETTLEMENT_CURRENCY: &str = "USD";
const MAX_ITEM_NAME: usize = 127;

const COUNTRY_CODES: &[(&str, &str)] = &[
    ("india", "IN"),
    ("united states", "US"),
    ("united kingdom", "GB"),
    ("canada", "CA"),
    ("australia", "AU"),
    ("germany", "DE"),
    ("france", "FR"),
    ("singapore", "SG"),
    ("united arab emirates", "AE"),
];

const TRANSMISSION_HEADERS: [(&str, &str); 5] = [
    ("auth_algo", "paypal-auth-algo"),
    ("cert_url", "paypal-cert-url"),
    ("transmission_id", "paypal-transmission-id"),
    ("transmission_sig", "paypal-transmission-sig"),
    ("transmission_time", "paypal-transmission-time"),
];

#[derive(Debug, Clone)]
pub struct PayPalSettings {
    pub client_id: String,
    pub client_secret: String,
    pub webhook_id: String,
    pub api_base: String,
    pub inr_to_usd_rate: BigDecimal,
    pub frontend_url: String,
}

pub struct PayPalGateway {
    http: Client,
    settings: PayPalSettings,
}

impl PayPalGateway {
    pub fn new(settings: PayPalSettings) -> Result<Self, DomainError> {
        let http = Client::builder().timeout(Duration::from_secs(15)).build()?;
        Ok(Self { http, settings })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.settings.api_base.trim_end_matches('/'), path)
    }

    async fn access_token(&self) -> Result<String, DomainError> {
        let resp = self
            .http
            .post(self.url("/v1/oauth2/token"))
            .basic_auth(&self.settings.client_id, Some(&self.settings.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;
        let status = resp.status();
        let body: Value = resp.json().await?;
        if !status.is_success() {
            return Err(provider_error(status, &body));
        }
        body["access_token"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| DomainError::PaymentProvider("token response without access_token".to_string()))
    }

    async fn fetch_order(&self, order_id: &str) -> Result<PayPalOrder, DomainError> {
        let token = self.access_token().await?;
        let resp = self
            .http
            .get(self.url(&format!("/v2/checkout/orders/{}", order_id)))
            .bearer_auth(token)
            .send()
            .await?;
        let status = resp.status();
        let body: Value = resp.json().await?;
        if !status.is_success() {
            return Err(provider_error(status, &body));
        }
        serde_json::from_value(body)
            .map_err(|e| DomainError::PaymentProvider(format!("malformed order: {}", e)))
    }
}

/// Two-letter code for a country name; unlisted names fall back to `IN`.
pub fn country_code(name: &str) -> &'static str {
    let needle = name.trim().to_lowercase();
    COUNTRY_CODES
        .iter()
        .find(|(country, _)| *country == needle)
        .map(|(_, code)| *code)
        .unwrap_or(FALLBACK_COUNTRY_CODE)
}

fn money(amount: &BigDecimal) -> String {
    amount.with_scale(2).to_string()
}

fn provider_error(status: StatusCode, body: &Value) -> DomainError {
    let message = body["message"]
        .as_str()
        .or_else(|| body["error_description"].as_str())
        .unwrap_or("no message");
    DomainError::PaymentProvider(format!("paypal returned {}: {}", status, message))
}

/// Body for `POST /v2/checkout/orders`.
///
/// The user id travels as `custom_id` and the address id as `reference_id`,
/// because PayPal echoes both back on webhooks. Product ids travel as SKUs.
pub(crate) fn order_body(
    intent: &CheckoutIntent,
    rate: &BigDecimal,
    frontend_url: &str,
) -> Value {
    let base = frontend_url.trim_end_matches('/');
    let mut item_total = BigDecimal::from(0);
    let items: Vec<Value> = intent
        .lines
        .iter()
        .map(|line| {
            let unit = convert(&line.unit_price(), rate);
            item_total += &unit * BigDecimal::from(line.quantity);
            json!({
                "name": line.product.name.chars().take(MAX_ITEM_NAME).collect::<String>(),
                "sku": line.product.id.to_string(),
                "quantity": line.quantity.to_string(),
                "unit_amount": { "currency_code": SETTLEMENT_CURRENCY, "value": money(&unit) },
            })
        })
        .collect();

    let address = &intent.address;
    let code = country_code(&address.country);
    if code == FALLBACK_COUNTRY_CODE && !address.country.trim().eq_ignore_ascii_case("india") {
        log::warn!(
            "no country code for '{}', shipping to fallback {}",
            address.country,
            FALLBACK_COUNTRY_CODE
        );
    }

    json!({
        "intent": "CAPTURE",
        "purchase_units": [{
            "reference_id": address.id.to_string(),
            "custom_id": intent.user_id().to_string(),
            "amount": {
                "currency_code": SETTLEMENT_CURRENCY,
                "value": money(&item_total),
                "breakdown": {
                    "item_total": { "currency_code": SETTLEMENT_CURRENCY, "value": money(&item_total) }
                }
            },
            "items": items,
            "shipping": {
                "name": { "full_name": intent.customer.name },
                "address": {
                    "address_line_1": address.address_line,
                    "admin_area_2": address.city,
                    "admin_area_1": address.state,
                    "postal_code": address.pincode,
                    "country_code": code,
                }
            }
        }],
        "application_context": {
            "return_url": format!("{}/success", base),
            "cancel_url": format!("{}/cancel", base),
            "shipping_preference": "SET_PROVIDED_ADDRESS",
            "user_action": "PAY_NOW",
        }
    })
}

/// Body for `POST /v1/notifications/verify-webhook-signature`.
pub(crate) fn verification_request(webhook: &WebhookRequest, webhook_id: &str) -> Result<Value, DomainError> {
    let event: Value = serde_json::from_slice(&webhook.body)
        .map_err(|_| DomainError::Verification("webhook body is not JSON".to_string()))?;
    let mut request = json!({ "webhook_id": webhook_id, "webhook_event": event });
    for (field, header) in TRANSMISSION_HEADERS {
        let value = webhook
            .header(header)
            .ok_or_else(|| DomainError::Verification(format!("missing {} header", header)))?;
        request[field] = Value::String(value.to_string());
    }
    Ok(request)
}

// ── Wire types ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct PayPalEvent {
    event_type: String,
    resource: Value,
}

#[derive(Debug, Clone, Deserialize)]
struct PayPalOrder {
    id: String,
    status: Option<String>,
    #[serde(default)]
    purchase_units: Vec<PurchaseUnit>,
}

#[derive(Debug, Clone, Deserialize)]
struct PurchaseUnit {
    reference_id: Option<String>,
    custom_id: Option<String>,
    #[serde(default)]
    items: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct PayPalCapture {
    id: String,
    status: Option<String>,
    custom_id: Option<String>,
    supplementary_data: Option<SupplementaryData>,
}

#[derive(Debug, Deserialize)]
struct SupplementaryData {
    related_ids: Option<RelatedIds>,
}

#[derive(Debug, Deserialize)]
struct RelatedIds {
    order_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PayPalItem {
    name: String,
    sku: Option<String>,
    quantity: String,
    unit_amount: PayPalMoney,
}

#[derive(Debug, Deserialize)]
struct PayPalMoney {
    currency_code: Option<String>,
    value: String,
}

#[derive(Debug, Deserialize)]
struct CreatedOrder {
    id: String,
    #[serde(default)]
    links: Vec<CreatedLink>,
}

#[derive(Debug, Deserialize)]
struct CreatedLink {
    href: String,
    rel: String,
    method: Option<String>,
}

fn malformed(what: &str, e: serde_json::Error) -> DomainError {
    DomainError::InvalidRequest(format!("malformed paypal {}: {}", what, e))
}

pub(crate) fn parse_event(body: &[u8]) -> Result<ProviderEvent, DomainError> {
    let event: PayPalEvent = serde_json::from_slice(body).map_err(|e| malformed("event", e))?;
    match event.event_type.as_str() {
        ORDER_APPROVED => {
            let order: PayPalOrder =
                serde_json::from_value(event.resource.clone()).map_err(|e| malformed("order", e))?;
            let unit = order.purchase_units.first();
            Ok(ProviderEvent::Completed(PaymentNotice {
                correlation_id: unit.and_then(|u| u.custom_id.clone()),
                address_ref: unit.and_then(|u| u.reference_id.clone()),
                payment_id: order.id.clone(),
                payment_status: order.status.unwrap_or_else(|| "APPROVED".to_string()),
                transaction_id: order.id,
                event_type: event.event_type,
                resource: event.resource,
            }))
        }
        CAPTURE_COMPLETED => {
            let capture: PayPalCapture = serde_json::from_value(event.resource.clone())
                .map_err(|e| malformed("capture", e))?;
            let order_id = capture
                .supplementary_data
                .and_then(|s| s.related_ids)
                .and_then(|r| r.order_id)
                .unwrap_or_else(|| capture.id.clone());
            Ok(ProviderEvent::Completed(PaymentNotice {
                transaction_id: order_id,
                event_type: event.event_type,
                correlation_id: capture.custom_id,
                address_ref: None,
                payment_id: capture.id,
                payment_status: capture.status.unwrap_or_else(|| "COMPLETED".to_string()),
                resource: event.resource,
            }))
        }
        _ => Ok(ProviderEvent::Ignored {
            event_type: event.event_type,
        }),
    }
}

fn paid_line(raw: &Value) -> Result<PaidLine, String> {
    let item: PayPalItem = serde_json::from_value(raw.clone()).map_err(|e| e.to_string())?;
    let quantity: i32 = item
        .quantity
        .parse()
        .map_err(|_| format!("bad quantity '{}'", item.quantity))?;
    let unit: BigDecimal = item
        .unit_amount
        .value
        .parse()
        .map_err(|_| format!("bad amount '{}'", item.unit_amount.value))?;
    let total = unit * BigDecimal::from(quantity);
    Ok(PaidLine {
        product_ref: item.sku,
        name: item.name,
        images: vec![],
        quantity,
        sub_total: total.clone(),
        total,
        currency: item
            .unit_amount
            .currency_code
            .unwrap_or_else(|| SETTLEMENT_CURRENCY.to_string()),
        raw: raw.clone(),
    })
}

/// Unreadable items become [`PaidLine::unreadable`] and the rest still settle.
fn paid_lines(order: &PayPalOrder) -> Vec<PaidLine> {
    order
        .purchase_units
        .iter()
        .flat_map(|u| u.items.iter())
        .map(|raw| {
            paid_line(raw).unwrap_or_else(|e| {
                log::warn!("unreadable item in paypal order {}: {}", order.id, e);
                PaidLine::unreadable(raw.clone(), SETTLEMENT_CURRENCY)
            })
        })
        .collect()
}

#[async_trait]
impl PaymentGateway for PayPalGateway {
    async fn create_session(&self, intent: &CheckoutIntent) -> Result<ProviderSession, DomainError> {
        let body = order_body(intent, &self.settings.inr_to_usd_rate, &self.settings.frontend_url);
        let token = self.access_token().await?;
        let resp = self
            .http
            .post(self.url("/v2/checkout/orders"))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;
        let status = resp.status();
        let raw: Value = resp.json().await?;
        if !status.is_success() {
            return Err(provider_error(status, &raw));
        }

        let created: CreatedOrder = serde_json::from_value(raw.clone())
            .map_err(|e| DomainError::PaymentProvider(format!("malformed order: {}", e)))?;
        let links: Vec<ProviderLink> = created
            .links
            .into_iter()
            .map(|l| ProviderLink {
                href: l.href,
                rel: l.rel,
                method: l.method,
            })
            .collect();
        Ok(ProviderSession {
            id: created.id,
            url: links.iter().find(|l| l.rel == "approve").map(|l| l.href.clone()),
            links,
        })
    }

    async fn verify_webhook(&self, webhook: &WebhookRequest) -> Result<(), DomainError> {
        let request = verification_request(webhook, &self.settings.webhook_id)?;
        let token = self.access_token().await?;
        let resp = self
            .http
            .post(self.url("/v1/notifications/verify-webhook-signature"))
            .bearer_auth(token)
            .json(&request)
            .send()
            .await?;
        let status = resp.status();
        let body: Value = resp.json().await?;
        if !status.is_success() {
            return Err(provider_error(status, &body));
        }
        match body["verification_status"].as_str() {
            Some("SUCCESS") => Ok(()),
            other => Err(DomainError::Verification(format!(
                "verification status {}",
                other.unwrap_or("missing")
            ))),
        }
    }

    fn parse_event(&self, body: &[u8]) -> Result<ProviderEvent, DomainError> {
        parse_event(body)
    }

    async fn resolve_lines(&self, notice: &PaymentNotice) -> Result<ResolvedPayment, DomainError> {
        let embedded = if notice.event_type == ORDER_APPROVED {
            serde_json::from_value::<PayPalOrder>(notice.resource.clone())
                .ok()
                .filter(|o| o.purchase_units.iter().any(|u| !u.items.is_empty()))
        } else {
            None
        };
        let order = match embedded {
            Some(order) => order,
            None => self.fetch_order(&notice.transaction_id).await?,
        };

        let unit = order.purchase_units.first();
        Ok(ResolvedPayment {
            correlation_id: notice
                .correlation_id
                .clone()
                .or_else(|| unit.and_then(|u| u.custom_id.clone())),
            address_ref: notice
                .address_ref
                .clone()
                .or_else(|| unit.and_then(|u| u.reference_id.clone())),
            lines: paid_lines(&order),
        })
    }
}
