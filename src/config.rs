//! Process configuration read from the environment (and `.env` via dotenvy).

use std::env;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use thiserror::Error;

use crate::infrastructure::paypal::PayPalSettings;
use crate::infrastructure::stripe::StripeSettings;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_FRONTEND_URL: &str = "http://localhost:5173";
pub const DEFAULT_STRIPE_API_BASE: &str = "https://api.stripe.com";
pub const DEFAULT_STRIPE_TOLERANCE_SECS: i64 = 300;
pub const DEFAULT_PAYPAL_API_BASE: &str = "https://api-m.sandbox.paypal.com";
pub const DEFAULT_INR_TO_USD_RATE: &str = "0.012";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub access_token_secret: String,
    pub stripe: StripeSettings,
    pub paypal: PayPalSettings,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));
        let or_default = |name: &str, default: &str| get(name).unwrap_or_else(|| default.to_string());

        let port = parse_or("PORT", get("PORT"), DEFAULT_PORT)?;
        let tolerance = parse_or(
            "STRIPE_WEBHOOK_TOLERANCE_SECS",
            get("STRIPE_WEBHOOK_TOLERANCE_SECS"),
            DEFAULT_STRIPE_TOLERANCE_SECS,
        )?;
        let rate_raw = or_default("INR_TO_USD_RATE", DEFAULT_INR_TO_USD_RATE);
        let inr_to_usd_rate = BigDecimal::from_str(&rate_raw)
            .ok()
            .filter(|rate| *rate > BigDecimal::from(0))
            .ok_or(ConfigError::Invalid {
                name: "INR_TO_USD_RATE",
                value: rate_raw,
            })?;
        let frontend_url = or_default("FRONTEND_URL", DEFAULT_FRONTEND_URL);

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            host: or_default("HOST", DEFAULT_HOST),
            port,
            access_token_secret: required("ACCESS_TOKEN_SECRET")?,
            stripe: StripeSettings {
                secret_key: required("STRIPE_SECRET_KEY")?,
                webhook_secret: required("STRIPE_WEBHOOK_SECRET")?,
                api_base: or_default("STRIPE_API_BASE", DEFAULT_STRIPE_API_BASE),
                webhook_tolerance_secs: tolerance,
                frontend_url: frontend_url.clone(),
            },
            paypal: PayPalSettings {
                client_id: required("PAYPAL_CLIENT_ID")?,
                client_secret: required("PAYPAL_CLIENT_SECRET")?,
                webhook_id: required("PAYPAL_WEBHOOK_ID")?,
                api_base: or_default("PAYPAL_API_BASE", DEFAULT_PAYPAL_API_BASE),
                inr_to_usd_rate,
                frontend_url,
            },
        })
    }
}

fn parse_or<T: FromStr>(name: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}
