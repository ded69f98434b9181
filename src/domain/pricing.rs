//! Amount arithmetic for the locally trusted price path.
//!
//! Checkout sessions and cash-on-delivery orders derive every amount from the
//! catalog through [`effective_price`]. Orders materialized from provider
//! webhooks never call into this module: they record whatever the provider
//! reports as settled.

use bigdecimal::{BigDecimal, RoundingMode, ToPrimitive, Zero};

use super::errors::DomainError;

/// Currency of catalog prices and of cash-on-delivery orders.
pub const CATALOG_CURRENCY: &str = "INR";

/// `price - ceil(price * discount / 100)`, floored at zero.
///
/// Discounts outside `0..=100` are clamped into that range.
pub fn effective_price(price: &BigDecimal, discount_percent: i32) -> BigDecimal {
    let discount = BigDecimal::from(discount_percent.clamp(0, 100));
    let cut = (price * &discount / BigDecimal::from(100)).with_scale_round(0, RoundingMode::Ceiling);
    let actual = price - cut;
    if actual < BigDecimal::zero() {
        BigDecimal::zero()
    } else {
        actual
    }
}

/// Major units to minor units (x100), rounding half up.
pub fn to_minor_units(amount: &BigDecimal) -> Result<i64, DomainError> {
    (amount * BigDecimal::from(100))
        .with_scale_round(0, RoundingMode::HalfUp)
        .to_i64()
        .ok_or_else(|| DomainError::InvalidRequest(format!("amount {} is out of range", amount)))
}

pub fn from_minor_units(minor: i64) -> BigDecimal {
    BigDecimal::new(minor.into(), 2)
}

/// Convert with a fixed rate, rounded half up to two decimal places.
pub fn convert(amount: &BigDecimal, rate: &BigDecimal) -> BigDecimal {
    (amount * rate).with_scale_round(2, RoundingMode::HalfUp)
}
