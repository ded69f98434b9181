//! Provider transactions and the reconciliation state they move through.

use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

use super::order::{NewOrder, Order};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    Card,
    PayPal,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Card => "stripe",
            ProviderKind::PayPal => "paypal",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stripe" => Ok(ProviderKind::Card),
            "paypal" => Ok(ProviderKind::PayPal),
            other => Err(format!("unknown payment provider '{}'", other)),
        }
    }
}

/// `NOTIFIED -> VERIFIED -> MATERIALIZED -> CART_CLEARED`, or `REJECTED`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    Notified,
    Verified,
    Materialized,
    CartCleared,
    Rejected,
}

impl TransactionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionState::Notified => "NOTIFIED",
            TransactionState::Verified => "VERIFIED",
            TransactionState::Materialized => "MATERIALIZED",
            TransactionState::CartCleared => "CART_CLEARED",
            TransactionState::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NOTIFIED" => Ok(TransactionState::Notified),
            "VERIFIED" => Ok(TransactionState::Verified),
            "MATERIALIZED" => Ok(TransactionState::Materialized),
            "CART_CLEARED" => Ok(TransactionState::CartCleared),
            "REJECTED" => Ok(TransactionState::Rejected),
            other => Err(format!("unknown transaction state '{}'", other)),
        }
    }
}

/// Idempotency key of a webhook-driven settlement.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransactionKey {
    pub provider: ProviderKind,
    pub transaction_id: String,
}

impl TransactionKey {
    pub fn new(provider: ProviderKind, transaction_id: impl Into<String>) -> Self {
        Self {
            provider,
            transaction_id: transaction_id.into(),
        }
    }
}

/// A paid line item that could not be turned into an order row.
#[derive(Debug, Clone)]
pub struct DeadLetter {
    pub reason: String,
    pub payload: serde_json::Value,
}

/// Everything a verified completion event resolved to, written atomically.
#[derive(Debug, Clone)]
pub struct Settlement {
    pub key: TransactionKey,
    pub user_id: Option<Uuid>,
    pub orders: Vec<NewOrder>,
    pub dead_letters: Vec<DeadLetter>,
}

#[derive(Debug, Clone)]
pub enum SettlementOutcome {
    Materialized {
        orders: Vec<Order>,
        cart_lines_cleared: usize,
    },
    Rejected {
        reason: String,
    },
    Duplicate {
        state: TransactionState,
    },
}
