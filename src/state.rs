use std::sync::Arc;

use crate::application::cart_service::CartService;
use crate::application::cash_on_delivery::CashOnDeliveryService;
use crate::application::checkout_service::CheckoutService;
use crate::application::order_history::OrderHistoryService;
use crate::application::reconciler::WebhookReconciler;
use crate::config::AppConfig;
use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::payment::Gateways;
use crate::domain::ports::{CartStore, Catalog, OrderStore};
use crate::infrastructure::cart_repo::DieselCartStore;
use crate::infrastructure::catalog_repo::DieselCatalog;
use crate::infrastructure::order_repo::DieselOrderStore;
use crate::infrastructure::paypal::PayPalGateway;
use crate::infrastructure::stripe::StripeGateway;

/// Services shared by every worker.
#[derive(Clone)]
pub struct AppState {
    pub cart: CartService,
    pub checkout: CheckoutService,
    pub cash_on_delivery: CashOnDeliveryService,
    pub history: OrderHistoryService,
    pub reconciler: WebhookReconciler,
}

impl AppState {
    pub fn new(
        cart: Arc<dyn CartStore>,
        catalog: Arc<dyn Catalog>,
        orders: Arc<dyn OrderStore>,
        gateways: Gateways,
    ) -> Self {
        Self {
            cart: CartService::new(cart),
            checkout: CheckoutService::new(Arc::clone(&catalog), gateways.clone()),
            cash_on_delivery: CashOnDeliveryService::new(Arc::clone(&catalog), Arc::clone(&orders)),
            history: OrderHistoryService::new(Arc::clone(&orders)),
            reconciler: WebhookReconciler::new(gateways, orders, catalog),
        }
    }

    /// Postgres-backed stores and live provider gateways.
    pub fn from_config(pool: DbPool, config: &AppConfig) -> Result<Self, DomainError> {
        let gateways = Gateways::new(
            Arc::new(StripeGateway::new(config.stripe.clone())?),
            Arc::new(PayPalGateway::new(config.paypal.clone())?),
        );
        Ok(Self::new(
            Arc::new(DieselCartStore::new(pool.clone())),
            Arc::new(DieselCatalog::new(pool.clone())),
            Arc::new(DieselOrderStore::new(pool)),
            gateways,
        ))
    }
}
