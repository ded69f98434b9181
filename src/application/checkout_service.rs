//! Builds a checkout intent from live catalog data and hands it to a
//! payment provider.

use std::collections::HashMap;
use std::sync::Arc;

use bigdecimal::BigDecimal;
use uuid::Uuid;

use super::blocking;
use crate::domain::checkout::{CheckoutIntent, CheckoutLine, CheckoutRequest};
use crate::domain::errors::DomainError;
use crate::domain::payment::{Gateways, ProviderSession};
use crate::domain::ports::Catalog;
use crate::domain::transaction::ProviderKind;

#[derive(Clone)]
pub struct CheckoutService {
    catalog: Arc<dyn Catalog>,
    gateways: Gateways,
}

impl CheckoutService {
    pub fn new(catalog: Arc<dyn Catalog>, gateways: Gateways) -> Self {
        Self { catalog, gateways }
    }

    /// Hosted card checkout or PayPal order for the selected lines.
    pub async fn create_session(
        &self,
        kind: ProviderKind,
        user_id: Uuid,
        request: CheckoutRequest,
    ) -> Result<ProviderSession, DomainError> {
        let intent = build_intent(&self.catalog, user_id, request).await?;
        let gateway = self.gateways.get(kind);
        let session = gateway.create_session(&intent).await.map_err(|e| {
            log::error!("{} session creation failed for user {}: {}", kind, user_id, e);
            e
        })?;
        log::info!(
            "{} session {} created for user {} ({} lines)",
            kind,
            session.id,
            user_id,
            intent.lines.len()
        );
        Ok(session)
    }
}

/// Resolve a raw request against the catalog. Shared by every payment path.
///
/// Only presence is validated here; stock is not checked.
pub(crate) async fn build_intent(
    catalog: &Arc<dyn Catalog>,
    user_id: Uuid,
    request: CheckoutRequest,
) -> Result<CheckoutIntent, DomainError> {
    if request.lines.is_empty() {
        return Err(DomainError::InvalidRequest(
            "Provide list_items and addressId".to_string(),
        ));
    }
    let address_id = request.address_id.ok_or_else(|| {
        DomainError::InvalidRequest("Provide list_items and addressId".to_string())
    })?;
    if let Some(bad) = request.lines.iter().find(|l| l.quantity < 1) {
        return Err(DomainError::InvalidRequest(format!(
            "quantity for product {} must be at least 1",
            bad.product_id
        )));
    }

    let catalog = Arc::clone(catalog);
    let ids: Vec<Uuid> = request.lines.iter().map(|l| l.product_id).collect();
    let (customer, address, products) = blocking(move || {
        let customer = catalog.find_customer(user_id)?;
        let address = catalog.find_address(user_id, address_id)?;
        let products = catalog.find_products(&ids)?;
        Ok((customer, address, products))
    })
    .await?;

    let customer = customer.ok_or_else(|| DomainError::NotFound("User not found".to_string()))?;
    let address =
        address.ok_or_else(|| DomainError::NotFound("Address not found".to_string()))?;
    let by_id: HashMap<Uuid, _> = products.into_iter().map(|p| (p.id, p)).collect();

    let mut lines = Vec::with_capacity(request.lines.len());
    for selection in &request.lines {
        let product = by_id.get(&selection.product_id).cloned().ok_or_else(|| {
            DomainError::NotFound(format!("Product {} not found", selection.product_id))
        })?;
        lines.push(CheckoutLine {
            product,
            quantity: selection.quantity,
        });
    }

    let sub_total = request.sub_total.unwrap_or_else(|| {
        lines
            .iter()
            .fold(BigDecimal::from(0), |acc, line| acc + line.sub_total())
    });
    let mut intent = CheckoutIntent {
        customer,
        address,
        lines,
        sub_total,
        total: BigDecimal::from(0),
    };
    intent.total = request.total.unwrap_or_else(|| intent.computed_total());
    Ok(intent)
}
