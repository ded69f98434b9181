use utoipa::OpenApi;

use crate::handlers::cart::{
    AddToCartRequest, CartItemResponse, CartLineResponse, RemoveCartItemRequest,
    UpdateQuantityRequest,
};
use crate::handlers::checkout::{LinkResponse, SessionResponse};
use crate::handlers::webhooks::WebhookAck;
use crate::handlers::{
    AddressResponse, CheckoutBody, ListItemRequest, OrderResponse, ProductDetails, ProductResponse,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Grocery Checkout API",
        version = "0.1.0",
        description = "Cart, checkout sessions, cash-on-delivery and payment webhook reconciliation."
    ),
    paths(
        crate::handlers::cart::get_cart,
        crate::handlers::cart::add_to_cart,
        crate::handlers::cart::update_cart_quantity,
        crate::handlers::cart::remove_cart_item,
        crate::handlers::checkout::card_checkout,
        crate::handlers::checkout::paypal_checkout,
        crate::handlers::orders::cash_on_delivery,
        crate::handlers::orders::list_orders,
        crate::handlers::webhooks::card_webhook,
        crate::handlers::webhooks::paypal_webhook,
    ),
    components(schemas(
        AddToCartRequest,
        UpdateQuantityRequest,
        RemoveCartItemRequest,
        CartLineResponse,
        CartItemResponse,
        CheckoutBody,
        ListItemRequest,
        SessionResponse,
        LinkResponse,
        OrderResponse,
        ProductDetails,
        ProductResponse,
        AddressResponse,
        WebhookAck,
    )),
    tags(
        (name = "cart", description = "Per-user cart lines"),
        (name = "checkout", description = "Hosted provider checkout"),
        (name = "orders", description = "Cash on delivery and order history"),
        (name = "webhooks", description = "Provider payment notifications"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/cart",
            "/checkout",
            "/paypal-checkout",
            "/cash-on-delivery",
            "/orders",
            "/webhook",
            "/paypal-webhook",
        ] {
            assert!(doc.paths.paths.contains_key(path), "{} missing", path);
        }
    }
}
