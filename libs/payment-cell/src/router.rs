use std::sync::Arc;

use axum::{routing::post, Router};

use shared_config::AppConfig;

use crate::handlers::{self, PaymentWebhookState};

pub fn payment_routes(config: Arc<AppConfig>) -> Router {
    payment_routes_with_state(PaymentWebhookState::from_config(&config))
}

/// Router over an explicit state, so tests can wire in a fake store.
pub fn payment_routes_with_state(state: PaymentWebhookState) -> Router {
    Router::new()
        .route(
            "/webhooks/adyen",
            post(handlers::adyen_webhook)
                .options(handlers::adyen_webhook_preflight)
                .fallback(handlers::method_not_allowed),
        )
        .with_state(state)
}
