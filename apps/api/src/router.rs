use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use payment_cell::router::payment_routes;
use shared_config::AppConfig;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(|| async { "Igabay Care payments API is running!" }))
        .nest("/payments", payment_routes(state.clone()))
}
