use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{error, warn};

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::services::reconciler::WebhookReconciler;

/// Exact response body the processor requires to suppress redelivery.
pub const ACKNOWLEDGMENT: &str = "[accepted]";

pub const HMAC_SIGNATURE_HEADER: &str = "x-adyen-hmac-signature";
/// Legacy header name still sent by older processor configurations.
pub const HMAC_SIGNATURE_HEADER_FALLBACK: &str = "hmac-signature";

#[derive(Clone)]
pub struct PaymentWebhookState {
    pub reconciler: Arc<WebhookReconciler>,
}

impl PaymentWebhookState {
    pub fn new(reconciler: Arc<WebhookReconciler>) -> Self {
        Self { reconciler }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(Arc::new(WebhookReconciler::from_config(config)))
    }
}

/// Receives a processor webhook batch.
///
/// The body arrives as raw bytes and the signature check runs before any
/// JSON parsing. Once the batch authenticates, the response is always the
/// acknowledgment token: anything else makes the processor redeliver an
/// already-received batch indefinitely.
pub async fn adyen_webhook(
    State(state): State<PaymentWebhookState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let signature = extract_signature(&headers);

    if let Err(err) = state.reconciler.authenticate(&body, signature.as_deref()) {
        warn!("Webhook rejected: {}", err);
        return AppError::Auth(err.to_string()).into_response();
    }

    let batch = match WebhookReconciler::parse_batch(&body) {
        Ok(batch) => batch,
        Err(err) => {
            warn!("Authenticated webhook with unusable payload: {}", err);
            return AppError::BadRequest(err.to_string()).into_response();
        }
    };

    // Run the item loop on its own task so that even a panic escaping it is
    // contained as a JoinError and the processor still gets its ack.
    let reconciler = Arc::clone(&state.reconciler);
    let processed = tokio::spawn(async move { reconciler.process_batch(&batch).await }).await;

    match processed {
        Ok(outcomes) => {
            let failed = outcomes.iter().filter(|o| o.is_failed()).count();
            if failed > 0 {
                warn!(
                    "{} of {} notification item(s) failed; acknowledging anyway",
                    failed,
                    outcomes.len()
                );
            }
        }
        Err(err) => {
            error!("Webhook batch processing aborted unexpectedly: {}", err);
        }
    }

    acknowledgment()
}

/// CORS preflight for the webhook route. Permissive, and lists the custom
/// signature headers alongside the standard ones.
pub async fn adyen_webhook_preflight() -> Response {
    (
        StatusCode::NO_CONTENT,
        [
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (header::ACCESS_CONTROL_ALLOW_METHODS, "POST, OPTIONS"),
            (
                header::ACCESS_CONTROL_ALLOW_HEADERS,
                "authorization, content-type, x-adyen-hmac-signature, hmac-signature",
            ),
        ],
    )
        .into_response()
}

pub async fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({
            "success": false,
            "error": "Method not allowed"
        })),
    )
        .into_response()
}

fn extract_signature(headers: &HeaderMap) -> Option<String> {
    headers
        .get(HMAC_SIGNATURE_HEADER)
        .or_else(|| headers.get(HMAC_SIGNATURE_HEADER_FALLBACK))
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
}

fn acknowledgment() -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain")],
        ACKNOWLEDGMENT,
    )
        .into_response()
}
