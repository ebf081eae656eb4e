use std::sync::Arc;
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use base64::{Engine as _, engine::general_purpose};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;

pub struct TestConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_service_role_key: String,
    pub adyen_hmac_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            supabase_service_role_key: "test-service-role-key".to_string(),
            adyen_hmac_key: "test-hmac-key-for-webhook-signing".to_string(),
        }
    }
}

impl TestConfig {
    pub fn with_supabase_url(url: &str) -> Self {
        Self {
            supabase_url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            supabase_service_role_key: self.supabase_service_role_key.clone(),
            adyen_hmac_key: self.adyen_hmac_key.clone(),
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct AdyenTestUtils;

impl AdyenTestUtils {
    /// Sign a webhook payload the way the processor does: HMAC-SHA256 over
    /// the raw body bytes, base64-encoded.
    pub fn sign_payload(payload: &[u8], hmac_key: &str) -> String {
        type HmacSha256 = Hmac<Sha256>;

        let mut mac = HmacSha256::new_from_slice(hmac_key.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(payload);
        general_purpose::STANDARD.encode(mac.finalize().into_bytes())
    }

    pub fn notification_item(event_code: &str, success: bool, merchant_reference: &str) -> Value {
        json!({
            "NotificationRequestItem": {
                "eventCode": event_code,
                "pspReference": format!("PSP-{}", Uuid::new_v4().simple()),
                "merchantReference": merchant_reference,
                "success": if success { "true" } else { "false" },
                "amount": {
                    "currency": "PHP",
                    "value": 150000
                },
                "eventDate": Utc::now().to_rfc3339(),
            }
        })
    }

    pub fn webhook_batch(items: Vec<Value>) -> Value {
        json!({
            "live": "false",
            "notificationItems": items
        })
    }

    /// A single-item AUTHORISATION batch, serialized to the exact bytes the
    /// signature should be computed over.
    pub fn authorisation_batch_body(merchant_reference: &str, success: bool) -> Vec<u8> {
        let batch = Self::webhook_batch(vec![
            Self::notification_item("AUTHORISATION", success, merchant_reference),
        ]);
        serde_json::to_vec(&batch).expect("batch serializes")
    }
}

pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    pub fn payment_row(merchant_reference: &str, status: &str) -> Value {
        json!({
            "id": Uuid::new_v4().to_string(),
            "merchant_reference": merchant_reference,
            "status": status,
            "psp_reference": "PSP-TEST",
            "payment_date": null,
            "confirmation_date": null,
            "confirmed_amount": null,
            "confirmed_currency": null,
            "failure_reason": null,
            "updated_at": Utc::now().to_rfc3339(),
        })
    }
}
