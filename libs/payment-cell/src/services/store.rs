use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use tracing::debug;

use shared_database::SupabaseClient;

use crate::error::StoreError;
use crate::models::{PaymentRecord, PaymentRecordPatch};

/// Persistence seam for payment records. The reconciler only ever updates
/// existing rows by merchant reference; creation belongs to the payment
/// initiation flow.
#[async_trait]
pub trait PaymentRecordStore: Send + Sync {
    async fn update_by_merchant_reference(
        &self,
        merchant_reference: &str,
        patch: &PaymentRecordPatch,
    ) -> Result<(), StoreError>;
}

/// Production store backed by the Supabase PostgREST API: a plain PATCH on
/// the `payments` table filtered by merchant reference.
pub struct SupabasePaymentStore {
    supabase: Arc<SupabaseClient>,
}

impl SupabasePaymentStore {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }
}

#[async_trait]
impl PaymentRecordStore for SupabasePaymentStore {
    async fn update_by_merchant_reference(
        &self,
        merchant_reference: &str,
        patch: &PaymentRecordPatch,
    ) -> Result<(), StoreError> {
        let path = format!(
            "/rest/v1/payments?merchant_reference=eq.{}",
            urlencoding::encode(merchant_reference)
        );
        let body = serde_json::to_value(patch)
            .map_err(|e| StoreError::Rejected(e.to_string()))?;

        let token = self.supabase.service_role_token().to_string();
        let updated: Vec<PaymentRecord> = self
            .supabase
            .request_returning(Method::PATCH, &path, Some(&token), Some(body))
            .await
            .map_err(classify_store_error)?;

        // PATCH against a missing row succeeds with an empty representation.
        if updated.is_empty() {
            return Err(StoreError::NotFound(merchant_reference.to_string()));
        }

        debug!(
            "Updated payment {} to status {}",
            merchant_reference,
            patch.status.map(|s| s.as_str()).unwrap_or("<unchanged>")
        );
        Ok(())
    }
}

/// Transport-level failures (connect, timeout) are retryable by the
/// processor's redelivery; everything else is a rejected update.
fn classify_store_error(err: anyhow::Error) -> StoreError {
    if err.downcast_ref::<reqwest::Error>().is_some() {
        StoreError::Unavailable(err.to_string())
    } else {
        StoreError::Rejected(err.to_string())
    }
}
