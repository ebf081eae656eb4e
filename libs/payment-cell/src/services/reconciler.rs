use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info};

use shared_config::AppConfig;
use shared_database::SupabaseClient;

use crate::error::PaymentWebhookError;
use crate::models::{
    CanonicalStatus, PaymentNotification, PaymentRecordPatch, ProcessingOutcome, WebhookBatch,
};
use crate::services::normalizer::normalize_event;
use crate::services::signature::HmacSignatureVerifier;
use crate::services::store::{PaymentRecordStore, SupabasePaymentStore};

/// Orchestrates one inbound webhook batch: authenticate, parse, then apply
/// each notification to the payment store independently.
///
/// Dependencies are injected explicitly so tests can substitute a fake
/// store; there is no module-level client state.
pub struct WebhookReconciler {
    verifier: HmacSignatureVerifier,
    store: Arc<dyn PaymentRecordStore>,
}

impl WebhookReconciler {
    pub fn new(verifier: HmacSignatureVerifier, store: Arc<dyn PaymentRecordStore>) -> Self {
        Self { verifier, store }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let supabase = Arc::new(SupabaseClient::new(config));
        Self {
            verifier: HmacSignatureVerifier::new(config.adyen_hmac_key.clone()),
            store: Arc::new(SupabasePaymentStore::new(supabase)),
        }
    }

    /// All-or-nothing gate on the whole batch: no notification item is
    /// touched unless the raw body authenticates.
    pub fn authenticate(
        &self,
        raw_body: &[u8],
        signature_header: Option<&str>,
    ) -> Result<(), PaymentWebhookError> {
        let signature = signature_header.ok_or(PaymentWebhookError::MissingSignature)?;

        if !self.verifier.verify(raw_body, signature) {
            return Err(PaymentWebhookError::InvalidSignature);
        }

        Ok(())
    }

    /// Parses the raw bytes the signature was verified over. A batch with
    /// zero items is malformed: the processor never sends one, and an empty
    /// loop would acknowledge nothing.
    pub fn parse_batch(raw_body: &[u8]) -> Result<WebhookBatch, PaymentWebhookError> {
        let batch: WebhookBatch = serde_json::from_slice(raw_body)
            .map_err(|e| PaymentWebhookError::MalformedPayload(e.to_string()))?;

        if batch.notification_items.is_empty() {
            return Err(PaymentWebhookError::EmptyBatch);
        }

        Ok(batch)
    }

    /// Applies each item sequentially, in delivery order. A failing item is
    /// logged and recorded, never propagated: the batch is a fan-out of
    /// independent updates, not a transaction.
    pub async fn process_batch(&self, batch: &WebhookBatch) -> Vec<ProcessingOutcome> {
        info!(
            "Processing webhook batch: {} notification item(s), live={}",
            batch.notification_items.len(),
            batch.live
        );

        let mut outcomes = Vec::with_capacity(batch.notification_items.len());
        for item in &batch.notification_items {
            let notification = &item.notification_request_item;

            match self.process_item(notification).await {
                Ok(status) => {
                    info!(
                        "Processed notification {} for payment {}: {} -> {}",
                        notification.psp_reference,
                        notification.merchant_reference,
                        notification.event_code,
                        status
                    );
                    outcomes.push(ProcessingOutcome::processed(notification));
                }
                Err(err) => {
                    error!(
                        "Failed to process notification {} for payment {}: {}",
                        notification.psp_reference, notification.merchant_reference, err
                    );
                    outcomes.push(ProcessingOutcome::failed(notification, &err));
                }
            }
        }

        outcomes
    }

    async fn process_item(
        &self,
        notification: &PaymentNotification,
    ) -> Result<CanonicalStatus, PaymentWebhookError> {
        let status = normalize_event(&notification.event_code, notification.is_success());
        let patch = build_patch(notification, status);

        self.store
            .update_by_merchant_reference(&notification.merchant_reference, &patch)
            .await?;

        Ok(status)
    }
}

/// Builds the field patch for one notification. Redelivering the same
/// notification rebuilds the same patch (modulo `updated_at`), so applying
/// it again leaves the record in the same state.
pub fn build_patch(
    notification: &PaymentNotification,
    status: CanonicalStatus,
) -> PaymentRecordPatch {
    let now = Utc::now();

    let is_authorisation = notification.event_code.trim().eq_ignore_ascii_case("AUTHORISATION");
    let event_date = notification.event_date.unwrap_or(now);

    let payment_date = is_authorisation.then_some(event_date);
    let confirmation_date = (is_authorisation && notification.is_success()).then_some(event_date);

    let failure_reason = match &notification.reason {
        Some(reason) => Some(reason.clone()),
        None if status.is_failure() => {
            Some(format!("{} reported unsuccessful", notification.event_code))
        }
        None => None,
    };

    PaymentRecordPatch {
        psp_reference: Some(notification.psp_reference.clone()),
        status: Some(status),
        payment_date,
        confirmation_date,
        confirmed_amount: notification.amount.as_ref().map(|a| a.value),
        confirmed_currency: notification.amount.as_ref().map(|a| a.currency.clone()),
        failure_reason,
        updated_at: now,
    }
}
