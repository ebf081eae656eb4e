mod common;

use assert_matches::assert_matches;

use payment_cell::error::PaymentWebhookError;
use payment_cell::models::{
    CanonicalStatus, NotificationItem, OutcomeStatus, PaymentNotification, WebhookBatch,
};
use payment_cell::services::reconciler::{build_patch, WebhookReconciler};

use common::{event_date, notification, reconciler_with, RecordingStore, StoreBehavior};

fn batch_of(notifications: Vec<PaymentNotification>) -> WebhookBatch {
    WebhookBatch {
        live: "false".to_string(),
        notification_items: notifications
            .into_iter()
            .map(|notification_request_item| NotificationItem {
                notification_request_item,
            })
            .collect(),
    }
}

#[tokio::test]
async fn authorisation_success_updates_record() {
    let store = RecordingStore::new();
    let reconciler = reconciler_with(store.clone());

    let mut item = notification("AUTHORISATION", true, "IGC-1", "PSP1");
    item.amount = None;
    let outcomes = reconciler.process_batch(&batch_of(vec![item])).await;

    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].status, OutcomeStatus::Processed);

    let patch = store.last_patch_for("IGC-1").expect("record was updated");
    assert_eq!(patch.status, Some(CanonicalStatus::Authorized));
    assert_eq!(patch.psp_reference.as_deref(), Some("PSP1"));
    assert_eq!(patch.payment_date, Some(event_date()));
    assert_eq!(patch.confirmation_date, Some(event_date()));
    assert_eq!(patch.failure_reason, None);
}

#[tokio::test]
async fn refused_authorisation_keeps_reason_and_no_confirmation() {
    let store = RecordingStore::new();
    let reconciler = reconciler_with(store.clone());

    let mut item = notification("AUTHORISATION", false, "IGC-2", "PSP2");
    item.reason = Some("Refused by issuer".to_string());
    let outcomes = reconciler.process_batch(&batch_of(vec![item])).await;

    assert_eq!(outcomes[0].status, OutcomeStatus::Processed);

    let patch = store.last_patch_for("IGC-2").expect("record was updated");
    assert_eq!(patch.status, Some(CanonicalStatus::Refused));
    assert_eq!(patch.failure_reason.as_deref(), Some("Refused by issuer"));
    assert_eq!(patch.confirmation_date, None);
}

#[tokio::test]
async fn unknown_event_degrades_to_pending() {
    let store = RecordingStore::new();
    let reconciler = reconciler_with(store.clone());

    let item = notification("SOME_NEW_EVENT", true, "IGC-3", "PSP3");
    let outcomes = reconciler.process_batch(&batch_of(vec![item])).await;

    assert_eq!(outcomes[0].status, OutcomeStatus::Processed);

    let patch = store.last_patch_for("IGC-3").expect("record was updated");
    assert_eq!(patch.status, Some(CanonicalStatus::Pending));
    // Not an authorisation: no payment/confirmation dates.
    assert_eq!(patch.payment_date, None);
    assert_eq!(patch.confirmation_date, None);
}

#[tokio::test]
async fn redelivered_notification_is_idempotent() {
    let store = RecordingStore::new();
    let reconciler = reconciler_with(store.clone());

    let item = notification("CAPTURE", true, "IGC-4", "PSP4");
    let batch = batch_of(vec![item]);

    reconciler.process_batch(&batch).await;
    reconciler.process_batch(&batch).await;

    let attempts = store.attempts();
    assert_eq!(attempts.len(), 2);

    let (first, second) = (&attempts[0].1, &attempts[1].1);
    assert_eq!(first.status, second.status);
    assert_eq!(first.psp_reference, second.psp_reference);
    assert_eq!(first.payment_date, second.payment_date);
    assert_eq!(first.confirmation_date, second.confirmation_date);
    assert_eq!(first.confirmed_amount, second.confirmed_amount);
    assert_eq!(first.confirmed_currency, second.confirmed_currency);
    assert_eq!(first.failure_reason, second.failure_reason);
}

#[tokio::test]
async fn failing_item_does_not_stop_the_batch() {
    let store = RecordingStore::new();
    store.set_behavior("IGC-BROKEN", StoreBehavior::Unavailable);
    let reconciler = reconciler_with(store.clone());

    let batch = batch_of(vec![
        notification("AUTHORISATION", true, "IGC-5", "PSP5"),
        notification("CAPTURE", true, "IGC-BROKEN", "PSP6"),
        notification("REFUND", true, "IGC-7", "PSP7"),
    ]);

    let outcomes = reconciler.process_batch(&batch).await;

    assert_eq!(outcomes.len(), 3);
    assert_eq!(outcomes[0].status, OutcomeStatus::Processed);
    assert_eq!(outcomes[1].status, OutcomeStatus::Failed);
    assert!(outcomes[1].error.as_deref().unwrap_or_default().contains("unavailable"));
    assert_eq!(outcomes[2].status, OutcomeStatus::Processed);

    // Every item was attempted, in delivery order.
    let references: Vec<String> = store.attempts().iter().map(|(r, _)| r.clone()).collect();
    assert_eq!(references, vec!["IGC-5", "IGC-BROKEN", "IGC-7"]);
}

#[tokio::test]
async fn missing_record_is_a_per_item_failure() {
    let store = RecordingStore::new();
    store.set_behavior("IGC-GONE", StoreBehavior::NotFound);
    let reconciler = reconciler_with(store.clone());

    let batch = batch_of(vec![
        notification("CAPTURE", true, "IGC-GONE", "PSP8"),
        notification("CAPTURE", true, "IGC-9", "PSP9"),
    ]);

    let outcomes = reconciler.process_batch(&batch).await;

    assert_eq!(outcomes[0].status, OutcomeStatus::Failed);
    assert_eq!(outcomes[1].status, OutcomeStatus::Processed);
}

#[tokio::test]
async fn invalid_signature_is_rejected_before_any_processing() {
    let store = RecordingStore::new();
    let reconciler = reconciler_with(store.clone());

    let body = br#"{"live":"false","notificationItems":[{"NotificationRequestItem":{"eventCode":"AUTHORISATION","pspReference":"PSP1","merchantReference":"IGC-1","success":"true"}}]}"#;

    let result = reconciler.authenticate(body, Some("bm90LXRoZS1yaWdodC1zaWduYXR1cmU="));
    assert_matches!(result, Err(PaymentWebhookError::InvalidSignature));

    let missing = reconciler.authenticate(body, None);
    assert_matches!(missing, Err(PaymentWebhookError::MissingSignature));

    assert_eq!(store.attempt_count(), 0);
}

#[tokio::test]
async fn empty_batch_is_malformed() {
    let body = br#"{"live":"false","notificationItems":[]}"#;

    let result = WebhookReconciler::parse_batch(body);
    assert_matches!(result, Err(PaymentWebhookError::EmptyBatch));

    let garbage = WebhookReconciler::parse_batch(b"not json");
    assert_matches!(garbage, Err(PaymentWebhookError::MalformedPayload(_)));
}

#[test]
fn patch_carries_amount_when_present() {
    let item = notification("CAPTURE", true, "IGC-10", "PSP10");
    let patch = build_patch(&item, CanonicalStatus::Captured);

    assert_eq!(patch.confirmed_amount, Some(150000));
    assert_eq!(patch.confirmed_currency.as_deref(), Some("PHP"));
}

#[test]
fn patch_synthesizes_failure_reason_when_processor_sends_none() {
    let item = notification("CAPTURE", false, "IGC-11", "PSP11");
    let patch = build_patch(&item, CanonicalStatus::CaptureFailed);

    assert_eq!(
        patch.failure_reason.as_deref(),
        Some("CAPTURE reported unsuccessful")
    );
}

#[test]
fn patch_dates_only_apply_to_authorisation() {
    let item = notification("REFUND", true, "IGC-12", "PSP12");
    let patch = build_patch(&item, CanonicalStatus::Refunded);

    assert_eq!(patch.payment_date, None);
    assert_eq!(patch.confirmation_date, None);
}
