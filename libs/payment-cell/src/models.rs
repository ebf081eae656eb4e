use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One lifecycle event reported by the payment processor. The processor's
/// vocabulary is open-ended; `event_code` is kept as the raw string and only
/// normalization (see `services::normalizer`) interprets it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentNotification {
    pub event_code: String,
    pub psp_reference: String,
    pub merchant_reference: String,
    /// "true" / "false" as delivered on the wire.
    #[serde(default)]
    pub success: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<NotificationAmount>,
    /// Processor-assigned timestamp. Not usable for ordering: notifications
    /// arrive out of order and may be redelivered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_data: Option<Value>,
}

impl PaymentNotification {
    pub fn is_success(&self) -> bool {
        self.success.eq_ignore_ascii_case("true")
    }
}

/// Amount in minor units, e.g. centavos.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationAmount {
    pub currency: String,
    pub value: i64,
}

/// Wrapper level the processor nests each notification under.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationItem {
    #[serde(rename = "NotificationRequestItem")]
    pub notification_request_item: PaymentNotification,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookBatch {
    /// "true" for the production processor environment, "false" for test.
    #[serde(default)]
    pub live: String,
    pub notification_items: Vec<NotificationItem>,
}

/// Closed set of locally-meaningful payment lifecycle states. Extended only
/// by explicit design decision; everything the processor sends is normalized
/// into one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalStatus {
    Pending,
    Authorized,
    Refused,
    Cancelled,
    Refunded,
    RefundFailed,
    Captured,
    CaptureFailed,
    Chargeback,
    ChargebackReversed,
    FraudNotification,
}

impl CanonicalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalStatus::Pending => "pending",
            CanonicalStatus::Authorized => "authorized",
            CanonicalStatus::Refused => "refused",
            CanonicalStatus::Cancelled => "cancelled",
            CanonicalStatus::Refunded => "refunded",
            CanonicalStatus::RefundFailed => "refund_failed",
            CanonicalStatus::Captured => "captured",
            CanonicalStatus::CaptureFailed => "capture_failed",
            CanonicalStatus::Chargeback => "chargeback",
            CanonicalStatus::ChargebackReversed => "chargeback_reversed",
            CanonicalStatus::FraudNotification => "fraud_notification",
        }
    }

    /// Whether this status denotes an unsuccessful outcome for the attempted
    /// operation. Drives the `failure_reason` fallback when the processor
    /// sends no reason text.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            CanonicalStatus::Refused
                | CanonicalStatus::CaptureFailed
                | CanonicalStatus::RefundFailed
        )
    }
}

impl fmt::Display for CanonicalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Row shape of the `payments` table. Created by the payment-initiation flow
/// before any webhook arrives; this cell only patches existing rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRecord {
    #[serde(default)]
    pub id: Option<String>,
    pub merchant_reference: String,
    pub status: CanonicalStatus,
    #[serde(default)]
    pub psp_reference: Option<String>,
    #[serde(default)]
    pub payment_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub confirmation_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub confirmed_amount: Option<i64>,
    #[serde(default)]
    pub confirmed_currency: Option<String>,
    #[serde(default)]
    pub failure_reason: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Partial update applied to a payment row. Absent fields are left untouched
/// by the store; present fields are blind last-write-wins overwrites.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentRecordPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub psp_reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<CanonicalStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmation_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmed_amount: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmed_currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Processed,
    Failed,
}

/// Per-item result, kept for logging only. Never returned to the processor:
/// the acknowledgment contract is independent of item outcomes.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessingOutcome {
    pub psp_reference: String,
    pub merchant_reference: String,
    pub event_code: String,
    pub status: OutcomeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProcessingOutcome {
    pub fn processed(notification: &PaymentNotification) -> Self {
        Self {
            psp_reference: notification.psp_reference.clone(),
            merchant_reference: notification.merchant_reference.clone(),
            event_code: notification.event_code.clone(),
            status: OutcomeStatus::Processed,
            error: None,
        }
    }

    pub fn failed(notification: &PaymentNotification, error: impl fmt::Display) -> Self {
        Self {
            psp_reference: notification.psp_reference.clone(),
            merchant_reference: notification.merchant_reference.clone(),
            event_code: notification.event_code.clone(),
            status: OutcomeStatus::Failed,
            error: Some(error.to_string()),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.status == OutcomeStatus::Failed
    }
}
