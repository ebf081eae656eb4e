use crate::models::CanonicalStatus;

/// Maps a processor event code and its success flag onto the canonical
/// status set.
///
/// The processor's event vocabulary is larger than this table and evolves
/// independently of this system. An unrecognized code must never abort
/// processing: it falls back to a lexical match on the code text, and
/// finally to `Pending`.
pub fn normalize_event(event_code: &str, success: bool) -> CanonicalStatus {
    let code = event_code.trim().to_ascii_uppercase();

    match code.as_str() {
        "AUTHORISATION" => {
            if success {
                CanonicalStatus::Authorized
            } else {
                CanonicalStatus::Refused
            }
        }
        "PENDING" => CanonicalStatus::Pending,
        "CANCEL_OR_REFUND" | "REFUND" | "REFUND_WITH_DATA" => CanonicalStatus::Refunded,
        "CANCELLATION" | "TECHNICAL_CANCEL" => CanonicalStatus::Cancelled,
        "REFUND_FAILED" => CanonicalStatus::RefundFailed,
        "CAPTURE" => {
            if success {
                CanonicalStatus::Captured
            } else {
                CanonicalStatus::CaptureFailed
            }
        }
        "CAPTURE_FAILED" => CanonicalStatus::CaptureFailed,
        "CHARGEBACK" | "SECOND_CHARGEBACK" => CanonicalStatus::Chargeback,
        "CHARGEBACK_REVERSED" => CanonicalStatus::ChargebackReversed,
        "MANUAL_REVIEW_ACCEPT" => CanonicalStatus::Authorized,
        "MANUAL_REVIEW_REJECT" => CanonicalStatus::Refused,
        "NOTIFICATION_OF_FRAUD" => CanonicalStatus::FraudNotification,
        _ => normalize_unknown(&code, success),
    }
}

/// Best-effort lexical mapping for codes outside the known vocabulary.
/// Ordered so that compound codes resolve to their most specific fragment
/// (a reversed chargeback before a chargeback, a failed refund before a
/// refund).
fn normalize_unknown(code: &str, success: bool) -> CanonicalStatus {
    if code.contains("CHARGEBACK") {
        return if code.contains("REVERS") {
            CanonicalStatus::ChargebackReversed
        } else {
            CanonicalStatus::Chargeback
        };
    }
    if code.contains("REFUND") {
        return if code.contains("FAIL") {
            CanonicalStatus::RefundFailed
        } else {
            CanonicalStatus::Refunded
        };
    }
    if code.contains("CAPTURE") {
        return if code.contains("FAIL") || !success {
            CanonicalStatus::CaptureFailed
        } else {
            CanonicalStatus::Captured
        };
    }
    if code.contains("CANCEL") {
        return CanonicalStatus::Cancelled;
    }
    if code.contains("AUTHORIS") || code.contains("AUTHORIZ") {
        return if success {
            CanonicalStatus::Authorized
        } else {
            CanonicalStatus::Refused
        };
    }
    if code.contains("FRAUD") {
        return CanonicalStatus::FraudNotification;
    }

    CanonicalStatus::Pending
}
