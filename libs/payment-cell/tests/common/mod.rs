#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use payment_cell::error::StoreError;
use payment_cell::models::{NotificationAmount, PaymentNotification, PaymentRecordPatch};
use payment_cell::services::signature::HmacSignatureVerifier;
use payment_cell::services::store::PaymentRecordStore;
use payment_cell::services::reconciler::WebhookReconciler;
use shared_utils::test_utils::TestConfig;

/// How the fake store reacts to an update for a given merchant reference.
#[derive(Debug, Clone, Copy)]
pub enum StoreBehavior {
    Succeed,
    NotFound,
    Unavailable,
    Panic,
}

/// In-memory store that records every attempted update and can be told to
/// fail (or panic) for specific merchant references.
#[derive(Default)]
pub struct RecordingStore {
    updates: Mutex<Vec<(String, PaymentRecordPatch)>>,
    behaviors: Mutex<HashMap<String, StoreBehavior>>,
}

impl RecordingStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_behavior(&self, merchant_reference: &str, behavior: StoreBehavior) {
        self.behaviors
            .lock()
            .unwrap()
            .insert(merchant_reference.to_string(), behavior);
    }

    /// Every attempted update, including ones that were told to fail.
    pub fn attempts(&self) -> Vec<(String, PaymentRecordPatch)> {
        self.updates.lock().unwrap().clone()
    }

    pub fn attempt_count(&self) -> usize {
        self.updates.lock().unwrap().len()
    }

    pub fn last_patch_for(&self, merchant_reference: &str) -> Option<PaymentRecordPatch> {
        self.updates
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(reference, _)| reference == merchant_reference)
            .map(|(_, patch)| patch.clone())
    }
}

#[async_trait]
impl PaymentRecordStore for RecordingStore {
    async fn update_by_merchant_reference(
        &self,
        merchant_reference: &str,
        patch: &PaymentRecordPatch,
    ) -> Result<(), StoreError> {
        self.updates
            .lock()
            .unwrap()
            .push((merchant_reference.to_string(), patch.clone()));

        let behavior = self
            .behaviors
            .lock()
            .unwrap()
            .get(merchant_reference)
            .copied()
            .unwrap_or(StoreBehavior::Succeed);

        match behavior {
            StoreBehavior::Succeed => Ok(()),
            StoreBehavior::NotFound => Err(StoreError::NotFound(merchant_reference.to_string())),
            StoreBehavior::Unavailable => {
                Err(StoreError::Unavailable("connection timed out".to_string()))
            }
            StoreBehavior::Panic => panic!("injected store panic"),
        }
    }
}

pub fn test_hmac_key() -> String {
    TestConfig::default().adyen_hmac_key
}

pub fn reconciler_with(store: Arc<RecordingStore>) -> WebhookReconciler {
    WebhookReconciler::new(HmacSignatureVerifier::new(test_hmac_key()), store)
}

pub fn notification(
    event_code: &str,
    success: bool,
    merchant_reference: &str,
    psp_reference: &str,
) -> PaymentNotification {
    PaymentNotification {
        event_code: event_code.to_string(),
        psp_reference: psp_reference.to_string(),
        merchant_reference: merchant_reference.to_string(),
        success: if success { "true" } else { "false" }.to_string(),
        amount: Some(NotificationAmount {
            currency: "PHP".to_string(),
            value: 150000,
        }),
        event_date: Some(event_date()),
        reason: None,
        additional_data: None,
    }
}

pub fn event_date() -> DateTime<Utc> {
    "2024-01-01T00:00:00Z".parse().expect("valid timestamp")
}
