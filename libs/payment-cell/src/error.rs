use thiserror::Error;

/// Failures surfaced by the payment record store. None of these are retried
/// here: the processor's redelivery-on-missing-ack is the retry mechanism.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("No payment record found for merchant reference {0}")]
    NotFound(String),

    #[error("Payment store unavailable: {0}")]
    Unavailable(String),

    #[error("Payment store rejected update: {0}")]
    Rejected(String),
}

#[derive(Error, Debug)]
pub enum PaymentWebhookError {
    #[error("Missing HMAC signature header")]
    MissingSignature,

    #[error("Invalid HMAC signature")]
    InvalidSignature,

    #[error("Malformed webhook payload: {0}")]
    MalformedPayload(String),

    #[error("Webhook batch contains no notification items")]
    EmptyBatch,

    #[error(transparent)]
    Store(#[from] StoreError),
}
