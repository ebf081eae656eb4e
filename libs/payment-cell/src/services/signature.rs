use base64::{Engine as _, engine::general_purpose};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Verifies that a webhook body was produced by the payment processor.
///
/// The HMAC is computed over the exact raw request bytes. Re-serializing the
/// parsed payload can change the bytes (key order, whitespace) and would
/// invalidate the signature, so callers must capture the body before any
/// JSON parsing.
#[derive(Clone)]
pub struct HmacSignatureVerifier {
    hmac_key: String,
}

impl HmacSignatureVerifier {
    pub fn new(hmac_key: impl Into<String>) -> Self {
        Self {
            hmac_key: hmac_key.into(),
        }
    }

    /// Returns false on any malformed header or mismatch; never errors.
    /// The comparison runs in constant time via `Mac::verify_slice`.
    pub fn verify(&self, raw_body: &[u8], signature_header: &str) -> bool {
        let provided = match general_purpose::STANDARD.decode(signature_header.trim()) {
            Ok(bytes) => bytes,
            Err(_) => return false,
        };

        let mut mac = match HmacSha256::new_from_slice(self.hmac_key.as_bytes()) {
            Ok(mac) => mac,
            Err(_) => return false,
        };
        mac.update(raw_body);

        mac.verify_slice(&provided).is_ok()
    }
}
