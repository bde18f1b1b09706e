//! Keyed digests shared with the billing service.
//!
//! A signature is the lowercase hex SHA-512 of UTF-8 fields joined with `|`.
//! Field order is part of the wire contract and differs per call site:
//!
//! - webhook: `app_token|transaction_id|status`
//! - payment request: `app_id|transaction_id|total_amount|akouna_matata`

use crate::billing::types::{PaymentRequest, PaymentWebhook};
use crate::config::BillingConfig;
use sha2::{Digest, Sha512};
use thiserror::Error;

pub const FIELD_DELIMITER: &str = "|";

/// Fixed salt appended to payment-initiation signatures
pub const PAYMENT_SALT: &str = "akouna_matata";

pub const DIGEST_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("invalid hex signature: {0}")]
    InvalidHex(String),

    #[error("invalid signature length: expected 64 bytes, got {0}")]
    InvalidLength(usize),
}

/// A 512-bit digest
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature([u8; DIGEST_LEN]);

impl Signature {
    /// Digest of `fields` joined with the delimiter, in the order given
    pub fn digest(fields: &[&str]) -> Self {
        let joined = fields.join(FIELD_DELIMITER);
        let hashed = Sha512::digest(joined.as_bytes());
        let mut bytes = [0u8; DIGEST_LEN];
        bytes.copy_from_slice(&hashed);
        Signature(bytes)
    }

    pub fn from_hex(value: &str) -> Result<Self, SignatureError> {
        let decoded = hex::decode(value).map_err(|e| SignatureError::InvalidHex(e.to_string()))?;
        let bytes: [u8; DIGEST_LEN] = decoded
            .as_slice()
            .try_into()
            .map_err(|_| SignatureError::InvalidLength(decoded.len()))?;
        Ok(Signature(bytes))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }
}

impl From<[u8; DIGEST_LEN]> for Signature {
    fn from(bytes: [u8; DIGEST_LEN]) -> Self {
        Signature(bytes)
    }
}

impl std::fmt::Display for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl std::fmt::Debug for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Signature({})", self.to_hex())
    }
}

/// Hex digest over ordered fields. Pure and deterministic.
pub fn generate(fields: &[&str]) -> String {
    Signature::digest(fields).to_hex()
}

pub fn webhook_signature(app_token: &str, transaction_id: &str, status: &str) -> String {
    generate(&[app_token, transaction_id, status])
}

pub fn payment_request_signature(app_id: &str, transaction_id: &str, total_amount: i64) -> String {
    let amount = total_amount.to_string();
    generate(&[app_id, transaction_id, &amount, PAYMENT_SALT])
}

/// Attach the payment-initiation hash to `request`. Keyed by the fixed salt,
/// not the app token.
pub fn sign_payment_request(request: &mut PaymentRequest) {
    request.hash = payment_request_signature(
        &request.app_id,
        &request.transaction_id,
        request.total_amount,
    );
}

/// Constant-time byte comparison
pub fn secure_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter()
        .zip(b.iter())
        .fold(0_u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

/// Signs and verifies with the locally held application token
#[derive(Clone)]
pub struct SignatureEngine {
    app_token: String,
}

impl SignatureEngine {
    pub fn new(app_token: impl Into<String>) -> Self {
        Self {
            app_token: app_token.into(),
        }
    }

    pub fn from_config(config: &BillingConfig) -> Self {
        Self::new(config.app_token.clone())
    }

    pub fn sign_webhook(&self, transaction_id: &str, status: &str) -> String {
        webhook_signature(&self.app_token, transaction_id, status)
    }

    /// True iff the webhook's hash matches the recomputed one exactly.
    ///
    /// Plain string equality, no case folding. A mismatch is the normal
    /// "reject this webhook" outcome, not an error.
    pub fn verify(&self, webhook: &PaymentWebhook) -> bool {
        self.sign_webhook(&webhook.transaction_id, &webhook.status) == webhook.hash
    }

    /// Same acceptance rule as [`verify`](Self::verify) with a comparison
    /// whose timing does not depend on where the digests differ.
    pub fn verify_constant_time(&self, webhook: &PaymentWebhook) -> bool {
        let expected = self.sign_webhook(&webhook.transaction_id, &webhook.status);
        secure_eq(expected.as_bytes(), webhook.hash.as_bytes())
    }
}

impl std::fmt::Debug for SignatureEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureEngine")
            .field("app_token", &"<redacted>")
            .finish()
    }
}
