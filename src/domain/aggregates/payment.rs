//! Payment authorization

use serde::{Deserialize, Serialize};
use std::fmt;

/// Processor status of a payment intent. Statuses this crate does not model
/// are kept verbatim so they can be reported back to the shopper.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PaymentStatus {
    RequiresConfirmation,
    Succeeded,
    Failed,
    Other(String),
}

impl PaymentStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::RequiresConfirmation => "requires_confirmation",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Other(raw) => raw,
        }
    }
    pub fn is_succeeded(&self) -> bool { matches!(self, Self::Succeeded) }
}

impl From<String> for PaymentStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "requires_confirmation" => Self::RequiresConfirmation,
            "succeeded" => Self::Succeeded,
            "failed" => Self::Failed,
            _ => Self::Other(raw),
        }
    }
}

impl From<&str> for PaymentStatus {
    fn from(raw: &str) -> Self { Self::from(raw.to_string()) }
}

impl From<PaymentStatus> for String {
    fn from(status: PaymentStatus) -> String { status.as_str().to_string() }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// A processor's approval to capture funds. The client secret is single-use.
#[derive(Clone, PartialEq, Eq)]
pub struct PaymentAuthorization {
    pub intent_id: String,
    client_secret: String,
    pub amount_minor: i64,
    pub status: PaymentStatus,
    /// Synthesized locally in degraded mode; no funds were actually authorized.
    pub synthetic: bool,
}

impl PaymentAuthorization {
    pub fn new(intent_id: impl Into<String>, client_secret: impl Into<String>, amount_minor: i64) -> Self {
        Self {
            intent_id: intent_id.into(),
            client_secret: client_secret.into(),
            amount_minor,
            status: PaymentStatus::RequiresConfirmation,
            synthetic: false,
        }
    }

    pub fn synthetic(mut self) -> Self { self.synthetic = true; self }
    pub fn client_secret(&self) -> &str { &self.client_secret }
}

impl fmt::Debug for PaymentAuthorization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentAuthorization")
            .field("intent_id", &self.intent_id)
            .field("client_secret", &"[REDACTED]")
            .field("amount_minor", &self.amount_minor)
            .field("status", &self.status)
            .field("synthetic", &self.synthetic)
            .finish()
    }
}

/// What the shopper pays with, as handed to the processor on confirmation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaymentInstrument {
    pub payment_method_id: String,
    pub last4: String,
}

/// Derives the intent id embedded in a processor client secret
/// (`pi_123_secret_abc` belongs to `pi_123`).
pub fn intent_id_from_secret(secret: &str) -> Option<&str> {
    secret.split_once("_secret_").map(|(id, _)| id).filter(|id| !id.is_empty())
}
