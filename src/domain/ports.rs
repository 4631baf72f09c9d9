use super::aggregates::{PaymentAuthorization, PaymentInstrument, PaymentStatus};
use super::events::CheckoutEvent;
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Storefront-side view of the payment processor.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_intent(&self, amount_minor: i64) -> Result<PaymentAuthorization, GatewayError>;
    async fn confirm_intent(
        &self,
        authorization: &PaymentAuthorization,
        instrument: &PaymentInstrument,
    ) -> Result<PaymentStatus, GatewayError>;
}

#[derive(Error, Debug)]
pub enum GatewayError {
    /// The gateway could not be reached at all.
    #[error("network error: {0}")]
    Network(String),
    #[error("payment rejected ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("invalid gateway response: {0}")]
    InvalidResponse(String),
}

impl GatewayError {
    pub fn is_network(&self) -> bool { matches!(self, Self::Network(_)) }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() { Self::InvalidResponse(err.to_string()) } else { Self::Network(err.to_string()) }
    }
}

/// A stored JSON document and its store-assigned id.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

/// Remote document database holding JSON records in named collections
/// such as `users/{userId}/orders`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn add(&self, collection: &str, data: Value) -> Result<String, StoreError>;
    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError>;
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;
}

/// Local durable string key-value storage.
#[async_trait]
pub trait FallbackStorage: Send + Sync {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StoreError>;
    async fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError>;
    async fn remove_item(&self, key: &str) -> Result<(), StoreError>;
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("store returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unsupported document value: {0}")]
    Codec(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Receives checkout milestones. The place to hang an outbox that settles
/// payments captured without a stored order.
#[async_trait]
pub trait CheckoutEventSink: Send + Sync {
    async fn publish(&self, event: CheckoutEvent);
}

/// A payment intent as reported by the processor's API.
#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize)]
pub struct ProcessorIntent {
    pub id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    pub status: PaymentStatus,
    #[serde(default)]
    pub amount: i64,
}

/// Backend-side payment processor, holding the secret key.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    async fn create_payment_intent(&self, amount_minor: i64) -> Result<ProcessorIntent, ProcessorError>;
    async fn confirm_payment_intent(&self, intent_id: &str, payment_method_id: &str) -> Result<ProcessorIntent, ProcessorError>;
}

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{message}")]
    Api { status: u16, message: String },
    #[error("payment processor secret key is not configured")]
    NotConfigured,
    #[error("invalid processor request: {0}")]
    InvalidRequest(String),
}
