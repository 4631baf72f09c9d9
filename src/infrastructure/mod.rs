//! Adapters for the domain ports.
pub mod event_log;
pub mod file_storage;
pub mod firestore;
pub mod in_memory;
pub mod payments;
pub mod stripe;

pub use event_log::TracingEventSink;
pub use file_storage::FileFallbackStorage;
pub use firestore::FirestoreDocumentStore;
pub use in_memory::{InMemoryDocumentStore, InMemoryFallbackStorage, RecordingEventSink};
pub use payments::{DemoPaymentGateway, HttpPaymentGateway};
pub use stripe::StripeProcessor;
