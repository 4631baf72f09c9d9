//! Application services: checkout orchestration, order queries and backend health.

pub mod checkout;
pub mod health;
pub mod orders;

pub use checkout::{CheckoutOrchestrator, CheckoutReceipt, CheckoutStage};
pub use health::{BackendHealth, HealthMonitor};
pub use orders::{OrderQuery, OrderRepository, OrderSort, OrderStats, SaveOutcome};

use crate::config::AppConfig;
use crate::domain::ports::{DocumentStore, FallbackStorage, PaymentGateway, StoreError};
use crate::infrastructure::{FileFallbackStorage, FirestoreDocumentStore, HttpPaymentGateway};
use std::sync::Arc;
use tracing::info;

/// Storefront-side wiring built from configuration.
pub struct Storefront {
    pub checkout: CheckoutOrchestrator,
    pub health: Arc<HealthMonitor>,
}

impl Storefront {
    /// The order storage strategy is fixed here: remote with local fallback
    /// when a document store is configured, local only otherwise.
    pub async fn from_config(config: &AppConfig, client: reqwest::Client) -> Result<Self, StoreError> {
        let local: Arc<dyn FallbackStorage> = Arc::new(FileFallbackStorage::open(&config.fallback_dir).await?);
        let orders = match &config.document_store {
            Some(store) => {
                info!(project_id = %store.project_id, "orders persist to the remote document store");
                let remote: Arc<dyn DocumentStore> = Arc::new(FirestoreDocumentStore::new(
                    client.clone(),
                    store.base_url.clone(),
                    store.project_id.clone(),
                    store.api_key.clone(),
                ));
                OrderRepository::with_remote(remote, local)
            }
            None => {
                info!(dir = %config.fallback_dir.display(), "document store not configured, orders stay local");
                OrderRepository::local_only(local)
            }
        };

        let gateway: Arc<dyn PaymentGateway> = Arc::new(HttpPaymentGateway::new(client.clone(), config.api_base_url.clone()));
        let mut checkout = CheckoutOrchestrator::new(gateway, orders);
        if !config.degraded_payments {
            checkout = checkout.with_degraded_gateway(None);
        }

        Ok(Self { checkout, health: Arc::new(HealthMonitor::new(client, config.api_base_url.clone())) })
    }
}
