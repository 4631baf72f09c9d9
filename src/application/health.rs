//! Periodic reachability check for the payment proxy backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{info, warn};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum BackendHealth {
    #[default]
    Unknown,
    Healthy { checked_at: DateTime<Utc> },
    Unhealthy { checked_at: DateTime<Utc>, reason: String },
}

impl BackendHealth {
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy { .. })
    }
}

#[derive(Deserialize)]
struct HealthBody {
    message: String,
}

pub struct HealthMonitor {
    client: reqwest::Client,
    base_url: String,
    status: RwLock<BackendHealth>,
}

impl HealthMonitor {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            status: RwLock::new(BackendHealth::Unknown),
        }
    }

    pub async fn status(&self) -> BackendHealth {
        self.status.read().await.clone()
    }

    /// Calls `GET /` once and records the outcome.
    pub async fn check_now(&self) -> BackendHealth {
        let checked_at = Utc::now();
        let next = match self.ping().await {
            Ok(()) => BackendHealth::Healthy { checked_at },
            Err(reason) => BackendHealth::Unhealthy { checked_at, reason },
        };
        let mut status = self.status.write().await;
        if status.is_healthy() != next.is_healthy() || *status == BackendHealth::Unknown {
            match &next {
                BackendHealth::Unhealthy { reason, .. } => warn!(%reason, base_url = %self.base_url, "payment backend is not responding"),
                _ => info!(base_url = %self.base_url, "payment backend is healthy"),
            }
        }
        *status = next.clone();
        next
    }

    async fn ping(&self) -> Result<(), String> {
        let response = self
            .client
            .get(format!("{}/", self.base_url))
            .send()
            .await
            .map_err(|e| e.to_string())?;
        if !response.status().is_success() {
            return Err(format!("unexpected status {}", response.status()));
        }
        let body: HealthBody = response.json().await.map_err(|e| e.to_string())?;
        if body.message != "Success" {
            return Err(format!("unexpected health message '{}'", body.message));
        }
        Ok(())
    }

    /// Checks immediately, then every `interval` until the handle is aborted.
    pub fn spawn(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let me = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                me.check_now().await;
            }
        })
    }
}
