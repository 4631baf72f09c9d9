//! Stripe REST client used by the payment proxy backend.

use crate::domain::ports::{PaymentProcessor, ProcessorError, ProcessorIntent};
use async_trait::async_trait;
use reqwest::Url;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{error, info, instrument};

pub const DEFAULT_API_BASE: &str = "https://api.stripe.com";

#[derive(Clone)]
pub struct StripeProcessor {
    client: reqwest::Client,
    api_base: String,
    secret_key: Option<SecretString>,
    currency: String,
}

#[derive(Deserialize, Default)]
struct StripeErrorBody {
    #[serde(default)]
    error: StripeErrorDetail,
}

#[derive(Deserialize, Default)]
struct StripeErrorDetail {
    #[serde(default)]
    message: String,
    #[serde(default)]
    code: Option<String>,
}

impl StripeProcessor {
    pub fn new(client: reqwest::Client, api_base: impl Into<String>, secret_key: Option<SecretString>, currency: impl Into<String>) -> Self {
        Self { client, api_base: api_base.into().trim_end_matches('/').to_string(), secret_key, currency: currency.into() }
    }

    pub fn is_configured(&self) -> bool {
        self.secret_key.is_some()
    }

    /// Builds `{api_base}/v1/<segments>`. Each segment is percent-encoded,
    /// so caller-supplied ids cannot change the path or add a query.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ProcessorError> {
        let mut url = Url::parse(&format!("{}/v1", self.api_base))
            .map_err(|e| ProcessorError::InvalidRequest(format!("bad API base {}: {e}", self.api_base)))?;
        url.path_segments_mut()
            .map_err(|_| ProcessorError::InvalidRequest(format!("API base {} cannot carry a path", self.api_base)))?
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, url: Url, form: &[(&str, String)]) -> Result<ProcessorIntent, ProcessorError> {
        let key = self.secret_key.as_ref().ok_or(ProcessorError::NotConfigured)?;
        let response = self
            .client
            .post(url)
            .bearer_auth(key.expose_secret())
            .form(form)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body: StripeErrorBody = response.json().await.unwrap_or_default();
            // Keep the decline code visible so the storefront can map it to a friendly message.
            let message = match body.error.code {
                Some(code) if !body.error.message.contains(&code) => format!("{} ({code})", body.error.message),
                _ => body.error.message,
            };
            error!(status = status.as_u16(), %message, "Stripe request failed");
            return Err(ProcessorError::Api { status: status.as_u16(), message });
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl PaymentProcessor for StripeProcessor {
    #[instrument(skip(self))]
    async fn create_payment_intent(&self, amount_minor: i64) -> Result<ProcessorIntent, ProcessorError> {
        let intent = self
            .send(self.endpoint(&["payment_intents"])?, &[("amount", amount_minor.to_string()), ("currency", self.currency.clone())])
            .await?;
        info!(intent_id = %intent.id, "Payment Intent created");
        Ok(intent)
    }

    #[instrument(skip(self))]
    async fn confirm_payment_intent(&self, intent_id: &str, payment_method_id: &str) -> Result<ProcessorIntent, ProcessorError> {
        let url = self.endpoint(&["payment_intents", intent_id, "confirm"])?;
        let intent = self.send(url, &[("payment_method", payment_method_id.to_string())]).await?;
        info!(intent_id = %intent.id, status = %intent.status, "Payment Intent confirmed");
        Ok(intent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Uri;
    use std::sync::{Arc, Mutex};

    /// Serves a processor stand-in that records every request URI.
    async fn recording_api() -> (String, Arc<Mutex<Vec<String>>>) {
        let seen: Arc<Mutex<Vec<String>>> = Arc::default();
        let log = seen.clone();
        let app = axum::Router::new().fallback(move |uri: Uri| {
            let log = log.clone();
            async move {
                log.lock().unwrap().push(uri.to_string());
                axum::Json(serde_json::json!({ "id": "pi_1", "status": "succeeded" }))
            }
        });
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        (format!("http://{addr}"), seen)
    }

    #[tokio::test]
    async fn test_missing_secret_key_is_not_configured() {
        let processor = StripeProcessor::new(reqwest::Client::new(), DEFAULT_API_BASE, None, "usd");
        assert!(!processor.is_configured());
        let err = processor.create_payment_intent(1000).await.unwrap_err();
        assert!(matches!(err, ProcessorError::NotConfigured));
    }

    #[tokio::test]
    async fn test_intent_id_stays_inside_confirm_path() {
        let (base, seen) = recording_api().await;
        let processor = StripeProcessor::new(reqwest::Client::new(), base, Some(SecretString::from("sk_test_key".to_string())), "usd");

        processor.confirm_payment_intent("pi_123", "pm_card_visa").await.unwrap();
        processor
            .confirm_payment_intent("../../v1/refunds?charge=ch_other&", "pm_card_visa")
            .await
            .unwrap();

        let seen = seen.lock().unwrap().clone();
        assert_eq!(seen[0], "/v1/payment_intents/pi_123/confirm");
        assert!(seen[1].starts_with("/v1/payment_intents/"), "{}", seen[1]);
        assert!(seen[1].ends_with("/confirm"), "{}", seen[1]);
        assert!(!seen[1].contains('?'), "{}", seen[1]);
        assert!(!seen[1].contains("/v1/refunds"), "{}", seen[1]);
    }
}
