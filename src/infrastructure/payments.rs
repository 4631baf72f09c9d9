//! Storefront-side payment gateways.

use crate::domain::aggregates::payment::intent_id_from_secret;
use crate::domain::aggregates::{PaymentAuthorization, PaymentInstrument, PaymentStatus};
use crate::domain::ports::{GatewayError, PaymentGateway};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{info, instrument};
use uuid::Uuid;

/// Talks to the payment proxy backend (`POST /payments/create`, `POST /payments/confirm`).
#[derive(Clone)]
pub struct HttpPaymentGateway {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateIntentResponse {
    client_secret: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ConfirmIntentRequest<'a> {
    payment_intent_id: &'a str,
    payment_method_id: &'a str,
}

#[derive(Deserialize)]
struct ConfirmIntentResponse {
    status: PaymentStatus,
}

#[derive(Deserialize, Default)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

impl HttpPaymentGateway {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self { client, base_url: base_url.into().trim_end_matches('/').to_string() }
    }

    async fn rejection(response: reqwest::Response) -> GatewayError {
        let status = response.status().as_u16();
        let body: ErrorBody = response.json().await.unwrap_or_default();
        GatewayError::Rejected { status, message: body.message }
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    #[instrument(skip(self))]
    async fn create_intent(&self, amount_minor: i64) -> Result<PaymentAuthorization, GatewayError> {
        let url = format!("{}/payments/create?total={amount_minor}", self.base_url);
        let response = self.client.post(&url).send().await?;
        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }
        let body: CreateIntentResponse = response.json().await?;
        let intent_id = intent_id_from_secret(&body.client_secret)
            .map(str::to_string)
            .unwrap_or_else(|| format!("pi_{}", Uuid::new_v4().simple()));
        info!(intent_id = %intent_id, "payment intent created");
        Ok(PaymentAuthorization::new(intent_id, body.client_secret, amount_minor))
    }

    #[instrument(skip(self, authorization, instrument), fields(intent_id = %authorization.intent_id))]
    async fn confirm_intent(
        &self,
        authorization: &PaymentAuthorization,
        instrument: &PaymentInstrument,
    ) -> Result<PaymentStatus, GatewayError> {
        let url = format!("{}/payments/confirm", self.base_url);
        let request = ConfirmIntentRequest {
            payment_intent_id: &authorization.intent_id,
            payment_method_id: &instrument.payment_method_id,
        };
        let response = self.client.post(&url).json(&request).send().await?;
        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }
        let body: ConfirmIntentResponse = response.json().await?;
        Ok(body.status)
    }
}

/// Degraded-mode gateway: synthesizes authorizations locally and always
/// confirms them. Ids are `pi_demo_<sequence>_<amount>` and every
/// authorization is flagged synthetic.
#[derive(Default)]
pub struct DemoPaymentGateway {
    sequence: AtomicU64,
}

impl DemoPaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentGateway for DemoPaymentGateway {
    async fn create_intent(&self, amount_minor: i64) -> Result<PaymentAuthorization, GatewayError> {
        let n = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        let intent_id = format!("pi_demo_{n:08}_{amount_minor}");
        let secret = format!("{intent_id}_secret_demo");
        info!(intent_id = %intent_id, "synthesized demo payment intent");
        Ok(PaymentAuthorization::new(intent_id, secret, amount_minor).synthetic())
    }

    async fn confirm_intent(
        &self,
        _authorization: &PaymentAuthorization,
        _instrument: &PaymentInstrument,
    ) -> Result<PaymentStatus, GatewayError> {
        Ok(PaymentStatus::Succeeded)
    }
}
