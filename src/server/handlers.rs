use super::AppState;
use crate::domain::ports::ProcessorError;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};

/// Handler error rendered as `{"message": ...}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }
}

impl From<ProcessorError> for ApiError {
    fn from(err: ProcessorError) -> Self {
        error!(error = %err, "processor error");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "message": self.message }))).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct CreatePaymentParams {
    pub total: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentResponse {
    pub client_secret: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmPaymentRequest {
    pub payment_intent_id: Option<String>,
    pub payment_method_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ConfirmPaymentResponse {
    pub id: String,
    pub status: String,
}

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "message": "Success" }))
}

pub async fn create_payment(
    State(state): State<AppState>,
    Query(params): Query<CreatePaymentParams>,
) -> Result<(StatusCode, Json<CreatePaymentResponse>), ApiError> {
    let total = params.total.as_deref().and_then(parse_leading_int).filter(|t| *t > 0);
    let Some(total) = total else {
        return Err(ApiError::new(StatusCode::FORBIDDEN, "Total must be greater than 0"));
    };
    let intent = state.processor.create_payment_intent(total).await?;
    let client_secret = intent
        .client_secret
        .ok_or_else(|| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Processor returned no client secret"))?;
    info!(intent_id = %intent.id, amount = total, "payment intent created");
    Ok((StatusCode::CREATED, Json(CreatePaymentResponse { client_secret })))
}

pub async fn confirm_payment(
    State(state): State<AppState>,
    body: Result<Json<ConfirmPaymentRequest>, JsonRejection>,
) -> Result<Json<ConfirmPaymentResponse>, ApiError> {
    let Json(request) = body.map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, e.body_text()))?;
    let non_blank = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
    let (Some(intent_id), Some(method_id)) = (non_blank(request.payment_intent_id), non_blank(request.payment_method_id)) else {
        return Err(ApiError::new(StatusCode::BAD_REQUEST, "paymentIntentId and paymentMethodId are required"));
    };
    if !is_processor_id(&intent_id, "pi_") {
        return Err(ApiError::new(StatusCode::BAD_REQUEST, "Malformed paymentIntentId"));
    }
    let intent = state.processor.confirm_payment_intent(&intent_id, &method_id).await?;
    info!(intent_id = %intent.id, status = %intent.status, "payment intent confirmed");
    Ok(Json(ConfirmPaymentResponse { id: intent.id, status: intent.status.as_str().to_string() }))
}

/// Processor object ids are a type prefix followed by ASCII letters and digits.
pub fn is_processor_id(id: &str, prefix: &str) -> bool {
    id.strip_prefix(prefix)
        .is_some_and(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_alphanumeric()))
}

/// Reads an optionally signed run of leading digits and ignores the rest,
/// so `"1679.5"` is 1679 and `"abc"` is `None`.
pub fn parse_leading_int(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits.find(|c: char| !c.is_ascii_digit()).unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    let value: i64 = digits[..end].parse().ok()?;
    Some(if negative { -value } else { value })
}
