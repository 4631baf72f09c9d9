//! Payment proxy HTTP service.
//!
//! Holds the processor secret key so the storefront never sees it, and
//! exposes intent creation and confirmation over JSON.

pub mod handlers;

use crate::domain::ports::PaymentProcessor;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

#[derive(Clone)]
pub struct AppState {
    pub processor: Arc<dyn PaymentProcessor>,
}

impl AppState {
    pub fn new(processor: Arc<dyn PaymentProcessor>) -> Self {
        Self { processor }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::health))
        .route("/payments/create", post(handlers::create_payment))
        .route("/payments/confirm", post(handlers::confirm_payment))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
