//! Storefront Checkout
//!
//! Checkout-to-order pipeline for a browser storefront, plus the small
//! payment proxy backend it talks to.
//!
//! ## Features
//! - Cart snapshot and order totals (decimal money)
//! - Payment intent creation and confirmation, with a degraded demo mode
//! - Order persistence to a remote document store with local fallback
//! - Order history queries (filter, sort, stats)
//! - Payment proxy HTTP service and backend health monitor

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod server;

use application::checkout::CheckoutStage;
use domain::aggregates::FieldErrors;
use domain::ports::{GatewayError, StoreError};
use thiserror::Error;

pub use application::{CheckoutOrchestrator, CheckoutReceipt, OrderQuery, OrderRepository, OrderSort, OrderStats};
pub use config::AppConfig;
pub use domain::aggregates::{Cart, CartItem, Customer, OrderRecord, OrderStatus, PaymentForm};
pub use domain::value_objects::{Money, Quantity};

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum CheckoutError {
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    #[error("Payment failed with status: {status}")]
    Payment { status: String },

    #[error(transparent)]
    Gateway(GatewayError),

    #[error("Order could not be saved after payment {payment_intent_id}: {source}")]
    Persistence {
        payment_intent_id: String,
        #[source]
        source: StoreError,
    },
}

impl CheckoutError {
    /// Stage the checkout was in when it failed.
    pub fn stage(&self) -> CheckoutStage {
        match self {
            Self::Validation(_) => CheckoutStage::Validating,
            Self::Payment { .. } | Self::Gateway(_) => CheckoutStage::AuthorizingPayment,
            Self::Persistence { .. } => CheckoutStage::PersistingOrder,
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(self, Self::Gateway(e) if e.is_network())
    }

    /// Text suitable for showing to the shopper.
    pub fn user_message(&self) -> String {
        let raw = match self {
            Self::Validation(errors) => return format!("Please correct the highlighted fields: {errors}"),
            Self::Persistence { payment_intent_id, .. } => {
                return format!(
                    "Your payment went through but the order could not be saved. Please contact support with reference {payment_intent_id}."
                )
            }
            other => other.to_string(),
        };
        if raw.contains("requires_action") || raw.contains("authentication") {
            "Payment requires additional authentication. Please try again.".to_string()
        } else if raw.contains("card_declined") || raw.contains("declined") {
            "Your card was declined. Please try a different payment method.".to_string()
        } else if raw.contains("insufficient_funds") {
            "Insufficient funds. Please try a different card.".to_string()
        } else if self.is_network() || raw.contains("network") {
            "Network error. Please check your connection and try again.".to_string()
        } else {
            raw
        }
    }
}

pub type Result<T> = std::result::Result<T, CheckoutError>;
