//! Checkout events
use crate::domain::value_objects::Money;

/// Milestones of a single checkout, in the order they happen.
#[derive(Clone, Debug, PartialEq)]
pub enum CheckoutEvent {
    PaymentAuthorized { user_id: String, payment_intent_id: String, amount_minor: i64, synthetic: bool },
    OrderPersisted { user_id: String, order_id: String, used_remote: bool },
    CartCleared { user_id: String },
    /// Funds were captured but no order exists for them.
    ReconciliationRequired { user_id: String, payment_intent_id: String, amount_minor: i64, total: Money, reason: String },
}

impl CheckoutEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::PaymentAuthorized { .. } => "payment_authorized",
            Self::OrderPersisted { .. } => "order_persisted",
            Self::CartCleared { .. } => "cart_cleared",
            Self::ReconciliationRequired { .. } => "reconciliation_required",
        }
    }
}
