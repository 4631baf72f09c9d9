use crate::domain::events::CheckoutEvent;
use crate::domain::ports::CheckoutEventSink;
use async_trait::async_trait;
use tracing::{error, info};

/// Default sink: writes every checkout milestone to the structured log.
/// Reconciliation events are logged at error level so they can be alerted on.
#[derive(Default, Clone, Copy)]
pub struct TracingEventSink;

#[async_trait]
impl CheckoutEventSink for TracingEventSink {
    async fn publish(&self, event: CheckoutEvent) {
        match &event {
            CheckoutEvent::ReconciliationRequired { user_id, payment_intent_id, amount_minor, reason, .. } => {
                error!(event = event.name(), %user_id, %payment_intent_id, amount_minor, %reason,
                    "payment captured without a stored order; manual reconciliation required");
            }
            _ => info!(event = event.name(), details = ?event, "checkout event"),
        }
    }
}
