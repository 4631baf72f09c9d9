//! Checkout orchestration: validate, authorize payment, persist the order,
//! clear the cart. Each step runs strictly after the previous one settles.

use crate::application::orders::OrderRepository;
use crate::domain::aggregates::{Cart, Customer, FieldErrors, OrderRecord, PaymentAuthorization, PaymentForm, PaymentInstrument};
use crate::domain::events::CheckoutEvent;
use crate::domain::ports::{CheckoutEventSink, GatewayError, PaymentGateway};
use crate::domain::pricing::PricingPolicy;
use crate::domain::value_objects::Money;
use crate::infrastructure::{DemoPaymentGateway, TracingEventSink};
use crate::{CheckoutError, Result};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Processor test token used when the shopper's card was not tokenized client-side.
pub const DEFAULT_PAYMENT_METHOD: &str = "pm_card_visa";

/// Where a checkout invocation is. Failures exit from `Validating`,
/// `AuthorizingPayment` or `PersistingOrder`; nothing resumes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CheckoutStage {
    Idle,
    Validating,
    AuthorizingPayment,
    PersistingOrder,
    Completed,
}

impl fmt::Display for CheckoutStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Validating => "validating",
            Self::AuthorizingPayment => "authorizing_payment",
            Self::PersistingOrder => "persisting_order",
            Self::Completed => "completed",
        };
        f.write_str(name)
    }
}

/// Result payload handed back to the caller after a successful checkout.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutReceipt {
    pub order_id: String,
    pub total: Money,
    pub status: String,
    pub payment_intent_id: String,
    pub used_remote: bool,
    /// Payment was synthesized because the payment backend was unreachable.
    pub degraded: bool,
    pub message: String,
}

pub struct CheckoutOrchestrator {
    gateway: Arc<dyn PaymentGateway>,
    degraded_gateway: Option<Arc<dyn PaymentGateway>>,
    orders: OrderRepository,
    pricing: PricingPolicy,
    events: Arc<dyn CheckoutEventSink>,
}

impl CheckoutOrchestrator {
    /// Degraded mode is on by default: an unreachable payment backend is
    /// replaced by [`DemoPaymentGateway`].
    pub fn new(gateway: Arc<dyn PaymentGateway>, orders: OrderRepository) -> Self {
        Self {
            gateway,
            degraded_gateway: Some(Arc::new(DemoPaymentGateway::new())),
            orders,
            pricing: PricingPolicy::default(),
            events: Arc::new(TracingEventSink),
        }
    }

    pub fn with_degraded_gateway(mut self, gateway: Option<Arc<dyn PaymentGateway>>) -> Self {
        self.degraded_gateway = gateway;
        self
    }

    pub fn with_pricing(mut self, pricing: PricingPolicy) -> Self {
        self.pricing = pricing;
        self
    }

    pub fn with_events(mut self, events: Arc<dyn CheckoutEventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn pricing(&self) -> &PricingPolicy {
        &self.pricing
    }

    pub fn orders(&self) -> &OrderRepository {
        &self.orders
    }

    /// Runs one checkout. The cart is cleared only once the order is stored.
    #[instrument(skip_all, fields(user_id = %customer.id, items = cart.items().len()))]
    pub async fn checkout(&self, cart: &mut Cart, form: &PaymentForm, customer: &Customer) -> Result<CheckoutReceipt> {
        let mut stage = CheckoutStage::Idle;
        advance(&mut stage, CheckoutStage::Validating);
        if cart.is_empty() {
            return Err(CheckoutError::Validation(FieldErrors::single("cart", "Your cart is empty")));
        }
        form.check().map_err(CheckoutError::Validation)?;
        let totals = self.pricing.totals(cart);
        let amount_minor = totals
            .total
            .to_minor_units()
            .filter(|cents| *cents > 0)
            .ok_or_else(|| CheckoutError::Validation(FieldErrors::single("total", "Order total is out of range")))?;

        advance(&mut stage, CheckoutStage::AuthorizingPayment);
        let instrument = PaymentInstrument {
            payment_method_id: form.payment_method_id.clone().unwrap_or_else(|| DEFAULT_PAYMENT_METHOD.to_string()),
            last4: form.masked_method().last4.as_str().to_string(),
        };
        let authorization = self.authorize(amount_minor, &instrument).await?;
        self.events
            .publish(CheckoutEvent::PaymentAuthorized {
                user_id: customer.id.clone(),
                payment_intent_id: authorization.intent_id.clone(),
                amount_minor,
                synthetic: authorization.synthetic,
            })
            .await;

        advance(&mut stage, CheckoutStage::PersistingOrder);
        let order = OrderRecord::place(customer, cart, totals, form.billing_address.clone(), form.masked_method(), &authorization);
        let saved = match self.orders.save(order).await {
            Ok(saved) => saved,
            Err(source) => {
                // Payment is already captured and is not rolled back.
                self.events
                    .publish(CheckoutEvent::ReconciliationRequired {
                        user_id: customer.id.clone(),
                        payment_intent_id: authorization.intent_id.clone(),
                        amount_minor,
                        total: totals.total,
                        reason: source.to_string(),
                    })
                    .await;
                return Err(CheckoutError::Persistence { payment_intent_id: authorization.intent_id, source });
            }
        };
        self.events
            .publish(CheckoutEvent::OrderPersisted {
                user_id: customer.id.clone(),
                order_id: saved.order_id.clone(),
                used_remote: saved.used_remote,
            })
            .await;

        cart.clear();
        self.events.publish(CheckoutEvent::CartCleared { user_id: customer.id.clone() }).await;
        advance(&mut stage, CheckoutStage::Completed);

        Ok(CheckoutReceipt {
            message: format!("Payment successful! Order {} confirmed.", saved.order_id),
            order_id: saved.order_id,
            total: totals.total,
            status: authorization.status.as_str().to_string(),
            payment_intent_id: authorization.intent_id,
            used_remote: saved.used_remote,
            degraded: authorization.synthetic,
        })
    }

    /// Creates and confirms an intent. A transport failure switches to the
    /// degraded gateway when one is set; any other failure is final.
    async fn authorize(&self, amount_minor: i64, instrument: &PaymentInstrument) -> Result<PaymentAuthorization> {
        let gateway = match self.gateway.create_intent(amount_minor).await {
            Ok(authorization) => return self.confirm(self.gateway.as_ref(), authorization, instrument).await,
            Err(GatewayError::Network(reason)) => match &self.degraded_gateway {
                Some(fallback) => {
                    warn!(%reason, "payment backend unreachable, continuing in degraded mode");
                    fallback.clone()
                }
                None => return Err(CheckoutError::Gateway(GatewayError::Network(reason))),
            },
            Err(e) => return Err(CheckoutError::Gateway(e)),
        };
        let authorization = gateway.create_intent(amount_minor).await.map_err(CheckoutError::Gateway)?;
        self.confirm(gateway.as_ref(), authorization, instrument).await
    }

    async fn confirm(
        &self,
        gateway: &dyn PaymentGateway,
        mut authorization: PaymentAuthorization,
        instrument: &PaymentInstrument,
    ) -> Result<PaymentAuthorization> {
        authorization.status = gateway.confirm_intent(&authorization, instrument).await.map_err(CheckoutError::Gateway)?;
        if !authorization.status.is_succeeded() {
            return Err(CheckoutError::Payment { status: authorization.status.as_str().to_string() });
        }
        info!(intent_id = %authorization.intent_id, synthetic = authorization.synthetic, "payment confirmed");
        Ok(authorization)
    }
}

fn advance(stage: &mut CheckoutStage, next: CheckoutStage) {
    info!(from = %stage, to = %next, "checkout stage");
    *stage = next;
}
