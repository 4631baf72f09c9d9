//! Order Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use crate::domain::aggregates::billing::{BillingAddress, PaymentMethod};
use crate::domain::aggregates::cart::{Cart, CartItem};
use crate::domain::aggregates::payment::{PaymentAuthorization, PaymentStatus};
use crate::domain::pricing::Totals;

/// Durable record of a completed purchase, in the JSON shape shared by the
/// remote document store and the local fallback.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
    /// Assigned by whichever store persisted the record.
    #[serde(default)]
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub user_email: Option<String>,
    pub items: Vec<CartItem>,
    pub totals: Totals,
    pub billing_address: BillingAddress,
    pub payment_method: PaymentMethod,
    pub payment_intent_id: String,
    pub payment_status: PaymentStatus,
    /// Amount sent to the processor, in minor units.
    pub amount: i64,
    #[serde(default)]
    pub demo_payment: bool,
    pub created_at: DateTime<Utc>,
    pub status: OrderStatus,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Processing,
    #[default]
    Paid,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Paid => "paid",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    fn can_become(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Processing, Paid) | (Processing, Cancelled)
                | (Paid, Shipped) | (Paid, Cancelled)
                | (Shipped, Delivered)
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Who is checking out.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Customer {
    pub id: String,
    pub email: Option<String>,
}

impl Customer {
    pub fn new(id: impl Into<String>) -> Self { Self { id: id.into(), email: None } }
    pub fn with_email(mut self, email: impl Into<String>) -> Self { self.email = Some(email.into()); self }
}

impl OrderRecord {
    /// Snapshots the cart and the confirmed authorization into a new record.
    pub fn place(
        customer: &Customer,
        cart: &Cart,
        totals: Totals,
        billing_address: BillingAddress,
        payment_method: PaymentMethod,
        authorization: &PaymentAuthorization,
    ) -> Self {
        Self {
            id: String::new(),
            user_id: customer.id.clone(),
            user_email: customer.email.clone(),
            items: cart.items().to_vec(),
            totals,
            billing_address,
            payment_method,
            payment_intent_id: authorization.intent_id.clone(),
            payment_status: authorization.status.clone(),
            amount: authorization.amount_minor,
            demo_payment: authorization.synthetic,
            created_at: Utc::now(),
            status: OrderStatus::Paid,
        }
    }

    /// Applies a fulfillment status change. Everything else on the record is fixed.
    pub fn transition_to(&mut self, next: OrderStatus) -> Result<(), OrderError> {
        if !self.status.can_become(next) {
            return Err(OrderError::InvalidTransition { from: self.status, to: next });
        }
        self.status = next;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderError {
    #[error("Cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::pricing::PricingPolicy;
    use crate::domain::value_objects::{CardLast4, Money, Quantity};
    use rust_decimal_macros::dec;

    pub(crate) fn sample_order(user: &str) -> OrderRecord {
        let mut cart = Cart::new();
        cart.add_item(CartItem::new("P1", "Widget", Money::new(dec!(10)), Quantity::new(2).unwrap()));
        let mut auth = PaymentAuthorization::new("pi_1", "pi_1_secret_x", 2759);
        auth.status = PaymentStatus::Succeeded;
        OrderRecord::place(
            &Customer::new(user).with_email("a@example.com"),
            &cart,
            PricingPolicy::default().totals(&cart),
            BillingAddress { street: "1 Road".into(), city: "Nairobi".into(), zip_code: "00100".into(), ..Default::default() },
            PaymentMethod { kind: "card".into(), last4: CardLast4::from_card_number("4242"), card_name: "A".into() },
            &auth,
        )
    }

    #[test]
    fn test_order_workflow() {
        let mut order = sample_order("u1");
        assert_eq!(order.status, OrderStatus::Paid);
        order.transition_to(OrderStatus::Shipped).unwrap();
        order.transition_to(OrderStatus::Delivered).unwrap();
        assert_eq!(order.transition_to(OrderStatus::Cancelled),
            Err(OrderError::InvalidTransition { from: OrderStatus::Delivered, to: OrderStatus::Cancelled }));
    }

    #[test]
    fn test_record_json_shape() {
        let order = sample_order("u1");
        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["userId"], "u1");
        assert_eq!(json["paymentStatus"], "succeeded");
        assert_eq!(json["status"], "paid");
        assert_eq!(json["paymentMethod"]["type"], "card");
        assert_eq!(json["paymentMethod"]["last4"], "4242");
        assert!(json.get("cardNumber").is_none());
        let back: OrderRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back.totals.subtotal.amount(), dec!(20));
    }
}
