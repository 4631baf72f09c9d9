//! Order totals

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use crate::domain::aggregates::Cart;
use crate::domain::value_objects::Money;

/// Shipping and tax rules applied at checkout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PricingPolicy {
    /// Subtotals strictly above this ship free.
    pub free_shipping_threshold: Money,
    pub shipping_fee: Money,
    pub tax_rate: Decimal,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            free_shipping_threshold: Money::new(dec!(50)),
            shipping_fee: Money::new(dec!(5.99)),
            tax_rate: dec!(0.08),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub subtotal: Money,
    pub shipping: Money,
    pub tax: Money,
    pub total: Money,
}

impl PricingPolicy {
    pub fn totals(&self, cart: &Cart) -> Totals {
        let subtotal = cart.subtotal();
        let shipping = if subtotal > self.free_shipping_threshold { Money::ZERO } else { self.shipping_fee };
        let tax = subtotal.scale(self.tax_rate);
        Totals { subtotal, shipping, tax, total: subtotal.add(&shipping).add(&tax) }
    }
}
