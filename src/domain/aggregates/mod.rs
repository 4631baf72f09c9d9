//! Aggregates module
pub mod billing;
pub mod cart;
pub mod order;
pub mod payment;

pub use billing::{BillingAddress, FieldErrors, PaymentForm, PaymentMethod};
pub use cart::{Cart, CartError, CartItem};
pub use order::{Customer, OrderError, OrderRecord, OrderStatus};
pub use payment::{PaymentAuthorization, PaymentInstrument, PaymentStatus};
