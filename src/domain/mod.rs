//! Checkout domain: aggregates, value objects, events and the ports the
//! application layer drives.
pub mod aggregates;
pub mod events;
pub mod ports;
pub mod pricing;
pub mod value_objects;
