#![allow(dead_code)]

use async_trait::async_trait;
use rust_decimal_macros::dec;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use storefront_checkout::domain::aggregates::{
    BillingAddress, Cart, CartItem, PaymentAuthorization, PaymentForm, PaymentInstrument, PaymentStatus,
};
use storefront_checkout::domain::ports::{
    Document, DocumentStore, FallbackStorage, GatewayError, PaymentGateway, PaymentProcessor, ProcessorError,
    ProcessorIntent, StoreError,
};
use storefront_checkout::domain::value_objects::{Money, Quantity};

pub fn valid_form() -> PaymentForm {
    PaymentForm {
        card_number: "4242 4242 4242 4242".into(),
        expiry_date: "12/30".into(),
        cvv: "123".into(),
        card_name: "Ada Lovelace".into(),
        payment_method_id: None,
        billing_address: BillingAddress {
            street: "12 Market Street".into(),
            city: "Springfield".into(),
            state: "IL".into(),
            zip_code: "62701".into(),
            country: "US".into(),
        },
    }
}

/// One $10 item: total 16.79, 1679 cents.
pub fn ten_dollar_cart() -> Cart {
    let mut cart = Cart::new();
    cart.add_item(CartItem::new("sku-1", "Notebook", Money::new(dec!(10.00)), Quantity::one()));
    cart
}

pub fn cart_of(lines: &[(&str, Money, u32)]) -> Cart {
    let mut cart = Cart::new();
    for (id, price, qty) in lines {
        cart.add_item(CartItem::new(*id, format!("Item {id}"), *price, Quantity::new(*qty).unwrap()));
    }
    cart
}

#[derive(Clone, Debug)]
pub enum GatewayScript {
    Succeed,
    ConfirmWith(PaymentStatus),
    Unreachable,
    Reject(String),
}

/// Gateway double that follows a fixed script and counts calls.
pub struct ScriptedGateway {
    script: GatewayScript,
    pub creates: AtomicUsize,
    pub confirms: AtomicUsize,
}

impl ScriptedGateway {
    pub fn new(script: GatewayScript) -> Arc<Self> {
        Arc::new(Self { script, creates: AtomicUsize::new(0), confirms: AtomicUsize::new(0) })
    }

    pub fn calls(&self) -> usize {
        self.creates.load(Ordering::SeqCst) + self.confirms.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
    async fn create_intent(&self, amount_minor: i64) -> Result<PaymentAuthorization, GatewayError> {
        let n = self.creates.fetch_add(1, Ordering::SeqCst) + 1;
        match &self.script {
            GatewayScript::Unreachable => Err(GatewayError::Network("connection refused".into())),
            GatewayScript::Reject(message) => Err(GatewayError::Rejected { status: 500, message: message.clone() }),
            _ => Ok(PaymentAuthorization::new(format!("pi_test_{n}"), format!("pi_test_{n}_secret_abc"), amount_minor)),
        }
    }

    async fn confirm_intent(
        &self,
        _authorization: &PaymentAuthorization,
        _instrument: &PaymentInstrument,
    ) -> Result<PaymentStatus, GatewayError> {
        self.confirms.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            GatewayScript::ConfirmWith(status) => Ok(status.clone()),
            _ => Ok(PaymentStatus::Succeeded),
        }
    }
}

/// Document store whose every call fails as if the network were down.
pub struct FailingDocumentStore;

#[async_trait]
impl DocumentStore for FailingDocumentStore {
    async fn add(&self, _collection: &str, _data: Value) -> Result<String, StoreError> {
        Err(StoreError::Unavailable("remote store offline".into()))
    }

    async fn list(&self, _collection: &str) -> Result<Vec<Document>, StoreError> {
        Err(StoreError::Unavailable("remote store offline".into()))
    }

    async fn get(&self, _collection: &str, _id: &str) -> Result<Option<Document>, StoreError> {
        Err(StoreError::Unavailable("remote store offline".into()))
    }
}

/// Local storage that rejects writes, as a full disk would.
pub struct FailingFallbackStorage;

#[async_trait]
impl FallbackStorage for FailingFallbackStorage {
    async fn get_item(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Ok(None)
    }

    async fn set_item(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
        Err(StoreError::Io(std::io::Error::new(std::io::ErrorKind::Other, "no space left on device")))
    }

    async fn remove_item(&self, _key: &str) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Processor double for the proxy service.
#[derive(Default)]
pub struct FakeProcessor {
    pub decline_with: Option<String>,
    pub created: AtomicUsize,
    /// Amounts passed to intent creation, in call order.
    pub amounts: Mutex<Vec<i64>>,
    /// Intent ids passed to confirmation, in call order.
    pub confirmed: Mutex<Vec<String>>,
}

impl FakeProcessor {
    pub fn declining(message: &str) -> Self {
        Self { decline_with: Some(message.to_string()), ..Self::default() }
    }
}

#[async_trait]
impl PaymentProcessor for FakeProcessor {
    async fn create_payment_intent(&self, amount_minor: i64) -> Result<ProcessorIntent, ProcessorError> {
        self.amounts.lock().unwrap().push(amount_minor);
        if let Some(message) = &self.decline_with {
            return Err(ProcessorError::Api { status: 402, message: message.clone() });
        }
        let n = self.created.fetch_add(1, Ordering::SeqCst) + 1;
        let id = format!("pi_fake{n}");
        Ok(ProcessorIntent {
            client_secret: Some(format!("{id}_secret_xyz")),
            id,
            status: PaymentStatus::RequiresConfirmation,
            amount: amount_minor,
        })
    }

    async fn confirm_payment_intent(&self, intent_id: &str, payment_method_id: &str) -> Result<ProcessorIntent, ProcessorError> {
        self.confirmed.lock().unwrap().push(intent_id.to_string());
        if let Some(message) = &self.decline_with {
            return Err(ProcessorError::Api { status: 402, message: message.clone() });
        }
        let status = if payment_method_id == "pm_card_chargeDeclined" {
            PaymentStatus::Failed
        } else {
            PaymentStatus::Succeeded
        };
        Ok(ProcessorIntent { id: intent_id.to_string(), client_secret: None, status, amount: 0 })
    }
}
