//! Billing details and checkout form validation

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use validator::{Validate, ValidationError, ValidationErrors};
use crate::domain::value_objects::CardLast4;

const MIN_CARD_DIGITS: usize = 16;
const CVV_DIGITS: usize = 3;

/// Billing address as persisted on the order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BillingAddress {
    #[validate(custom = "not_blank")]
    pub street: String,
    #[validate(custom = "not_blank")]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[validate(custom = "not_blank")]
    pub zip_code: String,
    #[serde(default)]
    pub country: String,
}

/// Checkout form state. Card number and CVV are transient and never persisted.
#[derive(Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PaymentForm {
    #[validate(custom = "card_number")]
    pub card_number: String,
    #[validate(custom = "expiry_date")]
    pub expiry_date: String,
    #[validate(custom = "cvv")]
    pub cvv: String,
    #[validate(custom = "not_blank")]
    pub card_name: String,
    /// Processor-issued payment method token, when the client tokenized the card.
    #[serde(default)]
    pub payment_method_id: Option<String>,
    pub billing_address: BillingAddress,
}

impl fmt::Debug for PaymentForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentForm")
            .field("card_number", &CardLast4::from_card_number(&self.card_number).to_string())
            .field("expiry_date", &self.expiry_date)
            .field("cvv", &"[REDACTED]")
            .field("card_name", &self.card_name)
            .field("payment_method_id", &self.payment_method_id)
            .field("billing_address", &self.billing_address)
            .finish()
    }
}

/// Masked payment method as stored on an order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethod {
    #[serde(rename = "type")]
    pub kind: String,
    pub last4: CardLast4,
    pub card_name: String,
}

impl PaymentForm {
    /// Runs every field check and returns all failures at once, keyed the
    /// way the checkout form names its inputs (`cardNumber`, `billing.city`).
    pub fn check(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();
        if let Err(e) = Validate::validate(self) { errors.absorb("", &e); }
        if let Err(e) = self.billing_address.validate() { errors.absorb("billing.", &e); }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    pub fn masked_method(&self) -> PaymentMethod {
        PaymentMethod {
            kind: "card".to_string(),
            last4: CardLast4::from_card_number(&self.card_number),
            card_name: self.card_name.trim().to_string(),
        }
    }
}

/// Field name to user-facing message.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.insert(field, message);
        errors
    }
    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) { self.0.insert(field.into(), message.into()); }
    pub fn get(&self, field: &str) -> Option<&str> { self.0.get(field).map(String::as_str) }
    pub fn contains(&self, field: &str) -> bool { self.0.contains_key(field) }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }
    pub fn len(&self) -> usize { self.0.len() }
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> { self.0.iter().map(|(k, v)| (k.as_str(), v.as_str())) }

    fn absorb(&mut self, prefix: &str, errors: &ValidationErrors) {
        for field in errors.field_errors().keys() {
            let (key, message) = form_field(field);
            self.insert(format!("{prefix}{key}"), message);
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<&str> = self.0.keys().map(String::as_str).collect();
        write!(f, "invalid fields: {}", fields.join(", "))
    }
}

fn form_field(field: &str) -> (&'static str, &'static str) {
    match field {
        "card_number" | "cardNumber" => ("cardNumber", "Please enter a valid card number"),
        "expiry_date" | "expiryDate" => ("expiryDate", "Please enter a valid expiry date"),
        "cvv" => ("cvv", "Please enter a valid CVV"),
        "card_name" | "cardName" => ("cardName", "Please enter the name on card"),
        "street" => ("street", "Please enter your street address"),
        "city" => ("city", "Please enter your city"),
        "zip_code" | "zipCode" => ("zipCode", "Please enter your zip code"),
        _ => ("form", "Please check this field"),
    }
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() { Err(ValidationError::new("blank")) } else { Ok(()) }
}

fn card_number(value: &str) -> Result<(), ValidationError> {
    let stripped: String = value.chars().filter(|c| !c.is_whitespace() && *c != '-').collect();
    if stripped.len() >= MIN_CARD_DIGITS && stripped.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::new("card_number"))
    }
}

/// `MM/YY` with a real month.
fn expiry_date(value: &str) -> Result<(), ValidationError> {
    let valid = match value.trim().split_once('/') {
        Some((mm, yy)) => {
            mm.len() == 2 && yy.len() == 2
                && yy.chars().all(|c| c.is_ascii_digit())
                && mm.parse::<u8>().map_or(false, |m| (1..=12).contains(&m))
        }
        None => false,
    };
    if valid { Ok(()) } else { Err(ValidationError::new("expiry_date")) }
}

fn cvv(value: &str) -> Result<(), ValidationError> {
    if value.len() == CVV_DIGITS && value.chars().all(|c| c.is_ascii_digit()) { Ok(()) } else { Err(ValidationError::new("cvv")) }
}
