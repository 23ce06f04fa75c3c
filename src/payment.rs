//! The cart a merchant builds up before sending a transaction.
//!
//! Line items are keyed by title. Adding an item under a title that is already
//! in the cart replaces its amount (last write wins); amounts never accumulate.

use crate::error::{PaynowError, Result};
use crate::money::{decimal_from_f64, Money};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

/// A transaction under construction.
///
/// # Invariants
///
/// - Every item title is non-blank and every amount is non-negative
/// - Items are owned by this payment alone and kept in title order
///
/// A `Payment` is consumed by a single send.
#[derive(Debug, Clone)]
pub struct Payment {
    /// Merchant's unique identifier for the transaction.
    reference: String,

    /// Email of the paying customer. Required for mobile transactions.
    auth_email: Option<String>,

    /// Line items, title → unrounded amount.
    items: BTreeMap<String, Decimal>,
}

impl Payment {
    /// Creates an empty payment with the given merchant reference.
    pub fn new(reference: impl Into<String>) -> Self {
        Payment {
            reference: reference.into(),
            auth_email: None,
            items: BTreeMap::new(),
        }
    }

    /// Sets the customer's auth email.
    pub fn with_auth_email(mut self, auth_email: impl Into<String>) -> Self {
        self.auth_email = Some(auth_email.into());
        self
    }

    /// Returns the merchant reference.
    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// Returns the auth email, if one was given.
    pub fn auth_email(&self) -> Option<&str> {
        self.auth_email.as_deref()
    }

    /// Adds a line item to the cart.
    ///
    /// Fails with `InvalidArgument` if the title is blank, the amount is
    /// negative, or the cart total would no longer fit in a `Decimal`.
    /// An existing item with the same title is overwritten.
    pub fn add(&mut self, title: impl Into<String>, amount: Decimal) -> Result<&mut Self> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(PaynowError::invalid("title", "item title cannot be empty"));
        }
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PaynowError::invalid(
                "amount",
                format!("amount for '{}' cannot be negative: {}", title, amount),
            ));
        }

        let others = self
            .items
            .iter()
            .filter(|(t, _)| **t != title)
            .try_fold(Decimal::ZERO, |sum, (_, a)| sum.checked_add(*a));
        if others.and_then(|sum| sum.checked_add(amount)).is_none() {
            return Err(PaynowError::invalid(
                "amount",
                format!("adding '{}' overflows the cart total", title),
            ));
        }

        self.items.insert(title, amount);
        Ok(self)
    }

    /// Adds a line item whose amount is given as a float.
    ///
    /// NaN and infinite amounts are rejected with `InvalidArgument`.
    pub fn add_f64(&mut self, title: impl Into<String>, amount: f64) -> Result<&mut Self> {
        let amount = decimal_from_f64(amount)?;
        self.add(title, amount)
    }

    /// Iterates line items in title order.
    pub fn items(&self) -> impl Iterator<Item = (&str, Decimal)> {
        self.items.iter().map(|(title, amount)| (title.as_str(), *amount))
    }

    /// Number of distinct line items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if no items have been added.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of all items, rounded up to 2 decimal places.
    ///
    /// `add` keeps the running sum within `Decimal` range, so this cannot overflow.
    pub fn total(&self) -> Money {
        let sum = self
            .items
            .values()
            .try_fold(Decimal::ZERO, |sum, a| sum.checked_add(*a))
            .unwrap_or(Decimal::MAX);
        Money::round_up(sum)
    }

    /// Rounded total, failing with `InvalidTotal` if it is below `minimum`.
    ///
    /// A zero total is rejected whatever the minimum.
    pub fn checked_total(&self, minimum: Money) -> Result<Money> {
        let total = self.total();
        if total.is_zero() || total < minimum {
            return Err(PaynowError::InvalidTotal { total, minimum });
        }
        Ok(total)
    }

    /// JSON description of the cart, keys sorted by title.
    ///
    /// Sent as the `additionalinfo` field of the request.
    pub fn info(&self) -> String {
        #[derive(Serialize)]
        #[serde(transparent)]
        struct Items(BTreeMap<String, Money>);

        let items = Items(
            self.items
                .iter()
                .map(|(title, amount)| (title.clone(), Money::round_up(*amount)))
                .collect(),
        );

        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        // Serializing a string map into a Vec cannot fail.
        if items.serialize(&mut serializer).is_err() {
            return String::from("{}");
        }
        String::from_utf8(out).unwrap_or_default()
    }
}
