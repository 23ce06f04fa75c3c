//! Gateway replies: reconstruction, signature verification and typed results.
//!
//! Replies arrive as `application/x-www-form-urlencoded` bodies. They are first
//! reconstructed into an ordered single-value mapping, then checked against the
//! integration key, and only then turned into an [`InitResponse`] or a
//! [`StatusResponse`]. Error replies are not signed by the gateway and skip the
//! signature check.

use crate::error::{PaynowError, Result};
use crate::money::Money;
use crate::signer::{self, is_hash_field};
use log::{debug, warn};
use rust_decimal::Decimal;
use serde::Serialize;
use std::str::FromStr;

/// Reply `status` value the gateway uses for failures.
pub const STATUS_ERROR: &str = "error";

/// Reply `status` value of a completed payment.
pub const STATUS_PAID: &str = "paid";

/// Reply fields in the order they were received, one value per key.
///
/// When a key is repeated only its first value is kept and the rest are
/// dropped with a warning. Repeated keys are not expected from the gateway.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplyFields {
    pairs: Vec<(String, String)>,
}

impl ReplyFields {
    /// Value of `name`, matched case-insensitively.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Fields in received order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    fn insert_first(&mut self, key: String, value: String) {
        if self.pairs.iter().any(|(k, _)| *k == key) {
            warn!("Reply repeats key '{}'; keeping the first value", key);
            return;
        }
        self.pairs.push((key, value));
    }
}

/// Reconstructs a form-urlencoded reply body into [`ReplyFields`].
///
/// Fails with `MalformedResponse` if the body is not UTF-8, is empty, or
/// contains a segment that is not a `key=value` pair with a non-empty key.
///
/// # Examples
///
/// ```
/// use paynow_client::response::reconstruct;
///
/// let fields = reconstruct(b"a=1&a=2&b=x+y").unwrap();
/// assert_eq!(fields.get("a"), Some("1"));
/// assert_eq!(fields.get("b"), Some("x y"));
/// ```
pub fn reconstruct(body: &[u8]) -> Result<ReplyFields> {
    let text = std::str::from_utf8(body)
        .map_err(|e| PaynowError::MalformedResponse(format!("body is not UTF-8: {}", e)))?
        .trim();
    if text.is_empty() {
        return Err(PaynowError::MalformedResponse("empty body".to_string()));
    }

    let mut fields = ReplyFields::default();
    for segment in text.split('&').filter(|s| !s.is_empty()) {
        if !segment.contains('=') {
            return Err(PaynowError::MalformedResponse(format!(
                "segment '{}' is not a key=value pair",
                truncate(segment)
            )));
        }
        let Some((key, value)) = url::form_urlencoded::parse(segment.as_bytes()).next() else {
            continue;
        };
        if key.trim().is_empty() {
            return Err(PaynowError::MalformedResponse(
                "reply contains an empty key".to_string(),
            ));
        }
        fields.insert_first(key.into_owned(), value.into_owned());
    }

    if fields.is_empty() {
        return Err(PaynowError::MalformedResponse("no fields in body".to_string()));
    }
    Ok(fields)
}

fn truncate(s: &str) -> String {
    s.chars().take(40).collect()
}

/// A reconstructed reply with every field the gateway is known to send.
///
/// Key lookup is case-insensitive, since the casing varies between
/// integration versions. The raw fields are retained, in order, because the
/// signature is computed over all of them.
#[derive(Debug, Clone)]
pub struct GatewayResponse {
    pub status: String,
    pub error: Option<String>,
    pub browser_url: Option<String>,
    pub poll_url: Option<String>,
    pub hash: Option<String>,
    pub amount: Option<String>,
    pub reference: Option<String>,
    pub paynow_reference: Option<String>,
    pub instructions: Option<String>,
    raw: ReplyFields,
}

impl GatewayResponse {
    /// Parses a raw reply body.
    pub fn parse(body: &[u8]) -> Result<Self> {
        Self::from_fields(reconstruct(body)?)
    }

    /// Lifts reconstructed fields into the typed reply.
    ///
    /// Fails with `MalformedResponse` if there is no `status` field.
    pub fn from_fields(raw: ReplyFields) -> Result<Self> {
        let take = |name: &str| raw.get(name).map(str::to_string);

        let status = take("status").ok_or_else(|| {
            PaynowError::MalformedResponse("reply has no status field".to_string())
        })?;

        Ok(GatewayResponse {
            status,
            error: take("error"),
            browser_url: take("browserurl"),
            poll_url: take("pollurl"),
            hash: take("hash"),
            amount: take("amount"),
            reference: take("reference"),
            paynow_reference: take("paynowreference"),
            instructions: take("instructions"),
            raw,
        })
    }

    /// Returns `true` if the gateway reported an error.
    pub fn is_error(&self) -> bool {
        self.status.trim().eq_ignore_ascii_case(STATUS_ERROR)
    }

    /// The fields as received.
    pub fn fields(&self) -> &ReplyFields {
        &self.raw
    }

    /// Checks the reply signature against `integration_key`.
    ///
    /// Fails with `MissingHash` when the reply is unsigned and `HashMismatch`
    /// when the signature does not match.
    pub fn verify(&self, integration_key: &str) -> Result<()> {
        let supplied = self.hash.as_deref().ok_or(PaynowError::MissingHash)?;
        let signed = self.raw.iter().filter(|(k, _)| !is_hash_field(k));
        signer::verify(signed, supplied, integration_key)?;

        debug!("Verified reply signature (status {})", self.status);
        Ok(())
    }

    /// Verifies the reply and converts it into an initiation result.
    pub fn into_init_response(self, integration_key: &str) -> Result<InitResponse> {
        if self.is_error() {
            warn!(
                "Gateway rejected the transaction: {}",
                self.error.as_deref().unwrap_or("no error message")
            );
            return Ok(InitResponse {
                success: false,
                status: self.status,
                has_redirect: false,
                redirect_url: None,
                poll_url: None,
                instructions: None,
                error: self.error,
                hash: None,
            });
        }

        self.verify(integration_key)?;

        let poll_url = self.poll_url.ok_or_else(|| {
            PaynowError::MalformedResponse("successful reply has no pollurl".to_string())
        })?;

        Ok(InitResponse {
            success: true,
            status: self.status,
            has_redirect: self.browser_url.is_some(),
            redirect_url: self.browser_url,
            poll_url: Some(poll_url),
            instructions: self.instructions,
            error: None,
            hash: self.hash,
        })
    }

    /// Verifies the reply and converts it into a status result.
    pub fn into_status_response(self, integration_key: &str) -> Result<StatusResponse> {
        if self.is_error() {
            warn!(
                "Gateway returned an error status: {}",
                self.error.as_deref().unwrap_or("no error message")
            );
            return Ok(StatusResponse {
                status: STATUS_ERROR.to_string(),
                paid: false,
                amount: None,
                reference: None,
                paynow_reference: None,
                poll_url: None,
                hash: None,
                error: self.error,
            });
        }

        self.verify(integration_key)?;

        let amount = self.amount.as_deref().map(parse_reply_amount).transpose()?;

        let status = self.status.trim().to_lowercase();
        Ok(StatusResponse {
            paid: status == STATUS_PAID,
            status,
            amount,
            reference: self.reference,
            paynow_reference: self.paynow_reference,
            poll_url: self.poll_url,
            hash: self.hash,
            error: None,
        })
    }
}

/// Parses a reply amount exactly, without rounding.
///
/// The gateway reports amounts in whole cents; negative values or more than
/// two significant decimals are `MalformedResponse`.
fn parse_reply_amount(raw: &str) -> Result<Money> {
    let amount = Decimal::from_str(raw.trim()).map_err(|e| {
        PaynowError::MalformedResponse(format!("amount '{}' is not a number: {}", raw, e))
    })?;
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(PaynowError::MalformedResponse(format!(
            "amount '{}' is negative",
            raw
        )));
    }
    if amount.normalize().scale() > Money::SCALE {
        return Err(PaynowError::MalformedResponse(format!(
            "amount '{}' has more than {} decimal places",
            raw,
            Money::SCALE
        )));
    }
    Ok(Money::round_up(amount))
}

/// Outcome of initiating a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InitResponse {
    /// `false` when the gateway reported an error.
    pub success: bool,

    /// Status as sent by the gateway (e.g. `Ok`, `Error`).
    pub status: String,

    /// Whether the customer should be redirected to `redirect_url`.
    pub has_redirect: bool,

    /// Gateway checkout page for web transactions.
    pub redirect_url: Option<String>,

    /// URL to poll for the transaction status. Always set on success.
    pub poll_url: Option<String>,

    /// Payment instructions for the customer, for mobile transactions.
    pub instructions: Option<String>,

    /// Error message from the gateway, if any.
    pub error: Option<String>,

    /// Verified reply signature.
    pub hash: Option<String>,
}

/// Status of a transaction, from a poll or a result-URL update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusResponse {
    /// Lower-cased status (`paid`, `awaiting delivery`, `cancelled`, ...).
    pub status: String,

    /// `true` only when `status` is `paid`.
    pub paid: bool,

    pub amount: Option<Money>,

    /// Merchant reference of the transaction.
    pub reference: Option<String>,

    /// The gateway's own reference for the transaction.
    pub paynow_reference: Option<String>,

    pub poll_url: Option<String>,

    pub hash: Option<String>,

    /// Error message when `status` is `error`.
    pub error: Option<String>,
}
