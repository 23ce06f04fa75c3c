//! Canonical request building for web and mobile transactions.
//!
//! The gateway recomputes the request signature over the decoded field values
//! in the order they were sent, so the field order below is part of the
//! protocol:
//!
//! `resulturl, returnurl, reference, amount, id, additionalinfo, authemail,
//! [phone, method,] status, hash`
//!
//! The signature covers the logical values. The body is form-urlencoded once,
//! after signing; the gateway decodes it before checking the hash.

use crate::config::{Config, URL_INITIATE_MOBILE_TRANSACTION, URL_INITIATE_TRANSACTION};
use crate::error::{PaynowError, Result};
use crate::money::Money;
use crate::payment::Payment;
use crate::signer::{sign, HASH_FIELD};
use log::debug;
use std::fmt;
use std::str::FromStr;

/// Value of the `status` field on every outgoing request.
pub const REQUEST_STATUS: &str = "Message";

/// Mobile money operator used for an express checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MobileMethod {
    Ecocash,
    OneMoney,
}

impl MobileMethod {
    /// Name of the method on the wire.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ecocash => "ecocash",
            Self::OneMoney => "onemoney",
        }
    }
}

impl fmt::Display for MobileMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MobileMethod {
    type Err = PaynowError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "ecocash" => Ok(Self::Ecocash),
            "onemoney" => Ok(Self::OneMoney),
            other => Err(PaynowError::invalid(
                "method",
                format!("unsupported mobile money method '{}'", other),
            )),
        }
    }
}

/// Kind of transaction being initiated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionKind {
    /// Customer is redirected to the gateway's web checkout.
    Web,

    /// Customer approves the charge on their phone.
    Mobile { phone: String, method: MobileMethod },
}

impl TransactionKind {
    /// Endpoint the request for this kind is posted to.
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::Web => URL_INITIATE_TRANSACTION,
            Self::Mobile { .. } => URL_INITIATE_MOBILE_TRANSACTION,
        }
    }
}

/// A signed, ordered request ready to be posted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRequest {
    endpoint: &'static str,
    fields: Vec<(&'static str, String)>,
}

impl CanonicalRequest {
    /// Builds and signs the request for `payment`.
    ///
    /// All validation happens here, before anything touches the network:
    /// the total must reach the configured minimum, and mobile transactions
    /// need a phone number and an auth email.
    pub fn build(config: &Config, payment: &Payment, kind: &TransactionKind) -> Result<Self> {
        let amount: Money = payment.checked_total(config.minimum_total())?;

        let auth_email = payment.auth_email().map(str::trim).unwrap_or_default();
        if let TransactionKind::Mobile { phone, .. } = kind {
            if auth_email.is_empty() {
                return Err(PaynowError::MissingAuthEmail);
            }
            if phone.trim().is_empty() {
                return Err(PaynowError::invalid("phone", "phone number cannot be empty"));
            }
        }

        let mut fields: Vec<(&'static str, String)> = vec![
            ("resulturl", config.result_url().unwrap_or_default().to_string()),
            ("returnurl", config.return_url().unwrap_or_default().to_string()),
            ("reference", payment.reference().to_string()),
            ("amount", amount.to_string()),
            ("id", config.integration_id().to_string()),
            ("additionalinfo", payment.info()),
            ("authemail", auth_email.to_string()),
        ];
        if let TransactionKind::Mobile { phone, method } = kind {
            fields.push(("phone", phone.trim().to_string()));
            fields.push(("method", method.as_str().to_string()));
        }
        fields.push(("status", REQUEST_STATUS.to_string()));

        let hash = sign(fields.iter().map(|(k, v)| (*k, v.as_str())), config.integration_key());
        fields.push((HASH_FIELD, hash));

        debug!(
            "Built {} request for reference {} ({} fields, amount {})",
            if matches!(kind, TransactionKind::Web) { "web" } else { "mobile" },
            payment.reference(),
            fields.len(),
            amount
        );

        Ok(CanonicalRequest {
            endpoint: kind.endpoint(),
            fields,
        })
    }

    /// Endpoint this request must be posted to.
    pub fn endpoint(&self) -> &'static str {
        self.endpoint
    }

    /// Ordered `(name, value)` pairs, signature last.
    pub fn fields(&self) -> &[(&'static str, String)] {
        &self.fields
    }

    /// Value of a field by name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }

    /// The request signature.
    pub fn hash(&self) -> &str {
        self.get(HASH_FIELD).unwrap_or_default()
    }

    /// The `application/x-www-form-urlencoded` body, fields in canonical order.
    pub fn to_form_body(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.fields.iter().map(|(k, v)| (*k, v.as_str())))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signer::verify;
    use rust_decimal::Decimal;

    fn config() -> Config {
        Config::new("1201", "3e9fed89-60e1-4ce5-ab6e-6b1eb2d4f977")
            .with_return_url("https://shop.example/return?order=1")
            .with_result_url("https://shop.example/result")
    }

    fn payment() -> Payment {
        let mut payment = Payment::new("Invoice 35").with_auth_email("buyer@example.com");
        payment.add("Bananas", Decimal::new(250, 2)).unwrap();
        payment.add("Apples", Decimal::new(350, 2)).unwrap();
        payment
    }

    fn names(request: &CanonicalRequest) -> Vec<&str> {
        request.fields().iter().map(|(k, _)| *k).collect()
    }

    #[test]
    fn test_web_field_order() {
        let request = CanonicalRequest::build(&config(), &payment(), &TransactionKind::Web).unwrap();

        assert_eq!(
            names(&request),
            vec![
                "resulturl",
                "returnurl",
                "reference",
                "amount",
                "id",
                "additionalinfo",
                "authemail",
                "status",
                "hash"
            ]
        );
        assert_eq!(request.endpoint(), URL_INITIATE_TRANSACTION);
        assert_eq!(request.get("amount"), Some("6.00"));
        assert_eq!(request.get("status"), Some("Message"));
    }

    #[test]
    fn test_mobile_field_order() {
        let kind = TransactionKind::Mobile {
            phone: "0771234567".to_string(),
            method: MobileMethod::Ecocash,
        };
        let request = CanonicalRequest::build(&config(), &payment(), &kind).unwrap();

        assert_eq!(
            names(&request),
            vec![
                "resulturl",
                "returnurl",
                "reference",
                "amount",
                "id",
                "additionalinfo",
                "authemail",
                "phone",
                "method",
                "status",
                "hash"
            ]
        );
        assert_eq!(request.endpoint(), URL_INITIATE_MOBILE_TRANSACTION);
        assert_eq!(request.get("method"), Some("ecocash"));
    }

    #[test]
    fn test_hash_covers_fields_in_order() {
        let config = config();
        let request = CanonicalRequest::build(&config, &payment(), &TransactionKind::Web).unwrap();

        let signed = request.fields().iter().map(|(k, v)| (*k, v.as_str()));
        assert!(verify(signed, request.hash(), config.integration_key()).is_ok());
    }

    #[test]
    fn test_mobile_requires_auth_email() {
        let mut payment = Payment::new("Invoice 36");
        payment.add("Bread", Decimal::new(200, 2)).unwrap();
        let kind = TransactionKind::Mobile {
            phone: "0771234567".to_string(),
            method: MobileMethod::OneMoney,
        };

        let err = CanonicalRequest::build(&config(), &payment, &kind).unwrap_err();
        assert!(matches!(err, PaynowError::MissingAuthEmail));

        let blank = payment.with_auth_email("   ");
        let err = CanonicalRequest::build(&config(), &blank, &kind).unwrap_err();
        assert!(matches!(err, PaynowError::MissingAuthEmail));
    }

    #[test]
    fn test_mobile_requires_phone() {
        let kind = TransactionKind::Mobile {
            phone: " ".to_string(),
            method: MobileMethod::Ecocash,
        };
        let err = CanonicalRequest::build(&config(), &payment(), &kind).unwrap_err();
        assert!(matches!(err, PaynowError::InvalidArgument { field: "phone", .. }));
    }

    #[test]
    fn test_rejects_total_below_minimum() {
        let mut payment = Payment::new("Invoice 37");
        payment.add("Gum", Decimal::new(50, 2)).unwrap();

        let err = CanonicalRequest::build(&config(), &payment, &TransactionKind::Web).unwrap_err();
        assert!(matches!(err, PaynowError::InvalidTotal { .. }));
    }

    #[test]
    fn test_form_body_encodes_once() {
        let request = CanonicalRequest::build(&config(), &payment(), &TransactionKind::Web).unwrap();
        let body = request.to_form_body();

        assert!(body.starts_with("resulturl=https%3A%2F%2Fshop.example%2Fresult&"));
        assert!(body.contains("&reference=Invoice+35&"));
        assert!(body.contains("&authemail=buyer%40example.com&"));
        assert!(body.ends_with(&format!("&hash={}", request.hash())));
    }

    #[test]
    fn test_form_body_decodes_to_signed_values() {
        let request = CanonicalRequest::build(&config(), &payment(), &TransactionKind::Web).unwrap();
        let body = request.to_form_body();

        let decoded: Vec<(String, String)> = url::form_urlencoded::parse(body.as_bytes())
            .into_owned()
            .collect();
        let expected: Vec<(String, String)> = request
            .fields()
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        assert_eq!(decoded, expected);
    }

    #[test]
    fn test_missing_urls_are_sent_empty() {
        let config = Config::new("1201", "key");
        let request = CanonicalRequest::build(&config, &payment(), &TransactionKind::Web).unwrap();
        assert_eq!(request.get("resulturl"), Some(""));
        assert_eq!(request.get("returnurl"), Some(""));
    }

    #[test]
    fn test_mobile_method_from_str() {
        assert_eq!(MobileMethod::from_str("EcoCash").unwrap(), MobileMethod::Ecocash);
        assert_eq!(MobileMethod::from_str("onemoney").unwrap(), MobileMethod::OneMoney);
        assert!(MobileMethod::from_str("bitcoin").is_err());
    }
}
