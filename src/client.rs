//! The Paynow client.
//!
//! Ties the pieces together for each exchange: validate and sign the payment,
//! hand the body to the transport, then reconstruct and verify the reply
//! before any of it reaches the caller. Nothing is retried here.

use crate::config::Config;
use crate::error::Result;
use crate::payment::Payment;
use crate::request::{CanonicalRequest, MobileMethod, TransactionKind};
use crate::response::{GatewayResponse, InitResponse, StatusResponse};
use crate::transport::{validate_poll_url, Transport};
use log::debug;

/// Client for one Paynow integration.
///
/// Holds no mutable state besides the callback URLs, so several clients with
/// different integrations can be used side by side, and a single client can
/// be shared between threads.
pub struct Paynow<T> {
    config: Config,
    transport: T,
}

impl<T: Transport> Paynow<T> {
    /// Creates a client that posts through `transport`.
    pub fn new(config: Config, transport: T) -> Self {
        Paynow { config, transport }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Sets the URL the customer is sent back to after paying.
    pub fn set_return_url(&mut self, url: impl Into<String>) {
        self.config.set_return_url(url);
    }

    /// Sets the URL the gateway posts status updates to.
    pub fn set_result_url(&mut self, url: impl Into<String>) {
        self.config.set_result_url(url);
    }

    /// Starts a new payment. `auth_email` is required for mobile transactions.
    pub fn create_payment(&self, reference: impl Into<String>, auth_email: Option<&str>) -> Payment {
        let payment = Payment::new(reference);
        match auth_email {
            Some(email) => payment.with_auth_email(email),
            None => payment,
        }
    }

    /// Builds the signed request for `payment` without sending it.
    pub fn build_request(&self, payment: &Payment, kind: &TransactionKind) -> Result<CanonicalRequest> {
        CanonicalRequest::build(&self.config, payment, kind)
    }

    /// Initiates a web transaction.
    pub fn send(&self, payment: Payment) -> Result<InitResponse> {
        self.initiate(payment, TransactionKind::Web)
    }

    /// Initiates a mobile money transaction on `phone`.
    pub fn send_mobile(
        &self,
        payment: Payment,
        phone: impl Into<String>,
        method: MobileMethod,
    ) -> Result<InitResponse> {
        let kind = TransactionKind::Mobile {
            phone: phone.into(),
            method,
        };
        self.initiate(payment, kind)
    }

    /// Polls the gateway for the status of a transaction.
    ///
    /// `poll_url` comes from a successful [`InitResponse`].
    pub fn check_transaction_status(&self, poll_url: &str) -> Result<StatusResponse> {
        let url = validate_poll_url(poll_url)?;
        debug!("Polling transaction status at {}", url);

        let reply = self.transport.post_form(url.as_str(), "")?;
        GatewayResponse::parse(&reply)?.into_status_response(self.config.integration_key())
    }

    /// Parses and verifies a status update posted to the result URL.
    pub fn process_status_update(&self, body: &[u8]) -> Result<StatusResponse> {
        GatewayResponse::parse(body)?.into_status_response(self.config.integration_key())
    }

    fn initiate(&self, payment: Payment, kind: TransactionKind) -> Result<InitResponse> {
        let request = self.build_request(&payment, &kind)?;
        debug!(
            "Initiating transaction {} at {}",
            payment.reference(),
            request.endpoint()
        );

        let reply = self
            .transport
            .post_form(request.endpoint(), &request.to_form_body())?;
        GatewayResponse::parse(&reply)?.into_init_response(self.config.integration_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PaynowError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts calls and always fails.
    #[derive(Default)]
    struct CountingTransport {
        calls: AtomicUsize,
    }

    impl Transport for CountingTransport {
        fn post_form(&self, _url: &str, _body: &str) -> Result<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(PaynowError::Transport("connection refused".to_string()))
        }
    }

    fn client() -> Paynow<CountingTransport> {
        Paynow::new(Config::new("1201", "key"), CountingTransport::default())
    }

    #[test]
    fn test_validation_happens_before_transport() {
        let paynow = client();

        let empty = paynow.create_payment("Invoice 1", Some("buyer@example.com"));
        assert!(matches!(paynow.send(empty), Err(PaynowError::InvalidTotal { .. })));

        let mut no_email = paynow.create_payment("Invoice 2", None);
        no_email.add_f64("Bread", 2.0).unwrap();
        let err = paynow
            .send_mobile(no_email, "0771234567", MobileMethod::Ecocash)
            .unwrap_err();
        assert!(matches!(err, PaynowError::MissingAuthEmail));

        assert!(paynow.check_transaction_status("not a url").is_err());

        assert_eq!(paynow.transport.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_transport_errors_pass_through() {
        let paynow = client();
        let mut payment = paynow.create_payment("Invoice 3", None);
        payment.add_f64("Bread", 2.0).unwrap();

        let err = paynow.send(payment).unwrap_err();
        assert!(matches!(err, PaynowError::Transport(ref m) if m == "connection refused"));
        assert_eq!(paynow.transport.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_setters_update_urls() {
        let mut paynow = client();
        paynow.set_return_url("https://shop.example/return");
        paynow.set_result_url("https://shop.example/result");

        assert_eq!(paynow.config().return_url(), Some("https://shop.example/return"));
        assert_eq!(paynow.config().result_url(), Some("https://shop.example/result"));
    }
}
