//! The HTTP boundary.
//!
//! The client only shapes requests and validates replies; posting them is left
//! to a [`Transport`]. Timeouts, retries and connection reuse belong to the
//! transport implementation.

use crate::error::{PaynowError, Result};
use url::Url;

/// Posts form bodies and returns the raw reply.
pub trait Transport: Send + Sync {
    /// POSTs `body` (already form-urlencoded) to `url` and returns the reply body.
    fn post_form(&self, url: &str, body: &str) -> Result<Vec<u8>>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn post_form(&self, url: &str, body: &str) -> Result<Vec<u8>> {
        (**self).post_form(url, body)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn post_form(&self, url: &str, body: &str) -> Result<Vec<u8>> {
        (**self).post_form(url, body)
    }
}

/// Checks that `poll_url` is an absolute http(s) URL.
pub fn validate_poll_url(poll_url: &str) -> Result<Url> {
    let url = Url::parse(poll_url.trim())
        .map_err(|e| PaynowError::invalid("poll_url", format!("'{}': {}", poll_url, e)))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(PaynowError::invalid(
            "poll_url",
            format!("unsupported scheme '{}'", other),
        )),
    }
}

#[cfg(feature = "http")]
pub use self::http::HttpTransport;

#[cfg(feature = "http")]
mod http {
    use super::Transport;
    use crate::error::{PaynowError, Result};
    use log::debug;
    use std::time::Duration;

    /// Blocking `reqwest` transport.
    #[derive(Debug, Clone)]
    pub struct HttpTransport {
        client: reqwest::blocking::Client,
    }

    impl HttpTransport {
        pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

        pub fn new() -> Result<Self> {
            Self::with_timeout(Self::DEFAULT_TIMEOUT)
        }

        pub fn with_timeout(timeout: Duration) -> Result<Self> {
            let client = reqwest::blocking::Client::builder()
                .timeout(timeout)
                .build()
                .map_err(|e| PaynowError::Transport(e.to_string()))?;
            Ok(HttpTransport { client })
        }
    }

    impl Transport for HttpTransport {
        fn post_form(&self, url: &str, body: &str) -> Result<Vec<u8>> {
            debug!("POST {} ({} bytes)", url, body.len());

            let response = self
                .client
                .post(url)
                .header(
                    reqwest::header::CONTENT_TYPE,
                    "application/x-www-form-urlencoded",
                )
                .body(body.to_string())
                .send()
                .map_err(|e| PaynowError::Transport(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                return Err(PaynowError::Transport(format!("HTTP {}", status.as_u16())));
            }

            let bytes = response
                .bytes()
                .map_err(|e| PaynowError::Transport(e.to_string()))?;
            Ok(bytes.to_vec())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_poll_url_accepts_https() {
        let url = validate_poll_url("https://www.paynow.co.zw/Interface/CheckPayment/?guid=1").unwrap();
        assert_eq!(url.host_str(), Some("www.paynow.co.zw"));
    }

    #[test]
    fn test_validate_poll_url_rejects_relative() {
        assert!(validate_poll_url("/Interface/CheckPayment").is_err());
        assert!(validate_poll_url("").is_err());
    }

    #[test]
    fn test_validate_poll_url_rejects_other_schemes() {
        let err = validate_poll_url("ftp://www.paynow.co.zw/poll").unwrap_err();
        assert!(matches!(err, PaynowError::InvalidArgument { field: "poll_url", .. }));
    }
}
