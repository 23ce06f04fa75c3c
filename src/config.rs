//! Integration configuration for a single Paynow merchant integration.

use crate::error::{PaynowError, Result};
use crate::money::Money;
use std::env;
use std::fmt;

/// Endpoint for web (redirect) transactions.
pub const URL_INITIATE_TRANSACTION: &str = "https://www.paynow.co.zw/interface/initiatetransaction";

/// Endpoint for mobile money (express checkout) transactions.
pub const URL_INITIATE_MOBILE_TRANSACTION: &str =
    "https://www.paynow.co.zw/interface/remotetransaction";

/// Environment variable holding the integration id.
pub const ENV_INTEGRATION_ID: &str = "PAYNOW_INTEGRATION_ID";
/// Environment variable holding the integration key.
pub const ENV_INTEGRATION_KEY: &str = "PAYNOW_INTEGRATION_KEY";
/// Environment variable holding the return URL.
pub const ENV_RETURN_URL: &str = "PAYNOW_RETURN_URL";
/// Environment variable holding the result URL.
pub const ENV_RESULT_URL: &str = "PAYNOW_RESULT_URL";

/// Credentials and callback URLs of one integration.
///
/// The integration key is the shared secret used to sign requests and verify
/// replies. It is never transmitted and is redacted from `Debug` output.
#[derive(Clone)]
pub struct Config {
    integration_id: String,
    integration_key: String,
    return_url: Option<String>,
    result_url: Option<String>,
    minimum_total: Money,
}

impl Config {
    /// Creates a configuration with no callback URLs and the default minimum total.
    pub fn new(integration_id: impl Into<String>, integration_key: impl Into<String>) -> Self {
        Config {
            integration_id: integration_id.into(),
            integration_key: integration_key.into(),
            return_url: None,
            result_url: None,
            minimum_total: Money::DEFAULT_MINIMUM,
        }
    }

    /// Reads the configuration from `PAYNOW_*` environment variables.
    ///
    /// The id and key are required; the URLs are optional.
    pub fn from_env() -> Result<Self> {
        let integration_id = required_var(ENV_INTEGRATION_ID)?;
        let integration_key = required_var(ENV_INTEGRATION_KEY)?;

        let mut config = Config::new(integration_id, integration_key);
        config.return_url = optional_var(ENV_RETURN_URL);
        config.result_url = optional_var(ENV_RESULT_URL);
        Ok(config)
    }

    pub fn with_return_url(mut self, url: impl Into<String>) -> Self {
        self.return_url = Some(url.into());
        self
    }

    pub fn with_result_url(mut self, url: impl Into<String>) -> Self {
        self.result_url = Some(url.into());
        self
    }

    /// Overrides the smallest total the client will send.
    pub fn with_minimum_total(mut self, minimum: Money) -> Self {
        self.minimum_total = minimum;
        self
    }

    pub fn integration_id(&self) -> &str {
        &self.integration_id
    }

    pub(crate) fn integration_key(&self) -> &str {
        &self.integration_key
    }

    pub fn return_url(&self) -> Option<&str> {
        self.return_url.as_deref()
    }

    pub fn result_url(&self) -> Option<&str> {
        self.result_url.as_deref()
    }

    pub fn minimum_total(&self) -> Money {
        self.minimum_total
    }

    pub(crate) fn set_return_url(&mut self, url: impl Into<String>) {
        self.return_url = Some(url.into());
    }

    pub(crate) fn set_result_url(&mut self, url: impl Into<String>) {
        self.result_url = Some(url.into());
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("integration_id", &self.integration_id)
            .field("integration_key", &"<redacted>")
            .field("return_url", &self.return_url)
            .field("result_url", &self.result_url)
            .field("minimum_total", &self.minimum_total)
            .finish()
    }
}

fn required_var(name: &'static str) -> Result<String> {
    optional_var(name)
        .ok_or_else(|| PaynowError::invalid(name, "environment variable is not set"))
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_new_uses_defaults() {
        let config = Config::new("1201", "secret");
        assert_eq!(config.integration_id(), "1201");
        assert_eq!(config.return_url(), None);
        assert_eq!(config.result_url(), None);
        assert_eq!(config.minimum_total(), Money::DEFAULT_MINIMUM);
    }

    #[test]
    fn test_builders_set_urls() {
        let config = Config::new("1201", "secret")
            .with_return_url("https://shop.example/return")
            .with_result_url("https://shop.example/result")
            .with_minimum_total(Money::from_str("0.50").unwrap());

        assert_eq!(config.return_url(), Some("https://shop.example/return"));
        assert_eq!(config.result_url(), Some("https://shop.example/result"));
        assert_eq!(config.minimum_total().to_string(), "0.50");
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = Config::new("1201", "super-secret-key");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("super-secret-key"));
        assert!(debug.contains("<redacted>"));
    }
}
