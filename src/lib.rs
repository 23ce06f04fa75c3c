//! # Paynow Client
//!
//! Initiates web and mobile money transactions with the Paynow gateway and
//! verifies and polls their status.
//!
//! ## Design Principles
//!
//! - **Fixed-point money**: 2 decimal places via `rust_decimal`, rounded up
//! - **Order-sensitive signing**: SHA-512 over field values in canonical order
//! - **Verify before trust**: no reply field is exposed until its hash checks out
//! - **Pluggable transport**: HTTP is behind the [`Transport`] trait
//!
//! ## Example
//!
//! ```no_run
//! use paynow_client::{Config, Paynow, Transport};
//! # struct MyTransport;
//! # impl Transport for MyTransport {
//! #     fn post_form(&self, _: &str, _: &str) -> paynow_client::Result<Vec<u8>> { unimplemented!() }
//! # }
//!
//! let config = Config::new("1201", "3e9fed89-60e1-4ce5-ab6e-6b1eb2d4f977")
//!     .with_return_url("https://shop.example/return")
//!     .with_result_url("https://shop.example/result");
//! let paynow = Paynow::new(config, MyTransport);
//!
//! let mut payment = paynow.create_payment("Invoice 35", Some("buyer@example.com"));
//! payment.add_f64("Bananas", 2.50).unwrap();
//!
//! let response = paynow.send(payment).unwrap();
//! if response.success {
//!     let status = paynow
//!         .check_transaction_status(response.poll_url.as_deref().unwrap())
//!         .unwrap();
//!     println!("paid: {}", status.paid);
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod money;
pub mod payment;
pub mod request;
pub mod response;
pub mod signer;
pub mod transport;

pub use client::Paynow;
pub use config::Config;
pub use error::{PaynowError, Result};
pub use money::Money;
pub use payment::Payment;
pub use request::{CanonicalRequest, MobileMethod, TransactionKind};
pub use response::{GatewayResponse, InitResponse, ReplyFields, StatusResponse};
pub use transport::Transport;
#[cfg(feature = "http")]
pub use transport::HttpTransport;
