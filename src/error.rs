//! Error types for the Paynow client.

use crate::money::Money;
use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, PaynowError>;

/// Errors that can occur while building, sending or verifying a transaction.
#[derive(Error, Debug)]
pub enum PaynowError {
    /// Bad caller input (cart item, configuration value, poll URL)
    #[error("Invalid {field}: {message}")]
    InvalidArgument { field: &'static str, message: String },

    /// Cart total is below the gateway's minimum chargeable amount
    #[error("Transaction total {total} is below the minimum of {minimum}")]
    InvalidTotal { total: Money, minimum: Money },

    /// Mobile transaction without an auth email
    #[error("Auth email is required for mobile transactions")]
    MissingAuthEmail,

    /// Reply body could not be read as key/value pairs
    #[error("Malformed response from Paynow: {0}")]
    MalformedResponse(String),

    /// Signed reply without a hash field
    #[error("Response from Paynow does not contain a hash")]
    MissingHash,

    /// Reply hash does not match the locally computed one.
    ///
    /// The reply may have been tampered with or the integration key is wrong;
    /// no field of the reply should be trusted.
    #[error("Hashes do not match")]
    HashMismatch,

    /// Failure reported by the transport, passed through unmodified
    #[error("Transport error: {0}")]
    Transport(String),

    /// Failed to open or read an input file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing error
    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    /// Missing command-line argument
    #[error("Missing argument. Usage: paynow-client sign <items.csv> <reference> [auth_email] | verify <reply-file>")]
    MissingArgument,

    /// Unrecognised command-line subcommand
    #[error("Unknown command '{0}'")]
    UnknownCommand(String),
}

impl PaynowError {
    pub(crate) fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        PaynowError::InvalidArgument {
            field,
            message: message.into(),
        }
    }
}
