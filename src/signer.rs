//! SHA-512 transaction signing.
//!
//! The signature is the upper-case hex SHA-512 digest of every field value
//! concatenated in field order (skipping any field named `hash`), followed by
//! the lower-cased integration key.

use crate::error::{PaynowError, Result};
use log::warn;
use sha2::{Digest, Sha512};
use subtle::ConstantTimeEq;

/// Name of the field that carries the signature.
pub const HASH_FIELD: &str = "hash";

/// Returns `true` if `name` is the signature field, ignoring case.
pub fn is_hash_field(name: &str) -> bool {
    name.eq_ignore_ascii_case(HASH_FIELD)
}

/// Computes the signature of an ordered field sequence.
///
/// # Examples
///
/// ```
/// use paynow_client::signer::sign;
///
/// let fields = [("reference", "INV-1"), ("amount", "10.00")];
/// let digest = sign(fields, "Key");
/// assert_eq!(digest.len(), 128);
/// assert_eq!(digest, sign(fields, "key"));
/// ```
pub fn sign<I, K, V>(fields: I, integration_key: &str) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut hasher = Sha512::new();
    for (name, value) in fields {
        if is_hash_field(name.as_ref()) {
            continue;
        }
        hasher.update(value.as_ref().as_bytes());
    }
    hasher.update(integration_key.to_lowercase().as_bytes());

    hex::encode_upper(hasher.finalize())
}

/// Checks `supplied` against the signature recomputed over `fields`.
///
/// The comparison runs in constant time. Fails with `HashMismatch` when the
/// digests differ.
pub fn verify<I, K, V>(fields: I, supplied: &str, integration_key: &str) -> Result<()>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let expected = sign(fields, integration_key);
    let supplied = supplied.trim().to_ascii_uppercase();

    let matches: bool = expected.as_bytes().ct_eq(supplied.as_bytes()).into();
    if !matches {
        warn!("Reply signature does not match the locally computed hash");
        return Err(PaynowError::HashMismatch);
    }
    Ok(())
}
