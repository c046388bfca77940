//! # Attribute Value Encoding
//!
//! AnonCreds signs integers, not strings. Every raw attribute value is
//! paired with an encoded decimal string:
//!
//! - a raw value that parses as a signed 32-bit integer encodes as itself;
//! - anything else encodes as the SHA-256 digest of its UTF-8 bytes,
//!   read as a big-endian unsigned integer and rendered in decimal.
//!
//! Predicates (`>=`, `>`, `<=`, `<`) only make sense for the first branch.

use num_bigint::BigUint;
use sha2::{Digest, Sha256};

/// Encode a raw attribute value.
pub fn encode_credential_value(raw: &str) -> String {
    if let Some(n) = as_int32(raw) {
        return n.to_string();
    }
    let hash = Sha256::digest(raw.as_bytes());
    BigUint::from_bytes_be(&hash).to_str_radix(10)
}

/// True when `encoded` is the standard encoding of `raw`.
pub fn is_valid_encoding(raw: &str, encoded: &str) -> bool {
    encode_credential_value(raw) == encoded
}

/// The integer value of an encoded attribute, if it fits in 32 bits.
/// Predicate evaluation uses this.
pub fn encoded_as_int32(encoded: &str) -> Option<i32> {
    as_int32(encoded)
}

fn as_int32(raw: &str) -> Option<i32> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed != raw {
        return None;
    }
    // Reject forms that parse but would not survive a round-trip, such as "+5" or "007".
    let n: i32 = trimmed.parse().ok()?;
    (n.to_string() == trimmed).then_some(n)
}
