//! # SHA-256 Over Raw Bytes
//!
//! Tails files are opaque binary blobs addressed by the hash of their
//! contents, so they are hashed directly rather than through
//! `CanonicalBytes`. Structured data goes through
//! [`ancr_core::sha256_digest`] instead.

use ancr_core::ContentDigest;
use sha2::{Digest, Sha256};

/// SHA-256 of raw bytes.
pub fn sha256_raw(data: &[u8]) -> ContentDigest {
    let hash = Sha256::digest(data);
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&hash);
    ContentDigest::from_bytes(bytes)
}

/// SHA-256 over several byte slices, in order.
pub fn sha256_concat(parts: &[&[u8]]) -> ContentDigest {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&hasher.finalize());
    ContentDigest::from_bytes(bytes)
}
