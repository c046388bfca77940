//! # ancr-crypto — Cryptographic Primitives
//!
//! Building blocks for the mock proof engine and tails handling:
//!
//! - **Ed25519** key pairs, signing and verification over `CanonicalBytes`.
//! - **SHA-256** over raw bytes for tails files.
//!
//! ## Crate Policy
//!
//! - Depends only on `ancr-core` internally.
//! - No mocking of cryptographic operations in tests: real SHA-256, real Ed25519.

pub mod ed25519;
pub mod error;
pub mod hex;
pub mod sha256;

pub use ed25519::{Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};
pub use error::CryptoError;
pub use sha256::{sha256_concat, sha256_raw};
