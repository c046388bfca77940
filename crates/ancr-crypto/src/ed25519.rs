//! # Ed25519 Issuer Keys
//!
//! Key pairs and signatures used by the mock proof engine to sign
//! credential attribute payloads.
//!
//! ## Invariants
//!
//! - Signing input MUST be `&CanonicalBytes`. The holder and verifier
//!   rebuild the signed payload independently, so it has to be the JCS
//!   serialization on both sides.
//! - `Ed25519KeyPair` does not implement `Serialize` or `Debug` output of
//!   key bytes. The seed is only exposed through [`Ed25519KeyPair::seed_hex`]
//!   for storage as credential definition private material.
//! - Public keys and signatures serialize as lowercase hex strings.

use ed25519_dalek::{Signer, Verifier};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use ancr_core::CanonicalBytes;

use crate::error::CryptoError;
use crate::hex::{from_hex_fixed, to_hex};

/// An Ed25519 public key (32 bytes).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Ed25519PublicKey([u8; 32]);

/// An Ed25519 signature (64 bytes).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Ed25519Signature([u8; 64]);

/// An Ed25519 signing key.
pub struct Ed25519KeyPair {
    signing_key: ed25519_dalek::SigningKey,
}

// -- public key ----------------------------------------------------------------

impl Ed25519PublicKey {
    /// Render as 64 lowercase hex characters.
    pub fn to_hex(&self) -> String {
        to_hex(&self.0)
    }

    /// Parse from 64 hex characters.
    pub fn from_hex(hex: &str) -> Result<Self, CryptoError> {
        from_hex_fixed::<32>(hex)
            .map(Self)
            .map_err(|e| CryptoError::InvalidKey(format!("public key: {e}")))
    }

    /// Verify `signature` over `data`.
    pub fn verify(&self, data: &CanonicalBytes, signature: &Ed25519Signature) -> Result<(), CryptoError> {
        let vk = ed25519_dalek::VerifyingKey::from_bytes(&self.0)
            .map_err(|e| CryptoError::InvalidKey(format!("public key: {e}")))?;
        let sig = ed25519_dalek::Signature::from_bytes(&signature.0);
        vk.verify(data.as_bytes(), &sig)
            .map_err(|e| CryptoError::VerificationFailed(e.to_string()))
    }
}

impl Serialize for Ed25519PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Ed25519PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        Self::from_hex(&hex).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Debug for Ed25519PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ed25519PublicKey({}...)", &self.to_hex()[..8])
    }
}

// -- signature -----------------------------------------------------------------

impl Ed25519Signature {
    /// Render as 128 lowercase hex characters.
    pub fn to_hex(&self) -> String {
        to_hex(&self.0)
    }

    /// Parse from 128 hex characters.
    pub fn from_hex(hex: &str) -> Result<Self, CryptoError> {
        from_hex_fixed::<64>(hex)
            .map(Self)
            .map_err(|e| CryptoError::VerificationFailed(format!("signature: {e}")))
    }
}

impl Serialize for Ed25519Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Ed25519Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        Self::from_hex(&hex).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Debug for Ed25519Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ed25519Signature({}...)", &self.to_hex()[..8])
    }
}

// -- key pair ------------------------------------------------------------------

impl Ed25519KeyPair {
    /// Generate a new random key pair.
    pub fn generate() -> Self {
        let mut csprng = rand::rngs::OsRng;
        Self { signing_key: ed25519_dalek::SigningKey::generate(&mut csprng) }
    }

    /// Rebuild a key pair from its 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self { signing_key: ed25519_dalek::SigningKey::from_bytes(seed) }
    }

    /// Rebuild a key pair from a hex seed produced by [`Self::seed_hex`].
    pub fn from_seed_hex(hex: &str) -> Result<Self, CryptoError> {
        let seed = from_hex_fixed::<32>(hex)
            .map_err(|e| CryptoError::InvalidKey(format!("seed: {e}")))?;
        Ok(Self::from_seed(&seed))
    }

    /// The seed as hex, for storage as private key material.
    pub fn seed_hex(&self) -> String {
        to_hex(&self.signing_key.to_bytes())
    }

    /// The public key.
    pub fn public_key(&self) -> Ed25519PublicKey {
        Ed25519PublicKey(self.signing_key.verifying_key().to_bytes())
    }

    /// Sign canonical bytes.
    pub fn sign(&self, data: &CanonicalBytes) -> Ed25519Signature {
        Ed25519Signature(self.signing_key.sign(data.as_bytes()).to_bytes())
    }
}

impl std::fmt::Debug for Ed25519KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ed25519KeyPair(<private>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(age: &str) -> CanonicalBytes {
        CanonicalBytes::new(&serde_json::json!({
            "cred_def_id": "LjgpST2rjsoxYegQDRm7EL:3:CL:15:default",
            "values": {"age": age}
        }))
        .unwrap()
    }

    #[test]
    fn sign_and_verify_payload() {
        let kp = Ed25519KeyPair::generate();
        let sig = kp.sign(&payload("25"));
        kp.public_key().verify(&payload("25"), &sig).expect("valid signature");
    }

    #[test]
    fn tampered_payload_fails() {
        let kp = Ed25519KeyPair::generate();
        let sig = kp.sign(&payload("25"));
        let err = kp.public_key().verify(&payload("35"), &sig).unwrap_err();
        assert!(matches!(err, CryptoError::VerificationFailed(_)));
    }

    #[test]
    fn other_issuer_key_fails() {
        let issuer = Ed25519KeyPair::generate();
        let impostor = Ed25519KeyPair::generate();
        let sig = impostor.sign(&payload("25"));
        assert!(issuer.public_key().verify(&payload("25"), &sig).is_err());
    }

    #[test]
    fn seed_hex_restores_same_key() {
        let kp = Ed25519KeyPair::generate();
        let restored = Ed25519KeyPair::from_seed_hex(&kp.seed_hex()).unwrap();
        assert_eq!(kp.public_key(), restored.public_key());
        assert_eq!(kp.sign(&payload("1")), restored.sign(&payload("1")));
    }

    #[test]
    fn public_key_and_signature_serialize_as_hex() {
        let kp = Ed25519KeyPair::from_seed(&[7u8; 32]);
        let pk_json = serde_json::to_string(&kp.public_key()).unwrap();
        assert_eq!(pk_json.len(), 66);
        let pk: Ed25519PublicKey = serde_json::from_str(&pk_json).unwrap();
        assert_eq!(pk, kp.public_key());

        let sig = kp.sign(&payload("2"));
        let sig_json = serde_json::to_string(&sig).unwrap();
        assert_eq!(sig_json.len(), 130);
        let back: Ed25519Signature = serde_json::from_str(&sig_json).unwrap();
        assert_eq!(back, sig);
    }

    #[test]
    fn malformed_hex_rejected() {
        assert!(Ed25519PublicKey::from_hex("abcd").is_err());
        assert!(Ed25519Signature::from_hex(&"zz".repeat(64)).is_err());
        assert!(Ed25519KeyPair::from_seed_hex("").is_err());
    }

    #[test]
    fn debug_does_not_leak_private_key() {
        let kp = Ed25519KeyPair::from_seed(&[9u8; 32]);
        let debug = format!("{kp:?}");
        assert_eq!(debug, "Ed25519KeyPair(<private>)");
        assert!(!debug.contains(&kp.seed_hex()));
    }
}
