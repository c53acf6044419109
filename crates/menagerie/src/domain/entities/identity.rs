//! Identity and key material
//!
//! Each identity owns a secp256k1 key pair. The public key has two encodings:
//! - namespace form `base64url(x).base64url(y)`, used to scope graph relations
//! - hex form of `x || y` (128 chars), the `userId` the agent backend loads
//!   with a raw 64-byte point loader
//!
//! Signatures are ECDSA over SHA-256 of the message bytes, emitted as the raw
//! 64-byte `r || s` value rather than a DER or packet encoding.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use k256::ecdsa::signature::{DigestSigner, Verifier};
use k256::ecdsa::{Signature, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::errors::{SigningError, SigningStage};
use crate::domain::value_objects::{Namespace, SignatureHex, RAW_SIGNATURE_LEN};

const COORDINATE_LEN: usize = 32;

/// Public half of an identity's key pair
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey {
    verifying_key: VerifyingKey,
}

impl PublicKey {
    /// Parse the namespace form `x.y`; each coordinate must decode to exactly 32 bytes
    pub fn from_namespace_form(encoded: &str) -> Result<Self, String> {
        let (x, y) = encoded
            .split_once('.')
            .ok_or_else(|| format!("public key {encoded:?} is not in x.y form"))?;
        let mut point = Vec::with_capacity(1 + 2 * COORDINATE_LEN);
        point.push(0x04);
        point.extend_from_slice(&decode_coordinate(x)?);
        point.extend_from_slice(&decode_coordinate(y)?);
        let verifying_key = VerifyingKey::from_sec1_bytes(&point)
            .map_err(|e| format!("public key is not a curve point: {e}"))?;
        Ok(Self { verifying_key })
    }

    /// Parse the 128-character hex form of `x || y`
    pub fn from_hex(encoded: &str) -> Result<Self, String> {
        let raw = hex::decode(encoded).map_err(|e| format!("invalid public key hex: {e}"))?;
        if raw.len() != 2 * COORDINATE_LEN {
            return Err(format!(
                "public key must be {} bytes, got {}",
                2 * COORDINATE_LEN,
                raw.len()
            ));
        }
        let mut point = Vec::with_capacity(1 + raw.len());
        point.push(0x04);
        point.extend_from_slice(&raw);
        let verifying_key = VerifyingKey::from_sec1_bytes(&point)
            .map_err(|e| format!("public key is not a curve point: {e}"))?;
        Ok(Self { verifying_key })
    }

    /// Uncompressed `x || y` without the SEC1 tag byte
    pub fn raw_point(&self) -> Vec<u8> {
        let encoded = self.verifying_key.to_encoded_point(false);
        encoded.as_bytes()[1..].to_vec()
    }

    pub fn to_namespace_form(&self) -> String {
        let raw = self.raw_point();
        let (x, y) = raw.split_at(COORDINATE_LEN);
        format!("{}.{}", URL_SAFE_NO_PAD.encode(x), URL_SAFE_NO_PAD.encode(y))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.raw_point())
    }

    pub fn namespace(&self) -> Namespace {
        Namespace::for_public_key(&self.to_namespace_form())
    }

    /// Check a raw hex signature over `message` the way the backend verifier does:
    /// SHA-256 the exact bytes, then ECDSA-verify
    pub fn verify(&self, message: &[u8], signature: &SignatureHex) -> bool {
        let Ok(bytes) = hex::decode(signature.as_str()) else {
            return false;
        };
        let Ok(sig) = Signature::from_slice(&bytes) else {
            return false;
        };
        self.verifying_key.verify(message, &sig).is_ok()
    }
}

fn decode_coordinate(part: &str) -> Result<[u8; COORDINATE_LEN], String> {
    let bytes = URL_SAFE_NO_PAD
        .decode(part)
        .map_err(|e| format!("invalid base64url coordinate: {e}"))?;
    bytes.as_slice().try_into().map_err(|_| {
        format!(
            "coordinate must decode to {} bytes, got {}",
            COORDINATE_LEN,
            bytes.len()
        )
    })
}

impl std::fmt::Display for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_namespace_form())
    }
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("PublicKey").field(&self.to_namespace_form()).finish()
    }
}

impl Serialize for PublicKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_namespace_form())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        Self::from_namespace_form(&encoded).map_err(serde::de::Error::custom)
    }
}

/// Raw fixed-length ECDSA signature value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSignature([u8; RAW_SIGNATURE_LEN]);

impl RawSignature {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, SigningError> {
        let raw: [u8; RAW_SIGNATURE_LEN] = bytes.try_into().map_err(|_| {
            SigningError::new(
                SigningStage::Sign,
                format!(
                    "raw signature must be {} bytes, got {}",
                    RAW_SIGNATURE_LEN,
                    bytes.len()
                ),
            )
        })?;
        Ok(Self(raw))
    }

    pub fn as_bytes(&self) -> &[u8; RAW_SIGNATURE_LEN] {
        &self.0
    }
}

/// Signing capability that yields the raw signature value directly
pub trait RawSigner: Send + Sync {
    fn sign_raw(&self, message: &[u8]) -> Result<RawSignature, SigningError>;

    fn public_key(&self) -> &PublicKey;
}

/// Secret and public key material of one identity
#[derive(Clone)]
pub struct KeyPair {
    signing_key: SigningKey,
    public_key: PublicKey,
}

impl KeyPair {
    /// Generate a new key pair from OS entropy
    pub fn generate() -> Self {
        Self::from_signing_key(SigningKey::random(&mut OsRng))
    }

    /// Restore from the 32-byte secret scalar, hex encoded
    pub fn from_secret_hex(secret: &str) -> Result<Self, String> {
        let bytes = hex::decode(secret).map_err(|e| format!("invalid secret key hex: {e}"))?;
        let signing_key =
            SigningKey::from_slice(&bytes).map_err(|e| format!("invalid secret key: {e}"))?;
        Ok(Self::from_signing_key(signing_key))
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let public_key = PublicKey {
            verifying_key: VerifyingKey::from(&signing_key),
        };
        Self {
            signing_key,
            public_key,
        }
    }

    /// Secret scalar as hex (SECRET - persist only in the local replica)
    pub fn secret_hex(&self) -> String {
        hex::encode(self.signing_key.to_bytes())
    }
}

impl RawSigner for KeyPair {
    fn sign_raw(&self, message: &[u8]) -> Result<RawSignature, SigningError> {
        let digest = Sha256::new_with_prefix(message);
        let signature: Signature = self
            .signing_key
            .try_sign_digest(digest)
            .map_err(|e| SigningError::new(SigningStage::Sign, e.to_string()))?;
        RawSignature::from_slice(&signature.to_bytes())
    }

    fn public_key(&self) -> &PublicKey {
        &self.public_key
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key)
            .finish_non_exhaustive()
    }
}

/// An authenticated user: alias plus key material
#[derive(Debug, Clone)]
pub struct Identity {
    alias: String,
    key_pair: KeyPair,
}

impl Identity {
    pub fn new(alias: impl Into<String>, key_pair: KeyPair) -> Self {
        Self {
            alias: alias.into(),
            key_pair,
        }
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn public_key(&self) -> &PublicKey {
        self.key_pair.public_key()
    }

    pub fn namespace(&self) -> Namespace {
        self.public_key().namespace()
    }

    pub fn signer(&self) -> &dyn RawSigner {
        &self.key_pair
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_and_hex_forms_agree() {
        let pair = KeyPair::generate();
        let public = pair.public_key();

        let from_ns = PublicKey::from_namespace_form(&public.to_namespace_form()).unwrap();
        let from_hex = PublicKey::from_hex(&public.to_hex()).unwrap();

        assert_eq!(&from_ns, public);
        assert_eq!(&from_hex, public);
        assert_eq!(public.to_hex().len(), 128);
    }

    #[test]
    fn test_short_coordinate_rejected() {
        let pair = KeyPair::generate();
        let encoded = pair.public_key().to_namespace_form();
        let (x, _) = encoded.split_once('.').unwrap();
        let truncated = format!("{}.{}", x, URL_SAFE_NO_PAD.encode([7u8; 31]));

        let err = PublicKey::from_namespace_form(&truncated).unwrap_err();
        assert!(err.contains("32 bytes"));
    }

    #[test]
    fn test_sign_raw_verifies() {
        let pair = KeyPair::generate();
        let message = br#"{"a":1}"#;
        let raw = pair.sign_raw(message).unwrap();
        let sig = SignatureHex::parse(hex::encode(raw.as_bytes())).unwrap();

        assert!(pair.public_key().verify(message, &sig));
        assert!(!pair.public_key().verify(br#"{"a":2}"#, &sig));
    }

    #[test]
    fn test_wrong_key_fails() {
        let pair = KeyPair::generate();
        let other = KeyPair::generate();
        let raw = pair.sign_raw(b"hello").unwrap();
        let sig = SignatureHex::parse(hex::encode(raw.as_bytes())).unwrap();

        assert!(!other.public_key().verify(b"hello", &sig));
    }

    #[test]
    fn test_secret_round_trip() {
        let pair = KeyPair::generate();
        let restored = KeyPair::from_secret_hex(&pair.secret_hex()).unwrap();
        assert_eq!(restored.public_key(), pair.public_key());
    }

    #[test]
    fn test_debug_hides_secret() {
        let pair = KeyPair::generate();
        let rendered = format!("{:?}", Identity::new("rex", pair.clone()));
        assert!(!rendered.contains(&pair.secret_hex()));
    }
}
