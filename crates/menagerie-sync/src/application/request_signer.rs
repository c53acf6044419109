//! Request Signer
//!
//! Produces the `X-GUN-Signature` value for a backend request: the JSON body is
//! serialized once, signed with ECDSA over SHA-256, and the raw 64-byte r||s
//! signature is hex-encoded. The signed string is the one sent on the wire.

use std::sync::Arc;

use serde::Serialize;

use menagerie::{
    DomainError, Identity, PublicKey, RawSigner, SignatureHex, SignedPayload, SigningError,
    SigningStage,
};

use super::SessionManager;

/// Signs payloads with the session's live identity
#[derive(Debug, Clone)]
pub struct RequestSigner {
    session: Arc<SessionManager>,
}

impl RequestSigner {
    pub fn new(session: Arc<SessionManager>) -> Self {
        Self { session }
    }

    pub fn sign<T: Serialize>(&self, payload: &T) -> Result<SignedPayload, DomainError> {
        Self::sign_as(self.session.current().as_deref(), payload)
    }

    /// Sign on behalf of `identity`; `None` is a `NotAuthenticated` failure
    pub fn sign_as<T: Serialize>(
        identity: Option<&Identity>,
        payload: &T,
    ) -> Result<SignedPayload, DomainError> {
        let identity = identity.ok_or_else(DomainError::not_authenticated)?;
        Ok(Self::sign_with(identity.signer(), payload)?)
    }

    pub fn sign_with<T: Serialize>(
        signer: &dyn RawSigner,
        payload: &T,
    ) -> Result<SignedPayload, SigningError> {
        let body = serde_json::to_string(payload)
            .map_err(|e| SigningError::new(SigningStage::Serialize, e.to_string()))?;
        let raw = signer.sign_raw(body.as_bytes())?;
        let signature = SignatureHex::parse(hex::encode(raw.as_bytes()))
            .map_err(|e| SigningError::new(SigningStage::Transcode, e))?;

        tracing::debug!("Signed {} byte payload", body.len());
        Ok(SignedPayload { body, signature })
    }

    /// Check a payload the way the backend does: against the body bytes as sent
    pub fn verify(public_key: &PublicKey, payload: &SignedPayload) -> bool {
        public_key.verify(payload.body.as_bytes(), &payload.signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use menagerie::{KeyPair, RawSignature};
    use serde_json::json;

    struct BrokenSigner(PublicKey);

    impl RawSigner for BrokenSigner {
        fn sign_raw(&self, _message: &[u8]) -> Result<RawSignature, SigningError> {
            Err(SigningError::new(SigningStage::Sign, "key unavailable"))
        }

        fn public_key(&self) -> &PublicKey {
            &self.0
        }
    }

    #[test]
    fn test_signature_is_128_hex_and_verifies() {
        let identity = Identity::new("alice", KeyPair::generate());
        let signed = RequestSigner::sign_as(Some(&identity), &json!({"a": 1})).unwrap();

        assert_eq!(signed.body, r#"{"a":1}"#);
        assert_eq!(signed.signature.as_str().len(), 128);
        assert!(signed
            .signature
            .as_str()
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
        assert!(RequestSigner::verify(identity.public_key(), &signed));
    }

    #[test]
    fn test_tampered_body_fails_verification() {
        let identity = Identity::new("alice", KeyPair::generate());
        let mut signed = RequestSigner::sign_as(Some(&identity), &json!({"a": 1})).unwrap();
        signed.body = r#"{"a":2}"#.to_string();
        assert!(!RequestSigner::verify(identity.public_key(), &signed));
    }

    #[test]
    fn test_missing_identity_is_not_authenticated() {
        let err = RequestSigner::sign_as(None, &json!({})).unwrap_err();
        assert!(matches!(err, DomainError::NotAuthenticated(_)));
    }

    #[test]
    fn test_sign_failure_is_reported_without_signature() {
        let signer = BrokenSigner(KeyPair::generate().public_key().clone());
        let err = RequestSigner::sign_with(&signer, &json!({"a": 1})).unwrap_err();
        assert_eq!(err.stage, SigningStage::Sign);
    }
}
