//! Verification of raw signed messages.
//!
//! No document and no anchor here: the caller supplies the message, the
//! signature and the verification method, and gets a yes or no.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use ldproof_core::Ed25519Signature;
use ldproof_did::{verify_signature, DidError, DidResolver, MethodRef};

use crate::error::{ProofError, Result};

/// The only signature type accepted.
pub const ED25519_SIGNATURE_TYPE: &str = "Ed25519";

/// A request to check one signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRequest {
    pub message: Vec<u8>,
    #[serde(rename = "type")]
    pub signature_type: String,
    /// Base58btc signature.
    pub signature_value: String,
    /// Informational. Resolution uses the verifier's resolver.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<String>,
    pub verification_method: String,
}

/// Checks [`VerificationRequest`]s against keys resolved through `R`.
pub struct RequestVerifier<R: DidResolver> {
    resolver: Arc<R>,
}

impl<R: DidResolver> Clone for RequestVerifier<R> {
    fn clone(&self) -> Self {
        Self {
            resolver: Arc::clone(&self.resolver),
        }
    }
}

impl<R: DidResolver> RequestVerifier<R> {
    pub fn new(resolver: Arc<R>) -> Self {
        Self { resolver }
    }

    /// `Ok(false)` when the signature does not match the method's key.
    pub async fn verify(&self, request: &VerificationRequest) -> Result<bool> {
        if request.signature_type != ED25519_SIGNATURE_TYPE {
            return Err(ProofError::UnsupportedSignatureType(
                request.signature_type.clone(),
            ));
        }
        let method = MethodRef::parse(&request.verification_method)?;
        let signature = Ed25519Signature::from_base58(&request.signature_value)
            .map_err(DidError::from)?;

        let unresolvable = |e: DidError| match e {
            DidError::MalformedKey(_) => ProofError::Did(e),
            other => ProofError::UnresolvableMethod {
                method: method.to_string(),
                reason: other.to_string(),
            },
        };
        let public_key = self
            .resolver
            .resolve_method(&method)
            .await
            .and_then(|resolved| resolved.ed25519_public_key())
            .map_err(unresolvable)?;

        let valid = verify_signature(&request.message, &signature, &public_key)
            .map_err(unresolvable)?;
        debug!(%method, node = ?request.node, valid, "request verified");
        Ok(valid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ldproof_core::Keypair;
    use ldproof_did::{did_key_from_public_key, DidError, KeyDidResolver};

    fn request(keypair: &Keypair, message: &[u8]) -> VerificationRequest {
        let did = did_key_from_public_key(&keypair.public_key());
        VerificationRequest {
            message: message.to_vec(),
            signature_type: ED25519_SIGNATURE_TYPE.into(),
            signature_value: keypair.sign(message).to_base58(),
            node: None,
            verification_method: format!("{did}#{}", did.method_specific_id()),
        }
    }

    #[tokio::test]
    async fn test_valid_request() {
        let keypair = Keypair::generate();
        let verifier = RequestVerifier::new(Arc::new(KeyDidResolver));
        assert!(verifier.verify(&request(&keypair, b"hello")).await.unwrap());
    }

    #[tokio::test]
    async fn test_altered_message() {
        let keypair = Keypair::generate();
        let verifier = RequestVerifier::new(Arc::new(KeyDidResolver));
        let mut req = request(&keypair, b"hello");
        req.message = b"hellO".to_vec();
        assert!(!verifier.verify(&req).await.unwrap());
    }

    #[tokio::test]
    async fn test_request_errors() {
        let keypair = Keypair::generate();
        let verifier = RequestVerifier::new(Arc::new(KeyDidResolver));

        let mut req = request(&keypair, b"hello");
        req.signature_type = "RSA".into();
        assert!(matches!(
            verifier.verify(&req).await,
            Err(ProofError::UnsupportedSignatureType(_))
        ));

        let mut req = request(&keypair, b"hello");
        req.signature_value = "not base58!".into();
        assert!(matches!(
            verifier.verify(&req).await,
            Err(ProofError::Did(DidError::MalformedSignature(_)))
        ));

        let mut req = request(&keypair, b"hello");
        req.verification_method = "did:iota:unknown#key".into();
        assert!(matches!(
            verifier.verify(&req).await,
            Err(ProofError::UnresolvableMethod { .. })
        ));
    }

    #[test]
    fn test_wire_names() {
        let keypair = Keypair::from_seed(&[3; 32]);
        let value = serde_json::to_value(request(&keypair, b"m")).unwrap();
        assert_eq!(value["type"], "Ed25519");
        assert!(value.get("signatureValue").is_some());
        assert!(value.get("verificationMethod").is_some());
        assert!(value.get("node").is_none());
    }
}
