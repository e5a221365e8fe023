//! Ed25519 signing bound to a DID.

use std::sync::Arc;

use ldproof_core::{CoreError, Ed25519PublicKey, Ed25519Signature, Keypair};
use tracing::{debug, warn};

use crate::did::{Did, MethodRef};
use crate::error::{DidError, Result};
use crate::resolver::DidResolver;

/// Signs payloads on behalf of one DID.
///
/// The signer holds no key material. Each `sign` call is handed the private
/// key and checks it against the key published under the chosen method.
pub struct Signer<R: DidResolver> {
    did: Did,
    resolver: Arc<R>,
}

impl<R: DidResolver> Clone for Signer<R> {
    fn clone(&self) -> Self {
        Self {
            did: self.did.clone(),
            resolver: Arc::clone(&self.resolver),
        }
    }
}

impl<R: DidResolver> Signer<R> {
    /// Bind a signer to `did`. Nothing is resolved yet.
    pub fn create(did: &str, resolver: Arc<R>) -> Result<Self> {
        Ok(Self {
            did: Did::parse(did)?,
            resolver,
        })
    }

    pub fn did(&self) -> &Did {
        &self.did
    }

    pub fn resolver(&self) -> &Arc<R> {
        &self.resolver
    }

    /// The `did#fragment` reference for one of this DID's methods.
    pub fn method(&self, fragment: &str) -> Result<MethodRef> {
        self.did.join(fragment)
    }

    /// Sign `payload` with the key published under `did#fragment`.
    ///
    /// Fails with `Signing` when the method is not an Ed25519 key or when
    /// `private_key` does not derive the published public key.
    pub async fn sign(
        &self,
        payload: &[u8],
        private_key: &Keypair,
        fragment: &str,
    ) -> Result<Ed25519Signature> {
        let method = self.method(fragment)?;
        let resolved = self.resolver.resolve_method(&method).await?;

        let published = resolved.ed25519_public_key().map_err(|e| DidError::Signing {
            method: method.to_string(),
            reason: e.to_string(),
        })?;

        if published != private_key.public_key() {
            warn!(%method, "private key does not match published key");
            return Err(DidError::Signing {
                method: method.to_string(),
                reason: "private key does not match the published public key".into(),
            });
        }

        debug!(%method, len = payload.len(), "signed");
        Ok(private_key.sign(payload))
    }

    /// See [`verify_signature`].
    pub fn verify(
        &self,
        payload: &[u8],
        signature: &Ed25519Signature,
        public_key: &Ed25519PublicKey,
    ) -> Result<bool> {
        verify_signature(payload, signature, public_key)
    }

    /// See [`verify_encoded`].
    pub fn verify_encoded(&self, payload: &[u8], signature: &str, public_key: &str) -> Result<bool> {
        verify_encoded(payload, signature, public_key)
    }
}

/// Check an Ed25519 signature.
///
/// A mismatch is `Ok(false)`. The only error is a public key that is not a
/// valid curve point.
pub fn verify_signature(
    payload: &[u8],
    signature: &Ed25519Signature,
    public_key: &Ed25519PublicKey,
) -> Result<bool> {
    match public_key.verify(payload, signature) {
        Ok(()) => Ok(true),
        Err(CoreError::InvalidSignature) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Like [`verify_signature`], with base58btc signature and key text.
pub fn verify_encoded(payload: &[u8], signature: &str, public_key: &str) -> Result<bool> {
    let signature = Ed25519Signature::from_base58(signature)?;
    let public_key = Ed25519PublicKey::from_base58(public_key)?;
    verify_signature(payload, &signature, &public_key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DidDocument, KeyType, VerificationMethod};
    use crate::resolver::MemoryResolver;

    const DID: &str = "did:iota:signer";

    fn setup(keypair: &Keypair) -> Signer<MemoryResolver> {
        let resolver = Arc::new(MemoryResolver::new());
        let signer = Signer::create(DID, Arc::clone(&resolver)).unwrap();
        let method = signer.method("key").unwrap();
        resolver
            .register(
                DidDocument::new(signer.did().clone())
                    .with_method(VerificationMethod::ed25519(&method, &keypair.public_key())),
            )
            .unwrap();
        signer
    }

    #[test]
    fn test_create_rejects_bad_did() {
        let resolver = Arc::new(MemoryResolver::new());
        assert!(matches!(
            Signer::create("iota:abc", resolver),
            Err(DidError::InvalidDid(_))
        ));
    }

    #[tokio::test]
    async fn test_sign_and_verify() {
        let keypair = Keypair::generate();
        let signer = setup(&keypair);

        let signature = signer.sign(b"payload", &keypair, "key").await.unwrap();
        assert!(signer.verify(b"payload", &signature, &keypair.public_key()).unwrap());
        assert!(!signer.verify(b"payloaD", &signature, &keypair.public_key()).unwrap());

        // Deterministic.
        let again = signer.sign(b"payload", &keypair, "key").await.unwrap();
        assert_eq!(signature, again);
    }

    #[tokio::test]
    async fn test_sign_with_wrong_key() {
        let keypair = Keypair::generate();
        let signer = setup(&keypair);

        let err = signer
            .sign(b"payload", &Keypair::generate(), "key")
            .await
            .unwrap_err();
        assert!(matches!(err, DidError::Signing { .. }));
    }

    #[tokio::test]
    async fn test_sign_with_unknown_method() {
        let keypair = Keypair::generate();
        let signer = setup(&keypair);

        let err = signer.sign(b"payload", &keypair, "other").await.unwrap_err();
        assert!(matches!(err, DidError::MethodNotFound(_)));
    }

    #[tokio::test]
    async fn test_sign_with_non_ed25519_method() {
        let keypair = Keypair::generate();
        let resolver = Arc::new(MemoryResolver::new());
        let signer = Signer::create(DID, Arc::clone(&resolver)).unwrap();
        let method = signer.method("agreement").unwrap();

        let mut vm = VerificationMethod::ed25519(&method, &keypair.public_key());
        vm.key_type = KeyType::Other("X25519KeyAgreementKey2019".into());
        resolver
            .register(DidDocument::new(signer.did().clone()).with_method(vm))
            .unwrap();

        let err = signer.sign(b"payload", &keypair, "agreement").await.unwrap_err();
        assert!(matches!(err, DidError::Signing { .. }));
    }

    #[test]
    fn test_verify_encoded() {
        let keypair = Keypair::generate();
        let signature = keypair.sign(b"msg").to_base58();
        let public_key = keypair.public_key().to_base58();

        assert!(verify_encoded(b"msg", &signature, &public_key).unwrap());
        assert!(!verify_encoded(b"other", &signature, &public_key).unwrap());
        assert!(matches!(
            verify_encoded(b"msg", "0OIl", &public_key),
            Err(DidError::MalformedSignature(_))
        ));
        assert!(matches!(
            verify_encoded(b"msg", &signature, "abc"),
            Err(DidError::MalformedKey(_))
        ));
    }
}
