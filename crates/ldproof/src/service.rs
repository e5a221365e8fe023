//! The service handle: one transport, one resolver, one configuration.

use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use ldproof_channel::{AnchoringChannel, ChannelReader, LedgerTransport, UnboundChannel};
use ldproof_core::{AnchorageId, Keypair};
use ldproof_did::{DidResolver, Signer};
use ldproof_protocol::proof::as_object;
use ldproof_protocol::{
    LdProofGenerator, LdProofVerifier, ProofError, RequestVerifier, SignedDocument,
    VerificationOutcome, VerificationRequest,
};

use crate::config::LdProofsConfig;
use crate::error::Result;

/// Entry point wiring a ledger transport and a DID resolver together.
///
/// Both collaborators are passed in explicitly; the handle is cheap to clone
/// and can be shared across tasks.
pub struct LdProofs<T: LedgerTransport, R: DidResolver> {
    config: LdProofsConfig,
    transport: Arc<T>,
    resolver: Arc<R>,
}

impl<T: LedgerTransport, R: DidResolver> Clone for LdProofs<T, R> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            transport: Arc::clone(&self.transport),
            resolver: Arc::clone(&self.resolver),
        }
    }
}

impl<T: LedgerTransport, R: DidResolver> LdProofs<T, R> {
    /// Create a handle. Fails if the configuration is unusable.
    pub fn new(config: LdProofsConfig, transport: Arc<T>, resolver: Arc<R>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            transport,
            resolver,
        })
    }

    pub fn config(&self) -> &LdProofsConfig {
        &self.config
    }

    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    pub fn resolver(&self) -> &Arc<R> {
        &self.resolver
    }

    /// Create and bind a new channel on the configured node.
    pub async fn create_channel(&self) -> Result<AnchoringChannel<T>> {
        let channel = UnboundChannel::create(self.config.node.clone(), Arc::clone(&self.transport))?
            .with_config(self.config.channel.clone())
            .bind()
            .await?;
        info!(channel_id = %channel.channel_id(), "channel ready");
        Ok(channel)
    }

    pub fn signer(&self, did: &str) -> Result<Signer<R>> {
        Ok(Signer::create(did, Arc::clone(&self.resolver))?)
    }

    pub fn generator(&self, channel: AnchoringChannel<T>, did: &str) -> Result<LdProofGenerator<T, R>> {
        Ok(LdProofGenerator::new(channel, self.signer(did)?))
    }

    pub fn verifier(&self) -> LdProofVerifier<T, R> {
        let reader = ChannelReader::new(Arc::clone(&self.transport))
            .with_read_timeout(self.config.channel.read_timeout);
        LdProofVerifier::new(reader, Arc::clone(&self.resolver))
    }

    pub fn request_verifier(&self) -> RequestVerifier<R> {
        RequestVerifier::new(Arc::clone(&self.resolver))
    }

    /// Sign a plain JSON document. `private_key` is a base58btc seed.
    ///
    /// Documents carrying `@context` are refused: [`verify`](Self::verify)
    /// would read them as JSON-LD. Use [`sign_json_ld`](Self::sign_json_ld).
    pub async fn sign_json(
        &self,
        channel: &AnchoringChannel<T>,
        did: &str,
        document: &Value,
        method: &str,
        private_key: &str,
        anchorage_id: &AnchorageId,
    ) -> Result<SignedDocument> {
        if as_object(document)?.contains_key("@context") {
            return Err(ProofError::InvalidDocument(
                "document has @context; sign it as JSON-LD".into(),
            )
            .into());
        }
        let keypair = Keypair::from_base58(private_key)?;
        let generator = self.generator(channel.clone(), did)?;
        Ok(generator
            .build_for_json(document, method, &keypair, anchorage_id)
            .await?)
    }

    /// Sign a JSON-LD document. `private_key` is a base58btc seed.
    pub async fn sign_json_ld(
        &self,
        channel: &AnchoringChannel<T>,
        did: &str,
        document: &Value,
        method: &str,
        private_key: &str,
        anchorage_id: &AnchorageId,
    ) -> Result<SignedDocument> {
        let keypair = Keypair::from_base58(private_key)?;
        let generator = self.generator(channel.clone(), did)?;
        Ok(generator
            .build_for_json_ld(document, method, &keypair, anchorage_id)
            .await?)
    }

    /// Verify a signed document, choosing the canonicalization from its
    /// shape: JSON-LD when it has `@context`, JCS otherwise. This matches
    /// what [`sign_json`](Self::sign_json) and
    /// [`sign_json_ld`](Self::sign_json_ld) accept.
    pub async fn verify(&self, document: &Value) -> Result<VerificationOutcome> {
        Ok(self.verifier().verify_inferred(document).await?)
    }

    pub async fn verify_json(&self, document: &Value) -> Result<VerificationOutcome> {
        Ok(self.verifier().verify_json(document).await?)
    }

    pub async fn verify_json_ld(&self, document: &Value) -> Result<VerificationOutcome> {
        Ok(self.verifier().verify_json_ld(document).await?)
    }

    pub async fn verify_request(&self, request: &VerificationRequest) -> Result<bool> {
        Ok(self.request_verifier().verify(request).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ldproof_channel::MemoryLedger;
    use ldproof_did::{DidDocument, MemoryResolver, VerificationMethod};
    use serde_json::json;

    use crate::error::LdProofsError;

    const DID: &str = "did:iota:EmsBSiBR7kjuYPLMHmZnyzmZY7t985t5BBsvK3Dbiw3d";
    const PRIVATE_KEY: &str = "TEBVMPPX91ZhtBZ8R8zBP6WZpVeAnrWMnknkSHThmYk";

    fn service() -> LdProofs<MemoryLedger, MemoryResolver> {
        let resolver = Arc::new(MemoryResolver::new());
        let keypair = Keypair::from_base58(PRIVATE_KEY).unwrap();
        let did = ldproof_did::Did::parse(DID).unwrap();
        let method = did.join("key").unwrap();
        resolver
            .register(DidDocument::new(did).with_method(VerificationMethod::ed25519(&method, &keypair.public_key())))
            .unwrap();

        LdProofs::new(LdProofsConfig::default(), Arc::new(MemoryLedger::new()), resolver).unwrap()
    }

    #[tokio::test]
    async fn test_sign_and_verify_with_encoded_key() {
        let service = service();
        let channel = service.create_channel().await.unwrap();
        let first = channel.first_anchorage_id();

        let signed = service
            .sign_json(&channel, DID, &json!({"a": 1}), "key", PRIVATE_KEY, &first)
            .await
            .unwrap();
        assert!(service.verify(&signed.document).await.unwrap().is_verified());
    }

    #[tokio::test]
    async fn test_malformed_private_key() {
        let service = service();
        let channel = service.create_channel().await.unwrap();
        let first = channel.first_anchorage_id();

        let err = service
            .sign_json(&channel, DID, &json!({"a": 1}), "key", "short", &first)
            .await
            .unwrap_err();
        assert!(matches!(err, LdProofsError::Core(_)));
    }

    #[tokio::test]
    async fn test_sign_json_refuses_context() {
        let service = service();
        let channel = service.create_channel().await.unwrap();
        let first = channel.first_anchorage_id();
        let document = json!({"@context": "https://schema.org", "name": "x", "extra": 1});

        let err = service
            .sign_json(&channel, DID, &document, "key", PRIVATE_KEY, &first)
            .await
            .unwrap_err();
        assert!(matches!(err, LdProofsError::Proof(ProofError::InvalidDocument(_))));

        // Nothing was anchored, so the anchorage is still free.
        let signed = service
            .sign_json_ld(&channel, DID, &document, "key", PRIVATE_KEY, &first)
            .await
            .unwrap();
        assert!(service.verify(&signed.document).await.unwrap().is_verified());
        assert!(service.verify_json_ld(&signed.document).await.unwrap().is_verified());
    }

    #[test]
    fn test_rejects_bad_config() {
        let result = LdProofs::new(
            LdProofsConfig::new("node-without-scheme"),
            Arc::new(MemoryLedger::new()),
            Arc::new(MemoryResolver::new()),
        );
        assert!(matches!(result, Err(LdProofsError::Config(_))));
    }
}
