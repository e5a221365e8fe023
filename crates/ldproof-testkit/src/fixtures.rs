//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::sync::Arc;

use serde_json::{json, Value};

use ldproof_channel::{AnchoringChannel, ChannelConfig, ChannelReader, MemoryLedger, UnboundChannel};
use ldproof_core::{Ed25519PublicKey, Keypair};
use ldproof_did::{Did, DidDocument, MemoryResolver, MethodRef, Signer, VerificationMethod};
use ldproof_protocol::{LdProofGenerator, LdProofVerifier};

/// DID used throughout the sample documents.
pub const SAMPLE_DID: &str = "did:iota:EmsBSiBR7kjuYPLMHmZnyzmZY7t985t5BBsvK3Dbiw3d";
/// Base58btc seed of the sample key.
pub const SAMPLE_PRIVATE_KEY: &str = "TEBVMPPX91ZhtBZ8R8zBP6WZpVeAnrWMnknkSHThmYk";
/// Base58btc public key derived from [`SAMPLE_PRIVATE_KEY`].
pub const SAMPLE_PUBLIC_KEY: &str = "DbKSCHm16ekaGpGEeaNToNUMX9WvwL4SH3ngziuYRqrz";

/// Node the fixture channels are created against.
pub const TEST_NODE: &str = "https://chrysalis-nodes.iota.org";

/// Fragment of the method the fixture registers.
pub const DEFAULT_METHOD: &str = "key";

/// A keypair, its DID document and a ledger, ready to sign and verify.
pub struct TestFixture {
    pub keypair: Keypair,
    pub did: Did,
    pub ledger: Arc<MemoryLedger>,
    pub resolver: Arc<MemoryResolver>,
}

impl TestFixture {
    /// Random keypair under a DID derived from its public key.
    pub fn new() -> Self {
        Self::from_keypair(Keypair::generate())
    }

    /// Create with a deterministic keypair from seed.
    pub fn with_seed(seed: [u8; 32]) -> Self {
        Self::from_keypair(Keypair::from_seed(&seed))
    }

    /// The sample DID and key pair.
    pub fn sample() -> Self {
        let keypair = match Keypair::from_base58(SAMPLE_PRIVATE_KEY) {
            Ok(keypair) => keypair,
            Err(e) => panic!("sample key is valid base58: {e}"),
        };
        Self::build(keypair, did(SAMPLE_DID))
    }

    fn from_keypair(keypair: Keypair) -> Self {
        let did = did(&format!("did:iota:{}", keypair.public_key().to_base58()));
        Self::build(keypair, did)
    }

    fn build(keypair: Keypair, did: Did) -> Self {
        let fixture = Self {
            keypair,
            did,
            ledger: Arc::new(MemoryLedger::new()),
            resolver: Arc::new(MemoryResolver::new()),
        };
        fixture.publish(&[(DEFAULT_METHOD, fixture.keypair.public_key())]);
        fixture
    }

    pub fn public_key(&self) -> Ed25519PublicKey {
        self.keypair.public_key()
    }

    pub fn method(&self, fragment: &str) -> MethodRef {
        match self.did.join(fragment) {
            Ok(method) => method,
            Err(e) => panic!("invalid fragment {fragment:?}: {e}"),
        }
    }

    /// Replace the DID document with one listing exactly `methods`.
    pub fn publish(&self, methods: &[(&str, Ed25519PublicKey)]) {
        let document = methods
            .iter()
            .fold(DidDocument::new(self.did.clone()), |doc, (fragment, key)| {
                doc.with_method(VerificationMethod::ed25519(&self.method(fragment), key))
            });
        if let Err(e) = self.resolver.register(document) {
            panic!("register fixture document: {e}");
        }
    }

    /// Bind a fresh channel on the fixture ledger.
    pub async fn channel(&self) -> AnchoringChannel<MemoryLedger> {
        self.channel_with(ChannelConfig::default()).await
    }

    pub async fn channel_with(&self, config: ChannelConfig) -> AnchoringChannel<MemoryLedger> {
        let unbound = match UnboundChannel::create(TEST_NODE, Arc::clone(&self.ledger)) {
            Ok(unbound) => unbound,
            Err(e) => panic!("create channel: {e}"),
        };
        match unbound.with_config(config).bind().await {
            Ok(channel) => channel,
            Err(e) => panic!("bind channel: {e}"),
        }
    }

    pub fn signer(&self) -> Signer<MemoryResolver> {
        match Signer::create(self.did.as_str(), Arc::clone(&self.resolver)) {
            Ok(signer) => signer,
            Err(e) => panic!("create signer: {e}"),
        }
    }

    /// Generator over a freshly bound channel.
    pub async fn generator(&self) -> LdProofGenerator<MemoryLedger, MemoryResolver> {
        LdProofGenerator::new(self.channel().await, self.signer())
    }

    pub fn verifier(&self) -> LdProofVerifier<MemoryLedger, MemoryResolver> {
        LdProofVerifier::new(
            ChannelReader::new(Arc::clone(&self.ledger)),
            Arc::clone(&self.resolver),
        )
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

fn did(s: &str) -> Did {
    match Did::parse(s) {
        Ok(did) => did,
        Err(e) => panic!("fixture DID {s:?}: {e}"),
    }
}

/// The schema.org organization document.
pub fn organization() -> Value {
    json!({
        "@context": "https://schema.org",
        "type": "Organization",
        "name": "IOTA Foundation"
    })
}

/// A plain JSON document.
pub fn plain_document() -> Value {
    json!({
        "property1": "value1",
        "property2": false
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ldproof_did::DidResolver;

    #[test]
    fn test_sample_keys_match() {
        let fixture = TestFixture::sample();
        assert_eq!(fixture.public_key().to_base58(), SAMPLE_PUBLIC_KEY);
        assert_eq!(fixture.did.as_str(), SAMPLE_DID);
    }

    #[tokio::test]
    async fn test_fixture_publishes_method() {
        let fixture = TestFixture::with_seed([5; 32]);
        let resolved = fixture
            .resolver
            .resolve_method(&fixture.method(DEFAULT_METHOD))
            .await
            .unwrap();
        assert_eq!(resolved.ed25519_public_key().unwrap(), fixture.public_key());
    }
}
