//! DID resolution.
//!
//! The resolver is an external collaborator: real deployments plug in a
//! network-backed implementation. Two local resolvers ship here, one backed
//! by a registry in memory and one that derives `did:key` documents.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use tracing::debug;

use crate::did::{public_key_from_did_key, Did, MethodRef};
use crate::document::{DidDocument, ResolvedMethod, VerificationMethod};
use crate::error::{DidError, Result};

/// Resolves DIDs to documents.
///
/// Resolution must be idempotent: resolving the same DID twice with no
/// intervening update yields the same document.
#[async_trait]
pub trait DidResolver: Send + Sync {
    /// Fetch the document for `did`, or `NotFound`.
    async fn resolve(&self, did: &Did) -> Result<DidDocument>;

    /// Resolve a single verification method.
    async fn resolve_method(&self, method: &MethodRef) -> Result<ResolvedMethod> {
        let document = self.resolve(method.did()).await?;
        document.resolve_method(method)
    }
}

/// Resolver over documents registered in memory.
#[derive(Default)]
pub struct MemoryResolver {
    documents: RwLock<HashMap<Did, DidDocument>>,
}

impl MemoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish or replace a document.
    pub fn register(&self, document: DidDocument) -> Result<()> {
        let mut documents = self.documents.write().map_err(poisoned)?;
        debug!(did = %document.id, methods = document.verification_method.len(), "document registered");
        documents.insert(document.id.clone(), document);
        Ok(())
    }

    /// Mark a verification method as revoked.
    pub fn revoke(&self, method: &MethodRef) -> Result<()> {
        let mut documents = self.documents.write().map_err(poisoned)?;
        let vm = documents
            .get_mut(method.did())
            .ok_or_else(|| DidError::NotFound(method.did().to_string()))?
            .find_method_mut(method)
            .ok_or_else(|| DidError::MethodNotFound(method.to_string()))?;
        vm.revoked = true;
        debug!(%method, "method revoked");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.documents.read().map(|d| d.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<E>(_: E) -> DidError {
    DidError::Resolution("resolver lock poisoned".into())
}

#[async_trait]
impl DidResolver for MemoryResolver {
    async fn resolve(&self, did: &Did) -> Result<DidDocument> {
        let documents = self.documents.read().map_err(poisoned)?;
        documents
            .get(did)
            .cloned()
            .ok_or_else(|| DidError::NotFound(did.to_string()))
    }
}

/// Resolver for `did:key`, computed without any network access.
///
/// The document has a single Ed25519 method whose fragment is the
/// method-specific ID itself.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeyDidResolver;

#[async_trait]
impl DidResolver for KeyDidResolver {
    async fn resolve(&self, did: &Did) -> Result<DidDocument> {
        if did.method() != "key" {
            return Err(DidError::NotFound(did.to_string()));
        }
        let public_key = public_key_from_did_key(did)?;
        let method = did.join(did.method_specific_id())?;

        Ok(DidDocument::new(did.clone()).with_method(VerificationMethod::ed25519(&method, &public_key)))
    }
}
