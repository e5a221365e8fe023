//! DID documents and verification methods.
//!
//! Only the parts needed to verify Ed25519 signatures are modeled. Unknown
//! fields in a document are ignored on input.

use std::fmt;

use ldproof_core::Ed25519PublicKey;
use serde::{Deserialize, Serialize};

use crate::did::{Did, MethodRef};
use crate::error::{DidError, Result};

/// Key type of a verification method.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum KeyType {
    Ed25519VerificationKey2018,
    Other(String),
}

impl KeyType {
    pub fn as_str(&self) -> &str {
        match self {
            KeyType::Ed25519VerificationKey2018 => "Ed25519VerificationKey2018",
            KeyType::Other(name) => name,
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for KeyType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Ed25519VerificationKey2018" => KeyType::Ed25519VerificationKey2018,
            _ => KeyType::Other(s),
        }
    }
}

impl From<KeyType> for String {
    fn from(key_type: KeyType) -> Self {
        key_type.as_str().to_owned()
    }
}

/// One entry of `verificationMethod`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMethod {
    /// Either an absolute `did#fragment` or a relative `#fragment`.
    pub id: String,
    #[serde(rename = "type")]
    pub key_type: KeyType,
    pub controller: Did,
    pub public_key_base58: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub revoked: bool,
}

impl VerificationMethod {
    /// An Ed25519 method published under `method`.
    pub fn ed25519(method: &MethodRef, public_key: &Ed25519PublicKey) -> Self {
        Self {
            id: method.to_string(),
            key_type: KeyType::Ed25519VerificationKey2018,
            controller: method.did().clone(),
            public_key_base58: public_key.to_base58(),
            revoked: false,
        }
    }

    /// The fragment part of `id`, if it has one.
    pub fn fragment(&self) -> Option<&str> {
        self.id.rsplit_once('#').map(|(_, fragment)| fragment)
    }

    /// Whether this entry is the one `method` points at.
    pub fn matches(&self, method: &MethodRef) -> bool {
        match self.id.split_once('#') {
            Some(("", fragment)) => fragment == method.fragment(),
            Some((did, fragment)) => did == method.did().as_str() && fragment == method.fragment(),
            None => false,
        }
    }
}

/// A resolved DID document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidDocument {
    pub id: Did,
    #[serde(default)]
    pub verification_method: Vec<VerificationMethod>,
}

impl DidDocument {
    pub fn new(id: Did) -> Self {
        Self {
            id,
            verification_method: Vec::new(),
        }
    }

    pub fn with_method(mut self, method: VerificationMethod) -> Self {
        self.verification_method.push(method);
        self
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| DidError::MalformedDocument(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| DidError::MalformedDocument(e.to_string()))
    }

    pub fn find_method(&self, method: &MethodRef) -> Option<&VerificationMethod> {
        self.verification_method.iter().find(|vm| vm.matches(method))
    }

    pub(crate) fn find_method_mut(&mut self, method: &MethodRef) -> Option<&mut VerificationMethod> {
        self.verification_method
            .iter_mut()
            .find(|vm| vm.matches(method))
    }

    /// Look up a live method.
    ///
    /// Fails with `MethodNotFound` when the document belongs to another DID
    /// or lacks the fragment, and with `MethodRevoked` when the entry is
    /// marked revoked.
    pub fn resolve_method(&self, method: &MethodRef) -> Result<ResolvedMethod> {
        if &self.id != method.did() {
            return Err(DidError::MethodNotFound(method.to_string()));
        }
        let vm = self
            .find_method(method)
            .ok_or_else(|| DidError::MethodNotFound(method.to_string()))?;
        if vm.revoked {
            return Err(DidError::MethodRevoked(method.to_string()));
        }

        Ok(ResolvedMethod {
            method: method.clone(),
            controller: vm.controller.clone(),
            key_type: vm.key_type.clone(),
            public_key_base58: vm.public_key_base58.clone(),
        })
    }
}

/// A verification method after resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMethod {
    pub method: MethodRef,
    pub controller: Did,
    pub key_type: KeyType,
    pub public_key_base58: String,
}

impl ResolvedMethod {
    /// The published key, if it is an Ed25519 key.
    pub fn ed25519_public_key(&self) -> Result<Ed25519PublicKey> {
        if self.key_type != KeyType::Ed25519VerificationKey2018 {
            return Err(DidError::UnsupportedKeyType {
                method: self.method.to_string(),
                key_type: self.key_type.to_string(),
            });
        }
        Ok(Ed25519PublicKey::from_base58(&self.public_key_base58)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ldproof_core::Keypair;

    fn sample() -> (DidDocument, MethodRef, Keypair) {
        let keypair = Keypair::from_seed(&[7; 32]);
        let did = Did::parse("did:iota:sample").unwrap();
        let method = did.join("key").unwrap();
        let doc = DidDocument::new(did).with_method(VerificationMethod::ed25519(&method, &keypair.public_key()));
        (doc, method, keypair)
    }

    #[test]
    fn test_resolve_method() {
        let (doc, method, keypair) = sample();
        let resolved = doc.resolve_method(&method).unwrap();
        assert_eq!(resolved.key_type, KeyType::Ed25519VerificationKey2018);
        assert_eq!(resolved.ed25519_public_key().unwrap(), keypair.public_key());

        let missing = doc.id.join("other").unwrap();
        assert!(matches!(doc.resolve_method(&missing), Err(DidError::MethodNotFound(_))));
    }

    #[test]
    fn test_revoked_method() {
        let (mut doc, method, _) = sample();
        doc.find_method_mut(&method).unwrap().revoked = true;
        assert!(matches!(doc.resolve_method(&method), Err(DidError::MethodRevoked(_))));
    }

    #[test]
    fn test_relative_method_id() {
        let json = r##"{
            "id": "did:iota:sample",
            "verificationMethod": [{
                "id": "#key",
                "type": "Ed25519VerificationKey2018",
                "controller": "did:iota:sample",
                "publicKeyBase58": "DuaAwfGJzyiTo3kERn3YbRCMQAgQzMaAGAzvKfrAtV6e"
            }],
            "service": []
        }"##;
        let doc = DidDocument::from_json(json).unwrap();
        let method = MethodRef::parse("did:iota:sample#key").unwrap();
        assert!(doc.resolve_method(&method).is_ok());
    }

    #[test]
    fn test_other_key_type() {
        let json = r##"{
            "id": "did:iota:sample",
            "verificationMethod": [{
                "id": "did:iota:sample#x",
                "type": "X25519KeyAgreementKey2019",
                "controller": "did:iota:sample",
                "publicKeyBase58": "DuaAwfGJzyiTo3kERn3YbRCMQAgQzMaAGAzvKfrAtV6e"
            }]
        }"##;
        let doc = DidDocument::from_json(json).unwrap();
        let method = MethodRef::parse("did:iota:sample#x").unwrap();
        let resolved = doc.resolve_method(&method).unwrap();
        assert_eq!(resolved.key_type, KeyType::Other("X25519KeyAgreementKey2019".into()));
        assert!(matches!(
            resolved.ed25519_public_key(),
            Err(DidError::UnsupportedKeyType { .. })
        ));
    }

    #[test]
    fn test_json_round_trip_omits_live_flag() {
        let (doc, _, _) = sample();
        let json = doc.to_json().unwrap();
        assert!(!json.contains("revoked"));
        assert!(json.contains("publicKeyBase58"));
        assert_eq!(DidDocument::from_json(&json).unwrap(), doc);
    }

    #[test]
    fn test_malformed_document() {
        assert!(matches!(
            DidDocument::from_json(r#"{"id": "nope"}"#),
            Err(DidError::MalformedDocument(_))
        ));
    }
}
