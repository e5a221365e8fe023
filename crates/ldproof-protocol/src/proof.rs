//! The `proof` object attached to signed documents.
//!
//! Wire shape:
//!
//! ```json
//! "proof": {
//!   "type": "IotaLinkedDataProof2021",
//!   "created": "2026-10-18T12:00:00.000Z",
//!   "verificationMethod": "did:iota:...#key",
//!   "proofValue": { "channelID": "<hex>", "anchorageID": "<hex>" }
//! }
//! ```

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use ldproof_core::{AnchorageId, ChannelId};
use ldproof_did::MethodRef;

use crate::error::{ProofError, Result};

/// Proof type of anchored Ed25519 linked data proofs.
pub const IOTA_LD_PROOF_2021: &str = "IotaLinkedDataProof2021";

/// Name of the field that carries the proof.
pub const PROOF_FIELD: &str = "proof";

/// Where the digest and signature were anchored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofValue {
    #[serde(rename = "channelID")]
    pub channel_id: ChannelId,
    #[serde(rename = "anchorageID")]
    pub anchorage_id: AnchorageId,
}

/// A linked data proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedDataProof {
    #[serde(rename = "type")]
    pub proof_type: String,
    /// Informational. Ordering comes from the anchorage.
    pub created: DateTime<Utc>,
    pub verification_method: MethodRef,
    pub proof_value: ProofValue,
}

impl LinkedDataProof {
    /// A proof created now.
    pub fn new(verification_method: MethodRef, proof_value: ProofValue) -> Self {
        Self {
            proof_type: IOTA_LD_PROOF_2021.to_owned(),
            created: Utc::now().trunc_subsecs(3),
            verification_method,
            proof_value,
        }
    }

    /// Read the proof out of a signed document.
    ///
    /// `MissingProof` if there is none, `UnsupportedProofType` if its type is
    /// anything else, `MalformedProof` if it does not parse.
    pub fn from_document(document: &Map<String, Value>) -> Result<Self> {
        let proof = document.get(PROOF_FIELD).ok_or(ProofError::MissingProof)?;

        let proof_type = proof
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| ProofError::MalformedProof("missing type".into()))?;
        if proof_type != IOTA_LD_PROOF_2021 {
            return Err(ProofError::UnsupportedProofType(proof_type.to_owned()));
        }

        serde_json::from_value(proof.clone()).map_err(|e| ProofError::MalformedProof(e.to_string()))
    }

    pub fn to_value(&self) -> Result<Value> {
        serde_json::to_value(self).map_err(|e| ProofError::MalformedProof(e.to_string()))
    }
}

/// The document as a JSON object.
pub fn as_object(document: &Value) -> Result<&Map<String, Value>> {
    document
        .as_object()
        .ok_or_else(|| ProofError::InvalidDocument("expected a JSON object".into()))
}

/// A copy of `document` without its proof.
pub fn strip_proof(document: &Map<String, Value>) -> Map<String, Value> {
    let mut unsigned = document.clone();
    unsigned.remove(PROOF_FIELD);
    unsigned
}

/// A copy of `document` with `proof` injected.
pub fn attach_proof(document: &Map<String, Value>, proof: &LinkedDataProof) -> Result<Value> {
    let mut signed = document.clone();
    signed.insert(PROOF_FIELD.to_owned(), proof.to_value()?);
    Ok(Value::Object(signed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> LinkedDataProof {
        let channel_id = ChannelId::from_bytes([1; 32]);
        LinkedDataProof::new(
            MethodRef::parse("did:iota:abc#key").unwrap(),
            ProofValue {
                channel_id,
                anchorage_id: AnchorageId::derive(&channel_id, 1),
            },
        )
    }

    #[test]
    fn test_wire_shape() {
        let proof = sample();
        let value = proof.to_value().unwrap();

        assert_eq!(value["type"], IOTA_LD_PROOF_2021);
        assert_eq!(value["verificationMethod"], "did:iota:abc#key");
        assert_eq!(
            value["proofValue"]["channelID"],
            proof.proof_value.channel_id.to_hex()
        );
        assert_eq!(
            value["proofValue"]["anchorageID"],
            proof.proof_value.anchorage_id.to_hex()
        );
        assert!(value["created"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn test_attach_and_read_back() {
        let document = json!({"name": "x"});
        let proof = sample();

        let signed = attach_proof(as_object(&document).unwrap(), &proof).unwrap();
        assert_eq!(document, json!({"name": "x"}));

        let signed = as_object(&signed).unwrap();
        assert_eq!(LinkedDataProof::from_document(signed).unwrap(), proof);
        assert_eq!(&strip_proof(signed), as_object(&document).unwrap());
    }

    #[test]
    fn test_proof_errors() {
        let missing = json!({"name": "x"});
        assert!(matches!(
            LinkedDataProof::from_document(as_object(&missing).unwrap()),
            Err(ProofError::MissingProof)
        ));

        let other = json!({"proof": {"type": "Ed25519Signature2018"}});
        assert!(matches!(
            LinkedDataProof::from_document(as_object(&other).unwrap()),
            Err(ProofError::UnsupportedProofType(t)) if t == "Ed25519Signature2018"
        ));

        let broken = json!({"proof": {"type": IOTA_LD_PROOF_2021, "proofValue": {"channelID": "zz"}}});
        assert!(matches!(
            LinkedDataProof::from_document(as_object(&broken).unwrap()),
            Err(ProofError::MalformedProof(_))
        ));

        assert!(matches!(
            as_object(&json!([1, 2])),
            Err(ProofError::InvalidDocument(_))
        ));
    }
}
