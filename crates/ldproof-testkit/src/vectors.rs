//! Golden test vectors for deterministic verification.
//!
//! Canonical forms feed the anchored digest, so any change in these outputs
//! invalidates every proof already anchored.

use serde_json::Value;

use ldproof_core::Keypair;
use ldproof_protocol::{Canonicalizer, JsonCanonicalizer, JsonLdCanonicalizer};

use crate::fixtures::{SAMPLE_PRIVATE_KEY, SAMPLE_PUBLIC_KEY};

/// Which canonicalization a vector exercises.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Canonicalization {
    Json,
    JsonLd,
}

/// A golden canonicalization vector.
#[derive(Debug, Clone)]
pub struct CanonicalVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    pub canonicalization: Canonicalization,
    /// Input document as JSON text.
    pub document: &'static str,
    /// Expected canonical output.
    pub expected: &'static str,
}

/// Get all golden canonicalization vectors.
pub fn all_vectors() -> Vec<CanonicalVector> {
    vec![
        CanonicalVector {
            name: "JCS sorts nested members",
            canonicalization: Canonicalization::Json,
            document: r#"{ "b": 2, "a": { "d": true, "c": null } }"#,
            expected: r#"{"a":{"c":null,"d":true},"b":2}"#,
        },
        CanonicalVector {
            name: "JCS sorts by UTF-16 code units",
            canonicalization: Canonicalization::Json,
            document: r#"{"€":"Euro","1":"One","\r":"CR"}"#,
            expected: r#"{"\r":"CR","1":"One","€":"Euro"}"#,
        },
        CanonicalVector {
            name: "JCS plain document",
            canonicalization: Canonicalization::Json,
            document: r#"{"property2": false, "property1": "value1"}"#,
            expected: r#"{"property1":"value1","property2":false}"#,
        },
        CanonicalVector {
            name: "schema.org organization",
            canonicalization: Canonicalization::JsonLd,
            document: r#"{
                "@context": "https://schema.org",
                "type": "Organization",
                "name": "IOTA Foundation"
            }"#,
            expected: concat!(
                "_:c14n0 <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <https://schema.org/Organization> .\n",
                "_:c14n0 <https://schema.org/name> \"IOTA Foundation\" .\n",
            ),
        },
        CanonicalVector {
            name: "identified node with typed literal",
            canonicalization: Canonicalization::JsonLd,
            document: r#"{
                "@context": { "@vocab": "http://example.org/" },
                "@id": "http://example.org/alice",
                "age": 42,
                "active": true
            }"#,
            expected: concat!(
                "<http://example.org/alice> <http://example.org/active> \"true\"^^<http://www.w3.org/2001/XMLSchema#boolean> .\n",
                "<http://example.org/alice> <http://example.org/age> \"42\"^^<http://www.w3.org/2001/XMLSchema#integer> .\n",
            ),
        },
    ]
}

/// Canonicalize a vector's document.
pub fn canonicalize_vector(vector: &CanonicalVector) -> Result<String, String> {
    let document: Value = serde_json::from_str(vector.document).map_err(|e| e.to_string())?;
    let object = document
        .as_object()
        .ok_or_else(|| "vector document is not an object".to_string())?;
    let bytes = match vector.canonicalization {
        Canonicalization::Json => JsonCanonicalizer.canonicalize(object),
        Canonicalization::JsonLd => JsonLdCanonicalizer.canonicalize(object),
    }
    .map_err(|e| e.to_string())?;
    String::from_utf8(bytes).map_err(|e| e.to_string())
}

/// A base58btc seed and the public key it must derive.
#[derive(Debug, Clone)]
pub struct KeyVector {
    pub name: &'static str,
    pub private_key: &'static str,
    pub public_key: &'static str,
}

pub fn key_vectors() -> Vec<KeyVector> {
    vec![KeyVector {
        name: "sample DID key",
        private_key: SAMPLE_PRIVATE_KEY,
        public_key: SAMPLE_PUBLIC_KEY,
    }]
}

/// Check every vector, returning `(name, matches, actual)` per vector.
///
/// Call this to verify your implementation matches the reference.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    let canonical = all_vectors().into_iter().map(|v| {
        let actual = canonicalize_vector(&v).unwrap_or_else(|e| format!("error: {e}"));
        (v.name.to_string(), actual == v.expected, actual)
    });
    let keys = key_vectors().into_iter().map(|v| {
        let actual = Keypair::from_base58(v.private_key)
            .map(|kp| kp.public_key().to_base58())
            .unwrap_or_else(|e| format!("error: {e}"));
        (v.name.to_string(), actual == v.public_key, actual)
    });
    canonical.chain(keys).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_vectors_match() {
        for (name, matches, actual) in verify_all_vectors() {
            assert!(matches, "vector '{name}' produced {actual:?}");
        }
    }

    #[test]
    fn test_vectors_are_deterministic() {
        for vector in all_vectors() {
            assert_eq!(
                canonicalize_vector(&vector),
                canonicalize_vector(&vector),
                "Vector '{}' produced different output on regeneration",
                vector.name
            );
        }
    }

    #[test]
    fn test_key_vectors_round_trip() {
        for vector in key_vectors() {
            let keypair = Keypair::from_base58(vector.private_key).unwrap();
            assert_eq!(keypair.to_base58(), vector.private_key);
        }
    }
}
