//! Proptest generators for property-based testing.

use proptest::prelude::*;
use serde_json::{Map, Value};

use ldproof_core::{AnchorageId, ChannelId, Ed25519PublicKey, Keypair};

/// Generate a random keypair.
pub fn keypair() -> impl Strategy<Value = Keypair> {
    any::<[u8; 32]>().prop_map(|seed| Keypair::from_seed(&seed))
}

/// Generate a random Ed25519PublicKey.
pub fn public_key() -> impl Strategy<Value = Ed25519PublicKey> {
    keypair().prop_map(|kp| kp.public_key())
}

/// Generate a random ChannelId.
pub fn channel_id() -> impl Strategy<Value = ChannelId> {
    any::<[u8; 32]>().prop_map(ChannelId::from_bytes)
}

/// Generate a random AnchorageId.
pub fn anchorage_id() -> impl Strategy<Value = AnchorageId> {
    any::<[u8; 32]>().prop_map(AnchorageId::from_bytes)
}

/// Generate a property name. Never `proof`, `id` or `type`.
pub fn property_name() -> impl Strategy<Value = String> {
    "[a-z][a-zA-Z0-9]{0,11}"
        .prop_filter("reserved name", |name| {
            !matches!(name.as_str(), "proof" | "id" | "type")
        })
        .prop_map(String::from)
}

/// Generate a short printable string.
pub fn text() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{0,24}".prop_map(String::from)
}

/// Generate a non-null JSON scalar.
pub fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        text().prop_map(Value::String),
    ]
}

/// Generate a plain JSON object with one to eight scalar properties.
pub fn json_document() -> impl Strategy<Value = Value> {
    prop::collection::btree_map(property_name(), scalar(), 1..8)
        .prop_map(|props| Value::Object(props.into_iter().collect()))
}

/// Generate a schema.org JSON-LD node with one to eight text properties.
pub fn json_ld_document() -> impl Strategy<Value = Value> {
    (
        prop_oneof![Just("Organization"), Just("Person"), Just("Place")],
        prop::collection::btree_map(property_name(), text(), 1..8),
    )
        .prop_map(|(node_type, props)| {
            let mut document = Map::new();
            document.insert("@context".into(), Value::from("https://schema.org"));
            document.insert("type".into(), Value::from(node_type));
            for (name, value) in props {
                document.insert(name, Value::String(value));
            }
            Value::Object(document)
        })
}

/// Change one scalar so the document no longer canonicalizes to the same
/// bytes. Keywords, `type` and `proof` are left alone.
pub fn tamper(document: &mut Value, index: usize) {
    let Some(object) = document.as_object_mut() else {
        return;
    };
    let keys: Vec<String> = object
        .keys()
        .filter(|key| !key.starts_with('@') && !matches!(key.as_str(), "type" | "proof"))
        .cloned()
        .collect();
    if keys.is_empty() {
        return;
    }
    let key = &keys[index % keys.len()];
    if let Some(value) = object.get_mut(key) {
        *value = match value.take() {
            Value::Bool(b) => Value::Bool(!b),
            Value::Number(n) => Value::from(n.as_i64().unwrap_or(0).wrapping_add(1)),
            Value::String(s) => Value::String(format!("{s}x")),
            _ => Value::Bool(true),
        };
    }
}
