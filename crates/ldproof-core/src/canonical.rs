//! Canonical CBOR encoding for deterministic ledger records.
//!
//! This module implements RFC 8949 Core Deterministic Encoding:
//! - Map keys sorted by encoded byte comparison
//! - Integers use smallest valid encoding
//! - Definite lengths only
//! - No floats (timestamps are i64 milliseconds)
//!
//! Everything written to a ledger goes through here, so a channel ID or an
//! anchored payload hashes the same on every platform.

use ciborium::value::Value;

use crate::anchorage::ChannelGenesis;
use crate::error::CoreError;

/// Genesis field keys (integer keys for compact encoding).
mod keys {
    pub const VERSION: u64 = 0;
    pub const NODE: u64 = 1;
    pub const NONCE: u64 = 2;
    pub const CREATED_AT: u64 = 3;
}

/// Encode a channel genesis record to canonical CBOR bytes.
pub fn canonical_genesis_bytes(genesis: &ChannelGenesis) -> Vec<u8> {
    let value = Value::Map(vec![
        (
            Value::Integer(keys::VERSION.into()),
            Value::Integer(genesis.version.into()),
        ),
        (
            Value::Integer(keys::NODE.into()),
            Value::Text(genesis.node.clone()),
        ),
        (
            Value::Integer(keys::NONCE.into()),
            Value::Bytes(genesis.nonce.to_vec()),
        ),
        (
            Value::Integer(keys::CREATED_AT.into()),
            Value::Integer(genesis.created_at.into()),
        ),
    ]);

    // Only integers, text and bytes above; encoding cannot fail.
    encode_canonical(&value).unwrap_or_default()
}

/// Encode a CBOR Value to canonical bytes.
pub(crate) fn encode_canonical(value: &Value) -> Result<Vec<u8>, CoreError> {
    let mut buf = Vec::new();
    encode_value_to(&mut buf, value)?;
    Ok(buf)
}

/// Decode arbitrary CBOR bytes into a Value.
pub(crate) fn decode_value(bytes: &[u8]) -> Result<Value, CoreError> {
    ciborium::from_reader::<Value, _>(bytes).map_err(|e| CoreError::DecodingError(e.to_string()))
}

/// Look up an integer key in a decoded CBOR map.
pub(crate) fn map_get(map: &[(Value, Value)], key: u64) -> Option<&Value> {
    map.iter()
        .find(|(k, _)| match k {
            Value::Integer(i) => i128::from(*i) == i128::from(key),
            _ => false,
        })
        .map(|(_, v)| v)
}

/// Recursively encode a CBOR value.
fn encode_value_to(buf: &mut Vec<u8>, value: &Value) -> Result<(), CoreError> {
    match value {
        Value::Integer(i) => encode_integer(buf, *i),
        Value::Bytes(b) => encode_bytes(buf, b),
        Value::Text(s) => encode_text(buf, s),
        Value::Array(arr) => encode_array(buf, arr)?,
        Value::Map(entries) => encode_map_canonical(buf, entries)?,
        Value::Bool(b) => buf.push(if *b { 0xf5 } else { 0xf4 }),
        Value::Null => buf.push(0xf6),
        Value::Float(_) => {
            return Err(CoreError::EncodingError(
                "floats not supported in canonical encoding".into(),
            ))
        }
        _ => {
            return Err(CoreError::EncodingError(
                "unsupported CBOR value type".into(),
            ))
        }
    }
    Ok(())
}

/// Encode a CBOR integer (major types 0 and 1).
fn encode_integer(buf: &mut Vec<u8>, i: ciborium::value::Integer) {
    let n: i128 = i.into();

    if n >= 0 {
        encode_uint(buf, 0, n as u64);
    } else {
        // CBOR encodes -1 as 0, -2 as 1, etc.
        let abs = (-1 - n) as u64;
        encode_uint(buf, 1, abs);
    }
}

/// Encode an unsigned integer with the given major type.
fn encode_uint(buf: &mut Vec<u8>, major: u8, n: u64) {
    let mt = major << 5;
    if n < 24 {
        buf.push(mt | (n as u8));
    } else if n <= 0xff {
        buf.push(mt | 24);
        buf.push(n as u8);
    } else if n <= 0xffff {
        buf.push(mt | 25);
        buf.extend_from_slice(&(n as u16).to_be_bytes());
    } else if n <= 0xffff_ffff {
        buf.push(mt | 26);
        buf.extend_from_slice(&(n as u32).to_be_bytes());
    } else {
        buf.push(mt | 27);
        buf.extend_from_slice(&n.to_be_bytes());
    }
}

/// Encode a byte string (major type 2).
fn encode_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    encode_uint(buf, 2, bytes.len() as u64);
    buf.extend_from_slice(bytes);
}

/// Encode a text string (major type 3).
fn encode_text(buf: &mut Vec<u8>, s: &str) {
    encode_uint(buf, 3, s.len() as u64);
    buf.extend_from_slice(s.as_bytes());
}

/// Encode an array (major type 4).
fn encode_array(buf: &mut Vec<u8>, arr: &[Value]) -> Result<(), CoreError> {
    encode_uint(buf, 4, arr.len() as u64);
    for item in arr {
        encode_value_to(buf, item)?;
    }
    Ok(())
}

/// Encode a map canonically (major type 5).
///
/// Keys are sorted by their encoded byte comparison.
fn encode_map_canonical(buf: &mut Vec<u8>, entries: &[(Value, Value)]) -> Result<(), CoreError> {
    let mut key_value_pairs = Vec::with_capacity(entries.len());
    for (k, v) in entries {
        let mut key_buf = Vec::new();
        encode_value_to(&mut key_buf, k)?;
        key_value_pairs.push((key_buf, v));
    }

    key_value_pairs.sort_by(|a, b| a.0.cmp(&b.0));

    encode_uint(buf, 5, key_value_pairs.len() as u64);
    for (key_bytes, value) in key_value_pairs {
        buf.extend_from_slice(&key_bytes);
        encode_value_to(buf, value)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uint_encoding_sizes() {
        let cases: &[(u64, &[u8])] = &[
            (0, &[0x00]),
            (23, &[0x17]),
            (24, &[0x18, 0x18]),
            (255, &[0x18, 0xff]),
            (256, &[0x19, 0x01, 0x00]),
            (65536, &[0x1a, 0x00, 0x01, 0x00, 0x00]),
        ];
        for (n, expected) in cases {
            let mut buf = Vec::new();
            encode_uint(&mut buf, 0, *n);
            assert_eq!(&buf[..], *expected, "encoding of {}", n);
        }
    }

    #[test]
    fn test_negative_integer_encoding() {
        let bytes = encode_canonical(&Value::Integer((-1i64).into())).unwrap();
        assert_eq!(bytes, vec![0x20]);
    }

    #[test]
    fn test_map_keys_sorted_regardless_of_insertion_order() {
        let a = Value::Map(vec![
            (Value::Integer(2u64.into()), Value::Null),
            (Value::Integer(0u64.into()), Value::Bool(true)),
        ]);
        let b = Value::Map(vec![
            (Value::Integer(0u64.into()), Value::Bool(true)),
            (Value::Integer(2u64.into()), Value::Null),
        ]);
        assert_eq!(encode_canonical(&a).unwrap(), encode_canonical(&b).unwrap());
        assert_eq!(encode_canonical(&a).unwrap(), vec![0xa2, 0x00, 0xf5, 0x02, 0xf6]);
    }

    #[test]
    fn test_floats_rejected() {
        assert!(matches!(
            encode_canonical(&Value::Float(1.5)),
            Err(CoreError::EncodingError(_))
        ));
    }

    #[test]
    fn test_genesis_encoding_is_deterministic() {
        let genesis = ChannelGenesis::new("https://node.example", [0x11; 32], 1_700_000_000_000);
        let b1 = canonical_genesis_bytes(&genesis);
        let b2 = canonical_genesis_bytes(&genesis.clone());
        assert_eq!(b1, b2);
        // map(4), key 0, version 0
        assert_eq!(&b1[..3], &[0xa4, 0x00, 0x00]);

        let decoded = decode_value(&b1).unwrap();
        assert!(matches!(decoded, Value::Map(ref m) if m.len() == 4));
    }
}
