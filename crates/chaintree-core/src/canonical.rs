//! Canonical CBOR encoding for deterministic node serialization.
//!
//! This module implements RFC 8949 Core Deterministic Encoding:
//! - Map keys sorted by encoded byte comparison
//! - Integers use smallest valid encoding
//! - Definite lengths only
//! - Floats always use the 8-byte form
//!
//! Links are written as CBOR tag 42 over a byte string of `0x00 || id`, the
//! same framing DAG-CBOR uses, so content ids stay distinguishable from
//! ordinary bytes on decode.
//!
//! The canonical encoding is what makes content addressing work: the same
//! node always produces identical bytes and therefore the same [`ContentId`].

use ciborium::value::Value as Cbor;

use crate::error::{CoreError, Result};
use crate::types::ContentId;
use crate::value::{Node, Value};

/// CBOR tag used for links between nodes.
pub const LINK_TAG: u64 = 42;

/// Encode a node to canonical CBOR bytes.
pub fn encode_node(node: &Node) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    encode_map(&mut buf, node)?;
    Ok(buf)
}

/// Encode any value to canonical CBOR bytes.
pub fn encode_value(value: &Value) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    encode_value_to(&mut buf, value)?;
    Ok(buf)
}

/// Compute the content id a node will be stored under.
pub fn node_id(node: &Node) -> Result<ContentId> {
    Ok(ContentId::for_bytes(&encode_node(node)?))
}

/// Recursively encode a value.
fn encode_value_to(buf: &mut Vec<u8>, value: &Value) -> Result<()> {
    match value {
        Value::Null => buf.push(0xf6),
        Value::Bool(b) => buf.push(if *b { 0xf5 } else { 0xf4 }),
        Value::Integer(i) => encode_integer(buf, *i)?,
        Value::Float(f) => {
            buf.push(0xfb);
            buf.extend_from_slice(&f.to_be_bytes());
        }
        Value::Text(s) => encode_text(buf, s),
        Value::Bytes(b) => encode_bytes(buf, b),
        Value::List(items) => {
            encode_uint(buf, 4, items.len() as u64);
            for item in items {
                encode_value_to(buf, item)?;
            }
        }
        Value::Map(m) => encode_map(buf, m)?,
        Value::Link(id) => {
            encode_uint(buf, 6, LINK_TAG);
            let mut framed = Vec::with_capacity(33);
            framed.push(0x00);
            framed.extend_from_slice(id.as_bytes());
            encode_bytes(buf, &framed);
        }
    }
    Ok(())
}

/// Encode a CBOR integer (major types 0 and 1).
fn encode_integer(buf: &mut Vec<u8>, n: i128) -> Result<()> {
    if n >= 0 {
        let u = u64::try_from(n)
            .map_err(|_| CoreError::EncodingError(format!("integer {} out of range", n)))?;
        encode_uint(buf, 0, u);
    } else {
        // CBOR encodes -1 as 0, -2 as 1, etc.
        let abs = u64::try_from(-1 - n)
            .map_err(|_| CoreError::EncodingError(format!("integer {} out of range", n)))?;
        encode_uint(buf, 1, abs);
    }
    Ok(())
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

fn encode_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    encode_uint(buf, 2, bytes.len() as u64);
    buf.extend_from_slice(bytes);
}

fn encode_text(buf: &mut Vec<u8>, s: &str) {
    encode_uint(buf, 3, s.len() as u64);
    buf.extend_from_slice(s.as_bytes());
}

/// Encode a map canonically (major type 5).
///
/// Keys are sorted by their encoded byte comparison, which for text keys
/// means shorter keys first, then bytewise.
fn encode_map(buf: &mut Vec<u8>, entries: &Node) -> Result<()> {
    let mut pairs: Vec<(Vec<u8>, &Value)> = entries
        .iter()
        .map(|(k, v)| {
            let mut key_buf = Vec::with_capacity(k.len() + 1);
            encode_text(&mut key_buf, k);
            (key_buf, v)
        })
        .collect();
    pairs.sort_by(|a, b| a.0.cmp(&b.0));

    encode_uint(buf, 5, pairs.len() as u64);
    for (key_bytes, value) in pairs {
        buf.extend_from_slice(&key_bytes);
        encode_value_to(buf, value)?;
    }
    Ok(())
}

/// Decode a node from CBOR bytes.
///
/// The top-level item must be a map with text keys.
pub fn decode_node(bytes: &[u8]) -> Result<Node> {
    match decode_value(bytes)? {
        Value::Map(node) => Ok(node),
        other => Err(CoreError::DecodingError(format!(
            "expected map at node root, got {}",
            kind_name(&other)
        ))),
    }
}

/// Decode any value from CBOR bytes.
pub fn decode_value(bytes: &[u8]) -> Result<Value> {
    let cbor: Cbor =
        ciborium::from_reader(bytes).map_err(|e| CoreError::DecodingError(e.to_string()))?;
    from_cbor(cbor)
}

fn from_cbor(cbor: Cbor) -> Result<Value> {
    Ok(match cbor {
        Cbor::Null => Value::Null,
        Cbor::Bool(b) => Value::Bool(b),
        Cbor::Integer(i) => Value::Integer(i.into()),
        Cbor::Float(f) => Value::Float(f),
        Cbor::Text(s) => Value::Text(s),
        Cbor::Bytes(b) => Value::Bytes(b),
        Cbor::Array(items) => Value::List(
            items
                .into_iter()
                .map(from_cbor)
                .collect::<Result<Vec<_>>>()?,
        ),
        Cbor::Map(entries) => {
            let mut node = Node::new();
            for (k, v) in entries {
                let key = match k {
                    Cbor::Text(s) => s,
                    _ => return Err(CoreError::DecodingError("non-text map key".into())),
                };
                node.insert(key, from_cbor(v)?);
            }
            Value::Map(node)
        }
        Cbor::Tag(LINK_TAG, inner) => match *inner {
            Cbor::Bytes(b) if b.len() == 33 && b[0] == 0x00 => {
                let id = ContentId::try_from(&b[1..])
                    .map_err(|_| CoreError::DecodingError("invalid link length".into()))?;
                Value::Link(id)
            }
            _ => return Err(CoreError::DecodingError("malformed link".into())),
        },
        Cbor::Tag(tag, _) => {
            return Err(CoreError::DecodingError(format!("unsupported tag {}", tag)))
        }
        _ => return Err(CoreError::DecodingError("unsupported CBOR item".into())),
    })
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Integer(_) => "integer",
        Value::Float(_) => "float",
        Value::Text(_) => "text",
        Value::Bytes(_) => "bytes",
        Value::List(_) => "list",
        Value::Map(_) => "map",
        Value::Link(_) => "link",
    }
}
