//! Proptest generators for property-based testing.

use proptest::prelude::*;

use chaintree_core::{ContentId, Did, Ed25519PublicKey, Keypair, Node, Value};

/// Generate a random keypair.
pub fn keypair() -> impl Strategy<Value = Keypair> {
    any::<[u8; 32]>().prop_map(|seed| Keypair::from_seed(&seed))
}

/// Generate a random Ed25519PublicKey.
pub fn public_key() -> impl Strategy<Value = Ed25519PublicKey> {
    keypair().prop_map(|kp| kp.public_key())
}

/// Generate the DID of a random key.
pub fn did() -> impl Strategy<Value = Did> {
    public_key().prop_map(|pk| Did::from_public_key(&pk))
}

/// Generate a random ContentId. It will not name a stored block.
pub fn content_id() -> impl Strategy<Value = ContentId> {
    any::<[u8; 32]>().prop_map(ContentId::from_bytes)
}

/// Generate a node field name.
pub fn segment() -> impl Strategy<Value = String> {
    "[a-z][a-zA-Z0-9_]{0,11}".prop_map(String::from)
}

/// Generate a slash path of up to `max_len` segments, with stray slashes.
pub fn slash_path(max_len: usize) -> impl Strategy<Value = String> {
    (prop::collection::vec(segment(), 0..=max_len), any::<bool>(), any::<bool>()).prop_map(
        |(segments, leading, trailing)| {
            let mut path = segments.join("/");
            if leading {
                path.insert(0, '/');
            }
            if trailing {
                path.push('/');
            }
            path
        },
    )
}

/// Generate a scalar value, falsy ones included.
pub fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        "[ -~]{0,16}".prop_map(Value::from),
        prop::collection::vec(any::<u8>(), 0..16).prop_map(Value::Bytes),
    ]
}

/// Generate a value of nested maps and lists with scalar leaves.
pub fn value() -> impl Strategy<Value = Value> {
    scalar().prop_recursive(4, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::List),
            prop::collection::btree_map(segment(), inner, 0..4).prop_map(Value::Map),
        ]
    })
}

/// Generate a node with up to `max_fields` fields.
pub fn node(max_fields: usize) -> impl Strategy<Value = Node> {
    prop::collection::btree_map(segment(), value(), 0..=max_fields)
}
