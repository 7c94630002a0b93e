//! Node values: the closed set of things a ChainTree node field can hold.
//!
//! A node is an ordered map of field name to [`Value`]. A value is either a
//! scalar, a list, a nested map, or a [`Value::Link`] to another node in the
//! content store. Resolution decodes these structurally at every hop.

use std::collections::BTreeMap;

use crate::types::ContentId;

/// A decoded node: field name to value, ordered by name.
pub type Node = BTreeMap<String, Value>;

/// A single field value inside a node.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    /// Any integer representable in CBOR major types 0 and 1.
    Integer(i128),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    Map(Node),
    /// A reference to another node by content id.
    Link(ContentId),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i128> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        self.as_integer().and_then(|i| u64::try_from(i).ok())
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Node> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_link(&self) -> Option<&ContentId> {
        match self {
            Value::Link(id) => Some(id),
            _ => None,
        }
    }

    /// Collect a list of text values, or a single text value, into strings.
    ///
    /// Returns `None` if any element is not text.
    pub fn to_string_list(&self) -> Option<Vec<String>> {
        match self {
            Value::Text(s) => Some(vec![s.clone()]),
            Value::List(items) => items
                .iter()
                .map(|v| v.as_str().map(str::to_owned))
                .collect(),
            _ => None,
        }
    }

    /// Look up a direct child of this value by path segment.
    ///
    /// Maps are indexed by key, lists by decimal index. Links are not
    /// followed here; the resolver does that.
    pub fn child(&self, segment: &str) -> Option<&Value> {
        match self {
            Value::Map(m) => m.get(segment),
            Value::List(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        }
    }

    /// Owned variant of [`Value::child`].
    pub fn into_child(self, segment: &str) -> Option<Value> {
        match self {
            Value::Map(mut m) => m.remove(segment),
            Value::List(items) => segment
                .parse::<usize>()
                .ok()
                .and_then(|i| items.into_iter().nth(i)),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i.into())
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i.into())
    }
}

impl From<u64> for Value {
    fn from(i: u64) -> Self {
        Value::Integer(i.into())
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Integer(i.into())
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

impl From<ContentId> for Value {
    fn from(id: ContentId) -> Self {
        Value::Link(id)
    }
}

impl From<Node> for Value {
    fn from(m: Node) -> Self {
        Value::Map(m)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<Vec<String>> for Value {
    fn from(items: Vec<String>) -> Self {
        Value::List(items.into_iter().map(Value::Text).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// Build a [`Node`] from `(key, value)` pairs.
pub fn node<K, V, I>(entries: I) -> Node
where
    K: Into<String>,
    V: Into<Value>,
    I: IntoIterator<Item = (K, V)>,
{
    entries
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_indexes_maps_and_lists() {
        let list = Value::from(vec!["a".to_string(), "b".to_string()]);
        let map = Value::Map(node([("list", list.clone())]));

        assert_eq!(map.child("list"), Some(&list));
        assert_eq!(list.child("1"), Some(&Value::from("b")));
        assert_eq!(list.child("2"), None);
        assert_eq!(list.child("x"), None);
        assert_eq!(Value::from("scalar").child("anything"), None);
    }

    #[test]
    fn test_to_string_list() {
        assert_eq!(
            Value::from("0xabc").to_string_list(),
            Some(vec!["0xabc".to_string()])
        );
        let mixed = Value::List(vec![Value::from("a"), Value::Integer(1)]);
        assert_eq!(mixed.to_string_list(), None);
    }

    #[test]
    fn test_option_into_value() {
        let none: Option<&str> = None;
        assert_eq!(Value::from(none), Value::Null);
        assert_eq!(Value::from(Some(7u64)), Value::Integer(7));
    }
}
