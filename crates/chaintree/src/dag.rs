//! The DAG resolver.
//!
//! A [`Dag`] is a tip plus a block store. Resolving a path walks the rooted,
//! immutable DAG one segment at a time, transparently following links from
//! one stored node into the next. Each hop is awaited before the next
//! begins; nothing is mutated, so any number of resolutions may run against
//! the same store concurrently.

use std::sync::Arc;

use chaintree_core::{ContentId, Node, Value};
use chaintree_store::{BlockStore, StoreExt};

use crate::error::Result;
use crate::path::DagPath;

/// The outcome of resolving a path.
///
/// `remainder_path` is the sole discriminator between "found" and "not
/// found": it is empty iff every segment was consumed, in which case `value`
/// holds whatever was there (possibly `Null`, `false` or `0`). When it is
/// non-empty, `value` is always `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    remainder_path: Vec<String>,
    value: Option<Value>,
}

impl Resolved {
    /// A fully consumed path and the value it led to.
    pub fn found(value: Value) -> Self {
        Self {
            remainder_path: Vec::new(),
            value: Some(value),
        }
    }

    /// Resolution stopped at the first of `remainder`.
    pub fn missing(remainder: Vec<String>) -> Self {
        debug_assert!(!remainder.is_empty(), "missing result needs a remainder");
        Self {
            remainder_path: remainder,
            value: None,
        }
    }

    pub fn is_found(&self) -> bool {
        self.remainder_path.is_empty()
    }

    /// Segments that could not be resolved, starting with the missing one.
    pub fn remainder_path(&self) -> &[String] {
        &self.remainder_path
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn into_value(self) -> Option<Value> {
        self.value
    }
}

/// Resolve `path` starting at the node `root` in `store`.
///
/// A missing segment is reported in the result. Store failures and blocks
/// that do not decode are returned as errors.
pub async fn resolve_path<S>(store: &S, root: &ContentId, path: &DagPath) -> Result<Resolved>
where
    S: BlockStore + ?Sized,
{
    let segments = path.segments();
    let mut current = Value::Map(store.get_node(root).await?);
    let mut consumed = 0;
    let mut hops = 0usize;

    while consumed < segments.len() {
        if let Value::Link(next) = current {
            current = Value::Map(store.get_node(&next).await?);
            hops += 1;
            continue;
        }

        match current.into_child(&segments[consumed]) {
            Some(child) => {
                current = child;
                consumed += 1;
            }
            None => {
                tracing::debug!(
                    root = %root,
                    path = %path,
                    missing = %segments[consumed],
                    hops,
                    "path not found"
                );
                return Ok(Resolved::missing(segments[consumed..].to_vec()));
            }
        }
    }

    tracing::trace!(root = %root, path = %path, hops, "path resolved");
    Ok(Resolved::found(current))
}

/// A content-addressed DAG rooted at a tip.
pub struct Dag<S> {
    tip: ContentId,
    store: Arc<S>,
}

impl<S> Clone for Dag<S> {
    fn clone(&self) -> Self {
        Self {
            tip: self.tip,
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> Dag<S> {
    pub fn new(tip: ContentId, store: Arc<S>) -> Self {
        Self { tip, store }
    }

    pub fn tip(&self) -> &ContentId {
        &self.tip
    }

    pub fn set_tip(&mut self, tip: ContentId) {
        self.tip = tip;
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// A view of the same store rooted at another tip.
    pub fn with_tip(&self, tip: ContentId) -> Self {
        Self {
            tip,
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: BlockStore> Dag<S> {
    /// Fetch and decode a single node.
    pub async fn get(&self, id: &ContentId) -> Result<Node> {
        Ok(self.store.get_node(id).await?)
    }

    /// Resolve a path from the current tip.
    pub async fn resolve(&self, path: impl Into<DagPath>) -> Result<Resolved> {
        self.resolve_at(&self.tip, path).await
    }

    /// Resolve a path from an arbitrary root rather than the current tip.
    pub async fn resolve_at(
        &self,
        root: &ContentId,
        path: impl Into<DagPath>,
    ) -> Result<Resolved> {
        let path = path.into();
        resolve_path(self.store.as_ref(), root, &path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChainTreeError;
    use chaintree_core::node;
    use chaintree_store::{MemoryStore, StoreError};

    /// N1 {someData}, N2 {someData, one -> N1}, N3 {someData, one -> N1, two -> N2}.
    async fn three_nodes(store: &MemoryStore) -> (ContentId, ContentId, ContentId) {
        let cid1 = store
            .put_node(&node([("someData", Value::from("I am 1"))]))
            .await
            .unwrap();
        let cid2 = store
            .put_node(&node([
                ("someData", Value::from("I am 2")),
                ("one", Value::Link(cid1)),
            ]))
            .await
            .unwrap();
        let cid3 = store
            .put_node(&node([
                ("someData", Value::from("I am 3")),
                ("one", Value::Link(cid1)),
                ("two", Value::Link(cid2)),
            ]))
            .await
            .unwrap();
        (cid1, cid2, cid3)
    }

    #[tokio::test]
    async fn test_resolves_through_different_nodes() {
        let store = Arc::new(MemoryStore::new());
        let (_, _, cid3) = three_nodes(&store).await;
        let dag = Dag::new(cid3, store);

        let resp = dag.resolve("two/one/someData").await.unwrap();
        assert_eq!(resp, Resolved::found(Value::from("I am 1")));
    }

    #[tokio::test]
    async fn test_missing_segment_reports_remainder() {
        let store = Arc::new(MemoryStore::new());
        let (_, _, cid3) = three_nodes(&store).await;
        let dag = Dag::new(cid3, store);

        let resp = dag.resolve("/two/nope/deeper").await.unwrap();
        assert!(!resp.is_found());
        assert_eq!(resp.remainder_path(), ["nope", "deeper"]);
        assert_eq!(resp.value(), None);
    }

    #[tokio::test]
    async fn test_empty_path_returns_root() {
        let store = Arc::new(MemoryStore::new());
        let (cid1, _, _) = three_nodes(&store).await;
        let dag = Dag::new(cid1, store);

        let resp = dag.resolve("").await.unwrap();
        assert_eq!(
            resp.into_value(),
            Some(Value::Map(node([("someData", Value::from("I am 1"))])))
        );
    }

    #[tokio::test]
    async fn test_trailing_link_is_not_dereferenced() {
        let store = Arc::new(MemoryStore::new());
        let (cid1, _, cid3) = three_nodes(&store).await;
        let dag = Dag::new(cid3, store);

        let resp = dag.resolve("two/one").await.unwrap();
        assert_eq!(resp, Resolved::found(Value::Link(cid1)));
    }

    #[tokio::test]
    async fn test_falsy_values_are_found() {
        let store = Arc::new(MemoryStore::new());
        let root = store
            .put_node(&node([
                ("nothing", Value::Null),
                ("no", Value::Bool(false)),
                ("zero", Value::Integer(0)),
            ]))
            .await
            .unwrap();
        let dag = Dag::new(root, store);

        for (path, expected) in [
            ("nothing", Value::Null),
            ("no", Value::Bool(false)),
            ("zero", Value::Integer(0)),
        ] {
            let resp = dag.resolve(path).await.unwrap();
            assert!(resp.is_found(), "{} should be found", path);
            assert_eq!(resp.value(), Some(&expected));
        }
    }

    #[tokio::test]
    async fn test_nested_maps_and_lists_within_a_node() {
        let store = Arc::new(MemoryStore::new());
        let root = store
            .put_node(&node([(
                "outer",
                Value::Map(node([(
                    "list",
                    Value::List(vec![Value::from("a"), Value::from("b")]),
                )])),
            )]))
            .await
            .unwrap();
        let dag = Dag::new(root, store);

        let resp = dag.resolve("outer/list/1").await.unwrap();
        assert_eq!(resp.value(), Some(&Value::from("b")));

        let resp = dag.resolve("outer/list/1/deeper").await.unwrap();
        assert_eq!(resp.remainder_path(), ["deeper"]);
    }

    #[tokio::test]
    async fn test_missing_block_is_fatal() {
        let store = Arc::new(MemoryStore::new());
        let (_, cid2, cid3) = three_nodes(&store).await;
        store.delete(&cid2).await.unwrap();
        let dag = Dag::new(cid3, store);

        let err = dag.resolve("two/someData").await.unwrap_err();
        assert!(matches!(err, ChainTreeError::Store(StoreError::NotFound(id)) if id == cid2));
    }

    #[tokio::test]
    async fn test_resolve_equals_resolve_at_tip() {
        let store = Arc::new(MemoryStore::new());
        let (_, cid2, cid3) = three_nodes(&store).await;
        let dag = Dag::new(cid3, store);

        assert_eq!(
            dag.resolve("one/someData").await.unwrap(),
            dag.resolve_at(&cid3, "one/someData").await.unwrap()
        );
        assert_eq!(
            dag.resolve_at(&cid2, "someData").await.unwrap(),
            Resolved::found(Value::from("I am 2"))
        );
    }
}
