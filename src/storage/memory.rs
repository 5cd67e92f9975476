//! In-memory storage backend.
//!
//! This is the reference implementation of `GraphStore`.
//! It uses simple HashMaps protected by RwLock.
//!
//! ## Store order
//!
//! Edges out of a node are kept in insertion order, and that is the order
//! `traverse()` returns matches in. Tests that depend on "first match"
//! control it by the order they link nodes.
//!
//! ## Limitations
//!
//! - **No real transactions**: `commit_tx()` and `rollback_tx()` are no-ops.
//!   Writes are applied immediately. Rollback does NOT undo mutations.
//! - **No indexes**: filters are evaluated against every edge target.
//!
//! Use this backend for:
//! - Testing resolvers without a running database
//! - Embedding the resolvers over a small, process-local graph

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use parking_lot::RwLock;
use async_trait::async_trait;

use crate::model::*;
use crate::query::{Projection, TraversalQuery};
use crate::tx::{Transaction, TxMode, TxId};
use crate::{Error, Result};
use super::{BackendCapabilities, GraphStore};

// ============================================================================
// MemoryBackend
// ============================================================================

/// In-memory graph storage.
#[derive(Clone)]
pub struct MemoryBackend {
    inner: Arc<MemoryInner>,
}

struct MemoryInner {
    nodes: RwLock<HashMap<Uid, Node>>,
    /// uid → outgoing (edge name, target uid), insertion ordered
    adjacency: RwLock<HashMap<Uid, Vec<(String, Uid)>>>,
    next_uid: AtomicU64,
    next_tx_id: AtomicU64,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MemoryInner {
                nodes: RwLock::new(HashMap::new()),
                adjacency: RwLock::new(HashMap::new()),
                next_uid: AtomicU64::new(1),
                next_tx_id: AtomicU64::new(1),
            }),
        }
    }

    /// Create a node with the given type tags and properties.
    /// Uids are assigned sequentially: `0x1`, `0x2`, ...
    pub async fn create_node(
        &self,
        tx: &mut MemoryTx,
        types: &[&str],
        props: PropertyMap,
    ) -> Result<Uid> {
        ensure_writable(tx)?;
        let uid = Uid::from_u64(self.inner.next_uid.fetch_add(1, Ordering::Relaxed));
        let node = Node {
            uid: uid.clone(),
            types: types.iter().map(|t| t.to_string()).collect(),
            properties: props,
        };

        self.inner.nodes.write().insert(uid.clone(), node);
        self.inner.adjacency.write().insert(uid.clone(), Vec::new());

        Ok(uid)
    }

    /// Link `src` to `dst` along `edge`. Appends to `src`'s edge order.
    pub async fn create_edge(
        &self,
        tx: &mut MemoryTx,
        src: &Uid,
        edge: &str,
        dst: &Uid,
    ) -> Result<()> {
        ensure_writable(tx)?;
        // Verify both nodes exist
        {
            let nodes = self.inner.nodes.read();
            if !nodes.contains_key(src) {
                return Err(Error::NotFound(format!("Source node {src}")));
            }
            if !nodes.contains_key(dst) {
                return Err(Error::NotFound(format!("Target node {dst}")));
            }
        }

        self.inner
            .adjacency
            .write()
            .entry(src.clone())
            .or_default()
            .push((edge.to_string(), dst.clone()));
        Ok(())
    }

}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn ensure_writable(tx: &impl Transaction) -> Result<()> {
    match tx.mode() {
        TxMode::ReadWrite => Ok(()),
        TxMode::ReadOnly => Err(Error::TxError(format!("transaction {} is read-only", tx.id().0))),
    }
}

// ============================================================================
// MemoryTx
// ============================================================================

/// In-memory transaction (currently just a marker, no real MVCC).
pub struct MemoryTx {
    id: TxId,
    mode: TxMode,
}

impl Transaction for MemoryTx {
    fn mode(&self) -> TxMode { self.mode }
    fn id(&self) -> TxId { self.id }
}

// ============================================================================
// GraphStore impl
// ============================================================================

#[async_trait]
impl GraphStore for MemoryBackend {
    type Tx = MemoryTx;

    async fn begin_tx(&self, mode: TxMode) -> Result<MemoryTx> {
        let id = TxId(self.inner.next_tx_id.fetch_add(1, Ordering::Relaxed));
        Ok(MemoryTx { id, mode })
    }

    /// No-op: memory backend applies writes immediately, not on commit.
    async fn commit_tx(&self, _tx: MemoryTx) -> Result<()> { Ok(()) }

    /// WARNING: No-op. Memory backend has no write-ahead log.
    /// Mutations applied during this transaction are NOT reverted.
    async fn rollback_tx(&self, _tx: MemoryTx) -> Result<()> { Ok(()) }

    async fn traverse(&self, _tx: &MemoryTx, query: &TraversalQuery) -> Result<Vec<Node>> {
        let adj = self.inner.adjacency.read();
        let nodes = self.inner.nodes.read();

        let Some(out) = adj.get(query.parent()) else {
            return Ok(Vec::new());
        };

        let limit = query.first().unwrap_or(usize::MAX);
        let matches = out
            .iter()
            .filter(|(edge, _)| edge == query.edge())
            // dangling targets are skipped, like a store with a stale edge
            .filter_map(|(_, dst)| nodes.get(dst))
            .filter(|node| query.filters().matches(node))
            .take(limit)
            .map(|node| match query.projection() {
                Projection::AllPredicates => node.clone(),
                Projection::Fields(fields) => node.clone().project(fields),
            })
            .collect();

        Ok(matches)
    }

    fn capabilities(&self) -> BackendCapabilities {
        BackendCapabilities {
            supports_first: true,
            supports_projection: true,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{FilterSpec, FilterTuple, FilterValue};

    async fn seed() -> (MemoryBackend, Uid, Vec<Uid>) {
        let db = MemoryBackend::new();
        let mut tx = db.begin_tx(TxMode::ReadWrite).await.unwrap();

        let parent = db.create_node(&mut tx, &["Process"], PropertyMap::new()).await.unwrap();
        let mut children = Vec::new();
        for (src, dst) in [("80", "443"), ("80", "8080"), ("22", "22")] {
            let mut props = PropertyMap::new();
            props.insert("src_port".into(), Value::from(src));
            props.insert("dst_port".into(), Value::from(dst));
            let uid = db.create_node(&mut tx, &["NetworkConnection"], props).await.unwrap();
            db.create_edge(&mut tx, &parent, "connected_to", &uid).await.unwrap();
            children.push(uid);
        }
        db.commit_tx(tx).await.unwrap();
        (db, parent, children)
    }

    #[tokio::test]
    async fn test_create_node_assigns_hex_uids() {
        let db = MemoryBackend::new();
        let mut tx = db.begin_tx(TxMode::ReadWrite).await.unwrap();
        let a = db.create_node(&mut tx, &["Process"], PropertyMap::new()).await.unwrap();
        let b = db.create_node(&mut tx, &["File"], PropertyMap::new()).await.unwrap();
        assert_eq!(a, Uid::from("0x1"));
        assert_eq!(b, Uid::from("0x2"));
        assert_eq!(tx.mode(), TxMode::ReadWrite);
    }

    #[tokio::test]
    async fn test_read_only_tx_rejects_writes() {
        let db = MemoryBackend::new();
        let mut tx = db.begin_tx(TxMode::ReadOnly).await.unwrap();
        let result = db.create_node(&mut tx, &["Process"], PropertyMap::new()).await;
        assert!(matches!(result, Err(Error::TxError(_))));
    }

    #[tokio::test]
    async fn test_edge_to_missing_node_fails() {
        let db = MemoryBackend::new();
        let mut tx = db.begin_tx(TxMode::ReadWrite).await.unwrap();
        let a = db.create_node(&mut tx, &["Process"], PropertyMap::new()).await.unwrap();
        let result = db.create_edge(&mut tx, &a, "children", &Uid::from("0x99")).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_traverse_preserves_insertion_order() {
        let (db, parent, children) = seed().await;
        let tx = db.begin_tx(TxMode::ReadOnly).await.unwrap();

        let q = TraversalQuery::new(parent, "connected_to", FilterSpec::new()).unwrap();
        let found: Vec<_> = db.traverse(&tx, &q).await.unwrap().into_iter().map(|n| n.uid).collect();
        assert_eq!(found, children);
    }

    #[tokio::test]
    async fn test_traverse_applies_filters_and_first() {
        let (db, parent, children) = seed().await;
        let tx = db.begin_tx(TxMode::ReadOnly).await.unwrap();

        let filters: FilterSpec =
            [FilterTuple::new("src_port", FilterValue::Str("80".into()))].into_iter().collect();
        let q = TraversalQuery::new(parent.clone(), "connected_to", filters.clone()).unwrap();
        assert_eq!(db.traverse(&tx, &q).await.unwrap().len(), 2);

        let q = TraversalQuery::new(parent, "connected_to", filters).unwrap().with_first(1);
        let found = db.traverse(&tx, &q).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].uid, children[0]);
    }

    #[tokio::test]
    async fn test_traverse_other_edge_or_missing_parent() {
        let (db, parent, _) = seed().await;
        let tx = db.begin_tx(TxMode::ReadOnly).await.unwrap();

        let q = TraversalQuery::new(parent, "children", FilterSpec::new()).unwrap();
        assert!(db.traverse(&tx, &q).await.unwrap().is_empty());

        let q = TraversalQuery::new(Uid::from("0xdead"), "connected_to", FilterSpec::new()).unwrap();
        assert!(db.traverse(&tx, &q).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_traverse_projection() {
        let (db, parent, _) = seed().await;
        let tx = db.begin_tx(TxMode::ReadOnly).await.unwrap();

        let q = TraversalQuery::new(parent, "connected_to", FilterSpec::new())
            .unwrap()
            .with_projection(Projection::Fields(vec!["dst_port".into()]));
        let found = db.traverse(&tx, &q).await.unwrap();
        assert!(found.iter().all(|n| n.get("src_port").is_none()));
        assert!(found.iter().all(|n| n.get("dst_port").is_some()));
        assert!(found.iter().all(|n| n.has_type("NetworkConnection")));
    }
}
