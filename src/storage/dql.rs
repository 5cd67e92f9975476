//! Dgraph backend over an injected DQL transport.
//!
//! ```text
//! TraversalQuery → to_dql() → DqlTransport::query() → JSON → decode() → Vec<Node>
//! ```
//!
//! The transport is the only part that talks to the network (gRPC, HTTP,
//! whatever the embedding service uses). Its lifecycle, pooling and retry
//! policy stay with the caller; any failure it reports becomes
//! `Error::StoreUnavailable`.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;

use crate::model::Node;
use crate::query::{dql, DqlRequest, TraversalQuery};
use crate::tx::{Transaction, TxId, TxMode};
use crate::{Error, Result};
use super::{BackendCapabilities, GraphStore};

/// Failure reported by a transport. Carried into `Error::StoreUnavailable`.
pub type TransportError = Box<dyn std::error::Error + Send + Sync>;

/// Executes a read-only DQL request and returns the response JSON.
#[async_trait]
pub trait DqlTransport: Send + Sync + 'static {
    async fn query(&self, request: &DqlRequest) -> std::result::Result<serde_json::Value, TransportError>;
}

/// `GraphStore` that speaks DQL through `T`.
pub struct DqlBackend<T> {
    transport: T,
    next_tx_id: AtomicU64,
}

impl<T: DqlTransport> DqlBackend<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            next_tx_id: AtomicU64::new(1),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

/// Read-only transaction marker. Dgraph read transactions need no commit.
pub struct DqlTx {
    id: TxId,
}

impl Transaction for DqlTx {
    fn mode(&self) -> TxMode { TxMode::ReadOnly }
    fn id(&self) -> TxId { self.id }
}

#[async_trait]
impl<T: DqlTransport> GraphStore for DqlBackend<T> {
    type Tx = DqlTx;

    async fn begin_tx(&self, mode: TxMode) -> Result<DqlTx> {
        if mode != TxMode::ReadOnly {
            return Err(Error::TxError("DQL backend only opens read-only transactions".into()));
        }
        let id = TxId(self.next_tx_id.fetch_add(1, Ordering::Relaxed));
        Ok(DqlTx { id })
    }

    async fn commit_tx(&self, _tx: DqlTx) -> Result<()> { Ok(()) }

    async fn rollback_tx(&self, _tx: DqlTx) -> Result<()> { Ok(()) }

    async fn traverse(&self, tx: &DqlTx, query: &TraversalQuery) -> Result<Vec<Node>> {
        let request = query.to_dql();
        tracing::trace!(tx = tx.id().0, query = %request.query, vars = request.vars.len(), "dql request");

        let response = self
            .transport
            .query(&request)
            .await
            .map_err(|e| Error::StoreUnavailable(e.to_string()))?;

        dql::decode(&response, query.edge())
    }

    fn capabilities(&self) -> BackendCapabilities {
        BackendCapabilities {
            supports_first: true,
            supports_projection: true,
        }
    }
}
