//! # Graph Store Trait
//!
//! The contract between the edge executor and whatever holds the graph.
//! Edge expansion needs exactly one operation from a store: run a
//! [`TraversalQuery`] inside a read transaction and hand back the matched
//! nodes in store order.
//!
//! ## Implementations
//!
//! | Backend | Module | Description |
//! |---------|--------|-------------|
//! | `MemoryBackend` | `memory` | In-memory graph for testing/embedding |
//! | `DqlBackend` | `dql` | Dgraph via an injected DQL transport |

pub mod memory;
pub mod dql;

use async_trait::async_trait;

use crate::model::Node;
use crate::query::TraversalQuery;
use crate::tx::{Transaction, TxMode};
use crate::Result;

pub use memory::MemoryBackend;
pub use dql::{DqlBackend, DqlTransport, TransportError};

// ============================================================================
// Backend capabilities
// ============================================================================

/// What a backend can do. The executor only pushes a query feature down
/// when the backend reports it.
///
/// All fields default to false.
#[derive(Debug, Clone, Default)]
pub struct BackendCapabilities {
    /// Honors `TraversalQuery::first`.
    pub supports_first: bool,
    /// Honors `Projection::Fields`.
    pub supports_projection: bool,
}

// ============================================================================
// GraphStore Trait
// ============================================================================

/// The read contract every backend implements.
///
/// Shared across concurrent resolutions (`Send + Sync`); one handle per
/// process. Retries and connection handling belong to the backend or its
/// transport, never to callers of this trait.
#[async_trait]
pub trait GraphStore: Send + Sync + 'static {
    /// The transaction type for this backend.
    type Tx: Transaction;

    /// Begin a new transaction.
    async fn begin_tx(&self, mode: TxMode) -> Result<Self::Tx>;

    /// Commit a transaction.
    async fn commit_tx(&self, tx: Self::Tx) -> Result<()>;

    /// Roll back a transaction.
    async fn rollback_tx(&self, tx: Self::Tx) -> Result<()>;

    /// Run a one-hop traversal. Returns matches in store order; an absent
    /// parent yields an empty list, not an error.
    ///
    /// Transport or connection failures surface as
    /// [`Error::StoreUnavailable`](crate::Error::StoreUnavailable).
    async fn traverse(&self, tx: &Self::Tx, query: &TraversalQuery) -> Result<Vec<Node>>;

    /// Report what this backend can do.
    fn capabilities(&self) -> BackendCapabilities {
        BackendCapabilities::default()
    }
}
