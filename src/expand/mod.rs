//! # Edge Expansion
//!
//! One execution path for both cardinalities:
//!
//! ```text
//! (parent uid, edge, filters) → TraversalQuery → GraphStore::traverse → Vec<Node>
//!   → FetchOne:  first match or None
//!   → FetchMany: every match, store order
//! ```
//!
//! Each call issues exactly one read query. Nothing is retried or cached
//! here, and store errors are returned unchanged.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::Instrument;

use crate::filter::FilterSpec;
use crate::model::{Node, Uid};
use crate::query::{Projection, TraversalQuery};
use crate::storage::GraphStore;
use crate::tx::{Transaction, TxMode};
use crate::Result;

// ============================================================================
// Fetch strategies
// ============================================================================

/// Expected number of results of an edge expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cardinality {
    One,
    Many,
}

/// Shapes the raw match list of a traversal into the resolver's output.
pub trait FetchStrategy: Send + Sync + 'static {
    type Output: Send + 'static;

    const CARDINALITY: Cardinality;

    fn collect(matches: Vec<Node>) -> Self::Output;
}

/// At most one result. With several matches the first in store order wins;
/// with none the result is `None`, not an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchOne;

/// Every match, in store order. No matches is an empty list.
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchMany;

impl FetchStrategy for FetchOne {
    type Output = Option<Node>;

    const CARDINALITY: Cardinality = Cardinality::One;

    fn collect(matches: Vec<Node>) -> Option<Node> {
        matches.into_iter().next()
    }
}

impl FetchStrategy for FetchMany {
    type Output = Vec<Node>;

    const CARDINALITY: Cardinality = Cardinality::Many;

    fn collect(matches: Vec<Node>) -> Vec<Node> {
        matches
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Executor settings.
///
/// ```json
/// { "projection": { "fields": ["src_port", "dst_port"] }, "limit_single": true }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpandConfig {
    /// Properties fetched for each matched node.
    pub projection: Projection,
    /// Push `first: 1` into single-result queries when the backend supports it.
    /// The result is the same either way; the store just returns less.
    pub limit_single: bool,
}

impl Default for ExpandConfig {
    fn default() -> Self {
        Self {
            projection: Projection::AllPredicates,
            limit_single: true,
        }
    }
}

impl ExpandConfig {
    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.projection.validate()
    }
}

// ============================================================================
// Executor
// ============================================================================

/// Runs edge expansions against a shared store handle.
pub struct EdgeExecutor<S> {
    store: Arc<S>,
    config: ExpandConfig,
}

impl<S> Clone for EdgeExecutor<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: self.config.clone(),
        }
    }
}

impl<S: GraphStore> EdgeExecutor<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store, config: ExpandConfig::default() }
    }

    pub fn with_config(store: Arc<S>, config: ExpandConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { store, config })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &ExpandConfig {
        &self.config
    }

    /// Build the query variant for strategy `F`. Validates the edge and
    /// parent before anything else.
    pub fn plan<F: FetchStrategy>(
        &self,
        parent: &Uid,
        edge: &str,
        filters: FilterSpec,
    ) -> Result<TraversalQuery> {
        let mut query = TraversalQuery::new(parent.clone(), edge, filters)?;
        let caps = self.store.capabilities();

        if F::CARDINALITY == Cardinality::One && self.config.limit_single && caps.supports_first {
            query = query.with_first(1);
        }
        if let Projection::Fields(_) = &self.config.projection {
            if caps.supports_projection {
                query = query.with_projection(self.config.projection.clone());
            }
        }
        Ok(query)
    }

    /// Expand `edge` from `parent`, keeping targets that match every
    /// filter, and shape the matches with `F`.
    ///
    /// Fails with `MalformedEdge` before any query is issued when `edge`
    /// or `parent` is blank. Store failures propagate unchanged.
    pub async fn expand<F: FetchStrategy>(
        &self,
        parent: &Uid,
        edge: &str,
        filters: FilterSpec,
    ) -> Result<F::Output> {
        let query = self.plan::<F>(parent, edge, filters)?;

        let span = tracing::debug_span!(
            "expand_edge",
            edge = %query.edge(),
            parent = %query.parent(),
            cardinality = ?F::CARDINALITY,
            filters = query.filters().len(),
        );

        async move {
            let matches = self.run(&query).await?;
            tracing::debug!(matches = matches.len(), "edge expanded");
            Ok(F::collect(matches))
        }
        .instrument(span)
        .await
    }

    async fn run(&self, query: &TraversalQuery) -> Result<Vec<Node>> {
        let tx = self.store.begin_tx(TxMode::ReadOnly).await?;
        let tx_id = tx.id().0;
        tracing::trace!(tx = tx_id, mode = ?tx.mode(), "transaction opened");
        match self.store.traverse(&tx, query).await {
            Ok(matches) => {
                self.store.commit_tx(tx).await?;
                Ok(matches)
            }
            Err(err) => {
                if let Err(rollback_err) = self.store.rollback_tx(tx).await {
                    tracing::warn!(tx = tx_id, error = %rollback_err, "rollback after failed traversal failed");
                }
                Err(err)
            }
        }
    }
}
