//! # Traversal Queries
//!
//! The single query shape edge expansion needs:
//!
//! ```text
//! start at parent uid → follow edge → AND of equality filters
//!   → [first N] → uid, type tags, projected properties
//! ```
//!
//! A `TraversalQuery` is structured data. Backends either evaluate it
//! directly (memory) or render it to a parameterized query ([`dql`]).
//! User-supplied values never become query text.

pub mod dql;

use serde::{Deserialize, Serialize};

use crate::filter::FilterSpec;
use crate::model::Uid;
use crate::{Error, Result};

pub use dql::DqlRequest;

// ============================================================================
// Projection
// ============================================================================

/// Which properties of each matched node to return.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Projection {
    /// Every scalar predicate the node carries.
    #[default]
    AllPredicates,
    /// Only the listed predicates (plus uid and type tags).
    Fields(Vec<String>),
}

impl Projection {
    pub fn validate(&self) -> Result<()> {
        if let Projection::Fields(fields) = self {
            for field in fields {
                if !is_predicate_name(field) {
                    return Err(Error::Config(format!("invalid projected field {field:?}")));
                }
            }
        }
        Ok(())
    }
}

// ============================================================================
// Predicate names
// ============================================================================

/// Whether `name` can be spliced into query text as a predicate.
///
/// Predicate names cannot be bound as variables, so they are restricted to
/// `[A-Za-z0-9_.]`, optionally prefixed by `~` for a reverse edge.
pub fn is_predicate_name(name: &str) -> bool {
    let body = name.strip_prefix('~').unwrap_or(name);
    !body.is_empty()
        && body.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

// ============================================================================
// TraversalQuery
// ============================================================================

/// One-hop traversal from a parent node along a named edge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraversalQuery {
    parent: Uid,
    edge: String,
    filters: FilterSpec,
    first: Option<usize>,
    projection: Projection,
}

impl TraversalQuery {
    /// Build a traversal. Fails with `MalformedEdge` when the parent uid
    /// is blank or the edge is not a usable predicate name.
    pub fn new(parent: Uid, edge: impl Into<String>, filters: FilterSpec) -> Result<Self> {
        let edge = edge.into();
        if edge.trim().is_empty() {
            return Err(Error::MalformedEdge("edge name is empty".into()));
        }
        if !is_predicate_name(&edge) {
            return Err(Error::MalformedEdge(format!("invalid edge name {edge:?}")));
        }
        if parent.is_empty() {
            return Err(Error::MalformedEdge(format!("parent uid is empty (edge {edge})")));
        }
        Ok(Self {
            parent,
            edge,
            filters,
            first: None,
            projection: Projection::AllPredicates,
        })
    }

    /// Cap the number of matches the store returns.
    pub fn with_first(mut self, n: usize) -> Self {
        self.first = Some(n);
        self
    }

    pub fn with_projection(mut self, projection: Projection) -> Self {
        self.projection = projection;
        self
    }

    pub fn parent(&self) -> &Uid { &self.parent }
    pub fn edge(&self) -> &str { &self.edge }
    pub fn filters(&self) -> &FilterSpec { &self.filters }
    pub fn first(&self) -> Option<usize> { self.first }
    pub fn projection(&self) -> &Projection { &self.projection }

    /// Render as a parameterized DQL request.
    pub fn to_dql(&self) -> DqlRequest {
        dql::render(self)
    }
}
