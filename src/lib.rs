//! # graph-resolvers: Edge Expansion for Graph-Backed APIs
//!
//! Field resolvers that follow one edge out of a parent entity, keep the
//! targets matching the client's filter arguments, and return either the
//! first match or all of them.
//!
//! ## Design Principles
//!
//! 1. **Trait-first**: `GraphStore` is the contract between resolvers and storage
//! 2. **Schema drives filters**: argument tables are the only source of filter fields
//! 3. **One path, two shapes**: single and list resolvers share the executor
//! 4. **Injected, not global**: every collaborator is passed in at construction
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use graph_resolvers::{arguments, MemoryBackend, Node, ResolverFactory};
//!
//! # async fn example() -> graph_resolvers::Result<()> {
//! let store = Arc::new(MemoryBackend::new());
//! let factory = ResolverFactory::with_store(store);
//!
//! let (single, list) = factory.pair("connected_to")?;
//! let parent = Node::new("0x1");
//!
//! let all_http = list.resolve(&parent, &arguments([("src_port", "80")])).await?;
//! let first_tls = single.resolve(&parent, &arguments([("dst_port", "443")])).await?;
//! println!("{} connections, tls: {:?}", all_http.len(), first_tls.map(|n| n.uid));
//! # Ok(())
//! # }
//! ```
//!
//! ## Storage Backends
//!
//! | Backend | Description |
//! |---------|-------------|
//! | `MemoryBackend` | In-memory graph for testing/embedding |
//! | `DqlBackend` | Dgraph through a caller-supplied `DqlTransport` |

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod tx;
pub mod schema;
pub mod filter;
pub mod query;
pub mod storage;
pub mod expand;
pub mod resolver;

// ============================================================================
// Re-exports: Model (the DTOs)
// ============================================================================

pub use model::{Node, Uid, Value, PropertyMap, Arguments, arguments};

// ============================================================================
// Re-exports: Schemas and filters
// ============================================================================

pub use schema::{
    EntityKind, PrimitiveType, ArgSpec, ArgumentSchema,
    ArgumentSchemaProvider, StaticSchemas,
};
pub use filter::{FilterSpec, FilterSpecBuilder, FilterTuple, FilterValue};

// ============================================================================
// Re-exports: Storage
// ============================================================================

pub use query::{Projection, TraversalQuery, DqlRequest};
pub use storage::{
    GraphStore, BackendCapabilities,
    MemoryBackend, DqlBackend, DqlTransport, TransportError,
};

// ============================================================================
// Re-exports: Transactions
// ============================================================================

pub use tx::{Transaction, TxMode, TxId};

// ============================================================================
// Re-exports: Expansion and resolvers
// ============================================================================

pub use expand::{Cardinality, EdgeExecutor, ExpandConfig, FetchMany, FetchOne, FetchStrategy};
pub use resolver::{
    EdgeResolver, FieldDefinition, ListResolver, OutputType, Resolved,
    ResolverFactory, SingleResolver,
};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Malformed edge: {0}")]
    MalformedEdge(String),

    #[error("Unknown edge: {0}")]
    UnknownEdge(String),

    #[error("Unknown entity kind: {0}")]
    UnknownEntityKind(String),

    #[error("Unknown argument {name:?} for {kind}")]
    UnknownArgument { kind: String, name: String },

    #[error("Type error: argument {field} expected {expected}, got {got}")]
    TypeError { field: String, expected: String, got: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transaction error: {0}")]
    TxError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
