//! # Resolver Factory
//!
//! Produces the two field resolvers the API-schema layer registers for an
//! edge: a single-result one (nullable entity) and a list one.
//!
//! ```text
//! resolve(parent, args)
//!   → FilterSpecBuilder::build(target kind, args)
//!   → EdgeExecutor::expand::<FetchOne | FetchMany>(parent.uid, edge, filters)
//!   → Option<Node> | Vec<Node>, returned unmodified
//! ```
//!
//! All collaborators are injected through [`ResolverFactory::new`]; the
//! resolvers themselves hold no state beyond shared handles and are cheap
//! to clone across tasks.

pub mod catalog;

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;

use crate::expand::{Cardinality, EdgeExecutor, ExpandConfig, FetchMany, FetchOne, FetchStrategy};
use crate::filter::FilterSpecBuilder;
use crate::model::{Arguments, Node};
use crate::query::is_predicate_name;
use crate::schema::{ArgumentSchema, ArgumentSchemaProvider, EntityKind, StaticSchemas};
use crate::storage::GraphStore;
use crate::{Error, Result};

pub use catalog::{EdgeDecl, EDGES};

// ============================================================================
// Field definitions
// ============================================================================

/// Declared output type of a resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OutputType {
    /// A single entity, or null.
    Nullable(EntityKind),
    /// A list of entities, possibly empty.
    List(EntityKind),
}

impl fmt::Display for OutputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputType::Nullable(kind) => write!(f, "{kind}"),
            OutputType::List(kind) => write!(f, "[{kind}]"),
        }
    }
}

/// What the API-schema layer needs to register a resolver as a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDefinition {
    pub edge: String,
    pub output: OutputType,
    pub args: ArgumentSchema,
}

// ============================================================================
// Resolved values
// ============================================================================

/// Resolver output with the cardinality erased, for callers that store
/// single and list resolvers side by side.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    One(Option<Node>),
    Many(Vec<Node>),
}

impl Resolved {
    /// Field value as the API layer serializes it: no match is `null` for
    /// a single field and `[]` for a list field.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Resolved::One(None) => serde_json::Value::Null,
            Resolved::One(Some(node)) => node.to_json(),
            Resolved::Many(nodes) => serde_json::Value::Array(nodes.iter().map(Node::to_json).collect()),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Resolved::One(node) => node.iter().len(),
            Resolved::Many(nodes) => nodes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Option<Node>> for Resolved {
    fn from(v: Option<Node>) -> Self { Resolved::One(v) }
}

impl From<Vec<Node>> for Resolved {
    fn from(v: Vec<Node>) -> Self { Resolved::Many(v) }
}

// ============================================================================
// Resolvers
// ============================================================================

/// Resolver for one edge with fetch strategy `F`.
pub struct EdgeResolver<S, P, F> {
    edge: Arc<str>,
    target: EntityKind,
    schemas: Arc<P>,
    filters: FilterSpecBuilder<P>,
    executor: EdgeExecutor<S>,
    _fetch: PhantomData<fn() -> F>,
}

/// Returns the first matching entity, or `None`.
pub type SingleResolver<S, P = StaticSchemas> = EdgeResolver<S, P, FetchOne>;

/// Returns every matching entity in store order.
pub type ListResolver<S, P = StaticSchemas> = EdgeResolver<S, P, FetchMany>;

impl<S, P, F> Clone for EdgeResolver<S, P, F> {
    fn clone(&self) -> Self {
        Self {
            edge: Arc::clone(&self.edge),
            target: self.target,
            schemas: Arc::clone(&self.schemas),
            filters: self.filters.clone(),
            executor: self.executor.clone(),
            _fetch: PhantomData,
        }
    }
}

impl<S, P, F> EdgeResolver<S, P, F>
where
    S: GraphStore,
    P: ArgumentSchemaProvider,
    F: FetchStrategy,
{
    pub fn edge(&self) -> &str {
        &self.edge
    }

    pub fn target(&self) -> EntityKind {
        self.target
    }

    pub fn cardinality(&self) -> Cardinality {
        F::CARDINALITY
    }

    pub fn field(&self) -> FieldDefinition {
        let output = match F::CARDINALITY {
            Cardinality::One => OutputType::Nullable(self.target),
            Cardinality::Many => OutputType::List(self.target),
        };
        FieldDefinition {
            edge: self.edge.to_string(),
            output,
            args: self.schemas.schema_for(self.target),
        }
    }

    /// Resolve the field for `parent` with the client's raw `args`.
    pub async fn resolve(&self, parent: &Node, args: &Arguments) -> Result<F::Output> {
        let filters = self.filters.build(self.target, args)?;
        tracing::trace!(
            edge = %self.edge,
            target = %self.target,
            filters = filters.len(),
            "resolving edge field"
        );
        self.executor.expand::<F>(&parent.uid, &self.edge, filters).await
    }

    /// [`resolve`](Self::resolve), with the output erased to [`Resolved`].
    pub async fn resolve_field(&self, parent: &Node, args: &Arguments) -> Result<Resolved>
    where
        F::Output: Into<Resolved>,
    {
        self.resolve(parent, args).await.map(Into::into)
    }
}

// ============================================================================
// Factory
// ============================================================================

/// Builds single and list resolvers over injected collaborators.
pub struct ResolverFactory<S, P = StaticSchemas> {
    schemas: Arc<P>,
    filters: FilterSpecBuilder<P>,
    executor: EdgeExecutor<S>,
}

impl<S, P> Clone for ResolverFactory<S, P> {
    fn clone(&self) -> Self {
        Self {
            schemas: Arc::clone(&self.schemas),
            filters: self.filters.clone(),
            executor: self.executor.clone(),
        }
    }
}

impl<S: GraphStore, P: ArgumentSchemaProvider> ResolverFactory<S, P> {
    pub fn new(schemas: Arc<P>, filters: FilterSpecBuilder<P>, executor: EdgeExecutor<S>) -> Self {
        Self { schemas, filters, executor }
    }

    pub fn executor(&self) -> &EdgeExecutor<S> {
        &self.executor
    }

    /// Single-result resolver for a catalogued edge.
    pub fn single(&self, edge: &str) -> Result<SingleResolver<S, P>> {
        let decl = declared(edge)?;
        self.single_for(decl.name, decl.single)
    }

    /// List resolver for a catalogued edge.
    pub fn list(&self, edge: &str) -> Result<ListResolver<S, P>> {
        let decl = declared(edge)?;
        self.list_for(decl.name, decl.list)
    }

    /// Single-result resolver for any edge, targeting `target`.
    pub fn single_for(&self, edge: &str, target: EntityKind) -> Result<SingleResolver<S, P>> {
        self.make(edge, target)
    }

    /// List resolver for any edge, targeting `target`.
    pub fn list_for(&self, edge: &str, target: EntityKind) -> Result<ListResolver<S, P>> {
        self.make(edge, target)
    }

    /// Both resolvers for a catalogued edge.
    pub fn pair(&self, edge: &str) -> Result<(SingleResolver<S, P>, ListResolver<S, P>)> {
        Ok((self.single(edge)?, self.list(edge)?))
    }

    fn make<F: FetchStrategy>(&self, edge: &str, target: EntityKind) -> Result<EdgeResolver<S, P, F>> {
        if edge.trim().is_empty() {
            return Err(Error::MalformedEdge("edge name is empty".into()));
        }
        if !is_predicate_name(edge) {
            return Err(Error::MalformedEdge(format!("invalid edge name {edge:?}")));
        }
        Ok(EdgeResolver {
            edge: Arc::from(edge),
            target,
            schemas: Arc::clone(&self.schemas),
            filters: self.filters.clone(),
            executor: self.executor.clone(),
            _fetch: PhantomData,
        })
    }
}

impl<S: GraphStore> ResolverFactory<S, StaticSchemas> {
    /// Factory with the built-in schemas and default executor settings.
    pub fn with_store(store: Arc<S>) -> Self {
        let schemas = Arc::new(StaticSchemas);
        let filters = FilterSpecBuilder::new(Arc::clone(&schemas));
        Self::new(schemas, filters, EdgeExecutor::new(store))
    }

    /// Factory with the built-in schemas and the given executor settings.
    pub fn with_config(store: Arc<S>, config: ExpandConfig) -> Result<Self> {
        let schemas = Arc::new(StaticSchemas);
        let filters = FilterSpecBuilder::new(Arc::clone(&schemas));
        Ok(Self::new(schemas, filters, EdgeExecutor::with_config(store, config)?))
    }
}

fn declared(edge: &str) -> Result<&'static EdgeDecl> {
    catalog::lookup(edge).ok_or_else(|| Error::UnknownEdge(edge.to_string()))
}
