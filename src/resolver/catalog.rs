//! Static edge declarations: which entity kind each edge's single and
//! list resolvers return.

use crate::schema::EntityKind::{self, *};

/// Declaration of one edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeDecl {
    pub name: &'static str,
    /// Kind returned by the single-result resolver.
    pub single: EntityKind,
    /// Kind returned by the list resolver.
    pub list: EntityKind,
}

impl EdgeDecl {
    pub const fn new(name: &'static str, single: EntityKind, list: EntityKind) -> Self {
        Self { name, single, list }
    }

    const fn uniform(name: &'static str, kind: EntityKind) -> Self {
        Self::new(name, kind, kind)
    }
}

pub const EDGES: &[EdgeDecl] = &[
    // network
    EdgeDecl::uniform("connected_to", NetworkConnection),
    EdgeDecl::uniform("created_connections", NetworkConnection),
    EdgeDecl::uniform("inbound_connections", ProcessInboundConnection),
    EdgeDecl::uniform("outbound_connections", ProcessOutboundConnection),
    // process tree
    EdgeDecl::uniform("children", Process),
    EdgeDecl::uniform("parent", Process),
    // files
    EdgeDecl::uniform("bin_file", File),
    EdgeDecl::uniform("created_files", File),
    EdgeDecl::uniform("deleted_files", File),
    EdgeDecl::uniform("read_files", File),
    EdgeDecl::uniform("wrote_files", File),
    // host
    EdgeDecl::uniform("asset", Asset),
];

/// Look up a declared edge by name.
pub fn lookup(name: &str) -> Option<&'static EdgeDecl> {
    EDGES.iter().find(|e| e.name == name)
}
