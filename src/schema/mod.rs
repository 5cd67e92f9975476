//! # Argument Schemas
//!
//! Per entity kind, the filter arguments a resolver accepts and their
//! primitive types. The tables here are the single source of truth:
//! the filter builder walks them in declaration order, so every declared
//! argument has exactly one filter-tuple entry and nothing else does.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::{Arguments, Value};
use crate::{Error, Result};

// ============================================================================
// Entity kinds
// ============================================================================

/// Typed category of a graph node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Process,
    File,
    NetworkConnection,
    ProcessInboundConnection,
    ProcessOutboundConnection,
    Asset,
}

impl EntityKind {
    pub const ALL: [EntityKind; 6] = [
        EntityKind::Process,
        EntityKind::File,
        EntityKind::NetworkConnection,
        EntityKind::ProcessInboundConnection,
        EntityKind::ProcessOutboundConnection,
        EntityKind::Asset,
    ];

    /// Name of the type tag the store attaches to nodes of this kind.
    pub fn type_name(self) -> &'static str {
        match self {
            EntityKind::Process => "Process",
            EntityKind::File => "File",
            EntityKind::NetworkConnection => "NetworkConnection",
            EntityKind::ProcessInboundConnection => "ProcessInboundConnection",
            EntityKind::ProcessOutboundConnection => "ProcessOutboundConnection",
            EntityKind::Asset => "Asset",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

impl FromStr for EntityKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        EntityKind::ALL
            .into_iter()
            .find(|k| k.type_name() == s)
            .ok_or_else(|| Error::UnknownEntityKind(s.to_string()))
    }
}

// ============================================================================
// Primitive argument types
// ============================================================================

/// Primitive type of a filter argument. Also the comparison kind of the
/// filter tuple built from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    String,
    Int,
}

impl PrimitiveType {
    pub fn name(self) -> &'static str {
        match self {
            PrimitiveType::String => "string",
            PrimitiveType::Int => "int",
        }
    }

    /// Whether `value` is acceptable for an argument of this type.
    /// `Null` always is: it means the argument was not supplied.
    pub fn accepts(self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (PrimitiveType::String, v) => v.is_string(),
            (PrimitiveType::Int, v) => v.as_int().is_some(),
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Argument schema
// ============================================================================

/// One declared argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ArgSpec {
    pub name: &'static str,
    pub ty: PrimitiveType,
}

const fn string(name: &'static str) -> ArgSpec {
    ArgSpec { name, ty: PrimitiveType::String }
}

const fn int(name: &'static str) -> ArgSpec {
    ArgSpec { name, ty: PrimitiveType::Int }
}

/// Ordered argument table for one entity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgumentSchema {
    kind: EntityKind,
    args: &'static [ArgSpec],
}

impl ArgumentSchema {
    pub const fn new(kind: EntityKind, args: &'static [ArgSpec]) -> Self {
        Self { kind, args }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Declared arguments, in declaration order.
    pub fn args(&self) -> &'static [ArgSpec] {
        self.args
    }

    pub fn get(&self, name: &str) -> Option<&'static ArgSpec> {
        self.args.iter().find(|a| a.name == name)
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Check raw arguments against this schema.
    ///
    /// Names are checked in sorted order so the reported error does not
    /// depend on map iteration order.
    pub fn validate(&self, args: &Arguments) -> Result<()> {
        let mut entries: Vec<(&String, &Value)> = args.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));

        for (name, value) in entries {
            let spec = self.get(name).ok_or_else(|| Error::UnknownArgument {
                kind: self.kind.to_string(),
                name: name.clone(),
            })?;
            if !spec.ty.accepts(value) {
                return Err(Error::TypeError {
                    field: name.clone(),
                    expected: spec.ty.name().into(),
                    got: value.type_name().into(),
                });
            }
        }
        Ok(())
    }
}

// ============================================================================
// Provider
// ============================================================================

/// Source of argument schemas.
///
/// Must be total over [`EntityKind`]; implementations match exhaustively
/// instead of returning an error for a kind they do not know.
pub trait ArgumentSchemaProvider: Send + Sync + 'static {
    fn schema_for(&self, kind: EntityKind) -> ArgumentSchema;
}

/// The built-in schemas.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticSchemas;

const NETWORK_CONNECTION_ARGS: &[ArgSpec] = &[
    string("src_ip_address"),
    string("src_port"),
    string("dst_ip_address"),
    string("dst_port"),
    int("created_timestamp"),
    int("terminated_timestamp"),
    int("last_seen_timestamp"),
];

const PROCESS_ARGS: &[ArgSpec] = &[
    int("process_id"),
    string("process_name"),
    int("created_timestamp"),
    int("terminate_time"),
    string("image_name"),
    string("arguments"),
];

const FILE_ARGS: &[ArgSpec] = &[
    string("file_path"),
    string("file_extension"),
    string("file_mime_type"),
    int("file_size"),
    string("file_version"),
    string("file_description"),
    string("file_product"),
    string("file_company"),
    string("file_directory"),
    int("file_inode"),
    int("file_hard_links"),
    string("signed"),
    string("signed_status"),
    string("md5_hash"),
    string("sha1_hash"),
    string("sha256_hash"),
];

const PROCESS_CONNECTION_ARGS: &[ArgSpec] = &[
    string("ip_address"),
    string("protocol"),
    int("port"),
    int("created_timestamp"),
    int("terminated_timestamp"),
    int("last_seen_timestamp"),
];

const ASSET_ARGS: &[ArgSpec] = &[string("hostname")];

impl ArgumentSchemaProvider for StaticSchemas {
    fn schema_for(&self, kind: EntityKind) -> ArgumentSchema {
        let args = match kind {
            EntityKind::NetworkConnection => NETWORK_CONNECTION_ARGS,
            EntityKind::Process => PROCESS_ARGS,
            EntityKind::File => FILE_ARGS,
            EntityKind::ProcessInboundConnection
            | EntityKind::ProcessOutboundConnection => PROCESS_CONNECTION_ARGS,
            EntityKind::Asset => ASSET_ARGS,
        };
        ArgumentSchema::new(kind, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::arguments;

    #[test]
    fn test_network_connection_order() {
        let schema = StaticSchemas.schema_for(EntityKind::NetworkConnection);
        let names: Vec<_> = schema.args().iter().map(|a| a.name).collect();
        assert_eq!(
            names,
            vec![
                "src_ip_address", "src_port", "dst_ip_address", "dst_port",
                "created_timestamp", "terminated_timestamp", "last_seen_timestamp",
            ]
        );
        assert_eq!(schema.get("dst_port").unwrap().ty, PrimitiveType::String);
        assert_eq!(schema.get("created_timestamp").unwrap().ty, PrimitiveType::Int);
    }

    #[test]
    fn test_every_kind_has_schema() {
        for kind in EntityKind::ALL {
            let schema = StaticSchemas.schema_for(kind);
            assert_eq!(schema.kind(), kind);
            assert!(!schema.is_empty(), "{kind} declares no arguments");
        }
    }

    #[test]
    fn test_no_duplicate_names() {
        for kind in EntityKind::ALL {
            let schema = StaticSchemas.schema_for(kind);
            let mut names: Vec<_> = schema.args().iter().map(|a| a.name).collect();
            names.sort();
            names.dedup();
            assert_eq!(names.len(), schema.len(), "{kind} declares a name twice");
        }
    }

    #[test]
    fn test_kind_parse_roundtrip() {
        for kind in EntityKind::ALL {
            assert_eq!(kind.type_name().parse::<EntityKind>().unwrap(), kind);
        }
        assert!(matches!(
            "Lens".parse::<EntityKind>(),
            Err(Error::UnknownEntityKind(name)) if name == "Lens"
        ));
    }

    #[test]
    fn test_validate_rejects_unknown_argument() {
        let schema = StaticSchemas.schema_for(EntityKind::NetworkConnection);
        let err = schema.validate(&arguments([("process_name", "chrome.exe")])).unwrap_err();
        assert!(matches!(err, Error::UnknownArgument { ref name, .. } if name == "process_name"));
    }

    #[test]
    fn test_validate_rejects_wrong_type() {
        let schema = StaticSchemas.schema_for(EntityKind::NetworkConnection);

        let err = schema.validate(&arguments([("src_port", 80)])).unwrap_err();
        assert!(matches!(err, Error::TypeError { ref field, .. } if field == "src_port"));

        let err = schema.validate(&arguments([("created_timestamp", "yesterday")])).unwrap_err();
        assert!(matches!(err, Error::TypeError { ref expected, .. } if expected == "int"));
    }

    #[test]
    fn test_validate_accepts_null_and_integral_float() {
        let schema = StaticSchemas.schema_for(EntityKind::NetworkConnection);
        let args = arguments([
            ("src_port", Value::Null),
            ("created_timestamp", Value::Float(1_600_000_000.0)),
        ]);
        assert!(schema.validate(&args).is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range_float() {
        let schema = StaticSchemas.schema_for(EntityKind::NetworkConnection);
        for f in [1e300, -1e300] {
            let err = schema.validate(&arguments([("created_timestamp", f)])).unwrap_err();
            assert!(matches!(
                err,
                Error::TypeError { ref field, ref got, .. } if field == "created_timestamp" && got == "FLOAT"
            ));
        }
    }
}
