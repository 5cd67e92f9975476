//! # Filter Specs
//!
//! Turns raw field arguments into the ordered, typed equality predicates
//! an edge traversal applies to its targets.
//!
//! ```text
//! args {dst_port: "443", src_port: "80"}
//!   → [(src_port, "80", string), (dst_port, "443", string)]   // schema order
//! ```
//!
//! Absent and `null` arguments produce no tuple at all, so they can never
//! turn into an "equals empty" predicate downstream.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::model::{Arguments, Node, Value};
use crate::schema::{ArgSpec, ArgumentSchemaProvider, EntityKind, PrimitiveType, StaticSchemas};
use crate::{Error, Result};

// ============================================================================
// Filter tuples
// ============================================================================

/// Typed filter value. The variant is the comparison kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterValue {
    Str(String),
    Int(i64),
}

impl FilterValue {
    pub fn kind(&self) -> PrimitiveType {
        match self {
            FilterValue::Str(_) => PrimitiveType::String,
            FilterValue::Int(_) => PrimitiveType::Int,
        }
    }

    /// Coerce a raw argument to the declared type.
    /// `None` for `Null` and for values the type does not accept.
    fn coerce(ty: PrimitiveType, value: &Value) -> Option<Self> {
        match ty {
            PrimitiveType::String => value.as_str().map(|s| FilterValue::Str(s.to_string())),
            PrimitiveType::Int => value.as_int().map(FilterValue::Int),
        }
    }

    /// Render for a query variable. Stores take variables as strings and
    /// apply the declared type themselves.
    pub fn to_param(&self) -> String {
        match self {
            FilterValue::Str(s) => s.clone(),
            FilterValue::Int(i) => i.to_string(),
        }
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Str(s) => write!(f, "{s:?}"),
            FilterValue::Int(i) => write!(f, "{i}"),
        }
    }
}

/// One `(field, value, kind)` predicate derived from a present argument.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FilterTuple {
    pub field: &'static str,
    pub value: FilterValue,
}

impl FilterTuple {
    pub fn new(field: &'static str, value: FilterValue) -> Self {
        Self { field, value }
    }

    pub fn kind(&self) -> PrimitiveType {
        self.value.kind()
    }

    /// Evaluate against a node: string equality for string tuples,
    /// numeric equality for int tuples. A missing property never matches.
    pub fn matches(&self, node: &Node) -> bool {
        let Some(actual) = node.get(self.field) else {
            return false;
        };
        match &self.value {
            FilterValue::Str(expected) => actual.as_str() == Some(expected.as_str()),
            FilterValue::Int(expected) => actual.as_int() == Some(*expected),
        }
    }
}

impl fmt::Display for FilterTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {} ({})", self.field, self.value, self.kind())
    }
}

// ============================================================================
// Filter spec
// ============================================================================

/// Ordered conjunction of filter tuples for one expansion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterSpec(SmallVec<[FilterTuple; 4]>);

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, tuple: FilterTuple) {
        self.0.push(tuple);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FilterTuple> {
        self.0.iter()
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.iter().map(|t| t.field)
    }

    /// Logical AND of every tuple. An empty spec matches everything.
    pub fn matches(&self, node: &Node) -> bool {
        self.0.iter().all(|t| t.matches(node))
    }
}

impl<'a> IntoIterator for &'a FilterSpec {
    type Item = &'a FilterTuple;
    type IntoIter = std::slice::Iter<'a, FilterTuple>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<FilterTuple> for FilterSpec {
    fn from_iter<I: IntoIterator<Item = FilterTuple>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builds filter specs from the argument schema of the target kind.
pub struct FilterSpecBuilder<P = StaticSchemas> {
    schemas: Arc<P>,
}

impl<P> Clone for FilterSpecBuilder<P> {
    fn clone(&self) -> Self {
        Self { schemas: Arc::clone(&self.schemas) }
    }
}

impl<P: ArgumentSchemaProvider> FilterSpecBuilder<P> {
    pub fn new(schemas: Arc<P>) -> Self {
        Self { schemas }
    }

    /// Validate `args` against the schema for `kind`, then emit one tuple
    /// per present argument, in schema order.
    pub fn build(&self, kind: EntityKind, args: &Arguments) -> Result<FilterSpec> {
        let schema = self.schemas.schema_for(kind);
        schema.validate(args)?;

        let mut spec = FilterSpec::new();
        for arg in schema.args() {
            if let Some(tuple) = Self::tuple_for(arg, args)? {
                spec.push(tuple);
            }
        }
        Ok(spec)
    }

    fn tuple_for(arg: &ArgSpec, args: &Arguments) -> Result<Option<FilterTuple>> {
        match args.get(arg.name) {
            None | Some(Value::Null) => Ok(None),
            Some(raw) => FilterValue::coerce(arg.ty, raw)
                .map(|value| Some(FilterTuple::new(arg.name, value)))
                .ok_or_else(|| Error::TypeError {
                    field: arg.name.to_string(),
                    expected: arg.ty.name().into(),
                    got: raw.type_name().into(),
                }),
        }
    }
}

impl Default for FilterSpecBuilder<StaticSchemas> {
    fn default() -> Self {
        Self::new(Arc::new(StaticSchemas))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::arguments;
    use pretty_assertions::assert_eq;

    fn build(args: &Arguments) -> Result<FilterSpec> {
        FilterSpecBuilder::default().build(EntityKind::NetworkConnection, args)
    }

    #[test]
    fn test_all_absent_builds_nothing() {
        let spec = build(&Arguments::new()).unwrap();
        assert!(spec.is_empty());
    }

    #[test]
    fn test_null_is_absent() {
        let args = arguments([("src_port", Value::Null), ("created_timestamp", Value::Null)]);
        assert!(build(&args).unwrap().is_empty());
    }

    #[test]
    fn test_schema_order_not_argument_order() {
        let args = arguments([
            ("last_seen_timestamp", Value::from(30)),
            ("dst_port", Value::from("443")),
            ("src_ip_address", Value::from("10.0.0.1")),
        ]);
        let spec = build(&args).unwrap();
        let fields: Vec<_> = spec.fields().collect();
        assert_eq!(fields, vec!["src_ip_address", "dst_port", "last_seen_timestamp"]);
    }

    #[test]
    fn test_kinds_follow_schema() {
        let args = arguments([
            ("src_port", Value::from("80")),
            ("created_timestamp", Value::from(1_000i64)),
        ]);
        let spec = build(&args).unwrap();
        let tuples: Vec<_> = spec.iter().cloned().collect();
        assert_eq!(
            tuples,
            vec![
                FilterTuple::new("src_port", FilterValue::Str("80".into())),
                FilterTuple::new("created_timestamp", FilterValue::Int(1_000)),
            ]
        );
        assert_eq!(tuples[0].kind(), PrimitiveType::String);
        assert_eq!(tuples[1].kind(), PrimitiveType::Int);
    }

    #[test]
    fn test_integral_float_becomes_int() {
        let spec = build(&arguments([("created_timestamp", 1_500.0)])).unwrap();
        assert_eq!(spec.iter().next().unwrap().value, FilterValue::Int(1_500));
    }

    #[test]
    fn test_out_of_range_float_is_a_type_error() {
        for f in [1e300, -1e300] {
            let err = build(&arguments([("created_timestamp", f)])).unwrap_err();
            assert!(matches!(err, Error::TypeError { ref field, .. } if field == "created_timestamp"));
        }
    }

    #[test]
    fn test_int_tuple_does_not_match_huge_float() {
        let tuple = FilterTuple::new("created_timestamp", FilterValue::Int(i64::MAX));
        let node = Node::new("0x1").with_property("created_timestamp", 9.3e18);
        assert!(!tuple.matches(&node));
    }

    #[test]
    fn test_ill_typed_argument_fails() {
        let err = build(&arguments([("dst_port", 443)])).unwrap_err();
        assert!(matches!(err, Error::TypeError { .. }));
    }

    #[test]
    fn test_every_declared_argument_has_a_tuple() {
        let schemas = StaticSchemas;
        let builder = FilterSpecBuilder::default();
        for kind in EntityKind::ALL {
            let schema = schemas.schema_for(kind);
            let args: Arguments = schema
                .args()
                .iter()
                .map(|a| {
                    let v = match a.ty {
                        PrimitiveType::String => Value::from("x"),
                        PrimitiveType::Int => Value::from(1),
                    };
                    (a.name.to_string(), v)
                })
                .collect();

            let spec = builder.build(kind, &args).unwrap();
            let declared: Vec<_> = schema.args().iter().map(|a| a.name).collect();
            let built: Vec<_> = spec.fields().collect();
            assert_eq!(built, declared, "{kind}");
        }
    }

    #[test]
    fn test_tuple_matching() {
        let node = Node::new("0x2")
            .with_property("src_port", "80")
            .with_property("created_timestamp", 1_000i64);

        assert!(FilterTuple::new("src_port", FilterValue::Str("80".into())).matches(&node));
        assert!(!FilterTuple::new("src_port", FilterValue::Str("8080".into())).matches(&node));
        assert!(FilterTuple::new("created_timestamp", FilterValue::Int(1_000)).matches(&node));
        // a string "80" is not the number 80
        assert!(!FilterTuple::new("src_port", FilterValue::Int(80)).matches(&node));
        assert!(!FilterTuple::new("dst_port", FilterValue::Str("443".into())).matches(&node));
    }

    #[test]
    fn test_empty_spec_matches_everything() {
        assert!(FilterSpec::new().matches(&Node::new("0x9")));
    }
}
