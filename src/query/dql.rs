//! DQL rendering and response decoding for [`TraversalQuery`].
//!
//! ```text
//! query expand($parent: string, $f0: string, $f1: int) {
//!   q(func: uid($parent)) {
//!     connected_to (first: 1) @filter(eq(src_port, $f0) AND eq(created_timestamp, $f1)) {
//!       uid
//!       dgraph.type
//!       expand(_all_)
//!     }
//!   }
//! }
//! ```
//!
//! Only predicate names (validated by [`super::is_predicate_name`]) and the
//! numeric `first` cap appear in the text. The parent uid and every filter
//! value travel in `vars`.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::Serialize;

use super::{Projection, TraversalQuery};
use crate::model::{Node, PropertyMap, Uid, Value, TYPE_PREDICATE};
use crate::{Error, Result};

/// Name of the root block in every rendered query.
pub const ROOT_BLOCK: &str = "q";

/// Variable bound to the parent uid.
pub const PARENT_VAR: &str = "$parent";

/// A DQL query plus its variables, ready for a transport.
///
/// Serializes as the JSON body Dgraph's HTTP endpoint expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DqlRequest {
    pub query: String,
    #[serde(rename = "variables")]
    pub vars: BTreeMap<String, String>,
}

pub(crate) fn render(q: &TraversalQuery) -> DqlRequest {
    let mut vars = BTreeMap::new();
    vars.insert(PARENT_VAR.to_string(), q.parent().as_str().to_string());

    let mut decls = vec![format!("{PARENT_VAR}: string")];
    let mut predicates = Vec::with_capacity(q.filters().len());
    for (i, tuple) in q.filters().iter().enumerate() {
        let var = format!("$f{i}");
        decls.push(format!("{var}: {}", tuple.kind().name()));
        predicates.push(format!("eq({}, {var})", tuple.field));
        vars.insert(var, tuple.value.to_param());
    }

    let mut edge_line = q.edge().to_string();
    if let Some(n) = q.first() {
        let _ = write!(edge_line, " (first: {n})");
    }
    if !predicates.is_empty() {
        let _ = write!(edge_line, " @filter({})", predicates.join(" AND "));
    }

    let mut query = String::with_capacity(256);
    let _ = writeln!(query, "query expand({}) {{", decls.join(", "));
    let _ = writeln!(query, "  {ROOT_BLOCK}(func: uid({PARENT_VAR})) {{");
    let _ = writeln!(query, "    {edge_line} {{");
    let _ = writeln!(query, "      uid");
    let _ = writeln!(query, "      {TYPE_PREDICATE}");
    match q.projection() {
        Projection::AllPredicates => {
            let _ = writeln!(query, "      expand(_all_)");
        }
        Projection::Fields(fields) => {
            for field in fields {
                let _ = writeln!(query, "      {field}");
            }
        }
    }
    let _ = writeln!(query, "    }}");
    let _ = writeln!(query, "  }}");
    query.push('}');

    DqlRequest { query, vars }
}

/// Decode the response of a rendered traversal into nodes, in response
/// order.
///
/// Accepts both `{"q": [...]}` and the same object wrapped in `"data"`.
/// A missing parent or a parent without the edge decodes to no nodes.
/// A non-empty top-level `errors` list is the store refusing the query and
/// becomes `StoreUnavailable` carrying the store's messages.
pub fn decode(response: &serde_json::Value, edge: &str) -> Result<Vec<Node>> {
    if let Some(message) = store_errors(response) {
        return Err(Error::StoreUnavailable(message));
    }
    let body = response.get("data").unwrap_or(response);
    let Some(roots) = body.get(ROOT_BLOCK) else {
        return Err(Error::Decode(format!("response has no `{ROOT_BLOCK}` block")));
    };
    let roots = roots
        .as_array()
        .ok_or_else(|| Error::Decode(format!("`{ROOT_BLOCK}` is not a list")))?;

    let mut nodes = Vec::new();
    for root in roots {
        match root.get(edge) {
            None | Some(serde_json::Value::Null) => {}
            // single-valued uid predicates come back as an object
            Some(obj @ serde_json::Value::Object(_)) => nodes.push(decode_node(obj)?),
            Some(serde_json::Value::Array(children)) => {
                for child in children {
                    nodes.push(decode_node(child)?);
                }
            }
            Some(other) => {
                return Err(Error::Decode(format!("edge `{edge}` holds a scalar: {other}")));
            }
        }
    }
    Ok(nodes)
}

fn store_errors(response: &serde_json::Value) -> Option<String> {
    let errors = response.get("errors")?.as_array()?;
    if errors.is_empty() {
        return None;
    }
    let messages: Vec<String> = errors
        .iter()
        .map(|e| match e.get("message").and_then(|m| m.as_str()) {
            Some(m) => m.to_string(),
            None => e.to_string(),
        })
        .collect();
    Some(messages.join("; "))
}

fn decode_node(raw: &serde_json::Value) -> Result<Node> {
    let obj = raw
        .as_object()
        .ok_or_else(|| Error::Decode(format!("expected node object, got {raw}")))?;

    let uid = obj
        .get("uid")
        .and_then(|u| u.as_str())
        .ok_or_else(|| Error::Decode("node without uid".into()))?;

    let types = match obj.get(TYPE_PREDICATE) {
        Some(serde_json::Value::Array(ts)) => {
            ts.iter().filter_map(|t| t.as_str().map(str::to_string)).collect()
        }
        Some(serde_json::Value::String(t)) => vec![t.clone()],
        _ => Vec::new(),
    };

    let mut properties = PropertyMap::with_capacity(obj.len());
    for (key, value) in obj {
        if key == "uid" || key == TYPE_PREDICATE || holds_nodes(value) {
            continue;
        }
        let value: Value = serde_json::from_value(value.clone())?;
        properties.insert(key.clone(), value);
    }

    Ok(Node { uid: Uid::new(uid), types, properties })
}

/// Nested node objects are edges, not properties.
fn holds_nodes(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Object(_) => true,
        serde_json::Value::Array(items) => items.iter().any(|i| i.is_object()),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{FilterSpec, FilterTuple, FilterValue};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn connection_filters() -> FilterSpec {
        [
            FilterTuple::new("src_port", FilterValue::Str("80".into())),
            FilterTuple::new("created_timestamp", FilterValue::Int(1_000)),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_render_with_filters_and_first() {
        let q = TraversalQuery::new(Uid::from("0x1"), "connected_to", connection_filters())
            .unwrap()
            .with_first(1);
        let req = q.to_dql();

        let expected = "\
query expand($parent: string, $f0: string, $f1: int) {
  q(func: uid($parent)) {
    connected_to (first: 1) @filter(eq(src_port, $f0) AND eq(created_timestamp, $f1)) {
      uid
      dgraph.type
      expand(_all_)
    }
  }
}";
        assert_eq!(req.query, expected);
        assert_eq!(req.vars.get("$parent").map(String::as_str), Some("0x1"));
        assert_eq!(req.vars.get("$f0").map(String::as_str), Some("80"));
        assert_eq!(req.vars.get("$f1").map(String::as_str), Some("1000"));
    }

    #[test]
    fn test_render_without_filters() {
        let q = TraversalQuery::new(Uid::from("0x1"), "children", FilterSpec::new()).unwrap();
        let req = q.to_dql();
        assert!(req.query.starts_with("query expand($parent: string) {"));
        assert!(req.query.contains("    children {\n"));
        assert!(!req.query.contains("@filter"));
        assert_eq!(req.vars.len(), 1);
    }

    #[test]
    fn test_values_never_reach_query_text() {
        let hostile = r#"80") OR has(password) OR eq(x, ""#;
        let filters: FilterSpec =
            [FilterTuple::new("src_port", FilterValue::Str(hostile.into()))].into_iter().collect();
        let q = TraversalQuery::new(Uid::from("0x1 } evil"), "connected_to", filters).unwrap();
        let req = q.to_dql();

        assert!(!req.query.contains("password"));
        assert!(!req.query.contains("evil"));
        assert_eq!(req.vars.get("$f0").map(String::as_str), Some(hostile));
    }

    #[test]
    fn test_render_projection() {
        let q = TraversalQuery::new(Uid::from("0x1"), "bin_file", FilterSpec::new())
            .unwrap()
            .with_projection(Projection::Fields(vec!["file_path".into(), "md5_hash".into()]));
        let req = q.to_dql();
        assert!(req.query.contains("      file_path\n      md5_hash\n"));
        assert!(!req.query.contains("expand(_all_)"));
    }

    #[test]
    fn test_request_body_shape() {
        let q = TraversalQuery::new(Uid::from("0x1"), "children", FilterSpec::new()).unwrap();
        let body = serde_json::to_value(q.to_dql()).unwrap();
        assert_eq!(body["variables"]["$parent"], "0x1");
        assert!(body["query"].as_str().unwrap().contains("uid($parent)"));
    }

    #[test]
    fn test_decode_list_edge() {
        let resp = json!({
            "q": [{
                "connected_to": [
                    {"uid": "0x2", "dgraph.type": ["NetworkConnection"], "src_port": "80", "created_timestamp": 10},
                    {"uid": "0x3", "dgraph.type": ["NetworkConnection"], "src_port": "80"}
                ]
            }]
        });
        let nodes = decode(&resp, "connected_to").unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].uid, Uid::from("0x2"));
        assert!(nodes[0].has_type("NetworkConnection"));
        assert_eq!(nodes[0].get("created_timestamp"), Some(&Value::Int(10)));
        assert_eq!(nodes[1].uid, Uid::from("0x3"));
    }

    #[test]
    fn test_decode_single_object_edge_and_data_wrapper() {
        let resp = json!({"data": {"q": [{"bin_file": {"uid": "0x7", "file_path": "/bin/sh"}}]}});
        let nodes = decode(&resp, "bin_file").unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].get("file_path"), Some(&Value::from("/bin/sh")));
    }

    #[test]
    fn test_decode_no_matches() {
        assert!(decode(&json!({"q": []}), "children").unwrap().is_empty());
        assert!(decode(&json!({"q": [{}]}), "children").unwrap().is_empty());
    }

    #[test]
    fn test_decode_skips_nested_edges() {
        let resp = json!({"q": [{"children": [
            {"uid": "0x4", "process_id": 5, "children": [{"uid": "0x5"}]}
        ]}]});
        let nodes = decode(&resp, "children").unwrap();
        assert!(nodes[0].get("children").is_none());
        assert_eq!(nodes[0].get("process_id"), Some(&Value::Int(5)));
    }

    #[test]
    fn test_decode_rejects_bad_shapes() {
        assert!(matches!(decode(&json!({}), "children"), Err(Error::Decode(_))));
        assert!(matches!(
            decode(&json!({"q": [{"children": [{"process_id": 1}]}]}), "children"),
            Err(Error::Decode(_))
        ));
    }

    #[test]
    fn test_decode_store_errors() {
        let resp = json!({
            "errors": [
                {"message": "predicate connected_to not indexed"},
                {"message": "query aborted", "extensions": {"code": "ErrorInvalidRequest"}}
            ],
            "data": null
        });
        let err = decode(&resp, "connected_to").unwrap_err();
        assert!(matches!(
            err,
            Error::StoreUnavailable(ref msg) if msg == "predicate connected_to not indexed; query aborted"
        ));

        let resp = json!({"errors": [], "data": {"q": []}});
        assert!(decode(&resp, "connected_to").unwrap().is_empty());
    }
}
