//! Attributed JSON graph ingestion.
//!
//! Accepts `{ "nodes": [...], "edges": [...] }` (or `"links"`). The node list
//! is scanned once, then the edge list once. Endpoint keys are resolved per
//! edge: `source`/`target` when present, otherwise `from`/`to`.

use serde_json::{Map, Value};

use super::{GraphBuilder, coerce_group, coerce_weight, id_string};
use crate::error::IngestError;
use crate::graph::{EDGE_RESERVED_KEYS, NODE_RESERVED_KEYS, Properties};

fn rest(obj: &Map<String, Value>, reserved: &[&str]) -> Properties {
    obj.iter()
        .filter(|(k, _)| !reserved.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

fn label_of(obj: &Map<String, Value>) -> Option<String> {
    ["label", "name"].iter().find_map(|key| match obj.get(*key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Resolve one endpoint, preferring the primary key and falling back to the
/// alternate only when the primary key is absent.
fn endpoint(obj: &Map<String, Value>, primary: &str, alternate: &str) -> Option<String> {
    obj.get(primary)
        .or_else(|| obj.get(alternate))
        .and_then(id_string)
}

pub(crate) fn parse(
    source_name: &str,
    raw: &str,
    mut builder: GraphBuilder,
) -> Result<GraphBuilder, IngestError> {
    let root: Value = serde_json::from_str(raw).map_err(|e| IngestError::parse(source_name, e))?;
    let Value::Object(root) = root else {
        return Err(IngestError::parse(source_name, "top-level value is not an object"));
    };

    let nodes = root.get("nodes").and_then(Value::as_array);
    let edges = root
        .get("edges")
        .or_else(|| root.get("links"))
        .and_then(Value::as_array);
    let (Some(nodes), Some(edges)) = (nodes, edges) else {
        let mut missing = Vec::new();
        if nodes.is_none() {
            missing.push("nodes".to_string());
        }
        if edges.is_none() {
            missing.push("edges".to_string());
        }
        return Err(IngestError::SchemaMismatch {
            source_name: source_name.to_string(),
            missing,
        });
    };

    for (index, node) in nodes.iter().enumerate() {
        let Some(obj) = node.as_object() else {
            builder.skip_node(index, "node is not an object");
            continue;
        };
        let Some(id) = obj.get("id").and_then(id_string) else {
            builder.skip_node(index, "node has no id");
            continue;
        };
        let group = coerce_group(obj.get("group").or_else(|| obj.get("community")));
        builder.node(&id, label_of(obj), group, rest(obj, NODE_RESERVED_KEYS));
    }

    for (index, edge) in edges.iter().enumerate() {
        let Some(obj) = edge.as_object() else {
            builder.drop_edge(index, "edge is not an object");
            continue;
        };
        let (Some(source), Some(target)) = (
            endpoint(obj, "source", "from"),
            endpoint(obj, "target", "to"),
        ) else {
            builder.drop_edge(index, "edge has no source/target");
            continue;
        };
        let weight = coerce_weight(obj.get("weight").or_else(|| obj.get("value")));
        builder.edge(index, &source, &target, weight, rest(obj, EDGE_RESERVED_KEYS));
    }

    Ok(builder)
}
