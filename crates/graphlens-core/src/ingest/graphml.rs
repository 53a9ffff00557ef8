//! GraphML ingestion.
//!
//! `<key>` declarations map `<data key="...">` entries to attribute names and
//! types; `<default>` values apply to elements that omit the key. Node
//! `label`/`name` and `group`/`community`, and edge `weight`/`value` are
//! interpreted; every other attribute becomes a typed property. Edge
//! direction is ignored.
//!
//! The whole document is read before the graph is built, so edges may appear
//! before the nodes they reference.

use std::collections::HashMap;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use serde_json::Value;

use super::{GraphBuilder, coerce_group, coerce_weight};
use crate::error::IngestError;
use crate::graph::Properties;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Domain {
    Node,
    Edge,
    Any,
}

#[derive(Debug, Clone)]
struct KeyDecl {
    name: String,
    domain: Domain,
    kind: String,
    default: Option<String>,
}

#[derive(Debug, Default)]
struct Element {
    id: Option<String>,
    source: Option<String>,
    target: Option<String>,
    data: HashMap<String, String>,
}

#[derive(Debug)]
enum Open {
    Key(String),
    Default { key: String, text: String },
    Node(Element),
    Edge(Element),
    Data { key: String, text: String },
}

impl Open {
    const fn tag(&self) -> &'static [u8] {
        match self {
            Self::Key(_) => b"key",
            Self::Default { .. } => b"default",
            Self::Node(_) => b"node",
            Self::Edge(_) => b"edge",
            Self::Data { .. } => b"data",
        }
    }
}

fn attr(
    source_name: &str,
    e: &BytesStart<'_>,
    wanted: &[u8],
) -> Result<Option<String>, IngestError> {
    for a in e.attributes() {
        let a = a.map_err(|err| IngestError::parse(source_name, err))?;
        if a.key.local_name().as_ref() == wanted {
            let v = a
                .unescape_value()
                .map_err(|err| IngestError::parse(source_name, err))?;
            return Ok(Some(v.into_owned()));
        }
    }
    Ok(None)
}

fn typed(kind: &str, raw: &str) -> Value {
    let raw = raw.trim();
    match kind {
        "int" | "long" => raw.parse::<i64>().map_or_else(|_| raw.into(), Value::from),
        "float" | "double" => raw
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map_or_else(|| raw.into(), Value::Number),
        "boolean" => match raw.to_ascii_lowercase().as_str() {
            "true" | "1" => Value::Bool(true),
            "false" | "0" => Value::Bool(false),
            _ => raw.into(),
        },
        _ => raw.into(),
    }
}

struct Document {
    keys: HashMap<String, KeyDecl>,
    nodes: Vec<Element>,
    edges: Vec<Element>,
}

impl Document {
    /// Resolve an element's data into named, typed attributes with defaults.
    fn attributes(&self, el: &Element, domain: Domain) -> HashMap<String, Value> {
        let mut out = HashMap::new();
        for decl in self.keys.values() {
            if decl.domain != domain && decl.domain != Domain::Any {
                continue;
            }
            if let Some(default) = &decl.default {
                out.insert(decl.name.clone(), typed(&decl.kind, default));
            }
        }
        for (key, raw) in &el.data {
            match self.keys.get(key) {
                Some(decl) => out.insert(decl.name.clone(), typed(&decl.kind, raw)),
                None => out.insert(key.clone(), Value::from(raw.trim())),
            };
        }
        out
    }
}

fn read_document(source_name: &str, raw: &str) -> Result<Document, IngestError> {
    let mut reader = Reader::from_str(raw);
    reader.trim_text(true);

    let mut doc = Document {
        keys: HashMap::new(),
        nodes: Vec::new(),
        edges: Vec::new(),
    };
    let mut stack: Vec<Open> = Vec::new();
    let mut saw_graph = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| IngestError::parse(source_name, e))?;
        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let empty = matches!(event, Event::Empty(_));
                let opened = match e.local_name().as_ref() {
                    b"graph" => {
                        saw_graph = true;
                        None
                    }
                    b"key" => {
                        let id = attr(source_name, e, b"id")?.unwrap_or_default();
                        let name =
                            attr(source_name, e, b"attr.name")?.unwrap_or_else(|| id.clone());
                        let domain = match attr(source_name, e, b"for")?.as_deref() {
                            Some("node") => Domain::Node,
                            Some("edge") => Domain::Edge,
                            _ => Domain::Any,
                        };
                        let kind = attr(source_name, e, b"attr.type")?
                            .unwrap_or_else(|| "string".to_string());
                        doc.keys.insert(
                            id.clone(),
                            KeyDecl {
                                name,
                                domain,
                                kind,
                                default: None,
                            },
                        );
                        Some(Open::Key(id))
                    }
                    b"default" => match stack.last() {
                        Some(Open::Key(id)) => Some(Open::Default {
                            key: id.clone(),
                            text: String::new(),
                        }),
                        _ => None,
                    },
                    b"node" => Some(Open::Node(Element {
                        id: attr(source_name, e, b"id")?,
                        ..Element::default()
                    })),
                    b"edge" => Some(Open::Edge(Element {
                        source: attr(source_name, e, b"source")?,
                        target: attr(source_name, e, b"target")?,
                        ..Element::default()
                    })),
                    b"data" => Some(Open::Data {
                        key: attr(source_name, e, b"key")?.unwrap_or_default(),
                        text: String::new(),
                    }),
                    _ => None,
                };
                if let Some(open) = opened {
                    if empty {
                        close(&mut doc, &mut stack, open);
                    } else {
                        stack.push(open);
                    }
                }
            }
            Event::Text(t) => {
                let text = t
                    .unescape()
                    .map_err(|e| IngestError::parse(source_name, e))?;
                append_text(&mut stack, &text);
            }
            Event::CData(t) => {
                let text = String::from_utf8_lossy(&t.into_inner()).into_owned();
                append_text(&mut stack, &text);
            }
            Event::End(ref e) => {
                let closes_top = stack
                    .last()
                    .is_some_and(|top| top.tag() == e.local_name().as_ref());
                if closes_top {
                    if let Some(open) = stack.pop() {
                        close(&mut doc, &mut stack, open);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_graph {
        return Err(IngestError::SchemaMismatch {
            source_name: source_name.to_string(),
            missing: vec!["graph".to_string()],
        });
    }
    Ok(doc)
}

fn append_text(stack: &mut [Open], text: &str) {
    match stack.last_mut() {
        Some(Open::Data { text: buf, .. } | Open::Default { text: buf, .. }) => buf.push_str(text),
        _ => {}
    }
}

fn close(doc: &mut Document, stack: &mut [Open], open: Open) {
    match open {
        Open::Key(_) => {}
        Open::Default { key, text } => {
            if let Some(decl) = doc.keys.get_mut(&key) {
                decl.default = Some(text);
            }
        }
        Open::Node(el) => doc.nodes.push(el),
        Open::Edge(el) => doc.edges.push(el),
        Open::Data { key, text } => match stack.last_mut() {
            Some(Open::Node(el) | Open::Edge(el)) => {
                el.data.insert(key, text);
            }
            _ => {}
        },
    }
}

fn take_string(attrs: &mut HashMap<String, Value>, keys: &[&str]) -> Option<String> {
    let mut found = None;
    for key in keys {
        if let Some(v) = attrs.remove(*key) {
            if found.is_none() {
                found = match v {
                    Value::String(s) if !s.is_empty() => Some(s),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                };
            }
        }
    }
    found
}

fn take_value(attrs: &mut HashMap<String, Value>, keys: &[&str]) -> Option<Value> {
    let mut found = None;
    for key in keys {
        if let Some(v) = attrs.remove(*key) {
            found.get_or_insert(v);
        }
    }
    found
}

pub(crate) fn parse(
    source_name: &str,
    raw: &str,
    mut builder: GraphBuilder,
) -> Result<GraphBuilder, IngestError> {
    let doc = read_document(source_name, raw)?;

    for (index, el) in doc.nodes.iter().enumerate() {
        let Some(id) = el.id.as_deref().filter(|s| !s.is_empty()) else {
            builder.skip_node(index, "node has no id");
            continue;
        };
        let mut attrs = doc.attributes(el, Domain::Node);
        let label = take_string(&mut attrs, &["label", "name"]);
        let group = coerce_group(take_value(&mut attrs, &["group", "community"]).as_ref());
        let properties: Properties = attrs.into_iter().collect();
        builder.node(id, label, group, properties);
    }

    for (index, el) in doc.edges.iter().enumerate() {
        let (Some(source), Some(target)) = (el.source.as_deref(), el.target.as_deref()) else {
            builder.drop_edge(index, "edge has no source/target");
            continue;
        };
        let mut attrs = doc.attributes(el, Domain::Edge);
        let weight = coerce_weight(take_value(&mut attrs, &["weight", "value"]).as_ref());
        let properties: Properties = attrs.into_iter().collect();
        builder.edge(index, source, target, weight, properties);
    }

    Ok(builder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::{IdentifierMap, IngestWarning};

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<graphml xmlns="http://graphml.graphdrawing.org/xmlns">
  <key id="d0" for="node" attr.name="label" attr.type="string"/>
  <key id="d1" for="node" attr.name="group" attr.type="int">
    <default>7</default>
  </key>
  <key id="d2" for="edge" attr.name="weight" attr.type="double"/>
  <key id="d3" for="node" attr.name="active" attr.type="boolean"/>
  <graph id="G" edgedefault="directed">
    <edge source="n0" target="n1"><data key="d2">2.5</data></edge>
    <node id="n0"><data key="d0">Alice</data><data key="d1">3</data></node>
    <node id="n1"><data key="d3">true</data></node>
    <node id="n2"/>
    <edge source="n1" target="n2"/>
    <edge source="n2" target="n9"/>
  </graph>
</graphml>"#;

    fn run(raw: &str) -> Result<GraphBuilder, IngestError> {
        parse("test.graphml", raw, GraphBuilder::new(IdentifierMap::passthrough()))
    }

    #[test]
    fn reads_keys_defaults_and_edges() {
        let (g, warnings) = run(SAMPLE).unwrap().finish();

        assert_eq!(g.node_count(), 3);
        assert_eq!(g.edge_count(), 2);

        let n0 = g.node("n0").unwrap();
        assert_eq!(n0.label, "Alice");
        assert_eq!(n0.group, 3);

        let n1 = g.node("n1").unwrap();
        assert_eq!(n1.group, 7, "key default applies");
        assert_eq!(n1.properties.get("active"), Some(&Value::Bool(true)));

        assert!((g.edges()[0].weight - 2.5).abs() < f64::EPSILON);
        assert!(g.contains_edge("n1", "n0"), "direction is ignored");

        assert_eq!(
            warnings,
            vec![IngestWarning::DroppedEdge {
                index: 2,
                reason: "endpoint not in node list"
            }]
        );
    }

    #[test]
    fn missing_graph_element_is_schema_mismatch() {
        assert!(matches!(
            run("<graphml></graphml>"),
            Err(IngestError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn malformed_xml_is_parse_error() {
        assert!(matches!(
            run("<graphml><graph><node id=\"a\"></graph>"),
            Err(IngestError::Parse { .. })
        ));
    }
}
