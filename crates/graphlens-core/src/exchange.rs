//! Exchange format shared with downstream consumers and the snapshot store.
//!
//! ```json
//! { "nodes": [{ "id", "label", "group", ...props }],
//!   "edges": [{ "source", "target", "weight", ...props }] }
//! ```
//!
//! Reading goes through the attributed JSON parser without anonymization, so
//! `name`/`label`, `links`/`edges` and the other aliases are accepted here too.

use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::error::IngestError;
use crate::graph::{CanonicalGraph, Edge, Node};
use crate::ingest::{GraphBuilder, IdentifierMap, IngestWarning, json};

#[derive(Serialize)]
struct Document<'a> {
    nodes: &'a [Node],
    edges: &'a [Edge],
}

impl Serialize for CanonicalGraph {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Document {
            nodes: self.nodes(),
            edges: self.edges(),
        }
        .serialize(serializer)
    }
}

/// Serialize a graph to a JSON value.
///
/// # Errors
///
/// Fails only if a property value cannot be represented (non-string map keys).
pub fn to_value(graph: &CanonicalGraph) -> serde_json::Result<serde_json::Value> {
    serde_json::to_value(graph)
}

/// Serialize a graph to pretty-printed JSON.
///
/// # Errors
///
/// See [`to_value`].
pub fn to_string_pretty(graph: &CanonicalGraph) -> serde_json::Result<String> {
    serde_json::to_string_pretty(graph)
}

/// Write a graph to `path` in the exchange format, creating parent
/// directories as needed.
///
/// # Errors
///
/// Returns any I/O error from creating or writing the file.
pub fn write_file(graph: &CanonicalGraph, path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut out = BufWriter::new(std::fs::File::create(path)?);
    serde_json::to_writer_pretty(&mut out, graph)?;
    out.write_all(b"\n")?;
    out.flush()
}

/// Parse an exchange document. Ids are taken verbatim.
///
/// # Errors
///
/// Returns [`IngestError::Parse`] or [`IngestError::SchemaMismatch`] when the
/// document is not a graph.
pub fn from_json_str(
    source_name: &str,
    raw: &str,
) -> Result<(CanonicalGraph, Vec<IngestWarning>), IngestError> {
    let builder = json::parse(source_name, raw, GraphBuilder::new(IdentifierMap::passthrough()))?;
    Ok(builder.finish())
}

/// Read an exchange document from disk.
///
/// # Errors
///
/// Returns [`IngestError::Io`] when the file cannot be read, otherwise see
/// [`from_json_str`].
pub fn read_file(path: &Path) -> Result<CanonicalGraph, IngestError> {
    let raw = std::fs::read_to_string(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    from_json_str(&path.display().to_string(), &raw).map(|(g, _)| g)
}
