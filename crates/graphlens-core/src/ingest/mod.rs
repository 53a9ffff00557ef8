//! Ingestion normalizer: format-specific input → [`CanonicalGraph`].
//!
//! # Overview
//!
//! ```text
//! raw bytes ──► tabular / json / graphml parser
//!                    │  (IdentifierMap: external id → canonical id)
//!                    ▼
//!               GraphBuilder ──► Ingestion { graph, warnings }
//! ```
//!
//! Parsers are lenient: a dangling edge, a node without an id or a row with
//! an empty endpoint cell is dropped and recorded as an [`IngestWarning`].
//! Only a missing source/target schema, an unknown format or malformed input
//! fails the whole call.
//!
//! ## Privacy
//!
//! The [`IdentifierMap`] lives inside the [`GraphBuilder`] and is dropped by
//! [`GraphBuilder::finish`]. Warnings carry row and element positions, never
//! identifiers, so no external id escapes an anonymizing ingestion.

pub mod anonymize;
pub mod graphml;
pub mod json;
pub mod tabular;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::config::IngestConfig;
use crate::error::IngestError;
use crate::exchange;
use crate::graph::{
    CanonicalGraph, DEFAULT_GROUP, EDGE_RESERVED_KEYS, Edge, NODE_RESERVED_KEYS, Node, Properties,
    escape_reserved,
};

pub use anonymize::{IdentifierMap, anonymize_id};

/// Supported input formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputFormat {
    /// Delimited edge list with a source/target column pair.
    Tabular,
    /// `{ "nodes": [...], "edges" | "links": [...] }`.
    Json,
    GraphMl,
}

impl InputFormat {
    /// Resolve the format from a file extension.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::UnsupportedFormat`] for unknown extensions.
    pub fn from_path(path: &Path) -> Result<Self, IngestError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "csv" => Ok(Self::Tabular),
            "json" => Ok(Self::Json),
            "graphml" | "xml" => Ok(Self::GraphMl),
            _ => Err(IngestError::UnsupportedFormat {
                source_name: path.display().to_string(),
                format: if ext.is_empty() { "<none>".into() } else { ext },
            }),
        }
    }
}

impl FromStr for InputFormat {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" | "tabular" => Ok(Self::Tabular),
            "json" => Ok(Self::Json),
            "graphml" | "xml" => Ok(Self::GraphMl),
            other => Err(IngestError::UnsupportedFormat {
                source_name: "<input>".into(),
                format: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Tabular => "csv",
            Self::Json => "json",
            Self::GraphMl => "graphml",
        })
    }
}

/// Tabular column-name overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMapping {
    pub node_id_field: String,
    pub node_label_field: String,
    pub source_field: String,
    pub target_field: String,
    pub weight_field: String,
}

impl Default for FieldMapping {
    fn default() -> Self {
        Self::from(&IngestConfig::default())
    }
}

impl From<&IngestConfig> for FieldMapping {
    fn from(cfg: &IngestConfig) -> Self {
        Self {
            node_id_field: cfg.node_id_field.clone(),
            node_label_field: cfg.node_label_field.clone(),
            source_field: cfg.source_field.clone(),
            target_field: cfg.target_field.clone(),
            weight_field: cfg.weight_field.clone(),
        }
    }
}

/// Something dropped during an otherwise successful ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IngestWarning {
    /// A tabular data row (1-based, header excluded) produced no edge.
    SkippedRow { row: usize, reason: &'static str },
    /// A node element (0-based position in its list) was ignored.
    SkippedNode { index: usize, reason: &'static str },
    /// An edge element (0-based position in its list) was ignored.
    DroppedEdge { index: usize, reason: &'static str },
}

/// Result of one successful ingestion.
#[derive(Debug, Clone)]
pub struct Ingestion {
    pub graph: CanonicalGraph,
    pub warnings: Vec<IngestWarning>,
    /// Interchange artifact written for downstream consumers, if configured.
    pub output_path: Option<PathBuf>,
}

/// Per-file outcome of [`Normalizer::normalize_files`].
#[derive(Debug)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub result: Result<Ingestion, IngestError>,
}

/// Accumulates nodes and edges while resolving ids through the map.
pub(crate) struct GraphBuilder {
    ids: IdentifierMap,
    graph: CanonicalGraph,
    warnings: Vec<IngestWarning>,
}

impl GraphBuilder {
    pub(crate) fn new(ids: IdentifierMap) -> Self {
        Self {
            ids,
            graph: CanonicalGraph::new(),
            warnings: Vec::new(),
        }
    }

    /// Materialize a node once; later calls for the same external id only
    /// merge properties.
    pub(crate) fn node(
        &mut self,
        external: &str,
        label: Option<String>,
        group: i64,
        properties: Properties,
    ) -> String {
        let id = self.ids.resolve(external);
        if self.graph.position(&id).is_none() {
            let label = label.unwrap_or_else(|| {
                if self.ids.is_anonymizing() {
                    anonymize::default_anonymous_label(&id)
                } else {
                    id.clone()
                }
            });
            let mut node = Node::new(id.clone()).with_label(label).with_group(group);
            node.properties = escape_reserved(properties, NODE_RESERVED_KEYS);
            self.graph.add_node(node);
        } else if !properties.is_empty() {
            let mut merge = Node::new(id.clone());
            merge.properties = escape_reserved(properties, NODE_RESERVED_KEYS);
            self.graph.add_node(merge);
        }
        id
    }

    /// Add an edge between two external ids that must already be nodes.
    pub(crate) fn edge(
        &mut self,
        index: usize,
        source: &str,
        target: &str,
        weight: f64,
        properties: Properties,
    ) {
        let (Some(s), Some(t)) = (self.ids.get(source), self.ids.get(target)) else {
            self.drop_edge(index, "endpoint not in node list");
            return;
        };
        let mut edge = Edge::new(s, t).with_weight(weight);
        edge.properties = escape_reserved(properties, EDGE_RESERVED_KEYS);
        if self.graph.add_edge(edge).is_err() {
            self.drop_edge(index, "endpoint not in node list");
        }
    }

    pub(crate) fn drop_edge(&mut self, index: usize, reason: &'static str) {
        warn!(index, reason, "dropping edge");
        self.warnings.push(IngestWarning::DroppedEdge { index, reason });
    }

    pub(crate) fn skip_node(&mut self, index: usize, reason: &'static str) {
        warn!(index, reason, "skipping node");
        self.warnings.push(IngestWarning::SkippedNode { index, reason });
    }

    pub(crate) fn skip_row(&mut self, row: usize, reason: &'static str) {
        warn!(row, reason, "skipping row");
        self.warnings.push(IngestWarning::SkippedRow { row, reason });
    }

    /// Discard the identifier map and hand back the graph.
    pub(crate) fn finish(self) -> (CanonicalGraph, Vec<IngestWarning>) {
        (self.graph, self.warnings)
    }
}

/// Coerce a JSON or GraphML group value to an integer tag.
pub(crate) fn coerce_group(value: Option<&serde_json::Value>) -> i64 {
    match value {
        Some(serde_json::Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(truncate_f64))
            .unwrap_or(DEFAULT_GROUP),
        Some(serde_json::Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .ok()
            .or_else(|| s.trim().parse::<f64>().ok().map(truncate_f64))
            .unwrap_or(DEFAULT_GROUP),
        Some(serde_json::Value::Bool(b)) => i64::from(*b),
        _ => DEFAULT_GROUP,
    }
}

#[allow(clippy::cast_possible_truncation)]
const fn truncate_f64(v: f64) -> i64 {
    v as i64
}

/// Coerce a weight value; anything non-numeric falls back to 1.0.
pub(crate) fn coerce_weight(value: Option<&serde_json::Value>) -> f64 {
    let parsed = match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .filter(|w| w.is_finite())
        .unwrap_or(crate::graph::DEFAULT_WEIGHT)
}

/// Render an id value (string or number) as a string.
pub(crate) fn id_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Normalize raw input into a canonical graph.
///
/// The identifier map is created for this call and discarded before return.
///
/// # Errors
///
/// Returns [`IngestError::SchemaMismatch`] when mandatory fields are absent
/// and [`IngestError::Parse`] when the input is malformed.
pub fn normalize(
    raw_input: &str,
    format: InputFormat,
    field_mapping: &FieldMapping,
    anonymize: bool,
    skip_header: bool,
) -> Result<CanonicalGraph, IngestError> {
    let cfg = IngestConfig {
        node_id_field: field_mapping.node_id_field.clone(),
        node_label_field: field_mapping.node_label_field.clone(),
        source_field: field_mapping.source_field.clone(),
        target_field: field_mapping.target_field.clone(),
        weight_field: field_mapping.weight_field.clone(),
        anonymize,
        skip_header,
        ..IngestConfig::default()
    };
    Normalizer::new(cfg)
        .normalize("<input>", raw_input, format)
        .map(|ing| ing.graph)
}

/// Configured ingestion entry point.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    config: IngestConfig,
}

impl Normalizer {
    #[must_use]
    pub const fn new(config: IngestConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub const fn config(&self) -> &IngestConfig {
        &self.config
    }

    fn identifier_map(&self) -> IdentifierMap {
        if self.config.anonymize {
            IdentifierMap::anonymizing(self.config.anonymize_salt.clone())
        } else {
            IdentifierMap::passthrough()
        }
    }

    /// Normalize an in-memory input. `source_name` only appears in errors.
    ///
    /// # Errors
    ///
    /// See [`normalize`].
    #[instrument(skip(self, raw), fields(bytes = raw.len()))]
    pub fn normalize(
        &self,
        source_name: &str,
        raw: &str,
        format: InputFormat,
    ) -> Result<Ingestion, IngestError> {
        let builder = GraphBuilder::new(self.identifier_map());
        let builder = match format {
            InputFormat::Tabular => tabular::parse(
                source_name,
                raw,
                &FieldMapping::from(&self.config),
                self.config.skip_header,
                builder,
            )?,
            InputFormat::Json => json::parse(source_name, raw, builder)?,
            InputFormat::GraphMl => graphml::parse(source_name, raw, builder)?,
        };
        let (graph, warnings) = builder.finish();

        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            warnings = warnings.len(),
            "normalized {source_name}"
        );

        Ok(Ingestion {
            graph,
            warnings,
            output_path: None,
        })
    }

    /// Read, detect the format of, and normalize one file. When
    /// `output_dir` is configured the graph is also written there as
    /// `<stem>_processed.json`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, its format is
    /// unsupported, or normalization fails.
    pub fn normalize_file(&self, path: &Path) -> Result<Ingestion, IngestError> {
        let format = InputFormat::from_path(path)?;
        let raw = std::fs::read_to_string(path).map_err(|source| IngestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut ingestion = self.normalize(&path.display().to_string(), &raw, format)?;

        if let Some(dir) = &self.config.output_dir {
            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("graph");
            let out = dir.join(format!("{stem}_processed.json"));
            exchange::write_file(&ingestion.graph, &out).map_err(|source| IngestError::Io {
                path: out.clone(),
                source,
            })?;
            info!(path = %out.display(), "wrote normalized graph");
            ingestion.output_path = Some(out);
        }

        Ok(ingestion)
    }

    /// Normalize several files independently; one failure never stops the
    /// others.
    pub fn normalize_files<P: AsRef<Path>>(&self, paths: &[P]) -> Vec<FileOutcome> {
        paths
            .iter()
            .map(|p| {
                let path = p.as_ref().to_path_buf();
                let result = self.normalize_file(&path);
                if let Err(err) = &result {
                    warn!(code = %err.code(), "ingestion failed: {err}");
                }
                FileOutcome { path, result }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_from_extension() {
        assert_eq!(InputFormat::from_path(Path::new("a.CSV")).unwrap(), InputFormat::Tabular);
        assert_eq!(InputFormat::from_path(Path::new("a.json")).unwrap(), InputFormat::Json);
        assert_eq!(InputFormat::from_path(Path::new("a.xml")).unwrap(), InputFormat::GraphMl);
        assert!(matches!(
            InputFormat::from_path(Path::new("a.xlsx")),
            Err(IngestError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn coerce_weight_falls_back() {
        assert!((coerce_weight(Some(&"2.5".into())) - 2.5).abs() < f64::EPSILON);
        assert!((coerce_weight(Some(&"heavy".into())) - 1.0).abs() < f64::EPSILON);
        assert!((coerce_weight(None) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn coerce_group_accepts_strings_and_floats() {
        assert_eq!(coerce_group(Some(&"3".into())), 3);
        assert_eq!(coerce_group(Some(&serde_json::json!(2.0))), 2);
        assert_eq!(coerce_group(Some(&serde_json::json!([1]))), DEFAULT_GROUP);
    }

    #[test]
    fn end_to_end_csv_triangle() {
        let raw = "source,target,weight\nA,B,1\nA,C,2\nB,C,1\n";
        let g = normalize(raw, InputFormat::Tabular, &FieldMapping::default(), false, true)
            .unwrap();
        assert_eq!(g.node_count(), 3);
        assert_eq!(g.edge_count(), 3);
        assert!(g.contains_edge("A", "C"));
    }

    #[test]
    fn batch_isolates_failures() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.csv");
        let bad = dir.path().join("bad.csv");
        let odd = dir.path().join("odd.txt");
        std::fs::write(&good, "source,target\nA,B\n").unwrap();
        std::fs::write(&bad, "from,to\nA,B\n").unwrap();
        std::fs::write(&odd, "whatever").unwrap();

        let out_dir = dir.path().join("out");
        std::fs::create_dir_all(&out_dir).unwrap();
        let normalizer = Normalizer::new(IngestConfig {
            anonymize: false,
            output_dir: Some(out_dir.clone()),
            ..IngestConfig::default()
        });

        let outcomes = normalizer.normalize_files(&[&good, &bad, &odd]);
        assert_eq!(outcomes.len(), 3);

        let ok = outcomes[0].result.as_ref().unwrap();
        assert_eq!(ok.graph.node_count(), 2);
        assert_eq!(ok.output_path.as_deref(), Some(out_dir.join("good_processed.json").as_path()));
        assert!(out_dir.join("good_processed.json").exists());

        assert!(matches!(outcomes[1].result, Err(IngestError::SchemaMismatch { .. })));
        assert!(matches!(outcomes[2].result, Err(IngestError::UnsupportedFormat { .. })));
    }
}
