//! Delimited edge-list ingestion.
//!
//! The node set is exactly the union of the non-empty values in the source
//! and target columns, materialized in first-seen order. A row's label cell
//! describes the node named in that row's `node_id_field` column; the first
//! non-empty label seen for a node is kept.
//!
//! With `skip_header` the first row names the columns. Without it every row
//! is data and each field resolves positionally: a numeric field name is a
//! 0-based column index, anything else falls back to the role's default
//! position (source 0, target 1, weight 2, label 3).
//!
//! Columns other than the mapped ones become string edge properties, so two
//! rows for the same pair that differ in those columns stay separate
//! relationships. A column named like a reserved edge key (`target`,
//! `weight`, ...) is kept as `attr_<name>`.

use std::collections::HashMap;

use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::debug;

use super::{FieldMapping, GraphBuilder};
use crate::error::IngestError;
use crate::graph::{DEFAULT_GROUP, DEFAULT_WEIGHT, Properties};

#[derive(Debug)]
struct Columns {
    source: usize,
    target: usize,
    node_id: usize,
    weight: Option<usize>,
    label: Option<usize>,
    /// Unmapped columns with their header names.
    extra: Vec<(usize, String)>,
}

impl Columns {
    fn from_header(
        source_name: &str,
        header: &StringRecord,
        mapping: &FieldMapping,
    ) -> Result<Self, IngestError> {
        let find = |name: &str| {
            header
                .iter()
                .position(|h| h == name)
                .or_else(|| header.iter().position(|h| h.eq_ignore_ascii_case(name)))
        };

        let source = find(&mapping.source_field);
        let target = find(&mapping.target_field);
        let (Some(source), Some(target)) = (source, target) else {
            let missing = [
                (source, &mapping.source_field),
                (target, &mapping.target_field),
            ]
            .into_iter()
            .filter(|(pos, _)| pos.is_none())
            .map(|(_, name)| name.clone())
            .collect();
            return Err(IngestError::SchemaMismatch {
                source_name: source_name.to_string(),
                missing,
            });
        };

        let node_id = find(&mapping.node_id_field).unwrap_or(source);
        let weight = find(&mapping.weight_field);
        let label = find(&mapping.node_label_field);

        let mapped = [Some(source), Some(target), Some(node_id), weight, label];
        let extra = header
            .iter()
            .enumerate()
            .filter(|(i, name)| !name.is_empty() && !mapped.contains(&Some(*i)))
            .map(|(i, name)| (i, name.to_string()))
            .collect();

        Ok(Self {
            source,
            target,
            node_id,
            weight,
            label,
            extra,
        })
    }

    fn positional(mapping: &FieldMapping) -> Self {
        let pos = |name: &str, default: usize| name.trim().parse::<usize>().unwrap_or(default);
        let source = pos(&mapping.source_field, 0);
        Self {
            source,
            target: pos(&mapping.target_field, 1),
            node_id: pos(&mapping.node_id_field, source),
            weight: Some(pos(&mapping.weight_field, 2)),
            label: Some(pos(&mapping.node_label_field, 3)),
            extra: Vec::new(),
        }
    }
}

fn cell(record: &StringRecord, idx: usize) -> Option<&str> {
    record.get(idx).filter(|s| !s.is_empty())
}

pub(crate) fn parse(
    source_name: &str,
    raw: &str,
    mapping: &FieldMapping,
    skip_header: bool,
    mut builder: GraphBuilder,
) -> Result<GraphBuilder, IngestError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(skip_header)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(raw.as_bytes());

    let columns = if skip_header {
        let header = reader
            .headers()
            .map_err(|e| IngestError::parse(source_name, e))?
            .clone();
        Columns::from_header(source_name, &header, mapping)?
    } else {
        Columns::positional(mapping)
    };
    debug!(?columns, "resolved tabular columns");

    let rows: Vec<StringRecord> = reader
        .records()
        .collect::<Result<_, _>>()
        .map_err(|e| IngestError::parse(source_name, e))?;

    // First label wins, so resolve them before materializing any node.
    let mut labels: HashMap<&str, &str> = HashMap::new();
    if let Some(label_col) = columns.label {
        for row in &rows {
            if let (Some(id), Some(label)) = (cell(row, columns.node_id), cell(row, label_col)) {
                labels.entry(id).or_insert(label);
            }
        }
    }

    for (i, row) in rows.iter().enumerate() {
        let row_no = i + 1;
        let source = cell(row, columns.source);
        let target = cell(row, columns.target);

        for id in [source, target].into_iter().flatten() {
            let label = labels.get(id).map(|l| (*l).to_string());
            builder.node(id, label, DEFAULT_GROUP, Properties::new());
        }

        let (Some(source), Some(target)) = (source, target) else {
            builder.skip_row(row_no, "empty source or target cell");
            continue;
        };

        let weight = columns
            .weight
            .and_then(|c| cell(row, c))
            .and_then(|w| w.parse::<f64>().ok())
            .filter(|w| w.is_finite())
            .unwrap_or(DEFAULT_WEIGHT);

        let properties: Properties = columns
            .extra
            .iter()
            .filter_map(|(c, name)| {
                cell(row, *c).map(|v| (name.clone(), serde_json::Value::String(v.to_string())))
            })
            .collect();

        builder.edge(row_no, source, target, weight, properties);
    }

    Ok(builder)
}
