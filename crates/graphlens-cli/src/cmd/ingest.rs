//! `graphlens ingest`: normalize input files, optionally storing snapshots.

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use graphlens_core::ingest::FileOutcome;
use graphlens_core::{IngestWarning, Normalizer};
use serde::Serialize;
use tracing::warn;

use super::Context;
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

#[derive(Args, Debug)]
pub struct IngestArgs {
    /// Input files (.csv, .json, .graphml, .xml).
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Directory for `<stem>_processed.json` artifacts.
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Also store each normalized graph as a snapshot named after its file.
    #[arg(long)]
    pub snapshot: bool,

    /// Keep external ids instead of anonymizing them.
    #[arg(long)]
    pub no_anonymize: bool,

    /// Treat the first tabular row as data, not a header.
    #[arg(long)]
    pub no_header: bool,

    /// Salt mixed into anonymized ids.
    #[arg(long)]
    pub salt: Option<String>,

    #[arg(long)]
    pub source_field: Option<String>,

    #[arg(long)]
    pub target_field: Option<String>,

    #[arg(long)]
    pub weight_field: Option<String>,

    /// Column holding the node id that `--label-field` describes.
    #[arg(long)]
    pub node_id_field: Option<String>,

    #[arg(long)]
    pub label_field: Option<String>,
}

#[derive(Debug, Serialize)]
struct FailureReport {
    code: &'static str,
    message: String,
}

#[derive(Debug, Serialize)]
struct FileReport {
    path: String,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    nodes: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    edges: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content_hash: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<IngestWarning>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    snapshot: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    failure: Option<FailureReport>,
}

#[derive(Debug, Serialize)]
struct IngestReport {
    succeeded: usize,
    failed: usize,
    files: Vec<FileReport>,
}

/// Execute `graphlens ingest`.
///
/// Every file is processed independently. The command fails only when no
/// file could be ingested.
pub fn run_ingest(args: &IngestArgs, output: OutputMode, ctx: &Context) -> anyhow::Result<()> {
    let mut config = ctx.config.ingest.clone();
    if args.no_anonymize {
        config.anonymize = false;
    }
    if args.no_header {
        config.skip_header = false;
    }
    if args.salt.is_some() {
        config.anonymize_salt.clone_from(&args.salt);
    }
    if args.out.is_some() {
        config.output_dir.clone_from(&args.out);
    }
    let overrides = [
        (&mut config.source_field, &args.source_field),
        (&mut config.target_field, &args.target_field),
        (&mut config.weight_field, &args.weight_field),
        (&mut config.node_id_field, &args.node_id_field),
        (&mut config.node_label_field, &args.label_field),
    ];
    for (field, value) in overrides {
        if let Some(value) = value {
            field.clone_from(value);
        }
    }

    let store = args.snapshot.then(|| ctx.snapshot_store());
    let outcomes = Normalizer::new(config).normalize_files(&args.files);

    let mut files = Vec::with_capacity(outcomes.len());
    for FileOutcome { path, result } in outcomes {
        let path_str = path.display().to_string();
        let report = match result {
            Ok(ingestion) => {
                let snapshot = match &store {
                    Some(store) => {
                        let id = path
                            .file_stem()
                            .and_then(|s| s.to_str())
                            .unwrap_or("graph");
                        Some(store.save(id, &ingestion.graph)?.id)
                    }
                    None => None,
                };
                FileReport {
                    path: path_str,
                    ok: true,
                    nodes: Some(ingestion.graph.node_count()),
                    edges: Some(ingestion.graph.edge_count()),
                    content_hash: Some(ingestion.graph.content_hash()),
                    warnings: ingestion.warnings,
                    output_path: ingestion.output_path.map(|p| p.display().to_string()),
                    snapshot,
                    failure: None,
                }
            }
            Err(err) => FileReport {
                path: path_str,
                ok: false,
                nodes: None,
                edges: None,
                content_hash: None,
                warnings: Vec::new(),
                output_path: None,
                snapshot: None,
                failure: Some(FailureReport {
                    code: err.code().code(),
                    message: err.to_string(),
                }),
            },
        };
        files.push(report);
    }

    let succeeded = files.iter().filter(|f| f.ok).count();
    let report = IngestReport {
        succeeded,
        failed: files.len() - succeeded,
        files,
    };
    if report.failed > 0 {
        warn!(failed = report.failed, succeeded, "some inputs could not be ingested");
    }
    render_mode(output, &report, render_text, render_pretty)?;

    if succeeded == 0 {
        anyhow::bail!("no input could be ingested ({} failed)", report.failed);
    }
    Ok(())
}

fn render_text(r: &IngestReport, w: &mut dyn Write) -> std::io::Result<()> {
    for f in &r.files {
        match &f.failure {
            None => writeln!(
                w,
                "ok\t{}\t{}\t{}\t{}",
                f.path,
                f.nodes.unwrap_or_default(),
                f.edges.unwrap_or_default(),
                f.warnings.len()
            )?,
            Some(fail) => writeln!(w, "failed\t{}\t{}\t{}", f.path, fail.code, fail.message)?,
        }
    }
    Ok(())
}

fn render_pretty(r: &IngestReport, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(
        w,
        &format!("Ingested {} of {} file(s)", r.succeeded, r.files.len()),
    )?;
    for f in &r.files {
        match &f.failure {
            None => {
                pretty_kv(
                    w,
                    &f.path,
                    format!(
                        "{} nodes, {} edges, {} warning(s)",
                        f.nodes.unwrap_or_default(),
                        f.edges.unwrap_or_default(),
                        f.warnings.len()
                    ),
                )?;
                if let Some(out) = &f.output_path {
                    writeln!(w, "  wrote {out}")?;
                }
                if let Some(id) = &f.snapshot {
                    writeln!(w, "  stored snapshot {id}")?;
                }
            }
            Some(fail) => pretty_kv(w, &f.path, format!("failed [{}] {}", fail.code, fail.message))?,
        }
    }
    Ok(())
}
