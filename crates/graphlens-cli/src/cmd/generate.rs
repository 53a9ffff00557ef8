//! `graphlens generate`: synthesize a random graph.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context as _;
use clap::Args;
use graphlens_core::generate::{DEFAULT_REWIRING, RandomGraphParams, RandomModel, generate};
use graphlens_core::exchange;
use serde::Serialize;

use super::Context;
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// erdos_renyi (random), barabasi_albert (scale_free) or
    /// watts_strogatz (small_world).
    #[arg(short, long, default_value = "erdos_renyi")]
    pub model: String,

    #[arg(short, long, default_value_t = 50)]
    pub nodes: usize,

    /// Edge probability, or attachment/neighbourhood size as a fraction of
    /// the node count.
    #[arg(short, long, default_value_t = 0.1)]
    pub density: f64,

    /// Watts–Strogatz rewiring probability.
    #[arg(long, default_value_t = DEFAULT_REWIRING)]
    pub rewiring: f64,

    #[arg(long)]
    pub seed: Option<u64>,

    /// Write the graph here. Without it (and without `--snapshot`), the
    /// exchange document goes to stdout.
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Store the graph as a snapshot with this id.
    #[arg(long)]
    pub snapshot: Option<String>,
}

#[derive(Debug, Serialize)]
struct GenerateReport {
    model: String,
    nodes: usize,
    edges: usize,
    content_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    snapshot: Option<String>,
}

/// Execute `graphlens generate`.
pub fn run_generate(args: &GenerateArgs, output: OutputMode, ctx: &Context) -> anyhow::Result<()> {
    let model: RandomModel = args.model.parse()?;
    let mut params =
        RandomGraphParams::new(model, args.nodes, args.density).with_rewiring(args.rewiring);
    if let Some(seed) = args.seed {
        params = params.with_seed(seed);
    }
    let g = generate(&params)?;

    if args.out.is_none() && args.snapshot.is_none() {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        serde_json::to_writer_pretty(&mut out, &g)?;
        writeln!(out)?;
        return Ok(());
    }

    if let Some(path) = &args.out {
        exchange::write_file(&g, path).with_context(|| format!("writing {}", path.display()))?;
    }
    let snapshot = match &args.snapshot {
        Some(id) => Some(ctx.snapshot_store().save(id, &g)?.id),
        None => None,
    };

    let report = GenerateReport {
        model: model.to_string(),
        nodes: g.node_count(),
        edges: g.edge_count(),
        content_hash: g.content_hash(),
        path: args.out.as_ref().map(|p| p.display().to_string()),
        snapshot,
    };
    render_mode(
        output,
        &report,
        |r, w| writeln!(w, "{}\t{}\t{}", r.model, r.nodes, r.edges),
        |r, w| {
            pretty_section(w, "Generated graph")?;
            pretty_kv(w, "model", &r.model)?;
            pretty_kv(w, "nodes", r.nodes.to_string())?;
            pretty_kv(w, "edges", r.edges.to_string())?;
            pretty_kv(w, "content hash", &r.content_hash)?;
            if let Some(p) = &r.path {
                pretty_kv(w, "written to", p)?;
            }
            if let Some(id) = &r.snapshot {
                pretty_kv(w, "snapshot", id)?;
            }
            Ok(())
        },
    )
}
