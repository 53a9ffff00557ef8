//! `graphlens metrics` and `graphlens centrality`.

use std::io::Write;

use clap::Args;
use graphlens_analysis::metrics::{PathMetrics, centrality_batch};
use graphlens_analysis::{CentralityAlgorithm, CentralityBatch, MetricSet, graph_metrics};
use graphlens_core::ErrorCode;
use tracing::warn;

use super::{Context, GraphArgs};
use crate::output::{OutputMode, fmt_f64, pretty_kv, pretty_section, render_mode};

#[derive(Args, Debug)]
pub struct MetricsArgs {
    #[command(flatten)]
    pub graph: GraphArgs,
}

#[derive(Args, Debug)]
pub struct CentralityArgs {
    #[command(flatten)]
    pub graph: GraphArgs,

    /// Algorithm to run; repeat for several. Defaults to all four.
    /// Unknown names resolve to degree.
    #[arg(short, long = "algorithm")]
    pub algorithms: Vec<String>,

    /// Nodes shown per algorithm in pretty/text output.
    #[arg(long, default_value_t = 10)]
    pub top: usize,
}

/// Execute `graphlens metrics`.
pub fn run_metrics(args: &MetricsArgs, output: OutputMode, ctx: &Context) -> anyhow::Result<()> {
    let g = ctx.load(&args.graph)?;
    if g.is_empty() {
        warn!(code = %ErrorCode::EmptyGraph, "graph is empty; all metrics are zero");
    }
    let m = graph_metrics(&g);
    render_mode(output, &m, render_metrics_text, render_metrics_pretty)
}

fn path_rows(m: &MetricSet) -> Vec<(&'static str, String)> {
    match &m.paths {
        Some(PathMetrics::Connected {
            diameter,
            average_shortest_path_length,
        }) => vec![
            ("diameter", diameter.to_string()),
            ("average_shortest_path_length", fmt_f64(*average_shortest_path_length)),
        ],
        Some(PathMetrics::LargestComponent {
            largest_component_size,
            largest_component_diameter,
            largest_component_avg_path,
        }) => vec![
            ("largest_component_size", largest_component_size.to_string()),
            ("largest_component_diameter", largest_component_diameter.to_string()),
            ("largest_component_avg_path", fmt_f64(*largest_component_avg_path)),
        ],
        None => Vec::new(),
    }
}

fn metric_rows(m: &MetricSet) -> Vec<(&'static str, String)> {
    let mut rows = vec![
        ("node_count", m.node_count.to_string()),
        ("edge_count", m.edge_count.to_string()),
        ("density", fmt_f64(m.density)),
        ("average_degree", fmt_f64(m.average_degree)),
        ("average_clustering", fmt_f64(m.average_clustering)),
        ("connected_components", m.connected_components.to_string()),
        ("is_connected", m.is_connected.to_string()),
        ("isolated_nodes", m.isolated_nodes.to_string()),
    ];
    rows.extend(path_rows(m));
    rows
}

fn render_metrics_text(m: &MetricSet, w: &mut dyn Write) -> std::io::Result<()> {
    for (key, value) in metric_rows(m) {
        writeln!(w, "{key}\t{value}")?;
    }
    Ok(())
}

fn render_metrics_pretty(m: &MetricSet, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, "Graph metrics")?;
    for (key, value) in metric_rows(m) {
        pretty_kv(w, key, value)?;
    }
    if m.node_count == 0 {
        writeln!(w, "note: graph is empty ({})", ErrorCode::EmptyGraph)?;
    }
    writeln!(w)?;
    pretty_section(w, "Degree distribution")?;
    for (degree, count) in &m.degree_distribution {
        pretty_kv(w, &degree.to_string(), count.to_string())?;
    }
    Ok(())
}

/// Execute `graphlens centrality`.
pub fn run_centrality(args: &CentralityArgs, output: OutputMode, ctx: &Context) -> anyhow::Result<()> {
    let g = ctx.load(&args.graph)?;
    let algorithms: Vec<CentralityAlgorithm> = if args.algorithms.is_empty() {
        CentralityAlgorithm::ALL.to_vec()
    } else {
        args.algorithms
            .iter()
            .map(|name| CentralityAlgorithm::resolve(name))
            .collect()
    };
    let batch = centrality_batch(&g, &algorithms, &ctx.config.analysis);
    let top = args.top;
    render_mode(
        output,
        &batch,
        |b, w| render_centrality_text(b, top, w),
        |b, w| render_centrality_pretty(b, top, w),
    )
}

fn render_centrality_text(b: &CentralityBatch, top: usize, w: &mut dyn Write) -> std::io::Result<()> {
    for result in &b.results {
        for (id, score) in result.top(top) {
            writeln!(w, "{}\t{id}\t{}", result.algorithm, fmt_f64(score))?;
        }
    }
    for missing in &b.unavailable {
        writeln!(w, "{}\tunavailable\t{}", missing.algorithm, missing.code)?;
    }
    Ok(())
}

fn render_centrality_pretty(b: &CentralityBatch, top: usize, w: &mut dyn Write) -> std::io::Result<()> {
    for result in &b.results {
        pretty_section(w, &format!("{} centrality (top {top})", result.algorithm))?;
        for (id, score) in result.top(top) {
            pretty_kv(w, id, fmt_f64(score))?;
        }
        writeln!(w)?;
    }
    for missing in &b.unavailable {
        writeln!(
            w,
            "{} centrality unavailable [{}]: {}",
            missing.algorithm, missing.code, missing.reason
        )?;
    }
    Ok(())
}
