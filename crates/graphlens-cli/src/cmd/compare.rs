//! `graphlens compare`: diff two graphs.

use std::io::Write;

use anyhow::Context as _;
use clap::Args;
use graphlens_analysis::compare::MetricDelta;
use graphlens_analysis::{CommunityEngine, Comparator, ComparisonResult};
use graphlens_core::CanonicalGraph;

use super::Context;
use super::communities::resolve_algorithm;
use crate::output::{OutputMode, fmt_f64, pretty_kv, pretty_section, render_mode};

#[derive(Args, Debug)]
pub struct CompareArgs {
    /// Older graph: input file or snapshot id.
    pub before: String,

    /// Newer graph: input file or snapshot id.
    pub after: String,

    /// Community algorithm used on both sides.
    #[arg(short, long)]
    pub algorithm: Option<String>,

    /// Anonymize node ids while reading raw input files.
    #[arg(long)]
    pub anonymize: bool,
}

/// Execute `graphlens compare`.
pub fn run_compare(args: &CompareArgs, output: OutputMode, ctx: &Context) -> anyhow::Result<()> {
    let before = ctx.load_graph(&args.before, args.anonymize)?;
    let after = ctx.load_graph(&args.after, args.anonymize)?;
    compare_and_render(ctx, &before, &after, args.algorithm.as_deref(), output)
}

/// Shared with `snapshots compare-latest`.
pub fn compare_and_render(
    ctx: &Context,
    before: &CanonicalGraph,
    after: &CanonicalGraph,
    algorithm: Option<&str>,
    output: OutputMode,
) -> anyhow::Result<()> {
    let engine = CommunityEngine::new(ctx.config.analysis.clone());
    let algorithm = resolve_algorithm(algorithm, &engine);
    let result = Comparator::new(ctx.config.analysis.clone())
        .with_algorithm(algorithm)
        .compare(before, after)
        .context("comparing graphs")?;
    render_mode(output, &result, render_text, render_pretty)
}

fn delta_rows(r: &ComparisonResult) -> Vec<(&'static str, MetricDelta)> {
    let d = &r.deltas;
    let mut rows = vec![
        ("node_count", d.node_count),
        ("edge_count", d.edge_count),
        ("density", d.density),
        ("average_degree", d.average_degree),
        ("average_clustering", d.average_clustering),
        ("connected_components", d.connected_components),
    ];
    rows.extend(d.diameter.map(|v| ("diameter", v)));
    rows.extend(d.average_path_length.map(|v| ("average_path_length", v)));
    rows
}

fn render_text(r: &ComparisonResult, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(w, "added_nodes\t{}", r.added_nodes.len())?;
    writeln!(w, "removed_nodes\t{}", r.removed_nodes.len())?;
    writeln!(w, "added_edges\t{}", r.added_edges.len())?;
    writeln!(w, "removed_edges\t{}", r.removed_edges.len())?;
    for (name, d) in delta_rows(r) {
        writeln!(w, "{name}\t{}\t{}\t{}", fmt_f64(d.before), fmt_f64(d.after), fmt_f64(d.delta))?;
    }
    writeln!(w, "new_communities\t{}", r.new_communities)?;
    for g in &r.community_growth {
        writeln!(
            w,
            "growth\t{}\t{}\t{}\t{}",
            g.community,
            g.size_before,
            g.size_after,
            fmt_f64(g.growth_pct)
        )?;
    }
    Ok(())
}

fn render_pretty(r: &ComparisonResult, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, "Structure")?;
    pretty_kv(w, "nodes added", r.added_nodes.len().to_string())?;
    pretty_kv(w, "nodes removed", r.removed_nodes.len().to_string())?;
    pretty_kv(w, "nodes in common", r.common_nodes.len().to_string())?;
    pretty_kv(w, "edges added", r.added_edges.len().to_string())?;
    pretty_kv(w, "edges removed", r.removed_edges.len().to_string())?;
    pretty_kv(w, "edges in common", r.common_edges.len().to_string())?;
    writeln!(w)?;

    pretty_section(w, "Metrics (before -> after)")?;
    for (name, d) in delta_rows(r) {
        pretty_kv(
            w,
            name,
            format!(
                "{} -> {} ({:+.1}%)",
                fmt_f64(d.before),
                fmt_f64(d.after),
                d.growth_pct
            ),
        )?;
    }
    writeln!(w)?;

    pretty_section(w, &format!("Communities ({})", r.community_algorithm))?;
    pretty_kv(
        w,
        "count",
        format!("{} -> {}", r.communities_before, r.communities_after),
    )?;
    pretty_kv(w, "new", r.new_communities.to_string())?;
    pretty_kv(w, "unmatched", r.unmatched_communities.to_string())?;
    for g in &r.community_growth {
        pretty_kv(
            w,
            &format!("#{} (was #{})", g.community, g.matched),
            format!("{} -> {} (+{:.1}%)", g.size_before, g.size_after, g.growth_pct),
        )?;
    }
    Ok(())
}
