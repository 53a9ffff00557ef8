//! `graphlens communities`: partition a graph.

use std::io::Write;

use anyhow::Context as _;
use clap::Args;
use graphlens_analysis::{CommunityAlgorithm, CommunityAssignment, CommunityEngine};

use super::{Context, GraphArgs};
use crate::output::{OutputMode, fmt_f64, pretty_kv, pretty_section, render_mode};

#[derive(Args, Debug)]
pub struct CommunitiesArgs {
    #[command(flatten)]
    pub graph: GraphArgs,

    /// louvain, label_propagation or girvan_newman. Defaults to
    /// `analysis.community_algorithm`; unknown names resolve to
    /// label_propagation.
    #[arg(short, long)]
    pub algorithm: Option<String>,
}

/// The requested algorithm, or the configured default.
pub fn resolve_algorithm(name: Option<&str>, engine: &CommunityEngine) -> CommunityAlgorithm {
    name.map_or_else(|| engine.default_algorithm(), CommunityAlgorithm::resolve)
}

/// Execute `graphlens communities`.
pub fn run_communities(args: &CommunitiesArgs, output: OutputMode, ctx: &Context) -> anyhow::Result<()> {
    let g = ctx.load(&args.graph)?;
    let engine = CommunityEngine::new(ctx.config.analysis.clone());
    let algorithm = resolve_algorithm(args.algorithm.as_deref(), &engine);
    let result = engine
        .detect(&g, algorithm)
        .with_context(|| format!("detecting communities in {}", args.graph.graph))?;
    render_mode(output, &result, render_text, render_pretty)
}

fn render_text(r: &CommunityAssignment, w: &mut dyn Write) -> std::io::Result<()> {
    for (label, members) in r.communities().iter().enumerate() {
        for id in members {
            writeln!(w, "{label}\t{id}")?;
        }
    }
    Ok(())
}

fn render_pretty(r: &CommunityAssignment, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, "Communities")?;
    if r.fell_back() {
        pretty_kv(w, "algorithm", format!("{} (requested {})", r.algorithm, r.requested))?;
    } else {
        pretty_kv(w, "algorithm", r.algorithm.as_str())?;
    }
    pretty_kv(w, "communities", r.community_count.to_string())?;
    pretty_kv(w, "modularity", fmt_f64(r.modularity))?;
    writeln!(w)?;
    for (label, members) in r.communities().iter().enumerate() {
        pretty_kv(w, &format!("#{label} ({})", members.len()), members.join(", "))?;
    }
    Ok(())
}
