//! `graphlens predict links|activity`.

use std::io::Write;

use clap::{Args, Subcommand};
use graphlens_analysis::link::{ActivityScore, Prediction, ScoreSource};
use graphlens_analysis::{LinkAlgorithm, LinkScore, Predictor};

use super::{Context, GraphArgs};
use crate::output::{OutputMode, fmt_f64, pretty_kv, pretty_section, render_mode};

#[derive(Subcommand, Debug)]
pub enum PredictCommand {
    /// Rank likely new links between unconnected nodes.
    Links(LinksArgs),
    /// Rank nodes by predicted activity.
    Activity(ActivityArgs),
}

#[derive(Args, Debug)]
pub struct LinksArgs {
    #[command(flatten)]
    pub graph: GraphArgs,

    /// common_neighbors, jaccard, adamic_adar or preferential_attachment.
    /// Unknown names resolve to common_neighbors.
    #[arg(short, long, default_value = "jaccard")]
    pub algorithm: String,

    /// Maximum results (capped by `analysis.max_link_top_k`).
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,
}

#[derive(Args, Debug)]
pub struct ActivityArgs {
    #[command(flatten)]
    pub graph: GraphArgs,

    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,
}

/// Execute `graphlens predict`.
pub fn run_predict(command: &PredictCommand, output: OutputMode, ctx: &Context) -> anyhow::Result<()> {
    let predictor = Predictor::new(ctx.config.analysis.clone());
    match command {
        PredictCommand::Links(args) => {
            let g = ctx.load(&args.graph)?;
            let predictor = predictor.with_fallback_link(LinkAlgorithm::resolve(&args.algorithm));
            let prediction = predictor.predict_links(&g, args.top_k);
            render_mode(output, &prediction, links_text, links_pretty)
        }
        PredictCommand::Activity(args) => {
            let g = ctx.load(&args.graph)?;
            let prediction = predictor.predict_activity(&g, args.top_k);
            render_mode(output, &prediction, activity_text, activity_pretty)
        }
    }
}

fn source_label(source: &ScoreSource) -> String {
    match source {
        ScoreSource::Trained { name } => format!("trained model '{name}'"),
        ScoreSource::Heuristic { algorithm } => format!("{algorithm} heuristic"),
    }
}

fn links_text(p: &Prediction<LinkScore>, w: &mut dyn Write) -> std::io::Result<()> {
    for link in &p.items {
        writeln!(w, "{}\t{}\t{}", link.source, link.target, fmt_f64(link.score))?;
    }
    Ok(())
}

fn links_pretty(p: &Prediction<LinkScore>, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, &format!("Predicted links ({})", source_label(&p.source)))?;
    if p.items.is_empty() {
        writeln!(w, "no candidate pairs")?;
    }
    for link in &p.items {
        pretty_kv(w, &format!("{} -- {}", link.source, link.target), fmt_f64(link.score))?;
    }
    Ok(())
}

fn activity_text(p: &Prediction<ActivityScore>, w: &mut dyn Write) -> std::io::Result<()> {
    for node in &p.items {
        writeln!(w, "{}\t{}\t{}\t{}", node.id, node.label, fmt_f64(node.score), node.degree)?;
    }
    Ok(())
}

fn activity_pretty(p: &Prediction<ActivityScore>, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, &format!("Predicted activity ({})", source_label(&p.source)))?;
    for node in &p.items {
        pretty_kv(
            w,
            &node.label,
            format!("{} (degree {}, id {})", fmt_f64(node.score), node.degree, node.id),
        )?;
    }
    Ok(())
}
