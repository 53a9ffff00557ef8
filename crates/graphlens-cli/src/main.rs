#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{Parser, Subcommand};
use output::{CliError, OutputMode, render_error, resolve_output_mode};
use std::env;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "graphlens: relationship-graph ingestion and structural analysis",
    long_about = None
)]
struct Cli {
    /// Output format: pretty, text or json.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Shorthand for `--format json`.
    #[arg(long, global = true, hide = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Ingest",
        about = "Normalize input files into canonical graphs",
        after_help = "EXAMPLES:\n    # Normalize and anonymize a CSV edge list\n    graphlens ingest contacts.csv --out processed/\n\n    # Keep raw ids and store a snapshot\n    graphlens ingest march.json --no-anonymize --snapshot"
    )]
    Ingest(cmd::ingest::IngestArgs),

    #[command(
        next_help_heading = "Analyse",
        about = "Whole-graph statistics",
        after_help = "EXAMPLES:\n    graphlens metrics contacts.csv\n    graphlens metrics march --format json"
    )]
    Metrics(cmd::metrics::MetricsArgs),

    #[command(
        next_help_heading = "Analyse",
        about = "Node centrality scores",
        after_help = "EXAMPLES:\n    # All four algorithms\n    graphlens centrality contacts.csv\n\n    # Only betweenness, top 5\n    graphlens centrality contacts.csv -a betweenness --top 5"
    )]
    Centrality(cmd::metrics::CentralityArgs),

    #[command(
        next_help_heading = "Analyse",
        about = "Detect communities",
        after_help = "EXAMPLES:\n    graphlens communities contacts.csv\n    graphlens communities contacts.csv -a girvan_newman"
    )]
    Communities(cmd::communities::CommunitiesArgs),

    /// Predict new links or node activity
    #[command(subcommand)]
    Predict(cmd::predict::PredictCommand),

    #[command(
        next_help_heading = "Compare",
        about = "Compare two graphs",
        after_help = "EXAMPLES:\n    graphlens compare january.csv february.csv\n    graphlens compare jan feb -a label_propagation --format json"
    )]
    Compare(cmd::compare::CompareArgs),

    /// Inspect stored snapshots
    #[command(subcommand)]
    Snapshots(cmd::snapshots::SnapshotsCommand),

    #[command(
        next_help_heading = "Generate",
        about = "Generate a random graph",
        after_help = "EXAMPLES:\n    graphlens generate -m scale_free -n 200 -d 0.02 --seed 7 -o sf.json"
    )]
    Generate(cmd::generate::GenerateArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("GRAPHLENS_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "graphlens=debug,info"
        } else {
            "graphlens=info,warn"
        })
    });

    let format = env::var("GRAPHLENS_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn run(cli: &Cli, output: OutputMode) -> anyhow::Result<()> {
    let project_root = env::current_dir()?;
    let config = graphlens_core::config::load_config(&project_root)?;
    let ctx = cmd::Context {
        config,
        project_root,
    };
    debug!(root = %ctx.project_root.display(), "loaded configuration");

    match &cli.command {
        Commands::Ingest(args) => cmd::ingest::run_ingest(args, output, &ctx),
        Commands::Metrics(args) => cmd::metrics::run_metrics(args, output, &ctx),
        Commands::Centrality(args) => cmd::metrics::run_centrality(args, output, &ctx),
        Commands::Communities(args) => cmd::communities::run_communities(args, output, &ctx),
        Commands::Predict(command) => cmd::predict::run_predict(command, output, &ctx),
        Commands::Compare(args) => cmd::compare::run_compare(args, output, &ctx),
        Commands::Snapshots(command) => cmd::snapshots::run_snapshots(command, output, &ctx),
        Commands::Generate(args) => cmd::generate::run_generate(args, output, &ctx),
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let output = resolve_output_mode(cli.format, cli.json);

    if let Err(err) = run(&cli, output) {
        render_error(output, &CliError::from(&err))?;
        std::process::exit(1);
    }
    Ok(())
}
