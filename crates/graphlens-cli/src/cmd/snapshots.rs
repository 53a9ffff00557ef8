//! `graphlens snapshots list|compare-latest`.

use std::io::Write;

use anyhow::Context as _;
use clap::{Args, Subcommand};
use graphlens_core::{SnapshotInfo, SnapshotStore};
use serde::Serialize;

use super::Context;
use super::compare::compare_and_render;
use crate::output::{OutputMode, pretty_section, render_mode};

#[derive(Subcommand, Debug)]
pub enum SnapshotsCommand {
    /// List stored snapshots, newest first.
    List,
    /// Compare the two most recent snapshots.
    CompareLatest(CompareLatestArgs),
}

#[derive(Args, Debug)]
pub struct CompareLatestArgs {
    /// Community algorithm used on both sides.
    #[arg(short, long)]
    pub algorithm: Option<String>,
}

#[derive(Debug, Serialize)]
struct Listing<'a> {
    dir: String,
    snapshots: &'a [SnapshotInfo],
}

/// Execute `graphlens snapshots`.
pub fn run_snapshots(command: &SnapshotsCommand, output: OutputMode, ctx: &Context) -> anyhow::Result<()> {
    let store = ctx.snapshot_store();
    match command {
        SnapshotsCommand::List => {
            let snapshots = store.list().context("listing snapshots")?;
            let listing = Listing {
                dir: store.dir().display().to_string(),
                snapshots: &snapshots,
            };
            render_mode(output, &listing, list_text, list_pretty)
        }
        SnapshotsCommand::CompareLatest(args) => {
            let Some((older, newer)) = store.latest_pair().context("listing snapshots")? else {
                anyhow::bail!(
                    "need at least two snapshots in {} to compare",
                    store.dir().display()
                );
            };
            let before = store.load(&older.id)?;
            let after = store.load(&newer.id)?;
            tracing::info!(before = %older.id, after = %newer.id, "comparing latest snapshots");
            compare_and_render(ctx, &before, &after, args.algorithm.as_deref(), output)
        }
    }
}

fn list_text(l: &Listing<'_>, w: &mut dyn Write) -> std::io::Result<()> {
    for s in l.snapshots {
        writeln!(
            w,
            "{}\t{}\t{}\t{}",
            s.id,
            s.modified.to_rfc3339(),
            s.node_count,
            s.edge_count
        )?;
    }
    Ok(())
}

fn list_pretty(l: &Listing<'_>, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, &format!("Snapshots in {}", l.dir))?;
    if l.snapshots.is_empty() {
        writeln!(w, "none")?;
    }
    for s in l.snapshots {
        writeln!(
            w,
            "{:<24} {}  {:>6} nodes {:>7} edges",
            s.id,
            s.modified.format("%Y-%m-%d %H:%M:%S"),
            s.node_count,
            s.edge_count
        )?;
    }
    Ok(())
}
