pub mod communities;
pub mod compare;
pub mod generate;
pub mod ingest;
pub mod metrics;
pub mod predict;
pub mod snapshots;

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::Args;
use graphlens_core::config::GraphlensConfig;
use graphlens_core::{CanonicalGraph, DirSnapshotStore, Normalizer, SnapshotStore};
use tracing::debug;

/// Shared arguments naming a graph to analyse.
#[derive(Args, Debug, Clone)]
pub struct GraphArgs {
    /// Input file (.csv, .json, .graphml, .xml) or a stored snapshot id.
    pub graph: String,

    /// Anonymize node ids while reading a raw input file.
    #[arg(long)]
    pub anonymize: bool,
}

/// Everything a command needs besides its own arguments.
#[derive(Debug)]
pub struct Context {
    pub config: GraphlensConfig,
    pub project_root: PathBuf,
}

impl Context {
    /// The configured snapshot directory, or `<project>/.graphlens/snapshots`.
    pub fn snapshot_store(&self) -> DirSnapshotStore {
        let dir = self.config.snapshots.dir.as_ref().map_or_else(
            || self.project_root.join(".graphlens/snapshots"),
            |dir| self.project_root.join(dir),
        );
        DirSnapshotStore::new(dir)
    }

    /// Resolve `name` to a graph: an existing file is normalized, anything
    /// else is looked up in the snapshot store.
    pub fn load_graph(&self, name: &str, anonymize: bool) -> anyhow::Result<CanonicalGraph> {
        let path = Path::new(name);
        if path.is_file() {
            let mut ingest = self.config.ingest.clone();
            ingest.anonymize = anonymize;
            ingest.output_dir = None;
            let ingestion = Normalizer::new(ingest)
                .normalize_file(path)
                .with_context(|| format!("reading {name}"))?;
            debug!(path = name, warnings = ingestion.warnings.len(), "loaded graph from file");
            return Ok(ingestion.graph);
        }
        let graph = self
            .snapshot_store()
            .load(name)
            .with_context(|| format!("'{name}' is neither a file nor a stored snapshot"))?;
        debug!(snapshot = name, "loaded graph from snapshot store");
        Ok(graph)
    }

    pub fn load(&self, args: &GraphArgs) -> anyhow::Result<CanonicalGraph> {
        self.load_graph(&args.graph, args.anonymize)
    }
}
