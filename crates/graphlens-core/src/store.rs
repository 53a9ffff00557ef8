//! Snapshot storage.
//!
//! A snapshot is a normalized graph captured at one point in time. The
//! directory-backed store keeps one exchange-format JSON file per snapshot;
//! the snapshot id is the file stem and recency is the file's modification
//! time.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::error::StoreError;
use crate::exchange;
use crate::graph::CanonicalGraph;

const EXTENSION: &str = "json";

/// Summary of one stored snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotInfo {
    pub id: String,
    pub modified: DateTime<Utc>,
    pub node_count: usize,
    pub edge_count: usize,
    pub content_hash: String,
}

/// Source of graph snapshots.
pub trait SnapshotStore {
    /// Load one snapshot by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for unknown ids.
    fn load(&self, id: &str) -> Result<CanonicalGraph, StoreError>;

    /// All snapshots, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be enumerated.
    fn list(&self) -> Result<Vec<SnapshotInfo>, StoreError>;

    /// The two most recent snapshots as `(older, newer)`, if at least two exist.
    ///
    /// # Errors
    ///
    /// Propagates [`SnapshotStore::list`] and [`SnapshotStore::load`] errors.
    fn latest_pair(&self) -> Result<Option<(SnapshotInfo, SnapshotInfo)>, StoreError> {
        let mut infos = self.list()?;
        if infos.len() < 2 {
            return Ok(None);
        }
        infos.truncate(2);
        let older = infos.pop();
        let newer = infos.pop();
        Ok(older.zip(newer))
    }
}

/// Snapshots as `<id>.json` files in one directory.
#[derive(Debug, Clone)]
pub struct DirSnapshotStore {
    dir: PathBuf,
}

impl DirSnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &str) -> PathBuf {
        let stem = id.strip_suffix(".json").unwrap_or(id);
        self.dir.join(format!("{stem}.{EXTENSION}"))
    }

    /// Write `graph` as snapshot `id`, replacing any snapshot with that id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the file cannot be written.
    #[instrument(skip(self, graph), fields(nodes = graph.node_count()))]
    pub fn save(&self, id: &str, graph: &CanonicalGraph) -> Result<SnapshotInfo, StoreError> {
        let path = self.path_for(id);
        exchange::write_file(graph, &path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), "saved snapshot");
        info_for(&path, graph)
    }
}

fn modified_at(path: &Path) -> Result<DateTime<Utc>, StoreError> {
    let meta = std::fs::metadata(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mtime = meta.modified().map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(DateTime::<Utc>::from(mtime))
}

fn info_for(path: &Path, graph: &CanonicalGraph) -> Result<SnapshotInfo, StoreError> {
    let id = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string();
    Ok(SnapshotInfo {
        id,
        modified: modified_at(path)?,
        node_count: graph.node_count(),
        edge_count: graph.adjacency().edge_count(),
        content_hash: graph.content_hash(),
    })
}

impl SnapshotStore for DirSnapshotStore {
    fn load(&self, id: &str) -> Result<CanonicalGraph, StoreError> {
        let path = self.path_for(id);
        if !path.is_file() {
            return Err(StoreError::NotFound { id: id.to_string() });
        }
        exchange::read_file(&path).map_err(|source| StoreError::Decode {
            id: id.to_string(),
            source,
        })
    }

    fn list(&self) -> Result<Vec<SnapshotInfo>, StoreError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let entries = std::fs::read_dir(&self.dir).map_err(|source| StoreError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let mut infos = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| StoreError::Io {
                path: self.dir.clone(),
                source,
            })?;
            let path = entry.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            match exchange::read_file(&path) {
                Ok(graph) => infos.push(info_for(&path, &graph)?),
                Err(err) => warn!(path = %path.display(), "skipping unreadable snapshot: {err}"),
            }
        }

        infos.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| a.id.cmp(&b.id)));
        Ok(infos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Edge, Node};
    use std::time::{Duration, SystemTime};

    fn path_graph(n: usize) -> CanonicalGraph {
        let mut g = CanonicalGraph::new();
        for i in 0..n {
            g.add_node(Node::new(i.to_string()));
        }
        for i in 1..n {
            g.add_edge(Edge::new((i - 1).to_string(), i.to_string()))
                .unwrap();
        }
        g
    }

    fn set_mtime(path: &Path, secs_ago: u64) {
        let file = std::fs::File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() - Duration::from_secs(secs_ago))
            .unwrap();
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirSnapshotStore::new(dir.path());
        let info = store.save("week1", &path_graph(4)).unwrap();
        assert_eq!(info.id, "week1");
        assert_eq!(info.node_count, 4);
        assert_eq!(info.edge_count, 3);

        let g = store.load("week1").unwrap();
        assert_eq!(g.node_count(), 4);
        assert_eq!(g.content_hash(), info.content_hash);
    }

    #[test]
    fn unknown_id_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirSnapshotStore::new(dir.path());
        assert!(matches!(
            store.load("missing"),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn list_is_newest_first_and_latest_pair_is_ordered() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirSnapshotStore::new(dir.path());
        store.save("old", &path_graph(2)).unwrap();
        store.save("mid", &path_graph(3)).unwrap();
        store.save("new", &path_graph(5)).unwrap();
        set_mtime(&dir.path().join("old.json"), 300);
        set_mtime(&dir.path().join("mid.json"), 200);
        set_mtime(&dir.path().join("new.json"), 100);
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let ids: Vec<String> = store.list().unwrap().into_iter().map(|i| i.id).collect();
        assert_eq!(ids, ["new", "mid", "old"]);

        let (older, newer) = store.latest_pair().unwrap().unwrap();
        assert_eq!(older.id, "mid");
        assert_eq!(newer.id, "new");
    }

    #[test]
    fn missing_dir_lists_nothing() {
        let store = DirSnapshotStore::new("/nonexistent/graphlens/snapshots");
        assert!(store.list().unwrap().is_empty());
        assert!(store.latest_pair().unwrap().is_none());
    }
}
