use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Project configuration, read from `.graphlens/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphlensConfig {
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub snapshots: SnapshotConfig,
}

/// Tabular column names plus anonymization policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Column whose value a row's label cell describes.
    #[serde(default = "default_source_field")]
    pub node_id_field: String,
    #[serde(default = "default_label_field")]
    pub node_label_field: String,
    #[serde(default = "default_source_field")]
    pub source_field: String,
    #[serde(default = "default_target_field")]
    pub target_field: String,
    #[serde(default = "default_weight_field")]
    pub weight_field: String,
    #[serde(default = "default_true")]
    pub anonymize: bool,
    /// Treat the first tabular row as the header row.
    #[serde(default = "default_true")]
    pub skip_header: bool,
    /// Mixed into every digest so ids cannot be recovered by hashing guesses.
    /// Snapshots are only comparable when ingested with the same salt.
    #[serde(default)]
    pub anonymize_salt: Option<String>,
    /// Where normalized graphs are written, if anywhere.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            node_id_field: default_source_field(),
            node_label_field: default_label_field(),
            source_field: default_source_field(),
            target_field: default_target_field(),
            weight_field: default_weight_field(),
            anonymize: default_true(),
            skip_header: default_true(),
            anonymize_salt: None,
            output_dir: None,
        }
    }
}

/// Limits and defaults for the analysis engines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_eigenvector_max_iter")]
    pub eigenvector_max_iter: usize,
    #[serde(default = "default_eigenvector_tolerance")]
    pub eigenvector_tolerance: f64,
    #[serde(default = "default_girvan_newman_max_nodes")]
    pub girvan_newman_max_nodes: usize,
    /// Coarse wall-clock budget for eigenvector iteration and divisive
    /// community detection. `None` disables the check.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    #[serde(default = "default_link_top_k")]
    pub link_top_k: usize,
    #[serde(default = "default_max_link_top_k")]
    pub max_link_top_k: usize,
    #[serde(default = "default_community_algorithm")]
    pub community_algorithm: String,
    #[serde(default = "default_true")]
    pub louvain_enabled: bool,
    #[serde(default = "default_louvain_max_passes")]
    pub louvain_max_passes: usize,
    #[serde(default = "default_label_propagation_max_rounds")]
    pub label_propagation_max_rounds: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            eigenvector_max_iter: default_eigenvector_max_iter(),
            eigenvector_tolerance: default_eigenvector_tolerance(),
            girvan_newman_max_nodes: default_girvan_newman_max_nodes(),
            timeout_ms: None,
            link_top_k: default_link_top_k(),
            max_link_top_k: default_max_link_top_k(),
            community_algorithm: default_community_algorithm(),
            louvain_enabled: default_true(),
            louvain_max_passes: default_louvain_max_passes(),
            label_propagation_max_rounds: default_label_propagation_max_rounds(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotConfig {
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

/// Load configuration for `project_root`.
///
/// Resolution order: `<project_root>/.graphlens/config.toml`, then
/// `<config_dir>/graphlens/config.toml`, then defaults.
///
/// # Errors
///
/// Returns an error if a config file exists but cannot be read or parsed.
pub fn load_config(project_root: &Path) -> Result<GraphlensConfig> {
    let project_path = project_root.join(".graphlens/config.toml");
    if project_path.exists() {
        return read_config(&project_path);
    }

    let Some(config_dir) = dirs::config_dir() else {
        return Ok(GraphlensConfig::default());
    };
    let user_path = config_dir.join("graphlens/config.toml");
    if user_path.exists() {
        return read_config(&user_path);
    }

    Ok(GraphlensConfig::default())
}

fn read_config(path: &Path) -> Result<GraphlensConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<GraphlensConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

fn default_true() -> bool {
    true
}

fn default_source_field() -> String {
    "source".to_string()
}

fn default_target_field() -> String {
    "target".to_string()
}

fn default_weight_field() -> String {
    "weight".to_string()
}

fn default_label_field() -> String {
    "label".to_string()
}

const fn default_eigenvector_max_iter() -> usize {
    1000
}

const fn default_eigenvector_tolerance() -> f64 {
    1e-6
}

const fn default_girvan_newman_max_nodes() -> usize {
    100
}

const fn default_link_top_k() -> usize {
    20
}

const fn default_max_link_top_k() -> usize {
    1000
}

fn default_community_algorithm() -> String {
    "louvain".to_string()
}

const fn default_louvain_max_passes() -> usize {
    10
}

const fn default_label_propagation_max_rounds() -> usize {
    100
}
