use std::fmt;
use std::path::PathBuf;

/// Machine-readable error codes so callers can decide retry vs. skip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    SchemaMismatch,
    UnsupportedFormat,
    ParseFailure,
    AlgorithmUnavailable,
    CapacityExceeded,
    ConvergenceFailure,
    Timeout,
    EmptyGraph,
    SnapshotNotFound,
    ConfigParseError,
    InvalidParameters,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::SchemaMismatch => "E1001",
            Self::UnsupportedFormat => "E1002",
            Self::ParseFailure => "E1003",
            Self::AlgorithmUnavailable => "E2001",
            Self::CapacityExceeded => "E2002",
            Self::ConvergenceFailure => "E2003",
            Self::Timeout => "E2004",
            Self::EmptyGraph => "E2005",
            Self::SnapshotNotFound => "E3001",
            Self::ConfigParseError => "E4001",
            Self::InvalidParameters => "E4002",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::SchemaMismatch => "Required ingestion fields are missing",
            Self::UnsupportedFormat => "Unsupported input format",
            Self::ParseFailure => "Input could not be parsed",
            Self::AlgorithmUnavailable => "Algorithm unavailable",
            Self::CapacityExceeded => "Graph too large for the requested algorithm",
            Self::ConvergenceFailure => "Iteration did not converge",
            Self::Timeout => "Algorithm exceeded its time budget",
            Self::EmptyGraph => "Graph is empty",
            Self::SnapshotNotFound => "Snapshot not found",
            Self::ConfigParseError => "Config file parse error",
            Self::InvalidParameters => "Invalid parameters",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::SchemaMismatch => {
                Some("Map the source/target columns with --source-field/--target-field.")
            }
            Self::UnsupportedFormat => Some("Use a .csv, .json, .graphml or .xml input file."),
            Self::ParseFailure => Some("Check the file is well-formed for its format."),
            Self::AlgorithmUnavailable => Some("Pick another algorithm or rebuild with it enabled."),
            Self::CapacityExceeded => Some("Use louvain or label_propagation on large graphs."),
            Self::ConvergenceFailure => {
                Some("Eigenvector centrality is optional; use degree or closeness instead.")
            }
            Self::Timeout => Some("Raise analysis.timeout_ms or analyse a smaller graph."),
            Self::EmptyGraph => None,
            Self::SnapshotNotFound => Some("Run `graphlens snapshots list` to see stored ids."),
            Self::ConfigParseError => Some("Fix syntax in .graphlens/config.toml and retry."),
            Self::InvalidParameters => Some("Densities and probabilities must lie in [0, 1]."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Errors from the ingestion normalizer. Each is fatal for one input only.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// Mandatory source/target fields are absent.
    #[error("{source_name}: missing required field(s): {}", missing.join(", "))]
    SchemaMismatch {
        source_name: String,
        missing: Vec<String>,
    },

    /// The input format could not be determined or is not supported.
    #[error("{source_name}: unsupported format '{format}'")]
    UnsupportedFormat { source_name: String, format: String },

    /// The input is malformed for its declared format.
    #[error("{source_name}: parse error: {detail}")]
    Parse { source_name: String, detail: String },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl IngestError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::SchemaMismatch { .. } => ErrorCode::SchemaMismatch,
            Self::UnsupportedFormat { .. } => ErrorCode::UnsupportedFormat,
            Self::Parse { .. } | Self::Io { .. } => ErrorCode::ParseFailure,
        }
    }

    pub(crate) fn parse(source_name: &str, detail: impl fmt::Display) -> Self {
        Self::Parse {
            source_name: source_name.to_string(),
            detail: detail.to_string(),
        }
    }
}

/// Errors from the snapshot store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("snapshot '{id}' not found")]
    NotFound { id: String },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A stored snapshot could not be read back as a graph.
    #[error("snapshot '{id}': {source}")]
    Decode {
        id: String,
        #[source]
        source: IngestError,
    },

    #[error("snapshot '{id}': encode failed: {source}")]
    Encode {
        id: String,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound { .. } => ErrorCode::SnapshotNotFound,
            Self::Decode { .. } => ErrorCode::ParseFailure,
            Self::Io { .. } | Self::Encode { .. } => ErrorCode::InternalUnexpected,
        }
    }
}

/// Errors from random graph generation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GenerateError {
    #[error("invalid {name}: {value} (expected a value in [0, 1])")]
    InvalidParameters { name: &'static str, value: f64 },

    #[error("unknown random graph model '{0}'")]
    UnknownModel(String),

    /// A generator produced an edge the graph rejected.
    #[error(transparent)]
    Graph(#[from] GraphError),
}

impl GenerateError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidParameters { .. } | Self::UnknownModel(_) => ErrorCode::InvalidParameters,
            Self::Graph(_) => ErrorCode::InternalUnexpected,
        }
    }
}

/// Mutation errors on a [`crate::graph::CanonicalGraph`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// An edge endpoint is not a node of the graph.
    #[error("edge endpoint '{0}' is not a node of the graph")]
    UnknownEndpoint(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn all_codes_are_unique() {
        let all = [
            ErrorCode::SchemaMismatch,
            ErrorCode::UnsupportedFormat,
            ErrorCode::ParseFailure,
            ErrorCode::AlgorithmUnavailable,
            ErrorCode::CapacityExceeded,
            ErrorCode::ConvergenceFailure,
            ErrorCode::Timeout,
            ErrorCode::EmptyGraph,
            ErrorCode::SnapshotNotFound,
            ErrorCode::ConfigParseError,
            ErrorCode::InvalidParameters,
            ErrorCode::InternalUnexpected,
        ];

        let mut seen = HashSet::new();
        for code in all {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        let code = ErrorCode::CapacityExceeded.code();
        assert_eq!(code.len(), 5);
        assert!(code.starts_with('E'));
        assert!(code.chars().skip(1).all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn generator_graph_errors_are_internal() {
        let err = GenerateError::from(GraphError::UnknownEndpoint("9".into()));
        assert_eq!(err.code(), ErrorCode::InternalUnexpected);
        assert!(err.to_string().contains("'9'"));
        assert_eq!(
            GenerateError::UnknownModel("kronecker".into()).code(),
            ErrorCode::InvalidParameters
        );
    }

    #[test]
    fn schema_mismatch_names_file_and_fields() {
        let err = IngestError::SchemaMismatch {
            source_name: "edges.csv".into(),
            missing: vec!["source".into(), "target".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("edges.csv"));
        assert!(msg.contains("source, target"));
        assert_eq!(err.code(), ErrorCode::SchemaMismatch);
    }
}
