use graphlens_core::ErrorCode;

/// Errors from the analysis engines.
///
/// Every variant names the algorithm and the size of the graph it ran on so
/// a caller can decide between retrying, degrading or skipping.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalysisError {
    /// The implementation is compiled out or disabled by configuration.
    #[error("algorithm '{algorithm}' is unavailable")]
    AlgorithmUnavailable { algorithm: &'static str },

    /// The graph is larger than the algorithm is allowed to process.
    #[error("{algorithm} refuses graphs over {limit} nodes (got {node_count})")]
    CapacityExceeded {
        algorithm: &'static str,
        node_count: usize,
        limit: usize,
    },

    /// Iterative computation did not converge (or cannot, on this topology).
    #[error("{algorithm} did not converge after {iterations} iterations on {node_count} nodes")]
    ConvergenceFailure {
        algorithm: &'static str,
        iterations: usize,
        node_count: usize,
    },

    /// The coarse wall-clock budget ran out.
    #[error("{algorithm} timed out after {elapsed_ms} ms on {node_count} nodes")]
    Timeout {
        algorithm: &'static str,
        elapsed_ms: u64,
        node_count: usize,
    },
}

impl AnalysisError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::AlgorithmUnavailable { .. } => ErrorCode::AlgorithmUnavailable,
            Self::CapacityExceeded { .. } => ErrorCode::CapacityExceeded,
            Self::ConvergenceFailure { .. } => ErrorCode::ConvergenceFailure,
            Self::Timeout { .. } => ErrorCode::Timeout,
        }
    }

    /// Name of the algorithm that failed.
    #[must_use]
    pub const fn algorithm(&self) -> &'static str {
        match self {
            Self::AlgorithmUnavailable { algorithm }
            | Self::CapacityExceeded { algorithm, .. }
            | Self::ConvergenceFailure { algorithm, .. }
            | Self::Timeout { algorithm, .. } => algorithm,
        }
    }
}
