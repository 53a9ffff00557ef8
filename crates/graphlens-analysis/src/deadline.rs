use std::time::{Duration, Instant};

use crate::error::AnalysisError;

/// Coarse wall-clock budget checked between iterations of the two
/// unbounded-cost paths (eigenvector iteration, divisive communities).
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    started: Instant,
    budget: Option<Duration>,
}

impl Deadline {
    #[must_use]
    pub fn new(timeout_ms: Option<u64>) -> Self {
        Self {
            started: Instant::now(),
            budget: timeout_ms.map(Duration::from_millis),
        }
    }

    #[must_use]
    pub fn unbounded() -> Self {
        Self::new(None)
    }

    /// # Errors
    ///
    /// Returns [`AnalysisError::Timeout`] once the budget is spent.
    pub fn check(&self, algorithm: &'static str, node_count: usize) -> Result<(), AnalysisError> {
        let Some(budget) = self.budget else {
            return Ok(());
        };
        let elapsed = self.started.elapsed();
        if elapsed > budget {
            return Err(AnalysisError::Timeout {
                algorithm,
                elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
                node_count,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbounded_never_expires() {
        assert!(Deadline::unbounded().check("x", 1).is_ok());
    }

    #[test]
    fn zero_budget_expires() {
        let d = Deadline::new(Some(0));
        std::thread::sleep(Duration::from_millis(2));
        assert!(matches!(d.check("x", 3), Err(AnalysisError::Timeout { node_count: 3, .. })));
    }
}
