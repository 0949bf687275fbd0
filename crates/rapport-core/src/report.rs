//! Report value handed to the renderer, and per-run outcome tally

use crate::Holding;
use serde::{Deserialize, Serialize};

/// Everything the renderer needs to produce one document
///
/// The body is expected to have passed through the sanitizer; the renderer
/// does not re-clean it. `price` is `None` only under the placeholder policy,
/// in which case the price line reads "non disponible".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub holding: Holding,
    pub price: Option<f64>,
    /// Sanitized analysis text (or the fallback body for a failed analysis)
    pub body: String,
    /// Citation links, rendered verbatim one per line when non-empty
    pub sources: Vec<String>,
}

/// Per-holding tally accumulated over Phase 2
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Documents written
    pub generated: usize,
    /// Rows with a missing name or symbol
    pub skipped_invalid: usize,
    /// Holdings skipped because no price resolved (skip policy only)
    pub skipped_no_price: usize,
    /// Holdings whose completion call failed (a document was still written)
    pub analysis_failures: usize,
    /// Holdings remaining when a cancellation was honored
    pub cancelled: usize,
}

impl RunSummary {
    /// Total holdings accounted for
    pub fn total(&self) -> usize {
        self.generated + self.skipped_invalid + self.skipped_no_price + self.cancelled
    }
}

/// Terminal state of a pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The user declined at the confirmation gate; nothing was generated
    Aborted,
    /// Phase 2 ran to the end (or to a cooperative cancellation point)
    Completed(RunSummary),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_total() {
        let summary = RunSummary {
            generated: 3,
            skipped_invalid: 1,
            skipped_no_price: 2,
            analysis_failures: 1,
            cancelled: 0,
        };
        // analysis failures still produce a document, so they are not added twice
        assert_eq!(summary.total(), 6);
    }

    #[test]
    fn test_outcome_equality() {
        assert_eq!(RunOutcome::Aborted, RunOutcome::Aborted);
        assert_ne!(
            RunOutcome::Aborted,
            RunOutcome::Completed(RunSummary::default())
        );
    }
}
