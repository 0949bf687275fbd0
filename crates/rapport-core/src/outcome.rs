//! Classified result of a completion-service call

use serde::{Deserialize, Serialize};

/// What went wrong with a completion request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The request exceeded its timeout
    Timeout,

    /// The remote returned a non-2xx status
    HttpError,

    /// Anything else: connection error, malformed response, missing field
    Unexpected,
}

impl FailureKind {
    /// Short human-readable reason used in fallback report bodies
    pub fn reason(self) -> &'static str {
        match self {
            Self::Timeout => "délai d'attente dépassé",
            Self::HttpError => "erreur HTTP du service",
            Self::Unexpected => "erreur inattendue",
        }
    }
}

/// Outcome of one analysis call, produced once per holding per run
///
/// Failures are classified, not raised: the orchestrator pattern-matches on
/// the variant and keeps going. A failed call still produces a rendered
/// report whose body states why the analysis is unavailable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AnalysisOutcome {
    Success {
        /// The first completion's text
        text: String,
        /// Citation links, in response order
        sources: Vec<String>,
    },
    Failure {
        kind: FailureKind,
        detail: String,
    },
}

impl AnalysisOutcome {
    pub fn success(text: impl Into<String>, sources: Vec<String>) -> Self {
        Self::Success {
            text: text.into(),
            sources,
        }
    }

    pub fn failure(kind: FailureKind, detail: impl Into<String>) -> Self {
        Self::Failure {
            kind,
            detail: detail.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Report body standing in for a failed analysis
    pub fn fallback_body(kind: FailureKind, detail: &str) -> String {
        format!("Analyse indisponible : {} ({detail})", kind.reason())
    }
}
