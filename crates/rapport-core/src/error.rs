//! Fatal error taxonomy
//!
//! Only conditions that invalidate the whole run live here. Per-holding
//! conditions (absent price, failed analysis, bad input row) are values, not
//! errors — see the crate docs.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for run-level operations
pub type Result<T> = std::result::Result<T, RapportError>;

/// Errors that abort the run
#[derive(Debug, Error)]
pub enum RapportError {
    /// The holdings file could not be read at startup
    #[error("cannot read holdings file {path}: {detail}")]
    SourceUnreadable { path: PathBuf, detail: String },

    /// A required rendering resource (font) is missing or unreadable
    ///
    /// Fatal for the whole run: every subsequent report would be equally
    /// unrenderable, so no partial output is trustworthy.
    #[error("font resource unavailable at {path}: {detail}")]
    FontResource { path: PathBuf, detail: String },

    /// Writing or building a document failed
    #[error("rendering failed for {path}: {detail}")]
    Render { path: PathBuf, detail: String },

    /// Invalid or incomplete configuration
    #[error("configuration error: {0}")]
    Config(String),
}
