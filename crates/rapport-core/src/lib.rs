//! Core domain types for the rapport report generator
//!
//! This crate defines the data model shared by every stage of the pipeline:
//! holdings and price quotes, classified analysis outcomes, the report value
//! handed to the renderer, run configuration, and the fatal error taxonomy.
//!
//! Per-holding failure states (an absent price, a failed completion call, a
//! malformed input row) are deliberately modelled as values rather than
//! errors: callers pattern-match on [`AnalysisOutcome`] and `Option<f64>`
//! instead of inspecting error strings. Only conditions that invalidate the
//! whole run surface as [`RapportError`].

pub mod config;
pub mod error;
pub mod holding;
pub mod outcome;
pub mod report;

pub use config::{PricePolicy, RunConfig, RunConfigBuilder};
pub use error::{RapportError, Result};
pub use holding::{Holding, PriceQuote};
pub use outcome::{AnalysisOutcome, FailureKind};
pub use report::{Report, RunOutcome, RunSummary};
