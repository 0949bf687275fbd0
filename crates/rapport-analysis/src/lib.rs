//! Completion-service invocation with failure classification
//!
//! Builds a prompt from a template, sends a single chat-completions request
//! with bearer authorization, and returns a classified [`AnalysisOutcome`]:
//! `Timeout`, `HttpError`, or `Unexpected` failures never abort the run —
//! they become fallback report bodies upstream.
//!
//! [`AnalysisOutcome`]: rapport_core::AnalysisOutcome

pub mod client;
pub mod prompt;

pub use client::{AnalysisClient, AnalysisService};
pub use prompt::{AnalysisPrompt, DEFAULT_TEMPLATE};
