//! Report-generation orchestration
//!
//! Composes price resolution, completion-service invocation, sanitization,
//! and rendering under the two-phase flow: preview prices, confirm at the
//! gate, then generate one document per holding with per-holding failure
//! isolation.

pub mod gate;
pub mod pipeline;
pub mod source;

pub use gate::{ConfirmationGate, PresetGate, StdinGate, is_affirmative};
pub use pipeline::{Pipeline, PreviewRow};
pub use source::load_holdings;
