//! Confirmation gate between price preview and report generation
//!
//! The gate is injectable so the orchestrator is testable without a real
//! standard input, and so `--yes` can pre-confirm scripted runs.

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

/// Only an exact affirmative token proceeds to Phase 2
pub fn is_affirmative(input: &str) -> bool {
    matches!(input.trim().to_lowercase().as_str(), "oui" | "o")
}

/// Yes/no checkpoint; anything but an affirmative answer aborts the run
#[async_trait]
pub trait ConfirmationGate: Send + Sync {
    async fn confirm(&self) -> bool;
}

/// Interactive gate reading one line from standard input
pub struct StdinGate;

#[async_trait]
impl ConfirmationGate for StdinGate {
    async fn confirm(&self) -> bool {
        println!("\nVoulez-vous lancer l'analyse et générer les rapports ? (oui/non) : ");
        let mut line = String::new();
        let mut reader = BufReader::new(tokio::io::stdin());
        match reader.read_line(&mut line).await {
            Ok(_) => is_affirmative(&line),
            Err(e) => {
                warn!("cannot read confirmation: {e}");
                false
            }
        }
    }
}

/// Pre-decided gate for `--yes` runs and tests
pub struct PresetGate(pub bool);

#[async_trait]
impl ConfirmationGate for PresetGate {
    async fn confirm(&self) -> bool {
        self.0
    }
}
