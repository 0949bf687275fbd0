//! Holdings file loading
//!
//! Delimited text, one row per holding. Header names vary between portfolio
//! exports (`name`/`displayName`, `isin`/`ticker`/`symbol`, `weight`/`poids`);
//! serde aliases absorb the variants. An unreadable file is fatal; a
//! malformed row is a diagnostic and a skip.

use rapport_core::{Holding, RapportError, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
struct HoldingRow {
    #[serde(default, alias = "displayName")]
    name: Option<String>,
    #[serde(default, alias = "ticker", alias = "symbol")]
    isin: Option<String>,
    #[serde(default, alias = "poids")]
    weight: Option<f64>,
}

impl From<HoldingRow> for Holding {
    fn from(row: HoldingRow) -> Self {
        Self {
            name: row.name.unwrap_or_default(),
            symbol: row.isin.unwrap_or_default(),
            weight: row.weight,
        }
    }
}

/// Load holdings from a delimited file, preserving input order
///
/// Rows that fail to parse are skipped with a diagnostic. Rows that parse
/// but lack a name or symbol are kept; the orchestrator skips them with its
/// own diagnostic so the tally accounts for them.
pub fn load_holdings(path: &Path, delimiter: u8) -> Result<Vec<Holding>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)
        .map_err(|e| RapportError::SourceUnreadable {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;

    let mut holdings = Vec::new();
    for (index, row) in reader.deserialize::<HoldingRow>().enumerate() {
        match row {
            Ok(row) => holdings.push(Holding::from(row)),
            Err(e) => warn!("skipping malformed row {}: {e}", index + 2),
        }
    }

    info!("loaded {} holdings from {}", holdings.len(), path.display());
    Ok(holdings)
}
