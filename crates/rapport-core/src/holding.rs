//! Portfolio holdings and resolved price quotes

use serde::{Deserialize, Serialize};

/// One line item of the input portfolio
///
/// Identity is the pair `(name, symbol)`; the weight is informational and
/// plays no role in report generation. Holdings are immutable for the
/// duration of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    /// Display name used in the report title
    pub name: String,

    /// Identifier used to query the market-data provider (ticker or ISIN)
    pub symbol: String,

    /// Optional portfolio weight
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

impl Holding {
    /// Create a holding without a weight
    pub fn new(name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            weight: None,
        }
    }

    /// A holding is processable only with a non-empty name and symbol
    pub fn is_valid(&self) -> bool {
        !self.name.trim().is_empty() && !self.symbol.trim().is_empty()
    }

    /// Label used in diagnostics, e.g. `Acme (ACM)`
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.symbol)
    }
}

/// The result of a price lookup for one symbol
///
/// An absent `value` is a valid state (no history for the window, or the
/// provider could not be reached), distinct from a run-level error. The
/// resolver never raises; it folds every failure into absence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub symbol: String,
    pub value: Option<f64>,
}

impl PriceQuote {
    pub fn new(symbol: impl Into<String>, value: Option<f64>) -> Self {
        Self {
            symbol: symbol.into(),
            value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_holding() {
        assert!(Holding::new("Acme", "ACM").is_valid());
    }

    #[test]
    fn test_invalid_holdings() {
        assert!(!Holding::new("", "XYZ").is_valid());
        assert!(!Holding::new("Acme", "").is_valid());
        assert!(!Holding::new("   ", "ACM").is_valid());
    }

    #[test]
    fn test_label() {
        assert_eq!(Holding::new("Acme", "ACM").label(), "Acme (ACM)");
    }

    #[test]
    fn test_quote_absence_is_not_an_error() {
        let quote = PriceQuote::new("ACM", None);
        assert_eq!(quote.value, None);
    }
}
