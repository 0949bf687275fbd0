//! Price resolution over a market-data provider
//!
//! The resolver looks up the most recent daily closing price for a symbol.
//! Absence is a valid answer: provider errors and empty histories are both
//! logged and folded into `None`, never raised to the caller. A single
//! attempt per symbol, no retries.

use async_trait::async_trait;
use rapport_core::PriceQuote;
use tracing::{debug, warn};
use yahoo_finance_api as yahoo;

/// Seam between the orchestrator and the market-data provider
#[async_trait]
pub trait PriceResolver: Send + Sync {
    /// Resolve the latest closing price for a symbol, or `None`
    async fn resolve(&self, symbol: &str) -> Option<f64>;
}

/// Price resolver backed by Yahoo Finance
///
/// Queries the latest quotes over a one-trading-day window and takes the
/// last close. The connector carries its own transport timeout, so the
/// lookup never blocks unboundedly.
pub struct YahooResolver {}

impl YahooResolver {
    pub fn new() -> Self {
        Self {}
    }

    /// Resolve into a [`PriceQuote`], preserving the symbol
    pub async fn quote(&self, symbol: &str) -> PriceQuote {
        PriceQuote::new(symbol, self.resolve(symbol).await)
    }
}

impl Default for YahooResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PriceResolver for YahooResolver {
    async fn resolve(&self, symbol: &str) -> Option<f64> {
        let provider = match yahoo::YahooConnector::new() {
            Ok(provider) => provider,
            Err(e) => {
                warn!("cannot build market-data connector for {symbol}: {e}");
                return None;
            }
        };

        let response = match provider.get_latest_quotes(symbol, "1d").await {
            Ok(response) => response,
            Err(e) => {
                warn!("price lookup failed for {symbol}: {e}");
                return None;
            }
        };

        match response.last_quote() {
            Ok(quote) => {
                debug!("resolved {symbol} close = {}", quote.close);
                Some(quote.close)
            }
            Err(e) => {
                warn!("no price history for {symbol}: {e}");
                None
            }
        }
    }
}
