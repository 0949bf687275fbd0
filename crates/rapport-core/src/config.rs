//! Run configuration
//!
//! All previously-global knobs (paths, endpoint, font, timeout) live in one
//! explicit value handed to the orchestrator at construction.

use crate::error::{RapportError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// What to do with a holding whose price could not be resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricePolicy {
    /// Skip the holding with a diagnostic; no document is written
    Skip,
    /// Generate the report anyway, rendering the price as "non disponible"
    Placeholder,
}

impl Default for PricePolicy {
    fn default() -> Self {
        Self::Skip
    }
}

/// Configuration for a report-generation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Delimited holdings file
    pub input_path: PathBuf,

    /// Directory receiving the generated documents
    pub output_dir: PathBuf,

    /// External TTF for the renderer; builtin Helvetica when unset
    pub font_path: Option<PathBuf>,

    /// Bearer token for the completion service
    pub api_key: String,

    /// Completion endpoint URL
    pub api_endpoint: String,

    /// Model identifier sent with each completion request
    pub model: String,

    /// Sampling temperature
    pub temperature: f32,

    /// Completion request timeout
    pub request_timeout: Duration,

    /// Policy for holdings with an unresolvable price
    pub price_policy: PricePolicy,

    /// Suffix on rendered price lines, e.g. "€"
    pub currency_suffix: String,

    /// Field delimiter of the holdings file
    pub csv_delimiter: u8,

    /// Override for the analysis prompt template (minijinja syntax)
    pub prompt_template: Option<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("positions.csv"),
            output_dir: PathBuf::from("RAPPORTS"),
            font_path: None,
            api_key: String::new(),
            api_endpoint: "https://api.perplexity.ai/chat/completions".to_string(),
            model: "sonar-pro".to_string(),
            temperature: 0.3,
            request_timeout: Duration::from_secs(60),
            price_policy: PricePolicy::Skip,
            currency_suffix: "€".to_string(),
            csv_delimiter: b';',
            prompt_template: None,
        }
    }
}

impl RunConfig {
    /// Create a new configuration builder
    pub fn builder() -> RunConfigBuilder {
        RunConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(RapportError::Config(
                "completion-service API key is empty".to_string(),
            ));
        }
        if self.api_endpoint.trim().is_empty() {
            return Err(RapportError::Config(
                "completion endpoint URL is empty".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(RapportError::Config(format!(
                "temperature {} out of range [0, 2]",
                self.temperature
            )));
        }
        if self.request_timeout.is_zero() {
            return Err(RapportError::Config(
                "request timeout must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for [`RunConfig`]
#[derive(Debug, Default)]
pub struct RunConfigBuilder {
    input_path: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    font_path: Option<PathBuf>,
    api_key: Option<String>,
    api_endpoint: Option<String>,
    model: Option<String>,
    temperature: Option<f32>,
    request_timeout: Option<Duration>,
    price_policy: Option<PricePolicy>,
    currency_suffix: Option<String>,
    csv_delimiter: Option<u8>,
    prompt_template: Option<String>,
}

impl RunConfigBuilder {
    /// Set the holdings file path
    pub fn input_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.input_path = Some(path.into());
        self
    }

    /// Set the output directory
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Set the external font path
    pub fn font_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.font_path = Some(path.into());
        self
    }

    /// Set the API key
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the completion endpoint
    pub fn api_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.api_endpoint = Some(endpoint.into());
        self
    }

    /// Set the model identifier
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the sampling temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the completion request timeout
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Set the missing-price policy
    pub fn price_policy(mut self, policy: PricePolicy) -> Self {
        self.price_policy = Some(policy);
        self
    }

    /// Set the currency suffix
    pub fn currency_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.currency_suffix = Some(suffix.into());
        self
    }

    /// Set the holdings file delimiter
    pub fn csv_delimiter(mut self, delimiter: u8) -> Self {
        self.csv_delimiter = Some(delimiter);
        self
    }

    /// Override the analysis prompt template
    pub fn prompt_template(mut self, template: impl Into<String>) -> Self {
        self.prompt_template = Some(template.into());
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<RunConfig> {
        let defaults = RunConfig::default();

        let config = RunConfig {
            input_path: self.input_path.unwrap_or(defaults.input_path),
            output_dir: self.output_dir.unwrap_or(defaults.output_dir),
            font_path: self.font_path,
            api_key: self.api_key.unwrap_or(defaults.api_key),
            api_endpoint: self.api_endpoint.unwrap_or(defaults.api_endpoint),
            model: self.model.unwrap_or(defaults.model),
            temperature: self.temperature.unwrap_or(defaults.temperature),
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
            price_policy: self.price_policy.unwrap_or(defaults.price_policy),
            currency_suffix: self.currency_suffix.unwrap_or(defaults.currency_suffix),
            csv_delimiter: self.csv_delimiter.unwrap_or(defaults.csv_delimiter),
            prompt_template: self.prompt_template,
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RunConfig::default();
        assert_eq!(config.temperature, 0.3);
        assert_eq!(config.request_timeout, Duration::from_secs(60));
        assert_eq!(config.price_policy, PricePolicy::Skip);
        assert_eq!(config.csv_delimiter, b';');
    }

    #[test]
    fn test_builder() {
        let config = RunConfig::builder()
            .api_key("pplx-test")
            .output_dir("out")
            .price_policy(PricePolicy::Placeholder)
            .request_timeout(Duration::from_secs(30))
            .build()
            .unwrap();

        assert_eq!(config.api_key, "pplx-test");
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.price_policy, PricePolicy::Placeholder);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_validation_rejects_empty_key() {
        let result = RunConfig::builder().build();
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_rejects_bad_temperature() {
        let result = RunConfig::builder()
            .api_key("pplx-test")
            .temperature(3.5)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_rejects_zero_timeout() {
        let result = RunConfig::builder()
            .api_key("pplx-test")
            .request_timeout(Duration::ZERO)
            .build();
        assert!(result.is_err());
    }
}
