//! Completion-service client
//!
//! One synchronous request per holding, no retries. Every failure is
//! classified into an [`AnalysisOutcome::Failure`] instead of being raised:
//! the orchestrator decides what a failed analysis means for the run.

use crate::prompt::AnalysisPrompt;
use async_trait::async_trait;
use rapport_core::{AnalysisOutcome, FailureKind, Holding, RapportError, Result, RunConfig};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

/// Seam between the orchestrator and the completion service
#[async_trait]
pub trait AnalysisService: Send + Sync {
    /// Request an analysis for one holding; failures are classified, not raised
    async fn analyze(&self, holding: &Holding, price: Option<f64>) -> AnalysisOutcome;
}

/// HTTP client for a chat-completions endpoint (Perplexity-compatible)
pub struct AnalysisClient {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
    prompt: AnalysisPrompt,
    currency_suffix: String,
}

impl AnalysisClient {
    /// Build a client from the run configuration
    ///
    /// The request timeout is set on the underlying HTTP client, so a stalled
    /// request surfaces as a classified `Timeout` rather than blocking.
    pub fn new(config: &RunConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| RapportError::Config(format!("cannot build HTTP client: {e}")))?;

        let prompt = config
            .prompt_template
            .as_deref()
            .map_or_else(AnalysisPrompt::default, AnalysisPrompt::new);

        Ok(Self {
            client,
            endpoint: config.api_endpoint.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            prompt,
            currency_suffix: config.currency_suffix.clone(),
        })
    }
}

#[async_trait]
impl AnalysisService for AnalysisClient {
    #[instrument(skip(self, holding), fields(symbol = %holding.symbol))]
    async fn analyze(&self, holding: &Holding, price: Option<f64>) -> AnalysisOutcome {
        let prompt = match self.prompt.render(holding, price, &self.currency_suffix) {
            Ok(prompt) => prompt,
            Err(e) => {
                return AnalysisOutcome::failure(
                    FailureKind::Unexpected,
                    format!("prompt rendering failed: {e}"),
                );
            }
        };

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt,
            }],
            temperature: self.temperature,
        };

        debug!("sending completion request to {}", self.endpoint);
        let response = match self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
        {
            Ok(response) => response,
            // Classification priority: timeout first, everything else is unexpected
            Err(e) if e.is_timeout() => {
                warn!("completion request timed out for {}", holding.label());
                return AnalysisOutcome::failure(FailureKind::Timeout, e.to_string());
            }
            Err(e) => {
                return AnalysisOutcome::failure(FailureKind::Unexpected, e.to_string());
            }
        };

        let status = response.status();
        if !status.is_success() {
            // The client-level timeout can still fire while the body streams in
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) if e.is_timeout() => {
                    warn!("completion request timed out for {}", holding.label());
                    return AnalysisOutcome::failure(FailureKind::Timeout, e.to_string());
                }
                Err(_) => String::new(),
            };
            warn!("completion service returned {status} for {}", holding.label());
            return AnalysisOutcome::failure(
                FailureKind::HttpError,
                format!("HTTP {status}: {body}"),
            );
        }

        match response.json::<ChatResponse>().await {
            Ok(envelope) => extract_outcome(envelope),
            Err(e) if e.is_timeout() => {
                warn!("completion request timed out for {}", holding.label());
                AnalysisOutcome::failure(FailureKind::Timeout, e.to_string())
            }
            Err(e) => AnalysisOutcome::failure(
                FailureKind::Unexpected,
                format!("malformed response: {e}"),
            ),
        }
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    /// Structured source entries (older envelope shape)
    #[serde(default)]
    sources: Vec<SourceEntry>,
    /// Plain citation URLs (shape returned by the live Perplexity API)
    #[serde(default)]
    citations: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Extract text and citations from a parsed envelope
fn extract_outcome(envelope: ChatResponse) -> AnalysisOutcome {
    let Some(choice) = envelope.choices.into_iter().next() else {
        return AnalysisOutcome::failure(FailureKind::Unexpected, "no choices in response");
    };
    let Some(content) = choice.message.content else {
        return AnalysisOutcome::failure(FailureKind::Unexpected, "missing message content");
    };

    let mut sources: Vec<String> = envelope
        .sources
        .into_iter()
        .filter_map(|s| s.link)
        .filter(|link| !link.is_empty())
        .collect();
    if sources.is_empty() {
        sources = envelope.citations;
    }

    AnalysisOutcome::success(content.trim(), sources)
}

#[derive(Debug, Deserialize)]
struct SourceEntry {
    #[serde(default)]
    link: Option<String>,
}
