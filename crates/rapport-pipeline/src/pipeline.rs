//! Two-phase orchestration: preview prices, confirm, generate reports
//!
//! Phase 1 resolves a price for every valid holding and displays the result;
//! no document is written and no completion call is made. The confirmation
//! gate then decides whether Phase 2 runs at all. Phase 2 walks the holdings
//! in input order, reusing the Phase-1 prices, and isolates every per-holding
//! failure: only a renderer error (missing font resource) aborts the loop,
//! because it would invalidate every subsequent document.

use crate::gate::ConfirmationGate;
use rapport_analysis::AnalysisService;
use rapport_core::{
    AnalysisOutcome, Holding, PricePolicy, Report, Result, RunConfig, RunOutcome, RunSummary,
};
use rapport_prices::PriceResolver;
use rapport_render::ReportRenderer;
use rapport_sanitize::sanitize;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

/// One row of the Phase-1 price preview
#[derive(Debug, Clone)]
pub struct PreviewRow {
    pub holding: Holding,
    pub price: Option<f64>,
}

type PreviewDisplay = Box<dyn Fn(&[PreviewRow]) + Send + Sync>;

/// The report-generation orchestrator
///
/// Collaborators are trait objects so tests can substitute each seam.
pub struct Pipeline {
    resolver: Arc<dyn PriceResolver>,
    analyst: Arc<dyn AnalysisService>,
    renderer: Box<dyn ReportRenderer>,
    gate: Box<dyn ConfirmationGate>,
    config: RunConfig,
    cancel: Arc<AtomicBool>,
    preview_display: Option<PreviewDisplay>,
}

impl Pipeline {
    pub fn new(
        resolver: Arc<dyn PriceResolver>,
        analyst: Arc<dyn AnalysisService>,
        renderer: Box<dyn ReportRenderer>,
        gate: Box<dyn ConfirmationGate>,
        config: RunConfig,
    ) -> Self {
        Self {
            resolver,
            analyst,
            renderer,
            gate,
            config,
            cancel: Arc::new(AtomicBool::new(false)),
            preview_display: None,
        }
    }

    /// Install a hook that renders the Phase-1 preview (the CLI prints a table)
    pub fn with_preview_display(mut self, display: PreviewDisplay) -> Self {
        self.preview_display = Some(display);
        self
    }

    /// Flag checked between holdings; set it to stop the run cooperatively
    ///
    /// An in-flight request is not interrupted; it finishes or times out,
    /// then the loop stops before the next holding.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Phase 1: resolve a price for every valid holding, in input order
    pub async fn preview(&self, holdings: &[Holding]) -> Vec<PreviewRow> {
        let mut rows = Vec::new();
        for holding in holdings {
            if !holding.is_valid() {
                debug!("preview: ignoring row without name or symbol");
                continue;
            }
            let price = self.resolver.resolve(&holding.symbol).await;
            info!(
                "{} : {}",
                holding.label(),
                price.map_or_else(
                    || "N/A".to_string(),
                    |p| format!("{p:.2} {}", self.config.currency_suffix)
                )
            );
            rows.push(PreviewRow {
                holding: holding.clone(),
                price,
            });
        }
        rows
    }

    /// Run both phases; returns `Aborted` when the gate declines
    pub async fn run(&self, holdings: &[Holding]) -> Result<RunOutcome> {
        info!("phase 1 : résolution des prix pour {} lignes", holdings.len());
        let preview = self.preview(holdings).await;
        if let Some(display) = &self.preview_display {
            display(&preview);
        }

        if !self.gate.confirm().await {
            info!("génération interrompue par l'utilisateur");
            return Ok(RunOutcome::Aborted);
        }

        // Phase-1 prices are reused verbatim: what the user confirmed is what
        // the reports show, and each symbol costs one provider call per run.
        let prices: HashMap<String, f64> = preview
            .into_iter()
            .filter_map(|row| row.price.map(|p| (row.holding.symbol, p)))
            .collect();

        info!("phase 2 : génération des rapports");
        let mut summary = RunSummary::default();
        for (index, holding) in holdings.iter().enumerate() {
            if self.cancel.load(Ordering::Relaxed) {
                summary.cancelled = holdings.len() - index;
                warn!(
                    "arrêt demandé : {} ligne(s) non traitée(s)",
                    summary.cancelled
                );
                break;
            }

            if !holding.is_valid() {
                warn!("ligne ignorée : nom ou code manquant");
                summary.skipped_invalid += 1;
                continue;
            }

            let price = prices.get(&holding.symbol).copied();
            if price.is_none() && self.config.price_policy == PricePolicy::Skip {
                warn!("prix introuvable pour {}, analyse sautée", holding.label());
                summary.skipped_no_price += 1;
                continue;
            }

            let (body, sources) = match self.analyst.analyze(holding, price).await {
                AnalysisOutcome::Success { text, sources } => (sanitize(&text), sources),
                AnalysisOutcome::Failure { kind, detail } => {
                    warn!("analyse en échec pour {} : {detail}", holding.label());
                    summary.analysis_failures += 1;
                    (
                        sanitize(&AnalysisOutcome::fallback_body(kind, &detail)),
                        Vec::new(),
                    )
                }
            };

            let report = Report {
                holding: holding.clone(),
                price,
                body,
                sources,
            };
            // A renderer failure is the one fatal per-holding condition
            let path = self.renderer.render(&report)?;
            info!("rapport généré : {}", path.display());
            summary.generated += 1;
        }

        info!(
            "terminé : {} générés, {} sans prix, {} lignes invalides, {} analyses en échec",
            summary.generated,
            summary.skipped_no_price,
            summary.skipped_invalid,
            summary.analysis_failures
        );
        Ok(RunOutcome::Completed(summary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::PresetGate;
    use async_trait::async_trait;
    use rapport_core::{FailureKind, RapportError};
    use std::path::PathBuf;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;

    struct StubResolver {
        prices: HashMap<String, f64>,
        calls: AtomicUsize,
    }

    impl StubResolver {
        fn new(prices: &[(&str, f64)]) -> Self {
            Self {
                prices: prices
                    .iter()
                    .map(|(s, p)| ((*s).to_string(), *p))
                    .collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl PriceResolver for StubResolver {
        async fn resolve(&self, symbol: &str) -> Option<f64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prices.get(symbol).copied()
        }
    }

    struct StubAnalyst {
        outcome: AnalysisOutcome,
        calls: AtomicUsize,
    }

    impl StubAnalyst {
        fn succeeding() -> Self {
            Self {
                outcome: AnalysisOutcome::success(
                    "Une **analyse** détaillée.",
                    vec!["https://example.com".to_string()],
                ),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing(kind: FailureKind) -> Self {
            Self {
                outcome: AnalysisOutcome::failure(kind, "60s elapsed"),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl AnalysisService for StubAnalyst {
        async fn analyze(&self, _holding: &Holding, _price: Option<f64>) -> AnalysisOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcome.clone()
        }
    }

    #[derive(Default)]
    struct RecordingRenderer {
        rendered: Mutex<Vec<Report>>,
    }

    impl ReportRenderer for RecordingRenderer {
        fn render(&self, report: &Report) -> Result<PathBuf> {
            self.rendered.lock().unwrap().push(report.clone());
            Ok(PathBuf::from(format!(
                "{}.pdf",
                report.holding.symbol.to_lowercase()
            )))
        }
    }

    // Lets a test keep a handle on the renderer the pipeline consumed
    struct SharedRenderer(Arc<RecordingRenderer>);

    impl ReportRenderer for SharedRenderer {
        fn render(&self, report: &Report) -> Result<PathBuf> {
            self.0.render(report)
        }
    }

    struct FailingRenderer;

    impl ReportRenderer for FailingRenderer {
        fn render(&self, _report: &Report) -> Result<PathBuf> {
            Err(RapportError::FontResource {
                path: PathBuf::from("/fonts/arial.ttf"),
                detail: "gone".to_string(),
            })
        }
    }

    fn config(policy: PricePolicy) -> RunConfig {
        RunConfig::builder()
            .api_key("pplx-test")
            .price_policy(policy)
            .build()
            .unwrap()
    }

    fn pipeline_with(
        resolver: Arc<StubResolver>,
        analyst: Arc<StubAnalyst>,
        renderer: Box<dyn ReportRenderer>,
        confirmed: bool,
        policy: PricePolicy,
    ) -> Pipeline {
        Pipeline::new(
            resolver,
            analyst,
            renderer,
            Box::new(PresetGate(confirmed)),
            config(policy),
        )
    }

    #[tokio::test]
    async fn test_declined_gate_makes_no_calls_and_no_documents() {
        let resolver = Arc::new(StubResolver::new(&[("ACM", 10.0)]));
        let analyst = Arc::new(StubAnalyst::succeeding());
        let renderer = Box::<RecordingRenderer>::default();
        let pipeline = pipeline_with(
            Arc::clone(&resolver),
            Arc::clone(&analyst),
            renderer,
            false,
            PricePolicy::Skip,
        );

        let outcome = pipeline.run(&[Holding::new("Acme", "ACM")]).await.unwrap();

        assert_eq!(outcome, RunOutcome::Aborted);
        assert_eq!(analyst.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalid_holding_skipped_one_document_for_acme() {
        let resolver = Arc::new(StubResolver::new(&[("ACM", 10.0), ("XYZ", 5.0)]));
        let analyst = Arc::new(StubAnalyst::succeeding());
        let rendered = Arc::new(RecordingRenderer::default());
        let pipeline = Pipeline::new(
            resolver,
            analyst,
            Box::new(SharedRenderer(Arc::clone(&rendered))),
            Box::new(PresetGate(true)),
            config(PricePolicy::Skip),
        );

        let holdings = [Holding::new("Acme", "ACM"), Holding::new("", "XYZ")];
        let outcome = pipeline.run(&holdings).await.unwrap();

        let RunOutcome::Completed(summary) = outcome else {
            panic!("expected completion");
        };
        assert_eq!(summary.generated, 1);
        assert_eq!(summary.skipped_invalid, 1);
        let reports = rendered.rendered.lock().unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].holding.name, "Acme");
    }

    #[tokio::test]
    async fn test_skip_policy_produces_no_document_for_missing_price() {
        let resolver = Arc::new(StubResolver::new(&[]));
        let analyst = Arc::new(StubAnalyst::succeeding());
        let pipeline = pipeline_with(
            resolver,
            Arc::clone(&analyst),
            Box::<RecordingRenderer>::default(),
            true,
            PricePolicy::Skip,
        );

        let outcome = pipeline.run(&[Holding::new("Acme", "ACM")]).await.unwrap();

        let RunOutcome::Completed(summary) = outcome else {
            panic!("expected completion");
        };
        assert_eq!(summary.generated, 0);
        assert_eq!(summary.skipped_no_price, 1);
        assert_eq!(analyst.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_placeholder_policy_renders_without_price() {
        let resolver = Arc::new(StubResolver::new(&[]));
        let analyst = Arc::new(StubAnalyst::succeeding());
        let rendered = Arc::new(RecordingRenderer::default());
        let pipeline = Pipeline::new(
            resolver,
            analyst,
            Box::new(SharedRenderer(Arc::clone(&rendered))),
            Box::new(PresetGate(true)),
            config(PricePolicy::Placeholder),
        );

        let outcome = pipeline.run(&[Holding::new("Acme", "ACM")]).await.unwrap();

        let RunOutcome::Completed(summary) = outcome else {
            panic!("expected completion");
        };
        assert_eq!(summary.generated, 1);
        assert_eq!(summary.skipped_no_price, 0);
        let reports = rendered.rendered.lock().unwrap();
        assert_eq!(reports[0].price, None);
    }

    #[tokio::test]
    async fn test_timeout_failure_still_renders_fallback_document() {
        let resolver = Arc::new(StubResolver::new(&[("ACM", 10.0)]));
        let analyst = Arc::new(StubAnalyst::failing(FailureKind::Timeout));
        let rendered = Arc::new(RecordingRenderer::default());
        let pipeline = Pipeline::new(
            resolver,
            analyst,
            Box::new(SharedRenderer(Arc::clone(&rendered))),
            Box::new(PresetGate(true)),
            config(PricePolicy::Skip),
        );

        let outcome = pipeline.run(&[Holding::new("Acme", "ACM")]).await.unwrap();

        let RunOutcome::Completed(summary) = outcome else {
            panic!("expected completion");
        };
        assert_eq!(summary.generated, 1);
        assert_eq!(summary.analysis_failures, 1);
        let reports = rendered.rendered.lock().unwrap();
        assert!(reports[0].body.contains("Analyse indisponible"));
        assert!(reports[0].body.contains("délai d'attente dépassé"));
        assert!(reports[0].sources.is_empty());
    }

    #[tokio::test]
    async fn test_body_is_sanitized_before_rendering() {
        let resolver = Arc::new(StubResolver::new(&[("ACM", 10.0)]));
        let analyst = Arc::new(StubAnalyst::succeeding());
        let rendered = Arc::new(RecordingRenderer::default());
        let pipeline = Pipeline::new(
            resolver,
            analyst,
            Box::new(SharedRenderer(Arc::clone(&rendered))),
            Box::new(PresetGate(true)),
            config(PricePolicy::Skip),
        );

        pipeline.run(&[Holding::new("Acme", "ACM")]).await.unwrap();

        let reports = rendered.rendered.lock().unwrap();
        assert_eq!(reports[0].body, "Une analyse détaillée.");
    }

    #[tokio::test]
    async fn test_prices_resolved_once_and_reused_in_phase_2() {
        let resolver = Arc::new(StubResolver::new(&[("ACM", 10.0), ("BTA", 20.0)]));
        let analyst = Arc::new(StubAnalyst::succeeding());
        let pipeline = pipeline_with(
            Arc::clone(&resolver),
            analyst,
            Box::<RecordingRenderer>::default(),
            true,
            PricePolicy::Skip,
        );

        let holdings = [Holding::new("Acme", "ACM"), Holding::new("Beta", "BTA")];
        pipeline.run(&holdings).await.unwrap();

        // one lookup per holding, none re-done in Phase 2
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cancellation_between_holdings() {
        let resolver = Arc::new(StubResolver::new(&[("ACM", 10.0), ("BTA", 20.0)]));
        let analyst = Arc::new(StubAnalyst::succeeding());
        let pipeline = pipeline_with(
            resolver,
            Arc::clone(&analyst),
            Box::<RecordingRenderer>::default(),
            true,
            PricePolicy::Skip,
        );
        pipeline.cancel_flag().store(true, Ordering::Relaxed);

        let holdings = [Holding::new("Acme", "ACM"), Holding::new("Beta", "BTA")];
        let outcome = pipeline.run(&holdings).await.unwrap();

        let RunOutcome::Completed(summary) = outcome else {
            panic!("expected completion");
        };
        assert_eq!(summary.generated, 0);
        assert_eq!(summary.cancelled, 2);
        assert_eq!(analyst.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_renderer_failure_aborts_the_run() {
        let resolver = Arc::new(StubResolver::new(&[("ACM", 10.0)]));
        let analyst = Arc::new(StubAnalyst::succeeding());
        let pipeline = pipeline_with(
            resolver,
            analyst,
            Box::new(FailingRenderer),
            true,
            PricePolicy::Skip,
        );

        let result = pipeline.run(&[Holding::new("Acme", "ACM")]).await;
        assert!(matches!(result, Err(RapportError::FontResource { .. })));
    }

    #[tokio::test]
    async fn test_preview_skips_invalid_rows() {
        let resolver = Arc::new(StubResolver::new(&[("ACM", 10.0)]));
        let analyst = Arc::new(StubAnalyst::succeeding());
        let pipeline = pipeline_with(
            Arc::clone(&resolver),
            analyst,
            Box::<RecordingRenderer>::default(),
            true,
            PricePolicy::Skip,
        );

        let holdings = [Holding::new("Acme", "ACM"), Holding::new("", "XYZ")];
        let rows = pipeline.preview(&holdings).await;

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].price, Some(10.0));
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 1);
    }
}
