//! Command-line interface for the rapport report generator
//!
//! `rapport generate` runs the full two-phase pipeline: price preview,
//! confirmation gate, then one PDF per holding. `rapport check-prices` only
//! runs the preview. The completion-service key comes from the
//! `PERPLEXITY_API_KEY` environment variable, never from a flag.

mod logging;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use comfy_table::Table;
use rapport_analysis::AnalysisClient;
use rapport_core::{PricePolicy, RunConfig, RunOutcome};
use rapport_pipeline::{ConfirmationGate, Pipeline, PresetGate, PreviewRow, StdinGate, load_holdings};
use rapport_prices::{PriceResolver, YahooResolver};
use rapport_render::{PdfRenderer, format_price};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tracing::warn;

#[derive(Parser, Debug)]
#[command(name = "rapport")]
#[command(about = "Génère un rapport d'analyse PDF par ligne de portefeuille", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Prévisualise les prix, demande confirmation, puis génère les rapports
    Generate(GenerateArgs),
    /// Affiche seulement les prix actuels, sans générer de rapport
    CheckPrices(CheckArgs),
}

#[derive(Args, Debug)]
struct CheckArgs {
    /// Fichier de positions (CSV délimité)
    #[arg(short, long, default_value = "positions.csv")]
    input: PathBuf,

    /// Délimiteur du fichier de positions (un caractère ASCII)
    #[arg(long, default_value = ";", value_parser = parse_delimiter)]
    delimiter: char,

    /// Suffixe monétaire affiché après les prix
    #[arg(long, default_value = "€")]
    currency: String,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    #[command(flatten)]
    check: CheckArgs,

    /// Répertoire de sortie des PDF
    #[arg(short, long, default_value = "RAPPORTS")]
    output_dir: PathBuf,

    /// Police TTF externe pour le rendu (Helvetica intégrée sinon)
    #[arg(long)]
    font: Option<PathBuf>,

    /// URL du service de complétion
    #[arg(long, default_value = "https://api.perplexity.ai/chat/completions")]
    endpoint: String,

    /// Identifiant du modèle
    #[arg(long, default_value = "sonar-pro")]
    model: String,

    /// Délai maximal d'une requête d'analyse, en secondes
    #[arg(long, default_value_t = 60)]
    timeout: u64,

    /// Comportement quand aucun prix n'est résolu
    #[arg(long, value_enum, default_value_t = MissingPrice::Skip)]
    on_missing_price: MissingPrice,

    /// Gabarit minijinja remplaçant le prompt d'analyse par défaut
    #[arg(long)]
    prompt_template: Option<String>,

    /// Passe la confirmation (exécution scriptée)
    #[arg(short = 'y', long)]
    yes: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum MissingPrice {
    /// Sauter la ligne, aucun document
    Skip,
    /// Générer le document avec "non disponible"
    Placeholder,
}

/// CSV delimiters are single bytes; reject anything a cast would mangle
fn parse_delimiter(raw: &str) -> Result<char, String> {
    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii() => Ok(c),
        (Some(_), None) => Err("le délimiteur doit être un caractère ASCII".to_string()),
        _ => Err("le délimiteur doit être un caractère unique".to_string()),
    }
}

impl From<MissingPrice> for PricePolicy {
    fn from(value: MissingPrice) -> Self {
        match value {
            MissingPrice::Skip => Self::Skip,
            MissingPrice::Placeholder => Self::Placeholder,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_tracing();

    match Cli::parse().command {
        Command::Generate(args) => generate(args).await,
        Command::CheckPrices(args) => check_prices(args).await,
    }
}

async fn generate(args: GenerateArgs) -> anyhow::Result<()> {
    let api_key = std::env::var("PERPLEXITY_API_KEY")
        .context("la variable d'environnement PERPLEXITY_API_KEY n'est pas définie")?;

    let mut builder = RunConfig::builder()
        .input_path(&args.check.input)
        .output_dir(&args.output_dir)
        .api_key(api_key)
        .api_endpoint(args.endpoint.as_str())
        .model(args.model.as_str())
        .request_timeout(Duration::from_secs(args.timeout))
        .price_policy(args.on_missing_price.into())
        .currency_suffix(args.check.currency.as_str())
        .csv_delimiter(args.check.delimiter as u8);
    if let Some(font) = &args.font {
        builder = builder.font_path(font);
    }
    if let Some(template) = &args.prompt_template {
        builder = builder.prompt_template(template.as_str());
    }
    let config = builder.build()?;

    std::fs::create_dir_all(&config.output_dir).with_context(|| {
        format!("impossible de créer {}", config.output_dir.display())
    })?;

    let holdings = load_holdings(&config.input_path, config.csv_delimiter)?;

    // The renderer verifies the font up front: a missing glyph set would
    // invalidate every report, so it aborts before any processing.
    let renderer = PdfRenderer::new(
        &config.output_dir,
        config.font_path.clone(),
        config.currency_suffix.as_str(),
    )?;
    let analyst = Arc::new(AnalysisClient::new(&config)?);
    let gate: Box<dyn ConfirmationGate> = if args.yes {
        Box::new(PresetGate(true))
    } else {
        Box::new(StdinGate)
    };

    let currency = config.currency_suffix.clone();
    let pipeline = Pipeline::new(
        Arc::new(YahooResolver::new()),
        analyst,
        Box::new(renderer),
        gate,
        config,
    )
    .with_preview_display(Box::new(move |rows| {
        println!("{}", price_table(rows, &currency));
    }));

    let cancel = pipeline.cancel_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interruption demandée, arrêt après la ligne en cours");
            cancel.store(true, Ordering::Relaxed);
        }
    });

    match pipeline.run(&holdings).await? {
        RunOutcome::Aborted => {
            println!("Analyse interrompue par l'utilisateur.");
        }
        RunOutcome::Completed(summary) => {
            println!(
                "Terminé : {} rapport(s) généré(s), {} sans prix, {} ligne(s) invalide(s), \
                 {} analyse(s) en échec.",
                summary.generated,
                summary.skipped_no_price,
                summary.skipped_invalid,
                summary.analysis_failures
            );
            if summary.cancelled > 0 {
                println!("{} ligne(s) non traitée(s) après interruption.", summary.cancelled);
            }
        }
    }
    Ok(())
}

async fn check_prices(args: CheckArgs) -> anyhow::Result<()> {
    let holdings = load_holdings(&args.input, args.delimiter as u8)?;
    let resolver = YahooResolver::new();

    let mut rows = Vec::new();
    for holding in &holdings {
        if !holding.is_valid() {
            warn!("ligne ignorée : nom ou code manquant");
            continue;
        }
        let price = resolver.resolve(&holding.symbol).await;
        rows.push(PreviewRow {
            holding: holding.clone(),
            price,
        });
    }

    println!("{}", price_table(&rows, &args.currency));
    Ok(())
}

/// Phase-1 preview as a table: name, symbol, price or N/A marker
fn price_table(rows: &[PreviewRow], currency: &str) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Titre", "Code", "Cours"]);
    for row in rows {
        table.add_row(vec![
            row.holding.name.clone(),
            row.holding.symbol.clone(),
            format_price(row.price, currency),
        ]);
    }
    table
}
