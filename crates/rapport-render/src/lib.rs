//! PDF report rendering
//!
//! One A4 document per holding: title, price line, the sanitized analysis
//! body as flowing paragraphs with automatic page breaks, and an optional
//! trailing sources section. File names are a deterministic function of the
//! holding identity.
//!
//! Font handling is the one fatal failure mode of the pipeline: when an
//! external font is configured and cannot be loaded, every subsequent report
//! would be equally broken, so the error propagates instead of being skipped.

mod layout;

pub use layout::wrap_text;

use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference};
use rapport_core::{Holding, RapportError, Report, Result};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

// A4 geometry, all in millimeters
const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN_LEFT: f32 = 20.0;
const MARGIN_TOP: f32 = 20.0;
const MARGIN_BOTTOM: f32 = 20.0;
const TITLE_SIZE: f32 = 16.0;
const BODY_SIZE: f32 = 11.0;
const SOURCE_SIZE: f32 = 9.0;
const LINE_HEIGHT: f32 = 6.0;
/// Greedy wrap width for the body column at 11pt Helvetica
const BODY_COLUMN_CHARS: usize = 80;

/// Seam between the orchestrator and document output
pub trait ReportRenderer: Send + Sync {
    /// Write one document; returns the path of the written file
    fn render(&self, report: &Report) -> Result<PathBuf>;
}

/// Renderer producing one PDF per report under a fixed output directory
pub struct PdfRenderer {
    output_dir: PathBuf,
    font_path: Option<PathBuf>,
    currency_suffix: String,
}

impl PdfRenderer {
    /// Create a renderer, verifying the font resource up front
    ///
    /// An unreadable external font aborts here, before any processing.
    pub fn new(
        output_dir: impl Into<PathBuf>,
        font_path: Option<PathBuf>,
        currency_suffix: impl Into<String>,
    ) -> Result<Self> {
        if let Some(path) = &font_path {
            if !path.is_file() {
                return Err(RapportError::FontResource {
                    path: path.clone(),
                    detail: "font file not found".to_string(),
                });
            }
        }
        Ok(Self {
            output_dir: output_dir.into(),
            font_path,
            currency_suffix: currency_suffix.into(),
        })
    }

    fn load_fonts(
        &self,
        doc: &PdfDocumentReference,
    ) -> Result<(IndirectFontRef, IndirectFontRef)> {
        match &self.font_path {
            Some(path) => {
                let file = File::open(path).map_err(|e| RapportError::FontResource {
                    path: path.clone(),
                    detail: e.to_string(),
                })?;
                let font = doc
                    .add_external_font(file)
                    .map_err(|e| RapportError::FontResource {
                        path: path.clone(),
                        detail: e.to_string(),
                    })?;
                // A single external face serves both weights
                Ok((font.clone(), font))
            }
            None => {
                let regular = builtin(doc, BuiltinFont::Helvetica)?;
                let bold = builtin(doc, BuiltinFont::HelveticaBold)?;
                Ok((regular, bold))
            }
        }
    }

    fn price_line(&self, price: Option<f64>) -> String {
        match price {
            Some(value) => format!("Cours actuel : {value:.2} {}", self.currency_suffix),
            None => "Cours actuel : non disponible".to_string(),
        }
    }
}

fn builtin(doc: &PdfDocumentReference, font: BuiltinFont) -> Result<IndirectFontRef> {
    doc.add_builtin_font(font).map_err(|e| RapportError::FontResource {
        path: PathBuf::from("<builtin>"),
        detail: e.to_string(),
    })
}

impl ReportRenderer for PdfRenderer {
    fn render(&self, report: &Report) -> Result<PathBuf> {
        let path = self.output_dir.join(output_filename(&report.holding));
        debug!("rendering {}", path.display());

        let title = format!("Rapport : {}", report.holding.name);
        let (doc, page, layer) = PdfDocument::new(&title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Page 1");
        let (font, font_bold) = self.load_fonts(&doc)?;

        let mut writer = PageWriter::new(&doc, page, layer);

        writer.text(&title, TITLE_SIZE, &font_bold);
        writer.advance(LINE_HEIGHT * 2.0);
        writer.text(&self.price_line(report.price), 12.0, &font);
        writer.advance(LINE_HEIGHT);

        for line in wrap_text(&report.body, BODY_COLUMN_CHARS) {
            writer.line(&line, BODY_SIZE, &font);
        }

        if !report.sources.is_empty() {
            writer.advance(LINE_HEIGHT);
            writer.line("Sources & citations :", BODY_SIZE, &font_bold);
            for source in &report.sources {
                writer.line(source, SOURCE_SIZE, &font);
            }
        }

        let date = chrono::Local::now().format("%d/%m/%Y");
        writer.footer(&format!("Généré le {date}"), &font);

        let file = File::create(&path).map_err(|e| RapportError::Render {
            path: path.clone(),
            detail: e.to_string(),
        })?;
        doc.save(&mut BufWriter::new(file))
            .map_err(|e| RapportError::Render {
                path: path.clone(),
                detail: e.to_string(),
            })?;

        info!("wrote {}", path.display());
        Ok(path)
    }
}

/// Y-cursor over a growing document, breaking to a new page at the bottom margin
struct PageWriter<'a> {
    doc: &'a PdfDocumentReference,
    layer: printpdf::PdfLayerReference,
    y: f32,
}

impl<'a> PageWriter<'a> {
    fn new(
        doc: &'a PdfDocumentReference,
        page: printpdf::PdfPageIndex,
        layer: printpdf::PdfLayerIndex,
    ) -> Self {
        Self {
            doc,
            layer: doc.get_page(page).get_layer(layer),
            y: PAGE_HEIGHT - MARGIN_TOP,
        }
    }

    fn advance(&mut self, by: f32) {
        self.y -= by;
    }

    fn break_page_if_needed(&mut self) {
        if self.y < MARGIN_BOTTOM {
            let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Page");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = PAGE_HEIGHT - MARGIN_TOP;
        }
    }

    /// Place text at the cursor without moving it
    fn text(&mut self, text: &str, size: f32, font: &IndirectFontRef) {
        self.break_page_if_needed();
        self.layer.use_text(text, size, Mm(MARGIN_LEFT), Mm(self.y), font);
    }

    /// Place one line and advance the cursor
    fn line(&mut self, text: &str, size: f32, font: &IndirectFontRef) {
        self.text(text, size, font);
        self.advance(LINE_HEIGHT);
    }

    /// Footer on the current page, below the bottom margin
    fn footer(&self, text: &str, font: &IndirectFontRef) {
        self.layer.use_text(text, 8.0, Mm(MARGIN_LEFT), Mm(12.0), font);
    }
}

/// Deterministic output name for a holding: `rapport_{name}_{symbol}.pdf`
///
/// Path-unsafe characters are replaced with underscores. The symbol is part
/// of the name, so two distinct holdings only collide when they share the
/// full identity, in which case overwriting is the intended behavior.
pub fn output_filename(holding: &Holding) -> String {
    format!(
        "rapport_{}_{}.pdf",
        safe_component(&holding.name),
        safe_component(&holding.symbol)
    )
}

fn safe_component(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| match c {
            ' ' | '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c => c,
        })
        .collect()
}

/// Render a price exactly as the document's price line does, without the label
pub fn format_price(price: Option<f64>, currency_suffix: &str) -> String {
    match price {
        Some(value) => format!("{value:.2} {currency_suffix}"),
        None => "non disponible".to_string(),
    }
}
