//! Prompt construction for the analysis request
//!
//! Templates use minijinja syntax with `{{ name }}` and `{{ symbol }}`
//! variables. When a price is known it is appended as its own sentence after
//! the rendered template, so custom templates do not need to mention it.

use minijinja::Environment;
use rapport_core::Holding;

/// Default analysis prompt (French, matching the report language)
pub const DEFAULT_TEMPLATE: &str = "\
Rédige une analyse financière synthétique de l'action {{ name }} (code {{ symbol }}) : \
activité de la société, derniers résultats publiés, perspectives et principaux risques. \
Termine par un avis sur la valorisation actuelle et cite tes sources.";

/// A compiled analysis prompt
#[derive(Debug, Clone)]
pub struct AnalysisPrompt {
    template: String,
}

impl AnalysisPrompt {
    /// Use a custom minijinja template
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Build the full prompt for one holding
    pub fn render(
        &self,
        holding: &Holding,
        price: Option<f64>,
        currency_suffix: &str,
    ) -> Result<String, minijinja::Error> {
        // A fresh environment per render avoids lifetime entanglement
        let mut env = Environment::new();
        env.add_template("analysis", &self.template)?;
        let mut prompt = env.get_template("analysis")?.render(minijinja::context! {
            name => holding.name,
            symbol => holding.symbol,
        })?;

        if let Some(price) = price {
            prompt.push_str(&format!(
                "\nLe cours actuel de l'action est de {price:.2} {currency_suffix}."
            ));
        }
        Ok(prompt)
    }
}

impl Default for AnalysisPrompt {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPLATE)
    }
}
