//! The three model-backed stages of a run: term extraction, explanation,
//! and verification. Each stage is one gateway call.

use std::sync::Arc;

use tracing::{debug, instrument};

use clarifymd_gateway::LanguageModel;
use clarifymd_shared::Result;

use crate::prompts;

/// Stage service shared by every chain of every run.
#[derive(Clone)]
pub struct MedicalAnalysis {
    model: Arc<dyn LanguageModel>,
}

impl MedicalAnalysis {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    /// Extract the distinct medical terms in `text`, in the order the model
    /// listed them. An empty list means no terms were found; it is not an error.
    #[instrument(skip_all, fields(text_len = text.len()))]
    pub async fn extract_terms(&self, text: &str) -> Result<Vec<String>> {
        let raw = self.model.generate(&prompts::term_extraction(text)).await?;
        let terms = parse_terms(&raw);
        debug!(count = terms.len(), "terms extracted");
        Ok(terms)
    }

    /// Lay explanation of `term`, returned verbatim.
    #[instrument(skip(self))]
    pub async fn explain(&self, term: &str) -> Result<String> {
        Ok(self.model.generate(&prompts::explanation(term)).await?)
    }

    /// Verdict on `explanation`, trimmed but otherwise uninterpreted.
    #[instrument(skip(self, explanation))]
    pub async fn verify(&self, term: &str, explanation: &str) -> Result<String> {
        let raw = self
            .model
            .generate(&prompts::verification(term, explanation))
            .await?;
        Ok(raw.trim().to_string())
    }
}

/// Split a comma-separated model answer into terms.
///
/// Pieces are trimmed, empty pieces dropped, and repeats removed keeping the
/// first occurrence so every term is unique within a run.
pub fn parse_terms(raw: &str) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    for piece in raw.split(',') {
        let term = piece.trim();
        if !term.is_empty() && !terms.iter().any(|t| t == term) {
            terms.push(term.to_string());
        }
    }
    terms
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Reply, ScriptedModel, text};
    use clarifymd_shared::{ClarifyError, GatewayError};

    #[test]
    fn parse_terms_trims_and_drops_empties() {
        assert_eq!(
            parse_terms(" hipertensão ,diabetes,, \n dispneia\n"),
            vec!["hipertensão", "diabetes", "dispneia"]
        );
    }

    #[test]
    fn parse_terms_empty_answer() {
        assert!(parse_terms("").is_empty());
        assert!(parse_terms(" , ,\n").is_empty());
    }

    #[test]
    fn parse_terms_keeps_first_of_repeats() {
        assert_eq!(
            parse_terms("diabetes, anemia, diabetes"),
            vec!["diabetes", "anemia"]
        );
    }

    #[tokio::test]
    async fn extraction_is_deterministic_for_same_input() {
        let input = "Paciente com hipertensão e diabetes";
        let model = ScriptedModel::new().extract(input, text("hipertensão, diabetes"), 0);
        let analysis = MedicalAnalysis::new(Arc::new(model));

        let first = analysis.extract_terms(input).await.unwrap();
        let second = analysis.extract_terms(input).await.unwrap();
        assert_eq!(first, vec!["hipertensão", "diabetes"]);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn explanation_is_returned_verbatim() {
        let body = "  Diabetes é uma condição...\n\nEsta é uma explicação geral.  ";
        let model = ScriptedModel::new().explain("diabetes", text(body), 0);
        let analysis = MedicalAnalysis::new(Arc::new(model));

        assert_eq!(analysis.explain("diabetes").await.unwrap(), body);
    }

    #[tokio::test]
    async fn verdict_is_only_trimmed() {
        let model = ScriptedModel::new()
            .verify("diabetes", text("  CORRETO \n"), 0)
            .verify("anemia", text("Quase certo"), 0);
        let analysis = MedicalAnalysis::new(Arc::new(model));

        assert_eq!(analysis.verify("diabetes", "x").await.unwrap(), "CORRETO");
        assert_eq!(analysis.verify("anemia", "y").await.unwrap(), "Quase certo");
    }

    #[tokio::test]
    async fn verification_prompt_embeds_explanation() {
        let model = Arc::new(ScriptedModel::new().verify("asma", text("AJUSTAR"), 0));
        let analysis = MedicalAnalysis::new(model.clone());

        analysis.verify("asma", "Inflamação dos brônquios.").await.unwrap();
        let calls = model.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].contains("Explicação: Inflamação dos brônquios."));
    }

    #[tokio::test]
    async fn gateway_failures_propagate() {
        let model = ScriptedModel::new().explain("asma", Reply::Transport, 0);
        let analysis = MedicalAnalysis::new(Arc::new(model));

        let err = analysis.explain("asma").await.unwrap_err();
        assert!(matches!(
            err,
            ClarifyError::Gateway(GatewayError::Transport(_))
        ));
    }
}
