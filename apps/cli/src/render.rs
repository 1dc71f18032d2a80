//! Terminal rendering of run state.

use clarifymd_shared::{PipelineRunState, RunPhase};

/// One-line status for the live spinner.
pub(crate) fn progress_message(state: &PipelineRunState) -> String {
    match state.phase {
        RunPhase::Idle => "Aguardando...".to_string(),
        RunPhase::Extracting => "Identificando termos médicos...".to_string(),
        RunPhase::Processing => {
            let total = state.terms.len();
            let done = total - state.pending_terms();
            format!("Analisando termos [{done}/{total}]")
        }
        RunPhase::Settled => "Concluído".to_string(),
    }
}

/// Whether the run ended without any terms to show.
pub(crate) fn is_fatal(state: &PipelineRunState) -> bool {
    state.terms.is_empty() && state.error_message.is_some()
}

/// Human-readable report: one block per term, then any run message.
pub(crate) fn render_text(state: &PipelineRunState) -> String {
    let mut out = String::new();

    for (i, row) in state.terms.iter().enumerate() {
        out.push_str(&format!("{}. {}  [{}]\n", i + 1, row.term, row.status_label()));
        if let Some(explanation) = &row.explanation {
            for line in explanation.trim().lines() {
                out.push_str("   ");
                out.push_str(line);
                out.push('\n');
            }
        }
        out.push('\n');
    }

    if let Some(message) = &state.error_message {
        out.push_str(&format!("! {message}\n"));
    }
    if state.failures.len() > 1 {
        out.push_str(&format!("  ({} termos com falha)\n", state.failures.len()));
    }

    out
}

pub(crate) fn render_json(state: &PipelineRunState) -> serde_json::Result<String> {
    serde_json::to_string_pretty(state)
}

/// Text to read aloud: each term with a usable explanation.
pub(crate) fn narration(state: &PipelineRunState) -> Vec<String> {
    state
        .terms
        .iter()
        .filter(|row| {
            row.verification_status
                .as_ref()
                .is_some_and(|s| s.kind() != clarifymd_shared::VerdictKind::Error)
        })
        .filter_map(|row| {
            row.explanation
                .as_ref()
                .map(|explanation| format!("{}. {}", row.term, explanation.trim()))
        })
        .collect()
}
