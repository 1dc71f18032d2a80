//! Core domain types for ClarifyMD analysis runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper identifying one pipeline run (time-sortable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Generate a new time-sortable run identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RunId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ---------------------------------------------------------------------------
// AnalysisRequest
// ---------------------------------------------------------------------------

/// The unit of work submitted to the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    /// Text to analyze, possibly concatenated from OCR output.
    pub text: String,
    /// Display-only preview reference (e.g. a thumbnail path or a short label).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
}

impl AnalysisRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            preview: None,
        }
    }

    /// Join typed and extracted fragments into one request, one fragment per line.
    /// Blank fragments are skipped.
    pub fn compose<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let text = parts
            .into_iter()
            .filter_map(|p| {
                let trimmed = p.as_ref().trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            })
            .collect::<Vec<_>>()
            .join("\n");
        Self::new(text)
    }

    pub fn with_preview(mut self, preview: impl Into<String>) -> Self {
        self.preview = Some(preview.into());
        self
    }

    /// Whether there is anything to analyze.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

// ---------------------------------------------------------------------------
// Verification status
// ---------------------------------------------------------------------------

/// Verification outcome for one term.
///
/// The model's verdict is kept as an open string: it is expected to be one of
/// `CORRETO` / `INCORRETO` / `AJUSTAR`, but anything else is passed through
/// and classified as [`VerdictKind::Unrecognized`] for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    /// Trimmed verdict text returned by the verification stage.
    Verdict(String),
    /// The chain failed before a verdict could be obtained.
    Error,
}

/// Error placeholder token shown for failed chains.
pub const ERROR_STATUS_LABEL: &str = "ERRO";

impl VerificationStatus {
    /// Classify the status into the known display vocabulary.
    pub fn kind(&self) -> VerdictKind {
        match self {
            Self::Verdict(text) => VerdictKind::classify(text),
            Self::Error => VerdictKind::Error,
        }
    }

    /// Upper-cased label suitable for a status badge.
    pub fn label(&self) -> String {
        match self {
            Self::Verdict(text) => text.to_uppercase(),
            Self::Error => ERROR_STATUS_LABEL.to_string(),
        }
    }
}

/// Display vocabulary for verification statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictKind {
    Correct,
    Incorrect,
    Adjust,
    Error,
    Unrecognized,
}

impl VerdictKind {
    /// Map a raw verdict to its kind, case-insensitively.
    pub fn classify(raw: &str) -> Self {
        let upper = raw.trim().to_uppercase();
        match upper.as_str() {
            "CORRETO" => Self::Correct,
            "INCORRETO" => Self::Incorrect,
            "AJUSTAR" => Self::Adjust,
            s if s.starts_with(ERROR_STATUS_LABEL) => Self::Error,
            _ => Self::Unrecognized,
        }
    }
}

// ---------------------------------------------------------------------------
// TermAnalysis
// ---------------------------------------------------------------------------

/// One row of pipeline output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermAnalysis {
    /// The extracted term; unique within a run.
    pub term: String,
    /// Lay explanation, absent until the explanation stage completes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    /// Verdict, absent until the chain completes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_status: Option<VerificationStatus>,
}

/// Label shown while a term's chain is still running.
pub const PENDING_STATUS_LABEL: &str = "Processando";

impl TermAnalysis {
    /// A placeholder row with no explanation or status yet.
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            explanation: None,
            verification_status: None,
        }
    }

    /// Whether this term's chain has completed (successfully or not).
    pub fn is_settled(&self) -> bool {
        self.verification_status.is_some()
    }

    pub fn status_label(&self) -> String {
        self.verification_status
            .as_ref()
            .map(VerificationStatus::label)
            .unwrap_or_else(|| PENDING_STATUS_LABEL.to_string())
    }

    pub fn status_kind(&self) -> Option<VerdictKind> {
        self.verification_status.as_ref().map(VerificationStatus::kind)
    }
}

// ---------------------------------------------------------------------------
// Run state
// ---------------------------------------------------------------------------

/// Lifecycle of a single run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    #[default]
    Idle,
    Extracting,
    Processing,
    Settled,
}

/// Stage of a per-term chain that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailedStage {
    Explanation,
    Verification,
}

/// A recorded per-term failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermFailure {
    pub index: usize,
    pub term: String,
    pub stage: FailedStage,
    pub message: String,
}

/// Observable state of the current run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineRunState {
    /// The run this state belongs to; `None` before the first submission.
    pub run_id: Option<RunId>,
    pub phase: RunPhase,
    /// Terms in extraction order. Length is fixed once extraction succeeds.
    pub terms: Vec<TermAnalysis>,
    /// True from submission until every chain has settled.
    pub is_loading: bool,
    /// Fatal error, or the most recent per-term explanation failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Every per-term failure of this run, in arrival order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<TermFailure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settled_at: Option<DateTime<Utc>>,
}

impl PipelineRunState {
    /// Whether `run_id`'s run has reached its terminal state.
    pub fn is_settled_run(&self, run_id: RunId) -> bool {
        self.run_id == Some(run_id) && self.phase == RunPhase::Settled
    }

    /// Number of terms whose chain has not completed yet.
    pub fn pending_terms(&self) -> usize {
        self.terms.iter().filter(|t| !t.is_settled()).count()
    }
}
