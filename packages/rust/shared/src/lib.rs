//! Shared types, error model, and configuration for ClarifyMD.
//!
//! This crate is the foundation depended on by all other ClarifyMD crates.
//! It provides:
//! - [`ClarifyError`] and [`GatewayError`] — the unified error types
//! - Domain types ([`AnalysisRequest`], [`TermAnalysis`], [`PipelineRunState`], [`RunId`])
//! - Configuration ([`AppConfig`], [`GatewaySettings`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, GatewaySettings, GeminiConfig, OutputConfig, OutputFormat, config_dir,
    config_file_path, init_config, load_config, load_config_from,
};
pub use error::{ClarifyError, GatewayError, Result};
pub use types::{
    AnalysisRequest, FailedStage, PipelineRunState, RunId, RunPhase, TermAnalysis, TermFailure,
    VerdictKind, VerificationStatus,
};
