//! Core pipeline for ClarifyMD.
//!
//! Extracts medical terms from a text through the language-model gateway,
//! explains and verifies each term concurrently, and publishes the merged
//! result as an observable run state.

pub mod capabilities;
pub mod orchestrator;
pub mod prompts;
pub mod stages;

#[cfg(test)]
mod testing;

pub use capabilities::{Narrator, TextExtractor, gather_text};
pub use orchestrator::{EXPLANATION_FAILED, NO_TERMS_MESSAGE, Orchestrator};
pub use stages::{MedicalAnalysis, parse_terms};
