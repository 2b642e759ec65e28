//! Review pipeline for pull-request artifacts.
//!
//! Reads CI artifacts, filters the changed files, builds the prompt, sends it
//! to the model once, and renders the markdown summary and inline comments
//! written to `review-result.json`.

pub mod analyze;
pub mod artifacts;
pub mod extract;
pub mod filter;
pub mod format;
pub mod llm;
pub mod prompt;
pub mod runner;
