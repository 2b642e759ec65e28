//! Core types, configuration, and error handling for crivo.
//!
//! This crate provides the shared foundation used by the review pipeline
//! and the CLI:
//! - [`CrivoError`]: unified error type using `thiserror`
//! - [`CrivoConfig`]: configuration loaded from `.crivo.toml`
//! - Shared types: [`Severity`], [`Issue`], [`AnalysisResult`],
//!   [`InlineComment`], [`ReviewOutput`]

mod config;
mod error;
mod types;

pub use config::{ArtifactConfig, CrivoConfig, LlmConfig, ReviewConfig};
pub use error::CrivoError;
pub use types::{AnalysisResult, InlineComment, Issue, ReviewOutput, Severity};
