//! Output reporters for apkshield results
//!
//! Supports two output formats:
//! - `text` - Terminal output with colors
//! - `json` - Machine-readable JSON

mod json;
mod text;

use crate::models::{ComparisonResult, FinalAssessment};
use anyhow::{anyhow, Result};
use std::str::FromStr;

pub use json::render_compact;

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" | "terminal" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(anyhow!("Unknown format '{}'. Valid formats: text, json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Render a single assessment
pub fn render_assessment(assessment: &FinalAssessment, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(text::render_assessment(assessment)),
        OutputFormat::Json => json::render(assessment),
    }
}

/// Render a batch of assessments, in input order
pub fn render_batch(assessments: &[FinalAssessment], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(text::render_batch(assessments)),
        OutputFormat::Json => json::render(&assessments),
    }
}

/// Render a comparison of two packages
pub fn render_comparison(comparison: &ComparisonResult, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(text::render_comparison(comparison)),
        OutputFormat::Json => json::render(comparison),
    }
}
