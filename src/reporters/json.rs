//! JSON reporter
//!
//! Pretty-printed JSON for assessments and comparisons. Every numeric
//! field is finite by construction, so serialization never emits `null`
//! for a score.

use anyhow::Result;
use serde::Serialize;

/// Render as pretty-printed JSON
pub fn render<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Render as compact JSON (single line)
pub fn render_compact<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}
