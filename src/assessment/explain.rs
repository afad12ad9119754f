//! Explainability aggregation
//!
//! Produces the ranked factor list shown to users: duplicates merged by
//! name (highest importance wins), importances sanitized into `[0, 1]`,
//! sorted descending, capped at [`MAX_FACTORS`], never empty.

use std::collections::HashMap;

use crate::models::{FactorExplanation, ScoreResult};
use crate::scoring::sanitize_importance;

pub const MAX_FACTORS: usize = 8;

fn basic_analysis() -> FactorExplanation {
    FactorExplanation::new(
        "Basic App Analysis",
        0.3,
        "Static analysis only",
        "No specific risk factors were reported by the scorer",
    )
}

pub fn explain(score: &ScoreResult) -> Vec<FactorExplanation> {
    let mut merged: Vec<FactorExplanation> = Vec::with_capacity(score.explanations.len());
    let mut index: HashMap<String, usize> = HashMap::new();

    for factor in &score.explanations {
        let importance = sanitize_importance(factor.importance);
        match index.get(&factor.name) {
            Some(&at) => {
                if importance > merged[at].importance {
                    merged[at] = FactorExplanation {
                        importance,
                        ..factor.clone()
                    };
                }
            }
            None => {
                index.insert(factor.name.clone(), merged.len());
                merged.push(FactorExplanation {
                    importance,
                    ..factor.clone()
                });
            }
        }
    }

    // Stable sort keeps scorer order among ties
    merged.sort_by(|a, b| b.importance.total_cmp(&a.importance));
    merged.truncate(MAX_FACTORS);

    if merged.is_empty() {
        merged.push(basic_analysis());
    }
    merged
}
