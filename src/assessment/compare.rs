//! Pairwise comparison of two assessments
//!
//! Permissions are compared by canonical name (upper-case segment after the
//! last `.`), so `android.permission.CAMERA` and `CAMERA` are the same
//! permission. Outputs are sorted by canonical name and keep the spelling
//! of the side they came from.

use std::collections::BTreeMap;

use crate::classifier::permissions::canonical;
use crate::models::{ComparisonResult, FinalAssessment};

fn keyed(perms: &[String]) -> BTreeMap<String, String> {
    perms
        .iter()
        .filter(|p| !p.trim().is_empty())
        .map(|p| (canonical(p), p.trim().to_string()))
        .collect()
}

/// Entries of `left` whose key is absent from `right`.
fn only_in(left: &BTreeMap<String, String>, right: &BTreeMap<String, String>) -> Vec<String> {
    left.iter()
        .filter(|(k, _)| !right.contains_key(*k))
        .map(|(_, v)| v.clone())
        .collect()
}

/// `|a ∩ b| / |a ∪ b|`, 0 when both are empty.
pub fn jaccard(a: &BTreeMap<String, String>, b: &BTreeMap<String, String>) -> f64 {
    let intersection = a.keys().filter(|k| b.contains_key(*k)).count();
    let union = a.len() + b.len() - intersection;
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

pub fn compare(a: &FinalAssessment, b: &FinalAssessment) -> ComparisonResult {
    let perms_a = keyed(&a.package.permissions);
    let perms_b = keyed(&b.package.permissions);
    let dangerous_a = keyed(&a.package.dangerous_permissions);
    let dangerous_b = keyed(&b.package.dangerous_permissions);

    let version_code_delta = a.package.version_code - b.package.version_code;

    ComparisonResult {
        permissions_only_in_b: only_in(&perms_b, &perms_a),
        permissions_only_in_a: only_in(&perms_a, &perms_b),
        dangerous_permissions_only_in_b: only_in(&dangerous_b, &dangerous_a),
        risk_delta: b.risk_score - a.risk_score,
        similarity: jaccard(&perms_a, &perms_b),
        version_code_delta,
        a_is_newer: version_code_delta > 0,
        min_sdk_delta: a.package.min_sdk - b.package.min_sdk,
        target_sdk_delta: a.package.target_sdk - b.package.target_sdk,
        a: a.clone(),
        b: b.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::adjust;
    use crate::config::AdjustmentWeights;
    use crate::models::RawFacts;
    use crate::scoring::neutral_result;

    fn assessment(perms: &[&str], version_code: i64, min_sdk: i64) -> FinalAssessment {
        let raw = RawFacts {
            permissions: perms.iter().map(|s| s.to_string()).collect(),
            version_code: Some(version_code),
            min_sdk: Some(min_sdk),
            ..Default::default()
        };
        adjust(&neutral_result(), &raw, &AdjustmentWeights::default())
    }

    #[test]
    fn test_set_differences() {
        let a = assessment(&["android.permission.INTERNET", "android.permission.CAMERA"], 3, 21);
        let b = assessment(&["INTERNET", "READ_SMS", "SEND_SMS"], 5, 23);
        let result = compare(&a, &b);

        assert_eq!(result.permissions_only_in_b, vec!["READ_SMS", "SEND_SMS"]);
        assert_eq!(result.permissions_only_in_a, vec!["android.permission.CAMERA"]);
        assert_eq!(result.dangerous_permissions_only_in_b, vec!["READ_SMS", "SEND_SMS"]);
        assert!((result.similarity - 0.25).abs() < 1e-12);
        assert_eq!(result.version_code_delta, -2);
        assert!(!result.a_is_newer);
        assert_eq!(result.min_sdk_delta, -2);
    }

    #[test]
    fn test_similarity_symmetric_and_self_is_one() {
        let a = assessment(&["INTERNET", "CAMERA", "READ_SMS"], 1, 1);
        let b = assessment(&["CAMERA", "WAKE_LOCK"], 1, 1);
        assert_eq!(compare(&a, &b).similarity, compare(&b, &a).similarity);
        assert_eq!(compare(&a, &a).similarity, 1.0);
        assert_eq!(compare(&a, &a).risk_delta, 0.0);
    }

    #[test]
    fn test_empty_sets_yield_zero() {
        let a = assessment(&[], 1, 1);
        let result = compare(&a, &a);
        assert_eq!(result.similarity, 0.0);
        assert!(result.permissions_only_in_a.is_empty());
        assert!(result.permissions_only_in_b.is_empty());
    }

    #[test]
    fn test_risk_delta_direction() {
        let a = assessment(&[], 1, 1);
        let mut b = a.clone();
        b.risk_score = a.risk_score + 2.5;
        assert_eq!(compare(&a, &b).risk_delta, 2.5);
        assert_eq!(compare(&b, &a).risk_delta, -2.5);
    }
}
