//! Core data models for apkshield
//!
//! These are request-scoped value objects: raw package facts coming in from
//! the package inspector, intermediate scorer output, and the final
//! assessment / comparison handed back to callers.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::classifier::telemetry::SyntheticTelemetry;

/// Certificate descriptor as reported by the package inspector.
///
/// Every field is optional. Dates are kept as strings because inspectors
/// emit them in whatever format the signing block used; they are parsed
/// lazily when validity is evaluated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CertificateInfo {
    #[serde(deserialize_with = "lenient::string")]
    pub issuer: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub subject: Option<String>,
    /// RFC 3339 timestamp of the start of the validity window
    #[serde(deserialize_with = "lenient::string")]
    pub valid_from: Option<String>,
    /// RFC 3339 timestamp of the end of the validity window
    #[serde(deserialize_with = "lenient::string")]
    pub valid_to: Option<String>,
    /// Explicit self-signed flag, when the inspector computed one
    #[serde(deserialize_with = "lenient::boolean")]
    pub is_self_signed: Option<bool>,
    /// Explicit validity flag, when the inspector computed one
    #[serde(deserialize_with = "lenient::boolean")]
    pub is_valid: Option<bool>,
    #[serde(deserialize_with = "lenient::string")]
    pub signature_algorithm: Option<String>,
}

/// Raw structural facts extracted from one application package.
///
/// The inspector may leave any field empty; nothing here is trusted.
/// Deserialization never rejects a field: `null` or wrongly typed values
/// become `None` / empty lists, numeric strings are accepted for numbers,
/// and a certificate that is not an object degrades to an empty descriptor
/// (self-signed, invalid).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawFacts {
    #[serde(deserialize_with = "lenient::string")]
    pub package_name: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub app_name: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub version_name: Option<String>,
    #[serde(deserialize_with = "lenient::integer")]
    pub version_code: Option<i64>,
    #[serde(deserialize_with = "lenient::integer")]
    pub min_sdk: Option<i64>,
    #[serde(deserialize_with = "lenient::integer")]
    pub target_sdk: Option<i64>,
    #[serde(deserialize_with = "lenient::strings")]
    pub permissions: Vec<String>,
    #[serde(deserialize_with = "lenient::strings")]
    pub activities: Vec<String>,
    #[serde(deserialize_with = "lenient::strings")]
    pub services: Vec<String>,
    #[serde(deserialize_with = "lenient::strings")]
    pub receivers: Vec<String>,
    #[serde(deserialize_with = "lenient::certificate")]
    pub certificate: Option<CertificateInfo>,
    #[serde(deserialize_with = "lenient::strings")]
    pub suspicious_strings: Vec<String>,
    /// Package size in bytes
    #[serde(deserialize_with = "lenient::float")]
    pub file_size: Option<f64>,
    /// SHA-256 of the package file, when the inspector hashed it
    #[serde(deserialize_with = "lenient::string")]
    pub sha256: Option<String>,
    #[serde(deserialize_with = "lenient::boolean")]
    pub allows_backup: Option<bool>,
    #[serde(deserialize_with = "lenient::boolean")]
    pub is_debuggable: Option<bool>,
    #[serde(deserialize_with = "lenient::string")]
    pub install_location: Option<String>,
}

impl RawFacts {
    /// Certificate self-signed flag, degraded to `true` when unknown.
    pub fn certificate_self_signed(&self) -> bool {
        match &self.certificate {
            None => true,
            Some(cert) => cert.is_self_signed.unwrap_or_else(|| {
                match (cert.issuer.as_deref(), cert.subject.as_deref()) {
                    (Some(issuer), Some(subject))
                        if !issuer.trim().is_empty() && !subject.trim().is_empty() =>
                    {
                        issuer.trim() == subject.trim()
                    }
                    _ => true,
                }
            }),
        }
    }

    /// Certificate validity at `now`, degraded to `false` when unknown.
    pub fn certificate_valid_at(&self, now: chrono::DateTime<chrono::Utc>) -> bool {
        let Some(cert) = &self.certificate else {
            return false;
        };
        if let Some(valid) = cert.is_valid {
            return valid;
        }
        let parse = |s: &Option<String>| {
            s.as_deref()
                .and_then(|ts| chrono::DateTime::parse_from_rfc3339(ts.trim()).ok())
                .map(|dt| dt.with_timezone(&chrono::Utc))
        };
        match (parse(&cert.valid_from), parse(&cert.valid_to)) {
            (Some(from), Some(to)) => from <= now && now <= to,
            _ => false,
        }
    }
}

/// Which scorer produced a [`ScoreResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Model,
    Rule,
    Default,
}

impl std::fmt::Display for Provenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provenance::Model => write!(f, "model"),
            Provenance::Rule => write!(f, "rule"),
            Provenance::Default => write!(f, "default"),
        }
    }
}

/// Three-bucket pipeline verdict, derived from the final adjusted score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Verdict {
    Safe,
    Suspicious,
    #[serde(rename = "High Risk")]
    HighRisk,
}

impl Verdict {
    /// `< 3.0` Safe, `< 7.0` Suspicious, otherwise High Risk.
    pub fn from_score(score: f64) -> Self {
        if score < 3.0 {
            Verdict::Safe
        } else if score < 7.0 {
            Verdict::Suspicious
        } else {
            Verdict::HighRisk
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Safe => write!(f, "Safe"),
            Verdict::Suspicious => write!(f, "Suspicious"),
            Verdict::HighRisk => write!(f, "High Risk"),
        }
    }
}

/// Five-bucket tier reported by the rule scorer on its own raw score.
///
/// Deliberately a separate type from [`Verdict`]: the two scales use
/// different thresholds and must never be compared against each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskTier {
    Safe,
    #[serde(rename = "Low Risk")]
    Low,
    #[serde(rename = "Moderate Risk")]
    Moderate,
    #[serde(rename = "High Risk")]
    High,
    #[serde(rename = "Critical Risk")]
    Critical,
}

impl RiskTier {
    /// Thresholds at 2, 4, 6 and 8.
    pub fn from_score(score: f64) -> Self {
        if score < 2.0 {
            RiskTier::Safe
        } else if score < 4.0 {
            RiskTier::Low
        } else if score < 6.0 {
            RiskTier::Moderate
        } else if score < 8.0 {
            RiskTier::High
        } else {
            RiskTier::Critical
        }
    }
}

impl std::fmt::Display for RiskTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskTier::Safe => write!(f, "Safe"),
            RiskTier::Low => write!(f, "Low Risk"),
            RiskTier::Moderate => write!(f, "Moderate Risk"),
            RiskTier::High => write!(f, "High Risk"),
            RiskTier::Critical => write!(f, "Critical Risk"),
        }
    }
}

/// One named contributor to a score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorExplanation {
    pub name: String,
    /// Normalized weight in `[0, 1]`
    pub importance: f64,
    pub display_value: String,
    pub rationale: String,
}

impl FactorExplanation {
    pub fn new(
        name: impl Into<String>,
        importance: f64,
        display_value: impl Into<String>,
        rationale: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            importance,
            display_value: display_value.into(),
            rationale: rationale.into(),
        }
    }
}

/// Class probabilities of a binary safe / malicious decision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassProbabilities {
    pub safe: f64,
    pub malicious: f64,
}

impl ClassProbabilities {
    pub const NEUTRAL: ClassProbabilities = ClassProbabilities {
        safe: 0.5,
        malicious: 0.5,
    };

    pub fn from_malicious(malicious: f64) -> Self {
        let malicious = malicious.clamp(0.0, 1.0);
        Self {
            safe: 1.0 - malicious,
            malicious,
        }
    }
}

impl Default for ClassProbabilities {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

/// Output of a single scoring tier, before post-hoc adjustment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub risk_score: f64,
    pub confidence: f64,
    pub probabilities: ClassProbabilities,
    pub explanations: Vec<FactorExplanation>,
    pub provenance: Provenance,
    /// Five-bucket tier, only set by the rule scorer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_tier: Option<RiskTier>,
}

/// A post-hoc boost that fired during adjustment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedAdjustment {
    pub rule: String,
    pub weight: f64,
}

/// Certificate fields shown alongside an assessment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CertificateSummary {
    pub issuer: String,
    pub subject: String,
    pub is_self_signed: bool,
    pub is_valid: bool,
}

/// Component counts for display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentSummary {
    pub activities: usize,
    pub services: usize,
    pub receivers: usize,
}

/// Fields of the originating [`RawFacts`] needed to display an assessment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackageSummary {
    pub package_name: String,
    pub app_name: String,
    pub version_name: String,
    pub version_code: i64,
    pub min_sdk: i64,
    pub target_sdk: i64,
    pub permissions: Vec<String>,
    pub dangerous_permissions: Vec<String>,
    pub components: ComponentSummary,
    pub suspicious_strings: Vec<String>,
    pub certificate: CertificateSummary,
    pub file_size_human: String,
    pub allows_backup: bool,
    pub is_debuggable: bool,
    pub install_location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

/// Final, adjusted assessment of one package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalAssessment {
    /// Adjusted score in `[0, 10]`
    pub risk_score: f64,
    pub verdict: Verdict,
    /// Rule scorer's own five-bucket tier, when the rule path produced the score
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_tier: Option<RiskTier>,
    /// Score before post-hoc adjustment
    pub base_score: f64,
    pub confidence: f64,
    pub probabilities: ClassProbabilities,
    pub provenance: Provenance,
    pub top_factors: Vec<FactorExplanation>,
    pub adjustments: Vec<AppliedAdjustment>,
    pub package: PackageSummary,
    pub synthetic_telemetry: SyntheticTelemetry,
}

/// Pairwise comparison of two assessments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub a: FinalAssessment,
    pub b: FinalAssessment,
    /// Permissions declared by `b` but not `a`
    pub permissions_only_in_b: Vec<String>,
    /// Permissions declared by `a` but not `b`
    pub permissions_only_in_a: Vec<String>,
    /// Dangerous permissions declared by `b` but not `a`
    pub dangerous_permissions_only_in_b: Vec<String>,
    /// `b.risk_score - a.risk_score`
    pub risk_delta: f64,
    /// Jaccard similarity of the two permission sets
    pub similarity: f64,
    /// `a.version_code - b.version_code`
    pub version_code_delta: i64,
    pub a_is_newer: bool,
    /// `a.min_sdk - b.min_sdk`
    pub min_sdk_delta: i64,
    /// `a.target_sdk - b.target_sdk`
    pub target_sdk_delta: i64,
}

// ---------------------------------------------------------------------------
// Lenient input decoding
// ---------------------------------------------------------------------------

/// Field decoders for inspector output. Each one reads any JSON value and
/// maps what it cannot use to the field's empty state instead of failing.
mod lenient {
    use super::*;

    fn number(value: &Value) -> Option<f64> {
        match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    pub(super) fn string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    }

    pub(super) fn integer<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
        let value = Value::deserialize(d)?;
        if let Some(n) = value.as_i64() {
            return Ok(Some(n));
        }
        if let Some(n) = value.as_str().and_then(|s| s.trim().parse::<i64>().ok()) {
            return Ok(Some(n));
        }
        // Floats and float strings truncate; `as` saturates out-of-range values
        Ok(number(&value).filter(|f| f.is_finite()).map(|f| f as i64))
    }

    pub(super) fn float<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        Ok(number(&Value::deserialize(d)?))
    }

    pub(super) fn boolean<'de, D: Deserializer<'de>>(d: D) -> Result<Option<bool>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Bool(b) => Some(b),
            Value::Number(n) => n.as_f64().map(|f| f != 0.0),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" => Some(true),
                "false" | "no" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        })
    }

    /// Non-string items are dropped; a non-list becomes empty.
    pub(super) fn strings<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Array(items) => items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        })
    }

    /// `null` means no certificate; anything else that is not a usable
    /// object becomes an empty descriptor.
    pub(super) fn certificate<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<CertificateInfo>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Null => None,
            value @ Value::Object(_) => {
                Some(serde_json::from_value(value).unwrap_or_default())
            }
            _ => Some(CertificateInfo::default()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn cert(issuer: &str, subject: &str) -> CertificateInfo {
        CertificateInfo {
            issuer: Some(issuer.to_string()),
            subject: Some(subject.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_verdict_thresholds_exact() {
        assert_eq!(Verdict::from_score(2.9999), Verdict::Safe);
        assert_eq!(Verdict::from_score(3.0), Verdict::Suspicious);
        assert_eq!(Verdict::from_score(6.9999), Verdict::Suspicious);
        assert_eq!(Verdict::from_score(7.0), Verdict::HighRisk);
    }

    #[test]
    fn test_risk_tier_thresholds() {
        assert_eq!(RiskTier::from_score(1.99), RiskTier::Safe);
        assert_eq!(RiskTier::from_score(2.0), RiskTier::Low);
        assert_eq!(RiskTier::from_score(4.0), RiskTier::Moderate);
        assert_eq!(RiskTier::from_score(6.0), RiskTier::High);
        assert_eq!(RiskTier::from_score(8.0), RiskTier::Critical);
        assert_eq!(RiskTier::from_score(17.0), RiskTier::Critical);
    }

    #[test]
    fn test_verdict_serializes_with_space() {
        let json = serde_json::to_string(&Verdict::HighRisk).unwrap();
        assert_eq!(json, "\"High Risk\"");
        let tier = serde_json::to_string(&RiskTier::Moderate).unwrap();
        assert_eq!(tier, "\"Moderate Risk\"");
    }

    #[test]
    fn test_missing_certificate_degrades() {
        let facts = RawFacts::default();
        assert!(facts.certificate_self_signed());
        assert!(!facts.certificate_valid_at(chrono::Utc::now()));
    }

    #[test]
    fn test_self_signed_from_identities() {
        let mut facts = RawFacts {
            certificate: Some(cert("CN=Acme", "CN=Acme")),
            ..Default::default()
        };
        assert!(facts.certificate_self_signed());

        facts.certificate = Some(cert("CN=Google CA", "CN=Acme"));
        assert!(!facts.certificate_self_signed());

        facts.certificate = Some(cert("", "CN=Acme"));
        assert!(facts.certificate_self_signed());
    }

    #[test]
    fn test_validity_window() {
        let now = chrono::Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let mut c = cert("CN=A", "CN=B");
        c.valid_from = Some("2020-01-01T00:00:00Z".to_string());
        c.valid_to = Some("2030-01-01T00:00:00Z".to_string());
        let facts = RawFacts {
            certificate: Some(c.clone()),
            ..Default::default()
        };
        assert!(facts.certificate_valid_at(now));

        let mut expired = c.clone();
        expired.valid_to = Some("2021-01-01T00:00:00Z".to_string());
        let facts = RawFacts {
            certificate: Some(expired),
            ..Default::default()
        };
        assert!(!facts.certificate_valid_at(now));

        let mut garbled = c;
        garbled.valid_from = Some("not a date".to_string());
        let facts = RawFacts {
            certificate: Some(garbled),
            ..Default::default()
        };
        assert!(!facts.certificate_valid_at(now));
    }

    #[test]
    fn test_explicit_flags_win() {
        let facts = RawFacts {
            certificate: Some(CertificateInfo {
                issuer: Some("CN=A".into()),
                subject: Some("CN=A".into()),
                is_self_signed: Some(false),
                is_valid: Some(true),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(!facts.certificate_self_signed());
        assert!(facts.certificate_valid_at(chrono::Utc::now()));
    }

    #[test]
    fn test_raw_facts_tolerates_sparse_json() {
        let facts: RawFacts = serde_json::from_str(r#"{"permissions": ["CAMERA"]}"#).unwrap();
        assert_eq!(facts.permissions, vec!["CAMERA".to_string()]);
        assert!(facts.package_name.is_none());
        assert!(facts.certificate.is_none());
    }

    #[test]
    fn test_raw_facts_null_and_wrong_typed_lists_are_empty() {
        let facts: RawFacts = serde_json::from_str(
            r#"{"permissions": null, "activities": 5, "services": "svc",
                "receivers": ["r1", 7, null, "r2"], "suspicious_strings": {"a": 1}}"#,
        )
        .unwrap();
        assert!(facts.permissions.is_empty());
        assert!(facts.activities.is_empty());
        assert!(facts.services.is_empty());
        assert_eq!(facts.receivers, vec!["r1".to_string(), "r2".to_string()]);
        assert!(facts.suspicious_strings.is_empty());
    }

    #[test]
    fn test_raw_facts_numeric_strings_and_floats() {
        let facts: RawFacts = serde_json::from_str(
            r#"{"min_sdk": "21", "target_sdk": " 33 ", "version_code": 21.0,
                "file_size": "1024"}"#,
        )
        .unwrap();
        assert_eq!(facts.min_sdk, Some(21));
        assert_eq!(facts.target_sdk, Some(33));
        assert_eq!(facts.version_code, Some(21));
        assert_eq!(facts.file_size, Some(1024.0));

        let facts: RawFacts = serde_json::from_str(
            r#"{"min_sdk": "lollipop", "version_code": [1], "file_size": true,
                "package_name": 42, "is_debuggable": "yes", "allows_backup": {}}"#,
        )
        .unwrap();
        assert_eq!(facts.min_sdk, None);
        assert_eq!(facts.version_code, None);
        assert_eq!(facts.file_size, None);
        assert_eq!(facts.package_name.as_deref(), Some("42"));
        assert_eq!(facts.is_debuggable, Some(true));
        assert_eq!(facts.allows_backup, None);
    }

    #[test]
    fn test_raw_facts_unusable_certificate_degrades() {
        let now = chrono::Utc::now();
        for json in [
            r#"{"certificate": "<unparseable>"}"#,
            r#"{"certificate": 17}"#,
            r#"{"certificate": {"issuer": ["CN=A"], "is_valid": "maybe"}}"#,
        ] {
            let facts: RawFacts = serde_json::from_str(json).unwrap();
            assert!(facts.certificate.is_some(), "{json}");
            assert!(facts.certificate_self_signed(), "{json}");
            assert!(!facts.certificate_valid_at(now), "{json}");
        }

        let facts: RawFacts = serde_json::from_str(r#"{"certificate": null}"#).unwrap();
        assert!(facts.certificate.is_none());
    }

    #[test]
    fn test_probabilities_from_malicious_clamps() {
        let p = ClassProbabilities::from_malicious(1.7);
        assert_eq!(p.malicious, 1.0);
        assert_eq!(p.safe, 0.0);
    }
}
