//! Display summary of the facts behind an assessment

use chrono::{DateTime, Utc};

use crate::classifier::{content, permissions};
use crate::models::{CertificateSummary, ComponentSummary, PackageSummary, RawFacts};

/// Suspicious strings kept for display.
const MAX_DISPLAY_STRINGS: usize = 10;

fn text(value: &Option<String>, default: &str) -> String {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(default)
        .to_string()
}

fn level(value: Option<i64>) -> i64 {
    value.filter(|v| *v >= 1).unwrap_or(1)
}

pub fn summarize(raw: &RawFacts, now: DateTime<Utc>) -> PackageSummary {
    let certificate = CertificateSummary {
        issuer: raw
            .certificate
            .as_ref()
            .map(|c| text(&c.issuer, "Unknown"))
            .unwrap_or_else(|| "Unknown".to_string()),
        subject: raw
            .certificate
            .as_ref()
            .map(|c| text(&c.subject, "Unknown"))
            .unwrap_or_else(|| "Unknown".to_string()),
        is_self_signed: raw.certificate_self_signed(),
        is_valid: raw.certificate_valid_at(now),
    };

    PackageSummary {
        package_name: text(&raw.package_name, "unknown"),
        app_name: text(&raw.app_name, "Unknown"),
        version_name: text(&raw.version_name, "unknown"),
        version_code: level(raw.version_code),
        min_sdk: level(raw.min_sdk),
        target_sdk: level(raw.target_sdk),
        permissions: raw.permissions.clone(),
        dangerous_permissions: permissions::dangerous_subset(&raw.permissions),
        components: ComponentSummary {
            activities: raw.activities.len(),
            services: raw.services.len(),
            receivers: raw.receivers.len(),
        },
        suspicious_strings: raw
            .suspicious_strings
            .iter()
            .take(MAX_DISPLAY_STRINGS)
            .cloned()
            .collect(),
        certificate,
        file_size_human: match raw.file_size {
            Some(size) => content::human_size(size),
            None => "Unknown".to_string(),
        },
        allows_backup: raw.allows_backup.unwrap_or(true),
        is_debuggable: raw.is_debuggable.unwrap_or(false),
        install_location: text(&raw.install_location, "auto"),
        sha256: raw.sha256.clone().filter(|s| !s.trim().is_empty()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_for_empty_facts() {
        let summary = summarize(&RawFacts::default(), Utc::now());
        assert_eq!(summary.package_name, "unknown");
        assert_eq!(summary.version_code, 1);
        assert_eq!(summary.min_sdk, 1);
        assert_eq!(summary.file_size_human, "Unknown");
        assert!(summary.allows_backup);
        assert!(!summary.is_debuggable);
        assert_eq!(summary.install_location, "auto");
        assert!(summary.certificate.is_self_signed);
        assert!(!summary.certificate.is_valid);
        assert_eq!(summary.certificate.issuer, "Unknown");
    }

    #[test]
    fn test_strings_truncated_and_dangerous_listed() {
        let raw = RawFacts {
            package_name: Some("  com.example.app ".into()),
            permissions: vec!["android.permission.INTERNET".into(), "android.permission.READ_SMS".into()],
            suspicious_strings: (0..15).map(|i| format!("str{i}")).collect(),
            file_size: Some(3_145_728.0),
            ..Default::default()
        };
        let summary = summarize(&raw, Utc::now());
        assert_eq!(summary.package_name, "com.example.app");
        assert_eq!(summary.suspicious_strings.len(), MAX_DISPLAY_STRINGS);
        assert_eq!(summary.dangerous_permissions, vec!["android.permission.READ_SMS".to_string()]);
        assert_eq!(summary.file_size_human, "3.0 MB");
    }
}
