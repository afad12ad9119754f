//! Fixed-schema feature normalizer
//!
//! Converts heterogeneous [`RawFacts`] into a 32-dimensional [`FeatureVector`].
//! Normalization is total: absent, negative, NaN or infinite inputs are
//! replaced by per-feature defaults, so every vector leaving this module is
//! finite with non-negative counts and ratios inside `[0, 1]`.
//!
//! Feature groups:
//!   0..3   - Permission counts (total, dangerous, ratio)
//!   3..16  - Critical permission flags
//!  16..20  - Manifest metadata (SDK levels, version code, file size)
//!  20..22  - Certificate (self-signed, valid)
//!  22..25  - Component counts
//!  25..28  - Content signals (suspicious strings, raw-IP URLs, banking vocabulary)
//!  28..32  - Synthesized behavior (stand-ins for unavailable dynamic analysis)

use chrono::{DateTime, Utc};
use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::debug;

use super::content;
use super::permissions::{self, declares};
use crate::models::RawFacts;

/// Number of features in the canonical schema.
pub const NUM_FEATURES: usize = 32;

/// Cap applied to the synthesized syscall count.
const SYSCALL_CAP: f64 = 50.0;

/// Canonical feature names, in schema order.
pub const FEATURE_NAMES: [&str; NUM_FEATURES] = [
    "total_permissions",
    "dangerous_permissions",
    "permission_ratio",
    "has_system_alert_window",
    "has_bind_accessibility_service",
    "has_bind_device_admin",
    "has_read_sms",
    "has_send_sms",
    "has_receive_sms",
    "has_camera",
    "has_record_audio",
    "has_access_fine_location",
    "has_write_settings",
    "has_install_packages",
    "has_delete_packages",
    "has_write_external_storage",
    "min_sdk",
    "target_sdk",
    "version_code",
    "file_size_mb",
    "is_self_signed",
    "cert_valid",
    "activities_count",
    "services_count",
    "receivers_count",
    "suspicious_strings_count",
    "has_ip_address",
    "has_banking_keywords",
    "sensitive_api_runtime",
    "suspicious_syscalls",
    "suspicious_domain_hits",
    "malicious_behavior_score",
];

/// One slot of the canonical schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Feature {
    TotalPermissions,
    DangerousPermissions,
    PermissionRatio,
    HasSystemAlertWindow,
    HasBindAccessibilityService,
    HasBindDeviceAdmin,
    HasReadSms,
    HasSendSms,
    HasReceiveSms,
    HasCamera,
    HasRecordAudio,
    HasAccessFineLocation,
    HasWriteSettings,
    HasInstallPackages,
    HasDeletePackages,
    HasWriteExternalStorage,
    MinSdk,
    TargetSdk,
    VersionCode,
    FileSizeMb,
    IsSelfSigned,
    CertValid,
    ActivitiesCount,
    ServicesCount,
    ReceiversCount,
    SuspiciousStringsCount,
    HasIpAddress,
    HasBankingKeywords,
    SensitiveApiRuntime,
    SuspiciousSyscalls,
    SuspiciousDomainHits,
    MaliciousBehaviorScore,
}

/// Value domain of a feature, which decides its sanitization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureKind {
    /// Non-negative count or magnitude, default 0
    Count,
    /// Clamped to `[0, 1]`, default 0
    Ratio,
    /// Exactly 0 or 1, default 0
    Flag,
    /// At least 1, default 1
    Level,
}

/// Whether a feature is read from static facts or synthesized from them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureOrigin {
    Static,
    Synthesized,
}

/// Critical permission flags, in schema order.
const PERMISSION_FLAGS: [(Feature, &str); 13] = [
    (Feature::HasSystemAlertWindow, permissions::OVERLAY),
    (Feature::HasBindAccessibilityService, permissions::ACCESSIBILITY),
    (Feature::HasBindDeviceAdmin, permissions::DEVICE_ADMIN),
    (Feature::HasReadSms, "READ_SMS"),
    (Feature::HasSendSms, "SEND_SMS"),
    (Feature::HasReceiveSms, "RECEIVE_SMS"),
    (Feature::HasCamera, "CAMERA"),
    (Feature::HasRecordAudio, "RECORD_AUDIO"),
    (Feature::HasAccessFineLocation, "ACCESS_FINE_LOCATION"),
    (Feature::HasWriteSettings, "WRITE_SETTINGS"),
    (Feature::HasInstallPackages, "INSTALL_PACKAGES"),
    (Feature::HasDeletePackages, "DELETE_PACKAGES"),
    (Feature::HasWriteExternalStorage, "WRITE_EXTERNAL_STORAGE"),
];

impl Feature {
    pub const ALL: [Feature; NUM_FEATURES] = [
        Feature::TotalPermissions,
        Feature::DangerousPermissions,
        Feature::PermissionRatio,
        Feature::HasSystemAlertWindow,
        Feature::HasBindAccessibilityService,
        Feature::HasBindDeviceAdmin,
        Feature::HasReadSms,
        Feature::HasSendSms,
        Feature::HasReceiveSms,
        Feature::HasCamera,
        Feature::HasRecordAudio,
        Feature::HasAccessFineLocation,
        Feature::HasWriteSettings,
        Feature::HasInstallPackages,
        Feature::HasDeletePackages,
        Feature::HasWriteExternalStorage,
        Feature::MinSdk,
        Feature::TargetSdk,
        Feature::VersionCode,
        Feature::FileSizeMb,
        Feature::IsSelfSigned,
        Feature::CertValid,
        Feature::ActivitiesCount,
        Feature::ServicesCount,
        Feature::ReceiversCount,
        Feature::SuspiciousStringsCount,
        Feature::HasIpAddress,
        Feature::HasBankingKeywords,
        Feature::SensitiveApiRuntime,
        Feature::SuspiciousSyscalls,
        Feature::SuspiciousDomainHits,
        Feature::MaliciousBehaviorScore,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        FEATURE_NAMES[self.index()]
    }

    pub fn from_name(name: &str) -> Option<Self> {
        FEATURE_NAMES
            .iter()
            .position(|n| *n == name)
            .map(|idx| Self::ALL[idx])
    }

    pub fn kind(self) -> FeatureKind {
        use Feature::*;
        match self {
            PermissionRatio => FeatureKind::Ratio,
            MinSdk | TargetSdk | VersionCode => FeatureKind::Level,
            HasSystemAlertWindow
            | HasBindAccessibilityService
            | HasBindDeviceAdmin
            | HasReadSms
            | HasSendSms
            | HasReceiveSms
            | HasCamera
            | HasRecordAudio
            | HasAccessFineLocation
            | HasWriteSettings
            | HasInstallPackages
            | HasDeletePackages
            | HasWriteExternalStorage
            | IsSelfSigned
            | CertValid
            | HasIpAddress
            | HasBankingKeywords
            | SuspiciousDomainHits => FeatureKind::Flag,
            _ => FeatureKind::Count,
        }
    }

    pub fn origin(self) -> FeatureOrigin {
        match self {
            Feature::SensitiveApiRuntime
            | Feature::SuspiciousSyscalls
            | Feature::SuspiciousDomainHits
            | Feature::MaliciousBehaviorScore => FeatureOrigin::Synthesized,
            _ => FeatureOrigin::Static,
        }
    }

    /// Coerce an arbitrary value into this feature's domain.
    pub fn sanitize(self, value: f64) -> f64 {
        match self.kind() {
            FeatureKind::Count => {
                if value.is_finite() && value > 0.0 {
                    value
                } else {
                    0.0
                }
            }
            FeatureKind::Ratio => {
                if value.is_finite() {
                    value.clamp(0.0, 1.0)
                } else {
                    0.0
                }
            }
            FeatureKind::Flag => {
                if value.is_finite() && value >= 0.5 {
                    1.0
                } else {
                    0.0
                }
            }
            FeatureKind::Level => {
                if value.is_finite() && value >= 1.0 {
                    value
                } else {
                    1.0
                }
            }
        }
    }
}

impl std::fmt::Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Feature vector
// ---------------------------------------------------------------------------

/// Fixed, ordered mapping from feature name to a finite value.
///
/// Only the normalizer writes values, and every write goes through
/// [`Feature::sanitize`]. Callers outside the crate cannot set a slot:
///
/// ```compile_fail
/// use apkshield::classifier::{Feature, FeatureVector};
/// let fv = FeatureVector::zeroed().with(Feature::MinSdk, 30.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    values: [f64; NUM_FEATURES],
}

impl FeatureVector {
    /// Vector with every feature at its default.
    pub fn zeroed() -> Self {
        let mut values = [0.0; NUM_FEATURES];
        for feature in Feature::ALL {
            values[feature.index()] = feature.sanitize(f64::NAN);
        }
        Self { values }
    }

    /// Return a copy with `feature` set, sanitized.
    #[cfg(test)]
    pub(crate) fn with(mut self, feature: Feature, value: f64) -> Self {
        self.set(feature, value);
        self
    }

    fn set(&mut self, feature: Feature, value: f64) {
        let clean = feature.sanitize(value);
        // NaN marks an absent input, so only coerced real values are logged
        if !value.is_nan() && clean != value {
            debug!(feature = feature.name(), raw = value, clean, "sanitized feature value");
        }
        self.values[feature.index()] = clean;
    }

    #[inline]
    pub fn get(&self, feature: Feature) -> f64 {
        self.values[feature.index()]
    }

    pub fn get_by_name(&self, name: &str) -> Option<f64> {
        Feature::from_name(name).map(|f| self.get(f))
    }

    pub fn contains(&self, name: &str) -> bool {
        Feature::from_name(name).is_some()
    }

    /// Whether a 0/1 feature is set.
    pub fn flag(&self, feature: Feature) -> bool {
        self.get(feature) >= 0.5
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (Feature, f64)> + '_ {
        Feature::ALL.iter().map(move |&f| (f, self.get(f)))
    }

    /// Values for `names`, in that order; `None` if any name is unknown.
    pub fn select(&self, names: &[String]) -> Option<Vec<f64>> {
        names.iter().map(|n| self.get_by_name(n)).collect()
    }
}

impl Default for FeatureVector {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl Serialize for FeatureVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(NUM_FEATURES))?;
        for (feature, value) in self.iter() {
            map.serialize_entry(feature.name(), &value)?;
        }
        map.end()
    }
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

fn count<T>(items: &[T]) -> f64 {
    items.len() as f64
}

fn opt_num(v: Option<i64>) -> f64 {
    v.map(|n| n as f64).unwrap_or(f64::NAN)
}

fn bool_num(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

/// Normalize against the current wall clock.
pub fn normalize(raw: &RawFacts) -> FeatureVector {
    normalize_at(raw, Utc::now())
}

/// Normalize with certificate validity evaluated at `now`.
pub fn normalize_at(raw: &RawFacts, now: DateTime<Utc>) -> FeatureVector {
    let mut fv = FeatureVector::zeroed();

    let total = count(&raw.permissions);
    let dangerous = raw.permissions.iter().filter(|p| permissions::is_dangerous(p)).count() as f64;
    let ratio = if total > 0.0 { dangerous / total } else { 0.0 };
    fv.set(Feature::TotalPermissions, total);
    fv.set(Feature::DangerousPermissions, dangerous);
    fv.set(Feature::PermissionRatio, ratio);

    for (feature, permission) in PERMISSION_FLAGS {
        fv.set(feature, bool_num(declares(&raw.permissions, permission)));
    }

    fv.set(Feature::MinSdk, opt_num(raw.min_sdk));
    fv.set(Feature::TargetSdk, opt_num(raw.target_sdk));
    fv.set(Feature::VersionCode, opt_num(raw.version_code));
    fv.set(
        Feature::FileSizeMb,
        raw.file_size.unwrap_or(0.0) / (1024.0 * 1024.0),
    );

    fv.set(Feature::IsSelfSigned, bool_num(raw.certificate_self_signed()));
    fv.set(Feature::CertValid, bool_num(raw.certificate_valid_at(now)));

    fv.set(Feature::ActivitiesCount, count(&raw.activities));
    fv.set(Feature::ServicesCount, count(&raw.services));
    fv.set(Feature::ReceiversCount, count(&raw.receivers));

    let strings = count(&raw.suspicious_strings);
    let has_ip = content::any_ip_url(&raw.suspicious_strings);
    fv.set(Feature::SuspiciousStringsCount, strings);
    fv.set(Feature::HasIpAddress, bool_num(has_ip));
    fv.set(
        Feature::HasBankingKeywords,
        bool_num(content::any_banking_vocabulary(&raw.suspicious_strings)),
    );

    // Synthesized from the sanitized values above, never from raw input
    let sensitive_api = fv.get(Feature::DangerousPermissions) * 2.0;
    let syscalls = (fv.get(Feature::SuspiciousStringsCount) * 3.0).min(SYSCALL_CAP);
    let domain_hits = fv.get(Feature::HasIpAddress);
    fv.set(Feature::SensitiveApiRuntime, sensitive_api);
    fv.set(Feature::SuspiciousSyscalls, syscalls);
    fv.set(Feature::SuspiciousDomainHits, domain_hits);
    fv.set(
        Feature::MaliciousBehaviorScore,
        sensitive_api * 2.0 + syscalls * 1.5 + domain_hits * 3.0,
    );

    fv
}
