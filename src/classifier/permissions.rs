//! Dangerous-permission catalogue and matching
//!
//! Permission identifiers arrive in whatever shape the inspector emits:
//! fully qualified (`android.permission.READ_SMS`), bare (`READ_SMS`), or in
//! vendor namespaces. Matching compares the segment after the last `.`,
//! case-insensitively, so `a` matches `b` exactly when `b` matches `a`.

/// Sensitive platform capabilities counted as "dangerous".
pub const DANGEROUS_PERMISSIONS: &[&str] = &[
    "SYSTEM_ALERT_WINDOW",
    "BIND_ACCESSIBILITY_SERVICE",
    "WRITE_EXTERNAL_STORAGE",
    "READ_SMS",
    "SEND_SMS",
    "RECEIVE_SMS",
    "READ_PHONE_STATE",
    "CALL_PHONE",
    "RECORD_AUDIO",
    "CAMERA",
    "ACCESS_FINE_LOCATION",
    "WRITE_SETTINGS",
    "INSTALL_PACKAGES",
    "DELETE_PACKAGES",
    "BIND_DEVICE_ADMIN",
];

pub const OVERLAY: &str = "SYSTEM_ALERT_WINDOW";
pub const ACCESSIBILITY: &str = "BIND_ACCESSIBILITY_SERVICE";
pub const DEVICE_ADMIN: &str = "BIND_DEVICE_ADMIN";

/// Segment after the last namespace separator, trimmed.
fn local_name(permission: &str) -> &str {
    let trimmed = permission.trim();
    match trimmed.rfind('.') {
        Some(idx) => &trimmed[idx + 1..],
        None => trimmed,
    }
}

/// Symmetric, case-insensitive suffix match of two permission identifiers.
pub fn permission_matches(a: &str, b: &str) -> bool {
    let (a, b) = (local_name(a), local_name(b));
    !a.is_empty() && a.eq_ignore_ascii_case(b)
}

/// Whether `permission` is in the dangerous set.
pub fn is_dangerous(permission: &str) -> bool {
    DANGEROUS_PERMISSIONS
        .iter()
        .any(|d| permission_matches(permission, d))
}

/// Whether any declared permission matches `wanted`.
pub fn declares(permissions: &[String], wanted: &str) -> bool {
    permissions.iter().any(|p| permission_matches(p, wanted))
}

/// Declared permissions that fall in the dangerous set, in declaration order.
pub fn dangerous_subset(permissions: &[String]) -> Vec<String> {
    permissions
        .iter()
        .filter(|p| is_dangerous(p))
        .cloned()
        .collect()
}

/// Canonical (upper-case local name) key used for set operations.
pub fn canonical(permission: &str) -> String {
    local_name(permission).to_ascii_uppercase()
}
