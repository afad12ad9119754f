//! Content signals over extracted suspicious strings

use std::sync::OnceLock;

use regex::Regex;

static DOTTED_QUAD: OnceLock<Regex> = OnceLock::new();
static BANKING: OnceLock<Regex> = OnceLock::new();

fn dotted_quad() -> &'static Regex {
    DOTTED_QUAD.get_or_init(|| Regex::new(r"\d+\.\d+\.\d+\.\d+").expect("valid regex"))
}

fn banking_vocabulary() -> &'static Regex {
    BANKING.get_or_init(|| Regex::new(r"(?i)bank|pay|card|pin").expect("valid regex"))
}

/// A plain-HTTP URL pointing at a raw IPv4 address.
pub fn is_ip_url(s: &str) -> bool {
    s.contains("http://") && dotted_quad().is_match(s)
}

/// Banking or payment vocabulary anywhere in the string.
pub fn has_banking_vocabulary(s: &str) -> bool {
    banking_vocabulary().is_match(s)
}

pub fn any_ip_url(strings: &[String]) -> bool {
    strings.iter().any(|s| is_ip_url(s))
}

pub fn any_banking_vocabulary(strings: &[String]) -> bool {
    strings.iter().any(|s| has_banking_vocabulary(s))
}

/// Render a byte count as `B`, `KB` or `MB` with one decimal.
pub fn human_size(bytes: f64) -> String {
    if !bytes.is_finite() || bytes < 0.0 {
        return "Unknown".to_string();
    }
    if bytes < 1024.0 {
        format!("{} B", bytes as u64)
    } else if bytes < 1024.0 * 1024.0 {
        format!("{:.1} KB", bytes / 1024.0)
    } else {
        format!("{:.1} MB", bytes / (1024.0 * 1024.0))
    }
}
