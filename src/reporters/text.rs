//! Text (terminal) reporter with colors and formatting

use crate::models::{ComparisonResult, FinalAssessment, Verdict};

/// Reset ANSI color
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

/// Verdict colors
fn verdict_color(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Safe => "\x1b[32m",       // Green
        Verdict::Suspicious => "\x1b[33m", // Yellow
        Verdict::HighRisk => "\x1b[31m",   // Red
    }
}

/// Ten-cell bar for a 0-10 score
fn score_bar(score: f64) -> String {
    let filled = score.round().clamp(0.0, 10.0) as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(10 - filled))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let head: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{head}...")
    } else {
        s.to_string()
    }
}

fn list_or_none(items: &[String]) -> String {
    if items.is_empty() {
        format!("{DIM}none{RESET}")
    } else {
        items.join(", ")
    }
}

/// Render one assessment as formatted terminal output
pub fn render_assessment(a: &FinalAssessment) -> String {
    let mut out = String::new();
    let p = &a.package;
    let vc = verdict_color(a.verdict);

    // Header
    out.push_str(&format!(
        "\n{BOLD}{}{RESET} {DIM}({} {} / code {}){RESET}\n",
        p.app_name, p.package_name, p.version_name, p.version_code
    ));
    out.push_str(&format!(
        "{DIM}──────────────────────────────────────{RESET}\n"
    ));
    out.push_str(&format!(
        "Risk: {BOLD}{:.1}/10{RESET} {vc}{}{RESET}  Verdict: {vc}{BOLD}{}{RESET}\n",
        a.risk_score,
        score_bar(a.risk_score),
        a.verdict
    ));
    let tier = a
        .rule_tier
        .map(|t| format!("  Rule tier: {t}"))
        .unwrap_or_default();
    out.push_str(&format!(
        "{DIM}Base {:.1} via {}  Confidence {:.0}%  P(malicious) {:.2}{tier}{RESET}\n\n",
        a.base_score,
        a.provenance,
        a.confidence * 100.0,
        a.probabilities.malicious
    ));

    // Factors
    out.push_str(&format!("{BOLD}TOP FACTORS{RESET}\n"));
    for (i, f) in a.top_factors.iter().enumerate() {
        out.push_str(&format!(
            "  {DIM}{:>2}{RESET}  {:<34} {:>4.0}%  {DIM}{}{RESET}\n",
            i + 1,
            truncate(&f.name, 34),
            f.importance * 100.0,
            truncate(&f.display_value, 40)
        ));
    }
    if !a.adjustments.is_empty() {
        let parts: Vec<String> = a
            .adjustments
            .iter()
            .map(|adj| format!("{} +{:.1}", adj.rule, adj.weight))
            .collect();
        out.push_str(&format!("  {DIM}adjustments: {}{RESET}\n", parts.join(", ")));
    }
    out.push('\n');

    // Package
    out.push_str(&format!("{BOLD}PACKAGE{RESET}\n"));
    out.push_str(&format!(
        "  SDK {}-{}  Size {}  Components {}/{}/{} (activities/services/receivers)\n",
        p.min_sdk,
        p.target_sdk,
        p.file_size_human,
        p.components.activities,
        p.components.services,
        p.components.receivers
    ));
    out.push_str(&format!(
        "  Permissions {} ({} dangerous): {}\n",
        p.permissions.len(),
        p.dangerous_permissions.len(),
        list_or_none(&p.dangerous_permissions)
    ));
    out.push_str(&format!(
        "  Certificate: {}  self-signed: {}  valid: {}\n",
        truncate(&p.certificate.subject, 40),
        p.certificate.is_self_signed,
        p.certificate.is_valid
    ));
    if !p.suspicious_strings.is_empty() {
        out.push_str(&format!(
            "  Suspicious strings: {}\n",
            p.suspicious_strings
                .iter()
                .map(|s| truncate(s, 40))
                .collect::<Vec<_>>()
                .join(", ")
        ));
    }

    // Synthesized counters are kept visually apart from real signals
    let t = &a.synthetic_telemetry;
    out.push_str(&format!(
        "\n{DIM}SYNTHETIC TELEMETRY (not observed at runtime)\n  domains {}  dns {}  tcp {}  api {}  reflection {}  crypto {}  sms {}  syscalls {}{RESET}\n",
        t.unique_domains,
        t.dns_queries,
        t.tcp_connections,
        t.total_api_calls,
        t.reflection_calls,
        t.crypto_calls,
        t.sms_operations,
        t.total_syscalls
    ));
    out
}

/// Render a batch as a compact table
pub fn render_batch(assessments: &[FinalAssessment]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "\n{DIM}  #   SCORE  VERDICT      PACKAGE{RESET}\n"
    ));
    out.push_str(&format!(
        "{DIM}  ─────────────────────────────────────────────────────{RESET}\n"
    ));
    for (i, a) in assessments.iter().enumerate() {
        let vc = verdict_color(a.verdict);
        out.push_str(&format!(
            "  {DIM}{:>3}{RESET}  {:>5.1}  {vc}{:<11}{RESET}  {}\n",
            i + 1,
            a.risk_score,
            a.verdict.to_string(),
            truncate(&a.package.package_name, 50)
        ));
    }
    out
}

/// Render a comparison of two packages
pub fn render_comparison(c: &ComparisonResult) -> String {
    let mut out = String::new();
    out.push_str(&format!("\n{BOLD}Package Comparison{RESET}\n"));
    out.push_str(&format!(
        "{DIM}──────────────────────────────────────{RESET}\n"
    ));
    for (label, a) in [("A", &c.a), ("B", &c.b)] {
        out.push_str(&format!(
            "  {label}: {:<40} {:.1}/10 {}{}{RESET}\n",
            truncate(&a.package.package_name, 40),
            a.risk_score,
            verdict_color(a.verdict),
            a.verdict
        ));
    }
    out.push('\n');

    let delta_color = if c.risk_delta > 0.0 {
        "\x1b[31m"
    } else if c.risk_delta < 0.0 {
        "\x1b[32m"
    } else {
        DIM
    };
    out.push_str(&format!(
        "Risk delta (B - A): {delta_color}{:+.1}{RESET}  Similarity: {BOLD}{:.0}%{RESET}\n",
        c.risk_delta,
        c.similarity * 100.0
    ));
    out.push_str(&format!(
        "Version code (A - B): {:+}{}  Min SDK: {:+}  Target SDK: {:+}\n\n",
        c.version_code_delta,
        if c.a_is_newer { " (A is newer)" } else { "" },
        c.min_sdk_delta,
        c.target_sdk_delta
    ));

    out.push_str(&format!(
        "{BOLD}Only in B{RESET}: {}\n",
        list_or_none(&c.permissions_only_in_b)
    ));
    out.push_str(&format!(
        "{BOLD}Only in A{RESET}: {}\n",
        list_or_none(&c.permissions_only_in_a)
    ));
    out.push_str(&format!(
        "{BOLD}New dangerous in B{RESET}: {}\n",
        list_or_none(&c.dangerous_permissions_only_in_b)
    ));
    out
}
