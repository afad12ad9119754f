use super::*;
use std::io::Write;

#[test]
fn test_defaults() {
    let config = AssessmentConfig::default();
    assert_eq!(config.adjustments.overlay_accessibility, 1.5);
    assert_eq!(config.adjustments.suspicious_strings, 2.0);
    assert_eq!(config.adjustments.invalid_certificate, 2.0);
    assert!(config.model.path.is_none());
    assert!(config.scoring.budget().is_none());
}

#[test]
fn test_example_config_parses() {
    let layer = ConfigLayer::from_toml(EXAMPLE_CONFIG, "example").unwrap();
    let mut config = AssessmentConfig::default();
    config.merge(layer);
    assert_eq!(config, AssessmentConfig::default());
}

#[test]
fn test_partial_layer_only_overrides_set_fields() {
    let layer = ConfigLayer::from_toml(
        r#"
[adjustments]
suspicious_strings = 3.25

[scoring]
budget_ms = 40
"#,
        "inline",
    )
    .unwrap();
    let mut config = AssessmentConfig::default();
    config.merge(layer);
    assert_eq!(config.adjustments.suspicious_strings, 3.25);
    assert_eq!(config.adjustments.overlay_accessibility, 1.5);
    assert_eq!(config.scoring.budget(), Some(Duration::from_millis(40)));
}

#[test]
fn test_invalid_toml_is_an_error() {
    let err = ConfigLayer::from_toml("[adjustments\nbroken", "bad.toml");
    assert!(matches!(err, Err(ConfigError::Parse { .. })));
}

#[test]
fn test_env_rule_weights_json() {
    let layer = ConfigLayer::from_env_values(
        Some(r#"{"system_alert": 0.5, "invalid_cert": 4.0}"#),
        Some("/opt/models/m.json"),
    )
    .unwrap();
    let mut config = AssessmentConfig::default();
    config.merge(layer);
    assert_eq!(config.adjustments.overlay_accessibility, 0.5);
    assert_eq!(config.adjustments.suspicious_strings, 2.0);
    assert_eq!(config.adjustments.invalid_certificate, 4.0);
    assert_eq!(config.model.path, Some(PathBuf::from("/opt/models/m.json")));
}

#[test]
fn test_env_blank_values_ignored() {
    let layer = ConfigLayer::from_env_values(Some("  "), Some("")).unwrap();
    assert_eq!(layer, ConfigLayer::default());
}

#[test]
fn test_env_malformed_json() {
    let err = ConfigLayer::from_env_values(Some("{not json"), None);
    assert!(matches!(err, Err(ConfigError::Parse { .. })));
}

#[test]
fn test_invalid_weights_replaced_by_defaults() {
    let mut weights = AdjustmentWeights {
        overlay_accessibility: -1.0,
        suspicious_strings: f64::NAN,
        invalid_certificate: 0.0,
    };
    assert_eq!(weights.validate().len(), 2);
    weights.sanitize();
    assert_eq!(weights.overlay_accessibility, 1.5);
    assert_eq!(weights.suspicious_strings, 2.0);
    assert_eq!(weights.invalid_certificate, 0.0);
    assert!(weights.validate().is_empty());
}

#[test]
fn test_load_project_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut file = std::fs::File::create(dir.path().join(CONFIG_FILE_NAME)).unwrap();
    writeln!(file, "[adjustments]\noverlay_accessibility = 2.75").unwrap();

    let config = AssessmentConfig::load_layers(None, dir.path(), None, ConfigLayer::default());
    assert_eq!(config.adjustments.overlay_accessibility, 2.75);
    assert_eq!(config.adjustments.suspicious_strings, 2.0);
}

#[test]
fn test_load_broken_project_file_falls_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("custom.toml");
    std::fs::write(&path, "this is = = not toml").unwrap();

    let config =
        AssessmentConfig::load_layers(Some(&path), dir.path(), None, ConfigLayer::default());
    assert_eq!(config, AssessmentConfig::default());
}

#[test]
fn test_load_layer_priority() {
    let dir = tempfile::tempdir().unwrap();
    let user = dir.path().join("user.toml");
    std::fs::write(
        &user,
        "[adjustments]\noverlay_accessibility = 0.5\nsuspicious_strings = 0.25\n",
    )
    .unwrap();
    std::fs::write(
        dir.path().join(CONFIG_FILE_NAME),
        "[adjustments]\nsuspicious_strings = 3.0\n",
    )
    .unwrap();
    let env = ConfigLayer::from_env_values(
        Some(r#"{"invalid_cert": 1.25}"#),
        Some("/opt/models/m.json"),
    )
    .unwrap();

    let config = AssessmentConfig::load_layers(None, dir.path(), Some(&user), env);
    assert_eq!(config.adjustments.overlay_accessibility, 0.5);
    assert_eq!(config.adjustments.suspicious_strings, 3.0);
    assert_eq!(config.adjustments.invalid_certificate, 1.25);
    assert_eq!(config.model.path, Some(PathBuf::from("/opt/models/m.json")));
}

#[test]
fn test_load_env_invalid_weight_sanitized() {
    let dir = tempfile::tempdir().unwrap();
    let env = ConfigLayer::from_env_values(Some(r#"{"suspicious_url": -4.0}"#), None).unwrap();
    let config = AssessmentConfig::load_layers(None, dir.path(), None, env);
    assert_eq!(config.adjustments.suspicious_strings, 2.0);
}

#[test]
fn test_user_config_path_returns_some() {
    if let Some(path) = user_config_path() {
        assert!(path.ends_with("apkshield/config.toml"));
    }
}
