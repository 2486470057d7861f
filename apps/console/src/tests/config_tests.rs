use super::{load_settings_with, Settings};

use std::{collections::HashMap, fs, path::PathBuf};

use shared::domain::ServiceTier;

fn no_env(_: &str) -> Option<String> {
    None
}

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

#[test]
fn missing_explicit_file_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let absent = dir.path().join("absent.toml");
    assert!(load_settings_with(Some(absent.as_path()), no_env).is_err());
}

#[test]
fn file_values_override_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("arcus.toml");
    fs::write(
        &path,
        r#"
log_filter = "debug"
service_tier = "premium"
feature_flags = ["care_behaviors", "rate_app_prompt"]
popup_delay_ms = 250
"#,
    )
    .expect("write config");

    let settings = load_settings_with(Some(path.as_path()), no_env).expect("load");
    assert_eq!(settings.log_filter, "debug");
    assert_eq!(settings.service_tier, ServiceTier::Premium);
    assert_eq!(
        settings.feature_flags,
        vec!["care_behaviors".to_string(), "rate_app_prompt".to_string()]
    );
    assert_eq!(settings.popup_delay_ms, 250);
    assert_eq!(
        settings.preferences_path,
        Settings::default().preferences_path
    );
}

#[test]
fn env_overrides_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("arcus.toml");
    fs::write(&path, "service_tier = \"premium\"\npopup_delay_ms = 250\n").expect("write config");

    let env = env_from(&[
        ("ARCUS__SERVICE_TIER", "promon"),
        ("ARCUS__FEATURE_FLAGS", "care_behaviors, ,rate_app_prompt"),
        ("ARCUS__PREFERENCES_PATH", "/tmp/arcus/prefs.json"),
        ("ARCUS__POPUP_DELAY_MS", "10"),
    ]);
    let settings = load_settings_with(Some(path.as_path()), env).expect("load");

    assert_eq!(settings.service_tier, ServiceTier::PremiumPromon);
    assert_eq!(
        settings.feature_flags,
        vec!["care_behaviors".to_string(), "rate_app_prompt".to_string()]
    );
    assert_eq!(
        settings.preferences_path,
        PathBuf::from("/tmp/arcus/prefs.json")
    );
    assert_eq!(settings.popup_delay_ms, 10);
}

#[test]
fn invalid_values_keep_previous_setting() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("arcus.toml");
    fs::write(&path, "service_tier = \"platinum\"\n").expect("write config");

    let env = env_from(&[("ARCUS__POPUP_DELAY_MS", "soon")]);
    let settings = load_settings_with(Some(path.as_path()), env).expect("load");
    assert_eq!(settings, Settings::default());
}

#[test]
fn malformed_file_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("arcus.toml");
    fs::write(&path, "popup_delay_ms = \"not a number\"\n").expect("write config");

    let err = load_settings_with(Some(path.as_path()), no_env).expect_err("parse error");
    assert!(err.to_string().contains("failed to parse config file"));
}
