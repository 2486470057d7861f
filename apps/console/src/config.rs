use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use serde::Deserialize;
use shared::domain::ServiceTier;
use tracing::warn;

pub const DEFAULT_CONFIG_PATH: &str = "arcus.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub log_filter: String,
    pub service_tier: ServiceTier,
    pub feature_flags: Vec<String>,
    pub preferences_path: PathBuf,
    pub popup_delay_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_filter: "info".into(),
            service_tier: ServiceTier::Basic,
            feature_flags: Vec::new(),
            preferences_path: PathBuf::from("./data/preferences.json"),
            popup_delay_ms: 1500,
        }
    }
}

impl Settings {
    pub fn popup_delay(&self) -> Duration {
        Duration::from_millis(self.popup_delay_ms)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileSettings {
    log_filter: Option<String>,
    service_tier: Option<String>,
    feature_flags: Option<Vec<String>>,
    preferences_path: Option<PathBuf>,
    popup_delay_ms: Option<u64>,
}

/// Defaults, then the config file (when present), then `ARCUS__*` variables.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    load_settings_with(path, |key| std::env::var(key).ok())
}

pub(crate) fn load_settings_with(
    path: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let explicit = path.is_some();
    let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH));
    match fs::read_to_string(path) {
        Ok(raw) => {
            let file_cfg: FileSettings = toml::from_str(&raw)
                .with_context(|| format!("failed to parse config file '{}'", path.display()))?;
            apply_file(&mut settings, file_cfg);
        }
        Err(error) if explicit => {
            return Err(error)
                .with_context(|| format!("failed to read config file '{}'", path.display()));
        }
        Err(_) => {}
    }

    if let Some(v) = env("ARCUS__LOG_FILTER") {
        settings.log_filter = v;
    }
    if let Some(v) = env("ARCUS__SERVICE_TIER") {
        apply_tier(&mut settings, &v);
    }
    if let Some(v) = env("ARCUS__FEATURE_FLAGS") {
        settings.feature_flags = split_flags(&v);
    }
    if let Some(v) = env("ARCUS__PREFERENCES_PATH") {
        settings.preferences_path = PathBuf::from(v);
    }
    if let Some(v) = env("ARCUS__POPUP_DELAY_MS") {
        match v.trim().parse::<u64>() {
            Ok(parsed) => settings.popup_delay_ms = parsed,
            Err(_) => warn!(value = %v, "ignoring invalid ARCUS__POPUP_DELAY_MS"),
        }
    }

    Ok(settings)
}

fn apply_file(settings: &mut Settings, file_cfg: FileSettings) {
    if let Some(v) = file_cfg.log_filter {
        settings.log_filter = v;
    }
    if let Some(v) = file_cfg.service_tier {
        apply_tier(settings, &v);
    }
    if let Some(v) = file_cfg.feature_flags {
        settings.feature_flags = v;
    }
    if let Some(v) = file_cfg.preferences_path {
        settings.preferences_path = v;
    }
    if let Some(v) = file_cfg.popup_delay_ms {
        settings.popup_delay_ms = v;
    }
}

fn apply_tier(settings: &mut Settings, raw: &str) {
    match ServiceTier::parse(raw) {
        Some(tier) => settings.service_tier = tier,
        None => warn!(value = raw, "ignoring unknown service tier"),
    }
}

fn split_flags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|flag| !flag.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
