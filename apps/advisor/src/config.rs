use std::{collections::HashMap, fs, path::Path, time::Duration};

use anyhow::Context;

pub const DEFAULT_SETTINGS_FILE: &str = "advisor.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api_url: String,
    pub request_timeout_ms: Option<u64>,
    pub cache_max_age_ms: i64,
    pub cache_path: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000".into(),
            request_timeout_ms: Some(30_000),
            cache_max_age_ms: advisor_core::DEFAULT_MAX_AGE_MILLIS,
            cache_path: None,
        }
    }
}

impl Settings {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }
}

/// Defaults, then the settings file (if present), then the environment.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let explicit = path.is_some();
    let path = path.unwrap_or_else(|| Path::new(DEFAULT_SETTINGS_FILE));
    match fs::read_to_string(path) {
        Ok(raw) => {
            let file_cfg = toml::from_str::<HashMap<String, toml::Value>>(&raw)
                .with_context(|| format!("failed to parse settings file '{}'", path.display()))?;
            apply_file(&mut settings, &file_cfg);
        }
        Err(err) if explicit => {
            return Err(err)
                .with_context(|| format!("failed to read settings file '{}'", path.display()));
        }
        Err(_) => {}
    }

    apply_env(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

fn file_value(value: &toml::Value) -> Option<String> {
    match value {
        toml::Value::String(v) => Some(v.clone()),
        toml::Value::Integer(v) => Some(v.to_string()),
        _ => None,
    }
}

fn apply_file(settings: &mut Settings, file_cfg: &HashMap<String, toml::Value>) {
    apply_overrides(settings, |key| file_cfg.get(key).and_then(file_value));
}

pub fn apply_env(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("ADVISOR_API_URL") {
        settings.api_url = v;
    }
    apply_overrides(settings, |key| lookup(&format!("APP__{}", key.to_ascii_uppercase())));
}

fn apply_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("api_url") {
        settings.api_url = v;
    }
    if let Some(v) = lookup("request_timeout_ms") {
        if let Ok(parsed) = v.trim().parse::<u64>() {
            settings.request_timeout_ms = (parsed > 0).then_some(parsed);
        }
    }
    if let Some(v) = lookup("cache_max_age_ms") {
        if let Ok(parsed) = v.trim().parse::<i64>() {
            settings.cache_max_age_ms = parsed.max(0);
        }
    }
    if let Some(v) = lookup("cache_path") {
        let v = v.trim();
        settings.cache_path = (!v.is_empty()).then(|| v.to_string());
    }
}
