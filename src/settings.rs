use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

pub const BACKEND_URL_ENV: &str = "FOCUSPEER_BACKEND_URL";
pub const USER_NAME_ENV: &str = "FOCUSPEER_USER_NAME";

pub const MIN_TICK_INTERVAL: Duration = Duration::from_millis(1);
/// Upper bound for `tickIntervalMs`; larger values overflow timer deadlines.
pub const MAX_TICK_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientSettings {
    pub backend_url: String,
    pub default_user_name: String,
    pub session_duration_minutes: u32,
    pub tick_interval_ms: u64,
    /// Clear the phone-usage flag after every tick instead of keeping it for
    /// the rest of the page lifetime.
    pub reset_phone_usage_each_tick: bool,
    pub teardown_flush_timeout_ms: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            backend_url: "http://127.0.0.1:4943/focuspeer".into(),
            default_user_name: "User".into(),
            session_duration_minutes: 1,
            tick_interval_ms: 5_000,
            reset_phone_usage_each_tick: false,
            teardown_flush_timeout_ms: 2_000,
        }
    }
}

impl ClientSettings {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms).clamp(MIN_TICK_INTERVAL, MAX_TICK_INTERVAL)
    }

    pub fn teardown_flush_timeout(&self) -> Duration {
        Duration::from_millis(self.teardown_flush_timeout_ms)
    }

    /// Applies non-empty values from `lookup` over the file/default values.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(BACKEND_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.backend_url = url;
        }
        if let Some(name) = lookup(USER_NAME_ENV).filter(|v| !v.trim().is_empty()) {
            self.default_user_name = name;
        }
    }
}

pub struct SettingsStore {
    path: Option<PathBuf>,
    data: ClientSettings,
}

impl SettingsStore {
    /// Loads settings from `path` when given and present; otherwise defaults.
    /// A file that fails to parse falls back to defaults with a warning.
    pub fn new(path: Option<PathBuf>) -> Result<Self> {
        let data = match path.as_deref() {
            Some(path) if path.exists() => read_settings(path)?,
            _ => ClientSettings::default(),
        };

        Ok(Self { path, data })
    }

    pub fn from_env(path: Option<PathBuf>) -> Result<Self> {
        let mut store = Self::new(path)?;
        store.data.apply_env(|key| std::env::var(key).ok());
        Ok(store)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn client(&self) -> ClientSettings {
        self.data.clone()
    }

    pub fn client_mut(&mut self) -> &mut ClientSettings {
        &mut self.data
    }
}

fn read_settings(path: &Path) -> Result<ClientSettings> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings from {}", path.display()))?;

    Ok(serde_json::from_str(&contents).unwrap_or_else(|err| {
        warn!(
            "Ignoring unparsable settings in {}: {err}; using defaults",
            path.display()
        );
        ClientSettings::default()
    }))
}
