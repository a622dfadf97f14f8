use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::PathBuf,
    sync::{PoisonError, RwLock},
    time::Duration,
};

use crate::filters::SortKey;
use crate::stores::DEFAULT_HISTORY_LIMIT;

const DEFAULT_GENERATION_DELAY_MS: u64 = 1500;
const DEBUG_ENV: &str = "RECIPEGEN_DEBUG";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AppSettings {
    pub history_limit: usize,
    pub generation_delay_ms: u64,
    pub default_sort: SortKey,
    pub dietary_preference: Option<String>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            generation_delay_ms: DEFAULT_GENERATION_DELAY_MS,
            default_sort: SortKey::Newest,
            dietary_preference: None,
        }
    }
}

impl AppSettings {
    fn validate(&self) -> Result<()> {
        if self.history_limit == 0 {
            bail!("history limit must be at least 1");
        }
        Ok(())
    }
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<AppSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            let parsed: AppSettings = serde_json::from_str(&contents).unwrap_or_default();
            if parsed.validate().is_ok() {
                parsed
            } else {
                AppSettings::default()
            }
        } else {
            AppSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn get(&self) -> AppSettings {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn update(&self, settings: AppSettings) -> Result<()> {
        settings.validate()?;
        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        self.persist(&settings)?;
        *guard = settings;
        Ok(())
    }

    pub fn update_with(&self, f: impl FnOnce(&mut AppSettings)) -> Result<AppSettings> {
        let mut next = self.get();
        f(&mut next);
        self.update(next.clone())?;
        Ok(next)
    }

    /// Artificial latency for the mock generator. `RECIPEGEN_DEBUG` turns it
    /// off.
    pub fn generation_delay(&self) -> Duration {
        let debug_mode = std::env::var(DEBUG_ENV)
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        if debug_mode {
            Duration::ZERO
        } else {
            Duration::from_millis(self.get().generation_delay_ms)
        }
    }

    fn persist(&self, data: &AppSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}

impl SettingsStore {
    pub fn reload(&self) -> Result<()> {
        let contents = fs::read_to_string(&self.path)?;
        let data: AppSettings = serde_json::from_str(&contents)?;
        data.validate()?;
        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        *guard = data;
        Ok(())
    }
}
