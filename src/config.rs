use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::extract::{DEFAULT_PLATFORM_PREFIXES, PlatformFilter};

pub const CONFIG_ENV: &str = "CLASS_CLOSURE_CONFIG";

/// Settings read from `config.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Class-name prefixes assumed to be provided by the runtime.
    pub platform_prefixes: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            platform_prefixes: DEFAULT_PLATFORM_PREFIXES.iter().map(|p| p.to_string()).collect(),
        }
    }
}

impl Config {
    /// Builds the filter for one run. `extra` prefixes are appended;
    /// `disabled` drops every prefix, including the extra ones.
    pub fn platform_filter(&self, extra: &[String], disabled: bool) -> PlatformFilter {
        if disabled {
            return PlatformFilter::none();
        }
        PlatformFilter::new(self.platform_prefixes.iter().chain(extra).cloned())
    }
}

/// Loads the config from the first location that applies: `explicit`, then
/// `$CLASS_CLOSURE_CONFIG`, then the per-user config directory. Falls back
/// to defaults when none exists.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let path = resolve_config_path(explicit, env::var_os(CONFIG_ENV), default_config_path());
    match path {
        Some(p) => read_config(&p),
        None => Ok(Config::default()),
    }
}

fn resolve_config_path(
    explicit: Option<&Path>,
    from_env: Option<OsString>,
    default_path: Option<PathBuf>,
) -> Option<PathBuf> {
    if let Some(p) = explicit {
        return Some(p.to_path_buf());
    }

    if let Some(p) = from_env.filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(p));
    }

    default_path.filter(|p| p.exists())
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("class-closure").join("config.json"))
}

pub fn read_config(path: &Path) -> Result<Config> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid config file: {}", path.display()))?;
    tracing::debug!(path = %path.display(), "loaded config");
    Ok(config)
}
