//! Store configuration and factory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use kanjiflow_core::policy::DeckPolicy;
use kanjiflow_core::store::Store;

use crate::json_file::JsonFileStore;
use crate::memory::MemoryStore;

/// Environment variable that overrides the snapshot path.
pub const STORE_PATH_ENV: &str = "KANJIFLOW_STORE_PATH";

/// Which backend holds decks, cards, and review events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StoreConfig {
    Json {
        #[serde(default = "default_store_path")]
        path: PathBuf,
    },
    Memory,
}

fn default_store_path() -> PathBuf {
    PathBuf::from("kanjiflow.json")
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::Json {
            path: default_store_path(),
        }
    }
}

/// Top-level kanjiflow configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KanjiflowConfig {
    #[serde(default)]
    pub store: StoreConfig,
    /// Global scheduling policy; decks override individual fields.
    #[serde(default)]
    pub defaults: DeckPolicy,
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        let Some(end) = result[start..].find('}') else {
            break;
        };
        let var_name = &result[start + 2..start + end];
        let value = std::env::var(var_name).unwrap_or_default();
        result = format!(
            "{}{}{}",
            &result[..start],
            value,
            &result[start + end + 1..]
        );
    }
    result
}

fn resolve_store_config(config: &StoreConfig) -> StoreConfig {
    match config {
        StoreConfig::Json { path } => StoreConfig::Json {
            path: PathBuf::from(resolve_env_vars(&path.to_string_lossy())),
        },
        StoreConfig::Memory => StoreConfig::Memory,
    }
}

/// Load config from an explicit path, or search the default locations.
///
/// Search order without a path:
/// 1. `kanjiflow.toml` in the current directory
/// 2. `~/.config/kanjiflow/config.toml`
///
/// `KANJIFLOW_STORE_PATH` switches to the JSON store at that path.
pub fn load_config_from(path: Option<&Path>) -> Result<KanjiflowConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from("kanjiflow.toml");
            if local.exists() {
                Some(local)
            } else {
                dirs_path()
                    .map(|home| home.join("config.toml"))
                    .filter(|global| global.exists())
            }
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            let config = toml::from_str::<KanjiflowConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?;
            tracing::debug!(path = %path.display(), "loaded config");
            config
        }
        None => KanjiflowConfig::default(),
    };

    if let Ok(path) = std::env::var(STORE_PATH_ENV) {
        if !path.is_empty() {
            config.store = StoreConfig::Json {
                path: PathBuf::from(path),
            };
        }
    }

    config.store = resolve_store_config(&config.store);
    config
        .defaults
        .validate()
        .context("invalid [defaults] policy")?;

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("kanjiflow"))
}

/// Open the store described by `config`.
pub async fn open_store(config: &StoreConfig) -> Result<Arc<dyn Store>> {
    match config {
        StoreConfig::Json { path } => {
            let store = JsonFileStore::open(path)
                .await
                .with_context(|| format!("failed to open store: {}", path.display()))?;
            Ok(Arc::new(store))
        }
        StoreConfig::Memory => Ok(Arc::new(MemoryStore::new())),
    }
}
