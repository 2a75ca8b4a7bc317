//! Configuration management for `stickyboard`.
//!
//! Configuration sources and precedence (highest wins):
//! 1. CLI overrides
//! 2. Environment variables (`STICKYBOARD_*`)
//! 3. Board config (`.stickyboard/config.yaml`)
//! 4. User config (`~/.config/stickyboard/config.yaml`)
//! 5. Defaults

use crate::error::{BoardError, Result};
use crate::storage::{NoteStore, StoreOptions};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Directory holding a board's database and config when none is configured.
pub const DEFAULT_BOARD_DIR: &str = ".stickyboard";
/// Default database filename inside the board directory.
pub const DEFAULT_DB_FILENAME: &str = "notes.db";
/// Header color of notes added without an explicit color.
pub const DEFAULT_NOTE_COLOR: &str = "#fff740";
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

const ENV_PREFIX: &str = "STICKYBOARD_";

/// A flat set of configuration keys. Keys are normalized to kebab-case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigLayer {
    pub values: HashMap<String, String>,
}

impl ConfigLayer {
    /// Merge another layer on top of this one (higher precedence wins).
    pub fn merge_from(&mut self, other: &Self) {
        for (key, value) in &other.values {
            self.values.insert(key.clone(), value.clone());
        }
    }

    /// Merge multiple layers in precedence order (lowest to highest).
    #[must_use]
    pub fn merge_layers(layers: &[Self]) -> Self {
        let mut merged = Self::default();
        for layer in layers {
            merged.merge_from(layer);
        }
        merged
    }

    /// Build a layer from a YAML file path. Missing files return empty config.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn from_yaml(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        let value: serde_yaml::Value = serde_yaml::from_str(&contents)?;
        Ok(layer_from_yaml_value(&value))
    }

    /// Build a layer from `STICKYBOARD_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(env::vars())
    }

    fn from_vars(vars: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut layer = Self::default();
        for (key, value) in vars {
            if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                if stripped == "DIR" {
                    continue;
                }
                layer.set(stripped, value);
            }
        }
        layer
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.values.insert(normalize_key(key), value.into());
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(&normalize_key(key)).map(String::as_str)
    }
}

/// CLI overrides for config loading (optional).
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub db: Option<PathBuf>,
    pub color: Option<String>,
    pub busy_timeout_ms: Option<u64>,
}

impl CliOverrides {
    #[must_use]
    pub fn as_layer(&self) -> ConfigLayer {
        let mut layer = ConfigLayer::default();

        if let Some(path) = &self.db {
            layer.set("database", path.to_string_lossy());
        }
        if let Some(color) = &self.color {
            layer.set("default-color", color.clone());
        }
        if let Some(timeout) = self.busy_timeout_ms {
            layer.set("busy-timeout-ms", timeout.to_string());
        }

        layer
    }
}

/// Settings resolved from every layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardConfig {
    pub board_dir: PathBuf,
    pub db_path: PathBuf,
    pub busy_timeout: Duration,
    pub default_color: String,
}

impl BoardConfig {
    /// Resolve typed settings from a merged layer.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Config`] if a value cannot be parsed.
    pub fn from_layer(board_dir: &Path, layer: &ConfigLayer) -> Result<Self> {
        let db_path = layer.get("database").map_or_else(
            || board_dir.join(DEFAULT_DB_FILENAME),
            |database| {
                let candidate = PathBuf::from(database);
                if candidate.is_absolute() {
                    candidate
                } else {
                    board_dir.join(candidate)
                }
            },
        );

        let busy_timeout_ms = match layer.get("busy-timeout-ms") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                BoardError::Config(format!("busy-timeout-ms must be a whole number, got {raw:?}"))
            })?,
            None => DEFAULT_BUSY_TIMEOUT_MS,
        };

        let default_color = layer
            .get("default-color")
            .map(str::trim)
            .filter(|color| !color.is_empty())
            .unwrap_or(DEFAULT_NOTE_COLOR)
            .to_string();

        Ok(Self {
            board_dir: board_dir.to_path_buf(),
            db_path,
            busy_timeout: Duration::from_millis(busy_timeout_ms),
            default_color,
        })
    }

    #[must_use]
    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            busy_timeout: self.busy_timeout,
            ..StoreOptions::file(&self.db_path)
        }
    }
}

/// Locate the board directory: `STICKYBOARD_DIR` if set, else
/// `.stickyboard` under `start` (or the working directory).
///
/// # Errors
///
/// Returns an error if the working directory cannot be read.
pub fn board_dir(start: Option<&Path>) -> Result<PathBuf> {
    board_dir_with_env(start, env::var("STICKYBOARD_DIR").ok().as_deref())
}

fn board_dir_with_env(start: Option<&Path>, env_override: Option<&str>) -> Result<PathBuf> {
    if let Some(value) = env_override.map(str::trim).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(value));
    }
    let base = match start {
        Some(path) => path.to_path_buf(),
        None => env::current_dir()?,
    };
    Ok(base.join(DEFAULT_BOARD_DIR))
}

/// Load user config (~/.config/stickyboard/config.yaml).
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_user_config() -> Result<ConfigLayer> {
    let Ok(home) = env::var("HOME") else {
        return Ok(ConfigLayer::default());
    };
    let path = Path::new(&home)
        .join(".config")
        .join("stickyboard")
        .join("config.yaml");
    ConfigLayer::from_yaml(&path)
}

/// Load board config (.stickyboard/config.yaml).
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_board_config(board_dir: &Path) -> Result<ConfigLayer> {
    ConfigLayer::from_yaml(&board_dir.join("config.yaml"))
}

/// Load configuration with the documented precedence order.
///
/// # Errors
///
/// Returns an error if any config file cannot be read or parsed, or a value
/// is invalid.
pub fn load_config(board_dir: &Path, cli: &CliOverrides) -> Result<BoardConfig> {
    let merged = ConfigLayer::merge_layers(&[
        load_user_config()?,
        load_board_config(board_dir)?,
        ConfigLayer::from_env(),
        cli.as_layer(),
    ]);
    BoardConfig::from_layer(board_dir, &merged)
}

/// Build a (closed) store for the configured board, creating the board
/// directory when the database lives inside it.
///
/// # Errors
///
/// Returns an error if the database directory cannot be created.
pub fn board_store(config: &BoardConfig) -> Result<NoteStore> {
    if let Some(parent) = config.db_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(NoteStore::new(config.store_options()))
}

fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase().replace('_', "-")
}

fn layer_from_yaml_value(value: &serde_yaml::Value) -> ConfigLayer {
    let mut flat = HashMap::new();
    flatten_yaml(value, "", &mut flat);

    let mut layer = ConfigLayer::default();
    for (key, value) in flat {
        layer.set(&key, value);
    }
    layer
}

fn flatten_yaml(value: &serde_yaml::Value, prefix: &str, out: &mut HashMap<String, String>) {
    match value {
        serde_yaml::Value::Mapping(map) => {
            for (key, value) in map {
                let Some(key_str) = key.as_str() else {
                    continue;
                };
                let next_prefix = if prefix.is_empty() {
                    key_str.to_string()
                } else {
                    format!("{prefix}.{key_str}")
                };
                flatten_yaml(value, &next_prefix, out);
            }
        }
        _ => {
            if let Some(value) = yaml_scalar_to_string(value) {
                out.insert(prefix.to_string(), value);
            }
        }
    }
}

fn yaml_scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::Bool(v) => Some(v.to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Null
        | serde_yaml::Value::Sequence(_)
        | serde_yaml::Value::Mapping(_) => None,
        serde_yaml::Value::Tagged(tagged) => yaml_scalar_to_string(&tagged.value),
    }
}
