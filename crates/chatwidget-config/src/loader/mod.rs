//! Layered configuration loader.
//!
//! Discovers configuration layers (user, cwd, runtime overrides), merges them
//! in precedence order, and produces a validated `ChatWidgetConfig`.

mod layer_io;
mod merge;


use crate::{ChatWidgetConfig, ConfigError};
use log::{debug, info};
use serde_json::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Default config filename in local layers.
const DEFAULT_CONFIG_FILE: &str = "chatwidget.json5";
/// Default config directory under the home directory.
const DEFAULT_CONFIG_DIR: &str = ".chatwidget";
/// Longest accepted history retention, one hundred years.
const MAX_HISTORY_AGE_DAYS: i64 = 36_500;

/// Merged config together with the files it was assembled from.
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    /// Result of merging every layer, already validated.
    pub config: ChatWidgetConfig,
    /// Contributing layers, lowest precedence first.
    pub layers: Vec<ConfigLayer>,
}

/// Where a layer was discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLayerSource {
    /// `~/.chatwidget/chatwidget.json5`.
    User,
    /// `chatwidget.json5` in the working directory.
    Cwd,
    /// Paths passed explicitly, e.g. `--config`; these win.
    Runtime,
}

/// Metadata about a loaded config layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLayer {
    /// Layer origin.
    pub source: ConfigLayerSource,
    /// Location on disk.
    pub path: PathBuf,
}

/// Locations searched by [`ChatWidgetConfig::load_layered_with_options`].
#[derive(Debug, Clone)]
pub struct LayeredConfigOptions {
    /// Working directory searched for a local layer.
    pub cwd: PathBuf,
    /// Optional user config path (defaults to `~/.chatwidget/chatwidget.json5`).
    pub user_config_path: Option<PathBuf>,
    /// Runtime override config paths applied last.
    pub runtime_paths: Vec<PathBuf>,
}

impl LayeredConfigOptions {
    /// Default user layer plus the local layer under `cwd`.
    pub fn new(cwd: impl AsRef<Path>) -> Self {
        Self {
            cwd: cwd.as_ref().to_path_buf(),
            user_config_path: layer_io::default_user_config_path(),
            runtime_paths: Vec::new(),
        }
    }

    /// Append an explicit layer; it must exist.
    pub fn with_runtime_path(mut self, path: impl AsRef<Path>) -> Self {
        self.runtime_paths.push(path.as_ref().to_path_buf());
        self
    }
}

impl ChatWidgetConfig {
    /// Read one JSON5 file and validate it, ignoring other layers.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        info!("loading config file {}", path.as_ref().display());
        let value = layer_io::read_json5(path.as_ref())?;
        config_from_value(value)
    }

    /// Parse and validate an in-memory JSON5 document.
    pub fn load_from_str(contents: &str) -> Result<Self, ConfigError> {
        debug!("loading inline config (len={})", contents.len());
        let value = layer_io::parse_json5("<inline>", contents)?;
        config_from_value(value)
    }

    /// Merge the user and cwd layers found for `cwd`.
    pub fn load_layered(cwd: impl AsRef<Path>) -> Result<LayeredConfig, ConfigError> {
        info!(
            "loading config layers (cwd={})",
            cwd.as_ref().display()
        );
        Self::load_layered_with_options(LayeredConfigOptions::new(cwd))
    }

    /// Load a layered config stack using explicit layer locations.
    ///
    /// Layer precedence (low -> high): user, cwd, runtime overrides.
    pub fn load_layered_with_options(
        options: LayeredConfigOptions,
    ) -> Result<LayeredConfig, ConfigError> {
        let cwd = layer_io::resolve_cwd(&options.cwd)?;
        debug!("config cwd resolved to {}", cwd.display());
        let mut layers = Vec::new();
        let mut merged = Value::Object(serde_json::Map::new());
        let mut seen_paths = HashSet::new();

        let candidates = [
            (ConfigLayerSource::User, options.user_config_path.clone()),
            (ConfigLayerSource::Cwd, Some(cwd.join(DEFAULT_CONFIG_FILE))),
        ];
        for (source, path) in candidates {
            let Some(path) = path else {
                continue;
            };
            if !seen_paths.insert(layer_io::layer_identity(&path)) {
                debug!(
                    "skipping duplicate layer (source={:?}, path={})",
                    source,
                    path.display()
                );
                continue;
            }
            if let Some(layer) = layer_io::load_optional_layer(source, &path)? {
                merge::merge_json_values(&mut merged, &layer.value);
                layers.push(layer.meta);
            }
        }

        for runtime_path in &options.runtime_paths {
            let layer = layer_io::load_required_layer(ConfigLayerSource::Runtime, runtime_path)?;
            debug!("loaded runtime layer (path={})", runtime_path.display());
            merge::merge_json_values(&mut merged, &layer.value);
            layers.push(layer.meta);
        }

        let config = config_from_value(merged)?;
        info!("config ready (layers={})", layers.len());
        Ok(LayeredConfig { config, layers })
    }

    /// Range checks serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.client.endpoint.trim().is_empty() {
            return Err(invalid_field("client.endpoint", "must not be empty"));
        }
        if self.client.model.trim().is_empty() {
            return Err(invalid_field("client.model", "must not be empty"));
        }
        if self.client.max_tokens == 0 {
            return Err(invalid_field("client.max_tokens", "must be positive"));
        }
        if !(0.0..=2.0).contains(&self.client.temperature) {
            return Err(invalid_field(
                "client.temperature",
                "must be between 0.0 and 2.0",
            ));
        }
        if self.history.max_messages == 0 {
            return Err(invalid_field("history.max_messages", "must be positive"));
        }
        if !(1..=MAX_HISTORY_AGE_DAYS).contains(&self.history.max_age_days) {
            return Err(invalid_field(
                "history.max_age_days",
                "must be between 1 and 36500",
            ));
        }
        Ok(())
    }
}

/// Parsed layer waiting to be merged.
#[derive(Debug, Clone)]
struct LoadedLayer {
    meta: ConfigLayer,
    value: Value,
}

fn invalid_field(path: &str, message: &str) -> ConfigError {
    ConfigError::InvalidField {
        path: path.to_string(),
        message: message.to_string(),
    }
}

fn config_from_value(value: Value) -> Result<ChatWidgetConfig, ConfigError> {
    if !value.is_object() {
        return Err(ConfigError::Invalid(
            "config root must be an object".to_string(),
        ));
    }
    let config: ChatWidgetConfig = serde_json::from_value(value)?;
    config.validate()?;
    Ok(config)
}
