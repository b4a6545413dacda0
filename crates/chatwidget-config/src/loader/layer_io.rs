//! Reading config layers and resolving their locations.

use super::{ConfigLayer, ConfigLayerSource, DEFAULT_CONFIG_DIR, DEFAULT_CONFIG_FILE, LoadedLayer};
use crate::ConfigError;
use directories::UserDirs;
use log::debug;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Read and parse a JSON5 document from disk.
pub(super) fn read_json5(path: &Path) -> Result<Value, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_json5(&path.display().to_string(), &contents)
}

pub(super) fn parse_json5(origin: &str, contents: &str) -> Result<Value, ConfigError> {
    json5::from_str(contents).map_err(|source| ConfigError::Parse {
        origin: origin.to_string(),
        source,
    })
}

/// Load a layer if the path exists.
pub(super) fn load_optional_layer(
    source: ConfigLayerSource,
    path: &Path,
) -> Result<Option<LoadedLayer>, ConfigError> {
    if !path.exists() {
        debug!("skipping absent {} layer", layer_label(source, path));
        return Ok(None);
    }
    load_required_layer(source, path).map(Some)
}

/// Load a layer from disk, failing if it is missing or malformed.
pub(super) fn load_required_layer(
    source: ConfigLayerSource,
    path: &Path,
) -> Result<LoadedLayer, ConfigError> {
    debug!("reading {} layer", layer_label(source, path));
    let value = read_json5(path)?;
    if !value.is_object() {
        return Err(ConfigError::Invalid(format!(
            "{} layer must be an object",
            layer_label(source, path)
        )));
    }
    Ok(LoadedLayer {
        meta: ConfigLayer {
            source,
            path: path.to_path_buf(),
        },
        value,
    })
}

pub(super) fn layer_label(source: ConfigLayerSource, path: &Path) -> String {
    let name = match source {
        ConfigLayerSource::User => "user",
        ConfigLayerSource::Cwd => "cwd",
        ConfigLayerSource::Runtime => "runtime",
    };
    format!("{name}({})", path.display())
}

/// `~/.chatwidget/chatwidget.json5`, when a home directory is known.
pub(super) fn default_user_config_path() -> Option<PathBuf> {
    UserDirs::new().map(|dirs| {
        dirs.home_dir()
            .join(DEFAULT_CONFIG_DIR)
            .join(DEFAULT_CONFIG_FILE)
    })
}

/// Canonical form of the working directory; a missing directory is kept as given.
pub(super) fn resolve_cwd(cwd: &Path) -> Result<PathBuf, ConfigError> {
    match cwd.canonicalize() {
        Ok(path) => Ok(path),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(cwd.to_path_buf()),
        Err(source) => Err(ConfigError::Read {
            path: cwd.to_path_buf(),
            source,
        }),
    }
}

/// Identity of a layer file, so the same file is never merged twice.
pub(super) fn layer_identity(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}
