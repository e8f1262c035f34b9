//! Loads tunables from the app's TOML override file.
//!
//! A missing file yields the built-in defaults; an unreadable file logs a
//! warning and yields the defaults, never blocking startup.

use std::fs;
use std::path::Path;
use terreno_core::config::Tunables;

/// Loads tunables from `path`, falling back to defaults.
pub fn load_tunables(path: &Path) -> Tunables {
    if !path.exists() {
        return Tunables::default();
    }

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            tracing::warn!(
                "[ConfigService] Could not read {:?}, using defaults: {}",
                path,
                err
            );
            return Tunables::default();
        }
    };

    match toml::from_str(&content) {
        Ok(tunables) => tunables,
        Err(err) => {
            tracing::warn!(
                "[ConfigService] Could not parse {:?}, using defaults: {}",
                path,
                err
            );
            Tunables::default()
        }
    }
}

/// Loads tunables from the default location (`~/.terreno/config.toml`).
pub fn load_default_tunables() -> Tunables {
    match crate::paths::default_config_path() {
        Ok(path) => load_tunables(&path),
        Err(err) => {
            tracing::warn!("[ConfigService] No config path, using defaults: {}", err);
            Tunables::default()
        }
    }
}
