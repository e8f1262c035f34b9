//! Default filesystem locations for app data.

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Returns the app data directory (`~/.terreno`), without creating it.
pub fn data_dir() -> Result<PathBuf> {
    let home_dir = dirs::home_dir().context("Failed to get home directory")?;
    Ok(home_dir.join(".terreno"))
}

/// Default path of the durable key-value store file.
pub fn default_store_path() -> Result<PathBuf> {
    Ok(data_dir()?.join("store.json"))
}

/// Default path of the tunables override file.
pub fn default_config_path() -> Result<PathBuf> {
    Ok(data_dir()?.join("config.toml"))
}
