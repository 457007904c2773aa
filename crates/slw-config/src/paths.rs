use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};

/// XDG app name; config lives under `~/.config/slotwatch/` on Linux.
pub const APP_NAME: &str = "slotwatch";
pub const CONFIG_FILE_NAME: &str = "config.toml";

fn project_config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Canonical config file path, `None` when no home directory can be found.
pub fn default_config_path() -> Option<PathBuf> {
    project_config_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
}

/// An explicit `--config` override wins; otherwise the XDG default.
pub fn resolve_config_path(override_path: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = override_path {
        return Ok(path.to_path_buf());
    }
    default_config_path()
        .ok_or_else(|| anyhow!("Cannot determine a config directory (no home directory found)"))
}
