use anyhow::{Context, Result, bail};
use std::path::Path;

use crate::config::WatchConfig;

/// Write the commented starter config to `path`.
/// Refuses to overwrite an existing file.
pub fn write_starter_config(path: &Path) -> Result<()> {
    if path.exists() {
        bail!(
            "Config already exists at {}. Edit it directly, or delete it first to start over.",
            path.display()
        );
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
    }
    std::fs::write(path, WatchConfig::starter_template())
        .with_context(|| format!("Failed to write config: {}", path.display()))?;
    Ok(())
}
