use anyhow::Result;
use std::path::PathBuf;

use slw_config::{WatchConfig, resolve_config_path, validate_config, write_starter_config};
use slw_core::OutputFormat;

pub(crate) fn handle_init(config: Option<PathBuf>) -> Result<()> {
    let path = resolve_config_path(config.as_deref())?;
    write_starter_config(&path)?;
    eprintln!("Wrote starter config to: {}", path.display());
    eprintln!("Fill in [target] and [session.cookies], then run 'slw config validate'.");
    Ok(())
}

pub(crate) fn handle_config_show(config: Option<PathBuf>, format: OutputFormat) -> Result<()> {
    let path = resolve_config_path(config.as_deref())?;
    let config = WatchConfig::load(&path)?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&config)?),
        OutputFormat::Text => print!("{}", toml::to_string_pretty(&config)?),
    }
    Ok(())
}

pub(crate) fn handle_config_validate(config: Option<PathBuf>) -> Result<()> {
    let path = resolve_config_path(config.as_deref())?;
    let config = WatchConfig::load(&path)?;
    validate_config(&config)?;
    eprintln!("Configuration is valid (schema v{})", config.schema_version);
    Ok(())
}
