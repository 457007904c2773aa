use anyhow::{Result, bail};

use slw_core::AppError;

use crate::config::WatchConfig;

/// Validate a loaded configuration before any network work starts.
/// Returns Ok(()) if valid, or Err with descriptive messages.
pub fn validate_config(config: &WatchConfig) -> Result<()> {
    validate_target(config)?;
    validate_session(config)?;
    validate_poll(config)?;
    validate_recovery(config)?;
    validate_commit(config)?;
    validate_notify(config)?;
    Ok(())
}

fn validate_target(config: &WatchConfig) -> Result<()> {
    if config.target.base_url.is_empty() {
        bail!("target.base_url cannot be empty");
    }
    if config.target.base_url.ends_with('/') {
        bail!(
            "target.base_url must not end with '/' (got '{}')",
            config.target.base_url
        );
    }
    if let Some(id) = &config.target.schedule_id {
        if !id.chars().all(|c| c.is_ascii_digit()) || id.is_empty() {
            bail!("target.schedule_id must be numeric (got '{}')", id);
        }
    }
    Ok(())
}

fn validate_session(config: &WatchConfig) -> Result<()> {
    if config.session.cookies.is_empty() {
        bail!(
            "[session.cookies] is empty. Export the cookies from a signed-in \
             browser session and add them to the config."
        );
    }
    require_positive(
        "session.request_timeout_secs",
        config.session.request_timeout_secs,
    )?;
    Ok(())
}

fn validate_poll(config: &WatchConfig) -> Result<()> {
    let poll = &config.poll;
    if poll.earliest > poll.latest {
        return Err(AppError::WindowInverted {
            earliest: poll.earliest,
            latest: poll.latest,
        }
        .into());
    }
    require_positive("poll.max_attempts", u64::from(poll.max_attempts))?;
    require_positive("poll.max_duration_secs", poll.max_duration_secs)?;
    require_positive("poll.interval_secs", poll.interval_secs)?;
    Ok(())
}

fn validate_recovery(config: &WatchConfig) -> Result<()> {
    let recovery = &config.recovery;
    require_positive(
        "recovery.max_session_failures",
        u64::from(recovery.max_session_failures),
    )?;
    require_positive("recovery.restart_delay_secs", recovery.restart_delay_secs)?;
    require_positive(
        "recovery.step_retry_delay_secs",
        recovery.step_retry_delay_secs,
    )?;
    require_positive(
        "recovery.commit_attempts",
        u64::from(recovery.commit_attempts),
    )?;
    Ok(())
}

fn validate_commit(config: &WatchConfig) -> Result<()> {
    if config.commit.path.is_empty() {
        bail!("commit.path cannot be empty");
    }
    if config.commit.success_marker.is_empty() {
        bail!("commit.success_marker cannot be empty");
    }
    if config.commit.form.is_empty() {
        bail!("[commit.form] must have at least one field");
    }
    Ok(())
}

fn validate_notify(config: &WatchConfig) -> Result<()> {
    if let Some(command) = &config.notify.command {
        if command.trim().is_empty() {
            bail!("notify.command is set but empty; remove it or fill it in");
        }
    }
    Ok(())
}

fn require_positive(name: &'static str, value: u64) -> Result<()> {
    if value == 0 {
        return Err(AppError::NonPositiveBound { name, value }.into());
    }
    Ok(())
}

#[cfg(test)]
#[path = "validate_tests.rs"]
mod tests;
