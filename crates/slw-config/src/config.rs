use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use slw_core::{AppError, DateWindow};

/// Current schema version for config.toml
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    #[serde(default)]
    pub target: TargetConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub poll: PollConfig,
    #[serde(default)]
    pub recovery: RecoveryConfig,
    #[serde(default)]
    pub commit: CommitConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
}

fn default_schema_version() -> u32 {
    CURRENT_SCHEMA_VERSION
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            target: TargetConfig::default(),
            session: SessionConfig::default(),
            poll: PollConfig::default(),
            recovery: RecoveryConfig::default(),
            commit: CommitConfig::default(),
            notify: NotifyConfig::default(),
        }
    }
}

/// The remote scheduling resource being watched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Root URL of the scheduling service, no trailing slash.
    #[serde(default)]
    pub base_url: String,
    /// Numeric schedule id. Discovered from the account page when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule_id: Option<String>,
    /// Appended to the schedule URL to form the availability feed URL.
    #[serde(default = "default_feed_suffix")]
    pub feed_suffix: String,
}

fn default_feed_suffix() -> String {
    "/appointment/days.json".to_string()
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            schedule_id: None,
            feed_suffix: default_feed_suffix(),
        }
    }
}

impl TargetConfig {
    /// Schedule URL for a resolved id: `{base_url}/schedule/{id}`.
    pub fn schedule_url(&self, schedule_id: &str) -> String {
        format!("{}/schedule/{}", self.base_url, schedule_id)
    }
}

/// Identity presented to the remote service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Cookies exported from a signed-in browser session.
    #[serde(default)]
    pub cookies: HashMap<String, String>,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Extra headers sent with every feed request.
    #[serde(default = "default_extra_headers")]
    pub extra_headers: HashMap<String, String>,
    /// Path probed by login to confirm the session is still accepted.
    #[serde(default = "default_account_path")]
    pub account_path: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (X11; Linux x86_64; rv:109.0) Gecko/20100101 Firefox/115.0".to_string()
}

fn default_extra_headers() -> HashMap<String, String> {
    let mut headers = HashMap::new();
    headers.insert("X-Requested-With".to_string(), "XMLHttpRequest".to_string());
    headers
}

fn default_account_path() -> String {
    "/account".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookies: HashMap::new(),
            user_agent: default_user_agent(),
            extra_headers: default_extra_headers(),
            account_path: default_account_path(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl SessionConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Acceptance window and per-session poll budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    /// Earliest acceptable appointment date (inclusive), `YYYY-MM-DD`.
    #[serde(default = "default_earliest")]
    pub earliest: NaiveDate,
    /// Latest acceptable appointment date (inclusive), `YYYY-MM-DD`.
    #[serde(default = "default_latest")]
    pub latest: NaiveDate,
    /// Fetch attempts allowed per session before the budget closes.
    #[serde(default = "default_poll_max_attempts")]
    pub max_attempts: u32,
    /// Wall-clock seconds allowed per session before the budget closes.
    #[serde(default = "default_poll_max_duration_secs")]
    pub max_duration_secs: u64,
    /// Pause between fetch attempts.
    #[serde(default = "default_poll_interval_secs")]
    pub interval_secs: u64,
}

fn default_earliest() -> NaiveDate {
    chrono::Utc::now().date_naive()
}

fn default_latest() -> NaiveDate {
    chrono::Utc::now().date_naive() + chrono::Duration::days(90)
}

fn default_poll_max_attempts() -> u32 {
    60
}

fn default_poll_max_duration_secs() -> u64 {
    1800
}

fn default_poll_interval_secs() -> u64 {
    30
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            earliest: default_earliest(),
            latest: default_latest(),
            max_attempts: default_poll_max_attempts(),
            max_duration_secs: default_poll_max_duration_secs(),
            interval_secs: default_poll_interval_secs(),
        }
    }
}

impl PollConfig {
    pub fn window(&self) -> DateWindow {
        DateWindow::new(self.earliest, self.latest)
    }

    pub fn max_duration(&self) -> Duration {
        Duration::from_secs(self.max_duration_secs)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// Session-level failure handling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryConfig {
    /// Login/navigation failures tolerated per session before replacing it.
    #[serde(default = "default_max_session_failures")]
    pub max_session_failures: u32,
    /// Pause before opening a replacement session.
    #[serde(default = "default_restart_delay_secs")]
    pub restart_delay_secs: u64,
    /// Pause between same-session login/navigation retries.
    #[serde(default = "default_step_retry_delay_secs")]
    pub step_retry_delay_secs: u64,
    /// Commit tries allowed per found slot.
    #[serde(default = "default_commit_attempts")]
    pub commit_attempts: u32,
    /// Pause between commit tries.
    #[serde(default = "default_commit_retry_delay_secs")]
    pub commit_retry_delay_secs: u64,
    /// Pause after a successful commit before the process exits.
    #[serde(default = "default_success_cooldown_secs")]
    pub success_cooldown_secs: u64,
}

fn default_max_session_failures() -> u32 {
    5
}

fn default_restart_delay_secs() -> u64 {
    120
}

fn default_step_retry_delay_secs() -> u64 {
    30
}

fn default_commit_attempts() -> u32 {
    3
}

fn default_commit_retry_delay_secs() -> u64 {
    5
}

fn default_success_cooldown_secs() -> u64 {
    600
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            max_session_failures: default_max_session_failures(),
            restart_delay_secs: default_restart_delay_secs(),
            step_retry_delay_secs: default_step_retry_delay_secs(),
            commit_attempts: default_commit_attempts(),
            commit_retry_delay_secs: default_commit_retry_delay_secs(),
            success_cooldown_secs: default_success_cooldown_secs(),
        }
    }
}

impl RecoveryConfig {
    pub fn restart_delay(&self) -> Duration {
        Duration::from_secs(self.restart_delay_secs)
    }

    pub fn step_retry_delay(&self) -> Duration {
        Duration::from_secs(self.step_retry_delay_secs)
    }

    pub fn commit_retry_delay(&self) -> Duration {
        Duration::from_secs(self.commit_retry_delay_secs)
    }

    pub fn success_cooldown(&self) -> Duration {
        Duration::from_secs(self.success_cooldown_secs)
    }
}

/// The action taken against a found slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitConfig {
    /// POST path appended to the schedule URL.
    #[serde(default = "default_commit_path")]
    pub path: String,
    /// Form fields posted on commit. Values may use `{date}` and `{location}`.
    #[serde(default = "default_commit_form")]
    pub form: HashMap<String, String>,
    /// Substring of the response body that confirms the commit took.
    #[serde(default = "default_success_marker")]
    pub success_marker: String,
    /// Log the would-be commit instead of posting it.
    #[serde(default)]
    pub dry_run: bool,
}

fn default_commit_path() -> String {
    "/appointment".to_string()
}

fn default_commit_form() -> HashMap<String, String> {
    let mut form = HashMap::new();
    form.insert("date".to_string(), "{date}".to_string());
    form
}

fn default_success_marker() -> String {
    "successfully".to_string()
}

impl Default for CommitConfig {
    fn default() -> Self {
        Self {
            path: default_commit_path(),
            form: default_commit_form(),
            success_marker: default_success_marker(),
            dry_run: false,
        }
    }
}

/// Fire-and-forget notification on detection or commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Shell command template. `{date}` and `{location}` are substituted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Seconds the command may run before being killed.
    #[serde(default = "default_command_timeout_secs")]
    pub command_timeout_secs: u64,
}

fn default_command_timeout_secs() -> u64 {
    10
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            command: None,
            command_timeout_secs: default_command_timeout_secs(),
        }
    }
}

impl NotifyConfig {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }
}

impl WatchConfig {
    /// Load config from an explicit path.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(AppError::ConfigNotFound(path.to_path_buf()).into());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        config.check_schema_version()?;
        Ok(config)
    }

    /// Check if the config schema version is compatible with the current binary.
    pub fn check_schema_version(&self) -> Result<()> {
        if self.schema_version > CURRENT_SCHEMA_VERSION {
            anyhow::bail!(
                "Config schema version {} is newer than this binary supports (v{})",
                self.schema_version,
                CURRENT_SCHEMA_VERSION
            );
        }
        Ok(())
    }

    /// Save config to the given path, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// Generate a commented starter config.
    pub fn starter_template() -> String {
        r#"# slotwatch configuration
# Location: ~/.config/slotwatch/config.toml
#
# Dates are strings in YYYY-MM-DD form. All *_secs values are whole seconds.

schema_version = 1

[target]
# Root URL of the scheduling service (no trailing slash).
base_url = "https://scheduler.example.com/en-ca"
# Numeric schedule id from the appointment URL. Leave unset to let slw
# discover it from the account page.
# schedule_id = "12345678"
# Appended to the schedule URL to form the availability feed URL. Include
# the facility id when the service keys its feed by facility:
# feed_suffix = "/appointment/days/94.json?appointments[expedite]=false"
feed_suffix = "/appointment/days.json"

[session]
# Path probed to confirm the exported session is still signed in.
account_path = "/account"
request_timeout_secs = 10

# Cookies exported from a signed-in browser session. Required.
[session.cookies]
# _session = "base64..."

# Sent with every feed request.
[session.extra_headers]
"X-Requested-With" = "XMLHttpRequest"

[poll]
# Inclusive acceptance window. A slot qualifies when its date falls inside.
earliest = "2026-01-01"
latest = "2026-03-31"
# Per-session budget: polling stops when either bound is hit.
max_attempts = 60
max_duration_secs = 1800
# Pause between fetch attempts.
interval_secs = 30

[recovery]
# Login/navigation failures tolerated per session before replacing it.
max_session_failures = 5
# Pause before opening a replacement session.
restart_delay_secs = 120
# Pause between same-session login/navigation retries.
step_retry_delay_secs = 30
# Commit tries per found slot, with a short pause between.
commit_attempts = 3
commit_retry_delay_secs = 5
# Pause after a successful commit before the process exits.
success_cooldown_secs = 600

[commit]
path = "/appointment"
success_marker = "successfully"
# Set true to log the would-be commit without posting it.
dry_run = false

# Form fields posted on commit. {date} and {location} are substituted.
[commit.form]
"date" = "{date}"

[notify]
# Optional shell command run when a slot is found.
# command = "notify-send 'Slot found' '{date}'"
command_timeout_secs = 10
"#
        .to_string()
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
