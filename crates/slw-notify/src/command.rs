//! Shell command notifications with template variable substitution.

use crate::Notifier;
use anyhow::{Result, bail};
use async_trait::async_trait;
use slw_core::types::CandidateDate;
use std::collections::HashMap;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Escape a string for safe shell usage by wrapping in single quotes.
///
/// Internal single quotes become '\'' (end quote, escaped quote, start quote).
fn shell_escape(s: &str) -> String {
    format!("'{}'", s.replace('\'', "'\\''"))
}

/// Substitute template variables in a command string using single-pass parsing.
///
/// Variables are written as `{key}` and replaced with shell-escaped values.
/// Unrecognized placeholders are left as-is. Substituted content is never
/// re-scanned, so a value containing `{key}` stays literal.
fn substitute_variables(template: &str, variables: &HashMap<String, String>) -> String {
    let mut result = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '{' {
            let mut key = String::new();
            let mut found_close = false;
            for inner_ch in chars.by_ref() {
                if inner_ch == '}' {
                    found_close = true;
                    break;
                }
                key.push(inner_ch);
            }
            if found_close {
                if let Some(value) = variables.get(&key) {
                    result.push_str(&shell_escape(value));
                } else {
                    // Unknown placeholder, keep as-is
                    result.push('{');
                    result.push_str(&key);
                    result.push('}');
                }
            } else {
                // Unclosed brace, keep as-is
                result.push('{');
                result.push_str(&key);
            }
        } else {
            result.push(ch);
        }
    }
    result
}

/// Runs a user-configured shell command for each notification.
///
/// The template may reference `{date}` and `{location}`; values are
/// shell-escaped before substitution, then the expanded command runs via
/// `sh -c` with suppressed output and a hard timeout.
pub struct CommandNotifier {
    template: String,
    timeout: Duration,
}

impl CommandNotifier {
    pub fn new(template: impl Into<String>, timeout: Duration) -> Self {
        Self { template: template.into(), timeout }
    }

    fn template_variables(slot: &CandidateDate) -> HashMap<String, String> {
        let mut variables = HashMap::new();
        variables.insert("date".to_string(), slot.date.to_string());
        variables.insert(
            "location".to_string(),
            slot.location.clone().unwrap_or_default(),
        );
        variables
    }
}

#[async_trait]
impl Notifier for CommandNotifier {
    fn name(&self) -> &'static str {
        "command"
    }

    async fn notify(&self, slot: &CandidateDate) -> Result<()> {
        let expanded = substitute_variables(&self.template, &Self::template_variables(slot));
        debug!(command = %expanded, "running notification command");

        // Suppress stdout/stderr to avoid polluting CLI output (e.g., --format json).
        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(&expanded)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        // Run the command in its own process group so a timeout takes down
        // the shell together with anything it spawned.
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = cmd.spawn()?;

        match tokio::time::timeout(self.timeout, child.wait()).await {
            Ok(status) => {
                let status = status?;
                if status.success() {
                    debug!("notification command completed");
                    Ok(())
                } else {
                    bail!(
                        "notification command exited with code {}",
                        status.code().unwrap_or(-1)
                    );
                }
            }
            Err(_) => {
                #[cfg(unix)]
                if let Some(id) = child.id() {
                    // SAFETY: kill() is async-signal-safe. Negative PID targets
                    // the entire process group created by process_group(0).
                    unsafe {
                        libc::kill(-(id as i32), libc::SIGKILL);
                    }
                }
                #[cfg(not(unix))]
                let _ = child.start_kill();
                let _ = child.wait().await; // Reap zombie
                bail!(
                    "notification command timed out after {}s",
                    self.timeout.as_secs()
                );
            }
        }
    }
}
