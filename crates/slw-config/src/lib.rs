//! Watcher configuration loading and validation (config.toml).

pub mod config;
pub mod init;
pub mod paths;
pub mod validate;

pub use config::{
    CommitConfig, NotifyConfig, PollConfig, RecoveryConfig, SessionConfig, TargetConfig,
    WatchConfig,
};
pub use init::write_starter_config;
pub use paths::{default_config_path, resolve_config_path};
pub use validate::validate_config;
