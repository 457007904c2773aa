use clap::{Parser, Subcommand};
use slw_core::OutputFormat;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "slw")]
#[command(about = "Watch a scheduling service for an appointment slot in your date window")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (text or json)
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Poll until an acceptable slot appears, then notify (no booking)
    Watch {
        /// Config file (defaults to the per-user config directory)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Poll until an acceptable slot appears, then book it
    Reschedule {
        /// Config file (defaults to the per-user config directory)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Go through the whole flow without submitting the booking
        #[arg(long)]
        dry_run: bool,
    },

    /// Write a starter config.toml
    Init {
        /// Write here instead of the per-user config directory
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Show/validate configuration
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the parsed configuration
    Show {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Validate the configuration file
    Validate {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}
