use anyhow::Result;
use clap::Parser;

mod cli;
mod config_cmds;
mod run_cmd;

use cli::{Cli, Commands, ConfigCommands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing (output to stderr, initialize only once)
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init()
        .ok();

    let cli = Cli::parse();
    let output_format = cli.format.clone();

    match cli.command {
        Commands::Watch { config } => {
            let exit_code = run_cmd::handle_watch(config, output_format).await?;
            std::process::exit(exit_code);
        }
        Commands::Reschedule { config, dry_run } => {
            let exit_code = run_cmd::handle_reschedule(config, dry_run, output_format).await?;
            std::process::exit(exit_code);
        }
        Commands::Init { config } => {
            config_cmds::handle_init(config)?;
        }
        Commands::Config { cmd } => match cmd {
            ConfigCommands::Show { config } => {
                config_cmds::handle_config_show(config, output_format)?;
            }
            ConfigCommands::Validate { config } => {
                config_cmds::handle_config_validate(config)?;
            }
        },
    }

    Ok(())
}
