//! The `imgpipe config` command.

use clap::{Args, Subcommand};
use imgpipe_core::Config;

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective configuration as TOML
    Show,

    /// Print the config file location
    Path,

    /// Write a config file with the default settings
    Init {
        /// Replace an existing config file
        #[arg(long)]
        force: bool,
    },
}

/// Execute the config command against the already-loaded `config`.
pub async fn execute(args: ConfigArgs, config: &Config) -> anyhow::Result<()> {
    let path = Config::default_path();

    match args.command {
        ConfigCommand::Show => {
            println!("# {}", path.display());
            println!("{}", config.to_toml()?);
        }
        ConfigCommand::Path => {
            let note = if path.exists() { "" } else { " (not created yet)" };
            println!("{}{}", path.display(), note);
        }
        ConfigCommand::Init { force } => {
            Config::write_default(&path, force)?;
            tracing::info!("Wrote default config to {}", path.display());
            println!("Configuration initialized at: {}", path.display());
        }
    }

    Ok(())
}
