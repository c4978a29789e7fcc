//! imgpipe CLI - load, resize, grayscale and save a batch of images.
//!
//! Images run either sequentially or through a staged pipeline where every
//! stage is its own worker.
//!
//! # Usage
//!
//! ```bash
//! # Prompt for the mode and process the default image set
//! imgpipe
//!
//! # Process a directory as a pipeline
//! imgpipe run ./images --mode parallel --output-dir ./images/output/
//!
//! # View configuration
//! imgpipe config show
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// imgpipe - Batch image processing, sequential or pipelined.
#[derive(Parser, Debug)]
#[command(name = "imgpipe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Process images through load, resize, grayscale and save
    Run(cli::run::RunArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so use eprintln for config warnings.
    let config = match imgpipe_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `imgpipe config path`."
            );
            imgpipe_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("imgpipe v{}", imgpipe_core::VERSION);

    // Bare `imgpipe` behaves like `imgpipe run` with every default
    match cli.command {
        Some(Commands::Run(args)) => cli::run::execute(args, config).await,
        Some(Commands::Config(args)) => cli::config::execute(args, &config).await,
        None => cli::run::execute(cli::run::RunArgs::default(), config).await,
    }
}
