//! Netarch CLI
//!
//! Shape inference, validation and training submission for CNN architectures.

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::debug;

use netarch::cli::{commands, Cli, Commands};
use netarch::config::EngineConfig;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    let config = EngineConfig::resolve(cli.config.as_deref()).context("loading configuration")?;
    debug!("Configuration: {:?}", config);

    match cli.command {
        Some(cmd) => handle_command(&config, cmd),
        None => {
            println!("Netarch v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    }
}

fn handle_command(config: &EngineConfig, cmd: Commands) -> anyhow::Result<()> {
    match cmd {
        Commands::Catalog => commands::catalog()?,
        Commands::Summary { file } => commands::summary(config, &file)?,
        Commands::Validate { file } => commands::validate(config, &file)?,
        Commands::SetDefault {
            file,
            hyperparameters,
        } => commands::set_default(config, &file, &hyperparameters.to_hyperparameters())?,
        Commands::ShowDefault => commands::show_default(config)?,
        Commands::Train {
            file,
            hyperparameters,
            dry_run,
        } => commands::train(
            config,
            file.as_deref(),
            &hyperparameters.to_hyperparameters(),
            dry_run,
        )?,
        Commands::History => commands::history(config)?,
    }
    Ok(())
}
