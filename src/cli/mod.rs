//! CLI Module
//!
//! Command-line front end over the architecture engine.

pub mod commands;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::training::{AugmentationConfig, Hyperparameters, Optimizer};

/// Netarch - CNN architecture shape inference and validation
#[derive(Parser, Debug)]
#[command(name = "netarch")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Engine configuration file (JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the available layer templates
    #[command(name = "catalog")]
    Catalog,

    /// Print per-layer shapes and parameter counts
    #[command(name = "summary")]
    Summary {
        /// Architecture file
        file: PathBuf,
    },

    /// Check an architecture against the training rules
    #[command(name = "validate")]
    Validate {
        /// Architecture file
        file: PathBuf,
    },

    /// Store an architecture as the default
    #[command(name = "set-default")]
    SetDefault {
        /// Architecture file
        file: PathBuf,

        #[command(flatten)]
        hyperparameters: HyperparameterArgs,
    },

    /// Show the stored default architecture
    #[command(name = "show-default")]
    ShowDefault,

    /// Submit an architecture to the training service
    #[command(name = "train")]
    Train {
        /// Architecture file; the stored default when omitted
        file: Option<PathBuf>,

        #[command(flatten)]
        hyperparameters: HyperparameterArgs,

        /// Print the request instead of sending it
        #[arg(long)]
        dry_run: bool,
    },

    /// Show past training runs
    #[command(name = "history")]
    History,
}

/// Hyperparameter flags shared by `train` and `set-default`
#[derive(Args, Debug, Clone)]
pub struct HyperparameterArgs {
    /// adam or sgd
    #[arg(long, default_value = "adam")]
    pub optimizer: Optimizer,

    #[arg(long, default_value_t = 0.001)]
    pub learning_rate: f64,

    #[arg(long, default_value_t = 5)]
    pub epochs: u32,

    #[arg(long, default_value_t = 64)]
    pub batch_size: u32,

    /// Enable data augmentation with the service's default ranges
    #[arg(long)]
    pub augment: bool,
}

impl HyperparameterArgs {
    pub fn to_hyperparameters(&self) -> Hyperparameters {
        Hyperparameters {
            optimizer: self.optimizer,
            learning_rate: self.learning_rate,
            epochs: self.epochs,
            batch_size: self.batch_size,
            augmentation: if self.augment {
                AugmentationConfig::standard()
            } else {
                AugmentationConfig::default()
            },
        }
    }
}
