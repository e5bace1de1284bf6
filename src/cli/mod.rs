//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for Almoner using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Almoner - Donation Reconciliation Pipeline
#[derive(Parser, Debug)]
#[command(name = "almoner")]
#[command(version, about, long_about = None)]
#[command(author = "Almoner Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "almoner.toml", env = "ALMONER_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "ALMONER_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract, match and reconcile donations from source documents
    Reconcile(commands::reconcile::ReconcileArgs),

    /// Match a single donor against the customer directory
    Match(commands::match_cmd::MatchArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}
