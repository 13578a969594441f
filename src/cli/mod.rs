//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for incprev using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Incidence and prevalence analysis of longitudinal patient data
#[derive(Parser, Debug)]
#[command(name = "incprev")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true, env = "INCPREV_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Display the version number
    Version,

    /// Run the incidence and prevalence analysis
    Run(commands::run::RunArgs),
}
