//! CLI command definitions.

use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Insert command arguments.
#[derive(Debug, Args)]
pub struct InsertCommand {
    /// Telemetry (.vbo) file to edit; its directory is searched for the video
    pub telemetry: PathBuf,

    /// Video file name to reference instead of discovering it
    #[arg(long, value_name = "NAME")]
    pub video: Option<String>,

    /// Position in the video, in seconds, where the telemetry log starts
    #[arg(
        long,
        value_name = "SECONDS",
        allow_negative_numbers = true,
        value_parser = parse_offset
    )]
    pub offset_sec: Option<f64>,

    /// Replace an existing video reference instead of failing
    #[arg(long)]
    pub overwrite: bool,

    /// Write to this file instead of editing the telemetry file in place
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Show what would be done without writing anything
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Print the result as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Parse a video offset, accepting only finite numbers of seconds.
///
/// # Errors
///
/// Returns a message for clap when the value is not a number or not finite.
pub fn parse_offset(value: &str) -> Result<f64, String> {
    let offset: f64 = value.trim().parse::<f64>().map_err(|err| err.to_string())?;
    if offset.is_finite() {
        Ok(offset)
    } else {
        Err(format!("'{value}' is not a finite number of seconds"))
    }
}

/// Find command arguments.
#[derive(Debug, Args)]
pub struct FindCommand {
    /// Telemetry (.vbo) file whose directory is searched
    pub telemetry: PathBuf,

    /// Print the result as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}
