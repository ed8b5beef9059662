//! Command-line interface for vbox-video.
//!
//! This module provides the CLI structure for the `vbox-video` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{ConfigCommand, FindCommand, InsertCommand};

use crate::config::{Config, ExistingReference};
use crate::insert::InsertOptions;
use crate::logging::Verbosity;

/// vbox-video - Link a video to VBOX telemetry
///
/// Finds the camera clip recorded alongside a VBOX log (a file named like
/// RACE0007.MP4 in the same directory) and embeds a reference to it in the
/// .vbo file so analysis tools can play it in sync with the data.
#[derive(Debug, Parser)]
#[command(name = "vbox-video")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Embed a video reference into a telemetry file
    Insert(InsertCommand),

    /// Show which video a telemetry file would be linked to
    Find(FindCommand),

    /// View or check configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.verbose)
    }
}

impl InsertCommand {
    /// Insert options: configuration values overridden by flags.
    #[must_use]
    pub fn options(&self, config: &Config) -> InsertOptions {
        let mut options = InsertOptions::from_config(config);
        options.video.clone_from(&self.video);
        if let Some(offset_sec) = self.offset_sec {
            options.offset_sec = offset_sec;
        }
        if self.overwrite {
            options.on_existing = ExistingReference::Overwrite;
        }
        options.output.clone_from(&self.output);
        options.dry_run = self.dry_run;
        options
    }
}
