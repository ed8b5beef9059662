//! `vbox-video` - CLI for linking camera clips to VBOX telemetry
//!
//! This binary provides the command-line interface for discovering the video
//! that belongs to a `.vbo` file and embedding a reference to it.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tracing::debug;

use vbox_video::cli::{Cli, Command, ConfigCommand, FindCommand, InsertCommand};
use vbox_video::insert::locate_video;
use vbox_video::reference::read_avi;
use vbox_video::{init_logging, insert_video_reference, Config, Error, Result, VboDocument};

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            debug!(error = ?err, "Command failed");
            eprintln!("error: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    // Validation loads only the file it was asked about.
    if let Command::Config(ConfigCommand::Validate { file }) = cli.command {
        return validate_config(file.or(cli.config));
    }

    let config = Config::load_from(cli.config.clone())?;

    match cli.command {
        Command::Insert(cmd) => handle_insert(&config, &cmd),
        Command::Find(cmd) => handle_find(&config, &cmd),
        Command::Config(cmd) => handle_config(&config, cli.config.as_deref(), cmd),
    }
}

fn handle_insert(config: &Config, cmd: &InsertCommand) -> Result<()> {
    let options = cmd.options(config);
    let report = insert_video_reference(&cmd.telemetry, &config.video_pattern(), &options)?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let verb = if report.written { "Linked" } else { "Would link" };
    println!(
        "{verb} {} to {}",
        report.video.name,
        report.output.display()
    );
    println!("  Data rows:     {}", report.data_rows);
    println!("  Offset:        {:.3} s", report.offset_sec);
    if report.replaced_existing {
        println!("  Replaced an existing video reference");
    }
    Ok(())
}

fn handle_find(config: &Config, cmd: &FindCommand) -> Result<()> {
    let bytes = fs::read(&cmd.telemetry).map_err(|source| Error::TelemetryFileUnreadable {
        path: cmd.telemetry.clone(),
        source,
    })?;
    let existing = read_avi(&VboDocument::from_bytes(&bytes))
        .map(|(prefix, extension)| format!("{prefix}*.{extension}"));
    let video = locate_video(&cmd.telemetry, None, &config.video_pattern())?;

    if cmd.json {
        let found = serde_json::json!({
            "telemetry": cmd.telemetry,
            "video": video,
            "existing_reference": existing,
        });
        println!("{}", serde_json::to_string_pretty(&found)?);
    } else {
        println!("Telemetry:     {}", cmd.telemetry.display());
        println!("Video:         {}", video.name);
        println!(
            "Existing:      {}",
            existing.as_deref().unwrap_or("none")
        );
    }
    Ok(())
}

fn handle_config(config: &Config, custom_path: Option<&Path>, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[video]");
                println!("  Extension:          {}", config.video.extension);
                println!();
                println!("[insert]");
                println!("  Offset (s):         {}", config.insert.offset_sec);
                println!("  On existing:        {}", config.insert.on_existing);
            }
        }
        ConfigCommand::Path => {
            let path = custom_path.map_or_else(Config::default_config_path, Path::to_path_buf);
            println!("{}", path.display());
        }
        ConfigCommand::Validate { file } => {
            return validate_config(file.or_else(|| custom_path.map(Path::to_path_buf)));
        }
    }
    Ok(())
}

fn validate_config(file: Option<PathBuf>) -> Result<()> {
    let path = file.unwrap_or_else(Config::default_config_path);
    println!("Validating configuration: {}", path.display());
    Config::load_from(Some(path))?;
    println!("Configuration is valid.");
    Ok(())
}
