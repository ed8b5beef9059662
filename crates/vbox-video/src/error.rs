//! Error types for vbox-video.
//!
//! Every failure is fatal to the single insert operation. Each variant names
//! the file or directory involved so the CLI can report it without extra
//! context, and maps to a distinct process exit code.

use std::path::PathBuf;
use thiserror::Error;

use crate::vbo::FormatError;

/// The main error type for vbox-video operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Video Discovery Errors ===
    /// No file in the directory matches the video naming convention.
    #[error("no video found in {}", dir.display())]
    NoVideoFound {
        /// Directory that was scanned.
        dir: PathBuf,
    },

    /// More than one file in the directory matches the naming convention.
    #[error("ambiguous video match in {}: {}", dir.display(), candidates.join(", "))]
    AmbiguousVideoMatch {
        /// Directory that was scanned.
        dir: PathBuf,
        /// Matching file names, sorted.
        candidates: Vec<String>,
    },

    /// An explicitly named video does not follow the naming convention.
    #[error("'{name}' is not a video name of the form <letters><digits>.{extension}")]
    InvalidVideoName {
        /// The rejected name.
        name: String,
        /// Extension the convention requires.
        extension: String,
    },

    /// The telemetry file's directory could not be listed.
    #[error("failed to scan directory {}: {source}", path.display())]
    DirectoryScan {
        /// Directory that could not be read.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Telemetry File Errors ===
    /// The telemetry file could not be read.
    #[error("failed to read telemetry file {}: {source}", path.display())]
    TelemetryFileUnreadable {
        /// Path to the telemetry file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The telemetry file could not be written.
    #[error("failed to write telemetry file {}: {source}", path.display())]
    TelemetryFileUnwritable {
        /// Path that was being written.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The telemetry file already carries a video reference.
    #[error("telemetry file {} already has a video reference (use --overwrite to replace it)", path.display())]
    AlreadyReferenced {
        /// Path to the telemetry file.
        path: PathBuf,
    },

    /// The telemetry file is not a usable VBO document.
    #[error("malformed telemetry file {}: {source}", path.display())]
    MalformedTelemetry {
        /// Path to the telemetry file.
        path: PathBuf,
        /// What is wrong with it.
        #[source]
        source: FormatError,
    },

    /// The video offset is not a finite number of seconds.
    #[error("invalid video offset {offset_sec}: must be a finite number of seconds")]
    InvalidOffset {
        /// The rejected offset.
        offset_sec: f64,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Serialization Errors ===
    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for vbox-video operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a configuration validation error.
    #[must_use]
    pub fn config_validation(message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            message: message.into(),
        }
    }

    /// Process exit code for this error.
    ///
    /// Code 2 is left to clap for usage errors.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::NoVideoFound { .. } => 3,
            Self::AmbiguousVideoMatch { .. } => 4,
            Self::AlreadyReferenced { .. } => 5,
            Self::TelemetryFileUnreadable { .. } => 6,
            Self::TelemetryFileUnwritable { .. } => 7,
            Self::MalformedTelemetry { .. } => 8,
            Self::InvalidVideoName { .. } => 9,
            Self::ConfigLoad(_) | Self::ConfigValidation { .. } => 10,
            Self::DirectoryScan { .. } | Self::InvalidOffset { .. } | Self::Json(_) => 1,
        }
    }

    /// Check if this error means no video could be located.
    #[must_use]
    pub fn is_no_video_found(&self) -> bool {
        matches!(self, Self::NoVideoFound { .. })
    }

    /// Check if this error means several videos matched.
    #[must_use]
    pub fn is_ambiguous_match(&self) -> bool {
        matches!(self, Self::AmbiguousVideoMatch { .. })
    }

    /// Check if this error means the file was already referenced.
    #[must_use]
    pub fn is_already_referenced(&self) -> bool {
        matches!(self, Self::AlreadyReferenced { .. })
    }
}
