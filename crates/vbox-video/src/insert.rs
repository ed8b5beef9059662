//! Video reference insertion.
//!
//! [`insert_video_reference`] runs the whole operation on one telemetry file:
//! read it, locate its video, check for an existing reference, apply the new
//! one, and write the result in a single atomic replace. Any failure leaves
//! the telemetry file exactly as it was.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{Config, ExistingReference};
use crate::error::{Error, Result};
use crate::fsio;
use crate::reference::VideoReference;
use crate::vbo::VboDocument;
use crate::video::{self, VideoFile, VideoPattern};

/// Options for one insert run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InsertOptions {
    /// Use this video instead of discovering one.
    pub video: Option<String>,
    /// Position in the video, in seconds, where the log starts.
    pub offset_sec: f64,
    /// Policy when the file already references a video.
    pub on_existing: ExistingReference,
    /// Write the result here instead of replacing the telemetry file.
    pub output: Option<PathBuf>,
    /// Stop before writing anything.
    pub dry_run: bool,
}

impl InsertOptions {
    /// Options seeded from configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            offset_sec: config.insert.offset_sec,
            on_existing: config.insert.on_existing,
            ..Self::default()
        }
    }
}

/// Outcome of a successful insert run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsertReport {
    /// The telemetry file that was read.
    pub telemetry: PathBuf,
    /// Where the result was (or would be) written.
    pub output: PathBuf,
    /// The referenced video.
    pub video: VideoFile,
    /// Offset applied, in seconds.
    pub offset_sec: f64,
    /// Number of data rows that received reference values.
    pub data_rows: usize,
    /// Whether an existing reference was replaced.
    pub replaced_existing: bool,
    /// Whether anything was written.
    pub written: bool,
}

/// Find the video that belongs to a telemetry file.
///
/// # Errors
///
/// Returns the discovery errors of [`video::discover`] or, for an explicit
/// name, [`video::resolve`].
pub fn locate_video(
    telemetry: &Path,
    explicit: Option<&str>,
    pattern: &VideoPattern,
) -> Result<VideoFile> {
    let dir = video::search_dir(telemetry);
    match explicit {
        Some(name) => video::resolve(&dir, name, pattern),
        None => video::discover(&dir, pattern),
    }
}

/// Embed a reference to the telemetry file's video.
///
/// # Errors
///
/// - [`Error::InvalidOffset`] if the offset is not finite
/// - [`Error::TelemetryFileUnreadable`] if the file cannot be read
/// - [`Error::NoVideoFound`], [`Error::AmbiguousVideoMatch`],
///   [`Error::InvalidVideoName`] or [`Error::DirectoryScan`] from discovery
/// - [`Error::AlreadyReferenced`] when a reference exists and the policy is
///   [`ExistingReference::Reject`]
/// - [`Error::MalformedTelemetry`] if the file is not a usable VBO document
/// - [`Error::TelemetryFileUnwritable`] if the result cannot be written
pub fn insert_video_reference(
    telemetry: &Path,
    pattern: &VideoPattern,
    options: &InsertOptions,
) -> Result<InsertReport> {
    info!(telemetry = %telemetry.display(), "Inserting video reference");

    if !options.offset_sec.is_finite() {
        return Err(Error::InvalidOffset {
            offset_sec: options.offset_sec,
        });
    }

    let bytes = fs::read(telemetry).map_err(|source| Error::TelemetryFileUnreadable {
        path: telemetry.to_path_buf(),
        source,
    })?;
    let document = VboDocument::from_bytes(&bytes);
    debug!(
        lines = document.lines().len(),
        encoding = ?document.encoding(),
        "Read telemetry file"
    );

    let video = locate_video(telemetry, options.video.as_deref(), pattern)?;
    info!(video = %video.name, "Located video");

    if document.has_video_reference() {
        match options.on_existing {
            ExistingReference::Reject => {
                return Err(Error::AlreadyReferenced {
                    path: telemetry.to_path_buf(),
                });
            }
            ExistingReference::Overwrite => {
                warn!(telemetry = %telemetry.display(), "Replacing existing video reference");
            }
        }
    }

    let reference = VideoReference::new(video, options.offset_sec);
    let patched = reference
        .apply(&document)
        .map_err(|source| Error::MalformedTelemetry {
            path: telemetry.to_path_buf(),
            source,
        })?;
    info!(
        file = %reference.file_name(),
        offset_sec = options.offset_sec,
        data_rows = patched.data_rows,
        "Applied video reference"
    );

    let contents = patched
        .document
        .to_bytes()
        .map_err(|source| Error::MalformedTelemetry {
            path: telemetry.to_path_buf(),
            source,
        })?;
    let output = options
        .output
        .clone()
        .unwrap_or_else(|| telemetry.to_path_buf());

    if options.dry_run {
        info!("Dry run, nothing written");
    } else {
        fsio::write_atomic(&output, &contents).map_err(|source| {
            Error::TelemetryFileUnwritable {
                path: output.clone(),
                source,
            }
        })?;
        info!(output = %output.display(), "Wrote telemetry file");
    }

    Ok(InsertReport {
        telemetry: telemetry.to_path_buf(),
        output,
        video: reference.video,
        offset_sec: options.offset_sec,
        data_rows: patched.data_rows,
        replaced_existing: patched.replaced_existing,
        written: !options.dry_run,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::init_test_logging;
    use tempfile::TempDir;

    const TELEMETRY: &str = "File created on 01/06/2024\n\n[header]\ntime\n\n\
[column names]\nsats time\n\n[data]\n008 101500.00\n008 101500.50\n";

    fn setup(videos: &[&str]) -> (TempDir, PathBuf) {
        init_test_logging();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("telemetry.vbo");
        fs::write(&path, TELEMETRY).unwrap();
        for name in videos {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        (dir, path)
    }

    #[test]
    fn test_insert_in_place() {
        let (_dir, path) = setup(&["RACE0007.MP4"]);
        let options = InsertOptions {
            offset_sec: 4.0,
            ..InsertOptions::default()
        };

        let report = insert_video_reference(&path, &VideoPattern::default(), &options).unwrap();
        assert_eq!(report.video.name, "RACE0007.MP4");
        assert_eq!(report.output, path);
        assert_eq!(report.data_rows, 2);
        assert!(report.written);
        assert!(!report.replaced_existing);

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("[avi]\nRACE\nMP4\n"));
        assert!(text.contains("008 101500.50 0007 4500\n"));
    }

    #[test]
    fn test_insert_dry_run_writes_nothing() {
        let (_dir, path) = setup(&["RACE0007.MP4"]);
        let options = InsertOptions {
            dry_run: true,
            ..InsertOptions::default()
        };

        let report = insert_video_reference(&path, &VideoPattern::default(), &options).unwrap();
        assert!(!report.written);
        assert_eq!(fs::read_to_string(&path).unwrap(), TELEMETRY);
    }

    #[test]
    fn test_insert_to_output_keeps_input() {
        let (dir, path) = setup(&["RACE0007.MP4"]);
        let output = dir.path().join("telemetry_video.vbo");
        let options = InsertOptions {
            output: Some(output.clone()),
            ..InsertOptions::default()
        };

        insert_video_reference(&path, &VideoPattern::default(), &options).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), TELEMETRY);
        assert!(fs::read_to_string(&output).unwrap().contains("[avi]"));
    }

    #[test]
    fn test_insert_explicit_video_among_many() {
        let (_dir, path) = setup(&["RACE0007.MP4", "RACE0008.MP4"]);
        let options = InsertOptions {
            video: Some("RACE0008.MP4".to_string()),
            ..InsertOptions::default()
        };

        let report = insert_video_reference(&path, &VideoPattern::default(), &options).unwrap();
        assert_eq!(report.video.number, "0008");
    }

    #[test]
    fn test_insert_unreadable_file() {
        init_test_logging();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.vbo");

        let err = insert_video_reference(&path, &VideoPattern::default(), &InsertOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::TelemetryFileUnreadable { .. }));
    }

    #[test]
    fn test_insert_malformed_file_unchanged() {
        init_test_logging();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("telemetry.vbo");
        fs::write(&path, "[header]\ntime\n").unwrap();
        fs::write(dir.path().join("RACE0007.MP4"), b"").unwrap();

        let err = insert_video_reference(&path, &VideoPattern::default(), &InsertOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::MalformedTelemetry { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), "[header]\ntime\n");
    }

    #[test]
    fn test_insert_unwritable_output() {
        let (_dir, path) = setup(&["RACE0007.MP4"]);
        let options = InsertOptions {
            output: Some(PathBuf::from("/nonexistent/dir/out.vbo")),
            ..InsertOptions::default()
        };

        let err = insert_video_reference(&path, &VideoPattern::default(), &options).unwrap_err();
        assert!(matches!(err, Error::TelemetryFileUnwritable { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), TELEMETRY);
    }

    #[test]
    fn test_insert_single_byte_file() {
        let (_dir, path) = setup(&["RACE0007.MP4"]);
        let original = b"[header]\r\ntime\r\n\r\n[laptiming]\r\n\
Start   -00032.12345 +03116.54321 \xAC Start / Finish\r\n\r\n\
[column names]\r\ntime\r\n\r\n[data]\r\n101500.00\r\n";
        fs::write(&path, original).unwrap();

        let report =
            insert_video_reference(&path, &VideoPattern::default(), &InsertOptions::default())
                .unwrap();
        assert_eq!(report.data_rows, 1);

        let written = fs::read(&path).unwrap();
        let lap = b"\r\nStart   -00032.12345 +03116.54321 \xAC Start / Finish\r\n";
        assert!(written.windows(lap.len()).any(|w| w == lap));
        assert!(written.ends_with(b"101500.00 0007 0\r\n"));
    }

    #[test]
    fn test_insert_rejects_non_finite_offset() {
        let (_dir, path) = setup(&["RACE0007.MP4"]);

        for offset_sec in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let options = InsertOptions {
                offset_sec,
                ..InsertOptions::default()
            };
            let err =
                insert_video_reference(&path, &VideoPattern::default(), &options).unwrap_err();
            assert!(matches!(err, Error::InvalidOffset { .. }), "{err}");
        }
        assert_eq!(fs::read_to_string(&path).unwrap(), TELEMETRY);
    }

    #[test]
    fn test_options_from_config() {
        let mut config = Config::default();
        config.insert.offset_sec = 12.5;
        config.insert.on_existing = ExistingReference::Overwrite;

        let options = InsertOptions::from_config(&config);
        assert!((options.offset_sec - 12.5).abs() < f64::EPSILON);
        assert_eq!(options.on_existing, ExistingReference::Overwrite);
        assert!(options.video.is_none());
        assert!(!options.dry_run);
    }

    #[test]
    fn test_locate_video_rejects_bad_explicit_name() {
        let err = locate_video(
            Path::new("telemetry.vbo"),
            Some("bad name.MP4"),
            &VideoPattern::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidVideoName { .. }));
    }

    #[test]
    fn test_report_serializes() {
        let (_dir, path) = setup(&["RACE0007.MP4"]);
        let report =
            insert_video_reference(&path, &VideoPattern::default(), &InsertOptions::default())
                .unwrap();
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"name\":\"RACE0007.MP4\""));
        assert!(json.contains("\"data_rows\":2"));
    }
}
