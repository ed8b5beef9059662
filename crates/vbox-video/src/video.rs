//! Video file naming convention and discovery.
//!
//! Action cameras used alongside VBOX loggers name their clips with an
//! alphabetic prefix, a clip number and an upper-case extension, e.g.
//! `RACE0007.MP4`. The video belonging to a telemetry file is the one clip in
//! the same directory that follows this convention.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::{debug, trace};

use crate::error::{Error, Result};

/// Extension used when none is configured.
pub const DEFAULT_EXTENSION: &str = "MP4";

static DEFAULT_PATTERN: LazyLock<VideoPattern> =
    LazyLock::new(|| VideoPattern::new(DEFAULT_EXTENSION));

/// Check whether `name` follows the default `<letters><digits>.MP4` convention.
#[must_use]
pub fn is_candidate_video(name: &str) -> bool {
    DEFAULT_PATTERN.matches(name)
}

/// A video file name split into its parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoFile {
    /// Full file name, e.g. `RACE0007.MP4`.
    pub name: String,
    /// Alphabetic prefix, e.g. `RACE`.
    pub prefix: String,
    /// Clip number exactly as written, e.g. `0007`.
    pub number: String,
    /// Extension without the dot, e.g. `MP4`.
    pub extension: String,
}

/// Compiled naming convention for a given extension.
#[derive(Debug, Clone)]
pub struct VideoPattern {
    extension: String,
    regex: Regex,
}

impl VideoPattern {
    /// Build the convention for `extension` (matched case-sensitively).
    ///
    /// # Panics
    ///
    /// Panics if the pattern fails to compile, which the escaped extension
    /// rules out.
    #[must_use]
    pub fn new(extension: &str) -> Self {
        let pattern = format!(
            r"^(?P<prefix>[A-Za-z]+)(?P<number>[0-9]+)\.(?P<extension>{})$",
            regex::escape(extension)
        );
        Self {
            extension: extension.to_string(),
            regex: Regex::new(&pattern).expect("Invalid video name pattern"),
        }
    }

    /// Extension this pattern requires.
    #[must_use]
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Check if a file name follows the convention.
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }

    /// Split a conforming file name into its parts.
    #[must_use]
    pub fn parse(&self, name: &str) -> Option<VideoFile> {
        let caps = self.regex.captures(name)?;
        Some(VideoFile {
            name: name.to_string(),
            prefix: caps["prefix"].to_string(),
            number: caps["number"].to_string(),
            extension: caps["extension"].to_string(),
        })
    }
}

impl Default for VideoPattern {
    fn default() -> Self {
        DEFAULT_PATTERN.clone()
    }
}

/// Directory searched for the video of a telemetry file.
#[must_use]
pub fn search_dir(telemetry: &Path) -> PathBuf {
    match telemetry.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// List the names of all conforming files in `dir`, sorted.
///
/// Only regular files are considered (symlinks are followed). Names that are
/// not valid UTF-8 cannot match and are skipped.
///
/// # Errors
///
/// Returns an error if the directory cannot be read.
pub fn candidates(dir: &Path, pattern: &VideoPattern) -> Result<Vec<String>> {
    let scan_err = |source| Error::DirectoryScan {
        path: dir.to_path_buf(),
        source,
    };

    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(scan_err)? {
        let entry = entry.map_err(scan_err)?;
        let Some(name) = entry.file_name().to_str().map(String::from) else {
            continue;
        };
        if !pattern.matches(&name) {
            trace!(name = %name, "Skipping non-matching entry");
            continue;
        }
        if !entry.path().is_file() {
            debug!(name = %name, "Skipping matching name that is not a file");
            continue;
        }
        names.push(name);
    }
    names.sort();
    Ok(names)
}

/// Find the single video in `dir`.
///
/// # Errors
///
/// Returns [`Error::NoVideoFound`] when nothing matches and
/// [`Error::AmbiguousVideoMatch`] when more than one file does.
pub fn discover(dir: &Path, pattern: &VideoPattern) -> Result<VideoFile> {
    let mut names = candidates(dir, pattern)?;
    debug!(dir = %dir.display(), count = names.len(), "Scanned for videos");

    match names.len() {
        0 => Err(Error::NoVideoFound {
            dir: dir.to_path_buf(),
        }),
        1 => {
            let name = names.remove(0);
            pattern.parse(&name).ok_or(Error::InvalidVideoName {
                name,
                extension: pattern.extension().to_string(),
            })
        }
        _ => Err(Error::AmbiguousVideoMatch {
            dir: dir.to_path_buf(),
            candidates: names,
        }),
    }
}

/// Use an explicitly named video, checking it against the convention.
///
/// # Errors
///
/// Returns [`Error::InvalidVideoName`] if the name does not conform and
/// [`Error::NoVideoFound`] if no such file exists in `dir`.
pub fn resolve(dir: &Path, name: &str, pattern: &VideoPattern) -> Result<VideoFile> {
    let video = pattern.parse(name).ok_or_else(|| Error::InvalidVideoName {
        name: name.to_string(),
        extension: pattern.extension().to_string(),
    })?;
    if !dir.join(name).is_file() {
        return Err(Error::NoVideoFound {
            dir: dir.to_path_buf(),
        });
    }
    Ok(video)
}
