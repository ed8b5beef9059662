//! VBOX telemetry (`.vbo`) documents.
//!
//! A VBO file is line-oriented text split into bracketed sections:
//!
//! ```text
//! File created on 01/06/2024 @ 10:15:00
//!
//! [header]
//! satellites
//! time
//!
//! [column names]
//! sats time lat long
//!
//! [data]
//! 008 101500.00 +03116.12 -00032.54
//! ```
//!
//! [`VboDocument`] keeps every line exactly as read so that a document can be
//! edited in a few places and written back without disturbing the rest.

pub mod time;

use std::ops::Range;

use thiserror::Error;

/// Section holding one channel name per line.
pub const HEADER_SECTION: &str = "header";

/// Section holding the video reference.
pub const AVI_SECTION: &str = "avi";

/// Section holding free-form comments.
pub const COMMENTS_SECTION: &str = "comments";

/// Section holding lap timing lines.
pub const LAPTIMING_SECTION: &str = "laptiming";

/// Section holding the whitespace-separated column names.
pub const COLUMN_NAMES_SECTION: &str = "column names";

/// Section holding the data rows.
pub const DATA_SECTION: &str = "data";

/// Order in which sections appear in files written by VBOX tools.
pub const SECTION_ORDER: [&str; 6] = [
    HEADER_SECTION,
    AVI_SECTION,
    COMMENTS_SECTION,
    LAPTIMING_SECTION,
    COLUMN_NAMES_SECTION,
    DATA_SECTION,
];

/// Column holding the packed time of day.
pub const TIME_COLUMN: &str = "time";

/// Channel and column carrying the video file number.
pub const AVI_FILE_INDEX: &str = "avifileindex";

/// Channel and column carrying the video position in milliseconds.
pub const AVI_SYNC_TIME: &str = "avisynctime";

/// Problems that make a document unusable for inserting a video reference.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// A required section is absent.
    #[error("missing [{0}] section")]
    MissingSection(&'static str),

    /// The `[column names]` section has no content line.
    #[error("[column names] section is empty")]
    EmptyColumnNames,

    /// The column names do not include `time`.
    #[error("no 'time' column in [column names]")]
    MissingTimeColumn,

    /// A data row has no decodable time value.
    #[error("line {line}: invalid time value '{value}'")]
    InvalidTime {
        /// 1-based line number in the file.
        line: usize,
        /// The offending value.
        value: String,
    },

    /// A data row does not have one field per column.
    #[error("line {line}: {found} fields, expected {expected}")]
    FieldCount {
        /// 1-based line number in the file.
        line: usize,
        /// Fields on the row.
        found: usize,
        /// Entries in `[column names]`.
        expected: usize,
    },

    /// A character cannot be written back in the document's encoding.
    #[error("character {0:?} cannot be stored in a single-byte file")]
    Unencodable(char),
}

/// How a document's bytes map to text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    /// UTF-8.
    #[default]
    Utf8,
    /// One byte per character, each byte taken as the code point of the same
    /// value. Used for files that are not valid UTF-8, such as the Windows
    /// code page output of VBOX Tools; any byte sequence round-trips.
    Latin1,
}

/// Line terminator used by a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    /// Unix `\n`.
    #[default]
    Lf,
    /// Windows `\r\n`, as written by VBOX Tools on Windows.
    CrLf,
}

impl LineEnding {
    /// The terminator characters.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
        }
    }
}

/// A bracketed section located within a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Section name without brackets.
    pub name: String,
    /// Index of the `[name]` line.
    pub header_line: usize,
    /// Indices of the lines belonging to the section, up to the next section.
    pub body: Range<usize>,
}

/// A VBO file held as its individual lines.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VboDocument {
    lines: Vec<String>,
    line_ending: LineEnding,
    trailing_newline: bool,
    encoding: TextEncoding,
}

/// Return the section name if `line` is a `[name]` line.
#[must_use]
pub fn section_name(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    trimmed
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .map(str::trim)
}

impl VboDocument {
    /// Split text into a document.
    ///
    /// The line ending is taken from the first line; `\r` is stripped from
    /// every line so mixed files normalize to that ending on output.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let line_ending = match text.find('\n') {
            Some(pos) if pos > 0 && text.as_bytes()[pos - 1] == b'\r' => LineEnding::CrLf,
            _ => LineEnding::Lf,
        };
        let trailing_newline = text.ends_with('\n');

        let body = if trailing_newline {
            &text[..text.len() - 1]
        } else {
            text
        };
        let lines = if text.is_empty() {
            Vec::new()
        } else {
            body.split('\n')
                .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
                .collect()
        };

        Self {
            lines,
            line_ending,
            trailing_newline,
            encoding: TextEncoding::Utf8,
        }
    }

    /// Split raw file contents into a document.
    ///
    /// Valid UTF-8 is read as such; anything else is read one byte per
    /// character so that every line survives unchanged.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        match std::str::from_utf8(bytes) {
            Ok(text) => Self::parse(text),
            Err(_) => {
                let text: String = bytes.iter().copied().map(char::from).collect();
                Self {
                    encoding: TextEncoding::Latin1,
                    ..Self::parse(&text)
                }
            }
        }
    }

    /// A document with the same line ending, trailing newline and encoding
    /// but different lines.
    #[must_use]
    pub fn with_lines(&self, lines: Vec<String>) -> Self {
        Self {
            lines,
            line_ending: self.line_ending,
            trailing_newline: self.trailing_newline,
            encoding: self.encoding,
        }
    }

    /// Join the lines back into text.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut text = self.lines.join(self.line_ending.as_str());
        if self.trailing_newline && !self.lines.is_empty() {
            text.push_str(self.line_ending.as_str());
        }
        text
    }

    /// Encode the text back into file contents.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::Unencodable`] if a single-byte document holds a
    /// character above U+00FF.
    pub fn to_bytes(&self) -> Result<Vec<u8>, FormatError> {
        let text = self.to_text();
        match self.encoding {
            TextEncoding::Utf8 => Ok(text.into_bytes()),
            TextEncoding::Latin1 => text
                .chars()
                .map(|c| u8::try_from(c).map_err(|_| FormatError::Unencodable(c)))
                .collect(),
        }
    }

    /// All lines, without terminators.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// The document's line ending.
    #[must_use]
    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    /// How the document's bytes map to text.
    #[must_use]
    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    /// Whether the text ended with a line terminator.
    #[must_use]
    pub fn trailing_newline(&self) -> bool {
        self.trailing_newline
    }

    /// All sections in file order. Lines before the first are the preamble.
    #[must_use]
    pub fn sections(&self) -> Vec<Section> {
        let starts: Vec<(usize, &str)> = self
            .lines
            .iter()
            .enumerate()
            .filter_map(|(i, line)| section_name(line).map(|name| (i, name)))
            .collect();

        starts
            .iter()
            .enumerate()
            .map(|(n, &(header_line, name))| {
                let end = starts.get(n + 1).map_or(self.lines.len(), |next| next.0);
                Section {
                    name: name.to_string(),
                    header_line,
                    body: header_line + 1..end,
                }
            })
            .collect()
    }

    /// The first section called `name`.
    #[must_use]
    pub fn section(&self, name: &str) -> Option<Section> {
        self.sections().into_iter().find(|s| s.name == name)
    }

    /// Non-blank lines of a section, with their indices.
    pub fn content_lines<'a>(
        &'a self,
        section: &Section,
    ) -> impl Iterator<Item = (usize, &'a str)> + 'a {
        let body = section.body.clone();
        self.lines[body.clone()]
            .iter()
            .zip(body)
            .filter(|(line, _)| !line.trim().is_empty())
            .map(|(line, i)| (i, line.as_str()))
    }

    /// Column names from the first content line of `[column names]`.
    ///
    /// # Errors
    ///
    /// Returns an error if the section is absent or empty.
    pub fn column_names(&self) -> Result<(usize, Vec<String>), FormatError> {
        let section = self
            .section(COLUMN_NAMES_SECTION)
            .ok_or(FormatError::MissingSection(COLUMN_NAMES_SECTION))?;
        let (index, line) = self
            .content_lines(&section)
            .next()
            .ok_or(FormatError::EmptyColumnNames)?;
        Ok((index, line.split_whitespace().map(String::from).collect()))
    }

    /// Whether the document already references a video.
    ///
    /// True when there is an `[avi]` section or the reference channels appear
    /// in `[header]` or `[column names]`.
    #[must_use]
    pub fn has_video_reference(&self) -> bool {
        if self.section(AVI_SECTION).is_some() {
            return true;
        }
        let is_reference = |name: &str| name == AVI_FILE_INDEX || name == AVI_SYNC_TIME;

        if let Some(header) = self.section(HEADER_SECTION) {
            if self
                .content_lines(&header)
                .any(|(_, line)| is_reference(line.trim()))
            {
                return true;
            }
        }
        self.column_names()
            .map(|(_, names)| names.iter().any(|n| is_reference(n.as_str())))
            .unwrap_or(false)
    }
}
