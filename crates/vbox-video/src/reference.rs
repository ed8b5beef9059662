//! The video reference embedded in a VBO document.
//!
//! Analysis tools locate the video of a VBO file through four coordinated
//! pieces:
//!
//! - an `[avi]` section whose two lines are the clip prefix and extension,
//! - `avifileindex` and `avisynctime` entries in `[header]`,
//! - the same two names appended to `[column names]`,
//! - on every `[data]` row, the clip number and the video position in
//!   milliseconds at which that row was logged.
//!
//! Applying a reference touches only those lines. Everything else is copied
//! through unchanged, and applying the same reference twice gives the same
//! text.

use std::collections::{BTreeMap, HashMap};
use std::ops::Range;

use tracing::{debug, trace};

use crate::vbo::{
    time, FormatError, Section, VboDocument, AVI_FILE_INDEX, AVI_SECTION, AVI_SYNC_TIME,
    DATA_SECTION, HEADER_SECTION, SECTION_ORDER, TIME_COLUMN,
};
use crate::video::VideoFile;

/// A reference to one video, synchronized at a fixed offset.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoReference {
    /// The referenced clip.
    pub video: VideoFile,
    /// Position in the video, in seconds, at which the first data row was logged.
    pub offset_sec: f64,
}

/// Result of applying a reference.
#[derive(Debug, Clone)]
pub struct Patched {
    /// The edited document.
    pub document: VboDocument,
    /// Number of data rows that received reference values.
    pub data_rows: usize,
    /// Whether the input already carried a reference that was replaced.
    pub replaced_existing: bool,
}

/// Pending line edits, applied in one pass so indices stay valid.
#[derive(Debug, Default)]
struct LineEdits {
    insert_before: BTreeMap<usize, Vec<String>>,
    replace: HashMap<usize, Option<String>>,
}

impl LineEdits {
    fn insert(&mut self, index: usize, lines: impl IntoIterator<Item = String>) {
        self.insert_before.entry(index).or_default().extend(lines);
    }

    fn replace(&mut self, index: usize, line: String) {
        self.replace.insert(index, Some(line));
    }

    fn delete(&mut self, index: usize) {
        self.replace.insert(index, None);
    }

    fn apply(mut self, lines: &[String]) -> Vec<String> {
        let mut out = Vec::with_capacity(lines.len() + 8);
        for (i, line) in lines.iter().enumerate() {
            if let Some(inserted) = self.insert_before.remove(&i) {
                out.extend(inserted);
            }
            match self.replace.remove(&i) {
                Some(Some(new)) => out.push(new),
                Some(None) => {}
                None => out.push(line.clone()),
            }
        }
        if let Some(inserted) = self.insert_before.remove(&lines.len()) {
            out.extend(inserted);
        }
        out
    }
}

impl VideoReference {
    /// Reference `video`, with the log starting `offset_sec` into it.
    #[must_use]
    pub fn new(video: VideoFile, offset_sec: f64) -> Self {
        Self { video, offset_sec }
    }

    /// The file name the reference resolves to.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!(
            "{}{}.{}",
            self.video.prefix, self.video.number, self.video.extension
        )
    }

    /// Apply the reference to a document, replacing any existing one.
    ///
    /// # Errors
    ///
    /// Returns an error if `[header]`, `[column names]` or `[data]` is
    /// missing, if there is no `time` column, or if a data row has no
    /// decodable time or a field count different from the column count.
    pub fn apply(&self, doc: &VboDocument) -> Result<Patched, FormatError> {
        let replaced_existing = doc.has_video_reference();
        let header = doc
            .section(HEADER_SECTION)
            .ok_or(FormatError::MissingSection(HEADER_SECTION))?;
        let data = doc
            .section(DATA_SECTION)
            .ok_or(FormatError::MissingSection(DATA_SECTION))?;
        let (columns_line, mut columns) = doc.column_names()?;
        let time_index = columns
            .iter()
            .position(|c| c == TIME_COLUMN)
            .ok_or(FormatError::MissingTimeColumn)?;

        let known_columns = columns.len();
        let file_index = column_index(&mut columns, AVI_FILE_INDEX);
        let sync_index = column_index(&mut columns, AVI_SYNC_TIME);

        let mut edits = LineEdits::default();
        patch_header(doc, &header, &mut edits);
        self.patch_avi_section(doc, &mut edits);

        if columns.len() > known_columns {
            let appended: Vec<(usize, String)> = columns
                .iter()
                .enumerate()
                .skip(known_columns)
                .map(|(i, name)| (i, name.clone()))
                .collect();
            let line = &doc.lines()[columns_line];
            edits.replace(columns_line, patch_fields(line, &appended));
            debug!(columns = %columns.join(" "), "Patched column names");
        }

        let mut first_time = None;
        let mut data_rows = 0;
        for (index, line) in doc.content_lines(&data) {
            let found = field_spans(line).len();
            if found != known_columns {
                return Err(FormatError::FieldCount {
                    line: index + 1,
                    found,
                    expected: known_columns,
                });
            }
            let value = line.split_whitespace().nth(time_index).unwrap_or_default();
            let at = time::decode(value).ok_or_else(|| FormatError::InvalidTime {
                line: index + 1,
                value: value.to_string(),
            })?;
            let start = *first_time.get_or_insert(at);
            let millis = time::sync_millis(self.offset_sec, time::elapsed(start, at));

            let updates = [
                (file_index, self.video.number.clone()),
                (sync_index, millis.to_string()),
            ];
            edits.replace(index, patch_fields(line, &updates));
            data_rows += 1;
        }
        trace!(data_rows, "Patched data rows");

        let lines = edits.apply(doc.lines());
        Ok(Patched {
            document: doc.with_lines(lines),
            data_rows,
            replaced_existing,
        })
    }

    /// Write the `[avi]` section, replacing its content if it exists.
    fn patch_avi_section(&self, doc: &VboDocument, edits: &mut LineEdits) {
        let content = [self.video.prefix.clone(), self.video.extension.clone()];

        if let Some(avi) = doc.section(AVI_SECTION) {
            let existing: Vec<usize> = doc.content_lines(&avi).map(|(i, _)| i).collect();
            edits.insert(
                existing.first().copied().unwrap_or(avi.header_line + 1),
                content,
            );
            for index in existing {
                edits.delete(index);
            }
            return;
        }

        // The section goes before the first section that follows it in the
        // canonical order; [column names] is always present, so one exists.
        let later = &SECTION_ORDER[2..];
        let at = doc
            .sections()
            .into_iter()
            .find(|s| later.contains(&s.name.as_str()))
            .map_or(doc.lines().len(), |s| s.header_line);

        let mut block = vec![format!("[{AVI_SECTION}]")];
        block.extend(content);
        block.push(String::new());
        edits.insert(at, block);
    }
}

/// Add the reference channels to `[header]` if they are not listed yet.
fn patch_header(doc: &VboDocument, header: &Section, edits: &mut LineEdits) {
    let listed: Vec<(usize, &str)> = doc.content_lines(header).collect();
    let missing: Vec<String> = [AVI_FILE_INDEX, AVI_SYNC_TIME]
        .into_iter()
        .filter(|channel| !listed.iter().any(|(_, line)| line.trim() == *channel))
        .map(String::from)
        .collect();
    if missing.is_empty() {
        return;
    }
    let after_last = listed
        .last()
        .map_or(header.header_line + 1, |(index, _)| index + 1);
    debug!(channels = ?missing, "Adding header channels");
    edits.insert(after_last, missing);
}

/// Read the prefix and extension from an existing `[avi]` section.
#[must_use]
pub fn read_avi(doc: &VboDocument) -> Option<(String, String)> {
    let avi = doc.section(AVI_SECTION)?;
    let mut lines = doc.content_lines(&avi).map(|(_, line)| line.trim().to_string());
    Some((lines.next()?, lines.next()?))
}

/// Index of `name` among the columns, appending it when absent.
fn column_index(columns: &mut Vec<String>, name: &str) -> usize {
    if let Some(index) = columns.iter().position(|c| c == name) {
        return index;
    }
    columns.push(name.to_string());
    columns.len() - 1
}

/// Byte ranges of the whitespace-separated fields of a line.
fn field_spans(line: &str) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut start = None;
    for (i, c) in line.char_indices() {
        match (c.is_whitespace(), start) {
            (true, Some(s)) => {
                spans.push(s..i);
                start = None;
            }
            (false, None) => start = Some(i),
            _ => {}
        }
    }
    if let Some(s) = start {
        spans.push(s..line.len());
    }
    spans
}

/// Set fields by index, keeping the original spacing.
///
/// Fields past the end of the line are appended in index order, separated by
/// single spaces.
fn patch_fields(line: &str, updates: &[(usize, String)]) -> String {
    let spans = field_spans(line);
    let mut out = String::with_capacity(line.len() + 16);
    let mut cursor = 0;

    for (n, span) in spans.iter().enumerate() {
        if let Some((_, value)) = updates.iter().find(|(index, _)| *index == n) {
            out.push_str(&line[cursor..span.start]);
            out.push_str(value);
            cursor = span.end;
        }
    }

    let mut appended: Vec<&(usize, String)> =
        updates.iter().filter(|(index, _)| *index >= spans.len()).collect();
    appended.sort_by_key(|(index, _)| *index);

    if appended.is_empty() {
        out.push_str(&line[cursor..]);
    } else {
        out.push_str(line[cursor..].trim_end());
        for (_, value) in appended {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(value);
        }
    }
    out
}
