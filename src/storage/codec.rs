use thiserror::Error;

use crate::{
    tracking::{
        category::{Category, InvalidCategory},
        collection::RecordCollection,
        record::TimeRecord,
    },
    utils::time::{format_timestamp, parse_timestamp},
};

/// Category names longer than this are cut when reading a record file.
pub const DEFAULT_MAX_CATEGORY_LENGTH: usize = 255;

/// Extension record files conventionally use. Nothing checks it.
pub const FILE_EXTENSION: &str = "timetracker";

const FIELD_SEPARATOR: char = ',';

#[derive(Debug, Error, PartialEq)]
pub enum MalformedReason {
    #[error("expected 2 or 3 comma separated fields, found {0}")]
    FieldCount(usize),
    #[error("invalid timestamp {value:?}: {source}")]
    Timestamp {
        value: String,
        source: chrono::ParseError,
    },
    #[error(transparent)]
    Category(InvalidCategory),
}

/// A line of a record file that can't be turned into a record. Reading stops at the first one.
#[derive(Debug, Error, PartialEq)]
#[error("Malformed record{}: {reason}", .line.map(|line| format!(" on line {line}")).unwrap_or_default())]
pub struct MalformedRecord {
    /// 1-based line number, known only when reading a whole file.
    pub line: Option<usize>,
    pub reason: MalformedReason,
}

impl MalformedRecord {
    fn at_line(self, line: usize) -> Self {
        Self {
            line: Some(line),
            ..self
        }
    }
}

impl From<MalformedReason> for MalformedRecord {
    fn from(reason: MalformedReason) -> Self {
        Self { line: None, reason }
    }
}

/// Turns a record into a single line, without the trailing newline.
///
/// `<start>,<end>` or `<start>,<end>,<category>`.
pub fn serialize_one(record: &TimeRecord) -> String {
    let start = format_timestamp(&record.start());
    let end = format_timestamp(&record.end());
    match record.category() {
        None => format!("{start}{FIELD_SEPARATOR}{end}"),
        Some(category) => format!("{start}{FIELD_SEPARATOR}{end}{FIELD_SEPARATOR}{category}"),
    }
}

/// Full record file content. Every record, the last one included, ends with `\n`.
pub fn serialize(records: &RecordCollection) -> String {
    let mut buffer = String::new();
    for record in records {
        buffer.push_str(&serialize_one(record));
        buffer.push('\n');
    }
    buffer
}

/// Reads one line of a record file. The category is cut to `max_category_length` characters.
pub fn deserialize_one(
    line: &str,
    max_category_length: usize,
) -> Result<TimeRecord, MalformedRecord> {
    let fields = line.split(FIELD_SEPARATOR).collect::<Vec<_>>();

    let (start, end, category) = match fields.as_slice() {
        [start, end] => (start, end, None),
        [start, end, category] => (start, end, Some(category)),
        _ => return Err(MalformedReason::FieldCount(fields.len()).into()),
    };

    let record = TimeRecord::new(parse_field(start)?, parse_field(end)?);
    let category = category
        .map(|name| Category::truncated(name, max_category_length))
        .transpose()
        .map_err(MalformedReason::Category)?;

    Ok(record.with_category(category))
}

/// Reads a whole record file. Stops at the first malformed line, so the result is either every
/// record or nothing.
pub fn deserialize_all(
    text: &str,
    max_category_length: usize,
) -> Result<RecordCollection, MalformedRecord> {
    // `lines` already drops the empty remainder after a final newline. Any other empty line is
    // malformed.
    text.lines()
        .enumerate()
        .map(|(index, line)| {
            deserialize_one(line, max_category_length).map_err(|e| e.at_line(index + 1))
        })
        .collect()
}

fn parse_field(value: &str) -> Result<chrono::DateTime<chrono::FixedOffset>, MalformedReason> {
    parse_timestamp(value).map_err(|source| MalformedReason::Timestamp {
        value: value.to_string(),
        source,
    })
}
