use std::{fmt::Display, sync::Arc, sync::LazyLock};

use regex::Regex;
use serde::Serialize;
use thiserror::Error;

/// Characters a category typed in by the user may contain. Anything else is stripped by
/// [Category::sanitize].
static DISALLOWED_CHARACTERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^-_: \w]").expect("Category filter must be a valid regex"));

#[derive(Debug, Error, PartialEq, Eq)]
#[error("category {name:?} contains a field or line separator")]
pub struct InvalidCategory {
    pub name: String,
}

/// A label grouping records for statistics. Two categories are the same category when their
/// names match.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Category(Arc<str>);

impl Category {
    /// Builds a category from a name. Names with `,` or line breaks can't be stored in a record
    /// file and are rejected.
    pub fn new(name: impl AsRef<str>) -> Result<Self, InvalidCategory> {
        let name = name.as_ref();
        if name.contains([',', '\n', '\r']) {
            return Err(InvalidCategory {
                name: name.to_string(),
            });
        }
        Ok(Self(name.into()))
    }

    /// Same as [Category::new] but keeps only the first `max_length` characters.
    pub fn truncated(name: &str, max_length: usize) -> Result<Self, InvalidCategory> {
        Self::new(truncate_chars(name, max_length))
    }

    /// Cleans up free text typed by a user. Strips everything outside of `[-_: \w]`, trims
    /// surrounding spaces and truncates. Returns [None] when nothing is left.
    pub fn sanitize(input: &str, max_length: usize) -> Option<Self> {
        let cleaned = DISALLOWED_CHARACTERS.replace_all(input, "");
        let cleaned = truncate_chars(cleaned.trim_matches(' '), max_length);
        if cleaned.is_empty() {
            None
        } else {
            Some(Self(cleaned.into()))
        }
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Keeps the first `max_length` characters of `value`.
fn truncate_chars(value: &str, max_length: usize) -> &str {
    match value.char_indices().nth(max_length) {
        Some((index, _)) => &value[..index],
        None => value,
    }
}
