use chrono::{DateTime, Duration, FixedOffset, SubsecRound};
use serde::Serialize;

use crate::utils::time::format_duration;

use super::category::Category;

/// One completed interval of work.
///
/// `end >= start` is not checked. Records typed in by hand or read from a file may well run
/// backwards and simply report a negative [TimeRecord::elapsed].
///
/// Times are kept at 100 ns precision, the most a record file can store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeRecord {
    start: DateTime<FixedOffset>,
    end: DateTime<FixedOffset>,
    category: Option<Category>,
}

impl TimeRecord {
    pub fn new(start: DateTime<FixedOffset>, end: DateTime<FixedOffset>) -> Self {
        Self {
            start: start.trunc_subsecs(7),
            end: end.trunc_subsecs(7),
            category: None,
        }
    }

    pub fn with_category(self, category: Option<Category>) -> Self {
        Self { category, ..self }
    }

    pub fn start(&self) -> DateTime<FixedOffset> {
        self.start
    }

    pub fn end(&self) -> DateTime<FixedOffset> {
        self.end
    }

    pub fn category(&self) -> Option<&Category> {
        self.category.as_ref()
    }

    /// Category is the only part of a record that may change after it was created, e.g. when the
    /// user fills it in after stopping the timer.
    pub fn set_category(&mut self, category: Option<Category>) {
        self.category = category;
    }

    pub fn elapsed(&self) -> Duration {
        self.end - self.start
    }

    pub fn elapsed_text(&self) -> String {
        format_duration(self.elapsed())
    }
}
