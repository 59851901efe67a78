//! In-memory side of tracking.
//!  - [session::TrackingSession] is the start/stop timer, producing a [record::TimeRecord] on stop.
//!  - [collection::RecordCollection] keeps records in order and computes totals.
//!  - [category::Category] labels records.

pub mod category;
pub mod collection;
pub mod record;
pub mod session;
