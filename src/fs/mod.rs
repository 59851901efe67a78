//! Disk access for record files. Everything here is blocking for the caller's purposes; parsing
//! and formatting are left to [crate::storage].

pub mod record_file;
