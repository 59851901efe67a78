//! Start/stop time tracker. Completed intervals are kept, optionally categorized, in a plain text
//! file that can be summed up later by total and per category.
//!

pub mod cli;
pub mod config;
pub mod fs;
pub mod storage;
pub mod tracking;
pub mod utils;
