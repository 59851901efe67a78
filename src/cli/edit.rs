use std::{collections::BTreeSet, fmt::Display};

use anyhow::{bail, Result};
use chrono::{DateTime, FixedOffset, Local, SubsecRound};
use chrono_english::parse_date_string;
use clap::{CommandFactory, Parser, ValueEnum};
use tracing::{info, warn};

use crate::{
    config::TrackerConfig,
    fs::record_file::RecordStorage,
    tracking::{collection::RecordCollection, record::TimeRecord},
};

use super::{user_category, Args};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DateStyle {
    Uk,
    Us,
}

impl From<DateStyle> for chrono_english::Dialect {
    fn from(value: DateStyle) -> Self {
        match value {
            DateStyle::Uk => Self::Uk,
            DateStyle::Us => Self::Us,
        }
    }
}

impl Display for DateStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateStyle::Uk => write!(f, "uk"),
            DateStyle::Us => write!(f, "us"),
        }
    }
}

#[derive(Debug, Parser)]
pub struct AddCommand {
    #[arg(
        long = "start",
        short,
        help = "Start of the interval. Examples are \"1 hour ago\", \"12:00\", \"12:00 16/03/2025\""
    )]
    start_date: String,
    #[arg(
        long = "end",
        short,
        help = "End of the interval. Defaults to now. Examples are \"10 minutes ago\", \"13:30\""
    )]
    end_date: Option<String>,
    #[arg(short, long, help = "Category of the interval")]
    category: Option<String>,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
}

#[derive(Debug, Parser)]
pub struct RemoveCommand {
    #[arg(required = true, help = "Record numbers as shown by `list`")]
    numbers: Vec<usize>,
}

/// Command to process `add`. Intended for intervals that weren't tracked live, e.g. a meeting
/// somebody forgot to start the timer for.
pub async fn process_add_command(
    AddCommand {
        start_date,
        end_date,
        category,
        date_style,
    }: AddCommand,
    storage: &impl RecordStorage,
    config: &TrackerConfig,
) -> Result<()> {
    let now = Local::now();
    let start = parse_moment("start", &start_date, now, date_style)?;
    let end = match end_date {
        Some(end_date) => parse_moment("end", &end_date, now, date_style)?,
        None => now.fixed_offset().trunc_subsecs(7),
    };

    let category = category.and_then(|input| user_category(&input, config.max_category_length));
    let record = TimeRecord::new(start, end).with_category(category);
    if record.elapsed() < chrono::Duration::zero() {
        warn!("Adding record that ends before it starts: {start} - {end}");
    }

    let mut records = storage.load().await?;
    records.push(record.clone());
    storage.save(&records).await?;

    info!("Added record {start} - {end}");
    println!("Added {} as record {}", record.elapsed_text(), records.len());
    Ok(())
}

/// Command to process `remove`. Numbers are 1-based, as printed by `list`.
pub async fn process_remove_command(
    RemoveCommand { numbers }: RemoveCommand,
    storage: &impl RecordStorage,
) -> Result<()> {
    let mut records = storage.load().await?;
    let removed = remove_numbered(&mut records, &numbers)?;
    storage.save(&records).await?;

    info!("Removed {removed} records");
    println!("Removed {removed} records");
    Ok(())
}

/// Removes records by their 1-based numbers. Nothing is removed if any number doesn't exist.
fn remove_numbered(records: &mut RecordCollection, numbers: &[usize]) -> Result<usize> {
    let indices = record_indices(records, numbers)?;

    // Back to front so earlier removals don't shift later numbers.
    for index in indices.iter().rev() {
        records.remove(*index);
    }
    Ok(indices.len())
}

/// Turns 1-based record numbers, as printed by `list`, into indices. Repeated numbers are kept
/// once. Fails if any number doesn't exist.
pub(super) fn record_indices(
    records: &RecordCollection,
    numbers: &[usize],
) -> Result<BTreeSet<usize>> {
    let numbers = numbers.iter().copied().collect::<BTreeSet<_>>();
    if let Some(missing) = numbers
        .iter()
        .find(|&&number| number == 0 || number > records.len())
    {
        bail!(
            "There is no record number {missing}, numbers go from 1 to {}",
            records.len()
        );
    }
    Ok(numbers.into_iter().map(|number| number - 1).collect())
}

fn parse_moment(
    name: &str,
    value: &str,
    now: DateTime<Local>,
    date_style: DateStyle,
) -> Result<DateTime<FixedOffset>> {
    match parse_date_string(value, now, date_style.into()) {
        Ok(moment) => Ok(moment.fixed_offset().trunc_subsecs(7)),
        Err(e) => Err(Args::command()
            .error(
                clap::error::ErrorKind::ValueValidation,
                format!("Failed to validate {name} date {e}"),
            )
            .into()),
    }
}
