use std::io::Write;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Local};
use chrono_english::parse_date_string;
use clap::{CommandFactory, Parser};

use crate::{
    config::TrackerConfig,
    fs::record_file::RecordStorage,
    tracking::{category::Category, collection::RecordCollection},
    utils::time::format_duration,
};

use super::{
    edit::{record_indices, DateStyle},
    Args,
};

const NO_CATEGORY: &str = "(none)";
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Parser)]
pub struct StatsCommand {
    #[arg(
        short,
        long,
        conflicts_with = "uncategorized",
        help = "Only show time of this category"
    )]
    category: Option<String>,
    #[arg(short, long, help = "Only show time of records without a category")]
    uncategorized: bool,
    #[arg(
        short,
        long,
        help = "Only count records started at or after this moment. Examples are \"yesterday\", \"2 hours ago\", \"15/03/2025\""
    )]
    since: Option<String>,
    #[arg(
        short,
        long,
        value_delimiter = ',',
        help = "Also show the time of these records, numbered as in `list`. Example is \"1,3,4\""
    )]
    records: Vec<usize>,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
}

pub async fn process_list_command(json: bool, storage: &impl RecordStorage) -> Result<()> {
    let records = storage.load().await?;
    let mut stdout = std::io::stdout();
    if json {
        serde_json::to_writer_pretty(&mut stdout, &records)?;
        writeln!(stdout)?;
    } else {
        write_list(&records, &mut stdout)?;
    }
    Ok(())
}

pub async fn process_categories_command(storage: &impl RecordStorage) -> Result<()> {
    let records = storage.load().await?;
    let mut stdout = std::io::stdout();
    for category in records.categories() {
        writeln!(stdout, "{category}")?;
    }
    Ok(())
}

/// Which part of the records `stats` reports on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatsFilter {
    All,
    Only(Option<Category>),
}

pub async fn process_stats_command(
    StatsCommand {
        category,
        uncategorized,
        since,
        records: selection,
        date_style,
    }: StatsCommand,
    storage: &impl RecordStorage,
    config: &TrackerConfig,
) -> Result<()> {
    let filter = match (category, uncategorized) {
        (Some(name), _) => {
            // Looked up the same way it was typed in when tracking.
            let category = Category::sanitize(&name, config.max_category_length)
                .with_context(|| format!("Category {name:?} has no usable characters"))?;
            StatsFilter::Only(Some(category))
        }
        (None, true) => StatsFilter::Only(None),
        (None, false) => StatsFilter::All,
    };

    let since = match since {
        Some(value) => Some(
            parse_date_string(&value, Local::now(), date_style.into()).map_err(|e| {
                Args::command().error(
                    clap::error::ErrorKind::ValueValidation,
                    format!("Failed to validate since date {e}"),
                )
            })?,
        ),
        None => None,
    };

    let records = storage.load().await?;
    // Numbers refer to the whole file, the same as in `list`.
    let selected = if selection.is_empty() {
        None
    } else {
        Some(records.selection_elapsed(record_indices(&records, &selection)?))
    };
    let records = match since {
        Some(since) => started_since(records, since),
        None => records,
    };

    write_stats(&records, &filter, selected, &mut std::io::stdout())
}

/// Keeps records started at or after `since`.
fn started_since(records: RecordCollection, since: DateTime<Local>) -> RecordCollection {
    records
        .into_iter()
        .filter(|record| record.start() >= since)
        .collect()
}

/// Prints one row per record: number, start, end, elapsed time and category.
pub fn write_list(records: &RecordCollection, out: &mut impl Write) -> Result<()> {
    for (index, record) in records.iter().enumerate() {
        writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}",
            index + 1,
            record.start().with_timezone(&Local).format(TIME_FORMAT),
            record.end().with_timezone(&Local).format(TIME_FORMAT),
            record.elapsed_text(),
            record.category().map(Category::name).unwrap_or(NO_CATEGORY)
        )?;
    }
    Ok(())
}

/// Prints the time of the part chosen by `filter`, then the time of selected records if any.
pub fn write_stats(
    records: &RecordCollection,
    filter: &StatsFilter,
    selected: Option<Duration>,
    out: &mut impl Write,
) -> Result<()> {
    match filter {
        StatsFilter::All => {
            writeln!(out, "Total\t{}", format_duration(records.total_elapsed()))?;
            for (category, elapsed) in records.elapsed_by_category() {
                writeln!(
                    out,
                    "{}\t{}",
                    category.as_ref().map(Category::name).unwrap_or(NO_CATEGORY),
                    format_duration(elapsed)
                )?;
            }
        }
        StatsFilter::Only(category) => {
            writeln!(
                out,
                "{}\t{}",
                category.as_ref().map(Category::name).unwrap_or(NO_CATEGORY),
                format_duration(records.category_elapsed(category.as_ref()))
            )?;
        }
    }
    if let Some(selected) = selected {
        writeln!(out, "Selected\t{}", format_duration(selected))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::{DateTime, Duration, Local, TimeZone};

    use crate::{
        cli::edit::record_indices,
        tracking::{category::Category, collection::RecordCollection, record::TimeRecord},
    };

    use super::{started_since, write_list, write_stats, StatsFilter};

    fn base() -> DateTime<Local> {
        Local.with_ymd_and_hms(2023, 6, 1, 9, 0, 0).unwrap()
    }

    fn test_records() -> RecordCollection {
        let start = base().fixed_offset();
        RecordCollection::from_iter([
            TimeRecord::new(start, start + Duration::seconds(10))
                .with_category(Some(Category::new("Work").unwrap())),
            TimeRecord::new(start + Duration::hours(1), start + Duration::minutes(65)),
            TimeRecord::new(start + Duration::hours(2), start + Duration::seconds(3 * 3600 + 1))
                .with_category(Some(Category::new("Work").unwrap())),
        ])
    }

    fn render(records: &RecordCollection, filter: &StatsFilter) -> Result<String> {
        let mut out = Vec::new();
        write_stats(records, filter, None, &mut out)?;
        Ok(String::from_utf8(out)?)
    }

    #[test]
    fn test_stats_all() -> Result<()> {
        assert_eq!(
            render(&test_records(), &StatsFilter::All)?,
            "Total\t1:05:11\n\
             (none)\t5:00\n\
             Work\t1:00:11\n"
        );
        Ok(())
    }

    #[test]
    fn test_stats_single_bucket() -> Result<()> {
        let records = test_records();

        assert_eq!(
            render(&records, &StatsFilter::Only(None))?,
            "(none)\t5:00\n"
        );
        assert_eq!(
            render(
                &records,
                &StatsFilter::Only(Some(Category::new("Work").unwrap()))
            )?,
            "Work\t1:00:11\n"
        );
        assert_eq!(
            render(
                &records,
                &StatsFilter::Only(Some(Category::new("Other").unwrap()))
            )?,
            "Other\t0:00\n"
        );
        Ok(())
    }

    #[test]
    fn test_stats_empty() -> Result<()> {
        assert_eq!(
            render(&RecordCollection::new(), &StatsFilter::All)?,
            "Total\t0:00\n"
        );
        Ok(())
    }

    #[test]
    fn test_stats_with_selection() -> Result<()> {
        let records = test_records();
        let selected = records.selection_elapsed(record_indices(&records, &[3, 1, 3])?);

        let mut out = Vec::new();
        write_stats(&records, &StatsFilter::Only(None), Some(selected), &mut out)?;

        assert_eq!(String::from_utf8(out)?, "(none)\t5:00\nSelected\t1:00:11\n");
        assert!(record_indices(&records, &[4]).is_err());
        Ok(())
    }

    #[test]
    fn test_list_rows() -> Result<()> {
        let mut out = Vec::new();
        write_list(&test_records(), &mut out)?;
        let out = String::from_utf8(out)?;

        let rows = out.lines().collect::<Vec<_>>();
        assert_eq!(rows.len(), 3);
        assert_eq!(
            rows[0],
            "1\t2023-06-01 09:00:00\t2023-06-01 09:00:10\t0:10\tWork"
        );
        assert!(rows[1].starts_with("2\t"));
        assert!(rows[1].ends_with("\t5:00\t(none)"));
        assert!(rows[2].ends_with("\t1:00:01\tWork"));
        Ok(())
    }

    #[test]
    fn test_started_since() {
        let records = started_since(test_records(), base() + Duration::minutes(30));

        assert_eq!(records.len(), 2);
        assert_eq!(records.total_elapsed(), Duration::seconds(5 * 60 + 3601));
    }
}
