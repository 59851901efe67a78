use std::{io::Write, time::Duration};

use ansi_term::Colour;
use anyhow::Result;
use chrono::Local;
use clap::Parser;
use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::{
    config::TrackerConfig,
    fs::record_file::RecordStorage,
    storage::codec::serialize_one,
    tracking::{collection::RecordCollection, record::TimeRecord, session::TrackingSession},
    utils::{
        clock::{Clock, DefaultClock},
        time::format_duration,
    },
};

use super::{shutdown::detect_shutdown, user_category};

/// How often the running time is redrawn.
const REFRESH_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Parser)]
pub struct TrackCommand {
    #[arg(
        short,
        long,
        help = "Category of the tracked interval. Only letters, digits, spaces and -_: are kept"
    )]
    category: Option<String>,
}

/// Command to process `track`. Runs the timer in the foreground until Ctrl-C, then appends the
/// interval to the record file.
pub async fn process_track_command(
    TrackCommand { category }: TrackCommand,
    storage: &impl RecordStorage,
    config: &TrackerConfig,
) -> Result<()> {
    // A broken record file should stop us before any time gets tracked.
    storage.load().await?;

    let category = category.and_then(|input| user_category(&input, config.max_category_length));

    let shutdown_token = CancellationToken::new();
    let mut session = TrackingSession::new(Box::new(DefaultClock));
    let mut stdout = std::io::stdout();

    let (_, record) = tokio::join!(detect_shutdown(shutdown_token.clone()), async {
        let record =
            track_until_cancelled(&mut session, &DefaultClock, &shutdown_token, &mut stdout).await;
        // Stop listening for Ctrl-C once tracking is over.
        shutdown_token.cancel();
        record
    });
    let record = record?.with_category(category);
    println!();

    let records = save_tracked(&record, storage, &mut std::io::stderr()).await?;

    let label = record
        .category()
        .map(|c| c.to_string())
        .unwrap_or_else(|| "no category".to_string());
    println!(
        "{} {} ({label}, {} in total)",
        Colour::Green.paint("Tracked"),
        record.elapsed_text(),
        format_duration(records.category_elapsed(record.category()))
    );
    Ok(())
}

/// Appends `record` to whatever is stored once tracking is over, so records added or removed
/// while the timer ran are kept. When that fails the record line is written into `err` for
/// adding it back by hand.
async fn save_tracked(
    record: &TimeRecord,
    storage: &impl RecordStorage,
    err: &mut impl Write,
) -> Result<RecordCollection> {
    match append_record(record, storage).await {
        Ok(records) => Ok(records),
        Err(e) => {
            error!("Failed to save tracked record {e:?}");
            writeln!(
                err,
                "{} append this line to the record file to keep it:\n{}",
                Colour::Red.paint("Tracked interval was not saved,"),
                serialize_one(record)
            )?;
            Err(e)
        }
    }
}

async fn append_record(
    record: &TimeRecord,
    storage: &impl RecordStorage,
) -> Result<RecordCollection> {
    let mut records = storage.load().await?;
    records.push(record.clone());
    storage.save(&records).await?;
    Ok(records)
}

/// Starts `session`, redraws the elapsed time into `out` until `shutdown` is cancelled and
/// returns the stopped record. Failing to draw never loses the record.
async fn track_until_cancelled(
    session: &mut TrackingSession,
    clock: &dyn Clock,
    shutdown: &CancellationToken,
    out: &mut impl Write,
) -> Result<TimeRecord> {
    let start = session.start()?;
    info!("Tracking started");
    if let Err(e) = writeln!(
        out,
        "Tracking since {}. Press Ctrl-C to stop.",
        start.with_timezone(&Local).format("%H:%M:%S")
    ) {
        warn!("Failed to print tracking start {e:?}");
    }

    loop {
        select! {
            biased;
            _ = shutdown.cancelled() => break,
            _ = clock.sleep(REFRESH_INTERVAL) => {
                let drawn = write!(out, "\r{}", session.elapsed()?).and_then(|_| out.flush());
                if let Err(e) = drawn {
                    warn!("Failed to redraw elapsed time {e:?}");
                }
            }
        }
    }

    let record = session.stop()?;
    info!("Tracking stopped after {}", record.elapsed_text());
    Ok(record)
}

#[cfg(test)]
mod tests {
    use std::{
        collections::VecDeque,
        io::{self, Write},
        sync::{
            atomic::{AtomicI64, AtomicUsize, Ordering},
            Arc, Mutex,
        },
    };

    use anyhow::{anyhow, bail, Result};
    use chrono::{DateTime, Duration, FixedOffset, TimeZone};
    use tokio_util::sync::CancellationToken;

    use crate::{
        fs::record_file::RecordStorage,
        storage::codec::serialize_one,
        tracking::{
            category::Category, collection::RecordCollection, record::TimeRecord,
            session::TrackingSession,
        },
        utils::{clock::MockClock, logging::TEST_LOGGING},
    };

    use super::{save_tracked, track_until_cancelled};

    /// Storage whose content is replaced by the next queued collection on every load, the way a
    /// file edited from another terminal would behave.
    #[derive(Default)]
    struct ChangingStorage {
        loads: Mutex<VecDeque<RecordCollection>>,
        saved: Mutex<Option<RecordCollection>>,
        fail_save: bool,
    }

    impl ChangingStorage {
        fn new(loads: impl IntoIterator<Item = RecordCollection>) -> Self {
            Self {
                loads: Mutex::new(loads.into_iter().collect()),
                ..Default::default()
            }
        }
    }

    impl RecordStorage for ChangingStorage {
        async fn load(&self) -> Result<RecordCollection> {
            self.loads
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| anyhow!("Unexpected load"))
        }

        async fn save(&self, records: &RecordCollection) -> Result<()> {
            if self.fail_save {
                bail!("Disk is full");
            }
            *self.saved.lock().unwrap() = Some(records.clone());
            Ok(())
        }
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::ErrorKind::BrokenPipe.into())
        }
    }

    fn interval(minutes: i64, category: &str) -> TimeRecord {
        TimeRecord::new(base(), base() + Duration::minutes(minutes))
            .with_category(Some(Category::new(category).unwrap()))
    }

    fn base() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2022, 2, 2, 9, 0, 0)
            .unwrap()
    }

    fn ticking_clock() -> MockClock {
        let reads = Arc::new(AtomicI64::new(0));
        let mut clock = MockClock::new();
        clock
            .expect_time()
            .returning(move || base() + Duration::seconds(reads.fetch_add(1, Ordering::SeqCst)));
        clock
    }

    #[tokio::test]
    async fn test_tracks_until_cancelled() -> Result<()> {
        *TEST_LOGGING;
        let shutdown = CancellationToken::new();

        let sleeps = Arc::new(AtomicUsize::new(0));
        let mut ticker = MockClock::new();
        {
            let shutdown = shutdown.clone();
            let sleeps = sleeps.clone();
            ticker.expect_sleep().returning(move |_| {
                if sleeps.fetch_add(1, Ordering::SeqCst) + 1 == 3 {
                    shutdown.cancel();
                }
            });
        }

        let mut session = TrackingSession::new(Box::new(ticking_clock()));
        let mut out = Vec::new();

        let record = track_until_cancelled(&mut session, &ticker, &shutdown, &mut out).await?;

        assert!(!session.is_tracking());
        assert_eq!(record.start(), base());
        assert!(record.elapsed() > Duration::zero());
        assert_eq!(sleeps.load(Ordering::SeqCst), 3);

        let out = String::from_utf8(out)?;
        assert!(out.starts_with("Tracking since "));
        let ticks = out.matches('\r').count();
        assert!((2..=3).contains(&ticks), "unexpected output {out:?}");
        assert!(out.contains("\r0:01"));
        Ok(())
    }

    #[tokio::test]
    async fn test_already_cancelled_still_records() -> Result<()> {
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        let mut ticker = MockClock::new();
        ticker.expect_sleep().returning(|_| ());
        let mut session = TrackingSession::new(Box::new(ticking_clock()));
        let mut out = Vec::new();

        let record = track_until_cancelled(&mut session, &ticker, &shutdown, &mut out).await?;

        assert_eq!(record.elapsed(), Duration::seconds(1));
        assert!(!String::from_utf8(out)?.contains('\r'));
        Ok(())
    }

    #[tokio::test]
    async fn test_failing_output_still_records() -> Result<()> {
        let shutdown = CancellationToken::new();

        let mut ticker = MockClock::new();
        {
            let shutdown = shutdown.clone();
            ticker.expect_sleep().returning(move |_| shutdown.cancel());
        }
        let mut session = TrackingSession::new(Box::new(ticking_clock()));

        let record =
            track_until_cancelled(&mut session, &ticker, &shutdown, &mut BrokenPipe).await?;

        assert_eq!(record.start(), base());
        assert!(!session.is_tracking());
        Ok(())
    }

    #[tokio::test]
    async fn test_save_keeps_records_added_while_tracking() -> Result<()> {
        *TEST_LOGGING;
        let before = RecordCollection::from_iter([interval(5, "A")]);
        let meanwhile = RecordCollection::from_iter([interval(5, "A"), interval(10, "B")]);
        let storage = ChangingStorage::new([before.clone(), meanwhile]);

        assert_eq!(storage.load().await?, before);
        let tracked = interval(15, "C");
        let mut err = Vec::new();
        let records = save_tracked(&tracked, &storage, &mut err).await?;

        let expected =
            RecordCollection::from_iter([interval(5, "A"), interval(10, "B"), tracked]);
        assert_eq!(records, expected);
        assert_eq!(storage.saved.lock().unwrap().as_ref(), Some(&expected));
        assert!(err.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_save_prints_record_line() -> Result<()> {
        let storage = ChangingStorage {
            fail_save: true,
            ..ChangingStorage::new([RecordCollection::new()])
        };
        let tracked = interval(15, "C");
        let mut err = Vec::new();

        assert!(save_tracked(&tracked, &storage, &mut err).await.is_err());

        let err = String::from_utf8(err)?;
        assert!(err.ends_with(&format!("\n{}\n", serialize_one(&tracked))));
        assert!(storage.saved.lock().unwrap().is_none());
        Ok(())
    }
}
