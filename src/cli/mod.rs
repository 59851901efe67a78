pub mod edit;
pub mod report;
pub mod shutdown;
pub mod track;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use edit::{process_add_command, process_remove_command, AddCommand, RemoveCommand};
use report::{process_categories_command, process_list_command, process_stats_command, StatsCommand};
use tracing::{debug, warn};
use track::{process_track_command, TrackCommand};

use crate::{
    config::TrackerConfig,
    fs::record_file::RecordFile,
    tracking::category::Category,
    utils::{
        dir::{create_application_default_path, ensure_dir},
        logging::enable_logging,
    },
};

#[derive(Parser, Debug)]
#[command(name = "timetracker", version, long_about = None)]
#[command(about = "Start/stop time tracker keeping categorized intervals in a text file", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(
        long,
        global = true,
        help = "Application directory. By default uses $XDG_STATE_HOME/timetracker or $HOME/.local/state/timetracker"
    )]
    dir: Option<PathBuf>,
    #[arg(
        long,
        short,
        global = true,
        help = "Record file. By default records.timetracker inside the application directory"
    )]
    file: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        help = "Log everything to stderr instead of the log files"
    )]
    log: bool,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Start the timer and record the interval once stopped with Ctrl-C")]
    Track {
        #[command(flatten)]
        command: TrackCommand,
    },
    #[command(about = "Add a record with explicit start and end")]
    Add {
        #[command(flatten)]
        command: AddCommand,
    },
    #[command(about = "Remove records by their number in `list`")]
    Remove {
        #[command(flatten)]
        command: RemoveCommand,
    },
    #[command(about = "List stored records")]
    List {
        #[arg(long, help = "Print records as JSON")]
        json: bool,
    },
    #[command(about = "Show total and per category time")]
    Stats {
        #[command(flatten)]
        command: StatsCommand,
    },
    #[command(about = "List categories in use")]
    Categories {},
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let dir = match args.dir {
        Some(dir) => ensure_dir(dir)?,
        None => create_application_default_path()?,
    };

    enable_logging(&dir, args.log)?;

    let config = TrackerConfig::load(&dir)?;
    let path = args.file.unwrap_or_else(|| config.record_file(&dir));
    debug!("Using record file {path:?}");
    let storage = RecordFile::new(path, config.max_category_length);

    match args.commands {
        Commands::Track { command } => process_track_command(command, &storage, &config).await,
        Commands::Add { command } => process_add_command(command, &storage, &config).await,
        Commands::Remove { command } => process_remove_command(command, &storage).await,
        Commands::List { json } => process_list_command(json, &storage).await,
        Commands::Stats { command } => process_stats_command(command, &storage, &config).await,
        Commands::Categories {} => process_categories_command(&storage).await,
    }
}

/// Category typed in by the user, cleaned up. Input with nothing usable in it is dropped with a
/// warning rather than failing the command.
fn user_category(input: &str, max_length: usize) -> Option<Category> {
    let category = Category::sanitize(input, max_length);
    if category.is_none() {
        warn!("Category {input:?} has no usable characters, using none");
    }
    category
}
