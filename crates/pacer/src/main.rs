//! pacer - run/walk session tracker
//!
//! This is the main entry point for the pacer CLI.
//! It wires together all the components:
//! - Configuration loading
//! - History store initialization
//! - Session tracker
//! - Timer and location collaborators
//! - Intents read from stdin

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pacer_api::{RunRecord, SessionStatus};
use pacer_config::{load_config_or_default, Config, StorageBackend, StorageSettings};
use pacer_core::{CoreEvent, SessionTracker, TrackerError};
use pacer_host::{IntervalTimer, ReplayLocation, DEFAULT_FIX_INTERVAL};
use pacer_host_api::event_channel;
use pacer_store::{HistoryStore, JsonFilePersistence, Persistence, SqlitePersistence};
use pacer_util::{
    default_config_path, format_datetime_full, format_elapsed, format_time_of_day,
    is_mock_time_active,
};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal::unix::{signal, SignalKind};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// pacer - Track runs and walks with GPS distance, speed and calorie estimates
#[derive(Parser, Debug)]
#[command(name = "pacer")]
#[command(about = "Track runs and walks with GPS distance, speed and calorie estimates", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/pacer/config.toml)
    #[arg(short, long, global = true, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Data directory override (or set PACER_DATA_DIR env var)
    #[arg(short, long, global = true, env = "PACER_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level
    #[arg(short, long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Record a session, replaying fixes from a track file
    Track {
        /// JSON array of {"latitude", "longitude"} objects
        #[arg(long)]
        replay: PathBuf,

        /// Delay between replayed fixes in milliseconds
        #[arg(long, default_value_t = DEFAULT_FIX_INTERVAL.as_millis() as u64)]
        fix_interval_ms: u64,

        /// Start recording immediately
        #[arg(long)]
        autostart: bool,
    },

    /// List saved runs
    History {
        /// Only show the most recent run
        #[arg(long)]
        latest: bool,
    },
}

/// A user intent typed on stdin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Intent {
    Start,
    Stop,
    Reset,
    Save,
    Status,
    Locate,
    Quit,
}

impl FromStr for Intent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "start" | "resume" => Ok(Self::Start),
            "stop" | "pause" => Ok(Self::Stop),
            "reset" => Ok(Self::Reset),
            "save" => Ok(Self::Save),
            "status" => Ok(Self::Status),
            "locate" => Ok(Self::Locate),
            "quit" | "exit" => Ok(Self::Quit),
            other => Err(format!(
                "unknown command '{}' (start, stop, reset, save, status, locate, quit)",
                other
            )),
        }
    }
}

/// Open the configured persistence backend and load history from it
fn open_history(storage: &StorageSettings) -> Result<Arc<HistoryStore>> {
    std::fs::create_dir_all(&storage.data_dir)
        .with_context(|| format!("Failed to create data directory {:?}", storage.data_dir))?;

    let path = storage.history_path();
    let persistence: Arc<dyn Persistence> = match storage.backend {
        StorageBackend::Json => Arc::new(JsonFilePersistence::new(&path)),
        StorageBackend::Sqlite => Arc::new(
            SqlitePersistence::open(&path)
                .with_context(|| format!("Failed to open database {:?}", path))?,
        ),
    };

    info!(backend = %persistence.describe(), "History backend ready");
    Ok(Arc::new(HistoryStore::load_all(persistence)))
}

fn describe_run(record: &RunRecord) -> String {
    format!(
        "{} {}  {}  {:.2} km  {:.2} km/h  {:.1} kcal",
        record.date,
        format_time_of_day(&record.time_of_day),
        format_elapsed(record.elapsed_seconds),
        record.distance_km(),
        record.average_speed_kmh,
        record.calories_kcal,
    )
}

fn print_status(tracker: &SessionTracker) {
    let snapshot = tracker.snapshot();
    let status = match snapshot.status {
        SessionStatus::Idle => "idle",
        SessionStatus::Running => "running",
        SessionStatus::Stopped => "stopped",
    };

    print!(
        "[{}] {}  {:.2} km  {} points",
        status,
        format_elapsed(snapshot.elapsed_seconds),
        snapshot.distance_meters / 1000.0,
        snapshot.route.len()
    );
    match snapshot.last_position() {
        Some(position) => println!("  at {}", position),
        None => println!(),
    }
}

fn render(event: &CoreEvent) {
    match event {
        CoreEvent::SessionStarted {
            resumed: true,
            elapsed_seconds,
        } => println!("Resumed at {}", format_elapsed(*elapsed_seconds)),
        CoreEvent::SessionStarted { .. } => println!("Started"),
        CoreEvent::Ticked { elapsed_seconds } => {
            debug!(elapsed = %format_elapsed(*elapsed_seconds), "Tick");
        }
        CoreEvent::RouteExtended {
            distance_meters,
            points,
            ..
        } => println!("  {:.2} km, {} points", distance_meters / 1000.0, points),
        CoreEvent::RecenterRequested { coordinate } => {
            debug!(%coordinate, "Map recentered");
        }
        CoreEvent::SessionStopped {
            elapsed_seconds,
            distance_meters,
        } => println!(
            "Stopped at {}, {:.2} km",
            format_elapsed(*elapsed_seconds),
            distance_meters / 1000.0
        ),
        CoreEvent::SessionReset => println!("Session cleared"),
        CoreEvent::RunSaved { record, persisted } => {
            println!("Saved: {}", describe_run(record));
            if !persisted {
                println!("Warning: run kept in memory only, history file could not be written");
            }
        }
    }
}

fn render_all(events: &[CoreEvent]) {
    for event in events {
        render(event);
    }
}

fn report(intent: Intent, error: &TrackerError) {
    warn!(?intent, error = %error, "Intent rejected");
    println!("Cannot {:?}: {}", intent, error);
}

/// Returns false when the loop should exit
fn apply_intent(tracker: &mut SessionTracker, intent: Intent) -> bool {
    match intent {
        Intent::Start => match tracker.start() {
            Ok(event) => render(&event),
            Err(e) => report(intent, &e),
        },
        Intent::Stop => match tracker.stop() {
            Ok(event) => render(&event),
            Err(e) => report(intent, &e),
        },
        Intent::Reset => render_all(&tracker.reset()),
        Intent::Save => match tracker.save(pacer_util::now()) {
            Ok(events) => render_all(&events),
            Err(e) => report(intent, &e),
        },
        Intent::Status => print_status(tracker),
        Intent::Locate => match tracker.locate() {
            Ok(position) => println!("Current position {}", position),
            Err(e) => report(intent, &e),
        },
        Intent::Quit => return false,
    }
    true
}

async fn track(config: Config, replay: &Path, fix_interval: Duration, autostart: bool) -> Result<()> {
    let history = open_history(&config.storage)?;

    let location = Arc::new(
        ReplayLocation::from_file(replay, fix_interval)
            .with_context(|| format!("Failed to load replay track {:?}", replay))?,
    );
    let timer = Arc::new(IntervalTimer::new());
    let (sink, mut events) = event_channel();

    let mut tracker = SessionTracker::new(
        config.tracker,
        config.profile,
        location,
        timer,
        history,
        sink,
    );

    if autostart {
        apply_intent(&mut tracker, Intent::Start);
    }

    let mut sigterm =
        signal(SignalKind::terminate()).context("Failed to create SIGTERM handler")?;
    let mut sigint =
        signal(SignalKind::interrupt()).context("Failed to create SIGINT handler")?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    info!("Tracker running");

    loop {
        tokio::select! {
            _ = sigint.recv() => {
                info!("Received SIGINT, shutting down");
                break;
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down");
                break;
            }

            // Ticks and fixes, one at a time in arrival order
            Some(event) = events.recv() => {
                render_all(&tracker.handle_event(event));
            }

            line = lines.next_line(), if stdin_open => {
                match line {
                    Ok(Some(line)) if line.trim().is_empty() => {}
                    Ok(Some(line)) => match line.parse::<Intent>() {
                        Ok(intent) => {
                            if !apply_intent(&mut tracker, intent) {
                                break;
                            }
                        }
                        Err(message) => println!("{}", message),
                    },
                    Ok(None) => {
                        debug!("stdin closed, waiting for signal");
                        stdin_open = false;
                    }
                    Err(e) => {
                        error!(error = %e, "Failed to read stdin");
                        stdin_open = false;
                    }
                }
            }
        }
    }

    if tracker.status() == SessionStatus::Running {
        apply_intent(&mut tracker, Intent::Stop);
    }
    print_status(&tracker);
    if tracker.status() == SessionStatus::Stopped && tracker.snapshot().has_saveable_data() {
        println!("Unsaved session discarded");
    }

    info!("Shutdown complete");
    Ok(())
}

fn history(config: Config, latest: bool) -> Result<()> {
    let history = open_history(&config.storage)?;

    let records = if latest {
        history.latest().into_iter().collect()
    } else {
        history.list()
    };

    if records.is_empty() {
        println!("No saved runs");
        return Ok(());
    }

    for record in &records {
        println!("{}", describe_run(record));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        now = %format_datetime_full(&pacer_util::now()),
        mock_time = is_mock_time_active(),
        "pacer starting"
    );

    let mut config = load_config_or_default(&args.config)
        .with_context(|| format!("Failed to load config from {:?}", args.config))?;
    if let Some(data_dir) = args.data_dir {
        config.storage.data_dir = data_dir;
    }

    info!(
        config_path = %args.config.display(),
        history_path = %config.storage.history_path().display(),
        "Configuration loaded"
    );

    match args.command {
        Command::Track {
            replay,
            fix_interval_ms,
            autostart,
        } => track(config, &replay, Duration::from_millis(fix_interval_ms), autostart).await,
        Command::History { latest } => history(config, latest),
    }
}
