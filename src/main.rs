//! lockwidgets - maintenance tool for the lock screen widget store
//!
//! Runs pending migrations on startup, then:
//! - backs up or restores the frame / drawer widget collections
//! - replays recorded resize drags against a stored widget

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_appender::rolling;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use lockwidgets_core::backup::BackupRestoreManager;
use lockwidgets_core::config::{state_dir, Config};
use lockwidgets_core::host::SnapshotHost;
use lockwidgets_core::input::{apply_event, Edge, ResizeEvent, ResizeTranslator, TouchInput};
use lockwidgets_core::migrations::MigrationManager;
use lockwidgets_core::store::{PrefStore, Surface};

#[derive(Parser, Debug)]
#[command(name = "lockwidgets")]
#[command(about = "Manage the lock screen widget store", long_about = None)]
struct Args {
    /// Config file (defaults to the state directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose debug output
    #[arg(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run pending migrations and report the store version
    Migrate,

    /// Write a backup of the widget collection
    Backup {
        /// Back up the drawer instead of the frame
        #[arg(long)]
        drawer: bool,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Replace the widget collection from a backup file
    Restore {
        #[arg(long)]
        drawer: bool,

        file: PathBuf,
    },

    /// Feed recorded touch events to a widget's resize handle
    Replay {
        #[arg(long)]
        drawer: bool,

        /// Widget id to resize
        #[arg(long)]
        id: i32,

        #[arg(long, value_enum)]
        edge: EdgeArg,

        /// JSON array of {"action": "down"|"move"|"up"|"cancel", "x": .., "y": ..}
        file: PathBuf,
    },

    /// Write the effective config to the config path
    InitConfig,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum EdgeArg {
    Left,
    Top,
    Right,
    Bottom,
}

impl From<EdgeArg> for Edge {
    fn from(edge: EdgeArg) -> Self {
        match edge {
            EdgeArg::Left => Edge::Left,
            EdgeArg::Top => Edge::Top,
            EdgeArg::Right => Edge::Right,
            EdgeArg::Bottom => Edge::Bottom,
        }
    }
}

fn surface(drawer: bool) -> Surface {
    if drawer {
        Surface::Drawer
    } else {
        Surface::Frame
    }
}

fn main() -> Result<()> {
    let log_dir = state_dir();
    std::fs::create_dir_all(&log_dir).ok();

    // Set up panic hook to log panics before crashing
    let crash_log = log_dir.join("crash.log");
    std::panic::set_hook(Box::new(move |panic_info| {
        eprintln!("PANIC: {}", panic_info);
        if let Ok(mut f) = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&crash_log)
        {
            use std::io::Write;
            let _ = writeln!(f, "[{}] PANIC: {}", chrono::Local::now(), panic_info);
        }
    }));

    let args = Args::parse();

    let file_appender = rolling::daily(&log_dir, "lockwidgets.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    // Quiet by default, verbose with --debug
    let default_filter = if args.debug {
        "debug,lockwidgets_core=debug"
    } else {
        "warn,lockwidgets=info,lockwidgets_core=info"
    };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    let config_path = args.config.clone().unwrap_or_else(Config::default_path);
    let config = Config::load(&config_path);
    info!(config = %config_path.display(), "lockwidgets starting");

    if let Command::InitConfig = args.command {
        config.save(&config_path)?;
        println!("{}", config_path.display());
        return Ok(());
    }

    let mut store = PrefStore::load(&config.store.prefs_path)
        .with_context(|| format!("Failed to load prefs from {:?}", config.store.prefs_path))?;
    let mut host = SnapshotHost::load(&config.store.host_snapshot_path)
        .with_context(|| format!("Failed to load widget host from {:?}", config.store.host_snapshot_path))?;

    // Migrations run before anything reads widgets
    let migrations = MigrationManager::new(config.store.database_version);
    let migrated = migrations
        .run_migrations(&mut store, &host)
        .context("Failed to save migrated prefs")?;

    match args.command {
        Command::Migrate => {
            if migrated {
                println!("migrated to version {}", store.database_version());
            } else {
                println!("already at version {}", store.database_version());
            }
        }

        Command::Backup { drawer, output } => {
            let backup = BackupRestoreManager::new(&mut store, &mut host)
                .create_backup_string(surface(drawer))?;
            match output {
                Some(path) => {
                    fs::write(&path, backup).with_context(|| format!("Failed to write {:?}", path))?;
                    info!(path = %path.display(), "Backup written");
                }
                None => println!("{}", backup),
            }
        }

        Command::Restore { drawer, file } => {
            let text = fs::read_to_string(&file).with_context(|| format!("Failed to read {:?}", file))?;
            let restored = BackupRestoreManager::new(&mut store, &mut host)
                .restore_backup_string(&text, surface(drawer));
            if !restored {
                bail!("{:?} is not a valid widget backup", file);
            }
            store.save()?;
            host.save()?;
            println!("restored {} widgets", store.widgets(surface(drawer)).len());
        }

        Command::Replay { drawer, id, edge, file } => {
            replay(&config, &mut store, surface(drawer), id, edge.into(), &file)?;
        }

        // Written before the store is opened
        Command::InitConfig => {}
    }

    Ok(())
}

fn replay(config: &Config, store: &mut PrefStore, surface: Surface, id: i32, edge: Edge, file: &Path) -> Result<()> {
    let text = fs::read_to_string(file).with_context(|| format!("Failed to read {:?}", file))?;
    let inputs: Vec<TouchInput> = serde_json::from_str(&text).context("Invalid touch event file")?;

    let mut widgets = store.widgets(surface);
    let index = widgets
        .iter()
        .position(|w| w.id == id)
        .with_context(|| format!("No widget {} in {:?}", id, surface))?;

    let cols = store.col_count(surface);
    let rows = store.row_count(surface);
    let mut translator = ResizeTranslator::new(edge, |edge| config.grid.threshold_px(surface, edge, cols, rows));

    let mut resized = false;
    for input in &inputs {
        let Some(event) = translator.handle(input) else {
            continue;
        };

        resized |= apply_event(&mut widgets[index], edge, &event, cols, rows);

        if event == ResizeEvent::Ended && resized {
            store.set_widgets(surface, &widgets)?;
            store.save()?;
            resized = false;
        }
    }

    let size = widgets[index].safe_size();
    println!("{}x{}", size.safe_width_span(), size.safe_height_span());
    Ok(())
}
