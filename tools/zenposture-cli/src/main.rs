//! ZenPosture CLI: command-line interface for posture monitoring.
//!
//! Usage:
//!   zenposture replay <FRAMES>        Score a recorded session deterministically
//!   zenposture watch <FRAMES>         Run the monitor in real time
//!   zenposture score <FRAMES>         Print features and raw score per frame
//!   zenposture stats <SESSION_LOG>    Daily posture statistics
//!   zenposture check-model <WEIGHTS>  Load and sanity-check model weights
//!   zenposture init-config            Write the default configuration file

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

use commands::MonitorArgs;

#[derive(Parser)]
#[command(
    name = "zenposture",
    about = "Posture monitoring from pose keypoints",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay recorded frames on a virtual clock
    Replay {
        /// Recorded frames (JSONL)
        frames: PathBuf,

        #[command(flatten)]
        monitor: MonitorArgs,

        /// Write a session log to this path
        #[arg(long)]
        session_log: Option<PathBuf>,

        /// Add to an existing session log instead of replacing it
        #[arg(long, requires = "session_log")]
        append: bool,

        /// Print only alerts and the summary
        #[arg(long)]
        alerts_only: bool,
    },

    /// Run the monitor in real time over recorded frames (Ctrl+C to stop)
    Watch {
        /// Recorded frames (JSONL)
        frames: PathBuf,

        #[command(flatten)]
        monitor: MonitorArgs,

        /// Do not write a session log
        #[arg(long)]
        no_log: bool,
    },

    /// Print the feature vector and raw score of every frame
    Score {
        /// Recorded frames (JSONL)
        frames: PathBuf,

        #[command(flatten)]
        monitor: MonitorArgs,

        /// Emit one JSON object per frame
        #[arg(long)]
        json: bool,
    },

    /// Show daily statistics from session logs
    Stats {
        /// Session log file or directory of logs
        path: PathBuf,

        /// Day to summarize (YYYY-MM-DD); all days when omitted
        #[arg(long)]
        date: Option<chrono::NaiveDate>,

        /// Emit JSON
        #[arg(long)]
        json: bool,
    },

    /// Load model weights and score reference poses
    CheckModel {
        /// Exported weights (JSON)
        weights: PathBuf,
    },

    /// Write the default configuration file
    InitConfig {
        /// Destination (defaults to the standard config location)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging from the standard config; --verbose overrides the level
    let mut logging = zenposture_common::config::AppConfig::load().logging;
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    zenposture_common::logging::init_logging(&logging);

    match cli.command {
        Commands::Replay {
            frames,
            monitor,
            session_log,
            append,
            alerts_only,
        } => commands::replay::run(frames, monitor, session_log, append, alerts_only),
        Commands::Watch {
            frames,
            monitor,
            no_log,
        } => commands::watch::run(frames, monitor, !no_log).await,
        Commands::Score {
            frames,
            monitor,
            json,
        } => commands::score::run(frames, monitor, json),
        Commands::Stats { path, date, json } => commands::stats::run(path, date, json),
        Commands::CheckModel { weights } => commands::check_model::run(weights),
        Commands::InitConfig { output, force } => commands::init_config::run(output, force),
    }
}
