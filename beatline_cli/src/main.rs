use std::path::{Path, PathBuf};

use anyhow::Context;
use beatline_core::chart::loader::{load_key_log_from_path, KeyLog};
use beatline_core::config::{Difficulty, GameConfig};
use clap::{Args, Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::EnvFilter;

mod play;
mod simulate;

#[derive(Debug, Parser)]
#[command(name = "beatline")]
#[command(about = "Four-lane rhythm game engine", long_about = None)]
struct Cli {
    /// Show debug logs.
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse a key log and report what would be skipped.
    Check { keylog: PathBuf },
    /// Run a session headless on simulated time and print the summary as JSON.
    Simulate {
        #[command(flatten)]
        session: SessionArgs,
        /// Press every note as it crosses its line.
        #[arg(long)]
        autoplay: bool,
    },
    /// Play in the terminal: type d/f/j/k and Enter to hit, p/r to pause/resume, q to quit.
    Play {
        #[command(flatten)]
        session: SessionArgs,
        /// Track name handed to the audio backend.
        #[arg(long)]
        music: Option<String>,
    },
}

#[derive(Debug, Args)]
struct SessionArgs {
    keylog: PathBuf,
    #[arg(short, long)]
    difficulty: Option<Difficulty>,
    /// JSON game config. Flags override its values.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Judge presses on the two-stage worker pipeline.
    #[arg(long)]
    pipeline: bool,
    /// Seed for gravity timing and lane patterns.
    #[arg(long)]
    seed: Option<u64>,
    /// Draw lanes from weighted patterns instead of the key log.
    #[arg(long)]
    pattern: bool,
}

impl SessionArgs {
    fn game_config(&self) -> anyhow::Result<GameConfig> {
        let mut config = match &self.config {
            Some(path) => GameConfig::load_from_path(path)?,
            None => GameConfig::default(),
        };
        if let Some(difficulty) = self.difficulty {
            config.difficulty = difficulty;
        }
        if self.pipeline {
            config.pipeline.enabled = true;
        }
        if let Some(seed) = self.seed {
            config.gravity.seed = Some(seed);
            config.pattern_seed = Some(seed);
        }
        if self.pattern {
            config.pattern_mode = true;
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Check { keylog } => {
            let log = load_key_log(&keylog)?;
            println!("events: {}", log.stream.len());
            println!("notes: {}", log.stream.note_count());
            println!("skipped: {}", log.skipped.len());
            for err in &log.skipped {
                println!("  {err}");
            }
        }
        Command::Simulate { session, autoplay } => {
            let config = session.game_config()?;
            let log = load_key_log(&session.keylog)?;
            let summary = simulate::run_simulation(config, log.stream, autoplay)?;
            let json = serde_json::to_string_pretty(&summary).context("failed to serialize summary")?;
            println!("{json}");
        }
        Command::Play { session, music } => {
            let mut config = session.game_config()?;
            if music.is_some() {
                config.music_track = music;
            }
            let log = load_key_log(&session.keylog)?;
            let summary = play::run_interactive(config, log.stream)?;
            let json = serde_json::to_string_pretty(&summary).context("failed to serialize summary")?;
            println!("{json}");
        }
    }

    Ok(())
}

fn load_key_log(path: &Path) -> anyhow::Result<KeyLog> {
    let log = load_key_log_from_path(path)
        .with_context(|| format!("failed to load key log: {}", path.display()))?;
    for err in &log.skipped {
        warn!("{err}");
    }
    Ok(log)
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("beatline=debug,beatline_core=debug,warn")
        } else {
            EnvFilter::new("beatline=info,beatline_core=info,warn")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
