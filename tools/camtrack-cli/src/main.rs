//! CamTrack CLI: frame recorded or synthetic detection streams.
//!
//! Usage:
//!   camtrack replay <FILE>    Run the framing loop over a recorded detection stream
//!   camtrack simulate         Run the framing loop over a synthetic jittery subject
//!   camtrack config           Show or initialize the configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

use commands::TuningArgs;

#[derive(Parser)]
#[command(
    name = "camtrack",
    about = "Smooth, aspect-locked auto-framing from noisy subject detections",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to $XDG_CONFIG_HOME/camtrack/config.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Frame a recorded detection stream (JSONL) and emit crop records
    Replay {
        /// Path to the detection stream
        path: PathBuf,

        /// Write crop records here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Include the crop-to-output affine transform in each record
        #[arg(long)]
        transform: bool,

        #[command(flatten)]
        tuning: TuningArgs,
    },

    /// Frame a synthetic subject with positional jitter and dropped detections
    Simulate {
        /// Number of ticks to run
        #[arg(long, default_value = "600")]
        ticks: u64,

        /// RNG seed
        #[arg(long, default_value = "7")]
        seed: u64,

        /// Subject rectangle in scene pixels: x,y,width,height
        #[arg(long, value_delimiter = ',', default_value = "600,400,100,100")]
        subject: Vec<f64>,

        /// Maximum positional jitter per tick (pixels)
        #[arg(long, default_value = "8.0")]
        jitter: f64,

        /// Probability that a tick has no detection [0.0, 1.0]
        #[arg(long, default_value = "0.1")]
        dropout: f64,

        /// Print every Nth tick
        #[arg(long, default_value = "30")]
        every: u64,

        /// Write the synthetic detections to this file for later replay
        #[arg(long)]
        record: Option<PathBuf>,

        #[command(flatten)]
        tuning: TuningArgs,
    },

    /// Print the effective configuration
    Config {
        /// Write the default configuration to the config path
        #[arg(long)]
        init: bool,

        /// Overwrite an existing file with --init
        #[arg(long)]
        force: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let allow_missing = matches!(cli.command, Commands::Config { init: true, .. });
    let mut config = commands::load_config(cli.config.as_deref(), allow_missing)?;
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    camtrack_common::logging::init_logging(&config.logging);

    match cli.command {
        Commands::Replay {
            path,
            output,
            transform,
            tuning,
        } => {
            tuning.apply(&mut config.tuning);
            commands::replay::run(&config, path, output, transform)
        }
        Commands::Simulate {
            ticks,
            seed,
            subject,
            jitter,
            dropout,
            every,
            record,
            tuning,
        } => {
            tuning.apply(&mut config.tuning);
            let subject = commands::simulate::subject_rect(&subject)?;
            commands::simulate::run(
                &config,
                commands::simulate::SimulateOptions {
                    ticks,
                    seed,
                    subject,
                    jitter,
                    dropout,
                    every,
                    record,
                },
            )
        }
        Commands::Config { init, force } => {
            commands::config::run(&config, cli.config.as_deref(), init, force)
        }
    }
}
