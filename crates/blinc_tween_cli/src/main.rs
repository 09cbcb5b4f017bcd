//! Blinc Tween CLI
//!
//! Drive tween scenes at a fixed frame rate and inspect scheduler configs.

use anyhow::{Context, Result};
use blinc_tween::{SchedulerConfig, TweenScheduler};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod scene;

use scene::Scene;

#[derive(Parser)]
#[command(name = "blinc-tween")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Blinc tween scene driver", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Tick a scene at a fixed rate and print sampled values as CSV
    Simulate {
        /// Scene file
        scene: PathBuf,

        /// Frames per second
        #[arg(long, default_value = "60")]
        fps: u32,

        /// Seconds to simulate. Defaults to running until every track completes.
        #[arg(long)]
        seconds: Option<f32>,

        /// Scheduler config file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Print a scheduler config preset as TOML
    Config {
        #[arg(short, long, value_enum, default_value = "standard")]
        preset: Preset,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Preset {
    Standard,
    HighCapacity,
    Testing,
}

impl Preset {
    fn config(self) -> SchedulerConfig {
        match self {
            Preset::Standard => SchedulerConfig::standard(),
            Preset::HighCapacity => SchedulerConfig::high_capacity(),
            Preset::Testing => SchedulerConfig::testing(),
        }
    }
}

/// Cap on frames when running until completion
const MAX_FRAMES: u64 = 60 * 60 * 10;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so the CSV on stdout stays clean
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();

    match cli.command {
        Commands::Simulate {
            scene,
            fps,
            seconds,
            config,
        } => cmd_simulate(&scene, fps, seconds, config.as_deref()),

        Commands::Config { preset } => cmd_config(preset),
    }
}

fn load_config(path: Option<&Path>) -> Result<SchedulerConfig> {
    let Some(path) = path else {
        return Ok(SchedulerConfig::standard());
    };
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    SchedulerConfig::from_toml_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

fn cmd_simulate(path: &Path, fps: u32, seconds: Option<f32>, config: Option<&Path>) -> Result<()> {
    if fps == 0 {
        anyhow::bail!("--fps must be greater than 0");
    }
    let scene = Scene::load(path)?;
    let mut scheduler = TweenScheduler::new(load_config(config)?);
    let (values, roots) = scene.spawn(&mut scheduler)?;

    let step = 1.0 / fps as f32;
    let frames = seconds.map(|s| (s.max(0.0) * fps as f32).ceil() as u64);
    info!(
        "Simulating {} tracks from {} at {} fps",
        scene.tracks.len(),
        path.display(),
        fps
    );

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    write!(out, "frame,time")?;
    for track in &scene.tracks {
        write!(out, ",{}", track.name)?;
    }
    writeln!(out)?;

    let mut frame = 0u64;
    loop {
        write!(out, "{},{:.4}", frame, frame as f32 * step)?;
        for value in &values {
            write!(out, ",{:.4}", *value.borrow())?;
        }
        writeln!(out)?;

        let done = match frames {
            Some(limit) => frame >= limit,
            None => roots.iter().all(|id| scheduler.is_complete(*id)) || frame >= MAX_FRAMES,
        };
        if done {
            break;
        }
        scheduler.tick(step, step);
        frame += 1;
    }
    out.flush()?;

    let counts = scheduler.counts();
    debug!(
        "Finished after {} frames: {} leaves, {} sequences alive",
        frame, counts.active_leaves, counts.active_sequences
    );
    Ok(())
}

fn cmd_config(preset: Preset) -> Result<()> {
    let text = preset.config().to_toml_string()?;
    print!("{}", text);
    Ok(())
}
