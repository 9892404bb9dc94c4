//! blockworld - headless driver for the deterministic voxel world simulation.
//!
//! Builds the demo level, steps tiles and entities, renders one frame per
//! step into an in-memory batch sink and reports what happened.

mod config;
mod demo;
mod headless;

use anyhow::Result;
use clap::Parser;
use config::{SimulationConfig, DEFAULT_CONFIG_PATH};
use headless::HeadlessOptions;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Run the blockworld simulation headless", long_about = None)]
struct Args {
    /// TOML config file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    /// Simulation steps to run
    #[arg(long, default_value_t = 200)]
    ticks: u64,
    /// World seed (overrides the config file)
    #[arg(long)]
    seed: Option<u64>,
    /// Wandering entities to spawn (overrides the config file)
    #[arg(long)]
    entities: Option<usize>,
    /// Write the run metrics report here
    #[arg(long)]
    metrics_out: Option<PathBuf>,
    /// Write per-chunk mesh metrics here
    #[arg(long)]
    mesh_metrics_out: Option<PathBuf>,
    /// Write a JSONL event log here
    #[arg(long)]
    events_out: Option<PathBuf>,
    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&args.log_level)),
        )
        .init();

    info!("Starting blockworld v{}", env!("CARGO_PKG_VERSION"));

    let mut config = SimulationConfig::load_from_path(&args.config);
    if let Some(seed) = args.seed {
        config.level.seed = seed;
    }
    if let Some(entities) = args.entities {
        config.entities = entities;
    }

    let report = headless::run(HeadlessOptions {
        config,
        ticks: args.ticks,
        metrics_out: args.metrics_out,
        mesh_metrics_out: args.mesh_metrics_out,
        events_out: args.events_out,
    })?;

    if let Some(sim) = &report.simulation {
        info!(
            ticks = sim.ticks,
            processed = sim.scheduled_processed,
            stale = sim.scheduled_stale,
            random = sim.random_updates,
            pending = sim.pending_at_end,
            "simulation summary"
        );
    }
    if let Some(render) = &report.rendering {
        info!(
            frames = render.frames,
            rebuilt = render.chunks_rebuilt,
            quads = render.quads_emitted,
            visible_chunks = render.avg_visible_chunks,
            "render summary"
        );
    }
    Ok(())
}
