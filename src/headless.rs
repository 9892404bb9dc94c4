//! Headless run of the demo level with one render frame per tick.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use blockworld_core::{scoped_rng, SimTick};
use blockworld_render::{Camera, ChunkMeshStat, FrameDriver, FrameReport, MemoryBatchSink};
use blockworld_testkit::{
    EntityMetrics, EventRecord, ExecutionMetrics, JsonlSink, MetricsReport, MetricsReportBuilder,
    MetricsSink, RenderMetrics, RunResult, SimulationMetrics,
};
use blockworld_world::{move_entity_with_collision, Level, SpatialEntityIndex, StepReport};
use glam::Vec3;
use rand::Rng;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::SimulationConfig;
use crate::demo;

const GRAVITY: f32 = 0.08;
const WALK_SPEED: f32 = 0.2;

pub struct HeadlessOptions {
    pub config: SimulationConfig,
    pub ticks: u64,
    pub metrics_out: Option<PathBuf>,
    pub mesh_metrics_out: Option<PathBuf>,
    pub events_out: Option<PathBuf>,
}

/// Level, entities and renderer stepped together.
pub struct Simulation {
    pub level: Level,
    pub entities: SpatialEntityIndex,
    pub driver: FrameDriver,
    pub sink: MemoryBatchSink,
    pub camera: Camera,
    seed: u64,
    tick: SimTick,
}

#[derive(Debug, Serialize)]
struct FrameEvent {
    rebuilt: usize,
    visible_chunks: usize,
    visible_entities: usize,
    opaque_batches: usize,
    translucent_batches: usize,
    pending: usize,
}

impl Simulation {
    pub fn new(config: &SimulationConfig) -> Result<Self> {
        let level = demo::build_level(config.world, config.level.clone())?;
        let mut entities = SpatialEntityIndex::new(level.dims());
        demo::spawn_walkers(&mut entities, config.world, config.entities, config.level.seed);
        let driver = FrameDriver::new(&level, config.render.clone());
        let camera = Camera::looking_at(
            Vec3::from_array(config.camera.position),
            Vec3::from_array(config.camera.target),
            config.camera.aspect,
        );
        Ok(Self {
            level,
            entities,
            driver,
            sink: MemoryBatchSink::new(),
            camera,
            seed: config.level.seed,
            tick: SimTick::ZERO,
        })
    }

    /// Advance tiles and entities by one step.
    pub fn step(&mut self) -> (StepReport, usize) {
        let report = self.level.step();
        let (seed, tick) = (self.seed, self.tick);
        let level = &self.level;
        let moved = self.entities.tick_all(|index, id| {
            let mut rng = scoped_rng(seed, u64::from(id.index()), tick);
            let Some(e) = index.get_mut(id) else {
                return;
            };
            e.begin_tick();
            e.velocity.y -= GRAVITY;
            if e.on_ground {
                e.velocity.x = rng.gen_range(-WALK_SPEED..WALK_SPEED);
                e.velocity.z = rng.gen_range(-WALK_SPEED..WALK_SPEED);
            }
            let delta = e.velocity;
            move_entity_with_collision(level, index, id, delta);
        });
        self.tick = self.tick.advance(1);
        (report, moved.relocated)
    }

    /// Render one frame from the configured camera.
    pub fn frame(&mut self) -> FrameReport {
        self.driver
            .frame(&mut self.level, &self.entities, &self.camera, &mut self.sink)
    }
}

/// Run the demo for `options.ticks` steps with one frame per step.
pub fn run(options: HeadlessOptions) -> Result<MetricsReport> {
    let started = Instant::now();
    let mut sim = Simulation::new(&options.config)?;
    let mut events = match &options.events_out {
        Some(path) => Some(
            JsonlSink::create(path).with_context(|| format!("creating event log {}", path.display()))?,
        ),
        None => None,
    };

    let mut simulation = SimulationMetrics::default();
    let mut entities = EntityMetrics {
        spawned: sim.entities.len(),
        ..EntityMetrics::default()
    };
    let mut rendering = RenderMetrics::default();
    let mut latest_meshes: BTreeMap<_, ChunkMeshStat> = BTreeMap::new();
    let (mut visible_chunks, mut visible_entities) = (0usize, 0usize);
    let (mut step_time, mut frame_time) = (0f64, 0f64);

    for _ in 0..options.ticks {
        let t0 = Instant::now();
        let (step, relocated) = sim.step();
        let t1 = Instant::now();
        let frame = sim.frame();
        frame_time += t1.elapsed().as_secs_f64();
        step_time += (t1 - t0).as_secs_f64();

        simulation.ticks += 1;
        simulation.scheduled_processed += step.processed;
        simulation.scheduled_stale += step.stale;
        simulation.random_updates += step.random_updates;
        entities.cell_changes += relocated;
        entities.steps += sim.entities.len();
        rendering.frames += 1;
        visible_chunks += frame.visible_chunks;
        visible_entities += frame.visible_entities.len();
        for stat in &frame.rebuilt {
            latest_meshes.insert((stat.coord, stat.pass.index()), stat.clone());
        }

        if let Some(sink) = events.as_mut() {
            let payload = serde_json::to_string(&step)?;
            sink.write(&EventRecord {
                tick: step.tick,
                kind: "step",
                payload: &payload,
            })?;
            let payload = serde_json::to_string(&FrameEvent {
                rebuilt: frame.rebuilt.len(),
                visible_chunks: frame.visible_chunks,
                visible_entities: frame.visible_entities.len(),
                opaque_batches: frame.opaque.len(),
                translucent_batches: frame.translucent.len(),
                pending: frame.pending,
            })?;
            sink.write(&EventRecord {
                tick: step.tick,
                kind: "frame",
                payload: &payload,
            })?;
        }
        debug!(tick = step.tick.0, processed = step.processed, pending = step.pending, "step");
    }
    if let Some(sink) = events.as_mut() {
        sink.flush()?;
    }

    simulation.pending_at_end = sim.level.scheduler().pending_count();
    entities.alive = sim.entities.len();
    let counters = sim.driver.cache().counters();
    rendering.chunks_rebuilt = counters.chunks_rebuilt as usize;
    rendering.quads_emitted = counters.quads_emitted as usize;
    rendering.batches_uploaded = counters.batches_uploaded as usize;
    if rendering.frames > 0 {
        rendering.avg_visible_chunks = visible_chunks as f64 / rendering.frames as f64;
        rendering.avg_visible_entities = visible_entities as f64 / rendering.frames as f64;
    }
    let per_tick_us = |total: f64| (options.ticks > 0).then(|| total * 1e6 / options.ticks as f64);
    let report = MetricsReportBuilder::new("blockworld-demo")
        .result(RunResult::Pass)
        .simulation(simulation)
        .entities(entities)
        .rendering(rendering)
        .execution(ExecutionMetrics {
            duration_seconds: started.elapsed().as_secs_f64(),
            avg_step_us: per_tick_us(step_time),
            avg_frame_us: per_tick_us(frame_time),
        })
        .build();

    if let Some(path) = &options.mesh_metrics_out {
        let stats: Vec<_> = latest_meshes.into_values().collect();
        FrameDriver::write_metrics_to_file(&stats, path)
            .with_context(|| format!("writing mesh metrics {}", path.display()))?;
    }
    if let Some(path) = &options.metrics_out {
        MetricsSink::create(path)?.write(&report)?;
    }
    sim.driver.dispose(&mut sim.sink);

    info!(
        ticks = options.ticks,
        pending = sim.level.scheduler().pending_count(),
        entities = sim.entities.len(),
        "run finished"
    );
    Ok(report)
}
