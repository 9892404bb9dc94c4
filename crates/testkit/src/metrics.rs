//! Run summary exported as JSON for CI artifacts.
//!
//! A [`MetricsReport`] groups per-subsystem counters of a headless run
//! (tile simulation, entities, chunk meshing) with timing information.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

/// Top-level metrics report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsReport {
    /// Run identifier
    pub run_name: String,

    /// Timestamp when metrics were collected (RFC 3339)
    pub timestamp: String,

    /// Overall outcome
    pub result: RunResult,

    /// Tile simulation counters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub simulation: Option<SimulationMetrics>,

    /// Entity counters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entities: Option<EntityMetrics>,

    /// Chunk meshing and culling counters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rendering: Option<RenderMetrics>,

    /// Wall-clock cost of the run
    pub execution: ExecutionMetrics,
}

/// Overall outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunResult {
    /// Finished normally
    Pass,
    /// Stopped on a failed check
    Fail,
}

/// Scheduled and random tile update counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationMetrics {
    /// Steps simulated
    pub ticks: u64,

    /// Scheduled updates that ran
    pub scheduled_processed: usize,

    /// Scheduled updates dropped because the tile changed
    pub scheduled_stale: usize,

    /// Random ticks that hit a tile with random-tick behaviour
    pub random_updates: usize,

    /// Events still queued at the end
    pub pending_at_end: usize,
}

/// Entity counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMetrics {
    /// Entities spawned
    pub spawned: usize,

    /// Entities alive at the end
    pub alive: usize,

    /// Cell changes performed by the spatial index
    pub cell_changes: usize,

    /// Entity steps executed
    pub steps: usize,
}

/// Chunk meshing and culling counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderMetrics {
    /// Frames rendered
    pub frames: u64,

    /// Chunk rebuilds performed
    pub chunks_rebuilt: usize,

    /// Quads emitted over all rebuilds
    pub quads_emitted: usize,

    /// Batches uploaded over all rebuilds
    pub batches_uploaded: usize,

    /// Average visible chunks per frame
    pub avg_visible_chunks: f64,

    /// Average visible entities per frame
    pub avg_visible_entities: f64,
}

/// Wall-clock cost of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionMetrics {
    /// Total duration (seconds)
    pub duration_seconds: f64,

    /// Average simulation step (microseconds)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_step_us: Option<f64>,

    /// Average frame (microseconds)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_frame_us: Option<f64>,
}

/// Builder for [`MetricsReport`].
pub struct MetricsReportBuilder {
    report: MetricsReport,
}

impl MetricsReportBuilder {
    /// Start a report stamped with the current time.
    pub fn new(run_name: impl Into<String>) -> Self {
        Self {
            report: MetricsReport {
                run_name: run_name.into(),
                timestamp: chrono::Utc::now().to_rfc3339(),
                result: RunResult::Pass,
                simulation: None,
                entities: None,
                rendering: None,
                execution: ExecutionMetrics::default(),
            },
        }
    }

    /// Set the outcome
    pub fn result(mut self, result: RunResult) -> Self {
        self.report.result = result;
        self
    }

    /// Set simulation metrics
    pub fn simulation(mut self, metrics: SimulationMetrics) -> Self {
        self.report.simulation = Some(metrics);
        self
    }

    /// Set entity metrics
    pub fn entities(mut self, metrics: EntityMetrics) -> Self {
        self.report.entities = Some(metrics);
        self
    }

    /// Set render metrics
    pub fn rendering(mut self, metrics: RenderMetrics) -> Self {
        self.report.rendering = Some(metrics);
        self
    }

    /// Set execution metrics
    pub fn execution(mut self, metrics: ExecutionMetrics) -> Self {
        self.report.execution = metrics;
        self
    }

    /// Finish the report
    pub fn build(self) -> MetricsReport {
        self.report
    }
}

/// Writes metrics reports to JSON files.
pub struct MetricsSink {
    path: std::path::PathBuf,
}

impl MetricsSink {
    /// Create a sink at `path`, creating parent directories if needed.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        Ok(Self { path })
    }

    /// Write `report` as pretty JSON.
    pub fn write(&self, report: &MetricsReport) -> Result<()> {
        let json = serde_json::to_string_pretty(report)?;
        let mut file = File::create(&self.path)
            .with_context(|| format!("Failed to create {}", self.path.display()))?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn metrics_report_roundtrip() {
        let report = MetricsReportBuilder::new("demo")
            .simulation(SimulationMetrics {
                ticks: 200,
                scheduled_processed: 1_500,
                scheduled_stale: 12,
                random_updates: 40,
                pending_at_end: 3,
            })
            .execution(ExecutionMetrics {
                duration_seconds: 0.5,
                avg_step_us: Some(120.0),
                avg_frame_us: None,
            })
            .build();

        let json = serde_json::to_string_pretty(&report).unwrap();
        let parsed: MetricsReport = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.run_name, "demo");
        assert_eq!(parsed.result, RunResult::Pass);
        assert_eq!(parsed.simulation.unwrap().scheduled_stale, 12);
        assert!(parsed.rendering.is_none());
        assert!(!json.contains("avg_frame_us"));
    }

    #[test]
    fn timestamp_is_rfc3339() {
        let report = MetricsReportBuilder::new("stamp").build();
        assert!(chrono::DateTime::parse_from_rfc3339(&report.timestamp).is_ok());
    }

    #[test]
    fn metrics_sink_writes_file() {
        let path = std::env::temp_dir().join(format!(
            "blockworld-metrics-{}.json",
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        let report = MetricsReportBuilder::new("sink_test")
            .result(RunResult::Fail)
            .build();

        let sink = MetricsSink::create(&path).unwrap();
        sink.write(&report).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("sink_test"));
        assert!(contents.contains("\"result\": \"fail\""));
        fs::remove_file(&path).ok();
    }
}
