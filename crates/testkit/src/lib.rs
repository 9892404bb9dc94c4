#![warn(missing_docs)]
//! Deterministic testing surfaces: run harness, canonical snapshots,
//! event and metric sinks for headless runs.

mod determinism;
mod metrics;
mod snapshot;

use anyhow::{Context, Result};
use blockworld_core::SimTick;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

pub use determinism::*;
pub use metrics::*;
pub use snapshot::*;

/// Event record captured by headless runs.
#[derive(Debug, Serialize)]
pub struct EventRecord<'a> {
    /// Simulation tick when the event occurred.
    pub tick: SimTick,
    /// Short kind label.
    pub kind: &'a str,
    /// Free-form payload.
    pub payload: &'a str,
}

/// A sink that writes newline-delimited JSON to disk.
pub struct JsonlSink {
    out: BufWriter<File>,
}

impl JsonlSink {
    /// Create a new sink at `path`.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file =
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
        Ok(Self {
            out: BufWriter::new(file),
        })
    }

    /// Append an event to the log.
    pub fn write(&mut self, event: &EventRecord<'_>) -> Result<()> {
        serde_json::to_writer(&mut self.out, event)?;
        self.out.write_all(b"\n")?;
        Ok(())
    }

    /// Flush buffered lines to disk.
    pub fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

/// Mesh metric for one compiled chunk pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkMeshMetric {
    /// Chunk coordinates [x, y, z].
    pub chunk: [i32; 3],
    /// Render pass index (0 opaque, 1 translucent).
    pub pass: u8,
    /// Quads in the compiled pass.
    pub quads: usize,
    /// Batches the pass was split into.
    pub batches: usize,
    /// Mesh hash (hex string) for deterministic comparisons.
    pub hash: String,
}

/// Writes chunk mesh metrics to JSON for CI artifacts.
pub struct MeshMetricSink {
    file: File,
}

impl MeshMetricSink {
    /// Create a sink pointed at the supplied path, creating parent dirs if needed.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(Self {
            file: File::create(path)?,
        })
    }

    /// Persist the provided metrics as pretty JSON.
    pub fn write(&mut self, metrics: &[ChunkMeshMetric]) -> Result<()> {
        let json = serde_json::to_string_pretty(metrics)?;
        self.file.write_all(json.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_path(stem: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!(
            "{stem}-{}",
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ))
    }

    #[test]
    fn mesh_metric_sink_writes_file() {
        let path = temp_path("mesh-metrics.json");
        let metrics = vec![ChunkMeshMetric {
            chunk: [0, 1, 0],
            pass: 0,
            quads: 12,
            batches: 1,
            hash: "deadbeef".into(),
        }];
        let mut sink = MeshMetricSink::create(&path).expect("sink create");
        sink.write(&metrics).expect("write succeeds");
        let contents = fs::read_to_string(&path).expect("file readable");
        assert!(contents.contains("deadbeef"));
        assert!(contents.contains("quads"));
        fs::remove_file(&path).ok();
    }

    #[test]
    fn jsonl_sink_writes_one_line_per_event() {
        let path = temp_path("events.jsonl");
        let mut sink = JsonlSink::create(&path).unwrap();
        for tick in 0..3 {
            sink.write(&EventRecord {
                tick: SimTick(tick),
                kind: "step",
                payload: "ok",
            })
            .unwrap();
        }
        sink.flush().unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 3);
        assert!(contents.lines().all(|l| l.contains("\"kind\":\"step\"")));
        fs::remove_file(&path).ok();
    }
}
