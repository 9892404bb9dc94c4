//! Deterministic run harness.
//!
//! A run steps a small simulation for a fixed number of ticks and captures a
//! serializable snapshot before the first step and after every step.
//! Determinism is checked by running the same scenario twice and comparing
//! the canonical JSON of both runs.

use crate::snapshot::{assert_json_eq, canonical_json};
use anyhow::{Context, Result};
use blockworld_core::SimTick;
use serde::Serialize;
use tracing::debug;

/// Single snapshot captured at a given tick.
#[derive(Debug, Clone, Serialize)]
pub struct RunFrame<S> {
    /// Tick number.
    pub tick: u64,
    /// Snapshot payload.
    pub snapshot: S,
}

/// Every frame of one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport<S> {
    /// Scenario name.
    pub name: String,
    /// `ticks + 1` frames, starting with the untouched state.
    pub frames: Vec<RunFrame<S>>,
}

impl<S: Serialize> RunReport<S> {
    /// Canonical JSON of the whole run.
    pub fn to_canonical_json(&self) -> Result<String> {
        canonical_json(self)
    }

    /// Snapshot after the last step.
    pub fn last(&self) -> Option<&S> {
        self.frames.last().map(|f| &f.snapshot)
    }
}

/// Step `state` `ticks` times, capturing a snapshot before the first step
/// and after each one.
pub fn run_deterministic<State, Snapshot, StepFn, SnapFn>(
    name: impl Into<String>,
    ticks: u64,
    mut state: State,
    mut step: StepFn,
    mut snapshot: SnapFn,
) -> RunReport<Snapshot>
where
    StepFn: FnMut(SimTick, &mut State),
    SnapFn: FnMut(SimTick, &State) -> Snapshot,
{
    let mut frames = Vec::with_capacity(ticks as usize + 1);
    let mut tick = SimTick::ZERO;
    frames.push(RunFrame {
        tick: tick.0,
        snapshot: snapshot(tick, &state),
    });
    for _ in 0..ticks {
        step(tick, &mut state);
        tick = tick.advance(1);
        frames.push(RunFrame {
            tick: tick.0,
            snapshot: snapshot(tick, &state),
        });
    }
    RunReport {
        name: name.into(),
        frames,
    }
}

/// Build the scenario twice with `setup`, run both, and require identical
/// canonical JSON. Returns the report of the first run.
pub fn assert_runs_match<State, Snapshot, SetupFn, StepFn, SnapFn>(
    name: &str,
    ticks: u64,
    mut setup: SetupFn,
    mut step: StepFn,
    mut snapshot: SnapFn,
) -> Result<RunReport<Snapshot>>
where
    Snapshot: Serialize,
    SetupFn: FnMut() -> State,
    StepFn: FnMut(SimTick, &mut State),
    SnapFn: FnMut(SimTick, &State) -> Snapshot,
{
    let first = run_deterministic(name, ticks, setup(), &mut step, &mut snapshot);
    let second = run_deterministic(name, ticks, setup(), &mut step, &mut snapshot);
    assert_json_eq(&first, &second).with_context(|| format!("Run `{name}` is not deterministic"))?;
    debug!(name, ticks, "deterministic run matched");
    Ok(first)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_initial_and_stepped_frames() {
        let report = run_deterministic("count", 3, 0u32, |_, n| *n += 2, |t, n| (t.0, *n));
        let values: Vec<_> = report.frames.iter().map(|f| f.snapshot).collect();
        assert_eq!(values, vec![(0, 0), (1, 2), (2, 4), (3, 6)]);
        assert_eq!(report.last(), Some(&(3, 6)));
    }

    #[test]
    fn hidden_state_breaks_determinism() {
        let mut runs = 0u32;
        let result = assert_runs_match(
            "leaky",
            2,
            || {
                runs += 1;
                runs
            },
            |_, n| *n += 1,
            |_, n| *n,
        );
        assert!(result.is_err());
    }

    #[test]
    fn pure_runs_match() {
        let report = assert_runs_match("pure", 4, || 1u64, |_, n| *n *= 3, |_, n| *n).unwrap();
        assert_eq!(report.last(), Some(&81));
    }
}
