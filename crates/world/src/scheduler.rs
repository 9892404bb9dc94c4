//! Delayed tile-update queue.
//!
//! Events are ordered by due tick, then by scheduling order. Each event
//! remembers the tile id it was scheduled for; the level discards it on pop
//! when the cell holds something else by then, so the queue never needs a
//! cancel operation.

use blockworld_core::{SimTick, TileId, TilePos};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// A pending update for the tile at `pos`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledTick {
    /// Cell to update.
    pub pos: TilePos,
    /// Tile id the cell must still hold when the event fires.
    pub tile: TileId,
    /// Tick at which the event becomes eligible.
    pub due: SimTick,
}

/// FIFO-within-tick scheduler for tile updates.
#[derive(Debug, Default, Clone)]
pub struct TickScheduler {
    queue: BTreeMap<(SimTick, u64), ScheduledTick>,
    pending: HashSet<(TilePos, TileId)>,
    next_seq: u64,
}

impl TickScheduler {
    /// Empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an update for `tile` at `pos`, eligible `delay` ticks after the
    /// tick following `now`.
    ///
    /// Returns `false` when an identical (pos, tile) event is already pending.
    pub fn schedule(&mut self, pos: TilePos, tile: TileId, now: SimTick, delay: u32) -> bool {
        if !self.pending.insert((pos, tile)) {
            return false;
        }
        let due = now.advance(1 + u64::from(delay));
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.insert((due, seq), ScheduledTick { pos, tile, due });
        true
    }

    /// Remove and return events due at or before `now`, oldest first.
    ///
    /// At most `limit` events are returned when a limit is given; the rest
    /// stay queued in order.
    pub fn drain_due(&mut self, now: SimTick, limit: Option<usize>) -> Vec<ScheduledTick> {
        let mut out = Vec::new();
        while limit.map_or(true, |max| out.len() < max) {
            let Some(entry) = self.queue.first_entry() else {
                break;
            };
            if entry.key().0 > now {
                break;
            }
            let event = entry.remove();
            self.pending.remove(&(event.pos, event.tile));
            out.push(event);
        }
        out
    }

    /// Whether an event for (pos, tile) is queued.
    pub fn is_scheduled(&self, pos: TilePos, tile: TileId) -> bool {
        self.pending.contains(&(pos, tile))
    }

    /// Number of queued events.
    pub fn pending_count(&self) -> usize {
        self.queue.len()
    }

    /// True when nothing is queued.
    pub fn is_idle(&self) -> bool {
        self.queue.is_empty()
    }

    /// Due tick of the earliest event.
    pub fn next_due(&self) -> Option<SimTick> {
        self.queue.keys().next().map(|(due, _)| *due)
    }

    /// Drop every queued event.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.pending.clear();
    }
}
