//! Uniform-grid spatial index over an entity arena.
//!
//! The world is cut into cubic cells of [`CELL_SIZE`] units. Every live
//! entity sits in exactly one cell list and in the global order list; both
//! use swap-remove with slot fix-ups so insert, remove and relocation are
//! O(1). Entities are addressed by [`EntityId`] handles; the index owns the
//! arena and no entity refers back to it.

use crate::entity::{Entity, EntityId, IndexSlot};
use blockworld_physics::Aabb;
use glam::Vec3;
use tracing::trace;

/// Edge length of one index cell in voxel units.
pub const CELL_SIZE: f32 = 16.0;

#[derive(Debug)]
struct Slot {
    generation: u32,
    entity: Option<Entity>,
}

/// Counters from [`SpatialEntityIndex::tick_all`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickAllReport {
    /// Entities whose step ran.
    pub ticked: usize,
    /// Entities dropped because they flagged themselves removed.
    pub removed: usize,
    /// Entities that changed cell.
    pub relocated: usize,
}

/// Entity arena plus coarse grid for proximity queries.
#[derive(Debug)]
pub struct SpatialEntityIndex {
    dims: [usize; 3],
    cells: Vec<Vec<EntityId>>,
    order: Vec<EntityId>,
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl SpatialEntityIndex {
    /// Index covering a level of `[x, y, z]` voxels.
    ///
    /// Positions outside the covered range are clamped into the border cells.
    pub fn new(world_dims: [i32; 3]) -> Self {
        let dims = world_dims.map(|d| ((d.max(0) as usize) + 15) / 16).map(|n| n.max(1));
        Self {
            dims,
            cells: vec![Vec::new(); dims[0] * dims[1] * dims[2]],
            order: Vec::new(),
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Cells per axis.
    pub fn cell_dims(&self) -> [usize; 3] {
        self.dims
    }

    /// Number of live entities.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// True when no entity is indexed.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    fn axis_cell(&self, axis: usize, v: f32) -> usize {
        let c = (v / CELL_SIZE).floor();
        if c <= 0.0 {
            0
        } else {
            (c as usize).min(self.dims[axis] - 1)
        }
    }

    /// Cell coordinate that holds `position`.
    pub fn cell_of(&self, position: Vec3) -> [usize; 3] {
        [
            self.axis_cell(0, position.x),
            self.axis_cell(1, position.y),
            self.axis_cell(2, position.z),
        ]
    }

    fn linear(&self, cell: [usize; 3]) -> usize {
        (cell[2] * self.dims[1] + cell[1]) * self.dims[0] + cell[0]
    }

    fn unlinear(&self, idx: usize) -> [usize; 3] {
        let x = idx % self.dims[0];
        let y = (idx / self.dims[0]) % self.dims[1];
        let z = idx / (self.dims[0] * self.dims[1]);
        [x, y, z]
    }

    /// Add an entity and return its handle.
    ///
    /// The entity's box may reach at most [`CELL_SIZE`] past its position on
    /// any axis; larger boxes can be missed by [`query`](Self::query).
    pub fn insert(&mut self, mut entity: Entity) -> EntityId {
        debug_assert!(
            entity.half_width <= CELL_SIZE && entity.height <= CELL_SIZE,
            "entity box {}x{} exceeds the index cell size",
            entity.half_width,
            entity.height
        );
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    entity: None,
                });
                (self.slots.len() - 1) as u32
            }
        };
        let id = EntityId {
            index,
            generation: self.slots[index as usize].generation,
        };

        let cell = self.linear(self.cell_of(entity.position));
        entity.slot = Some(IndexSlot {
            cell,
            in_cell: self.cells[cell].len(),
            in_order: self.order.len(),
        });
        self.cells[cell].push(id);
        self.order.push(id);
        self.slots[index as usize].entity = Some(entity);
        id
    }

    /// Whether `id` still names a live entity.
    pub fn contains(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    /// Entity behind `id`.
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.entity.as_ref()
    }

    /// Mutable entity behind `id`.
    ///
    /// Moving the entity through this reference does not refile it; call
    /// [`SpatialEntityIndex::moved`] afterwards.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.entity.as_mut()
    }

    fn fix_slot(&mut self, id: EntityId, fix: impl FnOnce(&mut IndexSlot)) {
        let slot = self.get_mut(id).and_then(|e| e.slot.as_mut());
        debug_assert!(slot.is_some(), "index lists hold dead handle {id}");
        if let Some(slot) = slot {
            fix(slot);
        }
    }

    /// Take `id` out of cell `cell` at `in_cell`, fixing up the entity moved into its place.
    fn unlink_cell(&mut self, id: EntityId, cell: usize, in_cell: usize) {
        debug_assert_eq!(
            self.cells[cell].get(in_cell),
            Some(&id),
            "entity {id} is not where its slot says"
        );
        self.cells[cell].swap_remove(in_cell);
        if let Some(&moved) = self.cells[cell].get(in_cell) {
            self.fix_slot(moved, |slot| slot.in_cell = in_cell);
        }
    }

    /// Remove `id`, locating it through its last indexed cell.
    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        let mut entity = {
            let slot = self.slots.get_mut(id.index as usize)?;
            if slot.generation != id.generation {
                return None;
            }
            let entity = slot.entity.take()?;
            slot.generation = slot.generation.wrapping_add(1);
            entity
        };
        self.free.push(id.index);

        if let Some(at) = entity.slot.take() {
            self.unlink_cell(id, at.cell, at.in_cell);
            debug_assert_eq!(self.order.get(at.in_order), Some(&id));
            self.order.swap_remove(at.in_order);
            if let Some(&moved) = self.order.get(at.in_order) {
                self.fix_slot(moved, |slot| slot.in_order = at.in_order);
            }
        }
        Some(entity)
    }

    /// Refile `id` if its position left its indexed cell. Returns whether it moved cell.
    pub fn moved(&mut self, id: EntityId) -> bool {
        let (position, at) = match self.get(id) {
            Some(Entity {
                position,
                slot: Some(at),
                ..
            }) => (*position, *at),
            _ => return false,
        };
        let cell = self.linear(self.cell_of(position));
        if cell == at.cell {
            return false;
        }

        self.unlink_cell(id, at.cell, at.in_cell);
        let in_cell = self.cells[cell].len();
        self.cells[cell].push(id);
        self.fix_slot(id, |slot| {
            slot.cell = cell;
            slot.in_cell = in_cell;
        });
        trace!(entity = %id, from = at.cell, to = cell, "entity changed cell");
        true
    }

    /// Live entities in insertion order (disturbed only by removals).
    pub fn ids(&self) -> &[EntityId] {
        &self.order
    }

    /// Iterate `(handle, entity)` over every live entity.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Entity)> + '_ {
        self.order
            .iter()
            .filter_map(move |&id| self.get(id).map(|e| (id, e)))
    }

    /// Entities other than `exclude` whose box strictly intersects `area`.
    ///
    /// Scans the cells touched by `area` plus one cell of margin, then
    /// re-tests every candidate box exactly. Entities are binned by position,
    /// so a box wider or taller than [`CELL_SIZE`] can poke past the margin
    /// and go unreported.
    pub fn query(&self, exclude: Option<EntityId>, area: &Aabb) -> Vec<EntityId> {
        let lo = self.cell_of(area.min);
        let hi = self.cell_of(area.max);
        let mut found = Vec::new();
        for z in lo[2].saturating_sub(1)..=(hi[2] + 1).min(self.dims[2] - 1) {
            for y in lo[1].saturating_sub(1)..=(hi[1] + 1).min(self.dims[1] - 1) {
                for x in lo[0].saturating_sub(1)..=(hi[0] + 1).min(self.dims[0] - 1) {
                    for &id in &self.cells[self.linear([x, y, z])] {
                        if Some(id) == exclude {
                            continue;
                        }
                        if self.get(id).is_some_and(|e| e.bb.intersects(area)) {
                            found.push(id);
                        }
                    }
                }
            }
        }
        found
    }

    /// Non-empty cells with their bounds.
    pub fn occupied_cells(&self) -> impl Iterator<Item = (Aabb, &[EntityId])> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, ids)| !ids.is_empty())
            .map(move |(idx, ids)| {
                let [x, y, z] = self.unlinear(idx);
                let min = Vec3::new(x as f32, y as f32, z as f32) * CELL_SIZE;
                (Aabb::new(min, min + Vec3::splat(CELL_SIZE)), ids.as_slice())
            })
    }

    /// Run `step` once for every entity alive at the start of the call.
    ///
    /// Steps may remove or spawn entities; spawned ones wait for the next
    /// call. Entities flagged removed are dropped after their step, the rest
    /// are refiled with [`SpatialEntityIndex::moved`].
    pub fn tick_all(&mut self, mut step: impl FnMut(&mut Self, EntityId)) -> TickAllReport {
        let snapshot = self.order.clone();
        let mut report = TickAllReport::default();
        for id in snapshot {
            if !self.contains(id) {
                continue;
            }
            step(self, id);
            report.ticked += 1;
            match self.get(id) {
                Some(e) if e.is_removed() => {
                    self.remove(id);
                    report.removed += 1;
                }
                Some(_) => {
                    if self.moved(id) {
                        report.relocated += 1;
                    }
                }
                None => report.removed += 1,
            }
        }
        report
    }

    /// Check that every entity is filed exactly where its slot says and
    /// that the cell matches its last refiled position.
    pub fn is_consistent(&self) -> bool {
        let filed: usize = self.cells.iter().map(Vec::len).sum();
        if filed != self.order.len() {
            return false;
        }
        self.order.iter().enumerate().all(|(pos, &id)| {
            let Some(at) = self.get(id).and_then(|e| e.slot) else {
                return false;
            };
            at.in_order == pos && self.cells[at.cell].get(at.in_cell) == Some(&id)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(x: f32, y: f32, z: f32) -> Entity {
        Entity::new(Vec3::new(x, y, z), 0.3, 1.8)
    }

    #[test]
    fn dims_round_up_and_never_hit_zero() {
        assert_eq!(SpatialEntityIndex::new([64, 40, 0]).cell_dims(), [4, 3, 1]);
    }

    #[test]
    fn insert_and_query() {
        let mut index = SpatialEntityIndex::new([64, 64, 64]);
        let a = index.insert(at(5.0, 5.0, 5.0));
        let b = index.insert(at(40.0, 5.0, 5.0));
        let area = Aabb::from_bounds(4.0, 4.0, 4.0, 6.0, 6.0, 6.0);
        assert_eq!(index.query(None, &area), vec![a]);
        assert!(index.query(Some(a), &area).is_empty());
        assert_eq!(index.len(), 2);
        assert!(index.contains(b));
        assert!(index.is_consistent());
    }

    #[test]
    fn query_catches_boxes_straddling_a_cell_border() {
        let mut index = SpatialEntityIndex::new([64, 64, 64]);
        let id = index.insert(at(15.9, 0.0, 1.0));
        let area = Aabb::from_bounds(16.0, 0.0, 0.0, 17.0, 1.0, 2.0);
        assert_eq!(index.query(None, &area), vec![id]);
    }

    #[test]
    fn cell_sized_box_is_found_at_its_far_corner() {
        let mut index = SpatialEntityIndex::new([64, 64, 64]);
        let id = index.insert(Entity::new(Vec3::new(15.5, 0.0, 15.5), CELL_SIZE, CELL_SIZE));
        let area = Aabb::from_bounds(31.0, 15.0, 31.0, 31.4, 15.4, 31.4);
        assert_eq!(index.query(None, &area), vec![id]);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "exceeds the index cell size")]
    fn oversized_box_is_rejected() {
        let mut index = SpatialEntityIndex::new([64, 64, 64]);
        index.insert(Entity::new(Vec3::new(8.0, 0.0, 8.0), CELL_SIZE + 1.0, 1.8));
    }

    #[test]
    fn moved_is_a_noop_inside_a_cell() {
        let mut index = SpatialEntityIndex::new([64, 64, 64]);
        let id = index.insert(at(1.0, 1.0, 1.0));
        index.get_mut(id).unwrap().set_position(Vec3::new(15.0, 2.0, 3.0));
        assert!(!index.moved(id));
        index.get_mut(id).unwrap().set_position(Vec3::new(16.0, 2.0, 3.0));
        assert!(index.moved(id));
        assert_eq!(index.get(id).unwrap().slot.unwrap().cell, index.linear([1, 0, 0]));
        assert!(index.is_consistent());
    }

    #[test]
    fn remove_uses_last_indexed_cell() {
        let mut index = SpatialEntityIndex::new([64, 64, 64]);
        let a = index.insert(at(1.0, 1.0, 1.0));
        let b = index.insert(at(2.0, 1.0, 1.0));
        index.get_mut(a).unwrap().set_position(Vec3::new(50.0, 50.0, 50.0));
        assert!(index.remove(a).is_some());
        assert!(index.remove(a).is_none());
        assert!(index.is_consistent());
        assert_eq!(index.ids(), &[b]);
    }

    #[test]
    fn stale_handles_die_when_slot_is_reused() {
        let mut index = SpatialEntityIndex::new([32, 32, 32]);
        let a = index.insert(at(1.0, 1.0, 1.0));
        index.remove(a);
        let b = index.insert(at(1.0, 1.0, 1.0));
        assert_eq!(a.index(), b.index());
        assert!(index.get(a).is_none());
        assert!(index.get(b).is_some());
    }

    #[test]
    fn out_of_range_positions_clamp_to_border_cells() {
        let index = SpatialEntityIndex::new([32, 32, 32]);
        assert_eq!(index.cell_of(Vec3::new(-5.0, 100.0, 31.9)), [0, 1, 1]);
    }

    #[test]
    fn tick_all_tolerates_self_removal_and_spawns() {
        let mut index = SpatialEntityIndex::new([64, 64, 64]);
        let ids: Vec<_> = (0..6).map(|i| index.insert(at(i as f32 * 10.0, 1.0, 1.0))).collect();
        let report = index.tick_all(|index, id| {
            let e = index.get_mut(id).unwrap();
            if id.index() % 2 == 0 {
                e.remove();
            } else {
                let p = e.position + Vec3::new(0.0, 0.0, 20.0);
                e.set_position(p);
            }
            if id.index() == 1 {
                index.insert(at(3.0, 3.0, 3.0));
            }
        });
        assert_eq!(report.ticked, 6);
        assert_eq!(report.removed, 3);
        assert_eq!(report.relocated, 3);
        assert_eq!(index.len(), 4);
        assert!(!index.contains(ids[0]));
        assert!(index.contains(ids[1]));
        assert!(index.is_consistent());
    }
}
