//! The spatial index must agree with a brute-force scan.

use blockworld_physics::Aabb;
use blockworld_world::{Entity, EntityId, SpatialEntityIndex};
use glam::Vec3;
use proptest::prelude::*;
use rand::{rngs::StdRng, Rng, SeedableRng};

const WORLD: [i32; 3] = [128, 64, 128];

fn random_point(rng: &mut StdRng) -> Vec3 {
    Vec3::new(
        rng.gen_range(-8.0..136.0),
        rng.gen_range(-8.0..72.0),
        rng.gen_range(-8.0..136.0),
    )
}

fn random_box(rng: &mut StdRng) -> Aabb {
    let min = random_point(rng);
    let size = Vec3::new(
        rng.gen_range(0.1..24.0),
        rng.gen_range(0.1..24.0),
        rng.gen_range(0.1..24.0),
    );
    Aabb::new(min, min + size)
}

fn brute_force(index: &SpatialEntityIndex, exclude: Option<EntityId>, area: &Aabb) -> Vec<EntityId> {
    let mut ids: Vec<_> = index
        .iter()
        .filter(|(id, e)| Some(*id) != exclude && e.bb.intersects(area))
        .map(|(id, _)| id)
        .collect();
    ids.sort();
    ids
}

fn sorted(mut ids: Vec<EntityId>) -> Vec<EntityId> {
    ids.sort();
    ids
}

#[test]
fn thousand_entities_match_brute_force() {
    let mut rng = StdRng::seed_from_u64(0x1DE5);
    let mut index = SpatialEntityIndex::new(WORLD);
    let ids: Vec<_> = (0..1000)
        .map(|_| {
            let hw = rng.gen_range(0.2..1.5);
            let h = rng.gen_range(0.5..3.0);
            index.insert(Entity::new(random_point(&mut rng), hw, h))
        })
        .collect();

    // Move a third of them, some across cells, and refile.
    for &id in ids.iter().step_by(3) {
        let delta = Vec3::new(
            rng.gen_range(-20.0..20.0),
            rng.gen_range(-20.0..20.0),
            rng.gen_range(-20.0..20.0),
        );
        let e = index.get_mut(id).unwrap();
        let p = e.position + delta;
        e.set_position(p);
        index.moved(id);
    }
    // Remove some without refiling first.
    for &id in ids.iter().skip(1).step_by(7) {
        let e = index.get_mut(id).unwrap();
        let p = e.position + Vec3::splat(17.0);
        e.set_position(p);
        assert!(index.remove(id).is_some());
    }
    assert!(index.is_consistent());

    for round in 0..100 {
        let area = random_box(&mut rng);
        let exclude = (round % 4 == 0).then(|| index.ids()[round % index.len()]);
        assert_eq!(
            sorted(index.query(exclude, &area)),
            brute_force(&index, exclude, &area),
            "query {round} over {area:?}"
        );
    }
}

#[test]
fn cell_boundaries_at_16_and_32() {
    let mut index = SpatialEntityIndex::new(WORLD);
    let id = index.insert(Entity::new(Vec3::new(15.5, 1.0, 1.0), 0.3, 1.8));

    let place = |index: &mut SpatialEntityIndex, x: f32| {
        index.get_mut(id).unwrap().set_position(Vec3::new(x, 1.0, 1.0));
        index.moved(id)
    };
    assert!(place(&mut index, 16.0), "16.0 starts cell 1");
    assert!(!place(&mut index, 31.999), "31.999 is still cell 1");
    assert!(place(&mut index, 32.0), "32.0 starts cell 2");
    assert!(!place(&mut index, 32.5));
    assert_eq!(index.cell_of(Vec3::new(32.0, 1.0, 1.0)), [2, 0, 0]);
    assert!(index.is_consistent());

    let area = Aabb::from_bounds(31.0, 0.0, 0.0, 32.1, 2.0, 2.0);
    assert_eq!(index.query(None, &area), vec![id]);
}

#[test]
fn tick_all_keeps_index_consistent_under_churn() {
    let mut rng = StdRng::seed_from_u64(9);
    let mut index = SpatialEntityIndex::new(WORLD);
    for _ in 0..200 {
        index.insert(Entity::new(random_point(&mut rng), 0.3, 1.8));
    }
    for tick in 0..50u32 {
        index.tick_all(|index, id| {
            let e = index.get_mut(id).unwrap();
            if (id.index() + tick) % 37 == 0 {
                e.remove();
                return;
            }
            let p = e.position + Vec3::new(1.5, 0.0, -1.0);
            e.set_position(p);
        });
        assert!(index.is_consistent(), "tick {tick}");
    }
    for (id, e) in index.iter() {
        assert!(index.query(None, &e.bb).contains(&id));
    }
}

proptest! {
    #[test]
    fn query_equals_brute_force(
        seed in any::<u64>(),
        count in 1usize..200,
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut index = SpatialEntityIndex::new(WORLD);
        for _ in 0..count {
            index.insert(Entity::new(random_point(&mut rng), 0.5, 1.0));
        }
        for _ in 0..10 {
            let area = random_box(&mut rng);
            prop_assert_eq!(sorted(index.query(None, &area)), brute_force(&index, None, &area));
        }
    }
}
