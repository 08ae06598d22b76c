//! Block-edit ray march: a discrete DDA-like approximation stepping in
//! fixed sub-voxel increments. Edge cases at chunk boundaries and diagonal
//! voxel crossings are not guaranteed exact; positions that leave the world
//! resolve to "no block" and the march continues.

use basalt_core::block::Block;
use basalt_core::constants::{RAYCAST_MAX_DISTANCE, RAYCAST_STEPS_PER_UNIT};
use basalt_core::error::EngineError;
use basalt_core::types::BlockPosition;
use glam::Vec3;

use crate::world::World;

/// Result of a successful march: the first solid block hit, plus the last
/// air position sampled before it (the placement cell).
#[derive(Debug, Clone, Copy)]
pub struct RayHit {
    pub position: BlockPosition,
    pub previous: Option<BlockPosition>,
}

/// March from `origin` along `direction` until a solid block is found or
/// the maximum distance is exhausted.
pub fn march(world: &World, origin: Vec3, direction: Vec3) -> Option<RayHit> {
    let direction = direction.normalize_or_zero();
    if direction == Vec3::ZERO {
        return None;
    }

    let steps = (RAYCAST_MAX_DISTANCE * RAYCAST_STEPS_PER_UNIT as f32) as u32;
    let step_size = 1.0 / RAYCAST_STEPS_PER_UNIT as f32;
    let mut previous: Option<BlockPosition> = None;

    for step in 0..steps {
        let point = origin + direction * (step as f32 * step_size);
        // Round to the nearest integer world coordinate.
        let rounded = (point + Vec3::splat(0.5)).floor().as_ivec3();

        let Some(position) = world.resolve(rounded) else {
            continue;
        };

        if world.block_at(position).is_solid() {
            return Some(RayHit { position, previous });
        }
        previous = Some(position);
    }

    None
}

/// Break the first solid block along the ray, rebuilding its chunk's mesh.
/// Returns the edited position, or None when nothing was hit.
pub fn break_block(
    world: &mut World,
    origin: Vec3,
    direction: Vec3,
) -> Result<Option<BlockPosition>, EngineError> {
    match march(world, origin, direction) {
        Some(hit) => {
            world.set_block(hit.position, Block::Air)?;
            Ok(Some(hit.position))
        }
        None => Ok(None),
    }
}

/// Place `block` in the air cell sampled just before the first solid hit,
/// rebuilding that cell's chunk mesh. Returns the edited position, or None
/// when nothing was hit or the ray started inside geometry.
pub fn place_block(
    world: &mut World,
    origin: Vec3,
    direction: Vec3,
    block: Block,
) -> Result<Option<BlockPosition>, EngineError> {
    match march(world, origin, direction) {
        Some(RayHit {
            previous: Some(cell),
            ..
        }) => {
            world.set_block(cell, block)?;
            Ok(Some(cell))
        }
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::TerrainGenerator;
    use basalt_core::constants::{CHUNK_SIZE, WORLD_CHUNKS_Z};

    fn test_world() -> World {
        World::generate(&TerrainGenerator::new(42)).unwrap()
    }

    #[test]
    fn test_straight_down_hits_chunk_below_camera() {
        let world = test_world();

        // Camera above the middle of chunk (2, 1), looking straight down.
        let (chunk_x, chunk_z) = (2, 1);
        let origin = Vec3::new(
            (chunk_x * CHUNK_SIZE + CHUNK_SIZE / 2) as f32,
            200.0,
            (chunk_z * CHUNK_SIZE + CHUNK_SIZE / 2) as f32,
        );
        let hit = march(&world, origin, Vec3::NEG_Y).expect("terrain below camera");

        assert_eq!(hit.position.chunk, chunk_x * WORLD_CHUNKS_Z + chunk_z);
        // The cell above the hit must be air, ready for placement.
        let above = hit.previous.expect("air cell above the surface");
        assert!(!world.block_at(above).is_solid());
        assert_eq!(above.chunk, hit.position.chunk);
    }

    #[test]
    fn test_break_reduces_single_chunk_face_count() {
        let mut world = test_world();
        let origin = Vec3::new(16.0, 200.0, 16.0);

        let slot = march(&world, origin, Vec3::NEG_Y).unwrap().position.chunk;
        let before = world.chunk(slot).mesh().face_count();
        let untouched: Vec<usize> = (0..world.chunks().len())
            .filter(|s| *s != slot)
            .map(|s| world.chunk(s).mesh().face_count())
            .collect();

        let edited = break_block(&mut world, origin, Vec3::NEG_Y).unwrap();
        assert!(edited.is_some());
        assert!(
            world.chunk(slot).mesh().face_count() < before,
            "breaking a surface block must reduce the face count"
        );

        let after: Vec<usize> = (0..world.chunks().len())
            .filter(|s| *s != slot)
            .map(|s| world.chunk(s).mesh().face_count())
            .collect();
        assert_eq!(untouched, after, "other chunks must be untouched");
    }

    #[test]
    fn test_place_fills_cell_above_surface() {
        let mut world = test_world();
        let origin = Vec3::new(40.0, 200.0, 40.0);

        let placed = place_block(&mut world, origin, Vec3::NEG_Y, Block::Stone)
            .unwrap()
            .expect("placement cell");
        assert_eq!(world.block_at(placed), Block::Stone);
    }

    #[test]
    fn test_miss_returns_none() {
        let world = test_world();
        // Looking straight up from above the terrain.
        let hit = march(&world, Vec3::new(16.0, 200.0, 16.0), Vec3::Y);
        assert!(hit.is_none());
    }

    #[test]
    fn test_ray_leaving_world_is_not_an_error() {
        let mut world = test_world();
        let edited = break_block(&mut world, Vec3::new(-500.0, 10.0, -500.0), Vec3::NEG_X)
            .unwrap();
        assert!(edited.is_none());
    }

    #[test]
    fn test_zero_direction_is_rejected() {
        let world = test_world();
        assert!(march(&world, Vec3::new(16.0, 200.0, 16.0), Vec3::ZERO).is_none());
    }
}
