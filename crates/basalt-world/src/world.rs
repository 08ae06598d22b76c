use basalt_core::block::Block;
use basalt_core::constants::*;
use basalt_core::error::EngineError;
use basalt_core::types::BlockPosition;
use glam::IVec3;

use crate::chunk::Chunk;
use crate::terrain::TerrainGenerator;

/// The voxel world: a fixed WORLD_CHUNKS_X x WORLD_CHUNKS_Z grid of chunks.
/// Chunk slot for grid position (x, z) is `x * WORLD_CHUNKS_Z + z`; the
/// renderer's GPU mesh pool is addressed by the same slot.
pub struct World {
    chunks: Vec<Chunk>,
}

impl World {
    /// Generate the full chunk grid: terrain, trees, and initial meshes.
    pub fn generate(terrain: &TerrainGenerator) -> Result<Self, EngineError> {
        let mut chunks = Vec::with_capacity(WORLD_CHUNKS_X * WORLD_CHUNKS_Z);
        for x in 0..WORLD_CHUNKS_X {
            for z in 0..WORLD_CHUNKS_Z {
                let coord = IVec3::new(x as i32, 0, z as i32);
                chunks.push(Chunk::generate(coord, terrain)?);
            }
        }
        log::info!("generated {} chunks", chunks.len());
        Ok(Self { chunks })
    }

    /// Build a world from pre-made chunks (tests). Chunk order must match
    /// the slot convention.
    pub fn from_chunks(chunks: Vec<Chunk>) -> Self {
        Self { chunks }
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn chunk(&self, slot: usize) -> &Chunk {
        &self.chunks[slot]
    }

    pub fn chunk_mut(&mut self, slot: usize) -> &mut Chunk {
        &mut self.chunks[slot]
    }

    /// Resolve a world-space block coordinate to a chunk slot + local
    /// coordinate. Out-of-world positions resolve to None.
    pub fn resolve(&self, position: IVec3) -> Option<BlockPosition> {
        if position.x < 0 || position.y < 0 || position.z < 0 {
            return None;
        }
        let (x, y, z) = (position.x as usize, position.y as usize, position.z as usize);
        if y >= CHUNK_MAX_HEIGHT {
            return None;
        }

        let chunk_x = x / CHUNK_SIZE;
        let chunk_z = z / CHUNK_SIZE;
        if chunk_x >= WORLD_CHUNKS_X || chunk_z >= WORLD_CHUNKS_Z {
            return None;
        }

        Some(BlockPosition {
            chunk: chunk_x * WORLD_CHUNKS_Z + chunk_z,
            x: x % CHUNK_SIZE,
            y,
            z: z % CHUNK_SIZE,
        })
    }

    pub fn block_at(&self, position: BlockPosition) -> Block {
        self.chunks[position.chunk].block(position.x, position.y, position.z)
    }

    /// Set a block and synchronously rebuild the owning chunk's mesh.
    pub fn set_block(&mut self, position: BlockPosition, block: Block) -> Result<(), EngineError> {
        let chunk = &mut self.chunks[position.chunk];
        chunk.set_block(position.x, position.y, position.z, block);
        chunk.rebuild_mesh()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_world() -> World {
        World::generate(&TerrainGenerator::new(42)).unwrap()
    }

    #[test]
    fn test_grid_size_and_slot_convention() {
        let world = test_world();
        assert_eq!(world.chunks().len(), WORLD_CHUNKS_X * WORLD_CHUNKS_Z);
        for x in 0..WORLD_CHUNKS_X {
            for z in 0..WORLD_CHUNKS_Z {
                let slot = x * WORLD_CHUNKS_Z + z;
                assert_eq!(
                    world.chunk(slot).coord,
                    IVec3::new(x as i32, 0, z as i32)
                );
            }
        }
    }

    #[test]
    fn test_resolve_maps_world_to_local() {
        let world = test_world();
        let size = CHUNK_SIZE as i32;

        let position = world.resolve(IVec3::new(size + 3, 10, 2 * size + 7)).unwrap();
        assert_eq!(position.chunk, WORLD_CHUNKS_Z + 2);
        assert_eq!((position.x, position.y, position.z), (3, 10, 7));
    }

    #[test]
    fn test_resolve_out_of_range() {
        let world = test_world();
        let max = (WORLD_CHUNKS_X * CHUNK_SIZE) as i32;
        assert!(world.resolve(IVec3::new(-1, 0, 0)).is_none());
        assert!(world.resolve(IVec3::new(0, -1, 0)).is_none());
        assert!(world.resolve(IVec3::new(max, 0, 0)).is_none());
        assert!(world.resolve(IVec3::new(0, CHUNK_MAX_HEIGHT as i32, 0)).is_none());
        assert!(world.resolve(IVec3::new(0, 0, max)).is_none());
    }

    #[test]
    fn test_set_block_rebuilds_only_that_chunk() {
        let mut world = test_world();
        let position = world.resolve(IVec3::new(3, 3, 3)).unwrap();
        let target_revision = world.chunk(position.chunk).revision();
        let other_revision = world.chunk(position.chunk + 1).revision();

        world.set_block(position, Block::Air).unwrap();
        assert_eq!(world.chunk(position.chunk).revision(), target_revision + 1);
        assert_eq!(world.chunk(position.chunk + 1).revision(), other_revision);
        assert_eq!(world.block_at(position), Block::Air);
    }
}
