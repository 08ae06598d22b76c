use basalt_core::block::Block;
use basalt_core::constants::{BLOCKS_PER_CHUNK, CHUNK_MAX_HEIGHT, CHUNK_SIZE};
use basalt_core::error::EngineError;
use basalt_core::types::ChunkCoord;
use glam::Vec3;

use crate::mesher::{self, MeshData};
use crate::terrain::TerrainGenerator;

/// Flat index into a chunk's block array.
#[inline]
pub fn block_index(x: usize, y: usize, z: usize) -> usize {
    debug_assert!(x < CHUNK_SIZE && y < CHUNK_MAX_HEIGHT && z < CHUNK_SIZE);
    (y * CHUNK_SIZE + z) * CHUNK_SIZE + x
}

/// A fixed-size cuboid region of the voxel world with its own mesh.
///
/// The mesh is a valid triangulation of the current block array at all
/// times, except transiently between a `set_block` and the matching
/// `rebuild_mesh` call. The renderer keeps GPU meshes in a pool indexed by
/// chunk slot and re-uploads whenever `revision` advances.
pub struct Chunk {
    pub coord: ChunkCoord,
    blocks: Box<[Block]>,
    mesh: MeshData,
    revision: u64,
}

impl Chunk {
    /// Generate terrain and the initial mesh for a chunk.
    pub fn generate(coord: ChunkCoord, terrain: &TerrainGenerator) -> Result<Self, EngineError> {
        let origin = coord * CHUNK_SIZE as i32;
        let blocks = terrain.generate_blocks(origin);
        debug_assert_eq!(blocks.len(), BLOCKS_PER_CHUNK);
        let mesh = mesher::generate_mesh(&blocks)?;
        Ok(Self {
            coord,
            blocks,
            mesh,
            revision: 1,
        })
    }

    /// Build a chunk from an explicit block grid (tests, tools).
    pub fn from_blocks(coord: ChunkCoord, blocks: Box<[Block]>) -> Result<Self, EngineError> {
        assert_eq!(blocks.len(), BLOCKS_PER_CHUNK);
        let mesh = mesher::generate_mesh(&blocks)?;
        Ok(Self {
            coord,
            blocks,
            mesh,
            revision: 1,
        })
    }

    pub fn block(&self, x: usize, y: usize, z: usize) -> Block {
        self.blocks[block_index(x, y, z)]
    }

    /// Mutate a block. The mesh is stale until `rebuild_mesh` runs; callers
    /// must rebuild before the chunk is next drawn.
    pub fn set_block(&mut self, x: usize, y: usize, z: usize, block: Block) {
        self.blocks[block_index(x, y, z)] = block;
    }

    /// Regenerate the mesh from the current block array, replacing the old
    /// mesh wholesale and advancing the revision counter.
    pub fn rebuild_mesh(&mut self) -> Result<(), EngineError> {
        self.mesh = mesher::generate_mesh(&self.blocks)?;
        self.revision += 1;
        Ok(())
    }

    pub fn mesh(&self) -> &MeshData {
        &self.mesh
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// World-space translation of this chunk's mesh.
    pub fn world_offset(&self) -> Vec3 {
        Vec3::new(
            (self.coord.x * CHUNK_SIZE as i32) as f32,
            (self.coord.y * CHUNK_SIZE as i32) as f32,
            (self.coord.z * CHUNK_SIZE as i32) as f32,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::IVec3;

    fn single_block_chunk() -> Chunk {
        let mut blocks = vec![Block::Air; BLOCKS_PER_CHUNK].into_boxed_slice();
        blocks[block_index(4, 10, 4)] = Block::Stone;
        Chunk::from_blocks(IVec3::ZERO, blocks).unwrap()
    }

    #[test]
    fn test_rebuild_is_idempotent() {
        let mut chunk = single_block_chunk();
        chunk.rebuild_mesh().unwrap();
        let first = chunk.mesh().clone();
        chunk.rebuild_mesh().unwrap();
        assert_eq!(&first, chunk.mesh());
    }

    #[test]
    fn test_rebuild_advances_revision() {
        let mut chunk = single_block_chunk();
        let before = chunk.revision();
        chunk.rebuild_mesh().unwrap();
        assert_eq!(chunk.revision(), before + 1);
    }

    #[test]
    fn test_break_and_restore_round_trip() {
        let mut chunk = single_block_chunk();
        let original_faces = chunk.mesh().face_count();
        assert_eq!(original_faces, 6);

        chunk.set_block(4, 10, 4, Block::Air);
        chunk.rebuild_mesh().unwrap();
        assert_eq!(chunk.mesh().face_count(), 0);

        chunk.set_block(4, 10, 4, Block::Stone);
        chunk.rebuild_mesh().unwrap();
        assert_eq!(chunk.mesh().face_count(), original_faces);
    }

    #[test]
    fn test_breaking_interior_block_exposes_neighbors() {
        let mut blocks = vec![Block::Air; BLOCKS_PER_CHUNK].into_boxed_slice();
        // 3x3x3 solid cube centered at (5, 5, 5)
        for x in 4..7 {
            for y in 4..7 {
                for z in 4..7 {
                    blocks[block_index(x, y, z)] = Block::Dirt;
                }
            }
        }
        let mut chunk = Chunk::from_blocks(IVec3::ZERO, blocks).unwrap();
        let sealed = chunk.mesh().face_count();

        // The center block is fully occluded; removing it exposes the 6
        // inward faces of its neighbors.
        chunk.set_block(5, 5, 5, Block::Air);
        chunk.rebuild_mesh().unwrap();
        assert_eq!(chunk.mesh().face_count(), sealed + 6);
    }

    #[test]
    fn test_world_offset_scales_by_chunk_size() {
        let blocks = vec![Block::Air; BLOCKS_PER_CHUNK].into_boxed_slice();
        let chunk = Chunk::from_blocks(IVec3::new(2, 0, 3), blocks).unwrap();
        assert_eq!(chunk.world_offset(), Vec3::new(64.0, 0.0, 96.0));
    }
}
