//! Chunk mesh generation: per-voxel face culling against a single chunk's
//! block grid. A face is emitted iff the neighbor in that direction is Air
//! or outside the chunk — neighboring chunks are never consulted, so
//! chunk-boundary faces are always drawn. No greedy meshing or LOD.

use basalt_core::block::{texture_coords_for_block, Block};
use basalt_core::constants::{CHUNK_MAX_HEIGHT, CHUNK_SIZE};
use basalt_core::error::EngineError;

use crate::chunk::block_index;

/// One chunk mesh vertex. Matches the vertex layout in geometry.wgsl.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ChunkVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
    pub normal: [f32; 3],
}

/// CPU-side triangle mesh. Uploaded wholesale by the renderer; a rebuild
/// replaces the whole mesh, never patches buffers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<ChunkVertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Number of emitted quad faces.
    pub fn face_count(&self) -> usize {
        self.indices.len() / 6
    }
}

/// Face order: +Y, -Y, -X, +X, -Z, +Z. The top-face atlas flag applies to
/// face 0 only.
const FACE_OFFSETS: [[i32; 3]; 6] = [
    [0, 1, 0],
    [0, -1, 0],
    [-1, 0, 0],
    [1, 0, 0],
    [0, 0, -1],
    [0, 0, 1],
];

const FACE_NORMALS: [[f32; 3]; 6] = [
    [0.0, 1.0, 0.0],
    [0.0, -1.0, 0.0],
    [-1.0, 0.0, 0.0],
    [1.0, 0.0, 0.0],
    [0.0, 0.0, -1.0],
    [0.0, 0.0, 1.0],
];

/// Unit-cube corner offsets per face, wound counter-clockwise seen from
/// outside the cube.
const FACE_VERTICES: [[[f32; 3]; 4]; 6] = [
    // +Y
    [
        [0.5, 0.5, 0.5],
        [0.5, 0.5, -0.5],
        [-0.5, 0.5, -0.5],
        [-0.5, 0.5, 0.5],
    ],
    // -Y
    [
        [0.5, -0.5, 0.5],
        [-0.5, -0.5, 0.5],
        [-0.5, -0.5, -0.5],
        [0.5, -0.5, -0.5],
    ],
    // -X
    [
        [-0.5, 0.5, 0.5],
        [-0.5, 0.5, -0.5],
        [-0.5, -0.5, -0.5],
        [-0.5, -0.5, 0.5],
    ],
    // +X
    [
        [0.5, 0.5, 0.5],
        [0.5, -0.5, 0.5],
        [0.5, -0.5, -0.5],
        [0.5, 0.5, -0.5],
    ],
    // -Z
    [
        [0.5, 0.5, -0.5],
        [0.5, -0.5, -0.5],
        [-0.5, -0.5, -0.5],
        [-0.5, 0.5, -0.5],
    ],
    // +Z
    [
        [0.5, 0.5, 0.5],
        [-0.5, 0.5, 0.5],
        [-0.5, -0.5, 0.5],
        [0.5, -0.5, 0.5],
    ],
];

/// Two triangles per face, indexing the 4 face vertices.
const FACE_INDICES: [u32; 6] = [0, 1, 3, 1, 2, 3];

/// Quad-corner positions inside the face's atlas rectangle, matching
/// FACE_VERTICES order.
const FACE_UV_CORNERS: [[f32; 2]; 4] = [[1.0, 1.0], [1.0, 0.0], [0.0, 0.0], [0.0, 1.0]];

fn is_solid(blocks: &[Block], x: i32, y: i32, z: i32) -> bool {
    if x < 0 || y < 0 || z < 0 {
        return false;
    }
    let (x, y, z) = (x as usize, y as usize, z as usize);
    if x >= CHUNK_SIZE || y >= CHUNK_MAX_HEIGHT || z >= CHUNK_SIZE {
        return false;
    }
    blocks[block_index(x, y, z)].is_solid()
}

/// Generate the triangle mesh for a chunk's block grid.
///
/// Output ordering is the (x, y, z) scan order crossed with the fixed face
/// order, which makes repeated generation of the same grid byte-identical.
pub fn generate_mesh(blocks: &[Block]) -> Result<MeshData, EngineError> {
    debug_assert_eq!(blocks.len(), basalt_core::constants::BLOCKS_PER_CHUNK);

    let mut mesh = MeshData::default();
    let mut faces = 0u32;

    for x in 0..CHUNK_SIZE {
        for y in 0..CHUNK_MAX_HEIGHT {
            for z in 0..CHUNK_SIZE {
                let block = blocks[block_index(x, y, z)];
                if !block.is_solid() {
                    continue;
                }

                for (face, offset) in FACE_OFFSETS.iter().enumerate() {
                    let nx = x as i32 + offset[0];
                    let ny = y as i32 + offset[1];
                    let nz = z as i32 + offset[2];
                    if is_solid(blocks, nx, ny, nz) {
                        continue;
                    }

                    let rect = texture_coords_for_block(block, face == 0)?;
                    for (corner, uv) in FACE_VERTICES[face].iter().zip(FACE_UV_CORNERS) {
                        mesh.vertices.push(ChunkVertex {
                            position: [
                                corner[0] + x as f32,
                                corner[1] + y as f32,
                                corner[2] + z as f32,
                            ],
                            uv: [
                                rect.min[0] + uv[0] * (rect.max[0] - rect.min[0]),
                                rect.min[1] + uv[1] * (rect.max[1] - rect.min[1]),
                            ],
                            normal: FACE_NORMALS[face],
                        });
                    }
                    for index in FACE_INDICES {
                        mesh.indices.push(index + faces * 4);
                    }
                    faces += 1;
                }
            }
        }
    }

    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use basalt_core::constants::BLOCKS_PER_CHUNK;

    fn empty_grid() -> Vec<Block> {
        vec![Block::Air; BLOCKS_PER_CHUNK]
    }

    #[test]
    fn test_empty_grid_emits_nothing() {
        let mesh = generate_mesh(&empty_grid()).unwrap();
        assert!(mesh.vertices.is_empty());
        assert!(mesh.indices.is_empty());
    }

    #[test]
    fn test_single_block_emits_six_faces() {
        let mut blocks = empty_grid();
        blocks[block_index(0, 0, 0)] = Block::Grass;
        let mesh = generate_mesh(&blocks).unwrap();
        assert_eq!(mesh.face_count(), 6);
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.indices.len(), 36);
    }

    #[test]
    fn test_indices_reference_valid_vertices() {
        let mut blocks = empty_grid();
        blocks[block_index(3, 4, 5)] = Block::Stone;
        blocks[block_index(3, 5, 5)] = Block::Stone;
        let mesh = generate_mesh(&blocks).unwrap();
        let max = *mesh.indices.iter().max().unwrap() as usize;
        assert!(max < mesh.vertices.len());
    }

    #[test]
    fn test_adjacent_blocks_cull_shared_faces() {
        let mut blocks = empty_grid();
        blocks[block_index(1, 1, 1)] = Block::Dirt;
        blocks[block_index(2, 1, 1)] = Block::Dirt;
        let mesh = generate_mesh(&blocks).unwrap();
        // Two cubes sharing one face: 12 faces minus the 2 hidden ones.
        assert_eq!(mesh.face_count(), 10);
    }

    #[test]
    fn test_face_count_matches_exposure_count() {
        let mut blocks = empty_grid();
        // 3x3x3 solid cube at the origin corner
        for x in 0..3 {
            for y in 0..3 {
                for z in 0..3 {
                    blocks[block_index(x, y, z)] = Block::Stone;
                }
            }
        }
        let mesh = generate_mesh(&blocks).unwrap();

        let mut expected = 0;
        for x in 0..CHUNK_SIZE {
            for y in 0..CHUNK_MAX_HEIGHT {
                for z in 0..CHUNK_SIZE {
                    if !blocks[block_index(x, y, z)].is_solid() {
                        continue;
                    }
                    for offset in FACE_OFFSETS {
                        if !is_solid(
                            &blocks,
                            x as i32 + offset[0],
                            y as i32 + offset[1],
                            z as i32 + offset[2],
                        ) {
                            expected += 1;
                        }
                    }
                }
            }
        }
        assert_eq!(mesh.face_count(), expected);
        // 3x3x3 cube: 9 exposed faces per side * 6 sides
        assert_eq!(expected, 54);
    }

    #[test]
    fn test_chunk_edge_faces_always_emitted() {
        let mut blocks = empty_grid();
        let edge = CHUNK_SIZE - 1;
        blocks[block_index(edge, 0, edge)] = Block::Sand;
        let mesh = generate_mesh(&blocks).unwrap();
        // No cross-chunk occlusion: all 6 faces present even at the corner.
        assert_eq!(mesh.face_count(), 6);
    }

    #[test]
    fn test_grass_top_face_uses_top_atlas_cell() {
        let mut blocks = empty_grid();
        blocks[block_index(0, 0, 0)] = Block::Grass;
        let mesh = generate_mesh(&blocks).unwrap();

        let top_rect = texture_coords_for_block(Block::Grass, true).unwrap();
        let side_rect = texture_coords_for_block(Block::Grass, false).unwrap();

        // First 4 vertices belong to the +Y face.
        for vertex in &mesh.vertices[0..4] {
            assert!(vertex.uv[0] >= top_rect.min[0] && vertex.uv[0] <= top_rect.max[0]);
        }
        // The remaining faces use the side cell.
        for vertex in &mesh.vertices[4..8] {
            assert!(vertex.uv[0] >= side_rect.min[0] && vertex.uv[0] <= side_rect.max[0]);
        }
    }

    #[test]
    fn test_generation_is_deterministic() {
        let mut blocks = empty_grid();
        for x in 0..8 {
            for z in 0..8 {
                blocks[block_index(x, 0, z)] = Block::Stone;
            }
        }
        let a = generate_mesh(&blocks).unwrap();
        let b = generate_mesh(&blocks).unwrap();
        assert_eq!(a, b);
    }
}
