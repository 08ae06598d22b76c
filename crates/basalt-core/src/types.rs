use glam::IVec3;

/// Chunk coordinate in chunk-space (each unit = CHUNK_SIZE blocks on x/z).
/// The y component is always zero; chunks span the full world height.
pub type ChunkCoord = IVec3;

/// A resolved reference into a chunk's block array, produced by the
/// block-edit ray march. Never stored across frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockPosition {
    /// Index into the world's chunk list.
    pub chunk: usize,
    pub x: usize,
    pub y: usize,
    pub z: usize,
}
