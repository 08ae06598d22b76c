//! Single source of truth for shared constants. Chunk extents are used by
//! both Rust and WGSL; the render crate injects them into shader preambles.

/// Side length of a chunk in blocks (x and z).
pub const CHUNK_SIZE: usize = 32;

/// Vertical extent of a chunk in blocks.
pub const CHUNK_MAX_HEIGHT: usize = 256;

/// Total blocks per chunk.
pub const BLOCKS_PER_CHUNK: usize = CHUNK_SIZE * CHUNK_MAX_HEIGHT * CHUNK_SIZE;

/// World extent in chunks along x.
pub const WORLD_CHUNKS_X: usize = 4;

/// World extent in chunks along z.
pub const WORLD_CHUNKS_Z: usize = 4;

/// Texture atlas edge length in pixels.
pub const ATLAS_SIZE_PX: u32 = 256;

/// Atlas cell edge length in pixels.
pub const ATLAS_CELL_PX: u32 = 16;

/// Atlas cells per row/column.
pub const ATLAS_CELLS: u32 = ATLAS_SIZE_PX / ATLAS_CELL_PX;

/// Shadow map edge length in texels.
pub const SHADOWMAP_SIZE: u32 = 2048;

/// Trees placed per chunk during terrain generation.
pub const TREES_PER_CHUNK: usize = 4;

/// Trunk height of a generated tree, in blocks.
pub const TREE_TRUNK_HEIGHT: usize = 5;

/// Maximum world-space distance of the block-edit ray march.
pub const RAYCAST_MAX_DISTANCE: f32 = 100.0;

/// Sub-voxel increments per world unit during the ray march.
pub const RAYCAST_STEPS_PER_UNIT: u32 = 10;

/// SSAO hemisphere kernel size. Mirrored by `kernel` in ssao.wgsl.
pub const SSAO_KERNEL_SIZE: usize = 16;

/// SSAO rotation noise texture edge length in texels.
pub const SSAO_NOISE_SIZE: u32 = 4;

/// Blur pass pairs applied to the bloom image. Each pair is one horizontal
/// plus one vertical pass, so 5 pairs run 10 directional passes in total.
pub const BLOOM_BLUR_PAIRS: u32 = 5;

/// Coarse Worley cloud noise volume edge length in texels.
pub const CLOUD_NOISE_SIZE: u32 = 64;

/// Detail cloud noise volume edge length in texels.
pub const CLOUD_DETAIL_NOISE_SIZE: u32 = 128;
