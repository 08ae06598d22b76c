use basalt_core::block::Block;
use basalt_core::constants::*;
use basalt_core::rng::FrameRng;
use glam::IVec3;

use crate::chunk::block_index;

/// Sand fills every cell below this height.
const SAND_LEVEL: usize = 5;

/// Column heights are clamped to this range, keeping the sand layer fully
/// buried and leaving room for tree canopies below the chunk ceiling.
const MIN_HEIGHT: usize = 7;
const MAX_HEIGHT: usize = 96;

/// Base terrain elevation before noise displacement.
const BASE_HEIGHT: f64 = 24.0;

/// World-space noise frequency for the heightmap.
const NOISE_FREQUENCY: f64 = 0.02;

/// Heightmap terrain generator using 2D simplex noise, plus tree placement.
///
/// Heights are deterministic for a fixed seed; tree placement draws from an
/// unseeded clock-derived source, so repeated generation of the same chunk
/// coordinate is not reproducible.
pub struct TerrainGenerator {
    /// Permutation table for simplex noise (doubled for wrapping).
    perm: [u8; 512],
}

impl TerrainGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            perm: Self::build_permutation(seed),
        }
    }

    /// Generate the block grid for a chunk whose minimum corner sits at
    /// `chunk_origin` in world-space block coordinates.
    pub fn generate_blocks(&self, chunk_origin: IVec3) -> Box<[Block]> {
        self.generate_blocks_with_rng(chunk_origin, &mut FrameRng::from_entropy())
    }

    /// Same as `generate_blocks` with an explicit tree-placement source.
    pub fn generate_blocks_with_rng(
        &self,
        chunk_origin: IVec3,
        rng: &mut FrameRng,
    ) -> Box<[Block]> {
        let mut blocks = vec![Block::Air; BLOCKS_PER_CHUNK].into_boxed_slice();

        for x in 0..CHUNK_SIZE {
            for z in 0..CHUNK_SIZE {
                let wx = chunk_origin.x + x as i32;
                let wz = chunk_origin.z + z as i32;
                let height = self.column_height(wx, wz);

                for y in 0..height {
                    let block = if y < SAND_LEVEL {
                        Block::Sand
                    } else if y == height - 1 {
                        Block::Grass
                    } else {
                        Block::Dirt
                    };
                    blocks[block_index(x, y, z)] = block;
                }
            }
        }

        self.place_trees(chunk_origin, &mut blocks, rng);
        blocks
    }

    /// Terrain height for a world-space column, clamped to
    /// [MIN_HEIGHT, MAX_HEIGHT].
    pub fn column_height(&self, wx: i32, wz: i32) -> usize {
        let x = wx as f64 * NOISE_FREQUENCY;
        let z = wz as f64 * NOISE_FREQUENCY;

        // 3 octaves, amplitude ~14 blocks
        let mut h = 0.0f64;
        h += self.simplex2d(x, z) * 8.0;
        h += self.simplex2d(x * 2.0 + 100.0, z * 2.0 + 100.0) * 4.0;
        h += self.simplex2d(x * 4.0 + 200.0, z * 4.0 + 200.0) * 2.0;

        let height = (BASE_HEIGHT + h).round() as i64;
        height.clamp(MIN_HEIGHT as i64, MAX_HEIGHT as i64) as usize
    }

    /// Place TREES_PER_CHUNK trees at random columns: a Wood trunk on the
    /// surface plus a 3x3 Leaves canopy on the top two trunk layers.
    fn place_trees(&self, chunk_origin: IVec3, blocks: &mut [Block], rng: &mut FrameRng) {
        for _ in 0..TREES_PER_CHUNK {
            // Keep the canopy inside this chunk's grid.
            let x = 1 + rng.next_below(CHUNK_SIZE - 2);
            let z = 1 + rng.next_below(CHUNK_SIZE - 2);

            let surface =
                self.column_height(chunk_origin.x + x as i32, chunk_origin.z + z as i32);
            let top = surface + TREE_TRUNK_HEIGHT;
            if top + 1 >= CHUNK_MAX_HEIGHT {
                continue;
            }

            for y in surface..top {
                blocks[block_index(x, y, z)] = Block::Wood;
            }

            // Canopy on the top two trunk layers, trunk cell kept as Wood.
            for layer in [top - 2, top - 1] {
                for dx in -1i32..=1 {
                    for dz in -1i32..=1 {
                        let cx = (x as i32 + dx) as usize;
                        let cz = (z as i32 + dz) as usize;
                        let index = block_index(cx, layer, cz);
                        if blocks[index] == Block::Air {
                            blocks[index] = Block::Leaves;
                        }
                    }
                }
            }
            blocks[block_index(x, top, z)] = Block::Leaves;
        }
    }

    /// 2D simplex noise in [-1, 1].
    fn simplex2d(&self, x: f64, z: f64) -> f64 {
        const SQRT3: f64 = 1.7320508075688772;
        const F2: f64 = 0.5 * (SQRT3 - 1.0);
        const G2: f64 = (3.0 - SQRT3) / 6.0;

        let s = (x + z) * F2;
        let i = (x + s).floor();
        let j = (z + s).floor();

        let t = (i + j) * G2;
        let x0 = x - (i - t);
        let y0 = z - (j - t);

        let (i1, j1) = if x0 > y0 { (1.0, 0.0) } else { (0.0, 1.0) };

        let x1 = x0 - i1 + G2;
        let y1 = y0 - j1 + G2;
        let x2 = x0 - 1.0 + 2.0 * G2;
        let y2 = y0 - 1.0 + 2.0 * G2;

        let ii = (i as i32 & 255) as usize;
        let jj = (j as i32 & 255) as usize;

        let gi0 = self.perm[ii + self.perm[jj] as usize] as usize % 12;
        let gi1 = self.perm[ii + i1 as usize + self.perm[jj + j1 as usize] as usize] as usize % 12;
        let gi2 = self.perm[ii + 1 + self.perm[jj + 1] as usize] as usize % 12;

        let n0 = Self::corner_contribution(gi0, x0, y0);
        let n1 = Self::corner_contribution(gi1, x1, y1);
        let n2 = Self::corner_contribution(gi2, x2, y2);

        70.0 * (n0 + n1 + n2)
    }

    fn corner_contribution(gi: usize, x: f64, y: f64) -> f64 {
        let t = 0.5 - x * x - y * y;
        if t < 0.0 {
            0.0
        } else {
            let t = t * t;
            t * t * Self::grad2d(gi, x, y)
        }
    }

    fn grad2d(hash: usize, x: f64, y: f64) -> f64 {
        const GRAD: [[f64; 2]; 12] = [
            [1.0, 1.0],
            [-1.0, 1.0],
            [1.0, -1.0],
            [-1.0, -1.0],
            [1.0, 0.0],
            [-1.0, 0.0],
            [0.0, 1.0],
            [0.0, -1.0],
            [1.0, 1.0],
            [-1.0, 1.0],
            [1.0, -1.0],
            [-1.0, -1.0],
        ];
        let g = &GRAD[hash % 12];
        g[0] * x + g[1] * y
    }

    fn build_permutation(seed: u64) -> [u8; 512] {
        let mut p: [u8; 256] = [0; 256];
        for (i, val) in p.iter_mut().enumerate() {
            *val = i as u8;
        }

        // Fisher-Yates shuffle with seed
        let mut rng = seed;
        for i in (1..256).rev() {
            rng = rng
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            let j = (rng >> 33) as usize % (i + 1);
            p.swap(i, j);
        }

        let mut perm = [0u8; 512];
        for (i, val) in perm.iter_mut().enumerate() {
            *val = p[i & 255];
        }
        perm
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column_has_tree(blocks: &[Block], x: usize, z: usize) -> bool {
        (0..CHUNK_MAX_HEIGHT).any(|y| {
            matches!(
                blocks[block_index(x, y, z)],
                Block::Wood | Block::Leaves
            )
        })
    }

    #[test]
    fn test_heights_deterministic_for_seed() {
        let a = TerrainGenerator::new(42);
        let b = TerrainGenerator::new(42);
        for wx in -50..50 {
            assert_eq!(a.column_height(wx, wx * 3), b.column_height(wx, wx * 3));
        }
    }

    #[test]
    fn test_heights_in_valid_range() {
        let gen = TerrainGenerator::new(42);
        for wx in -200..200 {
            for wz in [-31, 0, 17] {
                let h = gen.column_height(wx, wz);
                assert!(h >= 1 && h < CHUNK_MAX_HEIGHT - 1, "height {h} out of range");
            }
        }
    }

    #[test]
    fn test_column_materials() {
        let gen = TerrainGenerator::new(42);
        let mut rng = FrameRng::from_seed(1);
        let blocks = gen.generate_blocks_with_rng(IVec3::new(64, 0, 64), &mut rng);

        for x in 0..CHUNK_SIZE {
            for z in 0..CHUNK_SIZE {
                // Sand below the sand level
                for y in 0..SAND_LEVEL {
                    assert_eq!(blocks[block_index(x, y, z)], Block::Sand);
                }

                if column_has_tree(&blocks, x, z) {
                    continue;
                }

                // Topmost filled cell of a tree-less column is Grass
                let top = (0..CHUNK_MAX_HEIGHT)
                    .rev()
                    .find(|&y| blocks[block_index(x, y, z)].is_solid())
                    .expect("column should not be empty");
                assert_eq!(blocks[block_index(x, top, z)], Block::Grass);

                // Dirt in between
                let height = gen.column_height(64 + x as i32, 64 + z as i32);
                for y in SAND_LEVEL..height - 1 {
                    assert_eq!(blocks[block_index(x, y, z)], Block::Dirt);
                }
            }
        }
    }

    #[test]
    fn test_trees_have_trunk_and_canopy() {
        let gen = TerrainGenerator::new(7);
        let mut rng = FrameRng::from_seed(5);
        let blocks = gen.generate_blocks_with_rng(IVec3::ZERO, &mut rng);

        let wood = blocks.iter().filter(|b| **b == Block::Wood).count();
        let leaves = blocks.iter().filter(|b| **b == Block::Leaves).count();
        assert!(wood > 0, "expected at least one trunk");
        assert!(leaves > wood, "canopy should outnumber trunk blocks");
    }

    #[test]
    fn test_different_seeds_differ() {
        let a = TerrainGenerator::new(1);
        let b = TerrainGenerator::new(2);
        let differs = (-100..100).any(|wx| a.column_height(wx, 0) != b.column_height(wx, 0));
        assert!(differs);
    }
}
