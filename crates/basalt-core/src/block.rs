use crate::constants::{ATLAS_CELLS, ATLAS_CELL_PX, ATLAS_SIZE_PX};
use crate::error::EngineError;

/// Block material. Air is never rendered and never occludes neighbors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Block {
    #[default]
    Air = 0,
    Grass,
    Dirt,
    Stone,
    Sand,
    Wood,
    Leaves,
}

impl Block {
    /// Whether this block occludes neighboring faces and is itself meshed.
    pub fn is_solid(self) -> bool {
        self != Block::Air
    }
}

/// A UV sub-rectangle inside the terrain atlas, in [0, 1] texture space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AtlasRect {
    pub min: [f32; 2],
    pub max: [f32; 2],
}

/// Atlas cell (column, row) for a block face. Grass and Wood have distinct
/// top-face cells; every other solid block ignores the flag. Air has no cell.
fn atlas_cell(block: Block, is_top_face: bool) -> Option<(u32, u32)> {
    match (block, is_top_face) {
        (Block::Air, _) => None,
        (Block::Grass, true) => Some((0, 0)),
        (Block::Grass, false) => Some((1, 0)),
        (Block::Dirt, _) => Some((2, 0)),
        (Block::Stone, _) => Some((3, 0)),
        (Block::Sand, _) => Some((4, 0)),
        (Block::Wood, true) => Some((5, 0)),
        (Block::Wood, false) => Some((6, 0)),
        (Block::Leaves, _) => Some((7, 0)),
    }
}

/// Look up the atlas UV rectangle for a block face.
///
/// An unmapped block type is a fatal configuration error, never a silent
/// default texture.
pub fn texture_coords_for_block(
    block: Block,
    is_top_face: bool,
) -> Result<AtlasRect, EngineError> {
    let (col, row) = atlas_cell(block, is_top_face)
        .ok_or(EngineError::UnmappedBlockTexture(block))?;
    debug_assert!(col < ATLAS_CELLS && row < ATLAS_CELLS);

    // Inset by half a texel to keep samples off neighboring cells.
    let cell = ATLAS_CELL_PX as f32;
    let size = ATLAS_SIZE_PX as f32;
    let inset = 0.5 / size;

    let u0 = (col as f32 * cell) / size + inset;
    let v0 = (row as f32 * cell) / size + inset;
    let u1 = ((col + 1) as f32 * cell) / size - inset;
    let v1 = ((row + 1) as f32 * cell) / size - inset;

    Ok(AtlasRect {
        min: [u0, v0],
        max: [u1, v1],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOLID_BLOCKS: [Block; 6] = [
        Block::Grass,
        Block::Dirt,
        Block::Stone,
        Block::Sand,
        Block::Wood,
        Block::Leaves,
    ];

    #[test]
    fn test_air_is_unmapped() {
        assert!(matches!(
            texture_coords_for_block(Block::Air, false),
            Err(EngineError::UnmappedBlockTexture(Block::Air))
        ));
        assert!(texture_coords_for_block(Block::Air, true).is_err());
    }

    #[test]
    fn test_rects_strictly_inside_unit_square() {
        for block in SOLID_BLOCKS {
            for top in [false, true] {
                let rect = texture_coords_for_block(block, top).unwrap();
                assert!(rect.min[0] > 0.0 && rect.min[1] > 0.0, "{block:?}");
                assert!(rect.max[0] < 1.0 && rect.max[1] < 1.0, "{block:?}");
                assert!(rect.min[0] < rect.max[0]);
                assert!(rect.min[1] < rect.max[1]);
            }
        }
    }

    #[test]
    fn test_top_face_divergence() {
        for block in SOLID_BLOCKS {
            let top = texture_coords_for_block(block, true).unwrap();
            let side = texture_coords_for_block(block, false).unwrap();
            if block == Block::Grass || block == Block::Wood {
                assert_ne!(top, side, "{block:?} should have a distinct top face");
            } else {
                assert_eq!(top, side, "{block:?} should ignore the top-face flag");
            }
        }
    }

    #[test]
    fn test_air_is_not_solid() {
        assert!(!Block::Air.is_solid());
        for block in SOLID_BLOCKS {
            assert!(block.is_solid());
        }
    }
}
