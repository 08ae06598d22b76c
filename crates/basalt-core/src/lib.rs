pub mod block;
pub mod config;
pub mod constants;
pub mod error;
pub mod rng;
pub mod types;

pub use block::{texture_coords_for_block, AtlasRect, Block};
pub use config::RenderConfig;
pub use error::EngineError;
pub use types::{BlockPosition, ChunkCoord};
