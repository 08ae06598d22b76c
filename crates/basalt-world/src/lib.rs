pub mod chunk;
pub mod mesher;
pub mod raycast;
pub mod terrain;
pub mod world;

pub use chunk::Chunk;
pub use mesher::{ChunkVertex, MeshData};
pub use raycast::RayHit;
pub use terrain::TerrainGenerator;
pub use world::World;
