pub mod camera;
pub mod framebuffer;
pub mod light;
pub mod mesh;
pub mod passes;
pub mod renderer;
pub mod scene;
pub mod texture;
pub mod uniforms;

pub use camera::Camera;
pub use framebuffer::{DepthSettings, Framebuffer, FramebufferDesc};
pub use light::DirectionalLight;
pub use mesh::{GpuMesh, Vertex};
pub use renderer::Renderer;
pub use scene::{CloudSettings, Entity, Material, Scene, Sprite, TexturedMesh, Transform, Water};
pub use texture::Texture;
