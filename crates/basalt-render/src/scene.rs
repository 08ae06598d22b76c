use std::sync::Arc;

use basalt_core::config::RenderConfig;
use basalt_core::error::EngineError;
use glam::{Mat4, Vec3};

use crate::camera::Camera;
use crate::framebuffer::{DepthSettings, Framebuffer, FramebufferDesc};
use crate::light::DirectionalLight;
use crate::mesh::GpuMesh;
use crate::texture::Texture;

/// Position, rotation (degrees per axis), scale.
#[derive(Debug, Clone, Copy)]
pub struct Transform {
    pub position: Vec3,
    pub rotation_degrees: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation_degrees: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position)
            * Mat4::from_rotation_x(self.rotation_degrees.x.to_radians())
            * Mat4::from_rotation_y(self.rotation_degrees.y.to_radians())
            * Mat4::from_rotation_z(self.rotation_degrees.z.to_radians())
            * Mat4::from_scale(self.scale)
    }
}

/// Diffuse texture plus optional normal map.
pub struct Material {
    pub diffuse: Arc<Texture>,
    pub normal_map: Option<Arc<Texture>>,
}

pub struct TexturedMesh {
    pub mesh: Arc<GpuMesh>,
    pub material: Material,
}

/// A drawable object: one or more textured meshes under a shared transform.
pub struct Entity {
    pub meshes: Vec<TexturedMesh>,
    pub transform: Transform,
}

/// A horizontal water surface. Owns the reflection and refraction targets
/// its quad samples; surface height is the transform's y position.
pub struct Water {
    pub transform: Transform,
    pub time: f32,
    pub distortion_map: Arc<Texture>,
    pub normal_map: Arc<Texture>,
    pub reflection: Framebuffer,
    pub refraction: Framebuffer,
}

impl Water {
    pub fn new(
        device: &wgpu::Device,
        config: &RenderConfig,
        render_width: u32,
        render_height: u32,
        transform: Transform,
        distortion_map: Arc<Texture>,
        normal_map: Arc<Texture>,
    ) -> Result<Self, EngineError> {
        let desc = FramebufferDesc {
            width: scaled(render_width, config.water_resolution_scale),
            height: scaled(render_height, config.water_resolution_scale),
            depth: DepthSettings::EnableDepth,
            g_buffer: false,
            single_channel: false,
        };
        Ok(Self {
            transform,
            time: 0.0,
            distortion_map,
            normal_map,
            reflection: Framebuffer::new(device, "water.reflection", &desc)?,
            refraction: Framebuffer::new(device, "water.refraction", &desc)?,
        })
    }

    pub fn surface_height(&self) -> f32 {
        self.transform.position.y
    }

    pub fn resize(
        &mut self,
        device: &wgpu::Device,
        config: &RenderConfig,
        render_width: u32,
        render_height: u32,
    ) -> Result<(), EngineError> {
        let desc = FramebufferDesc {
            width: scaled(render_width, config.water_resolution_scale),
            height: scaled(render_height, config.water_resolution_scale),
            depth: DepthSettings::EnableDepth,
            g_buffer: false,
            single_channel: false,
        };
        self.reflection = Framebuffer::new(device, "water.reflection", &desc)?;
        self.refraction = Framebuffer::new(device, "water.refraction", &desc)?;
        Ok(())
    }
}

/// Screen-space textured quad (crosshair and friends).
pub struct Sprite {
    pub texture: Arc<Texture>,
    pub transform: Transform,
}

/// Volumetric cloud layer parameters.
#[derive(Debug, Clone, Copy)]
pub struct CloudSettings {
    /// Horizontal extent of the cloud volume, centred on the world.
    pub size: f32,
    pub height_min: f32,
    pub height_max: f32,
    pub scale: f32,
    pub detail_scale: f32,
    pub density: f32,
    pub threshold: f32,
    pub brightness: f32,
    pub steps: u32,
    /// Animation offset, advanced by the app each frame.
    pub time: f32,
}

impl Default for CloudSettings {
    fn default() -> Self {
        Self {
            size: 2000.0,
            height_min: 60.0,
            height_max: 150.0,
            scale: 0.083,
            detail_scale: 1.2,
            density: 10.0,
            threshold: 0.75,
            brightness: 11.0,
            steps: 256,
            time: 0.0,
        }
    }
}

/// Everything the renderer draws in one frame. The terrain atlas is held
/// here once and shared by every chunk draw.
pub struct Scene {
    pub camera: Camera,
    pub sun: DirectionalLight,
    pub ambient_light: Vec3,
    pub skybox: Option<Arc<Texture>>,
    /// Multiplied over the sampled skybox colour.
    pub skybox_tint: Vec3,
    pub terrain_atlas: Arc<Texture>,
    pub entities: Vec<Entity>,
    pub waters: Vec<Water>,
    pub sprites: Vec<Sprite>,
    pub clouds: CloudSettings,
}

pub(crate) fn scaled(size: u32, scale: f32) -> u32 {
    ((size as f32 * scale) as u32).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn test_transform_order_scale_then_rotate_then_translate() {
        let transform = Transform {
            position: Vec3::new(10.0, 0.0, 0.0),
            rotation_degrees: Vec3::new(0.0, 90.0, 0.0),
            scale: Vec3::splat(2.0),
        };
        // +X unit point: scaled to (2,0,0), yawed 90 to (0,0,-2), then
        // translated.
        let p = transform.matrix() * Vec4::new(1.0, 0.0, 0.0, 1.0);
        assert!((p.x - 10.0).abs() < 1e-4);
        assert!((p.z - -2.0).abs() < 1e-4);
    }

    #[test]
    fn test_scaled_never_zero() {
        assert_eq!(scaled(3, 0.1), 1);
        assert_eq!(scaled(100, 0.5), 50);
    }

    #[test]
    fn test_cloud_defaults() {
        let clouds = CloudSettings::default();
        assert!(clouds.height_min < clouds.height_max);
        assert!(clouds.threshold > 0.0 && clouds.threshold < 1.0);
        assert!(clouds.steps > 0);
    }
}
