use basalt_core::config::RenderConfig;
use basalt_core::error::EngineError;
use glam::{Mat4, Vec3, Vec4};

use crate::camera::Camera;
use crate::framebuffer::{DepthSettings, Framebuffer, FramebufferDesc};

/// The sun: a directional light that owns its shadow map.
pub struct DirectionalLight {
    /// Direction proxy; only the normalised vector matters.
    pub position: Vec3,
    pub color: Vec3,
    pub shadow_map: Framebuffer,
}

impl DirectionalLight {
    pub fn new(
        device: &wgpu::Device,
        config: &RenderConfig,
        position: Vec3,
        color: Vec3,
    ) -> Result<Self, EngineError> {
        let shadow_map = Framebuffer::new(
            device,
            "shadow_map",
            &FramebufferDesc {
                width: config.shadow_map_size,
                height: config.shadow_map_size,
                depth: DepthSettings::OnlyDepth,
                g_buffer: false,
                single_channel: false,
            },
        )?;
        Ok(Self {
            position,
            color,
            shadow_map,
        })
    }

    pub fn light_space_matrix(
        &self,
        camera: &Camera,
        config: &RenderConfig,
        width: u32,
        height: u32,
    ) -> Mat4 {
        fit_light_to_frustum(self.position, camera, config, width, height)
    }
}

/// Orthographic projection * view fitted to the camera frustum, so the
/// shadow map covers exactly what the camera can see.
pub fn fit_light_to_frustum(
    light_position: Vec3,
    camera: &Camera,
    config: &RenderConfig,
    width: u32,
    height: u32,
) -> Mat4 {
    let view = camera.view_matrix();
    let projection = camera.projection_matrix(config, width, height);
    let corners = frustum_corners(projection * view);

    let center = corners.iter().sum::<Vec3>() / corners.len() as f32;
    let radius = corners
        .iter()
        .map(|corner| (*corner - center).length())
        .fold(0.0f32, f32::max);

    let direction = light_position.normalize_or_zero();
    let up = if direction.abs_diff_eq(Vec3::Y, 1e-3) {
        Vec3::Z
    } else {
        Vec3::Y
    };
    let light_view = Mat4::look_at_rh(center + direction * radius, center, up);

    let mut min = Vec3::splat(f32::INFINITY);
    let mut max = Vec3::splat(f32::NEG_INFINITY);
    for corner in &corners {
        let p = (light_view * corner.extend(1.0)).truncate();
        min = min.min(p);
        max = max.max(p);
    }

    // View space looks down -Z: near = -max.z, far = -min.z.
    let light_projection = Mat4::orthographic_rh(min.x, max.x, min.y, max.y, -max.z, -min.z);
    light_projection * light_view
}

/// The eight world-space corners of a view-projection frustum
/// (clip z in [0, 1]).
fn frustum_corners(view_projection: Mat4) -> [Vec3; 8] {
    let inverse = view_projection.inverse();
    let mut corners = [Vec3::ZERO; 8];
    let mut i = 0;
    for x in [-1.0f32, 1.0] {
        for y in [-1.0f32, 1.0] {
            for z in [0.0f32, 1.0] {
                let p = inverse * Vec4::new(x, y, z, 1.0);
                corners[i] = (p / p.w).truncate();
                i += 1;
            }
        }
    }
    corners
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frustum_corners_round_trip() {
        let config = RenderConfig::default();
        let camera = Camera::new(Vec3::new(64.0, 40.0, 64.0));
        let vp = camera.projection_matrix(&config, 1280, 720) * camera.view_matrix();

        for corner in frustum_corners(vp) {
            let clip = vp * corner.extend(1.0);
            let ndc = clip / clip.w;
            assert!(ndc.x.abs() < 1.001 && ndc.y.abs() < 1.001);
            assert!(ndc.z > -0.001 && ndc.z < 1.001);
        }
    }

    #[test]
    fn test_light_space_contains_camera_frustum() {
        let config = RenderConfig::default();
        let mut camera = Camera::new(Vec3::new(64.0, 40.0, 64.0));
        camera.pitch = 20.0;
        camera.yaw = 135.0;

        let light_position = Vec3::new(100.0, 140.0, 70.0);
        let light_space = fit_light_to_frustum(light_position, &camera, &config, 1280, 720);

        let vp = camera.projection_matrix(&config, 1280, 720) * camera.view_matrix();
        for corner in frustum_corners(vp) {
            let clip = light_space * corner.extend(1.0);
            // Orthographic: w is 1, clip is NDC.
            assert!(
                clip.x.abs() < 1.01 && clip.y.abs() < 1.01,
                "corner {corner} escaped the shadow map: {clip}"
            );
            assert!(clip.z > -0.01 && clip.z < 1.01, "depth {} out of range", clip.z);
        }
    }

    #[test]
    fn test_vertical_light_direction_does_not_degenerate() {
        let config = RenderConfig::default();
        let camera = Camera::new(Vec3::new(0.0, 50.0, 0.0));
        let light_space = fit_light_to_frustum(Vec3::Y * 10.0, &camera, &config, 800, 600);
        assert!(light_space.is_finite());
    }
}
