use basalt_core::config::RenderConfig;
use glam::{Mat4, Vec3};

/// First-person camera. Angles are in degrees; the view matrix rotates
/// before translating, so pitch/yaw/roll read as head movement.
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    pub position: Vec3,
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

impl Camera {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            pitch: 0.0,
            yaw: 0.0,
            roll: 0.0,
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_rotation_x(self.pitch.to_radians())
            * Mat4::from_rotation_y(self.yaw.to_radians())
            * Mat4::from_rotation_z(self.roll.to_radians())
            * Mat4::from_translation(-self.position)
    }

    pub fn projection_matrix(&self, config: &RenderConfig, width: u32, height: u32) -> Mat4 {
        let aspect = width as f32 / height.max(1) as f32;
        Mat4::perspective_rh(config.fov_y_radians(), aspect, config.z_near, config.z_far)
    }

    /// World-space direction through the screen centre.
    pub fn direction_vector(&self) -> Vec3 {
        let pitch = self.pitch.to_radians();
        let yaw = self.yaw.to_radians();
        Vec3::new(
            yaw.sin() * pitch.cos(),
            -pitch.sin(),
            -yaw.cos() * pitch.cos(),
        )
    }

    /// The camera mirrored across a horizontal plane, for planar
    /// reflections.
    pub fn reflected_across(&self, plane_height: f32) -> Self {
        let mut mirrored = *self;
        mirrored.position.y = 2.0 * plane_height - self.position.y;
        mirrored.pitch = -self.pitch;
        mirrored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn test_view_rotates_before_translating() {
        let camera = Camera {
            position: Vec3::new(10.0, 0.0, 0.0),
            pitch: 0.0,
            yaw: 90.0,
            roll: 0.0,
        };
        // A point at the origin should land on the -Z axis (in front),
        // 10 units away, after yawing 90 degrees at x=10.
        let eye_space = camera.view_matrix() * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert!((eye_space.z - -10.0).abs() < 1e-4, "z = {}", eye_space.z);
        assert!(eye_space.x.abs() < 1e-4);
    }

    #[test]
    fn test_direction_vector_matches_view() {
        for (pitch, yaw) in [(0.0, 0.0), (30.0, 45.0), (-20.0, 190.0), (89.0, -5.0)] {
            let camera = Camera {
                position: Vec3::ZERO,
                pitch,
                yaw,
                roll: 0.0,
            };
            // The direction vector is -Z transformed by the inverse view
            // rotation.
            let forward = camera.view_matrix().inverse() * Vec4::new(0.0, 0.0, -1.0, 0.0);
            let dir = camera.direction_vector();
            assert!((forward.truncate() - dir).length() < 1e-4, "{pitch} {yaw}");
        }
    }

    #[test]
    fn test_reflection_mirrors_height_and_pitch() {
        let camera = Camera {
            position: Vec3::new(5.0, 20.0, 5.0),
            pitch: 30.0,
            yaw: 120.0,
            roll: 0.0,
        };
        let reflected = camera.reflected_across(8.0);
        assert_eq!(reflected.position.y, -4.0);
        assert_eq!(reflected.pitch, -30.0);
        assert_eq!(reflected.yaw, camera.yaw);
        assert_eq!(reflected.position.x, camera.position.x);
    }

    #[test]
    fn test_default_camera_looks_down_negative_z() {
        let camera = Camera::new(Vec3::ZERO);
        let dir = camera.direction_vector();
        assert!((dir - Vec3::NEG_Z).length() < 1e-6);
    }
}
