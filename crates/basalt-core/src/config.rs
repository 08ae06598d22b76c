use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Render configuration consumed by the pipeline. Loaded from a RON file
/// when one exists, otherwise the compiled-in defaults apply.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Internal render resolution as a fraction of the window framebuffer.
    pub render_scale: f32,
    /// Shadow map edge length in texels.
    pub shadow_map_size: u32,
    /// Bake the shadow map once and reuse it (static scenes).
    pub bake_static_shadows: bool,
    /// Water reflection/refraction target size as a fraction of render size.
    pub water_resolution_scale: f32,
    /// SSAO target size as a fraction of render size.
    pub ao_resolution_scale: f32,
    /// Cloud target size as a fraction of render size.
    pub cloud_resolution_scale: f32,
    /// Near clip plane distance.
    pub z_near: f32,
    /// Far clip plane distance.
    pub z_far: f32,
    /// Vertical field of view in degrees.
    pub fov_y_degrees: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            render_scale: 1.0,
            shadow_map_size: crate::constants::SHADOWMAP_SIZE,
            bake_static_shadows: true,
            water_resolution_scale: 0.5,
            ao_resolution_scale: 1.0,
            cloud_resolution_scale: 1.0,
            z_near: 0.01,
            z_far: 1000.0,
            fov_y_degrees: 90.0,
        }
    }
}

impl RenderConfig {
    /// Load from a RON file. A missing file yields the defaults; a present
    /// but malformed file is a fatal configuration error.
    pub fn load(path: &Path) -> Result<Self, EngineError> {
        if !path.exists() {
            log::info!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path).map_err(|e| EngineError::ConfigLoad {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        ron::from_str(&text).map_err(|e| EngineError::ConfigLoad {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    pub fn fov_y_radians(&self) -> f32 {
        self.fov_y_degrees.to_radians()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_sane() {
        let config = RenderConfig::default();
        assert!(config.render_scale > 0.0 && config.render_scale <= 1.0);
        assert!(config.z_near < config.z_far);
        assert!(config.shadow_map_size.is_power_of_two());
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = RenderConfig::load(Path::new("/nonexistent/basalt.ron")).unwrap();
        assert_eq!(config.shadow_map_size, RenderConfig::default().shadow_map_size);
    }

    #[test]
    fn test_partial_ron_round_trip() {
        let config: RenderConfig = ron::from_str("(render_scale: 0.5)").unwrap();
        assert_eq!(config.render_scale, 0.5);
        // Unspecified fields fall back to defaults
        assert_eq!(config.z_far, 1000.0);
    }
}
