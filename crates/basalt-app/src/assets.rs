use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use basalt_core::error::EngineError;
use basalt_render::Texture;

/// Loads and memoizes textures from the asset directory. A missing or
/// undecodable file is fatal, with the offending path in the error.
pub struct Assets {
    base: PathBuf,
    textures: HashMap<PathBuf, Arc<Texture>>,
}

impl Assets {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self {
            base: base.into(),
            textures: HashMap::new(),
        }
    }

    fn decode(path: &Path) -> Result<image::RgbaImage, EngineError> {
        let image = image::open(path).map_err(|e| EngineError::TextureLoad {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(image.to_rgba8())
    }

    /// Fetch a 2D texture, loading it on first use.
    pub fn texture(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        name: &str,
        nearest: bool,
    ) -> Result<Arc<Texture>, EngineError> {
        let path = self.base.join(name);
        if let Some(texture) = self.textures.get(&path) {
            return Ok(texture.clone());
        }

        let image = Self::decode(&path)?;
        let texture = Arc::new(Texture::from_rgba(
            device,
            queue,
            name,
            &image,
            image.width(),
            image.height(),
            nearest,
        )?);
        log::info!("loaded texture {}", path.display());
        self.textures.insert(path, texture.clone());
        Ok(texture)
    }

    /// Load six cubemap faces named `<name>/{px,nx,py,ny,pz,nz}.png`.
    pub fn cubemap(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        name: &str,
    ) -> Result<Arc<Texture>, EngineError> {
        let dir = self.base.join(name);
        let mut faces: Vec<Vec<u8>> = Vec::with_capacity(6);
        let mut size = (0u32, 0u32);
        for face in ["px", "nx", "py", "ny", "pz", "nz"] {
            let path = dir.join(format!("{face}.png"));
            let image = Self::decode(&path)?;
            if faces.is_empty() {
                size = (image.width(), image.height());
            } else if size != (image.width(), image.height()) {
                return Err(EngineError::TextureData {
                    label: name.to_string(),
                    reason: format!("face '{face}' size differs from the first face"),
                });
            }
            faces.push(image.into_raw());
        }

        let faces: [Vec<u8>; 6] = faces.try_into().map_err(|_| EngineError::TextureData {
            label: name.to_string(),
            reason: "expected six faces".to_string(),
        })?;
        Ok(Arc::new(Texture::cubemap(
            device, queue, name, &faces, size.0, size.1,
        )?))
    }
}
