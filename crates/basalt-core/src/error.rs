use thiserror::Error;

use crate::block::Block;

/// Errors that can occur during basalt initialization and runtime.
///
/// Asset and GPU-resource errors are fatal: a half-configured GPU object or
/// a missing texture cannot safely render, so there is no retry path.
/// Out-of-range lookups (e.g. the ray march leaving the world) are handled
/// locally as "no intersection" and never surface here.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("GPU adapter not found: {0}")]
    AdapterNotFound(String),

    #[error("failed to request GPU device: {0}")]
    DeviceRequestFailed(String),

    #[error("surface configuration failed: {0}")]
    SurfaceConfigFailed(String),

    #[error("shader '{name}' failed to compile: {log}")]
    ShaderCompilationFailed { name: String, log: String },

    #[error("incomplete framebuffer '{label}': {reason}")]
    FramebufferIncomplete { label: String, reason: String },

    #[error("failed to load texture '{path}': {reason}")]
    TextureLoad { path: String, reason: String },

    #[error("invalid texture data for '{label}': {reason}")]
    TextureData { label: String, reason: String },

    #[error("no atlas mapping for block {0:?}")]
    UnmappedBlockTexture(Block),

    #[error("failed to read config '{path}': {reason}")]
    ConfigLoad { path: String, reason: String },
}
