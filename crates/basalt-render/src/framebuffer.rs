use basalt_core::error::EngineError;

use crate::texture::Texture;

/// HDR colour format shared by every intermediate target.
pub const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
/// Format for single-channel targets (ambient occlusion).
pub const SINGLE_CHANNEL_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R16Float;
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// How a framebuffer participates in depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthSettings {
    /// Colour only.
    NoDepth,
    /// Colour plus a depth attachment.
    EnableDepth,
    /// Depth only, no colour. Shadow maps.
    OnlyDepth,
}

#[derive(Debug, Clone, Copy)]
pub struct FramebufferDesc {
    pub width: u32,
    pub height: u32,
    pub depth: DepthSettings,
    /// Add world-space normal and position attachments.
    pub g_buffer: bool,
    /// Shrink colour to a single channel.
    pub single_channel: bool,
}

/// Which attachments a descriptor produces. Pure so the mapping is checkable
/// without a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachmentLayout {
    pub has_color: bool,
    pub has_normal_position: bool,
    pub has_depth: bool,
}

pub fn attachment_layout(desc: &FramebufferDesc) -> AttachmentLayout {
    let only_depth = desc.depth == DepthSettings::OnlyDepth;
    AttachmentLayout {
        has_color: !only_depth,
        has_normal_position: desc.g_buffer && !only_depth,
        has_depth: desc.depth != DepthSettings::NoDepth,
    }
}

/// An offscreen render target: colour (plus optional normal and position for
/// the g-buffer) and an optional depth attachment, all sampleable by later
/// passes.
pub struct Framebuffer {
    pub width: u32,
    pub height: u32,
    pub color: Option<Texture>,
    pub normal: Option<Texture>,
    pub position: Option<Texture>,
    pub depth: Option<Texture>,
}

impl Framebuffer {
    pub fn new(
        device: &wgpu::Device,
        label: &str,
        desc: &FramebufferDesc,
    ) -> Result<Self, EngineError> {
        let layout = attachment_layout(desc);
        if !layout.has_color && !layout.has_depth {
            return Err(EngineError::FramebufferIncomplete {
                label: label.to_string(),
                reason: "no attachments".to_string(),
            });
        }
        if desc.width == 0 || desc.height == 0 {
            return Err(EngineError::FramebufferIncomplete {
                label: label.to_string(),
                reason: format!("zero-sized target {}x{}", desc.width, desc.height),
            });
        }

        let color_format = if desc.single_channel {
            SINGLE_CHANNEL_FORMAT
        } else {
            COLOR_FORMAT
        };
        let color = layout.has_color.then(|| {
            Texture::render_target(
                device,
                &format!("{label}.color"),
                desc.width,
                desc.height,
                color_format,
            )
        });
        let (normal, position) = if layout.has_normal_position {
            (
                Some(Texture::render_target(
                    device,
                    &format!("{label}.normal"),
                    desc.width,
                    desc.height,
                    COLOR_FORMAT,
                )),
                Some(Texture::render_target(
                    device,
                    &format!("{label}.position"),
                    desc.width,
                    desc.height,
                    COLOR_FORMAT,
                )),
            )
        } else {
            (None, None)
        };
        let depth = layout
            .has_depth
            .then(|| Texture::depth_target(device, &format!("{label}.depth"), desc.width, desc.height));

        Ok(Self {
            width: desc.width,
            height: desc.height,
            color,
            normal,
            position,
            depth,
        })
    }

    /// Colour attachment list in pipeline target order:
    /// colour, then normal and position when present.
    pub fn color_attachments(
        &self,
        load: wgpu::LoadOp<wgpu::Color>,
    ) -> Vec<Option<wgpu::RenderPassColorAttachment<'_>>> {
        let mut attachments = Vec::new();
        for texture in [&self.color, &self.normal, &self.position]
            .into_iter()
            .flatten()
        {
            attachments.push(Some(wgpu::RenderPassColorAttachment {
                view: &texture.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                },
            }));
        }
        attachments
    }

    pub fn depth_attachment(
        &self,
        load: wgpu::LoadOp<f32>,
    ) -> Option<wgpu::RenderPassDepthStencilAttachment<'_>> {
        self.depth
            .as_ref()
            .map(|texture| wgpu::RenderPassDepthStencilAttachment {
                view: &texture.view,
                depth_ops: Some(wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desc(depth: DepthSettings, g_buffer: bool, single_channel: bool) -> FramebufferDesc {
        FramebufferDesc {
            width: 64,
            height: 64,
            depth,
            g_buffer,
            single_channel,
        }
    }

    #[test]
    fn test_only_depth_has_no_color() {
        let layout = attachment_layout(&desc(DepthSettings::OnlyDepth, false, false));
        assert_eq!(
            layout,
            AttachmentLayout {
                has_color: false,
                has_normal_position: false,
                has_depth: true,
            }
        );
    }

    #[test]
    fn test_only_depth_overrides_g_buffer() {
        let layout = attachment_layout(&desc(DepthSettings::OnlyDepth, true, false));
        assert!(!layout.has_color);
        assert!(!layout.has_normal_position);
        assert!(layout.has_depth);
    }

    #[test]
    fn test_g_buffer_adds_normal_and_position() {
        let layout = attachment_layout(&desc(DepthSettings::EnableDepth, true, false));
        assert_eq!(
            layout,
            AttachmentLayout {
                has_color: true,
                has_normal_position: true,
                has_depth: true,
            }
        );
    }

    #[test]
    fn test_no_depth_color_only() {
        let layout = attachment_layout(&desc(DepthSettings::NoDepth, false, true));
        assert_eq!(
            layout,
            AttachmentLayout {
                has_color: true,
                has_normal_position: false,
                has_depth: false,
            }
        );
    }
}
