use basalt_core::error::EngineError;
use bytemuck::{Pod, Zeroable};

use crate::framebuffer::{DepthSettings, Framebuffer, FramebufferDesc, SINGLE_CHANNEL_FORMAT};
use crate::mesh::GpuMesh;
use crate::passes::common::{
    color_target, create_pipeline, create_shader, sampler_entry, texture_entry, PipelineDesc,
};
use crate::uniforms::UniformBuffer;

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct BlurUniforms {
    direction: [f32; 4],
}

/// Separable gaussian blur, ping-ponging between two internal targets.
/// Built per consumer so the target format can differ (single-channel for
/// occlusion, HDR colour for bloom).
pub struct BlurPass {
    pipeline: wgpu::RenderPipeline,
    source_layout: wgpu::BindGroupLayout,
    horizontal_group: wgpu::BindGroup,
    vertical_group: wgpu::BindGroup,
    ping: [Framebuffer; 2],
}

impl BlurPass {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Result<Self, EngineError> {
        let shader = create_shader(device, "blur", include_str!("../../shaders/blur.wgsl"));

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("blur.direction"),
            entries: &[UniformBuffer::layout_entry(0, wgpu::ShaderStages::FRAGMENT)],
        });
        let source_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("blur.source"),
            entries: &[texture_entry(0, true), sampler_entry(1, true)],
        });

        let pipeline = create_pipeline(
            device,
            &PipelineDesc {
                label: "blur",
                shader: &shader,
                vs_entry: "vs_fullscreen",
                fs_entry: Some("fs_main"),
                bind_group_layouts: &[&uniform_layout, &source_layout],
                targets: &[color_target(format)],
                depth: None,
                cull: None,
            },
        );

        // The two direction uniforms never change after construction.
        let make_direction = |label, x| {
            let buffer = UniformBuffer::new::<BlurUniforms>(device, label);
            buffer.write(
                queue,
                &BlurUniforms {
                    direction: [x, 0.0, 0.0, 0.0],
                },
            );
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout: &uniform_layout,
                entries: &[buffer.binding(0)],
            })
        };
        let horizontal_group = make_direction("blur.horizontal", 1.0);
        let vertical_group = make_direction("blur.vertical", 0.0);

        let desc = FramebufferDesc {
            width,
            height,
            depth: DepthSettings::NoDepth,
            g_buffer: false,
            single_channel: format == SINGLE_CHANNEL_FORMAT,
        };
        let ping = [
            Framebuffer::new(device, "blur.ping0", &desc)?,
            Framebuffer::new(device, "blur.ping1", &desc)?,
        ];

        Ok(Self {
            pipeline,
            source_layout,
            horizontal_group,
            vertical_group,
            ping,
        })
    }

    fn source_group(
        &self,
        device: &wgpu::Device,
        framebuffer: &Framebuffer,
    ) -> Option<wgpu::BindGroup> {
        let texture = framebuffer.color.as_ref()?;
        Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("blur.source"),
            layout: &self.source_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&texture.sampler),
                },
            ],
        }))
    }

    fn blit(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        quad: &GpuMesh,
        direction: &wgpu::BindGroup,
        source: &wgpu::BindGroup,
        target: &Framebuffer,
    ) {
        let attachments = target.color_attachments(wgpu::LoadOp::Clear(wgpu::Color::BLACK));
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("blur"),
            color_attachments: &attachments,
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, direction, &[]);
        pass.set_bind_group(1, source, &[]);
        quad.draw(&mut pass);
    }

    /// Blur `source` into `target` with `pairs` horizontal+vertical pass
    /// pairs (two directional passes each). Source and target may be the
    /// same framebuffer; the first read happens before the last write.
    pub fn render(
        &self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        quad: &GpuMesh,
        source: &Framebuffer,
        target: &Framebuffer,
        pairs: u32,
    ) {
        for i in 0..pairs {
            let input = if i == 0 {
                self.source_group(device, source)
            } else {
                self.source_group(device, &self.ping[1])
            };
            let Some(input) = input else {
                log::error!("blur source has no colour attachment");
                return;
            };
            self.blit(encoder, quad, &self.horizontal_group, &input, &self.ping[0]);

            let vertical_target = if i + 1 == pairs {
                target
            } else {
                &self.ping[1]
            };
            let Some(input) = self.source_group(device, &self.ping[0]) else {
                return;
            };
            self.blit(encoder, quad, &self.vertical_group, &input, vertical_target);
        }
    }
}
