use basalt_core::constants::BLOOM_BLUR_PAIRS;
use basalt_core::error::EngineError;
use bytemuck::{Pod, Zeroable};

use crate::framebuffer::{DepthSettings, Framebuffer, FramebufferDesc, COLOR_FORMAT};
use crate::mesh::GpuMesh;
use crate::passes::blur::BlurPass;
use crate::passes::common::{
    color_target, create_pipeline, create_shader, sampler_entry, texture_entry, PipelineDesc,
};
use crate::uniforms::UniformBuffer;

const BLOOM_THRESHOLD: f32 = 1.0;

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct BloomUniforms {
    threshold: [f32; 4],
}

/// Extracts pixels brighter than the threshold and blurs them into a glow
/// layer, composited later.
pub struct BloomPass {
    pipeline: wgpu::RenderPipeline,
    pub output: Framebuffer,
    blur: BlurPass,
    uniform_group: wgpu::BindGroup,
    scene_layout: wgpu::BindGroupLayout,
}

impl BloomPass {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        width: u32,
        height: u32,
    ) -> Result<Self, EngineError> {
        let shader = create_shader(device, "bloom", include_str!("../../shaders/bloom.wgsl"));

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("bloom.uniforms"),
            entries: &[UniformBuffer::layout_entry(0, wgpu::ShaderStages::FRAGMENT)],
        });
        let scene_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("bloom.scene"),
            entries: &[texture_entry(0, true), sampler_entry(1, true)],
        });

        let pipeline = create_pipeline(
            device,
            &PipelineDesc {
                label: "bloom",
                shader: &shader,
                vs_entry: "vs_fullscreen",
                fs_entry: Some("fs_main"),
                bind_group_layouts: &[&uniform_layout, &scene_layout],
                targets: &[color_target(COLOR_FORMAT)],
                depth: None,
                cull: None,
            },
        );

        // Written once; the threshold is fixed.
        let uniforms = UniformBuffer::new::<BloomUniforms>(device, "bloom.uniforms");
        uniforms.write(
            queue,
            &BloomUniforms {
                threshold: [BLOOM_THRESHOLD, 0.0, 0.0, 0.0],
            },
        );
        let uniform_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("bloom.uniforms"),
            layout: &uniform_layout,
            entries: &[uniforms.binding(0)],
        });

        let output = Self::create_output(device, width, height)?;
        let blur = BlurPass::new(device, queue, COLOR_FORMAT, width, height)?;

        Ok(Self {
            pipeline,
            output,
            blur,
            uniform_group,
            scene_layout,
        })
    }

    fn create_output(
        device: &wgpu::Device,
        width: u32,
        height: u32,
    ) -> Result<Framebuffer, EngineError> {
        Framebuffer::new(
            device,
            "bloom",
            &FramebufferDesc {
                width,
                height,
                depth: DepthSettings::NoDepth,
                g_buffer: false,
                single_channel: false,
            },
        )
    }

    pub fn resize(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        width: u32,
        height: u32,
    ) -> Result<(), EngineError> {
        self.output = Self::create_output(device, width, height)?;
        self.blur = BlurPass::new(device, queue, COLOR_FORMAT, width, height)?;
        Ok(())
    }

    pub fn render(
        &self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        quad: &GpuMesh,
        scene: &Framebuffer,
    ) {
        let Some(scene_color) = &scene.color else {
            log::error!("bloom input has no colour attachment");
            return;
        };

        let scene_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("bloom.scene"),
            layout: &self.scene_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&scene_color.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&scene_color.sampler),
                },
            ],
        });

        {
            let attachments = self
                .output
                .color_attachments(wgpu::LoadOp::Clear(wgpu::Color::BLACK));
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("bloom.threshold"),
                color_attachments: &attachments,
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.uniform_group, &[]);
            pass.set_bind_group(1, &scene_group, &[]);
            quad.draw(&mut pass);
        }

        self.blur.render(
            device,
            encoder,
            quad,
            &self.output,
            &self.output,
            BLOOM_BLUR_PAIRS,
        );
    }
}
