use basalt_core::error::EngineError;
use bytemuck::{Pod, Zeroable};
use glam::Mat4;

use crate::framebuffer::{DepthSettings, Framebuffer, FramebufferDesc, COLOR_FORMAT};
use crate::mesh::GpuMesh;
use crate::passes::common::{
    color_target, create_pipeline, create_shader, depth_texture_entry, sampler_entry,
    texture_entry, PipelineDesc,
};
use crate::scene::Scene;
use crate::uniforms::UniformBuffer;

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct LightingUniforms {
    light_space: [[f32; 4]; 4],
    light_position: [f32; 4],
    light_color: [f32; 4],
    ambient: [f32; 4],
}

/// Fullscreen deferred shading into the lit HDR target. The g-buffer depth
/// is copied into the output's depth attachment first, so the sky and water
/// passes can depth-test against scene geometry.
pub struct LightingPass {
    pipeline: wgpu::RenderPipeline,
    pub output: Framebuffer,
    uniforms: UniformBuffer,
    uniform_group: wgpu::BindGroup,
    gbuffer_layout: wgpu::BindGroupLayout,
    shading_layout: wgpu::BindGroupLayout,
}

impl LightingPass {
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Result<Self, EngineError> {
        let shader = create_shader(
            device,
            "lighting",
            include_str!("../../shaders/lighting.wgsl"),
        );

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("lighting.uniforms"),
            entries: &[UniformBuffer::layout_entry(0, wgpu::ShaderStages::FRAGMENT)],
        });
        let gbuffer_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("lighting.gbuffer"),
            entries: &[
                texture_entry(0, true),
                texture_entry(1, true),
                texture_entry(2, true),
                sampler_entry(3, true),
            ],
        });
        let shading_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("lighting.shading"),
            entries: &[
                depth_texture_entry(0),
                sampler_entry(1, false),
                texture_entry(2, true),
                sampler_entry(3, true),
            ],
        });

        let pipeline = create_pipeline(
            device,
            &PipelineDesc {
                label: "lighting",
                shader: &shader,
                vs_entry: "vs_fullscreen",
                fs_entry: Some("fs_main"),
                bind_group_layouts: &[&uniform_layout, &gbuffer_layout, &shading_layout],
                targets: &[color_target(COLOR_FORMAT)],
                depth: None,
                cull: None,
            },
        );

        let output = Self::create_output(device, width, height)?;
        let uniforms = UniformBuffer::new::<LightingUniforms>(device, "lighting.uniforms");
        let uniform_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("lighting.uniforms"),
            layout: &uniform_layout,
            entries: &[uniforms.binding(0)],
        });

        Ok(Self {
            pipeline,
            output,
            uniforms,
            uniform_group,
            gbuffer_layout,
            shading_layout,
        })
    }

    fn create_output(device: &wgpu::Device, width: u32, height: u32) -> Result<Framebuffer, EngineError> {
        Framebuffer::new(
            device,
            "lit",
            &FramebufferDesc {
                width,
                height,
                depth: DepthSettings::EnableDepth,
                g_buffer: false,
                single_channel: false,
            },
        )
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) -> Result<(), EngineError> {
        self.output = Self::create_output(device, width, height)?;
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub fn render(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        quad: &GpuMesh,
        scene: &Scene,
        g_buffer: &Framebuffer,
        occlusion: &Framebuffer,
        light_space: Mat4,
    ) {
        let (Some(color), Some(normal), Some(position)) =
            (&g_buffer.color, &g_buffer.normal, &g_buffer.position)
        else {
            log::error!("lighting input is not a g-buffer");
            return;
        };
        let (Some(gbuffer_depth), Some(output_depth)) = (&g_buffer.depth, &self.output.depth)
        else {
            log::error!("lighting targets are missing depth attachments");
            return;
        };
        let (Some(shadow), Some(ao)) = (&scene.sun.shadow_map.depth, &occlusion.color) else {
            log::error!("lighting inputs are missing shadow or occlusion textures");
            return;
        };

        self.uniforms.write(
            queue,
            &LightingUniforms {
                light_space: light_space.to_cols_array_2d(),
                light_position: scene.sun.position.extend(0.0).to_array(),
                light_color: scene.sun.color.extend(1.0).to_array(),
                ambient: scene.ambient_light.extend(1.0).to_array(),
            },
        );

        // Carry scene depth over so later forward passes test against it.
        encoder.copy_texture_to_texture(
            gbuffer_depth.texture.as_image_copy(),
            output_depth.texture.as_image_copy(),
            wgpu::Extent3d {
                width: self.output.width,
                height: self.output.height,
                depth_or_array_layers: 1,
            },
        );

        let gbuffer_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("lighting.gbuffer"),
            layout: &self.gbuffer_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&color.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&normal.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&position.view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(&color.sampler),
                },
            ],
        });
        let shading_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("lighting.shading"),
            layout: &self.shading_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&shadow.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&shadow.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&ao.view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(&ao.sampler),
                },
            ],
        });

        let attachments = self
            .output
            .color_attachments(wgpu::LoadOp::Clear(wgpu::Color::BLACK));
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("lighting"),
            color_attachments: &attachments,
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.uniform_group, &[]);
        pass.set_bind_group(1, &gbuffer_group, &[]);
        pass.set_bind_group(2, &shading_group, &[]);
        quad.draw(&mut pass);
    }
}
