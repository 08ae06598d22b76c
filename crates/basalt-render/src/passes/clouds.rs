use basalt_core::constants::{CLOUD_DETAIL_NOISE_SIZE, CLOUD_NOISE_SIZE};
use basalt_core::error::EngineError;
use bytemuck::{Pod, Zeroable};
use glam::Mat4;

use crate::framebuffer::{DepthSettings, Framebuffer, FramebufferDesc, COLOR_FORMAT};
use crate::mesh::GpuMesh;
use crate::passes::common::{
    alpha_blend_target, color_target, create_pipeline, create_shader, depth_texture_entry,
    sampler_entry, texture_entry, volume_texture_entry, PipelineDesc,
};
use crate::scene::Scene;
use crate::texture::Texture;
use crate::uniforms::UniformBuffer;

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct WorleyUniforms {
    cells: u32,
    octaves: u32,
    persistence: f32,
    _pad: f32,
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct CloudUniforms {
    inverse_view_projection: [[f32; 4]; 4],
    camera_position: [f32; 4],
    bounds_min: [f32; 4],
    bounds_max: [f32; 4],
    light_color: [f32; 4],
    params0: [f32; 4],
    params1: [f32; 4],
}

/// Volumetric cloud layer. The two Worley density volumes are baked by a
/// compute dispatch at construction and never touched again. Per frame the
/// raymarch renders colour + coverage into a reduced-resolution layer
/// target, which a second fullscreen draw alpha-blends over the
/// full-resolution lit image; only the clouds pay the reduced resolution.
pub struct CloudPass {
    pipeline: wgpu::RenderPipeline,
    apply_pipeline: wgpu::RenderPipeline,
    layer: Framebuffer,
    uniforms: UniformBuffer,
    uniform_group: wgpu::BindGroup,
    depth_layout: wgpu::BindGroupLayout,
    layer_layout: wgpu::BindGroupLayout,
    // Holds the baked volumes alive.
    volume_group: wgpu::BindGroup,
}

impl CloudPass {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        width: u32,
        height: u32,
    ) -> Result<Self, EngineError> {
        let noise = Texture::volume(device, "clouds.noise", CLOUD_NOISE_SIZE);
        let detail_noise = Texture::volume(device, "clouds.detail", CLOUD_DETAIL_NOISE_SIZE);
        Self::bake_volumes(device, queue, &noise, &detail_noise);

        let shader = create_shader(device, "clouds", include_str!("../../shaders/clouds.wgsl"));

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("clouds.uniforms"),
            entries: &[UniformBuffer::layout_entry(0, wgpu::ShaderStages::FRAGMENT)],
        });
        let depth_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("clouds.depth"),
            entries: &[depth_texture_entry(0), sampler_entry(1, false)],
        });
        let layer_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("clouds.layer"),
            entries: &[texture_entry(0, true), sampler_entry(1, true)],
        });
        let volume_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("clouds.volumes"),
            entries: &[
                volume_texture_entry(0),
                volume_texture_entry(1),
                sampler_entry(2, false),
            ],
        });

        let pipeline = create_pipeline(
            device,
            &PipelineDesc {
                label: "clouds",
                shader: &shader,
                vs_entry: "vs_fullscreen",
                fs_entry: Some("fs_main"),
                bind_group_layouts: &[&uniform_layout, &depth_layout, &volume_layout],
                targets: &[color_target(COLOR_FORMAT)],
                depth: None,
                cull: None,
            },
        );

        let apply_shader = create_shader(
            device,
            "clouds.apply",
            include_str!("../../shaders/overlay.wgsl"),
        );
        let apply_pipeline = create_pipeline(
            device,
            &PipelineDesc {
                label: "clouds.apply",
                shader: &apply_shader,
                vs_entry: "vs_fullscreen",
                fs_entry: Some("fs_main"),
                bind_group_layouts: &[&layer_layout],
                targets: &[alpha_blend_target(COLOR_FORMAT)],
                depth: None,
                cull: None,
            },
        );

        let layer = Self::create_layer(device, width, height)?;
        let uniforms = UniformBuffer::new::<CloudUniforms>(device, "clouds.uniforms");
        let uniform_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("clouds.uniforms"),
            layout: &uniform_layout,
            entries: &[uniforms.binding(0)],
        });

        let noise_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("clouds.volumes"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });
        let volume_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("clouds.volumes"),
            layout: &volume_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&noise.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&detail_noise.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&noise_sampler),
                },
            ],
        });

        Ok(Self {
            pipeline,
            apply_pipeline,
            layer,
            uniforms,
            uniform_group,
            depth_layout,
            layer_layout,
            volume_group,
        })
    }

    /// One-off compute bake of the base and detail Worley volumes.
    fn bake_volumes(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        noise: &Texture,
        detail_noise: &Texture,
    ) {
        let shader = create_shader(device, "worley", include_str!("../../shaders/worley.wgsl"));

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("worley"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::StorageTexture {
                        access: wgpu::StorageTextureAccess::WriteOnly,
                        format: wgpu::TextureFormat::R32Float,
                        view_dimension: wgpu::TextureViewDimension::D3,
                    },
                    count: None,
                },
            ],
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("worley"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });
        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("worley"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some("cs_main"),
            compilation_options: Default::default(),
            cache: None,
        });

        let bake = |label: &str, target: &Texture, size: u32, config: WorleyUniforms| {
            let uniforms = UniformBuffer::new::<WorleyUniforms>(device, label);
            uniforms.write(queue, &config);
            let group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout: &layout,
                entries: &[
                    uniforms.binding(0),
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(&target.view),
                    },
                ],
            });

            let mut encoder =
                device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some(label) });
            {
                let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                    label: Some(label),
                    timestamp_writes: None,
                });
                pass.set_pipeline(&pipeline);
                pass.set_bind_group(0, &group, &[]);
                let groups = size.div_ceil(4);
                pass.dispatch_workgroups(groups, groups, groups);
            }
            queue.submit([encoder.finish()]);
        };

        bake(
            "worley.base",
            noise,
            CLOUD_NOISE_SIZE,
            WorleyUniforms {
                cells: 4,
                octaves: 4,
                persistence: 0.5,
                _pad: 0.0,
            },
        );
        bake(
            "worley.detail",
            detail_noise,
            CLOUD_DETAIL_NOISE_SIZE,
            WorleyUniforms {
                cells: 8,
                octaves: 3,
                persistence: 0.5,
                _pad: 0.0,
            },
        );
        log::info!("baked cloud noise volumes");
    }

    fn create_layer(
        device: &wgpu::Device,
        width: u32,
        height: u32,
    ) -> Result<Framebuffer, EngineError> {
        Framebuffer::new(
            device,
            "clouds",
            &FramebufferDesc {
                width,
                height,
                depth: DepthSettings::NoDepth,
                g_buffer: false,
                single_channel: false,
            },
        )
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) -> Result<(), EngineError> {
        self.layer = Self::create_layer(device, width, height)?;
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
        target: &Framebuffer,
        g_buffer: &Framebuffer,
        view: Mat4,
        projection: Mat4,
    ) {
        let Some(scene_depth) = &g_buffer.depth else {
            log::error!("cloud input is missing scene depth");
            return;
        };
        let Some(layer_color) = &self.layer.color else {
            log::error!("cloud layer is missing its colour attachment");
            return;
        };

        let clouds = &scene.clouds;
        let half = clouds.size * 0.5;
        let center = scene.camera.position;
        self.uniforms.write(
            queue,
            &CloudUniforms {
                inverse_view_projection: (projection * view).inverse().to_cols_array_2d(),
                camera_position: scene.camera.position.extend(1.0).to_array(),
                bounds_min: [center.x - half, clouds.height_min, center.z - half, 0.0],
                bounds_max: [center.x + half, clouds.height_max, center.z + half, 0.0],
                light_color: scene.sun.color.extend(1.0).to_array(),
                params0: [
                    clouds.scale,
                    clouds.detail_scale,
                    clouds.density,
                    clouds.threshold,
                ],
                params1: [clouds.brightness, clouds.time, clouds.steps as f32, 0.0],
            },
        );

        let depth_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("clouds.depth"),
            layout: &self.depth_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&scene_depth.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&scene_depth.sampler),
                },
            ],
        });

        {
            let attachments = self
                .layer
                .color_attachments(wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT));
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("clouds"),
                color_attachments: &attachments,
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.uniform_group, &[]);
            pass.set_bind_group(1, &depth_group, &[]);
            pass.set_bind_group(2, &self.volume_group, &[]);
            quad.draw(&mut pass);
        }

        // Upscale and blend the layer over the full-resolution lit image.
        let layer_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("clouds.layer"),
            layout: &self.layer_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&layer_color.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&layer_color.sampler),
                },
            ],
        });
        let attachments = target.color_attachments(wgpu::LoadOp::Load);
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("clouds.apply"),
            color_attachments: &attachments,
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_pipeline(&self.apply_pipeline);
        pass.set_bind_group(0, &layer_group, &[]);
        quad.draw(&mut pass);
    }
}
