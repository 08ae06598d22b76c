use basalt_core::config::RenderConfig;
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};

use crate::framebuffer::{Framebuffer, COLOR_FORMAT};
use crate::mesh::GpuMesh;
use crate::passes::common::{
    alpha_blend_target, create_pipeline, create_shader, depth_state, depth_texture_entry,
    sampler_entry, texture_entry, PipelineDesc,
};
use crate::passes::diffuse::{DiffusePass, DiffuseTarget, MAX_WATERS};
use crate::passes::sky::SkyPass;
use crate::renderer::{ChunkMeshPool, ObjectOffsets};
use crate::scene::Scene;
use crate::uniforms::UniformArena;

/// Keep the clipped re-renders a little past the surface so the distorted
/// edge never shows a gap.
const CLIP_MARGIN: f32 = 0.1;
const DISTORTION_STRENGTH: f32 = 0.01;

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct WaterUniforms {
    view_projection: [[f32; 4]; 4],
    model: [[f32; 4]; 4],
    camera_position: [f32; 4],
    light_position: [f32; 4],
    light_color: [f32; 4],
    params: [f32; 4],
    planes: [f32; 4],
}

/// For each water surface, re-renders the scene twice through the forward
/// pass (mirrored camera clipped to above the surface, then the normal
/// camera clipped to below it) and draws the distorted surface quad over
/// the lit scene.
pub struct WaterPass {
    pipeline: wgpu::RenderPipeline,
    waters: UniformArena,
    water_group: wgpu::BindGroup,
    inputs_layout: wgpu::BindGroupLayout,
    detail_sampler: wgpu::Sampler,
}

impl WaterPass {
    pub fn new(device: &wgpu::Device) -> Self {
        let shader = create_shader(device, "water", include_str!("../../shaders/water.wgsl"));

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("water.uniforms"),
            entries: &[UniformArena::layout_entry::<WaterUniforms>(
                0,
                wgpu::ShaderStages::VERTEX_FRAGMENT,
            )],
        });
        let inputs_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("water.inputs"),
            entries: &[
                texture_entry(0, true),
                texture_entry(1, true),
                texture_entry(2, true),
                texture_entry(3, true),
                sampler_entry(4, true),
                sampler_entry(5, true),
                depth_texture_entry(6),
                sampler_entry(7, false),
            ],
        });

        let pipeline = create_pipeline(
            device,
            &PipelineDesc {
                label: "water",
                shader: &shader,
                vs_entry: "vs_main",
                fs_entry: Some("fs_main"),
                bind_group_layouts: &[&uniform_layout, &inputs_layout],
                targets: &[alpha_blend_target(COLOR_FORMAT)],
                depth: Some(depth_state(false, wgpu::CompareFunction::Less)),
                cull: None,
            },
        );

        let waters = UniformArena::new(device, "water.uniforms", MAX_WATERS as u32);
        let water_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("water.uniforms"),
            layout: &uniform_layout,
            entries: &[waters.binding::<WaterUniforms>(0)],
        });

        // Detail maps tile, so they get their own repeating sampler.
        let detail_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("water.detail"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self {
            pipeline,
            waters,
            water_group,
            inputs_layout,
            detail_sampler,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn render(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        quad: &GpuMesh,
        cube: &GpuMesh,
        scene: &Scene,
        chunk_meshes: &ChunkMeshPool,
        offsets: &ObjectOffsets,
        diffuse: &DiffusePass,
        sky: &SkyPass,
        target: &Framebuffer,
        light_space: Mat4,
        projection: Mat4,
        config: &RenderConfig,
    ) {
        if scene.waters.len() > MAX_WATERS {
            log::warn!(
                "rendering only the first {MAX_WATERS} of {} water surfaces",
                scene.waters.len()
            );
        }

        for (index, water) in scene.waters.iter().take(MAX_WATERS).enumerate() {
            let height = water.surface_height();
            let index = index as u32;

            // Mirrored view, clipped to keep only what is above the water.
            let mirrored = scene.camera.reflected_across(height);
            let mirrored_view = mirrored.view_matrix();
            diffuse.render(
                device,
                queue,
                encoder,
                scene,
                chunk_meshes,
                offsets,
                light_space,
                &DiffuseTarget {
                    framebuffer: &water.reflection,
                    view_projection: projection * mirrored_view,
                    clip_plane: Some(Vec4::new(0.0, 1.0, 0.0, -height + CLIP_MARGIN)),
                    slot: 1 + index * 2,
                },
            );
            sky.render(
                device,
                queue,
                encoder,
                cube,
                scene,
                &water.reflection,
                mirrored_view,
                projection,
                1 + index * 2,
            );

            // Normal view, clipped to keep only what is below the water.
            let view = scene.camera.view_matrix();
            diffuse.render(
                device,
                queue,
                encoder,
                scene,
                chunk_meshes,
                offsets,
                light_space,
                &DiffuseTarget {
                    framebuffer: &water.refraction,
                    view_projection: projection * view,
                    clip_plane: Some(Vec4::new(0.0, -1.0, 0.0, height + CLIP_MARGIN)),
                    slot: 2 + index * 2,
                },
            );
            sky.render(
                device,
                queue,
                encoder,
                cube,
                scene,
                &water.refraction,
                view,
                projection,
                2 + index * 2,
            );
        }

        let view_projection = projection * scene.camera.view_matrix();
        for (index, water) in scene.waters.iter().take(MAX_WATERS).enumerate() {
            let offset = self.waters.write(
                queue,
                index as u32,
                &WaterUniforms {
                    view_projection: view_projection.to_cols_array_2d(),
                    model: water.transform.matrix().to_cols_array_2d(),
                    camera_position: scene.camera.position.extend(1.0).to_array(),
                    light_position: scene.sun.position.extend(0.0).to_array(),
                    light_color: scene.sun.color.extend(1.0).to_array(),
                    params: [
                        water.time,
                        DISTORTION_STRENGTH,
                        target.width as f32,
                        target.height as f32,
                    ],
                    planes: [config.z_near, config.z_far, 0.0, 0.0],
                },
            );

            let (Some(reflection), Some(refraction)) =
                (&water.reflection.color, &water.refraction.color)
            else {
                log::error!("water targets are missing colour attachments");
                continue;
            };
            let Some(refraction_depth) = &water.refraction.depth else {
                log::error!("water refraction target is missing its depth attachment");
                continue;
            };
            let inputs = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("water.inputs"),
                layout: &self.inputs_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(&reflection.view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(&refraction.view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::TextureView(&water.distortion_map.view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: wgpu::BindingResource::TextureView(&water.normal_map.view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 4,
                        resource: wgpu::BindingResource::Sampler(&reflection.sampler),
                    },
                    wgpu::BindGroupEntry {
                        binding: 5,
                        resource: wgpu::BindingResource::Sampler(&self.detail_sampler),
                    },
                    wgpu::BindGroupEntry {
                        binding: 6,
                        resource: wgpu::BindingResource::TextureView(&refraction_depth.view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 7,
                        resource: wgpu::BindingResource::Sampler(&refraction_depth.sampler),
                    },
                ],
            });

            let attachments = target.color_attachments(wgpu::LoadOp::Load);
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("water.surface"),
                color_attachments: &attachments,
                depth_stencil_attachment: target.depth_attachment(wgpu::LoadOp::Load),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.water_group, &[offset]);
            pass.set_bind_group(1, &inputs, &[]);
            quad.draw(&mut pass);
        }
    }
}
