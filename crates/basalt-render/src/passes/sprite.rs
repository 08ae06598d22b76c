use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4};

use crate::mesh::GpuMesh;
use crate::passes::common::{
    alpha_blend_target, create_pipeline, create_shader, sampler_entry, texture_entry, PipelineDesc,
};
use crate::scene::Scene;
use crate::uniforms::UniformArena;

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct SpriteUniforms {
    matrix: [[f32; 4]; 4],
}

/// Draws screen-space sprites straight onto the window surface, after the
/// composite. The projection has its translation stripped so sprites stay
/// glued to the view.
pub struct SpritePass {
    pipeline: wgpu::RenderPipeline,
    sprites: UniformArena,
    sprite_group: wgpu::BindGroup,
    texture_layout: wgpu::BindGroupLayout,
}

impl SpritePass {
    pub fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat) -> Self {
        let shader = create_shader(device, "sprite", include_str!("../../shaders/sprite.wgsl"));

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("sprite.uniforms"),
            entries: &[UniformArena::layout_entry::<SpriteUniforms>(
                0,
                wgpu::ShaderStages::VERTEX,
            )],
        });
        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("sprite.texture"),
            entries: &[texture_entry(0, true), sampler_entry(1, true)],
        });

        let pipeline = create_pipeline(
            device,
            &PipelineDesc {
                label: "sprite",
                shader: &shader,
                vs_entry: "vs_main",
                fs_entry: Some("fs_main"),
                bind_group_layouts: &[&uniform_layout, &texture_layout],
                targets: &[alpha_blend_target(surface_format)],
                depth: None,
                cull: None,
            },
        );

        let sprites = UniformArena::new(device, "sprite.uniforms", 16);
        let sprite_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("sprite.uniforms"),
            layout: &uniform_layout,
            entries: &[sprites.binding::<SpriteUniforms>(0)],
        });

        Self {
            pipeline,
            sprites,
            sprite_group,
            texture_layout,
        }
    }

    pub fn render(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        quad: &GpuMesh,
        scene: &Scene,
        surface: &wgpu::TextureView,
        projection: Mat4,
    ) {
        if scene.sprites.is_empty() {
            return;
        }

        let screen = Mat4::from_mat3(Mat3::from_mat4(projection));
        let mut offsets = Vec::with_capacity(scene.sprites.len());
        for (index, sprite) in scene.sprites.iter().enumerate() {
            offsets.push(self.sprites.write(
                queue,
                index as u32,
                &SpriteUniforms {
                    matrix: (screen * sprite.transform.matrix()).to_cols_array_2d(),
                },
            ));
        }

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("sprite"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: surface,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_pipeline(&self.pipeline);

        for (sprite, offset) in scene.sprites.iter().zip(&offsets) {
            pass.set_bind_group(0, &self.sprite_group, &[*offset]);
            let texture_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("sprite.texture"),
                layout: &self.texture_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(&sprite.texture.view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(&sprite.texture.sampler),
                    },
                ],
            });
            pass.set_bind_group(1, &texture_group, &[]);
            quad.draw(&mut pass);
        }
    }
}
