use basalt_world::World;
use bytemuck::{Pod, Zeroable};
use glam::Mat4;

use crate::passes::common::{create_pipeline, create_shader, depth_state, PipelineDesc};
use crate::renderer::ChunkMeshPool;
use crate::scene::Scene;
use crate::uniforms::UniformArena;

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct ShadowUniforms {
    mvp: [[f32; 4]; 4],
}

/// Renders scene depth from the sun's point of view into the light's shadow
/// map. Entities are drawn with front-face culling to push acne onto back
/// faces; chunk meshes keep back-face culling because block interiors are
/// solid and their front faces carry the detail.
pub struct ShadowPass {
    entity_pipeline: wgpu::RenderPipeline,
    chunk_pipeline: wgpu::RenderPipeline,
    objects: UniformArena,
    bind_group: wgpu::BindGroup,
}

impl ShadowPass {
    pub fn new(device: &wgpu::Device) -> Self {
        let shader = create_shader(device, "shadow", include_str!("../../shaders/shadow.wgsl"));
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("shadow.objects"),
            entries: &[UniformArena::layout_entry::<ShadowUniforms>(
                0,
                wgpu::ShaderStages::VERTEX,
            )],
        });

        let pipeline = |label, cull| {
            create_pipeline(
                device,
                &PipelineDesc {
                    label,
                    shader: &shader,
                    vs_entry: "vs_main",
                    fs_entry: None,
                    bind_group_layouts: &[&layout],
                    targets: &[],
                    depth: Some(depth_state(true, wgpu::CompareFunction::Less)),
                    cull: Some(cull),
                },
            )
        };
        let entity_pipeline = pipeline("shadow.entities", wgpu::Face::Front);
        let chunk_pipeline = pipeline("shadow.chunks", wgpu::Face::Back);

        let objects = UniformArena::new(device, "shadow.objects", 64);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("shadow.objects"),
            layout: &layout,
            entries: &[objects.binding::<ShadowUniforms>(0)],
        });

        Self {
            entity_pipeline,
            chunk_pipeline,
            objects,
            bind_group,
        }
    }

    pub fn render(
        &self,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        scene: &Scene,
        world: &World,
        chunk_meshes: &ChunkMeshPool,
        light_space: Mat4,
    ) {
        // One arena slot per entity, then one per live chunk mesh.
        let mut slot = 0u32;
        let mut entity_offsets = Vec::with_capacity(scene.entities.len());
        for entity in &scene.entities {
            let mvp = light_space * entity.transform.matrix();
            entity_offsets.push(self.objects.write(
                queue,
                slot,
                &ShadowUniforms {
                    mvp: mvp.to_cols_array_2d(),
                },
            ));
            slot += 1;
        }
        let mut chunk_offsets = Vec::new();
        for (chunk_slot, _) in chunk_meshes.iter() {
            let model = Mat4::from_translation(world.chunk(chunk_slot).world_offset());
            chunk_offsets.push(self.objects.write(
                queue,
                slot,
                &ShadowUniforms {
                    mvp: (light_space * model).to_cols_array_2d(),
                },
            ));
            slot += 1;
        }

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("shadow"),
            color_attachments: &[],
            depth_stencil_attachment: scene
                .sun
                .shadow_map
                .depth_attachment(wgpu::LoadOp::Clear(1.0)),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        pass.set_pipeline(&self.entity_pipeline);
        for (entity, offset) in scene.entities.iter().zip(&entity_offsets) {
            pass.set_bind_group(0, &self.bind_group, &[*offset]);
            for textured in &entity.meshes {
                textured.mesh.draw(&mut pass);
            }
        }

        pass.set_pipeline(&self.chunk_pipeline);
        for ((_, mesh), offset) in chunk_meshes.iter().zip(&chunk_offsets) {
            pass.set_bind_group(0, &self.bind_group, &[*offset]);
            mesh.draw(&mut pass);
        }
    }
}
