use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};

use crate::framebuffer::{Framebuffer, COLOR_FORMAT};
use crate::passes::common::{
    color_target, create_pipeline, create_shader, depth_state, depth_texture_entry,
    material_bind_group, material_layout, sampler_entry, PipelineDesc,
};
use crate::renderer::{ChunkMeshPool, ObjectOffsets};
use crate::scene::{Material, Scene};
use crate::uniforms::{ObjectUniforms, UniformArena, UniformBuffer};

/// Most water surfaces drawn per frame; each one adds a reflection and a
/// refraction re-render on top of the main view.
pub(crate) const MAX_WATERS: usize = 8;

/// Frame-uniform slots needed by the forward passes: slot 0 for the main
/// view, then two per water surface. Sized so the last refraction slot
/// (`2 + 2 * (MAX_WATERS - 1)`) stays in range.
pub(crate) const FORWARD_VIEW_SLOTS: u32 = 1 + 2 * MAX_WATERS as u32;

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct FrameUniforms {
    view_projection: [[f32; 4]; 4],
    light_space: [[f32; 4]; 4],
    light_position: [f32; 4],
    light_color: [f32; 4],
    ambient: [f32; 4],
    clip_plane: [f32; 4],
    params: [f32; 4],
}

/// Forward-shaded scene rendering with an optional world-space clip plane.
/// Invoked once per water target per frame, with a distinct frame-uniform
/// slot for each invocation; the shared object arena is written by the
/// renderer once per frame and reused across invocations.
pub struct DiffusePass {
    pipeline: wgpu::RenderPipeline,
    frames: UniformArena,
    frame_group: wgpu::BindGroup,
    object_group: wgpu::BindGroup,
    material_layout: wgpu::BindGroupLayout,
    shadow_layout: wgpu::BindGroupLayout,
}

pub struct DiffuseTarget<'a> {
    pub framebuffer: &'a Framebuffer,
    pub view_projection: Mat4,
    pub clip_plane: Option<Vec4>,
    /// Frame-uniform slot for this invocation; distinct per call per frame.
    pub slot: u32,
}

impl DiffusePass {
    pub fn new(device: &wgpu::Device, objects: &UniformArena) -> Self {
        let shader = create_shader(device, "diffuse", include_str!("../../shaders/diffuse.wgsl"));

        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("diffuse.frame"),
            entries: &[UniformArena::layout_entry::<FrameUniforms>(
                0,
                wgpu::ShaderStages::VERTEX_FRAGMENT,
            )],
        });
        let object_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("diffuse.object"),
            entries: &[UniformArena::layout_entry::<ObjectUniforms>(
                0,
                wgpu::ShaderStages::VERTEX_FRAGMENT,
            )],
        });
        let material_layout = material_layout(device);
        let shadow_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("diffuse.shadow"),
            entries: &[depth_texture_entry(0), sampler_entry(1, false)],
        });

        let pipeline = create_pipeline(
            device,
            &PipelineDesc {
                label: "diffuse",
                shader: &shader,
                vs_entry: "vs_main",
                fs_entry: Some("fs_main"),
                bind_group_layouts: &[
                    &frame_layout,
                    &object_layout,
                    &material_layout,
                    &shadow_layout,
                ],
                targets: &[color_target(COLOR_FORMAT)],
                depth: Some(depth_state(true, wgpu::CompareFunction::Less)),
                cull: Some(wgpu::Face::Back),
            },
        );

        let frames = UniformArena::new(device, "diffuse.frame", FORWARD_VIEW_SLOTS);
        let frame_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("diffuse.frame"),
            layout: &frame_layout,
            entries: &[frames.binding::<FrameUniforms>(0)],
        });
        let object_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("diffuse.object"),
            layout: &object_layout,
            entries: &[objects.binding::<ObjectUniforms>(0)],
        });

        Self {
            pipeline,
            frames,
            frame_group,
            object_group,
            material_layout,
            shadow_layout,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn render(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        scene: &Scene,
        chunk_meshes: &ChunkMeshPool,
        offsets: &ObjectOffsets,
        light_space: Mat4,
        target: &DiffuseTarget,
    ) {
        let clip_plane = target.clip_plane.unwrap_or(Vec4::ZERO);
        let frame_offset = self.frames.write(
            queue,
            target.slot,
            &FrameUniforms {
                view_projection: target.view_projection.to_cols_array_2d(),
                light_space: light_space.to_cols_array_2d(),
                light_position: scene.sun.position.extend(0.0).to_array(),
                light_color: scene.sun.color.extend(1.0).to_array(),
                ambient: scene.ambient_light.extend(1.0).to_array(),
                clip_plane: clip_plane.to_array(),
                params: [
                    if target.clip_plane.is_some() { 1.0 } else { 0.0 },
                    0.0,
                    0.0,
                    0.0,
                ],
            },
        );

        let shadow = scene.sun.shadow_map.depth.as_ref();
        let shadow_group = shadow.map(|texture| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("diffuse.shadow"),
                layout: &self.shadow_layout,
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
            })
        });
        let Some(shadow_group) = shadow_group else {
            log::error!("sun shadow map is missing its depth attachment");
            return;
        };

        let atlas_group = material_bind_group(
            device,
            &self.material_layout,
            &Material {
                diffuse: scene.terrain_atlas.clone(),
                normal_map: None,
            },
        );

        let attachments = target
            .framebuffer
            .color_attachments(wgpu::LoadOp::Clear(wgpu::Color::BLACK));
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("diffuse"),
            color_attachments: &attachments,
            depth_stencil_attachment: target
                .framebuffer
                .depth_attachment(wgpu::LoadOp::Clear(1.0)),
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.frame_group, &[frame_offset]);
        pass.set_bind_group(3, &shadow_group, &[]);

        for (entity, mesh_offsets) in scene.entities.iter().zip(&offsets.entities) {
            for (textured, offset) in entity.meshes.iter().zip(mesh_offsets) {
                pass.set_bind_group(1, &self.object_group, &[*offset]);
                let material = material_bind_group(device, &self.material_layout, &textured.material);
                pass.set_bind_group(2, &material, &[]);
                textured.mesh.draw(&mut pass);
            }
        }

        pass.set_bind_group(2, &atlas_group, &[]);
        for ((_, mesh), offset) in chunk_meshes.iter().zip(&offsets.chunks) {
            pass.set_bind_group(1, &self.object_group, &[*offset]);
            mesh.draw(&mut pass);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_slots_cover_every_water_view() {
        // Reflection uses 1 + 2i, refraction 2 + 2i; the refraction slot of
        // the last supported water must still fit the arena.
        let last = (MAX_WATERS - 1) as u32;
        assert!(1 + 2 * last < FORWARD_VIEW_SLOTS);
        assert!(2 + 2 * last < FORWARD_VIEW_SLOTS);
    }
}
