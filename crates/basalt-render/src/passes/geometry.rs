use basalt_core::error::EngineError;
use bytemuck::{Pod, Zeroable};
use glam::Mat4;

use crate::framebuffer::{DepthSettings, Framebuffer, FramebufferDesc, COLOR_FORMAT};
use crate::passes::common::{
    color_target, create_pipeline, create_shader, depth_state, material_bind_group,
    material_layout, PipelineDesc,
};
use crate::renderer::{ChunkMeshPool, ObjectOffsets};
use crate::scene::{Material, Scene};
use crate::uniforms::{ObjectUniforms, UniformArena, UniformBuffer};

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct FrameUniforms {
    view_projection: [[f32; 4]; 4],
}

/// G-buffer clear value. Alpha must stay zero: fragments mark themselves
/// foreground by writing w = 1, and the occlusion and lighting shaders
/// treat w < 0.5 as background.
const GBUFFER_CLEAR: wgpu::Color = wgpu::Color::TRANSPARENT;

/// Fills the g-buffer: albedo, world-space normal, world-space position,
/// plus scene depth.
pub struct GeometryPass {
    pipeline: wgpu::RenderPipeline,
    pub g_buffer: Framebuffer,
    frame: UniformBuffer,
    frame_group: wgpu::BindGroup,
    object_group: wgpu::BindGroup,
    material_layout: wgpu::BindGroupLayout,
}

impl GeometryPass {
    pub fn new(
        device: &wgpu::Device,
        objects: &UniformArena,
        width: u32,
        height: u32,
    ) -> Result<Self, EngineError> {
        let shader = create_shader(
            device,
            "geometry",
            include_str!("../../shaders/geometry.wgsl"),
        );

        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("geometry.frame"),
            entries: &[UniformBuffer::layout_entry(0, wgpu::ShaderStages::VERTEX)],
        });
        let object_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("geometry.object"),
            entries: &[UniformArena::layout_entry::<ObjectUniforms>(
                0,
                wgpu::ShaderStages::VERTEX_FRAGMENT,
            )],
        });
        let material_layout = material_layout(device);

        let pipeline = create_pipeline(
            device,
            &PipelineDesc {
                label: "geometry",
                shader: &shader,
                vs_entry: "vs_main",
                fs_entry: Some("fs_main"),
                bind_group_layouts: &[&frame_layout, &object_layout, &material_layout],
                targets: &[
                    color_target(COLOR_FORMAT),
                    color_target(COLOR_FORMAT),
                    color_target(COLOR_FORMAT),
                ],
                depth: Some(depth_state(true, wgpu::CompareFunction::Less)),
                cull: Some(wgpu::Face::Back),
            },
        );

        let g_buffer = Framebuffer::new(
            device,
            "g_buffer",
            &FramebufferDesc {
                width,
                height,
                depth: DepthSettings::EnableDepth,
                g_buffer: true,
                single_channel: false,
            },
        )?;

        let frame = UniformBuffer::new::<FrameUniforms>(device, "geometry.frame");
        let frame_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("geometry.frame"),
            layout: &frame_layout,
            entries: &[frame.binding(0)],
        });
        let object_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("geometry.object"),
            layout: &object_layout,
            entries: &[objects.binding::<ObjectUniforms>(0)],
        });

        Ok(Self {
            pipeline,
            g_buffer,
            frame,
            frame_group,
            object_group,
            material_layout,
        })
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) -> Result<(), EngineError> {
        self.g_buffer = Framebuffer::new(
            device,
            "g_buffer",
            &FramebufferDesc {
                width,
                height,
                depth: DepthSettings::EnableDepth,
                g_buffer: true,
                single_channel: false,
            },
        )?;
        Ok(())
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
        view_projection: Mat4,
    ) {
        self.frame.write(
            queue,
            &FrameUniforms {
                view_projection: view_projection.to_cols_array_2d(),
            },
        );

        let atlas_group = material_bind_group(
            device,
            &self.material_layout,
            &Material {
                diffuse: scene.terrain_atlas.clone(),
                normal_map: None,
            },
        );

        let attachments = self.g_buffer.color_attachments(wgpu::LoadOp::Clear(GBUFFER_CLEAR));
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("geometry"),
            color_attachments: &attachments,
            depth_stencil_attachment: self.g_buffer.depth_attachment(wgpu::LoadOp::Clear(1.0)),
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.frame_group, &[]);

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
    fn test_gbuffer_clear_leaves_background_unmarked() {
        // Normal and position shaders read w as the foreground marker; an
        // alpha-one clear would make every sky pixel look like geometry.
        assert!(GBUFFER_CLEAR.a < 0.5);
        assert_eq!(GBUFFER_CLEAR.r, 0.0);
        assert_eq!(GBUFFER_CLEAR.g, 0.0);
        assert_eq!(GBUFFER_CLEAR.b, 0.0);
    }
}
