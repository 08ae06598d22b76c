use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4};

use crate::framebuffer::{Framebuffer, COLOR_FORMAT};
use crate::mesh::GpuMesh;
use crate::passes::common::{
    color_target, create_pipeline, create_shader, cube_texture_entry, depth_state, sampler_entry,
    PipelineDesc,
};
use crate::passes::diffuse::FORWARD_VIEW_SLOTS;
use crate::scene::Scene;
use crate::uniforms::UniformArena;

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct SkyUniforms {
    view_projection: [[f32; 4]; 4],
    tint: [f32; 4],
}

/// Draws the skybox into an already-lit target, depth-testing at the far
/// plane so geometry is untouched. Runs once for the main view and once per
/// water reflection/refraction view, each with its own arena slot.
pub struct SkyPass {
    pipeline: wgpu::RenderPipeline,
    frames: UniformArena,
    frame_group: wgpu::BindGroup,
    sky_layout: wgpu::BindGroupLayout,
}

impl SkyPass {
    pub fn new(device: &wgpu::Device) -> Self {
        let shader = create_shader(device, "sky", include_str!("../../shaders/sky.wgsl"));

        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("sky.frame"),
            entries: &[UniformArena::layout_entry::<SkyUniforms>(
                0,
                wgpu::ShaderStages::VERTEX,
            )],
        });
        let sky_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("sky.cubemap"),
            entries: &[cube_texture_entry(0), sampler_entry(1, true)],
        });

        let pipeline = create_pipeline(
            device,
            &PipelineDesc {
                label: "sky",
                shader: &shader,
                vs_entry: "vs_main",
                fs_entry: Some("fs_main"),
                bind_group_layouts: &[&frame_layout, &sky_layout],
                targets: &[color_target(COLOR_FORMAT)],
                depth: Some(depth_state(false, wgpu::CompareFunction::LessEqual)),
                cull: None,
            },
        );

        let frames = UniformArena::new(device, "sky.frame", FORWARD_VIEW_SLOTS);
        let frame_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("sky.frame"),
            layout: &frame_layout,
            entries: &[frames.binding::<SkyUniforms>(0)],
        });

        Self {
            pipeline,
            frames,
            frame_group,
            sky_layout,
        }
    }

    /// `slot` must be distinct per invocation per frame.
    #[allow(clippy::too_many_arguments)]
    pub fn render(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        cube: &GpuMesh,
        scene: &Scene,
        target: &Framebuffer,
        view: Mat4,
        projection: Mat4,
        slot: u32,
    ) {
        let Some(skybox) = &scene.skybox else {
            return;
        };

        let rotation = Mat4::from_mat3(Mat3::from_mat4(view));
        let offset = self.frames.write(
            queue,
            slot,
            &SkyUniforms {
                view_projection: (projection * rotation).to_cols_array_2d(),
                tint: scene.skybox_tint.extend(1.0).to_array(),
            },
        );

        let sky_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("sky.cubemap"),
            layout: &self.sky_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&skybox.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&skybox.sampler),
                },
            ],
        });

        let attachments = target.color_attachments(wgpu::LoadOp::Load);
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("sky"),
            color_attachments: &attachments,
            depth_stencil_attachment: target.depth_attachment(wgpu::LoadOp::Load),
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.frame_group, &[offset]);
        pass.set_bind_group(1, &sky_group, &[]);
        cube.draw(&mut pass);
    }
}
