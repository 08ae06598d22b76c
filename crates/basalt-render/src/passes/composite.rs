use crate::framebuffer::Framebuffer;
use crate::mesh::GpuMesh;
use crate::passes::common::{
    color_target, create_pipeline, create_shader, sampler_entry, texture_entry, PipelineDesc,
};

/// Adds the bloom layer to the scene, tone maps, and writes the result to
/// the window surface. The internal render resolution is upscaled here by
/// plain bilinear sampling.
pub struct CompositePass {
    pipeline: wgpu::RenderPipeline,
    inputs_layout: wgpu::BindGroupLayout,
}

impl CompositePass {
    pub fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat) -> Self {
        let shader = create_shader(
            device,
            "composite",
            include_str!("../../shaders/composite.wgsl"),
        );

        let inputs_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("composite.inputs"),
            entries: &[
                texture_entry(0, true),
                texture_entry(1, true),
                sampler_entry(2, true),
            ],
        });

        let pipeline = create_pipeline(
            device,
            &PipelineDesc {
                label: "composite",
                shader: &shader,
                vs_entry: "vs_fullscreen",
                fs_entry: Some("fs_main"),
                bind_group_layouts: &[&inputs_layout],
                targets: &[color_target(surface_format)],
                depth: None,
                cull: None,
            },
        );

        Self {
            pipeline,
            inputs_layout,
        }
    }

    pub fn render(
        &self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        quad: &GpuMesh,
        scene: &Framebuffer,
        bloom: &Framebuffer,
        surface: &wgpu::TextureView,
    ) {
        let (Some(scene_color), Some(bloom_color)) = (&scene.color, &bloom.color) else {
            log::error!("composite inputs are missing colour attachments");
            return;
        };

        let inputs = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("composite.inputs"),
            layout: &self.inputs_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&scene_color.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&bloom_color.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&scene_color.sampler),
                },
            ],
        });

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("composite"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: surface,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &inputs, &[]);
        quad.draw(&mut pass);
    }
}
