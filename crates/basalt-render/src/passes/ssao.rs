use basalt_core::constants::{SSAO_KERNEL_SIZE, SSAO_NOISE_SIZE};
use basalt_core::error::EngineError;
use basalt_core::rng::FrameRng;
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use crate::framebuffer::{
    DepthSettings, Framebuffer, FramebufferDesc, SINGLE_CHANNEL_FORMAT,
};
use crate::mesh::GpuMesh;
use crate::passes::blur::BlurPass;
use crate::passes::common::{
    color_target, create_pipeline, create_shader, sampler_entry, texture_entry, PipelineDesc,
};
use crate::uniforms::UniformBuffer;

const SSAO_RADIUS: f32 = 0.5;
const SSAO_BIAS: f32 = 0.025;
// Horizontal+vertical pairs, matching the blur pass contract.
const SSAO_BLUR_PAIRS: u32 = 2;

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct SsaoUniforms {
    projection: [[f32; 4]; 4],
    view: [[f32; 4]; 4],
    kernel: [[f32; 4]; SSAO_KERNEL_SIZE],
    noise_scale: [f32; 2],
    radius: f32,
    bias: f32,
}

/// Screen-space ambient occlusion: hemisphere-sampled occlusion from the
/// g-buffer, then a separable blur to wash out the rotation-noise pattern.
pub struct SsaoPass {
    pipeline: wgpu::RenderPipeline,
    pub output: Framebuffer,
    blur: BlurPass,
    uniforms: UniformBuffer,
    uniform_group: wgpu::BindGroup,
    inputs_layout: wgpu::BindGroupLayout,
    noise_view: wgpu::TextureView,
    noise_sampler: wgpu::Sampler,
    kernel: [[f32; 4]; SSAO_KERNEL_SIZE],
}

impl SsaoPass {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        width: u32,
        height: u32,
    ) -> Result<Self, EngineError> {
        let shader = create_shader(device, "ssao", include_str!("../../shaders/ssao.wgsl"));

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("ssao.uniforms"),
            entries: &[UniformBuffer::layout_entry(0, wgpu::ShaderStages::FRAGMENT)],
        });
        let inputs_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("ssao.inputs"),
            entries: &[
                texture_entry(0, true),
                texture_entry(1, true),
                texture_entry(2, true),
                sampler_entry(3, true),
                sampler_entry(4, true),
            ],
        });

        let pipeline = create_pipeline(
            device,
            &PipelineDesc {
                label: "ssao",
                shader: &shader,
                vs_entry: "vs_fullscreen",
                fs_entry: Some("fs_main"),
                bind_group_layouts: &[&uniform_layout, &inputs_layout],
                targets: &[color_target(SINGLE_CHANNEL_FORMAT)],
                depth: None,
                cull: None,
            },
        );

        let output = Framebuffer::new(
            device,
            "ssao",
            &FramebufferDesc {
                width,
                height,
                depth: DepthSettings::NoDepth,
                g_buffer: false,
                single_channel: true,
            },
        )?;
        let blur = BlurPass::new(device, queue, SINGLE_CHANNEL_FORMAT, width, height)?;

        let uniforms = UniformBuffer::new::<SsaoUniforms>(device, "ssao.uniforms");
        let uniform_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("ssao.uniforms"),
            layout: &uniform_layout,
            entries: &[uniforms.binding(0)],
        });

        let (noise_view, noise_sampler) = Self::create_noise(device, queue);

        Ok(Self {
            pipeline,
            output,
            blur,
            uniforms,
            uniform_group,
            inputs_layout,
            noise_view,
            noise_sampler,
            kernel: Self::build_kernel(),
        })
    }

    /// Hemisphere sample kernel, weighted towards the centre so close
    /// occluders dominate.
    fn build_kernel() -> [[f32; 4]; SSAO_KERNEL_SIZE] {
        let mut rng = FrameRng::from_seed(0x55A0);
        let mut kernel = [[0.0f32; 4]; SSAO_KERNEL_SIZE];
        for (i, sample) in kernel.iter_mut().enumerate() {
            let v = Vec3::new(
                rng.next_f32() * 2.0 - 1.0,
                rng.next_f32() * 2.0 - 1.0,
                rng.next_f32(),
            )
            .normalize_or_zero()
                * rng.next_f32();

            let t = i as f32 / SSAO_KERNEL_SIZE as f32;
            let scale = 0.1 + (1.0 - 0.1) * t * t;
            let v = v * scale;
            *sample = [v.x, v.y, v.z, 0.0];
        }
        kernel
    }

    /// 4x4 tiling texture of random rotation vectors, stored in a linear
    /// (non-sRGB) format.
    fn create_noise(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) -> (wgpu::TextureView, wgpu::Sampler) {
        let mut rng = FrameRng::from_seed(0x0153);
        let texel_count = (SSAO_NOISE_SIZE * SSAO_NOISE_SIZE) as usize;
        let mut pixels = Vec::with_capacity(texel_count * 4);
        for _ in 0..texel_count {
            pixels.push((rng.next_f32() * 255.0) as u8);
            pixels.push((rng.next_f32() * 255.0) as u8);
            pixels.push(128u8); // z ~ 0 after the *2-1 decode
            pixels.push(255u8);
        }

        let size = wgpu::Extent3d {
            width: SSAO_NOISE_SIZE,
            height: SSAO_NOISE_SIZE,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("ssao.noise"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        queue.write_texture(
            texture.as_image_copy(),
            &pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(SSAO_NOISE_SIZE * 4),
                rows_per_image: Some(SSAO_NOISE_SIZE),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("ssao.noise"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });
        (view, sampler)
    }

    pub fn resize(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        width: u32,
        height: u32,
    ) -> Result<(), EngineError> {
        self.output = Framebuffer::new(
            device,
            "ssao",
            &FramebufferDesc {
                width,
                height,
                depth: DepthSettings::NoDepth,
                g_buffer: false,
                single_channel: true,
            },
        )?;
        self.blur = BlurPass::new(device, queue, SINGLE_CHANNEL_FORMAT, width, height)?;
        Ok(())
    }

    pub fn render(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        quad: &GpuMesh,
        g_buffer: &Framebuffer,
        view: Mat4,
        projection: Mat4,
    ) {
        let (Some(position), Some(normal)) = (&g_buffer.position, &g_buffer.normal) else {
            log::error!("ssao input is not a g-buffer");
            return;
        };

        self.uniforms.write(
            queue,
            &SsaoUniforms {
                projection: projection.to_cols_array_2d(),
                view: view.to_cols_array_2d(),
                kernel: self.kernel,
                noise_scale: [
                    self.output.width as f32 / SSAO_NOISE_SIZE as f32,
                    self.output.height as f32 / SSAO_NOISE_SIZE as f32,
                ],
                radius: SSAO_RADIUS,
                bias: SSAO_BIAS,
            },
        );

        let inputs = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("ssao.inputs"),
            layout: &self.inputs_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&position.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&normal.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&self.noise_view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(&position.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::Sampler(&self.noise_sampler),
                },
            ],
        });

        {
            let attachments = self
                .output
                .color_attachments(wgpu::LoadOp::Clear(wgpu::Color::WHITE));
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("ssao"),
                color_attachments: &attachments,
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.uniform_group, &[]);
            pass.set_bind_group(1, &inputs, &[]);
            quad.draw(&mut pass);
        }

        self.blur.render(
            device,
            encoder,
            quad,
            &self.output,
            &self.output,
            SSAO_BLUR_PAIRS,
        );
    }
}
