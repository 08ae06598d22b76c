//! Per-frame uniform plumbing. All CPU-side uniform writes happen through
//! `queue.write_buffer`, which lands on the queue timeline ahead of the
//! frame's single submit; every (buffer, offset) region is therefore written
//! at most once per frame. Per-draw data lives in a dynamically-offset arena
//! rather than being rewritten between draws.

use bytemuck::{Pod, Zeroable};
use std::num::NonZeroU64;

/// Per-draw data shared by the geometry and forward passes: one arena slot
/// per textured mesh, then one per chunk, written once per frame.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct ObjectUniforms {
    pub model: [[f32; 4]; 4],
    /// x: 1.0 when the material carries a normal map.
    pub params: [f32; 4],
}

/// `min_uniform_buffer_offset_alignment` under the default device limits.
pub const UNIFORM_STRIDE: u64 = 256;

/// A uniform buffer sliced into fixed 256-byte slots, bound with a dynamic
/// offset. One slot per draw (or per pass invocation) per frame.
pub struct UniformArena {
    buffer: wgpu::Buffer,
    capacity: u32,
}

impl UniformArena {
    pub fn new(device: &wgpu::Device, label: &str, capacity: u32) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: capacity as u64 * UNIFORM_STRIDE,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Self { buffer, capacity }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Write one slot. Slots beyond capacity are clamped with a log error
    /// rather than a panic; the draw that needed them reuses the last slot.
    pub fn write<T: Pod>(&self, queue: &wgpu::Queue, slot: u32, value: &T) -> u32 {
        let slot = if slot < self.capacity {
            slot
        } else {
            log::error!("uniform arena overflow: slot {slot} of {}", self.capacity);
            self.capacity - 1
        };
        queue.write_buffer(
            &self.buffer,
            slot as u64 * UNIFORM_STRIDE,
            bytemuck::bytes_of(value),
        );
        slot * UNIFORM_STRIDE as u32
    }

    /// Layout entry for a dynamically-offset binding of `T`.
    pub fn layout_entry<T: Pod>(
        binding: u32,
        visibility: wgpu::ShaderStages,
    ) -> wgpu::BindGroupLayoutEntry {
        wgpu::BindGroupLayoutEntry {
            binding,
            visibility,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: true,
                min_binding_size: NonZeroU64::new(std::mem::size_of::<T>() as u64),
            },
            count: None,
        }
    }

    pub fn binding<T: Pod>(&self, binding: u32) -> wgpu::BindGroupEntry<'_> {
        wgpu::BindGroupEntry {
            binding,
            resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                buffer: &self.buffer,
                offset: 0,
                size: NonZeroU64::new(std::mem::size_of::<T>() as u64),
            }),
        }
    }
}

/// A single uniform buffer rewritten once per frame.
pub struct UniformBuffer {
    buffer: wgpu::Buffer,
}

impl UniformBuffer {
    pub fn new<T: Pod>(device: &wgpu::Device, label: &str) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: std::mem::size_of::<T>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Self { buffer }
    }

    pub fn write<T: Pod>(&self, queue: &wgpu::Queue, value: &T) {
        queue.write_buffer(&self.buffer, 0, bytemuck::bytes_of(value));
    }

    pub fn layout_entry(
        binding: u32,
        visibility: wgpu::ShaderStages,
    ) -> wgpu::BindGroupLayoutEntry {
        wgpu::BindGroupLayoutEntry {
            binding,
            visibility,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }
    }

    pub fn binding(&self, binding: u32) -> wgpu::BindGroupEntry<'_> {
        wgpu::BindGroupEntry {
            binding,
            resource: self.buffer.as_entire_binding(),
        }
    }
}
