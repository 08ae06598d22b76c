use basalt_core::config::RenderConfig;
use basalt_core::error::EngineError;
use basalt_world::World;
use glam::Mat4;

use crate::mesh::GpuMesh;
use crate::passes::bloom::BloomPass;
use crate::passes::clouds::CloudPass;
use crate::passes::composite::CompositePass;
use crate::passes::diffuse::DiffusePass;
use crate::passes::geometry::GeometryPass;
use crate::passes::lighting::LightingPass;
use crate::passes::shadow::ShadowPass;
use crate::passes::sky::SkyPass;
use crate::passes::sprite::SpritePass;
use crate::passes::ssao::SsaoPass;
use crate::passes::water::WaterPass;
use crate::scene::{scaled, Scene};
use crate::uniforms::{ObjectUniforms, UniformArena};

/// GPU-side chunk meshes, one slot per world chunk. The pool owns the
/// buffers; the world only tracks CPU mesh data and a revision counter, and
/// a slot is re-uploaded whenever its chunk's revision moves on.
pub struct ChunkMeshPool {
    slots: Vec<Option<ChunkSlot>>,
}

struct ChunkSlot {
    revision: u64,
    mesh: GpuMesh,
}

impl ChunkMeshPool {
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    pub fn sync(&mut self, device: &wgpu::Device, world: &World) {
        self.slots.resize_with(world.chunks().len(), || None);
        for (slot, chunk) in world.chunks().iter().enumerate() {
            let current = self.slots[slot].as_ref().map(|s| s.revision);
            if current == Some(chunk.revision()) {
                continue;
            }
            if chunk.mesh().indices.is_empty() {
                self.slots[slot] = None;
                continue;
            }
            log::debug!("uploading chunk mesh for slot {slot}");
            self.slots[slot] = Some(ChunkSlot {
                revision: chunk.revision(),
                mesh: GpuMesh::from_chunk(device, &format!("chunk.{slot}"), chunk.mesh()),
            });
        }
    }

    /// Live meshes with their chunk slots, in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &GpuMesh)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(slot, entry)| entry.as_ref().map(|s| (slot, &s.mesh)))
    }
}

impl Default for ChunkMeshPool {
    fn default() -> Self {
        Self::new()
    }
}

/// Dynamic offsets into the shared per-object uniform arena, written once
/// per frame and reused by the geometry pass and every forward invocation.
pub struct ObjectOffsets {
    /// Per entity, per textured mesh.
    pub entities: Vec<Vec<u32>>,
    /// Per live chunk slot, in pool iteration order.
    pub chunks: Vec<u32>,
}

/// The frame graph. Pass order is fixed: shadow, g-buffer, occlusion,
/// deferred lighting, sky, water, clouds, bloom, composite, sprites.
pub struct Renderer {
    config: RenderConfig,
    quad: GpuMesh,
    cube: GpuMesh,
    objects: UniformArena,
    chunk_meshes: ChunkMeshPool,

    shadow: ShadowPass,
    geometry: GeometryPass,
    diffuse: DiffusePass,
    ssao: SsaoPass,
    lighting: LightingPass,
    sky: SkyPass,
    water: WaterPass,
    clouds: CloudPass,
    bloom: BloomPass,
    composite: CompositePass,
    sprite: SpritePass,

    render_width: u32,
    render_height: u32,
    baked_light_space: Option<Mat4>,
    baked_revision: u64,
}

impl Renderer {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        config: RenderConfig,
        surface_format: wgpu::TextureFormat,
        window_width: u32,
        window_height: u32,
    ) -> Result<Self, EngineError> {
        let render_width = scaled(window_width, config.render_scale);
        let render_height = scaled(window_height, config.render_scale);
        let ao_width = scaled(render_width, config.ao_resolution_scale);
        let ao_height = scaled(render_height, config.ao_resolution_scale);
        let cloud_width = scaled(render_width, config.cloud_resolution_scale);
        let cloud_height = scaled(render_height, config.cloud_resolution_scale);
        log::info!(
            "renderer at {render_width}x{render_height} (window {window_width}x{window_height})"
        );

        let objects = UniformArena::new(device, "objects", 64);

        Ok(Self {
            quad: GpuMesh::quad(device),
            cube: GpuMesh::cube(device),
            shadow: ShadowPass::new(device),
            geometry: GeometryPass::new(device, &objects, render_width, render_height)?,
            diffuse: DiffusePass::new(device, &objects),
            ssao: SsaoPass::new(device, queue, ao_width, ao_height)?,
            lighting: LightingPass::new(device, render_width, render_height)?,
            sky: SkyPass::new(device),
            water: WaterPass::new(device),
            clouds: CloudPass::new(device, queue, cloud_width, cloud_height)?,
            bloom: BloomPass::new(device, queue, render_width, render_height)?,
            composite: CompositePass::new(device, surface_format),
            sprite: SpritePass::new(device, surface_format),
            objects,
            chunk_meshes: ChunkMeshPool::new(),
            config,
            render_width,
            render_height,
            baked_light_space: None,
            baked_revision: 0,
        })
    }

    pub fn render_size(&self) -> (u32, u32) {
        (self.render_width, self.render_height)
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Recreate size-dependent targets after a window resize. Water targets
    /// live in the scene and are resized by the caller against
    /// `render_size`.
    pub fn resize(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        window_width: u32,
        window_height: u32,
    ) -> Result<(), EngineError> {
        self.render_width = scaled(window_width, self.config.render_scale);
        self.render_height = scaled(window_height, self.config.render_scale);
        let ao_width = scaled(self.render_width, self.config.ao_resolution_scale);
        let ao_height = scaled(self.render_height, self.config.ao_resolution_scale);
        let cloud_width = scaled(self.render_width, self.config.cloud_resolution_scale);
        let cloud_height = scaled(self.render_height, self.config.cloud_resolution_scale);

        self.geometry.resize(device, self.render_width, self.render_height)?;
        self.ssao.resize(device, queue, ao_width, ao_height)?;
        self.lighting.resize(device, self.render_width, self.render_height)?;
        self.clouds.resize(device, cloud_width, cloud_height)?;
        self.bloom.resize(device, queue, self.render_width, self.render_height)?;
        Ok(())
    }

    /// Write the per-object uniform table for this frame: one slot per
    /// textured mesh, then one per live chunk.
    fn prepare_objects(
        &self,
        queue: &wgpu::Queue,
        scene: &Scene,
        world: &World,
    ) -> ObjectOffsets {
        let mut slot = 0u32;
        let mut entities = Vec::with_capacity(scene.entities.len());
        for entity in &scene.entities {
            let model = entity.transform.matrix().to_cols_array_2d();
            let mut mesh_offsets = Vec::with_capacity(entity.meshes.len());
            for textured in &entity.meshes {
                let has_normal_map = textured.material.normal_map.is_some();
                mesh_offsets.push(self.objects.write(
                    queue,
                    slot,
                    &ObjectUniforms {
                        model,
                        params: [if has_normal_map { 1.0 } else { 0.0 }, 0.0, 0.0, 0.0],
                    },
                ));
                slot += 1;
            }
            entities.push(mesh_offsets);
        }

        let mut chunks = Vec::new();
        for (chunk_slot, _) in self.chunk_meshes.iter() {
            let model = Mat4::from_translation(world.chunk(chunk_slot).world_offset());
            chunks.push(self.objects.write(
                queue,
                slot,
                &ObjectUniforms {
                    model: model.to_cols_array_2d(),
                    params: [0.0; 4],
                },
            ));
            slot += 1;
        }

        ObjectOffsets { entities, chunks }
    }

    /// Shadows are either re-rendered every frame, or baked once and
    /// re-baked only when a chunk mesh changes. A baked shadow keeps the
    /// light-space matrix it was rendered with, so later camera movement
    /// cannot shift the frustum fit out from under it.
    fn update_shadows(
        &mut self,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        scene: &Scene,
        world: &World,
    ) -> Mat4 {
        let revision: u64 = world.chunks().iter().map(|chunk| chunk.revision()).sum();

        if self.config.bake_static_shadows {
            if let Some(light_space) = self.baked_light_space {
                if self.baked_revision == revision {
                    return light_space;
                }
            }
        }

        let light_space = scene.sun.light_space_matrix(
            &scene.camera,
            &self.config,
            self.render_width,
            self.render_height,
        );
        self.shadow
            .render(queue, encoder, scene, world, &self.chunk_meshes, light_space);
        self.baked_light_space = Some(light_space);
        self.baked_revision = revision;
        light_space
    }

    #[allow(clippy::too_many_arguments)]
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        surface: &wgpu::TextureView,
        scene: &Scene,
        world: &World,
    ) -> Result<(), EngineError> {
        self.chunk_meshes.sync(device, world);

        let view = scene.camera.view_matrix();
        let projection =
            scene
                .camera
                .projection_matrix(&self.config, self.render_width, self.render_height);
        let view_projection = projection * view;

        let light_space = self.update_shadows(queue, encoder, scene, world);
        let offsets = self.prepare_objects(queue, scene, world);

        self.geometry.render(
            device,
            queue,
            encoder,
            scene,
            &self.chunk_meshes,
            &offsets,
            view_projection,
        );
        self.ssao.render(
            device,
            queue,
            encoder,
            &self.quad,
            &self.geometry.g_buffer,
            view,
            projection,
        );
        self.lighting.render(
            device,
            queue,
            encoder,
            &self.quad,
            scene,
            &self.geometry.g_buffer,
            &self.ssao.output,
            light_space,
        );
        self.sky.render(
            device,
            queue,
            encoder,
            &self.cube,
            scene,
            &self.lighting.output,
            view,
            projection,
            0,
        );
        self.water.render(
            device,
            queue,
            encoder,
            &self.quad,
            &self.cube,
            scene,
            &self.chunk_meshes,
            &offsets,
            &self.diffuse,
            &self.sky,
            &self.lighting.output,
            light_space,
            projection,
            &self.config,
        );
        self.clouds.render(
            device,
            queue,
            encoder,
            &self.quad,
            scene,
            &self.lighting.output,
            &self.geometry.g_buffer,
            view,
            projection,
        );
        self.bloom
            .render(device, encoder, &self.quad, &self.lighting.output);
        self.composite.render(
            device,
            encoder,
            &self.quad,
            &self.lighting.output,
            &self.bloom.output,
            surface,
        );
        self.sprite
            .render(device, queue, encoder, &self.quad, scene, surface, projection);

        Ok(())
    }
}
