mod assets;
mod gpu;
mod input;

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use basalt_core::block::Block;
use basalt_core::config::RenderConfig;
use basalt_core::error::EngineError;
use basalt_core::rng::FrameRng;
use basalt_render::scene::{CloudSettings, Scene, Sprite, Transform, Water};
use basalt_render::{Camera, DirectionalLight, Renderer};
use basalt_world::{raycast, TerrainGenerator, World};
use glam::Vec3;
use winit::application::ApplicationHandler;
use winit::event::{DeviceEvent, DeviceId, ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{CursorGrabMode, Window, WindowId};

use crate::assets::Assets;
use crate::gpu::GpuContext;
use crate::input::InputState;

const MOVE_SPEED: f32 = 12.0;
const MOUSE_SENSITIVITY: f32 = 0.08;
const WATER_WAVE_SPEED: f32 = 0.03;
const WATER_HEIGHT: f32 = 4.6;

struct Engine {
    window: Arc<Window>,
    gpu: GpuContext,
    renderer: Renderer,
    scene: Scene,
    world: World,
    input: InputState,
    last_frame: Instant,
    cursor_captured: bool,
}

impl Engine {
    fn new(window: Arc<Window>) -> Result<Self, EngineError> {
        let config = RenderConfig::load(Path::new("basalt.ron"))?;
        let gpu = GpuContext::new(window.clone())?;
        let size = window.inner_size();
        let renderer = Renderer::new(
            &gpu.device,
            &gpu.queue,
            config.clone(),
            gpu.surface_config.format,
            size.width,
            size.height,
        )?;
        let (render_width, render_height) = renderer.render_size();

        let mut assets = Assets::new("assets");
        let terrain_atlas = assets.texture(&gpu.device, &gpu.queue, "atlas.png", true)?;
        let skybox = assets.cubemap(&gpu.device, &gpu.queue, "skybox")?;
        let dudv = assets.texture(&gpu.device, &gpu.queue, "water_dudv.png", false)?;
        let water_normals = assets.texture(&gpu.device, &gpu.queue, "water_normal.png", false)?;
        let crosshair = assets.texture(&gpu.device, &gpu.queue, "crosshair.png", false)?;

        let seed = FrameRng::from_entropy().next_u64();
        log::info!("terrain seed {seed:#x}");
        let world = World::generate(&TerrainGenerator::new(seed))?;

        let water = Water::new(
            &gpu.device,
            &config,
            render_width,
            render_height,
            Transform {
                position: Vec3::new(64.0, WATER_HEIGHT, 64.0),
                rotation_degrees: Vec3::new(-90.0, 0.0, 0.0),
                scale: Vec3::splat(64.0),
            },
            dudv,
            water_normals,
        )?;

        let scene = Scene {
            camera: Camera::new(Vec3::new(64.0, 48.0, 64.0)),
            sun: DirectionalLight::new(
                &gpu.device,
                &config,
                Vec3::new(150.0, 220.0, 100.0),
                Vec3::new(1.0, 0.95, 0.85),
            )?,
            ambient_light: Vec3::splat(0.45),
            skybox: Some(skybox),
            skybox_tint: Vec3::new(1.0, 0.98, 0.95),
            terrain_atlas,
            entities: Vec::new(),
            waters: vec![water],
            sprites: vec![Sprite {
                texture: crosshair,
                transform: Transform {
                    position: Vec3::ZERO,
                    rotation_degrees: Vec3::ZERO,
                    scale: Vec3::splat(0.02),
                },
            }],
            clouds: CloudSettings::default(),
        };

        Ok(Self {
            window,
            gpu,
            renderer,
            scene,
            world,
            input: InputState::default(),
            last_frame: Instant::now(),
            cursor_captured: false,
        })
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<(), EngineError> {
        self.gpu.resize(width, height);
        self.renderer
            .resize(&self.gpu.device, &self.gpu.queue, width, height)?;
        let (render_width, render_height) = self.renderer.render_size();
        let config = self.renderer.config().clone();
        for water in &mut self.scene.waters {
            water.resize(&self.gpu.device, &config, render_width, render_height)?;
        }
        Ok(())
    }

    fn capture_cursor(&mut self) {
        let grabbed = self
            .window
            .set_cursor_grab(CursorGrabMode::Locked)
            .or_else(|_| self.window.set_cursor_grab(CursorGrabMode::Confined));
        if let Err(e) = grabbed {
            log::warn!("could not grab cursor: {e}");
            return;
        }
        self.window.set_cursor_visible(false);
        self.cursor_captured = true;
    }

    fn release_cursor(&mut self) {
        if let Err(e) = self.window.set_cursor_grab(CursorGrabMode::None) {
            log::warn!("could not release cursor: {e}");
        }
        self.window.set_cursor_visible(true);
        self.cursor_captured = false;
    }

    fn update(&mut self, dt: f32) -> Result<(), EngineError> {
        let camera = &mut self.scene.camera;

        if self.cursor_captured {
            let (dx, dy) = self.input.take_mouse_delta();
            camera.yaw += dx as f32 * MOUSE_SENSITIVITY;
            camera.pitch = (camera.pitch + dy as f32 * MOUSE_SENSITIVITY).clamp(-89.0, 89.0);
        } else {
            self.input.take_mouse_delta();
        }

        let yaw = camera.yaw.to_radians();
        let forward = Vec3::new(yaw.sin(), 0.0, -yaw.cos());
        let right = Vec3::new(yaw.cos(), 0.0, yaw.sin());
        let mut movement = Vec3::ZERO;
        if self.input.is_held(KeyCode::KeyW) {
            movement += forward;
        }
        if self.input.is_held(KeyCode::KeyS) {
            movement -= forward;
        }
        if self.input.is_held(KeyCode::KeyD) {
            movement += right;
        }
        if self.input.is_held(KeyCode::KeyA) {
            movement -= right;
        }
        if self.input.is_held(KeyCode::Space) {
            movement += Vec3::Y;
        }
        if self.input.is_held(KeyCode::ShiftLeft) {
            movement -= Vec3::Y;
        }
        camera.position += movement.normalize_or_zero() * MOVE_SPEED * dt;

        let origin = camera.position;
        let direction = camera.direction_vector();
        if self.cursor_captured && self.input.take_left_click() {
            if let Some(position) = raycast::break_block(&mut self.world, origin, direction)? {
                log::debug!("broke block at {position:?}");
            }
        }
        if self.cursor_captured && self.input.take_right_click() {
            if let Some(position) =
                raycast::place_block(&mut self.world, origin, direction, Block::Stone)?
            {
                log::debug!("placed block at {position:?}");
            }
        }

        for water in &mut self.scene.waters {
            water.time = (water.time + dt * WATER_WAVE_SPEED).fract();
        }
        self.scene.clouds.time += dt;
        Ok(())
    }

    fn frame(&mut self) -> Result<(), EngineError> {
        let now = Instant::now();
        let dt = (now - self.last_frame).as_secs_f32().min(0.1);
        self.last_frame = now;
        self.update(dt)?;

        let frame = match self.gpu.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let size = self.window.inner_size();
                self.resize(size.width, size.height)?;
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => return Ok(()),
            Err(e) => return Err(EngineError::SurfaceConfigFailed(e.to_string())),
        };
        let surface_view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame"),
            });
        self.renderer.render(
            &self.gpu.device,
            &self.gpu.queue,
            &mut encoder,
            &surface_view,
            &self.scene,
            &self.world,
        )?;
        self.gpu.queue.submit([encoder.finish()]);
        frame.present();

        self.window.request_redraw();
        Ok(())
    }
}

#[derive(Default)]
struct App {
    engine: Option<Engine>,
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.engine.is_some() {
            return;
        }
        let attributes = Window::default_attributes()
            .with_title("basalt")
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));
        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("window creation failed: {e}");
                event_loop.exit();
                return;
            }
        };
        match Engine::new(window) {
            Ok(engine) => {
                engine.window.request_redraw();
                self.engine = Some(engine);
            }
            Err(e) => {
                log::error!("initialization failed: {e}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(engine) = &mut self.engine else {
            return;
        };
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if let Err(e) = engine.resize(size.width, size.height) {
                    log::error!("resize failed: {e}");
                    event_loop.exit();
                }
            }
            WindowEvent::Focused(false) => engine.release_cursor(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        ..
                    },
                ..
            } => {
                if code == KeyCode::Escape && state == ElementState::Pressed {
                    engine.release_cursor();
                } else {
                    engine.input.handle_key(code, state);
                }
            }
            WindowEvent::MouseInput { button, state, .. } => {
                if !engine.cursor_captured && state == ElementState::Pressed {
                    engine.capture_cursor();
                } else {
                    engine.input.handle_mouse_button(button, state);
                }
            }
            WindowEvent::RedrawRequested => {
                if let Err(e) = engine.frame() {
                    log::error!("frame failed: {e}");
                    event_loop.exit();
                }
            }
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        if let (Some(engine), DeviceEvent::MouseMotion { delta }) = (&mut self.engine, event) {
            engine.input.accumulate_mouse_motion(delta);
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(e) = run() {
        log::error!("event loop error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), winit::error::EventLoopError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);
    let mut app = App::default();
    event_loop.run_app(&mut app)
}
