//! Platform layer: window, event/animation loop, keyboard input, and the
//! handoff between background loaders and the renderer.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use asset::{mesh::MeshData, texture::TextureData};
use corelib::{shade::ShadeMode, spin::Spin};
use renderer::GpuState;

pub mod handoff;
pub mod loader;

use crate::handoff::Handoff;

/// Everything the viewer needs to start, straight from the CLI.
#[derive(Clone, Debug)]
pub struct ViewerConfig {
    pub width: u32,
    pub height: u32,
    pub backends: wgpu::Backends,
    pub model_path: PathBuf,
    pub color_map_path: PathBuf,
    pub normal_map_path: PathBuf,
    /// Uniform scale applied to OBJ positions at parse time.
    pub model_scale: f32,
    /// Flip triangle winding (and negate normals) while parsing.
    pub reverse_winding: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 800,
            backends: wgpu::Backends::all(),
            model_path: PathBuf::from("assets/orange.obj"),
            color_map_path: PathBuf::from("assets/color.jpg"),
            normal_map_path: PathBuf::from("assets/normal.jpg"),
            model_scale: 100.0,
            reverse_winding: true,
        }
    }
}

/// Run the viewer until the window closes.
pub fn run(config: ViewerConfig) -> Result<()> {
    let event_loop: EventLoop<()> =
        EventLoop::new().map_err(|e| anyhow::anyhow!("Failed to create event loop: {e}"))?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = ViewerApp::new(config);
    event_loop
        .run_app(&mut app)
        .map_err(|e| anyhow::anyhow!("Event loop error: {e:?}"))?;
    Ok(())
}

struct ViewerApp {
    config: ViewerConfig,
    window: Option<Arc<Window>>,
    gpu: Option<GpuState>,
    spin: Spin,
    last_tick: Option<Instant>,
    mesh_slot: Handoff<MeshData>,
    color_slot: Handoff<TextureData>,
    normal_slot: Handoff<TextureData>,
}

impl ViewerApp {
    fn new(config: ViewerConfig) -> Self {
        Self {
            config,
            window: None,
            gpu: None,
            spin: Spin::default(),
            last_tick: None,
            mesh_slot: Handoff::new(),
            color_slot: Handoff::new(),
            normal_slot: Handoff::new(),
        }
    }

    /// Move freshly-loaded assets into GPU state. Each slot yields a value
    /// at most once, so the model upload happens exactly once per session
    /// no matter how many frames tick afterwards.
    fn drain_asset_slots(&mut self) {
        let Some(gpu) = self.gpu.as_mut() else { return };
        if let Some(mesh) = self.mesh_slot.take() {
            gpu.upload_model(&mesh);
        }
        if let Some(tex) = self.color_slot.take() {
            gpu.set_color_map(&tex);
        }
        if let Some(tex) = self.normal_slot.take() {
            gpu.set_normal_map(&tex);
        }
    }

    fn handle_key(&mut self, code: KeyCode) {
        // The three radio buttons of the original, as number keys. Keys
        // that map to no control id leave the mode unchanged.
        let control_id = match code {
            KeyCode::Digit1 => "texture",
            KeyCode::Digit2 => "lighting",
            KeyCode::Digit3 => "normal",
            _ => return,
        };
        if let Some(mode) = ShadeMode::from_control_id(control_id) {
            log::info!("Shading mode: {mode:?}");
            if let Some(gpu) = self.gpu.as_mut() {
                gpu.set_shade_mode(mode);
            }
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        self.drain_asset_slots();

        let now = Instant::now();
        let elapsed = self.last_tick.map(|t| now - t).unwrap_or_default();
        self.last_tick = Some(now);
        let angle = self.spin.step(elapsed);

        let Some(gpu) = self.gpu.as_mut() else { return };
        match gpu.render(angle) {
            Ok(()) => {}
            Err(err) if GpuState::is_surface_lost(&err) => {
                log::warn!("Surface lost/outdated; reconfiguring");
                gpu.recreate_surface();
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("Out of GPU memory; exiting");
                event_loop.exit();
            }
            Err(err) => log::warn!("Frame skipped: {err:?}"),
        }
    }
}

impl ApplicationHandler for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title("OBJ Viewer")
            .with_inner_size(PhysicalSize::new(self.config.width, self.config.height))
            .with_resizable(false);
        let window = match event_loop.create_window(attrs) {
            Ok(w) => Arc::new(w),
            Err(err) => {
                log::error!("Failed to create window: {err}");
                event_loop.exit();
                return;
            }
        };
        log::info!(
            "Window created: {}x{}",
            window.inner_size().width,
            window.inner_size().height
        );

        match pollster::block_on(GpuState::new(window.clone(), self.config.backends)) {
            Ok(gpu) => self.gpu = Some(gpu),
            Err(err) => {
                log::error!("GPU initialization failed: {err}");
                event_loop.exit();
                return;
            }
        }

        // Kick off the three independent loads. Completion order relative
        // to each other (and to the first frames) is unconstrained; each
        // result lands in its own slot.
        loader::spawn_mesh_load(
            self.config.model_path.clone(),
            self.config.model_scale,
            self.config.reverse_winding,
            self.mesh_slot.clone(),
        );
        loader::spawn_texture_load(
            "color",
            self.config.color_map_path.clone(),
            self.color_slot.clone(),
        );
        loader::spawn_texture_load(
            "normal",
            self.config.normal_map_path.clone(),
            self.normal_slot.clone(),
        );

        window.request_redraw();
        self.window = Some(window);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested. Exiting event loop.");
                event_loop.exit();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => self.handle_key(code),
            WindowEvent::Resized(new_size) => {
                // The window is fixed-size; this fires for surface
                // recovery and DPI churn. The camera aspect stays put.
                if let Some(gpu) = self.gpu.as_mut() {
                    gpu.resize(new_size.width, new_size.height);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        // Self-rescheduling animation loop: ask for the next frame as soon
        // as the current batch of events is handled.
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}
