use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use cubefield_animate::{FrameTimer, FrameUpdater, UpdateStats, UpdaterConfig};
use cubefield_common::{FieldConfig, FrameToggles, Platform, TransformBuffer};
use cubefield_input::{Action, apply_toggle};
use cubefield_render_wgpu::{FlyCamera, InstanceRenderer, RenderError, check_capabilities};
use cubefield_tools::{StatsOverlay, StatsSnapshot};
use egui::Context as EguiContext;
use glam::{Mat4, Vec3};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{DeviceEvent, ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

#[derive(Clone, Copy, ValueEnum)]
enum Profile {
    Desktop,
    Compact,
}

impl From<Profile> for Platform {
    fn from(profile: Profile) -> Self {
        match profile {
            Profile::Desktop => Platform::Desktop,
            Profile::Compact => Platform::Compact,
        }
    }
}

#[derive(Parser)]
#[command(name = "cubefield-desktop", about = "Animated cube field viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Hardware profile that sizes the field
    #[arg(long, value_enum, default_value = "desktop")]
    profile: Profile,

    /// Override instances per axis (must be odd)
    #[arg(long)]
    side: Option<u32>,

    /// Field config JSON; takes precedence over --profile
    #[arg(long)]
    config: Option<PathBuf>,
}

fn field_config(cli: &Cli) -> Result<FieldConfig> {
    let mut config = match &cli.config {
        Some(path) => FieldConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => FieldConfig::for_platform(cli.profile.into()),
    };
    if let Some(side) = cli.side {
        config.side_count = side;
    }
    config.validate()?;
    Ok(config)
}

/// Toggle bound to a key press, if any.
fn key_action(key: KeyCode) -> Action {
    match key {
        KeyCode::Space => Action::ToggleRotation,
        KeyCode::F1 => Action::ToggleStats,
        _ => Action::Noop,
    }
}

/// Local movement direction from the held keys (x right, y up, z forward).
fn movement(keys: &HashSet<KeyCode>) -> Vec3 {
    let axis = |pos: KeyCode, neg: KeyCode| {
        keys.contains(&pos) as i32 as f32 - keys.contains(&neg) as i32 as f32
    };
    Vec3::new(
        axis(KeyCode::KeyD, KeyCode::KeyA),
        axis(KeyCode::KeyE, KeyCode::KeyQ),
        axis(KeyCode::KeyW, KeyCode::KeyS),
    )
}

/// Application state.
struct AppState {
    config: FieldConfig,
    buffer: TransformBuffer,
    updater: FrameUpdater,
    toggles: FrameToggles,
    camera: FlyCamera,
    overlay: StatsOverlay,
    frame_times: FrameTimer,
    last_update: UpdateStats,
    // Input state
    keys_held: HashSet<KeyCode>,
    mouse_captured: bool,
    last_frame: Instant,
}

impl AppState {
    fn new(config: FieldConfig) -> Self {
        let buffer = cubefield_layout::generate_field(&config, &Mat4::IDENTITY);
        let updater = FrameUpdater::new(UpdaterConfig::from_field(&config));
        let camera = FlyCamera::for_field(&config, 16.0 / 9.0);
        Self {
            last_update: UpdateStats::idle(buffer.instance_count()),
            config,
            buffer,
            updater,
            toggles: FrameToggles::default(),
            camera,
            overlay: StatsOverlay::new(),
            frame_times: FrameTimer::default(),
            keys_held: HashSet::new(),
            mouse_captured: false,
            last_frame: Instant::now(),
        }
    }

    fn move_camera(&mut self, dt: f32) {
        let speed_mult = if self.keys_held.contains(&KeyCode::ShiftLeft) {
            3.0
        } else {
            1.0
        };
        let direction = movement(&self.keys_held);
        if direction != Vec3::ZERO {
            self.camera.apply(&Action::Move(direction), dt * speed_mult);
        }
    }

    fn handle_key(&mut self, key: KeyCode, pressed: bool) {
        if pressed {
            self.keys_held.insert(key);
        } else {
            self.keys_held.remove(&key);
            return;
        }
        apply_toggle(&mut self.toggles, &key_action(key));
    }

    fn snapshot(&self) -> StatsSnapshot {
        let frame = self.frame_times.average().as_secs_f32();
        StatsSnapshot {
            fps: if frame > 0.0 { 1.0 / frame } else { 0.0 },
            instances: self.buffer.instance_count(),
            camera_position: self.camera.position,
            update: self.last_update,
            update_average: self.updater.timer().average(),
        }
    }

    fn draw_ui(&self, ctx: &EguiContext) {
        let lines = self.overlay.lines(&self.snapshot(), &self.toggles);
        egui::Area::new(egui::Id::new("stats"))
            .fixed_pos(egui::pos2(8.0, 8.0))
            .show(ctx, |ui| {
                for line in lines {
                    ui.label(egui::RichText::new(line).color(egui::Color32::WHITE));
                }
            });
    }
}

/// Everything that exists only once a window is up.
struct Gpu {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    renderer: InstanceRenderer,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl Gpu {
    fn new(event_loop: &ActiveEventLoop, state: &mut AppState, egui_ctx: &EguiContext) -> Result<Self> {
        let attrs = Window::default_attributes()
            .with_title("Cube Field")
            .with_inner_size(PhysicalSize::new(1280u32, 720));
        let window = Arc::new(event_loop.create_window(attrs)?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window.clone())
            .map_err(RenderError::from)?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or(RenderError::NoAdapter)?;

        let limits = adapter.limits();
        check_capabilities(&limits, state.buffer.instance_count())?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("cubefield_device"),
                required_features: wgpu::Features::empty(),
                required_limits: limits,
                memory_hints: Default::default(),
            },
            None,
        ))
        .map_err(RenderError::from)?;

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or(surface_caps.formats.first())
            .copied()
            .context("surface reports no formats")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        state.camera.aspect = config.width as f32 / config.height as f32;

        let renderer = InstanceRenderer::new(
            &device,
            &queue,
            surface_format,
            config.width,
            config.height,
            state.config.box_size,
            &state.buffer,
        );

        let egui_winit = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        tracing::info!(
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            renderer,
            egui_winit,
            egui_renderer,
        })
    }

    fn resize(&mut self, width: u32, height: u32, camera: &mut FlyCamera) {
        self.config.width = width.max(1);
        self.config.height = height.max(1);
        self.surface.configure(&self.device, &self.config);
        camera.aspect = self.config.width as f32 / self.config.height as f32;
        self.renderer
            .resize(&self.device, self.config.width, self.config.height);
    }

    /// Update the field, draw it, then draw the overlay on top.
    fn frame(&mut self, state: &mut AppState, egui_ctx: &EguiContext) {
        let now = Instant::now();
        let frame_time = now - state.last_frame;
        state.last_frame = now;
        state.frame_times.record(frame_time);
        let dt = frame_time.as_secs_f32().min(0.1);

        state.move_camera(dt);
        let view = state.camera.cull_view();
        {
            let mut sink = self.renderer.sink(&self.queue);
            state.last_update =
                state
                    .updater
                    .update(&mut state.buffer, &view, &state.toggles, dt, &mut sink);
        }

        let output = match self.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };

        let target = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        self.renderer
            .render(&self.device, &self.queue, &target, &state.camera);

        let raw_input = self.egui_winit.take_egui_input(&self.window);
        let full_output = egui_ctx.run(raw_input, |ctx| state.draw_ui(ctx));
        self.egui_winit
            .handle_platform_output(&self.window, full_output.platform_output);

        let paint_jobs = egui_ctx.tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, image_delta);
        }
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui_encoder"),
            });
        self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &target,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            self.egui_renderer
                .render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        output.present();
        self.window.request_redraw();
    }
}

struct GpuApp {
    state: AppState,
    gpu: Option<Gpu>,
    egui_ctx: EguiContext,
    fatal: Option<anyhow::Error>,
}

impl GpuApp {
    fn new(config: FieldConfig) -> Self {
        Self {
            state: AppState::new(config),
            gpu: None,
            egui_ctx: EguiContext::default(),
            fatal: None,
        }
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }
        match Gpu::new(event_loop, &mut self.state, &self.egui_ctx) {
            Ok(gpu) => self.gpu = Some(gpu),
            Err(e) => {
                tracing::error!("GPU setup failed: {e:#}");
                self.fatal = Some(e);
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
        let Some(gpu) = &mut self.gpu else {
            return;
        };
        if gpu.egui_winit.on_window_event(&gpu.window, &event).consumed {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                gpu.resize(new_size.width, new_size.height, &mut self.state.camera);
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: key_state,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                self.state
                    .handle_key(key, key_state == ElementState::Pressed);
            }
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state: btn_state,
                ..
            } => {
                self.state.mouse_captured = btn_state == ElementState::Pressed;
                gpu.window.set_cursor_visible(!self.state.mouse_captured);
            }
            WindowEvent::RedrawRequested => {
                gpu.frame(&mut self.state, &self.egui_ctx);
            }
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta } = event {
            if self.state.mouse_captured {
                self.state.camera.apply(
                    &Action::Look {
                        dx: delta.0 as f32,
                        dy: delta.1 as f32,
                    },
                    0.0,
                );
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gpu) = &self.gpu {
            gpu.window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = field_config(&cli)?;
    tracing::info!(
        side = config.side_count,
        instances = config.instance_count(),
        "cubefield-desktop starting"
    );

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(config);
    event_loop.run_app(&mut app)?;

    match app.fatal {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
