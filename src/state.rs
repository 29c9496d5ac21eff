use crate::camera::{to_ndc, Camera, CameraController, CameraUniform, InputOutcome};
use crate::initialize::build_scene;
use crate::picking::{pick, HoverThrottle};
use crate::render::Render;
use crate::simulation::{Command, FrameClock, SimulationState};
use crate::tooltip::Tooltip;
use crate::ui::{self, ControlPanel};
use crate::{hex_to_linear, CameraParams, Config};
use anyhow::{Context, Result};
use log::{info, warn};
use rand::{rngs::SmallRng, SeedableRng};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use wgpu::util::DeviceExt;
use winit::{
  dpi::{LogicalSize, PhysicalSize},
  event::{ElementState, Event, KeyEvent, StartCause, WindowEvent},
  event_loop::{EventLoop, EventLoopWindowTarget},
  keyboard::{KeyCode, PhysicalKey},
  window::Window,
};

const HEADLESS_DELTA: f32 = 1.0 / 60.0;

struct EventLoopWrapper {
  event_loop: EventLoop<()>,
  window: Arc<Window>,
}

impl EventLoopWrapper {
  pub fn new(title: &str) -> Result<Self> {
    let event_loop = EventLoop::new().context("failed to create the event loop")?;
    let builder = winit::window::WindowBuilder::new()
      .with_title(title)
      .with_inner_size(LogicalSize::new(1280.0, 800.0));
    let window = builder
      .build(&event_loop)
      .context("failed to create the window")?;

    Ok(Self {
      event_loop,
      window: Arc::new(window),
    })
  }
}

struct SurfaceWrapper {
  surface: wgpu::Surface<'static>,
  config: wgpu::SurfaceConfiguration,
}

impl SurfaceWrapper {
  fn configure(
    surface: wgpu::Surface<'static>,
    adapter: &wgpu::Adapter,
    device: &wgpu::Device,
    size: PhysicalSize<u32>,
  ) -> Result<Self> {
    let width = size.width.max(1);
    let height = size.height.max(1);
    let mut config = surface
      .get_default_config(adapter, width, height)
      .context("the surface is not supported by the adapter")?;
    let view_format = config.format.add_srgb_suffix();
    config.view_formats.push(view_format);
    surface.configure(device, &config);
    Ok(Self { surface, config })
  }

  fn resize(&mut self, device: &wgpu::Device, size: PhysicalSize<u32>) {
    if size.width == 0 || size.height == 0 {
      return;
    }
    self.config.width = size.width;
    self.config.height = size.height;
    self.surface.configure(device, &self.config);
  }

  fn acquire(&mut self, device: &wgpu::Device) -> Option<wgpu::SurfaceTexture> {
    match self.surface.get_current_texture() {
      Ok(frame) => Some(frame),
      Err(wgpu::SurfaceError::Timeout) => self.surface.get_current_texture().ok(),
      Err(err) => {
        warn!("surface error ({err}), reconfiguring");
        self.surface.configure(device, &self.config);
        self.surface.get_current_texture().ok()
      }
    }
  }

  fn view_format(&self) -> wgpu::TextureFormat {
    self.config.view_formats.first().copied().unwrap_or(self.config.format)
  }
}

struct State {
  device: wgpu::Device,
  queue: wgpu::Queue,
  surface: SurfaceWrapper,
  camera: Camera,
  camera_uniform: CameraUniform,
  camera_buffer: wgpu::Buffer,
  camera_bind_group: wgpu::BindGroup,
  camera_controller: CameraController,
  camera_bind_group_layout: wgpu::BindGroupLayout,
}

impl State {
  fn input(&mut self, event: &WindowEvent) -> InputOutcome {
    self.camera_controller.process_events(event)
  }

  fn update(&mut self) {
    self.camera_controller.update_camera(&mut self.camera);
    self.camera_uniform.update_view_proj(&self.camera);
    self.queue.write_buffer(
      &self.camera_buffer,
      0,
      bytemuck::cast_slice(&[self.camera_uniform]),
    );
  }

  fn resize(&mut self, size: PhysicalSize<u32>) {
    self.surface.resize(&self.device, size);
    if size.height > 0 {
      self.camera.aspect = size.width as f32 / size.height as f32;
    }
  }

  async fn init(window: Arc<Window>, params: &CameraParams) -> Result<Self> {
    let size = window.inner_size();
    let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
      #[cfg(not(target_arch = "wasm32"))]
      backends: wgpu::Backends::PRIMARY,
      ..Default::default()
    });
    let surface = instance
      .create_surface(window)
      .context("failed to create a drawing surface")?;

    let adapter = instance
      .request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::default(),
        compatible_surface: Some(&surface),
        force_fallback_adapter: false,
      })
      .await
      .context("no GPU adapter can render to this window")?;
    info!("using adapter {}", adapter.get_info().name);

    let (device, queue) = adapter
      .request_device(
        &wgpu::DeviceDescriptor {
          label: None,
          required_features: wgpu::Features::empty(),
          required_limits: wgpu::Limits::default(),
        },
        None,
      )
      .await
      .context("failed to open the GPU device")?;
    let surface = SurfaceWrapper::configure(surface, &adapter, &device, size)?;

    let camera = Camera::new(params, size.width.max(1) as f32 / size.height.max(1) as f32);
    let mut camera_uniform = CameraUniform::new();
    camera_uniform.update_view_proj(&camera);

    let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
      label: Some("Camera Buffer"),
      contents: bytemuck::cast_slice(&[camera_uniform]),
      usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    });
    let camera_bind_group_layout =
      device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
          binding: 0,
          visibility: wgpu::ShaderStages::VERTEX,
          ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
          },
          count: None,
        }],
        label: Some("camera_bind_group_layout"),
      });
    let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
      layout: &camera_bind_group_layout,
      entries: &[wgpu::BindGroupEntry {
        binding: 0,
        resource: camera_buffer.as_entire_binding(),
      }],
      label: Some("camera_bind_group"),
    });
    let camera_controller = CameraController::init(params);

    Ok(Self {
      device,
      queue,
      surface,
      camera,
      camera_uniform,
      camera_buffer,
      camera_bind_group,
      camera_controller,
      camera_bind_group_layout,
    })
  }
}

/// Owns the simulation, the GPU state and the overlay for one window.
struct App {
  window: Arc<Window>,
  state: State,
  render: Render,
  config: Config,
  sim: SimulationState,
  rng: SmallRng,
  clock: FrameClock,
  tooltip: Tooltip,
  throttle: HoverThrottle,
  panel: ControlPanel,
  egui_ctx: egui::Context,
  egui_state: egui_winit::State,
  egui_renderer: egui_wgpu::Renderer,
}

impl App {
  fn new(window: Arc<Window>, state: State, config: Config, event_loop: &EventLoop<()>) -> Self {
    let mut rng = seeded_rng(config.seed);
    let scene = build_scene(&mut rng, &config);
    let render = Render::init(
      &state.surface.config,
      &state.device,
      &state.camera_bind_group_layout,
      scene,
    );
    let mut sim = SimulationState::new(&mut rng, &config.sim);
    if config.light_theme {
      sim.apply(Command::ToggleTheme, &mut rng, &config.sim);
    }
    let panel = ControlPanel::new(&sim, &config.sim);

    let egui_ctx = egui::Context::default();
    let egui_state = egui_winit::State::new(
      egui_ctx.clone(),
      egui::ViewportId::ROOT,
      event_loop,
      Some(window.scale_factor() as f32),
      Some(state.device.limits().max_texture_dimension_2d as usize),
    );
    let egui_renderer =
      egui_wgpu::Renderer::new(&state.device, state.surface.view_format(), None, 1);
    window.set_cursor_icon(state.camera_controller.cursor_icon());

    Self {
      window,
      state,
      render,
      throttle: HoverThrottle::new(config.hover.throttle),
      config,
      sim,
      rng,
      clock: FrameClock::new(),
      tooltip: Tooltip::default(),
      panel,
      egui_ctx,
      egui_state,
      egui_renderer,
    }
  }

  fn handle_window_event(&mut self, event: &WindowEvent) {
    let response = self.egui_state.on_window_event(&self.window, event);
    let dragging = self.state.camera_controller.is_dragging();
    let pointer_event = is_pointer_event(event);
    if egui_claims(response.consumed, dragging, pointer_event) {
      if pointer_event {
        self.tooltip.hide();
      }
      return;
    }
    match self.state.input(event) {
      InputOutcome::Hover { x, y } => {
        if self.egui_ctx.is_pointer_over_area() {
          self.tooltip.hide();
        } else {
          self.hover(x, y);
        }
      }
      InputOutcome::Left => self.tooltip.hide(),
      InputOutcome::Consumed | InputOutcome::Ignored => {}
    }
    self
      .window
      .set_cursor_icon(self.state.camera_controller.cursor_icon());
  }

  fn hover(&mut self, x: f32, y: f32) {
    if !self.throttle.try_acquire(Instant::now()) {
      return;
    }
    let size = self.window.inner_size();
    let (ndc_x, ndc_y) = to_ndc(x, y, size.width as f32, size.height as f32);
    let ray = self.state.camera.ray_through(ndc_x, ndc_y);
    match pick(&ray, &self.sim.pickables()) {
      Some(id) => {
        let scale = self.window.scale_factor() as f32;
        self.tooltip.show(id, [x / scale, y / scale]);
      }
      None => self.tooltip.hide(),
    }
  }

  fn resize(&mut self, size: PhysicalSize<u32>) {
    self.state.resize(size);
    self.render.resize(&self.state.device, &self.state.surface.config);
  }

  fn dispatch(&mut self, commands: Vec<Command>) {
    if commands.is_empty() {
      return;
    }
    for command in commands {
      self.sim.apply(command, &mut self.rng, &self.config.sim);
    }
    self.panel.sync(&self.sim);
  }

  fn redraw(&mut self) {
    let delta = self.clock.delta();
    self.sim.tick(delta, &self.config.sim);
    self.state.update();
    self.render.update(&self.state.queue, &self.sim);

    let raw_input = self.egui_state.take_egui_input(&self.window);
    let panel = &mut self.panel;
    let sim = &self.sim;
    let tooltip = &self.tooltip;
    let mut commands = Vec::new();
    let full_output = self.egui_ctx.run(raw_input, |ctx| {
      commands = ui::draw(ctx, panel, sim, tooltip);
    });
    self
      .egui_state
      .handle_platform_output(&self.window, full_output.platform_output);

    let device = &self.state.device;
    let queue = &self.state.queue;
    if let Some(frame) = self.state.surface.acquire(device) {
      let view = frame.texture.create_view(&wgpu::TextureViewDescriptor {
        format: Some(self.state.surface.view_format()),
        ..wgpu::TextureViewDescriptor::default()
      });
      let mut encoder =
        device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
      self.render.render(
        &view,
        &mut encoder,
        &self.state.camera_bind_group,
        hex_to_linear(self.sim.theme.background()),
      );

      for (id, image_delta) in &full_output.textures_delta.set {
        self
          .egui_renderer
          .update_texture(device, queue, *id, image_delta);
      }
      let paint_jobs = self
        .egui_ctx
        .tessellate(full_output.shapes, full_output.pixels_per_point);
      let screen = egui_wgpu::ScreenDescriptor {
        size_in_pixels: [self.state.surface.config.width, self.state.surface.config.height],
        pixels_per_point: full_output.pixels_per_point,
      };
      let extra = self
        .egui_renderer
        .update_buffers(device, queue, &mut encoder, &paint_jobs, &screen);
      {
        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
          label: Some("overlay"),
          color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: &view,
            resolve_target: None,
            ops: wgpu::Operations {
              load: wgpu::LoadOp::Load,
              store: wgpu::StoreOp::Store,
            },
          })],
          depth_stencil_attachment: None,
          timestamp_writes: None,
          occlusion_query_set: None,
        });
        self.egui_renderer.render(&mut rpass, &paint_jobs, &screen);
      }
      queue.submit(extra.into_iter().chain(std::iter::once(encoder.finish())));
      frame.present();
    }
    for id in &full_output.textures_delta.free {
      self.egui_renderer.free_texture(id);
    }

    self.dispatch(commands);
  }
}

fn is_pointer_event(event: &WindowEvent) -> bool {
  matches!(
    event,
    WindowEvent::CursorMoved { .. }
      | WindowEvent::MouseInput { .. }
      | WindowEvent::MouseWheel { .. }
  )
}

/// Whether egui keeps an event from the camera. A camera drag in progress keeps the pointer.
fn egui_claims(consumed: bool, camera_dragging: bool, pointer_event: bool) -> bool {
  consumed && !(camera_dragging && pointer_event)
}

fn seeded_rng(seed: Option<u64>) -> SmallRng {
  match seed {
    Some(seed) => SmallRng::seed_from_u64(seed),
    None => SmallRng::from_entropy(),
  }
}

async fn start(config: Config) -> Result<()> {
  let window_loop = EventLoopWrapper::new("Solar System")?;
  let state = State::init(window_loop.window.clone(), &config.camera).await?;
  let mut app = App::new(
    window_loop.window.clone(),
    state,
    config,
    &window_loop.event_loop,
  );
  info!("Solar System initialized");

  window_loop
    .event_loop
    .run(move |event, target: &EventLoopWindowTarget<()>| match event {
      Event::NewEvents(StartCause::Init) => app.window.request_redraw(),
      Event::WindowEvent { event, window_id } if window_id == app.window.id() => {
        app.handle_window_event(&event);
        match event {
          WindowEvent::CloseRequested
          | WindowEvent::KeyboardInput {
            event:
              KeyEvent {
                state: ElementState::Pressed,
                physical_key: PhysicalKey::Code(KeyCode::Escape),
                ..
              },
            ..
          } => target.exit(),
          WindowEvent::Resized(size) => app.resize(size),
          WindowEvent::RedrawRequested => {
            app.window.request_redraw();
            app.redraw();
          }
          _ => {}
        }
      }
      _ => {}
    })
    .context("the event loop stopped with an error")
}

/// Steps the simulation without a window and prints where every planet ended up.
/// `frames == 0` keeps going in real time until Ctrl-C.
fn run_headless(config: &Config, frames: u64) -> Result<()> {
  let mut rng = seeded_rng(config.seed);
  let mut sim = SimulationState::new(&mut rng, &config.sim);
  let running = Arc::new(AtomicBool::new(true));
  {
    let running = running.clone();
    ctrlc::set_handler(move || running.store(false, Ordering::SeqCst))
      .context("failed to install the Ctrl-C handler")?;
  }

  let mut frame = 0u64;
  while running.load(Ordering::SeqCst) && (frames == 0 || frame < frames) {
    sim.tick(HEADLESS_DELTA, &config.sim);
    frame += 1;
    if frames == 0 {
      std::thread::sleep(Duration::from_secs_f32(HEADLESS_DELTA));
    }
  }
  info!("headless run stopped after {frame} frames");

  for planet in &sim.planets {
    let p = planet.position();
    println!(
      "{:<8} angle {:>9.3} rad  x{:.1}  position ({:>7.2}, {:.2}, {:>7.2})",
      planet.descriptor().name,
      planet.angle,
      planet.speed,
      p.x,
      p.y,
      p.z
    );
  }
  Ok(())
}

pub fn run(config: Config, headless: bool, frames: u64) -> Result<()> {
  if headless {
    return run_headless(&config, frames);
  }
  pollster::block_on(start(config))
}
