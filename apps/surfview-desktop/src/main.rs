mod config;
mod input;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use surfview_bridge::mesh_from_json;
use surfview_common::{Mesh, PointCloud};
use surfview_input::{Action, ActionQueue};
use surfview_mesh::sample_surface;
use surfview_render::{LoopControl, PresentationLoop, RenderSurface, RetainedViewer, SpinClock};
use surfview_render_wgpu::{GpuContext, ImmediateRenderer, ImmediateSettings, WgpuSceneHost};
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::PhysicalKey;
use winit::window::{Window, WindowId};

use crate::config::{Backend, ViewerConfig};
use crate::input::InputMapper;

#[derive(Parser)]
#[command(name = "surfview-desktop", about = "Interactive surface mesh viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// YAML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Render backend (overrides the config file)
    #[arg(long, value_enum)]
    backend: Option<Backend>,

    /// Mesh JSON file; the demo surface is shown when omitted
    #[arg(long)]
    mesh: Option<PathBuf>,

    /// Point JSON file shown alongside the mesh
    #[arg(long)]
    points: Option<PathBuf>,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,

    #[arg(long)]
    title: Option<String>,
}

impl Cli {
    /// File config with command-line overrides applied.
    fn resolve_config(&self) -> Result<ViewerConfig> {
        let mut config = match &self.config {
            Some(path) => ViewerConfig::load(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => ViewerConfig::default(),
        };
        if let Some(backend) = self.backend {
            config.backend = backend;
        }
        if let Some(width) = self.width {
            config.width = width;
        }
        if let Some(height) = self.height {
            config.height = height;
        }
        if let Some(title) = &self.title {
            config.title = title.clone();
        }
        Ok(config)
    }
}

/// What the window shows once the surface is up.
struct Content {
    mesh: Mesh,
    points: Option<PointCloud>,
}

fn load_content(cli: &Cli, config: &ViewerConfig) -> Result<Content> {
    let (mesh, demo_points) = match &cli.mesh {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading mesh file {}", path.display()))?;
            let mesh = mesh_from_json(&text)
                .with_context(|| format!("parsing mesh file {}", path.display()))?;
            (mesh, None)
        }
        None => {
            let (mesh, points) = sample_surface(config.resolution, config.resolution)
                .context("building demo surface")?;
            (mesh, config.show_points.then_some(points))
        }
    };
    let points = match &cli.points {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading point file {}", path.display()))?;
            Some(serde_json::from_str(&text)
                .with_context(|| format!("parsing point file {}", path.display()))?)
        }
        None => demo_points,
    };
    tracing::info!(
        vertices = mesh.vertex_count(),
        faces = mesh.face_count(),
        points = points.as_ref().map_or(0, PointCloud::len),
        "content loaded"
    );
    Ok(Content { mesh, points })
}

fn create_surface(
    window: Arc<Window>,
    config: &ViewerConfig,
    content: &Content,
) -> Result<Box<dyn RenderSurface>> {
    let size = window.inner_size();
    let mut surface: Box<dyn RenderSurface> = match config.backend {
        Backend::Immediate => {
            let gpu = GpuContext::new(
                window,
                size.width,
                size.height,
                ImmediateRenderer::REQUIRED_FEATURES,
            )?;
            let settings = ImmediateSettings {
                clear_color: config.clear_color,
                gradient: config.gradient,
                wire_color: config.wire_color,
                ..ImmediateSettings::default()
            };
            Box::new(ImmediateRenderer::new(gpu, settings)?)
        }
        Backend::Retained => {
            let gpu = GpuContext::new(window, size.width, size.height, wgpu::Features::empty())?;
            let host = WgpuSceneHost::new(gpu, config.container.clone())?;
            let mut viewer = RetainedViewer::new(host);
            viewer.initialize(&config.container)?;
            Box::new(viewer)
        }
    };

    surface.show_mesh(&content.mesh)?;
    if let Some(points) = &content.points {
        surface.show_points(points)?;
    }
    Ok(surface)
}

struct ViewerApp {
    config: ViewerConfig,
    content: Content,
    window: Option<Arc<Window>>,
    surface: Option<Box<dyn RenderSurface>>,
    presentation: PresentationLoop,
    actions: ActionQueue,
    input: InputMapper,
    last_frame: Instant,
    /// First fatal error; reported after the event loop returns.
    error: Option<anyhow::Error>,
}

impl ViewerApp {
    fn new(config: ViewerConfig, content: Content) -> Self {
        let presentation = PresentationLoop::new(SpinClock::with_speed(config.spin_speed));
        Self {
            config,
            content,
            window: None,
            surface: None,
            presentation,
            actions: ActionQueue::new(),
            input: InputMapper::default(),
            last_frame: Instant::now(),
            error: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        tracing::error!("{error:#}");
        self.shutdown();
        self.error.get_or_insert(error);
        event_loop.exit();
    }

    fn shutdown(&mut self) {
        if let Some(mut surface) = self.surface.take() {
            surface.dispose();
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        let dt = now - self.last_frame;
        self.last_frame = now;

        let Some(surface) = self.surface.as_deref_mut() else {
            return;
        };
        let actions = self.actions.drain();
        match self.presentation.tick(surface, dt, &actions) {
            Ok(LoopControl::Continue) => {
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            Ok(LoopControl::Exit) => {
                tracing::info!("exit requested");
                self.shutdown();
                event_loop.exit();
            }
            Err(e) => self.fail(event_loop, e.into()),
        }
    }
}

impl ApplicationHandler for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(PhysicalSize::new(self.config.width, self.config.height));
        let window = match event_loop.create_window(attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => return self.fail(event_loop, e.into()),
        };

        match create_surface(window.clone(), &self.config, &self.content) {
            Ok(surface) => {
                tracing::info!(backend = ?self.config.backend, "viewer ready");
                self.surface = Some(surface);
                self.window = Some(window);
                self.last_frame = Instant::now();
            }
            Err(e) => self.fail(event_loop, e.context("initializing render surface")),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.actions.push(Action::Exit),
            WindowEvent::Resized(size) => self.actions.push(Action::Resize {
                width: size.width,
                height: size.height,
            }),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state,
                        ..
                    },
                ..
            } => self.input.key(key, state, &mut self.actions),
            WindowEvent::MouseInput { button, state, .. } => self.input.button(button, state),
            WindowEvent::CursorMoved { position, .. } => {
                self.input.cursor_moved(position, &mut self.actions)
            }
            WindowEvent::MouseWheel { delta, .. } => self.input.wheel(delta, &mut self.actions),
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }

        if self.actions.exit_requested() {
            if let Some(window) = &self.window {
                window.request_redraw();
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.shutdown();
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = cli.resolve_config()?;
    let content = load_content(&cli, &config)?;
    tracing::info!(backend = ?config.backend, "surfview-desktop starting");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = ViewerApp::new(config, content);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(error) => Err(error),
        None => Ok(()),
    }
}
