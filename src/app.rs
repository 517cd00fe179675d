use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;

use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::asset::Asset;
use crate::error::{FredError, Result};
use crate::geometry::{self, RawGeometry};
use crate::gpu::GpuContext;
use crate::input::Input;
use crate::logging::{LoggingConfig, init_logging};
use crate::mesh::Model;
use crate::render_target::{RenderTarget, ViewportMode};
use crate::renderer::SceneRenderer;
use crate::scene::Scene;
use crate::shader::Shader;
use crate::texture::Texture;
use crate::time::FrameClock;
use crate::ui::{self, UiLayer};

/// Context provided during app setup.
///
/// Loaders resolve relative paths against [`AppConfig::asset_root`] and log
/// failures before returning them.
pub struct SetupContext<'a> {
    pub gpu: &'a GpuContext,
    renderer: &'a SceneRenderer,
    scene: &'a mut Scene,
    clock: &'a mut FrameClock,
    asset_root: &'a Path,
    white: Rc<Texture>,
}

impl SetupContext<'_> {
    /// Joins a relative path onto the asset root. Absolute paths pass through.
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        self.asset_root.join(path)
    }

    /// Loads an OBJ or STL file and uploads it.
    pub fn load_model(&mut self, path: impl AsRef<Path>) -> Result<Rc<Model>> {
        let path = self.resolve(path);
        match geometry::load_model(&path) {
            Ok(geometry) => Ok(self.mesh_from_geometry(&geometry, &path.display().to_string())),
            Err(err) => {
                log::warn!("Model failed to load: {err}");
                Err(err)
            }
        }
    }

    /// Uploads geometry built in code.
    pub fn mesh_from_geometry(&mut self, geometry: &RawGeometry, label: &str) -> Rc<Model> {
        Rc::new(geometry.upload(self.gpu, label))
    }

    pub fn load_texture(&mut self, path: impl AsRef<Path>) -> Result<Rc<Texture>> {
        let path = self.resolve(path);
        Texture::from_file(self.gpu, path).map(Rc::new)
    }

    /// Loads a texture, or hands back the shared 1x1 white texture if that fails.
    pub fn texture_or_default(&mut self, path: impl AsRef<Path>) -> Rc<Texture> {
        self.load_texture(path)
            .unwrap_or_else(|_| Rc::clone(&self.white))
    }

    pub fn white_texture(&self) -> Rc<Texture> {
        Rc::clone(&self.white)
    }

    pub fn checkerboard(&mut self, size: u32, cells: u32, a: [u8; 4], b: [u8; 4]) -> Rc<Texture> {
        Rc::new(Texture::checkerboard(self.gpu, size, cells, a, b))
    }

    /// Compiles a vertex + fragment WGSL pair against the scene layout.
    pub fn load_shader(
        &mut self,
        vertex_path: impl AsRef<Path>,
        fragment_path: impl AsRef<Path>,
    ) -> Result<Rc<Shader>> {
        let vertex_path = self.resolve(vertex_path);
        let fragment_path = self.resolve(fragment_path);
        Shader::from_files(self.gpu, self.renderer.layout(), vertex_path, fragment_path)
            .map(Rc::new)
    }

    /// Builds an asset at the origin. Add it with `scene_mut().add_asset`.
    pub fn create_asset(
        &mut self,
        model: Rc<Model>,
        albedo: Rc<Texture>,
        specular: Rc<Texture>,
        shader: Rc<Shader>,
    ) -> Asset {
        Asset::new(self.gpu, self.renderer.layout(), model, albedo, specular, shader)
    }

    pub fn scene(&self) -> &Scene {
        self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        self.scene
    }

    pub fn set_delta_time_multiplier(&mut self, multiplier: f32) {
        self.clock.set_delta_time_multiplier(multiplier);
    }
}

/// Per-frame context handed to the frame closure.
pub struct Frame<'a> {
    pub scene: &'a mut Scene,
    pub clock: &'a FrameClock,
    pub input: &'a Input,
    /// The UI context for this frame. Windows built here are drawn over the scene.
    pub ui: &'a egui::Context,
}

impl Frame<'_> {
    /// Scaled seconds since the previous frame.
    pub fn delta_time(&self) -> f32 {
        self.clock.delta_time()
    }

    pub fn fps(&self) -> f32 {
        self.clock.fps()
    }
}

/// Configuration for the app window and renderer.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
    pub msaa_samples: u32,
    pub clear_color: wgpu::Color,
    pub viewport: ViewportMode,
    pub asset_root: PathBuf,
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Fred".to_string(),
            width: 1366,
            height: 768,
            vsync: true,
            msaa_samples: 4,
            clear_color: wgpu::Color {
                r: 0.1,
                g: 0.1,
                b: 0.1,
                a: 1.0,
            },
            viewport: ViewportMode::Offscreen,
            asset_root: PathBuf::from("assets"),
            logging: LoggingConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn vsync(mut self, vsync: bool) -> Self {
        self.vsync = vsync;
        self
    }

    /// Scene MSAA sample count. Only 1 and 4 are accepted; anything else uses 4.
    pub fn msaa_samples(mut self, samples: u32) -> Self {
        self.msaa_samples = samples;
        self
    }

    pub fn clear_color(mut self, r: f64, g: f64, b: f64, a: f64) -> Self {
        self.clear_color = wgpu::Color { r, g, b, a };
        self
    }

    pub fn viewport(mut self, mode: ViewportMode) -> Self {
        self.viewport = mode;
        self
    }

    pub fn asset_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.asset_root = root.into();
        self
    }

    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = logging;
        self
    }
}

/// wgpu guarantees 1x and 4x for every renderable format.
fn supported_sample_count(requested: u32) -> u32 {
    match requested {
        1 | 4 => requested,
        other => {
            log::warn!("{other}x MSAA is not supported, using 4x");
            4
        }
    }
}

/// Run a Fred application with the default configuration.
///
/// # Example
/// ```ignore
/// fred::run(|ctx| {
///     let model = ctx.load_model("models/cone.obj")?;
///     let texture = ctx.texture_or_default("textures/cone.png");
///     let shader = ctx.load_shader("shaders/basic.vert.wgsl", "shaders/basic.frag.wgsl")?;
///     let asset = ctx.create_asset(model, texture.clone(), texture, shader);
///     ctx.scene_mut().add_asset(asset);
///
///     Ok(move |frame: &mut fred::Frame| {
///         frame.scene.assets_mut()[0].transform.position.x += 0.01 * frame.delta_time();
///     })
/// })?;
/// ```
pub fn run<S, F>(setup: S) -> Result<()>
where
    S: FnOnce(&mut SetupContext) -> anyhow::Result<F> + 'static,
    F: FnMut(&mut Frame) + 'static,
{
    run_with_config(AppConfig::default(), setup)
}

/// Run a Fred application with custom configuration.
///
/// Returns once the window closes. Errors during window, GPU or user setup end
/// the loop and are returned here.
pub fn run_with_config<S, F>(config: AppConfig, setup: S) -> Result<()>
where
    S: FnOnce(&mut SetupContext) -> anyhow::Result<F> + 'static,
    F: FnMut(&mut Frame) + 'static,
{
    init_logging(config.logging.clone());

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = FredApp {
        state: AppState::Pending {
            config,
            setup: Some(Box::new(move |ctx| {
                let frame_fn = setup(ctx)?;
                Ok(Box::new(frame_fn) as Box<dyn FnMut(&mut Frame)>)
            })),
        },
        error: None,
    };

    event_loop.run_app(&mut app)?;

    match app.error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

type SetupFn = Box<dyn FnOnce(&mut SetupContext) -> anyhow::Result<Box<dyn FnMut(&mut Frame)>>>;

struct FredApp {
    state: AppState,
    error: Option<FredError>,
}

enum AppState {
    Pending {
        config: AppConfig,
        setup: Option<SetupFn>,
    },
    Running(Box<Running>),
    Stopped,
}

struct Running {
    window: Arc<Window>,
    gpu: GpuContext,
    ui: UiLayer,
    renderer: SceneRenderer,
    target: RenderTarget,
    scene: Scene,
    clock: FrameClock,
    input: Input,
    frame_fn: Box<dyn FnMut(&mut Frame)>,
    clear_color: wgpu::Color,
}

impl Running {
    fn start(event_loop: &ActiveEventLoop, config: &AppConfig, setup: SetupFn) -> Result<Self> {
        let window_attrs = WindowAttributes::default()
            .with_title(&config.title)
            .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height));
        let window = Arc::new(event_loop.create_window(window_attrs)?);

        let gpu = GpuContext::new(window.clone(), config.vsync)?;
        let samples = supported_sample_count(config.msaa_samples);
        let format = gpu.config.format;

        let renderer = SceneRenderer::new(&gpu, format, samples, config.clear_color);
        let target = RenderTarget::new(
            &gpu,
            config.viewport,
            format,
            samples,
            gpu.width(),
            gpu.height(),
        );
        let mut ui = UiLayer::new(&window, &gpu);
        ui.sync_viewport_texture(&gpu, &target);

        let mut scene = Scene::new();
        let mut clock = FrameClock::new();
        let white = Rc::new(Texture::white(&gpu));

        let frame_fn = {
            let mut ctx = SetupContext {
                gpu: &gpu,
                renderer: &renderer,
                scene: &mut scene,
                clock: &mut clock,
                asset_root: &config.asset_root,
                white,
            };
            setup(&mut ctx).map_err(|err| FredError::Setup(format!("{err:#}")))?
        };

        log::info!(
            "scene ready: {} assets, {} cameras",
            scene.assets().len(),
            scene.cameras().len()
        );

        // Loading time must not show up as the first frame's delta.
        clock.reset();
        window.request_redraw();

        Ok(Self {
            window,
            gpu,
            ui,
            renderer,
            target,
            scene,
            clock,
            input: Input::new(),
            frame_fn,
            clear_color: config.clear_color,
        })
    }

    fn redraw(&mut self) -> Result<()> {
        self.clock.tick();

        let Some(surface) = &self.gpu.surface else {
            return Ok(());
        };
        let output = match surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("surface lost or outdated, reconfiguring");
                self.gpu.reconfigure();
                return Ok(());
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                return Err(FredError::Surface(wgpu::SurfaceError::OutOfMemory));
            }
            Err(err) => {
                log::warn!("dropped frame: {err}");
                return Ok(());
            }
        };

        self.ui.begin_frame(&self.window);
        let ctx = self.ui.context().clone();
        self.input
            .set_ui_focus(ctx.wants_keyboard_input(), ctx.wants_pointer_input());

        {
            let mut frame = Frame {
                scene: &mut self.scene,
                clock: &self.clock,
                input: &self.input,
                ui: &ctx,
            };
            (self.frame_fn)(&mut frame);
        }

        ui::asset_inspectors(&ctx, &mut self.scene, &self.clock);
        self.scene.run_render_callback(&ctx, &self.clock);

        let offscreen = self.target.mode() == ViewportMode::Offscreen;
        if offscreen {
            self.ui.viewport_window();
        }
        let prepared = self.ui.end_frame(&self.window, &self.gpu);

        let [width, height] = if offscreen {
            self.ui.viewport_request()
        } else {
            [self.gpu.width(), self.gpu.height()]
        };
        if self.target.ensure_size(&self.gpu, width, height) {
            self.ui.sync_viewport_texture(&self.gpu, &self.target);
        }

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        let scene_output = self.target.color_view().unwrap_or(&view);
        self.renderer
            .render(&self.gpu, &mut encoder, &self.target, scene_output, &self.scene);

        // Offscreen, the scene never touches the swapchain, so the UI pass clears it.
        let ui_clear = offscreen.then_some(self.clear_color);
        let mut commands = self
            .ui
            .render(&self.gpu, &mut encoder, &view, prepared, ui_clear);
        commands.push(encoder.finish());

        self.gpu.queue.submit(commands);
        self.window.pre_present_notify();
        output.present();
        Ok(())
    }
}

impl FredApp {
    fn fail(&mut self, event_loop: &ActiveEventLoop, err: FredError) {
        log::error!("{err}");
        self.error = Some(err);
        self.state = AppState::Stopped;
        event_loop.exit();
    }
}

impl ApplicationHandler for FredApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let AppState::Pending { config, setup } = &mut self.state else {
            return;
        };
        let Some(setup) = setup.take() else {
            return;
        };

        match Running::start(event_loop, config, setup) {
            Ok(running) => self.state = AppState::Running(Box::new(running)),
            Err(err) => self.fail(event_loop, err),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let AppState::Running(app) = &mut self.state else {
            return;
        };

        // egui sees events first; input still records them so frames can query both.
        app.ui.on_window_event(&app.window, &event);
        app.input.handle_event(&event);
        let ctx = app.ui.context();
        app.input
            .set_ui_focus(ctx.wants_keyboard_input(), ctx.wants_pointer_input());

        if app.input.exit_requested() {
            event_loop.exit();
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                app.gpu.resize(size.width, size.height);
            }
            WindowEvent::RedrawRequested => {
                if let Err(err) = app.redraw() {
                    self.fail(event_loop, err);
                    return;
                }
                app.input.end_frame();
                app.window.request_redraw();
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = AppConfig::default();
        assert_eq!(config.title, "Fred");
        assert_eq!((config.width, config.height), (1366, 768));
        assert!(config.vsync);
        assert_eq!(config.msaa_samples, 4);
        assert_eq!(config.viewport, ViewportMode::Offscreen);
        assert_eq!(config.asset_root, PathBuf::from("assets"));
        assert_eq!(config.clear_color.r, 0.1);
        assert_eq!(config.clear_color.a, 1.0);
    }

    #[test]
    fn builder_overrides() {
        let config = AppConfig::new()
            .title("Viewer")
            .size(800, 600)
            .vsync(false)
            .msaa_samples(1)
            .clear_color(0.0, 0.0, 0.0, 1.0)
            .viewport(ViewportMode::Window)
            .asset_root("/data");

        assert_eq!(config.title, "Viewer");
        assert_eq!((config.width, config.height), (800, 600));
        assert!(!config.vsync);
        assert_eq!(config.msaa_samples, 1);
        assert_eq!(config.clear_color.r, 0.0);
        assert_eq!(config.viewport, ViewportMode::Window);
        assert_eq!(config.asset_root, PathBuf::from("/data"));
    }

    #[test]
    fn unsupported_sample_counts_fall_back_to_four() {
        assert_eq!(supported_sample_count(1), 1);
        assert_eq!(supported_sample_count(4), 4);
        assert_eq!(supported_sample_count(2), 4);
        assert_eq!(supported_sample_count(16), 4);
    }
}
