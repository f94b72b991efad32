//! Viewer application: window lifecycle and the per-frame loop

use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::KeyCode,
    window::{Window, WindowId},
};

use crate::core::camera::FpsCamera;
use crate::core::camera_controller::FpsCameraController;
use crate::core::config::ViewerConfig;
use crate::core::error::Error;
use crate::core::input::InputState;
use crate::core::time::FrameTimer;
use crate::core::types::{Result, Vec3};
use crate::render::context::GpuContext;
use crate::render::raytracer::Raytracer;
use crate::render::shader::ShaderSources;
use crate::scene::{load_scene, Scene};

/// Key that re-reads and recompiles the shaders
pub const RELOAD_SHADERS_KEY: KeyCode = KeyCode::F5;

/// Camera placed and tuned from config
pub fn camera_from_config(config: &ViewerConfig) -> FpsCamera {
    let mut camera = FpsCamera::new(config.camera.fov_degrees, config.aspect_ratio());
    camera.set_position(Vec3::from_array(config.camera.position));
    camera.set_speed(config.camera.speed);
    camera.set_sensitivity(config.camera.sensitivity);
    camera
}

/// Window title showing the current frame rate
pub fn frame_title(title: &str, fps: f32) -> String {
    format!("{} - {:.0} FPS", title, fps)
}

fn shader_sources(config: &ViewerConfig) -> Result<ShaderSources> {
    match &config.shader_dir {
        Some(dir) => ShaderSources::from_dir(dir),
        None => Ok(ShaderSources::builtin()),
    }
}

struct App {
    config: ViewerConfig,
    scene: Scene,
    window: Option<Arc<Window>>,
    gpu: Option<GpuContext>,
    raytracer: Option<Raytracer>,
    camera: FpsCamera,
    controller: FpsCameraController,
    input: InputState,
    timer: FrameTimer,
    /// Startup failure raised inside the event loop, returned from `run`
    error: Option<Error>,
}

impl App {
    fn new(config: ViewerConfig, scene: Scene) -> Self {
        let camera = camera_from_config(&config);
        Self {
            config,
            scene,
            window: None,
            gpu: None,
            raytracer: None,
            camera,
            controller: FpsCameraController::new(),
            input: InputState::new(),
            timer: FrameTimer::new(),
            error: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let window_config = &self.config.window;
        let attributes = Window::default_attributes()
            .with_title(window_config.title.clone())
            .with_inner_size(PhysicalSize::new(window_config.width, window_config.height))
            .with_resizable(false);
        let window = Arc::new(
            event_loop
                .create_window(attributes)
                .map_err(|e| Error::Window(format!("Failed to create window: {}", e)))?,
        );

        let gpu = pollster::block_on(GpuContext::new(window.clone(), window_config.vsync))?;
        let size = window.inner_size();
        log::info!("Window created: {}x{}", size.width, size.height);
        log::info!("GPU: {}", gpu.adapter.get_info().name);

        let sources = shader_sources(&self.config)?;
        let raytracer = Raytracer::new(&gpu, &self.scene, &sources, self.config.aspect_ratio())?;

        self.window = Some(window);
        self.gpu = Some(gpu);
        self.raytracer = Some(raytracer);
        Ok(())
    }

    fn reload_shaders(&mut self) {
        let (Some(gpu), Some(raytracer)) = (&self.gpu, &mut self.raytracer) else {
            return;
        };
        match shader_sources(&self.config) {
            Ok(sources) => raytracer.reload_shaders(&gpu.device, &sources, self.config.aspect_ratio()),
            Err(e) => log::error!("Failed to read shaders: {}", e),
        }
    }

    fn frame(&mut self) {
        let dt = self.timer.tick();

        if self.input.is_key_just_pressed(RELOAD_SHADERS_KEY) {
            self.reload_shaders();
        }

        self.controller.update(&mut self.camera, &self.input, dt);

        if let (Some(gpu), Some(raytracer)) = (&mut self.gpu, &mut self.raytracer) {
            raytracer.render(gpu, &self.camera);
        }

        if let Some(window) = &self.window {
            window.set_title(&frame_title(&self.config.window.title, self.timer.fps()));
        }

        self.input.end_frame();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.init(event_loop) {
            self.error = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        self.input.process_event(&event);

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Window close requested");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => {
                self.frame();
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

/// Load the scene, open the window and run until it is closed
pub fn run(config: ViewerConfig) -> Result<()> {
    let scene = load_scene(&config.scene_path)?;

    let event_loop = EventLoop::new()
        .map_err(|e| Error::Window(format!("Failed to create event loop: {}", e)))?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config, scene);
    event_loop
        .run_app(&mut app)
        .map_err(|e| Error::Window(format!("Event loop error: {}", e)))?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
