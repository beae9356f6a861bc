//! Window host: creates the context and drives a [`Demo`] frame by frame.

use std::time::Instant;

use anyhow::{Context as _, Result};
use glium::backend::glutin::SimpleWindowBuilder;
use glium::backend::Facade;
use glium::glutin::surface::WindowSurface;
use glium::Display;
use glkit_core::{drain_errors, Demo, FrameInput, GraphicsDevice};
use tracing::{debug, error, info, trace, warn};
use winit::application::ApplicationHandler;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowId};

use crate::device::GlDevice;
use crate::{glsl, state};

/// Window and loop settings.
#[derive(Debug, Clone, PartialEq)]
pub struct HostConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Color the framebuffer is cleared to before each frame.
    pub clear_color: [f32; 4],
    /// Exit after this many frames. `None` runs until the window closes.
    pub frame_limit: Option<u64>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            title: "LearnOpenGL".to_owned(),
            width: 800,
            height: 600,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            frame_limit: None,
        }
    }
}

impl HostConfig {
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    #[must_use]
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    #[must_use]
    pub fn with_clear_color(mut self, rgba: [f32; 4]) -> Self {
        self.clear_color = rgba;
        self
    }

    /// Close the window after `frames` presented frames; `None` runs until
    /// the window is closed.
    #[must_use]
    pub fn with_frame_limit(mut self, frames: Option<u64>) -> Self {
        self.frame_limit = frames;
        self
    }
}

fn log_device_errors(device: &mut GlDevice, when: &str) {
    for err in drain_errors(device) {
        warn!(%err, "device error {when}");
    }
}

/// Open a window, hand its context to `demo`, and run until the window is
/// closed or Escape is pressed.
///
/// Blocks the calling thread, which becomes the only thread allowed to touch
/// the context. `demo.shutdown` runs before the context is destroyed.
pub fn run<A: Demo>(config: HostConfig, mut demo: A) -> Result<()> {
    let event_loop = EventLoop::new().context("failed to create event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let (window, display) = SimpleWindowBuilder::new()
        .with_title(&config.title)
        .with_inner_size(config.width, config.height)
        .build(&event_loop);

    let context = display.get_context();
    info!(version = context.get_opengl_version_string(), "OpenGL context created");
    match glsl::best_glsl_version(&**context) {
        Some(directive) => debug!("best GLSL target: {directive}"),
        None => warn!("context reports no desktop GLSL version"),
    }

    // SAFETY: `build` made the display's context current on this thread, and
    // the device never leaves this function or the event loop below.
    let mut device = unsafe { GlDevice::new() };
    anyhow::ensure!(state::is_context_current(), "no OpenGL context is current after window creation");
    if let Some(info) = state::context_info() {
        debug!(vendor = %info.vendor, renderer = %info.renderer, glsl = %info.glsl_version, "driver");
    }

    let (width, height) = context.get_framebuffer_dimensions();
    device.viewport(0, 0, width as i32, height as i32);

    demo.init(&mut device).context("demo initialisation failed")?;
    log_device_errors(&mut device, "during init");

    let mut runner = Runner {
        config,
        display,
        window,
        device,
        demo,
        started: Instant::now(),
        frame: 0,
        viewport: (width, height),
        finished: false,
    };
    event_loop.run_app(&mut runner).context("event loop failed")?;
    Ok(())
}

struct Runner<A: Demo> {
    config: HostConfig,
    // Dropped before the window it draws into.
    display: Display<WindowSurface>,
    window: Window,
    device: GlDevice,
    demo: A,

    started: Instant,
    frame: u64,
    viewport: (u32, u32),
    finished: bool,
}

impl<A: Demo> Runner<A> {
    fn resize(&mut self, width: u32, height: u32) {
        self.display.resize((width, height));
        self.device.viewport(0, 0, width as i32, height as i32);
        self.viewport = (width, height);
        debug!(width, height, "viewport resized");
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let input = FrameInput {
            frame: self.frame,
            elapsed: self.started.elapsed(),
            viewport: self.viewport,
        };
        trace!(frame = input.frame, "frame");

        self.device.clear_color(self.config.clear_color);
        self.device.clear();
        if let Err(e) = self.demo.frame(&mut self.device, &input) {
            error!(frame = input.frame, "frame failed: {e}");
        }
        log_device_errors(&mut self.device, "after frame");

        if let Err(e) = self.display.get_context().swap_buffers() {
            error!("swap failed: {e:?}");
            event_loop.exit();
            return;
        }

        self.frame += 1;
        if self.config.frame_limit.is_some_and(|limit| self.frame >= limit) {
            info!(frames = self.frame, "frame limit reached");
            event_loop.exit();
        }
    }

    fn shutdown(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        self.demo.shutdown(&mut self.device);
        // SAFETY: the context is still alive and current; `display` is only
        // dropped after the runner.
        unsafe { state::reset_bindings() };
        log_device_errors(&mut self.device, "during shutdown");
        info!(frames = self.frame, "demo shut down");
    }
}

impl<A: Demo> ApplicationHandler for Runner<A> {
    fn resumed(&mut self, _event_loop: &ActiveEventLoop) {
        self.window.request_redraw();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key: Key::Named(NamedKey::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => event_loop.exit(),
            WindowEvent::Resized(size) => self.resize(size.width, size.height),
            WindowEvent::RedrawRequested if !self.finished => self.redraw(event_loop),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        self.window.request_redraw();
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_window_matches_the_tutorial() {
        let config = HostConfig::default();
        assert_eq!(config.title, "LearnOpenGL");
        assert_eq!((config.width, config.height), (800, 600));
        assert_eq!(config.frame_limit, None);
    }

    #[test]
    fn builders_override_fields() {
        let config = HostConfig::default()
            .with_title("quad")
            .with_size(320, 240)
            .with_clear_color([0.2, 0.3, 0.3, 1.0])
            .with_frame_limit(Some(10));
        assert_eq!(config.title, "quad");
        assert_eq!(config.width, 320);
        assert_eq!(config.clear_color, [0.2, 0.3, 0.3, 1.0]);
        assert_eq!(config.frame_limit, Some(10));
        assert_eq!(config.with_frame_limit(None).frame_limit, None);
    }
}
