use std::time::Duration;

use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Window, WindowId};

use crate::device::{GpuInit, WgpuFrameLoop, create_frame_loop};
use crate::frame::{LoopConfig, LoopEvent, LoopState};
use crate::input::{self, InputEvent, Key, KeyState};
use crate::paint::Color;

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    /// Client-area size in physical pixels.
    pub initial_size: PhysicalSize<u32>,
    pub clear_color: Color,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "pulse".to_string(),
            initial_size: PhysicalSize::new(1280, 720),
            clear_color: Color::CORNFLOWER_BLUE,
        }
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens the window, runs the frame loop until the window closes, then
    /// drains the GPU before anything is released.
    ///
    /// A setup failure returns before the window is ever shown.
    pub fn run(config: RuntimeConfig, gpu_init: GpuInit) -> Result<()> {
        let mut event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, gpu_init);
        let mut failure = None;

        loop {
            // Block for events until there is something to render; afterwards
            // only drain what is pending.
            let timeout = match &state.entry {
                Some(entry) if entry.with_frame_loop(|fl| fl.is_drawable()) => Some(Duration::ZERO),
                _ => None,
            };
            let status = event_loop.pump_app_events(timeout, &mut state);

            if let Some(err) = state.setup_error.take() {
                return Err(err);
            }

            if let PumpStatus::Exit(code) = status {
                log::debug!("event loop exited with code {code}");
                state.events.push(LoopEvent::Quit);
            }

            let events = std::mem::take(&mut state.events);
            let Some(entry) = state.entry.as_mut() else {
                if matches!(status, PumpStatus::Exit(_)) {
                    return Ok(());
                }
                continue;
            };

            match entry.with_frame_loop_mut(|fl| fl.run_iteration(events)) {
                Ok(LoopState::Running) => {}
                Ok(_) => break,
                Err(err) => {
                    log::error!("frame failed: {err:#}");
                    failure = Some(err);
                    break;
                }
            }
        }

        let shutdown = match state.entry.take() {
            Some(mut entry) => entry.with_frame_loop_mut(|fl| fl.shutdown()),
            None => Ok(()),
        };

        first_failure(failure, shutdown)
    }
}

/// The frame failure wins over a failed shutdown flush; the latter is logged.
fn first_failure(failure: Option<anyhow::Error>, shutdown: Result<()>) -> Result<()> {
    match (failure, shutdown) {
        (Some(err), Err(shutdown_err)) => {
            log::error!("shutdown after a failed frame also failed: {shutdown_err:#}");
            Err(err)
        }
        (Some(err), Ok(())) => Err(err),
        (None, shutdown) => shutdown,
    }
}

#[self_referencing]
struct WindowEntry {
    window: Window,

    #[borrows(window)]
    #[not_covariant]
    frame_loop: WgpuFrameLoop<'this>,
}

struct AppState {
    config: RuntimeConfig,
    gpu_init: GpuInit,

    entry: Option<WindowEntry>,

    /// Loop events collected during the current pump.
    events: Vec<LoopEvent>,
    setup_error: Option<anyhow::Error>,
}

impl AppState {
    fn new(config: RuntimeConfig, gpu_init: GpuInit) -> Self {
        Self {
            config,
            gpu_init,
            entry: None,
            events: Vec::new(),
            setup_error: None,
        }
    }

    fn create_window_entry(&self, event_loop: &ActiveEventLoop) -> Result<WindowEntry> {
        // Hidden until the GPU is ready so a failed setup never shows a window.
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size)
            .with_visible(false);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let gpu_init = self.gpu_init.clone();
        let loop_config = LoopConfig {
            vsync: gpu_init.vsync,
            clear_color: self.config.clear_color,
        };

        let entry = WindowEntryTryBuilder {
            window,
            frame_loop_builder: |w| {
                let mut frame_loop = pollster::block_on(create_frame_loop(w, gpu_init, loop_config))?;
                frame_loop.start()?;
                Ok::<_, anyhow::Error>(frame_loop)
            },
        }
        .try_build()
        .context("GPU initialization failed")?;

        entry.borrow_window().set_visible(true);
        Ok(entry)
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_some() || self.setup_error.is_some() {
            return;
        }

        event_loop.set_control_flow(ControlFlow::Poll);

        match self.create_window_entry(event_loop) {
            Ok(entry) => self.entry = Some(entry),
            Err(err) => {
                self.setup_error = Some(err);
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
        match event {
            WindowEvent::CloseRequested => self.events.push(LoopEvent::Quit),

            WindowEvent::Resized(size) => {
                // Minimized: sleep until the window system has something for us.
                let flow = if size.width > 0 && size.height > 0 {
                    ControlFlow::Poll
                } else {
                    ControlFlow::Wait
                };
                event_loop.set_control_flow(flow);

                self.events.push(LoopEvent::Resized {
                    width: size.width,
                    height: size.height,
                });
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if let Some(ev) = input::loop_event_for(&translate_key(&event)) {
                    self.events.push(ev);
                }
            }

            _ => {}
        }
    }
}

fn translate_key(event: &KeyEvent) -> InputEvent {
    let key = match event.physical_key {
        PhysicalKey::Code(KeyCode::KeyV) => Key::V,
        PhysicalKey::Code(code) => Key::Unknown(code as u32),
        // NativeKeyCode is not a u32 in winit 0.30; preserve "unknown" without a stable numeric.
        PhysicalKey::Unidentified(_) => Key::Unknown(0),
    };

    let state = match event.state {
        ElementState::Pressed => KeyState::Pressed,
        ElementState::Released => KeyState::Released,
    };

    InputEvent::Key {
        key,
        state,
        repeat: event.repeat,
    }
}
