//! Core application logic

use crate::audio::start_audio_pipeline;
use crate::core::{SharedSurface, LOGICAL_SIDE};
use crate::input::{map_key, InputEvent, InputTranslator, KeyState};
use crate::network::{self, KeyAction, StreamFilter, SubscriptionHandle};
use crate::utils::save_screenshot;
use crate::video::{start_frame_pipeline, MirrorRenderer};
use crate::{log_error, log_info, log_verbose};
use std::sync::Arc;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow};

pub struct MirrorApp {
    pub host: String,
    pub port: u16,
    pub enable_audio: bool,
    surface: Arc<SharedSurface>,
    renderer: Option<MirrorRenderer>,
    window: Option<Arc<winit::window::Window>>,
    threads_started: bool,
    subscriptions: Vec<SubscriptionHandle>,
    translator: Option<InputTranslator>,
    // Input handling
    cursor_position: Option<(f64, f64)>,
    drag_start: Option<(f64, f64)>,
    ctrl_pressed: bool,
    cmd_pressed: bool,
    // Presentation state
    presented_version: u64,
    presented_frames: u64,
    last_log: std::time::Instant,
}

impl MirrorApp {
    pub fn new(host: String, port: u16, enable_audio: bool) -> Self {
        Self {
            host,
            port,
            enable_audio,
            surface: Arc::new(SharedSurface::new()),
            renderer: None,
            window: None,
            threads_started: false,
            subscriptions: Vec::new(),
            translator: None,
            cursor_position: None,
            drag_start: None,
            ctrl_pressed: false,
            cmd_pressed: false,
            presented_version: 0,
            presented_frames: 0,
            last_log: std::time::Instant::now(),
        }
    }

    /// Cancel both subscriptions (including any pending reconnect timers),
    /// mark the surface torn down and restore gesture state. Idempotent.
    fn teardown(&mut self) {
        for sub in &self.subscriptions {
            sub.cancel();
        }
        self.subscriptions.clear();
        self.surface.close();
        if let Some(translator) = &mut self.translator {
            translator.reset();
        }
    }

    fn save_snapshot(&self) {
        if let Some((side, pixels)) = self.surface.snapshot() {
            save_screenshot(side, pixels);
        }
    }
}

impl Drop for MirrorApp {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl ApplicationHandler for MirrorApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let window_attrs = winit::window::Window::default_attributes()
            .with_title("Pod-Mirror")
            .with_inner_size(winit::dpi::LogicalSize::new(
                LOGICAL_SIDE * 2,
                LOGICAL_SIDE * 2,
            ));

        if let Ok(window) = event_loop.create_window(window_attrs) {
            self.window = Some(Arc::new(window));
        }

        if self.threads_started {
            log_verbose!("APP", "resumed() again, threads already started - skipping");
            return;
        }
        self.threads_started = true;

        // Action dispatcher - larger buffer for fast typing
        let (action_tx, action_rx) = crossbeam_channel::bounded::<KeyAction>(256);
        network::start_action_thread(self.host.clone(), self.port + 1, action_rx);
        self.translator = Some(InputTranslator::new(action_tx));

        log_verbose!("APP", "Starting stream subscriptions...");

        // Frame subscription -> decoder pipeline
        let (frame_tx, frame_rx) = crossbeam_channel::bounded::<Vec<u8>>(64);
        self.subscriptions.push(network::subscribe(
            self.host.clone(),
            self.port,
            StreamFilter::FrameUpdates,
            frame_tx,
        ));
        start_frame_pipeline(frame_rx, self.surface.clone());

        // Audio subscription -> playback pipeline
        if self.enable_audio {
            let (audio_tx, audio_rx) = crossbeam_channel::bounded::<Vec<u8>>(64);
            self.subscriptions.push(network::subscribe(
                self.host.clone(),
                self.port,
                StreamFilter::AudioClips,
                audio_tx,
            ));
            start_audio_pipeline(audio_rx);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::Resized(size) => {
                if size.width > 0 && size.height > 0 {
                    if let Some(r) = &mut self.renderer {
                        let _ = r.resize_surface(size.width, size.height);
                    }
                }
            }
            WindowEvent::CloseRequested => {
                self.teardown();
                event_loop.exit();
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor_position = Some((position.x, position.y));
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => match state {
                ElementState::Pressed => {
                    self.drag_start = self.cursor_position;
                    if let Some(translator) = &mut self.translator {
                        translator.begin_gesture();
                    }
                }
                ElementState::Released => {
                    if let (Some(start), Some(end)) = (self.drag_start, self.cursor_position) {
                        let dx = end.0 - start.0;
                        let dy = end.1 - start.1;
                        if let Some(translator) = &mut self.translator {
                            translator.handle(InputEvent::Gesture { dx, dy });
                        }
                    }
                    self.drag_start = None;
                    if let Some(translator) = &mut self.translator {
                        translator.end_gesture();
                    }
                }
            },
            WindowEvent::MouseWheel { .. } => {
                // Swallowed: scrolling stays suppressed while a drag gesture
                // is engaged on the mirror surface.
            }
            WindowEvent::ModifiersChanged(modifiers) => {
                self.ctrl_pressed = modifiers.state().control_key();
                self.cmd_pressed = modifiers.state().super_key();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed
                    && (self.ctrl_pressed || self.cmd_pressed)
                {
                    if let winit::keyboard::Key::Character(c) = &event.logical_key {
                        if c.as_str() == "s" {
                            log_verbose!("INPUT", "Shortcut: Screenshot");
                            self.save_snapshot();
                            return;
                        }
                    }
                }

                // Auto-repeat passes through: a held key re-emits a press
                // on every repeat.
                if let Some(key) = map_key(&event.logical_key) {
                    let state = match event.state {
                        ElementState::Pressed => KeyState::Down,
                        ElementState::Released => KeyState::Up,
                    };
                    if let Some(translator) = &mut self.translator {
                        translator.handle(InputEvent::Key { key, state });
                    }
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let version = self.surface.version();
        if version != self.presented_version {
            if let Some((side, pixels)) = self.surface.snapshot() {
                if self.renderer.is_none() {
                    if let Some(window) = &self.window {
                        match MirrorRenderer::new(window.clone(), side) {
                            Ok(renderer) => self.renderer = Some(renderer),
                            Err(e) => log_error!("REN", "Renderer init failed: {}", e),
                        }
                    }
                }

                if let Some(renderer) = &mut self.renderer {
                    match renderer.render_frame(side, &pixels) {
                        Ok(()) => {
                            self.presented_version = version;
                            self.presented_frames += 1;
                        }
                        Err(e) => log_verbose!("REN", "Render failed: {}", e),
                    }
                }
            }
        }

        if self.last_log.elapsed().as_secs() >= 10 {
            log_info!(
                "REN",
                "Stats: {} frames presented, surface v{}",
                self.presented_frames,
                version
            );
            self.last_log = std::time::Instant::now();
        }

        if let Some(w) = &self.window {
            w.request_redraw();
        }
        event_loop.set_control_flow(ControlFlow::Poll);
    }
}

pub fn run(host: String, port: u16, enable_audio: bool) -> anyhow::Result<()> {
    let event_loop = winit::event_loop::EventLoop::new()?;
    let mut app = MirrorApp::new(host, port, enable_audio);
    event_loop.run_app(&mut app)?;
    Ok(())
}
