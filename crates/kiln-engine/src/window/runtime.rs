use std::time::Duration;

use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::config::Settings;
use crate::core::{App as CoreApp, AppControl, FrameCtx};
use crate::device::{DeviceInit, GraphicsDevice};
use crate::input::platform::winit::translate_window_event;
use crate::input::{ActionMap, InputAction, InputState};
use crate::time::Timer;

const FPS_REPORT_INTERVAL: Duration = Duration::from_secs(5);

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens the window described by `settings` and drives `app` until it
    /// exits or the window closes.
    pub fn run<A>(settings: Settings, init: DeviceInit, actions: ActionMap, app: A) -> Result<()>
    where
        A: 'static + CoreApp,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(settings, init, actions, app);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.failure.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[self_referencing]
struct WindowEntry {
    input_state: InputState,
    timer: Timer,

    window: Window,

    #[borrows(window)]
    #[covariant]
    device: GraphicsDevice<'this>,
}

struct AppState<A>
where
    A: CoreApp + 'static,
{
    settings: Settings,
    init: DeviceInit,
    actions: ActionMap,
    app: A,

    window: Option<WindowEntry>,
    exit_requested: bool,
    failure: Option<anyhow::Error>,
}

impl<A> AppState<A>
where
    A: CoreApp + 'static,
{
    fn new(settings: Settings, init: DeviceInit, actions: ActionMap, app: A) -> Self {
        Self {
            settings,
            init,
            actions,
            app,
            window: None,
            exit_requested: false,
            failure: None,
        }
    }

    fn create_window_entry(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let (width, height) = self.settings.screen_size();
        let attrs = Window::default_attributes()
            .with_title(self.settings.title.clone())
            .with_inner_size(PhysicalSize::new(width, height));

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let settings = &self.settings;
        let init = self.init.clone();

        let mut entry = WindowEntryTryBuilder {
            input_state: InputState::default(),
            timer: Timer::new(),
            window,
            device_builder: |w| pollster::block_on(GraphicsDevice::new(w, settings, init)),
        }
        .try_build()
        .context("graphics device initialisation failed")?;

        let app = &mut self.app;
        if let Err(e) = entry.with_device_mut(|device| app.on_start(device)) {
            entry.with_device_mut(|device| {
                app.on_shutdown(device);
                device.shutdown();
            });
            return Err(e.context("application start-up failed"));
        }
        entry.with_timer_mut(Timer::reset);

        self.window = Some(entry);
        Ok(())
    }

    /// Lets the app release its resources, then shuts the device down.
    fn close(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(mut entry) = self.window.take() {
            let app = &mut self.app;
            entry.with_device_mut(|device| {
                app.on_shutdown(device);
                device.shutdown();
            });
        }
        self.exit_requested = true;
        event_loop.exit();
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{error:#}");
        self.failure = Some(error);
        self.close(event_loop);
    }

    /// Feeds a window event through the input state and the action map.
    /// Returns true when an unconsumed `Quit` was pressed.
    fn dispatch_input(&mut self, event: &WindowEvent) -> bool {
        let Some(entry) = self.window.as_mut() else {
            return false;
        };

        let transitions = entry.with_input_state_mut(|input| {
            translate_window_event(event, input.modifiers)
                .map(|ev| input.apply_event(&ev))
                .unwrap_or_default()
        });

        let mut quit = false;
        for (action, pressed) in self.actions.translate(&transitions) {
            if self.app.on_input(action, pressed) {
                continue;
            }
            if action == InputAction::Quit && pressed {
                quit = true;
            }
        }
        quit
    }

    /// One render tick.
    fn tick(&mut self) -> AppControl {
        let Some(entry) = self.window.as_mut() else {
            return AppControl::Continue;
        };

        let app = &mut self.app;
        entry.with_mut(|fields| {
            let time = fields.timer.tick();
            let fps = fields.timer.fps();

            let control = {
                let mut ctx = FrameCtx {
                    device: fields.device,
                    input: fields.input_state,
                    time,
                    fps,
                };
                app.on_frame(&mut ctx)
            };

            if fields.timer.report_due(FPS_REPORT_INTERVAL) {
                log::info!("{fps:.1} fps (frame {})", time.frame_index);
            }
            control
        })
    }
}

impl<A> ApplicationHandler for AppState<A>
where
    A: CoreApp + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() || self.exit_requested {
            return;
        }

        if let Err(e) = self.create_window_entry(event_loop) {
            self.fail(event_loop, e);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let ours = self
            .window
            .as_ref()
            .is_some_and(|entry| entry.with_window(|w| w.id()) == window_id);
        if !ours {
            return;
        }

        if self.dispatch_input(&event) {
            self.close(event_loop);
            return;
        }

        match event {
            WindowEvent::CloseRequested => self.close(event_loop),

            // Minimised windows report a zero size; the back buffer keeps its last size.
            WindowEvent::Resized(size) if size.width > 0 && size.height > 0 => {
                self.app.on_resized(size.width, size.height);
            }

            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        // Every pending event has been handled; render one tick.
        event_loop.set_control_flow(ControlFlow::Poll);
        if self.tick() == AppControl::Exit {
            self.close(event_loop);
        }
    }

    fn exiting(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            self.close(event_loop);
        }
    }
}
