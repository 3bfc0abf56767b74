use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::core::{App as CoreApp, AppControl, WindowCtx};
use crate::device::{Gpu, GpuInit};
use crate::input::InputState;
use crate::input::platform::winit::translate_window_event;

use super::waker::{RuntimeWaker, Wake};

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "vellum".to_string(),
            initial_size: LogicalSize::new(800.0, 600.0),
        }
    }
}

/// Runtime context passed to the application.
///
/// Commands are buffered and applied after the current callback returns.
pub struct RuntimeCtx {
    exit: bool,
    waker: RuntimeWaker,
}

impl RuntimeCtx {
    fn new(waker: RuntimeWaker) -> Self {
        Self { exit: false, waker }
    }

    pub fn exit(&mut self) {
        self.exit = true;
    }

    /// Handle for waking the loop from other threads.
    pub fn waker(&self) -> RuntimeWaker {
        self.waker.clone()
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens one window and runs the event loop until the window closes, the
    /// app asks to exit, or a fatal error occurs.
    pub fn run<A>(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Result<()>
    where
        A: 'static + CoreApp,
    {
        let event_loop = EventLoop::<Wake>::with_user_event()
            .build()
            .context("failed to create winit EventLoop")?;
        let waker = RuntimeWaker::new(event_loop.create_proxy());
        let mut state = AppState::new(config, gpu_init, app, waker);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.fatal.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[self_referencing]
struct WindowEntry {
    input_state: InputState,

    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

struct AppState<A>
where
    A: CoreApp + 'static,
{
    config: RuntimeConfig,
    gpu_init: GpuInit,
    app: A,
    runtime: RuntimeCtx,

    window: Option<WindowEntry>,
    started: bool,
    fatal: Option<anyhow::Error>,
}

impl<A> AppState<A>
where
    A: CoreApp + 'static,
{
    fn new(config: RuntimeConfig, gpu_init: GpuInit, app: A, waker: RuntimeWaker) -> Self {
        Self {
            config,
            gpu_init,
            app,
            runtime: RuntimeCtx::new(waker),
            window: None,
            started: false,
            fatal: None,
        }
    }

    fn create_window_entry(&mut self, event_loop: &ActiveEventLoop) -> Result<WindowId> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let id = window.id();
        let gpu_init = self.gpu_init.clone();

        let entry = WindowEntryTryBuilder {
            input_state: InputState::default(),
            window,
            gpu_builder: |w| pollster::block_on(Gpu::new(w, gpu_init)),
        }
        .try_build()
        .context("GPU initialization failed for window")?;

        self.window = Some(entry);
        Ok(id)
    }

    /// Runs `f` with a fresh [`WindowCtx`]. Returns `None` without a window.
    fn with_ctx<R>(
        &mut self,
        f: impl FnOnce(&mut A, &mut WindowCtx<'_, '_>) -> R,
    ) -> Option<R> {
        let (app, runtime, window) = (&mut self.app, &mut self.runtime, &mut self.window);
        let entry = window.as_mut()?;

        Some(entry.with_mut(|fields| {
            let mut ctx = WindowCtx {
                window: fields.window,
                gpu: fields.gpu,
                input: fields.input_state,
                runtime,
            };
            f(app, &mut ctx)
        }))
    }

    fn handle_control(&mut self, control: Option<AppControl>) {
        if control == Some(AppControl::Exit) {
            self.runtime.exit();
        }
    }

    fn fail(&mut self, err: anyhow::Error) {
        log::error!("runtime failure: {err:#}");
        self.fatal = Some(err);
        self.runtime.exit();
    }

    fn close_window(&mut self) {
        if self.window.take().is_some() {
            self.app.on_close();
        }
        self.runtime.exit();
    }

    fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if let Some(entry) = self.window.as_mut() {
            entry.with_gpu_mut(|gpu| gpu.resize(new_size));
        }
        if new_size.width == 0 || new_size.height == 0 {
            // Minimized: keep the old surface until a real size arrives.
            return;
        }
        let control = self.with_ctx(|app, ctx| {
            let viewport = ctx.viewport();
            let control = app.on_resize(ctx, viewport);
            ctx.request_redraw();
            control
        });
        self.handle_control(control);
    }

    fn finish_callback(&mut self, event_loop: &ActiveEventLoop) {
        if self.runtime.exit {
            if self.window.is_some() {
                self.close_window();
            }
            event_loop.exit();
        }
    }
}

impl<A> ApplicationHandler<Wake> for AppState<A>
where
    A: CoreApp + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() && !self.started {
            if let Err(e) = self.create_window_entry(event_loop) {
                self.fail(e);
                self.finish_callback(event_loop);
                return;
            }

            self.started = true;
            let started = self.with_ctx(|app, ctx| {
                let result = app.on_start(ctx);
                ctx.request_redraw();
                result
            });
            if let Some(Err(e)) = started {
                self.fail(e.context("application start failed"));
            }
        }

        self.finish_callback(event_loop);
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, _event: Wake) {
        let control = self.with_ctx(|app, ctx| app.on_wake(ctx));
        self.handle_control(control);
        self.finish_callback(event_loop);
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Wait);
        self.finish_callback(event_loop);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        // Input first: translate, fold into tracked state, then hand each
        // event to the app.
        let inputs = self
            .window
            .as_mut()
            .map(|entry| {
                entry.with_mut(|fields| {
                    let evs = translate_window_event(
                        fields.window.scale_factor(),
                        fields.input_state,
                        &event,
                    );
                    for ev in &evs {
                        fields.input_state.apply_event(ev);
                    }
                    evs
                })
            })
            .unwrap_or_default();

        for ev in &inputs {
            let control = self.with_ctx(|app, ctx| app.on_input(ctx, ev));
            self.handle_control(control);
        }

        match &event {
            WindowEvent::CloseRequested => self.close_window(),

            WindowEvent::Resized(new_size) => self.resize(*new_size),

            WindowEvent::ScaleFactorChanged { .. } => {
                let new_size = self.window.as_ref().map(|e| e.borrow_window().inner_size());
                if let Some(new_size) = new_size {
                    self.resize(new_size);
                }
            }

            WindowEvent::RedrawRequested => {
                let control = self.with_ctx(|app, ctx| app.on_frame(ctx));
                self.handle_control(control);
            }

            _ => {}
        }

        self.finish_callback(event_loop);
    }
}
