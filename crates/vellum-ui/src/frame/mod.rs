//! The frame: owner of the backing surface and its painter.
//!
//! A frame goes `Uninitialized → Running → Destroyed`. While running it
//! routes platform input to the subscribed handlers and turns redraw requests
//! into `save → translate → clip → redraw → flush → restore` cycles on its
//! painter. The surface and the painter are always replaced together.

mod error;
mod queue;

pub use error::{FrameError, FrameState};
pub use queue::{RedrawQueue, RedrawSender};

use std::rc::Rc;

use vellum_engine::coords::{Rect, Size};
use vellum_engine::input::InputEvent;
use vellum_engine::paint::Color;
use vellum_engine::text::FontSystem;

use crate::event::{CursorKind, RedrawRequest};
use crate::painter::{PaintEnv, Painter, SaveGuard};
use crate::platform::Platform;
use crate::resource::{ResourceCache, Waker};
use crate::router::{EventRouter, ResolvedTarget};

use queue::RemoteRedraws;

// ── FrameConfig ───────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct FrameConfig {
    pub title: String,
    /// Logical width of the window.
    pub width: f32,
    pub height: f32,
    /// Shown wherever nothing has been painted.
    pub background: Color,
    /// Used by headless platforms; windowed ones report their own.
    pub scale_factor: f32,
}

impl FrameConfig {
    pub fn new(title: impl Into<String>, width: f32, height: f32) -> Self {
        Self { title: title.into(), width, height, ..Self::default() }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn background(mut self, color: Color) -> Self {
        self.background = color;
        self
    }

    pub fn scale_factor(mut self, scale: f32) -> Self {
        self.scale_factor = scale;
        self
    }
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            title: "vellum".to_string(),
            width: 800.0,
            height: 600.0,
            background: Color::from_straight(0.07, 0.07, 0.09, 1.0),
            scale_factor: 1.0,
        }
    }
}

// ── Frame ─────────────────────────────────────────────────────────────────

pub struct Frame<P: Platform> {
    // Declared before `surface`: the painter is dropped first.
    painter: Option<Box<dyn Painter>>,
    surface: Option<P::Surface>,
    platform: P,

    config: FrameConfig,
    state: FrameState,
    size: Size,
    scale: f32,

    router: EventRouter,
    env: PaintEnv,
    queue: RedrawQueue,
    remote: RemoteRedraws,
}

impl<P: Platform> Frame<P> {
    /// Frame with its own image cache, loading on background threads.
    pub fn new(platform: P, config: FrameConfig, fonts: Rc<FontSystem>) -> Self {
        Self::with_env(platform, config, PaintEnv::new(fonts, ResourceCache::default()))
    }

    pub fn with_env(platform: P, config: FrameConfig, env: PaintEnv) -> Self {
        Self {
            painter: None,
            surface: None,
            platform,
            size: config.size(),
            scale: config.scale_factor,
            config,
            state: FrameState::Uninitialized,
            router: EventRouter::new(),
            env,
            queue: RedrawQueue::new(),
            remote: RemoteRedraws::new(),
        }
    }

    // ── lifecycle ─────────────────────────────────────────────────────────

    /// Opens the platform window and binds the first painter.
    ///
    /// Every required input subscription and the redraw subscription must be
    /// in place. A full root redraw is queued.
    pub fn start(&mut self) -> Result<(), FrameError> {
        self.require(FrameState::Uninitialized)?;
        self.router.ensure_complete()?;

        let size = self.platform.open(&self.config).map_err(FrameError::Platform)?;
        let scale = self.platform.scale_factor();
        if let Err(err) = self.rebuild_surface(size, scale) {
            self.platform.close();
            return Err(err);
        }

        self.state = FrameState::Running;
        self.queue.post_root(true);
        log::info!(
            "frame '{}' running on {} ({}x{} @{})",
            self.config.title,
            self.platform.name(),
            size.width,
            size.height,
            self.scale
        );
        Ok(())
    }

    /// Replaces the surface and painter for a new size, then repaints the
    /// root completely. Empty sizes (a minimized window) are ignored.
    ///
    /// When the platform cannot create the new surface the old surface and
    /// painter stay bound and the frame keeps running at its old size.
    pub fn resize(&mut self, size: Size, scale: f32) -> Result<(), FrameError> {
        self.require(FrameState::Running)?;
        if size.is_empty() {
            log::debug!("frame: ignoring resize to {}x{}", size.width, size.height);
            return Ok(());
        }

        self.rebuild_surface(size, scale)?;
        self.post_update(&RedrawRequest::root(true))
    }

    /// Releases the surface and drops every subscription.
    pub fn destroy(&mut self) -> Result<(), FrameError> {
        self.require(FrameState::Running)?;
        self.painter = None;
        self.surface = None;
        self.router.clear();
        self.env.images.set_waker(None);
        self.remote.set_waker(None);
        self.queue.take();
        self.platform.close();
        self.state = FrameState::Destroyed;
        log::info!("frame '{}' destroyed", self.config.title);
        Ok(())
    }

    fn rebuild_surface(&mut self, size: Size, scale: f32) -> Result<(), FrameError> {
        let surface = self
            .platform
            .create_surface(size, scale)
            .map_err(FrameError::Platform)?;

        // The old painter is released before the new one is bound.
        self.painter = None;
        self.surface = None;
        self.painter = Some(self.platform.bind_painter(&surface, &self.env));
        self.surface = Some(surface);
        self.size = size;
        self.scale = scale;

        log::debug!("frame: surface {}x{} @{}", size.width, size.height, self.scale);
        Ok(())
    }

    fn require(&self, expected: FrameState) -> Result<(), FrameError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(FrameError::InvalidState { expected, found: self.state })
        }
    }

    // ── redraw ────────────────────────────────────────────────────────────

    /// Runs one redraw cycle for `request` and presents the result.
    ///
    /// The painter is back at its previous depth when this returns, whether
    /// the target succeeded, failed, or panicked. A target that leaves the
    /// state unbalanced is reported and nothing is flushed.
    pub fn post_update(&mut self, request: &RedrawRequest) -> Result<(), FrameError> {
        self.require(FrameState::Running)?;
        let resolved = EventRouter::resolve(&request.target)?;

        let (Some(painter), Some(surface)) = (self.painter.as_deref_mut(), self.surface.as_ref())
        else {
            return Err(FrameError::NoSurface);
        };

        {
            let mut painter = SaveGuard::new(painter);
            if let ResolvedTarget::Widget(_) = resolved.target {
                painter.translate(resolved.scope.origin);
                if let Some(clip) = resolved.scope.clip {
                    painter.clip(clip);
                }
            }

            let entry = painter.depth();
            self.router.redraw(&resolved.target, &mut *painter, request.completely)?;
            let found = painter.depth();
            if found != entry {
                return Err(FrameError::UnbalancedPaintState { expected: entry, found });
            }
            painter.flush();
        }

        self.platform.present(surface).map_err(FrameError::Platform)
    }

    /// Applies finished image loads, then redraws everything queued so far.
    ///
    /// Requests whose target is gone, busy, or fails to draw are logged and
    /// dropped. Any other error stops the batch; what was not drawn yet stays
    /// queued. Returns the number of completed cycles.
    pub fn process_pending(&mut self) -> Result<usize, FrameError> {
        self.require(FrameState::Running)?;
        let resolved = self.env.images.poll();
        if resolved > 0 {
            log::trace!("frame: {resolved} image load(s) applied");
        }
        self.remote.drain_into(&self.queue);

        let mut drawn = 0;
        let mut batch = self.queue.take().into_iter();
        while let Some(request) = batch.next() {
            match self.post_update(&request) {
                Ok(()) => drawn += 1,
                Err(err) if err.is_recoverable() => {
                    log::warn!("frame: redraw of {:?} skipped: {err:#}", request.target);
                }
                Err(err) => {
                    for rest in batch {
                        self.queue.post(rest);
                    }
                    return Err(err);
                }
            }
        }
        Ok(drawn)
    }

    // ── input ─────────────────────────────────────────────────────────────

    /// Routes one platform event. Returns whether a handler received it.
    pub fn dispatch_input(&mut self, event: &InputEvent) -> Result<bool, FrameError> {
        self.require(FrameState::Running)?;
        Ok(self.router.dispatch(event))
    }

    /// Handlers; subscribe before [`start`](Self::start).
    pub fn router_mut(&mut self) -> &mut EventRouter {
        &mut self.router
    }

    pub fn router(&self) -> &EventRouter {
        &self.router
    }

    // ── platform pass-through ─────────────────────────────────────────────

    pub fn set_cursor(&mut self, cursor: CursorKind) {
        self.platform.set_cursor(cursor);
    }

    /// Tells the platform where the text caret is, so composition UI can
    /// follow it. `rect` is in logical window coordinates.
    pub fn set_ime_cursor_rect(&mut self, rect: Rect) {
        self.platform.set_ime_cursor_rect(rect);
    }

    pub fn clipboard_text(&mut self) -> Result<String, FrameError> {
        self.platform.clipboard_get()
    }

    pub fn set_clipboard_text(&mut self, text: &str) -> Result<(), FrameError> {
        self.platform.clipboard_set(text)
    }

    /// Called after image loads complete and after remote redraw requests,
    /// from whichever thread produced them.
    pub fn set_waker(&mut self, waker: Option<Waker>) {
        self.env.images.set_waker(waker.clone());
        self.remote.set_waker(waker);
    }

    // ── accessors ─────────────────────────────────────────────────────────

    pub fn state(&self) -> FrameState {
        self.state
    }

    pub fn config(&self) -> &FrameConfig {
        &self.config
    }

    /// Logical size of the current surface.
    pub fn size(&self) -> Size {
        self.size
    }

    pub fn scale_factor(&self) -> f32 {
        self.scale
    }

    pub fn painter(&self) -> Option<&dyn Painter> {
        self.painter.as_deref()
    }

    /// The painter outside a redraw cycle, e.g. for measuring text.
    pub fn painter_mut(&mut self) -> Option<&mut (dyn Painter + 'static)> {
        self.painter.as_deref_mut()
    }

    pub fn surface(&self) -> Option<&P::Surface> {
        self.surface.as_ref()
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    pub fn env(&self) -> &PaintEnv {
        &self.env
    }

    pub fn images(&self) -> &ResourceCache {
        &self.env.images
    }

    pub fn fonts(&self) -> &Rc<FontSystem> {
        &self.env.fonts
    }

    /// Handle widgets post redraw requests to.
    pub fn queue(&self) -> RedrawQueue {
        self.queue.clone()
    }

    /// Handle other threads use to ask for a root redraw.
    pub fn redraw_sender(&self) -> RedrawSender {
        self.remote.sender()
    }
}

impl<P: Platform> std::fmt::Debug for Frame<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("platform", &self.platform.name())
            .field("state", &self.state)
            .field("size", &self.size)
            .field("scale", &self.scale)
            .field("queued", &self.queue.len())
            .finish_non_exhaustive()
    }
}
