//! Vellum UI: the render/event bridge between a widget tree and a surface.
//!
//! A [`Frame`](frame::Frame) owns one backing surface and one [`Painter`](painter::Painter)
//! bound to it. Platform input is routed to the handlers subscribed on its
//! [`EventRouter`](router::EventRouter); redraw requests become scoped
//! `save → translate → clip → redraw → flush → restore` cycles. Images load
//! asynchronously through the [`ResourceCache`](resource::ResourceCache), and
//! multi-line text is laid out by the [`ParagraphEngine`](paragraph::ParagraphEngine).
//!
//! # Quick start
//!
//! ```rust,ignore
//! use vellum_ui::prelude::*;
//!
//! Application::new()
//!     .title("Hello")
//!     .font("DejaVu Sans Mono", include_bytes!("DejaVuSansMono.ttf").to_vec())
//!     .run(|frame| {
//!         let text = Style::new().fill(Color::WHITE).font("DejaVu Sans Mono", 14.0).shared();
//!         frame.router_mut()
//!             .on_mouse_down(|_| {})
//!             .on_mouse_up(|_| {})
//!             .on_cursor_pos(|_| {})
//!             .on_input_char(|_| {})
//!             .on_input_key(|_| {})
//!             .on_redraw(move |painter, _| {
//!                 painter.set_style(Some(text.clone()));
//!                 painter.fill_text("Hello!", Point::new(10.0, 24.0), None);
//!                 Ok(())
//!             });
//!         Ok(())
//!     })
//! ```
//!
//! # Headless
//!
//! [`OffscreenPlatform`](platform::OffscreenPlatform) and
//! [`RecordingPlatform`](platform::RecordingPlatform) run the same frame
//! without a window, producing pixels or display lists.

pub mod backend;
pub mod event;
pub mod frame;
pub mod painter;
pub mod paragraph;
pub mod platform;
pub mod resource;
pub mod router;
pub mod style;
pub mod widget;

pub use platform::desktop::Application;

/// The types a widget tree works with.
pub mod prelude {
    pub use crate::event::{
        CharEvent, CursorKind, ImePreeditEvent, KeyAction, KeyEvent, MouseEvent, RedrawRequest,
        RedrawTarget, WheelEvent,
    };
    pub use crate::frame::{Frame, FrameConfig, FrameError, FrameState, RedrawQueue};
    pub use crate::painter::{Painter, SaveGuard};
    pub use crate::paragraph::{Paragraph, ParagraphEngine, ParagraphStyle, TextAlign};
    pub use crate::platform::Platform;
    pub use crate::resource::{ResourceCache, ResourceId, ResourceStatus};
    pub use crate::style::{Fill, Font, Stroke, Style};
    pub use crate::widget::{Widget, WidgetRef};

    pub use vellum_engine::coords::{Circle, Point, Rect, Size};
    pub use vellum_engine::input::{Key, Modifiers};
    pub use vellum_engine::paint::Color;

    pub use crate::platform::desktop::Application;
}

#[cfg(test)]
pub(crate) mod testing {
    use std::io::Cursor;
    use std::rc::Rc;

    use vellum_engine::text::FontSystem;

    pub const MONO: &[u8] =
        include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/../../assets/fonts/DejaVuSansMono.ttf"));

    /// Font system with DejaVu Sans Mono as its only (and default) family.
    pub fn fonts() -> Rc<FontSystem> {
        let mut fonts = FontSystem::new();
        if let Err(e) = fonts.register_family("DejaVu Sans Mono", MONO) {
            panic!("test font failed to load: {e}");
        }
        Rc::new(fonts)
    }

    /// A `w`x`h` PNG filled with one straight-alpha RGBA color.
    pub fn png_bytes(w: u32, h: u32, rgba: [u8; 4]) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(w, h, image::Rgba(rgba));
        let mut out = Cursor::new(Vec::new());
        if let Err(e) = img.write_to(&mut out, image::ImageFormat::Png) {
            panic!("png encode failed: {e}");
        }
        out.into_inner()
    }
}
