use tiny_skia::{ColorU8, Pixmap, PixmapRef};

use vellum_engine::coords::Size;

use super::ResourceError;

/// A decoded image: a premultiplied RGBA8 pixmap.
#[derive(Clone)]
pub struct Bitmap {
    pixmap: Pixmap,
}

impl Bitmap {
    /// Decodes any format the `image` crate was built with.
    pub fn decode(bytes: &[u8]) -> Result<Self, ResourceError> {
        let rgba = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self::from_straight_rgba8(width, height, rgba.into_raw())
    }

    /// Wraps straight-alpha RGBA8 pixels, premultiplying them.
    pub fn from_straight_rgba8(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, ResourceError> {
        let bad = || ResourceError::BadPixelBuffer { width, height, len: pixels.len() };
        if pixels.len() != (width as usize) * (height as usize) * 4 {
            return Err(bad());
        }
        let mut pixmap = Pixmap::new(width, height).ok_or_else(bad)?;
        for (dst, src) in pixmap.pixels_mut().iter_mut().zip(pixels.chunks_exact(4)) {
            *dst = ColorU8::from_rgba(src[0], src[1], src[2], src[3]).premultiply();
        }
        Ok(Self { pixmap })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Size in pixels, as logical units.
    pub fn size(&self) -> Size {
        Size::new(self.width() as f32, self.height() as f32)
    }

    /// Premultiplied RGBA8 rows, tightly packed.
    pub fn pixels(&self) -> &[u8] {
        self.pixmap.data()
    }

    pub fn as_pixmap(&self) -> PixmapRef<'_> {
        self.pixmap.as_ref()
    }

    /// Premultiplied RGBA at (`x`, `y`), transparent outside the image.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.pixmap
            .pixel(x, y)
            .map_or([0; 4], |p| [p.red(), p.green(), p.blue(), p.alpha()])
    }
}

impl PartialEq for Bitmap {
    fn eq(&self, other: &Self) -> bool {
        self.width() == other.width() && self.height() == other.height() && self.pixels() == other.pixels()
    }
}

impl Eq for Bitmap {}

impl std::fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Bitmap({}x{})", self.width(), self.height())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn straight_pixels_are_premultiplied() {
        let bmp = Bitmap::from_straight_rgba8(1, 1, vec![200, 100, 0, 128]).unwrap();
        assert_eq!(bmp.pixel(0, 0), [100, 50, 0, 128]);
    }

    #[test]
    fn opaque_pixels_are_untouched() {
        let bmp = Bitmap::from_straight_rgba8(1, 1, vec![200, 100, 7, 255]).unwrap();
        assert_eq!(bmp.pixel(0, 0), [200, 100, 7, 255]);
        assert_eq!(bmp.pixel(1, 0), [0; 4]);
    }

    #[test]
    fn zero_sized_buffers_are_rejected() {
        assert!(matches!(
            Bitmap::from_straight_rgba8(0, 3, Vec::new()),
            Err(ResourceError::BadPixelBuffer { width: 0, .. })
        ));
    }

    #[test]
    fn wrong_buffer_length_is_rejected() {
        let err = Bitmap::from_straight_rgba8(2, 2, vec![0; 15]).unwrap_err();
        assert!(matches!(err, ResourceError::BadPixelBuffer { len: 15, .. }));
    }

    #[test]
    fn decodes_png() {
        let bytes = crate::testing::png_bytes(3, 2, [255, 0, 0, 255]);
        let bmp = Bitmap::decode(&bytes).unwrap();
        assert_eq!((bmp.width(), bmp.height()), (3, 2));
        assert_eq!(bmp.pixel(2, 1), [255, 0, 0, 255]);
    }

    #[test]
    fn garbage_fails_to_decode() {
        assert!(matches!(Bitmap::decode(b"not an image"), Err(ResourceError::Decode(_))));
    }
}
