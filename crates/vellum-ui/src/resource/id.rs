use std::fmt;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// How the bytes of a content identity are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    /// An encoded image file (PNG, JPEG, ...).
    Encoded,
    /// Straight-alpha RGBA8 pixels, tightly packed.
    Rgba { width: u32, height: u32 },
}

/// Identity derived from in-memory image data.
///
/// Two keys are equal when their bytes are equal, whichever buffer they came
/// from. Hashing uses the precomputed digest only.
#[derive(Clone)]
pub struct ContentKey {
    digest: u64,
    kind: ContentKind,
    bytes: Arc<[u8]>,
}

impl ContentKey {
    fn new(kind: ContentKind, bytes: Arc<[u8]>) -> Self {
        let mut hasher = DefaultHasher::new();
        kind.hash(&mut hasher);
        bytes.hash(&mut hasher);
        Self { digest: hasher.finish(), kind, bytes }
    }

    pub fn digest(&self) -> u64 {
        self.digest
    }

    pub fn kind(&self) -> ContentKind {
        self.kind
    }

    pub fn bytes(&self) -> &Arc<[u8]> {
        &self.bytes
    }
}

impl PartialEq for ContentKey {
    fn eq(&self, other: &Self) -> bool {
        self.digest == other.digest
            && self.kind == other.kind
            && (Arc::ptr_eq(&self.bytes, &other.bytes) || self.bytes == other.bytes)
    }
}

impl Eq for ContentKey {}

impl Hash for ContentKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.digest.hash(state);
    }
}

impl fmt::Debug for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentKey")
            .field("digest", &format_args!("{:016x}", self.digest))
            .field("kind", &self.kind)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Stable key of a decodable image.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourceId {
    Path(PathBuf),
    Url(String),
    Content(ContentKey),
}

impl ResourceId {
    /// `http://` and `https://` become URLs, anything else a file path.
    pub fn parse(s: &str) -> Self {
        if s.starts_with("http://") || s.starts_with("https://") {
            Self::Url(s.to_string())
        } else {
            Self::Path(PathBuf::from(s))
        }
    }

    /// Identity of an encoded image held in memory.
    pub fn encoded(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self::Content(ContentKey::new(ContentKind::Encoded, bytes.into()))
    }

    /// Identity of raw straight-alpha RGBA8 pixels.
    pub fn pixels(width: u32, height: u32, rgba: impl Into<Arc<[u8]>>) -> Self {
        Self::Content(ContentKey::new(ContentKind::Rgba { width, height }, rgba.into()))
    }
}

impl From<&str> for ResourceId {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl From<String> for ResourceId {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<PathBuf> for ResourceId {
    fn from(p: PathBuf) -> Self {
        Self::Path(p)
    }
}

impl From<&Path> for ResourceId {
    fn from(p: &Path) -> Self {
        Self::Path(p.to_path_buf())
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(p) => write!(f, "{}", p.display()),
            Self::Url(u) => f.write_str(u),
            Self::Content(k) => write!(f, "content:{:016x}", k.digest),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_picks_url_or_path() {
        assert_eq!(
            ResourceId::parse("https://example.com/a.png"),
            ResourceId::Url("https://example.com/a.png".into())
        );
        assert_eq!(ResourceId::from("logo.png"), ResourceId::Path("logo.png".into()));
    }

    #[test]
    fn content_identity_follows_bytes_not_buffer() {
        let a = ResourceId::encoded(vec![1u8, 2, 3]);
        let b = ResourceId::encoded(vec![1u8, 2, 3]);
        let c = ResourceId::encoded(vec![1u8, 2, 4]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn pixel_dimensions_are_part_of_identity() {
        let px: Arc<[u8]> = Arc::from(vec![0u8; 16]);
        assert_ne!(ResourceId::pixels(2, 2, px.clone()), ResourceId::pixels(4, 1, px));
    }
}
