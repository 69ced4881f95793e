use image::RgbaImage;

/// Extension class of a source file, recorded so the re-encode paths can keep
/// JPEG output for JPEG input (or force PNG once an alpha channel was added).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceFormat {
    Png,
    Jpeg,
    Tga,
    Other,
}

impl SourceFormat {
    pub fn from_name(name: &str) -> Self {
        let ext = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "png" => Self::Png,
            "jpg" | "jpeg" | "jfif" | "pjpeg" | "pjp" => Self::Jpeg,
            "tga" => Self::Tga,
            _ => Self::Other,
        }
    }

    /// Lossy formats that cannot carry the alpha channel a fade adds.
    pub fn is_jpeg_family(self) -> bool {
        self == Self::Jpeg
    }
}

/// One decoded source image, normalized to straight-alpha RGBA8.
#[derive(Clone, Debug)]
pub struct Frame {
    pub image: RgbaImage,
    /// File name of the originating entry, extension included.
    pub name: String,
    pub format: SourceFormat,
}

impl Frame {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// File name with the extension stripped.
    pub fn stem(&self) -> &str {
        self.name
            .rsplit_once('.')
            .map(|(stem, _)| stem)
            .unwrap_or(&self.name)
    }

    /// Extension of the originating file name, lowercased, without the dot.
    pub fn extension(&self) -> String {
        self.name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default()
    }
}

/// Ordered set of decoded frames from one source folder.
///
/// The order is deterministic for a fixed file listing and chunk size: each
/// decode chunk contributes a locally-ordered run, flattened in chunk order.
/// Unopenable entries are skipped, so the length may be smaller than the
/// entry count.
#[derive(Clone, Debug, Default)]
pub struct FrameSet {
    pub frames: Vec<Frame>,
}

impl FrameSet {
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Frame> {
        self.frames.iter()
    }
}
