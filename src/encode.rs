use std::{fs::File, io::BufWriter, path::Path};

use anyhow::Context as _;
use image::{
    RgbaImage,
    codecs::{
        jpeg::JpegEncoder,
        png::{CompressionType, FilterType, PngEncoder},
    },
};

use crate::error::AtlasResult;

/// Writes a frame as PNG with the fastest compression setting. Sheets and
/// tiles are intermediate pipeline artifacts, so encode speed wins over size.
pub fn write_png_fast(path: &Path, image: &RgbaImage) -> AtlasResult<()> {
    let file =
        File::create(path).with_context(|| format!("create output '{}'", path.display()))?;
    let writer = BufWriter::new(file);
    let encoder = PngEncoder::new_with_quality(writer, CompressionType::Fast, FilterType::Adaptive);
    image
        .write_with_encoder(encoder)
        .with_context(|| format!("encode png '{}'", path.display()))?;
    Ok(())
}

/// Writes a frame as quality-100 JPEG. JPEG carries no alpha channel, so the
/// buffer is flattened to RGB first.
pub fn write_jpeg(path: &Path, image: &RgbaImage) -> AtlasResult<()> {
    let rgb = image::DynamicImage::ImageRgba8(image.clone()).to_rgb8();
    let file =
        File::create(path).with_context(|| format!("create output '{}'", path.display()))?;
    let writer = BufWriter::new(file);
    let encoder = JpegEncoder::new_with_quality(writer, 100);
    rgb.write_with_encoder(encoder)
        .with_context(|| format!("encode jpeg '{}'", path.display()))?;
    Ok(())
}
