use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use image::imageops;

use crate::{
    decode, encode,
    error::{AtlasError, AtlasResult},
    fade,
    frame::FrameSet,
    options::{AtlasOptions, FadeOptions},
};

/// Re-encodes every decoded frame as an individually resized sprite in a
/// `<folder>_resized_<px>px/` sibling folder. JPEG-family frames keep their
/// name and encoding unless a fade added alpha, which forces PNG; everything
/// else is written as PNG. Returns the written files in frame order.
pub fn resize_folder(frames: &FrameSet, options: &AtlasOptions) -> AtlasResult<Vec<PathBuf>> {
    let px = options
        .resize_px
        .ok_or_else(|| AtlasError::validation("single-sprites mode requires a resize target"))?;

    let out_dir = PathBuf::from(format!(
        "{}_resized_{px}px",
        options.source_folder.display()
    ));
    fs::create_dir_all(&out_dir)
        .with_context(|| format!("create output folder '{}'", out_dir.display()))?;

    let mut written = Vec::with_capacity(frames.len());
    for frame in frames.iter() {
        let resized = imageops::resize(&frame.image, px, px, imageops::FilterType::Lanczos3);
        let resized = if options.fade.is_enabled() {
            fade::apply_fade(&resized, options.fade.amount, options.fade.mode)
        } else {
            resized
        };

        let promote = options.fade.is_enabled() && frame.format.is_jpeg_family();
        if promote {
            let path = out_dir.join(format!("{}.png", frame.stem()));
            encode::write_png_fast(&path, &resized)?;
            written.push(path);
        } else if frame.format.is_jpeg_family() {
            let path = out_dir.join(&frame.name);
            encode::write_jpeg(&path, &resized)?;
            written.push(path);
        } else {
            let path = out_dir.join(format!("{}.png", frame.stem()));
            encode::write_png_fast(&path, &resized)?;
            written.push(path);
        }
    }
    Ok(written)
}

/// Decodes one image (with the same checksum-repair fallback as the pool),
/// resizes it to a square target and writes it beside the input.
///
/// The output keeps the input's extension in its name; only unfaded
/// JPEG-family inputs are actually encoded as JPEG, everything else carries
/// PNG bytes. A faded JPEG-family input is renamed to `.png` because the
/// lossy container cannot hold the added alpha channel.
pub fn resize_single_image(
    path: &Path,
    px: u32,
    fade_opts: FadeOptions,
    fix_png_checksum: bool,
) -> AtlasResult<PathBuf> {
    if px == 0 {
        return Err(AtlasError::validation("resize target must be >= 1 px"));
    }

    let frame = decode::decode_single(path, fix_png_checksum)?;
    let resized = imageops::resize(&frame.image, px, px, imageops::FilterType::Lanczos3);
    let resized = if fade_opts.is_enabled() {
        fade::apply_fade(&resized, fade_opts.amount, fade_opts.mode)
    } else {
        resized
    };

    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let promote = fade_opts.is_enabled() && frame.format.is_jpeg_family();
    let out_path = if promote {
        parent.join(format!("{}_resized_{px}px.png", frame.stem()))
    } else {
        let ext = frame
            .name
            .rsplit_once('.')
            .map(|(_, ext)| format!(".{ext}"))
            .unwrap_or_default();
        parent.join(format!("{}_resized_{px}px{ext}", frame.stem()))
    };

    if !promote && frame.format.is_jpeg_family() {
        encode::write_jpeg(&out_path, &resized)?;
    } else {
        encode::write_png_fast(&out_path, &resized)?;
    }
    Ok(out_path)
}
