use std::{
    fs,
    io::Cursor,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use image::RgbaImage;
use rayon::prelude::*;

use crate::{
    error::{AtlasError, AtlasResult},
    fade,
    frame::{Frame, FrameSet, SourceFormat},
    options::FadeOptions,
    repair,
};

/// Lists the decodable entries of a source folder in name order, dropping
/// directories and `.meta` sidecar files.
pub fn list_frame_entries(folder: &Path) -> AtlasResult<Vec<PathBuf>> {
    let read = fs::read_dir(folder)
        .with_context(|| format!("read sprite folder '{}'", folder.display()))?;

    let mut entries = Vec::new();
    for entry in read {
        let entry =
            entry.with_context(|| format!("list sprite folder '{}'", folder.display()))?;
        let file_type = entry
            .file_type()
            .with_context(|| format!("stat '{}'", entry.path().display()))?;
        if file_type.is_dir() {
            continue;
        }
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "meta") {
            continue;
        }
        entries.push(path);
    }
    entries.sort();
    Ok(entries)
}

/// Chunk size for the decode pool: the configured worker budget when set,
/// otherwise derived from the CPU count (`n / 4` on big even-quad machines,
/// else `n`).
pub fn chunk_size_for(threads: usize) -> usize {
    if threads > 0 {
        return threads;
    }
    let cpus = std::thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .unwrap_or(1);
    if cpus > 12 && cpus % 4 == 0 {
        cpus / 4
    } else {
        cpus
    }
}

/// Worker pool shared by the decode, composite and cut phases.
pub fn build_thread_pool(threads: usize) -> AtlasResult<rayon::ThreadPool> {
    let mut builder = rayon::ThreadPoolBuilder::new();
    if threads > 0 {
        builder = builder.num_threads(threads);
    }
    builder
        .build()
        .map_err(|e| AtlasError::validation(format!("failed to build worker pool: {e}")))
}

/// Decodes a set of frame files concurrently, preserving entry order.
///
/// Entries are split into contiguous chunks; each chunk decodes on its own
/// task and contributes a locally-ordered run of frames, flattened back in
/// chunk order. Entries that cannot be opened are skipped (the set shrinks);
/// an entry that opens but does not decode fails the whole run, unless it is
/// a `.png` eligible for checksum repair, which is retried once.
#[tracing::instrument(skip(entries, fade), fields(entries = entries.len()))]
pub fn decode_frames(
    entries: &[PathBuf],
    fade: FadeOptions,
    fix_png_checksum: bool,
    chunk_size: usize,
) -> AtlasResult<FrameSet> {
    let chunks: Vec<&[PathBuf]> = entries.chunks(chunk_size.max(1)).collect();
    let decoded: Vec<Vec<Frame>> = chunks
        .par_iter()
        .map(|chunk| decode_chunk(chunk, fade, fix_png_checksum))
        .collect::<AtlasResult<_>>()?;

    let mut frames = Vec::with_capacity(entries.len());
    for run in decoded {
        frames.extend(run);
    }
    Ok(FrameSet { frames })
}

fn decode_chunk(
    paths: &[PathBuf],
    fade: FadeOptions,
    fix_png_checksum: bool,
) -> AtlasResult<Vec<Frame>> {
    let mut frames = Vec::with_capacity(paths.len());
    for path in paths {
        if let Some(frame) = decode_entry(path, fade, fix_png_checksum)? {
            frames.push(frame);
        }
    }
    Ok(frames)
}

/// Decodes one folder entry. Returns `Ok(None)` when the file cannot be
/// opened (skipped without failing the run).
fn decode_entry(
    path: &Path,
    fade: FadeOptions,
    fix_png_checksum: bool,
) -> AtlasResult<Option<Frame>> {
    let name = file_name_of(path);
    let format = SourceFormat::from_name(&name);

    let Ok(bytes) = fs::read(path) else {
        tracing::debug!(path = %path.display(), "skipping unreadable entry");
        return Ok(None);
    };

    let image = decode_or_repair(path, &bytes, format, fix_png_checksum)?;
    let image = if fade.is_enabled() {
        fade::apply_fade(&image, fade.amount, fade.mode)
    } else {
        image
    };

    Ok(Some(Frame {
        image,
        name,
        format,
    }))
}

/// Decodes a single image file for the single-image operations. Unlike the
/// pool path, an unreadable file is an error here.
pub fn decode_single(path: &Path, fix_png_checksum: bool) -> AtlasResult<Frame> {
    let name = file_name_of(path);
    let format = SourceFormat::from_name(&name);

    let bytes =
        fs::read(path).with_context(|| format!("open image '{}'", path.display()))?;
    let image = decode_or_repair(path, &bytes, format, fix_png_checksum)?;

    Ok(Frame {
        image,
        name,
        format,
    })
}

fn decode_or_repair(
    path: &Path,
    bytes: &[u8],
    format: SourceFormat,
    fix_png_checksum: bool,
) -> AtlasResult<RgbaImage> {
    match decode_bytes(bytes, format) {
        Ok(image) => Ok(image),
        Err(err) if fix_png_checksum && format == SourceFormat::Png => {
            repair::repair_png_checksums(path).map_err(|repair_err| {
                AtlasError::decode(format!(
                    "failed to repair '{}': {repair_err} (original error: {err})",
                    path.display()
                ))
            })?;
            let bytes = fs::read(path)
                .with_context(|| format!("reopen '{}' after checksum repair", path.display()))?;
            decode_bytes(&bytes, format).map_err(|err| {
                AtlasError::decode(format!(
                    "'{}' still undecodable after checksum repair: {err}",
                    path.display()
                ))
            })
        }
        Err(err) => Err(AtlasError::decode(format!(
            "failed to decode '{}': {err}",
            path.display()
        ))),
    }
}

/// TGA has no magic bytes the sniffing decoder could find, so it gets the
/// dedicated codec; everything else goes through format sniffing.
fn decode_bytes(bytes: &[u8], format: SourceFormat) -> image::ImageResult<RgbaImage> {
    match format {
        SourceFormat::Tga => {
            let decoder = image::codecs::tga::TgaDecoder::new(Cursor::new(bytes))?;
            Ok(image::DynamicImage::from_decoder(decoder)?.to_rgba8())
        }
        _ => Ok(image::load_from_memory(bytes)?.to_rgba8()),
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
