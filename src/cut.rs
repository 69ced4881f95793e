use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use image::{Rgba, RgbaImage};
use rayon::prelude::*;

use crate::{
    compose, encode,
    error::AtlasResult,
    fade,
    frame::{Frame, FrameSet},
    options::{FadeOptions, TileGeometry},
};

/// Cuts every decoded spritesheet into `W×H` tiles, one concurrent task per
/// sheet. Tiles land as `0.png`, `1.png`, … in row-major order inside a
/// subfolder named after the sheet. Returns the tile folders that were
/// written.
pub fn cut_sheets(
    frames: &FrameSet,
    geometry: TileGeometry,
    fade: FadeOptions,
    source_folder: &Path,
) -> AtlasResult<Vec<PathBuf>> {
    let dirs: Vec<Option<PathBuf>> = frames
        .frames
        .par_iter()
        .map(|sheet| cut_one(sheet, geometry, fade, source_folder))
        .collect::<AtlasResult<_>>()?;
    Ok(dirs.into_iter().flatten().collect())
}

fn cut_one(
    sheet: &Frame,
    geometry: TileGeometry,
    fade_opts: FadeOptions,
    source_folder: &Path,
) -> AtlasResult<Option<PathBuf>> {
    // Remainder pixels beyond the last full tile are discarded.
    let hframes = sheet.width() / geometry.width;
    let vframes = sheet.height() / geometry.height;
    if hframes == 0 || vframes == 0 {
        tracing::debug!(sheet = %sheet.name, "sheet smaller than one tile, nothing to cut");
        return Ok(None);
    }

    let out_dir = source_folder.join(sheet.stem());
    fs::create_dir_all(&out_dir)
        .with_context(|| format!("create tile folder '{}'", out_dir.display()))?;

    let mut tile_index = 0u32;
    for v in 0..vframes {
        for h in 0..hframes {
            let tile = extract_tile(sheet, geometry, h, v);
            let tile = if fade_opts.is_enabled() {
                fade::apply_fade(&tile, fade_opts.amount, fade_opts.mode)
            } else {
                tile
            };
            encode::write_png_fast(&out_dir.join(format!("{tile_index}.png")), &tile)?;
            tile_index += 1;
        }
    }
    Ok(Some(out_dir))
}

fn extract_tile(sheet: &Frame, geometry: TileGeometry, h: u32, v: u32) -> RgbaImage {
    let mut tile = RgbaImage::new(geometry.width, geometry.height);
    for y in 0..geometry.height {
        for x in 0..geometry.width {
            let src = sheet
                .image
                .get_pixel(h * geometry.width + x, v * geometry.height + y)
                .0;
            let dst = tile.get_pixel(x, y).0;
            tile.put_pixel(x, y, Rgba(compose::over(dst, src)));
        }
    }
    tile
}
