use std::path::{Path, PathBuf};

use image::{RgbaImage, imageops};
use rayon::prelude::*;

use crate::{
    encode,
    error::AtlasResult,
    frame::{Frame, FrameSet},
    layout::SheetLayout,
    options::AtlasOptions,
};

/// Source-over-destination blend of straight-alpha RGBA8 pixels.
pub fn over(dst: [u8; 4], src: [u8; 4]) -> [u8; 4] {
    let sa = u32::from(src[3]);
    if sa == 255 {
        return src;
    }
    if sa == 0 {
        return dst;
    }

    let da = u32::from(dst[3]);
    let inv = 255 - sa;
    let db = (da * inv + 127) / 255;
    let out_a = sa + db;
    if out_a == 0 {
        return [0, 0, 0, 0];
    }

    let mut out = [0u8; 4];
    for i in 0..3 {
        let sc = u32::from(src[i]);
        let dc = u32::from(dst[i]);
        out[i] = ((sc * sa + dc * db + out_a / 2) / out_a) as u8;
    }
    out[3] = out_a as u8;
    out
}

/// Composites the frame set onto a transparent canvas, one concurrent task
/// per row group.
///
/// The canvas buffer is split into disjoint row bands before any task starts
/// (band height taken from the group's leading frame, the last band absorbing
/// whatever rows remain), so tasks never contend for pixels and no lock is
/// involved. Writes that would fall outside a band or past the right canvas
/// edge are clipped.
pub fn composite_sheet(frames: &FrameSet, layout: &SheetLayout) -> RgbaImage {
    let mut canvas = RgbaImage::new(layout.width, layout.height);
    let row_bytes = layout.width as usize * 4;
    if row_bytes == 0 || layout.height == 0 {
        return canvas;
    }

    let groups = layout.row_groups(frames);
    let mut bands: Vec<(&mut [u8], &[Frame])> = Vec::with_capacity(groups.len());
    let mut remaining: &mut [u8] = &mut canvas;
    for (index, group) in groups.iter().enumerate() {
        let rows_left = remaining.len() / row_bytes;
        let band_rows = if index + 1 == groups.len() {
            rows_left
        } else {
            group
                .first()
                .map(|frame| frame.height() as usize)
                .unwrap_or(0)
                .min(rows_left)
        };
        let (band, rest) = std::mem::take(&mut remaining).split_at_mut(band_rows * row_bytes);
        remaining = rest;
        bands.push((band, *group));
    }

    let canvas_width = layout.width as usize;
    bands
        .into_par_iter()
        .for_each(|(band, group)| draw_row_band(band, canvas_width, group));
    canvas
}

fn draw_row_band(band: &mut [u8], canvas_width: usize, frames: &[Frame]) {
    let band_rows = band.len() / (canvas_width * 4);
    for (column, frame) in frames.iter().enumerate() {
        let frame_width = frame.width() as usize;
        let frame_height = frame.height() as usize;
        // Placement follows each frame's own bounds, matching the layout's
        // uniform-size assumption.
        let x0 = column * frame_width;
        for y in 0..frame_height.min(band_rows) {
            for x in 0..frame_width {
                let cx = x0 + x;
                if cx >= canvas_width {
                    break;
                }
                let i = (y * canvas_width + cx) * 4;
                let src = frame.image.get_pixel(x as u32, y as u32).0;
                let dst = [band[i], band[i + 1], band[i + 2], band[i + 3]];
                band[i..i + 4].copy_from_slice(&over(dst, src));
            }
        }
    }
}

/// Assembles the frame set into one spritesheet PNG next to the source
/// folder, optionally resizing the finished canvas first.
#[tracing::instrument(skip(frames, options), fields(frames = frames.len()))]
pub fn assemble_spritesheet(frames: &FrameSet, options: &AtlasOptions) -> AtlasResult<PathBuf> {
    let layout = SheetLayout::compute(options.hframes, frames)?;
    let mut sheet = composite_sheet(frames, &layout);

    if let Some(px) = options.resize_px {
        sheet = imageops::resize(
            &sheet,
            layout.hframes * px,
            layout.vframes * px,
            imageops::FilterType::Lanczos3,
        );
    }

    let path = sheet_output_path(&options.source_folder, frames.len(), layout.vframes);
    encode::write_png_fast(&path, &sheet)?;
    Ok(path)
}

/// `<folder>_f<frameCount>_v<rowCount>.png`, alongside the source folder.
pub fn sheet_output_path(source_folder: &Path, frame_count: usize, vframes: u32) -> PathBuf {
    PathBuf::from(format!(
        "{}_f{frame_count}_v{vframes}.png",
        source_folder.display()
    ))
}

#[cfg(test)]
mod tests {
    use image::Rgba;

    use super::*;
    use crate::frame::SourceFormat;

    fn solid_frame(name: &str, w: u32, h: u32, rgba: [u8; 4]) -> Frame {
        Frame {
            image: RgbaImage::from_pixel(w, h, Rgba(rgba)),
            name: name.to_string(),
            format: SourceFormat::Png,
        }
    }

    #[test]
    fn over_src_opaque_replaces_dst() {
        let dst = [0, 0, 0, 255];
        let src = [255, 0, 0, 255];
        assert_eq!(over(dst, src), src);
    }

    #[test]
    fn over_src_alpha_0_is_noop() {
        let dst = [10, 20, 30, 40];
        let src = [255, 255, 255, 0];
        assert_eq!(over(dst, src), dst);
    }

    #[test]
    fn over_dst_transparent_returns_src() {
        let dst = [0, 0, 0, 0];
        let src = [100, 110, 120, 200];
        assert_eq!(over(dst, src), src);
    }

    #[test]
    fn over_blends_half_transparent_white_onto_black() {
        let dst = [0, 0, 0, 255];
        let src = [255, 255, 255, 128];
        let out = over(dst, src);
        assert_eq!(out[3], 255);
        // 255 * 128 / 255 blended against black: close to half gray.
        assert!(out[0] >= 127 && out[0] <= 129);
    }

    #[test]
    fn frames_land_row_major() {
        let frames = FrameSet {
            frames: vec![
                solid_frame("0.png", 2, 2, [255, 0, 0, 255]),
                solid_frame("1.png", 2, 2, [0, 255, 0, 255]),
                solid_frame("2.png", 2, 2, [0, 0, 255, 255]),
            ],
        };
        let layout = SheetLayout::compute(2, &frames).unwrap();
        let sheet = composite_sheet(&frames, &layout);

        assert_eq!(sheet.dimensions(), (4, 4));
        assert_eq!(*sheet.get_pixel(0, 0), Rgba([255, 0, 0, 255]));
        assert_eq!(*sheet.get_pixel(2, 0), Rgba([0, 255, 0, 255]));
        assert_eq!(*sheet.get_pixel(0, 2), Rgba([0, 0, 255, 255]));
        // Fourth grid cell stays transparent background.
        assert_eq!(*sheet.get_pixel(2, 2), Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn trailing_cells_stay_transparent() {
        let frames = FrameSet {
            frames: (0..5)
                .map(|i| solid_frame(&format!("{i}.png"), 4, 4, [9, 9, 9, 255]))
                .collect(),
        };
        let layout = SheetLayout::compute(3, &frames).unwrap();
        let sheet = composite_sheet(&frames, &layout);

        assert_eq!(sheet.dimensions(), (12, 8));
        // Frames 3 and 4 occupy the second row; the sixth cell is empty.
        assert_eq!(*sheet.get_pixel(4, 5), Rgba([9, 9, 9, 255]));
        assert_eq!(*sheet.get_pixel(9, 5), Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn sheet_output_path_is_deterministic() {
        let path = sheet_output_path(Path::new("sprites"), 17, 3);
        assert_eq!(path, PathBuf::from("sprites_f17_v3.png"));
    }
}
