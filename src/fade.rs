use image::{Rgba, RgbaImage};

use crate::options::FadeMode;

/// Applies a progressive edge fade to a frame.
///
/// Amounts outside (0, 100] are a pass-through. In the fade zone every channel
/// (color and alpha) is scaled by the multiplier and truncated to u8, so faded
/// edges darken toward transparent black rather than thinning alpha alone.
/// That behavior is intentional and callers rely on it being stable.
pub fn apply_fade(image: &RgbaImage, amount: u32, mode: FadeMode) -> RgbaImage {
    if amount == 0 || amount > 100 {
        return image.clone();
    }

    let (width, height) = image.dimensions();
    let center_x = f64::from(width) / 2.0;
    let center_y = f64::from(height) / 2.0;
    let strength = f64::from(amount) / 100.0;

    let mut faded = RgbaImage::new(width, height);
    for (x, y, pixel) in image.enumerate_pixels() {
        let multiplier = match mode {
            FadeMode::Radial => {
                radial_multiplier(f64::from(x), f64::from(y), center_x, center_y, strength)
            }
            FadeMode::Rectangular => {
                rectangular_multiplier(f64::from(x), f64::from(y), center_x, center_y, strength)
            }
        };
        faded.put_pixel(x, y, scale_pixel(*pixel, multiplier));
    }
    faded
}

/// Distance-based gradient inside the inscribed circle: opaque up to
/// `max_radius - fade_radius`, transparent at `max_radius`, linear between.
pub(crate) fn radial_multiplier(x: f64, y: f64, center_x: f64, center_y: f64, strength: f64) -> f64 {
    let max_radius = center_x.min(center_y);
    let fade_radius = max_radius * strength;

    let dx = x - center_x;
    let dy = y - center_y;
    let distance = (dx * dx + dy * dy).sqrt();

    if distance <= max_radius - fade_radius {
        1.0
    } else if distance >= max_radius {
        0.0
    } else {
        1.0 - (distance - (max_radius - fade_radius)) / fade_radius
    }
}

/// Axis-aligned gradient toward all four edges. A corner pixel past both
/// thresholds fades at the faster of the two axis rates (max of the
/// progresses), not their product or average.
pub(crate) fn rectangular_multiplier(
    x: f64,
    y: f64,
    center_x: f64,
    center_y: f64,
    strength: f64,
) -> f64 {
    let fade_x = center_x * strength;
    let fade_y = center_y * strength;

    let dx = (x - center_x).abs();
    let dy = (y - center_y).abs();

    let progress = if dx > center_x - fade_x && dy > center_y - fade_y {
        let x_progress = (dx - (center_x - fade_x)) / fade_x;
        let y_progress = (dy - (center_y - fade_y)) / fade_y;
        x_progress.max(y_progress)
    } else if dx > center_x - fade_x {
        (dx - (center_x - fade_x)) / fade_x
    } else if dy > center_y - fade_y {
        (dy - (center_y - fade_y)) / fade_y
    } else {
        0.0
    };

    if progress >= 1.0 {
        0.0
    } else if progress <= 0.0 {
        1.0
    } else {
        1.0 - progress
    }
}

fn scale_pixel(pixel: Rgba<u8>, multiplier: f64) -> Rgba<u8> {
    Rgba([
        (f64::from(pixel[0]) * multiplier) as u8,
        (f64::from(pixel[1]) * multiplier) as u8,
        (f64::from(pixel[2]) * multiplier) as u8,
        (f64::from(pixel[3]) * multiplier) as u8,
    ])
}
