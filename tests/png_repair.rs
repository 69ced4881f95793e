use std::path::{Path, PathBuf};

use image::{Rgba, RgbaImage};

use atlaspress::{AtlasOptions, repair};

fn temp_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "atlaspress_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

fn reference_image() -> RgbaImage {
    RgbaImage::from_fn(16, 16, |x, y| Rgba([x as u8 * 16, y as u8 * 16, 7, 255]))
}

/// Flips a bit in the stored CRC of the first IDAT chunk, leaving type and
/// payload bytes intact.
fn corrupt_idat_crc(path: &Path) {
    let mut png = std::fs::read(path).unwrap();
    let mut pos = 8;
    loop {
        let length =
            u32::from_be_bytes([png[pos], png[pos + 1], png[pos + 2], png[pos + 3]]) as usize;
        if &png[pos + 4..pos + 8] == b"IDAT" {
            png[pos + 8 + length] ^= 0x55;
            break;
        }
        pos += 8 + length + 4;
    }
    std::fs::write(path, &png).unwrap();
}

#[test]
fn repair_recovers_a_checksum_corrupted_png() {
    let dir = temp_dir("repair_crc");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("broken.png");

    reference_image().save(&path).unwrap();
    corrupt_idat_crc(&path);
    assert!(image::open(&path).is_err());

    repair::repair_png_checksums(&path).unwrap();

    let repaired = image::open(&path).unwrap().to_rgba8();
    assert_eq!(repaired, reference_image());
    assert!(!dir.join("broken.png.backup").exists());

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn repair_failure_restores_the_original_bytes() {
    let dir = temp_dir("repair_restore");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("hopeless.png");

    let original = b"not even close to a png".to_vec();
    std::fs::write(&path, &original).unwrap();

    assert!(repair::repair_png_checksums(&path).is_err());
    assert_eq!(std::fs::read(&path).unwrap(), original);
    assert!(!dir.join("hopeless.png.backup").exists());

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn decode_pool_retries_through_repair() {
    let dir = temp_dir("repair_pool");
    let sprites = dir.join("sprites");
    std::fs::create_dir_all(&sprites).unwrap();

    reference_image().save(sprites.join("good.png")).unwrap();
    reference_image().save(sprites.join("bad.png")).unwrap();
    corrupt_idat_crc(&sprites.join("bad.png"));

    // Without repair the run is fatal.
    let options = AtlasOptions::new(&sprites);
    assert!(atlaspress::run(&options).is_err());

    // With repair enabled both frames decode and the sheet is written.
    let mut options = AtlasOptions::new(&sprites);
    options.fix_png_checksum = true;
    let summary = atlaspress::run(&options).unwrap();
    assert_eq!(summary.frames, 2);
    assert!(summary.artifacts[0].exists());

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn truncated_image_data_is_not_repairable() {
    let dir = temp_dir("repair_truncated");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("cut_short.png");

    reference_image().save(&path).unwrap();
    let bytes = std::fs::read(&path).unwrap();
    let truncated = &bytes[..bytes.len() - 20];
    std::fs::write(&path, truncated).unwrap();

    assert!(repair::repair_png_checksums(&path).is_err());
    assert_eq!(std::fs::read(&path).unwrap(), truncated);

    std::fs::remove_dir_all(&dir).ok();
}
