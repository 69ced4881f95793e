use std::path::PathBuf;

use image::{Rgba, RgbaImage};

use atlaspress::{AtlasOptions, TileGeometry};

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

/// A 256x256 sheet of four distinctly colored 128x128 quadrants.
fn quadrant_sheet() -> RgbaImage {
    RgbaImage::from_fn(256, 256, |x, y| match (x < 128, y < 128) {
        (true, true) => Rgba([255, 0, 0, 255]),
        (false, true) => Rgba([0, 255, 0, 255]),
        (true, false) => Rgba([0, 0, 255, 255]),
        (false, false) => Rgba([255, 255, 0, 255]),
    })
}

#[test]
fn cutting_then_reassembling_reproduces_the_canvas() {
    let root = temp_dir("cut_roundtrip");
    let sheets = root.join("sheets");
    std::fs::create_dir_all(&sheets).unwrap();

    let original = quadrant_sheet();
    original.save(sheets.join("grid.png")).unwrap();

    // Cut into 128x128 tiles.
    let mut cut_options = AtlasOptions::new(&sheets);
    cut_options.cut = Some(TileGeometry {
        width: 128,
        height: 128,
    });
    let cut_summary = atlaspress::run(&cut_options).unwrap();
    assert_eq!(cut_summary.artifacts, vec![sheets.join("grid")]);

    for index in 0..4 {
        assert!(sheets.join("grid").join(format!("{index}.png")).exists());
    }

    // Reassemble the numbered tiles with the same column count.
    let mut assemble_options = AtlasOptions::new(sheets.join("grid"));
    assemble_options.hframes = 2;
    let summary = atlaspress::run(&assemble_options).unwrap();
    assert_eq!(summary.frames, 4);

    let reassembled = image::open(&summary.artifacts[0]).unwrap().to_rgba8();
    assert_eq!(reassembled.dimensions(), original.dimensions());
    assert_eq!(reassembled, original);

    std::fs::remove_dir_all(&root).ok();
}

#[test]
fn cut_tiles_match_the_source_regions() {
    let root = temp_dir("cut_regions");
    let sheets = root.join("sheets");
    std::fs::create_dir_all(&sheets).unwrap();

    quadrant_sheet().save(sheets.join("grid.png")).unwrap();

    let mut options = AtlasOptions::new(&sheets);
    options.cut = Some(TileGeometry {
        width: 128,
        height: 128,
    });
    atlaspress::run(&options).unwrap();

    let expected = [
        Rgba([255, 0, 0, 255]),
        Rgba([0, 255, 0, 255]),
        Rgba([0, 0, 255, 255]),
        Rgba([255, 255, 0, 255]),
    ];
    for (index, color) in expected.iter().enumerate() {
        let tile = image::open(sheets.join("grid").join(format!("{index}.png")))
            .unwrap()
            .to_rgba8();
        assert_eq!(tile.dimensions(), (128, 128));
        assert_eq!(tile.get_pixel(64, 64), color);
    }

    std::fs::remove_dir_all(&root).ok();
}

#[test]
fn malformed_cut_geometry_is_rejected_before_decode() {
    assert!("128".parse::<TileGeometry>().is_err());
    assert!("axb".parse::<TileGeometry>().is_err());
}
