use std::{path::PathBuf, time::Instant};

use anyhow::Context as _;
use clap::Parser;

use atlaspress::{AtlasOptions, FadeMode, FadeOptions, TileGeometry};

#[derive(Parser, Debug)]
#[command(name = "atlaspress", version)]
struct Cli {
    /// Folder containing the sprite frames to assemble (or sheets to cut).
    #[arg(short = 'f', long, default_value = "sprites")]
    folder: PathBuf,

    /// Horizontal frame count: grid columns of the assembled sheet.
    #[arg(long, default_value_t = 8)]
    hframes: u32,

    /// Square resize target in pixels.
    #[arg(long)]
    resize: Option<u32>,

    /// Edge fade strength, 0-100 (0 disables fading).
    #[arg(long, default_value_t = 0)]
    fade_amount: u32,

    /// Edge fade shape: radial or rectangular.
    #[arg(long, default_value = "radial")]
    fade_mode: FadeMode,

    /// Write each frame as an individually resized sprite instead of a sheet.
    #[arg(long, default_value_t = false)]
    single_sprites: bool,

    /// Cut each input spritesheet into tiles of this size.
    #[arg(long, value_name = "WxH")]
    cut: Option<TileGeometry>,

    /// Resize a single image instead of processing a folder.
    #[arg(short = 'i', long)]
    image: Option<PathBuf>,

    /// Worker thread budget (0 = derive from CPU count).
    #[arg(long, default_value_t = 0)]
    threads: usize,

    /// Attempt chunk-checksum repair when a .png fails to decode.
    #[arg(long, default_value_t = false)]
    fix_png_checksum: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let started = Instant::now();

    let fade = FadeOptions {
        amount: cli.fade_amount,
        mode: cli.fade_mode,
    };

    if let Some(image_path) = cli.image {
        let px = cli
            .resize
            .context("--resize is required when resizing a single image")?;
        let out =
            atlaspress::resize::resize_single_image(&image_path, px, fade, cli.fix_png_checksum)?;
        eprintln!("wrote {} ({:.2?})", out.display(), started.elapsed());
        return Ok(());
    }

    let mut options = AtlasOptions::new(cli.folder);
    options.hframes = cli.hframes;
    options.resize_px = cli.resize;
    options.fade = fade;
    options.single_sprites = cli.single_sprites;
    options.cut = cli.cut;
    options.threads = cli.threads;
    options.fix_png_checksum = cli.fix_png_checksum;

    let summary = atlaspress::run(&options)?;
    if summary.frames == 0 {
        eprintln!(
            "looks like folder '{}' is empty, nothing to do",
            options.source_folder.display()
        );
        return Ok(());
    }

    for artifact in &summary.artifacts {
        eprintln!("wrote {}", artifact.display());
    }
    eprintln!(
        "{} frames processed in {:.2?}",
        summary.frames,
        started.elapsed()
    );
    Ok(())
}
