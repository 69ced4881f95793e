use std::path::PathBuf;

use crate::{
    compose, cut, decode,
    error::AtlasResult,
    options::{AtlasOptions, Mode},
    resize,
};

/// What a folder run produced.
#[derive(Clone, Debug, Default)]
pub struct RunSummary {
    /// Frames that survived decode (skipped entries excluded).
    pub frames: usize,
    /// Output artifacts: the sheet, the resized files, or the tile folders.
    pub artifacts: Vec<PathBuf>,
}

/// Runs one folder operation end to end: list, decode (with optional fade
/// and repair), then assemble, cut or re-encode depending on the configured
/// mode.
///
/// An empty folder is a notice, not an error: the run ends with an empty
/// summary and no output. Any decode failure past the open() stage aborts
/// the whole run.
pub fn run(options: &AtlasOptions) -> AtlasResult<RunSummary> {
    options.validate()?;

    let entries = decode::list_frame_entries(&options.source_folder)?;
    if entries.is_empty() {
        tracing::warn!(
            folder = %options.source_folder.display(),
            "source folder is empty, nothing to do"
        );
        return Ok(RunSummary::default());
    }

    let pool = decode::build_thread_pool(options.threads)?;
    let chunk_size = decode::chunk_size_for(options.threads);
    let frames = pool.install(|| {
        decode::decode_frames(&entries, options.fade, options.fix_png_checksum, chunk_size)
    })?;
    if frames.is_empty() {
        tracing::warn!(
            folder = %options.source_folder.display(),
            "no readable frames in folder, nothing to do"
        );
        return Ok(RunSummary::default());
    }

    let artifacts = match options.mode() {
        Mode::SingleSprites => resize::resize_folder(&frames, options)?,
        Mode::Cut(geometry) => pool.install(|| {
            cut::cut_sheets(&frames, geometry, options.fade, &options.source_folder)
        })?,
        Mode::Spritesheet => {
            vec![pool.install(|| compose::assemble_spritesheet(&frames, options))?]
        }
    };

    Ok(RunSummary {
        frames: frames.len(),
        artifacts,
    })
}
