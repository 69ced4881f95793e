use std::{path::PathBuf, str::FromStr};

use crate::error::{AtlasError, AtlasResult};

/// Shape of the edge-fade gradient.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FadeMode {
    Radial,
    Rectangular,
}

impl FromStr for FadeMode {
    type Err = AtlasError;

    fn from_str(s: &str) -> AtlasResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "radial" | "r" => Ok(Self::Radial),
            "rectangular" | "rect" | "s" => Ok(Self::Rectangular),
            other => Err(AtlasError::validation(format!(
                "unknown fade mode '{other}' (expected 'radial' or 'rectangular')"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FadeOptions {
    /// Fade strength, 0-100. Values outside (0, 100] leave pixels untouched.
    pub amount: u32,
    pub mode: FadeMode,
}

impl FadeOptions {
    pub fn disabled() -> Self {
        Self {
            amount: 0,
            mode: FadeMode::Radial,
        }
    }

    /// Whether the decode and post-process paths should invoke the filter at all.
    pub fn is_enabled(&self) -> bool {
        self.amount > 0
    }
}

impl Default for FadeOptions {
    fn default() -> Self {
        Self::disabled()
    }
}

/// Tile size of a spritesheet being cut, parsed from a `WxH` string.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileGeometry {
    pub width: u32,
    pub height: u32,
}

impl FromStr for TileGeometry {
    type Err = AtlasError;

    fn from_str(s: &str) -> AtlasResult<Self> {
        let (w, h) = s.split_once(['x', 'X']).ok_or_else(|| {
            AtlasError::validation(format!("tile geometry '{s}' is not of the form WxH"))
        })?;
        let width: u32 = w.trim().parse().map_err(|_| {
            AtlasError::validation(format!("tile width '{w}' is not a positive integer"))
        })?;
        let height: u32 = h.trim().parse().map_err(|_| {
            AtlasError::validation(format!("tile height '{h}' is not a positive integer"))
        })?;
        if width == 0 || height == 0 {
            return Err(AtlasError::validation(format!(
                "tile geometry '{s}' must have non-zero dimensions"
            )));
        }
        Ok(Self { width, height })
    }
}

/// Which of the three folder operations a run performs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Spritesheet,
    SingleSprites,
    Cut(TileGeometry),
}

/// Full configuration surface of the engine for folder-based runs.
#[derive(Clone, Debug)]
pub struct AtlasOptions {
    /// Folder containing the source frames (or spritesheets, in cut mode).
    pub source_folder: PathBuf,
    /// Grid columns of the assembled spritesheet.
    pub hframes: u32,
    /// Square resize target in pixels. `None` keeps source dimensions.
    pub resize_px: Option<u32>,
    pub fade: FadeOptions,
    /// Re-encode each frame individually instead of assembling a sheet.
    pub single_sprites: bool,
    /// Cut each decoded image into tiles of this size instead of assembling.
    pub cut: Option<TileGeometry>,
    /// Worker thread budget. 0 picks a chunk size from the CPU count.
    pub threads: usize,
    /// Attempt chunk-checksum repair when a `.png` fails to decode.
    pub fix_png_checksum: bool,
}

impl AtlasOptions {
    pub fn new(source_folder: impl Into<PathBuf>) -> Self {
        Self {
            source_folder: source_folder.into(),
            hframes: 8,
            resize_px: None,
            fade: FadeOptions::disabled(),
            single_sprites: false,
            cut: None,
            threads: 0,
            fix_png_checksum: false,
        }
    }

    pub fn mode(&self) -> Mode {
        if self.single_sprites {
            Mode::SingleSprites
        } else if let Some(geometry) = self.cut {
            Mode::Cut(geometry)
        } else {
            Mode::Spritesheet
        }
    }

    /// Configuration errors are fatal before any decode work begins.
    pub fn validate(&self) -> AtlasResult<()> {
        if self.hframes == 0 {
            return Err(AtlasError::validation("hframes must be >= 1"));
        }
        if self.single_sprites && self.cut.is_some() {
            return Err(AtlasError::validation(
                "single-sprites and cut modes are mutually exclusive",
            ));
        }
        if self.single_sprites && self.resize_px.is_none() {
            return Err(AtlasError::validation(
                "single-sprites mode requires a resize target",
            ));
        }
        if let Some(px) = self.resize_px
            && px == 0
        {
            return Err(AtlasError::validation("resize target must be >= 1 px"));
        }
        Ok(())
    }
}
