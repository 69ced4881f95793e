use crate::{
    error::{AtlasError, AtlasResult},
    frame::{Frame, FrameSet},
};

/// Grid geometry of a target spritesheet.
///
/// Canvas width sums the widths of the first `hframes` frames and canvas
/// height sums the heights of the first `vframes` frames. Frames are assumed
/// roughly uniform; a non-uniform set produces a canvas sized to that sample
/// window, not a bounding box of every frame. Known limitation, kept as-is
/// because output names and dimensions downstream depend on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SheetLayout {
    pub hframes: u32,
    pub vframes: u32,
    pub width: u32,
    pub height: u32,
}

impl SheetLayout {
    pub fn compute(hframes: u32, frames: &FrameSet) -> AtlasResult<Self> {
        if hframes == 0 {
            return Err(AtlasError::validation("hframes must be >= 1"));
        }
        if frames.is_empty() {
            return Err(AtlasError::validation(
                "cannot lay out an empty frame set",
            ));
        }

        let count = frames.len() as u32;
        let hframes = hframes.min(count);
        let vframes = count.div_ceil(hframes);

        let width = frames.frames[..hframes as usize]
            .iter()
            .map(Frame::width)
            .sum();
        let height = frames.frames[..vframes as usize]
            .iter()
            .map(Frame::height)
            .sum();

        Ok(Self {
            hframes,
            vframes,
            width,
            height,
        })
    }

    /// Partitions the set into one group of up to `hframes` consecutive
    /// frames per sheet row, in original order.
    pub fn row_groups<'a>(&self, frames: &'a FrameSet) -> Vec<&'a [Frame]> {
        frames.frames.chunks(self.hframes as usize).collect()
    }
}
