//! Parameter types for image and video operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the high-level [`operations`](super::operations) module
//! (which decides what canvases and clips to create) and the backends (which
//! do the pixel and codec work). This separation allows swapping backends
//! (e.g. for testing with a mock) without changing operation logic.
//!
//! ## Types
//!
//! - [`Background`]: solid fill used for padding and alpha flattening (white by default).
//! - [`CanvasParams`]: source bitmap, padded canvas geometry, optional downscale box.
//! - [`VideoFilter`]: the ffmpeg `-filter:v` chain for one clip.
//! - [`Loudness`]: EBU R128 loudness-normalisation targets.
//! - [`TranscodeParams`]: source, output, video filter, loudness.

use super::calculations::{CanvasFit, SquareCrop, VideoFit};
use std::fmt;
use std::path::PathBuf;

/// Solid RGB fill colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Background(pub [u8; 3]);

impl Background {
    pub fn white() -> Self {
        Self([255, 255, 255])
    }

    pub fn rgb(self) -> [u8; 3] {
        self.0
    }

    /// `white` for the default, `0xRRGGBB` otherwise (ffmpeg colour syntax).
    pub fn ffmpeg_color(self) -> String {
        if self == Self::white() {
            "white".to_string()
        } else {
            let [r, g, b] = self.0;
            format!("0x{r:02X}{g:02X}{b:02X}")
        }
    }
}

impl Default for Background {
    fn default() -> Self {
        Self::white()
    }
}

/// Compose a bitmap onto a padded canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct CanvasParams {
    pub source: PathBuf,
    /// Shrink the source to fit this box before padding (icons).
    pub fit_within: Option<(u32, u32)>,
    /// Target block ratio the padded canvas must match.
    pub block: (u32, u32),
    pub background: Background,
}

/// Outcome of a canvas composition: PNG bytes plus the geometry used.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedCanvas {
    pub png: Vec<u8>,
    pub content: (u32, u32),
    pub canvas: CanvasFit,
}

/// Loudness-normalisation targets for ffmpeg's `loudnorm` filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Loudness {
    /// Integrated loudness, LUFS.
    pub integrated: f32,
    /// Loudness range, LU.
    pub range: f32,
    /// Maximum true peak, dBTP.
    pub true_peak: f32,
}

impl Default for Loudness {
    fn default() -> Self {
        Self {
            integrated: -16.0,
            range: 11.0,
            true_peak: -1.5,
        }
    }
}

impl fmt::Display for Loudness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "loudnorm=I={}:LRA={}:TP={}",
            self.integrated, self.range, self.true_peak
        )
    }
}

/// A video filter chain.
#[derive(Debug, Clone, PartialEq)]
pub enum VideoFilter {
    /// Scale to even dimensions, then pad to the block ratio.
    Pad { fit: VideoFit, background: Background },
    /// Centre-crop to a square, then scale to `size`×`size`.
    SquareThumbnail { crop: SquareCrop, size: u32 },
}

impl fmt::Display for VideoFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VideoFilter::Pad { fit, background } => write!(
                f,
                "scale={}:{},pad={}:{}:{}:{}:color={},setsar=1",
                fit.scaled_width,
                fit.scaled_height,
                fit.pad_width,
                fit.pad_height,
                fit.pad_x,
                fit.pad_y,
                background.ffmpeg_color()
            ),
            VideoFilter::SquareThumbnail { crop, size } => write!(
                f,
                "crop={}:{}:{}:{},scale={size}:{size},setsar=1",
                crop.size, crop.size, crop.x, crop.y
            ),
        }
    }
}

/// Everything a video backend needs to produce one output clip.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscodeParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub filter: VideoFilter,
    pub loudness: Loudness,
}
