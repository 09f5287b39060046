//! Backend traits and shared types.
//!
//! [`ImageBackend`] covers the bitmap side: identify a file and compose it
//! onto a padded canvas, returning PNG bytes. [`VideoBackend`] covers
//! clips: probe dimensions and transcode through a filter chain.
//!
//! The production implementations are
//! [`RustBackend`](super::rust_backend::RustBackend) (the `image` crate) and
//! [`FfmpegBackend`](super::video::FfmpegBackend) (the `ffmpeg`/`ffprobe`
//! executables). Tests use the recording mocks below.

use super::params::{CanvasParams, ComposedCanvas, TranscodeParams};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
    #[error("Could not read dimensions of {path}: unexpected probe output {output:?}")]
    Probe { path: String, output: String },
    #[error("{program} failed: {stderr}")]
    CommandFailed { program: String, stderr: String },
}

/// Result of an identify or probe operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn as_pair(self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Bitmap operations.
pub trait ImageBackend {
    /// Get image dimensions.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Decode, optionally shrink, pad to the block ratio, encode as PNG.
    fn compose(&self, params: &CanvasParams) -> Result<ComposedCanvas, BackendError>;
}

/// Video operations.
pub trait VideoBackend {
    /// Width and height of the first video stream.
    fn probe(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Apply a filter chain plus loudness normalisation, writing `params.output`.
    fn transcode(&self, params: &TranscodeParams) -> Result<(), BackendError>;
}
