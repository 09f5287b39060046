//! Canvas fitting for bitmaps and videos.
//!
//! | Operation | Crate / tool |
//! |---|---|
//! | **Identify** | `image::image_dimensions` |
//! | **Pad to block ratio → PNG** | `image` (`imageops::overlay`, PNG encoder) |
//! | **Embed as SVG** | `base64` data URI |
//! | **Probe video** | `ffprobe` |
//! | **Pad / crop video + loudnorm** | `ffmpeg` |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for ratio and padding math (unit testable)
//! - **Parameters**: Data structures describing canvas and video operations
//! - **Backend**: [`ImageBackend`] / [`VideoBackend`] traits + [`RustBackend`] / [`FfmpegBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;
pub mod video;

pub use backend::{BackendError, Dimensions, ImageBackend, VideoBackend};
pub use calculations::{
    CanvasFit, SquareCrop, VideoFit, compute_padding, even, fit_dimensions, fit_within,
    reduce_ratio, square_crop, video_fit,
};
pub use operations::{
    FAQ_VIDEO_SIZE, ICON_SIZE, MAX_RATIO_DIVISOR, create_block_svg, create_icon_svg,
    embed_bitmap_in_svg, icon_svg, pad_video, square_video_thumbnail,
};
pub use params::{Background, CanvasParams, ComposedCanvas, Loudness, TranscodeParams, VideoFilter};
pub use rust_backend::RustBackend;
pub use video::FfmpegBackend;
