//! Pure calculation functions for canvas and video geometry.
//!
//! All functions here are pure and testable without any I/O or images.
//! Padding never crops or distorts: content keeps its pixels and is
//! centred on a larger canvas whose aspect ratio matches the target block.

/// Divide a ratio by the largest common divisor not above `max_divisor`.
///
/// Keeps block ratios small (`36:24` → `3:2`) without a full GCD, so
/// a caller can cap how aggressively a ratio is reduced. Zero components
/// are returned unchanged.
///
/// ```
/// # use docs_to_markdown::imaging::reduce_ratio;
/// assert_eq!(reduce_ratio(8, 4, 12), (2, 1));
/// assert_eq!(reduce_ratio(13, 26, 12), (13, 26));
/// ```
pub fn reduce_ratio(width: u32, height: u32, max_divisor: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (width, height);
    }
    (2..=max_divisor)
        .rev()
        .find(|d| width % d == 0 && height % d == 0)
        .map(|d| (width / d, height / d))
        .unwrap_or((width, height))
}

/// Scale a target ratio to physical dimensions for an object.
///
/// If the ratio's width exceeds the object width, the ratio width is used
/// and the height follows the object's proportions. Otherwise the object
/// width is kept and the height follows the ratio.
///
/// # Returns
/// * `(width, height)` - truncated to whole pixels, never below 1
pub fn fit_dimensions(
    object_width: u32,
    object_height: u32,
    ratio_width: u32,
    ratio_height: u32,
) -> (u32, u32) {
    let (w, h) = if ratio_width > object_width {
        let h = ratio_width as f64 / object_width.max(1) as f64 * object_height as f64;
        (ratio_width, h as u32)
    } else {
        let h = object_width as f64 / ratio_width.max(1) as f64 * ratio_height as f64;
        (object_width, h as u32)
    };
    (w.max(1), h.max(1))
}

/// A padded canvas and where the original content sits on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasFit {
    pub width: u32,
    pub height: u32,
    pub paste_x: u32,
    pub paste_y: u32,
}

impl CanvasFit {
    pub fn is_padded(&self, content: (u32, u32)) -> bool {
        (self.width, self.height) != content
    }
}

/// Grow a canvas around `content` until it matches the `block` ratio.
///
/// Content narrower than the block is padded left and right; wider
/// content is padded top and bottom. Equal ratios leave the canvas as is.
/// The grown side is rounded up so the content always fits.
pub fn compute_padding(content: (u32, u32), block: (u32, u32)) -> CanvasFit {
    let (cw, ch) = content;
    let (bw, bh) = block;
    if cw == 0 || ch == 0 || bw == 0 || bh == 0 {
        return CanvasFit {
            width: cw,
            height: ch,
            paste_x: 0,
            paste_y: 0,
        };
    }

    // Compare cw/ch with bw/bh without floating point.
    let content_cross = cw as u64 * bh as u64;
    let block_cross = ch as u64 * bw as u64;

    let (width, height) = if content_cross < block_cross {
        (div_ceil(block_cross, bh as u64), ch)
    } else if content_cross > block_cross {
        (cw, div_ceil(content_cross, bw as u64))
    } else {
        (cw, ch)
    };

    CanvasFit {
        width,
        height,
        paste_x: (width - cw) / 2,
        paste_y: (height - ch) / 2,
    }
}

fn div_ceil(numerator: u64, denominator: u64) -> u32 {
    numerator.div_ceil(denominator) as u32
}

/// Largest size that fits inside `bounds` with the source's proportions.
///
/// Never upscales: a source already inside the box keeps its size.
pub fn fit_within(source: (u32, u32), bounds: (u32, u32)) -> (u32, u32) {
    let (sw, sh) = source;
    let (bw, bh) = bounds;
    if sw <= bw && sh <= bh {
        return source;
    }
    let scale = (bw as f64 / sw as f64).min(bh as f64 / sh as f64);
    let w = ((sw as f64 * scale).round() as u32).clamp(1, bw);
    let h = ((sh as f64 * scale).round() as u32).clamp(1, bh);
    (w, h)
}

/// Round down to the nearest even number (minimum 2), as most video
/// codecs require even frame dimensions.
pub fn even(value: u32) -> u32 {
    (value & !1).max(2)
}

/// Scale/pad plan for a video, the video analogue of [`CanvasFit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoFit {
    pub scaled_width: u32,
    pub scaled_height: u32,
    pub pad_width: u32,
    pub pad_height: u32,
    pub pad_x: u32,
    pub pad_y: u32,
}

/// Plan a pad-to-ratio transform for a video with even dimensions.
pub fn video_fit(source: (u32, u32), block: (u32, u32)) -> VideoFit {
    let canvas = compute_padding(source, block);
    let scaled_width = even(source.0);
    let scaled_height = even(source.1);
    let pad_width = even(canvas.width).max(scaled_width);
    let pad_height = even(canvas.height).max(scaled_height);
    VideoFit {
        scaled_width,
        scaled_height,
        pad_width,
        pad_height,
        pad_x: (pad_width - scaled_width) / 2,
        pad_y: (pad_height - scaled_height) / 2,
    }
}

/// Centred square crop of the shorter side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SquareCrop {
    pub size: u32,
    pub x: u32,
    pub y: u32,
}

pub fn square_crop(width: u32, height: u32) -> SquareCrop {
    let size = width.min(height);
    SquareCrop {
        size,
        x: (width - size) / 2,
        y: (height - size) / 2,
    }
}
