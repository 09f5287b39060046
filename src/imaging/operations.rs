//! High-level image and video operations.
//!
//! These functions combine calculations with backend execution.
//! They take a source and a target block, compute parameters, and call the
//! backend. SVG wrapping happens here too, since every bitmap this crate
//! emits ends up base64-embedded in an SVG document.

use super::backend::{BackendError, ImageBackend, VideoBackend};
use super::calculations::{fit_dimensions, reduce_ratio, square_crop, video_fit};
use super::params::{Background, CanvasParams, Loudness, TranscodeParams, VideoFilter};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::path::Path;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Block ratios are reduced by divisors up to this value.
pub const MAX_RATIO_DIVISOR: u32 = 12;

/// Link icons are shrunk to fit this square before embedding.
pub const ICON_SIZE: u32 = 100;

/// Icon SVG user-space size (100px at 96dpi, in millimetres).
const ICON_VIEWBOX: &str = "26.458";

/// Side length of FAQ video thumbnails.
pub const FAQ_VIDEO_SIZE: u32 = 240;

const SVG_NS: &str = r#"xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink""#;

fn data_uri(png: &[u8]) -> String {
    format!("data:image/png;base64,{}", STANDARD.encode(png))
}

/// Minimal SVG holding one PNG stretched over a `width`×`height` view box.
pub fn embed_bitmap_in_svg(png: &[u8], width: u32, height: u32) -> String {
    format!(
        "<svg version=\"1.1\" viewBox=\"0 0 {width} {height}\" {SVG_NS}>\n    \
         <image width=\"{width}\" height=\"{height}\" preserveAspectRatio=\"none\" xlink:href=\"{}\"/>\n</svg>",
        data_uri(png)
    )
}

/// Fixed 100×100 icon SVG around a square PNG.
pub fn icon_svg(png: &[u8]) -> String {
    format!(
        "<svg width=\"{ICON_SIZE}\" height=\"{ICON_SIZE}\" version=\"1.1\" viewBox=\"0 0 {ICON_VIEWBOX} {ICON_VIEWBOX}\" {SVG_NS}>\n    \
         <image width=\"{ICON_VIEWBOX}\" height=\"{ICON_VIEWBOX}\" preserveAspectRatio=\"none\" xlink:href=\"{}\"/>\n</svg>",
        data_uri(png)
    )
}

/// Pad a bitmap to a block ratio and wrap it as SVG.
///
/// The view box is the block scaled to the bitmap
/// ([`fit_dimensions`]); the embedded PNG is padded to that box's reduced
/// ratio, so stretching it with `preserveAspectRatio="none"` never distorts.
pub fn create_block_svg(
    backend: &impl ImageBackend,
    source: &Path,
    block: (u32, u32),
    background: Background,
) -> Result<String> {
    let dims = backend.identify(source)?;
    let (width, height) = fit_dimensions(dims.width, dims.height, block.0, block.1);
    let reduced = reduce_ratio(width, height, MAX_RATIO_DIVISOR);
    let composed = backend.compose(&CanvasParams {
        source: source.to_path_buf(),
        fit_within: None,
        block: reduced,
        background,
    })?;
    tracing::debug!(source = %source.display(), width, height, ?reduced, "embedding bitmap");
    Ok(embed_bitmap_in_svg(&composed.png, width, height))
}

/// Shrink a bitmap into a square icon SVG.
pub fn create_icon_svg(
    backend: &impl ImageBackend,
    source: &Path,
    background: Background,
) -> Result<String> {
    let composed = backend.compose(&CanvasParams {
        source: source.to_path_buf(),
        fit_within: Some((ICON_SIZE, ICON_SIZE)),
        block: (1, 1),
        background,
    })?;
    Ok(icon_svg(&composed.png))
}

/// Pad a video to a block ratio, normalising its audio.
pub fn pad_video(
    backend: &impl VideoBackend,
    source: &Path,
    output: &Path,
    block: (u32, u32),
    background: Background,
) -> Result<()> {
    let dims = backend.probe(source)?;
    let reduced = reduce_ratio(block.0, block.1, MAX_RATIO_DIVISOR);
    let fit = video_fit(dims.as_pair(), reduced);
    tracing::debug!(source = %source.display(), ?fit, "padding video");
    backend.transcode(&TranscodeParams {
        source: source.to_path_buf(),
        output: output.to_path_buf(),
        filter: VideoFilter::Pad { fit, background },
        loudness: Loudness::default(),
    })
}

/// Centre-crop a video to a square thumbnail, normalising its audio.
pub fn square_video_thumbnail(
    backend: &impl VideoBackend,
    source: &Path,
    output: &Path,
    size: u32,
) -> Result<()> {
    let dims = backend.probe(source)?;
    let crop = square_crop(dims.width, dims.height);
    backend.transcode(&TranscodeParams {
        source: source.to_path_buf(),
        output: output.to_path_buf(),
        filter: VideoFilter::SquareThumbnail { crop, size },
        loudness: Loudness::default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::Dimensions;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};

    fn dims(width: u32, height: u32) -> Dimensions {
        Dimensions { width, height }
    }

    #[test]
    fn svg_embeds_base64_png() {
        let svg = embed_bitmap_in_svg(b"abc", 300, 534);
        assert!(svg.starts_with("<svg version=\"1.1\" viewBox=\"0 0 300 534\""));
        assert!(svg.contains("<image width=\"300\" height=\"534\" preserveAspectRatio=\"none\""));
        assert!(svg.contains("xlink:href=\"data:image/png;base64,YWJj\""));
        assert!(svg.ends_with("</svg>"));
    }

    #[test]
    fn icon_svg_fixed_size() {
        let svg = icon_svg(b"abc");
        assert!(svg.starts_with("<svg width=\"100\" height=\"100\""));
        assert!(svg.contains("viewBox=\"0 0 26.458 26.458\""));
        assert!(svg.contains("<image width=\"26.458\" height=\"26.458\""));
    }

    #[test]
    fn block_svg_uses_fitted_dimensions() {
        // identify pops from the end, compose pops next
        let backend = MockBackend::with_dimensions(vec![dims(300, 100), dims(300, 100)]);
        let svg = create_block_svg(&backend, Path::new("/in/chart.png"), (9, 16), Background::white())
            .unwrap();

        // 9 < 300: keep width, height = 300 / 9 * 16
        assert!(svg.contains("viewBox=\"0 0 300 533\""));
        let ops = backend.get_operations();
        assert_eq!(ops[0], RecordedOp::Identify("/in/chart.png".into()));
        assert_eq!(
            ops[1],
            RecordedOp::Compose {
                source: "/in/chart.png".into(),
                block: (300, 533),
                fit_within: None
            }
        );
    }

    #[test]
    fn icon_requests_square_box() {
        let backend = MockBackend::new();
        create_icon_svg(&backend, Path::new("/in/2 Intro.png"), Background::white()).unwrap();
        assert_eq!(
            backend.get_operations(),
            vec![RecordedOp::Compose {
                source: "/in/2 Intro.png".into(),
                block: (1, 1),
                fit_within: Some((100, 100))
            }]
        );
    }

    #[test]
    fn pad_video_builds_filter_chain() {
        let tmp = tempfile::TempDir::new().unwrap();
        let output = tmp.path().join("1-100.mp4");
        let backend = MockBackend::with_dimensions(vec![dims(640, 360)]);
        pad_video(&backend, Path::new("in.mp4"), &output, (9, 16), Background::white()).unwrap();

        let ops = backend.get_operations();
        assert_eq!(ops[0], RecordedOp::Probe("in.mp4".into()));
        match &ops[1] {
            RecordedOp::Transcode { filter, audio, .. } => {
                // ceil(640 * 16 / 9) = 1138
                assert_eq!(filter, "scale=640:360,pad=640:1138:0:389:color=white,setsar=1");
                assert_eq!(audio, "loudnorm=I=-16:LRA=11:TP=-1.5");
            }
            other => panic!("unexpected op {other:?}"),
        }
    }

    #[test]
    fn probe_failure_skips_transcode() {
        let backend = MockBackend::failing_on(&["bad.mp4"]);
        let result = pad_video(
            &backend,
            Path::new("bad.mp4"),
            Path::new("out.mp4"),
            (9, 16),
            Background::white(),
        );
        assert!(matches!(result, Err(BackendError::Probe { .. })));
        assert_eq!(backend.get_operations().len(), 1);
    }

    #[test]
    fn square_thumbnail_filter() {
        let tmp = tempfile::TempDir::new().unwrap();
        let output = tmp.path().join("q.webm");
        let backend = MockBackend::with_dimensions(vec![dims(1920, 1080)]);
        square_video_thumbnail(&backend, Path::new("q.mp4"), &output, FAQ_VIDEO_SIZE).unwrap();
        match &backend.get_operations()[1] {
            RecordedOp::Transcode { filter, .. } => {
                assert_eq!(filter, "crop=1080:1080:420:0,scale=240:240,setsar=1");
            }
            other => panic!("unexpected op {other:?}"),
        }
    }
}
