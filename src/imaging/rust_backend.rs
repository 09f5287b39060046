//! Pure Rust bitmap backend, built on the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, ICO) | `image` crate (pure Rust decoders) |
//! | Identify | `image::image_dimensions` |
//! | Shrink to box | `DynamicImage::resize_exact` with `Lanczos3` |
//! | Pad + alpha flatten | `imageops::overlay` onto a solid `RgbaImage` |
//! | Encode → PNG | `DynamicImage::write_to` into an in-memory buffer |

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::{compute_padding, fit_within};
use super::params::{CanvasParams, ComposedCanvas};
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, ImageReader, Rgba, RgbaImage};
use std::io::Cursor;
use std::path::Path;

/// Bitmap backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
#[derive(Debug, Default)]
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

/// Load and decode an image from disk.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::open(path)
        .map_err(BackendError::Io)?
        .with_guessed_format()
        .map_err(BackendError::Io)?
        .decode()
        .map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
        })
}

fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, BackendError> {
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| BackendError::ProcessingFailed(format!("PNG encode failed: {}", e)))?;
    Ok(bytes)
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let (width, height) = image::image_dimensions(path).map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to read dimensions: {}", e))
        })?;
        Ok(Dimensions { width, height })
    }

    fn compose(&self, params: &CanvasParams) -> Result<ComposedCanvas, BackendError> {
        let mut img = load_image(&params.source)?;

        if let Some(bounds) = params.fit_within {
            let (w, h) = fit_within((img.width(), img.height()), bounds);
            if (w, h) != (img.width(), img.height()) {
                img = img.resize_exact(w, h, FilterType::Lanczos3);
            }
        }

        let content = (img.width(), img.height());
        let canvas = compute_padding(content, params.block);
        tracing::debug!(
            source = %params.source.display(),
            ?content,
            canvas_width = canvas.width,
            canvas_height = canvas.height,
            "padding bitmap"
        );

        let [r, g, b] = params.background.rgb();
        let mut composed = RgbaImage::from_pixel(canvas.width, canvas.height, Rgba([r, g, b, 255]));
        imageops::overlay(
            &mut composed,
            &img.to_rgba8(),
            canvas.paste_x as i64,
            canvas.paste_y as i64,
        );

        // Canvas is opaque, so dropping alpha after the overlay flattens it.
        let flattened = DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(composed).to_rgb8());
        Ok(ComposedCanvas {
            png: encode_png(&flattened)?,
            content,
            canvas,
        })
    }
}
