//! Lanczos upscaling for finished images.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use tracing::info;

use crate::error::GemimgError;

/// JPEG quality used when the output is a JPEG.
pub const JPEG_QUALITY: u8 = 95;

/// Sizes before and after an upscale.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct UpscaleOutcome {
    /// Input width and height
    pub original: (u32, u32),
    /// Output width and height
    pub upscaled: (u32, u32),
}

/// Resizes `image` to `scale` times its size with Lanczos3.
pub fn upscale(image: &DynamicImage, scale: u32) -> Result<DynamicImage, GemimgError> {
    if scale == 0 {
        return Err(GemimgError::InvalidScale(scale));
    }
    let width = image
        .width()
        .checked_mul(scale)
        .ok_or(GemimgError::InvalidScale(scale))?;
    let height = image
        .height()
        .checked_mul(scale)
        .ok_or(GemimgError::InvalidScale(scale))?;
    Ok(image.resize_exact(width, height, FilterType::Lanczos3))
}

/// Reads `input`, upscales it and writes `output` in the format its extension names.
pub fn upscale_file(input: &Path, output: &Path, scale: u32) -> Result<UpscaleOutcome, GemimgError> {
    if scale == 0 {
        return Err(GemimgError::InvalidScale(scale));
    }
    let image = image::ImageReader::open(input)?
        .with_guessed_format()?
        .decode()?;
    let original = (image.width(), image.height());
    info!("Original size: {}x{}", original.0, original.1);

    let upscaled = upscale(&image, scale)?;
    let new_size = (upscaled.width(), upscaled.height());
    info!("Upscaling to: {}x{}", new_size.0, new_size.1);

    save(&upscaled, output)?;
    info!("Saved to: {}", output.display());

    Ok(UpscaleOutcome {
        original,
        upscaled: new_size,
    })
}

fn save(image: &DynamicImage, output: &Path) -> Result<(), GemimgError> {
    let format = ImageFormat::from_path(output)?;
    if format == ImageFormat::Jpeg {
        let writer = BufWriter::new(File::create(output)?);
        let mut encoder = JpegEncoder::new_with_quality(writer, JPEG_QUALITY);
        encoder.encode_image(&image.to_rgb8())?;
        return Ok(());
    }
    image.save_with_format(output, format)?;
    Ok(())
}
