use std::path::Path;

use image::{ColorType, DynamicImage, ImageDecoder, ImageFormat, ImageReader};

use crate::buffer::PixelBuffer;
use crate::error::{IvError, Result};
use crate::spec::{ImageSpec, PixelType};

use super::decoder::ReadProgress;

/// Read the header of a single-image raster file.
pub fn read_spec(path: &Path) -> Result<ImageSpec> {
    let reader = ImageReader::open(path)?.with_guessed_format()?;
    let format = reader.format();
    let decoder = reader.into_decoder()?;
    let (width, height) = decoder.dimensions();
    spec_for(width, height, decoder.color_type(), format)
}

/// Decode the whole image. Raster files carry exactly one subimage.
pub fn read_pixels(path: &Path, subimage: usize, progress: &dyn ReadProgress) -> Result<PixelBuffer> {
    if subimage != 0 {
        return Err(IvError::SubimageOutOfRange {
            index: subimage,
            total: 1,
        });
    }
    progress.report(0.0);
    let reader = ImageReader::open(path)?.with_guessed_format()?;
    let format = reader.format();
    let img = reader.decode()?;
    progress.report(0.5);

    let img = match img.color() {
        ColorType::L8
        | ColorType::La8
        | ColorType::Rgb8
        | ColorType::Rgba8
        | ColorType::L16
        | ColorType::La16
        | ColorType::Rgb16
        | ColorType::Rgba16
        | ColorType::Rgb32F
        | ColorType::Rgba32F => img,
        _ => DynamicImage::ImageRgba32F(img.into_rgba32f()),
    };
    let spec = spec_for(img.width(), img.height(), img.color(), format)?;
    let data = img.as_bytes().to_vec();
    progress.report(1.0);
    PixelBuffer::new(spec, 0, data)
}

fn spec_for(
    width: u32,
    height: u32,
    color: ColorType,
    format: Option<ImageFormat>,
) -> Result<ImageSpec> {
    if width == 0 || height == 0 {
        return Err(IvError::InvalidDimensions { width, height });
    }
    let (nchannels, pixel_type) = match color {
        ColorType::L8 => (1, PixelType::U8),
        ColorType::La8 => (2, PixelType::U8),
        ColorType::Rgb8 => (3, PixelType::U8),
        ColorType::Rgba8 => (4, PixelType::U8),
        ColorType::L16 => (1, PixelType::U16),
        ColorType::La16 => (2, PixelType::U16),
        ColorType::Rgb16 => (3, PixelType::U16),
        ColorType::Rgba16 => (4, PixelType::U16),
        ColorType::Rgb32F => (3, PixelType::F32),
        // Anything else is widened to RGBA float on read.
        _ => (4, PixelType::F32),
    };
    let mut spec = ImageSpec::new(width, height, nchannels, pixel_type);
    spec.format = format
        .map(|f| format!("{f:?}").to_lowercase())
        .unwrap_or_else(|| "unknown".to_string());
    Ok(spec)
}
