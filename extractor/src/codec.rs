use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageError, ImageFormat};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Decodes a compressed camera payload into a raster image.
///
/// A failure is always reported; implementations never hand back a
/// placeholder image.
pub trait ImageDecoder {
    fn decode(&self, encoded: &[u8]) -> Result<DynamicImage, ImageError>;
}

/// Camera payloads in the dataset are baseline JPEG.
#[derive(Debug, Default, Clone, Copy)]
pub struct JpegDecoder;

impl ImageDecoder for JpegDecoder {
    fn decode(&self, encoded: &[u8]) -> Result<DynamicImage, ImageError> {
        image::load_from_memory_with_format(encoded, ImageFormat::Jpeg)
    }
}

/// Re-encode `image` as a JPEG at `path`, replacing any existing file.
///
/// Grayscale sources stay single-channel; everything else is written as
/// 8-bit RGB, since JPEG has no alpha channel.
pub fn write_jpeg(image: &DynamicImage, path: &Path, quality: u8) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    {
        let mut encoder = JpegEncoder::new_with_quality(&mut writer, quality);
        match image {
            DynamicImage::ImageLuma8(gray) => encoder.encode_image(gray),
            DynamicImage::ImageRgb8(rgb) => encoder.encode_image(rgb),
            other if !other.color().has_color() => encoder.encode_image(&other.to_luma8()),
            other => encoder.encode_image(&other.to_rgb8()),
        }
        .map_err(|e| match e {
            ImageError::IoError(io) => io,
            other => io::Error::other(other),
        })?;
    }
    writer.flush()
}
