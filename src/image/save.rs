//! Image saving utilities.

use std::path::Path;

use image::{DynamicImage, ImageFormat};

use crate::error::{Error, Result};

/// Save an image, inferring the format from the file extension.
///
/// # Arguments
///
/// * `img` - Image to save
/// * `path` - Output file path
/// * `quality` - JPEG quality (1-100), ignored for other formats
///
/// # Errors
///
/// Returns an error if the extension names no known format or the image
/// cannot be saved.
pub fn save_image<P: AsRef<Path>>(img: &DynamicImage, path: P, quality: u8) -> Result<()> {
    let path = path.as_ref();

    // Extensionless paths fall back to PNG.
    let format = if path.extension().is_none() {
        ImageFormat::Png
    } else {
        ImageFormat::from_path(path).map_err(|source| Error::ImageSave {
            path: path.to_path_buf(),
            source,
        })?
    };

    save_image_as(img, path, format, quality)
}

/// Save an image in an explicit format, whatever the file is called.
///
/// # Errors
///
/// Returns an error if the image cannot be saved.
pub fn save_image_as<P: AsRef<Path>>(
    img: &DynamicImage,
    path: P,
    format: ImageFormat,
    quality: u8,
) -> Result<()> {
    let path = path.as_ref();

    if format == ImageFormat::Jpeg {
        // JPEG has no alpha channel.
        let opaque = if img.color().has_alpha() {
            DynamicImage::ImageRgb8(img.to_rgb8())
        } else {
            img.clone()
        };

        let mut output = std::fs::File::create(path)?;
        let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut output, quality);
        opaque
            .write_with_encoder(encoder)
            .map_err(|source| Error::ImageSave {
                path: path.to_path_buf(),
                source,
            })?;
    } else {
        img.save_with_format(path, format)
            .map_err(|source| Error::ImageSave {
                path: path.to_path_buf(),
                source,
            })?;
    }

    tracing::debug!("Saved {} as {format:?}", path.display());
    Ok(())
}
