//! Image loading utilities.

use std::path::Path;

use image::{ColorType, DynamicImage};

use crate::error::{Error, Result};

/// Load an image from disk as an 8-bit image.
///
/// 8-bit images are returned unchanged. Deeper images are converted to
/// `Rgba8` if they carry alpha and to `Rgb8` otherwise.
///
/// # Errors
///
/// Returns an error if the image cannot be loaded.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<DynamicImage> {
    let path = path.as_ref();

    let img = image::open(path).map_err(|source| Error::ImageLoad {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::debug!(
        "Loaded {} ({}x{}, {:?})",
        path.display(),
        img.width(),
        img.height(),
        img.color()
    );

    Ok(to_eight_bit(img))
}

/// Reduce any decoded image to one of the 8-bit layouts.
fn to_eight_bit(img: DynamicImage) -> DynamicImage {
    match img.color() {
        ColorType::L8 | ColorType::La8 | ColorType::Rgb8 | ColorType::Rgba8 => img,
        color if color.has_alpha() => DynamicImage::ImageRgba8(img.to_rgba8()),
        _ => DynamicImage::ImageRgb8(img.to_rgb8()),
    }
}
