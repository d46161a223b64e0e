//! Square cropping for dataset preparation.

use std::fs;
use std::path::{Path, PathBuf};

use image::{imageops::FilterType, DynamicImage, GenericImageView, ImageFormat, ImageReader};
use indicatif::{ProgressBar, ProgressStyle};

use crate::error::{Error, Result};

use super::save_image_as;

/// Default edge length for batch cropping.
pub const DEFAULT_CROP_SIZE: u32 = 512;

/// JPEG quality used when cropped images are written back.
const CROP_QUALITY: u8 = 95;

/// Outcome of a batch crop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CropReport {
    /// Images cropped and written back.
    pub processed: usize,
    /// Files that could not be decoded as images.
    pub skipped: usize,
}

/// Crop an image to a square and resize it to `size x size`.
///
/// Portrait images keep their top square. Landscape and square images keep
/// the horizontally centred square. The result is always RGB8.
///
/// # Errors
///
/// Returns an error if `size` is zero or the image is empty.
pub fn crop_square(img: &DynamicImage, size: u32) -> Result<DynamicImage> {
    if size == 0 {
        return Err(Error::invalid_argument("size", "must be greater than 0"));
    }

    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Err(Error::invalid_argument(
            "image",
            format!("cannot crop an empty {width}x{height} image"),
        ));
    }

    let (left, side) = if height > width {
        (0, width)
    } else {
        ((width - height) / 2, height)
    };

    let square = img.crop_imm(left, 0, side, side);
    let resized = square.resize_exact(size, size, FilterType::CatmullRom);

    Ok(DynamicImage::ImageRgb8(resized.to_rgb8()))
}

/// Crop every image in `dir` to a square of `size` pixels, overwriting the files.
///
/// Only the top level of `dir` is visited. Formats are detected from file
/// contents, and each file is written back in the format it was read in.
/// Files that fail to decode are skipped with a warning.
///
/// # Errors
///
/// Returns an error if the directory cannot be read or a cropped image cannot
/// be written back.
pub fn crop_square_dir<P: AsRef<Path>>(dir: P, size: u32) -> Result<CropReport> {
    let dir = dir.as_ref();

    if size == 0 {
        return Err(Error::invalid_argument("size", "must be greater than 0"));
    }

    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .collect();
    paths.sort();

    tracing::info!("Cropping {} files in {} to {size}x{size}", paths.len(), dir.display());

    let pb = ProgressBar::new(paths.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} Cropping [{bar:40.cyan/blue}] {pos}/{len}")
            .expect("valid template")
            .progress_chars("#>-"),
    );

    let mut report = CropReport::default();
    for path in &paths {
        match decode(path) {
            Ok((img, format)) => {
                let cropped = crop_square(&img, size)?;
                save_image_as(&cropped, path, format, CROP_QUALITY)?;
                report.processed += 1;
            }
            Err(err) => {
                tracing::warn!("Skipping {}: {err}", path.display());
                report.skipped += 1;
            }
        }
        pb.inc(1);
    }

    pb.finish_with_message("Cropping complete");
    tracing::info!(
        processed = report.processed,
        skipped = report.skipped,
        "Batch crop finished"
    );

    Ok(report)
}

/// Decode by content rather than by extension.
fn decode(path: &Path) -> image::ImageResult<(DynamicImage, ImageFormat)> {
    let reader = ImageReader::open(path)?.with_guessed_format()?;
    let format = reader.format();
    let img = reader.decode()?;
    // Decoding only succeeds once a format is known.
    Ok((img, format.unwrap_or(ImageFormat::Png)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    /// Left half red, right half blue, bottom quarter green.
    fn marked(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            if y >= height * 3 / 4 {
                Rgb([0, 255, 0])
            } else if x < width / 2 {
                Rgb([255, 0, 0])
            } else {
                Rgb([0, 0, 255])
            }
        }))
    }

    #[test]
    fn test_output_size() {
        for (w, h) in [(300, 200), (200, 300), (64, 64), (1, 50)] {
            let out = crop_square(&marked(w, h), 32).unwrap();
            assert_eq!(out.dimensions(), (32, 32));
            assert!(matches!(out, DynamicImage::ImageRgb8(_)));
        }
    }

    #[test]
    fn test_portrait_keeps_top() {
        // 40x160: the top 40x40 square has no green.
        let out = crop_square(&marked(40, 160), 40).unwrap().to_rgb8();
        assert!(out.pixels().all(|p| p[1] == 0));
    }

    #[test]
    fn test_landscape_keeps_centre() {
        // 120x40 with the red/blue split at x=60; the centre square spans 40..80.
        let out = crop_square(&marked(120, 40), 40).unwrap().to_rgb8();
        assert_eq!(out.get_pixel(2, 2), &Rgb([255, 0, 0]));
        assert_eq!(out.get_pixel(37, 2), &Rgb([0, 0, 255]));
        // Bottom rows stay green because landscape crops keep the full height.
        assert_eq!(out.get_pixel(20, 39), &Rgb([0, 255, 0]));
    }

    #[test]
    fn test_rejects_zero_size() {
        assert!(matches!(
            crop_square(&marked(8, 8), 0),
            Err(Error::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_rejects_empty_image() {
        assert!(matches!(
            crop_square(&DynamicImage::new_rgb8(0, 10), 8),
            Err(Error::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_crop_dir_overwrites_and_skips() {
        let dir = tempfile::tempdir().unwrap();
        marked(90, 30).save(dir.path().join("wide.png")).unwrap();
        marked(30, 90).save(dir.path().join("tall.png")).unwrap();
        fs::write(dir.path().join("notes.txt"), "not an image").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();

        let report = crop_square_dir(dir.path(), 16).unwrap();
        assert_eq!(
            report,
            CropReport {
                processed: 2,
                skipped: 1
            }
        );

        for name in ["wide.png", "tall.png"] {
            let img = image::open(dir.path().join(name)).unwrap();
            assert_eq!(img.dimensions(), (16, 16));
        }
        assert_eq!(
            fs::read_to_string(dir.path().join("notes.txt")).unwrap(),
            "not an image"
        );
    }

    fn guessed_format(path: &Path) -> Option<ImageFormat> {
        ImageReader::open(path)
            .unwrap()
            .with_guessed_format()
            .unwrap()
            .format()
    }

    #[test]
    fn test_crop_dir_detects_format_from_contents() {
        let dir = tempfile::tempdir().unwrap();
        let bare = dir.path().join("photo");
        let misnamed = dir.path().join("wrong.jpg");
        marked(90, 30)
            .save_with_format(&bare, ImageFormat::Png)
            .unwrap();
        marked(30, 90)
            .save_with_format(&misnamed, ImageFormat::Png)
            .unwrap();

        let report = crop_square_dir(dir.path(), 16).unwrap();
        assert_eq!(
            report,
            CropReport {
                processed: 2,
                skipped: 0
            }
        );

        for path in [&bare, &misnamed] {
            assert_eq!(guessed_format(path), Some(ImageFormat::Png));
            let img = ImageReader::open(path)
                .unwrap()
                .with_guessed_format()
                .unwrap()
                .decode()
                .unwrap();
            assert_eq!(img.dimensions(), (16, 16));
        }
    }

    #[test]
    fn test_crop_dir_missing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            crop_square_dir(dir.path().join("absent"), 16),
            Err(Error::Io(_))
        ));
    }
}
