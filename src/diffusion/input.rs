//! Supported in-memory image representations.
//!
//! Every representation is converted into a normalized `f32` signal on the way
//! into the noise injector and rebuilt into the same representation on the way
//! out, so the injector itself only ever sees one kind of array.

use std::any::{type_name, Any};

use image::{ColorType, DynamicImage, GrayImage, ImageBuffer, RgbImage, RgbaImage};
use ndarray::{Array, Array3, Array4, ArrayD, ArrayView3, Dimension};

use crate::error::{Error, Result};

/// Value convention of a float tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelRange {
    /// Values live in `[0, 1]`; noised output is clamped to that interval.
    Unit,
    /// Values live in `[0, 255]`; they are divided by 255 before noising,
    /// clamped, and scaled back afterwards.
    Byte,
    /// No bound; noised output is returned as-is.
    #[default]
    Unbounded,
}

impl PixelRange {
    /// Whether noised output is clamped.
    #[must_use]
    pub const fn is_bounded(self) -> bool {
        matches!(self, Self::Unit | Self::Byte)
    }
}

/// An image accepted by [`NoiseInjector`](super::NoiseInjector).
///
/// 8-bit variants always use the [`PixelRange::Byte`] convention. Float tensors
/// carry their convention explicitly; tensors built through `From` are
/// [`PixelRange::Unbounded`].
#[derive(Debug, Clone, PartialEq)]
pub enum DenseImage {
    /// A decoded 8-bit image (`L8`, `La8`, `Rgb8` or `Rgba8`).
    Image(DynamicImage),
    /// A raw 8-bit array of any shape, e.g. `(H, W, C)` or `(C, H, W)`.
    Bytes(ArrayD<u8>),
    /// A float tensor of any shape.
    Tensor { data: ArrayD<f32>, range: PixelRange },
}

impl DenseImage {
    /// Wrap a float tensor with an explicit value convention.
    pub fn tensor<D: Dimension>(data: Array<f32, D>, range: PixelRange) -> Self {
        Self::Tensor {
            data: data.into_dyn(),
            range,
        }
    }

    /// Convert an arbitrary value, rejecting anything that is not an image representation.
    ///
    /// Accepts `DenseImage`, `DynamicImage`, `RgbImage`, `RgbaImage`, `GrayImage`,
    /// `ArrayD<u8>`, `Array3<u8>`, `ArrayD<f32>`, `Array3<f32>` and `Array4<f32>`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedType`] for any other type, and for decoded
    /// images whose pixels are not 8-bit.
    pub fn from_any<T: Any>(value: T) -> Result<Self> {
        macro_rules! take {
            ($value:ident, $($ty:ty),+ $(,)?) => {
                $(
                    let $value = match $value.downcast::<$ty>() {
                        Ok(inner) => return Self::from(*inner).checked(),
                        Err(other) => other,
                    };
                )+
            };
        }

        let value: Box<dyn Any> = Box::new(value);
        take!(
            value,
            Self,
            DynamicImage,
            RgbImage,
            RgbaImage,
            GrayImage,
            ArrayD<u8>,
            Array3<u8>,
            ArrayD<f32>,
            Array3<f32>,
            Array4<f32>,
        );
        drop(value);

        Err(Error::UnsupportedType {
            type_name: type_name::<T>().to_string(),
        })
    }

    /// Value convention of this image.
    #[must_use]
    pub const fn range(&self) -> PixelRange {
        match self {
            Self::Image(_) | Self::Bytes(_) => PixelRange::Byte,
            Self::Tensor { range, .. } => *range,
        }
    }

    /// Logical shape. Decoded images report `(height, width, channels)`.
    #[must_use]
    pub fn shape(&self) -> Vec<usize> {
        match self {
            Self::Image(img) => vec![
                img.height() as usize,
                img.width() as usize,
                usize::from(img.color().channel_count()),
            ],
            Self::Bytes(data) => data.shape().to_vec(),
            Self::Tensor { data, .. } => data.shape().to_vec(),
        }
    }

    /// Borrow the float tensor, if this is one.
    #[must_use]
    pub const fn as_tensor(&self) -> Option<&ArrayD<f32>> {
        match self {
            Self::Tensor { data, .. } => Some(data),
            _ => None,
        }
    }

    /// Borrow the raw 8-bit array, if this is one.
    #[must_use]
    pub const fn as_bytes(&self) -> Option<&ArrayD<u8>> {
        match self {
            Self::Bytes(data) => Some(data),
            _ => None,
        }
    }

    /// Take the decoded image, if this is one.
    #[must_use]
    pub fn into_image(self) -> Option<DynamicImage> {
        match self {
            Self::Image(img) => Some(img),
            _ => None,
        }
    }

    /// Verify the representation can be noised.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedType`] for decoded images that are not 8-bit.
    pub fn checked(self) -> Result<Self> {
        if let Self::Image(img) = &self {
            channels_of(img)?;
        }
        Ok(self)
    }

    /// Normalized signal: bounded conventions are mapped onto `[0, 1]`.
    pub(crate) fn to_signal(&self) -> Result<ArrayD<f32>> {
        match self {
            Self::Image(img) => {
                let channels = channels_of(img)?;
                let shape = (img.height() as usize, img.width() as usize, channels);
                let view = ArrayView3::from_shape(shape, img.as_bytes()).map_err(|_| {
                    Error::ShapeMismatch {
                        expected: format!("{shape:?}"),
                        actual: format!("{} bytes", img.as_bytes().len()),
                    }
                })?;
                Ok(view.mapv(byte_to_unit).into_dyn())
            }
            Self::Bytes(data) => Ok(data.mapv(byte_to_unit)),
            Self::Tensor { data, range } => Ok(match range {
                PixelRange::Byte => data.mapv(|v| v / 255.0),
                PixelRange::Unit | PixelRange::Unbounded => data.clone(),
            }),
        }
    }

    /// Rebuild the same representation from a normalized signal of the same shape.
    pub(crate) fn with_signal(&self, signal: ArrayD<f32>) -> Result<Self> {
        match self {
            Self::Image(img) => {
                let bytes = signal.iter().copied().map(unit_to_byte).collect();
                rebuild_image(img, bytes).map(Self::Image)
            }
            Self::Bytes(_) => Ok(Self::Bytes(signal.mapv(unit_to_byte))),
            Self::Tensor { range, .. } => {
                let data = match range {
                    PixelRange::Byte => signal * 255.0,
                    PixelRange::Unit | PixelRange::Unbounded => signal,
                };
                Ok(Self::Tensor {
                    data,
                    range: *range,
                })
            }
        }
    }
}

impl From<DynamicImage> for DenseImage {
    fn from(img: DynamicImage) -> Self {
        Self::Image(img)
    }
}

impl From<RgbImage> for DenseImage {
    fn from(img: RgbImage) -> Self {
        Self::Image(DynamicImage::ImageRgb8(img))
    }
}

impl From<RgbaImage> for DenseImage {
    fn from(img: RgbaImage) -> Self {
        Self::Image(DynamicImage::ImageRgba8(img))
    }
}

impl From<GrayImage> for DenseImage {
    fn from(img: GrayImage) -> Self {
        Self::Image(DynamicImage::ImageLuma8(img))
    }
}

impl<D: Dimension> From<Array<u8, D>> for DenseImage {
    fn from(data: Array<u8, D>) -> Self {
        Self::Bytes(data.into_dyn())
    }
}

impl<D: Dimension> From<Array<f32, D>> for DenseImage {
    fn from(data: Array<f32, D>) -> Self {
        Self::tensor(data, PixelRange::Unbounded)
    }
}

fn unsupported_color(color: ColorType) -> Error {
    Error::UnsupportedType {
        type_name: format!("DynamicImage ({color:?})"),
    }
}

fn channels_of(img: &DynamicImage) -> Result<usize> {
    match img.color() {
        color @ (ColorType::L8 | ColorType::La8 | ColorType::Rgb8 | ColorType::Rgba8) => {
            Ok(usize::from(color.channel_count()))
        }
        other => Err(unsupported_color(other)),
    }
}

fn rebuild_image(template: &DynamicImage, bytes: Vec<u8>) -> Result<DynamicImage> {
    let (width, height) = (template.width(), template.height());
    let len = bytes.len();

    let rebuilt = match template.color() {
        ColorType::L8 => ImageBuffer::from_raw(width, height, bytes).map(DynamicImage::ImageLuma8),
        ColorType::La8 => {
            ImageBuffer::from_raw(width, height, bytes).map(DynamicImage::ImageLumaA8)
        }
        ColorType::Rgb8 => ImageBuffer::from_raw(width, height, bytes).map(DynamicImage::ImageRgb8),
        ColorType::Rgba8 => {
            ImageBuffer::from_raw(width, height, bytes).map(DynamicImage::ImageRgba8)
        }
        other => return Err(unsupported_color(other)),
    };

    rebuilt.ok_or_else(|| Error::ShapeMismatch {
        expected: format!("{width}x{height} {:?} image", template.color()),
        actual: format!("{len} bytes"),
    })
}

#[inline]
fn byte_to_unit(value: u8) -> f32 {
    f32::from(value) / 255.0
}

/// Map a value in `[0, 1]` back to a byte, rounding to the nearest level.
#[inline]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn unit_to_byte(value: f32) -> u8 {
    // Safe: clamped to [0, 255] before casting
    (value * 255.0).round().clamp(0.0, 255.0) as u8
}
