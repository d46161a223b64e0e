//! Bounding-box overlays.

use std::path::Path;

use ab_glyph::{Font, FontArc, PxScale, ScaleFont};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;

use crate::error::{Error, Result};

/// Outline thickness in pixels. The outline grows inward from the box edge.
const LINE_WIDTH: i64 = 2;

/// Distance between a label's centre and the top edge of its box.
const LABEL_OFFSET: i64 = 4;

/// Default label height in pixels.
pub const DEFAULT_LABEL_SCALE: f32 = 12.0;

/// Blue, green, red, magenta, cyan.
pub const DEFAULT_PALETTE: [Rgb<u8>; 5] = [
    Rgb([0, 0, 255]),
    Rgb([0, 128, 0]),
    Rgb([255, 0, 0]),
    Rgb([191, 0, 191]),
    Rgb([0, 191, 191]),
];

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

/// How the four box coordinates are laid out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BoxFormat {
    /// Upper-left x, upper-left y, lower-right x, lower-right y.
    #[default]
    Xyxy,
    /// Upper-left x, upper-left y, width, height.
    Xywh,
}

/// An axis-aligned box in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub coords: [f32; 4],
    pub format: BoxFormat,
}

/// Text drawn above boxes: `texts[i]` labels box `i`.
///
/// Boxes past the end of `texts` get no label.
#[derive(Debug, Clone, Copy)]
pub struct BoxLabels<'a> {
    pub texts: &'a [String],
    pub font: &'a FontArc,
    /// Line height in pixels.
    pub scale: f32,
}

impl<'a> BoxLabels<'a> {
    #[must_use]
    pub const fn new(texts: &'a [String], font: &'a FontArc) -> Self {
        Self {
            texts,
            font,
            scale: DEFAULT_LABEL_SCALE,
        }
    }
}

/// Half-open pixel span `[left, right) x [top, bottom)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    left: i64,
    top: i64,
    right: i64,
    bottom: i64,
}

impl Span {
    /// Intersection with the image, as a drawable rectangle.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn clip(self, image: &RgbImage) -> Option<Rect> {
        let left = self.left.max(0);
        let top = self.top.max(0);
        let right = self.right.min(i64::from(image.width()));
        let bottom = self.bottom.min(i64::from(image.height()));

        if left >= right || top >= bottom {
            return None;
        }
        // Safe: every bound now lies inside the image dimensions
        Some(Rect::at(left as i32, top as i32).of_size((right - left) as u32, (bottom - top) as u32))
    }

    /// The outline strips of width `LINE_WIDTH`: top, bottom, left, right.
    fn outline(self) -> [Self; 4] {
        let top_edge = self.top.saturating_add(LINE_WIDTH).min(self.bottom);
        let bottom_edge = self.bottom.saturating_sub(LINE_WIDTH).max(self.top);
        let left_edge = self.left.saturating_add(LINE_WIDTH).min(self.right);
        let right_edge = self.right.saturating_sub(LINE_WIDTH).max(self.left);

        [
            Self { bottom: top_edge, ..self },
            Self { top: bottom_edge, ..self },
            Self { right: left_edge, ..self },
            Self { left: right_edge, ..self },
        ]
    }
}

impl BoundingBox {
    #[must_use]
    pub const fn xyxy(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            coords: [x0, y0, x1, y1],
            format: BoxFormat::Xyxy,
        }
    }

    #[must_use]
    pub const fn xywh(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            coords: [x, y, width, height],
            format: BoxFormat::Xywh,
        }
    }

    /// Round to whole pixels, rejecting non-finite and empty boxes.
    #[allow(clippy::cast_possible_truncation)]
    fn span(&self) -> Result<Span> {
        if !self.coords.iter().all(|c| c.is_finite()) {
            return Err(Error::invalid_argument(
                "bbox",
                format!("{:?} box {:?} has a non-finite coordinate", self.format, self.coords),
            ));
        }

        let [x, y, a, b] = self.coords.map(f64::from);
        let (width, height) = match self.format {
            BoxFormat::Xyxy => (a - x, b - y),
            BoxFormat::Xywh => (a, b),
        };
        let (width, height) = (width.round(), height.round());

        if !(width >= 1.0 && height >= 1.0) {
            return Err(Error::invalid_argument(
                "bbox",
                format!("{:?} box {:?} has no area", self.format, self.coords),
            ));
        }

        let (x, y) = (x.round(), y.round());
        // Float-to-int casts saturate, so far-off edges pin to the i64 limits.
        Ok(Span {
            left: x as i64,
            top: y as i64,
            right: (x + width) as i64,
            bottom: (y + height) as i64,
        })
    }

    /// Convert to a pixel rectangle, rounding to the nearest pixel.
    ///
    /// # Errors
    ///
    /// Returns an error if a coordinate is not finite, the box is narrower or
    /// shorter than one pixel, or it does not fit in `i32` pixel coordinates.
    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    pub fn to_rect(&self) -> Result<Rect> {
        let span = self.span()?;
        let fits = |v: i64| i32::try_from(v).is_ok();

        if !(fits(span.left) && fits(span.top) && fits(span.right) && fits(span.bottom)) {
            return Err(Error::invalid_argument(
                "bbox",
                format!("{:?} box {:?} is outside the pixel range", self.format, self.coords),
            ));
        }

        // Safe: all four bounds fit in i32 and right > left, bottom > top
        Ok(Rect::at(span.left as i32, span.top as i32)
            .of_size((span.right - span.left) as u32, (span.bottom - span.top) as u32))
    }
}

/// Load a TrueType or OpenType font for box labels.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a font.
pub fn load_font<P: AsRef<Path>>(path: P) -> Result<FontArc> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;

    FontArc::try_from_vec(bytes).map_err(|source| Error::FontLoad {
        path: path.to_path_buf(),
        source,
    })
}

/// Draw `boxes` onto `image` with a two-pixel outline and optional labels.
///
/// Box `i` is drawn in `colors[i % colors.len()]`, or from [`DEFAULT_PALETTE`]
/// when no colours are given. Labels are centred on the box's upper-left
/// corner, 4 pixels above it, on a background of the box colour; the text is
/// white, or black on white boxes. Anything past the image edge is clipped and
/// boxes entirely outside are skipped. All boxes are validated before anything
/// is drawn.
///
/// # Errors
///
/// Returns an error if the palette is empty or any box is non-finite or has no area.
pub fn draw_bboxes(
    image: &mut RgbImage,
    boxes: &[BoundingBox],
    colors: Option<&[Rgb<u8>]>,
    labels: Option<&BoxLabels<'_>>,
) -> Result<()> {
    let colors = colors.unwrap_or(&DEFAULT_PALETTE);
    if colors.is_empty() {
        return Err(Error::invalid_argument("colors", "palette is empty"));
    }

    let spans = boxes
        .iter()
        .map(BoundingBox::span)
        .collect::<Result<Vec<_>>>()?;

    for (index, span) in spans.into_iter().enumerate() {
        let color = colors[index % colors.len()];
        for strip in span.outline() {
            if let Some(rect) = strip.clip(image) {
                draw_filled_rect_mut(image, rect, color);
            }
        }

        if let Some((labels, text)) = labels.and_then(|l| Some((l, l.texts.get(index)?))) {
            draw_label(image, span, color, labels, text);
        }
    }

    tracing::debug!("Drew {} bounding boxes", boxes.len());
    Ok(())
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn draw_label(image: &mut RgbImage, span: Span, color: Rgb<u8>, labels: &BoxLabels<'_>, text: &str) {
    if text.is_empty() {
        return;
    }

    let scale = PxScale::from(labels.scale);
    let (text_width, _) = text_size(scale, labels.font, text);
    let line_height = labels.font.as_scaled(scale).height().ceil().max(0.0) as i64;
    let text_width = i64::from(text_width);

    let x = span.left.saturating_sub(text_width / 2);
    let y = span
        .top
        .saturating_sub(LABEL_OFFSET)
        .saturating_sub(line_height / 2);

    let background = Span {
        left: x.saturating_sub(1),
        top: y.saturating_sub(1),
        right: x.saturating_add(text_width).saturating_add(1),
        bottom: y.saturating_add(line_height).saturating_add(1),
    };
    let Some(rect) = background.clip(image) else {
        return;
    };
    draw_filled_rect_mut(image, rect, color);

    let text_color = if color == WHITE { BLACK } else { WHITE };
    // Safe: the background intersects the image, so x and y are within a line of it
    draw_text_mut(image, text_color, x as i32, y as i32, scale, labels.font, text);
}
