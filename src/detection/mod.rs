//! Detection visualisation helpers.

mod bbox;

pub use bbox::{
    draw_bboxes, load_font, BoundingBox, BoxFormat, BoxLabels, DEFAULT_LABEL_SCALE, DEFAULT_PALETTE,
};
