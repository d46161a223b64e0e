//! Image loading, saving, and square cropping.

mod crop;
mod load;
mod save;

pub use crop::{crop_square, crop_square_dir, CropReport, DEFAULT_CROP_SIZE};
pub use load::load_image;
pub use save::{save_image, save_image_as};
