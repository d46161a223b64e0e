//! # `aesir-utils`
//!
//! Small image utilities for machine-learning workflows.
//!
//! The centrepiece is forward-diffusion noise: mixing an image with Gaussian
//! noise as if a fixed number of diffusion steps had been applied, following
//! `alpha_bar = (1 - beta)^step`. Alongside it live square cropping for
//! dataset preparation and bounding-box overlays for detection output.
//!
//! ## Example
//!
//! ```no_run
//! use aesir_utils::{image, DenseImage, NoiseInjector};
//! use rand::SeedableRng;
//!
//! # fn main() -> aesir_utils::Result<()> {
//! let img = image::load_image("cat.png")?;
//! let mut rng = rand::rngs::StdRng::seed_from_u64(42);
//!
//! let noised = NoiseInjector::default().apply(&DenseImage::from(img), 250, &mut rng)?;
//! if let Some(out) = noised.into_image() {
//!     image::save_image(&out, "cat_t250.png", 95)?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod detection;
pub mod diffusion;
pub mod error;
pub mod image;

pub use diffusion::{add_diffusion_noise, DenseImage, NoiseConfig, NoiseInjector, PixelRange};
pub use error::{Error, Result};
