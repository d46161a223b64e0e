//! Forward-diffusion noise for images and tensors.

mod config;
mod input;
mod noise;
mod schedule;

pub use config::NoiseConfig;
pub use input::{DenseImage, PixelRange};
pub use noise::{add_diffusion_noise, NoiseInjector};
pub use schedule::{NoiseSchedule, DEFAULT_BETA, DEFAULT_MAX_STEPS};
