//! Forward-diffusion noise injection.

use ndarray::{ArrayD, Zip};
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

use crate::error::Result;

use super::input::DenseImage;
use super::schedule::NoiseSchedule;

/// Mixes an image with Gaussian noise according to a [`NoiseSchedule`].
///
/// The injector holds no mutable state. Each call takes the random generator
/// explicitly, so concurrent callers only need separate generators.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NoiseInjector {
    schedule: NoiseSchedule,
}

impl NoiseInjector {
    /// Create an injector for the given schedule.
    #[must_use]
    pub const fn new(schedule: NoiseSchedule) -> Self {
        Self { schedule }
    }

    /// The schedule this injector follows.
    #[must_use]
    pub const fn schedule(&self) -> &NoiseSchedule {
        &self.schedule
    }

    /// Noise `image` as if `step` forward-diffusion steps had been applied.
    ///
    /// Computes `sqrt(alpha_bar) * x + sqrt(1 - alpha_bar) * eps` with
    /// `eps ~ N(0, 1)`, clamps bounded value conventions back into range and
    /// returns the same representation as the input.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`](crate::Error::InvalidArgument) if `step`
    /// is outside `[0, max_steps]` and
    /// [`Error::UnsupportedType`](crate::Error::UnsupportedType) if the image
    /// cannot be converted. Both are reported before `rng` is used.
    pub fn apply<R: Rng + ?Sized>(
        &self,
        image: &DenseImage,
        step: i64,
        rng: &mut R,
    ) -> Result<DenseImage> {
        let step = self.schedule.check_step(step)?;
        let signal = image.to_signal()?;

        let noisy = self.mix(&signal, step, image.range().is_bounded(), rng);
        image.with_signal(noisy)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn mix<R: Rng + ?Sized>(
        &self,
        signal: &ArrayD<f32>,
        step: u32,
        clamp: bool,
        rng: &mut R,
    ) -> ArrayD<f32> {
        let (signal_scale, noise_scale) = self.schedule.coefficients(step);
        tracing::debug!(
            step,
            alpha_bar = self.schedule.alpha_bar(step),
            shape = ?signal.shape(),
            "adding forward diffusion noise"
        );

        // Pixel data is f32 throughout.
        let (signal_scale, noise_scale) = (signal_scale as f32, noise_scale as f32);

        let mut noisy: ArrayD<f32> =
            ArrayD::from_shape_fn(signal.raw_dim(), |_| StandardNormal.sample(rng));

        Zip::from(&mut noisy).and(signal).for_each(|out, &x| {
            let value = x.mul_add(signal_scale, *out * noise_scale);
            *out = if clamp { value.clamp(0.0, 1.0) } else { value };
        });

        noisy
    }
}

/// One-shot form of [`NoiseInjector::apply`].
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`](crate::Error::InvalidArgument) for an
/// out-of-range `beta` or `step`, and
/// [`Error::UnsupportedType`](crate::Error::UnsupportedType) for an
/// unconvertible image.
pub fn add_diffusion_noise<R: Rng + ?Sized>(
    image: &DenseImage,
    step: i64,
    beta: f64,
    max_steps: u32,
    rng: &mut R,
) -> Result<DenseImage> {
    let schedule = NoiseSchedule::new(beta, max_steps)?;
    NoiseInjector::new(schedule).apply(image, step, rng)
}
