//! Configuration for noising images from the command line or a caller.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::{Error, Result};

use super::noise::NoiseInjector;
use super::schedule::{NoiseSchedule, DEFAULT_BETA, DEFAULT_MAX_STEPS};

/// Configuration for forward-diffusion noising.
#[derive(Debug, Clone)]
pub struct NoiseConfig {
    /// Per-step noise rate, strictly between 0 and 1.
    pub beta: f64,

    /// Largest valid step index.
    pub max_steps: u32,

    /// Random seed for reproducibility. None for random.
    pub seed: Option<u64>,

    /// Output JPEG quality (1-100).
    pub output_quality: u8,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            beta: DEFAULT_BETA,
            max_steps: DEFAULT_MAX_STEPS,
            seed: None,
            output_quality: 95,
        }
    }
}

impl NoiseConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any parameter is out of valid range.
    pub fn validate(&self) -> Result<()> {
        self.schedule()?;

        if !(1..=100).contains(&self.output_quality) {
            return Err(Error::invalid_argument(
                "output_quality",
                "must be between 1 and 100",
            ));
        }

        Ok(())
    }

    /// The schedule described by `beta` and `max_steps`.
    ///
    /// # Errors
    ///
    /// Returns an error if `beta` is out of range.
    pub fn schedule(&self) -> Result<NoiseSchedule> {
        NoiseSchedule::new(self.beta, self.max_steps)
    }

    /// A validated injector for this configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn injector(&self) -> Result<NoiseInjector> {
        self.validate()?;
        Ok(NoiseInjector::new(self.schedule()?))
    }

    /// Random generator seeded from `seed`, or from the OS when unset.
    #[must_use]
    pub fn rng(&self) -> StdRng {
        self.seed
            .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::RngCore;

    #[test]
    fn test_default_is_valid() {
        let config = NoiseConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.injector().unwrap(), NoiseInjector::default());
    }

    #[test]
    fn test_rejects_bad_quality() {
        for quality in [0, 101] {
            let config = NoiseConfig {
                output_quality: quality,
                ..NoiseConfig::default()
            };
            assert!(matches!(
                config.validate(),
                Err(Error::InvalidArgument { ref name, .. }) if name == "output_quality"
            ));
        }
    }

    #[test]
    fn test_rejects_bad_beta() {
        let config = NoiseConfig {
            beta: 0.0,
            ..NoiseConfig::default()
        };
        assert!(config.injector().is_err());
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let config = NoiseConfig {
            seed: Some(1234),
            ..NoiseConfig::default()
        };
        assert_eq!(config.rng().next_u64(), config.rng().next_u64());
    }
}
