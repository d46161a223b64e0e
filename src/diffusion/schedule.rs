//! Fixed exponential noise schedule.

use crate::error::{Error, Result};

/// Default per-step noise rate.
pub const DEFAULT_BETA: f64 = 0.01;

/// Default upper bound on the step index.
pub const DEFAULT_MAX_STEPS: u32 = 1000;

/// A constant-beta schedule: every step keeps `1 - beta` of the remaining signal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseSchedule {
    beta: f64,
    max_steps: u32,
}

impl Default for NoiseSchedule {
    fn default() -> Self {
        Self {
            beta: DEFAULT_BETA,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }
}

impl NoiseSchedule {
    /// Build a schedule.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `beta` is not strictly between 0 and 1.
    pub fn new(beta: f64, max_steps: u32) -> Result<Self> {
        // Written as a negated range check so NaN is rejected too.
        if !(beta > 0.0 && beta < 1.0) {
            return Err(Error::invalid_argument(
                "beta",
                format!("must be strictly between 0 and 1, got {beta}"),
            ));
        }

        Ok(Self { beta, max_steps })
    }

    /// Per-step noise rate.
    #[must_use]
    pub const fn beta(&self) -> f64 {
        self.beta
    }

    /// Largest valid step index.
    #[must_use]
    pub const fn max_steps(&self) -> u32 {
        self.max_steps
    }

    /// Check that `step` lies in `[0, max_steps]` and return it as an index.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] when the step is out of range.
    pub fn check_step(&self, step: i64) -> Result<u32> {
        u32::try_from(step)
            .ok()
            .filter(|&s| s <= self.max_steps)
            .ok_or_else(|| {
                Error::invalid_argument(
                    "step",
                    format!("must be between 0 and {}, got {step}", self.max_steps),
                )
            })
    }

    /// Cumulative signal retention after `step` steps: `(1 - beta)^step`.
    ///
    /// The per-step product telescopes, so no loop over steps is needed.
    #[must_use]
    pub fn alpha_bar(&self, step: u32) -> f64 {
        (1.0 - self.beta).powf(f64::from(step))
    }

    /// Signal and noise mixing coefficients for `step`.
    #[must_use]
    pub fn coefficients(&self, step: u32) -> (f64, f64) {
        let alpha_bar = self.alpha_bar(step);
        (alpha_bar.sqrt(), (1.0 - alpha_bar).sqrt())
    }
}
