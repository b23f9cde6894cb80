//! Odometry motion model
//!
//! Each particle moves by the odometry delta expressed in its own heading
//! frame, plus independent Gaussian noise on every axis.

use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::common::{wrap_heading, LocalizationError, LocalizationResult, Point2D};
use crate::localization::{MotionNoise, ParticleSet};

/// Relative motion reported by odometry (heading delta in degrees)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MotionDelta {
    pub dx: f64,
    pub dy: f64,
    pub dheading: f64,
}

impl MotionDelta {
    pub fn new(dx: f64, dy: f64, dheading: f64) -> Self {
        Self { dx, dy, dheading }
    }
}

/// Motion model with the noise distributions built from [`MotionNoise`]
#[derive(Debug, Clone)]
pub struct MotionModel {
    noise: MotionNoise,
    x_dist: Normal<f64>,
    y_dist: Normal<f64>,
    heading_dist: Normal<f64>,
}

fn normal(sigma: f64) -> LocalizationResult<Normal<f64>> {
    Normal::new(0.0, sigma)
        .map_err(|e| LocalizationError::InvalidParameter(format!("noise sigma {}: {}", sigma, e)))
}

impl MotionModel {
    pub fn new(noise: MotionNoise) -> LocalizationResult<Self> {
        noise.validate()?;
        Ok(MotionModel {
            noise,
            x_dist: normal(noise.sigma_x)?,
            y_dist: normal(noise.sigma_y)?,
            heading_dist: normal(noise.sigma_heading)?,
        })
    }

    pub fn noise(&self) -> &MotionNoise {
        &self.noise
    }

    /// Replace the noise; takes effect from the next call to [`MotionModel::apply`]
    pub fn set_noise(&mut self, noise: MotionNoise) -> LocalizationResult<()> {
        *self = Self::new(noise)?;
        Ok(())
    }

    /// Propagate every particle by `delta`
    pub fn apply<R: Rng + ?Sized>(&self, particles: &mut ParticleSet, delta: &MotionDelta, rng: &mut R) {
        let step = Point2D::new(delta.dx, delta.dy);
        for p in particles.iter_mut() {
            let moved = step.rotated(p.heading);
            p.x += moved.x + self.x_dist.sample(rng);
            p.y += moved.y + self.y_dist.sample(rng);
            p.heading = wrap_heading(p.heading + delta.dheading + self.heading_dist.sample(rng));
        }
    }
}
