//! Motion-noise configuration and its YAML store
//!
//! The store is a flat map with the keys `mgauss_x`, `mgauss_y` and
//! `mgauss_w` holding the standard deviations of the odometry noise.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::common::{LocalizationError, LocalizationResult};

/// Standard deviations of the Gaussian noise added on every motion update
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionNoise {
    /// Noise on the forward (x) component of the rotated delta
    #[serde(rename = "mgauss_x")]
    pub sigma_x: f64,
    /// Noise on the lateral (y) component of the rotated delta
    #[serde(rename = "mgauss_y")]
    pub sigma_y: f64,
    /// Noise on the heading delta, in degrees
    #[serde(rename = "mgauss_w")]
    pub sigma_heading: f64,
}

impl Default for MotionNoise {
    fn default() -> Self {
        Self { sigma_x: 1.0, sigma_y: 1.0, sigma_heading: 2.0 }
    }
}

impl MotionNoise {
    pub fn new(sigma_x: f64, sigma_y: f64, sigma_heading: f64) -> Self {
        Self { sigma_x, sigma_y, sigma_heading }
    }

    /// No noise at all; useful for dead-reckoning checks
    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    pub fn validate(&self) -> LocalizationResult<()> {
        for (name, sigma) in [
            ("mgauss_x", self.sigma_x),
            ("mgauss_y", self.sigma_y),
            ("mgauss_w", self.sigma_heading),
        ] {
            if !sigma.is_finite() || sigma < 0.0 {
                return Err(LocalizationError::InvalidParameter(format!(
                    "{} must be a finite non-negative deviation, got {}",
                    name, sigma
                )));
            }
        }
        Ok(())
    }

    pub fn from_yaml(yaml: &str) -> LocalizationResult<Self> {
        let noise: MotionNoise = serde_yaml::from_str(yaml)?;
        noise.validate()?;
        Ok(noise)
    }

    pub fn to_yaml(&self) -> LocalizationResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Load from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> LocalizationResult<Self> {
        let yaml = fs::read_to_string(path)?;
        Self::from_yaml(&yaml)
    }

    /// Load from a YAML file, falling back to the defaults on any failure
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(noise) => {
                info!(path = %path.display(), ?noise, "motion noise loaded");
                noise
            }
            Err(e) => {
                let noise = Self::default();
                warn!(path = %path.display(), error = %e, ?noise, "failed to load motion noise, using defaults");
                noise
            }
        }
    }

    /// Write to a YAML file, creating parent directories as needed
    pub fn save<P: AsRef<Path>>(&self, path: P) -> LocalizationResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, self.to_yaml()?)?;
        Ok(())
    }
}
