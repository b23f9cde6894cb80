//! Common traits defining interfaces for the localization stack

use crate::common::types::*;
use crate::localization::{MotionNoise, Particle};

/// Trait for recursive state estimators (particle filters, Kalman filters, ...)
pub trait StateEstimator {
    /// State type used by this estimator
    type State;
    /// Measurement type used by this estimator
    type Measurement;
    /// Control input type
    type Control;

    /// Prediction step
    fn predict(&mut self, control: &Self::Control);

    /// Update step with measurement
    fn update(&mut self, measurement: &Self::Measurement);

    /// Get current state estimate
    fn get_state(&self) -> &Self::State;
}

/// Lookup of the distance to the nearest known boundary feature
pub trait DistanceField {
    /// Distance for a world coordinate; never fails, unknown areas report a large value
    fn distance(&self, world_x: f64, world_y: f64) -> f64;
}

/// Receiver for everything the localizer publishes.
///
/// All methods have empty defaults so an observer only implements what it
/// consumes.
pub trait LocalizationObserver {
    /// Called after resampling with the new generation and the mean estimate
    fn on_particles(&mut self, _particles: &[Particle], _estimate: &PoseEstimate) {}

    /// Called after scan projection with the points shared by all particles
    fn on_observed_points(&mut self, _points: &[ObservedPoint]) {}

    /// Called whenever the motion noise is loaded or changed
    fn on_motion_noise(&mut self, _noise: &MotionNoise) {}
}
