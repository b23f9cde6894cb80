//! Perception model: weighs particles by how well the observed boundary
//! points line up with the likelihood field.

use nalgebra::{Rotation2, Vector2};
use tracing::debug;

use crate::common::{DistanceField, EstimateQuality, ObservedPoint};
use crate::localization::ParticleSet;

/// Per-point error derived from the field distance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorFunction {
    /// The raw distance
    #[default]
    Distance,
    /// `1 - 10000 / (10000 + d²)`, bounded in [0, 1)
    Saturating,
}

impl ErrorFunction {
    pub fn error(&self, distance: f64) -> f64 {
        match self {
            ErrorFunction::Distance => distance,
            ErrorFunction::Saturating => 1.0 - 10000.0 / (10000.0 + distance * distance),
        }
    }
}

/// Summary of one weighing pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeighingOutcome {
    /// Total weight before normalization
    pub sum_weight: f64,
    pub point_count: usize,
    pub quality: EstimateQuality,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PerceptionModel {
    error_function: ErrorFunction,
}

impl PerceptionModel {
    pub fn new(error_function: ErrorFunction) -> Self {
        PerceptionModel { error_function }
    }

    pub fn error_function(&self) -> ErrorFunction {
        self.error_function
    }

    /// Score every particle against `points` and normalize the weights when
    /// their total is positive.
    pub fn weigh<F: DistanceField + ?Sized>(
        &self,
        particles: &mut ParticleSet,
        points: &[ObservedPoint],
        field: &F,
    ) -> WeighingOutcome {
        let num_points = points.len();

        for p in particles.iter_mut() {
            let mut err_sum = 0.0;
            if num_points > 0 {
                let rotation = Rotation2::new(p.heading.to_radians());
                let position = Vector2::new(p.x, p.y);
                for point in points {
                    let world = rotation * point.to_vector() + position;
                    err_sum += self.error_function.error(field.distance(world.x, world.y));
                }
            }

            let mut weight = if err_sum > 0.0 { 1.0 / err_sum } else { 1.0 };
            if num_points > 0 {
                weight /= num_points as f64;
            }
            p.weight = weight;
        }

        let sum_weight = particles.normalize_weights();
        let quality = if num_points > 0 && sum_weight > 0.0 {
            EstimateQuality::Informed
        } else {
            debug!(num_points, sum_weight, "perception update carried no information");
            EstimateQuality::Uninformative
        };

        WeighingOutcome { sum_weight, point_count: num_points, quality }
    }
}
