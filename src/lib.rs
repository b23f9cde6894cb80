//! field_localization - Monte Carlo localization on a known field
//!
//! A particle filter that tracks a robot's planar pose from odometry and
//! range scans, scoring scans against a precomputed likelihood field.

// Core modules
pub mod common;

// Field representation and the filter itself
pub mod mapping;
pub mod localization;

// Re-export common types for convenience
pub use common::{Point2D, Pose2D, Pixel, ScanSegment, ObservedPoint, PoseEstimate, EstimateQuality};
pub use common::{StateEstimator, DistanceField, LocalizationObserver};
pub use common::{LocalizationError, LocalizationResult};
pub use localization::{Localizer, LocalizerConfig, MotionNoise, Particle};
pub use mapping::{FieldBitmap, FieldGeometry, LikelihoodField};
