// Particle filter localization module

pub mod config;
pub mod localizer;
pub mod motion_model;
pub mod particle;
pub mod perception;
pub mod resampling;
pub mod scan_projector;

// Re-exports
pub use config::MotionNoise;
pub use localizer::{Localizer, LocalizerConfig};
pub use motion_model::{MotionDelta, MotionModel};
pub use particle::{Particle, ParticleSet};
pub use perception::{ErrorFunction, PerceptionModel, WeighingOutcome};
pub use resampling::{
    circular_mean_deg, low_variance_draw, mean_pose, min_max_weighted_estimate, ResampleOutcome,
    ResamplingStrategy,
};
pub use scan_projector::{ScanProjector, STEEP_SLOPE_LIMIT};
