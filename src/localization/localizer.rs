//! Monte Carlo localizer on a known field
//!
//! Owns the particle set, the likelihood field and the boundary bitmap, and
//! runs the filter cycle: motion update on odometry, then scan projection,
//! weighting and resampling on every scan.

use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use crate::common::{
    EstimateQuality, LocalizationError, LocalizationObserver, LocalizationResult, ObservedPoint,
    Pose2D, PoseEstimate, ScanSegment, StateEstimator,
};
use crate::localization::{
    ErrorFunction, MotionDelta, MotionModel, MotionNoise, Particle, ParticleSet, PerceptionModel,
    ResamplingStrategy, ScanProjector,
};
use crate::mapping::{FieldBitmap, FieldGeometry, LikelihoodField};

/// Configuration for the localizer
#[derive(Debug, Clone)]
pub struct LocalizerConfig {
    /// Number of particles, fixed for the lifetime of the localizer
    pub particle_count: usize,
    /// Field extent and grid layout
    pub geometry: FieldGeometry,
    /// Initial motion noise
    pub noise: MotionNoise,
    pub resampling: ResamplingStrategy,
    pub error_function: ErrorFunction,
}

impl Default for LocalizerConfig {
    fn default() -> Self {
        Self {
            particle_count: 500,
            geometry: FieldGeometry::default(),
            noise: MotionNoise::default(),
            resampling: ResamplingStrategy::default(),
            error_function: ErrorFunction::default(),
        }
    }
}

/// Particle filter localizer
pub struct Localizer {
    config: LocalizerConfig,
    particles: ParticleSet,
    field: LikelihoodField,
    bitmap: FieldBitmap,
    motion: MotionModel,
    projector: ScanProjector,
    perception: PerceptionModel,
    reference_pose: Pose2D,
    observed_points: Vec<ObservedPoint>,
    mean_estimate: PoseEstimate,
    best_estimate: Option<Particle>,
    config_path: Option<PathBuf>,
    observers: Vec<Box<dyn LocalizationObserver>>,
    rng: StdRng,
}

impl Localizer {
    /// Create a localizer seeded from system entropy
    pub fn new(config: LocalizerConfig, field: LikelihoodField, bitmap: FieldBitmap) -> LocalizationResult<Self> {
        Self::with_rng(config, field, bitmap, StdRng::from_entropy())
    }

    /// Create a localizer with a fixed seed, for reproducible runs
    pub fn with_seed(
        config: LocalizerConfig,
        field: LikelihoodField,
        bitmap: FieldBitmap,
        seed: u64,
    ) -> LocalizationResult<Self> {
        Self::with_rng(config, field, bitmap, StdRng::seed_from_u64(seed))
    }

    fn with_rng(
        config: LocalizerConfig,
        field: LikelihoodField,
        bitmap: FieldBitmap,
        mut rng: StdRng,
    ) -> LocalizationResult<Self> {
        let geometry = config.geometry;
        if *field.geometry() != geometry {
            return Err(LocalizationError::InvalidParameter(
                "likelihood field geometry differs from the localizer geometry".to_string(),
            ));
        }
        let particles = ParticleSet::uniform(config.particle_count, &geometry, &mut rng)?;
        let motion = MotionModel::new(config.noise)?;

        info!(
            particles = config.particle_count,
            resampling = ?config.resampling,
            error_function = ?config.error_function,
            "localizer initialized"
        );

        Ok(Localizer {
            particles,
            field,
            bitmap,
            motion,
            projector: ScanProjector::new(&geometry),
            perception: PerceptionModel::new(config.error_function),
            reference_pose: Pose2D::origin(),
            observed_points: Vec::new(),
            mean_estimate: PoseEstimate::default(),
            best_estimate: None,
            config_path: None,
            observers: Vec::new(),
            rng,
            config,
        })
    }

    pub fn add_observer(&mut self, observer: Box<dyn LocalizationObserver>) {
        self.observers.push(observer);
    }

    /// Load the motion noise from a YAML store and persist future changes
    /// there. A missing or malformed file falls back to the defaults.
    pub fn attach_config<P: AsRef<Path>>(&mut self, path: P) -> LocalizationResult<()> {
        let path = path.as_ref();
        let noise = MotionNoise::load_or_default(path);
        self.motion.set_noise(noise)?;
        self.config_path = Some(path.to_path_buf());
        self.publish_noise();
        Ok(())
    }

    /// Update the live motion noise, persist it and notify observers.
    /// Nothing changes when the noise is invalid or the store cannot be written.
    pub fn set_motion_noise(&mut self, noise: MotionNoise) -> LocalizationResult<()> {
        let motion = MotionModel::new(noise)?;
        if let Some(path) = &self.config_path {
            noise.save(path)?;
        }
        self.motion = motion;
        debug!(?noise, "motion noise updated");
        self.publish_noise();
        Ok(())
    }

    pub fn motion_noise(&self) -> &MotionNoise {
        self.motion.noise()
    }

    /// Scatter the particles uniformly over the field again
    pub fn reinitialize(&mut self) -> LocalizationResult<()> {
        self.particles = ParticleSet::uniform(self.config.particle_count, &self.config.geometry, &mut self.rng)?;
        self.best_estimate = None;
        self.mean_estimate = PoseEstimate::default();
        Ok(())
    }

    /// Motion update from an odometry delta
    pub fn update_odometry(&mut self, dx: f64, dy: f64, dheading: f64) {
        self.motion.apply(&mut self.particles, &MotionDelta::new(dx, dy, dheading), &mut self.rng);
    }

    /// Set the reference pose the scan is projected from
    pub fn update_pose(&mut self, x: f64, y: f64, heading: f64) {
        self.reference_pose = Pose2D::new(x, y, heading);
    }

    /// Project a new scan against the field and run a perception cycle
    pub fn set_scan_segments(&mut self, segments: &[ScanSegment]) -> PoseEstimate {
        self.observed_points = self.projector.project(segments, &self.reference_pose, &self.bitmap);
        for observer in self.observers.iter_mut() {
            observer.on_observed_points(&self.observed_points);
        }
        let points = std::mem::take(&mut self.observed_points);
        let estimate = self.perceive(&points);
        self.observed_points = points;
        estimate
    }

    /// Weigh the particles against already-projected points, resample and
    /// publish the new generation
    pub fn perceive(&mut self, points: &[ObservedPoint]) -> PoseEstimate {
        let outcome = self.perception.weigh(&mut self.particles, points, &self.field);
        let resampled = self.config.resampling.resample(&mut self.particles, &mut self.rng);

        if resampled.best.is_some() {
            self.best_estimate = resampled.best;
        }
        self.mean_estimate = PoseEstimate::new(resampled.mean, outcome.quality);

        debug!(
            points = outcome.point_count,
            sum_weight = outcome.sum_weight,
            x = resampled.mean.x,
            y = resampled.mean.y,
            heading = resampled.mean.heading,
            informed = outcome.quality == EstimateQuality::Informed,
            "perception cycle complete"
        );

        for observer in self.observers.iter_mut() {
            observer.on_particles(&self.particles, &self.mean_estimate);
        }
        self.mean_estimate
    }

    fn publish_noise(&mut self) {
        let noise = *self.motion.noise();
        for observer in self.observers.iter_mut() {
            observer.on_motion_noise(&noise);
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn mean_estimate(&self) -> &PoseEstimate {
        &self.mean_estimate
    }

    /// Highest-weight particle of the last low-variance cycle
    pub fn best_estimate(&self) -> Option<&Particle> {
        self.best_estimate.as_ref()
    }

    pub fn observed_points(&self) -> &[ObservedPoint] {
        &self.observed_points
    }

    pub fn reference_pose(&self) -> &Pose2D {
        &self.reference_pose
    }

    pub fn field(&self) -> &LikelihoodField {
        &self.field
    }
}

impl StateEstimator for Localizer {
    type State = PoseEstimate;
    type Measurement = Vec<ScanSegment>;
    type Control = MotionDelta;

    fn predict(&mut self, control: &Self::Control) {
        self.update_odometry(control.dx, control.dy, control.dheading);
    }

    fn update(&mut self, measurement: &Self::Measurement) {
        self.set_scan_segments(measurement);
    }

    fn get_state(&self) -> &Self::State {
        &self.mean_estimate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{Pixel, Point2D};
    use approx::assert_relative_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Recorded {
        points: Vec<Vec<ObservedPoint>>,
        generations: Vec<(usize, PoseEstimate)>,
        noises: Vec<MotionNoise>,
    }

    struct Recorder(Rc<RefCell<Recorded>>);

    impl LocalizationObserver for Recorder {
        fn on_particles(&mut self, particles: &[Particle], estimate: &PoseEstimate) {
            self.0.borrow_mut().generations.push((particles.len(), *estimate));
        }

        fn on_observed_points(&mut self, points: &[ObservedPoint]) {
            self.0.borrow_mut().points.push(points.to_vec());
        }

        fn on_motion_noise(&mut self, noise: &MotionNoise) {
            self.0.borrow_mut().noises.push(*noise);
        }
    }

    const WALL_X: f64 = 400.0;

    /// 1000 x 1000 field with a single vertical boundary at world x = 400
    fn wall_field() -> (LocalizerConfig, LikelihoodField, FieldBitmap) {
        let geometry = FieldGeometry::with_border(1000, 1000, 0);
        let wall_col = (geometry.center_x as f64 + WALL_X) as usize;
        let field = LikelihoodField::from_fn(geometry, |_, col| (col as f64 - wall_col as f64).abs()).unwrap();
        let mut bitmap = FieldBitmap::new(geometry.grid_width, geometry.grid_height).unwrap();
        bitmap.draw_line(Pixel::new(wall_col as i32, 0), Pixel::new(wall_col as i32, 999));
        let config = LocalizerConfig {
            particle_count: 100,
            geometry,
            noise: MotionNoise::zero(),
            ..LocalizerConfig::default()
        };
        (config, field, bitmap)
    }

    fn localizer(seed: u64) -> Localizer {
        let (config, field, bitmap) = wall_field();
        Localizer::with_seed(config, field, bitmap, seed).unwrap()
    }

    #[test]
    fn test_initialization() {
        let loc = localizer(1);
        assert_eq!(loc.particles().len(), 100);
        assert!(!loc.mean_estimate().is_informed());
        assert!(loc.best_estimate().is_none());
    }

    #[test]
    fn test_geometry_mismatch_rejected() {
        let (config, _, bitmap) = wall_field();
        let other = LikelihoodField::from_values(FieldGeometry::with_border(2, 2, 0), &[0.0; 4]).unwrap();
        assert!(Localizer::with_seed(config, other, bitmap, 0).is_err());
    }

    #[test]
    fn test_same_seed_is_reproducible() {
        let mut a = localizer(9);
        let mut b = localizer(9);
        a.set_motion_noise(MotionNoise::default()).unwrap();
        b.set_motion_noise(MotionNoise::default()).unwrap();
        a.update_odometry(3.0, 1.0, 5.0);
        b.update_odometry(3.0, 1.0, 5.0);
        let points = [Point2D::new(10.0, 0.0)];
        assert_eq!(a.perceive(&points), b.perceive(&points));
        assert_eq!(a.particles(), b.particles());
    }

    #[test]
    fn test_end_to_end_scenario() {
        let mut loc = localizer(2024);
        let before: Vec<Particle> = loc.particles().to_vec();

        loc.update_odometry(10.0, 0.0, 0.0);
        for (p, q) in loc.particles().iter().zip(before.iter()) {
            let h = q.heading.to_radians();
            assert_relative_eq!(p.x, q.x + 10.0 * h.cos(), epsilon = 1e-9);
            assert_relative_eq!(p.y, q.y + 10.0 * h.sin(), epsilon = 1e-9);
            assert_eq!(p.heading, q.heading);
        }

        // One point at the robot's own position: particles standing on the
        // wall see a zero-distance cell.
        let mut weighed = ParticleSet::from_particles(loc.particles().to_vec()).unwrap();
        let points = [Point2D::origin()];
        let outcome = PerceptionModel::default().weigh(&mut weighed, &points, loc.field());
        assert_eq!(outcome.quality, EstimateQuality::Informed);
        assert_relative_eq!(weighed.total_weight(), 1.0, epsilon = 1e-9);

        let field = loc.field();
        let near: Vec<f64> = weighed
            .iter()
            .filter(|p| field.distance(p.x, p.y) <= 100.0)
            .map(|p| p.weight)
            .collect();
        let far: Vec<f64> = weighed
            .iter()
            .filter(|p| field.distance(p.x, p.y) >= 150.0)
            .map(|p| p.weight)
            .collect();
        assert!(!near.is_empty() && !far.is_empty());
        let min_near = near.iter().cloned().fold(f64::INFINITY, f64::min);
        let max_far = far.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        assert!(min_near > max_far);

        let estimate = loc.perceive(&points);
        assert!(estimate.is_informed());
        assert_eq!(loc.particles().len(), 100);
        for p in loc.particles() {
            assert!(weighed.iter().any(|q| q.pose() == p.pose()));
        }
        let best = loc.best_estimate().unwrap();
        assert!(weighed.iter().all(|q| q.weight <= best.weight));
    }

    #[test]
    fn test_scan_segments_publish_points_and_particles() {
        let mut loc = localizer(5);
        let record = Rc::new(RefCell::new(Recorded::default()));
        loc.add_observer(Box::new(Recorder(record.clone())));

        // robot at the world origin facing +x, ray to the right hits the wall
        loc.update_pose(0.0, 0.0, 0.0);
        let ray = ScanSegment::from(((500, 500), (999, 500)));
        let estimate = loc.set_scan_segments(&[ray]);

        assert_eq!(loc.observed_points().len(), 1);
        assert_relative_eq!(loc.observed_points()[0].x, WALL_X);
        assert_relative_eq!(loc.observed_points()[0].y, 0.0);

        let record = record.borrow();
        assert_eq!(record.points.len(), 1);
        assert_eq!(record.points[0].len(), 1);
        assert_eq!(record.generations.len(), 1);
        assert_eq!(record.generations[0], (100, estimate));
    }

    #[test]
    fn test_empty_scan_is_uninformative() {
        let mut loc = localizer(6);
        let estimate = loc.set_scan_segments(&[]);
        assert_eq!(estimate.quality, EstimateQuality::Uninformative);
        assert!(loc.observed_points().is_empty());
    }

    #[test]
    fn test_motion_noise_persisted_and_published() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let mut loc = localizer(7);
        let record = Rc::new(RefCell::new(Recorded::default()));
        loc.add_observer(Box::new(Recorder(record.clone())));

        // missing file: defaults
        loc.attach_config(&path).unwrap();
        assert_eq!(*loc.motion_noise(), MotionNoise::default());

        let noise = MotionNoise::new(0.5, 0.5, 1.0);
        loc.set_motion_noise(noise).unwrap();
        assert_eq!(*loc.motion_noise(), noise);
        assert_eq!(MotionNoise::load(&path).unwrap(), noise);
        assert_eq!(record.borrow().noises, vec![MotionNoise::default(), noise]);

        assert!(loc.set_motion_noise(MotionNoise::new(-1.0, 0.0, 0.0)).is_err());
        assert_eq!(*loc.motion_noise(), noise);
    }

    #[test]
    fn test_failed_save_keeps_live_noise() {
        let dir = tempfile::tempdir().unwrap();
        let mut loc = localizer(7);
        let record = Rc::new(RefCell::new(Recorded::default()));
        loc.add_observer(Box::new(Recorder(record.clone())));

        // a directory cannot be written as a config file
        loc.attach_config(dir.path()).unwrap();
        assert!(loc.set_motion_noise(MotionNoise::new(0.5, 0.5, 1.0)).is_err());
        assert_eq!(*loc.motion_noise(), MotionNoise::default());
        assert_eq!(record.borrow().noises, vec![MotionNoise::default()]);
    }

    #[test]
    fn test_min_max_strategy_keeps_particles() {
        let (mut config, field, bitmap) = wall_field();
        config.resampling = ResamplingStrategy::MinMaxWeighted;
        let mut loc = Localizer::with_seed(config, field, bitmap, 3).unwrap();
        let before: Vec<Pose2D> = loc.particles().iter().map(|p| p.pose()).collect();

        loc.perceive(&[Point2D::new(1.0, 0.0)]);

        let after: Vec<Pose2D> = loc.particles().iter().map(|p| p.pose()).collect();
        assert_eq!(before, after);
        assert!(loc.best_estimate().is_none());
        let max = loc.particles().iter().map(|p| p.weight).fold(0.0, f64::max);
        assert_relative_eq!(max, 1.0);
    }

    #[test]
    fn test_state_estimator_interface() {
        let mut loc = localizer(8);
        loc.predict(&MotionDelta::new(0.0, 0.0, 0.0));
        loc.update(&vec![ScanSegment::from(((500, 500), (999, 500)))]);
        assert_eq!(loc.get_state(), loc.mean_estimate());
    }
}
