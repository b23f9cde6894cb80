// Field localization demo
//
// Simulates a robot driving a loop on a rectangular field, emulates a range
// scan against the field outline and runs the particle filter on it.
//
// usage: field_localization [config.yaml] [likelihood_field.bin]

use std::env;
use std::process;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use field_localization::common::{Pixel, Pose2D, PoseEstimate, ScanSegment};
use field_localization::localization::{Localizer, LocalizerConfig, MotionDelta, Particle};
use field_localization::mapping::{FieldBitmap, FieldGeometry, LikelihoodField};
use field_localization::{LocalizationObserver, LocalizationResult, MotionNoise};

const BORDER: usize = 100;
const RAY_COUNT: usize = 12;
const RAY_LENGTH: f64 = 700.0;
const STEPS: usize = 40;

struct LogObserver;

impl LocalizationObserver for LogObserver {
    fn on_particles(&mut self, particles: &[Particle], estimate: &PoseEstimate) {
        info!(
            n = particles.len(),
            x = format_args!("{:.1}", estimate.pose.x),
            y = format_args!("{:.1}", estimate.pose.y),
            heading = format_args!("{:.1}", estimate.pose.heading),
            quality = ?estimate.quality,
            "estimate"
        );
    }

    fn on_motion_noise(&mut self, noise: &MotionNoise) {
        info!(?noise, "motion noise");
    }
}

/// Distance from a grid cell to the outline of the field rectangle
fn outline_distance(geometry: &FieldGeometry, row: usize, col: usize) -> f64 {
    let left = BORDER as f64;
    let top = BORDER as f64;
    let right = (geometry.grid_width - BORDER - 1) as f64;
    let bottom = (geometry.grid_height - BORDER - 1) as f64;
    let (r, c) = (row as f64, col as f64);

    if c >= left && c <= right && r >= top && r <= bottom {
        (c - left).min(right - c).min(r - top).min(bottom - r)
    } else {
        let dx = (left - c).max(0.0).max(c - right);
        let dy = (top - r).max(0.0).max(r - bottom);
        (dx * dx + dy * dy).sqrt()
    }
}

fn to_pixel(geometry: &FieldGeometry, x: f64, y: f64) -> Pixel {
    Pixel::new(
        (geometry.center_x as f64 + x).round() as i32,
        (geometry.center_y as f64 - y).round() as i32,
    )
}

/// Rays fanned out around the robot, in bitmap coordinates
fn emulate_scan(geometry: &FieldGeometry, pose: &Pose2D) -> Vec<ScanSegment> {
    let origin = to_pixel(geometry, pose.x, pose.y);
    (0..RAY_COUNT)
        .map(|i| {
            let theta = (pose.heading + i as f64 * 360.0 / RAY_COUNT as f64).to_radians();
            let end = Pixel::new(
                origin.x + (RAY_LENGTH * theta.cos()).round() as i32,
                origin.y - (RAY_LENGTH * theta.sin()).round() as i32,
            );
            ScanSegment::new(origin, end)
        })
        .collect()
}

fn run() -> LocalizationResult<()> {
    let args: Vec<String> = env::args().collect();
    let geometry = FieldGeometry::default();

    let mut bitmap = FieldBitmap::new(geometry.grid_width, geometry.grid_height)?;
    bitmap.draw_rect(
        Pixel::new(BORDER as i32, BORDER as i32),
        geometry.field_width as i32,
        geometry.field_height as i32,
    );

    let field = match args.get(2) {
        Some(path) => LikelihoodField::load(geometry, path)?,
        None => LikelihoodField::from_fn(geometry, |row, col| outline_distance(&geometry, row, col))?,
    };

    let config = LocalizerConfig { particle_count: 300, geometry, ..LocalizerConfig::default() };
    let mut localizer = Localizer::new(config, field, bitmap)?;
    localizer.add_observer(Box::new(LogObserver));
    if let Some(path) = args.get(1) {
        localizer.attach_config(path)?;
    }

    let mut truth = Pose2D::new(-200.0, -100.0, 0.0);
    let delta = MotionDelta::new(12.0, 0.0, 9.0);

    for step in 0..STEPS {
        let moved = field_localization::Point2D::new(delta.dx, delta.dy).rotated(truth.heading);
        truth = Pose2D::new(
            truth.x + moved.x,
            truth.y + moved.y,
            (truth.heading + delta.dheading).rem_euclid(360.0),
        );

        localizer.update_odometry(delta.dx, delta.dy, delta.dheading);
        localizer.update_pose(truth.x, truth.y, truth.heading);
        let estimate = localizer.set_scan_segments(&emulate_scan(&geometry, &truth));

        info!(
            step,
            points = localizer.observed_points().len(),
            error = format_args!("{:.1}", estimate.pose.position().distance(&truth.position())),
            "cycle"
        );
    }

    if let Some(best) = localizer.best_estimate() {
        info!(x = best.x, y = best.y, heading = best.heading, "best particle");
    }
    Ok(())
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    println!("Field localization start!!");
    if let Err(e) = run() {
        error!(error = %e, "localization demo failed");
        process::exit(1);
    }
    println!("Field localization completed!");
}
