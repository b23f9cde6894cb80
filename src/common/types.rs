//! Common types used throughout field_localization

use nalgebra::{Rotation2, Vector2, Vector3};

/// 2D point representation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn origin() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    pub fn distance(&self, other: &Point2D) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn to_vector(&self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }

    /// Rotate counter-clockwise about the origin by `heading_deg` degrees
    pub fn rotated(&self, heading_deg: f64) -> Point2D {
        Rotation2::new(heading_deg.to_radians())
            .transform_vector(&self.to_vector())
            .into()
    }
}

impl From<(f64, f64)> for Point2D {
    fn from(tuple: (f64, f64)) -> Self {
        Self { x: tuple.0, y: tuple.1 }
    }
}

impl From<Vector2<f64>> for Point2D {
    fn from(v: Vector2<f64>) -> Self {
        Self { x: v[0], y: v[1] }
    }
}

/// A boundary hit expressed in the frame of the reference pose
pub type ObservedPoint = Point2D;

/// 2D pose with heading in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose2D {
    pub x: f64,
    pub y: f64,
    pub heading: f64,
}

impl Pose2D {
    pub fn new(x: f64, y: f64, heading: f64) -> Self {
        Self { x, y, heading }
    }

    pub fn origin() -> Self {
        Self { x: 0.0, y: 0.0, heading: 0.0 }
    }

    pub fn position(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }

    pub fn to_vector(&self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.heading)
    }

    pub fn heading_rad(&self) -> f64 {
        self.heading.to_radians()
    }
}

impl From<Vector3<f64>> for Pose2D {
    fn from(v: Vector3<f64>) -> Self {
        Self { x: v[0], y: v[1], heading: v[2] }
    }
}

/// Wrap a heading in degrees into [0, 360)
pub fn wrap_heading(heading: f64) -> f64 {
    let wrapped = heading.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Integer pixel in bitmap coordinates (origin top-left, y down)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pixel {
    pub x: i32,
    pub y: i32,
}

impl Pixel {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Sensor ray between two bitmap pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanSegment {
    pub start: Pixel,
    pub end: Pixel,
}

impl ScanSegment {
    pub fn new(start: Pixel, end: Pixel) -> Self {
        Self { start, end }
    }

    /// Slope in floating point, `NaN` for a zero-length segment
    pub fn slope(&self) -> f64 {
        let rise = i64::from(self.end.y) - i64::from(self.start.y);
        let run = i64::from(self.end.x) - i64::from(self.start.x);
        rise as f64 / run as f64
    }
}

impl From<((i32, i32), (i32, i32))> for ScanSegment {
    fn from(pair: ((i32, i32), (i32, i32))) -> Self {
        Self::new(Pixel::new(pair.0 .0, pair.0 .1), Pixel::new(pair.1 .0, pair.1 .1))
    }
}

/// Whether an estimate was backed by usable sensor evidence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EstimateQuality {
    /// Weights came from a scan with observed points and positive total weight
    Informed,
    /// Fallback weighting: no observed points or zero total weight
    #[default]
    Uninformative,
}

/// Pose estimate published after each perception cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseEstimate {
    pub pose: Pose2D,
    pub quality: EstimateQuality,
}

impl PoseEstimate {
    pub fn new(pose: Pose2D, quality: EstimateQuality) -> Self {
        Self { pose, quality }
    }

    pub fn is_informed(&self) -> bool {
        self.quality == EstimateQuality::Informed
    }
}

impl Default for PoseEstimate {
    fn default() -> Self {
        Self::new(Pose2D::origin(), EstimateQuality::default())
    }
}
