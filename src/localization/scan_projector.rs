//! Scan projection: turns raw scan rays into boundary points seen from the
//! reference pose.

use tracing::trace;

use crate::common::{ObservedPoint, Pixel, Point2D, Pose2D, ScanSegment};
use crate::mapping::{FieldBitmap, FieldGeometry};

/// Segments steeper than this are not rasterized
pub const STEEP_SLOPE_LIMIT: f64 = 200.0;

/// Projects scan segments against the boundary bitmap
#[derive(Debug, Clone, Copy)]
pub struct ScanProjector {
    center_x: i64,
    center_y: i64,
}

impl ScanProjector {
    pub fn new(geometry: &FieldGeometry) -> Self {
        ScanProjector { center_x: geometry.center_x, center_y: geometry.center_y }
    }

    /// True for vertical (downward) or steep segments that the rasterizer skips
    pub fn is_degenerate(segment: &ScanSegment) -> bool {
        let slope = segment.slope();
        slope == f64::NEG_INFINITY || slope > STEEP_SLOPE_LIMIT
    }

    /// Boundary hits of every segment, relative to `reference`, in segment
    /// order then walk order
    pub fn project(
        &self,
        segments: &[ScanSegment],
        reference: &Pose2D,
        bitmap: &FieldBitmap,
    ) -> Vec<ObservedPoint> {
        let mut points = Vec::new();
        for segment in segments {
            if Self::is_degenerate(segment) {
                trace!(?segment, "skipping degenerate scan segment");
                continue;
            }
            points.extend(
                bitmap
                    .walk(segment.start, segment.end)
                    .filter(|p| bitmap.is_boundary(*p))
                    .map(|p| self.to_reference_frame(p, reference)),
            );
        }
        points
    }

    /// Bitmap pixel expressed in the local axes of `reference`
    pub fn to_reference_frame(&self, pixel: Pixel, reference: &Pose2D) -> ObservedPoint {
        let dx = pixel.x as f64 - (self.center_x as f64 + reference.x);
        let dy = (self.center_y as f64 - reference.y) - pixel.y as f64;
        Point2D::new(dx, dy).rotated(-reference.heading)
    }
}
