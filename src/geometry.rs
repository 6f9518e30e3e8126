//! Polygonal prism geometry: closest boundary point and inside
//! classification.
//!
//! A region is a closed 2-D polygon extruded vertically into a prism. The
//! single query walks every edge of the loop, keeps the globally closest
//! boundary point, and classifies the query location against the winning
//! edge's outward normal.

use crate::error::{Result, VolumetricError};
use crate::math::{Pose, Vec3};

/// Result of a closest-point query. Computed fresh per query, never cached.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosestPointResult {
    /// Emitter-facing point: vertical coordinate clamped to the prism, and
    /// when the query sits on the interior side of the winning edge the
    /// horizontal coordinates track the query.
    pub point: Vec3,
    /// Normal retained from the winning edge or corner. Corner bisectors are
    /// not unit length; only the sign of a dot product against it is
    /// meaningful.
    pub normal: Vec3,
    /// Whether the query location is inside the prism.
    pub inside: bool,
    /// Straight-line distance from the query to the nearest point on the
    /// boundary loop itself, before any vertical clamping.
    pub boundary_distance: f32,
}

/// Closed polygonal region extruded vertically into a prism.
///
/// Vertices are stored in local space as a closed loop (the last vertex
/// connects back to the first) and every segment is linear; curved
/// interpolation has no representation here and must be flattened by the
/// caller. The winding must be consistent so that `(start - end) × up`
/// points out of the region.
///
/// The prism spans from the floor of the polygon's world bounding box up to
/// its top plus `max_height`.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonPrism {
    points: Vec<Vec3>,
    pose: Pose,
    max_height: f32,
}

impl PolygonPrism {
    pub fn new(points: Vec<Vec3>, pose: Pose, max_height: f32) -> Result<Self> {
        if points.len() < 3 {
            return Err(VolumetricError::Configuration(format!(
                "polygon needs at least 3 vertices, got {}",
                points.len()
            )));
        }
        if max_height < 0.0 {
            return Err(VolumetricError::Configuration(format!(
                "prism ceiling height must be >= 0, got {max_height}"
            )));
        }
        for i in 0..points.len() {
            let next = points[(i + 1) % points.len()];
            if (next - points[i]).length_squared() <= f32::EPSILON {
                return Err(VolumetricError::Configuration(format!(
                    "zero-length edge between vertices {} and {}",
                    i,
                    (i + 1) % points.len()
                )));
            }
        }
        Ok(Self {
            points,
            pose,
            max_height,
        })
    }

    /// Default square region of the given side length, centered on `pose`.
    pub fn square(side: f32, pose: Pose, max_height: f32) -> Result<Self> {
        let half = side / 2.0;
        Self::new(
            vec![
                Vec3::new(half, 0.0, half),
                Vec3::new(-half, 0.0, half),
                Vec3::new(-half, 0.0, -half),
                Vec3::new(half, 0.0, -half),
            ],
            pose,
            max_height,
        )
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn set_pose(&mut self, pose: Pose) {
        self.pose = pose;
    }

    pub fn max_height(&self) -> f32 {
        self.max_height
    }

    /// World-space floor and ceiling of the prism.
    pub fn vertical_bounds(&self) -> (f32, f32) {
        let mut floor = f32::MAX;
        let mut top = f32::MIN;
        for &point in &self.points {
            let y = self.pose.transform_point(point).y;
            floor = floor.min(y);
            top = top.max(y);
        }
        (floor, top + self.max_height)
    }

    /// Finds the closest boundary point to a world-space query location and
    /// classifies the location as inside or outside the prism.
    pub fn closest_point_and_inside(&self, query: Vec3) -> ClosestPointResult {
        let local = self.pose.inverse_transform_point(query);
        let count = self.points.len();

        let mut best_distance_sq = f32::MAX;
        let mut best_point = Vec3::ZERO;
        let mut best_normal = Vec3::ZERO;

        for i in 0..count {
            let start = self.points[i];
            let end = self.points[(i + 1) % count];
            let segment = end - start;
            let to_point = local - start;

            let dot1 = to_point.dot(segment);
            let (candidate, normal) = if dot1 <= 0.0 {
                // Projection falls before the segment start: the closest point
                // is the start vertex, classified against the corner bisector
                // of the previous edge and this one.
                let prev = self.points[(i + count - 1) % count];
                let normal = ((start - prev).normalize_or_zero()
                    + (start - end).normalize_or_zero())
                    / 2.0;
                (start, normal)
            } else {
                let dot2 = segment.dot(segment);
                if dot2 <= dot1 {
                    // Projection falls beyond the segment end: closest point
                    // is the end vertex, bisecting this edge and the next.
                    let next = self.points[(i + 2) % count];
                    let normal = ((end - start).normalize_or_zero()
                        + (end - next).normalize_or_zero())
                        / 2.0;
                    (end, normal)
                } else {
                    // Perpendicular projection onto the segment interior; the
                    // normal is the outward horizontal normal of the edge.
                    let normal = (start - end).normalize_or_zero().cross(Vec3::Y);
                    (start + segment * (dot1 / dot2), normal)
                }
            };

            let distance_sq = candidate.distance_squared(local);
            if distance_sq < best_distance_sq {
                best_distance_sq = distance_sq;
                best_point = candidate;
                best_normal = normal;
            }
        }

        let mut point = self.pose.transform_point(best_point);
        let normal = self.pose.rotation * best_normal;
        let boundary_distance = best_distance_sq.sqrt();

        // Snap the result onto the vertical band of the prism.
        let (floor, ceiling) = self.vertical_bounds();
        let mut clamped = false;
        if query.y < floor {
            point.y = floor;
            clamped = true;
        } else if query.y > ceiling {
            point.y = ceiling;
            clamped = true;
        } else {
            point.y = query.y;
        }

        let direction = query - point;
        if direction.dot(normal) < 0.0 {
            // Interior side of the winning edge: the boundary point tracks
            // the query horizontally, so only the vertical excess remains
            // when the query is above or below the band.
            point.x = query.x;
            point.z = query.z;
            return ClosestPointResult {
                point,
                normal,
                inside: !clamped,
                boundary_distance,
            };
        }

        ClosestPointResult {
            point,
            normal,
            inside: false,
            boundary_distance,
        }
    }
}
