//! Optional visualization seam.
//!
//! A renderer or test harness can implement [`FrameObserver`] and attach it
//! to a source; the core calls it after every full evaluation and never
//! depends on it otherwise.

use crate::geometry::PolygonPrism;
use crate::math::Vec3;

/// Decaying marker for a recently fired one-shot. Purely cosmetic; the
/// countdown starts at the sound's duration and the marker disappears when
/// it runs out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmissionMarker {
    pub position: Vec3,
    /// Seconds left before the marker disappears.
    pub remaining: f32,
}

/// One vertical wall of the prism, spanning a polygon edge from the vertex
/// level up to the ceiling offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WallQuad {
    pub floor_a: Vec3,
    pub floor_b: Vec3,
    pub ceiling_a: Vec3,
    pub ceiling_b: Vec3,
}

/// Snapshot of one evaluated frame, enough to draw the region.
pub struct PrismFrame<'a> {
    pub prism: &'a PolygonPrism,
    pub playing: bool,
    pub emitter: Vec3,
}

impl PrismFrame<'_> {
    /// World-space wall quads, one per polygon edge.
    pub fn wall_quads(&self) -> impl Iterator<Item = WallQuad> + '_ {
        let points = self.prism.points();
        let pose = self.prism.pose();
        let rise = Vec3::Y * self.prism.max_height();
        (0..points.len()).map(move |i| {
            let a = pose.transform_point(points[i]);
            let b = pose.transform_point(points[(i + 1) % points.len()]);
            WallQuad {
                floor_a: a,
                floor_b: b,
                ceiling_a: a + rise,
                ceiling_b: b + rise,
            }
        })
    }
}

/// Receives one callback per evaluated frame.
pub trait FrameObserver {
    fn on_frame_computed(
        &mut self,
        frame: &PrismFrame<'_>,
        closest: Vec3,
        emissions: &[EmissionMarker],
    );
}
