//! Math types for volumetric audio.
//!
//! The vertical axis is +Y: polygons lie in the XZ plane and prisms extrude
//! along Y.

pub use glam::{Quat, Vec3};

/// World transform of a volumetric region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Pose {
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    pub fn identity() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
        }
    }

    /// Maps a point from the pose's local frame into world space.
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.rotation * point + self.position
    }

    /// Maps a world-space point into the pose's local frame.
    pub fn inverse_transform_point(&self, point: Vec3) -> Vec3 {
        self.rotation.inverse() * (point - self.position)
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

/// Axis-aligned box, used as the spawn volume for random one-shots.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Box3 {
    pub min: Vec3,
    pub max: Vec3,
}

impl Box3 {
    /// Builds a box from two corners, normalizing so `min <= max` per axis.
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Box of the given half-extent centered on the origin.
    pub fn from_extent(extent: Vec3) -> Self {
        Self::new(-extent, extent)
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) / 2.0
    }

    pub fn extent(&self) -> Vec3 {
        (self.max - self.min) / 2.0
    }
}
