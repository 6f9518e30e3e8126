//! Sound asset descriptors.

use std::time::Duration;
use uuid::Uuid;

/// Handle to a sound known to the external audio backend.
///
/// The core never touches sample data. It only needs the attenuation
/// max-distance to drive scheduling thresholds and the duration to time
/// visualization markers; the id lets the backend resolve the actual asset.
#[derive(Debug, Clone, PartialEq)]
pub struct SoundAsset {
    id: Uuid,
    name: String,
    max_distance: f32,
    duration: Duration,
}

impl SoundAsset {
    pub fn new(name: impl Into<String>, max_distance: f32, duration: Duration) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            max_distance: max_distance.max(0.0),
            duration,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Distance beyond which the backend attenuates this sound to silence.
    pub fn max_distance(&self) -> f32 {
        self.max_distance
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }
}
