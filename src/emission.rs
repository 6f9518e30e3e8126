//! Randomized ambient one-shot emission.

use crate::config::VolumetricSourceDesc;
use crate::math::{Box3, Vec3};
use crate::sound::SoundAsset;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Countdown toward the next random one-shot.
///
/// Advanced only while the source is playing. When the countdown expires a
/// new delay is drawn uniformly from the configured range and a random
/// catalog entry fires at a random offset inside the emission box.
#[derive(Debug)]
pub struct EmissionTimer {
    countdown: f32,
    rng: SmallRng,
}

impl EmissionTimer {
    pub fn new() -> Self {
        Self::with_rng(SmallRng::from_os_rng())
    }

    /// Deterministic timer for tests and replays.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(SmallRng::seed_from_u64(seed))
    }

    fn with_rng(rng: SmallRng) -> Self {
        // Starts expired, so the first active tick fires immediately.
        Self {
            countdown: 0.0,
            rng,
        }
    }

    /// Seconds left until the next emission.
    pub fn countdown(&self) -> f32 {
        self.countdown
    }

    /// Advances the countdown by `dt`; returns the fired sound and its world
    /// position once the countdown expires. Does nothing with an empty
    /// catalog.
    pub fn advance(
        &mut self,
        dt: f32,
        desc: &VolumetricSourceDesc,
        emitter: Vec3,
    ) -> Option<(SoundAsset, Vec3)> {
        if desc.random_sfx.is_empty() {
            return None;
        }

        self.countdown -= dt;
        if self.countdown > 0.0 {
            return None;
        }

        let max_delay = desc.max_delay.max(desc.min_delay);
        self.countdown = self.rng.random_range(desc.min_delay..=max_delay);

        let sound = desc.random_sfx[self.rng.random_range(0..desc.random_sfx.len())].clone();
        let position = emitter
            + Vec3::Y * desc.emission_offset
            + random_point_in_box(&mut self.rng, desc.emission_box);
        Some((sound, position))
    }
}

impl Default for EmissionTimer {
    fn default() -> Self {
        Self::new()
    }
}

fn random_point_in_box(rng: &mut SmallRng, b: Box3) -> Vec3 {
    Vec3::new(
        rng.random_range(b.min.x..=b.max.x),
        rng.random_range(b.min.y..=b.max.y),
        rng.random_range(b.min.z..=b.max.z),
    )
}
