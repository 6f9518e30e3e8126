//! Configuration for volumetric audio sources.

use crate::curve::IntervalCurve;
use crate::math::{Box3, Vec3};
use crate::sound::SoundAsset;

/// Process-wide settings shared by every volumetric source.
///
/// The external driver owns these and passes them by reference on every tick,
/// so hot-reloaded values take effect immediately; sources never cache them
/// at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumetricSettings {
    /// Side length of the default square region.
    pub default_size: f32,
    /// The loop stops once the squared listener distance exceeds the squared
    /// audible radius by more than this margin.
    pub stop_offset: f32,
    /// Maps excess distance beyond the audible radius to the next tick
    /// interval.
    pub tick_curve: IntervalCurve,
}

impl Default for VolumetricSettings {
    fn default() -> Self {
        Self {
            default_size: 400.0,
            stop_offset: 500.0,
            tick_curve: IntervalCurve::default(),
        }
    }
}

/// Per-instance description of a volumetric source.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumetricSourceDesc {
    /// Looping ambient bed played while the listener is in range.
    pub sound_loop: Option<SoundAsset>,
    /// One-shot sounds fired at random around the emitter.
    pub random_sfx: Vec<SoundAsset>,
    /// Minimum delay between random one-shots, seconds.
    pub min_delay: f32,
    /// Maximum delay between random one-shots, seconds.
    pub max_delay: f32,
    /// Box in which random one-shots spawn, centered on the emitter.
    pub emission_box: Box3,
    /// Vertical offset of the emission box from the emitter.
    pub emission_offset: f32,
    /// Height of the prism ceiling above the polygon's bounding-box top.
    pub max_height: f32,
}

impl Default for VolumetricSourceDesc {
    fn default() -> Self {
        Self {
            sound_loop: None,
            random_sfx: Vec::new(),
            min_delay: 5.0,
            max_delay: 10.0,
            emission_box: Box3::from_extent(Vec3::splat(200.0)),
            emission_offset: 0.0,
            max_height: 400.0,
        }
    }
}

impl VolumetricSourceDesc {
    pub fn sound_loop(mut self, sound: SoundAsset) -> Self {
        self.sound_loop = Some(sound);
        self
    }

    pub fn random_sfx(mut self, catalog: impl IntoIterator<Item = SoundAsset>) -> Self {
        self.random_sfx = catalog.into_iter().collect();
        self
    }

    pub fn delay_range(mut self, min: f32, max: f32) -> Self {
        self.min_delay = min.max(0.0);
        self.max_delay = max.max(self.min_delay);
        self
    }

    pub fn emission_box(mut self, emission_box: Box3) -> Self {
        self.emission_box = emission_box;
        self
    }

    pub fn emission_offset(mut self, offset: f32) -> Self {
        self.emission_offset = offset;
        self
    }

    pub fn max_height(mut self, height: f32) -> Self {
        self.max_height = height.max(0.0);
        self
    }

    /// True when there is nothing this source could ever play.
    pub fn is_silent(&self) -> bool {
        self.sound_loop.is_none() && self.random_sfx.is_empty()
    }
}
