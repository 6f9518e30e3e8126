//! Playback commands and scheduling hints.

use crate::math::Vec3;
use crate::sound::SoundAsset;

/// Commands sent to the external audio backend.
///
/// The backend drains these from the source's command channel; the core
/// never observes a result, playback is fire-and-forget.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackCommand {
    /// Start the looping ambient bed at a world position.
    PlayLoop { position: Vec3 },
    /// Stop the looping ambient bed.
    StopLoop,
    /// Move the looping bed while it keeps playing.
    MoveLoop { position: Vec3 },
    /// Fire a one-shot sound at a world position.
    PlayOneShot { sound: SoundAsset, position: Vec3 },
}

/// Requested delay before the next tick, in seconds.
///
/// The core does not own a timer; the external driver honors (or ignores)
/// this hint. Zero means "run every frame".
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScheduleHint {
    pub seconds: f32,
}

impl ScheduleHint {
    pub const EVERY_FRAME: Self = Self { seconds: 0.0 };

    pub fn after(seconds: f32) -> Self {
        Self {
            seconds: seconds.max(0.0),
        }
    }
}
