pub mod config;
pub mod curve;
pub mod emission;
pub mod error;
pub mod geometry;
pub mod math;
pub mod observer;
pub mod playback;
pub mod sound;
pub mod source;

pub use config::{VolumetricSettings, VolumetricSourceDesc};
pub use curve::{CurveKey, IntervalCurve};
pub use emission::EmissionTimer;
pub use error::{Result, VolumetricError};
pub use geometry::{ClosestPointResult, PolygonPrism};
pub use math::{Box3, Pose, Quat, Vec3};
pub use observer::{EmissionMarker, FrameObserver, PrismFrame, WallQuad};
pub use playback::{PlaybackCommand, ScheduleHint};
pub use sound::SoundAsset;
pub use source::VolumetricAudioSource;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    /// Walks a listener toward, through, and out of a region and checks the
    /// full command stream the backend would see.
    #[test]
    fn test_listener_walkthrough() {
        let _ = env_logger::builder().is_test(true).try_init();

        let settings = VolumetricSettings {
            stop_offset: 500.0,
            tick_curve: IntervalCurve::new([(0.0, 0.1), (2000.0, 1.0)]),
            ..Default::default()
        };

        // Square of side 200 at the origin, edges at +-100.
        let prism = PolygonPrism::square(200.0, Pose::identity(), 400.0).unwrap();
        let desc = VolumetricSourceDesc::default().sound_loop(SoundAsset::new(
            "forest-bed",
            300.0,
            Duration::from_secs(60),
        ));
        let mut source = VolumetricAudioSource::new(prism, desc);
        let backend = source.command_receiver().clone();

        let mut hints = Vec::new();
        for x in [
            2000.0, 1000.0, 390.0, 150.0, 0.0, -150.0, -390.0, -1000.0, -2000.0,
        ] {
            hints.push(source.tick(0.016, Some(Vec3::new(x, 10.0, 0.0)), &settings));
        }

        let commands: Vec<PlaybackCommand> = backend.try_iter().collect();
        assert!(matches!(
            commands.first(),
            Some(PlaybackCommand::PlayLoop { .. })
        ));
        assert!(matches!(commands.last(), Some(PlaybackCommand::StopLoop)));
        assert_eq!(commands.len(), 6); // play, four moves, stop

        // Distant ticks ask to be rescheduled later; active ones every frame.
        assert!(hints[0].seconds > 0.0);
        assert_eq!(hints[4].seconds, 0.0);
    }
}
