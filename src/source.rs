//! The volumetric audio source.
//!
//! Ties the geometry query, the proximity scheduler and the random emission
//! timer together behind a single `tick` entry point. One instance owns one
//! region; instances share nothing but the read-only settings the driver
//! passes in, so independent instances may be evaluated in parallel by the
//! driver.

use crate::config::{VolumetricSettings, VolumetricSourceDesc};
use crate::emission::EmissionTimer;
use crate::error::Result;
use crate::geometry::PolygonPrism;
use crate::math::{Pose, Vec3};
use crate::observer::{EmissionMarker, FrameObserver, PrismFrame};
use crate::playback::{PlaybackCommand, ScheduleHint};
use crate::sound::SoundAsset;
use crossbeam_channel::{Receiver, Sender, unbounded};

/// A closed polygonal region that plays a looping ambient bed along its
/// boundary (or follows the listener inside it) and fires random one-shots
/// while active.
///
/// The source does not own a thread or timer. The external driver calls
/// [`tick`](Self::tick) and is expected to honor the returned
/// [`ScheduleHint`]; playback itself happens in an external backend that
/// drains [`command_receiver`](Self::command_receiver).
pub struct VolumetricAudioSource {
    prism: PolygonPrism,
    desc: VolumetricSourceDesc,
    max_distance: f32,
    playing: bool,
    emitter_position: Vec3,
    tick_interval: f32,
    silent_logged: bool,
    emission: EmissionTimer,
    markers: Vec<EmissionMarker>,
    observer: Option<Box<dyn FrameObserver>>,
    command_sender: Sender<PlaybackCommand>,
    command_receiver: Receiver<PlaybackCommand>,
}

impl VolumetricAudioSource {
    pub fn new(prism: PolygonPrism, desc: VolumetricSourceDesc) -> Self {
        let (command_sender, command_receiver) = unbounded();
        let emitter_position = prism.pose().position;
        let mut source = Self {
            prism,
            desc,
            max_distance: 0.0,
            playing: false,
            emitter_position,
            tick_interval: 0.0,
            silent_logged: false,
            emission: EmissionTimer::new(),
            markers: Vec::new(),
            observer: None,
            command_sender,
            command_receiver,
        };
        source.update_max_distance();
        source.log_if_silent();
        source
    }

    /// Source with the default square region sized by the current settings,
    /// matching how newly placed regions start out.
    pub fn with_default_region(
        settings: &VolumetricSettings,
        pose: Pose,
        desc: VolumetricSourceDesc,
    ) -> Result<Self> {
        let prism = PolygonPrism::square(settings.default_size, pose, desc.max_height)?;
        Ok(Self::new(prism, desc))
    }

    /// Replaces the emission timer, e.g. with a seeded one for deterministic
    /// tests or replays.
    pub fn set_emission_timer(&mut self, timer: EmissionTimer) {
        self.emission = timer;
    }

    pub fn set_observer(&mut self, observer: Box<dyn FrameObserver>) {
        self.observer = Some(observer);
    }

    /// Receiver end of the playback command channel, for the audio backend.
    pub fn command_receiver(&self) -> &Receiver<PlaybackCommand> {
        &self.command_receiver
    }

    pub fn prism(&self) -> &PolygonPrism {
        &self.prism
    }

    pub fn desc(&self) -> &VolumetricSourceDesc {
        &self.desc
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Current world position of the loop emitter.
    pub fn emitter_position(&self) -> Vec3 {
        self.emitter_position
    }

    /// Effective audible radius: the loop's max-distance, or the catalog
    /// maximum when no loop is set.
    pub fn max_distance(&self) -> f32 {
        self.max_distance
    }

    pub fn emission_markers(&self) -> &[EmissionMarker] {
        &self.markers
    }

    /// Advances the source by one evaluation step.
    ///
    /// `listener` is the world position of the active listener, or `None`
    /// when no listener exists this step. Settings are re-read on every call
    /// so hot-reloaded values apply immediately.
    pub fn tick(
        &mut self,
        dt: f32,
        listener: Option<Vec3>,
        settings: &VolumetricSettings,
    ) -> ScheduleHint {
        if self.desc.is_silent() {
            return ScheduleHint::EVERY_FRAME;
        }

        self.decay_markers(dt);

        let Some(listener) = listener else {
            // No listener: cannot be inside; wind down if we were playing
            // and keep the current interval until one shows up again.
            if self.playing {
                self.stop_loop();
            }
            return ScheduleHint::after(self.tick_interval);
        };

        let result = self.prism.closest_point_and_inside(listener);

        // Inside, the emitter rides along with the listener; outside it sits
        // on the clamped closest boundary point.
        let target = if result.inside { listener } else { result.point };

        let should_play = if result.inside {
            Some(true)
        } else {
            let distance_sq = listener.distance_squared(result.point);
            let max_distance_sq = self.max_distance * self.max_distance;
            if distance_sq <= max_distance_sq {
                Some(true)
            } else if distance_sq > max_distance_sq + settings.stop_offset {
                // stop_offset is a linear margin compared against a squared
                // excess; kept as-is for compatibility with existing tuning.
                self.tick_interval = settings
                    .tick_curve
                    .eval((distance_sq - max_distance_sq).sqrt());
                Some(false)
            } else {
                // Hysteresis band between the play and stop thresholds.
                None
            }
        };

        if should_play.unwrap_or(self.playing) {
            self.tick_interval = 0.0;
            self.emitter_position = target;
            if self.desc.sound_loop.is_some() {
                if self.playing {
                    self.send(PlaybackCommand::MoveLoop { position: target });
                } else {
                    self.send(PlaybackCommand::PlayLoop { position: target });
                }
            }
            self.playing = true;

            if let Some((sound, position)) = self.emission.advance(dt, &self.desc, target) {
                log::trace!("one-shot '{}' at {position}", sound.name());
                self.markers.push(EmissionMarker {
                    position,
                    remaining: sound.duration().as_secs_f32(),
                });
                self.send(PlaybackCommand::PlayOneShot { sound, position });
            }
        } else if self.playing {
            self.stop_loop();
        }

        if let Some(observer) = self.observer.as_deref_mut() {
            let frame = PrismFrame {
                prism: &self.prism,
                playing: self.playing,
                emitter: self.emitter_position,
            };
            observer.on_frame_computed(&frame, result.point, &self.markers);
        }

        ScheduleHint::after(self.tick_interval)
    }

    /// Replaces the whole sound configuration. The audible radius is
    /// recomputed synchronously, never by the tick loop.
    pub fn reconfigure(&mut self, desc: VolumetricSourceDesc) {
        if self.playing && self.desc.sound_loop.is_some() && desc.sound_loop.is_none() {
            self.send(PlaybackCommand::StopLoop);
        }
        self.desc = desc;
        self.update_max_distance();
        self.log_if_silent();
        if self.desc.is_silent() {
            self.playing = false;
        }
    }

    /// Sets or clears the looping bed; clearing it while playing stops it.
    pub fn set_sound_loop(&mut self, sound_loop: Option<SoundAsset>) {
        let mut desc = self.desc.clone();
        desc.sound_loop = sound_loop;
        self.reconfigure(desc);
    }

    /// Replaces the one-shot catalog.
    pub fn set_random_sfx(&mut self, random_sfx: Vec<SoundAsset>) {
        let mut desc = self.desc.clone();
        desc.random_sfx = random_sfx;
        self.reconfigure(desc);
    }

    fn update_max_distance(&mut self) {
        self.max_distance = match &self.desc.sound_loop {
            Some(sound) => sound.max_distance(),
            None => self
                .desc
                .random_sfx
                .iter()
                .map(SoundAsset::max_distance)
                .fold(0.0, f32::max),
        };
    }

    fn log_if_silent(&mut self) {
        if self.desc.is_silent() {
            if !self.silent_logged {
                log::error!(
                    "no sound loop and no random SFX configured; the volumetric source stays silent"
                );
                self.silent_logged = true;
            }
        } else {
            self.silent_logged = false;
        }
    }

    fn stop_loop(&mut self) {
        if self.desc.sound_loop.is_some() {
            self.send(PlaybackCommand::StopLoop);
        }
        self.playing = false;
    }

    fn decay_markers(&mut self, dt: f32) {
        self.markers.retain_mut(|marker| {
            marker.remaining -= dt;
            marker.remaining > 0.0
        });
    }

    fn send(&self, command: PlaybackCommand) {
        // Send can only fail once the backend side is gone, which happens
        // during teardown; not worth propagating through the hot path.
        if let Err(err) = self.command_sender.send(command) {
            log::warn!("audio backend channel disconnected: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::IntervalCurve;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    fn loop_asset(max_distance: f32) -> SoundAsset {
        SoundAsset::new("bed", max_distance, Duration::from_secs(30))
    }

    fn square_source(desc: VolumetricSourceDesc) -> VolumetricAudioSource {
        // Square of side 100 at the origin: edges at +-50, ceiling at 400.
        let prism = PolygonPrism::square(100.0, Pose::identity(), 400.0).unwrap();
        let mut source = VolumetricAudioSource::new(prism, desc);
        source.set_emission_timer(EmissionTimer::seeded(1));
        source
    }

    fn settings() -> VolumetricSettings {
        VolumetricSettings {
            stop_offset: 50.0,
            tick_curve: IntervalCurve::new([(0.0, 0.0), (1000.0, 2.0)]),
            ..Default::default()
        }
    }

    fn drain(source: &VolumetricAudioSource) -> Vec<PlaybackCommand> {
        source.command_receiver().try_iter().collect()
    }

    #[test]
    fn listener_inside_snaps_emitter_to_listener() {
        let mut source =
            square_source(VolumetricSourceDesc::default().sound_loop(loop_asset(100.0)));
        let listener = Vec3::new(10.0, 5.0, -20.0);

        let hint = source.tick(0.016, Some(listener), &settings());
        assert!(source.is_playing());
        assert_eq!(hint, ScheduleHint::EVERY_FRAME);
        assert_eq!(source.emitter_position(), listener);
        assert_eq!(
            drain(&source),
            vec![PlaybackCommand::PlayLoop { position: listener }]
        );
    }

    #[test]
    fn loop_follows_boundary_then_stops_far_away() {
        let mut source =
            square_source(VolumetricSourceDesc::default().sound_loop(loop_asset(100.0)));
        let settings = settings();

        // Outside but within the audible radius: d = 90 from the x = 50 edge.
        source.tick(0.016, Some(Vec3::new(140.0, 0.0, 0.0)), &settings);
        assert!(source.is_playing());
        assert_eq!(source.emitter_position(), Vec3::new(50.0, 0.0, 0.0));

        // Still in range: the loop moves, it does not restart.
        source.tick(0.016, Some(Vec3::new(130.0, 0.0, 0.0)), &settings);

        // Far beyond the stop threshold.
        let hint = source.tick(0.016, Some(Vec3::new(250.0, 0.0, 0.0)), &settings);
        assert!(!source.is_playing());
        // Excess distance sqrt(200^2 - 100^2) = 173.2 on a 0..1000 -> 0..2 curve.
        let expected = (200.0f32 * 200.0 - 100.0 * 100.0).sqrt() / 1000.0 * 2.0;
        assert!((hint.seconds - expected).abs() < 1e-3);

        let commands = drain(&source);
        assert!(matches!(commands[0], PlaybackCommand::PlayLoop { .. }));
        assert!(matches!(commands[1], PlaybackCommand::MoveLoop { .. }));
        assert!(matches!(commands[2], PlaybackCommand::StopLoop));
    }

    #[test]
    fn hysteresis_band_keeps_playing_state() {
        // Band: squared distance in (10000, 10050], i.e. d in (100, ~100.25].
        let in_band = Vec3::new(150.1, 0.0, 0.0); // d = 100.1 from the edge
        let settings = settings();

        // Starting PLAYING stays PLAYING.
        let mut playing =
            square_source(VolumetricSourceDesc::default().sound_loop(loop_asset(100.0)));
        playing.tick(0.016, Some(Vec3::new(140.0, 0.0, 0.0)), &settings);
        assert!(playing.is_playing());
        playing.tick(0.016, Some(in_band), &settings);
        assert!(playing.is_playing());

        // Starting STOPPED stays STOPPED, and nothing was ever sent.
        let mut stopped =
            square_source(VolumetricSourceDesc::default().sound_loop(loop_asset(100.0)));
        let hint = stopped.tick(0.016, Some(in_band), &settings);
        assert!(!stopped.is_playing());
        assert!(drain(&stopped).is_empty());
        // The interval was never touched either.
        assert_eq!(hint, ScheduleHint::EVERY_FRAME);
    }

    #[test]
    fn one_shots_fire_only_while_playing() {
        let settings = settings();
        let mut source = square_source(
            VolumetricSourceDesc::default()
                .random_sfx([SoundAsset::new("chirp", 200.0, Duration::from_secs(2))])
                .delay_range(5.0, 10.0),
        );

        // Far away (max_distance = 200 from the catalog): never fires.
        for _ in 0..50 {
            source.tick(1.0, Some(Vec3::new(2000.0, 0.0, 0.0)), &settings);
        }
        assert!(drain(&source).is_empty());

        // Inside: the expired timer fires on the first active tick, without
        // any loop commands since no loop is configured.
        source.tick(0.016, Some(Vec3::ZERO), &settings);
        assert!(source.is_playing());
        let commands = drain(&source);
        assert_eq!(commands.len(), 1);
        assert!(matches!(commands[0], PlaybackCommand::PlayOneShot { .. }));
        assert_eq!(source.emission_markers().len(), 1);
    }

    #[test]
    fn absent_listener_stops_playback() {
        let mut source =
            square_source(VolumetricSourceDesc::default().sound_loop(loop_asset(100.0)));
        let settings = settings();

        source.tick(0.016, Some(Vec3::ZERO), &settings);
        assert!(source.is_playing());

        source.tick(0.016, None, &settings);
        assert!(!source.is_playing());
        let commands = drain(&source);
        assert!(matches!(commands.last(), Some(PlaybackCommand::StopLoop)));

        // Still stopped on the next listener-less tick, with nothing resent.
        source.tick(0.016, None, &settings);
        assert!(drain(&source).is_empty());
    }

    #[test]
    fn silent_source_is_inert() {
        let mut source = square_source(VolumetricSourceDesc::default());
        let hint = source.tick(0.016, Some(Vec3::ZERO), &settings());
        assert_eq!(hint, ScheduleHint::EVERY_FRAME);
        assert!(!source.is_playing());
        assert!(drain(&source).is_empty());
    }

    #[test]
    fn max_distance_prefers_the_loop_over_the_catalog() {
        let catalog = vec![
            SoundAsset::new("a", 200.0, Duration::from_secs(1)),
            SoundAsset::new("b", 150.0, Duration::from_secs(1)),
        ];
        let mut source =
            square_source(VolumetricSourceDesc::default().random_sfx(catalog));
        assert_eq!(source.max_distance(), 200.0);

        source.set_sound_loop(Some(loop_asset(300.0)));
        assert_eq!(source.max_distance(), 300.0);

        source.set_sound_loop(None);
        assert_eq!(source.max_distance(), 200.0);
    }

    #[test]
    fn clearing_the_loop_while_playing_stops_it() {
        let mut source =
            square_source(VolumetricSourceDesc::default().sound_loop(loop_asset(100.0)));
        source.tick(0.016, Some(Vec3::ZERO), &settings());
        assert!(source.is_playing());
        drain(&source);

        source.set_sound_loop(None);
        assert_eq!(drain(&source), vec![PlaybackCommand::StopLoop]);
        // Nothing left to play at all, so the source went silent.
        assert!(!source.is_playing());
    }

    #[test]
    fn markers_decay_over_time() {
        let mut source = square_source(
            VolumetricSourceDesc::default()
                .random_sfx([SoundAsset::new("blip", 200.0, Duration::from_secs(2))])
                .delay_range(100.0, 100.0),
        );
        let settings = settings();

        source.tick(0.016, Some(Vec3::ZERO), &settings);
        assert_eq!(source.emission_markers().len(), 1);

        source.tick(1.0, Some(Vec3::ZERO), &settings);
        assert_eq!(source.emission_markers().len(), 1);

        source.tick(1.5, Some(Vec3::ZERO), &settings);
        assert!(source.emission_markers().is_empty());
    }

    #[test]
    fn observer_sees_every_evaluated_frame() {
        struct Recorder(Rc<RefCell<Vec<Vec3>>>);
        impl FrameObserver for Recorder {
            fn on_frame_computed(
                &mut self,
                frame: &PrismFrame<'_>,
                closest: Vec3,
                _emissions: &[EmissionMarker],
            ) {
                assert_eq!(frame.prism.points().len(), 4);
                self.0.borrow_mut().push(closest);
            }
        }

        let closest_points = Rc::new(RefCell::new(Vec::new()));
        let mut source =
            square_source(VolumetricSourceDesc::default().sound_loop(loop_asset(100.0)));
        source.set_observer(Box::new(Recorder(closest_points.clone())));

        let settings = settings();
        source.tick(0.016, Some(Vec3::new(140.0, 0.0, 0.0)), &settings);
        source.tick(0.016, Some(Vec3::new(2000.0, 0.0, 0.0)), &settings);
        assert_eq!(closest_points.borrow().len(), 2);
        assert_eq!(closest_points.borrow()[0], Vec3::new(50.0, 0.0, 0.0));
    }

    #[test]
    fn default_region_uses_the_configured_size() {
        let settings = VolumetricSettings {
            default_size: 600.0,
            ..Default::default()
        };
        let source = VolumetricAudioSource::with_default_region(
            &settings,
            Pose::identity(),
            VolumetricSourceDesc::default().sound_loop(loop_asset(100.0)),
        )
        .unwrap();
        let result = source.prism().closest_point_and_inside(Vec3::ZERO);
        assert!(result.inside);
        assert!((result.boundary_distance - 300.0).abs() < 1e-3);
    }
}
