use std::f32::consts::PI;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use uuid::Uuid;

use super::*;
use crate::config::AudioSettings;
use crate::error::PlaybackError;
use crate::library::{AudioSamples, Track};

#[derive(Debug, Default)]
struct DeviceState {
    clock: Duration,
    suspended: bool,
    resumes: usize,
    /// (track, offset, device suspended at start time)
    starts: Vec<(Uuid, Duration, bool)>,
    live: usize,
}

#[derive(Clone, Default)]
struct FakeDevice(Arc<Mutex<DeviceState>>);

impl FakeDevice {
    fn advance(&self, by: Duration) {
        self.0.lock().unwrap().clock += by;
    }

    fn state(&self) -> std::sync::MutexGuard<'_, DeviceState> {
        self.0.lock().unwrap()
    }
}

struct FakeOutput(FakeDevice);

struct FakeVoice {
    device: FakeDevice,
    started_at: Duration,
    length: Duration,
    stopped: bool,
}

impl Voice for FakeVoice {
    fn position(&self) -> Duration {
        let clock = self.device.state().clock;
        (clock - self.started_at).min(self.length)
    }

    fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.device.state().live -= 1;
        }
    }

    fn is_finished(&self) -> bool {
        self.position() >= self.length
    }
}

impl AudioOutput for FakeOutput {
    type Voice = FakeVoice;

    fn is_suspended(&self) -> bool {
        self.0.state().suspended
    }

    fn resume(&mut self) -> Result<(), PlaybackError> {
        let mut s = self.0.state();
        s.suspended = false;
        s.resumes += 1;
        Ok(())
    }

    fn start(&mut self, track: &Track, offset: Duration) -> Result<FakeVoice, PlaybackError> {
        let mut s = self.0.state();
        let suspended = s.suspended;
        s.starts.push((track.id, offset, suspended));
        s.live += 1;
        Ok(FakeVoice {
            device: self.0.clone(),
            started_at: s.clock,
            length: track.duration().saturating_sub(offset),
            stopped: false,
        })
    }
}

fn tone(title: &str, seconds: u32, amplitude: f32) -> Track {
    let rate = 8_000u32;
    let data = (0..rate * seconds)
        .map(|i| amplitude * (2.0 * PI * 440.0 * i as f32 / rate as f32).sin())
        .collect();
    Track::new(title, None, AudioSamples::new(1, rate, data))
}

fn wait_until(handle: &PlaybackHandle, cond: impl Fn(&PlaybackInfo) -> bool) {
    let deadline = Instant::now() + Duration::from_secs(2);
    loop {
        if cond(&*handle.lock().unwrap()) {
            return;
        }
        assert!(Instant::now() < deadline, "audio thread did not catch up");
        std::thread::sleep(Duration::from_millis(2));
    }
}

fn engine() -> (PlaybackEngine<FakeOutput>, FakeDevice, mpsc::Receiver<PlaybackEvent>) {
    let device = FakeDevice::default();
    let mut engine = PlaybackEngine::new(FakeOutput(device.clone()), &AudioSettings::default());
    let (tx, rx) = mpsc::channel();
    engine.set_event_sink(tx);
    (engine, device, rx)
}

#[test]
fn playing_a_second_track_tears_down_the_first() {
    let (mut engine, device, events) = engine();
    let a = tone("A", 5, 0.0);
    let b = tone("B", 5, 0.0);

    engine.play(a.clone()).unwrap();
    engine.play(b.clone()).unwrap();

    assert_eq!(device.state().live, 1);
    assert_eq!(engine.track().unwrap().id, b.id);
    assert_eq!(engine.session_id(), Some(2));

    let events: Vec<_> = events.try_iter().collect();
    assert!(
        events
            .iter()
            .all(|e| !matches!(e, PlaybackEvent::Ended { .. }))
    );
    assert_eq!(events.len(), 2);
}

#[test]
fn pause_then_resume_continues_at_the_paused_offset() {
    let (mut engine, device, _events) = engine();
    let track = tone("A", 10, 0.5);

    engine.play(track.clone()).unwrap();
    device.advance(Duration::from_secs(3));
    assert!(engine.frame());
    engine.pause();

    assert!(!engine.is_playing());
    assert_eq!(engine.paused_offset(), Duration::from_secs(3));
    assert_eq!(device.state().live, 0);
    assert!(engine.bars().iter().all(|&b| b == MIN_BAR_HEIGHT));
    assert!(!engine.frame());

    engine.toggle().unwrap();
    assert_eq!(device.state().starts.last().unwrap().1, Duration::from_secs(3));

    device.advance(Duration::from_secs(1));
    assert!(engine.frame());
    assert_eq!(engine.elapsed(), Duration::from_secs(4));
}

#[test]
fn replaying_the_loaded_track_resumes_but_load_restarts() {
    let (mut engine, device, _events) = engine();
    let track = tone("A", 10, 0.0);

    engine.play(track.clone()).unwrap();
    device.advance(Duration::from_secs(2));
    engine.pause();

    engine.play(track.clone()).unwrap();
    assert_eq!(device.state().starts.last().unwrap().1, Duration::from_secs(2));

    engine.load(track).unwrap();
    assert_eq!(device.state().starts.last().unwrap().1, Duration::ZERO);
    assert_eq!(device.state().live, 1);
}

#[test]
fn natural_end_fires_once_and_rewinds() {
    let (mut engine, device, events) = engine();
    let track = tone("A", 2, 0.0);

    engine.play(track).unwrap();
    device.advance(Duration::from_millis(2_500));

    assert!(!engine.frame());
    assert!(!engine.frame());
    assert!(!engine.is_playing());
    assert_eq!(engine.paused_offset(), Duration::ZERO);

    let ended = events
        .try_iter()
        .filter(|e| matches!(e, PlaybackEvent::Ended { .. }))
        .count();
    assert_eq!(ended, 1);

    engine.toggle().unwrap();
    assert_eq!(device.state().starts.last().unwrap().1, Duration::ZERO);
}

#[test]
fn manual_pause_does_not_report_an_end() {
    let (mut engine, device, events) = engine();
    engine.play(tone("A", 2, 0.0)).unwrap();
    device.advance(Duration::from_secs(1));
    engine.pause();
    device.advance(Duration::from_secs(5));
    assert!(!engine.frame());

    let events: Vec<_> = events.try_iter().collect();
    assert!(matches!(events[0], PlaybackEvent::Started { session: 1, .. }));
    assert_eq!(
        events[1],
        PlaybackEvent::Paused {
            session: 1,
            at: Duration::from_secs(1)
        }
    );
    assert_eq!(events.len(), 2);
}

#[test]
fn toggle_without_a_track_is_a_noop() {
    let (mut engine, device, _events) = engine();
    engine.toggle().unwrap();
    assert!(device.state().starts.is_empty());
    assert!(!engine.is_playing());
}

#[test]
fn suspended_output_is_resumed_before_scheduling() {
    let (mut engine, device, _events) = engine();
    device.state().suspended = true;

    engine.play(tone("A", 1, 0.0)).unwrap();

    let s = device.state();
    assert_eq!(s.resumes, 1);
    assert!(!s.starts[0].2, "voice was scheduled on a suspended device");
}

#[test]
fn visualizer_bars_follow_the_signal() {
    let (mut engine, device, _events) = engine();
    assert_eq!(engine.bars().len(), 50);

    engine.play(tone("loud", 2, 0.8)).unwrap();
    device.advance(Duration::from_millis(500));
    assert!(engine.frame());
    assert!(engine.bars().iter().any(|&b| b > MIN_BAR_HEIGHT));
    assert!(engine.bars().iter().all(|&b| (MIN_BAR_HEIGHT..=22.0).contains(&b)));

    engine.load(tone("quiet", 2, 0.0)).unwrap();
    device.advance(Duration::from_millis(500));
    assert!(engine.frame());
    assert!(engine.bars().iter().all(|&b| b == MIN_BAR_HEIGHT));
}

#[test]
fn stop_rewinds_and_drop_releases_the_session() {
    let (mut engine, device, events) = engine();
    engine.play(tone("A", 4, 0.0)).unwrap();
    device.advance(Duration::from_secs(1));
    engine.stop();

    assert_eq!(device.state().live, 0);
    assert_eq!(engine.paused_offset(), Duration::ZERO);
    assert!(events.try_iter().any(|e| e == PlaybackEvent::Stopped { session: 1 }));

    engine.toggle().unwrap();
    assert_eq!(device.state().live, 1);
    drop(engine);
    assert_eq!(device.state().live, 0);
}

#[test]
fn info_reflects_the_loaded_track() {
    let (mut engine, device, _events) = engine();
    let track = tone("Info", 3, 0.0);
    engine.play(track.clone()).unwrap();
    device.advance(Duration::from_secs(1));
    engine.frame();

    let info = engine.info();
    assert_eq!(info.track_id, Some(track.id));
    assert_eq!(info.title.as_deref(), Some("Info"));
    assert_eq!(info.elapsed, Duration::from_secs(1));
    assert_eq!(info.duration, Some(Duration::from_secs(3)));
    assert!(info.playing);
    assert_eq!(info.session, Some(1));
}

#[test]
fn audio_thread_drives_the_engine() {
    let device = FakeDevice::default();
    let dev = device.clone();
    let (tx, events) = mpsc::channel();
    let player = AudioPlayer::with_output(
        move || Ok(FakeOutput(dev)),
        AudioSettings {
            frame_ms: 2,
            ..AudioSettings::default()
        },
        Some(tx),
    );
    let handle = player.playback_handle();

    player.send(AudioCmd::Load(tone("Thread", 1, 0.0))).unwrap();
    wait_until(&handle, |info| info.playing);

    player.send(AudioCmd::TogglePlay).unwrap();
    wait_until(&handle, |info| !info.playing);

    player.send(AudioCmd::TogglePlay).unwrap();
    wait_until(&handle, |info| info.playing);

    device.advance(Duration::from_secs(2));
    wait_until(&handle, |info| !info.playing);
    assert!(
        events
            .try_iter()
            .any(|e| matches!(e, PlaybackEvent::Ended { .. }))
    );

    player.quit();
    assert_eq!(device.state().live, 0);
}

#[test]
fn missing_output_is_reported_not_fatal() {
    let player = AudioPlayer::with_output(
        || -> Result<FakeOutput, PlaybackError> {
            Err(PlaybackError::NoOutput("no device".into()))
        },
        AudioSettings::default(),
        None,
    );
    let handle = player.playback_handle();

    wait_until(&handle, |info| info.error.is_some());
    assert!(player.send(AudioCmd::TogglePlay).is_ok());
    player.quit();
}

#[test]
fn resume_is_idempotent_while_playing() {
    let (mut engine, device, _events) = engine();
    engine.resume().unwrap();
    assert!(device.state().starts.is_empty());

    engine.play(tone("A", 3, 0.0)).unwrap();
    engine.resume().unwrap();
    assert_eq!(device.state().starts.len(), 1);
    assert_eq!(engine.session_id(), Some(1));
}
