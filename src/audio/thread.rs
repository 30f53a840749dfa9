use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::config::AudioSettings;
use crate::error::PlaybackError;

use super::engine::PlaybackEngine;
use super::output::AudioOutput;
use super::types::{AudioCmd, PlaybackEvent, PlaybackHandle};

/// How long the thread sleeps between commands when nothing is animating.
const IDLE_POLL: Duration = Duration::from_millis(200);

pub(super) fn spawn_audio_thread<O, F>(
    open_output: F,
    rx: Receiver<AudioCmd>,
    playback_info: PlaybackHandle,
    events: Option<Sender<PlaybackEvent>>,
    audio_settings: AudioSettings,
) -> JoinHandle<()>
where
    O: AudioOutput + 'static,
    F: FnOnce() -> Result<O, PlaybackError> + Send + 'static,
{
    thread::spawn(move || {
        let output = match open_output() {
            Ok(output) => output,
            Err(e) => {
                error!(error = %e, "audio output unavailable");
                if let Ok(mut info) = playback_info.lock() {
                    info.error = Some(e.to_string());
                }
                drain_until_quit(&rx);
                return;
            }
        };

        let mut engine = PlaybackEngine::new(output, &audio_settings);
        if let Some(tx) = events {
            engine.set_event_sink(tx);
        }
        publish(&engine, &playback_info);
        info!("audio thread ready");

        run_engine(&mut engine, &rx, &playback_info, audio_settings.frame_interval());
        engine.shutdown();
        publish(&engine, &playback_info);
        info!("audio thread exiting");
    })
}

/// Command loop. Each receive timeout while the visualizer is armed is one
/// animation frame; otherwise the thread idles until the next command.
fn run_engine<O: AudioOutput>(
    engine: &mut PlaybackEngine<O>,
    rx: &Receiver<AudioCmd>,
    playback_info: &PlaybackHandle,
    frame_interval: Duration,
) {
    loop {
        let wait = if engine.is_animating() {
            frame_interval
        } else {
            IDLE_POLL
        };

        match rx.recv_timeout(wait) {
            Ok(cmd) => {
                let result = match cmd {
                    AudioCmd::Load(track) => engine.load(track),
                    AudioCmd::Play => engine.resume(),
                    AudioCmd::TogglePlay => engine.toggle(),
                    AudioCmd::Pause => {
                        engine.pause();
                        Ok(())
                    }
                    AudioCmd::Stop => {
                        engine.stop();
                        Ok(())
                    }
                    AudioCmd::Quit => break,
                };
                if let Err(e) = result {
                    warn!(error = %e, "playback command failed");
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                engine.frame();
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }

        publish(engine, playback_info);
    }
}

fn publish<O: AudioOutput>(engine: &PlaybackEngine<O>, playback_info: &PlaybackHandle) {
    if let Ok(mut info) = playback_info.lock() {
        *info = engine.info();
    }
}

fn drain_until_quit(rx: &Receiver<AudioCmd>) {
    while let Ok(cmd) = rx.recv() {
        if matches!(cmd, AudioCmd::Quit) {
            break;
        }
    }
}
