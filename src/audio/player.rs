use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use crate::config::AudioSettings;
use crate::error::PlaybackError;

use super::output::{AudioOutput, RodioOutput};
use super::thread::spawn_audio_thread;
use super::types::{AudioCmd, PlaybackEvent, PlaybackHandle, PlaybackInfo};

/// Front end of the audio thread: commands in, shared playback info out.
pub struct AudioPlayer {
    tx: Sender<AudioCmd>,
    playback: PlaybackHandle,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl AudioPlayer {
    /// Play through the default output device.
    pub fn new(audio_settings: AudioSettings) -> Self {
        Self::with_output(RodioOutput::open_default, audio_settings, None)
    }

    /// Play through the output produced by `open_output` on the audio thread.
    pub fn with_output<O, F>(
        open_output: F,
        audio_settings: AudioSettings,
        events: Option<Sender<PlaybackEvent>>,
    ) -> Self
    where
        O: AudioOutput + 'static,
        F: FnOnce() -> Result<O, PlaybackError> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<AudioCmd>();
        let playback_info: PlaybackHandle = Arc::new(Mutex::new(PlaybackInfo::default()));

        let audio_handle = spawn_audio_thread(
            open_output,
            rx,
            playback_info.clone(),
            events,
            audio_settings,
        );

        Self {
            tx,
            playback: playback_info,
            join: Mutex::new(Some(audio_handle)),
        }
    }

    pub fn playback_handle(&self) -> PlaybackHandle {
        self.playback.clone()
    }

    pub fn send(&self, cmd: AudioCmd) -> Result<(), mpsc::SendError<AudioCmd>> {
        self.tx.send(cmd)
    }

    /// Stop playback, cancel the frame loop and wait for the audio thread.
    pub fn quit(&self) {
        let _ = self.send(AudioCmd::Quit);

        if let Ok(mut j) = self.join.lock() {
            if let Some(h) = j.take() {
                let _ = h.join();
            }
        }
    }
}

impl Drop for AudioPlayer {
    fn drop(&mut self) {
        self.quit();
    }
}
