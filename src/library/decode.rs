use std::fs::File;
use std::io::BufReader;

use rodio::{Decoder, Source};
use tracing::debug;

use crate::error::PlaybackError;

use super::model::{AudioSamples, LibraryEntry, Track};

/// Decode a library file fully into memory.
pub fn load_track(entry: &LibraryEntry) -> Result<Track, PlaybackError> {
    let file = File::open(&entry.path)?;
    let decoder = Decoder::new(BufReader::new(file))
        .map_err(|e| PlaybackError::Decode(format!("{}: {e}", entry.path.display())))?;

    let channels = decoder.channels();
    let sample_rate = decoder.sample_rate();
    let data: Vec<f32> = decoder.collect();
    if data.is_empty() {
        return Err(PlaybackError::Decode(format!(
            "{}: no audio frames",
            entry.path.display()
        )));
    }

    let audio = AudioSamples::new(channels, sample_rate, data);
    debug!(
        path = %entry.path.display(),
        channels,
        sample_rate,
        frames = audio.frames(),
        "decoded track"
    );
    Ok(Track::new(entry.title.clone(), entry.artist.clone(), audio))
}
