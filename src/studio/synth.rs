//! Preview renderer: a draft becomes a short loop of chords and a kick.

use std::f32::consts::TAU;

use crate::library::{AudioSamples, Track};

use super::draft::SongDraft;

pub const PREVIEW_SAMPLE_RATE: u32 = 22_050;

/// I - V - vi - IV, as semitone offsets from the root.
const PROGRESSION: [i32; 4] = [0, 7, 9, 5];
const BEATS_PER_BAR: u32 = 4;
const KICK_LENGTH: f32 = 0.12;

/// Root frequency (octave 4) and minor flag for a key such as "C", "F#", "Bb" or "Am".
pub(crate) fn root_frequency(key: &str) -> (f32, bool) {
    let key = key.trim();
    let minor = key.ends_with('m') && key.len() > 1;
    let name = key.trim_end_matches('m');

    let mut chars = name.chars();
    let base = match chars.next().map(|c| c.to_ascii_uppercase()) {
        Some('C') => 0,
        Some('D') => 2,
        Some('E') => 4,
        Some('F') => 5,
        Some('G') => 7,
        Some('A') => 9,
        Some('B') => 11,
        _ => 0,
    };
    let accidental = match chars.next() {
        Some('#') => 1,
        Some('b') => -1,
        _ => 0,
    };
    // Semitones from A4 (440 Hz); C4 is nine below.
    let from_a4 = base + accidental - 9;
    (440.0 * 2f32.powf(from_a4 as f32 / 12.0), minor)
}

fn semitones(freq: f32, steps: i32) -> f32 {
    freq * 2f32.powf(steps as f32 / 12.0)
}

/// Render `seconds` of mono audio for `draft`.
pub fn render_preview(draft: &SongDraft, seconds: u64) -> AudioSamples {
    let rate = PREVIEW_SAMPLE_RATE;
    let total = (rate as u64 * seconds) as usize;
    let bpm = draft.bpm.clamp(20, 300) as f32;
    let beat = 60.0 / bpm;
    let bar = beat * BEATS_PER_BAR as f32;
    let (root, minor) = root_frequency(&draft.key);
    let third = if minor { 3 } else { 4 };

    let data = (0..total)
        .map(|n| {
            let t = n as f32 / rate as f32;
            let bar_index = (t / bar) as usize % PROGRESSION.len();
            let chord_root = semitones(root, PROGRESSION[bar_index] - 12);

            let pad: f32 = [0, third, 7]
                .iter()
                .map(|&s| (TAU * semitones(chord_root, s) * t).sin())
                .sum::<f32>()
                / 3.0;

            let in_beat = t % beat;
            let kick = if in_beat < KICK_LENGTH {
                let env = 1.0 - in_beat / KICK_LENGTH;
                let sweep = 50.0 + 90.0 * env;
                (TAU * sweep * in_beat).sin() * env * env
            } else {
                0.0
            };

            (0.25 * pad + 0.5 * kick).clamp(-1.0, 1.0)
        })
        .collect();

    AudioSamples::new(1, rate, data)
}

/// A playable preview of `draft`.
pub fn draft_track(draft: &SongDraft, seconds: u64) -> Track {
    Track::new(draft.title.clone(), Some(artist(draft)), render_preview(draft, seconds))
}

/// Render `draft` again. When the deck already holds a track with the same
/// title and artist, its metadata is kept and only the audio is replaced.
pub fn rerender_track(draft: &SongDraft, seconds: u64, on_deck: Option<&Track>) -> Track {
    match on_deck {
        Some(track)
            if track.title == draft.title && track.artist.as_deref() == Some(&artist(draft)) =>
        {
            track.with_samples(render_preview(draft, seconds))
        }
        _ => draft_track(draft, seconds),
    }
}

fn artist(draft: &SongDraft) -> String {
    format!("riffline · {}", draft.style)
}
