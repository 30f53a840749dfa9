//! Frequency analysis for the visualizer.
//!
//! Mirrors an analyser node's byte frequency data: Hann-windowed FFT,
//! magnitudes converted to decibels and mapped onto `0..=255` between
//! `MIN_DECIBELS` and `MAX_DECIBELS`.

use std::f32::consts::PI;
use std::sync::Arc;

use rustfft::{Fft, FftPlanner, num_complex::Complex};

use super::types::{BAR_RANGE, MIN_BAR_HEIGHT};

pub const MIN_DECIBELS: f32 = -100.0;
pub const MAX_DECIBELS: f32 = -30.0;

pub struct Analyser {
    fft: Arc<dyn Fft<f32>>,
    size: usize,
    window: Vec<f32>,
    buffer: Vec<Complex<f32>>,
}

impl Analyser {
    pub fn new(size: usize) -> Self {
        let size = size.max(2);
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size);
        Self {
            fft,
            size,
            window: (0..size).map(|i| hann_window(i, size)).collect(),
            buffer: vec![Complex::new(0.0, 0.0); size],
        }
    }

    /// Number of input samples consumed per analysis.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn bin_count(&self) -> usize {
        self.size / 2
    }

    /// Byte magnitudes for the first `bin_count()` bins of `samples`.
    /// Missing samples are treated as silence.
    pub fn byte_frequency_data(&mut self, samples: &[f32]) -> Vec<u8> {
        for (i, slot) in self.buffer.iter_mut().enumerate() {
            let s = samples.get(i).copied().unwrap_or(0.0);
            *slot = Complex::new(s * self.window[i], 0.0);
        }
        self.fft.process(&mut self.buffer);

        let scale = 1.0 / self.size as f32;
        self.buffer[..self.bin_count()]
            .iter()
            .map(|c| to_byte(c.norm() * scale))
            .collect()
    }
}

fn to_byte(magnitude: f32) -> u8 {
    if magnitude <= 0.0 {
        return 0;
    }
    let db = 20.0 * magnitude.log10();
    let scaled = (db - MIN_DECIBELS) / (MAX_DECIBELS - MIN_DECIBELS) * 255.0;
    scaled.clamp(0.0, 255.0) as u8
}

/// Visualizer bar height for one frequency bin value.
pub fn bar_height(value: u8) -> f32 {
    MIN_BAR_HEIGHT + (value as f32 / 255.0) * BAR_RANGE
}

/// Hann window function for FFT analysis
pub fn hann_window(index: usize, size: usize) -> f32 {
    0.5 * (1.0 - ((2.0 * PI * index as f32) / (size as f32 - 1.0)).cos())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hann_window_is_zero_at_edges_and_one_in_the_middle() {
        let size = 1024;
        assert!(hann_window(0, size).abs() < 0.01);
        assert!(hann_window(size - 1, size).abs() < 0.01);
        assert!((hann_window(size / 2, size) - 1.0).abs() < 0.01);
    }

    #[test]
    fn bar_height_spans_baseline_to_full_scale() {
        assert_eq!(bar_height(0), 2.0);
        assert!((bar_height(255) - 22.0).abs() < 1e-5);
        assert!((bar_height(51) - 6.0).abs() < 1e-5);
    }

    #[test]
    fn silence_maps_to_zero_bytes() {
        let mut analyser = Analyser::new(256);
        let data = analyser.byte_frequency_data(&[0.0; 256]);
        assert_eq!(data.len(), 128);
        assert!(data.iter().all(|&v| v == 0));
    }

    #[test]
    fn sine_peaks_at_its_bin() {
        let size = 256;
        let bin = 16;
        let samples: Vec<f32> = (0..size)
            .map(|i| 0.05 * (2.0 * PI * bin as f32 * i as f32 / size as f32).sin())
            .collect();

        let mut analyser = Analyser::new(size);
        let data = analyser.byte_frequency_data(&samples);

        let peak = data
            .iter()
            .enumerate()
            .max_by_key(|(_, v)| **v)
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak, bin);
        assert!(data[bin] > 200);
    }
}
