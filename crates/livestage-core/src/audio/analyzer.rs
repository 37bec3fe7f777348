//! Spectrum Analyzer - PCM to byte magnitude spectrum
//!
//! Produces the same kind of data a browser analyser node hands to the
//! engine: Blackman-windowed FFT magnitudes, smoothed over time, mapped from a
//! decibel range onto 0-255. Used by the simulator and by native hosts that
//! have PCM but no analysis facility of their own.

use num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, trace};

use super::SpectrumSource;
use crate::{CoreError, Result};

/// Configuration for [`SpectrumAnalyzer`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectrumAnalyzerConfig {
    /// FFT size (power of 2); the spectrum has half as many bins
    pub fft_size: usize,
    /// Time smoothing between successive frames (0.0 - 1.0)
    pub smoothing: f32,
    /// Decibel level mapped to byte 0
    pub min_decibels: f32,
    /// Decibel level mapped to byte 255
    pub max_decibels: f32,
}

impl Default for SpectrumAnalyzerConfig {
    fn default() -> Self {
        Self {
            fft_size: 2048,
            smoothing: 0.8,
            min_decibels: -100.0,
            max_decibels: -30.0,
        }
    }
}

impl SpectrumAnalyzerConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !self.fft_size.is_power_of_two() || self.fft_size < 32 {
            return Err(CoreError::InvalidConfig(format!(
                "fft_size must be a power of two >= 32, got {}",
                self.fft_size
            )));
        }
        if !(0.0..=1.0).contains(&self.smoothing) {
            return Err(CoreError::InvalidConfig(
                "smoothing must be between 0.0 and 1.0".to_string(),
            ));
        }
        if self.min_decibels >= self.max_decibels {
            return Err(CoreError::InvalidConfig(
                "min_decibels must be below max_decibels".to_string(),
            ));
        }
        Ok(())
    }
}

/// Streaming analyzer holding the most recent FFT window of samples
pub struct SpectrumAnalyzer {
    /// FFT instance
    fft: Arc<dyn Fft<f32>>,

    /// Configuration
    config: SpectrumAnalyzerConfig,

    /// Input sample ring buffer
    input_buffer: Vec<f32>,

    /// Write position in ring buffer
    buffer_write_pos: usize,

    /// FFT complex buffer
    fft_buffer: Vec<Complex<f32>>,

    /// FFT scratch buffer
    scratch_buffer: Vec<Complex<f32>>,

    /// Blackman window coefficients
    window: Vec<f32>,

    /// Time-smoothed linear magnitudes
    smoothed_magnitudes: Vec<f32>,

    /// Byte spectrum handed to consumers
    byte_magnitudes: Vec<u8>,

    /// Set once at least one frame has been analyzed
    has_frame: bool,

    /// Debug: analyzed frame count
    frame_count: u64,
}

impl SpectrumAnalyzer {
    /// Create a new analyzer
    pub fn new(config: SpectrumAnalyzerConfig) -> Result<Self> {
        config.validate()?;

        let fft_size = config.fft_size;
        let half_size = fft_size / 2;

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);

        debug!(
            "SpectrumAnalyzer created: fft_size={}, smoothing={}",
            fft_size, config.smoothing
        );

        Ok(Self {
            fft,
            input_buffer: vec![0.0; fft_size],
            buffer_write_pos: 0,
            fft_buffer: vec![Complex::new(0.0, 0.0); fft_size],
            scratch_buffer: vec![Complex::new(0.0, 0.0); fft_size],
            window: Self::blackman_window(fft_size),
            smoothed_magnitudes: vec![0.0; half_size],
            byte_magnitudes: vec![0; half_size],
            has_frame: false,
            frame_count: 0,
            config,
        })
    }

    fn blackman_window(size: usize) -> Vec<f32> {
        let alpha = 0.16f32;
        let a0 = 0.5 * (1.0 - alpha);
        let a1 = 0.5;
        let a2 = 0.5 * alpha;
        (0..size)
            .map(|i| {
                let x = i as f32 / size as f32;
                let tau = 2.0 * std::f32::consts::PI;
                a0 - a1 * (tau * x).cos() + a2 * (2.0 * tau * x).cos()
            })
            .collect()
    }

    /// Push PCM samples into the analysis window
    pub fn push_samples(&mut self, samples: &[f32]) {
        for &sample in samples {
            // Non-finite input is treated as silence
            let sample = if sample.is_finite() { sample } else { 0.0 };
            self.input_buffer[self.buffer_write_pos] = sample;
            self.buffer_write_pos = (self.buffer_write_pos + 1) % self.config.fft_size;
        }
    }

    /// Analyze the current window and refresh the byte spectrum
    ///
    /// Call once per render tick, like reading an analyser node.
    pub fn analyze(&mut self) -> &[u8] {
        let size = self.config.fft_size;
        self.frame_count += 1;

        // Oldest sample sits at the write position
        for i in 0..size {
            let src_idx = (self.buffer_write_pos + i) % size;
            self.fft_buffer[i] = Complex::new(self.input_buffer[src_idx] * self.window[i], 0.0);
        }

        self.fft
            .process_with_scratch(&mut self.fft_buffer, &mut self.scratch_buffer);

        let tau = self.config.smoothing;
        let range = self.config.max_decibels - self.config.min_decibels;
        let scale = 1.0 / size as f32;

        for (i, smoothed) in self.smoothed_magnitudes.iter_mut().enumerate() {
            let magnitude = self.fft_buffer[i].norm() * scale;
            *smoothed = tau * *smoothed + (1.0 - tau) * magnitude;

            let db = if *smoothed > 0.0 {
                20.0 * smoothed.log10()
            } else {
                f32::NEG_INFINITY
            };
            let scaled = 255.0 * (db - self.config.min_decibels) / range;
            self.byte_magnitudes[i] = scaled.clamp(0.0, 255.0) as u8;
        }

        self.has_frame = true;

        if self.frame_count % 600 == 0 {
            trace!(
                "Spectrum frame #{}: first bins={:?}",
                self.frame_count,
                &self.byte_magnitudes[..4]
            );
        }

        &self.byte_magnitudes
    }

    /// Number of frequency bins
    pub fn bin_count(&self) -> usize {
        self.byte_magnitudes.len()
    }

    /// Reset all analysis state
    pub fn reset(&mut self) {
        self.input_buffer.fill(0.0);
        self.buffer_write_pos = 0;
        self.smoothed_magnitudes.fill(0.0);
        self.byte_magnitudes.fill(0);
        self.has_frame = false;
        self.frame_count = 0;

        debug!("SpectrumAnalyzer reset");
    }
}

impl SpectrumSource for SpectrumAnalyzer {
    fn frequency_data(&self) -> Option<&[u8]> {
        self.has_frame.then_some(self.byte_magnitudes.as_slice())
    }
}
