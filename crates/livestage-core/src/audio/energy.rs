//! Spectral energy extraction
//!
//! Reduces a byte spectrum to three normalized bands and a peak flag. Band
//! boundaries are fractions of the bin count, so the same layout gives the
//! same readings at any analysis resolution.

use serde::{Deserialize, Serialize};

use super::SpectrumSource;
use crate::{CoreError, Result};

/// Per-tick energy summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EnergyFrame {
    /// Low band (0.0 - 1.0)
    pub bass: f32,
    /// Middle band (0.0 - 1.0)
    pub mid: f32,
    /// High band (0.0 - 1.0)
    pub high: f32,
    /// Strong bass transient this tick
    pub peak: bool,
}

impl EnergyFrame {
    /// Silent frame used when no audio is analyzed
    pub const SILENT: EnergyFrame = EnergyFrame {
        bass: 0.0,
        mid: 0.0,
        high: 0.0,
        peak: false,
    };
}

/// Band boundaries as fractions of the bin count, plus the peak threshold
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BandLayout {
    /// End of the bass range (exclusive)
    pub bass_end: f32,
    /// End of the mid range (exclusive)
    pub mid_end: f32,
    /// End of the high range (exclusive)
    pub high_end: f32,
    /// Normalized bass level above which a tick counts as a peak
    pub peak_threshold: f32,
}

impl Default for BandLayout {
    fn default() -> Self {
        // 25 / 250 / 1000 bins of a 1024-bin analysis
        Self {
            bass_end: 25.0 / 1024.0,
            mid_end: 250.0 / 1024.0,
            high_end: 1000.0 / 1024.0,
            peak_threshold: 220.0 / 255.0,
        }
    }
}

impl BandLayout {
    /// Check that the boundaries are increasing and within (0, 1]
    pub fn validate(&self) -> Result<()> {
        let in_range = |f: f32| f.is_finite() && f > 0.0 && f <= 1.0;
        if !(in_range(self.bass_end) && in_range(self.mid_end) && in_range(self.high_end)) {
            return Err(CoreError::InvalidConfig(
                "band boundaries must lie in (0, 1]".to_string(),
            ));
        }
        if !(self.bass_end < self.mid_end && self.mid_end < self.high_end) {
            return Err(CoreError::InvalidConfig(
                "band boundaries must be strictly increasing".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.peak_threshold) {
            return Err(CoreError::InvalidConfig(
                "peak threshold must be between 0.0 and 1.0".to_string(),
            ));
        }
        Ok(())
    }

    fn index(fraction: f32, bins: usize) -> usize {
        ((fraction * bins as f32).round() as usize).min(bins)
    }
}

/// Turns byte spectra into [`EnergyFrame`]s
#[derive(Debug, Clone)]
pub struct EnergyExtractor {
    layout: BandLayout,
}

impl EnergyExtractor {
    /// Create an extractor, rejecting invalid layouts
    pub fn new(layout: BandLayout) -> Result<Self> {
        layout.validate()?;
        Ok(Self { layout })
    }

    /// Band layout in use
    pub fn layout(&self) -> &BandLayout {
        &self.layout
    }

    /// Compute the energy frame for one spectrum snapshot
    pub fn extract(&self, bins: Option<&[u8]>) -> EnergyFrame {
        let bins = match bins {
            Some(bins) if !bins.is_empty() => bins,
            _ => return EnergyFrame::SILENT,
        };

        let n = bins.len();
        let bass_end = BandLayout::index(self.layout.bass_end, n);
        let mid_end = BandLayout::index(self.layout.mid_end, n).max(bass_end);
        let high_end = BandLayout::index(self.layout.high_end, n).max(mid_end);

        let bass = Self::band_average(&bins[..bass_end]);
        let mid = Self::band_average(&bins[bass_end..mid_end]);
        let high = Self::band_average(&bins[mid_end..high_end]);

        EnergyFrame {
            bass,
            mid,
            high,
            peak: bass > self.layout.peak_threshold,
        }
    }

    /// Poll a source and compute its energy frame
    pub fn extract_from(&self, source: &dyn SpectrumSource) -> EnergyFrame {
        self.extract(source.frequency_data())
    }

    fn band_average(range: &[u8]) -> f32 {
        if range.is_empty() {
            return 0.0;
        }
        let sum: u32 = range.iter().map(|&b| b as u32).sum();
        sum as f32 / range.len() as f32 / 255.0
    }
}

impl Default for EnergyExtractor {
    fn default() -> Self {
        Self {
            layout: BandLayout::default(),
        }
    }
}
