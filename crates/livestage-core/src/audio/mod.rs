//! Audio input for the show engine
//!
//! The engine never decodes audio. It polls a byte-magnitude spectrum from a
//! [`SpectrumSource`] once per tick and reduces it to an [`EnergyFrame`].

pub mod analyzer;
pub mod energy;

pub use analyzer::{SpectrumAnalyzer, SpectrumAnalyzerConfig};
pub use energy::{BandLayout, EnergyExtractor, EnergyFrame};

/// Polled snapshot of frequency-bin magnitudes (0-255 per bin)
pub trait SpectrumSource {
    /// Latest magnitudes, or `None` while no audio is being analyzed
    fn frequency_data(&self) -> Option<&[u8]>;
}

impl SpectrumSource for Vec<u8> {
    fn frequency_data(&self) -> Option<&[u8]> {
        Some(self.as_slice())
    }
}

impl<T: SpectrumSource> SpectrumSource for Option<T> {
    fn frequency_data(&self) -> Option<&[u8]> {
        self.as_ref().and_then(|source| source.frequency_data())
    }
}
