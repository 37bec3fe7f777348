//! Choreography Engine
//!
//! Turns show time, per-avatar offsets and the current energy frame into
//! joint transforms. Poses are additive: a neutral pose plus waveform terms
//! scaled by energy bands. Canon styles delay each rank's phase so the
//! ensemble moves as a visible wave.

mod engine;
mod style;
mod waveform;

pub use engine::{ChoreographyConfig, ChoreographyEngine};
pub use style::{classify_song, ShowPlan, StyleKind, StylePreset};
pub use waveform::Waveform;
