//! Periodic waveform generators driving body parts

use serde::{Deserialize, Serialize};

/// Waveform sampled at a phase in radians
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Waveform {
    /// Cubed sine; snaps through zero and lingers at the extremes
    Sharp,
    /// Dual sine blend for fluid motion
    Flow,
    /// Impulse at the crest and trough of the sine
    Strike,
    /// Sine with an isolated overshoot on every other half-cycle
    Popping,
}

impl Waveform {
    /// Sample the waveform at phase `t`
    pub fn sample(self, t: f64) -> f32 {
        let value = match self {
            Waveform::Sharp => t.sin().powi(3),
            Waveform::Flow => t.sin() * 0.8 + (t * 0.5).sin() * 0.2,
            Waveform::Strike => {
                if t.sin().abs() > 0.8 {
                    1.0
                } else {
                    0.0
                }
            }
            Waveform::Popping => {
                if (t * 2.0).sin() > 0.9 {
                    1.2
                } else {
                    t.sin()
                }
            }
        };
        value as f32
    }
}
