//! Light rig and stage dynamics
//!
//! Spotlights, lasers and orbital rings driven by the energy frame, plus the
//! lifting stage platform the performers stand on. The cheer counter scales
//! spotlight intensity through a logarithmic crowd factor.

use glam::Vec3;
use palette::Srgb;
use serde::{Deserialize, Serialize};

use crate::audio::EnergyFrame;
use crate::avatar::color_from_hue;
use crate::{CoreError, Result};

/// Light rig tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingConfig {
    /// Number of spotlights
    pub spot_count: usize,
    /// Number of lasers
    pub laser_count: usize,
    /// Number of orbital rings
    pub ring_count: usize,
    /// Spot intensity with no bass
    pub spot_base_intensity: f32,
    /// Extra spot intensity at full bass
    pub spot_bass_gain: f32,
    /// Spot intensity on a peak tick
    pub spot_peak_intensity: f32,
    /// Crowd factor gain: intensity × `1 + gain·ln(1 + cheers)`
    pub cheer_gain: f32,
    /// Resting stage platform height
    pub stage_base_height: f32,
    /// Stage lift at full mid
    pub stage_lift: f32,
    /// Height of performer roots above the platform
    pub performer_height: f32,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            spot_count: 24,
            laser_count: 24,
            ring_count: 4,
            spot_base_intensity: 50.0,
            spot_bass_gain: 120.0,
            spot_peak_intensity: 250.0,
            cheer_gain: 0.1,
            stage_base_height: 6.0,
            stage_lift: 10.0,
            performer_height: 5.5,
        }
    }
}

impl LightingConfig {
    /// Validate gains
    pub fn validate(&self) -> Result<()> {
        if !(self.cheer_gain >= 0.0) {
            return Err(CoreError::InvalidConfig(
                "cheer_gain must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// Moving spotlight
#[derive(Debug, Clone, PartialEq)]
pub struct Spotlight {
    /// Position
    pub position: Vec3,
    /// Intensity after the crowd factor
    pub intensity: f32,
    /// Color
    pub color: Srgb,
}

/// Swinging laser beam
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Laser {
    /// Mount position
    pub position: Vec3,
    /// Swing angle around z
    pub rotation_z: f32,
    /// Beam opacity
    pub opacity: f32,
    /// Length multiplier
    pub length_scale: f32,
}

/// Spinning ring above the stage
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitalRing {
    /// Radius
    pub radius: f32,
    /// Height above the floor
    pub height: f32,
    /// Accumulated spin
    pub rotation_y: f32,
    /// Uniform scale
    pub scale: f32,
}

/// All stage lights and the platform height
#[derive(Debug, Clone)]
pub struct LightRig {
    config: LightingConfig,
    spots: Vec<Spotlight>,
    lasers: Vec<Laser>,
    rings: Vec<OrbitalRing>,
    stage_height: f32,
    crowd_factor: f32,
}

impl LightRig {
    /// Build the rig in its resting layout
    pub fn new(config: LightingConfig) -> Result<Self> {
        config.validate()?;

        let centered = |i: usize, count: usize, spacing: f32| {
            (i as f32 - (count as f32 - 1.0) / 2.0) * spacing
        };

        let spots = (0..config.spot_count)
            .map(|i| Spotlight {
                position: Vec3::new(centered(i, config.spot_count, 18.0), 180.0, -50.0),
                intensity: 80.0,
                color: Srgb::new(1.0, 1.0, 1.0),
            })
            .collect();
        let lasers = (0..config.laser_count)
            .map(|i| Laser {
                position: Vec3::new(centered(i, config.laser_count, 15.0), 300.0, -60.0),
                rotation_z: 0.0,
                opacity: 0.4,
                length_scale: 1.0,
            })
            .collect();
        let rings = (0..config.ring_count)
            .map(|i| OrbitalRing {
                radius: 100.0 + i as f32 * 25.0,
                height: 60.0 + i as f32 * 15.0,
                rotation_y: 0.0,
                scale: 1.0,
            })
            .collect();

        Ok(Self {
            stage_height: config.stage_base_height,
            config,
            spots,
            lasers,
            rings,
            crowd_factor: 1.0,
        })
    }

    /// Spotlights
    pub fn spots(&self) -> &[Spotlight] {
        &self.spots
    }

    /// Lasers
    pub fn lasers(&self) -> &[Laser] {
        &self.lasers
    }

    /// Orbital rings
    pub fn rings(&self) -> &[OrbitalRing] {
        &self.rings
    }

    /// Current platform height
    pub fn stage_height(&self) -> f32 {
        self.stage_height
    }

    /// Height performer roots should stand at
    pub fn performer_floor(&self) -> f32 {
        self.stage_height + self.config.performer_height
    }

    /// Current crowd factor
    pub fn crowd_factor(&self) -> f32 {
        self.crowd_factor
    }

    /// Intensity multiplier for a cheer count
    pub fn crowd_factor_for(&self, cheer_count: u64) -> f32 {
        1.0 + self.config.cheer_gain * (cheer_count as f32).ln_1p()
    }

    /// Advance one tick
    pub fn update(&mut self, wall_secs: f64, energy: &EnergyFrame, cheer_count: u64) {
        let t = wall_secs;
        let bass = energy.bass;

        self.stage_height = self.config.stage_base_height
            + (t * 0.6).sin() as f32 * self.config.stage_lift * energy.mid;
        self.crowd_factor = self.crowd_factor_for(cheer_count);

        let base_intensity = if energy.peak {
            self.config.spot_peak_intensity
        } else {
            self.config.spot_base_intensity + bass * self.config.spot_bass_gain
        };
        let intensity = base_intensity * self.crowd_factor;
        for (i, spot) in self.spots.iter_mut().enumerate() {
            let hue = (t * 0.04 + i as f64 * 0.06).rem_euclid(1.0) as f32;
            spot.intensity = intensity;
            spot.color = color_from_hue(hue, 0.5);
            spot.position.x = (t * 0.15 + i as f64).sin() as f32 * 200.0;
        }

        for (i, laser) in self.lasers.iter_mut().enumerate() {
            laser.rotation_z = (t * 0.6 + i as f64 * 0.5).sin() as f32 * 0.6;
            laser.opacity = energy.mid * if i % 3 == 0 { 0.3 } else { 0.9 };
            laser.length_scale = 1.0 + energy.high * 3.0;
        }

        for (i, ring) in self.rings.iter_mut().enumerate() {
            ring.rotation_y = (ring.rotation_y + (0.012 + i as f32 * 0.012) * (1.2 + bass))
                .rem_euclid(std::f32::consts::TAU);
            ring.scale = 1.0 + bass * 0.15;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rig() -> LightRig {
        LightRig::new(LightingConfig::default()).unwrap()
    }

    #[test]
    fn test_layout() {
        let rig = rig();
        assert_eq!(rig.spots().len(), 24);
        assert_eq!(rig.lasers().len(), 24);
        assert_eq!(rig.rings().len(), 4);
        assert_eq!(rig.lasers()[0].position.x, -11.5 * 15.0);
        assert_eq!(rig.rings()[3].radius, 175.0);
        assert_eq!(rig.performer_floor(), 11.5);
    }

    #[test]
    fn test_spot_intensity() {
        let mut rig = rig();
        let energy = EnergyFrame {
            bass: 0.5,
            ..Default::default()
        };
        rig.update(1.0, &energy, 0);
        assert!(rig.spots().iter().all(|s| (s.intensity - 110.0).abs() < 1e-4));

        let peak = EnergyFrame {
            bass: 0.95,
            peak: true,
            ..Default::default()
        };
        rig.update(1.0, &peak, 0);
        assert_eq!(rig.spots()[5].intensity, 250.0);
    }

    #[test]
    fn test_cheers_brighten_spots() {
        let mut rig = rig();
        rig.update(1.0, &EnergyFrame::SILENT, 0);
        let quiet = rig.spots()[0].intensity;
        rig.update(1.0, &EnergyFrame::SILENT, 1000);
        let loud = rig.spots()[0].intensity;

        let expected = 1.0 + 0.1 * (1001f32).ln();
        assert!((loud / quiet - expected).abs() < 1e-4);
        assert!(rig.crowd_factor_for(5) < rig.crowd_factor_for(6));
    }

    #[test]
    fn test_stage_lifts_with_mid() {
        let mut rig = rig();
        let t = std::f64::consts::PI / 1.2; // sin(0.6t) = 1
        rig.update(t, &EnergyFrame::SILENT, 0);
        assert!((rig.stage_height() - 6.0).abs() < 1e-5);

        let energy = EnergyFrame {
            mid: 0.5,
            ..Default::default()
        };
        rig.update(t, &energy, 0);
        assert!((rig.stage_height() - 11.0).abs() < 1e-4);
    }

    #[test]
    fn test_lasers_follow_mid_and_high() {
        let mut rig = rig();
        let energy = EnergyFrame {
            mid: 1.0,
            high: 0.5,
            ..Default::default()
        };
        rig.update(0.0, &energy, 0);
        assert_eq!(rig.lasers()[0].opacity, 0.3);
        assert_eq!(rig.lasers()[1].opacity, 0.9);
        assert_eq!(rig.lasers()[2].length_scale, 2.5);
    }

    #[test]
    fn test_rings_spin_faster_with_bass() {
        let mut calm = rig();
        let mut loud = rig();
        calm.update(0.0, &EnergyFrame::SILENT, 0);
        loud.update(
            0.0,
            &EnergyFrame {
                bass: 1.0,
                ..Default::default()
            },
            0,
        );
        assert!(loud.rings()[0].rotation_y > calm.rings()[0].rotation_y);
        assert!((loud.rings()[0].scale - 1.15).abs() < 1e-6);
    }

    #[test]
    fn test_ring_rotation_stays_wrapped() {
        let mut rig = rig();
        let loud = EnergyFrame {
            bass: 1.0,
            ..Default::default()
        };
        // Three hours at 60 fps
        for frame in 0..648_000 {
            rig.update(frame as f64 / 60.0, &loud, 0);
        }
        for ring in rig.rings() {
            assert!((0.0..=std::f32::consts::TAU).contains(&ring.rotation_y));
        }
    }
}
