//! Particle/VFX System
//!
//! Short-lived fire and confetti particles plus the glitch effect. Every
//! particle lives for a whole number of ticks: with decay `d` it is removed
//! on exactly the `ceil(1/d)`-th tick after it was spawned.

use glam::Vec3;
use palette::Srgb;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::audio::EnergyFrame;
use crate::avatar::{color_from_hex, color_from_hue};
use crate::{CoreError, Result};

/// Particle flavor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticleKind {
    /// Fast upward spark
    Fire,
    /// Slow-falling spinning paper
    Confetti,
}

/// Explicit effect requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VfxTrigger {
    /// Burst of fire along the stage front
    Fire,
    /// Confetti rain above the floor
    Confetti,
    /// Timed camera shake and red tint
    Glitch,
}

/// One live particle
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    /// World position
    pub position: Vec3,
    /// Movement per tick
    pub velocity: Vec3,
    /// Euler rotation
    pub rotation: Vec3,
    /// Rotation per tick (confetti only)
    pub rotation_velocity: Vec3,
    /// Remaining life in `[0, 1]`; also the render opacity
    pub remaining_life: f32,
    /// Flavor
    pub kind: ParticleKind,
    /// Color
    pub color: Srgb,
    age: u32,
}

impl Particle {
    /// Ticks since spawn
    pub fn age(&self) -> u32 {
        self.age
    }

    /// Render opacity
    pub fn opacity(&self) -> f32 {
        self.remaining_life
    }
}

/// Particle and glitch tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleConfig {
    /// Life lost per tick, in (0, 1]
    pub decay: f32,
    /// Downward acceleration on confetti per tick
    pub gravity: f32,
    /// Particles per fire trigger
    pub fire_burst: usize,
    /// Particles per confetti trigger
    pub confetti_burst: usize,
    /// Chance per peak tick of an extra fire particle
    pub peak_burst_chance: f64,
    /// Length of the glitch effect in ticks
    pub glitch_ticks: u32,
    /// Maximum camera offset per axis while glitching
    pub glitch_jitter: f32,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            decay: 0.015,
            gravity: 0.015,
            fire_burst: 30,
            confetti_burst: 150,
            peak_burst_chance: 0.1,
            glitch_ticks: 200,
            glitch_jitter: 6.0,
        }
    }
}

impl ParticleConfig {
    /// Validate ranges
    pub fn validate(&self) -> Result<()> {
        if !(self.decay > 0.0 && self.decay <= 1.0) {
            return Err(CoreError::InvalidConfig(
                "particle decay must be in (0, 1]".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.peak_burst_chance) {
            return Err(CoreError::InvalidConfig(
                "peak_burst_chance must be between 0.0 and 1.0".to_string(),
            ));
        }
        if !(self.glitch_jitter >= 0.0) {
            return Err(CoreError::InvalidConfig(
                "glitch_jitter must not be negative".to_string(),
            ));
        }
        Ok(())
    }

    /// Ticks a particle lives with this decay
    pub fn lifetime_ticks(&self) -> u32 {
        ((1.0 / self.decay as f64).ceil() as u32).max(1)
    }
}

/// Timed camera shake and background tint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GlitchEffect {
    remaining_ticks: u32,
}

impl GlitchEffect {
    /// Restart the countdown
    pub fn start(&mut self, ticks: u32) {
        self.remaining_ticks = ticks;
    }

    /// Whether the effect is showing
    pub fn is_active(&self) -> bool {
        self.remaining_ticks > 0
    }

    /// Ticks left
    pub fn remaining_ticks(&self) -> u32 {
        self.remaining_ticks
    }

    fn countdown(&mut self) {
        self.remaining_ticks = self.remaining_ticks.saturating_sub(1);
    }
}

/// Per-tick perturbation while a glitch is active
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlitchFrame {
    /// Offset to add to the camera position
    pub camera_offset: Vec3,
    /// Background color for this tick
    pub background: Srgb,
}

/// Background color outside of glitches
pub const BACKGROUND: u32 = 0x000001;

/// Owns every live particle and the glitch countdown
#[derive(Debug, Clone)]
pub struct ParticleSystem {
    config: ParticleConfig,
    lifetime_ticks: u32,
    particles: Vec<Particle>,
    glitch: GlitchEffect,
    rng: StdRng,
}

impl ParticleSystem {
    /// Create a system; a seed makes spawn scatter reproducible
    pub fn new(config: ParticleConfig, seed: Option<u64>) -> Result<Self> {
        config.validate()?;
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Ok(Self {
            lifetime_ticks: config.lifetime_ticks(),
            config,
            particles: Vec::new(),
            glitch: GlitchEffect::default(),
            rng,
        })
    }

    /// Live particles
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Number of live particles
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    /// Whether no particle is alive
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Glitch state
    pub fn glitch(&self) -> &GlitchEffect {
        &self.glitch
    }

    /// Spawn one particle at `origin`
    pub fn spawn(&mut self, kind: ParticleKind, origin: Vec3, color: Srgb) {
        let rng = &mut self.rng;
        let lateral = |rng: &mut StdRng| (rng.random::<f32>() - 0.5) * 1.2;

        let vx = lateral(rng);
        let vy = match kind {
            ParticleKind::Fire => 1.8,
            ParticleKind::Confetti => rng.random::<f32>() * 0.8 + 0.6,
        };
        let vz = lateral(rng);
        let rotation_velocity = Vec3::new(
            rng.random::<f32>() * 0.4,
            rng.random::<f32>() * 0.4,
            rng.random::<f32>() * 0.4,
        );

        self.particles.push(Particle {
            position: origin,
            velocity: Vec3::new(vx, vy, vz),
            rotation: Vec3::ZERO,
            rotation_velocity,
            remaining_life: 1.0,
            kind,
            color,
            age: 0,
        });
    }

    /// Run an explicit effect
    pub fn trigger(&mut self, trigger: VfxTrigger) {
        match trigger {
            VfxTrigger::Fire => {
                let color = color_from_hex(0xff6600);
                for _ in 0..self.config.fire_burst {
                    let origin = self.stage_front();
                    self.spawn(ParticleKind::Fire, origin, color);
                }
            }
            VfxTrigger::Confetti => {
                for _ in 0..self.config.confetti_burst {
                    let origin = Vec3::new(
                        (self.rng.random::<f32>() - 0.5) * 250.0,
                        80.0,
                        (self.rng.random::<f32>() - 0.5) * 150.0,
                    );
                    let color = color_from_hue(self.rng.random::<f32>(), 0.6);
                    self.spawn(ParticleKind::Confetti, origin, color);
                }
            }
            VfxTrigger::Glitch => self.glitch.start(self.config.glitch_ticks),
        }
        debug!("VFX {:?}: {} particles live", trigger, self.particles.len());
    }

    fn stage_front(&mut self) -> Vec3 {
        Vec3::new((self.rng.random::<f32>() - 0.5) * 120.0, 5.0, -35.0)
    }

    /// Advance one tick
    ///
    /// Moves and ages particles, maybe adds a peak spark, and returns the
    /// glitch perturbation for this tick while the effect is active.
    pub fn tick(&mut self, energy: &EnergyFrame) -> Option<GlitchFrame> {
        let decay = self.config.decay as f64;
        let gravity = self.config.gravity;
        let lifetime = self.lifetime_ticks;

        self.particles.retain_mut(|p| {
            p.age += 1;
            if p.age >= lifetime {
                return false;
            }
            p.position += p.velocity;
            if p.kind == ParticleKind::Confetti {
                p.velocity.y -= gravity;
                p.rotation += p.rotation_velocity;
            }
            p.remaining_life = (1.0 - p.age as f64 * decay).max(0.0) as f32;
            true
        });

        if energy.peak && self.rng.random_bool(self.config.peak_burst_chance) {
            let origin = self.stage_front();
            self.spawn(ParticleKind::Fire, origin, color_from_hex(0xffaa00));
        }

        if !self.glitch.is_active() {
            return None;
        }
        let jitter = self.config.glitch_jitter;
        let frame = GlitchFrame {
            camera_offset: Vec3::new(
                (self.rng.random::<f32>() - 0.5) * 2.0 * jitter,
                (self.rng.random::<f32>() - 0.5) * 2.0 * jitter,
                0.0,
            ),
            background: Srgb::new(self.rng.random::<f32>() * 0.2, 0.0, 0.0),
        };
        self.glitch.countdown();
        Some(frame)
    }

    /// Drop all particles and stop any glitch
    pub fn clear(&mut self) {
        self.particles.clear();
        self.glitch = GlitchEffect::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn system(config: ParticleConfig) -> ParticleSystem {
        ParticleSystem::new(config, Some(42)).unwrap()
    }

    #[test]
    fn test_spawn_velocity_ranges() {
        let mut particles = system(ParticleConfig::default());
        for _ in 0..200 {
            particles.spawn(ParticleKind::Fire, Vec3::ZERO, color_from_hex(0xff6600));
            particles.spawn(ParticleKind::Confetti, Vec3::ZERO, color_from_hex(0xffffff));
        }
        for p in particles.particles() {
            assert!(p.velocity.x.abs() <= 0.6 && p.velocity.z.abs() <= 0.6);
            assert_eq!(p.remaining_life, 1.0);
            match p.kind {
                ParticleKind::Fire => assert_eq!(p.velocity.y, 1.8),
                ParticleKind::Confetti => assert!((0.6..1.4).contains(&p.velocity.y)),
            }
            assert!(p.rotation_velocity.max_element() < 0.4);
            assert!(p.rotation_velocity.min_element() >= 0.0);
        }
    }

    #[test]
    fn test_default_lifetime() {
        // 1 / 0.015 = 66.67
        assert_eq!(ParticleConfig::default().lifetime_ticks(), 67);
    }

    #[test]
    fn test_confetti_falls_and_spins() {
        let mut particles = system(ParticleConfig::default());
        particles.spawn(ParticleKind::Confetti, Vec3::new(0.0, 80.0, 0.0), color_from_hex(0xffffff));
        let vy0 = particles.particles()[0].velocity.y;

        particles.tick(&EnergyFrame::SILENT);
        let p = &particles.particles()[0];
        assert!((p.position.y - (80.0 + vy0)).abs() < 1e-5);
        assert!((p.velocity.y - (vy0 - 0.015)).abs() < 1e-6);
        assert_eq!(p.rotation, p.rotation_velocity);
        assert!((p.opacity() - 0.985).abs() < 1e-6);
    }

    #[test]
    fn test_fire_keeps_velocity() {
        let mut particles = system(ParticleConfig::default());
        particles.spawn(ParticleKind::Fire, Vec3::ZERO, color_from_hex(0xff6600));
        for _ in 0..10 {
            particles.tick(&EnergyFrame::SILENT);
        }
        let p = &particles.particles()[0];
        assert!((p.position.y - 18.0).abs() < 1e-4);
        assert_eq!(p.rotation, Vec3::ZERO);
    }

    #[test]
    fn test_trigger_bursts() {
        let mut particles = system(ParticleConfig::default());
        particles.trigger(VfxTrigger::Fire);
        assert_eq!(particles.len(), 30);
        assert!(particles
            .particles()
            .iter()
            .all(|p| p.position.z == -35.0 && p.position.x.abs() <= 60.0));

        particles.trigger(VfxTrigger::Confetti);
        assert_eq!(particles.len(), 180);
        assert_eq!(
            particles
                .particles()
                .iter()
                .filter(|p| p.kind == ParticleKind::Confetti && p.position.y == 80.0)
                .count(),
            150
        );
    }

    #[test]
    fn test_glitch_countdown() {
        let config = ParticleConfig {
            glitch_ticks: 5,
            ..Default::default()
        };
        let mut particles = system(config);
        particles.trigger(VfxTrigger::Glitch);
        assert!(particles.glitch().is_active());
        assert!(particles.is_empty());

        for _ in 0..5 {
            let frame = particles.tick(&EnergyFrame::SILENT).unwrap();
            assert!(frame.camera_offset.x.abs() <= 6.0);
            assert!(frame.background.red <= 0.2);
            assert_eq!(frame.background.green, 0.0);
        }
        assert!(!particles.glitch().is_active());
        assert!(particles.tick(&EnergyFrame::SILENT).is_none());
    }

    #[test]
    fn test_peak_burst_probability() {
        let always = ParticleConfig {
            peak_burst_chance: 1.0,
            ..Default::default()
        };
        let mut particles = system(always);
        let peak = EnergyFrame {
            bass: 0.95,
            peak: true,
            ..Default::default()
        };
        particles.tick(&peak);
        assert_eq!(particles.len(), 1);
        assert_eq!(particles.particles()[0].kind, ParticleKind::Fire);

        particles.tick(&EnergyFrame::SILENT);
        assert_eq!(particles.len(), 1);

        let never = ParticleConfig {
            peak_burst_chance: 0.0,
            ..Default::default()
        };
        let mut particles = system(never);
        for _ in 0..100 {
            particles.tick(&peak);
        }
        assert!(particles.is_empty());
    }

    #[test]
    fn test_invalid_decay_rejected() {
        for decay in [0.0, -0.5, 1.5, f32::NAN] {
            let config = ParticleConfig {
                decay,
                ..Default::default()
            };
            assert!(ParticleSystem::new(config, None).is_err());
        }
    }

    #[test]
    fn test_clear() {
        let mut particles = system(ParticleConfig::default());
        particles.trigger(VfxTrigger::Fire);
        particles.trigger(VfxTrigger::Glitch);
        particles.clear();
        assert!(particles.is_empty());
        assert!(!particles.glitch().is_active());
    }
}
