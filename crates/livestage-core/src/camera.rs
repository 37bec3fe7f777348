//! Camera Director
//!
//! Cuts to a preset framing on a bass peak that lands inside a short periodic
//! window; otherwise drifts sideways on a slow sine while the look-at point
//! rises with bass.

use glam::{Mat4, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::audio::EnergyFrame;
use crate::{CoreError, Result};

/// Preset camera framings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Framing {
    /// Low hero shot in front of the lead
    CloseUp,
    /// Drone shot from a random side
    Wide,
    /// High overhead shot
    TopDown,
}

/// Camera director tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Starting position
    pub initial_position: [f32; 3],
    /// Period of the cut-eligible window in wall seconds
    pub cut_period_secs: f64,
    /// Width of the cut-eligible window at the start of each period
    pub cut_window_secs: f64,
    /// Chance that a cut picks the close-up
    pub close_up_chance: f32,
    /// Chance that a cut picks the wide shot
    pub wide_chance: f32,
    /// Close-up position
    pub close_up_position: [f32; 3],
    /// Half-width of the random wide shot x range
    pub wide_spread: f32,
    /// Wide shot height
    pub wide_height: f32,
    /// Wide shot depth
    pub wide_depth: f32,
    /// Top-down position
    pub top_down_position: [f32; 3],
    /// Horizontal drift amplitude
    pub drift_amplitude: f32,
    /// Drift rate in radians per wall second
    pub drift_rate: f64,
    /// Fraction of the drift gap closed per tick
    pub drift_smoothing: f32,
    /// Look-at height with no bass
    pub look_height: f32,
    /// Extra look-at height at full bass
    pub look_bass_gain: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            initial_position: [0.0, 50.0, 150.0],
            cut_period_secs: 1.2,
            cut_window_secs: 0.025,
            close_up_chance: 0.5,
            wide_chance: 0.3,
            close_up_position: [0.0, 5.0, 25.0],
            wide_spread: 125.0,
            wide_height: 100.0,
            wide_depth: 200.0,
            top_down_position: [0.0, 400.0, 80.0],
            drift_amplitude: 200.0,
            drift_rate: 0.12,
            drift_smoothing: 0.02,
            look_height: 20.0,
            look_bass_gain: 40.0,
        }
    }
}

impl CameraConfig {
    /// Validate window and probabilities
    pub fn validate(&self) -> Result<()> {
        if !(self.cut_period_secs > 0.0 && self.cut_window_secs >= 0.0) {
            return Err(CoreError::InvalidConfig(
                "camera cut period must be positive".to_string(),
            ));
        }
        let chances = [self.close_up_chance, self.wide_chance];
        if chances.iter().any(|c| !(0.0..=1.0).contains(c))
            || self.close_up_chance + self.wide_chance > 1.0
        {
            return Err(CoreError::InvalidConfig(
                "camera framing chances must be in [0, 1] and sum to at most 1".to_string(),
            ));
        }
        if !(self.drift_smoothing > 0.0 && self.drift_smoothing <= 1.0) {
            return Err(CoreError::InvalidConfig(
                "camera drift smoothing must be in (0, 1]".to_string(),
            ));
        }
        Ok(())
    }
}

/// Autonomous camera
#[derive(Debug, Clone)]
pub struct CameraDirector {
    config: CameraConfig,
    position: Vec3,
    look_at: Vec3,
    last_cut: Option<Framing>,
    rng: StdRng,
}

impl CameraDirector {
    /// Create a director; a seed makes cut choices reproducible
    pub fn new(config: CameraConfig, seed: Option<u64>) -> Result<Self> {
        config.validate()?;
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Ok(Self {
            position: Vec3::from(config.initial_position),
            look_at: Vec3::new(0.0, config.look_height, 0.0),
            last_cut: None,
            config,
            rng,
        })
    }

    /// Current position
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Current look-at point
    pub fn look_at(&self) -> Vec3 {
        self.look_at
    }

    /// Framing of the most recent cut
    pub fn last_cut(&self) -> Option<Framing> {
        self.last_cut
    }

    /// Whether a peak at this wall time may cut
    pub fn in_cut_window(&self, wall_secs: f64) -> bool {
        wall_secs.rem_euclid(self.config.cut_period_secs) < self.config.cut_window_secs
    }

    /// Advance one tick; returns the framing when a cut happened
    ///
    /// `jitter` is added after any cut and before the drift step.
    pub fn tick(
        &mut self,
        wall_secs: f64,
        energy: &EnergyFrame,
        jitter: Option<Vec3>,
    ) -> Option<Framing> {
        let cut = if energy.peak && self.in_cut_window(wall_secs) {
            let framing = self.pick_framing();
            self.position = self.framing_position(framing);
            self.last_cut = Some(framing);
            debug!("Camera cut to {:?} at {:?}", framing, self.position);
            Some(framing)
        } else {
            None
        };

        if let Some(offset) = jitter {
            self.position += offset;
        }

        let drift_target =
            (wall_secs * self.config.drift_rate).sin() as f32 * self.config.drift_amplitude;
        self.position.x += (drift_target - self.position.x) * self.config.drift_smoothing;
        self.look_at = Vec3::new(
            0.0,
            self.config.look_height + energy.bass * self.config.look_bass_gain,
            0.0,
        );

        cut
    }

    fn pick_framing(&mut self) -> Framing {
        let roll = self.rng.random::<f32>();
        if roll < self.config.close_up_chance {
            Framing::CloseUp
        } else if roll < self.config.close_up_chance + self.config.wide_chance {
            Framing::Wide
        } else {
            Framing::TopDown
        }
    }

    fn framing_position(&mut self, framing: Framing) -> Vec3 {
        match framing {
            Framing::CloseUp => Vec3::from(self.config.close_up_position),
            Framing::Wide => Vec3::new(
                (self.rng.random::<f32>() - 0.5) * 2.0 * self.config.wide_spread,
                self.config.wide_height,
                self.config.wide_depth,
            ),
            Framing::TopDown => Vec3::from(self.config.top_down_position),
        }
    }

    /// Right-handed view matrix
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.look_at, Vec3::Y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PEAK: EnergyFrame = EnergyFrame {
        bass: 0.9,
        mid: 0.0,
        high: 0.0,
        peak: true,
    };

    fn director(config: CameraConfig) -> CameraDirector {
        CameraDirector::new(config, Some(3)).unwrap()
    }

    #[test]
    fn test_cut_window() {
        let camera = director(CameraConfig::default());
        assert!(camera.in_cut_window(2.4 + 0.01));
        assert!(!camera.in_cut_window(2.4 + 0.03));
        assert!(camera.in_cut_window(0.0));
    }

    #[test]
    fn test_peak_outside_window_does_not_cut() {
        let mut camera = director(CameraConfig::default());
        assert_eq!(camera.tick(0.6, &PEAK, None), None);
        assert_eq!(camera.last_cut(), None);
    }

    #[test]
    fn test_no_cut_without_peak() {
        let mut camera = director(CameraConfig::default());
        let calm = EnergyFrame {
            peak: false,
            ..PEAK
        };
        assert_eq!(camera.tick(1.2, &calm, None), None);
    }

    #[test]
    fn test_forced_framings() {
        let close = CameraConfig {
            close_up_chance: 1.0,
            wide_chance: 0.0,
            ..Default::default()
        };
        let mut camera = director(close);
        assert_eq!(camera.tick(0.0, &PEAK, None), Some(Framing::CloseUp));
        // Cut lands at (0, 5, 25), then the drift target at t=0 is x=0
        assert_eq!(camera.position(), Vec3::new(0.0, 5.0, 25.0));

        let top = CameraConfig {
            close_up_chance: 0.0,
            wide_chance: 0.0,
            ..Default::default()
        };
        let mut camera = director(top);
        assert_eq!(camera.tick(0.0, &PEAK, None), Some(Framing::TopDown));
        assert_eq!(camera.position().y, 400.0);

        let wide = CameraConfig {
            close_up_chance: 0.0,
            wide_chance: 1.0,
            ..Default::default()
        };
        let mut camera = director(wide);
        assert_eq!(camera.tick(0.0, &PEAK, None), Some(Framing::Wide));
        assert!(camera.position().x.abs() <= 125.0);
        assert_eq!(camera.position().z, 200.0);
    }

    #[test]
    fn test_drift_eases_toward_sine() {
        let mut camera = director(CameraConfig::default());
        let calm = EnergyFrame::SILENT;
        let t = 10.0;
        let target = (t * 0.12f64).sin() as f32 * 200.0;

        camera.tick(t, &calm, None);
        assert!((camera.position().x - target * 0.02).abs() < 1e-4);
        assert_eq!(camera.position().y, 50.0);
    }

    #[test]
    fn test_look_at_tracks_bass() {
        let mut camera = director(CameraConfig::default());
        let energy = EnergyFrame {
            bass: 0.5,
            ..Default::default()
        };
        camera.tick(0.5, &energy, None);
        assert_eq!(camera.look_at(), Vec3::new(0.0, 40.0, 0.0));
    }

    #[test]
    fn test_jitter_applied() {
        let mut camera = director(CameraConfig::default());
        camera.tick(0.0, &EnergyFrame::SILENT, Some(Vec3::new(0.0, 3.0, 0.0)));
        assert_eq!(camera.position().y, 53.0);
    }

    #[test]
    fn test_view_matrix_looks_forward() {
        let camera = director(CameraConfig::default());
        let view = camera.view_matrix();
        // Look-at point ends up in front of the camera (negative z in view space)
        let target = view.transform_point3(camera.look_at());
        assert!(target.z < 0.0);
        assert!(target.x.abs() < 1e-4);
    }

    #[test]
    fn test_invalid_chances_rejected() {
        let config = CameraConfig {
            close_up_chance: 0.8,
            wide_chance: 0.5,
            ..Default::default()
        };
        assert!(CameraDirector::new(config, None).is_err());
    }
}
