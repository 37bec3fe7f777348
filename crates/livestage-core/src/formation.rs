//! Formation Scheduler
//!
//! A formation is a fixed-length list of ground targets, one per ensemble
//! slot. Switching formations only changes the targets; performers always ease
//! toward them with exponential interpolation, so a switch reads as a
//! transition rather than a teleport.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{CoreError, Result};

/// Named set of `(x, z)` targets indexed by ensemble slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Formation {
    /// Catalog name
    pub name: String,
    /// Target per slot
    pub slots: Vec<Vec2>,
}

impl Formation {
    /// Create a formation from `(x, z)` pairs
    pub fn new(name: impl Into<String>, slots: &[(f32, f32)]) -> Self {
        Self {
            name: name.into(),
            slots: slots.iter().map(|&(x, z)| Vec2::new(x, z)).collect(),
        }
    }

    /// Number of slots
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the formation has no slots
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The built-in catalog for a seven-member ensemble
    pub fn standard_catalog() -> Vec<Formation> {
        vec![
            Formation::new(
                "V_SHAPE",
                &[
                    (0.0, 0.0),
                    (-8.0, 8.0),
                    (8.0, 8.0),
                    (-16.0, 16.0),
                    (16.0, 16.0),
                    (-24.0, 24.0),
                    (24.0, 24.0),
                ],
            ),
            Formation::new(
                "DIAMOND",
                &[
                    (0.0, 0.0),
                    (0.0, 15.0),
                    (0.0, 30.0),
                    (-10.0, 15.0),
                    (10.0, 15.0),
                    (-20.0, 15.0),
                    (20.0, 15.0),
                ],
            ),
            Formation::new(
                "X_CROSS",
                &[
                    (0.0, 0.0),
                    (-10.0, 10.0),
                    (10.0, -10.0),
                    (10.0, 10.0),
                    (-10.0, -10.0),
                    (-20.0, 20.0),
                    (20.0, -20.0),
                ],
            ),
            Formation {
                name: "CANON_LINE".to_string(),
                slots: (0..7).map(|i| Vec2::new((i as f32 - 3.0) * 12.0, 10.0)).collect(),
            },
        ]
    }
}

/// Formation timing configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormationConfig {
    /// Fraction of the remaining distance covered per tick, in (0, 1]
    pub smoothing: f32,
    /// Rotate to the next formation every this many show seconds
    pub rotation_period_secs: Option<f32>,
}

impl Default for FormationConfig {
    fn default() -> Self {
        Self {
            smoothing: 0.08,
            rotation_period_secs: Some(20.0),
        }
    }
}

/// Catalog of formations plus the active one
#[derive(Debug, Clone)]
pub struct FormationScheduler {
    catalog: Vec<Formation>,
    active: usize,
    config: FormationConfig,
}

impl FormationScheduler {
    /// Create a scheduler; all formations must share one non-zero slot count
    pub fn new(catalog: Vec<Formation>, config: FormationConfig) -> Result<Self> {
        let first = catalog
            .first()
            .ok_or_else(|| CoreError::InvalidConfig("formation catalog is empty".to_string()))?;
        let slots = first.len();
        if slots == 0 {
            return Err(CoreError::InvalidConfig(format!(
                "formation '{}' has no slots",
                first.name
            )));
        }
        if let Some(bad) = catalog.iter().find(|f| f.len() != slots) {
            return Err(CoreError::InvalidConfig(format!(
                "formation '{}' has {} slots, expected {}",
                bad.name,
                bad.len(),
                slots
            )));
        }
        if !(config.smoothing > 0.0 && config.smoothing <= 1.0) {
            return Err(CoreError::InvalidConfig(
                "formation smoothing must be in (0, 1]".to_string(),
            ));
        }
        if matches!(config.rotation_period_secs, Some(p) if !(p > 0.0)) {
            return Err(CoreError::InvalidConfig(
                "formation rotation period must be positive".to_string(),
            ));
        }

        Ok(Self {
            catalog,
            active: 0,
            config,
        })
    }

    /// Scheduler over the standard catalog
    pub fn standard(config: FormationConfig) -> Result<Self> {
        Self::new(Formation::standard_catalog(), config)
    }

    /// Number of ensemble slots
    pub fn slot_count(&self) -> usize {
        self.catalog[0].len()
    }

    /// Active formation
    pub fn active(&self) -> &Formation {
        &self.catalog[self.active]
    }

    /// Catalog index of a formation name
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.catalog.iter().position(|f| f.name == name)
    }

    /// Activate a formation by name
    pub fn select(&mut self, name: &str) -> Result<()> {
        let index = self
            .index_of(name)
            .ok_or_else(|| CoreError::UnknownFormation(name.to_string()))?;
        self.set_active(index);
        Ok(())
    }

    /// Activate the next formation in catalog order
    pub fn advance(&mut self) -> &Formation {
        self.set_active((self.active + 1) % self.catalog.len());
        self.active()
    }

    /// Activate the formation for an elapsed-time bucket
    ///
    /// Returns `true` when the active formation changed. Every viewer with the
    /// same base and show time lands on the same formation.
    pub fn select_for_time(&mut self, base: usize, elapsed_secs: f64) -> bool {
        let offset = match self.config.rotation_period_secs {
            Some(period) if elapsed_secs > 0.0 => (elapsed_secs / period as f64).floor() as usize,
            _ => 0,
        };
        let index = (base + offset) % self.catalog.len();
        if index == self.active {
            return false;
        }
        self.set_active(index);
        true
    }

    fn set_active(&mut self, index: usize) {
        if index != self.active {
            debug!(
                "Formation {} -> {}",
                self.catalog[self.active].name, self.catalog[index].name
            );
        }
        self.active = index;
    }

    /// Target of a slot in the active formation
    pub fn target(&self, slot: usize) -> Vec2 {
        let slots = &self.active().slots;
        slots[slot % slots.len()]
    }

    /// One interpolation step from `current` toward the slot's target
    pub fn step(&self, current: Vec2, slot: usize) -> Vec2 {
        ease_toward(current, self.target(slot), self.config.smoothing)
    }

    /// Interpolation factor per tick
    pub fn smoothing(&self) -> f32 {
        self.config.smoothing
    }
}

/// Exponential approach: covers fraction `f` of the remaining distance
pub fn ease_toward(current: Vec2, target: Vec2, f: f32) -> Vec2 {
    current + (target - current) * f
}
