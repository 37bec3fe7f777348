//! Pose computation for performers and audience members

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{StyleKind, StylePreset};
use crate::audio::EnergyFrame;
use crate::avatar::Avatar;
use crate::skeleton::{JointId, Skeleton};
use crate::{CoreError, Result};

/// Tunable constants of the choreography
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChoreographyConfig {
    /// Phase advance per show second before the style's speed multiplier
    pub beat_rate: f64,
    /// Phase delay per canon rank
    pub canon_step: f64,
    /// Slots that receive the lead energy multiplier
    pub lead_slots: Vec<usize>,
    /// Energy multiplier for lead slots
    pub lead_multiplier: f32,
    /// Pelvis lift on a peak tick
    pub peak_lift: f32,
    /// Amplitude multiplier on a peak tick
    pub peak_boost: f32,
    /// Breathing rate in radians per wall second
    pub breathing_rate: f64,
    /// Torso scale swing of the breathing cycle
    pub breathing_depth: f32,
    /// Audience bounce height at full bass
    pub audience_bounce: f32,
    /// Audience arm swing at full mid
    pub audience_arm_swing: f32,
    /// Audience body sway amplitude
    pub audience_sway: f32,
}

impl Default for ChoreographyConfig {
    fn default() -> Self {
        Self {
            beat_rate: 7.5,
            canon_step: 0.15,
            lead_slots: vec![0],
            lead_multiplier: 1.4,
            peak_lift: 4.5,
            peak_boost: 1.25,
            breathing_rate: 2.5,
            breathing_depth: 0.1,
            audience_bounce: 2.0,
            audience_arm_swing: 0.6,
            audience_sway: 0.3,
        }
    }
}

impl ChoreographyConfig {
    /// Reject non-positive rates and multipliers
    pub fn validate(&self) -> Result<()> {
        if !(self.beat_rate > 0.0) {
            return Err(CoreError::InvalidConfig(
                "beat_rate must be positive".to_string(),
            ));
        }
        if !(self.canon_step >= 0.0) {
            return Err(CoreError::InvalidConfig(
                "canon_step must not be negative".to_string(),
            ));
        }
        if !(self.lead_multiplier > 0.0 && self.peak_boost > 0.0) {
            return Err(CoreError::InvalidConfig(
                "energy multipliers must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Neutral shoulder angle; arms hang slightly out from the body
const SHOULDER_REST: f32 = 1.5;
/// Neutral audience arm raise
const AUDIENCE_ARM_REST: f32 = 1.2;
/// Head nod per unit of drive amplitude
const HEAD_NOD: f32 = 0.25;

/// Applies the active style to avatars once per tick
#[derive(Debug, Clone)]
pub struct ChoreographyEngine {
    config: ChoreographyConfig,
    style: StyleKind,
    preset: StylePreset,
}

impl ChoreographyEngine {
    /// Create an engine with the default style
    pub fn new(config: ChoreographyConfig) -> Result<Self> {
        config.validate()?;
        let style = StyleKind::default();
        Ok(Self {
            config,
            style,
            preset: style.preset(),
        })
    }

    /// Active style
    pub fn style(&self) -> StyleKind {
        self.style
    }

    /// Parameters of the active style
    pub fn preset(&self) -> &StylePreset {
        &self.preset
    }

    /// Configuration
    pub fn config(&self) -> &ChoreographyConfig {
        &self.config
    }

    /// Switch style; takes effect on the next pose
    pub fn set_style(&mut self, style: StyleKind) {
        if style != self.style {
            info!("Choreography style: {:?} -> {:?}", self.style, style);
        }
        self.style = style;
        self.preset = style.preset();
    }

    /// Ensemble phase at a point of show time
    pub fn global_phase(&self, show_secs: f64) -> f64 {
        show_secs * self.config.beat_rate * self.preset.speed as f64
    }

    /// Phase delay for a canon rank; zero unless the style uses canon
    pub fn canon_delay(&self, rank: usize) -> f64 {
        if self.preset.canon {
            rank as f64 * self.config.canon_step
        } else {
            0.0
        }
    }

    /// Phase of one avatar
    pub fn local_phase(&self, global_phase: f64, avatar: &Avatar) -> f64 {
        global_phase - self.canon_delay(avatar.canon_rank) + avatar.timing_variation as f64
    }

    /// Energy multiplier for an ensemble slot
    pub fn energy_multiplier(&self, slot: usize) -> f32 {
        if self.config.lead_slots.contains(&slot) {
            self.config.lead_multiplier
        } else {
            1.0
        }
    }

    /// Pose any avatar, picking the policy from its performer flag
    ///
    /// Audience members ignore `slot` and `show_secs`.
    pub fn animate(
        &self,
        avatar: &mut Avatar,
        slot: usize,
        show_secs: f64,
        wall_secs: f64,
        energy: &EnergyFrame,
    ) {
        if avatar.is_performer() {
            self.animate_performer(avatar, slot, show_secs, wall_secs, energy);
        } else {
            self.animate_audience(avatar, wall_secs, energy);
        }
    }

    /// Pose a performer
    ///
    /// `show_secs` drives the dance phase; `wall_secs` drives breathing,
    /// which never stops even with no audio.
    pub fn animate_performer(
        &self,
        avatar: &mut Avatar,
        slot: usize,
        show_secs: f64,
        wall_secs: f64,
        energy: &EnergyFrame,
    ) {
        let phase = self.local_phase(self.global_phase(show_secs), avatar);
        let accent = self.preset.accent.sample(phase);
        let flow = self.preset.flow.sample(phase);
        let impact = self.preset.impact.map_or(0.0, |wave| wave.sample(phase));
        let swing = phase.sin() as f32;
        let tension = self.preset.tension;

        let boost = if energy.peak { self.config.peak_boost } else { 1.0 };
        let amplitude = energy.bass * self.energy_multiplier(slot) * boost;
        let lift = if energy.peak { self.config.peak_lift } else { 0.0 };
        let breath = ((wall_secs * self.config.breathing_rate + avatar.vibe_offset as f64).sin()
            as f32)
            * self.config.breathing_depth;

        let skeleton = avatar.skeleton_mut();

        skeleton.joint_mut(JointId::Torso).scale = Vec3::splat(1.0 + breath);

        // Bass: pelvis drive and body weight
        let pelvis = skeleton.joint_mut(JointId::Pelvis);
        pelvis.translation.y =
            Skeleton::rest_translation(JointId::Pelvis).y + accent.abs() * 1.8 * amplitude + lift;

        // Mid: lean and roll
        skeleton.joint_mut(JointId::Spine).rotation.x = -flow * 0.15 * energy.mid;
        skeleton.joint_mut(JointId::Torso).rotation.z = accent * 0.3 * energy.mid;

        // Arms
        let arm_wave = flow * 2.2 * amplitude;
        skeleton.joint_mut(JointId::LeftArmRoot).rotation.z = -SHOULDER_REST - arm_wave;
        skeleton.joint_mut(JointId::RightArmRoot).rotation.z = SHOULDER_REST + arm_wave;
        let elbow = accent.abs() * 2.5 * amplitude * tension;
        skeleton.joint_mut(JointId::LeftArmMid).rotation.z = -elbow;
        skeleton.joint_mut(JointId::RightArmMid).rotation.z = elbow;

        // Legs stay planted: hips swing back only a little, knees never hyperextend
        skeleton.joint_mut(JointId::LeftLegRoot).rotation.x = (swing * 1.2 * amplitude).max(-0.5);
        skeleton.joint_mut(JointId::RightLegRoot).rotation.x =
            (-swing * 1.2 * amplitude).max(-0.5);
        skeleton.joint_mut(JointId::LeftLegMid).rotation.x = (swing * 1.8).max(0.0) * amplitude;
        skeleton.joint_mut(JointId::RightLegMid).rotation.x = (-swing * 1.8).max(0.0) * amplitude;

        // High: head snap
        let head = skeleton.joint_mut(JointId::Head);
        head.rotation.y = accent * 0.6 * energy.high * tension;
        head.rotation.x = impact * HEAD_NOD * amplitude;
    }

    /// Pose an audience member: bounce, one raised arm and a slow sway
    pub fn animate_audience(&self, avatar: &mut Avatar, wall_secs: f64, energy: &EnergyFrame) {
        let offset = avatar.phase_offset as f64;
        let bounce = ((wall_secs * 3.0 + offset).sin().abs() as f32)
            * self.config.audience_bounce
            * energy.bass;
        let arm = AUDIENCE_ARM_REST
            + ((wall_secs * 6.0 + offset).sin() as f32) * self.config.audience_arm_swing * energy.mid;
        let sway = ((wall_secs + offset).sin() as f32) * self.config.audience_sway;

        let skeleton = avatar.skeleton_mut();
        let root = skeleton.joint_mut(JointId::Root);
        root.translation.y = bounce;
        root.rotation.y = sway;
        skeleton.joint_mut(JointId::RightArmRoot).rotation.z = arm;
    }
}
