//! LiveStage Core - Show Engine and Shared Protocol
//!
//! This crate contains everything a viewer needs to reconstruct the show
//! locally, plus the wire types shared with the server:
//! - Session state, wire protocol and the client clock mirror
//! - Spectral energy extraction (and a PCM spectrum analyzer)
//! - Formations, skeletal avatars and the choreography engine
//! - Particles, camera director and light rig
//! - The per-viewer [`Stage`] that drives all of the above once per tick

#![warn(missing_docs)]

pub use glam::{Mat4, Vec2, Vec3};
use thiserror::Error;

// Session & protocol
pub mod protocol;
pub mod session;
pub mod sync;

// Audio
pub mod audio;

// Animation
pub mod avatar;
pub mod choreography;
pub mod formation;
pub mod skeleton;

// Effects
pub mod camera;
pub mod lighting;
pub mod particles;

// Orchestration & configuration
pub mod logging;
pub mod stage;

// --- Re-exports grouped by category ---

// Session & protocol
pub use protocol::{ClientMessage, InitPayload, ServerMessage};
pub use session::{Clock, ConcertSession, ManualClock, SystemClock, Timestamp};
pub use sync::{MirrorEvent, ShowMirror};

// Audio
pub use audio::{
    BandLayout, EnergyExtractor, EnergyFrame, SpectrumAnalyzer, SpectrumAnalyzerConfig,
    SpectrumSource,
};

// Animation
pub use avatar::{Avatar, Reflection};
pub use choreography::{
    classify_song, ChoreographyConfig, ChoreographyEngine, ShowPlan, StyleKind, StylePreset,
    Waveform,
};
pub use formation::{Formation, FormationConfig, FormationScheduler};
pub use skeleton::{JointId, JointTransform, Skeleton};

// Effects
pub use camera::{CameraConfig, CameraDirector, Framing};
pub use lighting::{Laser, LightRig, LightingConfig, OrbitalRing, Spotlight};
pub use particles::{
    GlitchEffect, GlitchFrame, Particle, ParticleConfig, ParticleKind, ParticleSystem, VfxTrigger,
};

// Orchestration
pub use logging::LogConfig;
pub use stage::{FrameReport, Stage, StageConfig};

/// Core error types
#[derive(Error, Debug)]
pub enum CoreError {
    /// A configuration value is out of range or inconsistent
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A wire message could not be encoded or decoded
    #[error("Protocol error: {0}")]
    Protocol(#[from] serde_json::Error),

    /// A named formation does not exist in the catalog
    #[error("Unknown formation: {0}")]
    UnknownFormation(String),

    /// A configuration file could not be parsed
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
