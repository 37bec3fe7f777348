//! Stage - one viewer's scene and its per-tick update
//!
//! The stage owns the session mirror and every animated system. Server
//! messages only write into the mirror (and pick a style on start); `tick`
//! reads the mirror and the spectrum once and produces the next frame.

use glam::{Vec2, Vec3};
use palette::Srgb;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use crate::audio::{BandLayout, EnergyExtractor, EnergyFrame};
use crate::avatar::{color_from_hex, Avatar, Reflection};
use crate::camera::{CameraConfig, CameraDirector, Framing};
use crate::choreography::{
    classify_song, ChoreographyConfig, ChoreographyEngine, ShowPlan, StyleKind,
};
use crate::formation::{FormationConfig, FormationScheduler};
use crate::lighting::{LightRig, LightingConfig};
use crate::particles::{ParticleConfig, ParticleSystem, VfxTrigger, BACKGROUND};
use crate::protocol::{ClientMessage, ServerMessage};
use crate::session::Timestamp;
use crate::sync::{MirrorEvent, ShowMirror};
use crate::Result;

/// Everything needed to build a [`Stage`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    /// Seed for every random choice; `None` draws from the OS
    pub seed: Option<u64>,
    /// Number of audience members
    pub audience_size: usize,
    /// Expose floor reflections for performers
    pub reflections: bool,
    /// Energy band layout
    pub bands: BandLayout,
    /// Choreography tuning
    pub choreography: ChoreographyConfig,
    /// Formation timing
    pub formations: FormationConfig,
    /// Particle tuning
    pub particles: ParticleConfig,
    /// Camera tuning
    pub camera: CameraConfig,
    /// Light rig tuning
    pub lighting: LightingConfig,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            seed: None,
            audience_size: 400,
            reflections: true,
            bands: BandLayout::default(),
            choreography: ChoreographyConfig::default(),
            formations: FormationConfig::default(),
            particles: ParticleConfig::default(),
            camera: CameraConfig::default(),
            lighting: LightingConfig::default(),
        }
    }
}

impl StageConfig {
    /// Parse a TOML document; missing fields take their defaults
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

/// Summary of one tick
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    /// Tick number since the stage was built
    pub frame: u64,
    /// Elapsed show seconds, `None` while not playing
    pub show_secs: Option<f64>,
    /// Energy used for this tick
    pub energy: EnergyFrame,
    /// Active style
    pub style: StyleKind,
    /// Active formation
    pub formation: String,
    /// Whether the formation switched this tick
    pub formation_changed: bool,
    /// Camera cut taken this tick
    pub cut: Option<Framing>,
    /// Live particles
    pub particle_count: usize,
    /// Whether the glitch effect perturbed this tick
    pub glitch: bool,
    /// Scene background color
    pub background: Srgb,
    /// Spotlight multiplier from the cheer count
    pub crowd_factor: f32,
}

/// One viewer's complete animated scene
#[derive(Debug)]
pub struct Stage {
    config: StageConfig,
    mirror: ShowMirror,
    extractor: EnergyExtractor,
    formations: FormationScheduler,
    formation_base: usize,
    choreography: ChoreographyEngine,
    performers: Vec<Avatar>,
    audience: Vec<Avatar>,
    particles: ParticleSystem,
    camera: CameraDirector,
    lights: LightRig,
    frame: u64,
}

impl Stage {
    /// Build a stage in its idle state
    pub fn new(config: StageConfig) -> Result<Self> {
        let extractor = EnergyExtractor::new(config.bands)?;
        let formations = FormationScheduler::standard(config.formations.clone())?;
        let choreography = ChoreographyEngine::new(config.choreography.clone())?;
        let lights = LightRig::new(config.lighting.clone())?;

        // Independent random stream per subsystem
        let sub_seed = |n: u64| config.seed.map(|seed| seed.wrapping_add(n));
        let particles = ParticleSystem::new(config.particles.clone(), sub_seed(1))?;
        let camera = CameraDirector::new(config.camera.clone(), sub_seed(2))?;
        let mut rng = match sub_seed(3) {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let floor = lights.performer_floor();
        let performers = (0..formations.slot_count())
            .map(|slot| {
                let mut avatar = Avatar::performer(slot, &mut rng);
                let target = formations.target(slot);
                avatar.set_position(Vec3::new(target.x, floor, target.y));
                avatar
            })
            .collect();
        let audience = (0..config.audience_size)
            .map(|_| {
                let position = Vec3::new(
                    (rng.random::<f32>() - 0.5) * 400.0,
                    0.0,
                    60.0 + rng.random::<f32>() * 250.0,
                );
                Avatar::audience(position, &mut rng)
            })
            .collect();

        info!(
            "Stage built: {} performers, {} audience, seed={:?}",
            formations.slot_count(),
            config.audience_size,
            config.seed
        );

        Ok(Self {
            config,
            mirror: ShowMirror::new(),
            extractor,
            formations,
            formation_base: 0,
            choreography,
            performers,
            audience,
            particles,
            camera,
            lights,
            frame: 0,
        })
    }

    /// Session mirror
    pub fn mirror(&self) -> &ShowMirror {
        &self.mirror
    }

    /// Performers by ensemble slot
    pub fn performers(&self) -> &[Avatar] {
        &self.performers
    }

    /// Audience members
    pub fn audience(&self) -> &[Avatar] {
        &self.audience
    }

    /// Floor reflections of the performers, empty when disabled
    pub fn reflections(&self) -> Vec<Reflection> {
        if !self.config.reflections {
            return Vec::new();
        }
        self.performers.iter().filter_map(Avatar::reflection).collect()
    }

    /// Particle system
    pub fn particles(&self) -> &ParticleSystem {
        &self.particles
    }

    /// Camera
    pub fn camera(&self) -> &CameraDirector {
        &self.camera
    }

    /// Light rig
    pub fn lights(&self) -> &LightRig {
        &self.lights
    }

    /// Choreography engine
    pub fn choreography(&self) -> &ChoreographyEngine {
        &self.choreography
    }

    /// Formation scheduler
    pub fn formations(&self) -> &FormationScheduler {
        &self.formations
    }

    /// Apply a server message received at `local_now`
    pub fn handle_server_message(
        &mut self,
        message: &ServerMessage,
        local_now: Timestamp,
    ) -> MirrorEvent {
        let event = self.mirror.apply(message, local_now);
        match &event {
            MirrorEvent::Started { song } => self.apply_plan(classify_song(song)),
            MirrorEvent::Initialized { playing: true } => {
                // Late join: pick up the running show's style right away
                if let Some(song) = self.mirror.session().current_song.clone() {
                    self.apply_plan(classify_song(&song));
                }
            }
            MirrorEvent::Initialized { playing: false } | MirrorEvent::CheerCount(_) => {}
        }
        event
    }

    /// Decode and apply a text frame; undecodable frames are logged and dropped
    pub fn handle_server_text(
        &mut self,
        text: &str,
        local_now: Timestamp,
    ) -> Option<MirrorEvent> {
        match ServerMessage::from_json(text) {
            Ok(message) => Some(self.handle_server_message(&message, local_now)),
            Err(e) => {
                warn!("Dropping malformed server message: {}", e);
                None
            }
        }
    }

    fn apply_plan(&mut self, plan: ShowPlan) {
        self.choreography.set_style(plan.style);
        match self.formations.index_of(plan.formation) {
            Some(index) => {
                self.formation_base = index;
                if let Err(e) = self.formations.select(plan.formation) {
                    warn!("Could not select formation {}: {}", plan.formation, e);
                }
            }
            None => warn!("Formation {} is not in the catalog", plan.formation),
        }
        info!("Show plan: {:?} in {}", plan.style, plan.formation);
    }

    /// Run an explicit effect
    pub fn trigger_vfx(&mut self, trigger: VfxTrigger) {
        self.particles.trigger(trigger);
    }

    /// Request to start the show
    pub fn start_concert(&self, song: Option<String>) -> ClientMessage {
        ClientMessage::StartConcert { song_url: song }
    }

    /// Request to add a cheer
    pub fn cheer(&self) -> ClientMessage {
        ClientMessage::Cheer
    }

    /// Advance the scene by one render tick
    ///
    /// `spectrum` is the current analyzer snapshot, if any. Energy is zero
    /// while the show is not playing, so the scene idles.
    pub fn tick(&mut self, local_now: Timestamp, spectrum: Option<&[u8]>) -> FrameReport {
        self.frame += 1;
        let wall_secs = local_now as f64 / 1000.0;
        let show_secs = self.mirror.playing_show_secs(local_now);

        let energy = match show_secs {
            Some(_) => self.extractor.extract(spectrum),
            None => EnergyFrame::SILENT,
        };

        let formation_changed = match show_secs {
            Some(secs) => self.formations.select_for_time(self.formation_base, secs),
            None => false,
        };

        self.lights
            .update(wall_secs, &energy, self.mirror.session().cheer_count);
        let floor = self.lights.performer_floor();

        let dance_secs = show_secs.unwrap_or(wall_secs);
        for (slot, performer) in self.performers.iter_mut().enumerate() {
            let current = performer.position();
            let next = self
                .formations
                .step(Vec2::new(current.x, current.z), slot);
            performer.set_position(Vec3::new(next.x, floor, next.y));
            self.choreography
                .animate(performer, slot, dance_secs, wall_secs, &energy);
        }
        for member in &mut self.audience {
            self.choreography
                .animate(member, 0, wall_secs, wall_secs, &energy);
        }

        let glitch = self.particles.tick(&energy);
        let cut = self
            .camera
            .tick(wall_secs, &energy, glitch.map(|g| g.camera_offset));
        let background = glitch
            .map(|g| g.background)
            .unwrap_or_else(|| color_from_hex(BACKGROUND));

        if cut.is_some() || formation_changed {
            debug!(
                "Frame {}: cut={:?} formation={}",
                self.frame,
                cut,
                self.formations.active().name
            );
        }
        if self.frame % 600 == 0 {
            trace!(
                "Frame {}: show={:?} energy={:?} particles={}",
                self.frame,
                show_secs,
                energy,
                self.particles.len()
            );
        }

        FrameReport {
            frame: self.frame,
            show_secs,
            energy,
            style: self.choreography.style(),
            formation: self.formations.active().name.clone(),
            formation_changed,
            cut,
            particle_count: self.particles.len(),
            glitch: glitch.is_some(),
            background,
            crowd_factor: self.lights.crowd_factor(),
        }
    }
}
