//! In-process show simulation
//!
//! Runs a coordinator and two viewers on manual clocks. Viewer A starts the
//! show; viewer B connects later with a skewed local clock. Both are fed the
//! same synthesized track through the spectrum analyzer.

use std::sync::Arc;

use anyhow::{Context, Result};
use livestage_control::SessionCoordinator;
use livestage_core::{
    Clock, FrameReport, ManualClock, ServerMessage, SpectrumAnalyzer, SpectrumAnalyzerConfig,
    SpectrumSource, Stage, StyleKind, SystemClock, Timestamp, VfxTrigger,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info};

use crate::cli::SimulateArgs;
use crate::config::AppConfig;

const FPS: u32 = 60;
const SAMPLE_RATE: u32 = 44_100;

/// Drum-machine loop: kick on every beat, snare on the backbeat, hats on
/// eighths, and a bass line that swells every 8 bars
struct SynthTrack {
    bpm: f32,
    position: u64,
    rng: StdRng,
}

impl SynthTrack {
    fn new(bpm: f32, seed: u64) -> Self {
        Self {
            bpm,
            position: 0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn next_chunk(&mut self, count: usize) -> Vec<f32> {
        (0..count).map(|_| self.next_sample()).collect()
    }

    fn next_sample(&mut self) -> f32 {
        let t = self.position as f32 / SAMPLE_RATE as f32;
        self.position += 1;

        let beat_len = 60.0 / self.bpm;
        let beat = (t / beat_len).floor() as u32;
        let since_beat = t % beat_len;
        let since_eighth = t % (beat_len / 2.0);
        let tau = 2.0 * std::f32::consts::PI;

        // Saturated pitch-dropping kick
        let kick_freq = 50.0 + 90.0 * (-since_beat * 30.0).exp();
        let kick_env = (-since_beat * 7.0).exp();
        let kick = ((tau * kick_freq * since_beat).sin() * 3.0).tanh() * kick_env;

        let noise = self.rng.random::<f32>() * 2.0 - 1.0;
        let snare = if beat % 2 == 1 {
            noise * (-since_beat * 18.0).exp() * 0.5
        } else {
            0.0
        };
        let hat = (tau * 9_000.0 * t).sin() * noise.abs() * (-since_eighth * 60.0).exp() * 0.3;

        let phrase = (t / (beat_len * 32.0)).fract();
        let bass = (tau * 110.0 * t).sin() * 0.25 * phrase;

        (kick * 0.9 + snare + hat + bass).clamp(-1.0, 1.0)
    }
}

/// One viewer: its stage, channel and local clock skew
struct Viewer {
    name: &'static str,
    stage: Stage,
    inbox: UnboundedReceiver<ServerMessage>,
    skew_ms: i64,
}

impl Viewer {
    fn local_now(&self, server_now: Timestamp) -> Timestamp {
        server_now + self.skew_ms
    }

    fn pump(&mut self, server_now: Timestamp) {
        let local_now = self.local_now(server_now);
        while let Ok(message) = self.inbox.try_recv() {
            let event = self.stage.handle_server_message(&message, local_now);
            debug!("{} <- {:?}", self.name, event);
        }
    }
}

/// What a simulation run produced
#[derive(Debug, Clone, Default)]
pub struct SimulationSummary {
    pub frames: u32,
    pub camera_cuts: usize,
    pub formation_changes: usize,
    pub glitch_frames: usize,
    pub max_particles: usize,
    pub peak_frames: usize,
    /// Largest show-time disagreement between the viewers
    pub max_drift_ms: f64,
    pub style_a: Option<StyleKind>,
    pub style_b: Option<StyleKind>,
    pub cheer_count: u64,
}

impl SimulationSummary {
    fn record(&mut self, report: &FrameReport) {
        self.camera_cuts += usize::from(report.cut.is_some());
        self.formation_changes += usize::from(report.formation_changed);
        self.glitch_frames += usize::from(report.glitch);
        self.peak_frames += usize::from(report.energy.peak);
        self.max_particles = self.max_particles.max(report.particle_count);
    }
}

/// Run the simulation described by `args`
pub fn run(config: &AppConfig, args: &SimulateArgs) -> Result<SimulationSummary> {
    let seed = config.stage.seed.unwrap_or(0x5eed);
    let server_clock = ManualClock::new(SystemClock.now_ms());
    let mut coordinator =
        SessionCoordinator::new(config.session.clone(), Arc::new(server_clock.clone()));

    let make_stage = |offset: u64| {
        let mut stage_config = config.stage.clone();
        stage_config.seed = Some(seed.wrapping_add(offset * 100));
        Stage::new(stage_config).context("Invalid stage configuration")
    };

    let mut analyzer = SpectrumAnalyzer::new(SpectrumAnalyzerConfig::default())
        .context("Invalid analyzer configuration")?;
    let mut track = SynthTrack::new(128.0, seed);
    let chunk = (SAMPLE_RATE / FPS) as usize;

    let mut a = Viewer {
        name: "A",
        stage: make_stage(0)?,
        inbox: coordinator.connect().1,
        skew_ms: 0,
    };
    a.pump(server_clock.now_ms());
    let start = a.stage.start_concert(Some(args.song.clone()));
    coordinator.dispatch(start);
    let show_start = server_clock.now_ms();
    info!("Simulating {} frames of {:?}", args.frames, args.song);

    let mut b: Option<Viewer> = None;
    let mut summary = SimulationSummary {
        frames: args.frames,
        ..Default::default()
    };

    for frame in 0..args.frames {
        let server_now = show_start + (frame as i64 * 1000) / FPS as i64;
        server_clock.set(server_now);

        if b.is_none() && server_now - show_start >= args.join_delay_ms {
            let mut late = Viewer {
                name: "B",
                stage: make_stage(1)?,
                inbox: coordinator.connect().1,
                skew_ms: args.skew_ms,
            };
            late.pump(server_now);
            info!(
                "Viewer B joined at show time {}ms with skew {}ms",
                server_now - show_start,
                args.skew_ms
            );
            b = Some(late);
        }

        // A viewer cheers every 1.5s; confetti every 8s on A
        if frame % (FPS * 3 / 2) == 0 && frame > 0 {
            coordinator.dispatch(a.stage.cheer());
        }
        if frame % (FPS * 8) == FPS * 4 {
            a.stage.trigger_vfx(VfxTrigger::Confetti);
        }
        if frame == FPS * 12 {
            a.stage.trigger_vfx(VfxTrigger::Glitch);
        }

        analyzer.push_samples(&track.next_chunk(chunk));
        analyzer.analyze();
        let spectrum = analyzer.frequency_data();

        a.pump(server_now);
        let report_a = a.stage.tick(a.local_now(server_now), spectrum);
        summary.record(&report_a);

        if let Some(viewer) = b.as_mut() {
            viewer.pump(server_now);
            let report_b = viewer.stage.tick(viewer.local_now(server_now), spectrum);
            if let (Some(sa), Some(sb)) = (report_a.show_secs, report_b.show_secs) {
                summary.max_drift_ms = summary.max_drift_ms.max((sa - sb).abs() * 1000.0);
            }
            if frame % FPS == 0 {
                log_second("B", &report_b);
            }
        }
        if frame % FPS == 0 {
            log_second("A", &report_a);
        }
    }

    summary.style_a = Some(a.stage.choreography().style());
    summary.style_b = b.as_ref().map(|viewer| viewer.stage.choreography().style());
    summary.cheer_count = coordinator.session().cheer_count;
    Ok(summary)
}

fn log_second(viewer: &str, report: &FrameReport) {
    info!(
        "[{}] t={:>6.2}s style={:?} formation={} bass={:.2} particles={} cut={:?}",
        viewer,
        report.show_secs.unwrap_or(0.0),
        report.style,
        report.formation,
        report.energy.bass,
        report.particle_count,
        report.cut
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(frames: u32, join_delay_ms: i64, skew_ms: i64) -> SimulateArgs {
        SimulateArgs {
            song: "assets/audio/fast_track.mp3".to_string(),
            frames,
            join_delay_ms,
            skew_ms,
        }
    }

    fn config() -> AppConfig {
        let mut config = AppConfig::default();
        config.stage.seed = Some(11);
        config.stage.audience_size = 20;
        config
    }

    #[test]
    fn test_synth_track_is_bounded_and_loud() {
        let mut track = SynthTrack::new(128.0, 1);
        let samples = track.next_chunk(SAMPLE_RATE as usize);
        assert!(samples.iter().all(|s| (-1.0..=1.0).contains(s)));
        let peak = samples.iter().fold(0.0f32, |m, s| m.max(s.abs()));
        assert!(peak > 0.5);
    }

    #[test]
    fn test_viewers_agree_on_show_time() {
        let summary = run(&config(), &args(600, 2_000, -40_000)).unwrap();
        assert_eq!(summary.frames, 600);
        assert!(summary.max_drift_ms < 1.0, "drift {}", summary.max_drift_ms);
        assert_eq!(summary.style_a, Some(StyleKind::SuperIdol));
        assert_eq!(summary.style_b, Some(StyleKind::SuperIdol));
        assert_eq!(summary.cheer_count, 6);
    }

    #[test]
    fn test_track_drives_the_show() {
        let summary = run(&config(), &args(900, 1_000, 500)).unwrap();
        // Confetti bursts at 4s and 12s
        assert!(summary.max_particles >= 150);
        assert!(summary.peak_frames <= summary.frames as usize);
    }

    #[test]
    fn test_late_viewer_never_joins() {
        let summary = run(&config(), &args(60, 10_000, 0)).unwrap();
        assert_eq!(summary.style_b, None);
    }
}
