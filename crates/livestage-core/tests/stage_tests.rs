use livestage_core::{
    ConcertSession, ServerMessage, SpectrumAnalyzer, SpectrumAnalyzerConfig, SpectrumSource,
    Stage, StageConfig, StyleKind, VfxTrigger,
};

fn config(seed: u64) -> StageConfig {
    StageConfig {
        seed: Some(seed),
        audience_size: 50,
        ..Default::default()
    }
}

/// Four-on-the-floor kick: a decaying 55Hz burst every half second
fn kick_track(sample_rate: f32, seconds: f32) -> Vec<f32> {
    let total = (sample_rate * seconds) as usize;
    (0..total)
        .map(|i| {
            let t = i as f32 / sample_rate;
            let since_beat = t % 0.5;
            let envelope = (-since_beat * 8.0).exp();
            (2.0 * std::f32::consts::PI * 55.0 * t).sin() * envelope * 0.95
        })
        .collect()
}

fn start(stage: &mut Stage, song: &str, at: i64) {
    stage.handle_server_message(&ServerMessage::init(ConcertSession::new(), at), at);
    stage.handle_server_message(
        &ServerMessage::ConcertStarted {
            start_time: at,
            song_url: song.to_string(),
        },
        at,
    );
}

#[test]
fn test_same_seed_same_show() {
    let mut a = Stage::new(config(7)).unwrap();
    let mut b = Stage::new(config(7)).unwrap();
    start(&mut a, "fast_track.mp3", 0);
    start(&mut b, "fast_track.mp3", 0);
    a.trigger_vfx(VfxTrigger::Confetti);
    b.trigger_vfx(VfxTrigger::Confetti);

    let spectrum = vec![230u8; 1024];
    for tick in 0..240 {
        let now = tick * 16;
        assert_eq!(a.tick(now, Some(&spectrum[..])), b.tick(now, Some(&spectrum[..])));
    }
    for (pa, pb) in a.performers().iter().zip(b.performers()) {
        assert_eq!(pa.skeleton(), pb.skeleton());
    }
    assert_eq!(a.camera().position(), b.camera().position());
}

#[test]
fn test_show_driven_by_analyzer() {
    let sample_rate = 44_100.0;
    let track = kick_track(sample_rate, 4.0);
    let mut analyzer = SpectrumAnalyzer::new(SpectrumAnalyzerConfig::default()).unwrap();
    let mut stage = Stage::new(config(3)).unwrap();
    start(&mut stage, "street_anthem.mp3", 1_000);
    assert_eq!(stage.choreography().style(), StyleKind::StreetVibe);

    // 60 ticks per second of audio
    let chunk = (sample_rate / 60.0) as usize;
    let mut max_bass = 0.0f32;
    for (tick, samples) in track.chunks(chunk).enumerate() {
        analyzer.push_samples(samples);
        analyzer.analyze();
        let now = 1_000 + (tick as i64 * 1000) / 60;
        let report = stage.tick(now, analyzer.frequency_data());
        max_bass = max_bass.max(report.energy.bass);
        assert_eq!(report.formation, "CANON_LINE");
    }
    assert!(max_bass > 0.2, "kick never registered: {}", max_bass);
}

#[test]
fn test_no_audio_means_idle_motion() {
    let mut stage = Stage::new(config(5)).unwrap();
    start(&mut stage, "fast_track.mp3", 0);
    for tick in 0..120 {
        let report = stage.tick(tick * 16, None);
        assert_eq!(report.energy.bass, 0.0);
        assert!(!report.energy.peak);
        assert!(report.cut.is_none());
    }
    assert!(stage.particles().is_empty());
}
