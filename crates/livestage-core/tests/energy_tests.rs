use livestage_core::{
    BandLayout, EnergyExtractor, SpectrumAnalyzer, SpectrumAnalyzerConfig, SpectrumSource,
};
use proptest::prelude::*;

proptest! {
    #[test]
    fn bands_invariant_under_doubled_resolution(bins in prop::collection::vec(any::<u8>(), 1024)) {
        let extractor = EnergyExtractor::default();
        let doubled: Vec<u8> = bins.iter().flat_map(|&b| [b, b]).collect();

        let coarse = extractor.extract(Some(bins.as_slice()));
        let fine = extractor.extract(Some(doubled.as_slice()));

        prop_assert!((coarse.bass - fine.bass).abs() < 1e-6);
        prop_assert!((coarse.mid - fine.mid).abs() < 1e-6);
        prop_assert!((coarse.high - fine.high).abs() < 1e-6);
        prop_assert_eq!(coarse.peak, fine.peak);
    }

    #[test]
    fn bands_stay_normalized(bins in prop::collection::vec(any::<u8>(), 0..3000)) {
        let frame = EnergyExtractor::default().extract(Some(bins.as_slice()));
        for value in [frame.bass, frame.mid, frame.high] {
            prop_assert!((0.0..=1.0).contains(&value));
        }
    }
}

#[test]
fn test_custom_layout() {
    let layout = BandLayout {
        bass_end: 0.25,
        mid_end: 0.5,
        high_end: 1.0,
        peak_threshold: 0.5,
    };
    let extractor = EnergyExtractor::new(layout).unwrap();
    let frame = extractor.extract(Some(&[255, 255, 0, 0, 0, 0, 255, 255][..]));
    assert_eq!(frame.bass, 1.0);
    assert_eq!(frame.mid, 0.0);
    assert_eq!(frame.high, 0.5);
    assert!(frame.peak);
}

#[test]
fn test_analyzer_feeds_extractor() {
    let config = SpectrumAnalyzerConfig {
        smoothing: 0.5,
        ..Default::default()
    };
    let mut analyzer = SpectrumAnalyzer::new(config).unwrap();
    let extractor = EnergyExtractor::default();

    // Nothing analyzed yet
    assert_eq!(extractor.extract_from(&analyzer).bass, 0.0);

    let sample_rate = 44_100.0;
    let tone: Vec<f32> = (0..2048)
        .map(|i| (2.0 * std::f32::consts::PI * 60.0 * i as f32 / sample_rate).sin() * 0.9)
        .collect();
    for _ in 0..8 {
        analyzer.push_samples(&tone);
        analyzer.analyze();
    }

    let frame = extractor.extract(analyzer.frequency_data());
    assert!(frame.bass > 0.2, "bass too low: {}", frame.bass);
    assert!(frame.bass > frame.high);
}
