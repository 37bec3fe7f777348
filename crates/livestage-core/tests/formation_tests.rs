use livestage_core::{formation::ease_toward, FormationConfig, FormationScheduler, Vec2};
use proptest::prelude::*;

proptest! {
    #[test]
    fn interpolation_matches_closed_form(
        x0 in -100.0f32..100.0, z0 in -100.0f32..100.0,
        x1 in -100.0f32..100.0, z1 in -100.0f32..100.0,
        f in 0.01f32..=1.0,
        n in 0u32..200,
    ) {
        let p0 = Vec2::new(x0, z0);
        let p1 = Vec2::new(x1, z1);
        let mut p = p0;
        for _ in 0..n {
            p = ease_toward(p, p1, f);
        }

        let expected = p1 - (p1 - p0) * (1.0 - f as f64).powi(n as i32) as f32;
        prop_assert!((p - expected).length() < 1e-2, "{:?} vs {:?}", p, expected);
    }

    #[test]
    fn interpolation_never_overshoots(
        x0 in -100.0f32..100.0, z0 in -100.0f32..100.0,
        x1 in -100.0f32..100.0, z1 in -100.0f32..100.0,
        f in 0.01f32..=1.0,
    ) {
        let p0 = Vec2::new(x0, z0);
        let p1 = Vec2::new(x1, z1);
        let mut p = p0;
        let mut distance = (p1 - p0).length();
        for _ in 0..100 {
            p = ease_toward(p, p1, f);
            // Still on the starting side of the target on both axes
            prop_assert!((p.x - p1.x) * (p0.x - p1.x) >= -1e-3);
            prop_assert!((p.y - p1.y) * (p0.y - p1.y) >= -1e-3);
            let next = (p1 - p).length();
            prop_assert!(next <= distance + 1e-4);
            distance = next;
        }
    }
}

#[test]
fn test_scheduler_converges_on_new_formation() {
    let mut scheduler = FormationScheduler::standard(FormationConfig::default()).unwrap();
    let mut positions: Vec<Vec2> = (0..7).map(|slot| scheduler.target(slot)).collect();

    scheduler.select("X_CROSS").unwrap();
    for _ in 0..300 {
        for (slot, position) in positions.iter_mut().enumerate() {
            *position = scheduler.step(*position, slot);
        }
    }
    for (slot, position) in positions.iter().enumerate() {
        assert!((*position - scheduler.target(slot)).length() < 1e-3);
    }
}

#[test]
fn test_time_buckets_rotate_through_catalog() {
    let config = FormationConfig {
        rotation_period_secs: Some(20.0),
        ..Default::default()
    };
    let mut scheduler = FormationScheduler::standard(config).unwrap();
    let mut seen = Vec::new();
    for bucket in 0..4 {
        scheduler.select_for_time(0, bucket as f64 * 20.0 + 1.0);
        seen.push(scheduler.active().name.clone());
    }
    assert_eq!(seen, vec!["V_SHAPE", "DIAMOND", "X_CROSS", "CANON_LINE"]);

    // Negative or zero elapsed time stays on the base
    assert!(scheduler.select_for_time(2, -5.0));
    assert_eq!(scheduler.active().name, "X_CROSS");
}
