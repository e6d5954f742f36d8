use fondra::{
    ColorPool, ColorScheme, EffectKind, FondraError, GenerationConfig, GenerationPipeline,
};
use rand::SeedableRng;
use rand::rngs::StdRng;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn pool() -> ColorPool {
    ColorPool::new(&mut StdRng::seed_from_u64(1234))
}

fn base_config(seed: u64) -> GenerationConfig {
    let mut cfg = GenerationConfig::new(96, 64);
    cfg.seed = Some(seed);
    cfg
}

#[test]
fn seeded_runs_are_byte_identical() {
    init_tracing();
    let cfg = base_config(2024);
    let a = GenerationPipeline::with_palette(cfg.clone(), pool())
        .unwrap()
        .run()
        .unwrap();
    let b = GenerationPipeline::with_palette(cfg, pool())
        .unwrap()
        .run()
        .unwrap();
    assert_eq!(a.data, b.data);
}

#[test]
fn every_color_scheme_renders() {
    init_tracing();
    for scheme in [
        ColorScheme::Pastel,
        ColorScheme::Vibrant,
        ColorScheme::Ocean,
        ColorScheme::Sunset,
        ColorScheme::Forest,
        ColorScheme::Monochrome,
        ColorScheme::Analogous,
    ] {
        let mut cfg = base_config(3);
        cfg.color_scheme = scheme;
        let img = GenerationPipeline::with_palette(cfg, pool())
            .unwrap()
            .run()
            .unwrap();
        assert_eq!(img.data.len(), 96 * 64 * 3, "{scheme:?}");
    }
}

#[test]
fn effect_order_changes_output() {
    let mut forward = base_config(77);
    forward.effects = vec![EffectKind::Bubbles, EffectKind::Particles];
    let mut reversed = base_config(77);
    reversed.effects = vec![EffectKind::Particles, EffectKind::Bubbles];

    let a = GenerationPipeline::with_palette(forward, pool())
        .unwrap()
        .run()
        .unwrap();
    let b = GenerationPipeline::with_palette(reversed, pool())
        .unwrap()
        .run()
        .unwrap();
    assert_ne!(a.data, b.data);
}

#[test]
fn oversized_config_fails_before_rendering() {
    let cfg = GenerationConfig::new(8193, 8193);
    let err = GenerationPipeline::new(cfg).unwrap_err();
    assert!(matches!(err, FondraError::ConfigInvalid(_)));
}

#[test]
fn out_of_range_knobs_are_clamped_not_rejected() {
    let mut cfg = base_config(9);
    cfg.blur_radius = 50.0;
    cfg.noise_intensity = 3.0;
    cfg.element_density = 100.0;
    let img = GenerationPipeline::with_palette(cfg, pool())
        .unwrap()
        .run()
        .unwrap();
    assert_eq!(img.data.len(), 96 * 64 * 3);
}
