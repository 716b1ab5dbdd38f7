//! Integration tests: pipeline → renderer → files on disk.

use rand::rngs::StdRng;
use rand::SeedableRng;

use latsynth_core::pipeline::generate_projection;
use latsynth_core::types::{DefectConfig, GenerationParams, NoiseConfig};
use latsynth_geometry::shapes::ShapeSpec;
use latsynth_geometry::transform::EulerAngles;
use latsynth_geometry::vertex_table::VertexLibrary;
use latsynth_render::{OutputPaths, RenderConfig, RenderError, Renderer, SecondaryBlur};

fn cube_params() -> GenerationParams {
    let mut params = GenerationParams::new(ShapeSpec::cube(5, 0.75).unwrap());
    params.angles = EulerAngles::new(20.0, 10.0, 0.0);
    params.defects = DefectConfig::new(0.1);
    params.noise = NoiseConfig::new(0.05);
    params
}

fn render_seeded(seed: u64, config: RenderConfig) -> latsynth_render::RenderedImage {
    let mut rng = StdRng::seed_from_u64(seed);
    let projection = generate_projection(&cube_params(), &VertexLibrary::new(), &mut rng).unwrap();
    let mut renderer = Renderer::new(config).unwrap();
    renderer.render(&projection, 5, &mut rng).unwrap()
}

#[test]
fn test_seeded_render_is_bit_identical() {
    let a = render_seeded(77, RenderConfig::default());
    let b = render_seeded(77, RenderConfig::default());
    let c = render_seeded(78, RenderConfig::default());
    assert_eq!(a.sharp, b.sharp);
    assert_ne!(a.sharp, c.sharp);
}

#[test]
fn test_write_sharp_and_blurred() {
    let dir = tempfile::tempdir().unwrap();
    let config = RenderConfig {
        secondary_blur: Some(SecondaryBlur::gaussian(5)),
        ..Default::default()
    };
    let rendered = render_seeded(1, config);
    let paths = OutputPaths {
        sharp: dir.path().join("Cube W5 RX20 RY10 D10 0.png"),
        blurred: Some(dir.path().join("Train").join("RX20").join("Cube W5 RX20 RY10 D10 0 B5.png")),
    };
    rendered.write(&paths).unwrap();

    let sharp = image::open(&paths.sharp).unwrap();
    assert_eq!((sharp.width(), sharp.height()), (210, 210));
    let blurred = image::open(paths.blurred.as_ref().unwrap()).unwrap();
    assert_eq!((blurred.width(), blurred.height()), (128, 128));
}

#[test]
fn test_unwritable_path_is_io_error_without_leftovers() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, b"not a directory").unwrap();

    let rendered = render_seeded(2, RenderConfig::default());
    let paths = OutputPaths {
        sharp: blocker.join("out.png"),
        blurred: None,
    };
    let err = rendered.write(&paths).unwrap_err();
    assert!(matches!(err, RenderError::Io { .. }), "got {err}");
    assert!(!paths.sharp.exists());

    let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
    assert_eq!(entries.len(), 1, "only the blocker file should exist");
}

#[test]
fn test_failed_variant_rolls_back_sharp_image() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("Train");
    std::fs::write(&blocker, b"not a directory").unwrap();

    let config = RenderConfig {
        secondary_blur: Some(SecondaryBlur::boxed(4)),
        ..Default::default()
    };
    let rendered = render_seeded(3, config);
    let paths = OutputPaths {
        sharp: dir.path().join("sharp.png"),
        blurred: Some(blocker.join("RX0").join("blurred.png")),
    };
    assert!(rendered.write(&paths).is_err());
    assert!(!paths.sharp.exists());
}
