use verdure::prelude::*;
use verdure::terrain::FlatNoise;

#[derive(Default)]
struct Frames(Vec<usize>);

impl InstanceSink for Frames {
    fn draw_instanced(&mut self, draw: &InstancedDraw<'_>) {
        assert_eq!(draw.submesh_index, 0);
        self.0.push(draw.transforms.len());
    }
}

#[test]
fn noise_to_draw_calls() {
    let config = GrassFieldConfig {
        terrain: TerrainConfig::new(32, 32).with_spacing(16.0),
        placement: PlacementConfig::new(8)
            .with_strategy(PlacementStrategy::Parallel)
            .with_seed(21),
        material: GrassMaterial::new().with_coloration(ColorationMode::Color),
    };
    let blade = primitives::create_blade(0.1, 1.0, 3);
    // Half the terrain sits above the cutoff.
    let mask = DensityMask::from_fn(32, 32, |x, _| if x < 16 { 0.2 } else { 0.9 });

    let field = GrassField::from_noise(
        config,
        blade,
        &FlatNoise { level: 0.5 },
        &FbmParams::default(),
        Some(mask),
        &CpuKernel,
    )
    .unwrap();

    assert_eq!(field.state(), &DrawState::Ready);
    let layout = field.layout().unwrap();
    assert_eq!(layout.planted_count(), 32);
    assert!(layout.slot(3, 7).is_some());
    assert!(layout.slot(4, 0).is_none());

    let terrain = field.terrain().unwrap();
    assert!(terrain.vertices().iter().all(|v| v.position.y == 5.0));

    let mut frames = Frames::default();
    for _ in 0..4 {
        assert!(field.draw(&mut frames));
    }
    assert_eq!(frames.0, vec![32; 4]);
}

#[test]
fn bad_placement_grid_skips_noise_generation() {
    struct Panicking;
    impl NoiseSource for Panicking {
        fn generate_noise_map(&self, _: u32, _: u32, _: &FbmParams) -> HeightField {
            panic!("noise should not run for an invalid grid");
        }
    }

    let config = GrassFieldConfig {
        terrain: TerrainConfig::new(10, 10),
        placement: PlacementConfig::new(3),
        ..GrassFieldConfig::default()
    };
    let field = GrassField::from_noise(
        config,
        primitives::create_blade(0.1, 1.0, 2),
        &Panicking,
        &FbmParams::default(),
        None,
        &CpuKernel,
    )
    .unwrap();

    assert!(!field.state().is_ready());
    assert!(!field.draw(&mut Frames::default()));
}
