//! Headless Verdure run: generate terrain, place grass and submit a few
//! frames of instanced draws to a logging renderer.
//!
//! ```text
//! verdure-demo [--config verdure.toml] [--mask mask.png] [--gpu]
//! ```

mod perlin;
mod settings;

use std::path::{Path, PathBuf};

use verdure_core::{Result, VerdureError};
use verdure_grass::{CpuKernel, GpuKernel, GrassField, InstanceSink, InstancedDraw, PlacementKernel};
use verdure_terrain::DensityMask;

use crate::perlin::PerlinNoise;
use crate::settings::DemoSettings;

#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    mask: Option<PathBuf>,
    gpu: bool,
}

fn parse_args() -> Args {
    let mut args = Args::default();
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => args.config = iter.next().map(PathBuf::from),
            "--mask" => args.mask = iter.next().map(PathBuf::from),
            "--gpu" => args.gpu = true,
            other => log::warn!("Ignoring unknown argument {}", other),
        }
    }
    args
}

/// Stands in for a renderer: logs what would be drawn.
#[derive(Default)]
struct LogSink {
    frame: u32,
}

impl InstanceSink for LogSink {
    fn draw_instanced(&mut self, draw: &InstancedDraw<'_>) {
        self.frame += 1;
        log::debug!(
            "frame {}: {} blades, {} vertices each, defines {:?}, wind {:.2}",
            self.frame,
            draw.transforms.len(),
            draw.mesh.vertices.len(),
            draw.shader_defines,
            draw.uniforms.wind_strength
        );
    }
}

fn load_mask(path: &Path) -> Result<DensityMask> {
    let image = image::open(path)
        .map_err(|e| VerdureError::Resource(format!("{}: {}", path.display(), e)))?;
    Ok(DensityMask::from_image(&image)?)
}

fn pick_kernel(use_gpu: bool) -> Box<dyn PlacementKernel> {
    if use_gpu {
        match GpuKernel::new() {
            Ok(kernel) => return Box::new(kernel),
            Err(e) => log::warn!("GPU placement unavailable ({}), using CPU kernel", e),
        }
    }
    Box::new(CpuKernel)
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args = parse_args();
    let settings = match &args.config {
        Some(path) => settings::load(path)?,
        None => DemoSettings::default(),
    };
    let mask = args.mask.as_deref().map(load_mask).transpose()?;
    let kernel = pick_kernel(args.gpu);

    let field = GrassField::from_noise(
        settings.field.clone(),
        settings.blade.mesh(),
        &PerlinNoise,
        &settings.noise,
        mask,
        kernel.as_ref(),
    )?;

    if let Some(terrain) = field.terrain() {
        log::info!(
            "Terrain: {} vertices, {} triangles",
            terrain.vertex_count(),
            terrain.triangle_count()
        );
    }

    let mut sink = LogSink::default();
    let mut drawn = 0;
    for _ in 0..settings.frames {
        if field.draw(&mut sink) {
            drawn += 1;
        }
    }
    log::info!(
        "Drew {} of {} frames with {} blades ({:?})",
        drawn,
        settings.frames,
        field.instance_count(),
        field.state()
    );

    Ok(())
}
