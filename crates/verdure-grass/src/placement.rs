//! Per-cell grass transforms over a `size x size` placement grid.
//!
//! Every cell maps to one terrain vertex. The density mask decides whether the
//! cell is planted; if it is, the blade sits on the vertex, leans along the
//! vertex normal, and gets a random scale and XZ jitter. The serial path draws
//! from one `StdRng` stream in cell order. The parallel path hands the whole
//! grid to a [`PlacementKernel`] that derives each cell's draws from a hash of
//! the seed and the cell index, so any execution order gives the same result.
//!
//! Both paths agree exactly on which cells are planted. The random draws
//! differ, but come from the same ranges.

use std::time::Instant;

use glam::{Quat, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use verdure_core::{ConfigError, PlacementConfig, PlacementStrategy, Result};
use verdure_terrain::{DensityMask, TerrainMesh};

use crate::kernel::{GrassRecord, KernelInputs, PlacementKernel, PlacementParams};
use crate::layout::{GrassInstance, GrassLayout};

/// Shortest-arc rotation taking the blade's up axis onto `normal`. A
/// degenerate normal leaves the blade upright.
pub fn rotation_from_up(normal: Vec3) -> Quat {
    let normal = normal.try_normalize().unwrap_or(Vec3::Y);
    Quat::from_rotation_arc(Vec3::Y, normal)
}

/// Transform of one blade standing on `vertex`.
///
/// The blade primitive is centred on its origin, so it is lifted by half of
/// its stretched height to put its base on the ground.
pub fn blade_transform(
    vertex: Vec3,
    normal: Vec3,
    scale: f32,
    jitter_x: f32,
    jitter_z: f32,
    stretch_factor: f32,
    blade_height: f32,
) -> GrassInstance {
    let lift = blade_height * scale * stretch_factor * 0.5;
    GrassInstance::new(
        vertex + Vec3::new(jitter_x, lift, jitter_z),
        rotation_from_up(normal),
        Vec3::new(scale, scale * stretch_factor, scale),
    )
}

/// Fold a 64-bit seed into the 32 bits a kernel hashes from.
pub fn kernel_seed(seed: Option<u64>) -> u32 {
    match seed {
        Some(seed) => (seed ^ (seed >> 32)) as u32,
        None => rand::random(),
    }
}

pub struct PlacementEngine<'a> {
    config: &'a PlacementConfig,
    terrain: &'a TerrainMesh,
    mask: &'a DensityMask,
    blade_height: f32,
}

impl<'a> PlacementEngine<'a> {
    /// `blade_height` is the Y extent of the unscaled blade mesh.
    pub fn new(
        config: &'a PlacementConfig,
        terrain: &'a TerrainMesh,
        mask: &'a DensityMask,
        blade_height: f32,
    ) -> std::result::Result<Self, ConfigError> {
        config.validate(terrain.extent())?;
        if mask.is_empty() {
            return Err(ConfigError::EmptyDensityMask);
        }
        if !blade_height.is_finite() || blade_height < 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "blade_height",
                value: blade_height,
            });
        }
        Ok(Self {
            config,
            terrain,
            mask,
            blade_height,
        })
    }

    pub fn config(&self) -> &PlacementConfig {
        self.config
    }

    /// Run whichever strategy the configuration selects. `kernel` is only
    /// used by the parallel strategy.
    pub fn place(&self, kernel: &dyn PlacementKernel) -> Result<GrassLayout> {
        let start = Instant::now();
        log::info!(
            "Placing grass: {}x{} cells on {} terrain ({:?})",
            self.config.size,
            self.config.size,
            self.terrain.extent(),
            self.config.strategy
        );

        let layout = match self.config.strategy {
            PlacementStrategy::Serial => self.place_serial(),
            PlacementStrategy::Parallel => self.place_parallel(kernel)?,
        };

        log::info!(
            "Grass placement finished in {:.2?}: {} planted, {} empty",
            start.elapsed(),
            layout.planted_count(),
            layout.empty_count()
        );
        Ok(layout)
    }

    /// Single-threaded placement in cell order.
    pub fn place_serial(&self) -> GrassLayout {
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let size = self.config.size;
        let (step_x, step_z) = self.config.terrain_ratio(self.terrain.extent());
        let (lo, hi) = self.config.scale_range();
        let offset = self.config.position_offset;

        let mut slots = Vec::with_capacity(self.config.cell_count());
        for gx in 0..size {
            for gz in 0..size {
                if !self
                    .mask
                    .is_plantable(gx, gz, size, self.config.height_cutoff)
                {
                    slots.push(None);
                    continue;
                }

                let vertex = self.terrain.vertex(gx * step_x, gz * step_z);
                let scale = rng.gen_range(lo..=hi);
                let jitter_x = rng.gen_range(-offset..=offset);
                let jitter_z = rng.gen_range(-offset..=offset);

                slots.push(Some(blade_transform(
                    vertex.position,
                    vertex.normal,
                    scale,
                    jitter_x,
                    jitter_z,
                    self.config.stretch_factor,
                    self.blade_height,
                )));
            }
        }

        GrassLayout::from_slots(size, slots)
    }

    /// Upload the terrain and mask once, dispatch one kernel invocation per
    /// cell, then read back and keep only valid records.
    pub fn place_parallel(&self, kernel: &dyn PlacementKernel) -> Result<GrassLayout> {
        let params = PlacementParams::new(
            self.config,
            self.terrain.extent(),
            self.mask.extent(),
            self.blade_height,
            kernel_seed(self.config.seed),
        );
        let vertices = self.terrain.positions_padded();
        let normals = self.terrain.normals_padded();
        let inputs = KernelInputs {
            params,
            vertices: &vertices,
            normals: &normals,
            mask: self.mask,
        };

        let cells = self.config.cell_count();
        let mut records: Vec<GrassRecord> =
            (0..cells as u32).map(GrassRecord::unplaced).collect();

        log::debug!("Dispatching {} cells to {} kernel", cells, kernel.name());
        kernel.dispatch(&inputs, &mut records)?;

        let mut slots = vec![None; cells];
        for record in &records {
            let cell = record.cell as usize;
            if cell < cells {
                slots[cell] = record.to_instance();
            } else {
                log::warn!("Kernel wrote record for out-of-range cell {}", cell);
            }
        }

        Ok(GrassLayout::from_slots(self.config.size, slots))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::CpuKernel;
    use verdure_core::TerrainConfig;
    use verdure_terrain::{HeightField, TerrainMeshBuilder};

    fn flat_terrain(side: u32) -> TerrainMesh {
        let config = TerrainConfig::new(side, side);
        let builder = TerrainMeshBuilder::new(&config).unwrap();
        builder.build(&HeightField::new(side, side)).unwrap()
    }

    #[test]
    fn upright_normal_gives_identity_rotation() {
        assert!(rotation_from_up(Vec3::Y).abs_diff_eq(Quat::IDENTITY, 1e-6));
        assert!(rotation_from_up(Vec3::ZERO).abs_diff_eq(Quat::IDENTITY, 1e-6));
    }

    #[test]
    fn rotation_maps_up_onto_normal() {
        let normal = Vec3::new(1.0, 1.0, 0.0).normalize();
        let rotated = rotation_from_up(normal) * Vec3::Y;
        assert!(rotated.abs_diff_eq(normal, 1e-5));
    }

    #[test]
    fn blade_is_lifted_by_half_its_stretched_height() {
        let t = blade_transform(Vec3::ZERO, Vec3::Y, 2.0, 0.1, -0.1, 1.5, 1.0);
        assert!((t.position.y - 1.5).abs() < 1e-6);
        assert_eq!(t.position.x, 0.1);
        assert_eq!(t.position.z, -0.1);
        assert_eq!(t.scale, Vec3::new(2.0, 3.0, 2.0));
    }

    #[test]
    fn seeded_serial_placement_is_reproducible() {
        let terrain = flat_terrain(8);
        let mask = DensityMask::uniform(8, 8, 0.0);
        let config = PlacementConfig::new(4).with_seed(11);
        let engine = PlacementEngine::new(&config, &terrain, &mask, 1.0).unwrap();
        assert_eq!(engine.place_serial(), engine.place_serial());
    }

    #[test]
    fn strategy_selects_path() {
        let terrain = flat_terrain(8);
        let mask = DensityMask::uniform(8, 8, 0.0);
        let config = PlacementConfig::new(4)
            .with_seed(5)
            .with_strategy(PlacementStrategy::Parallel);
        let engine = PlacementEngine::new(&config, &terrain, &mask, 1.0).unwrap();
        let via_place = engine.place(&CpuKernel).unwrap();
        assert_eq!(via_place, engine.place_parallel(&CpuKernel).unwrap());
    }

    #[test]
    fn rejects_empty_mask_and_bad_blade_height() {
        let terrain = flat_terrain(8);
        let config = PlacementConfig::new(4);
        let empty = DensityMask::uniform(0, 0, 0.0);
        assert_eq!(
            PlacementEngine::new(&config, &terrain, &empty, 1.0).err(),
            Some(ConfigError::EmptyDensityMask)
        );
        let mask = DensityMask::uniform(8, 8, 0.0);
        assert!(PlacementEngine::new(&config, &terrain, &mask, f32::NAN).is_err());
    }
}
