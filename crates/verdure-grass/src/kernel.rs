//! Compute-kernel boundary for parallel placement.
//!
//! A kernel receives the whole instance buffer, the terrain vertex and normal
//! buffers, the density mask and a block of scalar parameters, and fills every
//! record independently. [`CpuKernel`] runs the kernel body on the rayon pool;
//! [`crate::gpu::GpuKernel`] runs the same body as WGSL.

use bytemuck::{Pod, Zeroable};
use glam::{Quat, Vec3, Vec4};
use rayon::prelude::*;
use verdure_core::{GridExtent, PlacementConfig, Result, VerdureError};
use verdure_terrain::DensityMask;

use crate::layout::GrassInstance;
use crate::placement::blade_transform;

/// Cells handled by one workgroup.
pub const WORKGROUP_SIZE: u32 = 64;

/// Uniform block shared with `place_grass.wgsl`. 48 bytes.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct PlacementParams {
    pub size: u32,
    pub terrain_width: u32,
    pub terrain_height: u32,
    pub mask_width: u32,
    pub mask_height: u32,
    pub seed: u32,
    pub cutoff: f32,
    pub mesh_scale: f32,
    pub scale_offset: f32,
    pub position_offset: f32,
    pub stretch_factor: f32,
    pub blade_height: f32,
}

impl PlacementParams {
    pub fn new(
        config: &PlacementConfig,
        terrain: GridExtent,
        mask: GridExtent,
        blade_height: f32,
        seed: u32,
    ) -> Self {
        Self {
            size: config.size,
            terrain_width: terrain.width,
            terrain_height: terrain.height,
            mask_width: mask.width,
            mask_height: mask.height,
            seed,
            cutoff: config.height_cutoff,
            mesh_scale: config.mesh_scale,
            scale_offset: config.scale_offset,
            position_offset: config.position_offset,
            stretch_factor: config.stretch_factor,
            blade_height,
        }
    }

    pub fn cell_count(&self) -> usize {
        self.size as usize * self.size as usize
    }

    pub fn terrain(&self) -> GridExtent {
        GridExtent::new(self.terrain_width, self.terrain_height)
    }

    /// Whether `cell * mask_side` stays within `u32` for every cell, as the
    /// WGSL pixel lookup requires.
    pub fn mask_lookup_fits(&self) -> bool {
        let largest_side = self.mask_width.max(self.mask_height) as u64;
        (self.size.saturating_sub(1) as u64) * largest_side <= u32::MAX as u64
    }
}

/// One instance slot as the kernel sees it. 48 bytes, matching the WGSL
/// `GrassRecord` storage layout.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GrassRecord {
    pub position: [f32; 3],
    /// Non-zero when the cell holds a blade.
    pub valid: u32,
    /// Quaternion, xyzw.
    pub rotation: [f32; 4],
    pub scale: [f32; 3],
    /// Flat placement-grid index this record belongs to.
    pub cell: u32,
}

impl GrassRecord {
    pub fn unplaced(cell: u32) -> Self {
        Self {
            cell,
            ..Self::default()
        }
    }

    pub fn planted(cell: u32, instance: &GrassInstance) -> Self {
        Self {
            position: instance.position.to_array(),
            valid: 1,
            rotation: instance.rotation.to_array(),
            scale: instance.scale.to_array(),
            cell,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid != 0
    }

    pub fn to_instance(&self) -> Option<GrassInstance> {
        self.is_valid().then(|| {
            GrassInstance::new(
                Vec3::from_array(self.position),
                Quat::from_array(self.rotation),
                Vec3::from_array(self.scale),
            )
        })
    }
}

/// Everything a kernel reads. Vertex data is padded to `vec4` as storage
/// buffers require.
pub struct KernelInputs<'a> {
    pub params: PlacementParams,
    pub vertices: &'a [[f32; 4]],
    pub normals: &'a [[f32; 4]],
    pub mask: &'a DensityMask,
}

impl KernelInputs<'_> {
    /// Reject buffers that do not match the parameter block.
    pub fn check(&self, records: &[GrassRecord]) -> Result<()> {
        let cells = self.params.cell_count();
        if records.len() != cells {
            return Err(VerdureError::Resource(format!(
                "instance buffer holds {} records, placement grid needs {}",
                records.len(),
                cells
            )));
        }
        let vertices = self.params.terrain().len();
        if self.vertices.len() != vertices || self.normals.len() != vertices {
            return Err(VerdureError::Resource(format!(
                "terrain buffers hold {} vertices and {} normals, grid needs {}",
                self.vertices.len(),
                self.normals.len(),
                vertices
            )));
        }
        if self.mask.is_empty() {
            return Err(VerdureError::Resource("density mask is empty".into()));
        }
        Ok(())
    }
}

pub trait PlacementKernel {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    /// Fill every record in `records`. Blocks until the results are in
    /// `records`; there is no partial completion.
    fn dispatch(&self, inputs: &KernelInputs<'_>, records: &mut [GrassRecord]) -> Result<()>;
}

/// PCG hash, identical to the WGSL `pcg_hash`.
pub fn pcg_hash(input: u32) -> u32 {
    let state = input.wrapping_mul(747_796_405).wrapping_add(2_891_336_453);
    let word = ((state >> ((state >> 28) + 4)) ^ state).wrapping_mul(277_803_737);
    (word >> 22) ^ word
}

/// Uniform float in `[0, 1)` from the top 24 bits of a hash.
pub fn unit_float(hash: u32) -> f32 {
    (hash >> 8) as f32 / 16_777_216.0
}

/// Kernel body for one cell.
pub fn place_cell(inputs: &KernelInputs<'_>, cell: u32) -> GrassRecord {
    let p = &inputs.params;
    let gx = cell / p.size;
    let gz = cell % p.size;

    if !inputs.mask.is_plantable(gx, gz, p.size, p.cutoff) {
        return GrassRecord::unplaced(cell);
    }

    let mx = gx * (p.terrain_width / p.size);
    let mz = gz * (p.terrain_height / p.size);
    let vertex_index = p.terrain().index(mx, mz);
    let vertex = Vec4::from_array(inputs.vertices[vertex_index]).truncate();
    let normal = Vec4::from_array(inputs.normals[vertex_index]).truncate();

    let mut state = pcg_hash(p.seed ^ pcg_hash(cell));
    state = pcg_hash(state);
    let lo = p.mesh_scale - p.scale_offset;
    let hi = p.mesh_scale + p.scale_offset;
    let scale = lo + (hi - lo) * unit_float(state);

    state = pcg_hash(state);
    let jitter_x = -p.position_offset + 2.0 * p.position_offset * unit_float(state);
    state = pcg_hash(state);
    let jitter_z = -p.position_offset + 2.0 * p.position_offset * unit_float(state);

    let instance = blade_transform(
        vertex,
        normal,
        scale,
        jitter_x,
        jitter_z,
        p.stretch_factor,
        p.blade_height,
    );
    GrassRecord::planted(cell, &instance)
}

/// Runs the kernel body on the rayon thread pool, one task per workgroup.
#[derive(Debug, Clone, Copy, Default)]
pub struct CpuKernel;

impl PlacementKernel for CpuKernel {
    fn name(&self) -> &str {
        "cpu"
    }

    fn dispatch(&self, inputs: &KernelInputs<'_>, records: &mut [GrassRecord]) -> Result<()> {
        inputs.check(records)?;

        let group = WORKGROUP_SIZE as usize;
        records
            .par_chunks_mut(group)
            .enumerate()
            .for_each(|(workgroup, chunk)| {
                let base = workgroup * group;
                for (local, record) in chunk.iter_mut().enumerate() {
                    *record = place_cell(inputs, (base + local) as u32);
                }
            });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layouts_match_wgsl_sizes() {
        assert_eq!(std::mem::size_of::<PlacementParams>(), 48);
        assert_eq!(std::mem::size_of::<GrassRecord>(), 48);
    }

    #[test]
    fn pcg_hash_reference_values() {
        // Must match `pcg_hash` in place_grass.wgsl.
        assert_eq!(pcg_hash(0), 129_708_002);
        assert_eq!(pcg_hash(1), 2_831_084_092);
        assert_eq!(pcg_hash(42), 1_223_963_391);
    }

    #[test]
    fn pcg_hash_has_no_collisions_on_consecutive_inputs() {
        let hashes: Vec<u32> = (0..1024).map(pcg_hash).collect();
        let mut sorted = hashes.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), hashes.len());
    }

    #[test]
    fn mask_lookup_overflow_is_detected() {
        let mask = GridExtent::square(4096);
        let params = |size| {
            PlacementParams::new(
                &PlacementConfig::new(size),
                GridExtent::square(size),
                mask,
                1.0,
                0,
            )
        };
        assert!(params(1024).mask_lookup_fits());
        assert!(!params(2_000_000).mask_lookup_fits());
    }

    #[test]
    fn unit_float_stays_below_one() {
        assert_eq!(unit_float(0), 0.0);
        assert!(unit_float(u32::MAX) < 1.0);
    }

    #[test]
    fn records_round_trip_validity() {
        let empty = GrassRecord::unplaced(7);
        assert!(empty.to_instance().is_none());
        assert_eq!(empty.cell, 7);

        let blade = GrassInstance::from_position(Vec3::ONE);
        let record = GrassRecord::planted(3, &blade);
        assert_eq!(record.to_instance(), Some(blade));
    }

    #[test]
    fn mismatched_buffers_are_rejected() {
        let mask = DensityMask::uniform(4, 4, 0.0);
        let config = PlacementConfig::new(2);
        let params = PlacementParams::new(&config, GridExtent::square(4), mask.extent(), 1.0, 0);
        let vertices = vec![[0.0; 4]; 16];
        let inputs = KernelInputs {
            params,
            vertices: &vertices,
            normals: &vertices,
            mask: &mask,
        };
        let mut records = vec![GrassRecord::default(); 3];
        assert!(matches!(
            CpuKernel.dispatch(&inputs, &mut records),
            Err(VerdureError::Resource(_))
        ));
    }
}
