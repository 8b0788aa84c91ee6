//! Instanced grass over procedural terrain.
//!
//! [`PlacementEngine`] turns a terrain mesh and a density mask into one
//! transform per planted cell, either serially or through a
//! [`PlacementKernel`] ([`CpuKernel`] on rayon, [`GpuKernel`] on wgpu).
//! [`GrassField`] ties terrain, placement and material together and submits
//! one instanced draw per frame.

pub mod field;
pub mod gpu;
pub mod kernel;
pub mod layout;
pub mod material;
pub mod placement;

pub use field::{DrawState, GrassField, GrassFieldConfig, InstanceSink, InstancedDraw};
pub use gpu::GpuKernel;
pub use kernel::{
    pcg_hash, place_cell, unit_float, CpuKernel, GrassRecord, KernelInputs, PlacementKernel,
    PlacementParams, WORKGROUP_SIZE,
};
pub use layout::{GrassInstance, GrassLayout};
pub use material::{ColorationMode, FogParams, GrassMaterial, GrassUniforms, WindParams};
pub use placement::{blade_transform, kernel_seed, rotation_from_up, PlacementEngine};
