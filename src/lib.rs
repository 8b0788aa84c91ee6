//! Verdure - procedural terrain with instanced grass
//!
//! A height field becomes a terrain mesh, a density mask decides where grass
//! may grow, and the placement engine produces one transform per blade,
//! serially or through a compute kernel. The result is drawn with a single
//! instanced call per frame.

pub use verdure_core as core;
pub use verdure_grass as grass;
pub use verdure_terrain as terrain;

pub mod prelude {
    pub use crate::core::{
        primitives, ConfigError, GridExtent, Mesh, PlacementConfig, PlacementStrategy, Result,
        TerrainConfig, Transform, VerdureError,
    };
    pub use crate::grass::{
        ColorationMode, CpuKernel, DrawState, GpuKernel, GrassField, GrassFieldConfig,
        GrassLayout, GrassMaterial, InstanceSink, InstancedDraw, PlacementEngine, PlacementKernel,
    };
    pub use crate::terrain::{
        DensityMask, FbmParams, HeightField, NoiseSource, TerrainMesh, TerrainMeshBuilder,
    };

    pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
}
