//! Terrain side of the pipeline: height fields, the terrain mesh and the
//! density mask grass placement reads from.

pub mod density;
pub mod heightmap;
pub mod mesh_builder;
pub mod noise;

pub use density::{grayscale, DensityMask};
pub use heightmap::HeightField;
pub use mesh_builder::{build_terrain_mesh, TerrainMesh, TerrainMeshBuilder};
pub use noise::{FbmParams, FlatNoise, NoiseSource};
