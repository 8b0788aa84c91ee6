pub mod config;
pub mod error;
pub mod grid;
pub mod mesh;
pub mod transform;

pub use config::{PlacementConfig, PlacementStrategy, TerrainConfig};
pub use error::{ConfigError, GridAxis, Result, VerdureError};
pub use grid::GridExtent;
pub use mesh::{primitives, BoundingBox, Mesh, Vertex};
pub use transform::Transform;

pub use glam;
