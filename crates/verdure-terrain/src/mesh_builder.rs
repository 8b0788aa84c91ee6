//! Height field to triangle mesh conversion.

use glam::{Vec2, Vec3};
use verdure_core::{ConfigError, GridExtent, Mesh, TerrainConfig, Vertex};

use crate::heightmap::HeightField;

/// Triangulated terrain surface. One vertex per height sample, stored with the
/// same flattening as the height field.
#[derive(Debug, Clone)]
pub struct TerrainMesh {
    extent: GridExtent,
    mesh: Mesh,
}

impl TerrainMesh {
    pub fn extent(&self) -> GridExtent {
        self.extent
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.mesh.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.mesh.indices
    }

    pub fn vertex_count(&self) -> usize {
        self.mesh.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.mesh.triangle_count()
    }

    pub fn vertex(&self, x: u32, z: u32) -> &Vertex {
        &self.mesh.vertices[self.extent.index(x, z)]
    }

    /// Positions padded to 16 bytes for storage-buffer upload.
    pub fn positions_padded(&self) -> Vec<[f32; 4]> {
        self.mesh
            .vertices
            .iter()
            .map(|v| v.position.extend(1.0).to_array())
            .collect()
    }

    /// Normals padded to 16 bytes for storage-buffer upload.
    pub fn normals_padded(&self) -> Vec<[f32; 4]> {
        self.mesh
            .vertices
            .iter()
            .map(|v| v.normal.extend(0.0).to_array())
            .collect()
    }

    pub fn into_mesh(self) -> Mesh {
        self.mesh
    }
}

pub struct TerrainMeshBuilder {
    config: TerrainConfig,
}

impl TerrainMeshBuilder {
    pub fn new(config: &TerrainConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config: config.clone(),
        })
    }

    pub fn config(&self) -> &TerrainConfig {
        &self.config
    }

    pub fn build(&self, field: &HeightField) -> Result<TerrainMesh, ConfigError> {
        let extent = self.config.extent();
        if field.extent() != extent {
            return Err(ConfigError::ExtentMismatch {
                expected: extent,
                actual: field.extent(),
            });
        }

        let width = extent.width as f32;
        let height = extent.height as f32;
        let spacing = self.config.spacing;

        let mut vertices = Vec::with_capacity(extent.len());
        for (x, z) in extent.iter() {
            let u = x as f32 / width;
            let v = z as f32 / height;
            let position = Vec3::new(
                (u - 0.5) * spacing,
                field.get(x, z) * self.config.height_multiplier,
                (v - 0.5) * spacing,
            );
            vertices.push(Vertex::new(position, Vec3::ZERO, Vec2::new(u, v)));
        }

        let quads = (extent.width as usize - 1) * (extent.height as usize - 1);
        let mut indices = Vec::with_capacity(quads * 6);
        for x in 0..extent.width - 1 {
            for z in 0..extent.height - 1 {
                let here = extent.index(x, z) as u32;
                let across = extent.index(x + 1, z + 1) as u32;
                let next_x = extent.index(x + 1, z) as u32;
                let next_z = extent.index(x, z + 1) as u32;

                indices.extend_from_slice(&[here, across, next_x]);
                indices.extend_from_slice(&[across, here, next_z]);
            }
        }

        let mut mesh = Mesh::new(vertices, indices);
        mesh.recalculate_normals();

        log::debug!(
            "Built {} terrain mesh: {} vertices, {} triangles",
            extent,
            mesh.vertices.len(),
            mesh.triangle_count()
        );

        Ok(TerrainMesh { extent, mesh })
    }
}

/// One-shot helper around [`TerrainMeshBuilder`].
pub fn build_terrain_mesh(
    field: &HeightField,
    config: &TerrainConfig,
) -> Result<TerrainMesh, ConfigError> {
    TerrainMeshBuilder::new(config)?.build(field)
}
