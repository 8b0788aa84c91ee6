//! Terrain plus the grass planted on it, ready to draw every frame.
//!
//! Placement runs once, when the field is built. Afterwards [`GrassField::draw`]
//! only reads the stored transforms and the current material.

use glam::Mat4;
use serde::{Deserialize, Serialize};
use verdure_core::{ConfigError, Mesh, PlacementConfig, Result, TerrainConfig, VerdureError};
use verdure_terrain::{DensityMask, FbmParams, HeightField, NoiseSource, TerrainMesh, TerrainMeshBuilder};

use crate::kernel::PlacementKernel;
use crate::layout::GrassLayout;
use crate::material::{GrassMaterial, GrassUniforms};
use crate::placement::PlacementEngine;

/// Everything needed to grow a field, loadable from a config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrassFieldConfig {
    pub terrain: TerrainConfig,
    pub placement: PlacementConfig,
    pub material: GrassMaterial,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawState {
    Ready,
    /// Set once at build time and never cleared.
    Disabled(ConfigError),
}

impl DrawState {
    pub fn is_ready(&self) -> bool {
        matches!(self, DrawState::Ready)
    }
}

/// One instanced draw call: the blade mesh repeated once per transform.
pub struct InstancedDraw<'a> {
    pub mesh: &'a Mesh,
    pub submesh_index: u32,
    pub uniforms: GrassUniforms,
    pub shader_defines: &'static [&'static str],
    pub transforms: &'a [Mat4],
}

/// Renderer side of the field. Receives one call per frame.
pub trait InstanceSink {
    fn draw_instanced(&mut self, draw: &InstancedDraw<'_>);
}

struct Planted {
    terrain: TerrainMesh,
    mask: DensityMask,
    layout: GrassLayout,
    transforms: Vec<Mat4>,
}

pub struct GrassField {
    blade: Mesh,
    material: GrassMaterial,
    state: DrawState,
    planted: Option<Planted>,
}

impl GrassField {
    /// Mesh `heights`, place grass over it and keep the result.
    ///
    /// Configuration problems do not fail the build: the field comes back
    /// with [`DrawState::Disabled`] and draws nothing. Device and resource
    /// failures during placement are returned as errors.
    pub fn build(
        config: GrassFieldConfig,
        blade: Mesh,
        heights: &HeightField,
        mask: Option<DensityMask>,
        kernel: &dyn PlacementKernel,
    ) -> Result<Self> {
        let GrassFieldConfig {
            terrain,
            placement,
            material,
        } = config;

        let (state, planted) = match Self::plant(&terrain, &placement, &blade, heights, mask, kernel) {
            Ok(planted) => (DrawState::Ready, Some(planted)),
            Err(VerdureError::Configuration(error)) => {
                log::error!("Grass disabled: {}", error);
                (DrawState::Disabled(error), None)
            }
            Err(error) => return Err(error),
        };

        Ok(Self {
            blade,
            material,
            state,
            planted,
        })
    }

    /// Like [`GrassField::build`], with heights taken from `noise`. The
    /// placement grid is checked before any noise is generated.
    pub fn from_noise(
        config: GrassFieldConfig,
        blade: Mesh,
        noise: &dyn NoiseSource,
        params: &FbmParams,
        mask: Option<DensityMask>,
        kernel: &dyn PlacementKernel,
    ) -> Result<Self> {
        let checked = config
            .terrain
            .validate()
            .and_then(|()| config.placement.validate(config.terrain.extent()));
        if let Err(error) = checked {
            log::error!("Grass disabled: {}", error);
            return Ok(Self {
                blade,
                material: config.material,
                state: DrawState::Disabled(error),
                planted: None,
            });
        }

        let heights = noise.generate_noise_map(config.terrain.width, config.terrain.height, params);
        Self::build(config, blade, &heights, mask, kernel)
    }

    fn plant(
        terrain_config: &TerrainConfig,
        placement: &PlacementConfig,
        blade: &Mesh,
        heights: &HeightField,
        mask: Option<DensityMask>,
        kernel: &dyn PlacementKernel,
    ) -> Result<Planted> {
        let builder = TerrainMeshBuilder::new(terrain_config)?;
        placement.validate(terrain_config.extent())?;
        let terrain = builder.build(heights)?;
        let mask = mask.unwrap_or_else(|| DensityMask::from_height_field(heights));

        let blade_height = blade.bounds.size().y;
        let layout = PlacementEngine::new(placement, &terrain, &mask, blade_height)?.place(kernel)?;
        let transforms = layout.matrices();

        Ok(Planted {
            terrain,
            mask,
            layout,
            transforms,
        })
    }

    pub fn state(&self) -> &DrawState {
        &self.state
    }

    pub fn blade(&self) -> &Mesh {
        &self.blade
    }

    pub fn material(&self) -> &GrassMaterial {
        &self.material
    }

    /// Takes effect on the next [`GrassField::draw`].
    pub fn set_material(&mut self, material: GrassMaterial) {
        self.material = material;
    }

    pub fn terrain(&self) -> Option<&TerrainMesh> {
        self.planted.as_ref().map(|p| &p.terrain)
    }

    pub fn density_mask(&self) -> Option<&DensityMask> {
        self.planted.as_ref().map(|p| &p.mask)
    }

    pub fn layout(&self) -> Option<&GrassLayout> {
        self.planted.as_ref().map(|p| &p.layout)
    }

    pub fn instance_count(&self) -> usize {
        self.planted.as_ref().map_or(0, |p| p.transforms.len())
    }

    /// Submit this frame's draw. Returns `false` when the field is disabled.
    pub fn draw(&self, sink: &mut dyn InstanceSink) -> bool {
        let Some(planted) = self.planted.as_ref().filter(|_| self.state.is_ready()) else {
            return false;
        };

        sink.draw_instanced(&InstancedDraw {
            mesh: &self.blade,
            submesh_index: 0,
            uniforms: self.material.uniforms(),
            shader_defines: self.material.coloration.shader_defines(),
            transforms: &planted.transforms,
        });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::CpuKernel;
    use crate::material::ColorationMode;
    use verdure_core::primitives;

    #[derive(Default)]
    struct Counter {
        draws: usize,
        instances: usize,
        defines: Vec<&'static str>,
    }

    impl InstanceSink for Counter {
        fn draw_instanced(&mut self, draw: &InstancedDraw<'_>) {
            self.draws += 1;
            self.instances = draw.transforms.len();
            self.defines = draw.shader_defines.to_vec();
        }
    }

    fn config(side: u32, size: u32) -> GrassFieldConfig {
        GrassFieldConfig {
            terrain: TerrainConfig::new(side, side),
            placement: PlacementConfig::new(size).with_seed(1),
            material: GrassMaterial::default(),
        }
    }

    #[test]
    fn ready_field_draws_once_per_frame() {
        let heights = HeightField::new(8, 8);
        let blade = primitives::create_blade(0.1, 1.0, 3);
        let mut field = GrassField::build(config(8, 4), blade, &heights, None, &CpuKernel).unwrap();
        assert!(field.state().is_ready());
        assert_eq!(field.instance_count(), 16);

        let mut sink = Counter::default();
        assert!(field.draw(&mut sink));
        field.set_material(GrassMaterial::new().with_coloration(ColorationMode::Noise));
        assert!(field.draw(&mut sink));
        assert_eq!(sink.draws, 2);
        assert_eq!(sink.instances, 16);
        assert_eq!(sink.defines, ["USE_NOISE"]);
    }

    #[test]
    fn mismatched_height_field_disables_drawing() {
        let heights = HeightField::new(4, 4);
        let blade = primitives::create_blade(0.1, 1.0, 3);
        let field = GrassField::build(config(8, 4), blade, &heights, None, &CpuKernel).unwrap();
        assert!(matches!(
            field.state(),
            DrawState::Disabled(ConfigError::ExtentMismatch { .. })
        ));
        assert!(field.terrain().is_none());
        assert!(!field.draw(&mut Counter::default()));
    }
}
