//! Terrain and placement configuration.
//!
//! Configurations are built once, validated once, and then passed by reference
//! into the mesh builder and the placement engine. Nothing mutates them later.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, GridAxis};
use crate::grid::GridExtent;

/// Terrain grid resolution and world-space layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// Samples along X.
    pub width: u32,
    /// Samples along Z.
    pub height: u32,
    /// World-space side length the grid is spread over.
    pub spacing: f32,
    /// Multiplier applied to every height sample.
    pub height_multiplier: f32,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            width: 256,
            height: 256,
            spacing: 100.0,
            height_multiplier: 10.0,
        }
    }
}

impl TerrainConfig {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn with_spacing(mut self, spacing: f32) -> Self {
        self.spacing = spacing;
        self
    }

    pub fn with_height_multiplier(mut self, multiplier: f32) -> Self {
        self.height_multiplier = multiplier;
        self
    }

    pub fn extent(&self) -> GridExtent {
        GridExtent::new(self.width, self.height)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width < 2 || self.height < 2 {
            return Err(ConfigError::GridTooSmall {
                width: self.width,
                height: self.height,
            });
        }
        if !self.spacing.is_finite() {
            return Err(ConfigError::InvalidParameter {
                name: "spacing",
                value: self.spacing,
            });
        }
        if !self.height_multiplier.is_finite() {
            return Err(ConfigError::InvalidParameter {
                name: "height_multiplier",
                value: self.height_multiplier,
            });
        }
        Ok(())
    }
}

/// Which execution path computes grass transforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementStrategy {
    /// Single-threaded, one random draw sequence over all cells.
    #[default]
    Serial,
    /// Whole instance buffer handed to a compute kernel in one dispatch.
    Parallel,
}

/// Grass placement grid and per-blade randomisation ranges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Cells per side of the placement grid.
    pub size: u32,
    /// Maximum XZ jitter away from the terrain vertex.
    pub position_offset: f32,
    /// Base blade scale.
    pub mesh_scale: f32,
    /// Blade scale is drawn from `mesh_scale ± scale_offset`.
    pub scale_offset: f32,
    /// Extra Y scale applied on top of the uniform blade scale.
    pub stretch_factor: f32,
    /// Mask samples brighter than this reject the cell. Range [0, 1].
    pub height_cutoff: f32,
    pub strategy: PlacementStrategy,
    /// Fixed seed for reproducible placement; entropy when absent.
    pub seed: Option<u64>,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            size: 128,
            position_offset: 0.2,
            mesh_scale: 1.0,
            scale_offset: 0.3,
            stretch_factor: 1.5,
            height_cutoff: 0.6,
            strategy: PlacementStrategy::Serial,
            seed: None,
        }
    }
}

impl PlacementConfig {
    pub fn new(size: u32) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }

    pub fn with_position_offset(mut self, offset: f32) -> Self {
        self.position_offset = offset;
        self
    }

    pub fn with_scale(mut self, scale: f32, offset: f32) -> Self {
        self.mesh_scale = scale;
        self.scale_offset = offset;
        self
    }

    pub fn with_stretch_factor(mut self, stretch: f32) -> Self {
        self.stretch_factor = stretch;
        self
    }

    pub fn with_height_cutoff(mut self, cutoff: f32) -> Self {
        self.height_cutoff = cutoff;
        self
    }

    pub fn with_strategy(mut self, strategy: PlacementStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn use_parallel_placement(&self) -> bool {
        self.strategy == PlacementStrategy::Parallel
    }

    /// Number of cells in the placement grid.
    pub fn cell_count(&self) -> usize {
        self.size as usize * self.size as usize
    }

    /// Inclusive range the blade scale is drawn from.
    pub fn scale_range(&self) -> (f32, f32) {
        (
            self.mesh_scale - self.scale_offset,
            self.mesh_scale + self.scale_offset,
        )
    }

    /// Terrain vertices skipped between neighbouring placement cells, per axis.
    pub fn terrain_ratio(&self, terrain: GridExtent) -> (u32, u32) {
        (terrain.width / self.size, terrain.height / self.size)
    }

    /// Check this configuration against the terrain it will be placed on.
    pub fn validate(&self, terrain: GridExtent) -> Result<(), ConfigError> {
        if self.size == 0 {
            return Err(ConfigError::ZeroPlacementSize);
        }
        if terrain.width % self.size != 0 {
            return Err(ConfigError::NotDivisible {
                axis: GridAxis::Width,
                extent: terrain.width,
                size: self.size,
            });
        }
        if terrain.height % self.size != 0 {
            return Err(ConfigError::NotDivisible {
                axis: GridAxis::Height,
                extent: terrain.height,
                size: self.size,
            });
        }
        if !(0.0..=1.0).contains(&self.height_cutoff) {
            return Err(ConfigError::CutoffOutOfRange(self.height_cutoff));
        }

        let non_negative = [
            ("position_offset", self.position_offset),
            ("mesh_scale", self.mesh_scale),
            ("scale_offset", self.scale_offset),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidParameter { name, value });
            }
        }
        if !self.stretch_factor.is_finite() || self.stretch_factor <= 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "stretch_factor",
                value: self.stretch_factor,
            });
        }
        if self.scale_offset > self.mesh_scale {
            return Err(ConfigError::ScaleOffsetTooLarge {
                scale: self.mesh_scale,
                offset: self.scale_offset,
            });
        }
        Ok(())
    }
}
