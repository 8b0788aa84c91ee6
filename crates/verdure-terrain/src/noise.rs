//! Boundary to the height-field generator.
//!
//! Noise synthesis lives outside this crate; the terrain only needs something
//! that turns a grid size into a [`HeightField`].

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::heightmap::HeightField;

/// Fractal Brownian motion settings handed to a [`NoiseSource`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FbmParams {
    pub seed: u32,
    pub scale: f32,
    pub octaves: u32,
    pub persistence: f32,
    pub lacunarity: f32,
    pub offset: [f32; 2],
    /// Ignore `seed` and draw a fresh one per generation.
    pub use_random_seed: bool,
}

impl Default for FbmParams {
    fn default() -> Self {
        Self {
            seed: 0,
            scale: 50.0,
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
            offset: [0.0, 0.0],
            use_random_seed: false,
        }
    }
}

impl FbmParams {
    pub fn new(seed: u32) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_octaves(mut self, octaves: u32) -> Self {
        self.octaves = octaves.max(1);
        self
    }

    pub fn with_persistence(mut self, persistence: f32) -> Self {
        self.persistence = persistence;
        self
    }

    pub fn with_lacunarity(mut self, lacunarity: f32) -> Self {
        self.lacunarity = lacunarity;
        self
    }

    pub fn with_offset(mut self, offset: Vec2) -> Self {
        self.offset = offset.to_array();
        self
    }

    pub fn with_random_seed(mut self, random: bool) -> Self {
        self.use_random_seed = random;
        self
    }

    pub fn offset(&self) -> Vec2 {
        Vec2::from_array(self.offset)
    }
}

pub trait NoiseSource {
    fn generate_noise_map(&self, width: u32, height: u32, params: &FbmParams) -> HeightField;
}

/// Every sample at one elevation.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatNoise {
    pub level: f32,
}

impl NoiseSource for FlatNoise {
    fn generate_noise_map(&self, width: u32, height: u32, _params: &FbmParams) -> HeightField {
        HeightField::from_fn(width, height, |_, _| self.level)
    }
}
