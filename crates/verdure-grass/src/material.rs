//! Grass shading parameters forwarded to the instanced draw.
//!
//! Placement never reads any of this. The values are packed into
//! [`GrassUniforms`] every frame and handed to the renderer as-is.

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec4};
use serde::{Deserialize, Serialize};

pub const MAX_WIND_BEND: f32 = 0.2;
pub const MAX_FOG_OFFSET: f32 = 10.0;

/// Where the blade colour comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorationMode {
    /// Sample the blade texture.
    #[default]
    Texture,
    /// Gradient between bottom and top colours.
    Color,
    /// Gradient modulated by world-space noise.
    Noise,
}

impl ColorationMode {
    /// Shader defines to enable. Texture mode enables none.
    pub fn shader_defines(self) -> &'static [&'static str] {
        match self {
            ColorationMode::Texture => &[],
            ColorationMode::Color => &["USE_COLOR"],
            ColorationMode::Noise => &["USE_NOISE"],
        }
    }

    pub fn as_index(self) -> u32 {
        match self {
            ColorationMode::Texture => 0,
            ColorationMode::Color => 1,
            ColorationMode::Noise => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindParams {
    pub strength: f32,
    /// How far the tip leans, in [0, 0.2].
    pub bend_factor: f32,
    pub noise_scale: f32,
    pub direction: [f32; 2],
}

impl Default for WindParams {
    fn default() -> Self {
        Self {
            strength: 1.0,
            bend_factor: 0.1,
            noise_scale: 0.05,
            direction: [1.0, 0.0],
        }
    }
}

impl WindParams {
    pub fn new(strength: f32, direction: Vec2) -> Self {
        Self {
            strength,
            direction: direction.to_array(),
            ..Self::default()
        }
    }

    pub fn with_bend_factor(mut self, bend: f32) -> Self {
        self.bend_factor = bend.clamp(0.0, MAX_WIND_BEND);
        self
    }

    pub fn with_noise_scale(mut self, scale: f32) -> Self {
        self.noise_scale = scale;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FogParams {
    pub color: [f32; 4],
    /// In [0, 1].
    pub density: f32,
    /// In [0, 10].
    pub offset: f32,
}

impl Default for FogParams {
    fn default() -> Self {
        Self {
            color: [0.7, 0.75, 0.8, 1.0],
            density: 0.0,
            offset: 0.0,
        }
    }
}

impl FogParams {
    pub fn new(color: Vec4, density: f32, offset: f32) -> Self {
        Self {
            color: color.to_array(),
            density: density.clamp(0.0, 1.0),
            offset: offset.clamp(0.0, MAX_FOG_OFFSET),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrassMaterial {
    pub top_color: [f32; 4],
    pub bottom_color: [f32; 4],
    pub coloration: ColorationMode,
    pub wind: WindParams,
    pub fog: FogParams,
}

impl Default for GrassMaterial {
    fn default() -> Self {
        Self {
            top_color: [0.55, 0.8, 0.3, 1.0],
            bottom_color: [0.1, 0.3, 0.05, 1.0],
            coloration: ColorationMode::Texture,
            wind: WindParams::default(),
            fog: FogParams::default(),
        }
    }
}

impl GrassMaterial {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_colors(mut self, bottom: Vec4, top: Vec4) -> Self {
        self.bottom_color = bottom.to_array();
        self.top_color = top.to_array();
        self
    }

    pub fn with_coloration(mut self, mode: ColorationMode) -> Self {
        self.coloration = mode;
        self
    }

    pub fn with_wind(mut self, wind: WindParams) -> Self {
        self.wind = wind;
        self
    }

    pub fn with_fog(mut self, fog: FogParams) -> Self {
        self.fog = fog;
        self
    }

    pub fn uniforms(&self) -> GrassUniforms {
        GrassUniforms::from(self)
    }
}

/// Per-frame uniform block for the grass shader. 80 bytes.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GrassUniforms {
    pub color_top: [f32; 4],
    pub color_bottom: [f32; 4],
    pub fog_color: [f32; 4],
    pub wind_direction: [f32; 2],
    pub wind_strength: f32,
    pub wind_bend_factor: f32,
    pub noise_scale: f32,
    pub fog_density: f32,
    pub fog_offset: f32,
    pub coloration: u32,
}

impl From<&GrassMaterial> for GrassUniforms {
    fn from(material: &GrassMaterial) -> Self {
        // Deserialised materials skip the builder clamps.
        Self {
            color_top: material.top_color,
            color_bottom: material.bottom_color,
            fog_color: material.fog.color,
            wind_direction: material.wind.direction,
            wind_strength: material.wind.strength,
            wind_bend_factor: material.wind.bend_factor.clamp(0.0, MAX_WIND_BEND),
            noise_scale: material.wind.noise_scale,
            fog_density: material.fog.density.clamp(0.0, 1.0),
            fog_offset: material.fog.offset.clamp(0.0, MAX_FOG_OFFSET),
            coloration: material.coloration.as_index(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_block_is_80_bytes() {
        assert_eq!(std::mem::size_of::<GrassUniforms>(), 80);
    }

    #[test]
    fn coloration_enables_at_most_one_define() {
        assert!(ColorationMode::Texture.shader_defines().is_empty());
        assert_eq!(ColorationMode::Color.shader_defines(), ["USE_COLOR"]);
        assert_eq!(ColorationMode::Noise.shader_defines(), ["USE_NOISE"]);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let mut material = GrassMaterial::new()
            .with_wind(WindParams::new(2.0, Vec2::Y).with_bend_factor(0.5))
            .with_fog(FogParams::new(Vec4::ONE, 3.0, -1.0));
        assert_eq!(material.wind.bend_factor, MAX_WIND_BEND);

        material.fog.offset = 42.0;
        let uniforms = material.uniforms();
        assert_eq!(uniforms.fog_density, 1.0);
        assert_eq!(uniforms.fog_offset, MAX_FOG_OFFSET);
        assert_eq!(uniforms.wind_direction, [0.0, 1.0]);
    }
}
