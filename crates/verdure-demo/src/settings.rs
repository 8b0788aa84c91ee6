use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use verdure_core::{primitives, Mesh, Result};
use verdure_grass::GrassFieldConfig;
use verdure_terrain::FbmParams;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BladeSettings {
    pub width: f32,
    pub height: f32,
    pub segments: u32,
}

impl Default for BladeSettings {
    fn default() -> Self {
        Self {
            width: 0.08,
            height: 1.0,
            segments: 4,
        }
    }
}

impl BladeSettings {
    pub fn mesh(&self) -> Mesh {
        primitives::create_blade(self.width, self.height, self.segments)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoSettings {
    #[serde(flatten)]
    pub field: GrassFieldConfig,
    pub noise: FbmParams,
    pub blade: BladeSettings,
    /// Frames the draw loop runs before exiting.
    pub frames: u32,
}

impl Default for DemoSettings {
    fn default() -> Self {
        Self {
            field: GrassFieldConfig::default(),
            noise: FbmParams::default(),
            blade: BladeSettings::default(),
            frames: 3,
        }
    }
}

pub fn load(path: &Path) -> Result<DemoSettings> {
    let data = fs::read_to_string(path)?;
    let settings: DemoSettings = toml::from_str(&data)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    log::info!("Loaded settings from {}", path.display());
    Ok(settings)
}
