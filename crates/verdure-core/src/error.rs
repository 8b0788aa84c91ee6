use thiserror::Error;

/// Which axis of the terrain grid a divisibility check failed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridAxis {
    Width,
    Height,
}

impl std::fmt::Display for GridAxis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GridAxis::Width => f.write_str("width"),
            GridAxis::Height => f.write_str("height"),
        }
    }
}

/// A configuration that cannot be used to build terrain or place grass.
///
/// These are fatal: nothing is retried, and a grass field that hits one stays
/// disabled for the rest of its lifetime.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("terrain {axis} {extent} is not divisible by placement size {size}")]
    NotDivisible {
        axis: GridAxis,
        extent: u32,
        size: u32,
    },

    #[error("placement size must be at least 1")]
    ZeroPlacementSize,

    #[error("terrain grid {width}x{height} is too small, both sides need at least 2 samples")]
    GridTooSmall { width: u32, height: u32 },

    #[error("height field holds {actual} samples but a {width}x{height} grid needs {expected}")]
    SampleCountMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("expected a {expected} grid, got {actual}")]
    ExtentMismatch {
        expected: crate::grid::GridExtent,
        actual: crate::grid::GridExtent,
    },

    #[error("height cutoff {0} is outside [0, 1]")]
    CutoffOutOfRange(f32),

    #[error("{name} must be a finite, non-negative number (got {value})")]
    InvalidParameter { name: &'static str, value: f32 },

    #[error("scale offset {offset} exceeds mesh scale {scale}")]
    ScaleOffsetTooLarge { scale: f32, offset: f32 },

    #[error("density mask is empty")]
    EmptyDensityMask,
}

#[derive(Error, Debug)]
pub enum VerdureError {
    #[error("Invalid configuration: {0}")]
    Configuration(#[from] ConfigError),

    #[error("GPU device error: {0}")]
    GpuDevice(String),

    #[error("Shader compilation failed: {0}")]
    Shader(String),

    #[error("Resource error: {0}")]
    Resource(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, VerdureError>;
