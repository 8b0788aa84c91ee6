//! Flattening of 2D grids into 1D buffers.
//!
//! Every grid in the pipeline (height fields, terrain vertices, density masks)
//! goes through [`GridExtent::index`]. Columns are contiguous: the sample at
//! `(x, z)` lives at `x * height + z`, matching a nested loop over `x` then `z`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridExtent {
    pub width: u32,
    pub height: u32,
}

impl GridExtent {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub const fn square(side: u32) -> Self {
        Self::new(side, side)
    }

    /// Number of samples in the grid.
    pub const fn len(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Flat index of `(x, z)`. The row stride is `height`.
    #[inline]
    pub const fn index(&self, x: u32, z: u32) -> usize {
        x as usize * self.height as usize + z as usize
    }

    /// Inverse of [`GridExtent::index`].
    #[inline]
    pub const fn coords(&self, index: usize) -> (u32, u32) {
        let stride = self.height as usize;
        ((index / stride) as u32, (index % stride) as u32)
    }

    pub const fn contains(&self, x: u32, z: u32) -> bool {
        x < self.width && z < self.height
    }

    /// Clamp-to-edge addressing.
    pub fn clamp(&self, x: u32, z: u32) -> (u32, u32) {
        (
            x.min(self.width.saturating_sub(1)),
            z.min(self.height.saturating_sub(1)),
        )
    }

    /// All `(x, z)` pairs in flat-index order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        let height = self.height;
        (0..self.width).flat_map(move |x| (0..height).map(move |z| (x, z)))
    }
}

impl std::fmt::Display for GridExtent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}
