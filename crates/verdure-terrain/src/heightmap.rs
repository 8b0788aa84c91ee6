use verdure_core::{ConfigError, GridExtent};

/// Elevation samples over a `width x height` grid, indexed `[x, z]`.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightField {
    extent: GridExtent,
    heights: Vec<f32>,
}

impl HeightField {
    /// A flat field of zeros.
    pub fn new(width: u32, height: u32) -> Self {
        let extent = GridExtent::new(width, height);
        Self {
            extent,
            heights: vec![0.0; extent.len()],
        }
    }

    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> f32) -> Self {
        let extent = GridExtent::new(width, height);
        let heights = extent.iter().map(|(x, z)| f(x, z)).collect();
        Self { extent, heights }
    }

    /// Wrap samples that are already laid out with [`GridExtent::index`].
    pub fn from_samples(extent: GridExtent, heights: Vec<f32>) -> Result<Self, ConfigError> {
        if heights.len() != extent.len() {
            return Err(ConfigError::SampleCountMismatch {
                width: extent.width,
                height: extent.height,
                expected: extent.len(),
                actual: heights.len(),
            });
        }
        Ok(Self { extent, heights })
    }

    pub fn extent(&self) -> GridExtent {
        self.extent
    }

    pub fn width(&self) -> u32 {
        self.extent.width
    }

    pub fn height(&self) -> u32 {
        self.extent.height
    }

    pub fn samples(&self) -> &[f32] {
        &self.heights
    }

    /// Height at `(x, z)`, or `0.0` off the grid.
    pub fn get(&self, x: u32, z: u32) -> f32 {
        if !self.extent.contains(x, z) {
            return 0.0;
        }
        self.heights[self.extent.index(x, z)]
    }

    pub fn set(&mut self, x: u32, z: u32, height: f32) {
        if self.extent.contains(x, z) {
            let index = self.extent.index(x, z);
            self.heights[index] = height;
        }
    }

    /// Lowest and highest sample, `None` for an empty field.
    pub fn range(&self) -> Option<(f32, f32)> {
        let mut iter = self.heights.iter().copied();
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), h| (lo.min(h), hi.max(h))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_fn_stores_samples_by_shared_index() {
        let field = HeightField::from_fn(3, 4, |x, z| (x * 10 + z) as f32);
        assert_eq!(field.get(2, 3), 23.0);
        assert_eq!(field.samples()[field.extent().index(1, 2)], 12.0);
    }

    #[test]
    fn out_of_range_reads_are_zero_and_writes_are_ignored() {
        let mut field = HeightField::new(2, 2);
        field.set(5, 0, 3.0);
        assert_eq!(field.get(5, 0), 0.0);
        assert!(field.samples().iter().all(|h| *h == 0.0));
    }

    #[test]
    fn from_samples_checks_length() {
        let err = HeightField::from_samples(GridExtent::new(2, 3), vec![0.0; 5]).unwrap_err();
        assert!(matches!(err, ConfigError::SampleCountMismatch { expected: 6, actual: 5, .. }));
    }

    #[test]
    fn range_covers_negative_heights() {
        let field = HeightField::from_fn(2, 2, |x, z| x as f32 - z as f32 * 3.0);
        assert_eq!(field.range(), Some((-3.0, 1.0)));
    }
}
