//! Grayscale plantability masks.
//!
//! A mask is sampled with point filtering and clamp-to-edge addressing. A
//! placement cell is plantable when its sample is at or below the cutoff.

use image::DynamicImage;
use verdure_core::{ConfigError, GridExtent};

use crate::heightmap::HeightField;

/// Luma of a linear RGB colour, with the weights game engines use for
/// `Color.grayscale`.
pub fn grayscale(rgb: [f32; 3]) -> f32 {
    0.299 * rgb[0] + 0.587 * rgb[1] + 0.114 * rgb[2]
}

/// Clamp a raw sample into `[0, 1]`. NaN reads as 0.
fn unit_sample(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DensityMask {
    extent: GridExtent,
    values: Vec<f32>,
}

impl DensityMask {
    /// Use the height field itself as the mask: low ground is plantable, peaks
    /// above the cutoff stay bare. Samples are clamped to `[0, 1]`.
    pub fn from_height_field(field: &HeightField) -> Self {
        let values = field.samples().iter().copied().map(unit_sample).collect();
        Self {
            extent: field.extent(),
            values,
        }
    }

    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> f32) -> Self {
        let extent = GridExtent::new(width, height);
        let values = extent.iter().map(|(x, z)| unit_sample(f(x, z))).collect();
        Self { extent, values }
    }

    pub fn uniform(width: u32, height: u32, value: f32) -> Self {
        Self::from_fn(width, height, |_, _| value)
    }

    /// Image X maps to grid X and image Y to grid Z.
    pub fn from_image(image: &DynamicImage) -> Result<Self, ConfigError> {
        let rgb = image.to_rgb32f();
        let (width, height) = rgb.dimensions();
        if width == 0 || height == 0 {
            return Err(ConfigError::EmptyDensityMask);
        }
        Ok(Self::from_fn(width, height, |x, z| {
            grayscale(rgb.get_pixel(x, z).0)
        }))
    }

    pub fn extent(&self) -> GridExtent {
        self.extent
    }

    pub fn is_empty(&self) -> bool {
        self.extent.is_empty()
    }

    /// Grayscale values in flat-index order.
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Point sample with clamp-to-edge addressing.
    pub fn sample(&self, x: u32, z: u32) -> f32 {
        let (x, z) = self.extent.clamp(x, z);
        self.values[self.extent.index(x, z)]
    }

    /// Mask pixel covering placement cell `(gx, gz)` of a `size x size` grid.
    ///
    /// Equivalent to truncating `gx / size * mask_width`, done in integers so
    /// every backend lands on the same pixel.
    pub fn pixel_for_cell(&self, gx: u32, gz: u32, size: u32) -> (u32, u32) {
        let px = (gx as u64 * self.extent.width as u64 / size as u64) as u32;
        let pz = (gz as u64 * self.extent.height as u64 / size as u64) as u32;
        self.extent.clamp(px, pz)
    }

    pub fn is_plantable(&self, gx: u32, gz: u32, size: u32, cutoff: f32) -> bool {
        let (px, pz) = self.pixel_for_cell(gx, gz, size);
        self.sample(px, pz) <= cutoff
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn derived_mask_clamps_heights() {
        let field = HeightField::from_fn(2, 2, |x, z| match (x, z) {
            (0, 0) => -1.0,
            (1, 1) => 3.0,
            _ => 0.25,
        });
        let mask = DensityMask::from_height_field(&field);
        assert_eq!(mask.sample(0, 0), 0.0);
        assert_eq!(mask.sample(1, 1), 1.0);
        assert_eq!(mask.sample(0, 1), 0.25);
    }

    #[test]
    fn nan_samples_read_as_zero() {
        let built = DensityMask::from_fn(2, 2, |_, _| f32::NAN);
        let derived = DensityMask::from_height_field(&HeightField::from_fn(2, 2, |_, _| f32::NAN));
        for mask in [&built, &derived] {
            assert_eq!(mask.sample(1, 1), 0.0);
            assert!(mask.is_plantable(1, 1, 2, 0.5));
        }
        assert_eq!(built, derived);
    }

    #[test]
    fn cutoff_equality_is_plantable() {
        let mask = DensityMask::uniform(4, 4, 0.5);
        assert!(mask.is_plantable(0, 0, 4, 0.5));
        assert!(!mask.is_plantable(0, 0, 4, 0.4999));
    }

    #[test]
    fn sampling_clamps_to_edges() {
        let mask = DensityMask::from_fn(3, 2, |x, z| (x + 3 * z) as f32 / 10.0);
        assert_eq!(mask.sample(9, 9), mask.sample(2, 1));
    }

    #[test]
    fn cell_to_pixel_truncates() {
        let mask = DensityMask::uniform(10, 10, 0.0);
        assert_eq!(mask.pixel_for_cell(0, 0, 4), (0, 0));
        // 1/4 * 10 = 2.5 -> 2, 3/4 * 10 = 7.5 -> 7
        assert_eq!(mask.pixel_for_cell(1, 3, 4), (2, 7));
        // Coarser mask than placement grid.
        let small = DensityMask::uniform(2, 2, 0.0);
        assert_eq!(small.pixel_for_cell(3, 1, 4), (1, 0));
    }

    #[test]
    fn image_rows_map_to_z() {
        let mut img = RgbImage::new(2, 3);
        img.put_pixel(1, 2, Rgb([255, 255, 255]));
        let mask = DensityMask::from_image(&DynamicImage::ImageRgb8(img)).unwrap();
        assert_eq!(mask.extent(), GridExtent::new(2, 3));
        assert!((mask.sample(1, 2) - 1.0).abs() < 1e-6);
        assert_eq!(mask.sample(0, 2), 0.0);
    }
}
