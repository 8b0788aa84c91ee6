//! Placement results, one slot per placement-grid cell.

use glam::Mat4;
use verdure_core::{GridExtent, Transform};

/// World transform of one grass blade.
pub type GrassInstance = Transform;

/// The `size x size` placement grid after placement. Slot `gx * size + gz`
/// holds the blade for cell `(gx, gz)`, or `None` where the density mask
/// rejected the cell.
#[derive(Debug, Clone, PartialEq)]
pub struct GrassLayout {
    size: u32,
    slots: Vec<Option<GrassInstance>>,
}

impl GrassLayout {
    pub(crate) fn from_slots(size: u32, slots: Vec<Option<GrassInstance>>) -> Self {
        debug_assert_eq!(slots.len(), size as usize * size as usize);
        Self { size, slots }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn grid(&self) -> GridExtent {
        GridExtent::square(self.size)
    }

    pub fn slots(&self) -> &[Option<GrassInstance>] {
        &self.slots
    }

    pub fn slot(&self, gx: u32, gz: u32) -> Option<&GrassInstance> {
        if !self.grid().contains(gx, gz) {
            return None;
        }
        self.slots[self.grid().index(gx, gz)].as_ref()
    }

    pub fn planted_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn empty_count(&self) -> usize {
        self.slots.len() - self.planted_count()
    }

    /// Flat indices of every planted cell, ascending.
    pub fn valid_cells(&self) -> Vec<usize> {
        self.planted().map(|(index, _)| index).collect()
    }

    pub fn planted(&self) -> impl Iterator<Item = (usize, &GrassInstance)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|instance| (index, instance)))
    }

    /// Transforms of the planted blades only, ready for an instanced draw.
    pub fn matrices(&self) -> Vec<Mat4> {
        self.planted().map(|(_, instance)| instance.to_matrix()).collect()
    }

    /// One matrix per slot. Empty slots get a zero matrix, which collapses the
    /// blade to a point so it never rasterises.
    pub fn slot_matrices(&self) -> Vec<Mat4> {
        self.slots
            .iter()
            .map(|slot| slot.map_or(Mat4::ZERO, |instance| instance.to_matrix()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn empty_slots_are_skipped_or_zeroed() {
        let blade = GrassInstance::from_position(Vec3::new(1.0, 0.0, 2.0));
        let layout = GrassLayout::from_slots(2, vec![None, Some(blade), None, Some(blade)]);

        assert_eq!(layout.planted_count(), 2);
        assert_eq!(layout.empty_count(), 2);
        assert_eq!(layout.valid_cells(), vec![1, 3]);
        assert_eq!(layout.matrices().len(), 2);

        let per_slot = layout.slot_matrices();
        assert_eq!(per_slot.len(), 4);
        assert_eq!(per_slot[0], Mat4::ZERO);
        assert_eq!(per_slot[1], blade.to_matrix());
        assert!(layout.slot(0, 1).is_some());
        assert!(layout.slot(1, 0).is_none());
        assert!(layout.slot(5, 5).is_none());
    }
}
