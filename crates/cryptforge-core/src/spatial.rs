//! Overlap tests between a candidate and the placed modules.

use cryptforge_logic::math::Aabb;
use hecs::Entity;

use crate::layout::DungeonLayout;

/// Linear scan over placed module footprints.
///
/// Layouts hold tens of modules, so no acceleration structure is kept.
#[derive(Debug, Clone, Copy)]
pub struct SpatialIndex {
    /// Size added to each placed module's bounds before testing
    pub margin: f32,
}

impl SpatialIndex {
    pub fn new(margin: f32) -> Self {
        Self { margin }
    }

    /// First placed module (rooms, then hallways) whose inflated bounds hit `candidate`.
    pub fn first_overlap(&self, layout: &DungeonLayout, candidate: &Aabb) -> Option<Entity> {
        layout.modules().find(|&e| {
            layout
                .footprint(e)
                .is_some_and(|f| f.bounds.expanded(self.margin).intersects(candidate))
        })
    }

    pub fn overlaps(&self, layout: &DungeonLayout, candidate: &Aabb) -> bool {
        self.first_overlap(layout, candidate).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{ModuleInstance, ModuleRole};
    use cryptforge_logic::math::{Pose, Vec3, Yaw};

    fn block(center_x: f32) -> ModuleInstance {
        let mut m = ModuleInstance::new(
            "block",
            ModuleRole::Normal,
            vec![Aabb::new(Vec3::new(-5.0, 0.0, -5.0), Vec3::new(5.0, 4.0, 5.0))],
            Vec::new(),
        );
        m.set_pose(Pose::new(Vec3::new(center_x, 0.0, 0.0), Yaw::IDENTITY));
        m
    }

    #[test]
    fn empty_layout_never_overlaps() {
        let layout = DungeonLayout::new(1);
        let index = SpatialIndex::new(0.5);
        assert!(!index.overlaps(&layout, &block(0.0).world_bounds(0.95)));
    }

    #[test]
    fn margin_rejects_near_misses() {
        let mut layout = DungeonLayout::new(2);
        let placed = layout.place(block(0.0), 0.95);
        // shrunk half-widths 4.75 each; centers 9.9 apart leave a 0.4 gap
        let near = block(9.9).world_bounds(0.95);
        assert!(!SpatialIndex::new(0.5).overlaps(&layout, &near));
        assert_eq!(SpatialIndex::new(1.0).first_overlap(&layout, &near), Some(placed));
    }

    #[test]
    fn flush_modules_pass_thanks_to_shrink() {
        let mut layout = DungeonLayout::new(2);
        layout.place(block(0.0), 0.95);
        let flush = block(10.0).world_bounds(0.95);
        assert!(!SpatialIndex::new(0.5).overlaps(&layout, &flush));
        let unshrunk = block(10.0).world_bounds(1.0);
        assert!(SpatialIndex::new(0.5).overlaps(&layout, &unshrunk));
    }
}
