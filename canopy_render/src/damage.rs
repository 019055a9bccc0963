// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Spatial damage tracking for partial repaints.

use alloc::vec::Vec;

use canopy_core::visual::FrameChanges;
use kurbo::Rect;

use crate::plan::RenderPlan;

/// A region of the surface that needs repainting.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum DamageRegion {
    /// The entire surface needs repainting.
    #[default]
    Full,
    /// Surface-space rectangles that need repainting.
    Rects(Vec<Rect>),
    /// Nothing changed; the previous frame can be reused.
    None,
}

impl DamageRegion {
    /// Computes the damage between two plans of the same root.
    ///
    /// Every visual named in `changes` contributes its subtree extent in
    /// both `previous` and `current`, so a moved visual damages where it was
    /// and where it is now. Topology changes, or plans for different roots,
    /// damage the whole surface.
    #[must_use]
    pub fn from_changes(changes: &FrameChanges, previous: &RenderPlan, current: &RenderPlan) -> Self {
        if changes.topology_changed || previous.root() != current.root() {
            return Self::Full;
        }

        let mut damage = Self::None;
        let lists = [
            &changes.transforms,
            &changes.opacities,
            &changes.visibility,
            &changes.clips,
            &changes.repaints,
            &changes.attached,
            &changes.detached,
        ];
        for &idx in lists.into_iter().flatten() {
            for plan in [previous, current] {
                if let Some(extent) = plan.item_at(idx).and_then(|item| item.subtree_bounds) {
                    damage.add_rect(extent);
                }
            }
        }
        damage
    }

    /// Returns `true` if no region needs repainting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Adds a rectangle, ignoring empty ones and ones already covered.
    pub fn add_rect(&mut self, rect: Rect) {
        if rect.width() <= 0.0 || rect.height() <= 0.0 {
            return;
        }
        match self {
            Self::Full => {}
            Self::None => *self = Self::Rects(alloc::vec![rect]),
            Self::Rects(rects) => {
                if !rects.iter().any(|r| r.contains_rect(rect)) {
                    rects.push(rect);
                }
            }
        }
    }

    /// Merges another damage region into this one.
    pub fn merge(&mut self, other: &Self) {
        match (&*self, other) {
            (Self::Full, _) | (_, Self::Full) => *self = Self::Full,
            (Self::None, _) => *self = other.clone(),
            (_, Self::None) => {}
            (Self::Rects(_), Self::Rects(b)) => {
                for &rect in b {
                    self.add_rect(rect);
                }
            }
        }
    }

    /// Returns `true` if `rect` overlaps the damaged area.
    #[must_use]
    pub fn intersects(&self, rect: Rect) -> bool {
        match self {
            Self::Full => true,
            Self::None => false,
            Self::Rects(rects) => rects.iter().any(|r| r.overlaps(rect)),
        }
    }

    /// Returns the smallest rectangle covering the damage, or `None` for
    /// [`Full`](Self::Full) and [`None`](Self::None).
    #[must_use]
    pub fn bounding_box(&self) -> Option<Rect> {
        match self {
            Self::Rects(rects) => rects.iter().copied().reduce(|a, b| a.union(b)),
            Self::Full | Self::None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use canopy_core::visual::VisualTree;

    use super::*;

    #[test]
    fn merge_rules() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        let mut d = DamageRegion::None;
        d.merge(&DamageRegion::Rects(vec![r]));
        assert_eq!(d, DamageRegion::Rects(vec![r]));

        d.merge(&DamageRegion::None);
        assert_eq!(d, DamageRegion::Rects(vec![r]));

        d.merge(&DamageRegion::Full);
        assert_eq!(d, DamageRegion::Full);
    }

    #[test]
    fn covered_and_empty_rects_are_dropped() {
        let mut d = DamageRegion::None;
        d.add_rect(Rect::new(0.0, 0.0, 0.0, 10.0));
        assert!(d.is_empty());

        d.add_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        d.add_rect(Rect::new(2.0, 2.0, 4.0, 4.0));
        d.add_rect(Rect::new(20.0, 0.0, 30.0, 10.0));
        assert_eq!(
            d,
            DamageRegion::Rects(vec![
                Rect::new(0.0, 0.0, 10.0, 10.0),
                Rect::new(20.0, 0.0, 30.0, 10.0),
            ])
        );
        assert_eq!(d.bounding_box(), Some(Rect::new(0.0, 0.0, 30.0, 10.0)));
        assert!(d.intersects(Rect::new(25.0, 5.0, 26.0, 6.0)));
        assert!(!d.intersects(Rect::new(12.0, 0.0, 18.0, 10.0)));
    }

    #[test]
    fn moved_visual_damages_old_and_new_position() {
        let mut tree = VisualTree::new();
        let root = tree.create_root();
        let v = tree.create_visual();
        tree.add_child(root, v);
        tree.set_bounds(root, Rect::new(0.0, 0.0, 200.0, 200.0));
        tree.set_clip_to_bounds(root, true);
        tree.set_bounds(v, Rect::new(0.0, 0.0, 10.0, 10.0));
        let _ = tree.evaluate();
        let before = RenderPlan::build(&tree, root);

        tree.set_bounds(v, Rect::new(50.0, 50.0, 60.0, 60.0));
        let changes = tree.evaluate();
        let after = RenderPlan::build(&tree, root);

        let damage = DamageRegion::from_changes(&changes, &before, &after);
        assert_eq!(
            damage,
            DamageRegion::Rects(vec![
                Rect::new(0.0, 0.0, 10.0, 10.0),
                Rect::new(50.0, 50.0, 60.0, 60.0),
            ])
        );
    }

    #[test]
    fn unchanged_frame_has_no_damage() {
        let mut tree = VisualTree::new();
        let root = tree.create_root();
        tree.set_bounds(root, Rect::new(0.0, 0.0, 10.0, 10.0));
        let _ = tree.evaluate();
        let plan = RenderPlan::build(&tree, root);

        let changes = tree.evaluate();
        assert!(DamageRegion::from_changes(&changes, &plan, &plan).is_empty());
    }

    #[test]
    fn topology_change_damages_everything() {
        let mut tree = VisualTree::new();
        let root = tree.create_root();
        let _ = tree.evaluate();
        let before = RenderPlan::build(&tree, root);

        let child = tree.create_visual();
        tree.add_child(root, child);
        let changes = tree.evaluate();
        let after = RenderPlan::build(&tree, root);
        assert_eq!(
            DamageRegion::from_changes(&changes, &before, &after),
            DamageRegion::Full
        );
    }

    #[test]
    fn hiding_damages_previous_extent() {
        let mut tree = VisualTree::new();
        let root = tree.create_root();
        let v = tree.create_visual();
        tree.add_child(root, v);
        tree.set_bounds(v, Rect::new(5.0, 5.0, 15.0, 15.0));
        let _ = tree.evaluate();
        let before = RenderPlan::build(&tree, root);

        tree.set_visible(v, false);
        let changes = tree.evaluate();
        let after = RenderPlan::build(&tree, root);
        assert_eq!(
            DamageRegion::from_changes(&changes, &before, &after),
            DamageRegion::Rects(vec![Rect::new(5.0, 5.0, 15.0, 15.0)])
        );
    }
}
