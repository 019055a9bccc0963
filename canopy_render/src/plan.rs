// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render plan: the flattened paint order of one rooted tree.
//!
//! "Surface space" below is the coordinate space the root itself is placed
//! in, so item transforms include the root's own bounds offset.

use alloc::vec::Vec;

use canopy_core::trace::{PhaseBeginEvent, PhaseEndEvent, PhaseKind, Tracer};
use canopy_core::visual::{VisualId, VisualTree};
use kurbo::{Affine, Rect};

/// A single visual in the render plan.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderItem {
    /// The visual this item originates from.
    pub visual: VisualId,
    /// Depth below the plan's root.
    pub depth: u32,
    /// Z-index among its siblings.
    pub z_index: i32,
    /// Local-to-surface transform.
    pub transform: Affine,
    /// Product of the visual's opacity and every ancestor's.
    pub effective_opacity: f64,
    /// Surface-space bounding box of the visual's bounds.
    pub bounds: Rect,
    /// Surface-space bounding box of every clip that applies to the visual,
    /// or `None` when unclipped.
    pub clip: Option<Rect>,
    /// Union of the visible bounds of this item and every item in its
    /// subtree, or `None` when all of them are empty.
    pub subtree_bounds: Option<Rect>,
    /// Whether the visual has paintable content.
    pub has_content: bool,
    /// Number of items that follow this one and belong to its subtree.
    pub descendants: u32,
}

impl RenderItem {
    /// Returns the part of the bounds left after clipping.
    #[must_use]
    pub fn visible_bounds(&self) -> Rect {
        match self.clip {
            Some(clip) => self.bounds.intersect(clip),
            None => self.bounds,
        }
    }
}

/// Visuals of one rooted tree in back-to-front paint order.
///
/// Items are a depth-first walk with siblings in ascending z-index, so every
/// item's subtree is the contiguous run of `descendants` items after it.
/// Hidden subtrees are left out; transparent ones are kept.
#[derive(Clone, Debug, Default)]
pub struct RenderPlan {
    root: Option<VisualId>,
    items: Vec<RenderItem>,
    // (slot index, item position), sorted by slot index.
    lookup: Vec<(u32, u32)>,
}

impl RenderPlan {
    /// Creates an empty plan.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the plan for `root`.
    ///
    /// The plan is empty if `root` is hidden or not attached to a visual
    /// tree.
    ///
    /// # Panics
    ///
    /// Panics if `root` is stale.
    #[must_use]
    pub fn build(tree: &VisualTree, root: VisualId) -> Self {
        let mut plan = Self::new();
        plan.rebuild(tree, root);
        plan
    }

    /// Rebuilds the plan in place, reusing its allocations.
    pub fn rebuild(&mut self, tree: &VisualTree, root: VisualId) {
        self.clear();
        self.root = Some(root);
        if is_paintable_root(tree, root) {
            self.push_subtree(tree, root, 0, Affine::IDENTITY, 1.0, None);
        }
        self.lookup.extend(
            self.items
                .iter()
                .enumerate()
                .map(|(pos, item)| (item.visual.index(), to_u32(pos))),
        );
        self.lookup.sort_unstable_by_key(|&(idx, _)| idx);
    }

    /// Like [`rebuild`](Self::rebuild), bracketing the work with plan phase
    /// events on `tracer`.
    pub fn rebuild_traced(&mut self, tree: &VisualTree, root: VisualId, tracer: &mut Tracer<'_>) {
        let frame_index = tree.frame_index();
        tracer.phase_begin(&PhaseBeginEvent {
            frame_index,
            phase: PhaseKind::Plan,
        });
        self.rebuild(tree, root);
        tracer.phase_end(&PhaseEndEvent {
            frame_index,
            phase: PhaseKind::Plan,
            visuals: to_u32(self.items.len()),
        });
    }

    /// Clears the plan for reuse.
    pub fn clear(&mut self) {
        self.root = None;
        self.items.clear();
        self.lookup.clear();
    }

    /// Returns the root the plan was built for.
    #[must_use]
    pub fn root(&self) -> Option<VisualId> {
        self.root
    }

    /// Returns the items in paint order.
    #[must_use]
    pub fn items(&self) -> &[RenderItem] {
        &self.items
    }

    /// Returns the number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the plan has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the item for raw slot `index`, if the plan contains it.
    #[must_use]
    pub fn item_at(&self, index: u32) -> Option<&RenderItem> {
        let pos = self
            .lookup
            .binary_search_by_key(&index, |&(idx, _)| idx)
            .ok()?;
        self.items.get(self.lookup[pos].1 as usize)
    }

    /// Returns the item for `visual`, if the plan contains it.
    #[must_use]
    pub fn get(&self, visual: VisualId) -> Option<&RenderItem> {
        self.item_at(visual.index())
            .filter(|item| item.visual == visual)
    }

    /// Appends `id` and its subtree, returning the subtree's visible extent.
    fn push_subtree(
        &mut self,
        tree: &VisualTree,
        id: VisualId,
        depth: u32,
        parent_transform: Affine,
        parent_opacity: f64,
        parent_clip: Option<Rect>,
    ) -> Option<Rect> {
        if !tree.is_visible(id) {
            return None;
        }

        let transform = parent_transform * tree.local_transform(id);
        let local_rect = tree.bounds(id).size().to_rect();
        let clip = surface_clip(tree, id, transform, parent_clip);
        let pos = self.items.len();
        self.items.push(RenderItem {
            visual: id,
            depth,
            z_index: tree.z_index(id),
            transform,
            effective_opacity: parent_opacity * tree.opacity(id),
            bounds: transform.transform_rect_bbox(local_rect),
            clip,
            subtree_bounds: None,
            has_content: tree.content(id).is_some(),
            descendants: 0,
        });

        let mut extent = non_empty(self.items[pos].visible_bounds());
        let opacity = self.items[pos].effective_opacity;
        for child in tree.children_in_z_order(id) {
            let child_extent = self.push_subtree(tree, child, depth + 1, transform, opacity, clip);
            extent = union(extent, child_extent);
        }

        let item = &mut self.items[pos];
        item.subtree_bounds = extent;
        item.descendants = to_u32(self.items.len() - pos - 1);
        extent
    }
}

/// Returns `true` if painting may start at `root`: it is attached and neither
/// it nor any ancestor is hidden.
pub(crate) fn is_paintable_root(tree: &VisualTree, root: VisualId) -> bool {
    tree.is_attached_to_visual_tree(root) && tree.is_effectively_visible(root)
}

/// Returns the surface-space clip of `id`: the parent's clip intersected with
/// the visual's clip-to-bounds rect and clip geometry.
pub(crate) fn surface_clip(
    tree: &VisualTree,
    id: VisualId,
    transform: Affine,
    parent_clip: Option<Rect>,
) -> Option<Rect> {
    let mut clip = parent_clip;
    if tree.clip_to_bounds(id) {
        let r = transform.transform_rect_bbox(tree.bounds(id).size().to_rect());
        clip = Some(clip.map_or(r, |c| c.intersect(r)));
    }
    if let Some(geometry) = tree.clip(id) {
        let r = transform.transform_rect_bbox(geometry.bounding_box());
        clip = Some(clip.map_or(r, |c| c.intersect(r)));
    }
    clip
}

fn non_empty(rect: Rect) -> Option<Rect> {
    (rect.width() > 0.0 && rect.height() > 0.0).then_some(rect)
}

fn to_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

fn union(a: Option<Rect>, b: Option<Rect>) -> Option<Rect> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.union(b)),
        (a, None) => a,
        (None, b) => b,
    }
}
