// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays visual storage with allocation, topology, and property
//! management.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use kurbo::{Affine, Rect};
use understory_dirty::{CycleHandling, DirtyTracker, EagerPolicy};

use crate::brush::Brush;
use crate::dirty;
use crate::geometry::{Geometry, RelativePoint};
use crate::render::Render;

use super::error::VisualError;
use super::events::HandlerList;
use super::id::{INVALID, VisualId};
use super::walk::Children;

/// Struct-of-arrays storage for a forest of visuals.
///
/// Visuals are addressed by [`VisualId`] handles. Internally each visual
/// occupies a slot in parallel arrays. Destroyed visuals are recycled via a
/// free list, and generation counters make old handles fail validation.
///
/// A visual becomes *attached* when a chain of parent links reaches a visual
/// designated as a root with [`set_root`](Self::set_root) or
/// [`create_root`](Self::create_root). The attached root of every visual is
/// cached and recomputed for the affected subtree on each topology change.
pub struct VisualTree {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) last_child: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,
    pub(crate) prev_sibling: Vec<u32>,
    pub(crate) is_root: Vec<bool>,
    pub(crate) attached_root: Vec<u32>,

    // -- Local properties (set by callers) --
    pub(crate) bounds: Vec<Rect>,
    pub(crate) clip: Vec<Option<Geometry>>,
    pub(crate) clip_to_bounds: Vec<bool>,
    pub(crate) visible: Vec<bool>,
    pub(crate) opacity: Vec<f64>,
    pub(crate) opacity_mask: Vec<Option<Brush>>,
    pub(crate) render_transform: Vec<Option<Affine>>,
    pub(crate) transform_origin: Vec<RelativePoint>,
    pub(crate) z_index: Vec<i32>,
    pub(crate) content: Vec<Option<Box<dyn Render>>>,

    // -- Computed properties (written by evaluate) --
    pub(crate) root_transform: Vec<Affine>,
    pub(crate) effective_opacity: Vec<f64>,

    // -- Observers --
    pub(crate) on_attached: Vec<HandlerList>,
    pub(crate) on_detached: Vec<HandlerList>,
    pub(crate) next_subscription: u64,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) alive: Vec<bool>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,

    // -- Dirty tracking --
    pub(crate) dirty: DirtyTracker<u32>,
    pub(crate) topology_dirty: bool,
    pub(crate) frame_index: u64,

    // -- Lifecycle tracking --
    pub(crate) pending_created: Vec<u32>,
    pub(crate) pending_destroyed: Vec<u32>,
    pub(crate) pending_attached: Vec<u32>,
    pub(crate) pending_detached: Vec<u32>,

    // -- Repaint scheduling --
    repaint_hook: Option<Box<dyn FnMut()>>,
    pub(crate) repaint_requested: bool,
}

impl fmt::Debug for VisualTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VisualTree")
            .field("len", &self.len)
            .field("free", &self.free_list.len())
            .field("frame_index", &self.frame_index)
            .field("repaint_requested", &self.repaint_requested)
            .finish_non_exhaustive()
    }
}

impl Default for VisualTree {
    fn default() -> Self {
        Self::new()
    }
}

impl VisualTree {
    /// Creates an empty visual tree.
    #[must_use]
    pub fn new() -> Self {
        Self {
            parent: Vec::new(),
            first_child: Vec::new(),
            last_child: Vec::new(),
            next_sibling: Vec::new(),
            prev_sibling: Vec::new(),
            is_root: Vec::new(),
            attached_root: Vec::new(),
            bounds: Vec::new(),
            clip: Vec::new(),
            clip_to_bounds: Vec::new(),
            visible: Vec::new(),
            opacity: Vec::new(),
            opacity_mask: Vec::new(),
            render_transform: Vec::new(),
            transform_origin: Vec::new(),
            z_index: Vec::new(),
            content: Vec::new(),
            root_transform: Vec::new(),
            effective_opacity: Vec::new(),
            on_attached: Vec::new(),
            on_detached: Vec::new(),
            next_subscription: 0,
            generation: Vec::new(),
            alive: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            topology_dirty: true,
            frame_index: 0,
            pending_created: Vec::new(),
            pending_destroyed: Vec::new(),
            pending_attached: Vec::new(),
            pending_detached: Vec::new(),
            repaint_hook: None,
            repaint_requested: false,
        }
    }

    // -- Allocation API --

    /// Creates a new, detached visual and returns its handle.
    ///
    /// The visual starts with empty bounds at the origin, no clip, full
    /// opacity, no render transform (origin at the center), z-index 0, no
    /// content, and is visible.
    pub fn create_visual(&mut self) -> VisualId {
        let idx = if let Some(idx) = self.free_list.pop() {
            // Reuse a freed slot. The generation was bumped on destroy.
            let i = idx as usize;
            self.parent[i] = INVALID;
            self.first_child[i] = INVALID;
            self.last_child[i] = INVALID;
            self.next_sibling[i] = INVALID;
            self.prev_sibling[i] = INVALID;
            self.is_root[i] = false;
            self.attached_root[i] = INVALID;
            self.bounds[i] = Rect::ZERO;
            self.clip[i] = None;
            self.clip_to_bounds[i] = false;
            self.visible[i] = true;
            self.opacity[i] = 1.0;
            self.opacity_mask[i] = None;
            self.render_transform[i] = None;
            self.transform_origin[i] = RelativePoint::CENTER;
            self.z_index[i] = 0;
            self.content[i] = None;
            self.root_transform[i] = Affine::IDENTITY;
            self.effective_opacity[i] = 1.0;
            self.alive[i] = true;
            idx
        } else {
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.first_child.push(INVALID);
            self.last_child.push(INVALID);
            self.next_sibling.push(INVALID);
            self.prev_sibling.push(INVALID);
            self.is_root.push(false);
            self.attached_root.push(INVALID);
            self.bounds.push(Rect::ZERO);
            self.clip.push(None);
            self.clip_to_bounds.push(false);
            self.visible.push(true);
            self.opacity.push(1.0);
            self.opacity_mask.push(None);
            self.render_transform.push(None);
            self.transform_origin.push(RelativePoint::CENTER);
            self.z_index.push(0);
            self.content.push(None);
            self.root_transform.push(Affine::IDENTITY);
            self.effective_opacity.push(1.0);
            self.on_attached.push(HandlerList::default());
            self.on_detached.push(HandlerList::default());
            self.generation.push(0);
            self.alive.push(true);
            idx
        };

        self.topology_dirty = true;
        self.pending_created.push(idx);
        self.dirty.mark(idx, dirty::TOPOLOGY);
        self.mark_subtree_inherited_dirty(idx);

        self.id_unchecked(idx)
    }

    /// Creates a new visual and designates it as a root.
    pub fn create_root(&mut self) -> VisualId {
        let id = self.create_visual();
        self.set_root(id, true);
        id
    }

    /// Destroys a visual, freeing its slot for reuse.
    ///
    /// If the visual still has a parent it is removed first; if it was
    /// attached (or is a root) its detach handlers run before the slot is
    /// released.
    ///
    /// # Panics
    ///
    /// Panics if the visual has children (use
    /// [`destroy_subtree`](Self::destroy_subtree)) or if the handle is stale.
    pub fn destroy_visual(&mut self, id: VisualId) {
        self.validate(id);
        let idx = id.idx;
        assert!(
            self.first_child[idx as usize] == INVALID,
            "cannot destroy visual with children"
        );

        if self.parent[idx as usize] != INVALID {
            self.detach_and_unlink(idx);
        } else if self.is_root[idx as usize] {
            self.detach_subtree(idx, idx);
            self.is_root[idx as usize] = false;
        }

        self.dirty.remove_key(idx);

        let i = idx as usize;
        self.content[i] = None;
        self.opacity_mask[i] = None;
        self.clip[i] = None;
        self.on_attached[i].clear();
        self.on_detached[i].clear();
        self.alive[i] = false;
        // Bump generation so old handles immediately fail validation.
        self.generation[i] = self.generation[i].wrapping_add(1);

        self.free_list.push(idx);
        self.topology_dirty = true;
        self.pending_destroyed.push(idx);
    }

    /// Destroys a visual together with all of its descendants.
    ///
    /// Detach handlers run once for every attached visual in the subtree,
    /// before any slot is released.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn destroy_subtree(&mut self, id: VisualId) {
        self.validate(id);
        let idx = id.idx;
        if self.parent[idx as usize] != INVALID {
            self.detach_and_unlink(idx);
        } else if self.is_root[idx as usize] {
            self.set_root(id, false);
        }

        let mut order = Vec::new();
        self.collect_subtree(idx, &mut order);
        // Reverse pre-order visits every child before its parent.
        for &i in order.iter().rev() {
            self.destroy_visual(self.id_unchecked(i));
        }
    }

    /// Returns whether the given handle refers to a live visual.
    #[must_use]
    pub fn is_alive(&self, id: VisualId) -> bool {
        id.idx < self.len
            && self.alive[id.idx as usize]
            && self.generation[id.idx as usize] == id.generation
    }

    /// Returns the current handle for raw slot `idx`, if that slot is live.
    ///
    /// Useful for mapping the indices in [`FrameChanges`](super::FrameChanges)
    /// back to handles.
    #[must_use]
    pub fn id_at(&self, idx: u32) -> Option<VisualId> {
        (idx < self.len && self.alive[idx as usize]).then(|| self.id_unchecked(idx))
    }

    /// Returns the number of live visuals.
    #[must_use]
    pub fn visual_count(&self) -> usize {
        self.len as usize - self.free_list.len()
    }

    // -- Root API --

    /// Designates `id` as a root (or revokes it).
    ///
    /// Promoting a visual attaches it and its whole subtree, running attach
    /// handlers in pre-order. Demoting detaches them, running detach handlers.
    /// Setting the current value again is a no-op.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale, or when promoting a visual that has a
    /// parent.
    pub fn set_root(&mut self, id: VisualId, is_root: bool) {
        self.validate(id);
        let idx = id.idx;
        if self.is_root[idx as usize] == is_root {
            return;
        }
        if is_root {
            assert!(
                self.parent[idx as usize] == INVALID,
                "{}",
                VisualError::RootCannotBeChild(id)
            );
            self.is_root[idx as usize] = true;
            self.attach_subtree(idx, idx);
        } else {
            self.detach_subtree(idx, idx);
            self.is_root[idx as usize] = false;
        }
        self.topology_dirty = true;
        self.dirty.mark(idx, dirty::TOPOLOGY);
    }

    /// Returns whether `id` is designated as a root.
    #[must_use]
    pub fn is_root(&self, id: VisualId) -> bool {
        self.validate(id);
        self.is_root[id.idx as usize]
    }

    /// Returns all live visuals designated as roots, in slot order.
    #[must_use]
    pub fn roots(&self) -> Vec<VisualId> {
        (0..self.len)
            .filter(|&idx| self.alive[idx as usize] && self.is_root[idx as usize])
            .map(|idx| self.id_unchecked(idx))
            .collect()
    }

    // -- Topology API --

    /// Adds `child` as the last child of `parent`.
    ///
    /// If `parent` is attached, `child` and its subtree become attached and
    /// their attach handlers run (pre-order) before this call returns.
    ///
    /// # Panics
    ///
    /// Panics with the [`VisualError`] text if [`try_add_child`](Self::try_add_child)
    /// would fail.
    pub fn add_child(&mut self, parent: VisualId, child: VisualId) {
        if let Err(e) = self.try_add_child(parent, child) {
            panic!("{e}");
        }
    }

    /// Adds `child` as the last child of `parent`.
    ///
    /// # Errors
    ///
    /// - [`VisualError::StaleHandle`] if either handle is stale.
    /// - [`VisualError::RootCannotBeChild`] if `child` is a root.
    /// - [`VisualError::AlreadyParented`] if `child` already has a parent.
    /// - [`VisualError::WouldCreateCycle`] if `child` is `parent` or one of
    ///   its ancestors.
    pub fn try_add_child(&mut self, parent: VisualId, child: VisualId) -> Result<(), VisualError> {
        self.check_insert(parent, child)?;
        self.link(parent.idx, child.idx, INVALID);
        self.attach_if_rooted(child.idx);
        Ok(())
    }

    /// Inserts `child` at position `index` among `parent`'s children.
    ///
    /// An `index` past the end appends.
    ///
    /// # Panics
    ///
    /// Panics with the [`VisualError`] text if
    /// [`try_insert_child`](Self::try_insert_child) would fail.
    pub fn insert_child(&mut self, parent: VisualId, index: usize, child: VisualId) {
        if let Err(e) = self.try_insert_child(parent, index, child) {
            panic!("{e}");
        }
    }

    /// Inserts `child` at position `index` among `parent`'s children.
    ///
    /// # Errors
    ///
    /// Same as [`try_add_child`](Self::try_add_child).
    pub fn try_insert_child(
        &mut self,
        parent: VisualId,
        index: usize,
        child: VisualId,
    ) -> Result<(), VisualError> {
        self.check_insert(parent, child)?;
        let before = self
            .children(parent)
            .nth(index)
            .map_or(INVALID, |sibling| sibling.idx);
        self.link(parent.idx, child.idx, before);
        self.attach_if_rooted(child.idx);
        Ok(())
    }

    /// Removes `child` from `parent`.
    ///
    /// If `child` was attached, its subtree's detach handlers run (pre-order)
    /// while the links are still intact, then the links are severed.
    ///
    /// # Panics
    ///
    /// Panics with the [`VisualError`] text if
    /// [`try_remove_child`](Self::try_remove_child) would fail.
    pub fn remove_child(&mut self, parent: VisualId, child: VisualId) {
        if let Err(e) = self.try_remove_child(parent, child) {
            panic!("{e}");
        }
    }

    /// Removes `child` from `parent`.
    ///
    /// # Errors
    ///
    /// - [`VisualError::StaleHandle`] if either handle is stale.
    /// - [`VisualError::NotAChild`] if `child`'s parent is not `parent`.
    pub fn try_remove_child(&mut self, parent: VisualId, child: VisualId) -> Result<(), VisualError> {
        self.check_live(parent)?;
        self.check_live(child)?;
        if self.parent[child.idx as usize] != parent.idx {
            return Err(VisualError::NotAChild { parent, child });
        }
        self.detach_and_unlink(child.idx);
        Ok(())
    }

    /// Removes `child` from its current parent.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the visual has no parent.
    pub fn remove_from_parent(&mut self, child: VisualId) {
        self.validate(child);
        assert!(
            self.parent[child.idx as usize] != INVALID,
            "visual has no parent"
        );
        self.detach_and_unlink(child.idx);
    }

    /// Moves `child` to be the last child of `new_parent`.
    ///
    /// Moving within the same rooted tree runs no attach or detach handlers.
    /// Moving between trees runs detach handlers for the old tree, then
    /// attach handlers for the new one.
    ///
    /// # Panics
    ///
    /// Panics with the [`VisualError`] text if
    /// [`try_move_child`](Self::try_move_child) would fail.
    pub fn move_child(&mut self, child: VisualId, new_parent: VisualId) {
        if let Err(e) = self.try_move_child(child, new_parent) {
            panic!("{e}");
        }
    }

    /// Moves `child` to be the last child of `new_parent`.
    ///
    /// # Errors
    ///
    /// - [`VisualError::StaleHandle`] if either handle is stale.
    /// - [`VisualError::RootCannotBeChild`] if `child` is a root.
    /// - [`VisualError::WouldCreateCycle`] if `child` is `new_parent` or one
    ///   of its ancestors.
    pub fn try_move_child(&mut self, child: VisualId, new_parent: VisualId) -> Result<(), VisualError> {
        self.check_live(new_parent)?;
        self.check_live(child)?;
        self.check_no_cycle(new_parent, child)?;

        let c = child.idx;
        let old_root = self.attached_root[c as usize];
        let new_root = self.attached_root[new_parent.idx as usize];

        if old_root != INVALID && old_root != new_root {
            self.detach_subtree(c, old_root);
        }
        if self.parent[c as usize] != INVALID {
            self.unlink(c);
        }
        self.link(new_parent.idx, c, INVALID);
        if new_root != INVALID && old_root != new_root {
            self.attach_subtree(c, new_root);
        }
        Ok(())
    }

    /// Returns the parent of a visual, if any.
    #[must_use]
    pub fn parent(&self, id: VisualId) -> Option<VisualId> {
        self.validate(id);
        let p = self.parent[id.idx as usize];
        (p != INVALID).then(|| self.id_unchecked(p))
    }

    /// Returns an iterator over the direct children of a visual, in child
    /// order.
    #[must_use]
    pub fn children(&self, id: VisualId) -> Children<'_> {
        self.validate(id);
        Children::new(self, self.first_child[id.idx as usize])
    }

    // -- Property getters (read-only, no dirty marking) --

    /// Returns the bounds of a visual, relative to its parent.
    #[must_use]
    pub fn bounds(&self, id: VisualId) -> Rect {
        self.validate(id);
        self.bounds[id.idx as usize]
    }

    /// Returns the clip geometry of a visual.
    #[must_use]
    pub fn clip(&self, id: VisualId) -> Option<&Geometry> {
        self.validate(id);
        self.clip[id.idx as usize].as_ref()
    }

    /// Returns whether a visual clips its content and descendants to its
    /// bounds.
    #[must_use]
    pub fn clip_to_bounds(&self, id: VisualId) -> bool {
        self.validate(id);
        self.clip_to_bounds[id.idx as usize]
    }

    /// Returns the visual's own visibility flag.
    ///
    /// See [`is_effectively_visible`](Self::is_effectively_visible) for the
    /// inherited value.
    #[must_use]
    pub fn is_visible(&self, id: VisualId) -> bool {
        self.validate(id);
        self.visible[id.idx as usize]
    }

    /// Returns the local opacity of a visual.
    #[must_use]
    pub fn opacity(&self, id: VisualId) -> f64 {
        self.validate(id);
        self.opacity[id.idx as usize]
    }

    /// Returns the opacity mask of a visual.
    #[must_use]
    pub fn opacity_mask(&self, id: VisualId) -> Option<&Brush> {
        self.validate(id);
        self.opacity_mask[id.idx as usize].as_ref()
    }

    /// Returns the render transform of a visual.
    #[must_use]
    pub fn render_transform(&self, id: VisualId) -> Option<Affine> {
        self.validate(id);
        self.render_transform[id.idx as usize]
    }

    /// Returns the pivot of a visual's render transform.
    #[must_use]
    pub fn render_transform_origin(&self, id: VisualId) -> RelativePoint {
        self.validate(id);
        self.transform_origin[id.idx as usize]
    }

    /// Returns the z-index of a visual.
    #[must_use]
    pub fn z_index(&self, id: VisualId) -> i32 {
        self.validate(id);
        self.z_index[id.idx as usize]
    }

    /// Returns the paintable content of a visual.
    #[must_use]
    pub fn content(&self, id: VisualId) -> Option<&dyn Render> {
        self.validate(id);
        self.content[id.idx as usize].as_deref()
    }

    /// Returns the root-relative transform computed by the last
    /// [`evaluate`](Self::evaluate).
    ///
    /// For a detached subtree the transform is relative to its topmost
    /// ancestor.
    #[must_use]
    pub fn root_transform(&self, id: VisualId) -> Affine {
        self.validate(id);
        self.root_transform[id.idx as usize]
    }

    /// Returns the effective opacity computed by the last
    /// [`evaluate`](Self::evaluate): the product of the visual's opacity and
    /// every ancestor's.
    #[must_use]
    pub fn effective_opacity(&self, id: VisualId) -> f64 {
        self.validate(id);
        self.effective_opacity[id.idx as usize]
    }

    // -- Mutation API (auto-marks dirty) --

    /// Sets the bounds of a visual, relative to its parent.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale, or `bounds` is not finite or has a
    /// negative width or height.
    pub fn set_bounds(&mut self, id: VisualId, bounds: Rect) {
        self.validate(id);
        assert!(bounds.is_finite(), "bounds must be finite, got {bounds:?}");
        assert!(
            bounds.x1 >= bounds.x0 && bounds.y1 >= bounds.y0,
            "bounds must have a non-negative size, got {bounds:?}"
        );
        if self.bounds[id.idx as usize] == bounds {
            return;
        }
        self.bounds[id.idx as usize] = bounds;
        self.mark_propagating(id.idx, dirty::TRANSFORM);
        self.mark_local(id.idx, dirty::RENDER);
    }

    /// Sets the clip geometry of a visual, in its local coordinates.
    pub fn set_clip(&mut self, id: VisualId, clip: Option<Geometry>) {
        self.validate(id);
        self.clip[id.idx as usize] = clip;
        self.mark_local(id.idx, dirty::CLIP);
    }

    /// Sets whether a visual clips its content and descendants to its
    /// bounds.
    pub fn set_clip_to_bounds(&mut self, id: VisualId, clip_to_bounds: bool) {
        self.validate(id);
        if self.clip_to_bounds[id.idx as usize] == clip_to_bounds {
            return;
        }
        self.clip_to_bounds[id.idx as usize] = clip_to_bounds;
        self.mark_local(id.idx, dirty::CLIP);
    }

    /// Sets a visual's own visibility flag.
    ///
    /// Hiding a visual hides its whole subtree. Properties can still be
    /// changed while hidden.
    pub fn set_visible(&mut self, id: VisualId, visible: bool) {
        self.validate(id);
        if self.visible[id.idx as usize] == visible {
            return;
        }
        self.visible[id.idx as usize] = visible;
        self.mark_propagating(id.idx, dirty::VISIBILITY);
    }

    /// Sets the local opacity of a visual.
    ///
    /// A fully transparent visual stays visible; it just paints nothing.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or `opacity` is not a finite value in
    /// `[0, 1]`.
    pub fn set_opacity(&mut self, id: VisualId, opacity: f64) {
        self.validate(id);
        assert!(
            opacity.is_finite() && (0.0..=1.0).contains(&opacity),
            "opacity must be finite and in [0, 1], got {opacity}"
        );
        self.opacity[id.idx as usize] = opacity;
        self.mark_propagating(id.idx, dirty::OPACITY);
    }

    /// Sets the opacity mask of a visual.
    ///
    /// The mask's alpha modulates the composited output of the visual and its
    /// descendants.
    pub fn set_opacity_mask(&mut self, id: VisualId, mask: Option<Brush>) {
        self.validate(id);
        self.opacity_mask[id.idx as usize] = mask;
        self.mark_local(id.idx, dirty::RENDER);
    }

    /// Sets the render transform of a visual.
    ///
    /// The transform is applied around the
    /// [render transform origin](Self::set_render_transform_origin) after the
    /// bounds offset.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the transform is not finite.
    pub fn set_render_transform(&mut self, id: VisualId, transform: Option<Affine>) {
        self.validate(id);
        if let Some(t) = transform {
            assert!(t.is_finite(), "render transform must be finite, got {t:?}");
        }
        self.render_transform[id.idx as usize] = transform;
        self.mark_propagating(id.idx, dirty::TRANSFORM);
    }

    /// Sets the pivot of a visual's render transform.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the origin is not finite.
    pub fn set_render_transform_origin(&mut self, id: VisualId, origin: RelativePoint) {
        self.validate(id);
        assert!(
            origin.is_finite(),
            "render transform origin must be finite, got {origin:?}"
        );
        self.transform_origin[id.idx as usize] = origin;
        if self.render_transform[id.idx as usize].is_some() {
            self.mark_propagating(id.idx, dirty::TRANSFORM);
        }
    }

    /// Sets the z-index of a visual.
    ///
    /// Higher values paint later (on top of) lower-valued siblings.
    pub fn set_z_index(&mut self, id: VisualId, z_index: i32) {
        self.validate(id);
        if self.z_index[id.idx as usize] == z_index {
            return;
        }
        self.z_index[id.idx as usize] = z_index;
        self.mark_local(id.idx, dirty::RENDER);
        let p = self.parent[id.idx as usize];
        if p != INVALID {
            self.topology_dirty = true;
            self.mark_local(p, dirty::TOPOLOGY);
        }
    }

    /// Sets the paintable content of a visual.
    pub fn set_content(&mut self, id: VisualId, content: Option<Box<dyn Render>>) {
        self.validate(id);
        self.content[id.idx as usize] = content;
        self.mark_local(id.idx, dirty::RENDER);
    }

    /// Marks the painted output of a visual as stale.
    ///
    /// The visual is reported in [`FrameChanges::repaints`](super::FrameChanges::repaints)
    /// by the next [`evaluate`](Self::evaluate). Repeated calls before then
    /// have no further effect.
    pub fn invalidate_visual(&mut self, id: VisualId) {
        self.validate(id);
        self.mark_local(id.idx, dirty::RENDER);
    }

    // -- Repaint scheduling --

    /// Installs a hook that is called when the first change after an
    /// [`evaluate`](Self::evaluate) touches an attached visual.
    ///
    /// The hook is expected to schedule a frame on the UI thread and return
    /// immediately. It is called at most once between evaluations.
    pub fn set_repaint_hook(&mut self, hook: impl FnMut() + 'static) {
        self.repaint_hook = Some(Box::new(hook));
    }

    /// Removes the repaint hook.
    pub fn clear_repaint_hook(&mut self) {
        self.repaint_hook = None;
    }

    /// Returns whether a repaint has been requested since the last
    /// [`evaluate`](Self::evaluate).
    #[must_use]
    pub fn repaint_requested(&self) -> bool {
        self.repaint_requested
    }

    // -- Internal helpers --

    /// Panics if the handle is stale.
    pub(crate) fn validate(&self, id: VisualId) {
        assert!(
            self.is_alive(id),
            "stale VisualId: {id:?} (current gen: {})",
            if id.idx < self.len {
                self.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }

    pub(crate) fn id_unchecked(&self, idx: u32) -> VisualId {
        VisualId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    fn check_live(&self, id: VisualId) -> Result<(), VisualError> {
        if self.is_alive(id) {
            Ok(())
        } else {
            Err(VisualError::StaleHandle(id))
        }
    }

    fn check_no_cycle(&self, parent: VisualId, child: VisualId) -> Result<(), VisualError> {
        if self.is_root[child.idx as usize] {
            return Err(VisualError::RootCannotBeChild(child));
        }
        if parent.idx == child.idx || self.is_ancestor_of(child.idx, parent.idx) {
            return Err(VisualError::WouldCreateCycle { parent, child });
        }
        Ok(())
    }

    fn check_insert(&self, parent: VisualId, child: VisualId) -> Result<(), VisualError> {
        self.check_live(parent)?;
        self.check_live(child)?;
        self.check_no_cycle(parent, child)?;
        if self.parent[child.idx as usize] != INVALID {
            return Err(VisualError::AlreadyParented(child));
        }
        Ok(())
    }

    /// Links `c` under `p`, before `before` or last if `before` is
    /// [`INVALID`].
    fn link(&mut self, p: u32, c: u32, before: u32) {
        let (pi, ci) = (p as usize, c as usize);
        self.parent[ci] = p;
        if before == INVALID {
            let last = self.last_child[pi];
            self.prev_sibling[ci] = last;
            self.next_sibling[ci] = INVALID;
            if last == INVALID {
                self.first_child[pi] = c;
            } else {
                self.next_sibling[last as usize] = c;
            }
            self.last_child[pi] = c;
        } else {
            let prev = self.prev_sibling[before as usize];
            self.prev_sibling[ci] = prev;
            self.next_sibling[ci] = before;
            if prev == INVALID {
                self.first_child[pi] = c;
            } else {
                self.next_sibling[prev as usize] = c;
            }
            self.prev_sibling[before as usize] = c;
        }

        // Child depends on parent for inherited channels.
        let _ = self.dirty.add_dependency(c, p, dirty::TRANSFORM);
        let _ = self.dirty.add_dependency(c, p, dirty::OPACITY);
        let _ = self.dirty.add_dependency(c, p, dirty::VISIBILITY);

        self.mark_subtree_inherited_dirty(c);
        self.topology_dirty = true;
        self.mark_local(p, dirty::TOPOLOGY);
    }

    /// Removes `c` from its parent's child list.
    fn unlink(&mut self, c: u32) {
        let ci = c as usize;
        let p = self.parent[ci];
        let prev = self.prev_sibling[ci];
        let next = self.next_sibling[ci];

        if prev != INVALID {
            self.next_sibling[prev as usize] = next;
        } else {
            self.first_child[p as usize] = next;
        }
        if next != INVALID {
            self.prev_sibling[next as usize] = prev;
        } else {
            self.last_child[p as usize] = prev;
        }

        self.parent[ci] = INVALID;
        self.prev_sibling[ci] = INVALID;
        self.next_sibling[ci] = INVALID;

        self.dirty.remove_dependency(c, p, dirty::TRANSFORM);
        self.dirty.remove_dependency(c, p, dirty::OPACITY);
        self.dirty.remove_dependency(c, p, dirty::VISIBILITY);

        self.mark_subtree_inherited_dirty(c);
        self.topology_dirty = true;
        self.mark_local(p, dirty::TOPOLOGY);
    }

    /// Runs detach handlers for `c`'s subtree if it is attached, then unlinks
    /// it from its parent.
    fn detach_and_unlink(&mut self, c: u32) {
        let root = self.attached_root[c as usize];
        if root != INVALID {
            self.detach_subtree(c, root);
        }
        self.unlink(c);
    }

    /// Attaches `c`'s subtree if its (new) parent is attached.
    fn attach_if_rooted(&mut self, c: u32) {
        let p = self.parent[c as usize];
        let root = self.attached_root[p as usize];
        if root != INVALID {
            self.attach_subtree(c, root);
        }
    }

    /// Returns `true` if `ancestor` is a strict ancestor of `idx`.
    pub(crate) fn is_ancestor_of(&self, ancestor: u32, idx: u32) -> bool {
        let mut cur = self.parent[idx as usize];
        while cur != INVALID {
            if cur == ancestor {
                return true;
            }
            cur = self.parent[cur as usize];
        }
        false
    }

    /// Marks the subtree rooted at `idx` dirty for inherited channels.
    fn mark_subtree_inherited_dirty(&mut self, idx: u32) {
        self.dirty.mark_with(idx, dirty::TRANSFORM, &EagerPolicy);
        self.dirty.mark_with(idx, dirty::OPACITY, &EagerPolicy);
        self.dirty.mark_with(idx, dirty::VISIBILITY, &EagerPolicy);
        self.request_repaint_for(idx);
    }

    fn mark_propagating(&mut self, idx: u32, channel: understory_dirty::Channel) {
        self.dirty.mark_with(idx, channel, &EagerPolicy);
        self.request_repaint_for(idx);
    }

    fn mark_local(&mut self, idx: u32, channel: understory_dirty::Channel) {
        self.dirty.mark(idx, channel);
        self.request_repaint_for(idx);
    }

    /// Calls the repaint hook once per frame, for changes to attached
    /// visuals only.
    pub(crate) fn request_repaint_for(&mut self, idx: u32) {
        if self.repaint_requested || self.attached_root[idx as usize] == INVALID {
            return;
        }
        self.repaint_requested = true;
        if let Some(hook) = &mut self.repaint_hook {
            hook();
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use alloc::vec;
    use core::cell::Cell;

    use super::*;
    use crate::brush::Color;
    use crate::render::FillBounds;

    #[test]
    fn create_and_destroy() {
        let mut tree = VisualTree::new();
        let id = tree.create_visual();
        assert!(tree.is_alive(id));
        assert_eq!(tree.visual_count(), 1);
        tree.destroy_visual(id);
        assert!(!tree.is_alive(id));
        assert_eq!(tree.visual_count(), 0);
    }

    #[test]
    fn generation_prevents_stale_access() {
        let mut tree = VisualTree::new();
        let id1 = tree.create_visual();
        tree.destroy_visual(id1);
        let id2 = tree.create_visual();
        assert!(!tree.is_alive(id1));
        assert!(tree.is_alive(id2));
        assert_eq!(id1.index(), id2.index());
        assert_ne!(id1.generation(), id2.generation());
        assert_eq!(tree.id_at(id2.index()), Some(id2));
    }

    #[test]
    fn recycled_slot_starts_with_defaults() {
        let mut tree = VisualTree::new();
        let id = tree.create_visual();
        tree.set_opacity(id, 0.25);
        tree.set_z_index(id, 9);
        tree.set_visible(id, false);
        tree.destroy_visual(id);

        let fresh = tree.create_visual();
        assert_eq!(tree.opacity(fresh), 1.0);
        assert_eq!(tree.z_index(fresh), 0);
        assert!(tree.is_visible(fresh));
        assert_eq!(tree.bounds(fresh), Rect::ZERO);
    }

    #[test]
    fn add_child_and_query() {
        let mut tree = VisualTree::new();
        let parent = tree.create_visual();
        let child1 = tree.create_visual();
        let child2 = tree.create_visual();

        tree.add_child(parent, child1);
        tree.add_child(parent, child2);

        assert_eq!(tree.parent(child1), Some(parent));
        assert_eq!(tree.parent(child2), Some(parent));
        let kids: Vec<_> = tree.children(parent).collect();
        assert_eq!(kids, vec![child1, child2]);
    }

    #[test]
    fn insert_child_at_index() {
        let mut tree = VisualTree::new();
        let parent = tree.create_visual();
        let a = tree.create_visual();
        let b = tree.create_visual();
        let c = tree.create_visual();
        let d = tree.create_visual();

        tree.add_child(parent, a);
        tree.add_child(parent, c);
        tree.insert_child(parent, 1, b);
        tree.insert_child(parent, 99, d);

        let kids: Vec<_> = tree.children(parent).collect();
        assert_eq!(kids, vec![a, b, c, d]);
    }

    #[test]
    fn remove_child_relinks_siblings() {
        let mut tree = VisualTree::new();
        let parent = tree.create_visual();
        let a = tree.create_visual();
        let b = tree.create_visual();
        let c = tree.create_visual();
        tree.add_child(parent, a);
        tree.add_child(parent, b);
        tree.add_child(parent, c);

        tree.remove_child(parent, b);
        assert_eq!(tree.parent(b), None);
        let kids: Vec<_> = tree.children(parent).collect();
        assert_eq!(kids, vec![a, c]);

        tree.remove_from_parent(c);
        tree.add_child(parent, b);
        let kids: Vec<_> = tree.children(parent).collect();
        assert_eq!(kids, vec![a, b]);
    }

    #[test]
    fn move_child_between_parents() {
        let mut tree = VisualTree::new();
        let p1 = tree.create_visual();
        let p2 = tree.create_visual();
        let child = tree.create_visual();

        tree.add_child(p1, child);
        tree.move_child(child, p2);
        assert_eq!(tree.parent(child), Some(p2));
        assert!(tree.children(p1).next().is_none());
    }

    #[test]
    fn structural_errors_are_reported() {
        let mut tree = VisualTree::new();
        let root = tree.create_root();
        let a = tree.create_visual();
        let b = tree.create_visual();
        tree.add_child(a, b);

        assert_eq!(
            tree.try_add_child(b, a),
            Err(VisualError::WouldCreateCycle {
                parent: b,
                child: a
            })
        );
        assert_eq!(
            tree.try_add_child(a, a),
            Err(VisualError::WouldCreateCycle {
                parent: a,
                child: a
            })
        );
        assert_eq!(
            tree.try_add_child(root, b),
            Err(VisualError::AlreadyParented(b))
        );
        assert_eq!(
            tree.try_add_child(a, root),
            Err(VisualError::RootCannotBeChild(root))
        );
        assert_eq!(
            tree.try_remove_child(root, b),
            Err(VisualError::NotAChild {
                parent: root,
                child: b
            })
        );
        assert_eq!(
            tree.try_move_child(a, b),
            Err(VisualError::WouldCreateCycle {
                parent: b,
                child: a
            })
        );

        let gone = tree.create_visual();
        tree.destroy_visual(gone);
        assert_eq!(
            tree.try_add_child(root, gone),
            Err(VisualError::StaleHandle(gone))
        );
    }

    #[test]
    #[should_panic(expected = "would create a cycle")]
    fn add_ancestor_as_child_panics() {
        let mut tree = VisualTree::new();
        let a = tree.create_visual();
        let b = tree.create_visual();
        tree.add_child(a, b);
        tree.add_child(b, a);
    }

    #[test]
    #[should_panic(expected = "cannot destroy visual with children")]
    fn destroy_with_children_panics() {
        let mut tree = VisualTree::new();
        let parent = tree.create_visual();
        let child = tree.create_visual();
        tree.add_child(parent, child);
        tree.destroy_visual(parent);
    }

    #[test]
    fn destroy_subtree_releases_all_slots() {
        let mut tree = VisualTree::new();
        let root = tree.create_root();
        let a = tree.create_visual();
        let b = tree.create_visual();
        let c = tree.create_visual();
        tree.add_child(root, a);
        tree.add_child(a, b);
        tree.add_child(a, c);

        tree.destroy_subtree(a);
        assert!(tree.is_alive(root));
        assert!(!tree.is_alive(a));
        assert!(!tree.is_alive(b));
        assert!(!tree.is_alive(c));
        assert!(tree.children(root).next().is_none());
        assert_eq!(tree.visual_count(), 1);
    }

    #[test]
    #[should_panic(expected = "stale VisualId")]
    fn destroyed_handle_panics_on_get_bounds() {
        let mut tree = VisualTree::new();
        let id = tree.create_visual();
        tree.destroy_visual(id);
        let _ = tree.bounds(id);
    }

    #[test]
    #[should_panic(expected = "stale VisualId")]
    fn destroyed_handle_panics_on_invalidate() {
        let mut tree = VisualTree::new();
        let id = tree.create_visual();
        tree.destroy_visual(id);
        tree.invalidate_visual(id);
    }

    #[test]
    #[should_panic(expected = "opacity must be finite and in [0, 1]")]
    fn negative_opacity_panics_at_assignment() {
        let mut tree = VisualTree::new();
        let id = tree.create_visual();
        tree.set_opacity(id, -0.1);
    }

    #[test]
    #[should_panic(expected = "opacity must be finite and in [0, 1]")]
    fn nan_opacity_panics_at_assignment() {
        let mut tree = VisualTree::new();
        let id = tree.create_visual();
        tree.set_opacity(id, f64::NAN);
    }

    #[test]
    #[should_panic(expected = "bounds must be finite")]
    fn infinite_bounds_panic_at_assignment() {
        let mut tree = VisualTree::new();
        let id = tree.create_visual();
        tree.set_bounds(id, Rect::new(0.0, 0.0, f64::INFINITY, 1.0));
    }

    #[test]
    #[should_panic(expected = "non-negative size")]
    fn inverted_bounds_panic_at_assignment() {
        let mut tree = VisualTree::new();
        let id = tree.create_visual();
        tree.set_bounds(id, Rect::new(10.0, 0.0, 0.0, 5.0));
    }

    #[test]
    #[should_panic(expected = "render transform must be finite")]
    fn nan_render_transform_panics_at_assignment() {
        let mut tree = VisualTree::new();
        let id = tree.create_visual();
        tree.set_render_transform(id, Some(Affine::scale(f64::NAN)));
    }

    #[test]
    #[should_panic(expected = "is a root and cannot have a parent")]
    fn promoting_child_to_root_panics() {
        let mut tree = VisualTree::new();
        let parent = tree.create_visual();
        let child = tree.create_visual();
        tree.add_child(parent, child);
        tree.set_root(child, true);
    }

    #[test]
    fn property_round_trip() {
        let mut tree = VisualTree::new();
        let id = tree.create_visual();

        tree.set_bounds(id, Rect::new(1.0, 2.0, 11.0, 22.0));
        tree.set_clip_to_bounds(id, true);
        tree.set_clip(id, Some(Geometry::Rect(Rect::new(0.0, 0.0, 5.0, 5.0))));
        tree.set_opacity(id, 0.5);
        tree.set_opacity_mask(id, Some(Brush::Solid(Color::BLACK)));
        tree.set_render_transform(id, Some(Affine::rotate(0.5)));
        tree.set_render_transform_origin(id, RelativePoint::TOP_LEFT);
        tree.set_z_index(id, -3);
        tree.set_content(id, Some(Box::new(FillBounds(Brush::Solid(Color::WHITE)))));

        assert_eq!(tree.bounds(id), Rect::new(1.0, 2.0, 11.0, 22.0));
        assert!(tree.clip_to_bounds(id));
        assert!(tree.clip(id).is_some_and(Geometry::is_rect));
        assert_eq!(tree.opacity(id), 0.5);
        assert_eq!(tree.opacity_mask(id), Some(&Brush::Solid(Color::BLACK)));
        assert_eq!(tree.render_transform(id), Some(Affine::rotate(0.5)));
        assert_eq!(tree.render_transform_origin(id), RelativePoint::TOP_LEFT);
        assert_eq!(tree.z_index(id), -3);
        assert!(tree.content(id).is_some());
    }

    #[test]
    fn roots_lists_designated_roots_only() {
        let mut tree = VisualTree::new();
        let r1 = tree.create_root();
        let loose = tree.create_visual();
        let r2 = tree.create_root();

        assert_eq!(tree.roots(), vec![r1, r2]);
        assert!(tree.is_root(r1));
        assert!(!tree.is_root(loose));

        tree.set_root(r1, false);
        assert_eq!(tree.roots(), vec![r2]);
    }

    #[test]
    fn repaint_hook_fires_once_per_frame_for_attached_changes() {
        let calls = Rc::new(Cell::new(0_u32));
        let mut tree = VisualTree::new();
        let counter = Rc::clone(&calls);
        tree.set_repaint_hook(move || counter.set(counter.get() + 1));

        // Detached changes do not schedule a repaint.
        let loose = tree.create_visual();
        tree.invalidate_visual(loose);
        assert_eq!(calls.get(), 0);
        assert!(!tree.repaint_requested());

        let root = tree.create_root();
        assert_eq!(calls.get(), 1);
        tree.invalidate_visual(root);
        tree.invalidate_visual(root);
        tree.set_opacity(root, 0.5);
        assert_eq!(calls.get(), 1, "hook must only fire once per frame");
        assert!(tree.repaint_requested());

        let _ = tree.evaluate();
        assert!(!tree.repaint_requested());
        tree.invalidate_visual(root);
        assert_eq!(calls.get(), 2);
    }
}
