// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Coordinate-space conversion between visuals.
//!
//! Every visual has a *local* space in which it occupies `(0, 0)..size`. The
//! local-to-parent transform is
//!
//! ```text
//! translate(bounds.origin) * translate(o) * render_transform * translate(-o)
//! ```
//!
//! where `o` is the render transform origin resolved against the bounds size.
//! A visual without a render transform is just offset by its bounds origin.

use kurbo::{Affine, Point};

use super::id::{INVALID, VisualId};
use super::store::VisualTree;

impl VisualTree {
    /// Returns the transform from `id`'s local space into its parent's.
    #[must_use]
    pub fn local_transform(&self, id: VisualId) -> Affine {
        self.validate(id);
        self.local_transform_at(id.idx)
    }

    /// Returns the transform that maps points in `from`'s local space into
    /// `to`'s local space.
    ///
    /// Returns `None` when either visual is detached, when they belong to
    /// different rooted trees, or when `to`'s chain down from the common
    /// ancestor is not invertible.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale.
    #[must_use]
    pub fn transform_to_visual(&self, from: VisualId, to: VisualId) -> Option<Affine> {
        self.validate(from);
        self.validate(to);
        let root = self.attached_root[from.idx as usize];
        if root == INVALID || root != self.attached_root[to.idx as usize] {
            return None;
        }
        let common = self.common_ancestor_idx(from.idx, to.idx);
        let up = self.transform_to_ancestor(from.idx, common);
        let down = self.transform_to_ancestor(to.idx, common);
        let inverse = down.inverse();
        inverse.is_finite().then(|| inverse * up)
    }

    /// Returns the transform from `id`'s local space into its root's local
    /// space, or `None` if `id` is detached.
    #[must_use]
    pub fn transform_to_root(&self, id: VisualId) -> Option<Affine> {
        self.validate(id);
        let root = self.attached_root[id.idx as usize];
        (root != INVALID).then(|| self.transform_to_ancestor(id.idx, root))
    }

    /// Maps `point` from `from`'s local space into `to`'s.
    ///
    /// See [`transform_to_visual`](Self::transform_to_visual) for when this
    /// returns `None`.
    #[must_use]
    pub fn translate_point(&self, from: VisualId, to: VisualId, point: Point) -> Option<Point> {
        self.transform_to_visual(from, to).map(|t| t * point)
    }

    pub(crate) fn local_transform_at(&self, idx: u32) -> Affine {
        let i = idx as usize;
        let bounds = self.bounds[i];
        let offset = Affine::translate(bounds.origin().to_vec2());
        match self.render_transform[i] {
            None => offset,
            Some(rt) => {
                let o = self.transform_origin[i].resolve(bounds.size()).to_vec2();
                offset * Affine::translate(o) * rt * Affine::translate(-o)
            }
        }
    }

    /// Composes local transforms from `idx` up to (but excluding) `ancestor`.
    ///
    /// Passing [`INVALID`] composes all the way to the topmost ancestor,
    /// including its own local transform.
    pub(crate) fn transform_to_ancestor(&self, idx: u32, ancestor: u32) -> Affine {
        let mut t = Affine::IDENTITY;
        let mut cur = idx;
        while cur != ancestor && cur != INVALID {
            t = self.local_transform_at(cur) * t;
            cur = self.parent[cur as usize];
        }
        t
    }
}
