// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree traversal utilities and derived queries.

use alloc::vec::Vec;

use super::id::{INVALID, VisualId};
use super::store::VisualTree;

/// An iterator over the direct children of a visual.
///
/// Created by [`VisualTree::children`].
#[derive(Debug)]
pub struct Children<'a> {
    tree: &'a VisualTree,
    current: u32,
}

impl<'a> Children<'a> {
    pub(crate) fn new(tree: &'a VisualTree, first: u32) -> Self {
        Self {
            tree,
            current: first,
        }
    }
}

impl Iterator for Children<'_> {
    type Item = VisualId;

    fn next(&mut self) -> Option<VisualId> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        self.current = self.tree.next_sibling[idx as usize];
        Some(self.tree.id_unchecked(idx))
    }
}

/// An iterator over the strict ancestors of a visual, nearest first.
///
/// Created by [`VisualTree::ancestors`].
#[derive(Debug)]
pub struct Ancestors<'a> {
    tree: &'a VisualTree,
    current: u32,
}

impl Iterator for Ancestors<'_> {
    type Item = VisualId;

    fn next(&mut self) -> Option<VisualId> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        self.current = self.tree.parent[idx as usize];
        Some(self.tree.id_unchecked(idx))
    }
}

/// A depth-first pre-order iterator over the strict descendants of a visual.
///
/// Created by [`VisualTree::descendants`].
#[derive(Debug)]
pub struct Descendants<'a> {
    tree: &'a VisualTree,
    top: u32,
    current: u32,
}

impl Iterator for Descendants<'_> {
    type Item = VisualId;

    fn next(&mut self) -> Option<VisualId> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        self.current = self.tree.pre_order_successor(self.top, idx);
        Some(self.tree.id_unchecked(idx))
    }
}

impl VisualTree {
    /// Returns an iterator over the strict ancestors of `id`, nearest first.
    #[must_use]
    pub fn ancestors(&self, id: VisualId) -> Ancestors<'_> {
        self.validate(id);
        Ancestors {
            tree: self,
            current: self.parent[id.idx as usize],
        }
    }

    /// Returns a pre-order iterator over the strict descendants of `id`.
    #[must_use]
    pub fn descendants(&self, id: VisualId) -> Descendants<'_> {
        self.validate(id);
        Descendants {
            tree: self,
            top: id.idx,
            current: self.first_child[id.idx as usize],
        }
    }

    /// Returns the children of `id` in paint order: ascending z-index, with
    /// ties kept in child order.
    #[must_use]
    pub fn children_in_z_order(&self, id: VisualId) -> Vec<VisualId> {
        let mut out: Vec<VisualId> = self.children(id).collect();
        // Stable sort keeps insertion order among equal z-indices.
        out.sort_by_key(|c| self.z_index[c.idx as usize]);
        out
    }

    /// Returns the number of parent links between `id` and its root.
    ///
    /// Roots and unattached visuals report 0, even when an unattached visual
    /// has a parent.
    #[must_use]
    pub fn distance_from_root(&self, id: VisualId) -> u32 {
        self.validate(id);
        if self.attached_root[id.idx as usize] == INVALID {
            return 0;
        }
        self.depth_of(id.idx)
    }

    /// Returns `true` if `id` and every ancestor have their visibility flag
    /// set.
    ///
    /// Opacity does not affect this.
    #[must_use]
    pub fn is_effectively_visible(&self, id: VisualId) -> bool {
        self.validate(id);
        let mut cur = id.idx;
        while cur != INVALID {
            if !self.visible[cur as usize] {
                return false;
            }
            cur = self.parent[cur as usize];
        }
        true
    }

    /// Returns the nearest visual that is an ancestor of (or equal to) both
    /// `a` and `b`.
    #[must_use]
    pub fn common_ancestor(&self, a: VisualId, b: VisualId) -> Option<VisualId> {
        self.validate(a);
        self.validate(b);
        let idx = self.common_ancestor_idx(a.idx, b.idx);
        (idx != INVALID).then(|| self.id_unchecked(idx))
    }

    pub(crate) fn depth_of(&self, idx: u32) -> u32 {
        let mut depth = 0;
        let mut cur = self.parent[idx as usize];
        while cur != INVALID {
            depth += 1;
            cur = self.parent[cur as usize];
        }
        depth
    }

    pub(crate) fn common_ancestor_idx(&self, a: u32, b: u32) -> u32 {
        let (mut a, mut b) = (a, b);
        let (mut da, mut db) = (self.depth_of(a), self.depth_of(b));
        while da > db {
            a = self.parent[a as usize];
            da -= 1;
        }
        while db > da {
            b = self.parent[b as usize];
            db -= 1;
        }
        while a != b {
            a = self.parent[a as usize];
            b = self.parent[b as usize];
            if a == INVALID || b == INVALID {
                return INVALID;
            }
        }
        a
    }

    /// Returns the node after `idx` in a pre-order walk of `top`'s subtree,
    /// or [`INVALID`] when the walk is done.
    fn pre_order_successor(&self, top: u32, idx: u32) -> u32 {
        let first = self.first_child[idx as usize];
        if first != INVALID {
            return first;
        }
        let mut cur = idx;
        while cur != top {
            let next = self.next_sibling[cur as usize];
            if next != INVALID {
                return next;
            }
            cur = self.parent[cur as usize];
        }
        INVALID
    }

    /// Appends `top` and its descendants to `out` in pre-order.
    pub(crate) fn collect_subtree(&self, top: u32, out: &mut Vec<u32>) {
        out.push(top);
        let mut cur = self.first_child[top as usize];
        while cur != INVALID {
            out.push(cur);
            cur = self.pre_order_successor(top, cur);
        }
    }
}
