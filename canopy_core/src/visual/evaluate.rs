// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame evaluation and change tracking.
//!
//! Evaluation drains each dirty channel once per frame:
//!
//! 1. **TRANSFORM**: recompute `root_transform` as
//!    `parent_root_transform * local_transform`, parents first. A visual
//!    without a parent gets the identity.
//! 2. **OPACITY**: recompute `effective_opacity` as
//!    `parent_effective * opacity`, parents first.
//! 3. **VISIBILITY** / **CLIP** / **RENDER**: collect only; renderers read
//!    the current values from the tree.
//! 4. **TOPOLOGY**: drain and discard; [`FrameChanges::topology_changed`]
//!    reports it.
//!
//! [`FrameChanges`] carries raw slot indices. Use
//! [`VisualTree::id_at`] to turn them back into handles.

use alloc::vec::Vec;

use kurbo::Affine;

use super::id::INVALID;
use super::store::VisualTree;
use crate::dirty;
use crate::trace::{PhaseBeginEvent, PhaseEndEvent, PhaseKind, Tracer};

/// The set of changes produced by a single [`VisualTree::evaluate`] call.
///
/// Each list holds the raw slot indices of live visuals that changed in the
/// corresponding category, except `detached` and `destroyed`, which may name
/// slots that have since been freed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameChanges {
    /// Evaluation counter, starting at 0.
    pub frame_index: u64,
    /// Visuals whose root-relative transform was recomputed.
    pub transforms: Vec<u32>,
    /// Visuals whose effective opacity was recomputed.
    pub opacities: Vec<u32>,
    /// Visuals whose effective visibility may have changed.
    pub visibility: Vec<u32>,
    /// Visuals whose clip geometry or clip-to-bounds flag changed.
    pub clips: Vec<u32>,
    /// Visuals whose painted output was invalidated.
    pub repaints: Vec<u32>,
    /// Visuals that joined a rooted tree.
    pub attached: Vec<u32>,
    /// Visuals that left a rooted tree.
    pub detached: Vec<u32>,
    /// Visuals created since the last evaluate.
    pub created: Vec<u32>,
    /// Visuals destroyed since the last evaluate.
    pub destroyed: Vec<u32>,
    /// Whether the tree topology or a sibling paint order changed.
    pub topology_changed: bool,
}

impl FrameChanges {
    /// Clears all change lists.
    pub fn clear(&mut self) {
        self.frame_index = 0;
        self.transforms.clear();
        self.opacities.clear();
        self.visibility.clear();
        self.clips.clear();
        self.repaints.clear();
        self.attached.clear();
        self.detached.clear();
        self.created.clear();
        self.destroyed.clear();
        self.topology_changed = false;
    }

    /// Returns `true` if nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.topology_changed
            && self.transforms.is_empty()
            && self.opacities.is_empty()
            && self.visibility.is_empty()
            && self.clips.is_empty()
            && self.repaints.is_empty()
            && self.attached.is_empty()
            && self.detached.is_empty()
            && self.created.is_empty()
            && self.destroyed.is_empty()
    }

    fn touched(&self) -> u32 {
        let n = self.transforms.len()
            + self.opacities.len()
            + self.visibility.len()
            + self.clips.len()
            + self.repaints.len();
        u32::try_from(n).unwrap_or(u32::MAX)
    }
}

impl VisualTree {
    /// Evaluates the tree, recomputing dirty inherited properties and
    /// returning the set of changes.
    ///
    /// This also re-arms the repaint hook: the next change after this call
    /// requests a repaint again.
    pub fn evaluate(&mut self) -> FrameChanges {
        let mut changes = FrameChanges::default();
        self.evaluate_into(&mut changes);
        changes
    }

    /// Like [`evaluate`](Self::evaluate), but reuses a caller-provided buffer.
    pub fn evaluate_into(&mut self, changes: &mut FrameChanges) {
        changes.clear();
        changes.frame_index = self.frame_index;

        if self.topology_dirty {
            changes.topology_changed = true;
            self.topology_dirty = false;
        }

        let mut dirty_transforms: Vec<u32> = self
            .dirty
            .drain(dirty::TRANSFORM)
            .affected()
            .deterministic()
            .run()
            .collect();
        self.retain_live(&mut dirty_transforms);
        self.sort_parents_first(&mut dirty_transforms);
        for &idx in &dirty_transforms {
            let parent = self.parent[idx as usize];
            self.root_transform[idx as usize] = if parent != INVALID {
                self.root_transform[parent as usize] * self.local_transform_at(idx)
            } else {
                Affine::IDENTITY
            };
        }
        changes.transforms = dirty_transforms;

        let mut dirty_opacities: Vec<u32> = self
            .dirty
            .drain(dirty::OPACITY)
            .affected()
            .deterministic()
            .run()
            .collect();
        self.retain_live(&mut dirty_opacities);
        self.sort_parents_first(&mut dirty_opacities);
        for &idx in &dirty_opacities {
            let parent = self.parent[idx as usize];
            let inherited = if parent != INVALID {
                self.effective_opacity[parent as usize]
            } else {
                1.0
            };
            self.effective_opacity[idx as usize] = inherited * self.opacity[idx as usize];
        }
        changes.opacities = dirty_opacities;

        changes.visibility = self
            .dirty
            .drain(dirty::VISIBILITY)
            .affected()
            .deterministic()
            .run()
            .collect();
        self.retain_live(&mut changes.visibility);

        changes.clips = self.dirty.drain(dirty::CLIP).deterministic().run().collect();
        self.retain_live(&mut changes.clips);

        changes.repaints = self
            .dirty
            .drain(dirty::RENDER)
            .deterministic()
            .run()
            .collect();
        self.retain_live(&mut changes.repaints);

        let _: Vec<u32> = self
            .dirty
            .drain(dirty::TOPOLOGY)
            .deterministic()
            .run()
            .collect();

        core::mem::swap(&mut self.pending_created, &mut changes.created);
        core::mem::swap(&mut self.pending_destroyed, &mut changes.destroyed);
        core::mem::swap(&mut self.pending_attached, &mut changes.attached);
        core::mem::swap(&mut self.pending_detached, &mut changes.detached);
        self.retain_live(&mut changes.created);
        self.retain_live(&mut changes.attached);

        self.frame_index += 1;
        self.repaint_requested = false;
    }

    /// Like [`evaluate`](Self::evaluate), reporting the phase and every
    /// change to `tracer`.
    pub fn evaluate_traced(&mut self, tracer: &mut Tracer<'_>) -> FrameChanges {
        let frame_index = self.frame_index;
        tracer.phase_begin(&PhaseBeginEvent {
            frame_index,
            phase: PhaseKind::Evaluate,
        });
        let changes = self.evaluate();
        tracer.phase_end(&PhaseEndEvent {
            frame_index,
            phase: PhaseKind::Evaluate,
            visuals: changes.touched(),
        });
        tracer.frame_changes(&changes);
        changes
    }

    /// Returns the number of completed evaluations.
    #[must_use]
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    fn retain_live(&self, list: &mut Vec<u32>) {
        list.retain(|&idx| self.alive[idx as usize]);
    }

    fn sort_parents_first(&self, list: &mut [u32]) {
        list.sort_by_cached_key(|&idx| self.depth_of(idx));
    }
}
