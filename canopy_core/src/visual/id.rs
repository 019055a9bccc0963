// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Visual identity types.

use core::fmt;

/// Sentinel value indicating "no visual" in index fields.
pub const INVALID: u32 = u32::MAX;

/// A handle to a visual in a [`VisualTree`](super::VisualTree).
///
/// Contains both a slot index and a generation counter so that stale handles
/// can be detected after a visual is destroyed and the slot is reused.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct VisualId {
    /// Slot index into the tree's arrays.
    pub(crate) idx: u32,
    /// Generation counter; must match the tree's generation for this slot.
    pub(crate) generation: u32,
}

impl VisualId {
    /// Returns the raw slot index (as used in [`FrameChanges`](super::FrameChanges)).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.idx
    }

    /// Returns the generation counter.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for VisualId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VisualId({}@gen{})", self.idx, self.generation)
    }
}

/// A token returned when subscribing to attachment events.
///
/// Pass it to [`VisualTree::unsubscribe`](super::VisualTree::unsubscribe) to
/// remove the handler.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription {
    pub(crate) visual: VisualId,
    pub(crate) key: u64,
}

impl Subscription {
    /// Returns the visual the handler is registered on.
    #[inline]
    #[must_use]
    pub const fn visual(self) -> VisualId {
        self.visual
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Subscription({:?}#{})", self.visual, self.key)
    }
}
