// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channel constants.
//!
//! Canopy uses multi-channel dirty tracking (via [`understory_dirty`]) to
//! propagate invalidation through the visual tree. Each channel represents an
//! independent category of change.
//!
//! # Propagation semantics
//!
//! - **Propagating**: [`TRANSFORM`], [`OPACITY`] and [`VISIBILITY`] use
//!   [`EagerPolicy`](understory_dirty::EagerPolicy) and have dependency edges
//!   from child to parent. Marking a parent marks every descendant, because
//!   root-relative transforms, effective opacity and effective visibility are
//!   inherited.
//!
//! - **Local-only**: [`CLIP`] and [`RENDER`] are marked with the default
//!   policy. [`RENDER`] is what
//!   [`invalidate_visual`](crate::visual::VisualTree::invalidate_visual) marks;
//!   content, opacity-mask and z-index changes route through it as well.
//!
//! - **Structural**: [`TOPOLOGY`] is marked on the parent of an add, remove
//!   or move, and on visuals that are created or destroyed.
//!
//! # Consumption
//!
//! Callers never query dirty state directly. Each
//! [`VisualTree::evaluate`](crate::visual::VisualTree::evaluate) call drains
//! all channels and reports the results as
//! [`FrameChanges`](crate::visual::FrameChanges).

use understory_dirty::Channel;

/// Bounds or render transform changed: root-relative transforms of the
/// visual and its descendants must be recomputed.
pub const TRANSFORM: Channel = Channel::new(0);

/// Opacity changed: effective opacity of descendants must be recomputed.
pub const OPACITY: Channel = Channel::new(1);

/// Visibility flag changed: effective visibility of descendants changed.
pub const VISIBILITY: Channel = Channel::new(2);

/// Clip geometry or clip-to-bounds changed: no propagation needed.
pub const CLIP: Channel = Channel::new(3);

/// Painted output is stale: no propagation needed.
pub const RENDER: Channel = Channel::new(4);

/// Tree topology or sibling paint order changed.
pub const TOPOLOGY: Channel = Channel::new(5);
