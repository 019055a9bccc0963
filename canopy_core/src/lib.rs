// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Visual tree, invalidation, and transform model for retained-mode UI.
//!
//! `canopy_core` provides the data structures behind an on-screen scene graph:
//! a tree of *visuals*, each carrying bounds, clipping, opacity, a render
//! transform, and a z-index. It is `no_std` compatible (with `alloc`) and uses
//! array-based struct-of-arrays storage with generational index handles.
//!
//! # Architecture
//!
//! ```text
//!   caller mutations ──► VisualTree (local properties, topology)
//!         │                   │
//!         │                   ├──► attach / detach handlers (synchronous)
//!         │                   └──► repaint request hook (once per frame)
//!         ▼
//!   VisualTree::evaluate() ──► FrameChanges ──► renderer / damage tracking
//! ```
//!
//! **[`visual`]**: Struct-of-arrays visual tree with generational handles.
//! Property setters validate their input and mark the matching dirty channel.
//! Tree queries (attachment, effective visibility, distance from root) walk
//! parent links; [`transform_to_visual`](visual::VisualTree::transform_to_visual)
//! composes local transforms through the nearest common ancestor.
//!
//! **[`dirty`]**: Multi-channel dirty tracking via `understory_dirty`.
//! TRANSFORM, OPACITY and VISIBILITY propagate to descendants; CLIP and
//! RENDER are local-only; TOPOLOGY records structural changes.
//!
//! **[`geometry`]** / **[`brush`]**: Immutable value types handed from a
//! visual to the drawing surface.
//!
//! **[`render`]**: The [`DrawingContext`](render::DrawingContext) surface
//! contract and the [`Render`](render::Render) trait that visual content
//! implements.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! tree and frame instrumentation, with a zero-overhead
//! [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).
//! - `trace-rich` (disabled by default, implies `trace`): Gates per-visual
//!   visit events emitted while painting.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod brush;
pub mod dirty;
pub mod geometry;
pub mod render;
pub mod trace;
pub mod visual;
