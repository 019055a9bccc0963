// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for tree mutation and painting.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that
//! evaluation and rendering call at each stage. All method bodies default to
//! no-ops, so implementing only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing. When **on**, each
//! method performs a single `Option` branch before dispatching.
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies (one branch per call).
//! - `trace-rich` (implies `trace`): gates [`VisitEvent`] and the
//!   corresponding `TraceSink` method.

use crate::visual::FrameChanges;
#[cfg(feature = "trace-rich")]
use crate::visual::VisualId;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which phase of a frame is being measured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PhaseKind {
    /// Draining dirty channels and recomputing inherited properties.
    Evaluate,
    /// Building the flattened paint order.
    Plan,
    /// Painting onto a drawing surface.
    Render,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// A visual joined or left a rooted tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttachmentTraceEvent {
    /// Evaluation counter of the frame that reports the transition.
    pub frame_index: u64,
    /// Raw slot index of the visual.
    pub visual_index: u32,
}

/// A visual's painted output was marked stale.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InvalidateEvent {
    /// Evaluation counter of the frame that reports the invalidation.
    pub frame_index: u64,
    /// Raw slot index of the visual.
    pub visual_index: u32,
}

/// Marks the beginning of a phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhaseBeginEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Which phase is starting.
    pub phase: PhaseKind,
}

/// Marks the end of a phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhaseEndEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Which phase is ending.
    pub phase: PhaseKind,
    /// Number of visuals the phase touched.
    pub visuals: u32,
}

/// Per-evaluation counts derived from [`FrameChanges`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EvaluateSummary {
    /// Frame counter.
    pub frame_index: u64,
    /// Visuals whose root-relative transform was recomputed.
    pub transforms: u32,
    /// Visuals whose effective opacity was recomputed.
    pub opacities: u32,
    /// Visuals whose effective visibility may have changed.
    pub visibility: u32,
    /// Visuals whose clip changed.
    pub clips: u32,
    /// Visuals explicitly invalidated.
    pub repaints: u32,
    /// Visuals that joined a rooted tree.
    pub attached: u32,
    /// Visuals that left a rooted tree.
    pub detached: u32,
    /// Whether the topology changed.
    pub topology_changed: bool,
}

impl From<&FrameChanges> for EvaluateSummary {
    fn from(changes: &FrameChanges) -> Self {
        Self {
            frame_index: changes.frame_index,
            transforms: count(&changes.transforms),
            opacities: count(&changes.opacities),
            visibility: count(&changes.visibility),
            clips: count(&changes.clips),
            repaints: count(&changes.repaints),
            attached: count(&changes.attached),
            detached: count(&changes.detached),
            topology_changed: changes.topology_changed,
        }
    }
}

fn count(list: &[u32]) -> u32 {
    u32::try_from(list.len()).unwrap_or(u32::MAX)
}

/// A visual was painted (requires `trace-rich`).
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VisitEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// The painted visual.
    pub visual: VisualId,
    /// Depth below the painted root.
    pub depth: u32,
    /// Z-index among its siblings.
    pub z_index: i32,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from evaluation and rendering.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called for each visual that joined a rooted tree since the last
    /// evaluation.
    fn on_attached(&mut self, e: &AttachmentTraceEvent) {
        _ = e;
    }

    /// Called for each visual that left a rooted tree since the last
    /// evaluation.
    fn on_detached(&mut self, e: &AttachmentTraceEvent) {
        _ = e;
    }

    /// Called for each visual whose output was invalidated.
    fn on_invalidated(&mut self, e: &InvalidateEvent) {
        _ = e;
    }

    /// Called at the beginning of a phase.
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        _ = e;
    }

    /// Called at the end of a phase.
    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        _ = e;
    }

    /// Called once per evaluation with change counts.
    fn on_evaluate_summary(&mut self, s: &EvaluateSummary) {
        _ = s;
    }

    /// Called for every painted visual (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    fn on_visit(&mut self, e: &VisitEvent) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Reports every lifecycle and invalidation entry in `changes`, followed
    /// by an [`EvaluateSummary`].
    #[inline]
    pub fn frame_changes(&mut self, changes: &FrameChanges) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            let frame_index = changes.frame_index;
            for &visual_index in &changes.attached {
                s.on_attached(&AttachmentTraceEvent {
                    frame_index,
                    visual_index,
                });
            }
            for &visual_index in &changes.detached {
                s.on_detached(&AttachmentTraceEvent {
                    frame_index,
                    visual_index,
                });
            }
            for &visual_index in &changes.repaints {
                s.on_invalidated(&InvalidateEvent {
                    frame_index,
                    visual_index,
                });
            }
            s.on_evaluate_summary(&EvaluateSummary::from(changes));
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = changes;
        }
    }

    /// Emits a [`PhaseBeginEvent`].
    #[inline]
    pub fn phase_begin(&mut self, e: &PhaseBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PhaseEndEvent`].
    #[inline]
    pub fn phase_end(&mut self, e: &PhaseEndEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_end(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`VisitEvent`] (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn visit(&mut self, e: &VisitEvent) {
        if let Some(s) = &mut self.sink {
            s.on_visit(e);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
