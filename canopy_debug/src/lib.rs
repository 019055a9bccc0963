// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pretty-printing, draw recording, and JSON snapshots for canopy
//! diagnostics.
//!
//! - [`pretty::PrettyPrintSink`]: a [`TraceSink`](canopy_core::trace::TraceSink)
//!   writing one line per event.
//! - [`recording::RecordingContext`]: a
//!   [`DrawingContext`](canopy_core::render::DrawingContext) that records
//!   every call for assertions and dumps.
//! - [`snapshot`]: JSON views of a visual tree or a render plan.

pub mod pretty;
pub mod recording;
pub mod snapshot;
