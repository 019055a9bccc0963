// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr).

use std::io::Write;

use canopy_core::trace::{
    AttachmentTraceEvent, EvaluateSummary, InvalidateEvent, PhaseBeginEvent, PhaseEndEvent,
    PhaseKind, TraceSink, VisitEvent,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink and returns its writer.
    #[must_use]
    pub fn into_writer(self) -> W {
        self.writer
    }
}

fn phase_name(phase: PhaseKind) -> &'static str {
    match phase {
        PhaseKind::Evaluate => "eval",
        PhaseKind::Plan => "plan",
        PhaseKind::Render => "render",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_attached(&mut self, e: &AttachmentTraceEvent) {
        let _ = writeln!(
            self.writer,
            "[attach] frame={} visual={}",
            e.frame_index, e.visual_index,
        );
    }

    fn on_detached(&mut self, e: &AttachmentTraceEvent) {
        let _ = writeln!(
            self.writer,
            "[detach] frame={} visual={}",
            e.frame_index, e.visual_index,
        );
    }

    fn on_invalidated(&mut self, e: &InvalidateEvent) {
        let _ = writeln!(
            self.writer,
            "[invalidate] frame={} visual={}",
            e.frame_index, e.visual_index,
        );
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:begin] frame={} {}",
            e.frame_index,
            phase_name(e.phase),
        );
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:end] frame={} {} visuals={}",
            e.frame_index,
            phase_name(e.phase),
            e.visuals,
        );
    }

    fn on_evaluate_summary(&mut self, s: &EvaluateSummary) {
        let topology = if s.topology_changed { "changed" } else { "same" };
        let _ = writeln!(
            self.writer,
            "[summary] frame={} transforms={} opacities={} visibility={} clips={} \
             repaints={} attached={} detached={} topology={topology}",
            s.frame_index,
            s.transforms,
            s.opacities,
            s.visibility,
            s.clips,
            s.repaints,
            s.attached,
            s.detached,
        );
    }

    fn on_visit(&mut self, e: &VisitEvent) {
        let _ = writeln!(
            self.writer,
            "[visit] frame={} visual={:?} depth={} z={}",
            e.frame_index, e.visual, e.depth, e.z_index,
        );
    }
}

#[cfg(test)]
mod tests {
    use canopy_core::trace::Tracer;
    use canopy_core::visual::VisualTree;
    use canopy_render::RenderPlan;

    use super::*;

    #[test]
    fn pretty_print_attach() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_attached(&AttachmentTraceEvent {
            frame_index: 4,
            visual_index: 2,
        });
        let output = String::from_utf8(sink.writer).unwrap();
        assert!(output.contains("[attach]"), "got: {output}");
        assert!(output.contains("frame=4 visual=2"), "got: {output}");
    }

    #[test]
    fn traced_evaluate_prints_phase_and_summary() {
        let mut tree = VisualTree::new();
        let root = tree.create_root();
        tree.invalidate_visual(root);

        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        let _ = tree.evaluate_traced(&mut Tracer::new(&mut sink));
        let output = String::from_utf8(sink.into_writer()).unwrap();

        let lines: Vec<_> = output.lines().collect();
        assert!(lines[0].starts_with("[phase:begin] frame=0 eval"), "got: {output}");
        assert!(lines[1].starts_with("[phase:end] frame=0 eval"), "got: {output}");
        assert!(output.contains("[attach] frame=0 visual=0"), "got: {output}");
        assert!(output.contains("[invalidate] frame=0 visual=0"), "got: {output}");
        assert!(output.contains("topology=changed"), "got: {output}");
    }

    #[test]
    fn traced_plan_rebuild_prints_plan_phase() {
        let mut tree = VisualTree::new();
        let root = tree.create_root();
        let child = tree.create_visual();
        tree.add_child(root, child);

        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        let mut plan = RenderPlan::new();
        plan.rebuild_traced(&tree, root, &mut Tracer::new(&mut sink));
        let output = String::from_utf8(sink.into_writer()).unwrap();

        let lines: Vec<_> = output.lines().collect();
        assert_eq!(
            lines,
            vec![
                "[phase:begin] frame=0 plan",
                "[phase:end] frame=0 plan visuals=2",
            ]
        );
    }
}
