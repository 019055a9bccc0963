// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A drawing surface that records instead of painting.
//!
//! [`RecordingContext`] implements [`DrawingContext`] by appending a
//! [`DrawCommand`] per call, so the exact push/draw/pop sequence a renderer
//! produced can be asserted or dumped.

use std::fmt;

use canopy_core::brush::{Brush, ImageId};
use canopy_core::geometry::Geometry;
use canopy_core::render::DrawingContext;
use kurbo::{Affine, Rect};

/// One recorded [`DrawingContext`] call.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    /// [`DrawingContext::push_transform`].
    PushTransform(Affine),
    /// [`DrawingContext::pop_transform`].
    PopTransform,
    /// [`DrawingContext::push_opacity`].
    PushOpacity(f64),
    /// [`DrawingContext::pop_opacity`].
    PopOpacity,
    /// [`DrawingContext::push_clip`].
    PushClip(Geometry),
    /// [`DrawingContext::pop_clip`].
    PopClip,
    /// [`DrawingContext::push_opacity_mask`].
    PushOpacityMask(Brush, Rect),
    /// [`DrawingContext::pop_opacity_mask`].
    PopOpacityMask,
    /// [`DrawingContext::fill`].
    Fill(Geometry, Brush),
    /// [`DrawingContext::stroke`].
    Stroke(Geometry, Brush, f64),
    /// [`DrawingContext::draw_image`].
    DrawImage(ImageId, Rect),
}

impl DrawCommand {
    /// Returns `true` for fill, stroke, and image commands.
    #[must_use]
    pub fn is_draw(&self) -> bool {
        matches!(self, Self::Fill(..) | Self::Stroke(..) | Self::DrawImage(..))
    }
}

impl fmt::Display for DrawCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PushTransform(t) => write!(f, "push_transform {:?}", t.as_coeffs()),
            Self::PopTransform => f.write_str("pop_transform"),
            Self::PushOpacity(o) => write!(f, "push_opacity {o}"),
            Self::PopOpacity => f.write_str("pop_opacity"),
            Self::PushClip(g) => write!(f, "push_clip {:?}", g.bounding_box()),
            Self::PopClip => f.write_str("pop_clip"),
            Self::PushOpacityMask(_, r) => write!(f, "push_opacity_mask {r:?}"),
            Self::PopOpacityMask => f.write_str("pop_opacity_mask"),
            Self::Fill(g, _) => write!(f, "fill {:?}", g.bounding_box()),
            Self::Stroke(g, _, w) => write!(f, "stroke {:?} width={w}", g.bounding_box()),
            Self::DrawImage(id, r) => write!(f, "draw_image {id:?} {r:?}"),
        }
    }
}

/// Which push a stack entry came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Frame {
    Transform,
    Opacity,
    Clip,
    Mask,
}

/// A [`DrawingContext`] that records every call.
#[derive(Clone, Debug, Default)]
pub struct RecordingContext {
    commands: Vec<DrawCommand>,
    stack: Vec<Frame>,
    mismatched: bool,
    max_depth: usize,
}

impl RecordingContext {
    /// Creates an empty recording.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the recorded commands in call order.
    #[must_use]
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Consumes the recording and returns its commands.
    #[must_use]
    pub fn into_commands(self) -> Vec<DrawCommand> {
        self.commands
    }

    /// Returns only the fill, stroke, and image commands.
    pub fn draws(&self) -> impl Iterator<Item = &DrawCommand> {
        self.commands.iter().filter(|c| c.is_draw())
    }

    /// Returns `true` if every pop matched the innermost push of its kind and
    /// nothing is left open.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        !self.mismatched && self.stack.is_empty()
    }

    /// Returns the deepest nesting of pushes seen.
    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Clears the recording for reuse.
    pub fn clear(&mut self) {
        self.commands.clear();
        self.stack.clear();
        self.mismatched = false;
        self.max_depth = 0;
    }

    fn push(&mut self, frame: Frame, command: DrawCommand) {
        self.stack.push(frame);
        self.max_depth = self.max_depth.max(self.stack.len());
        self.commands.push(command);
    }

    fn pop(&mut self, frame: Frame, command: DrawCommand) {
        if self.stack.pop() != Some(frame) {
            self.mismatched = true;
        }
        self.commands.push(command);
    }
}

impl DrawingContext for RecordingContext {
    fn push_transform(&mut self, transform: Affine) {
        self.push(Frame::Transform, DrawCommand::PushTransform(transform));
    }

    fn pop_transform(&mut self) {
        self.pop(Frame::Transform, DrawCommand::PopTransform);
    }

    fn push_opacity(&mut self, opacity: f64) {
        self.push(Frame::Opacity, DrawCommand::PushOpacity(opacity));
    }

    fn pop_opacity(&mut self) {
        self.pop(Frame::Opacity, DrawCommand::PopOpacity);
    }

    fn push_clip(&mut self, clip: &Geometry) {
        self.push(Frame::Clip, DrawCommand::PushClip(clip.clone()));
    }

    fn pop_clip(&mut self) {
        self.pop(Frame::Clip, DrawCommand::PopClip);
    }

    fn push_opacity_mask(&mut self, mask: &Brush, bounds: Rect) {
        self.push(
            Frame::Mask,
            DrawCommand::PushOpacityMask(mask.clone(), bounds),
        );
    }

    fn pop_opacity_mask(&mut self) {
        self.pop(Frame::Mask, DrawCommand::PopOpacityMask);
    }

    fn fill(&mut self, geometry: &Geometry, brush: &Brush) {
        self.commands
            .push(DrawCommand::Fill(geometry.clone(), brush.clone()));
    }

    fn stroke(&mut self, geometry: &Geometry, brush: &Brush, width: f64) {
        self.commands
            .push(DrawCommand::Stroke(geometry.clone(), brush.clone(), width));
    }

    fn draw_image(&mut self, image: ImageId, dest: Rect) {
        self.commands.push(DrawCommand::DrawImage(image, dest));
    }
}

#[cfg(test)]
mod tests {
    use canopy_core::brush::Color;
    use canopy_core::render::FillBounds;
    use canopy_core::visual::VisualTree;
    use canopy_render::{DamageRegion, RenderPlan, Renderer};
    use kurbo::Size;

    use super::*;

    #[test]
    fn unbalanced_pops_are_detected() {
        let mut rec = RecordingContext::new();
        rec.push_transform(Affine::IDENTITY);
        rec.push_opacity(0.5);
        rec.pop_transform();
        rec.pop_opacity();
        assert!(!rec.is_balanced());

        rec.clear();
        rec.push_clip(&Geometry::Rect(Rect::ZERO));
        assert!(!rec.is_balanced());
        rec.pop_clip();
        assert!(rec.is_balanced());
    }

    #[test]
    fn full_frame_is_balanced_and_ordered() {
        let red = Brush::Solid(Color::rgba(1.0, 0.0, 0.0, 1.0));
        let blue = Brush::Solid(Color::rgba(0.0, 0.0, 1.0, 1.0));

        let mut tree = VisualTree::new();
        let root = tree.create_root();
        let a = tree.create_visual();
        let b = tree.create_visual();
        tree.add_child(root, a);
        tree.add_child(root, b);
        tree.set_bounds(root, Rect::new(0.0, 0.0, 100.0, 100.0));
        tree.set_clip_to_bounds(root, true);
        tree.set_bounds(a, Rect::new(0.0, 0.0, 10.0, 10.0));
        tree.set_bounds(b, Rect::new(5.0, 5.0, 15.0, 15.0));
        tree.set_opacity(b, 0.5);
        tree.set_content(a, Some(Box::new(FillBounds(red.clone()))));
        tree.set_content(b, Some(Box::new(FillBounds(blue.clone()))));
        tree.set_z_index(a, 2);
        let _ = tree.evaluate();

        let mut rec = RecordingContext::new();
        let stats = Renderer::default().render(&tree, root, &mut rec);
        assert!(rec.is_balanced());
        assert_eq!(stats.painted, 2);
        assert_eq!(rec.max_depth(), 4);

        let draws: Vec<_> = rec.draws().cloned().collect();
        let local = Geometry::Rect(Size::new(10.0, 10.0).to_rect());
        assert_eq!(
            draws,
            vec![
                DrawCommand::Fill(local.clone(), blue),
                DrawCommand::Fill(local, red),
            ]
        );
    }

    #[test]
    fn damaged_frame_repaints_only_what_moved() {
        let mut tree = VisualTree::new();
        let root = tree.create_root();
        let still = tree.create_visual();
        let mover = tree.create_visual();
        for v in [still, mover] {
            tree.add_child(root, v);
            tree.set_clip_to_bounds(v, true);
            tree.set_content(v, Some(Box::new(FillBounds(Brush::Solid(Color::BLACK)))));
        }
        tree.set_bounds(still, Rect::new(0.0, 0.0, 10.0, 10.0));
        tree.set_bounds(mover, Rect::new(50.0, 0.0, 60.0, 10.0));
        let _ = tree.evaluate();
        let before = RenderPlan::build(&tree, root);

        tree.set_bounds(mover, Rect::new(70.0, 0.0, 80.0, 10.0));
        let changes = tree.evaluate();
        let after = RenderPlan::build(&tree, root);
        let damage = DamageRegion::from_changes(&changes, &before, &after);

        let mut rec = RecordingContext::new();
        let stats = Renderer::default().render_damaged(&tree, root, &mut rec, &damage);
        assert!(rec.is_balanced());
        assert_eq!(stats.painted, 1);
        assert_eq!(stats.culled, 1);
    }

    #[test]
    fn display_is_one_line_per_command() {
        let mut rec = RecordingContext::new();
        rec.push_opacity(0.25);
        rec.draw_image(ImageId(3), Rect::new(0.0, 0.0, 1.0, 1.0));
        rec.pop_opacity();
        let text: Vec<String> = rec.commands().iter().map(ToString::to_string).collect();
        assert_eq!(text[0], "push_opacity 0.25");
        assert!(text[1].starts_with("draw_image"), "got: {}", text[1]);
        assert_eq!(text[2], "pop_opacity");
    }
}
