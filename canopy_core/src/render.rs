// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drawing-surface contract.
//!
//! A renderer walks the visual tree and, for every visual it paints, pushes
//! that visual's transform, opacity, clips and opacity mask onto a
//! [`DrawingContext`] before calling the visual's [`Render`] content. The
//! pushes are strictly nested: every `push_*` is matched by the corresponding
//! `pop_*` in reverse order.
//!
//! Concrete surfaces (GPU, software, recording) live outside this crate.

use kurbo::{Affine, Rect, Size};

use crate::brush::{Brush, ImageId};
use crate::geometry::Geometry;

/// An abstract 2-D paint surface.
pub trait DrawingContext {
    /// Pre-multiplies the current transform by `transform`.
    fn push_transform(&mut self, transform: Affine);

    /// Restores the transform active before the matching push.
    fn pop_transform(&mut self);

    /// Starts a group whose output is composited with `opacity`.
    fn push_opacity(&mut self, opacity: f64);

    /// Ends the innermost opacity group.
    fn pop_opacity(&mut self);

    /// Intersects the current clip with `clip` (in current coordinates).
    fn push_clip(&mut self, clip: &Geometry);

    /// Restores the clip active before the matching push.
    fn pop_clip(&mut self);

    /// Starts a layer that is composited through the alpha of `mask`, laid
    /// out over `bounds`, when the matching pop is reached.
    ///
    /// The mask applies to the layer's whole output, not per primitive.
    fn push_opacity_mask(&mut self, mask: &Brush, bounds: Rect);

    /// Composites and ends the innermost opacity-mask layer.
    fn pop_opacity_mask(&mut self);

    /// Fills `geometry` with `brush`.
    fn fill(&mut self, geometry: &Geometry, brush: &Brush);

    /// Strokes the outline of `geometry` with `brush`.
    fn stroke(&mut self, geometry: &Geometry, brush: &Brush, width: f64);

    /// Draws `image` scaled into `dest`.
    fn draw_image(&mut self, image: ImageId, dest: Rect);
}

/// Paintable content attached to a visual.
///
/// Implementations draw in the visual's local coordinate space, where the
/// visual occupies `(0, 0)..size`. By the time `render` is called the
/// renderer has already applied the visual's transform, clip, opacity and
/// opacity mask. Content only gets shared access and cannot change the tree.
pub trait Render {
    /// Paints this content onto `ctx`.
    fn render(&self, size: Size, ctx: &mut dyn DrawingContext);
}

impl<F> Render for F
where
    F: Fn(Size, &mut dyn DrawingContext),
{
    fn render(&self, size: Size, ctx: &mut dyn DrawingContext) {
        self(size, ctx);
    }
}

/// Content that fills the visual's bounds with a single brush.
#[derive(Clone, Debug, PartialEq)]
pub struct FillBounds(pub Brush);

impl Render for FillBounds {
    fn render(&self, size: Size, ctx: &mut dyn DrawingContext) {
        ctx.fill(&Geometry::Rect(size.to_rect()), &self.0);
    }
}
