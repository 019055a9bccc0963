// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hierarchical compositing onto a [`DrawingContext`].
//!
//! For every painted visual the renderer emits, in order:
//!
//! ```text
//! push_transform(local)
//! push_opacity(opacity)          if opacity < 1
//! push_clip(bounds rect)         if clip_to_bounds
//! push_clip(clip geometry)       if a clip is set
//! push_opacity_mask(mask, rect)  if a mask is set
//!     content.render(size)
//!     children, ascending z-index (ties in child order)
//! pop_* in reverse
//! ```

use canopy_core::geometry::Geometry;
use canopy_core::render::DrawingContext;
use canopy_core::trace::{PhaseBeginEvent, PhaseEndEvent, PhaseKind, Tracer};
use canopy_core::visual::{VisualId, VisualTree};
use kurbo::{Affine, Rect};

use crate::config::RendererConfig;
use crate::damage::DamageRegion;
use crate::plan::{is_paintable_root, surface_clip};

/// Counts gathered while painting one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Visuals whose transform was pushed.
    pub visited: u32,
    /// Visuals whose content was rendered.
    pub painted: u32,
    /// Visuals skipped as transparent or outside the damage region, each
    /// counted once for its whole subtree.
    pub culled: u32,
}

/// Paints visual trees onto drawing surfaces.
#[derive(Clone, Copy, Debug, Default)]
pub struct Renderer {
    config: RendererConfig,
}

impl Renderer {
    /// Creates a renderer with the given configuration.
    #[must_use]
    pub const fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    /// Returns the renderer's configuration.
    #[must_use]
    pub const fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Paints `root` and its subtree onto `ctx`.
    ///
    /// Nothing is painted if `root` is not attached to a visual tree. Hidden
    /// visuals are skipped together with their subtrees.
    ///
    /// # Panics
    ///
    /// Panics if `root` is stale.
    pub fn render(
        &self,
        tree: &VisualTree,
        root: VisualId,
        ctx: &mut dyn DrawingContext,
    ) -> RenderStats {
        self.render_traced(tree, root, ctx, None, &mut Tracer::none())
    }

    /// Paints only what overlaps `damage`, when culling is enabled in the
    /// configuration.
    ///
    /// The surface is expected to clip to the damage itself; culling only
    /// removes work that could not touch it.
    pub fn render_damaged(
        &self,
        tree: &VisualTree,
        root: VisualId,
        ctx: &mut dyn DrawingContext,
        damage: &DamageRegion,
    ) -> RenderStats {
        self.render_traced(tree, root, ctx, Some(damage), &mut Tracer::none())
    }

    /// Paints like [`render_damaged`](Self::render_damaged) (or
    /// [`render`](Self::render) when `damage` is `None`), reporting the
    /// phase to `tracer`.
    pub fn render_traced(
        &self,
        tree: &VisualTree,
        root: VisualId,
        ctx: &mut dyn DrawingContext,
        damage: Option<&DamageRegion>,
        tracer: &mut Tracer<'_>,
    ) -> RenderStats {
        let frame_index = tree.frame_index();
        tracer.phase_begin(&PhaseBeginEvent {
            frame_index,
            phase: PhaseKind::Render,
        });

        let damage = damage.filter(|_| self.config.cull_to_damage);
        let mut pass = Pass {
            tree,
            ctx,
            damage,
            tracer: &mut *tracer,
            config: self.config,
            frame_index,
            stats: RenderStats::default(),
        };
        if damage.is_none_or(|d| !d.is_empty()) && is_paintable_root(tree, root) {
            pass.paint(root, 0, Affine::IDENTITY, None);
        }
        let stats = pass.stats;

        tracer.phase_end(&PhaseEndEvent {
            frame_index,
            phase: PhaseKind::Render,
            visuals: stats.painted,
        });
        stats
    }
}

struct Pass<'a, 't> {
    tree: &'a VisualTree,
    ctx: &'a mut dyn DrawingContext,
    damage: Option<&'a DamageRegion>,
    tracer: &'a mut Tracer<'t>,
    config: RendererConfig,
    frame_index: u64,
    stats: RenderStats,
}

impl Pass<'_, '_> {
    fn paint(&mut self, id: VisualId, depth: u32, parent_transform: Affine, parent_clip: Option<Rect>) {
        let tree = self.tree;
        if !tree.is_visible(id) {
            return;
        }
        let opacity = tree.opacity(id);
        if self.config.skip_transparent && opacity <= 0.0 {
            self.stats.culled += 1;
            return;
        }

        let local = tree.local_transform(id);
        let transform = parent_transform * local;
        let clip = surface_clip(tree, id, transform, parent_clip);
        if let (Some(damage), Some(c)) = (self.damage, clip) {
            if !damage.intersects(c) {
                self.stats.culled += 1;
                return;
            }
        }

        let size = tree.bounds(id).size();
        let local_rect = size.to_rect();
        let pushed_opacity = opacity < 1.0;
        let clip_to_bounds = tree.clip_to_bounds(id);
        let geometry = tree.clip(id);
        let mask = tree.opacity_mask(id);

        self.stats.visited += 1;
        self.ctx.push_transform(local);
        if pushed_opacity {
            self.ctx.push_opacity(opacity);
        }
        if clip_to_bounds {
            self.ctx.push_clip(&Geometry::Rect(local_rect));
        }
        if let Some(geometry) = geometry {
            self.ctx.push_clip(geometry);
        }
        if let Some(mask) = mask {
            self.ctx.push_opacity_mask(mask, local_rect);
        }

        if let Some(content) = tree.content(id) {
            let surface_bounds = transform.transform_rect_bbox(local_rect);
            let visible = clip.map_or(surface_bounds, |c| surface_bounds.intersect(c));
            if self.damage.is_none_or(|d| d.intersects(visible)) {
                content.render(size, &mut *self.ctx);
                self.stats.painted += 1;
                #[cfg(feature = "trace-rich")]
                self.tracer.visit(&canopy_core::trace::VisitEvent {
                    frame_index: self.frame_index,
                    visual: id,
                    depth,
                    z_index: tree.z_index(id),
                });
            }
        }

        for child in tree.children_in_z_order(id) {
            self.paint(child, depth + 1, transform, clip);
        }

        if mask.is_some() {
            self.ctx.pop_opacity_mask();
        }
        if geometry.is_some() {
            self.ctx.pop_clip();
        }
        if clip_to_bounds {
            self.ctx.pop_clip();
        }
        if pushed_opacity {
            self.ctx.pop_opacity();
        }
        self.ctx.pop_transform();

        #[cfg(not(feature = "trace-rich"))]
        {
            _ = (self.frame_index, &self.tracer);
        }
    }
}
