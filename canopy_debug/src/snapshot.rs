// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! JSON snapshots of visual trees and render plans.
//!
//! [`tree_snapshot`] captures a subtree's local properties in child order;
//! [`plan_snapshot`] captures a [`RenderPlan`] in paint order. Both produce
//! plain [`serde_json::Value`]s meant for diffing and inspection, not for
//! loading back.

use std::io::{self, Write};

use canopy_core::visual::{VisualId, VisualTree};
use canopy_render::RenderPlan;
use kurbo::{Affine, Rect};
use serde_json::{Value, json};

/// Captures `id` and its descendants.
///
/// # Panics
///
/// Panics if `id` is stale.
#[must_use]
pub fn tree_snapshot(tree: &VisualTree, id: VisualId) -> Value {
    let children: Vec<Value> = tree
        .children(id)
        .map(|child| tree_snapshot(tree, child))
        .collect();
    json!({
        "index": id.index(),
        "generation": id.generation(),
        "root": tree.is_root(id),
        "attached": tree.is_attached_to_visual_tree(id),
        "bounds": rect(tree.bounds(id)),
        "visible": tree.is_visible(id),
        "opacity": tree.opacity(id),
        "z_index": tree.z_index(id),
        "clip_to_bounds": tree.clip_to_bounds(id),
        "clip": tree.clip(id).map(|c| rect(c.bounding_box())),
        "opacity_mask": tree.opacity_mask(id).is_some(),
        "render_transform": tree.render_transform(id).map(affine),
        "content": tree.content(id).is_some(),
        "children": children,
    })
}

/// Captures the items of `plan` in paint order.
#[must_use]
pub fn plan_snapshot(plan: &RenderPlan) -> Value {
    let items: Vec<Value> = plan
        .items()
        .iter()
        .map(|item| {
            json!({
                "index": item.visual.index(),
                "depth": item.depth,
                "z_index": item.z_index,
                "transform": affine(item.transform),
                "opacity": item.effective_opacity,
                "bounds": rect(item.bounds),
                "clip": item.clip.map(rect),
                "subtree_bounds": item.subtree_bounds.map(rect),
                "content": item.has_content,
            })
        })
        .collect();
    json!({
        "root": plan.root().map(VisualId::index),
        "items": items,
    })
}

/// Writes [`tree_snapshot`] as pretty-printed JSON.
pub fn write_snapshot(tree: &VisualTree, id: VisualId, writer: &mut dyn Write) -> io::Result<()> {
    serde_json::to_writer_pretty(writer, &tree_snapshot(tree, id))?;
    Ok(())
}

fn rect(r: Rect) -> Value {
    json!([r.x0, r.y0, r.x1, r.y1])
}

fn affine(t: Affine) -> Value {
    json!(t.as_coeffs())
}
