// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Paint-order rendering, damage tracking, and hit testing for canopy.
//!
//! This crate sits between [`canopy_core`]'s visual tree and a concrete
//! drawing surface. It provides:
//!
//! - [`Renderer`]: walks a rooted tree in z-order and drives a
//!   [`DrawingContext`](canopy_core::render::DrawingContext)
//! - [`RenderPlan`] / [`RenderItem`]: the flattened paint order with
//!   surface-space geometry for one frame
//! - [`DamageRegion`]: the surface area that changed between two plans
//! - [`hit_test`] / [`hit_test_all`]: point queries in reverse paint order
//!
//! A typical frame:
//!
//! ```text
//! let changes = tree.evaluate();
//! let plan = RenderPlan::build(&tree, root);
//! let damage = DamageRegion::from_changes(&changes, &previous_plan, &plan);
//! renderer.render_damaged(&tree, root, &mut surface, &damage);
//! ```
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` / `trace-rich` (disabled by default): Forwarded to
//!   `canopy_core`; `trace-rich` reports every painted visual.

#![no_std]
#![cfg_attr(docsrs, feature(doc_cfg))]

extern crate alloc;

mod config;
mod damage;
mod plan;
mod renderer;

pub use config::RendererConfig;
pub use damage::DamageRegion;
pub use hit_test::{hit_test, hit_test_all};
pub use plan::{RenderItem, RenderPlan};
pub use renderer::{RenderStats, Renderer};
