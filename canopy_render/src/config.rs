// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Renderer configuration.

/// Configuration for the [`Renderer`](crate::Renderer).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RendererConfig {
    /// Skip visuals (and their subtrees) whose opacity is exactly zero.
    ///
    /// Their output is fully transparent either way; turning this off only
    /// makes the surface see the pushes and draws.
    pub skip_transparent: bool,
    /// When painting against a damage region, skip clipped subtrees whose
    /// root-space clip misses every damaged rectangle, and skip content
    /// whose root-space bounds miss it.
    pub cull_to_damage: bool,
}

impl RendererConfig {
    /// Production defaults: skip transparent visuals and cull to damage.
    pub const DEFAULT: Self = Self {
        skip_transparent: true,
        cull_to_damage: true,
    };

    /// Visits everything, so recording surfaces see the complete tree.
    #[must_use]
    pub const fn diagnostic() -> Self {
        Self {
            skip_transparent: false,
            cull_to_damage: false,
        }
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
