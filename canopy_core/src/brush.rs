// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Paint value types: colors, brushes, and image references.

use alloc::vec::Vec;
use core::fmt;

use kurbo::Point;

/// A straight-alpha RGBA color with `f32` components in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red component.
    pub r: f32,
    /// Green component.
    pub g: f32,
    /// Blue component.
    pub b: f32,
    /// Alpha component.
    pub a: f32,
}

impl Color {
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::rgba(0.0, 0.0, 0.0, 0.0);
    /// Opaque black.
    pub const BLACK: Self = Self::rgba(0.0, 0.0, 0.0, 1.0);
    /// Opaque white.
    pub const WHITE: Self = Self::rgba(1.0, 1.0, 1.0, 1.0);

    /// Creates a color from its components.
    #[inline]
    #[must_use]
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Returns this color with its alpha replaced.
    #[inline]
    #[must_use]
    pub const fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }
}

/// One stop of a gradient.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GradientStop {
    /// Position along the gradient line, `0.0..=1.0`.
    pub offset: f32,
    /// Color at this position.
    pub color: Color,
}

/// Paint used to fill or stroke geometry, or as an opacity mask.
///
/// When used as an opacity mask only the alpha of the brush matters: it
/// modulates the alpha of everything the visual (and its subtree) paints.
#[derive(Clone, Debug, PartialEq)]
pub enum Brush {
    /// A single color.
    Solid(Color),
    /// A linear gradient between two points in local coordinates.
    LinearGradient {
        /// Start of the gradient line.
        start: Point,
        /// End of the gradient line.
        end: Point,
        /// Color stops, sorted by offset.
        stops: Vec<GradientStop>,
    },
}

impl Brush {
    /// Returns `true` if the brush paints nothing.
    #[must_use]
    pub fn is_transparent(&self) -> bool {
        match self {
            Self::Solid(c) => c.a == 0.0,
            Self::LinearGradient { stops, .. } => stops.iter().all(|s| s.color.a == 0.0),
        }
    }
}

impl From<Color> for Brush {
    fn from(c: Color) -> Self {
        Self::Solid(c)
    }
}

/// An opaque reference to an image owned by the drawing surface.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageId(pub u32);

impl fmt::Debug for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImageId({})", self.0)
    }
}
