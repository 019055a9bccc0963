// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors reported by fallible structural mutations.

use core::fmt;

use super::id::VisualId;

/// Why a structural mutation of a [`VisualTree`](super::VisualTree) was
/// rejected.
///
/// The `try_*` methods return this; their panicking counterparts panic with
/// the [`Display`](fmt::Display) text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VisualError {
    /// The handle refers to a destroyed visual.
    StaleHandle(VisualId),
    /// The visual already has a parent; remove or move it instead.
    AlreadyParented(VisualId),
    /// The visual is not a child of the given parent.
    NotAChild {
        /// The expected parent.
        parent: VisualId,
        /// The visual that was not found among its children.
        child: VisualId,
    },
    /// The mutation would make a visual its own ancestor.
    WouldCreateCycle {
        /// The prospective parent.
        parent: VisualId,
        /// The visual being inserted.
        child: VisualId,
    },
    /// Roots cannot be children of another visual.
    RootCannotBeChild(VisualId),
}

impl fmt::Display for VisualError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StaleHandle(id) => write!(f, "stale VisualId: {id:?}"),
            Self::AlreadyParented(id) => write!(f, "{id:?} already has a parent"),
            Self::NotAChild { parent, child } => {
                write!(f, "{child:?} is not a child of {parent:?}")
            }
            Self::WouldCreateCycle { parent, child } => write!(
                f,
                "adding {child:?} under {parent:?} would create a cycle"
            ),
            Self::RootCannotBeChild(id) => {
                write!(f, "{id:?} is a root and cannot have a parent")
            }
        }
    }
}

impl core::error::Error for VisualError {}
