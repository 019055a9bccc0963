// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Visual tree: storage, topology, attachment events, and evaluation.

mod error;
mod evaluate;
mod events;
mod id;
mod store;
mod transform;
mod walk;

pub use error::VisualError;
pub use evaluate::FrameChanges;
pub use events::AttachmentEvent;
pub use id::{INVALID, Subscription, VisualId};
pub use store::VisualTree;
pub use walk::{Ancestors, Children, Descendants};
