// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Attach and detach notifications.
//!
//! Handlers run synchronously inside the structural mutation that caused the
//! transition, once per visual, in pre-order over the moved subtree. Attach
//! handlers run after the subtree is linked and every attached-root cache in
//! it is updated. Detach handlers run while the links and caches are still
//! intact; the links are severed afterwards.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use super::id::{INVALID, Subscription, VisualId};
use super::store::VisualTree;

/// Delivered to attach and detach handlers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttachmentEvent {
    /// The visual that joined or left a rooted tree.
    pub visual: VisualId,
    /// The root of that tree.
    pub root: VisualId,
}

type Handler = Box<dyn FnMut(&AttachmentEvent)>;

/// Per-visual handler list, keyed by subscription.
#[derive(Default)]
pub(crate) struct HandlerList {
    entries: Vec<(u64, Handler)>,
}

impl fmt::Debug for HandlerList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerList")
            .field("len", &self.entries.len())
            .finish()
    }
}

impl HandlerList {
    fn push(&mut self, key: u64, handler: Handler) {
        self.entries.push((key, handler));
    }

    fn remove(&mut self, key: u64) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(k, _)| *k != key);
        self.entries.len() != before
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    fn dispatch(&mut self, e: &AttachmentEvent) {
        for (_, handler) in &mut self.entries {
            handler(e);
        }
    }
}

impl VisualTree {
    /// Registers a handler that runs each time `id` joins a rooted tree.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn subscribe_attached(
        &mut self,
        id: VisualId,
        handler: impl FnMut(&AttachmentEvent) + 'static,
    ) -> Subscription {
        self.validate(id);
        let key = self.next_key();
        self.on_attached[id.idx as usize].push(key, Box::new(handler));
        Subscription { visual: id, key }
    }

    /// Registers a handler that runs each time `id` leaves a rooted tree.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn subscribe_detached(
        &mut self,
        id: VisualId,
        handler: impl FnMut(&AttachmentEvent) + 'static,
    ) -> Subscription {
        self.validate(id);
        let key = self.next_key();
        self.on_detached[id.idx as usize].push(key, Box::new(handler));
        Subscription { visual: id, key }
    }

    /// Removes a handler registered with
    /// [`subscribe_attached`](Self::subscribe_attached) or
    /// [`subscribe_detached`](Self::subscribe_detached).
    ///
    /// Returns `false` if the handler was already removed or its visual has
    /// been destroyed.
    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        let Subscription { visual, key } = subscription;
        if !self.is_alive(visual) {
            return false;
        }
        let i = visual.idx as usize;
        self.on_attached[i].remove(key) || self.on_detached[i].remove(key)
    }

    /// Returns `true` if `id` is reachable from a root.
    #[must_use]
    pub fn is_attached_to_visual_tree(&self, id: VisualId) -> bool {
        self.validate(id);
        self.attached_root[id.idx as usize] != INVALID
    }

    /// Returns the root of the tree `id` is attached to.
    #[must_use]
    pub fn visual_root(&self, id: VisualId) -> Option<VisualId> {
        self.validate(id);
        let root = self.attached_root[id.idx as usize];
        (root != INVALID).then(|| self.id_unchecked(root))
    }

    fn next_key(&mut self) -> u64 {
        let key = self.next_subscription;
        self.next_subscription += 1;
        key
    }

    /// Caches `root` for every visual under `top` (inclusive), then runs
    /// attach handlers in pre-order.
    pub(crate) fn attach_subtree(&mut self, top: u32, root: u32) {
        let mut order = Vec::new();
        self.collect_subtree(top, &mut order);
        for &idx in &order {
            self.attached_root[idx as usize] = root;
        }
        self.request_repaint_for(top);

        let root = self.id_unchecked(root);
        for &idx in &order {
            self.pending_attached.push(idx);
            let e = AttachmentEvent {
                visual: self.id_unchecked(idx),
                root,
            };
            self.on_attached[idx as usize].dispatch(&e);
        }
    }

    /// Runs detach handlers for every visual under `top` (inclusive) in
    /// pre-order, then clears their cached root.
    pub(crate) fn detach_subtree(&mut self, top: u32, root: u32) {
        // The vacated region needs repainting; request while still attached.
        self.request_repaint_for(top);

        let mut order = Vec::new();
        self.collect_subtree(top, &mut order);

        let root = self.id_unchecked(root);
        for &idx in &order {
            self.pending_detached.push(idx);
            let e = AttachmentEvent {
                visual: self.id_unchecked(idx),
                root,
            };
            self.on_detached[idx as usize].dispatch(&e);
        }
        for &idx in &order {
            self.attached_root[idx as usize] = INVALID;
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use alloc::vec;
    use core::cell::RefCell;

    use super::*;

    type Log = Rc<RefCell<Vec<(&'static str, VisualId)>>>;

    fn watch(tree: &mut VisualTree, log: &Log, id: VisualId) {
        let l = Rc::clone(log);
        tree.subscribe_attached(id, move |e| l.borrow_mut().push(("attach", e.visual)));
        let l = Rc::clone(log);
        tree.subscribe_detached(id, move |e| l.borrow_mut().push(("detach", e.visual)));
    }

    #[test]
    fn attaching_subtree_fires_in_pre_order() {
        let log: Log = Rc::default();
        let mut tree = VisualTree::new();
        let root = tree.create_root();
        let a = tree.create_visual();
        let b = tree.create_visual();
        let c = tree.create_visual();
        tree.add_child(a, b);
        tree.add_child(a, c);
        for id in [a, b, c] {
            watch(&mut tree, &log, id);
        }

        tree.add_child(root, a);
        assert_eq!(
            *log.borrow(),
            vec![("attach", a), ("attach", b), ("attach", c)]
        );
        assert!(tree.is_attached_to_visual_tree(c));
        assert_eq!(tree.visual_root(c), Some(root));
    }

    #[test]
    fn removing_subtree_fires_detach_once_each() {
        let log: Log = Rc::default();
        let mut tree = VisualTree::new();
        let root = tree.create_root();
        let a = tree.create_visual();
        let b = tree.create_visual();
        tree.add_child(root, a);
        tree.add_child(a, b);
        watch(&mut tree, &log, a);
        watch(&mut tree, &log, b);

        tree.remove_child(root, a);
        assert_eq!(*log.borrow(), vec![("detach", a), ("detach", b)]);
        assert!(!tree.is_attached_to_visual_tree(a));
        assert_eq!(tree.visual_root(b), None);
    }

    #[test]
    fn detached_changes_fire_nothing() {
        let log: Log = Rc::default();
        let mut tree = VisualTree::new();
        let a = tree.create_visual();
        let b = tree.create_visual();
        watch(&mut tree, &log, b);

        tree.add_child(a, b);
        tree.remove_child(a, b);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn move_within_tree_fires_nothing() {
        let log: Log = Rc::default();
        let mut tree = VisualTree::new();
        let root = tree.create_root();
        let p1 = tree.create_visual();
        let p2 = tree.create_visual();
        let child = tree.create_visual();
        tree.add_child(root, p1);
        tree.add_child(root, p2);
        tree.add_child(p1, child);
        watch(&mut tree, &log, child);

        tree.move_child(child, p2);
        assert!(log.borrow().is_empty());
        assert_eq!(tree.parent(child), Some(p2));
    }

    #[test]
    fn move_between_trees_fires_detach_then_attach() {
        let log: Log = Rc::default();
        let mut tree = VisualTree::new();
        let r1 = tree.create_root();
        let r2 = tree.create_root();
        let child = tree.create_visual();
        tree.add_child(r1, child);

        let roots = Rc::new(RefCell::new(Vec::new()));
        let seen = Rc::clone(&roots);
        tree.subscribe_attached(child, move |e| seen.borrow_mut().push(e.root));
        watch(&mut tree, &log, child);

        tree.move_child(child, r2);
        assert_eq!(*log.borrow(), vec![("detach", child), ("attach", child)]);
        assert_eq!(*roots.borrow(), vec![r2]);
        assert_eq!(tree.visual_root(child), Some(r2));
    }

    #[test]
    fn root_designation_attaches_and_detaches() {
        let log: Log = Rc::default();
        let mut tree = VisualTree::new();
        let top = tree.create_visual();
        let leaf = tree.create_visual();
        tree.add_child(top, leaf);
        watch(&mut tree, &log, top);
        watch(&mut tree, &log, leaf);

        tree.set_root(top, true);
        tree.set_root(top, true);
        tree.set_root(top, false);
        assert_eq!(
            *log.borrow(),
            vec![
                ("attach", top),
                ("attach", leaf),
                ("detach", top),
                ("detach", leaf),
            ]
        );
    }

    #[test]
    fn destroying_attached_subtree_fires_detach() {
        let log: Log = Rc::default();
        let mut tree = VisualTree::new();
        let root = tree.create_root();
        let a = tree.create_visual();
        let b = tree.create_visual();
        tree.add_child(root, a);
        tree.add_child(a, b);
        watch(&mut tree, &log, a);
        watch(&mut tree, &log, b);

        tree.destroy_subtree(a);
        assert_eq!(*log.borrow(), vec![("detach", a), ("detach", b)]);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let log: Log = Rc::default();
        let mut tree = VisualTree::new();
        let root = tree.create_root();
        let child = tree.create_visual();
        let l = Rc::clone(&log);
        let sub = tree.subscribe_attached(child, move |e| l.borrow_mut().push(("attach", e.visual)));

        assert!(tree.unsubscribe(sub));
        assert!(!tree.unsubscribe(sub));
        tree.add_child(root, child);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn transitions_are_reported_in_frame_changes() {
        let mut tree = VisualTree::new();
        let root = tree.create_root();
        let child = tree.create_visual();
        let _ = tree.evaluate();

        tree.add_child(root, child);
        let changes = tree.evaluate();
        assert_eq!(changes.attached, vec![child.index()]);

        tree.remove_child(root, child);
        let changes = tree.evaluate();
        assert_eq!(changes.detached, vec![child.index()]);
    }
}
