//! Container tracking state
//!
//! A container node owns two ordered views over its flattened non-container
//! descendants (one per update priority, one per draw priority) plus the FIFO
//! queues that stage membership changes between drains. The drain and
//! traversal protocol itself lives on [`Scene`](super::Scene); this module
//! owns the bookkeeping.

use std::collections::{BTreeMap, HashMap, VecDeque};

use super::node::NodeKey;

/// Position of a tracked node within one ordered view
///
/// Lexicographic: priority first, then registration sequence, so nodes
/// sharing a priority keep registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct ViewKey {
    pub(crate) priority: i32,
    pub(crate) seq: u64,
}

/// A member's positions in both views
#[derive(Debug, Clone, Copy)]
struct Membership {
    update: ViewKey,
    draw: ViewKey,
}

/// Tracking state carried by every container node
#[derive(Default)]
pub(crate) struct ContainerState {
    update_view: BTreeMap<ViewKey, NodeKey>,
    draw_view: BTreeMap<ViewKey, NodeKey>,
    members: HashMap<NodeKey, Membership>,
    /// Registration requests staged for the next drain, FIFO.
    pub(crate) pending_insert: VecDeque<NodeKey>,
    /// Removal requests staged for the next drain, FIFO.
    pub(crate) pending_remove: VecDeque<NodeKey>,
    next_seq: u64,
}

impl ContainerState {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Insert a node into both views under a fresh registration sequence
    ///
    /// The same sequence number keys both views, so registration order is the
    /// tie-break for equal priorities everywhere.
    pub(crate) fn admit(&mut self, key: NodeKey, update_priority: i32, draw_priority: i32) {
        debug_assert!(!self.members.contains_key(&key));
        let seq = self.next_seq;
        self.next_seq += 1;

        let membership = Membership {
            update: ViewKey {
                priority: update_priority,
                seq,
            },
            draw: ViewKey {
                priority: draw_priority,
                seq,
            },
        };
        self.update_view.insert(membership.update, key);
        self.draw_view.insert(membership.draw, key);
        self.members.insert(key, membership);
    }

    /// Drop a node from the tracked set, if it is in it
    ///
    /// Valid for keys whose arena slot is already gone; membership is keyed
    /// by value.
    pub(crate) fn drop_member(&mut self, key: NodeKey) {
        if let Some(membership) = self.members.remove(&key) {
            self.update_view.remove(&membership.update);
            self.draw_view.remove(&membership.draw);
        }
    }

    pub(crate) fn is_member(&self, key: NodeKey) -> bool {
        self.members.contains_key(&key)
    }

    pub(crate) fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Move a member to a new update priority, keeping its registration
    /// sequence
    pub(crate) fn reposition_update(&mut self, key: NodeKey, priority: i32) {
        if let Some(membership) = self.members.get_mut(&key) {
            self.update_view.remove(&membership.update);
            membership.update.priority = priority;
            self.update_view.insert(membership.update, key);
        }
    }

    /// Move a member to a new draw priority, keeping its registration
    /// sequence
    pub(crate) fn reposition_draw(&mut self, key: NodeKey, priority: i32) {
        if let Some(membership) = self.members.get_mut(&key) {
            self.draw_view.remove(&membership.draw);
            membership.draw.priority = priority;
            self.draw_view.insert(membership.draw, key);
        }
    }

    /// Snapshot of the update-order view, front to back
    ///
    /// Traversal iterates the snapshot so in-flight hooks can mutate the
    /// views without being observed mid-pass.
    pub(crate) fn update_order(&self) -> Vec<NodeKey> {
        self.update_view.values().copied().collect()
    }

    /// Snapshot of the draw-order view, front to back
    pub(crate) fn draw_order(&self) -> Vec<NodeKey> {
        self.draw_view.values().copied().collect()
    }
}
