//! The scene: node arena, structural operations, and frame traversal
//!
//! A [`Scene`] owns every node in a slotmap arena and exposes the whole
//! lifecycle: spawn detached, attach into the tree, detach for re-parenting,
//! despawn for deferred destruction. Traversal ([`Scene::update`] and
//! [`Scene::draw`]) runs the container protocol: drain staged mutations,
//! then iterate a snapshot of the priority-ordered views, so hooks may
//! restructure the tree freely while it is being walked.

use std::collections::VecDeque;
use std::mem;

use slotmap::SlotMap;

use crate::foundation::math::Mat4;

use super::behavior::Context;
use super::container::ContainerState;
use super::node::{Capabilities, Node, NodeKey, NodeKind, NodeSpec};

/// A scene graph with deferred, frame-safe structural mutation
///
/// The scene always holds one root container; [`Scene::update`] and
/// [`Scene::draw`] drive traversal from it once per frame, in that order.
/// Node memory is freed only when a container drains its removal queue
/// (or, for despawned detached subtrees, at the start of the next update),
/// which is what makes "despawn myself from my own hook" safe.
pub struct Scene {
    nodes: SlotMap<NodeKey, Node>,
    root: NodeKey,
    /// Despawned subtrees with no tracking container; freed at the next
    /// update, like any other removal queue.
    limbo: VecDeque<NodeKey>,
}

impl Scene {
    /// Create a scene containing only the root container
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(Node::from_spec(NodeSpec::container("root")));
        log::debug!("scene created, root container is node {}", nodes[root].id);
        Self {
            nodes,
            root,
            limbo: VecDeque::new(),
        }
    }

    /// The root container every frame is driven from
    pub fn root(&self) -> NodeKey {
        self.root
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Create a detached node from a spec and return its key
    ///
    /// The node joins the tree (and some container's tracked set) only once
    /// [`Scene::attach`] links it under a parent.
    pub fn spawn(&mut self, spec: NodeSpec) -> NodeKey {
        let node = Node::from_spec(spec);
        log::trace!("spawned node {} ({})", node.id, node.name);
        self.nodes.insert(node)
    }

    /// Link a detached node under a parent
    ///
    /// Registers the node and its live subtree with the nearest container
    /// ancestor, if one exists: each covered node lands in that container's
    /// insertion queue and becomes visible to traversal after the next
    /// drain. Registration stops descending at nested containers, which
    /// keep tracking their own subtrees. The node's `on_attached` hook runs
    /// synchronously before this returns.
    ///
    /// # Panics
    /// If either key is stale, either node is not alive, `node` already has
    /// a parent, or `parent` lies inside `node`'s own subtree.
    pub fn attach(&mut self, node: NodeKey, parent: NodeKey) {
        assert!(
            self.nodes.contains_key(node),
            "attach: stale node key {:?}",
            node
        );
        assert!(
            self.nodes.contains_key(parent),
            "attach: stale parent key {:?}",
            parent
        );
        {
            let n = &self.nodes[node];
            assert!(n.alive, "attach: node {} ({}) is not alive", n.id, n.name);
            assert!(
                n.parent.is_none(),
                "attach: node {} ({}) already has a parent",
                n.id,
                n.name
            );
            let p = &self.nodes[parent];
            assert!(p.alive, "attach: parent {} ({}) is not alive", p.id, p.name);
        }
        assert!(
            !self.is_within_subtree(parent, node),
            "attach: parent {:?} lies inside the subtree of node {:?}",
            parent,
            node
        );

        self.nodes[parent].children.push(node);
        self.nodes[node].parent = Some(parent);

        if let Some(tracker) = self.nearest_container(parent) {
            self.register_subtree(node, tracker);
        }

        {
            let n = &self.nodes[node];
            let p = &self.nodes[parent];
            log::trace!(
                "attached node {} ({}) under node {} ({})",
                n.id,
                n.name,
                p.id,
                p.name
            );
        }
        self.invoke_attached_hook(node);
    }

    /// Unlink a node from its parent without destroying it
    ///
    /// The node and its subtree leave the tracking container's views at that
    /// container's next drain; until then an in-progress pass still sees the
    /// old snapshot. The node stays alive and may be re-attached at any
    /// time, including in the same frame (removals drain before insertions,
    /// so a same-frame move lands in the tracked set exactly once).
    ///
    /// # Panics
    /// If the key is stale, the node is not alive, or it has no parent.
    pub fn detach(&mut self, node: NodeKey) {
        assert!(
            self.nodes.contains_key(node),
            "detach: stale node key {:?}",
            node
        );
        {
            let n = &self.nodes[node];
            assert!(n.alive, "detach: node {} ({}) is not alive", n.id, n.name);
            assert!(
                n.parent.is_some(),
                "detach: node {} ({}) has no parent",
                n.id,
                n.name
            );
            log::trace!("detached node {} ({})", n.id, n.name);
        }

        self.unlink_from_parent(node);
        if let Some(tracker) = self.nodes[node].tracker {
            self.unregister_subtree(node, tracker);
        }
    }

    /// Mark a node and its entire subtree for destruction
    ///
    /// The subtree is immediately marked not-alive and unlinked from its
    /// parent, so queries no longer see it; memory is freed only when the
    /// tracking container drains its removal queue (or at the next update
    /// for subtrees no container tracks). Cached reads through stale-but-
    /// not-yet-freed keys stay valid until then, which is why a node may
    /// despawn itself from inside its own hook.
    ///
    /// # Panics
    /// If the key is stale, the node is already despawned, or the node is
    /// the root container.
    pub fn despawn(&mut self, node: NodeKey) {
        assert!(
            self.nodes.contains_key(node),
            "despawn: stale node key {:?}",
            node
        );
        assert!(
            node != self.root,
            "despawn: cannot despawn the root container"
        );
        {
            let n = &self.nodes[node];
            assert!(n.alive, "despawn: node {} ({}) is not alive", n.id, n.name);
            log::trace!("despawning node {} ({}) and its subtree", n.id, n.name);
        }

        self.mark_dead(node);
        self.unlink_from_parent(node);
        match self.nodes[node].tracker {
            Some(tracker) => self.unregister_subtree(node, tracker),
            None => self.limbo.push_back(node),
        }
    }

    // ------------------------------------------------------------------
    // Traversal
    // ------------------------------------------------------------------

    /// Run one update cycle from the root container
    ///
    /// Every container visited first drains its queues (removals before
    /// insertions, each FIFO), runs its own update hook, then iterates a
    /// snapshot of its update-order view: plain members get their update
    /// hook, nested containers recurse into this same protocol. Structural
    /// requests made by hooks land in the queues and are processed at the
    /// next drain, never the current pass.
    pub fn update(&mut self, dt: f32) {
        while let Some(key) = self.limbo.pop_front() {
            self.free_subtree(key);
        }
        self.run_container_update(self.root, dt);
    }

    /// Run one draw cycle from the root container
    ///
    /// Every container visited refreshes world transforms top-down over its
    /// structural subtree, runs its own draw hook, then iterates a snapshot
    /// of its draw-order view. Draw drains nothing; mutations requested
    /// here are observed at the next update's drain.
    pub fn draw(&mut self) {
        self.run_container_draw(self.root);
    }

    fn run_container_update(&mut self, container: NodeKey, dt: f32) {
        self.drain_container(container);
        self.invoke_update_hook(container, dt);
        for key in self.container_state(container).update_order() {
            let Some(node) = self.nodes.get(key) else {
                continue;
            };
            if !node.alive {
                continue;
            }
            if node.is_container() {
                self.run_container_update(key, dt);
            } else {
                self.invoke_update_hook(key, dt);
            }
        }
    }

    fn run_container_draw(&mut self, container: NodeKey) {
        self.refresh_transforms(container);
        self.invoke_draw_hook(container);
        for key in self.container_state(container).draw_order() {
            let Some(node) = self.nodes.get(key) else {
                continue;
            };
            if !node.alive {
                continue;
            }
            if node.is_container() {
                self.run_container_draw(key);
            } else {
                self.invoke_draw_hook(key);
            }
        }
    }

    /// Apply a container's staged mutations: removals first, then insertions
    fn drain_container(&mut self, container: NodeKey) {
        let mut state = mem::take(self.container_state_mut(container));
        let removals = state.pending_remove.len();
        let insertions = state.pending_insert.len();

        while let Some(key) = state.pending_remove.pop_front() {
            // Membership is dropped by key even when the slot is already
            // gone (a cascade earlier in this drain may have freed it).
            state.drop_member(key);
            if self.nodes.get(key).is_some_and(|node| !node.alive) {
                self.free_subtree(key);
            }
        }

        while let Some(key) = state.pending_insert.pop_front() {
            let Some(node) = self.nodes.get(key) else {
                continue;
            };
            // Entries detached or despawned after being queued are stale;
            // so is the second entry of a same-frame re-registration.
            if !node.alive || node.tracker != Some(container) || state.is_member(key) {
                continue;
            }
            state.admit(key, node.update_priority, node.draw_priority);
        }

        if removals > 0 || insertions > 0 {
            let n = &self.nodes[container];
            log::debug!(
                "container {} ({}): drained {} removals, {} insertions",
                n.id,
                n.name,
                removals,
                insertions
            );
        }
        *self.container_state_mut(container) = state;
    }

    /// Recompute cached world transforms top-down from `root`
    ///
    /// `root`'s own world composes with its parent's cached world, identity
    /// when detached. Covers the whole structural subtree, shielded nested
    /// containers included.
    fn refresh_transforms(&mut self, root: NodeKey) {
        let parent_world = self.nodes[root]
            .parent
            .map_or_else(Mat4::identity, |parent| self.nodes[parent].world_transform);
        self.refresh_subtree(root, parent_world);
    }

    fn refresh_subtree(&mut self, key: NodeKey, parent_world: Mat4) {
        let node = &mut self.nodes[key];
        node.world_transform = parent_world * node.local_transform;
        let world = node.world_transform;

        let mut i = 0;
        while let Some(&child) = self.nodes[key].children.get(i) {
            self.refresh_subtree(child, world);
            i += 1;
        }
    }

    // ------------------------------------------------------------------
    // Hook dispatch
    // ------------------------------------------------------------------

    fn invoke_update_hook(&mut self, key: NodeKey, dt: f32) {
        let Some(node) = self.nodes.get_mut(key) else {
            return;
        };
        let Some(mut behavior) = node.behavior.take() else {
            return;
        };
        behavior.on_update(&mut Context::new(self), key, dt);
        // The slot outlives its own hook: frees happen only in drains, and
        // no drain can run while a hook is on the stack.
        self.nodes[key].behavior = Some(behavior);
    }

    fn invoke_draw_hook(&mut self, key: NodeKey) {
        let Some(node) = self.nodes.get_mut(key) else {
            return;
        };
        let Some(mut behavior) = node.behavior.take() else {
            return;
        };
        behavior.on_draw(&mut Context::new(self), key);
        self.nodes[key].behavior = Some(behavior);
    }

    fn invoke_attached_hook(&mut self, key: NodeKey) {
        let Some(node) = self.nodes.get_mut(key) else {
            return;
        };
        let Some(mut behavior) = node.behavior.take() else {
            return;
        };
        behavior.on_attached(&mut Context::new(self), key);
        self.nodes[key].behavior = Some(behavior);
    }

    // ------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------

    /// Nearest container at or above `from` in the parent chain
    fn nearest_container(&self, from: NodeKey) -> Option<NodeKey> {
        let mut cursor = Some(from);
        while let Some(key) = cursor {
            let node = &self.nodes[key];
            if node.is_container() {
                return Some(key);
            }
            cursor = node.parent;
        }
        None
    }

    /// Queue `key` and its non-container descendants for tracking
    ///
    /// Stops descending at nested containers: they are tracked as single
    /// entries and keep ownership of their own subtrees.
    fn register_subtree(&mut self, key: NodeKey, tracker: NodeKey) {
        debug_assert!(
            self.nodes[key].tracker.is_none(),
            "registering node {:?} that is already tracked",
            key
        );
        self.nodes[key].tracker = Some(tracker);
        self.container_state_mut(tracker).pending_insert.push_back(key);

        if self.nodes[key].is_container() {
            return;
        }
        let mut i = 0;
        while let Some(&child) = self.nodes[key].children.get(i) {
            self.register_subtree(child, tracker);
            i += 1;
        }
    }

    /// Queue `key` and its non-container descendants for removal from their
    /// tracking container, clearing the back-references
    fn unregister_subtree(&mut self, key: NodeKey, tracker: NodeKey) {
        debug_assert_eq!(
            self.nodes[key].tracker,
            Some(tracker),
            "unregistering node {:?} that is tracked elsewhere",
            key
        );
        self.nodes[key].tracker = None;
        self.container_state_mut(tracker).pending_remove.push_back(key);

        if self.nodes[key].is_container() {
            return;
        }
        let mut i = 0;
        while let Some(&child) = self.nodes[key].children.get(i) {
            self.unregister_subtree(child, tracker);
            i += 1;
        }
    }

    fn mark_dead(&mut self, key: NodeKey) {
        self.nodes[key].alive = false;
        let mut i = 0;
        while let Some(&child) = self.nodes[key].children.get(i) {
            self.mark_dead(child);
            i += 1;
        }
    }

    fn unlink_from_parent(&mut self, node: NodeKey) {
        if let Some(parent) = self.nodes[node].parent.take() {
            self.nodes[parent].children.retain(|&child| child != node);
        }
    }

    /// Free a node's arena slot and, recursively, its structural subtree
    ///
    /// Subtrees of dead nodes are dead in full, and shielded members of a
    /// dead container hold no queue entry anywhere live, so the cascade is
    /// their only release point. A dying container also frees the dead
    /// entries waiting in its own removal queue: despawn unlinks a queued
    /// node from its parent, so the child walk cannot reach it.
    fn free_subtree(&mut self, key: NodeKey) {
        if let Some(node) = self.nodes.remove(key) {
            log::trace!("freed node {} ({})", node.id, node.name);
            for child in node.children {
                self.free_subtree(child);
            }
            // What this container's next drain would have freed.
            if let NodeKind::Container(state) = node.kind {
                for queued in state.pending_remove {
                    if self.nodes.get(queued).is_some_and(|n| !n.alive) {
                        self.free_subtree(queued);
                    }
                }
            }
        }
    }

    /// Whether `node` lies inside the subtree rooted at `ancestor`
    fn is_within_subtree(&self, node: NodeKey, ancestor: NodeKey) -> bool {
        let mut cursor = Some(node);
        while let Some(key) = cursor {
            if key == ancestor {
                return true;
            }
            cursor = self.nodes[key].parent;
        }
        false
    }

    fn container_state(&self, container: NodeKey) -> &ContainerState {
        match &self.nodes[container].kind {
            NodeKind::Container(state) => state,
            NodeKind::Plain => panic!("node {:?} is not a container", container),
        }
    }

    fn container_state_mut(&mut self, container: NodeKey) -> &mut ContainerState {
        match &mut self.nodes[container].kind {
            NodeKind::Container(state) => state,
            NodeKind::Plain => panic!("node {:?} is not a container", container),
        }
    }

    fn live_node_mut(&mut self, key: NodeKey, op: &str) -> &mut Node {
        let Some(node) = self.nodes.get_mut(key) else {
            panic!("{}: stale node key {:?}", op, key);
        };
        assert!(
            node.alive,
            "{}: node {} ({}) is not alive",
            op, node.id, node.name
        );
        node
    }

    // ------------------------------------------------------------------
    // Priorities
    // ------------------------------------------------------------------

    /// Change a node's update priority
    ///
    /// A tracked node is repositioned in its container's update view right
    /// away, keeping its registration sequence as the tie-break; a pass
    /// already in progress keeps its snapshot. Pending registrations need
    /// nothing: the drain reads priorities at insertion time.
    ///
    /// # Panics
    /// If the key is stale or the node is not alive.
    pub fn set_update_priority(&mut self, node: NodeKey, priority: i32) {
        let n = self.live_node_mut(node, "set_update_priority");
        n.update_priority = priority;
        let tracker = n.tracker;
        if let Some(tracker) = tracker {
            self.container_state_mut(tracker).reposition_update(node, priority);
        }
    }

    /// Change a node's draw priority
    ///
    /// Same repositioning rules as [`Scene::set_update_priority`], applied
    /// to the draw view.
    ///
    /// # Panics
    /// If the key is stale or the node is not alive.
    pub fn set_draw_priority(&mut self, node: NodeKey, priority: i32) {
        let n = self.live_node_mut(node, "set_draw_priority");
        n.draw_priority = priority;
        let tracker = n.tracker;
        if let Some(tracker) = tracker {
            self.container_state_mut(tracker).reposition_draw(node, priority);
        }
    }

    // ------------------------------------------------------------------
    // Capability queries
    // ------------------------------------------------------------------

    /// First node at or below `from` whose capability set contains
    /// `capabilities`, in pre-order (node first, then children in
    /// child-list order)
    ///
    /// Searches the structural tree, not any container's tracked set. Dead
    /// nodes are invisible. An empty capability set matches every node.
    pub fn find_first(&self, from: NodeKey, capabilities: Capabilities) -> Option<NodeKey> {
        let node = self.nodes.get(from)?;
        if !node.alive {
            return None;
        }
        if node.capabilities.contains(capabilities) {
            return Some(from);
        }
        for &child in &node.children {
            if let Some(found) = self.find_first(child, capabilities) {
                return Some(found);
            }
        }
        None
    }

    /// Every node at or below `from` whose capability set contains
    /// `capabilities`, in pre-order
    pub fn find_all(&self, from: NodeKey, capabilities: Capabilities) -> Vec<NodeKey> {
        let mut found = Vec::new();
        self.collect_matching(from, capabilities, &mut found);
        found
    }

    fn collect_matching(&self, key: NodeKey, capabilities: Capabilities, found: &mut Vec<NodeKey>) {
        let Some(node) = self.nodes.get(key) else {
            return;
        };
        if !node.alive {
            return;
        }
        if node.capabilities.contains(capabilities) {
            found.push(key);
        }
        for &child in &node.children {
            self.collect_matching(child, capabilities, found);
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// A node's display name, or `None` for a freed key
    pub fn name(&self, node: NodeKey) -> Option<&str> {
        self.nodes.get(node).map(|n| n.name.as_str())
    }

    /// Rename a node
    ///
    /// # Panics
    /// If the key is stale or the node is not alive.
    pub fn set_name(&mut self, node: NodeKey, name: impl Into<String>) {
        self.live_node_mut(node, "set_name").name = name.into();
    }

    /// A node's local transform, or `None` for a freed key
    pub fn local_transform(&self, node: NodeKey) -> Option<Mat4> {
        self.nodes.get(node).map(|n| n.local_transform)
    }

    /// Replace a node's local transform
    ///
    /// The cached world transform follows at the next draw-phase refresh.
    ///
    /// # Panics
    /// If the key is stale or the node is not alive.
    pub fn set_local_transform(&mut self, node: NodeKey, transform: Mat4) {
        self.live_node_mut(node, "set_local_transform").local_transform = transform;
    }

    /// A node's cached world transform, or `None` for a freed key
    ///
    /// Fresh only after a draw-phase refresh; identity before the first
    /// one. Reading a despawned-but-not-yet-freed node returns the last
    /// cached value.
    pub fn world_transform(&self, node: NodeKey) -> Option<Mat4> {
        self.nodes.get(node).map(|n| n.world_transform)
    }

    /// A node's update priority, or `None` for a freed key
    pub fn update_priority(&self, node: NodeKey) -> Option<i32> {
        self.nodes.get(node).map(|n| n.update_priority)
    }

    /// A node's draw priority, or `None` for a freed key
    pub fn draw_priority(&self, node: NodeKey) -> Option<i32> {
        self.nodes.get(node).map(|n| n.draw_priority)
    }

    /// A node's parent, or `None` when detached or freed
    pub fn parent(&self, node: NodeKey) -> Option<NodeKey> {
        self.nodes.get(node).and_then(|n| n.parent)
    }

    /// A node's children in child-list order, empty for a freed key
    pub fn children(&self, node: NodeKey) -> &[NodeKey] {
        self.nodes.get(node).map_or(&[], |n| n.children.as_slice())
    }

    /// A node's declared capability set, or `None` for a freed key
    pub fn capabilities(&self, node: NodeKey) -> Option<Capabilities> {
        self.nodes.get(node).map(|n| n.capabilities)
    }

    /// Whether the key refers to a live node; `false` once despawned or
    /// freed
    pub fn is_alive(&self, node: NodeKey) -> bool {
        self.nodes.get(node).is_some_and(|n| n.alive)
    }

    /// Whether the node is a container
    pub fn is_container(&self, node: NodeKey) -> bool {
        self.nodes.get(node).is_some_and(Node::is_container)
    }

    /// A node's process-unique id, or `None` for a freed key
    pub fn node_id(&self, node: NodeKey) -> Option<u64> {
        self.nodes.get(node).map(|n| n.id)
    }

    /// Whether the arena still holds this key (despawned nodes stay present
    /// until their removal queue drains)
    pub fn contains(&self, node: NodeKey) -> bool {
        self.nodes.contains_key(node)
    }

    /// Number of nodes in the arena, dead-but-undrained ones included
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Whether `node` is in `container`'s tracked set
    ///
    /// Pending registrations are not members until the next drain.
    pub fn is_tracked(&self, container: NodeKey, node: NodeKey) -> bool {
        match self.nodes.get(container).map(|n| &n.kind) {
            Some(NodeKind::Container(state)) => state.is_member(node),
            _ => false,
        }
    }

    /// Size of a container's tracked set, or `None` if the key is stale or
    /// not a container
    pub fn tracked_count(&self, container: NodeKey) -> Option<usize> {
        match self.nodes.get(container).map(|n| &n.kind) {
            Some(NodeKind::Container(state)) => Some(state.member_count()),
            _ => None,
        }
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}
