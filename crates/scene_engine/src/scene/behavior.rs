//! Node behaviors and the hook context
//!
//! A [`Behavior`] is the per-node hook target: traversal invokes its hooks in
//! priority order, and the hooks receive a [`Context`] over the owning scene.
//! `Context` deliberately exposes everything *except* [`Scene::update`] and
//! [`Scene::draw`], so a hook cannot re-enter traversal; structural requests
//! it makes are staged in the mutation queues and applied at the next drain.

use crate::foundation::math::Mat4;

use super::graph::Scene;
use super::node::{Capabilities, NodeKey, NodeSpec};

/// Per-node hook target invoked by scene traversal
///
/// All hooks default to no-ops; implement the ones the node needs. `()` is
/// the inert behavior for nodes that only carry structure.
pub trait Behavior {
    /// Invoked synchronously when the node is attached to a parent
    fn on_attached(&mut self, _ctx: &mut Context<'_>, _node: NodeKey) {}

    /// Invoked once per update cycle while the node is tracked by a container
    fn on_update(&mut self, _ctx: &mut Context<'_>, _node: NodeKey, _dt: f32) {}

    /// Invoked once per draw cycle while the node is tracked by a container
    ///
    /// The node's world transform is fresh at call time. Drawing is expected
    /// to be read-only with respect to the tree; structural requests are
    /// still allowed and take effect at the next update's drain.
    fn on_draw(&mut self, _ctx: &mut Context<'_>, _node: NodeKey) {}
}

/// The inert behavior
impl Behavior for () {}

/// Scene services handed to behavior hooks
///
/// Wraps the owning [`Scene`] minus its traversal entry points. Mutations
/// requested through it mid-traversal land in the pending queues and are
/// invisible to the pass in progress.
pub struct Context<'a> {
    scene: &'a mut Scene,
}

impl<'a> Context<'a> {
    pub(crate) fn new(scene: &'a mut Scene) -> Self {
        Self { scene }
    }

    /// Create a detached node; see [`Scene::spawn`]
    pub fn spawn(&mut self, spec: NodeSpec) -> NodeKey {
        self.scene.spawn(spec)
    }

    /// Link a detached node under a parent; see [`Scene::attach`]
    ///
    /// # Panics
    /// On the contract violations documented on [`Scene::attach`].
    pub fn attach(&mut self, node: NodeKey, parent: NodeKey) {
        self.scene.attach(node, parent);
    }

    /// Unlink a node from its parent, keeping it alive; see [`Scene::detach`]
    ///
    /// # Panics
    /// On the contract violations documented on [`Scene::detach`].
    pub fn detach(&mut self, node: NodeKey) {
        self.scene.detach(node);
    }

    /// Mark a subtree for destruction; see [`Scene::despawn`]
    ///
    /// Safe to call on the hook's own node: memory is freed at a later
    /// drain, never mid-hook.
    ///
    /// # Panics
    /// On the contract violations documented on [`Scene::despawn`].
    pub fn despawn(&mut self, node: NodeKey) {
        self.scene.despawn(node);
    }

    /// Change a node's update priority; see [`Scene::set_update_priority`]
    ///
    /// # Panics
    /// If the key is stale or the node is not alive.
    pub fn set_update_priority(&mut self, node: NodeKey, priority: i32) {
        self.scene.set_update_priority(node, priority);
    }

    /// Change a node's draw priority; see [`Scene::set_draw_priority`]
    ///
    /// # Panics
    /// If the key is stale or the node is not alive.
    pub fn set_draw_priority(&mut self, node: NodeKey, priority: i32) {
        self.scene.set_draw_priority(node, priority);
    }

    /// Replace a node's local transform
    ///
    /// # Panics
    /// If the key is stale or the node is not alive.
    pub fn set_local_transform(&mut self, node: NodeKey, transform: Mat4) {
        self.scene.set_local_transform(node, transform);
    }

    /// Rename a node
    ///
    /// # Panics
    /// If the key is stale or the node is not alive.
    pub fn set_name(&mut self, node: NodeKey, name: impl Into<String>) {
        self.scene.set_name(node, name);
    }

    /// The scene's root container
    pub fn root(&self) -> NodeKey {
        self.scene.root()
    }

    /// A node's update priority, or `None` for a freed key
    pub fn update_priority(&self, node: NodeKey) -> Option<i32> {
        self.scene.update_priority(node)
    }

    /// A node's draw priority, or `None` for a freed key
    pub fn draw_priority(&self, node: NodeKey) -> Option<i32> {
        self.scene.draw_priority(node)
    }

    /// A node's local transform, or `None` for a freed key
    pub fn local_transform(&self, node: NodeKey) -> Option<Mat4> {
        self.scene.local_transform(node)
    }

    /// A node's cached world transform; see [`Scene::world_transform`]
    pub fn world_transform(&self, node: NodeKey) -> Option<Mat4> {
        self.scene.world_transform(node)
    }

    /// A node's display name, or `None` for a freed key
    pub fn name(&self, node: NodeKey) -> Option<&str> {
        self.scene.name(node)
    }

    /// A node's parent, or `None` when detached or freed
    pub fn parent(&self, node: NodeKey) -> Option<NodeKey> {
        self.scene.parent(node)
    }

    /// A node's children in child-list order, empty for a freed key
    pub fn children(&self, node: NodeKey) -> &[NodeKey] {
        self.scene.children(node)
    }

    /// A node's declared capability set, or `None` for a freed key
    pub fn capabilities(&self, node: NodeKey) -> Option<Capabilities> {
        self.scene.capabilities(node)
    }

    /// Whether the key refers to a live node (`false` for freed keys)
    pub fn is_alive(&self, node: NodeKey) -> bool {
        self.scene.is_alive(node)
    }

    /// Whether the node is a container
    pub fn is_container(&self, node: NodeKey) -> bool {
        self.scene.is_container(node)
    }

    /// A node's process-unique id, or `None` for a freed key
    pub fn node_id(&self, node: NodeKey) -> Option<u64> {
        self.scene.node_id(node)
    }

    /// Whether the arena still holds this key
    pub fn contains(&self, node: NodeKey) -> bool {
        self.scene.contains(node)
    }

    /// Number of nodes in the arena, including dead ones awaiting drain
    pub fn node_count(&self) -> usize {
        self.scene.node_count()
    }

    /// Pre-order capability search; see [`Scene::find_first`]
    pub fn find_first(&self, from: NodeKey, capabilities: Capabilities) -> Option<NodeKey> {
        self.scene.find_first(from, capabilities)
    }

    /// Pre-order capability collection; see [`Scene::find_all`]
    pub fn find_all(&self, from: NodeKey, capabilities: Capabilities) -> Vec<NodeKey> {
        self.scene.find_all(from, capabilities)
    }
}
