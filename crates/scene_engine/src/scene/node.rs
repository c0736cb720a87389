//! Node storage types and construction
//!
//! Nodes live in a [`Scene`](super::Scene)-owned arena and are addressed by
//! [`NodeKey`]. All structural links (parent, children, tracking container)
//! are keys, never owning references.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::foundation::math::Mat4;

use super::behavior::Behavior;
use super::container::ContainerState;

slotmap::new_key_type! {
    /// Generational handle to a node in a scene's arena
    ///
    /// Keys are never reused: once a node is freed, lookups with its old key
    /// return `None` even if the underlying slot is recycled.
    pub struct NodeKey;
}

bitflags::bitflags! {
    /// Capability set a node declares at construction
    ///
    /// Capability queries ([`Scene::find_first`](super::Scene::find_first),
    /// [`Scene::find_all`](super::Scene::find_all)) test these bits instead of
    /// downcasting node types. Bits outside the named set are reserved for
    /// applications.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Capabilities: u32 {
        /// Node provides a view/projection source
        const CAMERA = 1 << 0;
        /// Node emits light
        const LIGHT = 1 << 1;
        /// Node submits geometry from its draw hook
        const DRAWABLE = 1 << 2;
        // Application-defined bits
        const _ = !0;
    }
}

/// Value tag distinguishing plain nodes from containers
pub(crate) enum NodeKind {
    Plain,
    Container(ContainerState),
}

/// A scene-graph node as stored in the arena
///
/// Field access goes through `Scene`; nothing outside the scene module holds
/// a `Node` directly.
pub(crate) struct Node {
    pub(crate) id: u64,
    pub(crate) name: String,
    pub(crate) local_transform: Mat4,
    /// Composed through the ancestor chain at draw time; identity until the
    /// first refresh.
    pub(crate) world_transform: Mat4,
    pub(crate) update_priority: i32,
    pub(crate) draw_priority: i32,
    /// False once the node is queued for destruction.
    pub(crate) alive: bool,
    pub(crate) capabilities: Capabilities,
    pub(crate) parent: Option<NodeKey>,
    pub(crate) children: Vec<NodeKey>,
    /// Container currently tracking this node, if any.
    pub(crate) tracker: Option<NodeKey>,
    pub(crate) kind: NodeKind,
    /// Taken out while one of its hooks is in flight.
    pub(crate) behavior: Option<Box<dyn Behavior>>,
}

impl Node {
    pub(crate) fn from_spec(spec: NodeSpec) -> Self {
        Self {
            id: next_node_id(),
            name: spec.name,
            local_transform: spec.local_transform,
            world_transform: Mat4::identity(),
            update_priority: spec.update_priority,
            draw_priority: spec.draw_priority,
            alive: true,
            capabilities: spec.capabilities,
            parent: None,
            children: Vec::new(),
            tracker: None,
            kind: if spec.container {
                NodeKind::Container(ContainerState::new())
            } else {
                NodeKind::Plain
            },
            behavior: Some(spec.behavior),
        }
    }

    pub(crate) fn is_container(&self) -> bool {
        matches!(self.kind, NodeKind::Container(_))
    }
}

/// Process-unique node ids, assigned at construction and never reused
fn next_node_id() -> u64 {
    static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);
    NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed)
}

/// Builder describing a node to spawn
///
/// Defaults: identity local transform, both priorities 0, no capabilities,
/// inert behavior.
pub struct NodeSpec {
    name: String,
    container: bool,
    local_transform: Mat4,
    update_priority: i32,
    draw_priority: i32,
    capabilities: Capabilities,
    behavior: Box<dyn Behavior>,
}

impl NodeSpec {
    /// Describe a plain node
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            container: false,
            local_transform: Mat4::identity(),
            update_priority: 0,
            draw_priority: 0,
            capabilities: Capabilities::empty(),
            behavior: Box::new(()),
        }
    }

    /// Describe a container node that tracks its non-container descendants
    /// for ordered update/draw dispatch
    pub fn container(name: impl Into<String>) -> Self {
        Self {
            container: true,
            ..Self::new(name)
        }
    }

    /// Set the local transform
    #[must_use]
    pub fn local_transform(mut self, transform: Mat4) -> Self {
        self.local_transform = transform;
        self
    }

    /// Set the update priority (lower runs earlier, default 0)
    #[must_use]
    pub fn update_priority(mut self, priority: i32) -> Self {
        self.update_priority = priority;
        self
    }

    /// Set the draw priority (lower draws earlier, default 0)
    #[must_use]
    pub fn draw_priority(mut self, priority: i32) -> Self {
        self.draw_priority = priority;
        self
    }

    /// Declare the node's capability set
    #[must_use]
    pub fn capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Attach a behavior whose hooks run during traversal
    #[must_use]
    pub fn behavior(mut self, behavior: impl Behavior + 'static) -> Self {
        self.behavior = Box::new(behavior);
        self
    }
}
