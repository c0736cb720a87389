//! Scene graph: node lifecycle, containers, and frame traversal
//!
//! The scene is a tree of nodes rooted at a container. Structure (parent and
//! child links) and dispatch (which container tracks a node, in what order
//! it runs) are deliberately separate:
//!
//! ```text
//! Scene (arena + root)
//!      ↓ owns
//! Node (transform, priorities, capabilities, behavior)
//!      ↓ tracked by
//! Container views (update order / draw order + staged mutations)
//! ```
//!
//! A container tracks its *flattened* non-container descendants, so a plain
//! node's children dispatch as siblings of their parent; a nested container
//! shields its own subtree and runs it recursively. All structural mutation
//! is legal mid-traversal: requests are staged in FIFO queues and applied at
//! each container's next drain, removals before insertions.

mod behavior;
mod container;
mod graph;
mod node;

pub use behavior::{Behavior, Context};
pub use graph::Scene;
pub use node::{Capabilities, NodeKey, NodeSpec};
