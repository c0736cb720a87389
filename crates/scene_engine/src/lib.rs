//! # Scene Engine
//!
//! A scene-graph core for real-time applications: hierarchical transforms,
//! priority-ordered update/draw dispatch, and a node lifecycle that stays
//! safe while the graph is being traversed.
//!
//! ## Features
//!
//! - **Arena-backed graph**: Nodes live in a generational arena and are
//!   addressed by keys, never by owning pointers
//! - **Deferred mutation**: Attach, detach, and despawn are legal from any
//!   hook; containers stage the changes and apply removals before
//!   insertions at their next drain
//! - **Priority dispatch**: Containers run their tracked nodes by update
//!   and draw priority, with registration order breaking ties
//! - **Transform cascade**: World transforms compose parent-to-child every
//!   draw cycle
//! - **Capability queries**: Find cameras, lights, or app-defined node
//!   classes by bitflag instead of downcasting
//!
//! ## Quick Start
//!
//! ```rust
//! use scene_engine::prelude::*;
//!
//! struct Spinner;
//!
//! impl Behavior for Spinner {
//!     fn on_update(&mut self, ctx: &mut Context<'_>, node: NodeKey, dt: f32) {
//!         let spun = ctx.local_transform(node).unwrap() * Mat4::rotation_y(dt);
//!         ctx.set_local_transform(node, spun);
//!     }
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut engine = Engine::new(EngineConfig::default())?;
//!
//!     let root = engine.scene().root();
//!     let hub = engine.scene_mut().spawn(
//!         NodeSpec::new("hub")
//!             .capabilities(Capabilities::DRAWABLE)
//!             .behavior(Spinner),
//!     );
//!     engine.scene_mut().attach(hub, root);
//!
//!     for _ in 0..3 {
//!         engine.frame();
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod foundation;
pub mod scene;

mod engine;

pub use engine::{ConfigError, Engine, EngineConfig, EngineError};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        foundation::math::{Mat4, Mat4Ext, Vec3},
        foundation::time::FrameTimer,
        scene::{Behavior, Capabilities, Context, NodeKey, NodeSpec, Scene},
        ConfigError, Engine, EngineConfig, EngineError,
    };
}
