//! Blockmap, position resolution and movement for the kartsim core.
//!
//! Every tick, [`PhysicsWorld::tick`] moves each object through the level in
//! spawn order and then drains the deferred event queue into the caller's
//! [`InteractionHooks`]. The same entry points are available individually:
//!
//! - [`PhysicsWorld::check_position`] answers whether an object fits at a point
//! - [`PhysicsWorld::try_move`] sub-steps a move, sliding along walls
//! - [`PhysicsWorld::set_origin`] / [`PhysicsWorld::move_origin`] teleport
//! - [`PhysicsWorld::dispatch`] delivers queued touch and trigger events
//!
//! Only pickups call back into gameplay in the middle of a query. Hooks get
//! `&mut PhysicsWorld` and may spawn, remove and query objects re-entrantly;
//! all per-query state lives on the caller's stack.

pub mod blockmap;
pub mod config;
pub mod dispatch;
pub mod movement;
pub mod resolver;
pub mod teleport;
pub mod world;

#[cfg(test)]
pub(crate) mod fixtures;

pub use blockmap::{Blockmap, BoxObjects};
pub use config::{Interaction, InteractionPolicy, PhysicsConfig};
pub use dispatch::{EventQueue, InteractionHooks, NoHooks, PhysicsEvent};
pub use movement::{MoveOutcome, MoveResult};
pub use resolver::{Blocker, Contact, ContactKind, Outcome, Verdict};
pub use world::{PhysicsStats, PhysicsWorld};
