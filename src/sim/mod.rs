//! Round simulation module
//!
//! All bowling logic lives here. The module never touches the physics engine
//! or the DOM directly:
//! - Physics state arrives as a `WorldSnapshot` plus collision events
//! - Side effects leave as `Command`s
//! - Time comes from the caller (`TickInput::now_ms`)

pub mod event;
pub mod layout;
pub mod state;
pub mod tick;
pub mod world;

pub use event::{
    BodyState, CircleBody, CircleRole, Command, CollisionEvent, RoundReport, TickInput,
    WorldSnapshot,
};
pub use layout::{
    Layout, RackPosition, RackSlot, Rect, StaticBody, StaticKind, Viewport, rack_positions,
    triangle_slot,
};
pub use state::{Ball, BodyId, BodyRole, EndReason, PendingReport, Pin, RoundPhase, RoundState};
pub use tick::{finish_report, request_reset, reset_round, spin_force, spawn_world, tick};
pub use world::{PhysicsWorld, apply_commands, snapshot};
