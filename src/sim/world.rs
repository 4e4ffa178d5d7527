//! Boundary to the external physics engine
//!
//! The engine does integration, collision detection and contact resolution.
//! The round logic only talks to it through [`PhysicsWorld`].

use glam::Vec2;

use super::event::{BodyState, CircleBody, Command, CollisionEvent, RoundReport, WorldSnapshot};
use super::layout::StaticBody;
use super::state::{BodyId, RoundState};

/// A 2D rigid-body world addressed by [`BodyId`].
///
/// Operations on unknown ids are no-ops.
pub trait PhysicsWorld {
    /// Add an immovable rectangle (sensor if `body.kind.is_sensor()`)
    fn add_static(&mut self, id: BodyId, body: &StaticBody);
    /// Add a dynamic circle
    fn add_circle(&mut self, id: BodyId, circle: &CircleBody);
    fn remove(&mut self, id: BodyId);

    fn body(&self, id: BodyId) -> Option<BodyState>;

    fn set_position(&mut self, id: BodyId, pos: Vec2);
    fn set_velocity(&mut self, id: BodyId, vel: Vec2);
    fn set_angular_velocity(&mut self, id: BodyId, angular_vel: f32);
    fn apply_force(&mut self, id: BodyId, force: Vec2);

    /// Advance the simulation by `dt_ms`
    fn step(&mut self, dt_ms: f64);
    /// Contacts that started since the last call
    fn drain_collisions(&mut self) -> Vec<CollisionEvent>;
}

/// Apply world commands in order. Returns the round report, if one was issued.
pub fn apply_commands<W: PhysicsWorld + ?Sized>(
    world: &mut W,
    commands: Vec<Command>,
) -> Option<RoundReport> {
    let mut report = None;
    for command in commands {
        match command {
            Command::SpawnStatic { id, body } => world.add_static(id, &body),
            Command::SpawnCircle { id, circle } => world.add_circle(id, &circle),
            Command::RemoveBody(id) => world.remove(id),
            Command::SetPosition { id, pos } => world.set_position(id, pos),
            Command::SetVelocity { id, vel } => world.set_velocity(id, vel),
            Command::SetAngularVelocity { id, angular_vel } => {
                world.set_angular_velocity(id, angular_vel)
            }
            Command::ApplyForce { id, force } => world.apply_force(id, force),
            Command::Report(r) => report = Some(r),
        }
    }
    report
}

/// Read the ball and every pin still in the rack
pub fn snapshot<W: PhysicsWorld + ?Sized>(world: &W, state: &RoundState) -> WorldSnapshot {
    let ball = world.body(state.ball.id).unwrap_or_else(|| {
        log::warn!("Ball {} missing from physics world", state.ball.id.0);
        BodyState::default()
    });
    let pins = state
        .pins
        .iter()
        .filter_map(|pin| world.body(pin.id).map(|body| (pin.id, body)))
        .collect();
    WorldSnapshot { ball, pins }
}
