//! Tick inputs and outputs
//!
//! The state machine reads a snapshot of the world plus the collisions that
//! started during the last step, and answers with commands for the host.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::layout::StaticBody;
use super::state::{BodyId, EndReason};

/// Kinematic state of one body as reported by the physics engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BodyState {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Accumulated rotation in radians (not wrapped)
    pub angle: f32,
    pub angular_vel: f32,
}

impl BodyState {
    pub fn at(pos: Vec2) -> Self {
        Self {
            pos,
            ..Self::default()
        }
    }

    pub fn speed(&self) -> f32 {
        self.vel.length()
    }
}

/// A contact that began during the last step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionEvent {
    pub a: BodyId,
    pub b: BodyId,
}

impl CollisionEvent {
    pub fn new(a: BodyId, b: BodyId) -> Self {
        Self { a, b }
    }

    /// The body paired with `id`, if `id` takes part in this contact
    pub fn other(&self, id: BodyId) -> Option<BodyId> {
        if self.a == id {
            Some(self.b)
        } else if self.b == id {
            Some(self.a)
        } else {
            None
        }
    }
}

/// Ball and pin states read back after a physics step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub ball: BodyState,
    pub pins: Vec<(BodyId, BodyState)>,
}

impl WorldSnapshot {
    pub fn pin(&self, id: BodyId) -> Option<&BodyState> {
        self.pins.iter().find(|(pid, _)| *pid == id).map(|(_, s)| s)
    }
}

/// Input for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Injected clock reading in milliseconds
    pub now_ms: f64,
    pub snapshot: WorldSnapshot,
    pub collisions: Vec<CollisionEvent>,
}

/// Role of a dynamic circle, used by hosts for styling and damping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CircleRole {
    Ball,
    Pin,
}

/// A dynamic circular body to create in the world
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CircleBody {
    pub role: CircleRole,
    pub pos: Vec2,
    pub radius: f32,
    pub restitution: f32,
    pub air_friction: f32,
}

/// Outcome of a round, shown to the player before the reset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundReport {
    pub round: u32,
    /// Reported score (0 for a gutter ball)
    pub score: u32,
    pub rack_size: u32,
    pub reason: EndReason,
}

impl RoundReport {
    pub fn is_gutter(&self) -> bool {
        self.reason == EndReason::Gutter
    }

    /// Text for the blocking alert
    pub fn message(&self) -> String {
        if self.is_gutter() {
            format!("Gutter! Score: {}", self.score)
        } else {
            format!("Score: {}", self.score)
        }
    }
}

/// Side effect requested by the state machine
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SpawnStatic { id: BodyId, body: StaticBody },
    SpawnCircle { id: BodyId, circle: CircleBody },
    RemoveBody(BodyId),
    SetPosition { id: BodyId, pos: Vec2 },
    SetVelocity { id: BodyId, vel: Vec2 },
    SetAngularVelocity { id: BodyId, angular_vel: f32 },
    ApplyForce { id: BodyId, force: Vec2 },
    /// Surface the round result to the player
    Report(RoundReport),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collision_other() {
        let event = CollisionEvent::new(BodyId(1), BodyId(2));
        assert_eq!(event.other(BodyId(1)), Some(BodyId(2)));
        assert_eq!(event.other(BodyId(2)), Some(BodyId(1)));
        assert_eq!(event.other(BodyId(3)), None);
    }

    #[test]
    fn test_report_messages() {
        let gutter = RoundReport {
            round: 1,
            score: 0,
            rack_size: 6,
            reason: EndReason::Gutter,
        };
        assert_eq!(gutter.message(), "Gutter! Score: 0");

        let rest = RoundReport {
            score: 4,
            reason: EndReason::Rest,
            ..gutter
        };
        assert_eq!(rest.message(), "Score: 4");
    }
}
