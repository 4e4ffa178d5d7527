//! Mouse drag to ball commands
//!
//! While the ball is held it follows the pointer; on release it keeps the
//! pointer's last velocity and picks up the configured spin.

use glam::Vec2;

use crate::consts::SIM_DT_MS;
use crate::settings::Settings;
use crate::sim::{BodyId, BodyState, Command};

#[derive(Debug, Clone, Default)]
pub struct DragController {
    grabbing: bool,
    last_pointer: Vec2,
    last_ms: f64,
    /// Pointer displacement per physics step at the last move
    velocity: Vec2,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        self.grabbing
    }

    /// Grab the ball if the pointer landed on it
    pub fn pointer_down(
        &mut self,
        pointer: Vec2,
        now_ms: f64,
        ball_id: BodyId,
        ball: &BodyState,
        ball_radius: f32,
        settings: &Settings,
    ) -> Vec<Command> {
        if pointer.distance(ball.pos) > ball_radius * settings.grab_radius_factor {
            return Vec::new();
        }
        self.grabbing = true;
        self.last_pointer = pointer;
        self.last_ms = now_ms;
        self.velocity = Vec2::ZERO;
        log::debug!("Ball grabbed at ({:.0}, {:.0})", pointer.x, pointer.y);

        vec![
            Command::SetVelocity {
                id: ball_id,
                vel: Vec2::ZERO,
            },
            Command::SetAngularVelocity {
                id: ball_id,
                angular_vel: 0.0,
            },
        ]
    }

    /// Move the held ball to the pointer
    pub fn pointer_move(&mut self, pointer: Vec2, now_ms: f64, ball_id: BodyId) -> Vec<Command> {
        if !self.grabbing {
            return Vec::new();
        }
        let steps = ((now_ms - self.last_ms) / SIM_DT_MS).max(1.0) as f32;
        self.velocity = (pointer - self.last_pointer) / steps;
        self.last_pointer = pointer;
        self.last_ms = now_ms;

        vec![
            Command::SetPosition {
                id: ball_id,
                pos: pointer,
            },
            Command::SetVelocity {
                id: ball_id,
                vel: self.velocity,
            },
        ]
    }

    /// Let go: residual drag velocity plus the slider's spin
    pub fn pointer_up(&mut self, ball_id: BodyId, settings: &Settings) -> Vec<Command> {
        if !self.grabbing {
            return Vec::new();
        }
        self.grabbing = false;
        log::debug!(
            "Ball released at ({:.2}, {:.2}) with spin {:.2}",
            self.velocity.x,
            self.velocity.y,
            settings.spin
        );

        vec![
            Command::SetVelocity {
                id: ball_id,
                vel: self.velocity,
            },
            Command::SetAngularVelocity {
                id: ball_id,
                angular_vel: settings.spin,
            },
        ]
    }

    /// Drop the ball without launching it (round reset mid-drag)
    pub fn cancel(&mut self) {
        self.grabbing = false;
        self.velocity = Vec2::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BALL: BodyId = BodyId(7);

    fn ball_at(x: f32, y: f32) -> BodyState {
        BodyState::at(Vec2::new(x, y))
    }

    #[test]
    fn test_pointer_off_ball_is_ignored() {
        let settings = Settings::default();
        let mut drag = DragController::new();
        let commands =
            drag.pointer_down(Vec2::new(200.0, 200.0), 0.0, BALL, &ball_at(0.0, 0.0), 20.0, &settings);
        assert!(commands.is_empty());
        assert!(!drag.is_dragging());
        assert!(drag.pointer_move(Vec2::new(10.0, 10.0), 16.0, BALL).is_empty());
        assert!(drag.pointer_up(BALL, &settings).is_empty());
    }

    #[test]
    fn test_drag_and_release_with_spin() {
        let settings = Settings {
            spin: 0.25,
            ..Settings::default()
        };
        let mut drag = DragController::new();
        let ball = ball_at(400.0, 540.0);

        assert!(!drag
            .pointer_down(Vec2::new(410.0, 545.0), 0.0, BALL, &ball, 20.0, &settings)
            .is_empty());
        assert!(drag.is_dragging());

        // Two physics steps worth of time, 20 px up
        let commands = drag.pointer_move(Vec2::new(410.0, 525.0), 2.0 * SIM_DT_MS, BALL);
        assert_eq!(
            commands[0],
            Command::SetPosition {
                id: BALL,
                pos: Vec2::new(410.0, 525.0)
            }
        );
        assert_eq!(
            commands[1],
            Command::SetVelocity {
                id: BALL,
                vel: Vec2::new(0.0, -10.0)
            }
        );

        let commands = drag.pointer_up(BALL, &settings);
        assert_eq!(
            commands,
            vec![
                Command::SetVelocity {
                    id: BALL,
                    vel: Vec2::new(0.0, -10.0)
                },
                Command::SetAngularVelocity {
                    id: BALL,
                    angular_vel: 0.25
                },
            ]
        );
        assert!(!drag.is_dragging());
    }

    #[test]
    fn test_fast_moves_count_as_one_step() {
        let settings = Settings::default();
        let mut drag = DragController::new();
        drag.pointer_down(Vec2::ZERO, 100.0, BALL, &ball_at(0.0, 0.0), 20.0, &settings);
        let commands = drag.pointer_move(Vec2::new(0.0, -8.0), 101.0, BALL);
        assert_eq!(
            commands[1],
            Command::SetVelocity {
                id: BALL,
                vel: Vec2::new(0.0, -8.0)
            }
        );
    }
}
