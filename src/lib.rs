//! Nine-Pin - a bowling toy on top of an external 2D physics engine
//!
//! Core modules:
//! - `sim`: Round logic (layout, state machine, commands for the physics world)
//! - `game`: Fixed-step driver tying a physics world, a clock and the sim together
//! - `platform`: Clock and input adapters, plus the browser bindings on wasm32
//! - `settings`: Tunable parameters and slider input validation

pub mod game;
pub mod platform;
pub mod settings;
pub mod sim;

pub use game::Game;
pub use settings::{RackShape, Settings};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep in milliseconds (matches Matter's default 60 Hz delta)
    pub const SIM_DT_MS: f64 = 1000.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest frame delta accepted before clamping (ms)
    pub const MAX_FRAME_MS: f64 = 100.0;

    /// Thickness of ground and side walls (px)
    pub const WALL_THICKNESS: f32 = 40.0;
    /// Width of each gutter sensor (px)
    pub const GUTTER_WIDTH: f32 = 40.0;
    /// Preferred lane width; shrinks to fit narrow viewports (px)
    pub const LANE_WIDTH: f32 = 360.0;

    /// Pin defaults
    pub const PIN_RADIUS: f32 = 15.0;
    pub const PIN_SPACING_FACTOR: f32 = 2.5;
    pub const PIN_RESTITUTION: f32 = 0.5;

    /// Ball defaults
    pub const BALL_RADIUS: f32 = 20.0;
    pub const BALL_RESTITUTION: f32 = 0.5;
    /// Distance of the ball's start point above the bottom edge (px)
    pub const BALL_START_OFFSET: f32 = 60.0;

    /// Absolute pin angle (radians) past which a pin counts as knocked
    pub const TILT_THRESHOLD: f32 = 0.7;
}

/// Scale `vel` down to `max` if it is faster, keeping its direction.
#[inline]
pub fn clamp_speed(vel: Vec2, max: f32) -> Vec2 {
    let speed = vel.length();
    if speed > max && speed > 0.0 {
        vel * (max / speed)
    } else {
        vel
    }
}

/// True when both velocity components are within `threshold` of zero.
#[inline]
pub fn is_at_rest(vel: Vec2, threshold: f32) -> bool {
    vel.x.abs() <= threshold && vel.y.abs() <= threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_speed_preserves_direction() {
        let clamped = clamp_speed(Vec2::new(24.0, 32.0), 20.0);
        assert!((clamped.length() - 20.0).abs() < 1e-4);
        assert!((clamped.x / clamped.y - 24.0 / 32.0).abs() < 1e-5);
    }

    #[test]
    fn test_clamp_speed_leaves_slow_ball_alone() {
        let vel = Vec2::new(3.0, -4.0);
        assert_eq!(clamp_speed(vel, 20.0), vel);
        assert_eq!(clamp_speed(Vec2::ZERO, 0.0), Vec2::ZERO);
    }

    #[test]
    fn test_rest_threshold_is_inclusive() {
        assert!(is_at_rest(Vec2::new(0.1, -0.1), 0.1));
        assert!(!is_at_rest(Vec2::new(0.0, 0.11), 0.1));
    }
}
