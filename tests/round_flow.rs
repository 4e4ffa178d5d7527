//! Whole-round scenarios driven through `Game` with a scripted world.
//!
//! The scripted world does no physics: tests set velocities and angles
//! directly, the way the engine would report them.

use std::collections::HashMap;

use glam::Vec2;
use proptest::prelude::*;

use nine_pin::platform::ManualClock;
use nine_pin::settings::SliderField;
use nine_pin::sim::{
    BodyId, BodyState, CircleBody, CircleRole, CollisionEvent, EndReason, Layout, PhysicsWorld,
    RoundPhase, RoundState, StaticBody, StaticKind, TickInput, Viewport, WorldSnapshot, tick,
};
use nine_pin::{Game, Settings, clamp_speed};

#[derive(Debug, Clone)]
enum Shape {
    Static(StaticBody),
    Circle(CircleBody),
}

#[derive(Debug, Clone)]
struct Body {
    shape: Shape,
    state: BodyState,
}

#[derive(Debug, Default)]
struct ScriptedWorld {
    bodies: HashMap<BodyId, Body>,
    collisions: Vec<CollisionEvent>,
    forces: Vec<(BodyId, Vec2)>,
    steps: u32,
}

impl ScriptedWorld {
    fn set_angle(&mut self, id: BodyId, angle: f32) {
        if let Some(body) = self.bodies.get_mut(&id) {
            body.state.angle = angle;
        }
    }

    fn push_collision(&mut self, a: BodyId, b: BodyId) {
        self.collisions.push(CollisionEvent::new(a, b));
    }

    fn circles(&self, role: CircleRole) -> Vec<(BodyId, BodyState)> {
        let mut found: Vec<_> = self
            .bodies
            .iter()
            .filter_map(|(id, body)| match &body.shape {
                Shape::Circle(c) if c.role == role => Some((*id, body.state)),
                _ => None,
            })
            .collect();
        found.sort_by_key(|(id, _)| *id);
        found
    }

    fn statics(&self) -> usize {
        self.bodies
            .values()
            .filter(|b| matches!(b.shape, Shape::Static(_)))
            .count()
    }
}

impl PhysicsWorld for ScriptedWorld {
    fn add_static(&mut self, id: BodyId, body: &StaticBody) {
        self.bodies.insert(
            id,
            Body {
                shape: Shape::Static(*body),
                state: BodyState::at(body.rect.center),
            },
        );
    }

    fn add_circle(&mut self, id: BodyId, circle: &CircleBody) {
        self.bodies.insert(
            id,
            Body {
                shape: Shape::Circle(*circle),
                state: BodyState::at(circle.pos),
            },
        );
    }

    fn remove(&mut self, id: BodyId) {
        self.bodies.remove(&id);
    }

    fn body(&self, id: BodyId) -> Option<BodyState> {
        self.bodies.get(&id).map(|b| b.state)
    }

    fn set_position(&mut self, id: BodyId, pos: Vec2) {
        if let Some(body) = self.bodies.get_mut(&id) {
            body.state.pos = pos;
        }
    }

    fn set_velocity(&mut self, id: BodyId, vel: Vec2) {
        if let Some(body) = self.bodies.get_mut(&id) {
            body.state.vel = vel;
        }
    }

    fn set_angular_velocity(&mut self, id: BodyId, angular_vel: f32) {
        if let Some(body) = self.bodies.get_mut(&id) {
            body.state.angular_vel = angular_vel;
        }
    }

    fn apply_force(&mut self, id: BodyId, force: Vec2) {
        self.forces.push((id, force));
    }

    fn step(&mut self, _dt_ms: f64) {
        self.steps += 1;
    }

    fn drain_collisions(&mut self) -> Vec<CollisionEvent> {
        std::mem::take(&mut self.collisions)
    }
}

type TestGame = Game<ScriptedWorld, ManualClock>;

fn new_game() -> TestGame {
    Game::new(
        ScriptedWorld::default(),
        ManualClock::new(0.0),
        Viewport::new(800.0, 600.0),
        Settings::default(),
    )
}

fn ball_id(game: &TestGame) -> BodyId {
    game.state().ball.id
}

fn pin_ids(game: &TestGame) -> Vec<BodyId> {
    game.state().pins.iter().map(|p| p.id).collect()
}

fn assert_fresh_round(game: &TestGame) {
    let state = game.state();
    let layout = game.layout();
    assert_eq!(state.phase, RoundPhase::Idle);
    assert_eq!(state.score, 0);
    assert!(!state.ball_launched && !state.game_over && !state.gutter_hit);
    assert!(state.pending.is_none());

    let ball = game.world().body(state.ball.id).unwrap();
    assert_eq!(ball.pos, layout.ball_start);
    assert_eq!(ball.vel, Vec2::ZERO);
    assert_eq!(ball.angular_vel, 0.0);

    let pins = game.world().circles(CircleRole::Pin);
    assert_eq!(pins.len(), layout.rack.len());
    assert_eq!(state.pins.len(), layout.rack.len());
    for (pin, rack) in state.pins.iter().zip(&layout.rack) {
        assert!(!pin.scored);
        assert_eq!(pin.slot, rack.slot);
        assert_eq!(game.world().body(pin.id).unwrap().pos, rack.pos);
    }
}

#[test]
fn setup_registers_every_body() {
    let game = new_game();
    assert_eq!(game.world().statics(), 6);
    assert_eq!(game.world().circles(CircleRole::Ball).len(), 1);
    assert_fresh_round(&game);
}

#[test]
fn rest_round_reports_knocked_pins_then_resets() {
    let mut game = new_game();
    let ball = ball_id(&game);
    let pins = pin_ids(&game);

    game.world_mut().set_velocity(ball, Vec2::new(0.0, -12.0));
    assert_eq!(game.step(), None);
    assert_eq!(game.state().phase, RoundPhase::InPlay);

    game.world_mut().set_angle(pins[0], 1.0);
    game.world_mut().set_angle(pins[2], -0.9);
    game.clock_mut().advance(16.0);
    assert_eq!(game.step(), None);
    assert_eq!(game.state().score, 2);
    assert!(game.world().body(pins[0]).is_none());
    assert!(game.world().body(pins[2]).is_none());

    // Everything stops
    game.world_mut().set_velocity(ball, Vec2::ZERO);
    game.clock_mut().advance(16.0);
    assert_eq!(game.step(), None);
    assert_eq!(game.state().phase, RoundPhase::RoundEnding);

    game.clock_mut().advance(499.0);
    assert_eq!(game.step(), None);

    game.clock_mut().advance(1.0);
    let report = game.step().expect("report after the rest delay");
    assert_eq!(report.score, 2);
    assert_eq!(report.reason, EndReason::Rest);
    assert_eq!(report.message(), "Score: 2");
    assert_eq!(game.state().phase, RoundPhase::Reporting);

    // Stalled until acknowledged
    let steps = game.world().steps;
    assert_eq!(game.frame(100.0), Some(report));
    assert_eq!(game.world().steps, steps);

    game.acknowledge_report();
    assert_eq!(game.state().round, 2);
    assert_fresh_round(&game);
    for id in pins {
        assert!(game.world().body(id).is_none(), "old pin {id:?} left behind");
    }
}

#[test]
fn gutter_ball_reports_zero() {
    let mut game = new_game();
    let ball = ball_id(&game);
    let pins = pin_ids(&game);
    let gutter = game.state().static_id(StaticKind::LeftGutter).unwrap();

    game.world_mut().set_velocity(ball, Vec2::new(-6.0, -10.0));
    game.step();
    game.world_mut().set_angle(pins[1], 1.4);
    game.world_mut().push_collision(ball, gutter);
    game.step();
    assert_eq!(game.state().score, 1);
    assert!(game.state().gutter_hit);

    game.clock_mut().advance(100.0);
    let report = game.step().expect("gutter report");
    assert_eq!(report.score, 0);
    assert_eq!(report.message(), "Gutter! Score: 0");

    game.acknowledge_report();
    assert_fresh_round(&game);
}

#[test]
fn frame_runs_fixed_steps() {
    let mut game = new_game();
    assert_eq!(game.frame(5.0), None);
    assert_eq!(game.world().steps, 0);
    assert_eq!(game.frame(30.0), None);
    assert_eq!(game.world().steps, 2);
    // Long frames are capped
    game.frame(10_000.0);
    assert!(game.world().steps <= 2 + nine_pin::consts::MAX_SUBSTEPS);
}

#[test]
fn drag_release_launches_with_spin() {
    let mut game = new_game();
    assert!(game.apply_input(SliderField::Spin, "0.2"));
    let ball = ball_id(&game);
    let start = game.layout().ball_start;

    game.pointer_down(start + Vec2::new(5.0, 0.0));
    assert!(game.is_dragging());
    game.clock_mut().advance(nine_pin::consts::SIM_DT_MS);
    game.pointer_move(start + Vec2::new(5.0, -15.0));
    game.pointer_up();
    assert!(!game.is_dragging());

    let body = game.world().body(ball).unwrap();
    assert_eq!(body.vel, Vec2::new(0.0, -15.0));
    assert_eq!(body.angular_vel, 0.2);

    game.step();
    assert!(game.state().ball_launched);
    // Spinning fast ball gets a hook force
    assert_eq!(game.world().forces.len(), 1);
    assert_eq!(game.world().forces[0].0, ball);
}

#[test]
fn pointer_away_from_ball_does_nothing() {
    let mut game = new_game();
    game.pointer_down(Vec2::new(10.0, 10.0));
    assert!(!game.is_dragging());
}

#[test]
fn rejected_slider_input_keeps_previous_value() {
    let mut game = new_game();
    assert!(!game.apply_input(SliderField::MaxVelocity, "abc"));
    assert_eq!(game.settings().max_velocity, 20.0);
    assert!(game.apply_input(SliderField::MaxVelocity, "8"));

    let ball = ball_id(&game);
    game.world_mut().set_velocity(ball, Vec2::new(0.0, -16.0));
    game.step();
    assert_eq!(game.world().body(ball).unwrap().vel, Vec2::new(0.0, -8.0));
}

#[test]
fn manual_reset_mid_round() {
    let mut game = new_game();
    let ball = ball_id(&game);
    let pins = pin_ids(&game);
    game.world_mut().set_velocity(ball, Vec2::new(0.0, -10.0));
    game.world_mut().set_angle(pins[3], 1.0);
    game.step();
    assert_eq!(game.state().score, 1);

    game.reset();
    assert_fresh_round(&game);
    assert_eq!(game.state().round, 2);
}

#[test]
fn manual_reset_ignored_while_round_ending() {
    let mut game = new_game();
    let ball = ball_id(&game);
    game.world_mut().set_velocity(ball, Vec2::new(0.0, -10.0));
    game.step();
    game.world_mut().set_velocity(ball, Vec2::ZERO);
    game.step();
    assert_eq!(game.state().phase, RoundPhase::RoundEnding);

    game.reset();
    assert_eq!(game.state().phase, RoundPhase::RoundEnding);
    assert_eq!(game.state().round, 1);
}

#[test]
fn diamond_rack_has_nine_pins() {
    let settings = Settings {
        rack: nine_pin::RackShape::Diamond,
        ..Settings::default()
    };
    let game = Game::new(
        ScriptedWorld::default(),
        ManualClock::new(0.0),
        Viewport::new(800.0, 600.0),
        settings,
    );
    assert_eq!(game.state().rack_size, 9);
    assert_fresh_round(&game);
}

fn fixture() -> (RoundState, Settings) {
    let settings = Settings::default();
    let layout = Layout::build(Viewport::new(800.0, 600.0), &settings);
    (RoundState::new(&layout, &settings), settings)
}

proptest! {
    #[test]
    fn score_never_exceeds_rack(
        angles in prop::collection::vec(prop::collection::vec(-3.0f32..3.0, 6), 1..20)
    ) {
        let (mut state, settings) = fixture();
        let all_pins: Vec<_> = state.pins.iter().map(|p| p.id).collect();
        let mut knocked = std::collections::HashSet::new();

        for (t, frame) in angles.iter().enumerate() {
            let snapshot = WorldSnapshot {
                ball: BodyState { vel: Vec2::new(0.0, -10.0), ..BodyState::default() },
                pins: state
                    .pins
                    .iter()
                    .map(|p| {
                        let i = all_pins.iter().position(|id| *id == p.id).unwrap();
                        (p.id, BodyState { angle: frame[i], ..BodyState::default() })
                    })
                    .collect(),
            };
            for (i, angle) in frame.iter().enumerate() {
                if angle.abs() > settings.tilt_threshold && state.pins.iter().any(|p| p.id == all_pins[i]) {
                    knocked.insert(all_pins[i]);
                }
            }
            let input = TickInput { now_ms: t as f64, snapshot, collisions: Vec::new() };
            tick(&mut state, &input, &settings);

            prop_assert!(state.score as usize <= state.rack_size);
            prop_assert_eq!(state.score as usize, knocked.len());
            prop_assert_eq!(state.pins.len() + knocked.len(), state.rack_size);
        }
    }

    #[test]
    fn clamp_caps_speed_and_keeps_direction(
        vx in -100.0f32..100.0,
        vy in -100.0f32..100.0,
        max in 0.5f32..50.0,
    ) {
        let vel = Vec2::new(vx, vy);
        let clamped = clamp_speed(vel, max);
        prop_assert!(clamped.length() <= max + 1e-3);
        // Parallel and same orientation
        prop_assert!(vel.perp_dot(clamped).abs() <= 1e-3 * vel.length().max(1.0));
        prop_assert!(vel.dot(clamped) >= 0.0);
        if vel.length() <= max {
            prop_assert_eq!(clamped, vel);
        }
    }
}
