//! Per-step round logic
//!
//! Runs once after every physics step. Reads the world snapshot and the
//! collisions that started during the step, updates the round state and
//! returns the commands the host must apply to the world or the UI.

use glam::Vec2;

use super::event::{
    BodyState, CircleBody, CircleRole, Command, CollisionEvent, RoundReport, TickInput,
};
use super::layout::{Layout, StaticKind};
use super::state::{BodyId, BodyRole, EndReason, PendingReport, RoundPhase, RoundState};
use crate::settings::Settings;
use crate::{clamp_speed, is_at_rest};

/// Advance the round by one physics step
pub fn tick(state: &mut RoundState, input: &TickInput, settings: &Settings) -> Vec<Command> {
    let mut commands = Vec::new();

    // UI is stalled on the report until it is acknowledged
    if state.phase == RoundPhase::Reporting {
        return commands;
    }

    // Fire the deferred report once its time has come
    if let Some(pending) = state.pending {
        if input.now_ms >= pending.due_ms {
            state.pending = None;
            state.phase = RoundPhase::Reporting;
            let report = make_report(state, pending.reason);
            log::info!(
                "Round {} over ({:?}): {}/{} pins",
                report.round,
                report.reason,
                report.score,
                report.rack_size
            );
            commands.push(Command::Report(report));
            return commands;
        }
    }

    let ball_id = state.ball.id;
    let mut ball = input.snapshot.ball;

    // --- VELOCITY CLAMP ---
    let clamped = clamp_speed(ball.vel, settings.max_velocity);
    if clamped != ball.vel {
        commands.push(Command::SetVelocity {
            id: ball_id,
            vel: clamped,
        });
        ball.vel = clamped;
    }

    let speed = ball.speed();

    // --- LAUNCH DETECTION ---
    if !state.ball_launched && speed > settings.launch_epsilon {
        state.ball_launched = true;
        if state.phase == RoundPhase::Idle {
            state.phase = RoundPhase::InPlay;
        }
        log::debug!("Ball launched at speed {speed:.2}");
    }

    // --- COLLISIONS ---
    for event in &input.collisions {
        handle_collision(state, event, input.now_ms, settings, &mut commands);
    }

    // --- SPIN CURVE ---
    if state.ball_launched
        && speed > settings.spin_speed_threshold
        && ball.angular_vel.abs() > settings.spin_angular_threshold
    {
        commands.push(Command::ApplyForce {
            id: ball_id,
            force: spin_force(&ball, settings.spin_force_coefficient),
        });
    }

    // --- PIN SCORING ---
    score_tilted_pins(state, input, settings, &mut commands);

    // --- ROUND END ---
    if state.ball_launched && !state.game_over {
        if state.pins.is_empty() {
            end_round(state, EndReason::Cleared, input.now_ms + settings.clear_delay_ms);
        } else if is_at_rest(ball.vel, settings.rest_threshold)
            && state.pins.iter().all(|pin| {
                input
                    .snapshot
                    .pin(pin.id)
                    .is_none_or(|body| is_at_rest(body.vel, settings.rest_threshold))
            })
        {
            end_round(state, EndReason::Rest, input.now_ms + settings.rest_delay_ms);
        }
    }

    commands
}

/// Lateral hook force for a spinning ball, perpendicular to its travel
pub fn spin_force(ball: &BodyState, coefficient: f32) -> Vec2 {
    ball.vel.normalize_or_zero().perp() * ball.angular_vel * coefficient
}

fn handle_collision(
    state: &mut RoundState,
    event: &CollisionEvent,
    now_ms: f64,
    settings: &Settings,
    commands: &mut Vec<Command>,
) {
    // Gutter: immediate zero-score round end, flagged once per round
    if let Some(other) = event.other(state.ball.id) {
        if state.is_gutter(other) && !state.gutter_hit && !state.game_over {
            state.gutter_hit = true;
            end_round(state, EndReason::Gutter, now_ms + settings.gutter_delay_ms);
        }
    }

    // Top sensor arrests whatever touches it without ending the round
    if let Some(top) = state.static_id(StaticKind::TopSensor) {
        if let Some(other) = event.other(top) {
            if matches!(state.role_of(other), Some(BodyRole::Ball | BodyRole::Pin)) {
                log::debug!("Arresting body {} at top sensor", other.0);
                commands.extend(arrest(other));
            }
        }
    }
}

fn score_tilted_pins(
    state: &mut RoundState,
    input: &TickInput,
    settings: &Settings,
    commands: &mut Vec<Command>,
) {
    let mut knocked = 0;
    for pin in state.pins.iter_mut().filter(|p| !p.scored) {
        let Some(body) = input.snapshot.pin(pin.id) else {
            continue;
        };
        if body.angle.abs() > settings.tilt_threshold {
            pin.scored = true;
            knocked += 1;
            commands.push(Command::RemoveBody(pin.id));
            log::debug!(
                "Pin ({}, {}) down at angle {:.2}",
                pin.slot.row,
                pin.slot.col,
                body.angle
            );
        }
    }
    if knocked > 0 {
        state.score += knocked;
        state.pins.retain(|p| !p.scored);
    }
}

fn end_round(state: &mut RoundState, reason: EndReason, due_ms: f64) {
    state.game_over = true;
    state.phase = RoundPhase::RoundEnding;
    state.pending = Some(PendingReport { due_ms, reason });
    log::debug!(
        "Round {} ending ({reason:?}) with {} pins down, report at {due_ms:.0} ms",
        state.round,
        state.pins_down()
    );
}

fn make_report(state: &RoundState, reason: EndReason) -> RoundReport {
    let score = if reason == EndReason::Gutter {
        0
    } else {
        state.score
    };
    RoundReport {
        round: state.round,
        score,
        rack_size: state.rack_size as u32,
        reason,
    }
}

fn arrest(id: BodyId) -> [Command; 2] {
    [
        Command::SetVelocity { id, vel: Vec2::ZERO },
        Command::SetAngularVelocity {
            id,
            angular_vel: 0.0,
        },
    ]
}

/// Commands that create every body of a freshly built round
pub fn spawn_world(state: &RoundState, layout: &Layout, settings: &Settings) -> Vec<Command> {
    let mut commands: Vec<Command> = state
        .statics
        .iter()
        .zip(&layout.statics)
        .map(|((id, _), body)| Command::SpawnStatic { id: *id, body: *body })
        .collect();

    commands.push(Command::SpawnCircle {
        id: state.ball.id,
        circle: CircleBody {
            role: CircleRole::Ball,
            pos: layout.ball_start,
            radius: state.ball.radius,
            restitution: state.ball.restitution,
            air_friction: settings.ball_air_friction,
        },
    });
    commands.extend(spawn_pins(state, settings.pin_air_friction));
    commands
}

fn spawn_pins(state: &RoundState, air_friction: f32) -> impl Iterator<Item = Command> + '_ {
    state.pins.iter().map(move |pin| Command::SpawnCircle {
        id: pin.id,
        circle: CircleBody {
            role: CircleRole::Pin,
            pos: pin.spawn_pos,
            radius: pin.radius,
            restitution: pin.restitution,
            air_friction,
        },
    })
}

/// Reset after the player acknowledged the report
pub fn finish_report(state: &mut RoundState, layout: &Layout, settings: &Settings) -> Vec<Command> {
    if state.phase != RoundPhase::Reporting {
        log::debug!("No report to finish in phase {:?}", state.phase);
        return Vec::new();
    }
    reset_round(state, layout, settings)
}

/// Reset requested from the UI. Ignored while a round end is pending.
pub fn request_reset(state: &mut RoundState, layout: &Layout, settings: &Settings) -> Vec<Command> {
    if !state.accepts_input() || state.pending.is_some() {
        log::debug!("Reset ignored in phase {:?}", state.phase);
        return Vec::new();
    }
    reset_round(state, layout, settings)
}

/// Start a new round: clear flags, park the ball, set a fresh rack
pub fn reset_round(state: &mut RoundState, layout: &Layout, settings: &Settings) -> Vec<Command> {
    let mut commands: Vec<Command> = state
        .pins
        .iter()
        .map(|pin| Command::RemoveBody(pin.id))
        .collect();

    state.score = 0;
    state.gutter_hit = false;
    state.game_over = false;
    state.ball_launched = false;
    state.pending = None;
    state.phase = RoundPhase::Idle;
    state.round += 1;

    let ball_id = state.ball.id;
    commands.push(Command::SetPosition {
        id: ball_id,
        pos: layout.ball_start,
    });
    commands.extend(arrest(ball_id));

    state.set_rack(layout, settings);
    commands.extend(spawn_pins(state, settings.pin_air_friction));

    log::info!("Round {} ready with {} pins", state.round, state.rack_size);
    commands
}
