//! Fixed-step driver
//!
//! Owns the physics world, the clock and the round state, and runs one round
//! tick after every physics step.

use glam::Vec2;

use crate::consts::{MAX_FRAME_MS, MAX_SUBSTEPS, SIM_DT_MS};
use crate::platform::input::DragController;
use crate::platform::time::Clock;
use crate::settings::{Settings, SliderField};
use crate::sim::{
    Command, Layout, PhysicsWorld, RoundPhase, RoundReport, RoundState, TickInput, Viewport,
    apply_commands, finish_report, request_reset, snapshot, spawn_world, tick,
};

/// Game instance holding all state
pub struct Game<W: PhysicsWorld, C: Clock> {
    world: W,
    clock: C,
    settings: Settings,
    layout: Layout,
    state: RoundState,
    drag: DragController,
    accumulator: f64,
    /// Report issued but not yet acknowledged
    report: Option<RoundReport>,
}

impl<W: PhysicsWorld, C: Clock> Game<W, C> {
    /// Build the layout and register every body with `world`
    pub fn new(mut world: W, clock: C, viewport: Viewport, settings: Settings) -> Self {
        let layout = Layout::build(viewport, &settings);
        let state = RoundState::new(&layout, &settings);
        apply_commands(&mut world, spawn_world(&state, &layout, &settings));
        log::info!(
            "Lane {:.0}px wide, {} pins, viewport {}x{}",
            layout.lane.size.x,
            state.rack_size,
            viewport.width,
            viewport.height
        );

        Self {
            world,
            clock,
            settings,
            layout,
            state,
            drag: DragController::new(),
            accumulator: 0.0,
            report: None,
        }
    }

    /// Run as many fixed steps as `dt_ms` covers.
    ///
    /// Returns the round report once the round is decided; no further steps
    /// run until [`Game::acknowledge_report`] is called.
    pub fn frame(&mut self, dt_ms: f64) -> Option<RoundReport> {
        if self.report.is_some() {
            return self.report;
        }
        self.accumulator += dt_ms.clamp(0.0, MAX_FRAME_MS);

        let mut substeps = 0;
        while self.accumulator >= SIM_DT_MS && substeps < MAX_SUBSTEPS {
            self.accumulator -= SIM_DT_MS;
            substeps += 1;
            if let Some(report) = self.step() {
                self.accumulator = 0.0;
                return Some(report);
            }
        }
        None
    }

    /// One physics step followed by one round tick
    pub fn step(&mut self) -> Option<RoundReport> {
        if self.state.phase == RoundPhase::Reporting {
            return self.report;
        }
        self.world.step(SIM_DT_MS);

        let input = TickInput {
            now_ms: self.clock.now_ms(),
            snapshot: snapshot(&self.world, &self.state),
            collisions: self.world.drain_collisions(),
        };
        let commands = tick(&mut self.state, &input, &self.settings);
        let report = apply_commands(&mut self.world, commands);
        if report.is_some() {
            self.drag.cancel();
            self.report = report;
        }
        report
    }

    /// The player dismissed the report: start the next round
    pub fn acknowledge_report(&mut self) {
        let commands = finish_report(&mut self.state, &self.layout, &self.settings);
        apply_commands(&mut self.world, commands);
        self.report = None;
    }

    /// Reset button
    pub fn reset(&mut self) {
        let commands = request_reset(&mut self.state, &self.layout, &self.settings);
        if !commands.is_empty() {
            self.drag.cancel();
            self.accumulator = 0.0;
        }
        apply_commands(&mut self.world, commands);
    }

    pub fn pointer_down(&mut self, pointer: Vec2) {
        if !self.state.accepts_input() {
            return;
        }
        let Some(ball) = self.world.body(self.state.ball.id) else {
            return;
        };
        let commands = self.drag.pointer_down(
            pointer,
            self.clock.now_ms(),
            self.state.ball.id,
            &ball,
            self.state.ball.radius,
            &self.settings,
        );
        self.apply_input_commands(commands);
    }

    pub fn pointer_move(&mut self, pointer: Vec2) {
        let commands = self
            .drag
            .pointer_move(pointer, self.clock.now_ms(), self.state.ball.id);
        self.apply_input_commands(commands);
    }

    pub fn pointer_up(&mut self) {
        let commands = self.drag.pointer_up(self.state.ball.id, &self.settings);
        self.apply_input_commands(commands);
    }

    /// Push raw slider text into the settings; false if it was rejected
    pub fn apply_input(&mut self, field: SliderField, raw: &str) -> bool {
        self.settings.apply_input(field, raw)
    }

    fn apply_input_commands(&mut self, commands: Vec<Command>) {
        if !self.state.accepts_input() {
            self.drag.cancel();
            return;
        }
        apply_commands(&mut self.world, commands);
    }

    pub fn state(&self) -> &RoundState {
        &self.state
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    pub fn pending_report(&self) -> Option<RoundReport> {
        self.report
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging()
    }
}
