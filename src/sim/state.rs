//! Round state and core bowling types
//!
//! The physics engine owns positions and velocities; this module only keeps
//! what the round logic needs to remember between ticks.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::layout::{Layout, RackSlot, StaticKind};
use crate::settings::Settings;

/// Identifier of a body in the physics world, allocated by the round state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyId(pub u32);

/// Current phase of a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundPhase {
    /// Rack set, ball waiting at the start point
    Idle,
    /// Ball has been launched, round not decided yet
    InPlay,
    /// Round is over, report scheduled
    RoundEnding,
    /// Report handed to the UI, waiting for acknowledgement before reset
    Reporting,
}

/// Why a round ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndReason {
    /// Ball touched a gutter sensor
    Gutter,
    /// Ball and all remaining pins came to rest
    Rest,
    /// Every pin was knocked
    Cleared,
}

/// The bowling ball. Repositioned on reset, never recreated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ball {
    pub id: BodyId,
    pub radius: f32,
    pub restitution: f32,
}

/// A pin still standing in the rack
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pin {
    pub id: BodyId,
    pub slot: RackSlot,
    /// Where the pin was placed when the rack was set
    pub spawn_pos: Vec2,
    pub radius: f32,
    pub restitution: f32,
    /// Set once when the pin is knocked; guards against double scoring
    pub scored: bool,
}

/// Deferred end-of-round report (single slot)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PendingReport {
    /// Clock time (ms) at which the report fires
    pub due_ms: f64,
    pub reason: EndReason,
}

/// What a body id refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyRole {
    Ball,
    Pin,
    Static(StaticKind),
}

/// Complete round state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundState {
    /// Round counter (1-based)
    pub round: u32,
    /// Pins knocked this round
    pub score: u32,
    pub gutter_hit: bool,
    pub game_over: bool,
    pub ball_launched: bool,
    pub phase: RoundPhase,
    pub ball: Ball,
    /// Pins still in the rack (scored pins are dropped)
    pub pins: Vec<Pin>,
    /// Number of pins in a full rack
    pub rack_size: usize,
    pub pending: Option<PendingReport>,
    /// Static bodies and the ids they were registered under
    pub statics: Vec<(BodyId, StaticKind)>,
    /// Next body ID
    next_id: u32,
}

impl RoundState {
    /// Allocate ids for every body described by `layout` and set a full rack
    pub fn new(layout: &Layout, settings: &Settings) -> Self {
        let mut state = Self {
            round: 1,
            score: 0,
            gutter_hit: false,
            game_over: false,
            ball_launched: false,
            phase: RoundPhase::Idle,
            ball: Ball {
                id: BodyId(0),
                radius: settings.ball_radius,
                restitution: settings.ball_restitution,
            },
            pins: Vec::new(),
            rack_size: layout.rack.len(),
            pending: None,
            statics: Vec::new(),
            next_id: 1,
        };

        state.statics = layout
            .statics
            .iter()
            .map(|s| (state.next_body_id(), s.kind))
            .collect();
        state.ball.id = state.next_body_id();
        state.set_rack(layout, settings);

        state
    }

    /// Allocate a new body ID
    pub fn next_body_id(&mut self) -> BodyId {
        let id = BodyId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Replace the pin collection with a fresh rack (new ids)
    pub fn set_rack(&mut self, layout: &Layout, settings: &Settings) {
        self.pins.clear();
        for rp in &layout.rack {
            let id = self.next_body_id();
            self.pins.push(Pin {
                id,
                slot: rp.slot,
                spawn_pos: rp.pos,
                radius: settings.pin_radius,
                restitution: settings.pin_restitution,
                scored: false,
            });
        }
        self.rack_size = self.pins.len();
    }

    pub fn static_id(&self, kind: StaticKind) -> Option<BodyId> {
        self.statics
            .iter()
            .find(|(_, k)| *k == kind)
            .map(|(id, _)| *id)
    }

    pub fn role_of(&self, id: BodyId) -> Option<BodyRole> {
        if id == self.ball.id {
            return Some(BodyRole::Ball);
        }
        if self.pins.iter().any(|p| p.id == id) {
            return Some(BodyRole::Pin);
        }
        self.statics
            .iter()
            .find(|(sid, _)| *sid == id)
            .map(|(_, kind)| BodyRole::Static(*kind))
    }

    pub fn is_gutter(&self, id: BodyId) -> bool {
        matches!(self.role_of(id), Some(BodyRole::Static(kind)) if kind.is_gutter())
    }

    /// Pins knocked so far this round, counting by what is missing from the rack
    pub fn pins_down(&self) -> usize {
        self.rack_size - self.pins.iter().filter(|p| !p.scored).count()
    }

    /// True while the round still accepts player input
    pub fn accepts_input(&self) -> bool {
        matches!(self.phase, RoundPhase::Idle | RoundPhase::InPlay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::layout::Viewport;

    fn state() -> (RoundState, Layout) {
        let settings = Settings::default();
        let layout = Layout::build(Viewport::new(800.0, 600.0), &settings);
        (RoundState::new(&layout, &settings), layout)
    }

    #[test]
    fn test_new_state_is_idle_with_full_rack() {
        let (state, layout) = state();
        assert_eq!(state.phase, RoundPhase::Idle);
        assert_eq!(state.round, 1);
        assert_eq!(state.score, 0);
        assert!(!state.ball_launched && !state.game_over && !state.gutter_hit);
        assert_eq!(state.pins.len(), layout.rack.len());
        assert_eq!(state.rack_size, 6);
        assert_eq!(state.pins_down(), 0);
    }

    #[test]
    fn test_ids_are_unique() {
        let (state, _) = state();
        let mut ids: Vec<_> = state.statics.iter().map(|(id, _)| *id).collect();
        ids.push(state.ball.id);
        ids.extend(state.pins.iter().map(|p| p.id));
        let count = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), count);
    }

    #[test]
    fn test_role_lookup() {
        let (state, _) = state();
        assert_eq!(state.role_of(state.ball.id), Some(BodyRole::Ball));
        assert_eq!(state.role_of(state.pins[0].id), Some(BodyRole::Pin));
        let gutter = state.static_id(StaticKind::LeftGutter).unwrap();
        assert!(state.is_gutter(gutter));
        let wall = state.static_id(StaticKind::LeftWall).unwrap();
        assert!(!state.is_gutter(wall));
        assert_eq!(state.role_of(BodyId(9999)), None);
    }

    #[test]
    fn test_set_rack_allocates_fresh_ids() {
        let (mut state, layout) = state();
        let old: Vec<_> = state.pins.iter().map(|p| p.id).collect();
        state.set_rack(&layout, &Settings::default());
        assert!(state.pins.iter().all(|p| !old.contains(&p.id)));
    }
}
