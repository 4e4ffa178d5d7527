//! Static lane geometry and pin rack placement
//!
//! Screen coordinates: origin top-left, y grows downward. The ball starts near
//! the bottom edge and rolls up the lane toward the rack.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::settings::{RackShape, Settings};

/// Canvas size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn center_x(&self) -> f32 {
        self.width / 2.0
    }
}

/// Axis-aligned rectangle described by centre and full size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub center: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub fn new(center: Vec2, size: Vec2) -> Self {
        Self { center, size }
    }

    pub fn left(&self) -> f32 {
        self.center.x - self.size.x / 2.0
    }

    pub fn right(&self) -> f32 {
        self.center.x + self.size.x / 2.0
    }

    pub fn top(&self) -> f32 {
        self.center.y - self.size.y / 2.0
    }

    pub fn bottom(&self) -> f32 {
        self.center.y + self.size.y / 2.0
    }

    pub fn contains(&self, point: Vec2) -> bool {
        (self.left()..=self.right()).contains(&point.x)
            && (self.top()..=self.bottom()).contains(&point.y)
    }
}

/// Static bodies registered with the physics world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StaticKind {
    Ground,
    LeftWall,
    RightWall,
    TopSensor,
    LeftGutter,
    RightGutter,
}

impl StaticKind {
    /// Sensors report contacts but never push bodies
    pub fn is_sensor(&self) -> bool {
        matches!(
            self,
            StaticKind::TopSensor | StaticKind::LeftGutter | StaticKind::RightGutter
        )
    }

    pub fn is_gutter(&self) -> bool {
        matches!(self, StaticKind::LeftGutter | StaticKind::RightGutter)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StaticBody {
    pub kind: StaticKind,
    pub rect: Rect,
}

/// Row and position-within-row of a pin in the rack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RackSlot {
    pub row: u32,
    pub col: u32,
}

/// Triangle rack slot for a flat pin index (rows of 1, 2, 3...)
pub fn triangle_slot(index: u32) -> RackSlot {
    let i = u64::from(index);
    let mut row = ((((8 * i + 1) as f64).sqrt() - 1.0) / 2.0).floor() as u64;
    // Float rounding can land one row off for large indices
    while row * (row + 1) / 2 > i {
        row -= 1;
    }
    while (row + 1) * (row + 2) / 2 <= i {
        row += 1;
    }
    RackSlot {
        row: row as u32,
        col: (i - row * (row + 1) / 2) as u32,
    }
}

fn rack_slots(shape: RackShape) -> Vec<RackSlot> {
    match shape {
        RackShape::Triangle { .. } => (0..shape.pin_count() as u32).map(triangle_slot).collect(),
        RackShape::Diamond => shape
            .row_lengths()
            .into_iter()
            .enumerate()
            .flat_map(|(row, len)| {
                (0..len).map(move |col| RackSlot {
                    row: row as u32,
                    col: col as u32,
                })
            })
            .collect(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RackPosition {
    pub slot: RackSlot,
    pub pos: Vec2,
}

/// Deterministic pin positions for a rack shape.
///
/// Row `r` sits `r * spacing` above `origin`; pins in a row are centred on
/// `origin.x` with `spacing` between neighbours.
pub fn rack_positions(shape: RackShape, origin: Vec2, spacing: f32) -> Vec<RackPosition> {
    let rows = shape.row_lengths();
    rack_slots(shape)
        .into_iter()
        .map(|slot| {
            let len = rows.get(slot.row as usize).copied().unwrap_or(1);
            let half = (len as f32 - 1.0) / 2.0;
            RackPosition {
                slot,
                pos: Vec2::new(
                    origin.x + (slot.col as f32 - half) * spacing,
                    origin.y - slot.row as f32 * spacing,
                ),
            }
        })
        .collect()
}

/// Everything the physics world needs for a given viewport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub viewport: Viewport,
    /// Playable lane between the gutters
    pub lane: Rect,
    pub statics: Vec<StaticBody>,
    pub rack: Vec<RackPosition>,
    pub ball_start: Vec2,
}

impl Layout {
    pub fn build(viewport: Viewport, settings: &Settings) -> Self {
        let w = viewport.width;
        let h = viewport.height;
        let t = settings.wall_thickness;
        let cx = viewport.center_x();

        // Never narrower than the ball, or the gutters would swallow the start
        let fit = w - 2.0 * (t + settings.gutter_width);
        let min_lane = 2.0 * settings.ball_radius;
        if fit < min_lane {
            log::warn!("Viewport {w}x{h} too narrow for the lane, using {min_lane}px");
        }
        let lane_width = settings.lane_width.min(fit).max(min_lane);
        let lane = Rect::new(Vec2::new(cx, h / 2.0), Vec2::new(lane_width, h));

        let gutter_size = Vec2::new(settings.gutter_width, h);
        let gutter_offset = lane_width / 2.0 + settings.gutter_width / 2.0;

        let mut statics = vec![
            StaticBody {
                kind: StaticKind::Ground,
                rect: Rect::new(Vec2::new(cx, h - t / 2.0), Vec2::new(w, t)),
            },
            StaticBody {
                kind: StaticKind::LeftWall,
                rect: Rect::new(Vec2::new(0.0, h / 2.0), Vec2::new(t, h)),
            },
            StaticBody {
                kind: StaticKind::RightWall,
                rect: Rect::new(Vec2::new(w, h / 2.0), Vec2::new(t, h)),
            },
            StaticBody {
                kind: StaticKind::LeftGutter,
                rect: Rect::new(Vec2::new(cx - gutter_offset, h / 2.0), gutter_size),
            },
            StaticBody {
                kind: StaticKind::RightGutter,
                rect: Rect::new(Vec2::new(cx + gutter_offset, h / 2.0), gutter_size),
            },
        ];
        if settings.top_sensor {
            statics.push(StaticBody {
                kind: StaticKind::TopSensor,
                rect: Rect::new(Vec2::new(cx, t / 4.0), Vec2::new(w, t / 2.0)),
            });
        }

        let rack = rack_positions(
            settings.rack,
            Vec2::new(cx, h / 4.0),
            settings.pin_spacing(),
        );
        let stray = rack.iter().filter(|p| !lane.contains(p.pos)).count();
        if stray > 0 {
            log::warn!("{stray} pins fall outside the {lane_width:.0}px lane");
        }

        Self {
            viewport,
            lane,
            statics,
            rack,
            ball_start: Vec2::new(cx, h - settings.ball_start_offset),
        }
    }
}
