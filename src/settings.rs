//! Game settings and tunables
//!
//! Everything the UI sliders or an inline JSON block can change lives here.
//! Nothing is persisted; each page load starts from defaults.

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Shape of the pin rack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "lowercase")]
pub enum RackShape {
    /// Rows of 1, 2, 3... pins, head pin nearest the ball
    Triangle { rows: u32 },
    /// Classic nine-pin diamond: rows of 1, 2, 3, 2, 1
    Diamond,
}

impl Default for RackShape {
    fn default() -> Self {
        RackShape::Triangle { rows: 3 }
    }
}

impl RackShape {
    /// Number of pins in each row, head row first
    pub fn row_lengths(&self) -> Vec<usize> {
        match *self {
            RackShape::Triangle { rows } => (1..=rows as usize).collect(),
            RackShape::Diamond => vec![1, 2, 3, 2, 1],
        }
    }

    /// Total pins in a full rack
    pub fn pin_count(&self) -> usize {
        self.row_lengths().iter().sum()
    }
}

/// UI controls that push values into [`Settings`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliderField {
    MaxVelocity,
    MinSpin,
    MaxSpin,
    Spin,
}

impl SliderField {
    /// All fields, in the order the UI binds them
    pub const ALL: [SliderField; 4] = [
        SliderField::MaxVelocity,
        SliderField::MinSpin,
        SliderField::MaxSpin,
        SliderField::Spin,
    ];

    /// DOM element id for this control
    pub fn element_id(&self) -> &'static str {
        match self {
            SliderField::MaxVelocity => "maxVelocity",
            SliderField::MinSpin => "minSpin",
            SliderField::MaxSpin => "maxSpin",
            SliderField::Spin => "spin",
        }
    }

    pub fn from_element_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.element_id() == id)
    }
}

/// Tunable parameters for layout, scoring and ball handling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Layout ===
    pub rack: RackShape,
    pub pin_radius: f32,
    /// Centre-to-centre pin spacing as a multiple of the pin radius
    pub pin_spacing_factor: f32,
    pub pin_restitution: f32,
    pub ball_radius: f32,
    pub ball_restitution: f32,
    pub ball_start_offset: f32,
    pub wall_thickness: f32,
    pub lane_width: f32,
    pub gutter_width: f32,
    /// Whether to place the arresting sensor along the top edge
    pub top_sensor: bool,

    // === Engine ===
    /// Vertical gravity handed to the physics engine (0 for a top-down lane)
    pub gravity_y: f32,
    pub ball_air_friction: f32,
    pub pin_air_friction: f32,

    // === Scoring and round end ===
    pub tilt_threshold: f32,
    /// Ball speed that marks it as launched
    pub launch_epsilon: f32,
    /// Per-axis speed at or below which a body counts as stopped
    pub rest_threshold: f32,
    pub gutter_delay_ms: f64,
    pub rest_delay_ms: f64,
    /// Delay after the last pin is knocked (no stillness check)
    pub clear_delay_ms: f64,

    // === Ball handling ===
    pub max_velocity: f32,
    pub min_spin: f32,
    pub max_spin: f32,
    /// Angular velocity applied when a drag is released
    pub spin: f32,
    pub spin_speed_threshold: f32,
    pub spin_angular_threshold: f32,
    pub spin_force_coefficient: f32,
    /// Pointer must land within this many ball radii to start a drag
    pub grab_radius_factor: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rack: RackShape::default(),
            pin_radius: PIN_RADIUS,
            pin_spacing_factor: PIN_SPACING_FACTOR,
            pin_restitution: PIN_RESTITUTION,
            ball_radius: BALL_RADIUS,
            ball_restitution: BALL_RESTITUTION,
            ball_start_offset: BALL_START_OFFSET,
            wall_thickness: WALL_THICKNESS,
            lane_width: LANE_WIDTH,
            gutter_width: GUTTER_WIDTH,
            top_sensor: true,

            gravity_y: 0.0,
            ball_air_friction: 0.005,
            pin_air_friction: 0.03,

            tilt_threshold: TILT_THRESHOLD,
            launch_epsilon: 0.5,
            rest_threshold: 0.1,
            gutter_delay_ms: 100.0,
            rest_delay_ms: 500.0,
            clear_delay_ms: 1000.0,

            max_velocity: 20.0,
            min_spin: -0.3,
            max_spin: 0.3,
            spin: 0.0,
            spin_speed_threshold: 1.0,
            spin_angular_threshold: 0.01,
            spin_force_coefficient: 0.002,
            grab_radius_factor: 1.5,
        }
    }
}

impl Settings {
    /// Parse settings from JSON; missing fields keep their defaults.
    ///
    /// Ball handling values go through the same range checks as the UI
    /// controls, and any that fail fall back to their defaults.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let settings: Self = serde_json::from_str(json)?;
        Ok(settings.validated())
    }

    fn validated(mut self) -> Self {
        let defaults = Self::default();
        if !(self.max_velocity.is_finite() && self.max_velocity > 0.0) {
            log::warn!(
                "Ignoring max_velocity {}, using {}",
                self.max_velocity,
                defaults.max_velocity
            );
            self.max_velocity = defaults.max_velocity;
        }
        if !(self.min_spin.is_finite() && self.max_spin.is_finite())
            || self.min_spin > self.max_spin
        {
            log::warn!(
                "Ignoring spin range [{}, {}], using [{}, {}]",
                self.min_spin,
                self.max_spin,
                defaults.min_spin,
                defaults.max_spin
            );
            self.min_spin = defaults.min_spin;
            self.max_spin = defaults.max_spin;
        }
        if !(self.min_spin..=self.max_spin).contains(&self.spin) {
            let spin = defaults.spin.clamp(self.min_spin, self.max_spin);
            log::warn!(
                "Ignoring spin {} outside [{}, {}], using {spin}",
                self.spin,
                self.min_spin,
                self.max_spin
            );
            self.spin = spin;
        }
        self
    }

    /// Parse settings, falling back to defaults on malformed input
    pub fn from_json_or_default(json: &str) -> Self {
        match Self::from_json(json) {
            Ok(settings) => {
                log::info!("Loaded settings from JSON");
                settings
            }
            Err(e) => {
                log::warn!("Ignoring malformed settings JSON: {e}");
                Self::default()
            }
        }
    }

    /// Current value of a UI control
    pub fn value(&self, field: SliderField) -> f32 {
        match field {
            SliderField::MaxVelocity => self.max_velocity,
            SliderField::MinSpin => self.min_spin,
            SliderField::MaxSpin => self.max_spin,
            SliderField::Spin => self.spin,
        }
    }

    /// Apply raw text from a UI control.
    ///
    /// Returns false (and keeps the previous value) when the text is not a
    /// finite number or the value is out of range for that control.
    pub fn apply_input(&mut self, field: SliderField, raw: &str) -> bool {
        let Some(value) = parse_number(raw) else {
            log::warn!("Ignoring non-numeric {}: {raw:?}", field.element_id());
            return false;
        };
        let accepted = match field {
            SliderField::MaxVelocity => {
                if value > 0.0 {
                    self.max_velocity = value;
                    true
                } else {
                    false
                }
            }
            SliderField::MinSpin => {
                if value <= self.max_spin {
                    self.min_spin = value;
                    self.spin = self.spin.clamp(self.min_spin, self.max_spin);
                    true
                } else {
                    false
                }
            }
            SliderField::MaxSpin => {
                if value >= self.min_spin {
                    self.max_spin = value;
                    self.spin = self.spin.clamp(self.min_spin, self.max_spin);
                    true
                } else {
                    false
                }
            }
            SliderField::Spin => {
                if (self.min_spin..=self.max_spin).contains(&value) {
                    self.spin = value;
                    true
                } else {
                    false
                }
            }
        };
        if !accepted {
            log::warn!("Ignoring out-of-range {}: {value}", field.element_id());
        }
        accepted
    }

    /// Distance between neighbouring pin centres
    pub fn pin_spacing(&self) -> f32 {
        self.pin_radius * self.pin_spacing_factor
    }
}

fn parse_number(raw: &str) -> Option<f32> {
    raw.trim().parse::<f32>().ok().filter(|v| v.is_finite())
}
