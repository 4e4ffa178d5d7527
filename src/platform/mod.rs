//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Time (injected clocks)
//! - Input events (mouse drag to ball commands)
//! - The Matter.js world and DOM controls (wasm32 only)

pub mod input;
pub mod time;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use input::DragController;
pub use time::{Clock, ManualClock};
#[cfg(not(target_arch = "wasm32"))]
pub use time::SystemClock;
#[cfg(target_arch = "wasm32")]
pub use time::PerformanceClock;
