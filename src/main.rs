//! Nine-Pin entry point
//!
//! On the web this boots the Matter.js world and the frame loop. Natively it
//! prints the lane layout for a viewport, which is handy when tuning settings.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    nine_pin::platform::web::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use nine_pin::Settings;
    use nine_pin::sim::{Layout, Viewport};

    env_logger::init();

    let mut args = std::env::args().skip(1);
    let width = parse_dimension(args.next(), 1280.0);
    let height = parse_dimension(args.next(), 720.0);

    let settings = match std::env::var("NINE_PIN_SETTINGS") {
        Ok(json) => Settings::from_json_or_default(&json),
        Err(_) => Settings::default(),
    };

    let layout = Layout::build(Viewport::new(width, height), &settings);
    log::info!(
        "Layout for {}x{}: {} pins, lane {:.0}px",
        width,
        height,
        layout.rack.len(),
        layout.lane.size.x
    );

    match serde_json::to_string_pretty(&layout) {
        Ok(json) => println!("{json}"),
        Err(e) => log::error!("Failed to serialize layout: {e}"),
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn parse_dimension(arg: Option<String>, default: f32) -> f32 {
    match arg.as_deref().map(str::parse::<f32>) {
        Some(Ok(v)) if v.is_finite() && v > 0.0 => v,
        Some(_) => {
            log::warn!("Ignoring invalid dimension {arg:?}, using {default}");
            default
        }
        None => default,
    }
}
