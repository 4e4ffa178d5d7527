//! Browser entry: Matter.js world, DOM controls and the frame loop
//!
//! Matter.js is loaded from a script tag and reached through a small JS shim.
//! Matter's own renderer draws the bodies; Rust drives `Engine.update`.

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;
use wasm_bindgen::prelude::*;
use web_sys::{Document, HtmlCanvasElement, HtmlInputElement, MouseEvent};

use crate::consts::SIM_DT_MS;
use crate::game::Game;
use crate::platform::time::PerformanceClock;
use crate::settings::{Settings, SliderField};
use crate::sim::{
    BodyId, BodyState, CircleBody, CircleRole, CollisionEvent, PhysicsWorld, StaticBody, Viewport,
};

#[wasm_bindgen(inline_js = "
    const bodies = new Map();
    let engine = null;
    let collisions = [];

    function idOf(body) {
        const root = body.parent || body;
        const id = root.plugin ? root.plugin.ninePinId : undefined;
        return id === undefined ? null : id;
    }

    export function matter_init(canvas, width, height, gravityY) {
        const { Engine, Render, Events } = globalThis.Matter;
        engine = Engine.create();
        engine.gravity.y = gravityY;
        const render = Render.create({
            canvas: canvas,
            engine: engine,
            options: { width: width, height: height, wireframes: false, background: '#fafafa' }
        });
        Render.run(render);
        Events.on(engine, 'collisionStart', (event) => {
            for (const pair of event.pairs) {
                const a = idOf(pair.bodyA);
                const b = idOf(pair.bodyB);
                if (a !== null && b !== null) {
                    collisions.push(a, b);
                }
            }
        });
    }

    export function matter_add_rect(id, x, y, w, h, sensor) {
        const { Bodies, Composite } = globalThis.Matter;
        const body = Bodies.rectangle(x, y, w, h, {
            isStatic: true,
            isSensor: sensor,
            plugin: { ninePinId: id },
            render: sensor
                ? { fillStyle: 'rgba(200, 60, 60, 0.2)' }
                : { fillStyle: '#8d6e63' }
        });
        bodies.set(id, body);
        Composite.add(engine.world, body);
    }

    export function matter_add_circle(id, x, y, r, restitution, frictionAir, isBall) {
        const { Bodies, Composite } = globalThis.Matter;
        const body = Bodies.circle(x, y, r, {
            restitution: restitution,
            frictionAir: frictionAir,
            plugin: { ninePinId: id },
            render: isBall
                ? { fillStyle: '#263238' }
                : { fillStyle: '#ffffff', strokeStyle: '#c62828', lineWidth: 3 }
        });
        bodies.set(id, body);
        Composite.add(engine.world, body);
    }

    export function matter_remove(id) {
        const body = bodies.get(id);
        if (body) {
            globalThis.Matter.Composite.remove(engine.world, body);
            bodies.delete(id);
        }
    }

    export function matter_body_state(id) {
        const b = bodies.get(id);
        if (!b) {
            return new Float64Array(0);
        }
        return new Float64Array([
            b.position.x, b.position.y, b.velocity.x, b.velocity.y, b.angle, b.angularVelocity
        ]);
    }

    export function matter_set_position(id, x, y) {
        const b = bodies.get(id);
        if (b) globalThis.Matter.Body.setPosition(b, { x: x, y: y });
    }

    export function matter_set_velocity(id, x, y) {
        const b = bodies.get(id);
        if (b) globalThis.Matter.Body.setVelocity(b, { x: x, y: y });
    }

    export function matter_set_angular_velocity(id, w) {
        const b = bodies.get(id);
        if (b) globalThis.Matter.Body.setAngularVelocity(b, w);
    }

    export function matter_apply_force(id, x, y) {
        const b = bodies.get(id);
        if (b) globalThis.Matter.Body.applyForce(b, b.position, { x: x, y: y });
    }

    export function matter_step(dt) {
        globalThis.Matter.Engine.update(engine, dt);
    }

    export function matter_drain_collisions() {
        const out = new Uint32Array(collisions);
        collisions = [];
        return out;
    }
")]
extern "C" {
    fn matter_init(canvas: &HtmlCanvasElement, width: f64, height: f64, gravity_y: f64);
    fn matter_add_rect(id: u32, x: f64, y: f64, w: f64, h: f64, sensor: bool);
    fn matter_add_circle(
        id: u32,
        x: f64,
        y: f64,
        r: f64,
        restitution: f64,
        friction_air: f64,
        is_ball: bool,
    );
    fn matter_remove(id: u32);
    fn matter_body_state(id: u32) -> Vec<f64>;
    fn matter_set_position(id: u32, x: f64, y: f64);
    fn matter_set_velocity(id: u32, x: f64, y: f64);
    fn matter_set_angular_velocity(id: u32, w: f64);
    fn matter_apply_force(id: u32, x: f64, y: f64);
    fn matter_step(dt: f64);
    fn matter_drain_collisions() -> Vec<u32>;
}

/// [`PhysicsWorld`] backed by the page's Matter.js engine
pub struct MatterWorld;

impl MatterWorld {
    pub fn new(canvas: &HtmlCanvasElement, width: f64, height: f64, gravity_y: f32) -> Self {
        matter_init(canvas, width, height, gravity_y as f64);
        Self
    }
}

impl PhysicsWorld for MatterWorld {
    fn add_static(&mut self, id: BodyId, body: &StaticBody) {
        let r = body.rect;
        matter_add_rect(
            id.0,
            r.center.x as f64,
            r.center.y as f64,
            r.size.x as f64,
            r.size.y as f64,
            body.kind.is_sensor(),
        );
    }

    fn add_circle(&mut self, id: BodyId, circle: &CircleBody) {
        matter_add_circle(
            id.0,
            circle.pos.x as f64,
            circle.pos.y as f64,
            circle.radius as f64,
            circle.restitution as f64,
            circle.air_friction as f64,
            circle.role == CircleRole::Ball,
        );
    }

    fn remove(&mut self, id: BodyId) {
        matter_remove(id.0);
    }

    fn body(&self, id: BodyId) -> Option<BodyState> {
        match matter_body_state(id.0).as_slice() {
            &[x, y, vx, vy, angle, angular_vel] => Some(BodyState {
                pos: Vec2::new(x as f32, y as f32),
                vel: Vec2::new(vx as f32, vy as f32),
                angle: angle as f32,
                angular_vel: angular_vel as f32,
            }),
            _ => None,
        }
    }

    fn set_position(&mut self, id: BodyId, pos: Vec2) {
        matter_set_position(id.0, pos.x as f64, pos.y as f64);
    }

    fn set_velocity(&mut self, id: BodyId, vel: Vec2) {
        matter_set_velocity(id.0, vel.x as f64, vel.y as f64);
    }

    fn set_angular_velocity(&mut self, id: BodyId, angular_vel: f32) {
        matter_set_angular_velocity(id.0, angular_vel as f64);
    }

    fn apply_force(&mut self, id: BodyId, force: Vec2) {
        matter_apply_force(id.0, force.x as f64, force.y as f64);
    }

    fn step(&mut self, dt_ms: f64) {
        matter_step(dt_ms);
    }

    fn drain_collisions(&mut self) -> Vec<CollisionEvent> {
        matter_drain_collisions()
            .chunks_exact(2)
            .map(|pair| CollisionEvent::new(BodyId(pair[0]), BodyId(pair[1])))
            .collect()
    }
}

type WebGame = Game<MatterWorld, PerformanceClock>;

pub fn run() {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

    log::info!("Nine-Pin starting...");

    let window = web_sys::window().expect("no window");
    let document = window.document().expect("no document");

    let canvas: HtmlCanvasElement = document
        .get_element_by_id("gameCanvas")
        .expect("no canvas")
        .dyn_into()
        .expect("not a canvas");

    let width = window
        .inner_width()
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(800.0);
    let height = window
        .inner_height()
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(600.0);
    canvas.set_width(width as u32);
    canvas.set_height(height as u32);

    let settings = document
        .get_element_by_id("settings")
        .and_then(|el| el.text_content())
        .map(|json| Settings::from_json_or_default(&json))
        .unwrap_or_default();

    let world = MatterWorld::new(&canvas, width, height, settings.gravity_y);
    let game = Game::new(
        world,
        PerformanceClock::new(),
        Viewport::new(width as f32, height as f32),
        settings,
    );
    sync_controls(&document, game.settings());
    let game = Rc::new(RefCell::new(game));

    setup_mouse_handlers(&canvas, game.clone());
    setup_controls(&document, game.clone());
    setup_reset_button(&document, game.clone());

    request_animation_frame(game, 0.0);

    log::info!("Nine-Pin running!");
}

fn setup_mouse_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<WebGame>>) {
    let window = web_sys::window().expect("no window");

    // Press on the canvas only
    {
        let game = game.clone();
        let canvas_clone = canvas.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
            let pos = canvas_position(&canvas_clone, &event);
            game.borrow_mut().pointer_down(pos);
        });
        let _ = canvas
            .add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    // Move and release anywhere so a drag can leave the canvas
    {
        let game = game.clone();
        let canvas_clone = canvas.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
            let mut g = game.borrow_mut();
            if g.is_dragging() {
                g.pointer_move(canvas_position(&canvas_clone, &event));
            }
        });
        let _ = window
            .add_event_listener_with_callback("mousemove", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    {
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
            game.borrow_mut().pointer_up();
        });
        let _ =
            window.add_event_listener_with_callback("mouseup", closure.as_ref().unchecked_ref());
        closure.forget();
    }
}

fn canvas_position(canvas: &HtmlCanvasElement, event: &MouseEvent) -> Vec2 {
    let rect = canvas.get_bounding_client_rect();
    Vec2::new(
        (event.client_x() as f64 - rect.left()) as f32,
        (event.client_y() as f64 - rect.top()) as f32,
    )
}

fn input_element(document: &Document, field: SliderField) -> Option<HtmlInputElement> {
    document
        .get_element_by_id(field.element_id())
        .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
}

fn setup_controls(document: &Document, game: Rc<RefCell<WebGame>>) {
    for field in SliderField::ALL {
        let Some(input) = input_element(document, field) else {
            log::warn!("Control #{} not found", field.element_id());
            continue;
        };
        let game = game.clone();
        let document = document.clone();
        let input_clone = input.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let accepted = game.borrow_mut().apply_input(field, &input_clone.value());
            let g = game.borrow();
            if !accepted {
                // Put back the last valid value
                input_clone.set_value(&g.settings().value(field).to_string());
            }
            sync_controls(&document, g.settings());
        });
        let _ = input.add_event_listener_with_callback("change", closure.as_ref().unchecked_ref());
        closure.forget();
    }
}

/// Keep the spin slider's range and readout in line with the settings
fn sync_controls(document: &Document, settings: &Settings) {
    if let Some(spin) = input_element(document, SliderField::Spin) {
        let _ = spin.set_attribute("min", &settings.min_spin.to_string());
        let _ = spin.set_attribute("max", &settings.max_spin.to_string());
        spin.set_value(&settings.spin.to_string());
    }
    for field in [SliderField::MaxVelocity, SliderField::MinSpin, SliderField::MaxSpin] {
        if let Some(input) = input_element(document, field) {
            input.set_value(&settings.value(field).to_string());
        }
    }
    if let Some(el) = document.get_element_by_id("spinValue") {
        el.set_text_content(Some(&format!("{:.2}", settings.spin)));
    }
}

fn setup_reset_button(document: &Document, game: Rc<RefCell<WebGame>>) {
    if let Some(btn) = document.get_element_by_id("resetButton") {
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
            game.borrow_mut().reset();
        });
        let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }
}

fn request_animation_frame(game: Rc<RefCell<WebGame>>, last_time: f64) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let closure = Closure::once(move |time: f64| {
        game_loop(game, last_time, time);
    });
    let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
    closure.forget();
}

fn game_loop(game: Rc<RefCell<WebGame>>, last_time: f64, time: f64) {
    let dt = if last_time > 0.0 {
        time - last_time
    } else {
        SIM_DT_MS
    };

    let report = game.borrow_mut().frame(dt);
    if let Some(report) = report {
        // Blocks the page until dismissed
        if let Some(window) = web_sys::window() {
            let _ = window.alert_with_message(&report.message());
        }
        game.borrow_mut().acknowledge_report();
        // Time spent in the alert is not simulated
        request_animation_frame(game, 0.0);
        return;
    }

    request_animation_frame(game, time);
}
