//! Headless demo driving a small scene for a few seconds of simulated time

use arbor::physics::{CollisionPair, ContactFeed};
use arbor::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::PoisonError;
use tracing::info;

/// Rotates its node at a constant speed
#[derive(ComponentClass, Debug, Clone, Serialize, Deserialize)]
#[component(name = "Spinner")]
#[serde(default)]
struct Spinner {
    /// Degrees per second
    speed: f32,
}

impl Default for Spinner {
    fn default() -> Self {
        Self { speed: 90.0 }
    }
}

impl Component for Spinner {
    fn on_update(&mut self, ctx: &mut ComponentContext<'_>, dt: f32) {
        let node = ctx.node();
        let angle = ctx.angle(node).unwrap_or(0.0) + self.speed * dt;
        ctx.set_angle(node, angle);
    }
}

/// Toggles its node's colour when clicked
#[derive(ComponentClass, Debug, Default)]
#[component(name = "ClickToggle", events(PointerDown))]
struct ClickToggle {
    on: bool,
}

impl Component for ClickToggle {
    fn on_pointer_down(&mut self, ctx: &mut ComponentContext<'_>, event: &mut PointerEvent) {
        self.on = !self.on;
        let node = ctx.node();
        let color = if self.on {
            Color::rgb(255.0, 200.0, 0.0)
        } else {
            Color::WHITE
        };
        ctx.set_color(node, color);
        info!(node = %node, on = self.on, "Button clicked");
        event.stop_propagation();
    }
}

/// Reports collisions and removes its node after a timeout
#[derive(ComponentClass, Debug, Default)]
#[component(name = "Crate", events(CollisionEnter), requires("RigidBody", "BoxCollider"))]
struct Crate {
    hits: u32,
}

impl Component for Crate {
    fn on_start(&mut self, ctx: &mut ComponentContext<'_>) {
        let node = ctx.node();
        if let Some(body) = ctx.body_of(node) {
            ctx.set_linear_velocity(body, (0.0, 120.0));
        }
        ctx.add_timer_once(1.5);
    }

    fn on_collision_enter(&mut self, ctx: &mut ComponentContext<'_>, event: CollisionEvent) {
        self.hits += 1;
        info!(node = %ctx.node(), other = %event.other_node, hits = self.hits, "Crate hit something");
    }

    fn on_timer(&mut self, ctx: &mut ComponentContext<'_>, _tick: TimerTick) {
        let node = ctx.node();
        info!(node = %node, "Crate expired");
        ctx.destroy_node(node);
    }
}

fn queue_contact(feed: &ContactFeed, pair: CollisionPair) {
    feed.lock().unwrap_or_else(PoisonError::into_inner).push(pair);
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = EngineConfig::default();
    arbor::init_logging_with_filter(config.log_filter.as_deref());
    info!("Starting arbor demo");

    let registry = ComponentRegistry::builder()
        .with_builtins()?
        .register_with_props::<Spinner>()?
        .register::<ClickToggle>()?
        .register::<Crate>()?
        .build()?;

    let physics = NullPhysics::new();
    let contacts = physics.contact_feed();
    let mut world = World::with_backends(registry, Box::new(NullRenderer), Box::new(physics));

    let ui = world.create_layer("ui");
    let game = world.create_layer("game");
    world.set_layer_origin(game, (640.0, 360.0));

    let panel = NodeBuilder::new("panel")
        .size((300.0, 200.0))
        .layer(ui)
        .spawn(&mut world);
    let button = NodeBuilder::new("button")
        .size((120.0, 40.0))
        .parent(panel)
        .spawn(&mut world);
    world.add_component::<ClickToggle>(button)?;

    let wheel = NodeBuilder::new("wheel")
        .size((64.0, 64.0))
        .layer(game)
        .spawn(&mut world);
    world.add_component_by_name(wheel, "Spinner", Some(&json!({ "speed": 180.0 })))?;

    let floor = NodeBuilder::new("floor")
        .position((0.0, 300.0))
        .size((1000.0, 20.0))
        .layer(game)
        .spawn(&mut world);
    let floor_body = world.add_component_with::<RigidBody>(floor, |body| {
        body.body_type = RigidBodyType::Fixed;
    })?;
    let floor_collider = world.add_component::<BoxCollider>(floor)?;
    world.configure_collider::<BoxCollider>(floor_collider, |collider| {
        collider.size = Size::new(1000.0, 20.0);
    });
    info!(body = %floor_body, collider = %floor_collider, "Floor ready");

    let falling = NodeBuilder::new("crate").layer(game).spawn(&mut world);
    world.add_component::<Crate>(falling)?;
    let crate_collider = world
        .get_component::<BoxCollider>(falling)
        .ok_or("crate has no collider")?;

    let mut engine = Engine::new(config, world)?;
    let dt = 1.0 / 60.0;

    engine.run_frames(30, dt);

    engine.world_mut().input_mut().pointer_down(0, (0.0, 0.0), 0);
    engine.world_mut().input_mut().pointer_up(0, (0.0, 0.0), 0);
    engine.tick(dt);

    queue_contact(
        &contacts,
        CollisionPair {
            a: crate_collider,
            b: floor_collider,
            started: true,
        },
    );
    engine.run_frames(90, dt);

    let world = engine.world();
    info!(
        frames = engine.frame(),
        wheel_angle = world.angle(wheel).unwrap_or_default(),
        crate_alive = world.contains_node(falling),
        nodes = world.nodes().live().len(),
        components = world.components().live().len(),
        "Demo finished"
    );
    Ok(())
}
