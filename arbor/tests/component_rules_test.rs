//! Descriptor-driven rules: render exclusivity, requirements and activity

use arbor::event::NodeEventType;
use arbor::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::cell::RefCell;

thread_local! {
    static LOG: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

fn log(entry: impl Into<String>) {
    LOG.with(|log| log.borrow_mut().push(entry.into()));
}

fn take_log() -> Vec<String> {
    LOG.with(|log| std::mem::take(&mut *log.borrow_mut()))
}

#[derive(ComponentClass, Debug, Default)]
#[component(name = "Sprite", render, events(PointerDown, PointerUp))]
struct Sprite;

impl Component for Sprite {}

#[derive(ComponentClass, Debug, Default)]
#[component(name = "Label", render)]
struct Label;

impl Component for Label {}

#[derive(ComponentClass, Debug, Default)]
#[component(name = "Button", requires("Sprite"))]
struct Button;

impl Component for Button {}

#[derive(ComponentClass, Debug, Default)]
#[component(name = "Body")]
struct Body;

impl Component for Body {}

#[derive(ComponentClass, Debug, Default)]
#[component(name = "Badge", render, requires("Body"))]
struct Badge;

impl Component for Badge {}

#[derive(ComponentClass, Debug, Default, Serialize, Deserialize)]
#[component(name = "Gauge", requires("Body"))]
#[serde(default)]
struct Gauge {
    level: f32,
}

impl Component for Gauge {}

/// Logs enable and disable with the owning node's name
#[derive(ComponentClass, Debug, Default)]
#[component(name = "Toggle")]
struct Toggle;

impl Component for Toggle {
    fn on_enable(&mut self, ctx: &mut ComponentContext<'_>) {
        let name = ctx.name(ctx.node()).unwrap_or_default();
        log(format!("enable:{name}"));
    }

    fn on_disable(&mut self, ctx: &mut ComponentContext<'_>) {
        let name = ctx.name(ctx.node()).unwrap_or_default();
        log(format!("disable:{name}"));
    }

    fn on_update(&mut self, ctx: &mut ComponentContext<'_>, _dt: f32) {
        let name = ctx.name(ctx.node()).unwrap_or_default();
        log(format!("update:{name}"));
    }
}

fn world() -> World {
    let registry = ComponentRegistry::builder()
        .register::<Sprite>()
        .unwrap()
        .register::<Label>()
        .unwrap()
        .register::<Button>()
        .unwrap()
        .register::<Toggle>()
        .unwrap()
        .register::<Body>()
        .unwrap()
        .register::<Badge>()
        .unwrap()
        .register_with_props::<Gauge>()
        .unwrap()
        .build()
        .unwrap();
    take_log();
    World::new(registry)
}

#[test]
fn test_derived_descriptor() {
    let descriptor = Sprite::descriptor();
    assert_eq!(descriptor.name, "Sprite");
    assert!(descriptor.render);
    assert!(!descriptor.collider);
    assert_eq!(
        descriptor.events,
        &[NodeEventType::PointerDown, NodeEventType::PointerUp]
    );
    assert!(descriptor.requires.is_empty());

    assert_eq!(Button::descriptor().requires, &["Sprite"]);
    assert!(!Button::descriptor().render);

    let collider = BoxCollider::descriptor();
    assert!(collider.collider);
    assert!(collider.events.contains(&NodeEventType::CollisionEnter));
}

#[test]
fn test_second_render_component_is_rejected() {
    let mut world = world();
    let node = world.create_node("n");
    let sprite = world.add_component::<Sprite>(node).unwrap();

    let result = world.add_component::<Label>(node);
    assert!(matches!(
        result,
        Err(ComponentError::DuplicateRenderComponent {
            existing: "Sprite",
            attempted: "Label",
            ..
        })
    ));
    assert_eq!(world.components_of(node), vec![sprite]);

    // a destroyed render component no longer counts
    world.destroy_component(sprite);
    let label = world.add_component::<Label>(node).unwrap();
    assert_eq!(world.render_component(node), Some(label));
}

#[test]
fn test_required_components_are_added_first() {
    let mut world = world();
    let node = world.create_node("n");
    let button = world.add_component::<Button>(node).unwrap();

    let sprite = world.get_component::<Sprite>(node).unwrap();
    assert_eq!(world.components_of(node), vec![sprite, button]);

    // an existing requirement is reused
    let other = world.create_node("other");
    let existing = world.add_component::<Sprite>(other).unwrap();
    world.add_component::<Button>(other).unwrap();
    assert_eq!(world.get_component::<Sprite>(other), Some(existing));
    assert_eq!(world.components_of(other).len(), 2);
}

#[test]
fn test_required_render_component_conflicts_with_existing_one() {
    let mut world = world();
    let node = world.create_node("n");
    world.add_component::<Label>(node).unwrap();

    let result = world.add_component::<Button>(node);
    assert!(matches!(
        result,
        Err(ComponentError::DuplicateRenderComponent { .. })
    ));
    assert!(world.get_component::<Button>(node).is_none());
    assert!(world.get_component::<Sprite>(node).is_none());
    assert_eq!(world.components_of(node).len(), 1);
}

#[test]
fn test_rejected_render_add_leaves_node_untouched() {
    let mut world = world();
    let node = world.create_node("n");
    let sprite = world.add_component::<Sprite>(node).unwrap();

    let result = world.add_component::<Badge>(node);
    assert!(matches!(
        result,
        Err(ComponentError::DuplicateRenderComponent {
            existing: "Sprite",
            attempted: "Badge",
            ..
        })
    ));
    assert_eq!(world.components_of(node), vec![sprite]);
    assert!(world.get_component::<Body>(node).is_none());
    assert!(world.components().pending().iter().all(|id| *id == sprite));
}

#[test]
fn test_bad_props_discard_added_requirements() {
    let mut world = world();
    let node = world.create_node("n");
    let toggle = world.add_component::<Toggle>(node).unwrap();

    let result = world.add_component_by_name(node, "Gauge", Some(&json!({ "level": "full" })));
    assert!(matches!(result, Err(ComponentError::Props { component: "Gauge", .. })));
    assert!(world.get_component::<Body>(node).is_none());
    assert!(world.get_component::<Gauge>(node).is_none());

    world.clear_destroyed_components();
    assert_eq!(world.components_of(node), vec![toggle]);

    // a valid add afterwards brings the requirement back
    let gauge = world
        .add_component_by_name(node, "Gauge", Some(&json!({ "level": 0.5 })))
        .unwrap();
    let body = world.get_component::<Body>(node).unwrap();
    assert_eq!(world.components_of(node), vec![toggle, body, gauge]);
}

#[test]
fn test_requirement_cycle_is_rejected() {
    #[derive(ComponentClass, Debug, Default)]
    #[component(name = "Ping", requires("Pong"))]
    struct Ping;
    impl Component for Ping {}

    #[derive(ComponentClass, Debug, Default)]
    #[component(name = "Pong", requires("Ping"))]
    struct Pong;
    impl Component for Pong {}

    let result = ComponentRegistry::builder()
        .register::<Ping>()
        .unwrap()
        .register::<Pong>()
        .unwrap()
        .build();
    assert!(matches!(result, Err(RegistryError::RequirementCycle { .. })));
}

#[test]
fn test_node_activity_toggles_subtree_components() {
    let mut world = world();
    let root = world.create_node("root");
    let child = NodeBuilder::new("child").parent(root).spawn(&mut world);
    let hidden = NodeBuilder::new("hidden")
        .parent(root)
        .active(false)
        .spawn(&mut world);
    world.add_component::<Toggle>(root).unwrap();
    let child_toggle = world.add_component::<Toggle>(child).unwrap();
    world.add_component::<Toggle>(hidden).unwrap();
    let disabled = world.create_node("disabled");
    world.set_parent(disabled, Some(root));
    let off = world.add_component::<Toggle>(disabled).unwrap();
    world.set_enabled(off, false);
    take_log();

    world.set_active(root, false);
    assert_eq!(take_log(), vec!["disable:root", "disable:child"]);
    assert!(!world.can_execute_component(child_toggle));
    assert!(!world.is_active_in_tree(child));
    assert!(world.is_active(child));

    // changes below an inactive ancestor are silent
    world.set_active(child, false);
    world.set_active(child, true);
    assert!(take_log().is_empty());

    // repeated value is silent too
    world.set_active(root, false);
    assert!(take_log().is_empty());

    world.set_active(root, true);
    assert_eq!(take_log(), vec!["enable:root", "enable:child"]);
    assert!(world.can_execute_component(child_toggle));
}

#[test]
fn test_inactive_nodes_skip_updates() {
    let mut world = world();
    let root = world.create_node("root");
    let child = NodeBuilder::new("child").parent(root).spawn(&mut world);
    world.add_component::<Toggle>(child).unwrap();
    world.call_start_components();
    take_log();

    world.set_active(root, false);
    take_log();
    world.call_update_components(0.016);
    assert!(take_log().is_empty());

    world.set_active(root, true);
    take_log();
    world.call_update_components(0.016);
    assert_eq!(take_log(), vec!["update:child"]);
}
