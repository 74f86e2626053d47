//! Transform handshake between nodes and the physics collaborator

use arbor::physics::{CollisionPair, ContactFeed, Pose, TransformAuthority};
use arbor::prelude::*;
use std::cell::RefCell;

thread_local! {
    static HITS: RefCell<Vec<(String, CollisionEvent, bool)>> = const { RefCell::new(Vec::new()) };
}

/// Records every collision its node takes part in
#[derive(ComponentClass, Debug, Default)]
#[component(name = "HitListener", events(CollisionEnter, CollisionExit))]
struct HitListener;

impl Component for HitListener {
    fn on_collision_enter(&mut self, ctx: &mut ComponentContext<'_>, event: CollisionEvent) {
        let name = ctx.name(ctx.node()).unwrap_or_default();
        HITS.with(|hits| hits.borrow_mut().push((name, event, true)));
    }

    fn on_collision_exit(&mut self, ctx: &mut ComponentContext<'_>, event: CollisionEvent) {
        let name = ctx.name(ctx.node()).unwrap_or_default();
        HITS.with(|hits| hits.borrow_mut().push((name, event, false)));
    }
}

fn world() -> (World, ContactFeed) {
    let registry = ComponentRegistry::builder()
        .with_builtins()
        .unwrap()
        .register::<HitListener>()
        .unwrap()
        .build()
        .unwrap();
    let physics = NullPhysics::new();
    let feed = physics.contact_feed();
    HITS.with(|hits| hits.borrow_mut().clear());
    let world = World::with_backends(registry, Box::new(NullRenderer), Box::new(physics));
    (world, feed)
}

#[test]
fn test_body_is_created_at_layer_pose() {
    let (mut world, _) = world();
    let parent = NodeBuilder::new("parent")
        .position((100.0, 0.0))
        .spawn(&mut world);
    let node = NodeBuilder::new("ball")
        .position((10.0, 5.0))
        .parent(parent)
        .spawn(&mut world);
    let body = world.add_component::<RigidBody>(node).unwrap();

    assert_eq!(world.body_of(node), Some(body));
    assert_eq!(world.physics_registry().body_count(), 1);
    let pose = world.physics().body_pose(body).unwrap();
    assert_eq!(pose.position, Vec2::new(110.0, 5.0));
}

#[test]
fn test_dirty_nodes_are_pushed_once() {
    let (mut world, _) = world();
    let node = world.create_node("ball");
    let body = world.add_component_with::<RigidBody>(node, |b| {
        b.body_type = RigidBodyType::KinematicPositionBased;
    })
    .unwrap();
    world.physics_step(0.02);
    assert_eq!(world.transform_authority(node), TransformAuthority::Simulation);

    world.set_position(node, (40.0, 0.0));
    assert_eq!(world.transform_authority(node), TransformAuthority::User);
    // nothing reaches the backend before the step
    assert_eq!(world.physics().body_pose(body).unwrap().position, Vec2::ZERO);

    world.physics_step(0.02);
    assert_eq!(world.physics().body_pose(body).unwrap().position, Vec2::new(40.0, 0.0));
    assert_eq!(world.transform_authority(node), TransformAuthority::Simulation);

    // a pose written by the backend is not overwritten by a clean node
    world
        .physics_mut()
        .set_body_pose(body, Pose::new(Vec2::new(7.0, 7.0), 0.0));
    world.physics_step(0.02);
    assert_eq!(world.position(node), Some(Vec2::new(7.0, 7.0)));
}

#[test]
fn test_parent_move_pushes_child_body() {
    let (mut world, _) = world();
    let parent = world.create_node("parent");
    let child = NodeBuilder::new("child")
        .position((5.0, 0.0))
        .parent(parent)
        .spawn(&mut world);
    let body = world.add_component_with::<RigidBody>(child, |b| {
        b.body_type = RigidBodyType::Fixed;
    })
    .unwrap();
    world.physics_step(0.02);

    world.set_position(parent, (100.0, 0.0));
    world.physics_step(0.02);
    assert_eq!(world.physics().body_pose(body).unwrap().position, Vec2::new(105.0, 0.0));
    assert_eq!(world.position(child), Some(Vec2::new(5.0, 0.0)));
}

#[test]
fn test_simulated_pose_is_pulled_without_marking_dirty() {
    let (mut world, _) = world();
    let node = world.create_node("ball");
    let body = world.add_component::<RigidBody>(node).unwrap();

    world.set_linear_velocity(body, (10.0, 0.0));
    assert_eq!(world.linear_velocity(body), Some(Vec2::new(10.0, 0.0)));
    world.physics_step(0.5);

    assert_eq!(world.position(node), Some(Vec2::new(5.0, 0.0)));
    assert!(!world.node_state(node).unwrap().physics_dirty);
    assert_eq!(world.transform_authority(node), TransformAuthority::Simulation);

    world.physics_step(0.5);
    assert_eq!(world.position(node), Some(Vec2::new(10.0, 0.0)));
}

#[test]
fn test_simulated_pose_is_converted_to_local_space() {
    let (mut world, _) = world();
    let parent = NodeBuilder::new("parent")
        .position((100.0, 0.0))
        .spawn(&mut world);
    let node = NodeBuilder::new("ball").parent(parent).spawn(&mut world);
    let body = world.add_component::<RigidBody>(node).unwrap();

    world.set_linear_velocity(body, (0.0, 20.0));
    world.physics_step(0.5);

    assert_eq!(world.layer_position(node), Some(Vec2::new(100.0, 10.0)));
    assert_eq!(world.position(node), Some(Vec2::new(0.0, 10.0)));
}

#[test]
fn test_rigid_body_teardown_recreates_colliders_standalone() {
    let (mut world, _) = world();
    let node = world.create_node("crate");
    let collider = world.add_component::<BoxCollider>(node).unwrap();
    assert_eq!(world.physics_registry().collider_body(collider), None);

    let body = world.add_component::<RigidBody>(node).unwrap();
    assert_eq!(world.physics_registry().collider_body(collider), Some(body));

    world.remove_component::<RigidBody>(node);
    world.clear_destroyed_components();

    assert_eq!(world.physics_registry().body_count(), 0);
    assert!(world.physics_registry().contains_collider(collider));
    assert_eq!(world.physics_registry().collider_body(collider), None);
    assert!(world.physics().collider_pose(collider).is_some());
    assert!(world.physics().body_pose(body).is_none());
}

#[test]
fn test_destroying_node_releases_physics() {
    let (mut world, _) = world();
    let node = world.create_node("crate");
    world.add_component::<RigidBody>(node).unwrap();
    let collider = world.add_component::<CircleCollider>(node).unwrap();

    world.destroy_node(node);
    world.clear_destroyed_components();
    world.clear_destroyed_nodes();

    assert_eq!(world.physics_registry().body_count(), 0);
    assert_eq!(world.physics_registry().collider_count(), 0);
    assert!(world.physics().collider_pose(collider).is_none());
}

#[test]
fn test_standalone_collider_follows_node() {
    let (mut world, _) = world();
    let node = world.create_node("sensor");
    let collider = world
        .add_component_with::<BoxCollider>(node, |c| c.offset = Vec2::new(0.0, 10.0))
        .unwrap();

    world.set_position(node, (50.0, 0.0));
    world.physics_step(0.02);
    assert_eq!(
        world.physics().collider_pose(collider).unwrap().position,
        Vec2::new(50.0, 10.0)
    );
    assert_eq!(world.position(node), Some(Vec2::new(50.0, 0.0)));
}

#[test]
fn test_collision_events_reach_both_nodes() {
    let (mut world, feed) = world();
    let a = world.create_node("a");
    let b = world.create_node("b");
    let collider_a = world.add_component::<BoxCollider>(a).unwrap();
    let collider_b = world.add_component::<CircleCollider>(b).unwrap();
    world.add_component::<HitListener>(a).unwrap();
    world.add_component::<HitListener>(b).unwrap();

    feed.lock().unwrap().push(CollisionPair {
        a: collider_a,
        b: collider_b,
        started: true,
    });
    world.physics_step(0.02);

    let hits = HITS.with(|hits| std::mem::take(&mut *hits.borrow_mut()));
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].0, "a");
    assert_eq!(hits[0].1.this_collider, collider_a);
    assert_eq!(hits[0].1.other_node, b);
    assert!(hits[0].2);
    assert_eq!(hits[1].0, "b");
    assert_eq!(hits[1].1.other_collider, collider_a);

    feed.lock().unwrap().push(CollisionPair {
        a: collider_a,
        b: collider_b,
        started: false,
    });
    world.physics_step(0.02);
    let hits = HITS.with(|hits| std::mem::take(&mut *hits.borrow_mut()));
    assert_eq!(hits.len(), 2);
    assert!(!hits[0].2);
}

#[test]
fn test_collisions_with_removed_colliders_are_dropped() {
    let (mut world, feed) = world();
    let a = world.create_node("a");
    let b = world.create_node("b");
    let collider_a = world.add_component::<BoxCollider>(a).unwrap();
    let collider_b = world.add_component::<BoxCollider>(b).unwrap();
    world.add_component::<HitListener>(a).unwrap();

    world.remove_component::<BoxCollider>(b);
    world.clear_destroyed_components();

    feed.lock().unwrap().push(CollisionPair {
        a: collider_a,
        b: collider_b,
        started: true,
    });
    world.physics_step(0.02);
    assert!(HITS.with(|hits| hits.borrow().is_empty()));
}

#[test]
fn test_configure_collider_updates_registration() {
    let (mut world, _) = world();
    let node = world.create_node("n");
    let collider = world.add_component::<CircleCollider>(node).unwrap();

    world.configure_collider::<CircleCollider>(collider, |c| c.radius = 8.0);
    let radius = world.with_component::<CircleCollider, _>(collider, |c| c.radius);
    assert_eq!(radius, Some(8.0));
}
