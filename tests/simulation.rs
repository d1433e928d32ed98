use approx::assert_relative_eq;
use rand::{rngs::StdRng, Rng, SeedableRng};

use impel2d::{Body, Joint, Vec2, World};

const DT: f32 = 1.0 / 60.0;

fn body_at(width: f32, height: f32, mass: f32, x: f32, y: f32) -> Body {
    let mut body = Body::new(Vec2::new(width, height), mass).unwrap();
    body.set_position(x, y);
    body
}

/// The reference scene: a dynamic box dropped onto a wide static floor.
/// Gravity points along +y (screen coordinates).
fn drop_scene() -> (World, usize, usize) {
    let mut world = World::new(Vec2::new(0.0, 9.8), 10);
    let falling = world
        .add_body(body_at(50.0, 50.0, 10.0, 50.0, 0.0))
        .unwrap();
    let floor = world
        .add_body(body_at(800.0, 40.0, Body::INFINITE_MASS, 30.0, 300.0))
        .unwrap();
    (world, falling, floor)
}

#[test]
fn static_body_never_moves() {
    let (mut world, _, floor) = drop_scene();

    let before = world.get_body(floor).unwrap().position;
    assert_eq!(before, Vec2::new(30.0, 300.0));

    for _ in 0..600 {
        world.step(DT).unwrap();
    }

    let after = world.get_body(floor).unwrap();
    assert_eq!(after.position, before);
    assert_eq!(after.rotation, 0.0);
    assert_eq!(after.velocity, Vec2::ZERO);
}

#[test]
fn dropped_box_comes_to_rest_on_floor() {
    let (mut world, falling, _) = drop_scene();

    for _ in 0..900 {
        world.step(DT).unwrap();
    }

    let body = world.get_body(falling).unwrap();
    // Resting height: floor top minus half the box height.
    let rest_y = 300.0 - 40.0 / 2.0 - 50.0 / 2.0;
    assert_relative_eq!(body.position.y, rest_y, epsilon = 1.0);
    assert!(body.position.y > 0.0);
    assert!(body.velocity.y.abs() < 0.1, "still sinking or bouncing");
    assert_relative_eq!(body.position.x, 50.0, epsilon = 1.0);
}

#[test]
fn momentum_is_conserved_without_friction_or_gravity() {
    let mut world = World::new(Vec2::ZERO, 10);

    let mut moving = body_at(2.0, 2.0, 1.0, 0.0, 0.0);
    moving.set_friction(0.0).unwrap();
    moving.velocity = Vec2::new(5.0, 0.0);
    let mut resting = body_at(2.0, 2.0, 1.0, 4.0, 0.0);
    resting.set_friction(0.0).unwrap();

    let a = world.add_body(moving).unwrap();
    let b = world.add_body(resting).unwrap();

    let momentum_before = Vec2::new(5.0, 0.0);

    for _ in 0..120 {
        world.step(DT).unwrap();
    }

    let va = world.get_body(a).unwrap().velocity;
    let vb = world.get_body(b).unwrap().velocity;
    let momentum_after = va + vb;

    assert_relative_eq!(momentum_after.x, momentum_before.x, epsilon = 1e-3);
    assert_relative_eq!(momentum_after.y, momentum_before.y, epsilon = 1e-3);
    // The collision actually happened.
    assert!(vb.x > 0.0);
}

#[test]
fn joint_anchor_separation_converges() {
    let mut world = World::new(Vec2::ZERO, 10);
    let anchor = world
        .add_body(body_at(10.0, 10.0, Body::INFINITE_MASS, 0.0, 0.0))
        .unwrap();
    let swinging = world.add_body(body_at(10.0, 10.0, 1.0, 0.0, 20.0)).unwrap();

    let joint = Joint::new(anchor, swinging, Vec2::new(0.0, 10.0), &world).unwrap();
    world.add_joint(joint).unwrap();

    // Introduce anchor error by teleporting the swinging body sideways.
    world.get_body_mut(swinging).unwrap().set_position(5.0, 20.0);

    let separation = |world: &World| {
        let joint = world.joints()[0];
        let (p_a, p_b) = joint.world_anchors(
            world.get_body(joint.body_a).unwrap(),
            world.get_body(joint.body_b).unwrap(),
        );
        (p_b - p_a).length()
    };

    let initial = separation(&world);
    assert_relative_eq!(initial, 5.0, epsilon = 1e-5);

    for _ in 0..240 {
        world.step(DT).unwrap();
    }

    let settled = separation(&world);
    assert!(settled < 0.05, "anchor separation {settled} did not converge");
    assert!(settled < initial);
}

#[test]
fn snapshots_are_idempotent_between_steps() {
    let (mut world, _, _) = drop_scene();
    for _ in 0..30 {
        world.step(DT).unwrap();
    }

    let first: Vec<_> = world.iter_bodies().collect();
    let second: Vec<_> = world.iter_bodies().collect();
    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
    assert_eq!(first[0].id, 0);
    assert_eq!((first[1].width, first[1].height), (800.0, 40.0));
}

fn seeded_pile(seed: u64) -> World {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut world = World::new(Vec2::new(0.0, 9.8), 10);
    world
        .add_body(body_at(200.0, 10.0, Body::INFINITE_MASS, 0.0, 100.0))
        .unwrap();
    for _ in 0..8 {
        let x = rng.gen_range(-50.0..50.0);
        let y = rng.gen_range(-60.0..0.0);
        world.add_body(body_at(8.0, 8.0, 1.0, x, y)).unwrap();
    }
    world
}

#[test]
fn identical_worlds_stay_identical() {
    let mut world_a = seeded_pile(7);
    let mut world_b = seeded_pile(7);

    for _ in 0..120 {
        world_a.step(DT).unwrap();
        world_b.step(DT).unwrap();
    }

    for (a, b) in world_a.iter_bodies().zip(world_b.iter_bodies()) {
        assert_eq!(a.position, b.position);
        assert_eq!(a.rotation, b.rotation);
    }
}

#[test]
fn accumulated_forces_are_applied_once() {
    let mut world = World::new(Vec2::ZERO, 10);
    let id = world.add_body(body_at(2.0, 2.0, 2.0, 0.0, 0.0)).unwrap();

    world.get_body_mut(id).unwrap().add_force(Vec2::new(120.0, 0.0));
    world.step(DT).unwrap();

    // dv = F/m * dt
    let body = world.get_body(id).unwrap();
    assert_relative_eq!(body.velocity.x, 1.0, epsilon = 1e-5);

    // Accumulator cleared: a further step adds nothing.
    world.step(DT).unwrap();
    let body = world.get_body(id).unwrap();
    assert_relative_eq!(body.velocity.x, 1.0, epsilon = 1e-5);
}
