use std::collections::BTreeMap;

use tracing::{debug, trace, warn};

use crate::arbiter::{Arbiter, ArbiterKey};
use crate::body::Body;
use crate::error::WorldError;
use crate::joint::Joint;
use crate::math::Vec2;

/// Read-only view of one body, as exposed to the rendering layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodySnapshot {
    pub id: usize,
    pub position: Vec2,
    pub rotation: f32,
    pub width: f32,
    pub height: f32,
}

/// Owns all bodies, joints, and cached contacts, and runs the step
/// pipeline. Joints and arbiters refer to bodies by id; the world is the
/// single owner of every body.
#[derive(Debug)]
pub struct World {
    bodies: Vec<Body>,
    joints: Vec<Joint>,
    arbiters: BTreeMap<ArbiterKey, Arbiter>,
    pub gravity: Vec2,
    pub iterations: u32,
}

/// Disjoint mutable borrows of two bodies in the store.
fn body_pair_mut(bodies: &mut [Body], a: usize, b: usize) -> (&mut Body, &mut Body) {
    debug_assert_ne!(a, b);
    if a < b {
        let (lo, hi) = bodies.split_at_mut(b);
        (&mut lo[a], &mut hi[0])
    } else {
        let (lo, hi) = bodies.split_at_mut(a);
        let (second, first) = (&mut lo[b], &mut hi[0]);
        (first, second)
    }
}

impl World {
    pub const ACCUMULATE_IMPULSES: bool = true;
    pub const WARM_STARTING: bool = true;
    pub const POSITION_CORRECTION: bool = true;

    pub fn new(gravity: Vec2, iterations: u32) -> World {
        World {
            bodies: Vec::new(),
            joints: Vec::new(),
            arbiters: BTreeMap::new(),
            gravity,
            iterations,
        }
    }

    /// Registers a body and returns its id. Ids are assigned in insertion
    /// order and stay stable for the world's lifetime.
    pub fn add_body(&mut self, mut body: Body) -> Result<usize, WorldError> {
        if let Some(id) = body.id {
            return Err(WorldError::AlreadyRegistered(id));
        }
        let id = self.bodies.len();
        body.id = Some(id);
        self.bodies.push(body);
        debug!(id, "body registered");
        Ok(id)
    }

    /// Registers a joint. Both referenced bodies must already be registered
    /// and form a solvable pair. Re-checked here because the ids are plain
    /// fields that may have changed since `Joint::new` validated them.
    pub fn add_joint(&mut self, joint: Joint) -> Result<(), WorldError> {
        for id in [joint.body_a, joint.body_b] {
            if id >= self.bodies.len() {
                return Err(WorldError::UnregisteredBody(id));
            }
        }
        if joint.body_a == joint.body_b {
            return Err(WorldError::SelfJoint(joint.body_a));
        }
        if self.bodies[joint.body_a].is_static() && self.bodies[joint.body_b].is_static() {
            return Err(WorldError::StaticJointPair(joint.body_a, joint.body_b));
        }
        debug!(body_a = joint.body_a, body_b = joint.body_b, "joint registered");
        self.joints.push(joint);
        Ok(())
    }

    pub fn get_body(&self, id: usize) -> Option<&Body> {
        self.bodies.get(id)
    }

    pub fn get_body_mut(&mut self, id: usize) -> Option<&mut Body> {
        self.bodies.get_mut(id)
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    /// Drops all bodies, joints, and cached contacts.
    pub fn clear(&mut self) {
        self.bodies.clear();
        self.joints.clear();
        self.arbiters.clear();
    }

    /// Lazy, restartable sequence of body snapshots in id order. Repeated
    /// calls between two steps yield identical sequences.
    pub fn iter_bodies(&self) -> impl Iterator<Item = BodySnapshot> + '_ {
        self.bodies.iter().map(|body| BodySnapshot {
            id: body.id.unwrap_or_default(),
            position: body.position,
            rotation: body.rotation,
            width: body.size().x,
            height: body.size().y,
        })
    }

    fn broad_phase(&mut self) {
        // O(n^2) broad-phase
        for i in 0..self.bodies.len() {
            let bi = &self.bodies[i];

            for j in i + 1..self.bodies.len() {
                let bj = &self.bodies[j];

                // Two immovables cannot usefully collide.
                if bi.inv_mass() == 0.0 && bj.inv_mass() == 0.0 {
                    continue;
                }

                let new_arb = Arbiter::new(bi, bj);
                let key = ArbiterKey::new(i, j);

                if new_arb.num_contacts > 0 {
                    if let Some(arb) = self.arbiters.get_mut(&key) {
                        arb.update(&new_arb.contacts, new_arb.num_contacts);
                    } else {
                        self.arbiters.insert(key, new_arb);
                    }
                } else {
                    self.arbiters.remove(&key);
                }
            }
        }
    }

    /// Advances the simulation by `dt` seconds.
    ///
    /// Pipeline: integrate forces, find contacts, pre-step joints and
    /// contacts (warm start), run `iterations` sequential-impulse passes,
    /// integrate velocities, clear accumulators.
    pub fn step(&mut self, dt: f32) -> Result<(), WorldError> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(WorldError::InvalidTimestep(dt));
        }
        let inv_dt = 1.0 / dt;

        // Integrate forces. Static bodies are skipped entirely.
        for body in &mut self.bodies {
            if body.inv_mass() == 0.0 {
                continue;
            }

            body.velocity += (self.gravity + body.inv_mass() * body.force) * dt;
            body.angular_velocity += body.inv_inertia() * body.torque * dt;
        }

        // Determine overlapping bodies and update contact points.
        self.broad_phase();
        trace!(
            bodies = self.bodies.len(),
            arbiters = self.arbiters.len(),
            "step"
        );

        // Perform pre-steps.
        let bodies = &mut self.bodies;
        for joint in &mut self.joints {
            let (body_a, body_b) = body_pair_mut(bodies, joint.body_a, joint.body_b);
            joint.pre_step(body_a, body_b, inv_dt);
        }

        for (key, arb) in self.arbiters.iter_mut() {
            let (body1, body2) = body_pair_mut(bodies, key.body1, key.body2);
            arb.pre_step(body1, body2, inv_dt);
        }

        // Perform iterations
        for _ in 0..self.iterations {
            for joint in &mut self.joints {
                let (body_a, body_b) = body_pair_mut(bodies, joint.body_a, joint.body_b);
                joint.apply_impulse(body_a, body_b);
            }

            for (key, arb) in self.arbiters.iter_mut() {
                let (body1, body2) = body_pair_mut(bodies, key.body1, key.body2);
                arb.apply_impulse(body1, body2);
            }
        }

        // Integrate velocities and clear accumulators.
        for body in &mut self.bodies {
            if body.inv_mass() != 0.0 {
                body.position += dt * body.velocity;
                body.rotation += dt * body.angular_velocity;
            }

            body.force = Vec2::ZERO;
            body.torque = 0.0;
        }

        // Diagnostic only: bad state is reported, never repaired.
        for body in &self.bodies {
            if !body.position.is_finite()
                || !body.velocity.is_finite()
                || !body.rotation.is_finite()
                || !body.angular_velocity.is_finite()
            {
                let id = body.id.unwrap_or_default();
                warn!(id, "non-finite body state after step");
                return Err(WorldError::NumericalInstability(id));
            }
        }

        Ok(())
    }
}
