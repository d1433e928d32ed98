use crate::body::Body;
use crate::error::WorldError;
use crate::math::{Mat2x2, Vec2};
use crate::world::World;

/// A point-to-point (revolute anchor) constraint between two bodies.
///
/// The world-space anchor given at creation time is frozen into each body's
/// local frame; the solver then drives the two world-space anchor points
/// back together. Bodies are referenced by id, never owned.
#[derive(Debug, Clone, Copy)]
pub struct Joint {
    pub body_a: usize,
    pub body_b: usize,

    local_anchor_a: Vec2,
    local_anchor_b: Vec2,

    // Per-step solver state.
    m: Mat2x2,
    r_a: Vec2,
    r_b: Vec2,
    bias: Vec2,

    /// Baumgarte factor: fraction of the positional anchor error converted
    /// into a corrective velocity each step. Instant correction would
    /// destabilize the velocity solve.
    pub bias_factor: f32,
    /// Constraint softness added to the effective mass diagonal.
    pub softness: f32,

    accumulated_impulse: Vec2,
}

impl Joint {
    /// Creates a joint between two registered bodies, anchored at a point
    /// given in world space. Fails if either body is not registered in
    /// `world`, if both ids name the same body, or if both bodies are
    /// static (the effective mass matrix would be singular).
    pub fn new(
        body_a: usize,
        body_b: usize,
        anchor: Vec2,
        world: &World,
    ) -> Result<Self, WorldError> {
        if body_a == body_b {
            return Err(WorldError::SelfJoint(body_a));
        }
        let a = world
            .get_body(body_a)
            .ok_or(WorldError::UnregisteredBody(body_a))?;
        let b = world
            .get_body(body_b)
            .ok_or(WorldError::UnregisteredBody(body_b))?;
        if a.is_static() && b.is_static() {
            return Err(WorldError::StaticJointPair(body_a, body_b));
        }

        let rot_a_t = Mat2x2::from_angle(a.rotation).transpose();
        let rot_b_t = Mat2x2::from_angle(b.rotation).transpose();

        Ok(Self {
            body_a,
            body_b,
            local_anchor_a: rot_a_t * (anchor - a.position),
            local_anchor_b: rot_b_t * (anchor - b.position),
            m: Mat2x2::ZERO,
            r_a: Vec2::ZERO,
            r_b: Vec2::ZERO,
            bias: Vec2::ZERO,
            bias_factor: 0.2,
            softness: 0.0,
            accumulated_impulse: Vec2::ZERO,
        })
    }

    /// The two anchor points in world space. They coincide when the
    /// constraint is satisfied.
    pub fn world_anchors(&self, body_a: &Body, body_b: &Body) -> (Vec2, Vec2) {
        let rot_a = Mat2x2::from_angle(body_a.rotation);
        let rot_b = Mat2x2::from_angle(body_b.rotation);
        (
            body_a.position + rot_a * self.local_anchor_a,
            body_b.position + rot_b * self.local_anchor_b,
        )
    }

    /// Builds the 2x2 effective mass matrix and bias for this step and warm
    /// starts with the accumulated impulse.
    pub fn pre_step(&mut self, body_a: &mut Body, body_b: &mut Body, inv_dt: f32) {
        let rot_a = Mat2x2::from_angle(body_a.rotation);
        let rot_b = Mat2x2::from_angle(body_b.rotation);

        self.r_a = rot_a * self.local_anchor_a;
        self.r_b = rot_b * self.local_anchor_b;

        // K = [(1/m1 + 1/m2) * eye(2)] + invI1 * skew(r1) + invI2 * skew(r2)
        let inv_mass_sum = body_a.inv_mass() + body_b.inv_mass();
        let k1 = Mat2x2::new(inv_mass_sum, 0.0, 0.0, inv_mass_sum);
        let k2 = body_a.inv_inertia()
            * Mat2x2::new(
                self.r_a.y * self.r_a.y,
                -self.r_a.x * self.r_a.y,
                -self.r_a.x * self.r_a.y,
                self.r_a.x * self.r_a.x,
            );
        let k3 = body_b.inv_inertia()
            * Mat2x2::new(
                self.r_b.y * self.r_b.y,
                -self.r_b.x * self.r_b.y,
                -self.r_b.x * self.r_b.y,
                self.r_b.x * self.r_b.x,
            );
        let mut k = k1 + k2 + k3;
        k.col1.x += self.softness;
        k.col2.y += self.softness;

        self.m = k.invert();

        let p_a = body_a.position + self.r_a;
        let p_b = body_b.position + self.r_b;
        let dp = p_b - p_a;

        self.bias = if World::POSITION_CORRECTION {
            -self.bias_factor * inv_dt * dp
        } else {
            Vec2::ZERO
        };

        if World::WARM_STARTING {
            let impulse = self.accumulated_impulse;

            body_a.velocity -= body_a.inv_mass() * impulse;
            body_a.angular_velocity -= body_a.inv_inertia() * self.r_a.cross(impulse);

            body_b.velocity += body_b.inv_mass() * impulse;
            body_b.angular_velocity += body_b.inv_inertia() * self.r_b.cross(impulse);
        } else {
            self.accumulated_impulse = Vec2::ZERO;
        }
    }

    /// One velocity-constraint pass: drives the relative anchor velocity to
    /// the bias target.
    pub fn apply_impulse(&mut self, body_a: &mut Body, body_b: &mut Body) {
        // Relative velocity of the two anchor points.
        let dv = body_b.velocity + Vec2::scalar_cross(body_b.angular_velocity, self.r_b)
            - body_a.velocity
            - Vec2::scalar_cross(body_a.angular_velocity, self.r_a);

        let impulse = self.m * (self.bias - dv - self.softness * self.accumulated_impulse);

        body_a.velocity -= body_a.inv_mass() * impulse;
        body_a.angular_velocity -= body_a.inv_inertia() * self.r_a.cross(impulse);

        body_b.velocity += body_b.inv_mass() * impulse;
        body_b.angular_velocity += body_b.inv_inertia() * self.r_b.cross(impulse);

        self.accumulated_impulse += impulse;
    }
}
