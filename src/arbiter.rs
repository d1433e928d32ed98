use crate::body::Body;
use crate::collide::{self, Contact};
use crate::math::Vec2;
use crate::world::World;

/// Ordered pair of body ids identifying one arbiter in the world's contact
/// cache. `Ord` gives the cache a deterministic iteration order, which the
/// solver relies on for reproducible trajectories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ArbiterKey {
    pub body1: usize,
    pub body2: usize,
}

impl ArbiterKey {
    pub fn new(body1: usize, body2: usize) -> Self {
        // Keep body1 as the lower id so that (a, b) and (b, a) map to the
        // same cache slot.
        if body1 < body2 {
            ArbiterKey { body1, body2 }
        } else {
            ArbiterKey {
                body1: body2,
                body2: body1,
            }
        }
    }
}

pub const MAX_POINTS: usize = 2;

/// The persistent contact set for one pair of bodies: up to two manifold
/// points plus the combined friction coefficient.
#[derive(Debug, Clone, Copy)]
pub struct Arbiter {
    pub contacts: [Contact; MAX_POINTS],
    pub num_contacts: usize,
    /// Geometric mean of the two bodies' friction coefficients.
    pub friction: f32,
}

impl Arbiter {
    /// Runs narrow-phase collision for the pair. Callers pass the bodies in
    /// id order; the world's broad phase guarantees this.
    pub fn new(body1: &Body, body2: &Body) -> Self {
        let mut contacts = [Contact::default(); MAX_POINTS];
        let num_contacts = collide::collide(&mut contacts, body1, body2);
        let friction = (body1.friction() * body2.friction()).sqrt();

        Self {
            contacts,
            num_contacts,
            friction,
        }
    }

    /// Replaces this arbiter's contacts with a fresh manifold, carrying the
    /// accumulated impulses over for any point whose feature id survived.
    pub fn update(&mut self, new_contacts: &[Contact], num_new_contacts: usize) {
        let mut merged_contacts = [Contact::default(); MAX_POINTS];

        for i in 0..num_new_contacts {
            let c_new = new_contacts[i];
            let mut k = None;
            for j in 0..self.num_contacts {
                let c_old = self.contacts[j];
                if c_new.feature_pair == c_old.feature_pair {
                    k = Some(j);
                    break;
                }
            }

            let c = &mut merged_contacts[i];
            *c = c_new;
            if let Some(k) = k {
                if World::WARM_STARTING {
                    let c_old = self.contacts[k];
                    c.accumulated_impulse_normal = c_old.accumulated_impulse_normal;
                    c.accumulated_impulse_tangent = c_old.accumulated_impulse_tangent;
                }
            }
        }

        self.contacts = merged_contacts;
        self.num_contacts = num_new_contacts;
    }

    /// Computes effective masses and the Baumgarte bias for each point, and
    /// applies the previous frame's accumulated impulses (warm start).
    pub fn pre_step(&mut self, body1: &mut Body, body2: &mut Body, inv_dt: f32) {
        const ALLOWED_PENETRATION: f32 = 0.01;
        let bias_factor = if World::POSITION_CORRECTION { 0.2 } else { 0.0 };

        for c in self.contacts.iter_mut().take(self.num_contacts) {
            let r1 = c.position - body1.position;
            let r2 = c.position - body2.position;

            // Precompute normal mass, tangent mass, and bias.
            let rn1 = r1.dot(c.normal);
            let rn2 = r2.dot(c.normal);
            let mut k_normal = body1.inv_mass() + body2.inv_mass();
            k_normal += body1.inv_inertia() * (r1.dot(r1) - rn1 * rn1)
                + body2.inv_inertia() * (r2.dot(r2) - rn2 * rn2);

            c.mass_normal = 1.0 / k_normal;

            let tangent = c.normal.cross_scalar(1.0);
            let rt1 = r1.dot(tangent);
            let rt2 = r2.dot(tangent);
            let mut k_tangent = body1.inv_mass() + body2.inv_mass();
            k_tangent += body1.inv_inertia() * (r1.dot(r1) - rt1 * rt1)
                + body2.inv_inertia() * (r2.dot(r2) - rt2 * rt2);
            c.mass_tangent = 1.0 / k_tangent;

            c.bias = -bias_factor * inv_dt * (c.separation + ALLOWED_PENETRATION).min(0.0);

            if World::ACCUMULATE_IMPULSES {
                // Apply normal + friction impulse
                let accumulated_impulse = c.accumulated_impulse_normal * c.normal
                    + c.accumulated_impulse_tangent * tangent;

                body1.velocity -= body1.inv_mass() * accumulated_impulse;
                body1.angular_velocity -= body1.inv_inertia() * r1.cross(accumulated_impulse);

                body2.velocity += body2.inv_mass() * accumulated_impulse;
                body2.angular_velocity += body2.inv_inertia() * r2.cross(accumulated_impulse);
            }
        }
    }

    /// One sequential-impulse pass over the manifold: normal impulse with
    /// incremental clamping, then friction clamped against the accumulated
    /// normal impulse.
    pub fn apply_impulse(&mut self, body1: &mut Body, body2: &mut Body) {
        for c in self.contacts.iter_mut().take(self.num_contacts) {
            c.r1 = c.position - body1.position;
            c.r2 = c.position - body2.position;

            // Relative velocity at contact
            let dv = body2.velocity + Vec2::scalar_cross(body2.angular_velocity, c.r2)
                - body1.velocity
                - Vec2::scalar_cross(body1.angular_velocity, c.r1);

            // Compute normal impulse
            let vn = dv.dot(c.normal);
            let mut impulse_normal = c.mass_normal * (-vn + c.bias);

            if World::ACCUMULATE_IMPULSES {
                // Clamp the accumulated impulse
                let accumulated_impulse_normal0 = c.accumulated_impulse_normal;
                c.accumulated_impulse_normal =
                    (c.accumulated_impulse_normal + impulse_normal).max(0.0);
                impulse_normal = c.accumulated_impulse_normal - accumulated_impulse_normal0;
            } else {
                impulse_normal = impulse_normal.max(0.0);
            }

            // Apply contact impulse
            let impulse = impulse_normal * c.normal;

            body1.velocity -= body1.inv_mass() * impulse;
            body1.angular_velocity -= body1.inv_inertia() * c.r1.cross(impulse);

            body2.velocity += body2.inv_mass() * impulse;
            body2.angular_velocity += body2.inv_inertia() * c.r2.cross(impulse);

            // Relative velocity at contact
            let dv = body2.velocity + Vec2::scalar_cross(body2.angular_velocity, c.r2)
                - body1.velocity
                - Vec2::scalar_cross(body1.angular_velocity, c.r1);

            // Compute tangent impulse
            let tangent = c.normal.cross_scalar(1.0);
            let vt = dv.dot(tangent);
            let mut impulse_tangent = c.mass_tangent * (-vt);

            if World::ACCUMULATE_IMPULSES {
                // Compute friction impulse
                let max_accumulated_impulse_tangent = self.friction * c.accumulated_impulse_normal;

                // Clamp friction
                let old_tangent_impulse = c.accumulated_impulse_tangent;
                c.accumulated_impulse_tangent = (old_tangent_impulse + impulse_tangent).clamp(
                    -max_accumulated_impulse_tangent,
                    max_accumulated_impulse_tangent,
                );
                impulse_tangent = c.accumulated_impulse_tangent - old_tangent_impulse;
            } else {
                // Compute friction impulse
                let max_impulse_tangent = self.friction * impulse_normal;

                // Clamp friction
                impulse_tangent = impulse_tangent.clamp(-max_impulse_tangent, max_impulse_tangent);
            }

            // Apply contact impulse
            let impulse = impulse_tangent * tangent;

            body1.velocity -= body1.inv_mass() * impulse;
            body1.angular_velocity -= body1.inv_inertia() * c.r1.cross(impulse);

            body2.velocity += body2.inv_mass() * impulse;
            body2.angular_velocity += body2.inv_inertia() * c.r2.cross(impulse);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn key_orders_body_ids() {
        assert_eq!(ArbiterKey::new(3, 1), ArbiterKey::new(1, 3));
        assert_eq!(ArbiterKey::new(1, 3).body1, 1);
    }

    #[test]
    fn friction_combines_as_geometric_mean() {
        let mut body1 = Body::new(Vec2::new(2.0, 2.0), 1.0).unwrap();
        let mut body2 = Body::new(Vec2::new(2.0, 2.0), 1.0).unwrap();
        body1.set_friction(0.2).unwrap();
        body2.set_friction(0.8).unwrap();
        body2.set_position(1.5, 0.0);

        let arb = Arbiter::new(&body1, &body2);
        assert_relative_eq!(arb.friction, (0.2f32 * 0.8).sqrt(), epsilon = 1e-6);
    }

    #[test]
    fn update_preserves_impulses_for_matching_features() {
        let body1 = Body::new(Vec2::new(2.0, 2.0), 1.0).unwrap();
        let mut body2 = Body::new(Vec2::new(2.0, 2.0), 1.0).unwrap();
        body2.set_position(1.5, 0.0);

        let mut arb = Arbiter::new(&body1, &body2);
        assert_eq!(arb.num_contacts, 2);
        arb.contacts[0].accumulated_impulse_normal = 5.0;
        arb.contacts[1].accumulated_impulse_tangent = -1.0;

        // Same configuration, slightly moved: feature ids survive.
        body2.set_position(1.52, 0.0);
        let fresh = Arbiter::new(&body1, &body2);
        arb.update(&fresh.contacts, fresh.num_contacts);

        assert_eq!(arb.num_contacts, 2);
        assert_relative_eq!(arb.contacts[0].accumulated_impulse_normal, 5.0);
        assert_relative_eq!(arb.contacts[1].accumulated_impulse_tangent, -1.0);
    }

    #[test]
    fn update_resets_impulses_for_new_features() {
        let body1 = Body::new(Vec2::new(2.0, 2.0), 1.0).unwrap();
        let mut body2 = Body::new(Vec2::new(2.0, 2.0), 1.0).unwrap();
        body2.set_position(1.5, 0.0);

        let mut arb = Arbiter::new(&body1, &body2);
        arb.contacts[0].accumulated_impulse_normal = 5.0;

        // Flip the pair to the other side: a different face, new features.
        body2.set_position(0.0, 1.5);
        let fresh = Arbiter::new(&body1, &body2);
        arb.update(&fresh.contacts, fresh.num_contacts);

        for c in &arb.contacts[..arb.num_contacts] {
            assert_eq!(c.accumulated_impulse_normal, 0.0);
        }
    }
}
