use crate::error::BodyError;
use crate::math::Vec2;

/// A rigid body with an oriented box shape.
///
/// Dynamic state (pose, velocities, force accumulators) is freely mutable;
/// mass properties are fixed at construction so that the inverse mass and
/// inverse inertia always agree with the mass and shape.
#[derive(Debug, Clone)]
pub struct Body {
    pub(crate) id: Option<usize>,

    pub position: Vec2,
    pub rotation: f32,

    pub velocity: Vec2,
    pub angular_velocity: f32,

    pub force: Vec2,
    pub torque: f32,

    size: Vec2,
    friction: f32,

    mass: f32,
    inv_mass: f32,

    /// Moment of inertia (I)
    ///
    /// The rotational inertia of a body is the tendency of that body to
    /// resist changes in its rotational motion. This is the rotational
    /// equivalent of mass.
    inertia: f32,

    /// Inverse moment of inertia (I^-1)
    inv_inertia: f32,
}

impl Body {
    /// Mass sentinel for an immovable (static) body.
    pub const INFINITE_MASS: f32 = f32::INFINITY;

    /// Creates a body from box extents (width, height) and mass.
    ///
    /// A mass of [`Body::INFINITE_MASS`] makes the body static. Any mass at
    /// or above `f32::MAX` is treated the same way, since binding layers
    /// that cannot express infinity pass `f32::MAX` instead.
    pub fn new(size: Vec2, mass: f32) -> Result<Self, BodyError> {
        if !(size.x > 0.0) || !(size.y > 0.0) || !size.is_finite() {
            return Err(BodyError::DegenerateShape {
                width: size.x,
                height: size.y,
            });
        }
        if !(mass > 0.0) {
            return Err(BodyError::InvalidMass(mass));
        }

        let (mass, inv_mass, inertia, inv_inertia) = if mass >= f32::MAX {
            (f32::INFINITY, 0.0, f32::INFINITY, 0.0)
        } else {
            let inertia = mass * size.dot(size) / 12.0;
            (mass, mass.recip(), inertia, inertia.recip())
        };

        Ok(Self {
            id: None,

            position: Vec2::ZERO,
            rotation: 0.0,

            velocity: Vec2::ZERO,
            angular_velocity: 0.0,

            force: Vec2::ZERO,
            torque: 0.0,

            size,
            friction: 0.2,

            mass,
            inv_mass,
            inertia,
            inv_inertia,
        })
    }

    pub fn set_position(&mut self, x: f32, y: f32) {
        self.position = Vec2::new(x, y);
    }

    pub fn set_rotation(&mut self, theta: f32) {
        self.rotation = theta;
    }

    pub fn set_friction(&mut self, mu: f32) -> Result<(), BodyError> {
        if !(mu >= 0.0) || !mu.is_finite() {
            return Err(BodyError::InvalidFriction(mu));
        }
        self.friction = mu;
        Ok(())
    }

    /// Accumulates an external force applied during the next step.
    pub fn add_force(&mut self, force: Vec2) {
        self.force += force;
    }

    /// Accumulates an external torque applied during the next step.
    pub fn add_torque(&mut self, torque: f32) {
        self.torque += torque;
    }

    /// The id assigned at registration, `None` until the body is added to a
    /// world.
    #[inline]
    pub fn id(&self) -> Option<usize> {
        self.id
    }

    #[inline]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Box extents as (width, height).
    #[inline]
    pub fn size(&self) -> Vec2 {
        self.size
    }

    #[inline]
    pub fn mass(&self) -> f32 {
        self.mass
    }

    #[inline]
    pub fn friction(&self) -> f32 {
        self.friction
    }

    #[inline]
    pub fn inv_mass(&self) -> f32 {
        self.inv_mass
    }

    #[inline]
    pub fn inertia(&self) -> f32 {
        self.inertia
    }

    #[inline]
    pub fn inv_inertia(&self) -> f32 {
        self.inv_inertia
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        self.inv_mass == 0.0
    }
}

impl PartialEq for Body {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finite_mass_properties() {
        let body = Body::new(Vec2::new(1.0, 1.0), 12.0).unwrap();
        assert_eq!(body.mass(), 12.0);
        assert_eq!(body.inv_mass(), 1.0 / 12.0);
        // I = m * (w^2 + h^2) / 12
        assert_eq!(body.inv_inertia(), 0.5);
        assert!(!body.is_static());
    }

    #[test]
    fn infinite_mass_is_static() {
        let body = Body::new(Vec2::new(2.0, 2.0), Body::INFINITE_MASS).unwrap();
        assert_eq!(body.inv_mass(), 0.0);
        assert_eq!(body.inv_inertia(), 0.0);
        assert!(body.is_static());
    }

    #[test]
    fn f32_max_mass_is_treated_as_static() {
        let body = Body::new(Vec2::new(2.0, 2.0), f32::MAX).unwrap();
        assert_eq!(body.inv_mass(), 0.0);
        assert!(body.is_static());
    }

    #[test]
    fn rejects_non_positive_mass() {
        assert_eq!(
            Body::new(Vec2::new(1.0, 1.0), 0.0),
            Err(BodyError::InvalidMass(0.0))
        );
        assert_eq!(
            Body::new(Vec2::new(1.0, 1.0), -3.0),
            Err(BodyError::InvalidMass(-3.0))
        );
        assert!(matches!(
            Body::new(Vec2::new(1.0, 1.0), f32::NAN),
            Err(BodyError::InvalidMass(_))
        ));
    }

    #[test]
    fn rejects_degenerate_shape() {
        assert!(matches!(
            Body::new(Vec2::new(0.0, 1.0), 1.0),
            Err(BodyError::DegenerateShape { .. })
        ));
        assert!(matches!(
            Body::new(Vec2::new(1.0, -2.0), 1.0),
            Err(BodyError::DegenerateShape { .. })
        ));
        assert!(matches!(
            Body::new(Vec2::new(f32::NAN, 1.0), 1.0),
            Err(BodyError::DegenerateShape { .. })
        ));
    }

    #[test]
    fn rejects_negative_friction() {
        let mut body = Body::new(Vec2::new(1.0, 1.0), 1.0).unwrap();
        assert_eq!(body.set_friction(-0.1), Err(BodyError::InvalidFriction(-0.1)));
        assert!(body.set_friction(0.0).is_ok());
        assert!(body.set_friction(0.8).is_ok());
        assert_eq!(body.friction(), 0.8);
    }
}
