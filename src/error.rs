use thiserror::Error;

/// Errors raised while constructing or mutating a body.
///
/// Copy + static payloads for cheap propagation.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum BodyError {
    #[error("invalid mass: {0} (must be positive, or infinite for a static body)")]
    InvalidMass(f32),

    #[error("degenerate shape: {width}x{height} (extents must be positive)")]
    DegenerateShape { width: f32, height: f32 },

    #[error("invalid friction coefficient: {0} (must be non-negative)")]
    InvalidFriction(f32),
}

/// Errors raised by world registration and stepping.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum WorldError {
    #[error("invalid timestep: {0} (must be positive and finite)")]
    InvalidTimestep(f32),

    #[error("body {0} is not registered in this world")]
    UnregisteredBody(usize),

    #[error("body is already registered with id {0}")]
    AlreadyRegistered(usize),

    #[error("joint connects body {0} to itself")]
    SelfJoint(usize),

    #[error("joint between static bodies {0} and {1} cannot be solved")]
    StaticJointPair(usize, usize),

    #[error("numerical instability: non-finite state on body {0}")]
    NumericalInstability(usize),
}
