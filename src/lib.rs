//! A small 2D rigid-body physics engine: oriented boxes, a revolute anchor
//! joint, and a sequential-impulse solver with warm starting.

pub mod arbiter;
pub mod body;
pub mod collide;
pub mod error;
pub mod joint;
pub mod math;
pub mod world;

pub use body::*;
pub use error::*;
pub use joint::Joint;
pub use math::*;
pub use world::*;
