//! Chart aggregate: the engine contract and its value objects.

pub mod engine;
pub mod value_objects;

pub use engine::*;
pub use value_objects::*;
