mod basic_shapes;

pub use basic_shapes::{basic_shapes, RAY_TYPES};
