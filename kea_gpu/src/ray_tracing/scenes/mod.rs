mod acceleration_structure;
mod geometry;
mod geometry_instance;
mod scene;
mod scratch_buffer;

pub use acceleration_structure::{AccelerationStructure, BuildSizes};
pub use geometry::{Aabb, Geometry, GeometryType};
pub use geometry_instance::GeometryInstance;
pub use scene::Scene;
pub use scratch_buffer::ScratchBuffer;
