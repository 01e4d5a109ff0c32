mod layout;
mod pool;
mod set;

pub use layout::{DescriptorSetLayout, DescriptorSetLayoutBinding};
pub use pool::DescriptorPool;
pub use set::DescriptorSet;
