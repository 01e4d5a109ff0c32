mod feature;
mod messenger;

pub use feature::{DebugFeature, ValidationConfig};
pub use messenger::DebugMessenger;
