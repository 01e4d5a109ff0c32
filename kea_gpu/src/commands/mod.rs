mod buffer;
mod pool;
mod recorder;

pub use buffer::{CommandBuffer, RecordedCommandBuffer, SubmittedCommandBuffer};
pub use pool::CommandPool;
pub use recorder::CommandBufferRecorder;
