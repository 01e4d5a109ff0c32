mod buffer;
mod transfer_buffer;
mod unallocated_buffer;

pub use buffer::Buffer;
pub use transfer_buffer::TransferBuffer;
pub use unallocated_buffer::UnallocatedBuffer;
