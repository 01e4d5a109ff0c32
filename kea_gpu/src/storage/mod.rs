pub mod buffers;
mod commands;
pub mod images;
pub mod memory;
