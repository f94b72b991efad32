//! GPU buffer management

pub mod gpu_buffer;

pub use gpu_buffer::{BufferKind, GpuBuffer};
