pub mod gpu;

pub use gpu::{Gpu, GpuDescriptor, GpuError};
