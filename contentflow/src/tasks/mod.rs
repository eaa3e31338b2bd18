//! Task lifecycle storage.

mod registry;

pub use registry::TaskRegistry;
