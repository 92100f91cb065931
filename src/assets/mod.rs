//! Shared-resource management
//!
//! Reference-counted resources looked up by name, referenced weakly by
//! components.

mod handle;
mod model;
mod storage;

pub use handle::{ResourceHandle, WeakResourceHandle};
pub use model::{Material, Mesh, Model};
pub use storage::{ResourceStore, Resources};
