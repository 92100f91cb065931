//! Scene graph: objects, components, transforms and layers
//!
//! Objects live in a generational arena keyed by [`ObjectKey`]; every
//! reference between objects, components and the renderer is a key into
//! that arena, so destruction makes references expire instead of dangle.

mod component;
mod layer;
mod object;
mod scene;
mod transform;

pub use component::{Component, ComponentCore, ComponentId};
pub use layer::Layer;
pub use object::Object;
pub use scene::Scene;
pub use transform::Transform;

slotmap::new_key_type! {
    /// Generational key of an object in a scene's arena
    pub struct ObjectKey;
    /// Generational key of a layer in a scene's arena
    pub struct LayerKey;
}
