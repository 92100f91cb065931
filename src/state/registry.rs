//! Type-tag registries for persistence
//!
//! Every persistable scene, layer and component type registers a pair of
//! functions under its tag: one to rebuild an instance from saved data and
//! one to produce that data from a live instance. Saving dispatches off the
//! live value's `type_tag`, loading off the tag stored in the document.

use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::scene::{Component, Layer, LayerKey, ObjectKey, Scene};
use crate::state::StateError;

/// Construct an empty scene from its saved `data` field
pub type SceneConstructFn = fn(&Value) -> Result<Scene, StateError>;
/// Produce a scene's `data` field
pub type SceneSaveFn = fn(&Scene) -> Result<Value, StateError>;

/// Rebuild a layer into a scene from its id and saved `data` field
pub type LayerLoadFn = fn(&mut Scene, &str, &Value) -> Result<LayerKey, StateError>;
/// Produce a layer's `data` field
pub type LayerSaveFn = fn(&Layer) -> Result<Value, StateError>;

/// Rebuild a component onto an object from its saved `data` field
pub type ComponentLoadFn = fn(&mut Scene, ObjectKey, &Value) -> Result<(), StateError>;
/// Produce a component's `data` field
pub type ComponentSaveFn = fn(&dyn Component) -> Result<Value, StateError>;

/// Registered load/save function pairs, keyed by type tag.
#[derive(Default)]
pub struct StateRegistry {
    scenes: FxHashMap<String, (SceneConstructFn, SceneSaveFn)>,
    layers: FxHashMap<String, (LayerLoadFn, LayerSaveFn)>,
    components: FxHashMap<String, (ComponentLoadFn, ComponentSaveFn)>,
}

impl StateRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a scene type.
    ///
    /// Registering a tag twice is an error; the first registration stands.
    pub fn register_scene(
        &mut self,
        tag: impl Into<String>,
        construct: SceneConstructFn,
        save: SceneSaveFn,
    ) -> Result<(), StateError> {
        let tag = tag.into();
        if self.scenes.contains_key(&tag) {
            log::error!("scene type '{tag}' registered twice");
            return Err(StateError::DuplicateRegistration { kind: "scene", tag });
        }
        self.scenes.insert(tag, (construct, save));
        Ok(())
    }

    /// Register a layer type
    pub fn register_layer(
        &mut self,
        tag: impl Into<String>,
        load: LayerLoadFn,
        save: LayerSaveFn,
    ) -> Result<(), StateError> {
        let tag = tag.into();
        if self.layers.contains_key(&tag) {
            log::error!("layer type '{tag}' registered twice");
            return Err(StateError::DuplicateRegistration { kind: "layer", tag });
        }
        self.layers.insert(tag, (load, save));
        Ok(())
    }

    /// Register a component type
    pub fn register_component(
        &mut self,
        tag: impl Into<String>,
        load: ComponentLoadFn,
        save: ComponentSaveFn,
    ) -> Result<(), StateError> {
        let tag = tag.into();
        if self.components.contains_key(&tag) {
            log::error!("component type '{tag}' registered twice");
            return Err(StateError::DuplicateRegistration {
                kind: "component",
                tag,
            });
        }
        self.components.insert(tag, (load, save));
        Ok(())
    }

    /// Look up a scene type's functions
    #[must_use]
    pub fn scene_fns(&self, tag: &str) -> Option<(SceneConstructFn, SceneSaveFn)> {
        self.scenes.get(tag).copied()
    }

    /// Look up a layer type's functions
    #[must_use]
    pub fn layer_fns(&self, tag: &str) -> Option<(LayerLoadFn, LayerSaveFn)> {
        self.layers.get(tag).copied()
    }

    /// Look up a component type's functions
    #[must_use]
    pub fn component_fns(&self, tag: &str) -> Option<(ComponentLoadFn, ComponentSaveFn)> {
        self.components.get(tag).copied()
    }
}
