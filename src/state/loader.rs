//! Saving and loading the world as a JSON document
//!
//! The document layout:
//!
//! ```json
//! {
//!   "version": "1.0",
//!   "subsystems": [],
//!   "sharedscene": { ... },
//!   "scene": {
//!     "type": "world", "data": { ... },
//!     "layers": [ { "id": "hud", "type": "plain", "data": {}, "bindings": ["world"] } ],
//!     "objects": [
//!       {
//!         "id": "player", "active": true,
//!         "transform": [px, py, pz, sx, sy, sz, qw, qx, qy, qz],
//!         "components": [ { "type": "Spin", "data": { ... } } ],
//!         "children": [ ... ]
//!       }
//!     ]
//!   }
//! }
//! ```
//!
//! Loading builds complete scenes in temporaries and returns them only on
//! full success; the caller's live state is never touched on error. Layer
//! bindings are saved as layer ids and re-linked after every layer exists.

use std::fs;
use std::io::BufWriter;
use std::path::Path;

use serde_json::{json, Value};

use crate::scene::{ObjectKey, Scene, Transform};
use crate::state::{StateError, StateRegistry};

/// Document format version
pub const STATE_VERSION: &str = "1.0";

/// Scenes rebuilt from a document, ready to swap into the engine.
pub struct LoadedState {
    pub scene: Scene,
    pub shared_scene: Option<Scene>,
}

impl std::fmt::Debug for LoadedState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedState")
            .field("scene", &self.scene.type_tag())
            .field("shared_scene", &self.shared_scene.as_ref().map(Scene::type_tag))
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Field access helpers
// -----------------------------------------------------------------------------

fn str_field<'a>(
    node: &'a Value,
    ctx: &'static str,
    field: &'static str,
) -> Result<&'a str, StateError> {
    match node.get(field) {
        None => Err(StateError::MissingField { node: ctx, field }),
        Some(v) => v
            .as_str()
            .ok_or(StateError::WrongFieldType { node: ctx, field }),
    }
}

/// A missing array field reads as empty; a present non-array is an error.
fn opt_array<'a>(
    node: &'a Value,
    ctx: &'static str,
    field: &'static str,
) -> Result<&'a [Value], StateError> {
    match node.get(field) {
        None => Ok(&[]),
        Some(Value::Array(items)) => Ok(items),
        Some(_) => Err(StateError::WrongFieldType { node: ctx, field }),
    }
}

// -----------------------------------------------------------------------------
// Saving
// -----------------------------------------------------------------------------

/// Serialize the current and shared scenes into a document.
///
/// Every scene, layer and component type reached must be registered; an
/// unregistered tag aborts the save.
pub fn save_state(
    registry: &StateRegistry,
    scene: &Scene,
    shared_scene: Option<&Scene>,
) -> Result<Value, StateError> {
    let mut doc = json!({
        "version": STATE_VERSION,
        "subsystems": [],
        "scene": save_scene(registry, scene)?,
    });
    if let (Some(shared), Value::Object(map)) = (shared_scene, &mut doc) {
        map.insert("sharedscene".into(), save_scene(registry, shared)?);
    }
    Ok(doc)
}

fn save_scene(registry: &StateRegistry, scene: &Scene) -> Result<Value, StateError> {
    let tag = scene.type_tag();
    let Some((_, save)) = registry.scene_fns(tag) else {
        log::error!("cannot save scene: type '{tag}' is not registered");
        return Err(StateError::UnregisteredType {
            kind: "scene",
            tag: tag.to_string(),
        });
    };

    let mut layers = Vec::with_capacity(scene.layer_order().len());
    for &key in scene.layer_order() {
        let Some(layer) = scene.layer_ref(key) else {
            continue;
        };
        let layer_tag = layer.type_tag();
        let Some((_, save_layer)) = registry.layer_fns(layer_tag) else {
            log::error!("cannot save layer '{}': type '{layer_tag}' is not registered", layer.id());
            return Err(StateError::UnregisteredType {
                kind: "layer",
                tag: layer_tag.to_string(),
            });
        };
        // Bindings persist as layer ids; stale keys are dropped here.
        let bindings: Vec<&str> = layer
            .bound_layers()
            .iter()
            .filter_map(|&k| scene.layer_ref(k).map(|l| l.id()))
            .collect();
        layers.push(json!({
            "id": layer.id(),
            "type": layer_tag,
            "data": save_layer(layer)?,
            "bindings": bindings,
        }));
    }

    let mut objects = Vec::with_capacity(scene.roots().len());
    for &root in scene.roots() {
        objects.push(save_object(registry, scene, root)?);
    }

    Ok(json!({
        "type": tag,
        "data": save(scene)?,
        "layers": layers,
        "objects": objects,
    }))
}

fn save_object(
    registry: &StateRegistry,
    scene: &Scene,
    key: ObjectKey,
) -> Result<Value, StateError> {
    let Some(object) = scene.object(key) else {
        return Err(StateError::MissingField {
            node: "object",
            field: "id",
        });
    };

    let mut components = Vec::with_capacity(object.components().len());
    for component in object.components() {
        let tag = component.type_tag();
        let Some((_, save)) = registry.component_fns(tag) else {
            log::error!(
                "cannot save component '{}' on '{}': type '{tag}' is not registered",
                component.id(),
                object.id()
            );
            return Err(StateError::UnregisteredType {
                kind: "component",
                tag: tag.to_string(),
            });
        };
        components.push(json!({ "type": tag, "data": save(component.as_ref())? }));
    }

    let mut children = Vec::with_capacity(object.children().len());
    for &child in object.children() {
        children.push(save_object(registry, scene, child)?);
    }

    Ok(json!({
        "id": object.id(),
        "active": object.is_active(),
        "transform": object.transform().to_floats().to_vec(),
        "components": components,
        "children": children,
    }))
}

// -----------------------------------------------------------------------------
// Loading
// -----------------------------------------------------------------------------

/// Rebuild scenes from a document.
///
/// All-or-nothing: on any error the partial scenes are dropped and `Err` is
/// returned; nothing the caller owns is modified.
pub fn load_state(registry: &StateRegistry, doc: &Value) -> Result<LoadedState, StateError> {
    let version = str_field(doc, "state", "version")?;
    if version != STATE_VERSION {
        log::warn!("state document version '{version}', expected '{STATE_VERSION}'");
    }

    let scene_node = doc.get("scene").ok_or(StateError::MissingField {
        node: "state",
        field: "scene",
    })?;
    let scene = load_scene(registry, scene_node)?;

    let shared_scene = match doc.get("sharedscene") {
        None | Some(Value::Null) => None,
        Some(node) => Some(load_scene(registry, node)?),
    };

    Ok(LoadedState {
        scene,
        shared_scene,
    })
}

fn load_scene(registry: &StateRegistry, node: &Value) -> Result<Scene, StateError> {
    let tag = str_field(node, "scene", "type")?;
    let Some((construct, _)) = registry.scene_fns(tag) else {
        log::error!("cannot load scene: type '{tag}' is not registered");
        return Err(StateError::UnregisteredType {
            kind: "scene",
            tag: tag.to_string(),
        });
    };

    let data = node.get("data").cloned().unwrap_or(Value::Null);
    let mut scene = construct(&data)?;

    for object_node in opt_array(node, "scene", "objects")? {
        load_object(registry, &mut scene, None, object_node)?;
    }

    // Layers first, bindings second: a binding may point at a layer that
    // appears later in the document.
    let layer_nodes = opt_array(node, "scene", "layers")?;
    let mut created = Vec::with_capacity(layer_nodes.len());
    for layer_node in layer_nodes {
        let id = str_field(layer_node, "layer", "id")?;
        let layer_tag = str_field(layer_node, "layer", "type")?;
        let Some((load, _)) = registry.layer_fns(layer_tag) else {
            log::error!("cannot load layer '{id}': type '{layer_tag}' is not registered");
            return Err(StateError::UnregisteredType {
                kind: "layer",
                tag: layer_tag.to_string(),
            });
        };
        let layer_data = layer_node.get("data").cloned().unwrap_or(Value::Null);
        created.push((load(&mut scene, id, &layer_data)?, layer_node));
    }
    for (key, layer_node) in created {
        for binding in opt_array(layer_node, "layer", "bindings")? {
            let Some(id) = binding.as_str() else {
                return Err(StateError::WrongFieldType {
                    node: "layer",
                    field: "bindings",
                });
            };
            match scene.layer(id) {
                Some(other) => {
                    if let Some(layer) = scene.layer_mut(key) {
                        layer.bind_other_layer(other);
                    }
                }
                None => log::warn!("layer binding '{id}' does not resolve, skipped"),
            }
        }
    }

    Ok(scene)
}

fn load_object(
    registry: &StateRegistry,
    scene: &mut Scene,
    parent: Option<ObjectKey>,
    node: &Value,
) -> Result<(), StateError> {
    let id = str_field(node, "object", "id")?;
    let key = match parent {
        Some(p) => scene.create_child(p, id).ok_or(StateError::MissingField {
            node: "object",
            field: "parent",
        })?,
        None => scene.create_object(id),
    };

    let transform_values = opt_array(node, "object", "transform")?;
    if !transform_values.is_empty() {
        if transform_values.len() != 10 {
            return Err(StateError::WrongFieldType {
                node: "object",
                field: "transform",
            });
        }
        let mut floats = [0.0f32; 10];
        for (slot, value) in floats.iter_mut().zip(transform_values) {
            *slot = value.as_f64().ok_or(StateError::WrongFieldType {
                node: "object",
                field: "transform",
            })? as f32;
        }
        if let Some(object) = scene.object_mut(key) {
            *object.transform_mut() = Transform::from_floats(&floats);
        }
    }

    let active = match node.get("active") {
        None => true,
        Some(v) => v.as_bool().ok_or(StateError::WrongFieldType {
            node: "object",
            field: "active",
        })?,
    };
    if let Some(object) = scene.object_mut(key) {
        object.set_active(active);
    }

    for component_node in opt_array(node, "object", "components")? {
        let tag = str_field(component_node, "component", "type")?;
        let Some((load, _)) = registry.component_fns(tag) else {
            log::error!("cannot load component on '{id}': type '{tag}' is not registered");
            return Err(StateError::UnregisteredType {
                kind: "component",
                tag: tag.to_string(),
            });
        };
        let data = component_node.get("data").cloned().unwrap_or(Value::Null);
        load(scene, key, &data)?;
    }

    for child_node in opt_array(node, "object", "children")? {
        load_object(registry, scene, Some(key), child_node)?;
    }

    Ok(())
}

// -----------------------------------------------------------------------------
// File helpers
// -----------------------------------------------------------------------------

/// Write a document to disk as pretty-printed JSON
pub fn save_to_file(doc: &Value, path: impl AsRef<Path>) -> Result<(), StateError> {
    let file = fs::File::create(path)?;
    serde_json::to_writer_pretty(BufWriter::new(file), doc)?;
    Ok(())
}

/// Read a document from disk
pub fn load_from_file(path: impl AsRef<Path>) -> Result<Value, StateError> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Component, ComponentCore, Layer, LayerKey};
    use glam::{Quat, Vec3};
    use std::any::Any;

    struct Spin {
        core: ComponentCore,
        speed: f32,
    }

    impl Spin {
        const TYPE_TAG: &'static str = "Spin";

        fn new(owner: ObjectKey, speed: f32) -> Self {
            Self {
                core: ComponentCore::new(owner, "spin"),
                speed,
            }
        }
    }

    impl Component for Spin {
        fn core(&self) -> &ComponentCore {
            &self.core
        }

        fn core_mut(&mut self) -> &mut ComponentCore {
            &mut self.core
        }

        fn type_tag(&self) -> &'static str {
            Self::TYPE_TAG
        }

        fn clone_onto(&self, new_owner: ObjectKey) -> Box<dyn Component> {
            Box::new(Self {
                core: self.core.clone_onto(new_owner),
                speed: self.speed,
            })
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    fn world_construct(_: &Value) -> Result<Scene, StateError> {
        Ok(Scene::new("world"))
    }

    fn world_save(_: &Scene) -> Result<Value, StateError> {
        Ok(json!({}))
    }

    fn plain_layer_load(scene: &mut Scene, id: &str, _: &Value) -> Result<LayerKey, StateError> {
        Ok(scene.create_layer(Layer::new(id, "plain")))
    }

    fn plain_layer_save(_: &Layer) -> Result<Value, StateError> {
        Ok(json!({}))
    }

    fn spin_load(scene: &mut Scene, owner: ObjectKey, data: &Value) -> Result<(), StateError> {
        let speed = data
            .get("speed")
            .and_then(Value::as_f64)
            .ok_or(StateError::MissingField {
                node: "component",
                field: "speed",
            })? as f32;
        scene.attach_component(Spin::new(owner, speed));
        Ok(())
    }

    fn spin_save(component: &dyn Component) -> Result<Value, StateError> {
        let spin = component
            .as_any()
            .downcast_ref::<Spin>()
            .ok_or(StateError::WrongFieldType {
                node: "component",
                field: "data",
            })?;
        Ok(json!({ "speed": spin.speed }))
    }

    fn registry() -> StateRegistry {
        let mut registry = StateRegistry::new();
        registry
            .register_scene("world", world_construct, world_save)
            .unwrap();
        registry
            .register_layer("plain", plain_layer_load, plain_layer_save)
            .unwrap();
        registry
            .register_component(Spin::TYPE_TAG, spin_load, spin_save)
            .unwrap();
        registry
    }

    #[test]
    fn test_save_load_round_trip() {
        let registry = registry();

        let mut scene = Scene::new("world");
        let player = scene.create_object("player");
        scene
            .object_mut(player)
            .unwrap()
            .transform_mut()
            .set_position(Vec3::new(1.0, 2.0, 3.0));
        scene
            .object_mut(player)
            .unwrap()
            .transform_mut()
            .set_rotation(Quat::from_rotation_y(0.5));
        scene.attach_component(Spin::new(player, 2.5)).unwrap();

        let weapon = scene.create_child(player, "weapon").unwrap();
        scene
            .object_mut(weapon)
            .unwrap()
            .transform_mut()
            .set_position(Vec3::new(0.0, 1.0, 0.0));

        let decoration = scene.create_object("decoration");
        scene.object_mut(decoration).unwrap().set_active(false);

        let doc = save_state(&registry, &scene, None).unwrap();
        let loaded = load_state(&registry, &doc).unwrap();
        assert!(loaded.shared_scene.is_none());

        let scene = loaded.scene;
        assert_eq!(scene.type_tag(), "world");

        let player = scene.find_object("player").unwrap();
        let transform = scene.object(player).unwrap().transform();
        assert!(transform.position().abs_diff_eq(Vec3::new(1.0, 2.0, 3.0), 1e-6));
        assert!(transform
            .rotation()
            .abs_diff_eq(Quat::from_rotation_y(0.5), 1e-6));

        let spin = scene.component::<Spin>(player).unwrap();
        assert!((spin.speed - 2.5).abs() < f32::EPSILON);

        // The weapon came back as a child of the player.
        let weapon = scene.find_object("weapon").unwrap();
        assert!(scene.object(player).unwrap().children().contains(&weapon));

        let decoration = scene.find_object("decoration").unwrap();
        assert!(!scene.object(decoration).unwrap().is_active());
    }

    #[test]
    fn test_shared_scene_round_trip() {
        let registry = registry();
        let scene = Scene::new("world");
        let mut shared = Scene::new("world");
        shared.create_object("persistent-ui");

        let doc = save_state(&registry, &scene, Some(&shared)).unwrap();
        let loaded = load_state(&registry, &doc).unwrap();

        let shared = loaded.shared_scene.unwrap();
        assert!(shared.find_object("persistent-ui").is_some());
    }

    #[test]
    fn test_layer_bindings_relinked() {
        let registry = registry();

        let mut scene = Scene::new("world");
        let world = scene.create_layer(Layer::new("world", "plain"));
        let hud = scene.create_layer(Layer::new("hud", "plain"));
        scene.layer_mut(hud).unwrap().bind_other_layer(world);

        let doc = save_state(&registry, &scene, None).unwrap();
        let loaded = load_state(&registry, &doc).unwrap().scene;

        let hud = loaded.layer("hud").unwrap();
        let bound = loaded.layer_ref(hud).unwrap().bound_layers();
        assert_eq!(bound.len(), 1);
        assert_eq!(loaded.layer_ref(bound[0]).unwrap().id(), "world");
    }

    #[test]
    fn test_unregistered_component_fails_save() {
        let registry = registry();

        let mut scene = Scene::new("world");
        let rig = scene.create_object("rig");
        scene
            .attach_component(crate::renderer::CameraComponent::new(rig))
            .unwrap();

        let err = save_state(&registry, &scene, None).unwrap_err();
        assert!(matches!(
            err,
            StateError::UnregisteredType { kind: "component", .. }
        ));
    }

    #[test]
    fn test_unregistered_scene_fails_load() {
        let registry = registry();
        let doc = json!({
            "version": STATE_VERSION,
            "subsystems": [],
            "scene": { "type": "mystery", "data": {} },
        });
        let err = load_state(&registry, &doc).unwrap_err();
        assert!(matches!(err, StateError::UnregisteredType { kind: "scene", .. }));
    }

    #[test]
    fn test_malformed_transform_rejected() {
        let registry = registry();
        let doc = json!({
            "version": STATE_VERSION,
            "scene": {
                "type": "world",
                "data": {},
                "objects": [ { "id": "broken", "transform": [1.0, 2.0, 3.0] } ],
            },
        });
        let err = load_state(&registry, &doc).unwrap_err();
        assert!(matches!(
            err,
            StateError::WrongFieldType { node: "object", field: "transform" }
        ));
    }

    #[test]
    fn test_error_mid_document_returns_err_not_partial() {
        let registry = registry();
        let doc = json!({
            "version": STATE_VERSION,
            "scene": {
                "type": "world",
                "data": {},
                "objects": [
                    { "id": "ok" },
                    { "id": "bad", "components": [ { "type": "NotRegistered" } ] },
                ],
            },
        });
        // The partially built scene never escapes.
        assert!(load_state(&registry, &doc).is_err());
    }

    #[test]
    fn test_file_round_trip() {
        let registry = registry();
        let mut scene = Scene::new("world");
        scene.create_object("saved");

        let doc = save_state(&registry, &scene, None).unwrap();
        let path = std::env::temp_dir().join("kestrel-state-test.json");
        save_to_file(&doc, &path).unwrap();

        let read_back = load_from_file(&path).unwrap();
        assert_eq!(read_back, doc);
        let _ = fs::remove_file(&path);
    }
}
