//! Scene graph
//!
//! A scene owns a forest of objects (in a generational arena) and an ordered
//! list of layers. Destruction is immediate and transitive: removing an
//! object removes its whole subtree and every component on it, and the arena
//! generation check makes any key held elsewhere report expired instead of
//! resolving to freed or recycled data.
//!
//! The only deferred destruction is component self-removal, which is swept
//! at the end of [`Scene::update`] so a component can flag itself from inside
//! its own update without invalidating the iteration in progress.

use glam::{Mat4, Vec3};
use slotmap::SlotMap;

use crate::core::messages::{Message, MessageResult};
use crate::scene::component::{Component, ComponentId};
use crate::scene::layer::Layer;
use crate::scene::object::Object;
use crate::scene::{LayerKey, ObjectKey};

/// A scene: identifier/type tag, object forest and layers.
pub struct Scene {
    /// Type tag used for serialization dispatch
    type_tag: String,
    /// All objects, alive and addressable by generational key
    objects: SlotMap<ObjectKey, Object>,
    /// Root objects in creation order
    roots: Vec<ObjectKey>,
    /// All layers
    layers: SlotMap<LayerKey, Layer>,
    /// Layer order (creation order; also persistence order)
    layer_order: Vec<LayerKey>,
    /// Counter for auto-generated object identifiers
    next_auto_id: u64,
}

impl Scene {
    /// Create an empty scene with a type tag
    #[must_use]
    pub fn new(type_tag: impl Into<String>) -> Self {
        Self {
            type_tag: type_tag.into(),
            objects: SlotMap::with_key(),
            roots: Vec::new(),
            layers: SlotMap::with_key(),
            layer_order: Vec::new(),
            next_auto_id: 0,
        }
    }

    /// Type tag used for serialization dispatch
    #[must_use]
    pub fn type_tag(&self) -> &str {
        &self.type_tag
    }

    // -------------------------------------------------------------------------
    // Object creation and removal
    // -------------------------------------------------------------------------

    fn make_id(&mut self, id: &str) -> String {
        if id.is_empty() {
            self.next_auto_id += 1;
            format!("object-{}", self.next_auto_id)
        } else {
            id.to_string()
        }
    }

    /// Create a root object.
    ///
    /// An empty id gets an auto-generated one. Id collisions between
    /// siblings are allowed (lookup returns the first match) but discouraged.
    pub fn create_object(&mut self, id: &str) -> ObjectKey {
        let id = self.make_id(id);
        let key = self.objects.insert(Object::new(id, None));
        self.roots.push(key);
        key
    }

    /// Create a child of an existing object.
    ///
    /// Returns `None` if the parent key no longer resolves.
    pub fn create_child(&mut self, parent: ObjectKey, id: &str) -> Option<ObjectKey> {
        if !self.objects.contains_key(parent) {
            return None;
        }
        let id = self.make_id(id);
        let key = self.objects.insert(Object::new(id, Some(parent)));
        self.objects[parent].add_child(key);
        Some(key)
    }

    /// Remove an object, its components and its whole subtree, immediately.
    ///
    /// Every key into the subtree expires; `object()` on any of them returns
    /// `None` from here on.
    pub fn remove_object(&mut self, key: ObjectKey) {
        let Some(node) = self.objects.get(key) else {
            return;
        };

        // Detach from the parent's child list, or from the root list.
        match node.parent() {
            Some(parent_key) => {
                if let Some(parent) = self.objects.get_mut(parent_key) {
                    parent.remove_child(key);
                }
            }
            None => self.roots.retain(|&r| r != key),
        }

        // Collect the subtree, then drop every node. Components go with
        // their owners when the boxes drop.
        for k in self.collect_subtree(key) {
            self.objects.remove(k);
        }
    }

    /// Move an object and its subtree under a new parent, or to the root
    /// set with `None`.
    ///
    /// Returns `false` when either key is expired or the new parent lies
    /// inside the object's own subtree. The local transform is kept as-is,
    /// so the world matrix changes with the new parent chain.
    pub fn set_parent(&mut self, key: ObjectKey, new_parent: Option<ObjectKey>) -> bool {
        if !self.objects.contains_key(key) {
            return false;
        }
        if let Some(p) = new_parent {
            if !self.objects.contains_key(p) || self.collect_subtree(key).contains(&p) {
                return false;
            }
        }

        let old_parent = self.objects[key].parent();
        if old_parent == new_parent {
            return true;
        }

        match old_parent {
            Some(p) => {
                if let Some(node) = self.objects.get_mut(p) {
                    node.remove_child(key);
                }
            }
            None => self.roots.retain(|&r| r != key),
        }
        match new_parent {
            Some(p) => self.objects[p].add_child(key),
            None => self.roots.push(key),
        }
        self.objects[key].set_parent(new_parent);
        true
    }

    fn collect_subtree(&self, root: ObjectKey) -> Vec<ObjectKey> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(k) = stack.pop() {
            if let Some(node) = self.objects.get(k) {
                out.push(k);
                stack.extend(node.children().iter().copied());
            }
        }
        out
    }

    // -------------------------------------------------------------------------
    // Object access
    // -------------------------------------------------------------------------

    /// Resolve a key; `None` once the object has been destroyed
    #[must_use]
    pub fn object(&self, key: ObjectKey) -> Option<&Object> {
        self.objects.get(key)
    }

    /// Resolve a key mutably
    pub fn object_mut(&mut self, key: ObjectKey) -> Option<&mut Object> {
        self.objects.get_mut(key)
    }

    /// Root object keys in creation order
    #[must_use]
    pub fn roots(&self) -> &[ObjectKey] {
        &self.roots
    }

    /// Number of live objects
    #[must_use]
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// All object keys in depth-first document order
    #[must_use]
    pub fn keys_depth_first(&self) -> Vec<ObjectKey> {
        let mut out = Vec::with_capacity(self.objects.len());
        let mut stack: Vec<ObjectKey> = self.roots.iter().rev().copied().collect();
        while let Some(k) = stack.pop() {
            if let Some(node) = self.objects.get(k) {
                out.push(k);
                stack.extend(node.children().iter().rev().copied());
            }
        }
        out
    }

    /// Find the first object with a matching id, in document order
    #[must_use]
    pub fn find_object(&self, id: &str) -> Option<ObjectKey> {
        self.keys_depth_first()
            .into_iter()
            .find(|&k| self.objects[k].id() == id)
    }

    /// Find the first direct child of `parent` with a matching id
    #[must_use]
    pub fn find_child(&self, parent: ObjectKey, id: &str) -> Option<ObjectKey> {
        self.objects.get(parent)?.children().iter().copied().find(
            |&c| self.objects.get(c).is_some_and(|n| n.id() == id),
        )
    }

    // -------------------------------------------------------------------------
    // Activity
    // -------------------------------------------------------------------------

    /// Effective activity: the object's own flag AND every ancestor's.
    ///
    /// Expired keys are inactive.
    #[must_use]
    pub fn is_effectively_active(&self, key: ObjectKey) -> bool {
        let mut current = Some(key);
        while let Some(k) = current {
            let Some(node) = self.objects.get(k) else {
                return false;
            };
            if !node.is_active() {
                return false;
            }
            current = node.parent();
        }
        true
    }

    // -------------------------------------------------------------------------
    // World matrices
    // -------------------------------------------------------------------------

    /// World matrix of an object: parent's world matrix times the local
    /// matrix, memoized until any transform in the ancestor chain mutates.
    ///
    /// Expired keys yield identity.
    #[must_use]
    pub fn global_matrix(&self, key: ObjectKey) -> Mat4 {
        let Some(node) = self.objects.get(key) else {
            return Mat4::IDENTITY;
        };

        let (parent_matrix, parent_version) = match node.parent() {
            Some(parent) => (self.global_matrix(parent), self.world_version(parent)),
            None => (Mat4::IDENTITY, 0),
        };

        if node
            .cache
            .is_valid(node.transform().version(), parent_version)
        {
            return node.cache.world();
        }

        let world = parent_matrix * node.transform().local_matrix();
        node.cache
            .store(world, node.transform().version(), parent_version);
        world
    }

    fn world_version(&self, key: ObjectKey) -> u64 {
        self.objects
            .get(key)
            .map_or(0, |node| node.cache.world_version())
    }

    /// World-space position of an object
    #[must_use]
    pub fn global_position(&self, key: ObjectKey) -> Vec3 {
        self.global_matrix(key).w_axis.truncate()
    }

    // -------------------------------------------------------------------------
    // Components
    // -------------------------------------------------------------------------

    /// Attach a component to the object it was constructed for.
    ///
    /// Returns the component's process-unique id, or `None` if the owner key
    /// no longer resolves (the component is dropped in that case).
    pub fn attach_component<C: Component>(&mut self, component: C) -> Option<ComponentId> {
        let uid = component.uid();
        let owner = component.object();
        let node = self.objects.get_mut(owner)?;
        node.push_component(Box::new(component));
        Some(uid)
    }

    /// First component of type `T` on an object
    #[must_use]
    pub fn component<T: Component>(&self, key: ObjectKey) -> Option<&T> {
        self.objects.get(key)?.component::<T>()
    }

    /// First component of type `T` on an object, mutably
    pub fn component_mut<T: Component>(&mut self, key: ObjectKey) -> Option<&mut T> {
        self.objects.get_mut(key)?.component_mut::<T>()
    }

    /// Resolve a component by owner key and unique id
    #[must_use]
    pub fn component_by_uid(&self, key: ObjectKey, uid: ComponentId) -> Option<&dyn Component> {
        self.objects
            .get(key)?
            .components()
            .iter()
            .find(|c| c.uid() == uid)
            .map(AsRef::as_ref)
    }

    // -------------------------------------------------------------------------
    // Cloning
    // -------------------------------------------------------------------------

    /// Deep-copy an object and its whole subtree under the same parent.
    ///
    /// The copy gets `new_id`; descendants keep their ids. Component state is
    /// value-copied, shared resources stay shared by handle.
    pub fn clone_object(&mut self, source: ObjectKey, new_id: &str) -> Option<ObjectKey> {
        let parent = self.objects.get(source)?.parent();
        let clone = self.clone_subtree(source, parent, Some(new_id))?;
        match parent {
            Some(p) => self.objects.get_mut(p)?.add_child(clone),
            None => self.roots.push(clone),
        }
        Some(clone)
    }

    fn clone_subtree(
        &mut self,
        source: ObjectKey,
        parent: Option<ObjectKey>,
        rename: Option<&str>,
    ) -> Option<ObjectKey> {
        let (id, active, transform, child_keys) = {
            let node = self.objects.get(source)?;
            (
                rename.map_or_else(|| node.id().to_string(), str::to_string),
                node.is_active(),
                node.transform().clone(),
                node.children().to_vec(),
            )
        };

        let mut copy = Object::new(id, parent);
        copy.set_active(active);
        *copy.transform_mut() = transform;
        let key = self.objects.insert(copy);

        // Components re-bind to the new owner; clone_onto shares resources
        // by handle rather than duplicating them.
        let cloned: Vec<Box<dyn Component>> = self.objects[source]
            .components()
            .iter()
            .map(|c| c.clone_onto(key))
            .collect();
        for component in cloned {
            self.objects[key].push_component(component);
        }

        for child in child_keys {
            if let Some(child_copy) = self.clone_subtree(child, Some(key), None) {
                self.objects[key].add_child(child_copy);
            }
        }

        Some(key)
    }

    // -------------------------------------------------------------------------
    // Update
    // -------------------------------------------------------------------------

    /// Per-frame update: walk effectively-active objects in document order,
    /// update their components, then sweep components flagged for removal.
    pub fn update(&mut self, delta: f32) {
        for key in self.active_keys() {
            if let Some(node) = self.objects.get_mut(key) {
                for component in node.components_mut() {
                    if !component.is_removal_flagged() {
                        component.update(delta);
                    }
                }
            }
        }
        self.sweep();
    }

    /// Fixed-timestep update for physics-style components
    pub fn fixed_update(&mut self, step: f32) {
        for key in self.active_keys() {
            if let Some(node) = self.objects.get_mut(key) {
                for component in node.components_mut() {
                    if !component.is_removal_flagged() {
                        component.fixed_update(step);
                    }
                }
            }
        }
        self.sweep();
    }

    fn active_keys(&self) -> Vec<ObjectKey> {
        self.keys_depth_first()
            .into_iter()
            .filter(|&k| self.is_effectively_active(k))
            .collect()
    }

    /// The defined compaction point for component self-removal
    fn sweep(&mut self) {
        for (_, node) in &mut self.objects {
            node.sweep_components();
        }
    }

    // -------------------------------------------------------------------------
    // Messaging
    // -------------------------------------------------------------------------

    /// Route a message to every object in document order
    pub fn send_message(&mut self, message: &Message) -> MessageResult {
        if !message.target.includes_scene() {
            return MessageResult::Unhandled;
        }
        let mut result = MessageResult::Unhandled;
        for key in self.keys_depth_first() {
            if let Some(node) = self.objects.get_mut(key) {
                result = result.combine(node.send_message(message));
            }
        }
        result
    }

    // -------------------------------------------------------------------------
    // Layers
    // -------------------------------------------------------------------------

    /// Add a layer; layers keep creation order
    pub fn create_layer(&mut self, layer: Layer) -> LayerKey {
        let key = self.layers.insert(layer);
        self.layer_order.push(key);
        key
    }

    /// Look up a layer key by id; `None` on miss
    #[must_use]
    pub fn layer(&self, id: &str) -> Option<LayerKey> {
        self.layer_order
            .iter()
            .copied()
            .find(|&k| self.layers.get(k).is_some_and(|l| l.id() == id))
    }

    /// Resolve a layer key
    #[must_use]
    pub fn layer_ref(&self, key: LayerKey) -> Option<&Layer> {
        self.layers.get(key)
    }

    /// Resolve a layer key mutably
    pub fn layer_mut(&mut self, key: LayerKey) -> Option<&mut Layer> {
        self.layers.get_mut(key)
    }

    /// Layer keys in creation order
    #[must_use]
    pub fn layer_order(&self) -> &[LayerKey] {
        &self.layer_order
    }

    /// Remove a layer; bindings pointing at it expire
    pub fn remove_layer(&mut self, key: LayerKey) {
        self.layers.remove(key);
        self.layer_order.retain(|&k| k != key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::messages::{Command, MessageTarget};
    use crate::scene::component::ComponentCore;
    use std::any::Any;

    struct Ticker {
        core: ComponentCore,
        ticks: u32,
        fixed_ticks: u32,
        active_flips: Vec<bool>,
        remove_after: Option<u32>,
    }

    impl Ticker {
        fn new(owner: ObjectKey) -> Self {
            Self {
                core: ComponentCore::new(owner, "ticker"),
                ticks: 0,
                fixed_ticks: 0,
                active_flips: Vec::new(),
                remove_after: None,
            }
        }
    }

    impl Component for Ticker {
        fn core(&self) -> &ComponentCore {
            &self.core
        }
        fn core_mut(&mut self) -> &mut ComponentCore {
            &mut self.core
        }
        fn type_tag(&self) -> &'static str {
            "Ticker"
        }
        fn update(&mut self, _delta: f32) {
            self.ticks += 1;
            if self.remove_after.is_some_and(|n| self.ticks >= n) {
                self.remove_self();
            }
        }
        fn fixed_update(&mut self, _step: f32) {
            self.fixed_ticks += 1;
        }
        fn set_active(&mut self, active: bool) {
            self.active_flips.push(active);
        }
        fn clone_onto(&self, new_owner: ObjectKey) -> Box<dyn Component> {
            Box::new(Self {
                core: self.core.clone_onto(new_owner),
                ticks: self.ticks,
                fixed_ticks: self.fixed_ticks,
                active_flips: Vec::new(),
                remove_after: self.remove_after,
            })
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    #[test]
    fn test_create_and_find_objects() {
        let mut scene = Scene::new("test");
        let player = scene.create_object("player");
        let weapon = scene.create_child(player, "weapon").unwrap();
        let unnamed = scene.create_object("");

        assert_eq!(scene.object_count(), 3);
        assert_eq!(scene.find_object("player"), Some(player));
        assert_eq!(scene.find_object("weapon"), Some(weapon));
        assert_eq!(scene.find_child(player, "weapon"), Some(weapon));
        assert!(scene.find_object("missing").is_none());
        // Auto-generated id
        assert!(scene.object(unnamed).unwrap().id().starts_with("object-"));
    }

    #[test]
    fn test_duplicate_ids_return_first_match() {
        let mut scene = Scene::new("test");
        let first = scene.create_object("dup");
        let _second = scene.create_object("dup");
        assert_eq!(scene.find_object("dup"), Some(first));
    }

    #[test]
    fn test_remove_object_expires_subtree() {
        let mut scene = Scene::new("test");
        let root = scene.create_object("root");
        let child = scene.create_child(root, "child").unwrap();
        let grandchild = scene.create_child(child, "grandchild").unwrap();

        scene.remove_object(child);

        assert!(scene.object(child).is_none());
        assert!(scene.object(grandchild).is_none());
        assert!(scene.object(root).is_some());
        assert!(scene.object(root).unwrap().children().is_empty());
        assert_eq!(scene.object_count(), 1);
    }

    #[test]
    fn test_component_owner_expires_on_destroy() {
        let mut scene = Scene::new("test");
        let obj = scene.create_object("doomed");
        scene.attach_component(Ticker::new(obj)).unwrap();

        let owner_key = scene.component::<Ticker>(obj).unwrap().object();
        assert!(scene.object(owner_key).is_some());

        scene.remove_object(obj);
        // The stored key must report expired, not a stale object.
        assert!(scene.object(owner_key).is_none());
    }

    #[test]
    fn test_world_matrix_parent_chain() {
        let mut scene = Scene::new("test");
        let player = scene.create_object("player");
        let weapon = scene.create_child(player, "weapon").unwrap();

        scene
            .object_mut(weapon)
            .unwrap()
            .transform_mut()
            .set_position(Vec3::new(1.0, 0.0, 0.0));

        assert!((scene.global_position(weapon) - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-5);

        // Moving the parent must be visible through the child's cache.
        scene
            .object_mut(player)
            .unwrap()
            .transform_mut()
            .set_position(Vec3::new(5.0, 0.0, 0.0));

        assert!((scene.global_position(weapon) - Vec3::new(6.0, 0.0, 0.0)).length() < 1e-5);
        assert!((scene.global_position(player) - Vec3::new(5.0, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_world_matrix_composition_property() {
        let mut scene = Scene::new("test");
        let parent = scene.create_object("parent");
        let child = scene.create_child(parent, "child").unwrap();

        scene
            .object_mut(parent)
            .unwrap()
            .transform_mut()
            .set_rotation(glam::Quat::from_rotation_y(1.0));
        scene
            .object_mut(parent)
            .unwrap()
            .transform_mut()
            .set_position(Vec3::new(3.0, 1.0, -2.0));
        scene
            .object_mut(child)
            .unwrap()
            .transform_mut()
            .set_position(Vec3::new(0.0, 2.0, 0.0));

        let expected = scene.global_matrix(parent)
            * scene.object(child).unwrap().transform().local_matrix();
        let actual = scene.global_matrix(child);
        assert!(expected.abs_diff_eq(actual, 1e-5));
    }

    #[test]
    fn test_reparent_recomputes_world_matrix() {
        let mut scene = Scene::new("test");
        let a = scene.create_object("a");
        let b = scene.create_object("b");
        let item = scene.create_child(a, "item").unwrap();

        scene
            .object_mut(a)
            .unwrap()
            .transform_mut()
            .set_position(Vec3::new(5.0, 0.0, 0.0));
        scene
            .object_mut(b)
            .unwrap()
            .transform_mut()
            .set_position(Vec3::new(10.0, 0.0, 0.0));
        scene
            .object_mut(item)
            .unwrap()
            .transform_mut()
            .set_position(Vec3::new(1.0, 0.0, 0.0));

        assert!((scene.global_position(item) - Vec3::new(6.0, 0.0, 0.0)).length() < 1e-5);

        assert!(scene.set_parent(item, Some(b)));
        assert!((scene.global_position(item) - Vec3::new(11.0, 0.0, 0.0)).length() < 1e-5);
        assert!(scene.object(a).unwrap().children().is_empty());
        assert_eq!(scene.object(b).unwrap().children(), &[item]);

        assert!(scene.set_parent(item, None));
        assert!((scene.global_position(item) - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-5);
        assert!(scene.roots().contains(&item));

        // An object can never become a descendant of its own subtree.
        let leaf = scene.create_child(item, "leaf").unwrap();
        assert!(!scene.set_parent(item, Some(leaf)));
    }

    #[test]
    fn test_effective_activity() {
        let mut scene = Scene::new("test");
        let parent = scene.create_object("parent");
        let child = scene.create_child(parent, "child").unwrap();

        assert!(scene.is_effectively_active(child));

        scene.object_mut(parent).unwrap().set_active(false);
        // Child's own flag is untouched but it is effectively inactive.
        assert!(scene.object(child).unwrap().is_active());
        assert!(!scene.is_effectively_active(child));

        scene.object_mut(parent).unwrap().set_active(true);
        assert!(scene.is_effectively_active(child));
    }

    #[test]
    fn test_set_active_notifies_components() {
        let mut scene = Scene::new("test");
        let obj = scene.create_object("obj");
        scene.attach_component(Ticker::new(obj)).unwrap();

        scene.object_mut(obj).unwrap().set_active(false);
        scene.object_mut(obj).unwrap().set_active(false); // no-op, no flip
        scene.object_mut(obj).unwrap().set_active(true);

        let flips = &scene.component::<Ticker>(obj).unwrap().active_flips;
        assert_eq!(flips, &[false, true]);
    }

    #[test]
    fn test_update_skips_inactive() {
        let mut scene = Scene::new("test");
        let parent = scene.create_object("parent");
        let child = scene.create_child(parent, "child").unwrap();
        scene.attach_component(Ticker::new(child)).unwrap();

        scene.update(0.016);
        assert_eq!(scene.component::<Ticker>(child).unwrap().ticks, 1);

        scene.object_mut(parent).unwrap().set_active(false);
        scene.update(0.016);
        assert_eq!(scene.component::<Ticker>(child).unwrap().ticks, 1);
    }

    #[test]
    fn test_fixed_update_reaches_components() {
        let mut scene = Scene::new("test");
        let obj = scene.create_object("obj");
        scene.attach_component(Ticker::new(obj)).unwrap();

        scene.fixed_update(1.0 / 60.0);
        scene.fixed_update(1.0 / 60.0);
        assert_eq!(scene.component::<Ticker>(obj).unwrap().fixed_ticks, 2);
    }

    #[test]
    fn test_component_self_removal_is_deferred_to_sweep() {
        let mut scene = Scene::new("test");
        let obj = scene.create_object("obj");
        let mut ticker = Ticker::new(obj);
        ticker.remove_after = Some(1);
        scene.attach_component(ticker).unwrap();

        // The component flags itself during this update; it is gone only
        // after the sweep at the end of the same update call.
        scene.update(0.016);
        assert!(scene.component::<Ticker>(obj).is_none());
    }

    #[test]
    fn test_clone_object_deep_copies_subtree() {
        let mut scene = Scene::new("test");
        let original = scene.create_object("original");
        let child = scene.create_child(original, "attachment").unwrap();
        scene.attach_component(Ticker::new(original)).unwrap();
        scene
            .object_mut(child)
            .unwrap()
            .transform_mut()
            .set_position(Vec3::X);

        let copy = scene.clone_object(original, "copy").unwrap();

        assert_eq!(scene.object(copy).unwrap().id(), "copy");
        assert_eq!(scene.object(copy).unwrap().children().len(), 1);

        let copy_child = scene.find_child(copy, "attachment").unwrap();
        assert_ne!(copy_child, child);
        assert_eq!(
            scene.object(copy_child).unwrap().transform().position(),
            Vec3::X
        );

        // The cloned component is re-bound to the copy.
        let cloned = scene.component::<Ticker>(copy).unwrap();
        assert_eq!(cloned.object(), copy);
        assert_ne!(cloned.uid(), scene.component::<Ticker>(original).unwrap().uid());

        // Mutating the copy must not affect the original.
        scene
            .object_mut(copy_child)
            .unwrap()
            .transform_mut()
            .set_position(Vec3::Y);
        assert_eq!(
            scene.object(child).unwrap().transform().position(),
            Vec3::X
        );
    }

    #[test]
    fn test_message_routing_to_objects_and_components() {
        let mut scene = Scene::new("test");
        let player = scene.create_object("player");
        let enemy = scene.create_object("enemy");

        let msg = Message::new(MessageTarget::Objects, Command::SetPosition(Vec3::splat(2.0)))
            .filtered("player");
        assert_eq!(scene.send_message(&msg), MessageResult::Handled);

        assert_eq!(
            scene.object(player).unwrap().transform().position(),
            Vec3::splat(2.0)
        );
        assert_eq!(
            scene.object(enemy).unwrap().transform().position(),
            Vec3::ZERO
        );

        // Subsystem-only messages never reach the scene graph.
        let sub = Message::new(MessageTarget::Subsystems, Command::SetActive(false));
        assert_eq!(scene.send_message(&sub), MessageResult::Unhandled);
        assert!(scene.object(player).unwrap().is_active());
    }

    #[test]
    fn test_layer_lookup_and_binding() {
        let mut scene = Scene::new("test");
        let world = scene.create_layer(Layer::new("world", "default"));
        let hud = scene.create_layer(Layer::new("hud", "default"));

        assert_eq!(scene.layer("world"), Some(world));
        assert!(scene.layer("missing").is_none());

        scene.layer_mut(hud).unwrap().bind_other_layer(world);
        scene.layer_mut(hud).unwrap().bind_other_layer(world); // de-duplicated
        assert_eq!(scene.layer_ref(hud).unwrap().bound_layers(), &[world]);

        // Removing the bound layer leaves a stale key that no longer
        // resolves, not a dangling reference.
        scene.remove_layer(world);
        let stale = scene.layer_ref(hud).unwrap().bound_layers()[0];
        assert!(scene.layer_ref(stale).is_none());
    }
}
