//! Scene objects
//!
//! An object is a node in the scene tree: a string identifier, an active
//! flag, a local transform, owned child objects and owned components. Nodes
//! live in the scene's generational arena; parent and child links are arena
//! keys, never pointers, so destroying an object invalidates every
//! outstanding reference to it instead of leaving it dangling.

use std::cell::Cell;

use glam::Mat4;
use smallvec::SmallVec;

use crate::core::messages::{Command, Message, MessageResult};
use crate::scene::component::Component;
use crate::scene::transform::Transform;
use crate::scene::ObjectKey;

/// Cached world matrix validated by version stamps.
///
/// The cache is valid when both stamps match: the local transform's version
/// and the parent's world version at the time of the last recompute. An
/// ancestor mutation propagates implicitly - the parent recomputes on read,
/// which bumps its world version and fails this node's stamp check.
///
/// Interior mutability keeps `Scene::global_matrix` callable with a shared
/// reference; the scene is single-threaded per frame.
#[derive(Debug)]
pub(crate) struct MatrixCache {
    /// Last computed world matrix
    world: Cell<Mat4>,
    /// Transform version the cache was computed from
    local_stamp: Cell<u64>,
    /// Parent world version the cache was computed against (0 for roots)
    parent_stamp: Cell<u64>,
    /// Bumped every time this cache stores a fresh matrix
    world_version: Cell<u64>,
}

impl MatrixCache {
    fn new() -> Self {
        Self {
            world: Cell::new(Mat4::IDENTITY),
            // Sentinel stamps that can never match a live version, forcing
            // the first read to compute.
            local_stamp: Cell::new(u64::MAX),
            parent_stamp: Cell::new(u64::MAX),
            world_version: Cell::new(0),
        }
    }

    pub(crate) fn is_valid(&self, local_version: u64, parent_version: u64) -> bool {
        self.local_stamp.get() == local_version && self.parent_stamp.get() == parent_version
    }

    pub(crate) fn world(&self) -> Mat4 {
        self.world.get()
    }

    pub(crate) fn world_version(&self) -> u64 {
        self.world_version.get()
    }

    pub(crate) fn store(&self, world: Mat4, local_version: u64, parent_version: u64) {
        self.world.set(world);
        self.local_stamp.set(local_version);
        self.parent_stamp.set(parent_version);
        self.world_version.set(self.world_version.get() + 1);
    }
}

/// A node in the scene tree.
pub struct Object {
    /// Identifier; unique among siblings by convention, not enforced
    id: String,
    /// Own active flag; effective activity also requires every ancestor's
    active: bool,
    /// Local transform relative to the parent
    transform: Transform,
    /// Parent key; `None` for scene roots
    parent: Option<ObjectKey>,
    /// Owned children, in creation order
    children: SmallVec<[ObjectKey; 8]>,
    /// Owned components, in attachment order
    components: Vec<Box<dyn Component>>,
    /// World-matrix cache
    pub(crate) cache: MatrixCache,
}

impl Object {
    pub(crate) fn new(id: String, parent: Option<ObjectKey>) -> Self {
        Self {
            id,
            active: true,
            transform: Transform::new(),
            parent,
            children: SmallVec::new(),
            components: Vec::new(),
            cache: MatrixCache::new(),
        }
    }

    /// Object identifier
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Rename the object
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    /// Own active flag.
    ///
    /// Descendants compute effective activity as their own flag AND the
    /// parent's effective activity; see
    /// [`Scene::is_effectively_active`](crate::scene::Scene::is_effectively_active).
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Set the active flag and notify every owned component through its
    /// `set_active` hook.
    ///
    /// Descendants' stored flags are untouched; they merely become
    /// effectively inactive while an ancestor is off.
    pub fn set_active(&mut self, active: bool) {
        if self.active == active {
            return;
        }
        self.active = active;
        for component in &mut self.components {
            component.set_active(active);
        }
    }

    /// Local transform
    #[must_use]
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Local transform, mutably; any mutation invalidates the cached world
    /// matrix of this object and, transitively, of all descendants
    pub fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }

    /// Parent key, if not a scene root
    #[must_use]
    pub fn parent(&self) -> Option<ObjectKey> {
        self.parent
    }

    pub(crate) fn set_parent(&mut self, parent: Option<ObjectKey>) {
        self.parent = parent;
        // The world matrix means something different under a new parent.
        self.transform.touch();
    }

    /// Child keys in creation order
    #[must_use]
    pub fn children(&self) -> &[ObjectKey] {
        &self.children
    }

    pub(crate) fn add_child(&mut self, child: ObjectKey) {
        self.children.push(child);
    }

    pub(crate) fn remove_child(&mut self, child: ObjectKey) {
        if let Some(pos) = self.children.iter().position(|&c| c == child) {
            self.children.remove(pos);
        }
    }

    // -------------------------------------------------------------------------
    // Components
    // -------------------------------------------------------------------------

    /// Owned components in attachment order
    #[must_use]
    pub fn components(&self) -> &[Box<dyn Component>] {
        &self.components
    }

    /// Owned components, mutably
    pub fn components_mut(&mut self) -> &mut [Box<dyn Component>] {
        &mut self.components
    }

    pub(crate) fn push_component(&mut self, component: Box<dyn Component>) {
        self.components.push(component);
    }

    /// First component of concrete type `T`
    #[must_use]
    pub fn component<T: Component>(&self) -> Option<&T> {
        self.components
            .iter()
            .find_map(|c| c.as_any().downcast_ref::<T>())
    }

    /// First component of concrete type `T`, mutably
    pub fn component_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.components
            .iter_mut()
            .find_map(|c| c.as_any_mut().downcast_mut::<T>())
    }

    /// Drop components flagged for removal.
    ///
    /// Called by the scene at its sweep point, never during iteration.
    pub(crate) fn sweep_components(&mut self) {
        self.components.retain(|c| !c.is_removal_flagged());
    }

    // -------------------------------------------------------------------------
    // Messaging
    // -------------------------------------------------------------------------

    /// Deliver a message to this object and/or its components, per the
    /// message's target selector and id filter.
    pub fn send_message(&mut self, message: &Message) -> MessageResult {
        let mut result = MessageResult::Unhandled;

        if message.target.includes_objects() && message.matches_object(&self.id) {
            result = result.combine(self.interpret(&message.command));
        }

        if message.target.includes_components() && message.matches_object(&self.id) {
            for component in &mut self.components {
                if component.is_removal_flagged() {
                    continue;
                }
                result = result.combine(component.receive_message(message));
            }
        }

        result
    }

    /// Interpret a structural command on the object itself
    fn interpret(&mut self, command: &Command) -> MessageResult {
        match command {
            Command::SetActive(active) => {
                self.set_active(*active);
                MessageResult::Handled
            }
            Command::SetId(id) => {
                self.id = id.clone();
                MessageResult::Handled
            }
            Command::Translate(delta) => {
                self.transform.translate(*delta);
                MessageResult::Handled
            }
            Command::SetPosition(position) => {
                self.transform.set_position(*position);
                MessageResult::Handled
            }
            Command::SetRotation(rotation) => {
                self.transform.set_rotation(*rotation);
                MessageResult::Handled
            }
            Command::SetScale(scale) => {
                self.transform.set_scale(*scale);
                MessageResult::Handled
            }
            Command::Signal(_) => MessageResult::Unhandled,
        }
    }
}
