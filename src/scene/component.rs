//! Component base contract
//!
//! A component is a unit of behavior bound to exactly one object. Components
//! are never constructed standalone: every constructor takes the owning
//! object's key, and attachment goes through
//! [`Scene::attach_component`](crate::scene::Scene::attach_component).
//!
//! The owner reference is a generational [`ObjectKey`]; once the object is
//! destroyed the key no longer resolves, so a component can never observe a
//! dangling owner - `scene.object(component.object())` reports expired
//! (`None`) instead.

use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::core::messages::{Message, MessageResult};
use crate::renderer::{CameraComponent, Drawable, EnvironmentRecorder, LightSource};
use crate::scene::ObjectKey;

/// Process-unique component identifier.
///
/// Stable across the component's whole life; used by the renderer's binding
/// sets to refer to components without borrowing them.
pub type ComponentId = u64;

static NEXT_COMPONENT_ID: AtomicU64 = AtomicU64::new(1);

/// State every component carries: identity, owner and lifecycle flags.
///
/// Concrete components embed one of these and expose it through
/// [`Component::core`]; the trait's provided methods delegate to it.
#[derive(Debug, Clone)]
pub struct ComponentCore {
    /// Identifier; not required to be unique on an object
    id: String,
    /// Owning object's key
    owner: ObjectKey,
    /// Process-unique id, regenerated on clone
    uid: ComponentId,
    /// Set by `remove_self`; swept at the end of the scene update
    removal_flagged: bool,
}

impl ComponentCore {
    /// Create core state bound to an owner
    #[must_use]
    pub fn new(owner: ObjectKey, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            owner,
            uid: NEXT_COMPONENT_ID.fetch_add(1, Ordering::Relaxed),
            removal_flagged: false,
        }
    }

    /// Copy this core for a clone attached to a (possibly different) owner.
    ///
    /// The clone keeps the identifier but gets a fresh unique id and a clear
    /// removal flag.
    #[must_use]
    pub fn clone_onto(&self, new_owner: ObjectKey) -> Self {
        Self::new(new_owner, self.id.clone())
    }
}

/// Polymorphic unit of behavior bound to exactly one object.
pub trait Component: Any {
    /// Shared core state
    fn core(&self) -> &ComponentCore;

    /// Shared core state, mutably
    fn core_mut(&mut self) -> &mut ComponentCore;

    /// Registered type tag; used for persistence dispatch
    fn type_tag(&self) -> &'static str;

    /// Per-frame update; called only when the owner is effectively active
    fn update(&mut self, _delta: f32) {}

    /// Fixed-timestep update; called only when the owner is effectively active
    fn fixed_update(&mut self, _step: f32) {}

    /// Message hook
    fn receive_message(&mut self, _message: &Message) -> MessageResult {
        MessageResult::Unhandled
    }

    /// Called when the owning object's active flag flips.
    ///
    /// Components with on/off side effects (pausing a sound, releasing a
    /// capture target) react here. The default does nothing.
    fn set_active(&mut self, _active: bool) {}

    /// Produce a copy of this component attached to `new_owner`.
    ///
    /// Value state is copied; shared resources (meshes, materials, buffers)
    /// are re-bound by handle to the same underlying resource, never
    /// duplicated.
    fn clone_onto(&self, new_owner: ObjectKey) -> Box<dyn Component>;

    /// Downcast support
    fn as_any(&self) -> &dyn Any;

    /// Downcast support, mutable
    fn as_any_mut(&mut self) -> &mut dyn Any;

    // -------------------------------------------------------------------------
    // Rendering capabilities (opt-in)
    // -------------------------------------------------------------------------

    /// Drawable capability, if this component renders
    fn as_drawable(&self) -> Option<&dyn Drawable> {
        None
    }

    /// Light capability
    fn as_light(&self) -> Option<&LightSource> {
        None
    }

    /// Camera capability
    fn as_camera(&self) -> Option<&CameraComponent> {
        None
    }

    /// Environment-recorder capability
    fn as_recorder(&self) -> Option<&EnvironmentRecorder> {
        None
    }

    // -------------------------------------------------------------------------
    // Provided accessors
    // -------------------------------------------------------------------------

    /// Component identifier
    fn id(&self) -> &str {
        &self.core().id
    }

    /// Set the component identifier
    fn set_id(&mut self, id: String) {
        self.core_mut().id = id;
    }

    /// Key of the owning object.
    ///
    /// Resolve through the scene; resolution fails once the owner has been
    /// destroyed.
    fn object(&self) -> ObjectKey {
        self.core().owner
    }

    /// Process-unique id of this component instance
    fn uid(&self) -> ComponentId {
        self.core().uid
    }

    /// Flag this component for removal.
    ///
    /// The component is not deallocated immediately: the owning scene sweeps
    /// flagged components at the end of its update cycle so removal never
    /// invalidates in-progress iteration.
    fn remove_self(&mut self) {
        self.core_mut().removal_flagged = true;
    }

    /// Whether `remove_self` has been called
    fn is_removal_flagged(&self) -> bool {
        self.core().removal_flagged
    }
}
