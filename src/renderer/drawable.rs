//! Drawable capability and built-in drawable components

use std::any::Any;

use crate::assets::{Model, WeakResourceHandle};
use crate::renderer::device::{DrawContext, RenderDevice};
use crate::scene::{Component, ComponentCore, ObjectKey};

/// The capability a component exposes to be rendered.
///
/// The renderer filters on `is_valid` and activity every frame; a drawable
/// whose backing resource went away is skipped silently and picked up again
/// the moment it becomes valid - no "broken" state is cached.
pub trait Drawable {
    /// Render group this drawable belongs to (bit index, 0..32)
    fn render_group(&self) -> u8 {
        0
    }

    /// Whether draws of this drawable get a light list
    fn receives_lights(&self) -> bool {
        true
    }

    /// Whether the backing resources resolve right now
    fn is_valid(&self) -> bool;

    /// Bounding sphere radius for light influence tests
    fn bounding_radius(&self) -> f32 {
        1.0
    }

    /// Issue this drawable to the device
    fn draw(&self, ctx: &DrawContext<'_>, device: &mut dyn RenderDevice);
}

/// A drawable rendering a shared [`Model`].
///
/// Holds the model weakly: eviction from the resource store turns this
/// component invalid instead of dangling, and the renderer skips it.
pub struct MeshDrawable {
    core: ComponentCore,
    model: WeakResourceHandle<Model>,
    group: u8,
    receive_lights: bool,
}

impl MeshDrawable {
    /// Registered type tag
    pub const TYPE_TAG: &'static str = "MeshDrawable";

    /// Create a drawable for a model on `owner`.
    ///
    /// An expired handle is allowed; the drawable stays constructible and
    /// reports invalid until the model becomes available.
    #[must_use]
    pub fn new(owner: ObjectKey, model: WeakResourceHandle<Model>) -> Self {
        let receive_lights = model
            .upgrade()
            .is_some_and(|m| m.receives_lights());
        Self {
            core: ComponentCore::new(owner, "drawable"),
            model,
            group: 0,
            receive_lights,
        }
    }

    /// Set the render group (bit index, clamped to 0..32)
    #[must_use]
    pub fn with_group(mut self, group: u8) -> Self {
        self.group = group.min(31);
        self
    }

    /// Override whether this drawable receives lighting
    #[must_use]
    pub fn with_lighting(mut self, receive: bool) -> Self {
        self.receive_lights = receive;
        self
    }

    /// The model handle
    #[must_use]
    pub fn model(&self) -> &WeakResourceHandle<Model> {
        &self.model
    }

    /// Point the drawable at a different model
    pub fn set_model(&mut self, model: WeakResourceHandle<Model>) {
        self.model = model;
    }
}

impl Drawable for MeshDrawable {
    fn render_group(&self) -> u8 {
        self.group
    }

    fn receives_lights(&self) -> bool {
        self.receive_lights
    }

    fn is_valid(&self) -> bool {
        self.model.is_alive()
    }

    fn bounding_radius(&self) -> f32 {
        self.model
            .upgrade()
            .map_or(1.0, |m| m.bounding_radius())
    }

    fn draw(&self, ctx: &DrawContext<'_>, device: &mut dyn RenderDevice) {
        // Re-validate at issue time; the model may have been evicted between
        // subset build and draw within editor tooling flows.
        if self.model.upgrade().is_some() {
            device.draw(ctx.drawable, ctx.group, ctx.model, ctx.lights);
        }
    }
}

impl Component for MeshDrawable {
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
        // The clone references the same model resource, not a duplicate.
        Box::new(Self {
            core: self.core.clone_onto(new_owner),
            model: self.model.clone(),
            group: self.group,
            receive_lights: self.receive_lights,
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn as_drawable(&self) -> Option<&dyn Drawable> {
        Some(self)
    }
}

/// Captures the environment around its object into a cubemap.
///
/// Recording happens once per full frame in the environment stage, before
/// any camera work.
pub struct EnvironmentRecorder {
    core: ComponentCore,
    mask: u32,
}

impl EnvironmentRecorder {
    /// Registered type tag
    pub const TYPE_TAG: &'static str = "EnvironmentRecorder";

    /// Create a recorder on `owner` with an all-groups mask
    #[must_use]
    pub fn new(owner: ObjectKey) -> Self {
        Self {
            core: ComponentCore::new(owner, "envrecorder"),
            mask: u32::MAX,
        }
    }

    /// Set the render mask
    #[must_use]
    pub fn with_mask(mut self, mask: u32) -> Self {
        self.mask = mask;
        self
    }

    /// Render mask
    #[must_use]
    pub fn mask(&self) -> u32 {
        self.mask
    }

    /// Capture the environment
    pub fn record(&self, device: &mut dyn RenderDevice) {
        device.capture_environment(self.uid());
    }
}

impl Component for EnvironmentRecorder {
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
            mask: self.mask,
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn as_recorder(&self) -> Option<&EnvironmentRecorder> {
        Some(self)
    }
}
