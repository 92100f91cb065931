//! Multi-pass renderer
//!
//! The renderer owns non-owning registries of lights, cameras, drawables and
//! environment recorders that components bind themselves into. Per frame it
//! runs three stages in a fixed order:
//!
//! 1. **Shadow stage** - every active, masked, shadow-casting light renders
//!    the full drawable set into its shadow map, unfiltered by camera.
//! 2. **Environment stage** - every active, masked recorder captures.
//! 3. **Group/camera stage** - render-group bits are processed in strictly
//!    ascending order; within a group, each camera whose mask intersects the
//!    bit binds its target and draws the visible subset sorted back-to-front
//!    (painter's algorithm; squared distances, no square roots).
//!
//! Drawable bindings are split across named passes (pre/forward/post); a
//! full [`Renderer::draw`] runs every pass in order, while
//! [`Renderer::draw_pass`] runs the group/camera stage of a single pass and
//! leaves shadow/environment work to the once-per-frame full draw.
//!
//! Binding sets must not be mutated during a draw traversal; the borrow
//! rules enforce this (`draw` holds `&self` and no bind method takes one).

mod camera;
mod device;
mod drawable;
mod lights;

pub use camera::{CameraComponent, Projection};
pub use device::{CameraView, CommandRecorder, DrawCommand, DrawContext, RenderDevice, Viewport};
pub use drawable::{Drawable, EnvironmentRecorder, MeshDrawable};
pub use lights::{
    LightKind, LightList, LightSource, MAX_DIRECTIONAL_LIGHTS, MAX_POINT_LIGHTS, MAX_SPOT_LIGHTS,
};

use glam::Vec3;

use crate::scene::{Component, ComponentId, ObjectKey, Scene};

/// Reference to a component in a scene: owner key plus the component's
/// process-unique id. Resolution fails harmlessly once either is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderBinding {
    /// Owning object
    pub object: ObjectKey,
    /// Component instance
    pub component: ComponentId,
}

impl RenderBinding {
    /// Create a binding
    #[must_use]
    pub fn new(object: ObjectKey, component: ComponentId) -> Self {
        Self { object, component }
    }
}

/// Named renderer pass, each with its own drawable binding set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassKind {
    /// Runs before the main forward pass (depth pre-pass style work)
    Pre,
    /// The main forward pass; `bind_drawable` targets this one
    Forward,
    /// Runs after the forward pass (post effects, overlays)
    Post,
}

impl PassKind {
    /// Pass execution order within a frame
    pub const ORDER: [Self; 3] = [Self::Pre, Self::Forward, Self::Post];

    const fn index(self) -> usize {
        match self {
            Self::Pre => 0,
            Self::Forward => 1,
            Self::Post => 2,
        }
    }
}

/// One visible drawable, collected for sorting
struct Visible<'s> {
    distance_sq: f32,
    uid: ComponentId,
    drawable: &'s dyn Drawable,
    model: glam::Mat4,
}

/// The multi-pass renderer.
pub struct Renderer {
    /// Global render mask; a group bit absent here is never processed
    mask: u32,
    lights: Vec<RenderBinding>,
    cameras: Vec<RenderBinding>,
    recorders: Vec<RenderBinding>,
    /// Per-pass drawable bindings, indexed by `PassKind::index`
    drawables: [Vec<RenderBinding>; 3],
}

impl Renderer {
    /// Create a renderer with all group bits enabled
    #[must_use]
    pub fn new() -> Self {
        Self {
            mask: u32::MAX,
            lights: Vec::new(),
            cameras: Vec::new(),
            recorders: Vec::new(),
            drawables: [Vec::new(), Vec::new(), Vec::new()],
        }
    }

    /// Global render mask
    #[must_use]
    pub fn mask(&self) -> u32 {
        self.mask
    }

    /// Set the global render mask
    pub fn set_mask(&mut self, mask: u32) {
        self.mask = mask;
    }

    // -------------------------------------------------------------------------
    // Binding registries
    // -------------------------------------------------------------------------

    fn bind_into(set: &mut Vec<RenderBinding>, binding: RenderBinding) {
        if !set.contains(&binding) {
            set.push(binding);
        }
    }

    fn unbind_from(set: &mut Vec<RenderBinding>, binding: RenderBinding) {
        set.retain(|&b| b != binding);
    }

    /// Register a light; double-binding is a no-op
    pub fn bind_light(&mut self, binding: RenderBinding) {
        Self::bind_into(&mut self.lights, binding);
    }

    /// Unregister a light; unbinding an unregistered light is a no-op
    pub fn unbind_light(&mut self, binding: RenderBinding) {
        Self::unbind_from(&mut self.lights, binding);
    }

    /// Register a camera
    pub fn bind_camera(&mut self, binding: RenderBinding) {
        Self::bind_into(&mut self.cameras, binding);
    }

    /// Unregister a camera
    pub fn unbind_camera(&mut self, binding: RenderBinding) {
        Self::unbind_from(&mut self.cameras, binding);
    }

    /// Register an environment recorder
    pub fn bind_recorder(&mut self, binding: RenderBinding) {
        Self::bind_into(&mut self.recorders, binding);
    }

    /// Unregister an environment recorder
    pub fn unbind_recorder(&mut self, binding: RenderBinding) {
        Self::unbind_from(&mut self.recorders, binding);
    }

    /// Register a drawable with the forward pass
    pub fn bind_drawable(&mut self, binding: RenderBinding) {
        self.bind_drawable_to(PassKind::Forward, binding);
    }

    /// Register a drawable with a specific pass
    pub fn bind_drawable_to(&mut self, pass: PassKind, binding: RenderBinding) {
        Self::bind_into(&mut self.drawables[pass.index()], binding);
    }

    /// Unregister a drawable from every pass; a no-op if it was never bound
    pub fn unbind_drawable(&mut self, binding: RenderBinding) {
        for set in &mut self.drawables {
            Self::unbind_from(set, binding);
        }
    }

    /// Number of drawables bound to a pass
    #[must_use]
    pub fn drawable_count(&self, pass: PassKind) -> usize {
        self.drawables[pass.index()].len()
    }

    // -------------------------------------------------------------------------
    // Drawing
    // -------------------------------------------------------------------------

    /// Draw a full frame: shadow stage, environment stage, then every pass's
    /// group/camera stage in pass order.
    pub fn draw(&self, scene: &Scene, device: &mut dyn RenderDevice) {
        self.shadow_stage(scene, device);
        self.environment_stage(scene, device);
        for pass in PassKind::ORDER {
            self.group_camera_stage(pass, scene, device);
        }
    }

    /// Run only one pass's group/camera stage.
    ///
    /// Shadow and environment stages belong to the full frame, not to a
    /// pass; callers invoking passes individually run them via `draw` once
    /// per frame or schedule them separately.
    pub fn draw_pass(&self, pass: PassKind, scene: &Scene, device: &mut dyn RenderDevice) {
        self.group_camera_stage(pass, scene, device);
    }

    fn resolve<'s>(scene: &'s Scene, binding: RenderBinding) -> Option<&'s dyn Component> {
        if !scene.is_effectively_active(binding.object) {
            return None;
        }
        scene.component_by_uid(binding.object, binding.component)
    }

    /// Shadow stage: each active shadow-casting light whose mask intersects
    /// the global mask renders the full drawable set, unfiltered by camera.
    fn shadow_stage(&self, scene: &Scene, device: &mut dyn RenderDevice) {
        // Union of all passes' drawables, de-duplicated by component id.
        let mut seen: Vec<ComponentId> = Vec::new();
        let mut casters: Vec<(ComponentId, glam::Mat4)> = Vec::new();
        for set in &self.drawables {
            for &binding in set {
                let Some(component) = Self::resolve(scene, binding) else {
                    continue;
                };
                let Some(drawable) = component.as_drawable() else {
                    continue;
                };
                if !drawable.is_valid() || seen.contains(&component.uid()) {
                    continue;
                }
                seen.push(component.uid());
                casters.push((component.uid(), scene.global_matrix(binding.object)));
            }
        }

        for &binding in &self.lights {
            let Some(component) = Self::resolve(scene, binding) else {
                continue;
            };
            let Some(light) = component.as_light() else {
                continue;
            };
            if !light.casts_shadows() || self.mask & light.mask() == 0 {
                continue;
            }
            for &(drawable, model) in &casters {
                device.draw_shadow(component.uid(), drawable, model);
            }
        }
    }

    /// Environment stage: each active recorder passing the mask test captures
    fn environment_stage(&self, scene: &Scene, device: &mut dyn RenderDevice) {
        for &binding in &self.recorders {
            let Some(component) = Self::resolve(scene, binding) else {
                continue;
            };
            let Some(recorder) = component.as_recorder() else {
                continue;
            };
            if self.mask & recorder.mask() == 0 {
                continue;
            }
            recorder.record(device);
        }
    }

    /// Group/camera stage for one pass.
    ///
    /// Group bits run in strictly ascending order - later groups may render
    /// over earlier ones and depend on them having completed (opaque before
    /// transparent, world before overlay).
    fn group_camera_stage(&self, pass: PassKind, scene: &Scene, device: &mut dyn RenderDevice) {
        let drawables = &self.drawables[pass.index()];

        for bit in 0..32u8 {
            let group = 1u32 << bit;
            if self.mask & group == 0 {
                continue;
            }

            for &camera_binding in &self.cameras {
                let Some(component) = Self::resolve(scene, camera_binding) else {
                    continue;
                };
                let Some(camera) = component.as_camera() else {
                    continue;
                };
                if camera.mask() & group == 0 {
                    continue;
                }

                let camera_world = scene.global_matrix(camera_binding.object);
                let camera_position = camera_world.w_axis.truncate();

                let mut visible = self.collect_visible(scene, drawables, bit, camera_position);
                if visible.is_empty() {
                    continue;
                }

                device.bind_camera(&CameraView {
                    camera: component.uid(),
                    view: camera_world.inverse(),
                    projection: camera.projection_matrix(),
                    viewport: camera.viewport(),
                });

                // Back-to-front: farthest first. Squared distances order the
                // same as true distances.
                visible.sort_by(|a, b| {
                    b.distance_sq
                        .partial_cmp(&a.distance_sq)
                        .unwrap_or(std::cmp::Ordering::Equal)
                });

                for entry in visible {
                    let lights = if entry.drawable.receives_lights() {
                        self.choose_lights(
                            scene,
                            bit,
                            entry.model.w_axis.truncate(),
                            entry.drawable.bounding_radius(),
                        )
                    } else {
                        LightList::new()
                    };
                    entry.drawable.draw(
                        &DrawContext {
                            drawable: entry.uid,
                            group: bit,
                            model: entry.model,
                            lights: lights.ids(),
                        },
                        device,
                    );
                }
            }
        }
    }

    /// Build the visible subset for one (group, camera) combination.
    ///
    /// Validity is re-checked every frame; a drawable with a missing model
    /// is filtered here, cheaply, with no cached "broken" state.
    fn collect_visible<'s>(
        &self,
        scene: &'s Scene,
        drawables: &[RenderBinding],
        group_bit: u8,
        camera_position: Vec3,
    ) -> Vec<Visible<'s>> {
        let mut visible = Vec::new();
        for &binding in drawables {
            let Some(component) = Self::resolve(scene, binding) else {
                continue;
            };
            let Some(drawable) = component.as_drawable() else {
                continue;
            };
            if !drawable.is_valid() || drawable.render_group() != group_bit {
                continue;
            }
            let model = scene.global_matrix(binding.object);
            visible.push(Visible {
                distance_sq: camera_position.distance_squared(model.w_axis.truncate()),
                uid: component.uid(),
                drawable,
                model,
            });
        }
        visible
    }

    /// Select lights for one draw: per-type caps, mask intersection with
    /// both the global mask and the drawable's group bit, and the geometric
    /// influence test. Selection order is binding order.
    fn choose_lights(
        &self,
        scene: &Scene,
        group_bit: u8,
        target_position: Vec3,
        target_radius: f32,
    ) -> LightList {
        let group = 1u32 << group_bit;
        let mut list = LightList::new();

        for &binding in &self.lights {
            let Some(component) = Self::resolve(scene, binding) else {
                continue;
            };
            let Some(light) = component.as_light() else {
                continue;
            };
            if list.is_full(light.kind()) {
                continue;
            }
            let light_mask = light.mask();
            if self.mask & light_mask == 0 || light_mask & group == 0 {
                continue;
            }
            let light_position = scene.global_position(binding.object);
            if !light.touches(light_position, target_position, target_radius) {
                continue;
            }
            list.push(light.kind(), component.uid());
        }

        list
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}
