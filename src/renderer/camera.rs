//! Camera component

use std::any::Any;

use glam::Mat4;

use crate::renderer::device::Viewport;
use crate::scene::{Component, ComponentCore, ObjectKey};

/// Camera projection
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    /// Perspective projection
    Perspective {
        /// Vertical field of view in radians
        fov_y: f32,
        /// Width / height
        aspect: f32,
        near: f32,
        far: f32,
    },
    /// Orthographic projection
    Orthographic {
        /// View-volume width in world units
        width: f32,
        /// View-volume height in world units
        height: f32,
        near: f32,
        far: f32,
    },
}

impl Projection {
    /// Build the projection matrix
    #[must_use]
    pub fn matrix(&self) -> Mat4 {
        match *self {
            Self::Perspective {
                fov_y,
                aspect,
                near,
                far,
            } => Mat4::perspective_rh(fov_y, aspect, near, far),
            Self::Orthographic {
                width,
                height,
                near,
                far,
            } => {
                let (hw, hh) = (width * 0.5, height * 0.5);
                Mat4::orthographic_rh(-hw, hw, -hh, hh, near, far)
            }
        }
    }
}

impl Default for Projection {
    fn default() -> Self {
        Self::Perspective {
            fov_y: std::f32::consts::FRAC_PI_3,
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

/// A camera bound to a scene object.
///
/// The view matrix is the inverse of the owner's world matrix; the render
/// mask selects which render groups this camera draws.
pub struct CameraComponent {
    core: ComponentCore,
    projection: Projection,
    mask: u32,
    viewport: Viewport,
}

impl CameraComponent {
    /// Registered type tag
    pub const TYPE_TAG: &'static str = "Camera";

    /// Create a camera on `owner` with a default perspective projection and
    /// an all-groups mask
    #[must_use]
    pub fn new(owner: ObjectKey) -> Self {
        Self {
            core: ComponentCore::new(owner, "camera"),
            projection: Projection::default(),
            mask: u32::MAX,
            viewport: Viewport::FULL,
        }
    }

    /// Set the projection
    #[must_use]
    pub fn with_projection(mut self, projection: Projection) -> Self {
        self.projection = projection;
        self
    }

    /// Set the render mask
    #[must_use]
    pub fn with_mask(mut self, mask: u32) -> Self {
        self.mask = mask;
        self
    }

    /// Set the viewport
    #[must_use]
    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self
    }

    /// Render mask; one bit per render group
    #[must_use]
    pub fn mask(&self) -> u32 {
        self.mask
    }

    /// Set the render mask
    pub fn set_mask(&mut self, mask: u32) {
        self.mask = mask;
    }

    /// Projection
    #[must_use]
    pub fn projection(&self) -> Projection {
        self.projection
    }

    /// Projection matrix
    #[must_use]
    pub fn projection_matrix(&self) -> Mat4 {
        self.projection.matrix()
    }

    /// Target viewport
    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }
}

impl Component for CameraComponent {
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
            projection: self.projection,
            mask: self.mask,
            viewport: self.viewport,
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn as_camera(&self) -> Option<&CameraComponent> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Scene;

    #[test]
    fn test_perspective_projection_matrix() {
        let p = Projection::default();
        let m = p.matrix();
        // Perspective matrices put -1 in the w-from-z slot (right-handed).
        assert!((m.z_axis.w + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_camera_capability_lookup() {
        let mut scene = Scene::new("test");
        let rig = scene.create_object("rig");
        scene
            .attach_component(CameraComponent::new(rig).with_mask(0b0011))
            .unwrap();

        let cam = scene.component::<CameraComponent>(rig).unwrap();
        assert_eq!(cam.mask(), 0b0011);
        assert!(cam.as_camera().is_some());
        assert!(cam.as_drawable().is_none());
    }
}
