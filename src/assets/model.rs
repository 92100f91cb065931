//! Mesh, material and model resource descriptions
//!
//! These are data-only descriptions consumed by drawable components and the
//! renderer. GPU upload and vertex layout belong to the rendering backend
//! behind the [`RenderDevice`](crate::renderer::RenderDevice) boundary.

use glam::Vec4;

use super::handle::ResourceHandle;

/// Geometry description shared between drawables.
#[derive(Debug, Clone)]
pub struct Mesh {
    /// Human-readable mesh name
    pub name: String,
    /// Number of vertices
    pub vertex_count: u32,
    /// Number of indices
    pub index_count: u32,
    /// Radius of the bounding sphere around the local origin
    pub bounding_radius: f32,
}

impl Mesh {
    /// Create a mesh description
    #[must_use]
    pub fn new(name: impl Into<String>, vertex_count: u32, index_count: u32) -> Self {
        Self {
            name: name.into(),
            vertex_count,
            index_count,
            bounding_radius: 1.0,
        }
    }

    /// Set the bounding sphere radius
    #[must_use]
    pub fn with_bounding_radius(mut self, radius: f32) -> Self {
        self.bounding_radius = radius;
        self
    }
}

/// Surface description shared between drawables.
#[derive(Debug, Clone)]
pub struct Material {
    /// Human-readable material name
    pub name: String,
    /// Base color (RGBA)
    pub base_color: Vec4,
    /// Whether surfaces with this material receive lighting
    pub lit: bool,
}

impl Material {
    /// Create a lit material with the given base color
    #[must_use]
    pub fn new(name: impl Into<String>, base_color: Vec4) -> Self {
        Self {
            name: name.into(),
            base_color,
            lit: true,
        }
    }

    /// Create an unlit material
    #[must_use]
    pub fn unlit(name: impl Into<String>, base_color: Vec4) -> Self {
        Self {
            name: name.into(),
            base_color,
            lit: false,
        }
    }
}

/// A renderable pairing of mesh and material.
///
/// The model owns strong handles; drawable components reference the model
/// weakly so eviction from the store propagates as "invalid" rather than
/// dangling.
#[derive(Debug, Clone)]
pub struct Model {
    /// Geometry
    pub mesh: ResourceHandle<Mesh>,
    /// Surface
    pub material: ResourceHandle<Material>,
}

impl Model {
    /// Create a model from mesh and material handles
    #[must_use]
    pub fn new(mesh: ResourceHandle<Mesh>, material: ResourceHandle<Material>) -> Self {
        Self { mesh, material }
    }

    /// Bounding sphere radius of the model's mesh
    #[must_use]
    pub fn bounding_radius(&self) -> f32 {
        self.mesh.bounding_radius
    }

    /// Whether this model wants lighting
    #[must_use]
    pub fn receives_lights(&self) -> bool {
        self.material.lit
    }
}
