//! Render/update layers
//!
//! Layers group rendering or update work within a scene. A layer may bind to
//! other layers to share rendering context (e.g. a HUD layer reusing the
//! world layer's depth target). Bindings are non-owning arena keys: a bound
//! layer that gets removed simply stops resolving.

use crate::scene::LayerKey;

/// A rendering/update grouping owned by a scene.
pub struct Layer {
    /// Identifier used by lookup and persistence
    id: String,
    /// Registered type tag; drives persistence dispatch
    type_tag: String,
    /// Non-owning, de-duplicated associations to other layers
    bound: Vec<LayerKey>,
}

impl Layer {
    /// Create a layer with an identifier and type tag
    #[must_use]
    pub fn new(id: impl Into<String>, type_tag: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            type_tag: type_tag.into(),
            bound: Vec::new(),
        }
    }

    /// Layer identifier
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Registered type tag
    #[must_use]
    pub fn type_tag(&self) -> &str {
        &self.type_tag
    }

    /// Bind another layer to this one.
    ///
    /// The association is directional and de-duplicated; binding the same
    /// layer twice is a no-op. Symmetric use is a caller convention, not
    /// enforced here.
    pub fn bind_other_layer(&mut self, other: LayerKey) {
        if !self.bound.contains(&other) {
            self.bound.push(other);
        }
    }

    /// Remove an association; unbinding a layer that was never bound is a
    /// no-op
    pub fn unbind_other_layer(&mut self, other: LayerKey) {
        self.bound.retain(|&k| k != other);
    }

    /// Keys of bound layers, in binding order.
    ///
    /// Keys may be stale if a bound layer was removed; resolve through the
    /// scene and skip misses.
    #[must_use]
    pub fn bound_layers(&self) -> &[LayerKey] {
        &self.bound
    }
}
