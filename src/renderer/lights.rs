//! Light sources and per-draw light selection
//!
//! Forward rendering can only feed a bounded number of lights to a single
//! draw, with an independent cap per light type. [`LightList`] accumulates
//! selected lights for one drawable and silently drops anything over a cap,
//! first-bound-first-served.

use std::any::Any;

use glam::Vec3;
use smallvec::SmallVec;

use crate::scene::{Component, ComponentCore, ComponentId, ObjectKey};

/// Maximum point lights affecting a single draw
pub const MAX_POINT_LIGHTS: usize = 8;
/// Maximum directional lights affecting a single draw
pub const MAX_DIRECTIONAL_LIGHTS: usize = 2;
/// Maximum spot lights affecting a single draw
pub const MAX_SPOT_LIGHTS: usize = 4;

/// Light type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightKind {
    Point,
    Directional,
    Spot,
}

impl LightKind {
    /// Per-type cap on lights per draw
    #[must_use]
    pub const fn max_per_draw(self) -> usize {
        match self {
            Self::Point => MAX_POINT_LIGHTS,
            Self::Directional => MAX_DIRECTIONAL_LIGHTS,
            Self::Spot => MAX_SPOT_LIGHTS,
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::Point => 0,
            Self::Directional => 1,
            Self::Spot => 2,
        }
    }
}

/// A light source bound to a scene object.
pub struct LightSource {
    core: ComponentCore,
    kind: LightKind,
    color: Vec3,
    intensity: f32,
    /// Influence radius; ignored for directional lights
    range: f32,
    mask: u32,
    cast_shadows: bool,
}

impl LightSource {
    /// Registered type tag
    pub const TYPE_TAG: &'static str = "Light";

    /// Create a white light of the given kind on `owner`
    #[must_use]
    pub fn new(owner: ObjectKey, kind: LightKind) -> Self {
        Self {
            core: ComponentCore::new(owner, "light"),
            kind,
            color: Vec3::ONE,
            intensity: 1.0,
            range: 10.0,
            mask: u32::MAX,
            cast_shadows: false,
        }
    }

    /// Set the color
    #[must_use]
    pub fn with_color(mut self, color: Vec3) -> Self {
        self.color = color;
        self
    }

    /// Set the intensity
    #[must_use]
    pub fn with_intensity(mut self, intensity: f32) -> Self {
        self.intensity = intensity;
        self
    }

    /// Set the influence range
    #[must_use]
    pub fn with_range(mut self, range: f32) -> Self {
        self.range = range;
        self
    }

    /// Set the render mask
    #[must_use]
    pub fn with_mask(mut self, mask: u32) -> Self {
        self.mask = mask;
        self
    }

    /// Enable shadow-map rendering for this light
    #[must_use]
    pub fn with_shadows(mut self) -> Self {
        self.cast_shadows = true;
        self
    }

    /// Light type
    #[must_use]
    pub fn kind(&self) -> LightKind {
        self.kind
    }

    /// Color
    #[must_use]
    pub fn color(&self) -> Vec3 {
        self.color
    }

    /// Intensity
    #[must_use]
    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    /// Influence range
    #[must_use]
    pub fn range(&self) -> f32 {
        self.range
    }

    /// Render mask
    #[must_use]
    pub fn mask(&self) -> u32 {
        self.mask
    }

    /// Whether this light renders a shadow map
    #[must_use]
    pub fn casts_shadows(&self) -> bool {
        self.cast_shadows
    }

    /// Geometric influence test against a bounding sphere.
    ///
    /// Directional lights touch everything; point and spot lights touch
    /// spheres intersecting their range.
    #[must_use]
    pub fn touches(&self, own_position: Vec3, target_position: Vec3, target_radius: f32) -> bool {
        match self.kind {
            LightKind::Directional => true,
            LightKind::Point | LightKind::Spot => {
                let reach = self.range + target_radius;
                own_position.distance_squared(target_position) <= reach * reach
            }
        }
    }
}

impl Component for LightSource {
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
            kind: self.kind,
            color: self.color,
            intensity: self.intensity,
            range: self.range,
            mask: self.mask,
            cast_shadows: self.cast_shadows,
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn as_light(&self) -> Option<&LightSource> {
        Some(self)
    }
}

/// Lights selected for one draw, capped per type.
#[derive(Debug, Default)]
pub struct LightList {
    ids: SmallVec<[ComponentId; 8]>,
    counts: [usize; 3],
}

impl LightList {
    /// Create an empty list
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the cap for a light type has been reached
    #[must_use]
    pub fn is_full(&self, kind: LightKind) -> bool {
        self.counts[kind.index()] >= kind.max_per_draw()
    }

    /// Append a light unless its type cap is reached.
    ///
    /// Selection order is binding order; lights past a cap are dropped
    /// silently. (Prioritizing by distance instead would change observable
    /// behavior and was deliberately not done.)
    pub fn push(&mut self, kind: LightKind, id: ComponentId) -> bool {
        if self.is_full(kind) {
            return false;
        }
        self.counts[kind.index()] += 1;
        self.ids.push(id);
        true
    }

    /// Selected light ids, in selection order
    #[must_use]
    pub fn ids(&self) -> &[ComponentId] {
        &self.ids
    }

    /// Number of selected lights of a type
    #[must_use]
    pub fn count(&self, kind: LightKind) -> usize {
        self.counts[kind.index()]
    }

    /// Total selected lights
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether no lights were selected
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
