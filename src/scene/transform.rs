//! Local transforms with version tracking
//!
//! Every mutation bumps a version counter. World-matrix caches compare the
//! stored version against the current one instead of relying on a mutable
//! dirty flag, so cache validity is an explicit equality check that also
//! covers ancestor changes (each node's cache stamps the parent's world
//! version it was computed against).

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Local position, rotation and scale of a scene object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transform {
    /// Position relative to the parent
    position: Vec3,
    /// Rotation relative to the parent
    rotation: Quat,
    /// Scale relative to the parent
    scale: Vec3,

    /// Bumped on every mutation; never persisted
    #[serde(skip)]
    version: u64,
}

impl Transform {
    /// Create an identity transform
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from a position
    #[must_use]
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create from position, rotation and scale
    #[must_use]
    pub fn from_parts(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
            version: 0,
        }
    }

    // -------------------------------------------------------------------------
    // Getters
    // -------------------------------------------------------------------------

    /// Local position
    #[must_use]
    #[inline]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Local rotation
    #[must_use]
    #[inline]
    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    /// Local scale
    #[must_use]
    #[inline]
    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    /// Current version; changes whenever any component of the transform does
    #[must_use]
    #[inline]
    pub fn version(&self) -> u64 {
        self.version
    }

    // -------------------------------------------------------------------------
    // Setters (bump version)
    // -------------------------------------------------------------------------

    /// Set the local position
    #[inline]
    pub fn set_position(&mut self, position: Vec3) {
        if self.position != position {
            self.position = position;
            self.version += 1;
        }
    }

    /// Set the local rotation
    #[inline]
    pub fn set_rotation(&mut self, rotation: Quat) {
        if self.rotation != rotation {
            self.rotation = rotation;
            self.version += 1;
        }
    }

    /// Set the local scale
    #[inline]
    pub fn set_scale(&mut self, scale: Vec3) {
        if self.scale != scale {
            self.scale = scale;
            self.version += 1;
        }
    }

    /// Translate by a delta
    #[inline]
    pub fn translate(&mut self, delta: Vec3) {
        self.position += delta;
        self.version += 1;
    }

    /// Apply a rotation on top of the current one
    #[inline]
    pub fn rotate(&mut self, rotation: Quat) {
        self.rotation = rotation * self.rotation;
        self.version += 1;
    }

    /// Multiply the scale by a factor
    #[inline]
    pub fn scale_by(&mut self, factor: Vec3) {
        self.scale *= factor;
        self.version += 1;
    }

    /// Force a version bump without changing any value.
    ///
    /// Used when the transform's meaning changes externally, e.g. the owning
    /// object was re-parented.
    #[inline]
    pub fn touch(&mut self) {
        self.version += 1;
    }

    // -------------------------------------------------------------------------
    // Derived
    // -------------------------------------------------------------------------

    /// Local transformation matrix
    #[must_use]
    pub fn local_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// Forward direction (negative Z in local space)
    #[must_use]
    #[inline]
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    // -------------------------------------------------------------------------
    // Persisted layout
    // -------------------------------------------------------------------------

    /// Flatten into the persisted 10-float layout:
    /// position.xyz, scale.xyz, rotation.wxyz.
    #[must_use]
    pub fn to_floats(&self) -> [f32; 10] {
        [
            self.position.x,
            self.position.y,
            self.position.z,
            self.scale.x,
            self.scale.y,
            self.scale.z,
            self.rotation.w,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
        ]
    }

    /// Rebuild from the persisted 10-float layout
    #[must_use]
    pub fn from_floats(f: &[f32; 10]) -> Self {
        Self::from_parts(
            Vec3::new(f[0], f[1], f[2]),
            Quat::from_xyzw(f[7], f[8], f[9], f[6]),
            Vec3::new(f[3], f[4], f[5]),
        )
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            version: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mutation_bumps_version() {
        let mut t = Transform::new();
        let v0 = t.version();

        t.set_position(Vec3::new(1.0, 0.0, 0.0));
        assert!(t.version() > v0);

        let v1 = t.version();
        t.translate(Vec3::Y);
        assert!(t.version() > v1);
        assert_eq!(t.position(), Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_no_change_no_bump() {
        let mut t = Transform::from_position(Vec3::ONE);
        let v = t.version();
        t.set_position(Vec3::ONE);
        assert_eq!(t.version(), v);
    }

    #[test]
    fn test_local_matrix_translation() {
        let t = Transform::from_position(Vec3::new(1.0, 2.0, 3.0));
        let m = t.local_matrix();
        assert_eq!(m.w_axis.truncate(), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_float_layout_round_trip() {
        let t = Transform::from_parts(
            Vec3::new(1.0, 2.0, 3.0),
            Quat::from_rotation_y(0.5),
            Vec3::new(2.0, 2.0, 2.0),
        );

        let floats = t.to_floats();
        // position.xyz, scale.xyz, rotation.wxyz
        assert_eq!(&floats[0..3], &[1.0, 2.0, 3.0]);
        assert_eq!(&floats[3..6], &[2.0, 2.0, 2.0]);

        let back = Transform::from_floats(&floats);
        assert!((back.position() - t.position()).length() < 1e-5);
        assert!((back.rotation().dot(t.rotation()) - 1.0).abs() < 1e-5);
        assert!((back.scale() - t.scale()).length() < 1e-5);
    }
}
