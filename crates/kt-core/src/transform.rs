//! Rigid-body transform algebra
//!
//! A [`Transform`] is a translation plus a unit quaternion. Composition follows
//! the usual convention `a * b` = apply `b`, then `a`. No operation here ever
//! scales lengths; unit conversion happens only when the MJCF writer emits
//! positions.

use std::ops::Mul;

use glam::{DQuat, DVec3};
use serde::{Deserialize, Serialize};

/// How [`relativize`] expresses the child's translation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TranslationMode {
    /// `child.translation - parent.translation`, left in world axes.
    ///
    /// Exact only while no ancestor is rotated.
    #[default]
    WorldDelta,
    /// World delta rotated into the parent's frame
    ParentFrame,
}

/// Serialized form of a transform (rotation stored as `[w, x, y, z]`)
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct TransformData {
    translation: [f64; 3],
    rotation: [f64; 4],
}

/// Rigid transform (translation + unit quaternion)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "TransformData", into = "TransformData")]
pub struct Transform {
    pub translation: DVec3,
    pub rotation: DQuat,
}

impl From<TransformData> for Transform {
    fn from(data: TransformData) -> Self {
        let [w, x, y, z] = data.rotation;
        Self::new(
            DVec3::from_array(data.translation),
            DQuat::from_xyzw(x, y, z, w),
        )
    }
}

impl From<Transform> for TransformData {
    fn from(transform: Transform) -> Self {
        Self {
            translation: transform.position(),
            rotation: transform.quat_wxyz(),
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Transform {
    type Output = Transform;

    fn mul(self, rhs: Transform) -> Transform {
        self.compose(&rhs)
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        translation: DVec3::ZERO,
        rotation: DQuat::IDENTITY,
    };

    /// Create a transform, normalizing the rotation
    pub fn new(translation: DVec3, rotation: DQuat) -> Self {
        Self {
            translation,
            rotation: normalize_quat(rotation),
        }
    }

    pub fn from_translation(translation: DVec3) -> Self {
        Self {
            translation,
            rotation: DQuat::IDENTITY,
        }
    }

    pub fn from_rotation(rotation: DQuat) -> Self {
        Self::new(DVec3::ZERO, rotation)
    }

    /// Pure rotation of `angle` radians about `axis` (need not be unit length)
    pub fn from_axis_angle(axis: DVec3, angle: f64) -> Self {
        let axis = axis.normalize_or_zero();
        if axis == DVec3::ZERO {
            return Self::IDENTITY;
        }
        Self::from_rotation(DQuat::from_axis_angle(axis, angle))
    }

    /// `self * other`: apply `other` first, then `self`
    pub fn compose(&self, other: &Transform) -> Transform {
        Transform::new(
            self.translation + self.rotation * other.translation,
            self.rotation * other.rotation,
        )
    }

    pub fn inverse(&self) -> Transform {
        let rotation = self.rotation.inverse();
        Transform::new(-(rotation * self.translation), rotation)
    }

    /// Map a point from this transform's local frame to the world frame
    pub fn transform_point(&self, point: DVec3) -> DVec3 {
        self.translation + self.rotation * point
    }

    /// Express a world-frame point in this transform's local frame
    pub fn to_local_point(&self, point: DVec3) -> DVec3 {
        self.rotation.inverse() * (point - self.translation)
    }

    /// Express a world-frame direction in this transform's local frame
    pub fn to_local_vector(&self, vector: DVec3) -> DVec3 {
        self.rotation.inverse() * vector
    }

    /// Check whether this transform is the identity within `epsilon`
    pub fn is_identity(&self, epsilon: f64) -> bool {
        let q = canonical(self.rotation);
        self.translation.abs().max_element() <= epsilon
            && (q.w - 1.0).abs() <= epsilon
            && q.x.abs() <= epsilon
            && q.y.abs() <= epsilon
            && q.z.abs() <= epsilon
    }

    /// Translation as `[x, y, z]`
    pub fn position(&self) -> [f64; 3] {
        self.translation.to_array()
    }

    /// Unit quaternion as `[w, x, y, z]`
    pub fn quat_wxyz(&self) -> [f64; 4] {
        let q = normalize_quat(self.rotation);
        [q.w, q.x, q.y, q.z]
    }

    /// Unit rotation axis and angle in radians, with the angle in `[0, PI]`
    pub fn axis_angle(&self) -> (DVec3, f64) {
        let q = canonical(self.rotation);
        let v = DVec3::new(q.x, q.y, q.z);
        let sin_half = v.length();
        if sin_half <= f64::EPSILON {
            return (DVec3::X, 0.0);
        }
        (v / sin_half, 2.0 * sin_half.atan2(q.w))
    }
}

/// Describe `child` relative to `parent`.
///
/// The rotation is always `parent.rotation⁻¹ * child.rotation`. The translation
/// depends on `mode`; see [`TranslationMode`].
pub fn relativize(parent: &Transform, child: &Transform, mode: TranslationMode) -> Transform {
    let inv = parent.rotation.inverse();
    let delta = child.translation - parent.translation;
    let translation = match mode {
        TranslationMode::WorldDelta => delta,
        TranslationMode::ParentFrame => inv * delta,
    };
    Transform::new(translation, inv * child.rotation)
}

fn normalize_quat(q: DQuat) -> DQuat {
    let len = q.length();
    if len <= f64::EPSILON {
        DQuat::IDENTITY
    } else {
        q / len
    }
}

// q and -q are the same rotation; pick the one with w >= 0
fn canonical(q: DQuat) -> DQuat {
    let q = normalize_quat(q);
    if q.w < 0.0 { -q } else { q }
}
