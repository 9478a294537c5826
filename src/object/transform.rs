//! Node transform evaluation.
//!
//! FBX composes a node's local transform from a chain of pivots,
//! offsets, pre/post rotations and an Euler rotation in one of six
//! orders (the Maya transform chain). All angles are stored in degrees.

use crate::tree::Element;
use crate::util::math::{DMat4, DVec3};

use super::properties::vec3_property;

/// Euler rotation order of a node's `Lcl Rotation`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RotationOrder {
    #[default]
    Xyz,
    Xzy,
    Yzx,
    Yxz,
    Zxy,
    Zyx,
    /// Legacy spheric interpolation; evaluated as XYZ.
    SphericXyz,
}

impl RotationOrder {
    pub(crate) fn from_property(value: i64) -> Self {
        match value {
            1 => Self::Xzy,
            2 => Self::Yzx,
            3 => Self::Yxz,
            4 => Self::Zxy,
            5 => Self::Zyx,
            6 => Self::SphericXyz,
            _ => Self::Xyz,
        }
    }
}

/// Rotation matrix for Euler angles in degrees.
///
/// For column vectors an `Xyz` order applies X first, so the factors
/// multiply in reverse letter order.
pub fn rotation_matrix(euler_deg: DVec3, order: RotationOrder) -> DMat4 {
    let rx = DMat4::from_rotation_x(euler_deg.x.to_radians());
    let ry = DMat4::from_rotation_y(euler_deg.y.to_radians());
    let rz = DMat4::from_rotation_z(euler_deg.z.to_radians());
    match order {
        RotationOrder::Xyz | RotationOrder::SphericXyz => rz * ry * rx,
        RotationOrder::Xzy => ry * rz * rx,
        RotationOrder::Yzx => rx * rz * ry,
        RotationOrder::Yxz => rz * rx * ry,
        RotationOrder::Zxy => ry * rx * rz,
        RotationOrder::Zyx => rx * ry * rz,
    }
}

/// Transform-relevant properties of one node, with FBX defaults filled in.
#[derive(Debug, Clone)]
pub struct NodeTransform {
    pub translation: DVec3,
    pub rotation: DVec3,
    pub scaling: DVec3,
    pub rotation_order: RotationOrder,
    pub pre_rotation: DVec3,
    pub post_rotation: DVec3,
    pub rotation_offset: DVec3,
    pub rotation_pivot: DVec3,
    pub scaling_offset: DVec3,
    pub scaling_pivot: DVec3,
    pub geometric_translation: DVec3,
    pub geometric_rotation: DVec3,
    pub geometric_scaling: DVec3,
}

impl Default for NodeTransform {
    fn default() -> Self {
        Self {
            translation: DVec3::ZERO,
            rotation: DVec3::ZERO,
            scaling: DVec3::ONE,
            rotation_order: RotationOrder::Xyz,
            pre_rotation: DVec3::ZERO,
            post_rotation: DVec3::ZERO,
            rotation_offset: DVec3::ZERO,
            rotation_pivot: DVec3::ZERO,
            scaling_offset: DVec3::ZERO,
            scaling_pivot: DVec3::ZERO,
            geometric_translation: DVec3::ZERO,
            geometric_rotation: DVec3::ZERO,
            geometric_scaling: DVec3::ONE,
        }
    }
}

impl NodeTransform {
    /// Read the transform properties of a node element; `None` yields the
    /// defaults (the synthetic root).
    pub(crate) fn from_element(element: Option<&Element>) -> Self {
        let Some(element) = element else {
            return Self::default();
        };
        let order = super::properties::i64_property(element, "RotationOrder", 0);
        Self {
            translation: vec3_property(element, "Lcl Translation", DVec3::ZERO),
            rotation: vec3_property(element, "Lcl Rotation", DVec3::ZERO),
            scaling: vec3_property(element, "Lcl Scaling", DVec3::ONE),
            rotation_order: RotationOrder::from_property(order),
            pre_rotation: vec3_property(element, "PreRotation", DVec3::ZERO),
            post_rotation: vec3_property(element, "PostRotation", DVec3::ZERO),
            rotation_offset: vec3_property(element, "RotationOffset", DVec3::ZERO),
            rotation_pivot: vec3_property(element, "RotationPivot", DVec3::ZERO),
            scaling_offset: vec3_property(element, "ScalingOffset", DVec3::ZERO),
            scaling_pivot: vec3_property(element, "ScalingPivot", DVec3::ZERO),
            geometric_translation: vec3_property(element, "GeometricTranslation", DVec3::ZERO),
            geometric_rotation: vec3_property(element, "GeometricRotation", DVec3::ZERO),
            geometric_scaling: vec3_property(element, "GeometricScaling", DVec3::ONE),
        }
    }

    /// Local transform with the node's stored translation/rotation/scaling.
    pub fn local_matrix(&self, ignore_pivots: bool) -> DMat4 {
        self.local_matrix_trs(self.translation, self.rotation, self.scaling, ignore_pivots)
    }

    /// Local transform with the Maya chain
    /// `T * Roff * Rp * Rpre * R * Rpost⁻¹ * Rp⁻¹ * Soff * Sp * S * Sp⁻¹`,
    /// with translation/rotation/scaling supplied by the caller (used for
    /// animated values). The post rotation enters inverted.
    pub fn local_matrix_trs(
        &self,
        translation: DVec3,
        rotation: DVec3,
        scaling: DVec3,
        ignore_pivots: bool,
    ) -> DMat4 {
        let t = DMat4::from_translation(translation);
        let r = rotation_matrix(rotation, self.rotation_order);
        let s = DMat4::from_scale(scaling);
        let r_pre = rotation_matrix(self.pre_rotation, RotationOrder::Xyz);
        let r_post_inv = rotation_matrix(-self.post_rotation, RotationOrder::Zyx);

        if ignore_pivots {
            return t * r_pre * r * r_post_inv * s;
        }

        let r_off = DMat4::from_translation(self.rotation_offset);
        let r_p = DMat4::from_translation(self.rotation_pivot);
        let r_p_inv = DMat4::from_translation(-self.rotation_pivot);
        let s_off = DMat4::from_translation(self.scaling_offset);
        let s_p = DMat4::from_translation(self.scaling_pivot);
        let s_p_inv = DMat4::from_translation(-self.scaling_pivot);

        t * r_off * r_p * r_pre * r * r_post_inv * r_p_inv * s_off * s_p * s * s_p_inv
    }

    /// Geometric offset, applied to mesh geometry only and never
    /// propagated to children.
    pub fn geometric_matrix(&self) -> DMat4 {
        DMat4::from_translation(self.geometric_translation)
            * rotation_matrix(self.geometric_rotation, RotationOrder::Xyz)
            * DMat4::from_scale(self.geometric_scaling)
    }
}
