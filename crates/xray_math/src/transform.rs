// Transform utilities for Mat4
//
// glam::Mat4 already provides transform_point3(), transform_vector3() and
// inverse(); this adds the pieces instance placement and the camera need.

use crate::Aabb;
use glam::{Mat3, Mat4, Vec3};

/// Extension trait for Mat4 to provide additional transform utilities
pub trait Mat4Ext {
    /// Transform a surface normal (inverse transpose of the upper 3x3),
    /// renormalized. Correct under non-uniform scale.
    fn transform_normal3(&self, normal: Vec3) -> Vec3;

    /// Transform an axis-aligned bounding box.
    /// Computes the bounding box of all 8 transformed corners.
    fn transform_aabb(&self, aabb: &Aabb) -> Aabb;
}

impl Mat4Ext for Mat4 {
    fn transform_normal3(&self, normal: Vec3) -> Vec3 {
        let normal_matrix = Mat3::from_mat4(*self).inverse().transpose();
        (normal_matrix * normal).normalize_or_zero()
    }

    fn transform_aabb(&self, aabb: &Aabb) -> Aabb {
        if aabb.is_empty() {
            return Aabb::EMPTY;
        }

        let (lo, hi) = (aabb.min(), aabb.max());
        let mut result = Aabb::EMPTY;
        for i in 0..8 {
            let corner = Vec3::new(
                if i & 1 == 0 { lo.x } else { hi.x },
                if i & 2 == 0 { lo.y } else { hi.y },
                if i & 4 == 0 { lo.z } else { hi.z },
            );
            result.include(self.transform_point3(corner));
        }
        result
    }
}

/// Rotate by `angle` radians about `axis`, then translate.
///
/// A zero-length axis yields a pure translation.
pub fn rotation_then_translation(angle: f32, axis: Vec3, translate: Vec3) -> Mat4 {
    let axis = axis.normalize_or_zero();
    let rotation = if axis == Vec3::ZERO {
        Mat4::IDENTITY
    } else {
        Mat4::from_axis_angle(axis, angle)
    };
    Mat4::from_translation(translate) * rotation
}
