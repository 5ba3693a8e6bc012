//! Hittable trait and HitRecord for ray-primitive intersection.

use xray_math::{Aabb, Interval, Ray, Vec3};

/// Record of a ray-primitive intersection.
#[derive(Debug, Clone, Copy, Default)]
pub struct HitRecord {
    /// Point of intersection
    pub p: Vec3,
    /// Shading normal at the intersection (always points against the ray)
    pub normal: Vec3,
    /// Barycentric coordinates of the hit
    pub u: f32,
    pub v: f32,
    /// Parameter t where the intersection occurs
    pub t: f32,
    /// Whether the ray hit the front face of the surface
    pub front_face: bool,
}

impl HitRecord {
    /// Set the normal based on ray direction and outward normal.
    ///
    /// The stored normal always points against the ray.
    pub fn set_face_normal(&mut self, ray: &Ray, outward_normal: Vec3) {
        self.front_face = ray.direction.dot(outward_normal) < 0.0;
        self.normal = if self.front_face {
            outward_normal
        } else {
            -outward_normal
        };
    }
}

/// Trait for primitives that can be hit by rays.
pub trait Hittable: Send + Sync {
    /// Test if a ray hits this primitive within the given interval.
    ///
    /// Returns true if hit, and fills in the hit record.
    fn hit(&self, ray: &Ray, ray_t: Interval, rec: &mut HitRecord) -> bool;

    /// Get the axis-aligned bounding box of this primitive.
    fn bounding_box(&self) -> Aabb;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_faces_against_ray() {
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
        let mut rec = HitRecord::default();

        rec.set_face_normal(&ray, Vec3::Z);
        assert!(rec.front_face);
        assert_eq!(rec.normal, Vec3::Z);

        rec.set_face_normal(&ray, -Vec3::Z);
        assert!(!rec.front_face);
        assert_eq!(rec.normal, Vec3::Z);
    }
}
