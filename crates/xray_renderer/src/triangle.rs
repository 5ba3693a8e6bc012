//! Triangle primitive for ray tracing.
//!
//! Uses the Möller-Trumbore algorithm for ray-triangle intersection and
//! interpolates per-vertex normals for shading.

use crate::hittable::{HitRecord, Hittable};
use xray_math::{Aabb, Interval, Ray, Vec3};

/// Padding that keeps flat triangles from producing zero-width boxes.
const BBOX_PADDING: f32 = 0.0001;

/// A triangle with per-vertex normals.
#[derive(Debug, Clone)]
pub struct Triangle {
    /// Vertices
    v0: Vec3,
    v1: Vec3,
    v2: Vec3,
    /// Vertex normals
    normals: [Vec3; 3],
    /// Geometric normal (unit length, zero for degenerate triangles)
    face_normal: Vec3,
    /// Bounding box
    bbox: Aabb,
}

impl Triangle {
    /// Create a triangle with flat shading.
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3) -> Self {
        let n = (v1 - v0).cross(v2 - v0).normalize_or_zero();
        Self::with_normals(v0, v1, v2, [n; 3])
    }

    /// Create a triangle with smooth shading.
    pub fn with_normals(v0: Vec3, v1: Vec3, v2: Vec3, normals: [Vec3; 3]) -> Self {
        let face_normal = (v1 - v0).cross(v2 - v0).normalize_or_zero();

        let mut bbox = Aabb::EMPTY;
        for v in [v0, v1, v2] {
            bbox.include(v);
        }

        Self {
            v0,
            v1,
            v2,
            normals,
            face_normal,
            bbox: bbox.padded(BBOX_PADDING),
        }
    }

    pub fn vertices(&self) -> [Vec3; 3] {
        [self.v0, self.v1, self.v2]
    }

    /// Interpolated shading normal at barycentric `(u, v)`.
    fn shading_normal(&self, u: f32, v: f32) -> Vec3 {
        let [n0, n1, n2] = self.normals;
        let n = (n0 * (1.0 - u - v) + n1 * u + n2 * v).normalize_or_zero();
        if n == Vec3::ZERO {
            self.face_normal
        } else {
            n
        }
    }
}

impl Hittable for Triangle {
    /// Möller-Trumbore ray-triangle intersection algorithm.
    fn hit(&self, ray: &Ray, ray_t: Interval, rec: &mut HitRecord) -> bool {
        let edge1 = self.v1 - self.v0;
        let edge2 = self.v2 - self.v0;

        let h = ray.direction.cross(edge2);
        let a = edge1.dot(h);

        // Ray is parallel to triangle
        if a.abs() < 1e-8 {
            return false;
        }

        let f = 1.0 / a;
        let s = ray.origin - self.v0;
        let u = f * s.dot(h);

        if !(0.0..=1.0).contains(&u) {
            return false;
        }

        let q = s.cross(edge1);
        let v = f * ray.direction.dot(q);

        if v < 0.0 || u + v > 1.0 {
            return false;
        }

        let t = f * edge2.dot(q);

        if !ray_t.contains(t) {
            return false;
        }

        rec.t = t;
        rec.p = ray.at(t);
        rec.u = u;
        rec.v = v;
        rec.set_face_normal(ray, self.shading_normal(u, v));

        true
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }
}
