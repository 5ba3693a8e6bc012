//! Built-in kernels of the CPU backend.
//!
//! Program names from `xray_core::kernels` resolve to one of these. Each
//! kernel declares the variables it reads; `CpuBackend::validate` checks
//! them before any launch.

use rand::Rng;
use xray_core::backend::{BackendError, BackendResult};
use xray_core::kernels as names;
use xray_math::{Mat4, Ray, Vec3};

/// A program the CPU backend knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Kernel {
    /// Thin-lens ray generation.
    Camera,
    /// Constant background.
    Miss,
    /// Triangle mesh intersection.
    MeshIntersect,
    /// Triangle mesh bounds.
    MeshBounds,
}

impl Kernel {
    pub fn resolve(module: &str, entry: &str) -> BackendResult<Self> {
        match (module, entry) {
            (names::CAMERA_MODULE, names::CAMERA_ENTRY) => Ok(Kernel::Camera),
            (names::MISS_MODULE, names::MISS_ENTRY) => Ok(Kernel::Miss),
            (names::MESH_MODULE, names::MESH_INTERSECT) => Ok(Kernel::MeshIntersect),
            (names::MESH_MODULE, names::MESH_BOUNDS) => Ok(Kernel::MeshBounds),
            _ => Err(BackendError::ProgramNotFound {
                module: module.to_string(),
                entry: entry.to_string(),
            }),
        }
    }

    /// Variables the kernel reads from its program scope, with their type names.
    pub fn reads(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Kernel::Camera => &[
                (names::camera::XFORM, "matrix4x4"),
                (names::camera::FOCAL_PLANE_ORIGIN, "float3"),
                (names::camera::FOCAL_PLANE_RIGHT, "float"),
                (names::camera::FOCAL_PLANE_UP, "float"),
                (names::camera::LENS_RADIUS, "float"),
            ],
            Kernel::Miss => &[(names::miss::BACKGROUND_COLOR, "float3")],
            Kernel::MeshIntersect | Kernel::MeshBounds => &[],
        }
    }
}

/// Parameters of the camera kernel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ThinLens {
    pub xform: Mat4,
    pub plane_origin: Vec3,
    pub plane_right: f32,
    pub plane_up: f32,
    pub lens_radius: f32,
}

impl ThinLens {
    /// World-space ray through the centre of pixel `(x, y)` of a
    /// `width` x `height` launch. Row 0 is the top of the image.
    pub fn generate<R: Rng>(&self, x: u32, y: u32, width: u32, height: u32, rng: &mut R) -> Ray {
        let u = (x as f32 + 0.5) / width as f32;
        let v = (y as f32 + 0.5) / height as f32;
        let target = self.plane_origin + Vec3::new(u * self.plane_right, v * self.plane_up, 0.0);

        let lens = if self.lens_radius > 0.0 {
            self.lens_radius * sample_disk(rng)
        } else {
            Vec3::ZERO
        };

        let origin = self.xform.transform_point3(lens);
        let direction = self.xform.transform_vector3(target - lens).normalize();
        Ray::new(origin, direction)
    }
}

/// Uniform point on the unit disk in the XY plane.
fn sample_disk<R: Rng>(rng: &mut R) -> Vec3 {
    let r = rng.gen::<f32>().sqrt();
    let theta = 2.0 * std::f32::consts::PI * rng.gen::<f32>();
    Vec3::new(r * theta.cos(), r * theta.sin(), 0.0)
}

/// Eye-light shading: brightness is the cosine between the view ray and
/// the surface normal.
pub(crate) fn eye_light(normal: Vec3, direction: Vec3) -> Vec3 {
    Vec3::splat(normal.dot(direction).abs().min(1.0))
}

/// Apply gamma correction (gamma = 2.0).
#[inline]
pub fn linear_to_gamma(linear: f32) -> f32 {
    if linear > 0.0 {
        linear.sqrt()
    } else {
        0.0
    }
}

/// Convert a linear color to 8-bit RGBA with gamma 2.
pub fn color_to_rgba(color: Vec3) -> [u8; 4] {
    let quantize = |c: f32| (255.0 * linear_to_gamma(c).clamp(0.0, 1.0)) as u8;
    [quantize(color.x), quantize(color.y), quantize(color.z), 255]
}
