//! Thin-lens camera and the render pipeline.
//!
//! The camera owns its output buffers, its ray generation and miss programs
//! and the list of instances it renders. Each [`Camera::render`] rebuilds
//! the scene root (a geometry group with a fresh acceleration structure)
//! from the current instance list before launching.

use std::f32::consts::PI;
use std::time::Instant;

use thiserror::Error;
use xray_math::{rotation_then_translation, Mat4, Vec3};

use crate::backend::{
    AccelerationId, BackendError, BufferDesc, BufferFormat, BufferId, GroupId, ProgramId,
};
use crate::context::{Context, ENTRY_POINT_CAMERA, RAY_TYPE_PRIMARY};
use crate::geometry::Instance;
use crate::kernels;
use crate::scene::{SceneError, SceneNode};

/// Errors that can occur while building or rendering with a camera.
#[derive(Error, Debug)]
pub enum CameraError {
    #[error("invalid camera settings: {0}")]
    InvalidSettings(String),

    #[error("camera has not rendered yet")]
    NotRendered,

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Scene(#[from] SceneError),
}

/// Camera parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraSettings {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Field of view in radians, across the shorter image side
    pub fov: f32,
    /// Distance from the lens to the plane in focus
    pub focal_length: f32,
    /// Aperture as an f-number
    pub f_stop: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            fov: PI / 2.0,
            focal_length: 1.0,
            f_stop: 8.0,
        }
    }
}

impl CameraSettings {
    pub fn validate(&self) -> Result<(), CameraError> {
        let invalid = |msg: String| Err(CameraError::InvalidSettings(msg));

        if self.width == 0 || self.height == 0 {
            return invalid(format!("image size {}x{}", self.width, self.height));
        }
        if !(self.fov > 0.0 && self.fov < PI) {
            return invalid(format!("field of view {} outside (0, pi)", self.fov));
        }
        if !(self.focal_length > 0.0) {
            return invalid(format!("focal length {}", self.focal_length));
        }
        if !(self.f_stop > 0.0) {
            return invalid(format!("f-stop {}", self.f_stop));
        }
        Ok(())
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

/// The plane in focus, in camera space.
///
/// `origin` is the top-left corner; a pixel's point on the plane is
/// `origin + (u * right, v * up, 0)` with `u, v` in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FocalPlane {
    pub origin: Vec3,
    /// Full width of the plane
    pub right: f32,
    /// Full height of the plane, negative (image rows run downward)
    pub up: f32,
}

impl FocalPlane {
    pub fn new(settings: &CameraSettings) -> Self {
        let extent = settings.focal_length * (settings.fov / 2.0).tan();
        let (half_right, half_up) = if settings.width > settings.height {
            (extent * settings.aspect_ratio(), extent)
        } else {
            (extent, extent / settings.aspect_ratio())
        };

        Self {
            origin: Vec3::new(-half_right, half_up, -settings.focal_length),
            right: 2.0 * half_right,
            up: -2.0 * half_up,
        }
    }
}

/// Lens radius for a focal length and f-number.
pub fn lens_radius(focal_length: f32, f_stop: f32) -> f32 {
    (focal_length / f_stop) / 2.0
}

#[derive(Debug, Clone, Copy)]
struct SceneRoot {
    group: GroupId,
    acceleration: AccelerationId,
}

/// A thin-lens camera.
#[derive(Debug)]
pub struct Camera {
    settings: CameraSettings,
    transform: Mat4,
    instances: Vec<Instance>,
    lens_radius: f32,
    focal_plane: FocalPlane,
    raw_buffer: BufferId,
    image_buffer: BufferId,
    ray_generation: ProgramId,
    miss: ProgramId,
    scene_root: Option<SceneRoot>,
    rendered: bool,
}

impl Camera {
    /// Create the camera's buffers and programs.
    ///
    /// `transform` is camera-to-world.
    pub fn new(
        ctx: &mut Context,
        transform: Mat4,
        instances: Vec<Instance>,
        settings: CameraSettings,
    ) -> Result<Self, CameraError> {
        settings.validate()?;

        let lens_radius = lens_radius(settings.focal_length, settings.f_stop);
        let focal_plane = FocalPlane::new(&settings);
        log::debug!(
            "Focal plane origin {:?}, right {}, up {}, lens radius {}",
            focal_plane.origin,
            focal_plane.right,
            focal_plane.up,
            lens_radius
        );

        let (w, h) = (settings.width, settings.height);
        let raw_buffer = ctx.create_buffer(BufferDesc::output(BufferFormat::Float3, w, h))?;
        let image_buffer =
            ctx.create_buffer(BufferDesc::output(BufferFormat::UnsignedByte4, w, h))?;

        let ray_generation = ctx.create_program(kernels::CAMERA_MODULE, kernels::CAMERA_ENTRY)?;
        ctx.set_program_variable(ray_generation, kernels::camera::XFORM, transform)?;
        ctx.set_program_variable(
            ray_generation,
            kernels::camera::FOCAL_PLANE_ORIGIN,
            focal_plane.origin,
        )?;
        ctx.set_program_variable(
            ray_generation,
            kernels::camera::FOCAL_PLANE_RIGHT,
            focal_plane.right,
        )?;
        ctx.set_program_variable(ray_generation, kernels::camera::FOCAL_PLANE_UP, focal_plane.up)?;
        ctx.set_program_variable(ray_generation, kernels::camera::LENS_RADIUS, lens_radius)?;

        let miss = ctx.create_program(kernels::MISS_MODULE, kernels::MISS_ENTRY)?;
        ctx.set_program_variable(miss, kernels::miss::BACKGROUND_COLOR, Vec3::ZERO)?;

        Ok(Self {
            settings,
            transform,
            instances,
            lens_radius,
            focal_plane,
            raw_buffer,
            image_buffer,
            ray_generation,
            miss,
            scene_root: None,
            rendered: false,
        })
    }

    /// Build from a scene description node.
    ///
    /// Reads `width`, `height`, `fov`, `focalLength`, `fStop` and `objects`;
    /// the placement comes from the optional `rotateAngle`, `rotateAxis` and
    /// `translate`.
    pub fn make(ctx: &mut Context, node: &dyn SceneNode) -> Result<Self, CameraError> {
        let transform = rotation_then_translation(
            node.get_float_or("rotateAngle", 0.0)?,
            node.get_float3_or("rotateAxis", Vec3::Y)?,
            node.get_float3_or("translate", Vec3::ZERO)?,
        );
        let settings = CameraSettings {
            width: node.get_u32("width")?,
            height: node.get_u32("height")?,
            fov: node.get_float("fov")?,
            focal_length: node.get_float("focalLength")?,
            f_stop: node.get_float("fStop")?,
        };
        let instances = node.get_instance_list("objects")?;

        Self::new(ctx, transform, instances, settings)
    }

    /// Rebuild the scene root from the current instances and trace one frame.
    ///
    /// A failed render leaves the buffers of the last successful one readable.
    pub fn render(&mut self, ctx: &mut Context) -> Result<(), CameraError> {
        let start = Instant::now();

        if let Some(previous) = self.scene_root.take() {
            ctx.release_geometry_group(previous.group)?;
            ctx.release_acceleration(previous.acceleration)?;
        }

        let children: Vec<_> = self
            .instances
            .iter()
            .map(Instance::geometry_instance)
            .collect();
        let group = ctx.create_geometry_group(&children)?;
        let acceleration = ctx.create_acceleration(kernels::ACCEL_BUILDER, kernels::ACCEL_TRAVERSER)?;
        self.scene_root = Some(SceneRoot {
            group,
            acceleration,
        });
        ctx.set_group_acceleration(group, acceleration)?;
        ctx.mark_dirty(acceleration)?;

        ctx.set_context_variable(kernels::context::SCENE_ROOT, group)?;
        ctx.set_context_variable(kernels::context::RAW_BUFFER, self.raw_buffer)?;
        ctx.set_context_variable(kernels::context::IMAGE_BUFFER, self.image_buffer)?;
        ctx.set_ray_generation_program(ENTRY_POINT_CAMERA, self.ray_generation)?;
        ctx.set_miss_program(RAY_TYPE_PRIMARY, self.miss)?;

        ctx.validate()?;
        ctx.compile()?;
        let setup = start.elapsed();

        log::info!(
            "Rendering {}x{}, {} instance(s)",
            self.settings.width,
            self.settings.height,
            self.instances.len()
        );
        ctx.launch(ENTRY_POINT_CAMERA, self.settings.width, self.settings.height)?;
        self.rendered = true;

        log::debug!("Scene setup took {:.2?}", setup);
        log::info!("Render finished in {:.2?}", start.elapsed());
        Ok(())
    }

    /// Quantized RGBA8 display buffer.
    pub fn image_buffer(&self) -> Result<BufferId, CameraError> {
        if self.rendered {
            Ok(self.image_buffer)
        } else {
            Err(CameraError::NotRendered)
        }
    }

    /// Float3 radiance buffer.
    pub fn raw_buffer(&self) -> Result<BufferId, CameraError> {
        if self.rendered {
            Ok(self.raw_buffer)
        } else {
            Err(CameraError::NotRendered)
        }
    }

    /// Read the display buffer back: `width * height * 4` bytes, row-major,
    /// top row first.
    pub fn read_image(&self, ctx: &Context) -> Result<Vec<u8>, CameraError> {
        Ok(ctx.read_buffer(self.image_buffer()?)?)
    }

    pub fn settings(&self) -> &CameraSettings {
        &self.settings
    }

    pub fn width(&self) -> u32 {
        self.settings.width
    }

    pub fn height(&self) -> u32 {
        self.settings.height
    }

    pub fn focal_length(&self) -> f32 {
        self.settings.focal_length
    }

    pub fn lens_radius(&self) -> f32 {
        self.lens_radius
    }

    pub fn focal_plane(&self) -> &FocalPlane {
        &self.focal_plane
    }

    pub fn transform(&self) -> Mat4 {
        self.transform
    }

    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    /// Instances to render. Changes apply to the next [`Camera::render`].
    pub fn instances_mut(&mut self) -> &mut Vec<Instance> {
        &mut self.instances
    }
}
