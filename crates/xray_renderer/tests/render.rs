//! End-to-end renders through the core pipeline on the CPU backend.

use std::io::Write;
use std::sync::Arc;

use xray_core::backend::GeometryId;
use xray_core::{
    BackendError, Camera, CameraError, CameraSettings, Context, GeometryKernels, GeometrySource,
    ImportFlags, Instance, MeshGeometry, ObjImporter,
};
use xray_math::{Aabb, Mat4, Vec3};
use xray_renderer::CpuBackend;

const SIZE: u32 = 32;

/// 2x2 quad facing +Z. Stays a single polygon when triangulation is off.
const QUAD: &str = "\
v -1 -1 0
v  1 -1 0
v  1  1 0
v -1  1 0
vn 0 0 1
f 1//1 2//1 3//1 4//1
";

fn write_obj(text: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".obj").tempfile().unwrap();
    file.write_all(text.as_bytes()).unwrap();
    file
}

fn settings() -> CameraSettings {
    CameraSettings {
        width: SIZE,
        height: SIZE,
        fov: std::f32::consts::FRAC_PI_2,
        focal_length: 1.0,
        f_stop: 1.0e4,
    }
}

fn pixel(rgba: &[u8], x: u32, y: u32) -> [u8; 4] {
    let i = ((y * SIZE + x) * 4) as usize;
    [rgba[i], rgba[i + 1], rgba[i + 2], rgba[i + 3]]
}

#[test]
fn test_second_render_shows_added_instance() {
    let file = write_obj(QUAD);
    let mut ctx = Context::with_backend(CpuBackend::new()).unwrap();

    let mesh: Arc<dyn GeometrySource> = Arc::new(
        MeshGeometry::new(
            &mut ctx,
            &ObjImporter::new(),
            file.path(),
            Vec3::new(0.0, 0.0, -5.0),
        )
        .unwrap(),
    );
    let left = Instance::new(
        &mut ctx,
        Arc::clone(&mesh),
        Mat4::from_translation(Vec3::new(-2.5, 0.0, 0.0)),
    )
    .unwrap();

    let mut camera = Camera::new(&mut ctx, Mat4::IDENTITY, vec![left], settings()).unwrap();
    camera.render(&mut ctx).unwrap();
    let first = camera.read_image(&ctx).unwrap();

    assert_eq!(first.len(), (SIZE * SIZE * 4) as usize);
    assert!(pixel(&first, 8, 16)[0] > 200, "left quad is lit");
    assert_eq!(pixel(&first, 24, 16), [0, 0, 0, 255], "right side is background");

    let right = Instance::new(
        &mut ctx,
        mesh,
        Mat4::from_translation(Vec3::new(2.5, 0.0, 0.0)),
    )
    .unwrap();
    camera.instances_mut().push(right);
    camera.render(&mut ctx).unwrap();
    let second = camera.read_image(&ctx).unwrap();

    assert!(pixel(&second, 8, 16)[0] > 200);
    assert!(pixel(&second, 24, 16)[0] > 200, "added instance is rendered");

    ctx.destroy();
}

#[test]
fn test_renders_are_deterministic() {
    let file = write_obj(QUAD);
    let render = || {
        let mut ctx = Context::with_backend(CpuBackend::new().with_seed(9)).unwrap();
        let mesh =
            MeshGeometry::new(&mut ctx, &ObjImporter::new(), file.path(), Vec3::new(0.0, 0.0, -3.0))
                .unwrap();
        let quad = Instance::new(&mut ctx, Arc::new(mesh), Mat4::IDENTITY).unwrap();
        let lens = CameraSettings {
            f_stop: 2.0,
            ..settings()
        };
        let mut camera = Camera::new(&mut ctx, Mat4::IDENTITY, vec![quad], lens).unwrap();
        camera.render(&mut ctx).unwrap();
        camera.read_image(&ctx).unwrap()
    };

    assert_eq!(render(), render());
}

#[test]
fn test_untriangulated_quad_is_not_traced() {
    let file = write_obj(QUAD);
    let mut ctx = Context::with_backend(CpuBackend::new()).unwrap();
    let flags = ImportFlags {
        triangulate: false,
        ..Default::default()
    };

    let mesh = MeshGeometry::with_flags(
        &mut ctx,
        &ObjImporter::new(),
        file.path(),
        Vec3::new(0.0, 0.0, -5.0),
        flags,
    )
    .unwrap();
    assert_eq!(mesh.primitive_count(), 1);
    assert_eq!(mesh.data().sentinel_count(), 1);

    let quad = Instance::new(&mut ctx, Arc::new(mesh), Mat4::IDENTITY).unwrap();
    let mut camera = Camera::new(&mut ctx, Mat4::IDENTITY, vec![quad], settings()).unwrap();
    camera.render(&mut ctx).unwrap();

    let image = camera.read_image(&ctx).unwrap();
    assert_eq!(pixel(&image, 16, 16), [0, 0, 0, 255]);
}

#[test]
fn test_raw_buffer_holds_radiance() {
    let file = write_obj(QUAD);
    let mut ctx = Context::with_backend(CpuBackend::new()).unwrap();
    let mesh =
        MeshGeometry::new(&mut ctx, &ObjImporter::new(), file.path(), Vec3::new(0.0, 0.0, -5.0))
            .unwrap();
    let quad = Instance::new(&mut ctx, Arc::new(mesh), Mat4::IDENTITY).unwrap();
    let mut camera = Camera::new(&mut ctx, Mat4::IDENTITY, vec![quad], settings()).unwrap();
    camera.render(&mut ctx).unwrap();

    let raw = ctx.read_buffer(camera.raw_buffer().unwrap()).unwrap();
    assert_eq!(raw.len(), (SIZE * SIZE * 12) as usize);

    let centre = ((16 * SIZE + 16) * 12) as usize;
    let r: f32 = bytemuck::pod_read_unaligned(&raw[centre..centre + 4]);
    assert!(r > 0.9 && r <= 1.0);
}

/// Geometry whose intersection and bounds programs are camera kernels.
struct CameraKernels;

impl GeometryKernels for CameraKernels {
    fn program_module(&self) -> &str {
        "camera"
    }
    fn intersect_program(&self) -> &str {
        "camera"
    }
    fn bounds_program(&self) -> &str {
        "camera"
    }
}

struct Misbound(GeometryId);

impl GeometryKernels for Misbound {
    fn program_module(&self) -> &str {
        CameraKernels.program_module()
    }
    fn intersect_program(&self) -> &str {
        CameraKernels.intersect_program()
    }
    fn bounds_program(&self) -> &str {
        CameraKernels.bounds_program()
    }
}

impl GeometrySource for Misbound {
    fn primitive_count(&self) -> u32 {
        1
    }
    fn bounding_box(&self) -> Aabb {
        Aabb::EMPTY
    }
    fn geometry(&self) -> GeometryId {
        self.0
    }
}

#[test]
fn test_failed_render_keeps_previous_image() {
    let file = write_obj(QUAD);
    let mut ctx = Context::with_backend(CpuBackend::new()).unwrap();
    let mesh =
        MeshGeometry::new(&mut ctx, &ObjImporter::new(), file.path(), Vec3::new(0.0, 0.0, -5.0))
            .unwrap();
    let quad = Instance::new(&mut ctx, Arc::new(mesh), Mat4::IDENTITY).unwrap();
    let mut camera = Camera::new(&mut ctx, Mat4::IDENTITY, vec![quad], settings()).unwrap();
    camera.render(&mut ctx).unwrap();
    let first = camera.read_image(&ctx).unwrap();

    let geometry = CameraKernels.build_geometry(&mut ctx, 1).unwrap();
    let broken = Instance::new(&mut ctx, Arc::new(Misbound(geometry)), Mat4::IDENTITY).unwrap();
    camera.instances_mut().push(broken);

    let err = camera.render(&mut ctx).unwrap_err();
    assert!(matches!(err, CameraError::Backend(BackendError::Validation(_))));
    assert!(camera.image_buffer().is_ok());
    assert_eq!(camera.read_image(&ctx).unwrap(), first);
}
