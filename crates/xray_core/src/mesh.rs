//! Triangle mesh geometry.
//!
//! A [`MeshGeometry`] is built once from an imported model file: the first
//! mesh is validated, offset by an origin, uploaded into three backend
//! buffers and bound to a backend geometry running the mesh kernels. After
//! construction it is never modified and is shared between instances
//! through `Arc`.

use std::path::Path;

use thiserror::Error;
use xray_math::{Aabb, Vec3};

use crate::backend::{BackendError, BufferDesc, BufferFormat, BufferId, GeometryId};
use crate::context::Context;
use crate::geometry::{GeometryKernels, GeometrySource};
use crate::import::{ImportError, ImportFlags, ImportedMesh, ModelImporter};
use crate::kernels;
use crate::scene::{SceneError, SceneNode};

/// Face written in place of anything that is not a valid triangle.
pub const SENTINEL_FACE: [i32; 3] = [-1, -1, -1];

/// An imported mesh that cannot be turned into geometry.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("mesh has no vertex positions")]
    MissingPositions,

    #[error("mesh has no vertex normals")]
    MissingNormals,
}

/// Errors that can occur while building a [`MeshGeometry`].
#[derive(Error, Debug)]
pub enum GeometryError {
    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Scene(#[from] SceneError),
}

/// Host-side mesh data, ready for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    /// Positions with the origin offset applied.
    pub positions: Vec<Vec3>,
    /// Unit normals, one per position.
    pub normals: Vec<Vec3>,
    /// One entry per imported face; [`SENTINEL_FACE`] where the face is not
    /// a triangle over valid vertices.
    pub faces: Vec<[i32; 3]>,
    /// Exact bounds of `positions`.
    pub bounds: Aabb,
}

impl MeshData {
    /// Validate `mesh` and convert it, moving every vertex by `origin`.
    pub fn build(mesh: &ImportedMesh, origin: Vec3) -> Result<Self, ValidationError> {
        // Both checks run before anything else is touched.
        if !mesh.has_positions() {
            return Err(ValidationError::MissingPositions);
        }
        let imported_normals = match &mesh.normals {
            Some(n) if mesh.has_normals() => n,
            _ => return Err(ValidationError::MissingNormals),
        };

        let mut bounds = Aabb::EMPTY;
        let positions: Vec<Vec3> = mesh
            .positions
            .iter()
            .map(|p| {
                let p = *p + origin;
                bounds.include(p);
                p
            })
            .collect();

        let normals = imported_normals.iter().map(|n| n.normalize_or_zero()).collect();

        let vertex_count = positions.len();
        let faces = mesh
            .faces
            .iter()
            .map(|face| triangle(face, vertex_count).unwrap_or(SENTINEL_FACE))
            .collect();

        Ok(Self {
            positions,
            normals,
            faces,
            bounds,
        })
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Number of faces replaced by [`SENTINEL_FACE`].
    pub fn sentinel_count(&self) -> usize {
        self.faces.iter().filter(|f| **f == SENTINEL_FACE).count()
    }
}

fn triangle(face: &[u32], vertex_count: usize) -> Option<[i32; 3]> {
    let [a, b, c] = <[u32; 3]>::try_from(face).ok()?;
    let index = |i: u32| {
        i32::try_from(i)
            .ok()
            .filter(|_| (i as usize) < vertex_count)
    };
    Some([index(a)?, index(b)?, index(c)?])
}

/// Triangle mesh uploaded to the backend.
#[derive(Debug)]
pub struct MeshGeometry {
    data: MeshData,
    origin: Vec3,
    primitive_count: u32,
    geometry: GeometryId,
    vertex_buffer: BufferId,
    normal_buffer: BufferId,
    face_buffer: BufferId,
}

impl MeshGeometry {
    /// Import `path` with the default flags and upload its first mesh.
    pub fn new(
        ctx: &mut Context,
        importer: &dyn ModelImporter,
        path: impl AsRef<Path>,
        origin: Vec3,
    ) -> Result<Self, GeometryError> {
        Self::with_flags(ctx, importer, path, origin, ImportFlags::default())
    }

    pub fn with_flags(
        ctx: &mut Context,
        importer: &dyn ModelImporter,
        path: impl AsRef<Path>,
        origin: Vec3,
        flags: ImportFlags,
    ) -> Result<Self, GeometryError> {
        let path = path.as_ref();
        let scene = importer.import(path, &flags)?;

        let mut meshes = scene.meshes.into_iter();
        let mesh = meshes
            .next()
            .ok_or_else(|| ImportError::NoMeshes(path.to_path_buf()))?;
        let extra = meshes.count();
        if extra > 0 {
            log::warn!(
                "{}: using mesh '{}', ignoring {} more",
                path.display(),
                mesh.name,
                extra
            );
        }

        let data = MeshData::build(&mesh, origin)?;

        let sentinels = data.sentinel_count();
        if sentinels > 0 {
            log::warn!(
                "{}: {} of {} faces are not triangles and will not be traced",
                path.display(),
                sentinels,
                data.face_count()
            );
        }

        let geometry = Self::upload(ctx, data, origin)?;
        log::info!(
            "Loaded {}: {} vertices, {} faces",
            path.display(),
            geometry.data.positions.len(),
            geometry.data.face_count()
        );
        log::debug!(
            "{} bounds: {:?} .. {:?}",
            path.display(),
            geometry.data.bounds.min(),
            geometry.data.bounds.max()
        );
        Ok(geometry)
    }

    /// Build from a scene description node with `file` and `origin`.
    pub fn make(
        ctx: &mut Context,
        importer: &dyn ModelImporter,
        node: &dyn SceneNode,
    ) -> Result<Self, GeometryError> {
        let origin = node.get_float3("origin")?;
        let file = node.get_string("file")?;
        Self::new(ctx, importer, file, origin)
    }

    fn upload(ctx: &mut Context, data: MeshData, origin: Vec3) -> Result<Self, BackendError> {
        let vertex_count = data.positions.len();
        let face_count = data.face_count();

        let vertex_desc = BufferDesc::input(BufferFormat::Float3, vertex_count)?;
        let face_desc = BufferDesc::input(BufferFormat::Int3, face_count)?;
        let primitive_count = face_desc.width;

        let vertex_buffer = ctx.create_buffer(vertex_desc)?;
        let normal_buffer = ctx.create_buffer(vertex_desc)?;
        let face_buffer = ctx.create_buffer(face_desc)?;

        let positions: Vec<[f32; 3]> = data.positions.iter().map(|p| p.to_array()).collect();
        let normals: Vec<[f32; 3]> = data.normals.iter().map(|n| n.to_array()).collect();
        ctx.write_buffer(vertex_buffer, bytemuck::cast_slice(&positions))?;
        ctx.write_buffer(normal_buffer, bytemuck::cast_slice(&normals))?;
        ctx.write_buffer(face_buffer, bytemuck::cast_slice(&data.faces))?;

        let geometry = data.build_geometry(ctx, primitive_count)?;

        ctx.set_geometry_variable(geometry, kernels::mesh::VERTEX_BUFFER, vertex_buffer)?;
        ctx.set_geometry_variable(geometry, kernels::mesh::NORMAL_BUFFER, normal_buffer)?;
        ctx.set_geometry_variable(geometry, kernels::mesh::FACE_INDICES, face_buffer)?;

        Ok(Self {
            data,
            origin,
            primitive_count,
            geometry,
            vertex_buffer,
            normal_buffer,
            face_buffer,
        })
    }

    pub fn data(&self) -> &MeshData {
        &self.data
    }

    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    pub fn vertex_buffer(&self) -> BufferId {
        self.vertex_buffer
    }

    pub fn normal_buffer(&self) -> BufferId {
        self.normal_buffer
    }

    pub fn face_buffer(&self) -> BufferId {
        self.face_buffer
    }
}

impl GeometryKernels for MeshData {
    fn program_module(&self) -> &str {
        kernels::MESH_MODULE
    }

    fn intersect_program(&self) -> &str {
        kernels::MESH_INTERSECT
    }

    fn bounds_program(&self) -> &str {
        kernels::MESH_BOUNDS
    }
}

impl GeometryKernels for MeshGeometry {
    fn program_module(&self) -> &str {
        self.data.program_module()
    }

    fn intersect_program(&self) -> &str {
        self.data.intersect_program()
    }

    fn bounds_program(&self) -> &str {
        self.data.bounds_program()
    }
}

impl GeometrySource for MeshGeometry {
    fn primitive_count(&self) -> u32 {
        self.primitive_count
    }

    fn bounding_box(&self) -> Aabb {
        self.data.bounds
    }

    fn geometry(&self) -> GeometryId {
        self.geometry
    }
}
