//! Ray tracing backend interface.
//!
//! Everything the render and import pipelines ask of a ray tracing backend
//! goes through the [`Backend`] trait: buffers with a declared element
//! format, programs loaded by module and entry-point name, named variables,
//! geometry, groups, acceleration structures, validate/compile and a
//! synchronous launch. Resources are referred to by small `Copy` handles.
//!
//! `xray_renderer::CpuBackend` is the reference implementation; a GPU
//! binding implements the same trait.

use thiserror::Error;
use xray_math::{Mat4, Vec3};

#[cfg(test)]
pub(crate) mod recording;

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl $name {
            /// Raw index of the handle.
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}#{}", stringify!($name), self.0)
            }
        }
    };
}

handle!(
    /// Backend buffer.
    BufferId
);
handle!(
    /// Loaded program (ray generation, miss, intersection or bounds).
    ProgramId
);
handle!(
    /// Geometry: primitive count plus intersection and bounds programs.
    GeometryId
);
handle!(
    /// Geometry placed in the scene.
    GeometryInstanceId
);
handle!(
    /// Group of geometry instances traversed through one acceleration structure.
    GroupId
);
handle!(
    /// Acceleration structure attached to a group.
    AccelerationId
);

/// Element format of a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferFormat {
    /// Three `f32` per element.
    Float3,
    /// Three `i32` per element.
    Int3,
    /// Four `u8` per element.
    UnsignedByte4,
}

impl BufferFormat {
    /// Size of one element in bytes.
    pub fn element_size(self) -> usize {
        match self {
            BufferFormat::Float3 | BufferFormat::Int3 => 12,
            BufferFormat::UnsignedByte4 => 4,
        }
    }
}

/// Whether programs read from or write to a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferKind {
    Input,
    Output,
}

/// Shape of a buffer. One-dimensional buffers have `height == 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferDesc {
    pub kind: BufferKind,
    pub format: BufferFormat,
    pub width: u32,
    pub height: u32,
}

impl BufferDesc {
    /// One-dimensional input buffer of `len` elements. Buffers are
    /// addressed with 32-bit element counts.
    pub fn input(format: BufferFormat, len: usize) -> BackendResult<Self> {
        let width = u32::try_from(len).map_err(|_| BackendError::TooLarge(len))?;
        Ok(Self {
            kind: BufferKind::Input,
            format,
            width,
            height: 1,
        })
    }

    /// Two-dimensional output buffer.
    pub fn output(format: BufferFormat, width: u32, height: u32) -> Self {
        Self {
            kind: BufferKind::Output,
            format,
            width,
            height,
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// True if the buffer holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Size of the whole buffer in bytes.
    pub fn byte_len(&self) -> usize {
        self.len() * self.format.element_size()
    }
}

/// A value bound to a named program, geometry or context variable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Variable {
    Float(f32),
    Float3(Vec3),
    Matrix4(Mat4),
    Buffer(BufferId),
    Group(GroupId),
}

impl Variable {
    /// Short type name used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Variable::Float(_) => "float",
            Variable::Float3(_) => "float3",
            Variable::Matrix4(_) => "matrix4x4",
            Variable::Buffer(_) => "buffer",
            Variable::Group(_) => "group",
        }
    }
}

impl From<f32> for Variable {
    fn from(v: f32) -> Self {
        Variable::Float(v)
    }
}

impl From<Vec3> for Variable {
    fn from(v: Vec3) -> Self {
        Variable::Float3(v)
    }
}

impl From<Mat4> for Variable {
    fn from(m: Mat4) -> Self {
        Variable::Matrix4(m)
    }
}

impl From<BufferId> for Variable {
    fn from(b: BufferId) -> Self {
        Variable::Buffer(b)
    }
}

impl From<GroupId> for Variable {
    fn from(g: GroupId) -> Self {
        Variable::Group(g)
    }
}

/// Errors reported by a backend. Messages are the backend's own.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("compile failed: {0}")]
    Compile(String),

    #[error("launch failed: {0}")]
    Launch(String),

    #[error("program '{entry}' not found in module '{module}'")]
    ProgramNotFound { module: String, entry: String },

    #[error("invalid handle {0}")]
    InvalidHandle(String),

    #[error("buffer {buffer} holds {expected} bytes, got {actual}")]
    BufferSize {
        buffer: BufferId,
        expected: usize,
        actual: usize,
    },

    #[error("{0} elements exceed the 32-bit element limit")]
    TooLarge(usize),

    #[error("backend has been destroyed")]
    Destroyed,
}

/// Result type for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;

/// A ray tracing backend.
///
/// All operations are synchronous from the caller's point of view.
/// Implementations may parallelize `launch` internally.
pub trait Backend: Send {
    /// Human-readable backend name for logs.
    fn name(&self) -> &str;

    fn set_ray_type_count(&mut self, count: u32) -> BackendResult<()>;

    fn set_entry_point_count(&mut self, count: u32) -> BackendResult<()>;

    fn create_buffer(&mut self, desc: BufferDesc) -> BackendResult<BufferId>;

    /// Replace the whole contents of a buffer. `bytes` must be exactly
    /// [`BufferDesc::byte_len`] long.
    fn write_buffer(&mut self, buffer: BufferId, bytes: &[u8]) -> BackendResult<()>;

    /// Copy the whole contents of a buffer back to the host.
    fn read_buffer(&self, buffer: BufferId) -> BackendResult<Vec<u8>>;

    fn buffer_desc(&self, buffer: BufferId) -> BackendResult<BufferDesc>;

    /// Load `entry` from the compiled program module `module`.
    fn create_program(&mut self, module: &str, entry: &str) -> BackendResult<ProgramId>;

    fn set_program_variable(
        &mut self,
        program: ProgramId,
        name: &str,
        value: Variable,
    ) -> BackendResult<()>;

    fn create_geometry(
        &mut self,
        intersect: ProgramId,
        bounds: ProgramId,
        primitive_count: u32,
    ) -> BackendResult<GeometryId>;

    fn set_geometry_variable(
        &mut self,
        geometry: GeometryId,
        name: &str,
        value: Variable,
    ) -> BackendResult<()>;

    /// Place `geometry` in the scene with an object-to-world transform.
    fn create_geometry_instance(
        &mut self,
        geometry: GeometryId,
        placement: Mat4,
    ) -> BackendResult<GeometryInstanceId>;

    fn create_geometry_group(&mut self, children: &[GeometryInstanceId])
        -> BackendResult<GroupId>;

    fn release_geometry_group(&mut self, group: GroupId) -> BackendResult<()>;

    fn create_acceleration(&mut self, builder: &str, traverser: &str)
        -> BackendResult<AccelerationId>;

    fn set_group_acceleration(
        &mut self,
        group: GroupId,
        acceleration: AccelerationId,
    ) -> BackendResult<()>;

    fn release_acceleration(&mut self, acceleration: AccelerationId) -> BackendResult<()>;

    /// Request a rebuild of the acceleration structure at the next compile.
    fn mark_dirty(&mut self, acceleration: AccelerationId) -> BackendResult<()>;

    fn set_context_variable(&mut self, name: &str, value: Variable) -> BackendResult<()>;

    fn set_ray_generation_program(&mut self, entry: u32, program: ProgramId)
        -> BackendResult<()>;

    fn set_miss_program(&mut self, ray_type: u32, program: ProgramId) -> BackendResult<()>;

    fn validate(&mut self) -> BackendResult<()>;

    fn compile(&mut self) -> BackendResult<()>;

    /// Run entry point `entry` over a `width` x `height` launch grid and
    /// block until it finishes.
    fn launch(&mut self, entry: u32, width: u32, height: u32) -> BackendResult<()>;

    /// Release every resource. Called exactly once by the owning context.
    fn destroy(&mut self);
}
