//! The rendering context: exclusive owner of a ray tracing backend.
//!
//! There is one context per renderer. Cameras, geometry and instances never
//! hold on to it; every call that allocates or binds backend resources takes
//! `&mut Context`. The backend is torn down exactly once, either through
//! [`Context::destroy`] or when the context is dropped, so error paths that
//! unwind out of a render still release it.

use xray_math::Mat4;

use crate::backend::{
    AccelerationId, Backend, BackendResult, BufferDesc, BufferId, GeometryId,
    GeometryInstanceId, GroupId, ProgramId, Variable,
};

/// Ray type traced from the camera.
pub const RAY_TYPE_PRIMARY: u32 = 0;
/// Ray type reserved for shadow / secondary queries.
pub const RAY_TYPE_SHADOW: u32 = 1;
/// Entry point of the camera launch.
pub const ENTRY_POINT_CAMERA: u32 = 0;

/// Context configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextConfig {
    /// Number of ray types (primary + shadow).
    pub ray_type_count: u32,
    /// Number of launch entry points.
    pub entry_point_count: u32,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            ray_type_count: RAY_TYPE_SHADOW + 1,
            entry_point_count: ENTRY_POINT_CAMERA + 1,
        }
    }
}

/// Handle to the ray tracing backend.
pub struct Context {
    backend: Box<dyn Backend>,
    config: ContextConfig,
    destroyed: bool,
}

impl Context {
    /// Take ownership of `backend` and configure its ray types and entry points.
    pub fn create<B: Backend + 'static>(backend: B, config: ContextConfig) -> BackendResult<Self> {
        let mut ctx = Self {
            backend: Box::new(backend),
            config,
            destroyed: false,
        };

        // On error `ctx` drops here and the backend is destroyed.
        ctx.backend.set_ray_type_count(config.ray_type_count)?;
        ctx.backend.set_entry_point_count(config.entry_point_count)?;

        log::info!(
            "Created {} context: {} ray types, {} entry points",
            ctx.backend.name(),
            config.ray_type_count,
            config.entry_point_count
        );
        Ok(ctx)
    }

    /// Create with the default configuration (2 ray types, 1 entry point).
    pub fn with_backend<B: Backend + 'static>(backend: B) -> BackendResult<Self> {
        Self::create(backend, ContextConfig::default())
    }

    pub fn config(&self) -> ContextConfig {
        self.config
    }

    /// Name of the underlying backend.
    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Release all backend resources.
    pub fn destroy(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if !self.destroyed {
            self.backend.destroy();
            self.destroyed = true;
            log::debug!("Destroyed {} context", self.backend.name());
        }
    }

    pub fn create_buffer(&mut self, desc: BufferDesc) -> BackendResult<BufferId> {
        self.backend.create_buffer(desc)
    }

    pub fn write_buffer(&mut self, buffer: BufferId, bytes: &[u8]) -> BackendResult<()> {
        self.backend.write_buffer(buffer, bytes)
    }

    pub fn read_buffer(&self, buffer: BufferId) -> BackendResult<Vec<u8>> {
        self.backend.read_buffer(buffer)
    }

    pub fn buffer_desc(&self, buffer: BufferId) -> BackendResult<BufferDesc> {
        self.backend.buffer_desc(buffer)
    }

    pub fn create_program(&mut self, module: &str, entry: &str) -> BackendResult<ProgramId> {
        self.backend.create_program(module, entry)
    }

    pub fn set_program_variable(
        &mut self,
        program: ProgramId,
        name: &str,
        value: impl Into<Variable>,
    ) -> BackendResult<()> {
        self.backend.set_program_variable(program, name, value.into())
    }

    pub fn create_geometry(
        &mut self,
        intersect: ProgramId,
        bounds: ProgramId,
        primitive_count: u32,
    ) -> BackendResult<GeometryId> {
        self.backend.create_geometry(intersect, bounds, primitive_count)
    }

    pub fn set_geometry_variable(
        &mut self,
        geometry: GeometryId,
        name: &str,
        value: impl Into<Variable>,
    ) -> BackendResult<()> {
        self.backend.set_geometry_variable(geometry, name, value.into())
    }

    pub fn create_geometry_instance(
        &mut self,
        geometry: GeometryId,
        placement: Mat4,
    ) -> BackendResult<GeometryInstanceId> {
        self.backend.create_geometry_instance(geometry, placement)
    }

    pub fn create_geometry_group(
        &mut self,
        children: &[GeometryInstanceId],
    ) -> BackendResult<GroupId> {
        self.backend.create_geometry_group(children)
    }

    pub fn release_geometry_group(&mut self, group: GroupId) -> BackendResult<()> {
        self.backend.release_geometry_group(group)
    }

    pub fn create_acceleration(
        &mut self,
        builder: &str,
        traverser: &str,
    ) -> BackendResult<AccelerationId> {
        self.backend.create_acceleration(builder, traverser)
    }

    pub fn set_group_acceleration(
        &mut self,
        group: GroupId,
        acceleration: AccelerationId,
    ) -> BackendResult<()> {
        self.backend.set_group_acceleration(group, acceleration)
    }

    pub fn release_acceleration(&mut self, acceleration: AccelerationId) -> BackendResult<()> {
        self.backend.release_acceleration(acceleration)
    }

    pub fn mark_dirty(&mut self, acceleration: AccelerationId) -> BackendResult<()> {
        self.backend.mark_dirty(acceleration)
    }

    pub fn set_context_variable(
        &mut self,
        name: &str,
        value: impl Into<Variable>,
    ) -> BackendResult<()> {
        self.backend.set_context_variable(name, value.into())
    }

    pub fn set_ray_generation_program(
        &mut self,
        entry: u32,
        program: ProgramId,
    ) -> BackendResult<()> {
        self.backend.set_ray_generation_program(entry, program)
    }

    pub fn set_miss_program(&mut self, ray_type: u32, program: ProgramId) -> BackendResult<()> {
        self.backend.set_miss_program(ray_type, program)
    }

    pub fn validate(&mut self) -> BackendResult<()> {
        self.backend.validate()
    }

    pub fn compile(&mut self) -> BackendResult<()> {
        self.backend.compile()
    }

    pub fn launch(&mut self, entry: u32, width: u32, height: u32) -> BackendResult<()> {
        self.backend.launch(entry, width, height)
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        self.release();
    }
}
