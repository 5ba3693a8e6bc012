//! Geometry sources and their placement in the scene.

use std::fmt;
use std::sync::Arc;

use xray_math::{Aabb, Mat4, Mat4Ext};

use crate::backend::{BackendResult, GeometryId, GeometryInstanceId};
use crate::context::Context;

/// Programs that intersect and bound one kind of geometry.
pub trait GeometryKernels {
    /// Module holding the intersection and bounds programs.
    fn program_module(&self) -> &str;

    fn intersect_program(&self) -> &str;

    fn bounds_program(&self) -> &str;

    /// Load the intersection and bounds programs and create a backend
    /// geometry over `primitive_count` primitives.
    fn build_geometry(&self, ctx: &mut Context, primitive_count: u32) -> BackendResult<GeometryId> {
        let module = self.program_module();
        let intersect = ctx.create_program(module, self.intersect_program())?;
        let bounds = ctx.create_program(module, self.bounds_program())?;
        ctx.create_geometry(intersect, bounds, primitive_count)
    }
}

/// Geometry that lives on the backend.
///
/// Implementors are immutable once built: everything a render needs has
/// been uploaded before the value is shared.
pub trait GeometrySource: GeometryKernels + Send + Sync {
    fn primitive_count(&self) -> u32;

    /// Object-space bounds.
    fn bounding_box(&self) -> Aabb;

    /// Backend handle of the geometry.
    fn geometry(&self) -> GeometryId;

    /// Place the geometry in the scene.
    fn attach_to_instance(
        &self,
        ctx: &mut Context,
        placement: Mat4,
    ) -> BackendResult<GeometryInstanceId> {
        ctx.create_geometry_instance(self.geometry(), placement)
    }
}

/// A geometry placed in the scene with an object-to-world transform.
#[derive(Clone)]
pub struct Instance {
    geometry: Arc<dyn GeometrySource>,
    placement: Mat4,
    instance_id: GeometryInstanceId,
}

impl Instance {
    pub fn new(
        ctx: &mut Context,
        geometry: Arc<dyn GeometrySource>,
        placement: Mat4,
    ) -> BackendResult<Self> {
        let instance_id = geometry.attach_to_instance(ctx, placement)?;
        Ok(Self {
            geometry,
            placement,
            instance_id,
        })
    }

    pub fn geometry(&self) -> &Arc<dyn GeometrySource> {
        &self.geometry
    }

    pub fn placement(&self) -> Mat4 {
        self.placement
    }

    /// Backend handle created when the instance was attached.
    pub fn geometry_instance(&self) -> GeometryInstanceId {
        self.instance_id
    }

    /// Bounds of the placed geometry in world space.
    pub fn world_bounds(&self) -> Aabb {
        self.placement.transform_aabb(&self.geometry.bounding_box())
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("geometry", &self.geometry.geometry())
            .field("placement", &self.placement)
            .field("instance_id", &self.instance_id)
            .finish()
    }
}
