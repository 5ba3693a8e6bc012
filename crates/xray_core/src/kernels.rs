//! Names shared between the host pipelines and backend kernels.
//!
//! Programs are resolved by `(module, entry)`; variables by name. A backend
//! that implements these kernels reads exactly the variables listed here.

/// Ray generation: thin-lens camera.
pub const CAMERA_MODULE: &str = "camera";
pub const CAMERA_ENTRY: &str = "camera";

/// Miss: constant background.
pub const MISS_MODULE: &str = "constant";
pub const MISS_ENTRY: &str = "miss";

/// Triangle mesh intersection and bounds.
pub const MESH_MODULE: &str = "mesh";
pub const MESH_INTERSECT: &str = "meshIntersect";
pub const MESH_BOUNDS: &str = "meshBounds";

/// Acceleration structure builder and traverser requested by the camera.
pub const ACCEL_BUILDER: &str = "Trbvh";
pub const ACCEL_TRAVERSER: &str = "Bvh";

/// Camera program variables.
pub mod camera {
    pub const XFORM: &str = "xform";
    pub const FOCAL_PLANE_ORIGIN: &str = "focalPlaneOrigin";
    pub const FOCAL_PLANE_RIGHT: &str = "focalPlaneRight";
    pub const FOCAL_PLANE_UP: &str = "focalPlaneUp";
    pub const LENS_RADIUS: &str = "lensRadius";
}

/// Miss program variables.
pub mod miss {
    pub const BACKGROUND_COLOR: &str = "backgroundColor";
}

/// Mesh geometry variables.
pub mod mesh {
    pub const VERTEX_BUFFER: &str = "vertexBuffer";
    pub const NORMAL_BUFFER: &str = "normalBuffer";
    pub const FACE_INDICES: &str = "faceIndices";
}

/// Context variables.
pub mod context {
    pub const SCENE_ROOT: &str = "sceneRoot";
    pub const RAW_BUFFER: &str = "rawBuffer";
    pub const IMAGE_BUFFER: &str = "imageBuffer";
}
