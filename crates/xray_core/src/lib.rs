//! xray core - scene composition for a ray tracing backend.
//!
//! This crate provides:
//!
//! - **Context**: exclusive owner of a [`Backend`] (buffers, programs,
//!   geometry, acceleration structures, launch)
//! - **Geometry**: [`MeshGeometry`] imported from model files and placed
//!   with [`Instance`]
//! - **Camera**: thin-lens [`Camera`] that assembles the scene and renders it
//! - **Import**: [`ModelImporter`] with a Wavefront OBJ implementation
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use xray_core::{Camera, CameraSettings, Context, Instance, MeshGeometry, ObjImporter};
//! use xray_math::{Mat4, Vec3};
//!
//! let mut ctx = Context::with_backend(xray_renderer::CpuBackend::new())?;
//! let mesh = MeshGeometry::new(&mut ctx, &ObjImporter::new(), "bunny.obj", Vec3::ZERO)?;
//! let bunny = Instance::new(&mut ctx, Arc::new(mesh), Mat4::IDENTITY)?;
//!
//! let mut camera = Camera::new(&mut ctx, Mat4::IDENTITY, vec![bunny], CameraSettings::default())?;
//! camera.render(&mut ctx)?;
//! let rgba = camera.read_image(&ctx)?;
//! ```

pub mod backend;
pub mod camera;
pub mod context;
pub mod geometry;
pub mod import;
pub mod kernels;
pub mod mesh;
pub mod scene;

// Re-export commonly used types
pub use backend::{Backend, BackendError, BackendResult, BufferDesc, BufferFormat, Variable};
pub use camera::{lens_radius, Camera, CameraError, CameraSettings, FocalPlane};
pub use context::{Context, ContextConfig};
pub use geometry::{GeometryKernels, GeometrySource, Instance};
pub use import::{ImportError, ImportFlags, ImportedMesh, ImportedScene, ModelImporter, ObjImporter};
pub use mesh::{GeometryError, MeshData, MeshGeometry, ValidationError, SENTINEL_FACE};
pub use scene::{SceneError, SceneNode};
