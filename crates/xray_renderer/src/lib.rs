//! xray CPU backend.
//!
//! A reference implementation of [`xray_core::Backend`] that runs on the
//! host: built-in camera, miss and triangle-mesh kernels, a median-split
//! BVH per acceleration structure and a launch traced in parallel with
//! rayon.

mod backend;
mod bvh;
mod hittable;
mod kernels;
mod triangle;

pub use backend::CpuBackend;
pub use bvh::BvhNode;
pub use hittable::{HitRecord, Hittable};
pub use kernels::{color_to_rgba, linear_to_gamma};
pub use triangle::Triangle;
