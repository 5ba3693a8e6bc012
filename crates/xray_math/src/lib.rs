//! Math types shared by the xray crates.
//!
//! Re-exports glam and adds the small set of ray tracing helpers the
//! render and import pipelines need.

// Re-export glam for convenience
pub use glam::*;

mod aabb;
mod interval;
mod ray;
mod transform;

pub use aabb::Aabb;
pub use interval::Interval;
pub use ray::Ray;
pub use transform::{rotation_then_translation, Mat4Ext};
