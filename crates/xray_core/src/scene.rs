//! Scene description lookup.
//!
//! Components are built from a node of a scene description: a set of keys
//! with typed values. The format behind a node is up to the caller
//! (`xray_cli` reads JSON); factories like [`crate::Camera::make`] only see
//! this trait.

use thiserror::Error;
use xray_math::Vec3;

use crate::geometry::Instance;

/// Errors from a scene description lookup.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    #[error("missing field '{0}'")]
    MissingField(String),

    #[error("field '{key}' is not a {expected}")]
    WrongType { key: String, expected: &'static str },

    #[error("unknown object '{0}'")]
    UnknownObject(String),
}

/// A node of a scene description.
pub trait SceneNode {
    /// True if the node has a value for `key`.
    fn contains(&self, key: &str) -> bool;

    fn get_float(&self, key: &str) -> Result<f32, SceneError>;

    fn get_int(&self, key: &str) -> Result<i64, SceneError>;

    fn get_float3(&self, key: &str) -> Result<Vec3, SceneError>;

    fn get_string(&self, key: &str) -> Result<String, SceneError>;

    /// Resolve a list of object references into placed instances.
    fn get_instance_list(&self, key: &str) -> Result<Vec<Instance>, SceneError>;

    /// `get_float`, or `default` if the key is absent.
    fn get_float_or(&self, key: &str, default: f32) -> Result<f32, SceneError> {
        if self.contains(key) {
            self.get_float(key)
        } else {
            Ok(default)
        }
    }

    /// `get_float3`, or `default` if the key is absent.
    fn get_float3_or(&self, key: &str, default: Vec3) -> Result<Vec3, SceneError> {
        if self.contains(key) {
            self.get_float3(key)
        } else {
            Ok(default)
        }
    }

    /// `get_int` checked to fit a `u32`.
    fn get_u32(&self, key: &str) -> Result<u32, SceneError> {
        u32::try_from(self.get_int(key)?).map_err(|_| SceneError::WrongType {
            key: key.to_string(),
            expected: "non-negative 32-bit integer",
        })
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{MapNode, Value};
    use super::*;

    #[test]
    fn test_defaults_only_apply_to_absent_keys() {
        let node = MapNode::default().with("fov", Value::Float(1.0));

        assert_eq!(node.get_float_or("fov", 2.0), Ok(1.0));
        assert_eq!(node.get_float_or("fStop", 2.0), Ok(2.0));
        assert_eq!(node.get_float3_or("translate", Vec3::ONE), Ok(Vec3::ONE));
    }

    #[test]
    fn test_missing_and_wrong_type() {
        let node = MapNode::default()
            .with("width", Value::Int(-4))
            .with("file", Value::Float(1.0));

        assert_eq!(
            node.get_float("height"),
            Err(SceneError::MissingField("height".into()))
        );
        assert!(matches!(
            node.get_string("file"),
            Err(SceneError::WrongType { .. })
        ));
        assert!(matches!(
            node.get_u32("width"),
            Err(SceneError::WrongType { .. })
        ));
    }
}
