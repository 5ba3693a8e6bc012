//! JSON scene description.
//!
//! ```json
//! {
//!   "objects": {
//!     "bunny": { "file": "bunny.obj", "origin": [0, 0, 0], "translate": [0, 0, -5] }
//!   },
//!   "camera": {
//!     "width": 640, "height": 480, "fov": 1.2, "focalLength": 5, "fStop": 16,
//!     "objects": ["bunny"]
//!   }
//! }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use xray_core::{Instance, SceneError, SceneNode};
use xray_math::Vec3;

/// Top level of a scene file.
#[derive(Debug, Deserialize)]
pub struct SceneFile {
    #[serde(default)]
    pub objects: BTreeMap<String, Value>,
    pub camera: Value,
}

impl SceneFile {
    /// Make every relative `file` of an object relative to `base`.
    pub fn resolve_files(&mut self, base: &Path) {
        for object in self.objects.values_mut() {
            if let Some(Value::String(file)) = object.get_mut("file") {
                let path = Path::new(file.as_str());
                if path.is_relative() {
                    *file = base.join(path).to_string_lossy().into_owned();
                }
            }
        }
    }
}

/// A JSON object seen as a [`SceneNode`]. Object references in instance
/// lists are looked up by name in `instances`.
pub struct JsonNode<'a> {
    value: &'a Value,
    instances: &'a HashMap<String, Instance>,
}

impl<'a> JsonNode<'a> {
    pub fn new(value: &'a Value, instances: &'a HashMap<String, Instance>) -> Self {
        Self { value, instances }
    }

    fn field(&self, key: &str) -> Result<&'a Value, SceneError> {
        self.value
            .get(key)
            .ok_or_else(|| SceneError::MissingField(key.to_string()))
    }
}

fn wrong_type(key: &str, expected: &'static str) -> SceneError {
    SceneError::WrongType {
        key: key.to_string(),
        expected,
    }
}

impl SceneNode for JsonNode<'_> {
    fn contains(&self, key: &str) -> bool {
        self.value.get(key).is_some()
    }

    fn get_float(&self, key: &str) -> Result<f32, SceneError> {
        self.field(key)?
            .as_f64()
            .map(|v| v as f32)
            .ok_or_else(|| wrong_type(key, "number"))
    }

    fn get_int(&self, key: &str) -> Result<i64, SceneError> {
        self.field(key)?
            .as_i64()
            .ok_or_else(|| wrong_type(key, "integer"))
    }

    fn get_float3(&self, key: &str) -> Result<Vec3, SceneError> {
        let components: Option<Vec<f32>> = self
            .field(key)?
            .as_array()
            .filter(|a| a.len() == 3)
            .and_then(|a| a.iter().map(|v| v.as_f64().map(|v| v as f32)).collect());
        components
            .map(|c| Vec3::new(c[0], c[1], c[2]))
            .ok_or_else(|| wrong_type(key, "array of 3 numbers"))
    }

    fn get_string(&self, key: &str) -> Result<String, SceneError> {
        self.field(key)?
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| wrong_type(key, "string"))
    }

    fn get_instance_list(&self, key: &str) -> Result<Vec<Instance>, SceneError> {
        let names = self
            .field(key)?
            .as_array()
            .ok_or_else(|| wrong_type(key, "array of object names"))?;

        names
            .iter()
            .map(|name| {
                let name = name
                    .as_str()
                    .ok_or_else(|| wrong_type(key, "array of object names"))?;
                self.instances
                    .get(name)
                    .cloned()
                    .ok_or_else(|| SceneError::UnknownObject(name.to_string()))
            })
            .collect()
    }
}
