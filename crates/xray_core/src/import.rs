//! External model import.
//!
//! A [`ModelImporter`] turns a model file into an [`ImportedScene`]: a list
//! of meshes with positions, optional normals and polygon faces. Post
//! processing is selected with [`ImportFlags`]. [`ObjImporter`] is the
//! Wavefront OBJ implementation, built on `tobj`.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use thiserror::Error;
use xray_math::Vec3;

/// Errors that can occur while importing a model file.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("failed to open '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },

    #[error("no meshes in '{0}'")]
    NoMeshes(PathBuf),

    #[error("invalid data in '{path}': {reason}")]
    InvalidData { path: PathBuf, reason: String },
}

/// Post-processing applied by the importer.
///
/// The defaults turn everything on, which is what the geometry pipeline
/// expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportFlags {
    /// Split polygons into triangles.
    pub triangulate: bool,
    /// Share one vertex between identical position/normal pairs.
    pub join_identical_vertices: bool,
    /// Keep only polygonal primitives (drop points and lines).
    pub sort_by_primitive_type: bool,
    /// Compute smooth vertex normals when the file has none.
    pub generate_normals: bool,
    /// Flatten any node hierarchy into the vertex data.
    pub pre_transform_vertices: bool,
    /// Reject out-of-range indices and non-finite positions.
    pub validate_data_structure: bool,
}

impl Default for ImportFlags {
    fn default() -> Self {
        Self {
            triangulate: true,
            join_identical_vertices: true,
            sort_by_primitive_type: true,
            generate_normals: true,
            pre_transform_vertices: true,
            validate_data_structure: true,
        }
    }
}

/// One mesh of an imported scene.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportedMesh {
    pub name: String,
    /// One position per vertex. Empty if the file has none.
    pub positions: Vec<Vec3>,
    /// One normal per vertex, `None` if the file has none and none were generated.
    pub normals: Option<Vec<Vec3>>,
    /// Vertex indices per face. Faces keep their arity; non-triangles only
    /// show up when triangulation is off.
    pub faces: Vec<Vec<u32>>,
}

impl ImportedMesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn has_positions(&self) -> bool {
        !self.positions.is_empty()
    }

    /// True if there is exactly one normal per vertex.
    pub fn has_normals(&self) -> bool {
        matches!(&self.normals, Some(n) if !n.is_empty() && n.len() == self.positions.len())
    }
}

/// Result of an import.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportedScene {
    pub meshes: Vec<ImportedMesh>,
}

/// Anything that can read a model file.
pub trait ModelImporter {
    fn import(&self, path: &Path, flags: &ImportFlags) -> Result<ImportedScene, ImportError>;
}

/// Wavefront OBJ importer.
///
/// Materials are ignored. OBJ has no node hierarchy, so
/// `pre_transform_vertices` has nothing to flatten.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjImporter;

impl ObjImporter {
    pub fn new() -> Self {
        Self
    }

    /// Import OBJ text from any reader. `source` names it in errors.
    pub fn import_reader<R: BufRead>(
        &self,
        reader: &mut R,
        source: &Path,
        flags: &ImportFlags,
    ) -> Result<ImportedScene, ImportError> {
        let options = load_options(flags);
        let (models, _materials) =
            tobj::load_obj_buf(reader, &options, |_| Err(tobj::LoadError::OpenFileFailed))
                .map_err(|source_err| ImportError::Parse {
                    path: source.to_path_buf(),
                    source: source_err,
                })?;

        let meshes = models
            .into_iter()
            .map(|model| convert_model(model, flags))
            .collect::<Result<Vec<_>, String>>()
            .map_err(|reason| ImportError::InvalidData {
                path: source.to_path_buf(),
                reason,
            })?;

        log::debug!("Parsed {} mesh(es) from {}", meshes.len(), source.display());
        Ok(ImportedScene { meshes })
    }
}

impl ModelImporter for ObjImporter {
    fn import(&self, path: &Path, flags: &ImportFlags) -> Result<ImportedScene, ImportError> {
        let file = File::open(path).map_err(|source| ImportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut reader = BufReader::new(file);
        self.import_reader(&mut reader, path, flags)
    }
}

fn load_options(flags: &ImportFlags) -> tobj::LoadOptions {
    tobj::LoadOptions {
        single_index: flags.join_identical_vertices,
        triangulate: flags.triangulate,
        ignore_points: flags.sort_by_primitive_type,
        ignore_lines: flags.sort_by_primitive_type,
        ..Default::default()
    }
}

/// Convert a tobj model into an [`ImportedMesh`], applying the flags that
/// tobj does not handle itself.
fn convert_model(model: tobj::Model, flags: &ImportFlags) -> Result<ImportedMesh, String> {
    let mesh = model.mesh;
    let arities = face_arities(&mesh)?;

    let mut imported = if flags.join_identical_vertices {
        shared_vertices(&mesh, &arities)?
    } else {
        split_vertices(&mesh, &arities)?
    };
    imported.name = model.name;

    if flags.validate_data_structure {
        validate(&imported)?;
    }

    if imported.normals.is_none() && flags.generate_normals && imported.has_positions() {
        log::debug!("Generating normals for mesh '{}'", imported.name);
        imported.normals = Some(smooth_normals(&imported.positions, &imported.faces));
    }

    Ok(imported)
}

/// Number of indices per face. tobj leaves `face_arities` empty when every
/// face is a triangle.
fn face_arities(mesh: &tobj::Mesh) -> Result<Vec<usize>, String> {
    if mesh.face_arities.is_empty() {
        if mesh.indices.len() % 3 != 0 {
            return Err(format!(
                "{} indices do not form whole triangles",
                mesh.indices.len()
            ));
        }
        return Ok(vec![3; mesh.indices.len() / 3]);
    }

    let arities: Vec<usize> = mesh.face_arities.iter().map(|&a| a as usize).collect();
    let total: usize = arities.iter().sum();
    if total != mesh.indices.len() {
        return Err(format!(
            "face arities cover {} indices, mesh has {}",
            total,
            mesh.indices.len()
        ));
    }
    Ok(arities)
}

fn split_faces(indices: &[u32], arities: &[usize]) -> Vec<Vec<u32>> {
    let mut faces = Vec::with_capacity(arities.len());
    let mut start = 0;
    for &arity in arities {
        faces.push(indices[start..start + arity].to_vec());
        start += arity;
    }
    faces
}

fn to_vec3s(flat: &[f32]) -> Vec<Vec3> {
    flat.chunks_exact(3).map(Vec3::from_slice).collect()
}

/// Single index stream: tobj has already merged identical
/// position/normal pairs into one vertex.
fn shared_vertices(mesh: &tobj::Mesh, arities: &[usize]) -> Result<ImportedMesh, String> {
    let positions = to_vec3s(&mesh.positions);
    let normals = if mesh.normals.is_empty() {
        None
    } else {
        Some(to_vec3s(&mesh.normals))
    };

    Ok(ImportedMesh {
        name: String::new(),
        positions,
        normals,
        faces: split_faces(&mesh.indices, arities),
    })
}

/// Separate position and normal index streams: every face corner becomes
/// its own vertex.
fn split_vertices(mesh: &tobj::Mesh, arities: &[usize]) -> Result<ImportedMesh, String> {
    let source_positions = to_vec3s(&mesh.positions);
    let source_normals = to_vec3s(&mesh.normals);
    let has_normals = !source_normals.is_empty();

    let mut positions = Vec::with_capacity(mesh.indices.len());
    let mut normals = Vec::with_capacity(if has_normals { mesh.indices.len() } else { 0 });

    for (corner, &index) in mesh.indices.iter().enumerate() {
        let position = source_positions
            .get(index as usize)
            .ok_or_else(|| format!("position index {} out of range", index))?;
        positions.push(*position);

        if has_normals {
            let normal_index = mesh.normal_indices.get(corner).copied().unwrap_or(index);
            let normal = source_normals
                .get(normal_index as usize)
                .ok_or_else(|| format!("normal index {} out of range", normal_index))?;
            normals.push(*normal);
        }
    }

    let corners: Vec<u32> = (0..mesh.indices.len() as u32).collect();
    Ok(ImportedMesh {
        name: String::new(),
        positions,
        normals: has_normals.then_some(normals),
        faces: split_faces(&corners, arities),
    })
}

fn validate(mesh: &ImportedMesh) -> Result<(), String> {
    if let Some(p) = mesh.positions.iter().find(|p| !p.is_finite()) {
        return Err(format!("non-finite vertex position {:?}", p));
    }

    let vertex_count = mesh.vertex_count();
    for (i, face) in mesh.faces.iter().enumerate() {
        if let Some(&bad) = face.iter().find(|&&idx| idx as usize >= vertex_count) {
            return Err(format!(
                "face {} references vertex {}, mesh has {}",
                i, bad, vertex_count
            ));
        }
    }

    if let Some(normals) = &mesh.normals {
        if normals.len() != vertex_count {
            return Err(format!(
                "{} normals for {} vertices",
                normals.len(),
                vertex_count
            ));
        }
    }
    Ok(())
}

/// Smooth vertex normals: each vertex gets the normalized sum of the
/// (area weighted) normals of the faces that use it. Polygons are fanned
/// from their first vertex. Counter-clockwise winding, as in OBJ.
pub fn smooth_normals(positions: &[Vec3], faces: &[Vec<u32>]) -> Vec<Vec3> {
    let vertex_count = positions.len();
    let mut normals = vec![Vec3::ZERO; vertex_count];

    for face in faces {
        if face.len() < 3 || face.iter().any(|&i| i as usize >= vertex_count) {
            continue;
        }

        let p0 = positions[face[0] as usize];
        let mut face_normal = Vec3::ZERO;
        for pair in face[1..].windows(2) {
            let p1 = positions[pair[0] as usize];
            let p2 = positions[pair[1] as usize];
            face_normal += (p1 - p0).cross(p2 - p0);
        }

        for &i in face {
            normals[i as usize] += face_normal;
        }
    }

    for normal in &mut normals {
        let len = normal.length();
        if len > 0.0 {
            *normal /= len;
        } else {
            *normal = Vec3::Y; // Default up normal for unreferenced or degenerate vertices
        }
    }

    normals
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::io::Write;

    const QUAD_AND_TRIANGLE: &str = "\
o mixed
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
v 2 0 0
f 1 2 3 4
f 2 5 3
";

    const TRIANGLE_WITH_NORMALS: &str = "\
o tri
v 0 0 0
v 1 0 0
v 0 1 0
vn 0 0 2
f 1//1 2//1 3//1
";

    fn import_str(text: &str, flags: &ImportFlags) -> Result<ImportedScene, ImportError> {
        ObjImporter::new().import_reader(&mut Cursor::new(text), Path::new("test.obj"), flags)
    }

    #[test]
    fn test_default_flags_triangulate_and_generate_normals() {
        let scene = import_str(QUAD_AND_TRIANGLE, &ImportFlags::default()).unwrap();
        assert_eq!(scene.meshes.len(), 1);

        let mesh = &scene.meshes[0];
        assert_eq!(mesh.vertex_count(), 5);
        assert_eq!(mesh.face_count(), 3); // quad split in two
        assert!(mesh.faces.iter().all(|f| f.len() == 3));
        assert!(mesh.has_normals());

        // Flat mesh in the XY plane wound counter-clockwise: normals face +Z.
        for n in mesh.normals.as_ref().unwrap() {
            assert!((*n - Vec3::Z).length() < 1e-5);
        }
    }

    #[test]
    fn test_no_triangulation_keeps_polygon_arity() {
        let flags = ImportFlags {
            triangulate: false,
            ..Default::default()
        };
        let scene = import_str(QUAD_AND_TRIANGLE, &flags).unwrap();
        let mesh = &scene.meshes[0];

        assert_eq!(mesh.face_count(), 2);
        assert_eq!(mesh.faces[0], vec![0, 1, 2, 3]);
        assert_eq!(mesh.faces[1], vec![1, 4, 2]);
    }

    #[test]
    fn test_missing_normals_without_generation() {
        let flags = ImportFlags {
            generate_normals: false,
            ..Default::default()
        };
        let scene = import_str(QUAD_AND_TRIANGLE, &flags).unwrap();
        assert!(scene.meshes[0].normals.is_none());
        assert!(!scene.meshes[0].has_normals());
    }

    #[test]
    fn test_file_normals_are_kept() {
        let scene = import_str(TRIANGLE_WITH_NORMALS, &ImportFlags::default()).unwrap();
        let mesh = &scene.meshes[0];

        assert_eq!(mesh.vertex_count(), 3);
        let normals = mesh.normals.as_ref().unwrap();
        // Stored as read; normalization happens in the geometry pipeline.
        assert!(normals.iter().all(|n| *n == Vec3::new(0.0, 0.0, 2.0)));
    }

    #[test]
    fn test_split_vertices_gives_one_vertex_per_corner() {
        let flags = ImportFlags {
            join_identical_vertices: false,
            ..Default::default()
        };
        let scene = import_str(QUAD_AND_TRIANGLE, &flags).unwrap();
        let mesh = &scene.meshes[0];

        // Three triangles, nothing shared.
        assert_eq!(mesh.vertex_count(), 9);
        assert_eq!(mesh.faces[2], vec![6, 7, 8]);
        assert!(mesh.has_normals());
    }

    #[test]
    fn test_out_of_range_index_is_invalid_data() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 9\n";
        let result = import_str(text, &ImportFlags::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = ObjImporter::new()
            .import(Path::new("/definitely/not/here.obj"), &ImportFlags::default())
            .unwrap_err();
        assert!(matches!(err, ImportError::Io { .. }));
    }

    #[test]
    fn test_import_from_file() {
        let mut file = tempfile::Builder::new().suffix(".obj").tempfile().unwrap();
        file.write_all(TRIANGLE_WITH_NORMALS.as_bytes()).unwrap();

        let scene = ObjImporter::new()
            .import(file.path(), &ImportFlags::default())
            .unwrap();
        assert_eq!(scene.meshes[0].name, "tri");
        assert_eq!(scene.meshes[0].face_count(), 1);
    }

    #[test]
    fn test_smooth_normals_degenerate_vertex_defaults_up() {
        let positions = vec![Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::new(5.0, 5.0, 5.0)];
        let faces = vec![vec![0, 1, 2]];
        let normals = smooth_normals(&positions, &faces);

        assert!((normals[0] - Vec3::Z).length() < 1e-6);
        assert_eq!(normals[3], Vec3::Y);
    }
}
