//! CPU reference implementation of the ray tracing backend.
//!
//! Resources live in plain tables indexed by handle. Programs resolve to
//! the built-in kernels in [`crate::kernels`]. `compile` builds one BVH per
//! dirty acceleration over the world-space triangles of its group, and
//! `launch` traces one primary ray per pixel with rows spread over the
//! rayon thread pool.

use std::collections::HashMap;
use std::fmt::Display;
use std::sync::Arc;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use xray_core::backend::{
    AccelerationId, Backend, BackendError, BackendResult, BufferDesc, BufferFormat, BufferId,
    BufferKind, GeometryId, GeometryInstanceId, GroupId, ProgramId, Variable,
};
use xray_core::kernels as names;
use xray_core::SENTINEL_FACE;
use xray_math::{Interval, Mat4, Mat4Ext, Vec3};

use crate::bvh::BvhNode;
use crate::hittable::{HitRecord, Hittable};
use crate::kernels::{color_to_rgba, eye_light, Kernel, ThinLens};
use crate::triangle::Triangle;

const DEFAULT_SEED: u64 = 0x5eed_1e55;

/// Acceleration builders and traversers accepted by name. All of them
/// produce the same median-split BVH here.
const BUILDERS: &[&str] = &["Trbvh", "Sbvh", "Bvh", "NoAccel"];
const TRAVERSERS: &[&str] = &["Bvh", "Sbvh", "NoAccel"];

/// Ray offset that keeps hits from starting on the lens.
const T_MIN: f32 = 1e-4;

type Variables = HashMap<String, Variable>;

struct Buffer {
    desc: BufferDesc,
    data: Vec<u8>,
}

struct Program {
    kernel: Kernel,
    variables: Variables,
}

struct Geometry {
    intersect: ProgramId,
    bounds: ProgramId,
    primitive_count: u32,
    variables: Variables,
}

struct GeometryInstance {
    geometry: GeometryId,
    placement: Mat4,
}

struct Group {
    children: Vec<GeometryInstanceId>,
    acceleration: Option<AccelerationId>,
}

struct Acceleration {
    dirty: bool,
    bvh: Arc<BvhNode<Triangle>>,
}

/// Multi-threaded CPU backend.
pub struct CpuBackend {
    seed: u64,
    ray_type_count: u32,
    entry_point_count: u32,
    buffers: Vec<Buffer>,
    programs: Vec<Program>,
    geometries: Vec<Geometry>,
    instances: Vec<GeometryInstance>,
    groups: Vec<Option<Group>>,
    accelerations: Vec<Option<Acceleration>>,
    variables: Variables,
    ray_generation: HashMap<u32, ProgramId>,
    miss: HashMap<u32, ProgramId>,
    compiled: bool,
    destroyed: bool,
}

impl Default for CpuBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CpuBackend {
    pub fn new() -> Self {
        Self {
            seed: DEFAULT_SEED,
            ray_type_count: 1,
            entry_point_count: 1,
            buffers: Vec::new(),
            programs: Vec::new(),
            geometries: Vec::new(),
            instances: Vec::new(),
            groups: Vec::new(),
            accelerations: Vec::new(),
            variables: HashMap::new(),
            ray_generation: HashMap::new(),
            miss: HashMap::new(),
            compiled: false,
            destroyed: false,
        }
    }

    /// Seed for lens sampling. Each pixel derives its own generator from
    /// it, so a launch is deterministic regardless of thread scheduling.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    fn live(&self) -> BackendResult<()> {
        if self.destroyed {
            Err(BackendError::Destroyed)
        } else {
            Ok(())
        }
    }

    /// Every change invalidates the last compile.
    fn mutate(&mut self) -> BackendResult<()> {
        self.live()?;
        self.compiled = false;
        Ok(())
    }

    fn buffer(&self, id: BufferId) -> BackendResult<&Buffer> {
        self.buffers.get(id.index()).ok_or_else(|| invalid(id))
    }

    fn program(&self, id: ProgramId) -> BackendResult<&Program> {
        self.programs.get(id.index()).ok_or_else(|| invalid(id))
    }

    fn geometry(&self, id: GeometryId) -> BackendResult<&Geometry> {
        self.geometries.get(id.index()).ok_or_else(|| invalid(id))
    }

    fn instance(&self, id: GeometryInstanceId) -> BackendResult<&GeometryInstance> {
        self.instances.get(id.index()).ok_or_else(|| invalid(id))
    }

    fn group(&self, id: GroupId) -> BackendResult<&Group> {
        self.groups
            .get(id.index())
            .and_then(Option::as_ref)
            .ok_or_else(|| invalid(id))
    }

    fn group_mut(&mut self, id: GroupId) -> BackendResult<&mut Group> {
        self.groups
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or_else(|| invalid(id))
    }

    fn acceleration(&self, id: AccelerationId) -> BackendResult<&Acceleration> {
        self.accelerations
            .get(id.index())
            .and_then(Option::as_ref)
            .ok_or_else(|| invalid(id))
    }

    fn acceleration_mut(&mut self, id: AccelerationId) -> BackendResult<&mut Acceleration> {
        self.accelerations
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or_else(|| invalid(id))
    }

    fn check_kernel(&self, id: ProgramId, expected: Kernel, role: &str) -> BackendResult<&Program> {
        let program = self.program(id)?;
        if program.kernel != expected {
            return Err(BackendError::Validation(format!(
                "{} program {} runs {:?}, expected {:?}",
                role, id, program.kernel, expected
            )));
        }
        for &(name, type_name) in program.kernel.reads() {
            match program.variables.get(name) {
                None => return Err(unbound(role, name)),
                Some(v) if v.type_name() != type_name => {
                    return Err(mistyped(role, name, v, type_name))
                }
                Some(_) => {}
            }
        }
        Ok(program)
    }

    fn check_buffer(
        &self,
        scope: &str,
        name: &str,
        id: BufferId,
        kind: BufferKind,
        format: BufferFormat,
    ) -> BackendResult<BufferDesc> {
        let desc = self.buffer(id)?.desc;
        if desc.kind != kind || desc.format != format {
            return Err(BackendError::Validation(format!(
                "{}: '{}' must be a {:?} {:?} buffer, {} is {:?} {:?}",
                scope, name, kind, format, id, desc.kind, desc.format
            )));
        }
        Ok(desc)
    }

    fn check_geometry(&self, id: GeometryId) -> BackendResult<()> {
        let geometry = self.geometry(id)?;
        let scope = format!("geometry {}", id);
        self.check_kernel(geometry.intersect, Kernel::MeshIntersect, "intersection")?;
        self.check_kernel(geometry.bounds, Kernel::MeshBounds, "bounds")?;

        let vars = &geometry.variables;
        let (input, f3) = (BufferKind::Input, BufferFormat::Float3);
        let vertices = get_buffer(&scope, vars, names::mesh::VERTEX_BUFFER)?;
        let normals = get_buffer(&scope, vars, names::mesh::NORMAL_BUFFER)?;
        let faces = get_buffer(&scope, vars, names::mesh::FACE_INDICES)?;

        let vertices = self.check_buffer(&scope, names::mesh::VERTEX_BUFFER, vertices, input, f3)?;
        let normals = self.check_buffer(&scope, names::mesh::NORMAL_BUFFER, normals, input, f3)?;
        let faces = self.check_buffer(
            &scope,
            names::mesh::FACE_INDICES,
            faces,
            input,
            BufferFormat::Int3,
        )?;

        if vertices.len() != normals.len() {
            return Err(BackendError::Validation(format!(
                "{}: {} vertices but {} normals",
                scope,
                vertices.len(),
                normals.len()
            )));
        }
        if faces.len() != geometry.primitive_count as usize {
            return Err(BackendError::Validation(format!(
                "{}: {} faces for {} primitives",
                scope,
                faces.len(),
                geometry.primitive_count
            )));
        }
        Ok(())
    }

    /// Scene root group, checked to carry a live acceleration.
    fn scene_root(&self) -> BackendResult<(GroupId, AccelerationId)> {
        let root = get_group("context", &self.variables, names::context::SCENE_ROOT)?;
        let acceleration = self.group(root)?.acceleration.ok_or_else(|| {
            BackendError::Validation(format!("scene root {} has no acceleration", root))
        })?;
        self.acceleration(acceleration)?;
        Ok((root, acceleration))
    }

    /// Raw and display buffers bound on the context.
    fn output_buffers(&self) -> BackendResult<(BufferId, BufferId)> {
        let output = BufferKind::Output;
        let raw = get_buffer("context", &self.variables, names::context::RAW_BUFFER)?;
        let image = get_buffer("context", &self.variables, names::context::IMAGE_BUFFER)?;
        let raw_desc = self.check_buffer(
            "context",
            names::context::RAW_BUFFER,
            raw,
            output,
            BufferFormat::Float3,
        )?;
        let image_desc = self.check_buffer(
            "context",
            names::context::IMAGE_BUFFER,
            image,
            output,
            BufferFormat::UnsignedByte4,
        )?;
        if (raw_desc.width, raw_desc.height) != (image_desc.width, image_desc.height) {
            return Err(BackendError::Validation(format!(
                "raw buffer is {}x{}, image buffer is {}x{}",
                raw_desc.width, raw_desc.height, image_desc.width, image_desc.height
            )));
        }
        Ok((raw, image))
    }

    /// Triangles of every child instance, moved to world space. Sentinel
    /// and out-of-range faces are skipped.
    fn world_triangles(&self, children: &[GeometryInstanceId]) -> BackendResult<Vec<Triangle>> {
        let mut triangles = Vec::new();
        for &child in children {
            let instance = self.instance(child)?;
            let geometry = self.geometry(instance.geometry)?;
            let scope = format!("geometry {}", instance.geometry);
            let vars = &geometry.variables;

            let positions = read_float3(
                &self.buffer(get_buffer(&scope, vars, names::mesh::VERTEX_BUFFER)?)?.data,
            );
            let normals = read_float3(
                &self.buffer(get_buffer(&scope, vars, names::mesh::NORMAL_BUFFER)?)?.data,
            );
            let faces = read_int3(
                &self.buffer(get_buffer(&scope, vars, names::mesh::FACE_INDICES)?)?.data,
            );

            let placement = instance.placement;
            let corner = |i: i32| {
                let i = usize::try_from(i).ok()?;
                let p = *positions.get(i)?;
                let n = normals.get(i).copied().unwrap_or(Vec3::ZERO);
                Some((placement.transform_point3(p), placement.transform_normal3(n)))
            };

            for face in faces.iter().filter(|f| **f != SENTINEL_FACE) {
                if let (Some(a), Some(b), Some(c)) =
                    (corner(face[0]), corner(face[1]), corner(face[2]))
                {
                    triangles.push(Triangle::with_normals(a.0, b.0, c.0, [a.1, b.1, c.1]));
                }
            }
        }
        Ok(triangles)
    }

    fn thin_lens(&self, program: ProgramId) -> BackendResult<ThinLens> {
        let vars = &self.program(program)?.variables;
        let scope = "ray generation";
        Ok(ThinLens {
            xform: get_matrix(scope, vars, names::camera::XFORM)?,
            plane_origin: get_float3(scope, vars, names::camera::FOCAL_PLANE_ORIGIN)?,
            plane_right: get_float(scope, vars, names::camera::FOCAL_PLANE_RIGHT)?,
            plane_up: get_float(scope, vars, names::camera::FOCAL_PLANE_UP)?,
            lens_radius: get_float(scope, vars, names::camera::LENS_RADIUS)?,
        })
    }
}

impl Backend for CpuBackend {
    fn name(&self) -> &str {
        "cpu"
    }

    fn set_ray_type_count(&mut self, count: u32) -> BackendResult<()> {
        self.mutate()?;
        if count == 0 {
            return Err(BackendError::Validation("ray type count must be positive".into()));
        }
        self.ray_type_count = count;
        Ok(())
    }

    fn set_entry_point_count(&mut self, count: u32) -> BackendResult<()> {
        self.mutate()?;
        if count == 0 {
            return Err(BackendError::Validation("entry point count must be positive".into()));
        }
        self.entry_point_count = count;
        Ok(())
    }

    fn create_buffer(&mut self, desc: BufferDesc) -> BackendResult<BufferId> {
        self.mutate()?;
        self.buffers.push(Buffer {
            desc,
            data: vec![0; desc.byte_len()],
        });
        Ok(BufferId(self.buffers.len() as u32 - 1))
    }

    fn write_buffer(&mut self, buffer: BufferId, bytes: &[u8]) -> BackendResult<()> {
        self.mutate()?;
        let target = self
            .buffers
            .get_mut(buffer.index())
            .ok_or_else(|| invalid(buffer))?;
        if bytes.len() != target.desc.byte_len() {
            return Err(BackendError::BufferSize {
                buffer,
                expected: target.desc.byte_len(),
                actual: bytes.len(),
            });
        }
        target.data.copy_from_slice(bytes);
        Ok(())
    }

    fn read_buffer(&self, buffer: BufferId) -> BackendResult<Vec<u8>> {
        self.live()?;
        Ok(self.buffer(buffer)?.data.clone())
    }

    fn buffer_desc(&self, buffer: BufferId) -> BackendResult<BufferDesc> {
        self.live()?;
        Ok(self.buffer(buffer)?.desc)
    }

    fn create_program(&mut self, module: &str, entry: &str) -> BackendResult<ProgramId> {
        self.mutate()?;
        let kernel = Kernel::resolve(module, entry)?;
        self.programs.push(Program {
            kernel,
            variables: HashMap::new(),
        });
        log::debug!("Loaded program {}/{} as {:?}", module, entry, kernel);
        Ok(ProgramId(self.programs.len() as u32 - 1))
    }

    fn set_program_variable(
        &mut self,
        program: ProgramId,
        name: &str,
        value: Variable,
    ) -> BackendResult<()> {
        self.mutate()?;
        self.programs
            .get_mut(program.index())
            .ok_or_else(|| invalid(program))?
            .variables
            .insert(name.to_string(), value);
        Ok(())
    }

    fn create_geometry(
        &mut self,
        intersect: ProgramId,
        bounds: ProgramId,
        primitive_count: u32,
    ) -> BackendResult<GeometryId> {
        self.mutate()?;
        self.program(intersect)?;
        self.program(bounds)?;
        self.geometries.push(Geometry {
            intersect,
            bounds,
            primitive_count,
            variables: HashMap::new(),
        });
        Ok(GeometryId(self.geometries.len() as u32 - 1))
    }

    fn set_geometry_variable(
        &mut self,
        geometry: GeometryId,
        name: &str,
        value: Variable,
    ) -> BackendResult<()> {
        self.mutate()?;
        self.geometries
            .get_mut(geometry.index())
            .ok_or_else(|| invalid(geometry))?
            .variables
            .insert(name.to_string(), value);
        Ok(())
    }

    fn create_geometry_instance(
        &mut self,
        geometry: GeometryId,
        placement: Mat4,
    ) -> BackendResult<GeometryInstanceId> {
        self.mutate()?;
        self.geometry(geometry)?;
        self.instances.push(GeometryInstance {
            geometry,
            placement,
        });
        Ok(GeometryInstanceId(self.instances.len() as u32 - 1))
    }

    fn create_geometry_group(
        &mut self,
        children: &[GeometryInstanceId],
    ) -> BackendResult<GroupId> {
        self.mutate()?;
        for &child in children {
            self.instance(child)?;
        }
        let slot = insert_slot(
            &mut self.groups,
            Group {
                children: children.to_vec(),
                acceleration: None,
            },
        );
        Ok(GroupId(slot))
    }

    fn release_geometry_group(&mut self, group: GroupId) -> BackendResult<()> {
        self.mutate()?;
        self.groups
            .get_mut(group.index())
            .and_then(Option::take)
            .map(|_| ())
            .ok_or_else(|| invalid(group))
    }

    fn create_acceleration(
        &mut self,
        builder: &str,
        traverser: &str,
    ) -> BackendResult<AccelerationId> {
        self.mutate()?;
        if !BUILDERS.contains(&builder) {
            return Err(BackendError::Validation(format!(
                "unknown acceleration builder '{}'",
                builder
            )));
        }
        if !TRAVERSERS.contains(&traverser) {
            return Err(BackendError::Validation(format!(
                "unknown acceleration traverser '{}'",
                traverser
            )));
        }
        let slot = insert_slot(
            &mut self.accelerations,
            Acceleration {
                dirty: true,
                bvh: Arc::new(BvhNode::Empty),
            },
        );
        Ok(AccelerationId(slot))
    }

    fn set_group_acceleration(
        &mut self,
        group: GroupId,
        acceleration: AccelerationId,
    ) -> BackendResult<()> {
        self.mutate()?;
        self.acceleration(acceleration)?;
        self.group_mut(group)?.acceleration = Some(acceleration);
        Ok(())
    }

    fn release_acceleration(&mut self, acceleration: AccelerationId) -> BackendResult<()> {
        self.mutate()?;
        self.accelerations
            .get_mut(acceleration.index())
            .and_then(Option::take)
            .ok_or_else(|| invalid(acceleration))?;
        for group in self.groups.iter_mut().flatten() {
            if group.acceleration == Some(acceleration) {
                group.acceleration = None;
            }
        }
        Ok(())
    }

    fn mark_dirty(&mut self, acceleration: AccelerationId) -> BackendResult<()> {
        self.mutate()?;
        self.acceleration_mut(acceleration)?.dirty = true;
        Ok(())
    }

    fn set_context_variable(&mut self, name: &str, value: Variable) -> BackendResult<()> {
        self.mutate()?;
        self.variables.insert(name.to_string(), value);
        Ok(())
    }

    fn set_ray_generation_program(
        &mut self,
        entry: u32,
        program: ProgramId,
    ) -> BackendResult<()> {
        self.mutate()?;
        if entry >= self.entry_point_count {
            return Err(BackendError::Validation(format!(
                "entry point {} out of range ({} entry points)",
                entry, self.entry_point_count
            )));
        }
        self.program(program)?;
        self.ray_generation.insert(entry, program);
        Ok(())
    }

    fn set_miss_program(&mut self, ray_type: u32, program: ProgramId) -> BackendResult<()> {
        self.mutate()?;
        if ray_type >= self.ray_type_count {
            return Err(BackendError::Validation(format!(
                "ray type {} out of range ({} ray types)",
                ray_type, self.ray_type_count
            )));
        }
        self.program(program)?;
        self.miss.insert(ray_type, program);
        Ok(())
    }

    fn validate(&mut self) -> BackendResult<()> {
        self.live()?;

        for entry in 0..self.entry_point_count {
            let program = *self.ray_generation.get(&entry).ok_or_else(|| {
                BackendError::Validation(format!(
                    "no ray generation program for entry point {}",
                    entry
                ))
            })?;
            self.check_kernel(program, Kernel::Camera, "ray generation")?;
        }

        let primary = *self.miss.get(&0).ok_or_else(|| {
            BackendError::Validation("no miss program for ray type 0".into())
        })?;
        self.check_kernel(primary, Kernel::Miss, "miss")?;
        for &program in self.miss.values() {
            self.check_kernel(program, Kernel::Miss, "miss")?;
        }

        self.output_buffers()?;

        let (root, _) = self.scene_root()?;
        for &child in &self.group(root)?.children {
            self.check_geometry(self.instance(child)?.geometry)?;
        }
        Ok(())
    }

    fn compile(&mut self) -> BackendResult<()> {
        self.validate()?;

        let dirty: Vec<(AccelerationId, Vec<GeometryInstanceId>)> = self
            .groups
            .iter()
            .flatten()
            .filter_map(|group| {
                let id = group.acceleration?;
                let acceleration = self.acceleration(id).ok()?;
                acceleration.dirty.then(|| (id, group.children.clone()))
            })
            .collect();

        for (id, children) in dirty {
            let start = Instant::now();
            let triangles = self.world_triangles(&children)?;
            let count = triangles.len();
            let bvh = BvhNode::new(triangles);
            log::info!(
                "Built BVH {}: {} triangles, depth {} in {:.2?}",
                id,
                count,
                bvh.depth(),
                start.elapsed()
            );

            let acceleration = self.acceleration_mut(id)?;
            acceleration.bvh = Arc::new(bvh);
            acceleration.dirty = false;
        }

        self.compiled = true;
        Ok(())
    }

    fn launch(&mut self, entry: u32, width: u32, height: u32) -> BackendResult<()> {
        self.live()?;
        if entry >= self.entry_point_count {
            return Err(BackendError::Launch(format!(
                "entry point {} out of range",
                entry
            )));
        }
        if !self.compiled {
            return Err(BackendError::Launch(
                "context must be compiled before launch".into(),
            ));
        }

        let (raw_id, image_id) = self.output_buffers()?;
        let desc = self.buffer(raw_id)?.desc;
        if (desc.width, desc.height) != (width, height) {
            return Err(BackendError::Launch(format!(
                "launch size {}x{} does not match output buffers {}x{}",
                width, height, desc.width, desc.height
            )));
        }

        let camera_program = *self
            .ray_generation
            .get(&entry)
            .ok_or_else(|| BackendError::Launch(format!("no program for entry {}", entry)))?;
        let lens = self.thin_lens(camera_program)?;
        let miss_program = *self
            .miss
            .get(&0)
            .ok_or_else(|| BackendError::Launch("no miss program".into()))?;
        let background = get_float3(
            "miss",
            &self.program(miss_program)?.variables,
            names::miss::BACKGROUND_COLOR,
        )?;
        let (_, acceleration) = self.scene_root()?;
        let bvh = Arc::clone(&self.acceleration(acceleration)?.bvh);

        let start = Instant::now();
        let seed = self.seed;
        let rows: Vec<Vec<Vec3>> = (0..height)
            .into_par_iter()
            .map(|y| {
                (0..width)
                    .map(|x| {
                        let pixel = y as u64 * width as u64 + x as u64;
                        let mut rng = StdRng::seed_from_u64(seed ^ pixel);
                        let ray = lens.generate(x, y, width, height, &mut rng);

                        let mut rec = HitRecord::default();
                        if bvh.hit(&ray, Interval::new(T_MIN, f32::INFINITY), &mut rec) {
                            eye_light(rec.normal, ray.direction)
                        } else {
                            background
                        }
                    })
                    .collect()
            })
            .collect();

        let radiance: Vec<[f32; 3]> = rows.iter().flatten().map(|c| c.to_array()).collect();
        let rgba: Vec<[u8; 4]> = rows.iter().flatten().map(|c| color_to_rgba(*c)).collect();
        self.buffers[raw_id.index()].data = bytemuck::cast_slice(&radiance).to_vec();
        self.buffers[image_id.index()].data = bytemuck::cast_slice(&rgba).to_vec();

        log::debug!(
            "Traced {}x{} on {} threads in {:.2?}",
            width,
            height,
            rayon::current_num_threads(),
            start.elapsed()
        );
        Ok(())
    }

    fn destroy(&mut self) {
        self.buffers.clear();
        self.programs.clear();
        self.geometries.clear();
        self.instances.clear();
        self.groups.clear();
        self.accelerations.clear();
        self.variables.clear();
        self.ray_generation.clear();
        self.miss.clear();
        self.compiled = false;
        self.destroyed = true;
    }
}

/// Store `value` in the first released slot, or append one.
fn insert_slot<T>(slots: &mut Vec<Option<T>>, value: T) -> u32 {
    match slots.iter().position(Option::is_none) {
        Some(i) => {
            slots[i] = Some(value);
            i as u32
        }
        None => {
            slots.push(Some(value));
            slots.len() as u32 - 1
        }
    }
}

fn invalid(handle: impl Display) -> BackendError {
    BackendError::InvalidHandle(handle.to_string())
}

fn unbound(scope: &str, name: &str) -> BackendError {
    BackendError::Validation(format!("{}: variable '{}' is not bound", scope, name))
}

fn mistyped(scope: &str, name: &str, found: &Variable, expected: &str) -> BackendError {
    BackendError::Validation(format!(
        "{}: variable '{}' is a {}, expected {}",
        scope,
        name,
        found.type_name(),
        expected
    ))
}

macro_rules! getter {
    ($fn_name:ident, $variant:ident, $ty:ty, $type_name:literal) => {
        fn $fn_name(scope: &str, vars: &Variables, name: &str) -> BackendResult<$ty> {
            match vars.get(name) {
                Some(Variable::$variant(v)) => Ok(*v),
                Some(other) => Err(mistyped(scope, name, other, $type_name)),
                None => Err(unbound(scope, name)),
            }
        }
    };
}

getter!(get_float, Float, f32, "float");
getter!(get_float3, Float3, Vec3, "float3");
getter!(get_matrix, Matrix4, Mat4, "matrix4x4");
getter!(get_buffer, Buffer, BufferId, "buffer");
getter!(get_group, Group, GroupId, "group");

fn read_float3(bytes: &[u8]) -> Vec<Vec3> {
    bytes
        .chunks_exact(12)
        .map(|c| Vec3::from_array(bytemuck::pod_read_unaligned(c)))
        .collect()
}

fn read_int3(bytes: &[u8]) -> Vec<[i32; 3]> {
    bytes
        .chunks_exact(12)
        .map(bytemuck::pod_read_unaligned)
        .collect()
}
