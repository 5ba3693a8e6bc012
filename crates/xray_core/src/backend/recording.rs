//! Test backend that records every call and keeps buffer contents on the host.

use std::sync::{Arc, Mutex, MutexGuard};

use xray_math::Mat4;

use super::{
    AccelerationId, Backend, BackendError, BackendResult, BufferDesc, BufferId, GeometryId,
    GeometryInstanceId, GroupId, ProgramId, Variable,
};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    SetRayTypeCount(u32),
    SetEntryPointCount(u32),
    CreateBuffer(BufferDesc),
    WriteBuffer(BufferId, usize),
    CreateProgram { module: String, entry: String },
    SetProgramVariable(ProgramId, String, Variable),
    CreateGeometry { intersect: ProgramId, bounds: ProgramId, primitive_count: u32 },
    SetGeometryVariable(GeometryId, String, Variable),
    CreateGeometryInstance(GeometryId, Mat4),
    CreateGeometryGroup(Vec<GeometryInstanceId>),
    ReleaseGeometryGroup(GroupId),
    CreateAcceleration { builder: String, traverser: String },
    SetGroupAcceleration(GroupId, AccelerationId),
    ReleaseAcceleration(AccelerationId),
    MarkDirty(AccelerationId),
    SetContextVariable(String, Variable),
    SetRayGenerationProgram(u32, ProgramId),
    SetMissProgram(u32, ProgramId),
    Validate,
    Compile,
    Launch(u32, u32, u32),
    Destroy,
}

#[derive(Default)]
struct State {
    calls: Vec<Call>,
    buffers: Vec<(BufferDesc, Vec<u8>)>,
    programs: u32,
    geometries: u32,
    instances: u32,
    groups: u32,
    accelerations: u32,
    fail_on: Option<&'static str>,
}

/// Shared view of what a [`RecordingBackend`] has seen.
#[derive(Clone)]
pub(crate) struct Recording(Arc<Mutex<State>>);

impl Recording {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.0.lock().unwrap()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.lock().calls.iter().filter(|c| pred(c)).count()
    }

    /// Index of the first call matching `pred`.
    pub fn position(&self, pred: impl Fn(&Call) -> bool) -> Option<usize> {
        self.lock().calls.iter().position(pred)
    }

    pub fn buffer(&self, id: BufferId) -> (BufferDesc, Vec<u8>) {
        self.lock().buffers[id.index()].clone()
    }

    pub fn clear(&self) {
        self.lock().calls.clear();
    }

    /// Make the named trait method return an error from now on.
    pub fn fail_on(&self, method: &'static str) {
        self.lock().fail_on = Some(method);
    }
}

pub(crate) struct RecordingBackend {
    state: Recording,
}

impl RecordingBackend {
    pub fn new() -> (Self, Recording) {
        let state = Recording(Arc::new(Mutex::new(State::default())));
        let backend = Self {
            state: state.clone(),
        };
        (backend, state)
    }

    /// Make the named trait method return an error.
    pub fn failing_on(self, method: &'static str) -> Self {
        self.state.fail_on(method);
        self
    }

    fn record(&self, method: &'static str, call: Call) -> BackendResult<()> {
        let mut state = self.state.lock();
        state.calls.push(call);
        if state.fail_on == Some(method) {
            let msg = format!("injected failure in {method}");
            return Err(match method {
                "compile" => BackendError::Compile(msg),
                "launch" => BackendError::Launch(msg),
                _ => BackendError::Validation(msg),
            });
        }
        Ok(())
    }

    fn next(counter: &mut u32) -> u32 {
        let id = *counter;
        *counter += 1;
        id
    }
}

impl Backend for RecordingBackend {
    fn name(&self) -> &str {
        "recording"
    }

    fn set_ray_type_count(&mut self, count: u32) -> BackendResult<()> {
        self.record("set_ray_type_count", Call::SetRayTypeCount(count))
    }

    fn set_entry_point_count(&mut self, count: u32) -> BackendResult<()> {
        self.record("set_entry_point_count", Call::SetEntryPointCount(count))
    }

    fn create_buffer(&mut self, desc: BufferDesc) -> BackendResult<BufferId> {
        self.record("create_buffer", Call::CreateBuffer(desc))?;
        let mut state = self.state.lock();
        state.buffers.push((desc, vec![0; desc.byte_len()]));
        Ok(BufferId(state.buffers.len() as u32 - 1))
    }

    fn write_buffer(&mut self, buffer: BufferId, bytes: &[u8]) -> BackendResult<()> {
        self.record("write_buffer", Call::WriteBuffer(buffer, bytes.len()))?;
        let mut state = self.state.lock();
        let (desc, data) = state
            .buffers
            .get_mut(buffer.index())
            .ok_or_else(|| BackendError::InvalidHandle(buffer.to_string()))?;
        if bytes.len() != desc.byte_len() {
            return Err(BackendError::BufferSize {
                buffer,
                expected: desc.byte_len(),
                actual: bytes.len(),
            });
        }
        data.copy_from_slice(bytes);
        Ok(())
    }

    fn read_buffer(&self, buffer: BufferId) -> BackendResult<Vec<u8>> {
        let state = self.state.lock();
        state
            .buffers
            .get(buffer.index())
            .map(|(_, data)| data.clone())
            .ok_or_else(|| BackendError::InvalidHandle(buffer.to_string()))
    }

    fn buffer_desc(&self, buffer: BufferId) -> BackendResult<BufferDesc> {
        let state = self.state.lock();
        state
            .buffers
            .get(buffer.index())
            .map(|(desc, _)| *desc)
            .ok_or_else(|| BackendError::InvalidHandle(buffer.to_string()))
    }

    fn create_program(&mut self, module: &str, entry: &str) -> BackendResult<ProgramId> {
        self.record(
            "create_program",
            Call::CreateProgram {
                module: module.to_string(),
                entry: entry.to_string(),
            },
        )?;
        Ok(ProgramId(Self::next(&mut self.state.lock().programs)))
    }

    fn set_program_variable(
        &mut self,
        program: ProgramId,
        name: &str,
        value: Variable,
    ) -> BackendResult<()> {
        self.record(
            "set_program_variable",
            Call::SetProgramVariable(program, name.to_string(), value),
        )
    }

    fn create_geometry(
        &mut self,
        intersect: ProgramId,
        bounds: ProgramId,
        primitive_count: u32,
    ) -> BackendResult<GeometryId> {
        self.record(
            "create_geometry",
            Call::CreateGeometry {
                intersect,
                bounds,
                primitive_count,
            },
        )?;
        Ok(GeometryId(Self::next(&mut self.state.lock().geometries)))
    }

    fn set_geometry_variable(
        &mut self,
        geometry: GeometryId,
        name: &str,
        value: Variable,
    ) -> BackendResult<()> {
        self.record(
            "set_geometry_variable",
            Call::SetGeometryVariable(geometry, name.to_string(), value),
        )
    }

    fn create_geometry_instance(
        &mut self,
        geometry: GeometryId,
        placement: Mat4,
    ) -> BackendResult<GeometryInstanceId> {
        self.record(
            "create_geometry_instance",
            Call::CreateGeometryInstance(geometry, placement),
        )?;
        Ok(GeometryInstanceId(Self::next(&mut self.state.lock().instances)))
    }

    fn create_geometry_group(
        &mut self,
        children: &[GeometryInstanceId],
    ) -> BackendResult<GroupId> {
        self.record(
            "create_geometry_group",
            Call::CreateGeometryGroup(children.to_vec()),
        )?;
        Ok(GroupId(Self::next(&mut self.state.lock().groups)))
    }

    fn release_geometry_group(&mut self, group: GroupId) -> BackendResult<()> {
        self.record("release_geometry_group", Call::ReleaseGeometryGroup(group))
    }

    fn create_acceleration(
        &mut self,
        builder: &str,
        traverser: &str,
    ) -> BackendResult<AccelerationId> {
        self.record(
            "create_acceleration",
            Call::CreateAcceleration {
                builder: builder.to_string(),
                traverser: traverser.to_string(),
            },
        )?;
        Ok(AccelerationId(Self::next(&mut self.state.lock().accelerations)))
    }

    fn set_group_acceleration(
        &mut self,
        group: GroupId,
        acceleration: AccelerationId,
    ) -> BackendResult<()> {
        self.record(
            "set_group_acceleration",
            Call::SetGroupAcceleration(group, acceleration),
        )
    }

    fn release_acceleration(&mut self, acceleration: AccelerationId) -> BackendResult<()> {
        self.record("release_acceleration", Call::ReleaseAcceleration(acceleration))
    }

    fn mark_dirty(&mut self, acceleration: AccelerationId) -> BackendResult<()> {
        self.record("mark_dirty", Call::MarkDirty(acceleration))
    }

    fn set_context_variable(&mut self, name: &str, value: Variable) -> BackendResult<()> {
        self.record(
            "set_context_variable",
            Call::SetContextVariable(name.to_string(), value),
        )
    }

    fn set_ray_generation_program(
        &mut self,
        entry: u32,
        program: ProgramId,
    ) -> BackendResult<()> {
        self.record(
            "set_ray_generation_program",
            Call::SetRayGenerationProgram(entry, program),
        )
    }

    fn set_miss_program(&mut self, ray_type: u32, program: ProgramId) -> BackendResult<()> {
        self.record("set_miss_program", Call::SetMissProgram(ray_type, program))
    }

    fn validate(&mut self) -> BackendResult<()> {
        self.record("validate", Call::Validate)
    }

    fn compile(&mut self) -> BackendResult<()> {
        self.record("compile", Call::Compile)
    }

    fn launch(&mut self, entry: u32, width: u32, height: u32) -> BackendResult<()> {
        self.record("launch", Call::Launch(entry, width, height))
    }

    fn destroy(&mut self) {
        self.state.lock().calls.push(Call::Destroy);
    }
}
