//! Shader stages and linked programs.
//!
//! A [`ShaderProgram`] walks a one-way state machine:
//!
//! ```text
//! Unlinked -> Compiling -> Compiled -> Linking -> Linked -> Active -> Destroyed
//!                  \-> CompileFailed      \-> LinkFailed
//! ```
//!
//! Every fallible step returns an [`Error`] the caller must handle; the same
//! condition is also logged. A failed program never reaches `Linked` and
//! cannot be activated.

use std::path::Path;

use tracing::{debug, error, trace, warn};

use crate::device::{GraphicsDevice, ProgramId, ShaderId, StageKind, UniformLocation};
use crate::error::{Error, ObjectKind, Result};

/// Vertex and fragment GLSL text for one program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSources {
    pub vertex: String,
    pub fragment: String,
}

impl ShaderSources {
    pub fn new(vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            vertex: vertex.into(),
            fragment: fragment.into(),
        }
    }

    /// Read both stage files fully into memory.
    pub fn load(vertex_path: impl AsRef<Path>, fragment_path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            vertex: read_source(vertex_path.as_ref())?,
            fragment: read_source(fragment_path.as_ref())?,
        })
    }
}

fn read_source(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| {
        error!(path = %path.display(), "shader source not readable: {source}");
        Error::FileRead {
            path: path.to_path_buf(),
            source,
        }
    })
}

/// Where a [`ShaderProgram`] is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgramState {
    Unlinked,
    Compiling,
    CompileFailed,
    Compiled,
    Linking,
    LinkFailed,
    Linked,
    Active,
    Destroyed,
}

impl ProgramState {
    pub fn is_linked(self) -> bool {
        matches!(self, ProgramState::Linked | ProgramState::Active)
    }
}

/// Driver logs come back NUL padded and sometimes empty.
fn clean_log(log: String) -> String {
    let trimmed = log.trim_end_matches(['\0', '\n', '\r', ' ']);
    if trimmed.is_empty() {
        "driver reported failure without a diagnostic".to_owned()
    } else {
        trimmed.to_owned()
    }
}

/// Compile one stage. On failure the stage object is released and the
/// driver's log is returned verbatim in [`Error::Compile`].
pub fn compile_stage<D: GraphicsDevice + ?Sized>(
    device: &mut D,
    source: &str,
    kind: StageKind,
) -> Result<ShaderId> {
    let shader = device.create_shader(kind);
    if shader.is_none() {
        return Err(Error::ObjectCreation(ObjectKind::Shader));
    }

    device.shader_source(shader, source);
    device.compile_shader(shader);

    if !device.shader_compile_status(shader) {
        let log = clean_log(device.shader_info_log(shader));
        device.delete_shader(shader);
        error!(stage = %kind, "shader compilation failed\n{log}");
        return Err(Error::Compile { stage: kind, log });
    }

    trace!(stage = %kind, shader = shader.raw(), "compiled");
    Ok(shader)
}

/// Link two compiled stages into a program.
///
/// Both stage objects are detached and released whether or not the link
/// succeeds.
pub fn link_stages<D: GraphicsDevice + ?Sized>(
    device: &mut D,
    vertex: ShaderId,
    fragment: ShaderId,
) -> Result<ProgramId> {
    let program = device.create_program();
    if program.is_none() {
        device.delete_shader(vertex);
        device.delete_shader(fragment);
        return Err(Error::ObjectCreation(ObjectKind::Program));
    }

    device.attach_shader(program, vertex);
    device.attach_shader(program, fragment);
    device.link_program(program);

    let failure = (!device.program_link_status(program))
        .then(|| clean_log(device.program_info_log(program)));

    for shader in [vertex, fragment] {
        device.detach_shader(program, shader);
        device.delete_shader(shader);
    }

    if let Some(log) = failure {
        device.delete_program(program);
        error!("program linking failed\n{log}");
        return Err(Error::Link { log });
    }

    Ok(program)
}

/// A value that can be written to a scalar uniform.
pub trait Uniform: Copy {
    fn upload<D: GraphicsDevice + ?Sized>(self, device: &mut D, location: UniformLocation);
}

impl Uniform for bool {
    fn upload<D: GraphicsDevice + ?Sized>(self, device: &mut D, location: UniformLocation) {
        device.uniform_1i(location, i32::from(self));
    }
}

impl Uniform for i32 {
    fn upload<D: GraphicsDevice + ?Sized>(self, device: &mut D, location: UniformLocation) {
        device.uniform_1i(location, self);
    }
}

impl Uniform for f32 {
    fn upload<D: GraphicsDevice + ?Sized>(self, device: &mut D, location: UniformLocation) {
        device.uniform_1f(location, self);
    }
}

/// A vertex + fragment program built from GLSL sources.
///
/// The device object must be released with [`ShaderProgram::destroy`]; a
/// linked program that is dropped instead leaks on the device.
#[derive(Debug)]
pub struct ShaderProgram {
    sources: ShaderSources,
    id: ProgramId,
    state: ProgramState,
}

impl ShaderProgram {
    /// An unlinked program. Nothing touches the device until [`Self::build`].
    pub fn new(sources: ShaderSources) -> Self {
        Self {
            sources,
            id: ProgramId::NONE,
            state: ProgramState::Unlinked,
        }
    }

    /// Load both stage files into an unlinked program.
    pub fn from_files(vertex_path: impl AsRef<Path>, fragment_path: impl AsRef<Path>) -> Result<Self> {
        ShaderSources::load(vertex_path, fragment_path).map(Self::new)
    }

    /// Compile and link in one step.
    pub fn link<D: GraphicsDevice + ?Sized>(device: &mut D, sources: ShaderSources) -> Result<Self> {
        let mut program = Self::new(sources);
        program.build(device)?;
        Ok(program)
    }

    pub fn id(&self) -> ProgramId {
        self.id
    }

    pub fn state(&self) -> ProgramState {
        self.state
    }

    pub fn sources(&self) -> &ShaderSources {
        &self.sources
    }

    pub fn is_linked(&self) -> bool {
        self.state.is_linked()
    }

    /// Compile both stages and link them. Only valid from `Unlinked`.
    pub fn build<D: GraphicsDevice + ?Sized>(&mut self, device: &mut D) -> Result<()> {
        if self.state != ProgramState::Unlinked {
            return Err(Error::InvalidState {
                expected: "Unlinked",
                found: self.state,
            });
        }

        self.state = ProgramState::Compiling;
        let vertex = match compile_stage(device, &self.sources.vertex, StageKind::Vertex) {
            Ok(shader) => shader,
            Err(e) => {
                self.state = ProgramState::CompileFailed;
                return Err(e);
            }
        };
        let fragment = match compile_stage(device, &self.sources.fragment, StageKind::Fragment) {
            Ok(shader) => shader,
            Err(e) => {
                device.delete_shader(vertex);
                self.state = ProgramState::CompileFailed;
                return Err(e);
            }
        };
        self.state = ProgramState::Compiled;

        self.state = ProgramState::Linking;
        match link_stages(device, vertex, fragment) {
            Ok(id) => {
                self.id = id;
                self.state = ProgramState::Linked;
                debug!(program = id.raw(), "program linked");
                Ok(())
            }
            Err(e) => {
                self.state = ProgramState::LinkFailed;
                Err(e)
            }
        }
    }

    fn ensure_linked(&self) -> Result<()> {
        if self.state.is_linked() {
            Ok(())
        } else {
            Err(Error::InvalidState {
                expected: "Linked",
                found: self.state,
            })
        }
    }

    /// Make this the device's current program. Re-activating is harmless.
    pub fn activate<D: GraphicsDevice + ?Sized>(&mut self, device: &mut D) -> Result<()> {
        self.ensure_linked()?;
        device.use_program(self.id);
        self.state = ProgramState::Active;
        Ok(())
    }

    /// Whether the device currently has this program in use.
    pub fn is_current<D: GraphicsDevice + ?Sized>(&self, device: &D) -> bool {
        self.state.is_linked() && device.current_program() == self.id
    }

    pub fn uniform_location<D: GraphicsDevice + ?Sized>(&self, device: &D, name: &str) -> UniformLocation {
        if !self.state.is_linked() {
            return UniformLocation::NONE;
        }
        device.uniform_location(self.id, name)
    }

    /// Activate the program and write `value` to the uniform `name`.
    ///
    /// Names that are not active uniforms resolve to location `-1` and the
    /// write is a no-op.
    pub fn set_uniform<D, T>(&mut self, device: &mut D, name: &str, value: T) -> Result<()>
    where
        D: GraphicsDevice + ?Sized,
        T: Uniform,
    {
        self.activate(device)?;
        let location = device.uniform_location(self.id, name);
        if location.is_none() {
            trace!(program = self.id.raw(), name, "uniform not active; write ignored");
        }
        value.upload(device, location);
        Ok(())
    }

    pub fn set_bool<D: GraphicsDevice + ?Sized>(&mut self, device: &mut D, name: &str, value: bool) -> Result<()> {
        self.set_uniform(device, name, value)
    }

    pub fn set_int<D: GraphicsDevice + ?Sized>(&mut self, device: &mut D, name: &str, value: i32) -> Result<()> {
        self.set_uniform(device, name, value)
    }

    pub fn set_float<D: GraphicsDevice + ?Sized>(&mut self, device: &mut D, name: &str, value: f32) -> Result<()> {
        self.set_uniform(device, name, value)
    }

    /// Release the device program. Terminal; calling it again does nothing.
    pub fn destroy<D: GraphicsDevice + ?Sized>(&mut self, device: &mut D) {
        if !self.id.is_none() {
            if device.current_program() == self.id {
                device.use_program(ProgramId::NONE);
            }
            device.delete_program(self.id);
            debug!(program = self.id.raw(), "program destroyed");
            self.id = ProgramId::NONE;
        }
        self.state = ProgramState::Destroyed;
    }
}

impl Drop for ShaderProgram {
    fn drop(&mut self) {
        if !self.id.is_none() {
            warn!(program = self.id.raw(), "program dropped without destroy(); device object leaks");
        }
    }
}
