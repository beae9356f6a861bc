//! A software [`GraphicsDevice`] for tests and tooling.
//!
//! [`HeadlessDevice`] keeps the same object model and binding rules as an
//! OpenGL 3.3 core context: element buffer bindings live in the vertex array,
//! deleting an attached shader is deferred until it is detached, uniform
//! writes go to the current program, and misuse raises an error flag instead
//! of panicking. Draw calls fetch their vertices through the recorded
//! attribute pointers and are kept in [`HeadlessDevice::draw_calls`].

mod draw;
mod front;

use std::collections::{BTreeMap, HashMap, VecDeque};

use tracing::trace;

use crate::device::{
    BufferId, BufferTarget, DeviceError, DrawMode, GraphicsDevice, IndexType, PixelFormat, ProgramId,
    ShaderId, StageKind, TextureFilter, TextureId, TextureWrap, UniformLocation, UsageHint, VertexArrayId,
    VertexAttribute,
};

pub use draw::DrawCall;
use front::StageInterface;

/// Number of texture units the headless device exposes.
pub const TEXTURE_UNITS: u32 = 16;

/// Current value of a scalar uniform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Float(f32),
    Bool(bool),
    Sampler(i32),
}

#[derive(Debug)]
struct ShaderObject {
    kind: StageKind,
    source: String,
    compiled: Option<Result<StageInterface, String>>,
    delete_pending: bool,
}

#[derive(Debug)]
struct UniformSlot {
    name: String,
    ty: String,
    /// `None` for types no scalar write can reach (vectors, matrices).
    value: Option<UniformValue>,
}

impl UniformSlot {
    fn new(name: String, ty: String) -> Self {
        let value = match ty.as_str() {
            "float" => Some(UniformValue::Float(0.0)),
            "int" | "uint" => Some(UniformValue::Int(0)),
            "bool" => Some(UniformValue::Bool(false)),
            t if t.starts_with("sampler") || t.starts_with("isampler") || t.starts_with("usampler") => {
                Some(UniformValue::Sampler(0))
            }
            _ => None,
        };
        Self { name, ty, value }
    }
}

#[derive(Debug, Default)]
struct ProgramObject {
    attached: Vec<ShaderId>,
    linked: bool,
    log: String,
    uniforms: Vec<UniformSlot>,
    delete_pending: bool,
}

#[derive(Debug)]
struct BufferObject {
    data: Vec<u8>,
    usage: UsageHint,
}

#[derive(Debug, Clone, Copy)]
struct AttributeState {
    pointer: Option<(VertexAttribute, BufferId)>,
    enabled: bool,
}

#[derive(Debug, Default)]
struct VertexArrayObject {
    attributes: BTreeMap<u32, AttributeState>,
    element_buffer: BufferId,
}

#[derive(Debug)]
struct TextureObject {
    size: Option<(u32, u32)>,
    format: PixelFormat,
    pixels: Vec<u8>,
    filter: TextureFilter,
    wrap: TextureWrap,
    mipmaps: bool,
}

/// Software device. See the module docs for the rules it enforces.
#[derive(Debug)]
pub struct HeadlessDevice {
    next_id: u32,
    shaders: HashMap<u32, ShaderObject>,
    programs: HashMap<u32, ProgramObject>,
    buffers: HashMap<u32, BufferObject>,
    /// Key 0 is the default vertex array; it is never deleted.
    vertex_arrays: HashMap<u32, VertexArrayObject>,
    textures: HashMap<u32, TextureObject>,

    current_program: ProgramId,
    array_buffer: BufferId,
    vertex_array: VertexArrayId,
    active_unit: u32,
    unit_bindings: HashMap<u32, TextureId>,

    viewport: [i32; 4],
    clear_color: [f32; 4],
    clears: usize,
    draw_calls: Vec<DrawCall>,
    errors: VecDeque<DeviceError>,
}

impl Default for HeadlessDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessDevice {
    pub fn new() -> Self {
        let mut vertex_arrays = HashMap::new();
        vertex_arrays.insert(0, VertexArrayObject::default());
        Self {
            next_id: 1,
            shaders: HashMap::new(),
            programs: HashMap::new(),
            buffers: HashMap::new(),
            vertex_arrays,
            textures: HashMap::new(),
            current_program: ProgramId::NONE,
            array_buffer: BufferId::NONE,
            vertex_array: VertexArrayId::NONE,
            active_unit: 0,
            unit_bindings: HashMap::new(),
            viewport: [0; 4],
            clear_color: [0.0; 4],
            clears: 0,
            draw_calls: Vec::new(),
            errors: VecDeque::new(),
        }
    }

    fn allocate(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn raise(&mut self, error: DeviceError) {
        trace!(%error, "headless device error");
        self.errors.push_back(error);
    }

    fn current_vao(&self) -> &VertexArrayObject {
        self.vertex_arrays
            .get(&self.vertex_array.raw())
            .unwrap_or(&self.vertex_arrays[&0])
    }

    fn current_vao_mut(&mut self) -> &mut VertexArrayObject {
        let key = if self.vertex_arrays.contains_key(&self.vertex_array.raw()) {
            self.vertex_array.raw()
        } else {
            0
        };
        self.vertex_arrays.entry(key).or_default()
    }

    fn bound_texture_object(&mut self) -> Option<&mut TextureObject> {
        let id = self.unit_bindings.get(&self.active_unit).copied().unwrap_or(TextureId::NONE);
        self.textures.get_mut(&id.raw())
    }

    // -- inspection -------------------------------------------------------

    /// Every draw call accepted so far, oldest first.
    pub fn draw_calls(&self) -> &[DrawCall] {
        &self.draw_calls
    }

    pub fn take_draw_calls(&mut self) -> Vec<DrawCall> {
        std::mem::take(&mut self.draw_calls)
    }

    pub fn uniform_value(&self, program: ProgramId, name: &str) -> Option<UniformValue> {
        self.programs
            .get(&program.raw())?
            .uniforms
            .iter()
            .find(|slot| slot.name == name)?
            .value
    }

    /// Source text last given to `shader`.
    pub fn shader_text(&self, shader: ShaderId) -> Option<&str> {
        self.shaders.get(&shader.raw()).map(|s| s.source.as_str())
    }

    pub fn live_shaders(&self) -> usize {
        self.shaders.len()
    }

    pub fn live_programs(&self) -> usize {
        self.programs.len()
    }

    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    /// Vertex arrays created and not yet deleted.
    pub fn live_vertex_arrays(&self) -> usize {
        self.vertex_arrays.len() - 1
    }

    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    pub fn buffer_contents(&self, buffer: BufferId) -> Option<&[u8]> {
        self.buffers.get(&buffer.raw()).map(|b| b.data.as_slice())
    }

    pub fn buffer_usage(&self, buffer: BufferId) -> Option<UsageHint> {
        self.buffers.get(&buffer.raw()).map(|b| b.usage)
    }

    /// The buffer bound to `target`. Element buffer bindings are read from
    /// the bound vertex array.
    pub fn bound_buffer(&self, target: BufferTarget) -> BufferId {
        match target {
            BufferTarget::Array => self.array_buffer,
            BufferTarget::ElementArray => self.current_vao().element_buffer,
        }
    }

    pub fn bound_vertex_array(&self) -> VertexArrayId {
        self.vertex_array
    }

    /// Pointer, source buffer and enabled flag recorded for `location`.
    pub fn attribute(&self, vao: VertexArrayId, location: u32) -> Option<(VertexAttribute, BufferId, bool)> {
        let state = self.vertex_arrays.get(&vao.raw())?.attributes.get(&location)?;
        let (attribute, buffer) = state.pointer?;
        Some((attribute, buffer, state.enabled))
    }

    pub fn bound_texture(&self, unit: u32) -> TextureId {
        self.unit_bindings.get(&unit).copied().unwrap_or(TextureId::NONE)
    }

    pub fn texture_size(&self, texture: TextureId) -> Option<(u32, u32)> {
        self.textures.get(&texture.raw())?.size
    }

    pub fn texture_format(&self, texture: TextureId) -> Option<PixelFormat> {
        let texture = self.textures.get(&texture.raw())?;
        texture.size.map(|_| texture.format)
    }

    pub fn texture_pixels(&self, texture: TextureId) -> Option<&[u8]> {
        self.textures.get(&texture.raw()).map(|t| t.pixels.as_slice())
    }

    pub fn texture_has_mipmaps(&self, texture: TextureId) -> bool {
        self.textures.get(&texture.raw()).is_some_and(|t| t.mipmaps)
    }

    pub fn texture_sampling(&self, texture: TextureId) -> Option<(TextureFilter, TextureWrap)> {
        self.textures.get(&texture.raw()).map(|t| (t.filter, t.wrap))
    }

    pub fn viewport_rect(&self) -> [i32; 4] {
        self.viewport
    }

    /// Color the framebuffer holds after the last clear.
    pub fn clear_color_value(&self) -> [f32; 4] {
        self.clear_color
    }

    pub fn clear_count(&self) -> usize {
        self.clears
    }

    // -- internals --------------------------------------------------------

    /// Frees a shader flagged for deletion once nothing holds it.
    fn collect_shader(&mut self, shader: ShaderId) {
        let pending = self.shaders.get(&shader.raw()).is_some_and(|s| s.delete_pending);
        let attached = self.programs.values().any(|p| p.attached.contains(&shader));
        if pending && !attached {
            self.shaders.remove(&shader.raw());
        }
    }

    fn remove_program(&mut self, program: ProgramId) {
        if let Some(object) = self.programs.remove(&program.raw()) {
            for shader in object.attached {
                self.collect_shader(shader);
            }
        }
    }

    fn link(&self, object: &ProgramObject) -> Result<Vec<UniformSlot>, String> {
        let mut vertex = None;
        let mut fragment = None;

        for shader in &object.attached {
            let Some(stage) = self.shaders.get(&shader.raw()) else {
                continue;
            };
            let interface = match &stage.compiled {
                Some(Ok(interface)) => interface,
                _ => return Err(format!("error: {} shader {} is not compiled", stage.kind, shader.raw())),
            };
            let slot = match stage.kind {
                StageKind::Vertex => &mut vertex,
                StageKind::Fragment => &mut fragment,
            };
            if slot.replace(interface).is_some() {
                return Err(format!("error: more than one {} shader attached", stage.kind));
            }
        }

        let vertex = vertex.ok_or("error: program lacks a vertex shader")?;
        let fragment = fragment.ok_or("error: program lacks a fragment shader")?;

        for (kind, stage) in [(StageKind::Vertex, vertex), (StageKind::Fragment, fragment)] {
            if !stage.has_main() {
                return Err(format!("error: {kind} shader lacks `main'"));
            }
        }

        for input in &fragment.inputs {
            match vertex.outputs.iter().find(|o| o.name == input.name) {
                None => {
                    return Err(format!(
                        "error: fragment shader input `{}' has no matching vertex shader output",
                        input.name
                    ))
                }
                Some(output) if output.ty != input.ty => {
                    return Err(format!(
                        "error: `{}' is {} in the vertex shader but {} in the fragment shader",
                        input.name, output.ty, input.ty
                    ))
                }
                Some(_) => {}
            }
        }

        let mut uniforms: Vec<UniformSlot> = Vec::new();
        for declared in vertex.uniforms.iter().chain(&fragment.uniforms) {
            match uniforms.iter().find(|u| u.name == declared.name) {
                Some(existing) if existing.ty != declared.ty => {
                    return Err(format!(
                        "error: uniform `{}' declared as both {} and {}",
                        declared.name, existing.ty, declared.ty
                    ))
                }
                Some(_) => {}
                None => uniforms.push(UniformSlot::new(declared.name.clone(), declared.ty.clone())),
            }
        }
        Ok(uniforms)
    }

    fn write_uniform(&mut self, location: UniformLocation, value: UniformValue) {
        let program = self.current_program;
        let Some(object) = self.programs.get_mut(&program.raw()) else {
            self.raise(DeviceError::InvalidOperation);
            return;
        };
        if location.is_none() {
            return;
        }
        let Some(slot) = object.uniforms.get_mut(location.0 as usize) else {
            self.raise(DeviceError::InvalidOperation);
            return;
        };

        let stored = match (slot.value, value) {
            (Some(UniformValue::Int(_)), UniformValue::Int(v)) => UniformValue::Int(v),
            (Some(UniformValue::Sampler(_)), UniformValue::Int(v)) => UniformValue::Sampler(v),
            (Some(UniformValue::Float(_)), UniformValue::Float(v)) => UniformValue::Float(v),
            (Some(UniformValue::Bool(_)), UniformValue::Int(v)) => UniformValue::Bool(v != 0),
            (Some(UniformValue::Bool(_)), UniformValue::Float(v)) => UniformValue::Bool(v != 0.0),
            _ => {
                self.raise(DeviceError::InvalidOperation);
                return;
            }
        };
        slot.value = Some(stored);
    }

    /// Program and vertex array a draw call may use, or the error it raises.
    fn draw_state(&self) -> Result<&VertexArrayObject, DeviceError> {
        let linked = self
            .programs
            .get(&self.current_program.raw())
            .is_some_and(|p| p.linked);
        if !linked || self.vertex_array.is_none() {
            return Err(DeviceError::InvalidOperation);
        }
        self.vertex_arrays
            .get(&self.vertex_array.raw())
            .ok_or(DeviceError::InvalidOperation)
    }

    fn assemble(
        &self,
        vao: &VertexArrayObject,
        vertices: &[u32],
    ) -> Result<BTreeMap<u32, Vec<f32>>, DeviceError> {
        let mut fetched = BTreeMap::new();
        for (&location, state) in &vao.attributes {
            let (true, Some((attribute, buffer))) = (state.enabled, state.pointer) else {
                continue;
            };
            let data = self
                .buffers
                .get(&buffer.raw())
                .map(|b| b.data.as_slice())
                .ok_or(DeviceError::InvalidOperation)?;
            let mut values = Vec::with_capacity(vertices.len() * attribute.components.max(0) as usize);
            for &vertex in vertices {
                values.extend(draw::fetch(data, &attribute, vertex).ok_or(DeviceError::InvalidOperation)?);
            }
            fetched.insert(location, values);
        }
        Ok(fetched)
    }

    fn submit(&mut self, mode: DrawMode, count: i32, index_type: Option<IndexType>, indices: Vec<u32>) {
        let result = self
            .draw_state()
            .and_then(|vao| self.assemble(vao, &indices));
        match result {
            Ok(attributes) => {
                trace!(?mode, count, "draw");
                self.draw_calls.push(DrawCall {
                    mode,
                    count,
                    index_type,
                    indices,
                    attributes,
                });
            }
            Err(error) => self.raise(error),
        }
    }
}

impl GraphicsDevice for HeadlessDevice {
    fn create_shader(&mut self, kind: StageKind) -> ShaderId {
        let id = self.allocate();
        self.shaders.insert(
            id,
            ShaderObject {
                kind,
                source: String::new(),
                compiled: None,
                delete_pending: false,
            },
        );
        ShaderId(id)
    }

    fn shader_source(&mut self, shader: ShaderId, source: &str) {
        match self.shaders.get_mut(&shader.raw()) {
            Some(object) => object.source = source.to_owned(),
            None => self.raise(DeviceError::InvalidValue),
        }
    }

    fn compile_shader(&mut self, shader: ShaderId) {
        match self.shaders.get_mut(&shader.raw()) {
            Some(object) => object.compiled = Some(front::analyze(&object.source)),
            None => self.raise(DeviceError::InvalidValue),
        }
    }

    fn shader_compile_status(&self, shader: ShaderId) -> bool {
        self.shaders
            .get(&shader.raw())
            .is_some_and(|s| matches!(s.compiled, Some(Ok(_))))
    }

    fn shader_info_log(&self, shader: ShaderId) -> String {
        match self.shaders.get(&shader.raw()).and_then(|s| s.compiled.as_ref()) {
            Some(Err(log)) => log.clone(),
            _ => String::new(),
        }
    }

    fn delete_shader(&mut self, shader: ShaderId) {
        if let Some(object) = self.shaders.get_mut(&shader.raw()) {
            object.delete_pending = true;
            self.collect_shader(shader);
        }
    }

    fn create_program(&mut self) -> ProgramId {
        let id = self.allocate();
        self.programs.insert(id, ProgramObject::default());
        ProgramId(id)
    }

    fn attach_shader(&mut self, program: ProgramId, shader: ShaderId) {
        if !self.shaders.contains_key(&shader.raw()) {
            self.raise(DeviceError::InvalidValue);
            return;
        }
        let Some(object) = self.programs.get_mut(&program.raw()) else {
            self.raise(DeviceError::InvalidValue);
            return;
        };
        if object.attached.contains(&shader) {
            self.raise(DeviceError::InvalidOperation);
            return;
        }
        object.attached.push(shader);
    }

    fn detach_shader(&mut self, program: ProgramId, shader: ShaderId) {
        let Some(object) = self.programs.get_mut(&program.raw()) else {
            self.raise(DeviceError::InvalidValue);
            return;
        };
        let before = object.attached.len();
        object.attached.retain(|&s| s != shader);
        if object.attached.len() == before {
            self.raise(DeviceError::InvalidOperation);
            return;
        }
        self.collect_shader(shader);
    }

    fn link_program(&mut self, program: ProgramId) {
        let Some(object) = self.programs.get(&program.raw()) else {
            self.raise(DeviceError::InvalidValue);
            return;
        };
        let outcome = self.link(object);
        if let Some(object) = self.programs.get_mut(&program.raw()) {
            match outcome {
                Ok(uniforms) => {
                    object.linked = true;
                    object.log.clear();
                    object.uniforms = uniforms;
                }
                Err(log) => {
                    object.linked = false;
                    object.log = log;
                    object.uniforms.clear();
                }
            }
        }
    }

    fn program_link_status(&self, program: ProgramId) -> bool {
        self.programs.get(&program.raw()).is_some_and(|p| p.linked)
    }

    fn program_info_log(&self, program: ProgramId) -> String {
        self.programs
            .get(&program.raw())
            .map(|p| p.log.clone())
            .unwrap_or_default()
    }

    fn use_program(&mut self, program: ProgramId) {
        if !program.is_none() {
            match self.programs.get(&program.raw()) {
                Some(object) if object.linked => {}
                Some(_) => return self.raise(DeviceError::InvalidOperation),
                None => return self.raise(DeviceError::InvalidValue),
            }
        }

        let previous = std::mem::replace(&mut self.current_program, program);
        if previous != program
            && self
                .programs
                .get(&previous.raw())
                .is_some_and(|p| p.delete_pending)
        {
            self.remove_program(previous);
        }
    }

    fn current_program(&self) -> ProgramId {
        self.current_program
    }

    fn delete_program(&mut self, program: ProgramId) {
        if program.is_none() {
            return;
        }
        if self.current_program == program {
            if let Some(object) = self.programs.get_mut(&program.raw()) {
                object.delete_pending = true;
            }
        } else {
            self.remove_program(program);
        }
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> UniformLocation {
        self.programs
            .get(&program.raw())
            .filter(|p| p.linked)
            .and_then(|p| p.uniforms.iter().position(|slot| slot.name == name))
            .map_or(UniformLocation::NONE, |index| UniformLocation(index as i32))
    }

    fn uniform_1i(&mut self, location: UniformLocation, value: i32) {
        self.write_uniform(location, UniformValue::Int(value));
    }

    fn uniform_1f(&mut self, location: UniformLocation, value: f32) {
        self.write_uniform(location, UniformValue::Float(value));
    }

    fn create_buffer(&mut self) -> BufferId {
        let id = self.allocate();
        self.buffers.insert(
            id,
            BufferObject {
                data: Vec::new(),
                usage: UsageHint::Static,
            },
        );
        BufferId(id)
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: BufferId) {
        if !buffer.is_none() && !self.buffers.contains_key(&buffer.raw()) {
            self.raise(DeviceError::InvalidOperation);
            return;
        }
        match target {
            BufferTarget::Array => self.array_buffer = buffer,
            BufferTarget::ElementArray => self.current_vao_mut().element_buffer = buffer,
        }
    }

    fn buffer_data(&mut self, target: BufferTarget, data: &[u8], usage: UsageHint) {
        let bound = self.bound_buffer(target);
        match self.buffers.get_mut(&bound.raw()) {
            Some(object) => {
                object.data = data.to_vec();
                object.usage = usage;
            }
            None => self.raise(DeviceError::InvalidOperation),
        }
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        if self.buffers.remove(&buffer.raw()).is_none() {
            return;
        }
        if self.array_buffer == buffer {
            self.array_buffer = BufferId::NONE;
        }
        let vao = self.current_vao_mut();
        if vao.element_buffer == buffer {
            vao.element_buffer = BufferId::NONE;
        }
    }

    fn create_vertex_array(&mut self) -> VertexArrayId {
        let id = self.allocate();
        self.vertex_arrays.insert(id, VertexArrayObject::default());
        VertexArrayId(id)
    }

    fn bind_vertex_array(&mut self, vao: VertexArrayId) {
        if self.vertex_arrays.contains_key(&vao.raw()) {
            self.vertex_array = vao;
        } else {
            self.raise(DeviceError::InvalidOperation);
        }
    }

    fn vertex_attrib_pointer(&mut self, attribute: &VertexAttribute) {
        if self.vertex_array.is_none() || self.array_buffer.is_none() {
            self.raise(DeviceError::InvalidOperation);
            return;
        }
        if !(1..=4).contains(&attribute.components) || attribute.stride < 0 {
            self.raise(DeviceError::InvalidValue);
            return;
        }
        let buffer = self.array_buffer;
        let state = self
            .current_vao_mut()
            .attributes
            .entry(attribute.location)
            .or_insert(AttributeState {
                pointer: None,
                enabled: false,
            });
        state.pointer = Some((*attribute, buffer));
    }

    fn enable_vertex_attrib_array(&mut self, location: u32) {
        if self.vertex_array.is_none() {
            self.raise(DeviceError::InvalidOperation);
            return;
        }
        self.current_vao_mut()
            .attributes
            .entry(location)
            .or_insert(AttributeState {
                pointer: None,
                enabled: false,
            })
            .enabled = true;
    }

    fn delete_vertex_array(&mut self, vao: VertexArrayId) {
        if vao.is_none() || self.vertex_arrays.remove(&vao.raw()).is_none() {
            return;
        }
        if self.vertex_array == vao {
            self.vertex_array = VertexArrayId::NONE;
        }
    }

    fn create_texture(&mut self) -> TextureId {
        let id = self.allocate();
        self.textures.insert(
            id,
            TextureObject {
                size: None,
                format: PixelFormat::Rgba8,
                pixels: Vec::new(),
                filter: TextureFilter::Linear,
                wrap: TextureWrap::Repeat,
                mipmaps: false,
            },
        );
        TextureId(id)
    }

    fn active_texture(&mut self, unit: u32) {
        if unit >= TEXTURE_UNITS {
            self.raise(DeviceError::InvalidEnum);
            return;
        }
        self.active_unit = unit;
    }

    fn bind_texture(&mut self, texture: TextureId) {
        if !texture.is_none() && !self.textures.contains_key(&texture.raw()) {
            self.raise(DeviceError::InvalidOperation);
            return;
        }
        self.unit_bindings.insert(self.active_unit, texture);
    }

    fn tex_image_2d(&mut self, width: u32, height: u32, format: PixelFormat, pixels: &[u8]) {
        let expected = width as usize * height as usize * format.bytes_per_pixel();
        if pixels.len() != expected {
            self.raise(DeviceError::InvalidValue);
            return;
        }
        match self.bound_texture_object() {
            Some(texture) => {
                texture.size = Some((width, height));
                texture.format = format;
                texture.pixels = pixels.to_vec();
                texture.mipmaps = false;
            }
            None => self.raise(DeviceError::InvalidOperation),
        }
    }

    fn tex_parameters(&mut self, filter: TextureFilter, wrap: TextureWrap) {
        match self.bound_texture_object() {
            Some(texture) => {
                texture.filter = filter;
                texture.wrap = wrap;
            }
            None => self.raise(DeviceError::InvalidOperation),
        }
    }

    fn generate_mipmap(&mut self) {
        let generated = match self.bound_texture_object() {
            Some(texture) if texture.size.is_some() => {
                texture.mipmaps = true;
                true
            }
            _ => false,
        };
        if !generated {
            self.raise(DeviceError::InvalidOperation);
        }
    }

    fn delete_texture(&mut self, texture: TextureId) {
        if self.textures.remove(&texture.raw()).is_none() {
            return;
        }
        for bound in self.unit_bindings.values_mut() {
            if *bound == texture {
                *bound = TextureId::NONE;
            }
        }
    }

    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32) {
        if width < 0 || height < 0 {
            self.raise(DeviceError::InvalidValue);
            return;
        }
        self.viewport = [x, y, width, height];
    }

    fn clear_color(&mut self, rgba: [f32; 4]) {
        self.clear_color = rgba.map(|c| c.clamp(0.0, 1.0));
    }

    fn clear(&mut self) {
        self.clears += 1;
    }

    fn draw_arrays(&mut self, mode: DrawMode, first: i32, count: i32) {
        let end = match first.checked_add(count) {
            Some(end) if first >= 0 && count >= 0 => end,
            _ => return self.raise(DeviceError::InvalidValue),
        };
        let indices = (first as u32..end as u32).collect();
        self.submit(mode, count, None, indices);
    }

    fn draw_elements(&mut self, mode: DrawMode, count: i32, index_type: IndexType, offset: usize) {
        if count < 0 {
            self.raise(DeviceError::InvalidValue);
            return;
        }
        let element_buffer = self.current_vao().element_buffer;
        let indices = self
            .buffers
            .get(&element_buffer.raw())
            .and_then(|b| draw::read_indices(&b.data, index_type, offset, count as usize));
        match indices {
            Some(indices) if !self.vertex_array.is_none() => self.submit(mode, count, Some(index_type), indices),
            _ => self.raise(DeviceError::InvalidOperation),
        }
    }

    fn take_error(&mut self) -> Option<DeviceError> {
        self.errors.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERTEX: &str = "#version 330 core
layout (location = 0) in vec3 aPos;
out vec3 tint;
uniform float scale;
void main() { gl_Position = vec4(aPos * scale, 1.0); tint = aPos; }
";
    const FRAGMENT: &str = "#version 330 core
in vec3 tint;
out vec4 color;
uniform float scale;
uniform vec3 offset;
void main() { color = vec4(tint + offset, scale); }
";

    fn compiled(dev: &mut HeadlessDevice, kind: StageKind, src: &str) -> ShaderId {
        let shader = dev.create_shader(kind);
        dev.shader_source(shader, src);
        dev.compile_shader(shader);
        assert!(dev.shader_compile_status(shader), "{}", dev.shader_info_log(shader));
        shader
    }

    fn linked(dev: &mut HeadlessDevice) -> ProgramId {
        let vs = compiled(dev, StageKind::Vertex, VERTEX);
        let fs = compiled(dev, StageKind::Fragment, FRAGMENT);
        let program = dev.create_program();
        dev.attach_shader(program, vs);
        dev.attach_shader(program, fs);
        dev.link_program(program);
        assert!(dev.program_link_status(program), "{}", dev.program_info_log(program));
        dev.delete_shader(vs);
        dev.delete_shader(fs);
        program
    }

    #[test]
    fn deleting_attached_shader_is_deferred() {
        let mut dev = HeadlessDevice::new();
        let vs = compiled(&mut dev, StageKind::Vertex, VERTEX);
        let program = dev.create_program();
        dev.attach_shader(program, vs);
        dev.delete_shader(vs);
        assert_eq!(dev.live_shaders(), 1);
        dev.detach_shader(program, vs);
        assert_eq!(dev.live_shaders(), 0);
    }

    #[test]
    fn shared_uniforms_get_one_location() {
        let mut dev = HeadlessDevice::new();
        let program = linked(&mut dev);
        assert_eq!(dev.uniform_location(program, "scale"), UniformLocation(0));
        assert_eq!(dev.uniform_location(program, "offset"), UniformLocation(1));
        assert_eq!(dev.uniform_location(program, "tint"), UniformLocation::NONE);
    }

    #[test]
    fn uniform_type_mismatch_raises() {
        let mut dev = HeadlessDevice::new();
        let program = linked(&mut dev);
        dev.use_program(program);
        dev.uniform_1i(UniformLocation(0), 1);
        assert_eq!(dev.take_error(), Some(DeviceError::InvalidOperation));
        dev.uniform_1f(UniformLocation(1), 1.0);
        assert_eq!(dev.take_error(), Some(DeviceError::InvalidOperation));
        assert_eq!(dev.uniform_value(program, "scale"), Some(UniformValue::Float(0.0)));
        assert_eq!(dev.uniform_value(program, "offset"), None);
    }

    #[test]
    fn uniform_write_needs_a_current_program() {
        let mut dev = HeadlessDevice::new();
        dev.uniform_1f(UniformLocation::NONE, 1.0);
        assert_eq!(dev.take_error(), Some(DeviceError::InvalidOperation));
    }

    #[test]
    fn conflicting_uniform_types_fail_to_link() {
        let mut dev = HeadlessDevice::new();
        let vs = compiled(&mut dev, StageKind::Vertex, VERTEX);
        let fs = compiled(
            &mut dev,
            StageKind::Fragment,
            "#version 330 core\nin vec3 tint;\nout vec4 color;\nuniform int scale;\nvoid main() { color = vec4(tint, 1.0); }",
        );
        let program = dev.create_program();
        dev.attach_shader(program, vs);
        dev.attach_shader(program, fs);
        dev.link_program(program);
        assert!(!dev.program_link_status(program));
        assert!(dev.program_info_log(program).contains("scale"));
    }

    #[test]
    fn missing_main_fails_to_link() {
        let mut dev = HeadlessDevice::new();
        let vs = compiled(&mut dev, StageKind::Vertex, VERTEX);
        let fs = compiled(&mut dev, StageKind::Fragment, "#version 330 core\nout vec4 color;\n");
        let program = dev.create_program();
        dev.attach_shader(program, vs);
        dev.attach_shader(program, fs);
        dev.link_program(program);
        assert!(dev.program_info_log(program).contains("main"));
        dev.use_program(program);
        assert_eq!(dev.take_error(), Some(DeviceError::InvalidOperation));
    }

    #[test]
    fn deleting_current_program_waits_for_unbind() {
        let mut dev = HeadlessDevice::new();
        let program = linked(&mut dev);
        dev.use_program(program);
        dev.delete_program(program);
        assert_eq!(dev.live_programs(), 1);
        dev.use_program(ProgramId::NONE);
        assert_eq!(dev.live_programs(), 0);
    }

    #[test]
    fn draw_arrays_reads_through_pointers() {
        let mut dev = HeadlessDevice::new();
        let program = linked(&mut dev);
        let vao = dev.create_vertex_array();
        dev.bind_vertex_array(vao);
        let vbo = dev.create_buffer();
        dev.bind_buffer(BufferTarget::Array, vbo);
        let data = [0.0f32, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        dev.buffer_data(BufferTarget::Array, bytemuck::cast_slice(&data), UsageHint::Static);
        dev.vertex_attrib_pointer(&VertexAttribute::floats(0, 3, 3, 0));
        dev.enable_vertex_attrib_array(0);
        dev.use_program(program);

        dev.draw_arrays(DrawMode::Triangles, 0, 3);
        assert_eq!(dev.take_error(), None);
        assert_eq!(dev.draw_calls()[0].attributes[&0], data);

        // Reading a fourth vertex runs off the end of the buffer.
        dev.draw_arrays(DrawMode::Triangles, 1, 3);
        assert_eq!(dev.take_error(), Some(DeviceError::InvalidOperation));
        assert_eq!(dev.draw_calls().len(), 1);
    }

    #[test]
    fn draw_range_past_i32_max_is_rejected() {
        let mut dev = HeadlessDevice::new();
        let program = linked(&mut dev);
        let vao = dev.create_vertex_array();
        dev.bind_vertex_array(vao);
        let vbo = dev.create_buffer();
        dev.bind_buffer(BufferTarget::Array, vbo);
        dev.buffer_data(BufferTarget::Array, bytemuck::cast_slice(&[0.0f32; 9]), UsageHint::Static);
        dev.vertex_attrib_pointer(&VertexAttribute::floats(0, 3, 3, 0));
        dev.enable_vertex_attrib_array(0);
        dev.use_program(program);

        dev.draw_arrays(DrawMode::Triangles, i32::MAX - 1, 3);
        assert_eq!(dev.take_error(), Some(DeviceError::InvalidValue));
        dev.draw_arrays(DrawMode::Triangles, -1, 3);
        assert_eq!(dev.take_error(), Some(DeviceError::InvalidValue));
        assert!(dev.draw_calls().is_empty());
    }

    #[test]
    fn shader_keeps_its_source_text() {
        let mut dev = HeadlessDevice::new();
        let shader = compiled(&mut dev, StageKind::Vertex, VERTEX);
        assert_eq!(dev.shader_text(shader), Some(VERTEX));
        dev.delete_shader(shader);
        assert_eq!(dev.shader_text(shader), None);
    }

    #[test]
    fn viewport_rejects_negative_size() {
        let mut dev = HeadlessDevice::new();
        dev.viewport(0, 0, 800, 600);
        assert_eq!(dev.viewport_rect(), [0, 0, 800, 600]);
        dev.viewport(10, 10, -1, 600);
        assert_eq!(dev.take_error(), Some(DeviceError::InvalidValue));
        assert_eq!(dev.viewport_rect(), [0, 0, 800, 600]);
    }

    #[test]
    fn pointer_requires_array_buffer() {
        let mut dev = HeadlessDevice::new();
        let vao = dev.create_vertex_array();
        dev.bind_vertex_array(vao);
        dev.vertex_attrib_pointer(&VertexAttribute::floats(0, 3, 3, 0));
        assert_eq!(dev.take_error(), Some(DeviceError::InvalidOperation));
    }

    #[test]
    fn texture_upload_checks_size() {
        let mut dev = HeadlessDevice::new();
        let texture = dev.create_texture();
        dev.bind_texture(texture);
        dev.tex_image_2d(2, 2, PixelFormat::Rgb8, &[0; 11]);
        assert_eq!(dev.take_error(), Some(DeviceError::InvalidValue));
        dev.tex_image_2d(2, 2, PixelFormat::Rgb8, &[0; 12]);
        assert_eq!(dev.texture_size(texture), Some((2, 2)));
        dev.active_texture(TEXTURE_UNITS);
        assert_eq!(dev.take_error(), Some(DeviceError::InvalidEnum));
    }

    #[test]
    fn handles_are_never_reused() {
        let mut dev = HeadlessDevice::new();
        let a = dev.create_buffer();
        dev.delete_buffer(a);
        let b = dev.create_buffer();
        assert_ne!(a, b);
        assert!(!a.is_none());
    }

    #[test]
    fn clear_records_color() {
        let mut dev = HeadlessDevice::new();
        dev.clear_color([0.2, 0.3, 1.5, 1.0]);
        dev.clear();
        assert_eq!(dev.clear_color_value(), [0.2, 0.3, 1.0, 1.0]);
        assert_eq!(dev.clear_count(), 1);
    }
}
