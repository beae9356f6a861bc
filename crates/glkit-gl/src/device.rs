//! [`GlDevice`]: the device trait over a live OpenGL 3.3 core context.

use std::ffi::{c_void, CString};
use std::marker::PhantomData;
use std::ptr;

use gl::types::{GLchar, GLenum, GLint, GLsizei, GLsizeiptr, GLuint};
use glkit_core::device::{
    BufferId, BufferTarget, DeviceError, DrawMode, ElementType, GraphicsDevice, IndexType, PixelFormat,
    ProgramId, ShaderId, StageKind, TextureFilter, TextureId, TextureWrap, UniformLocation, UsageHint,
    VertexArrayId, VertexAttribute,
};

use crate::loader;

/// Forwards every [`GraphicsDevice`] call to the `gl` crate.
///
/// The context belongs to the thread that made it current, so the device is
/// neither `Send` nor `Sync`.
#[derive(Debug)]
pub struct GlDevice {
    _not_send: PhantomData<*const ()>,
}

impl GlDevice {
    /// Load GL entry points (once per process) and wrap the current context.
    ///
    /// # Safety
    ///
    /// An OpenGL 3.3 (or newer) core context must be current on this thread
    /// for as long as the device is used, and only on this thread.
    pub unsafe fn new() -> Self {
        loader::load_gl();
        Self {
            _not_send: PhantomData,
        }
    }
}

pub(crate) fn stage_enum(kind: StageKind) -> GLenum {
    match kind {
        StageKind::Vertex => gl::VERTEX_SHADER,
        StageKind::Fragment => gl::FRAGMENT_SHADER,
    }
}

pub(crate) fn target_enum(target: BufferTarget) -> GLenum {
    match target {
        BufferTarget::Array => gl::ARRAY_BUFFER,
        BufferTarget::ElementArray => gl::ELEMENT_ARRAY_BUFFER,
    }
}

pub(crate) fn usage_enum(usage: UsageHint) -> GLenum {
    match usage {
        UsageHint::Static => gl::STATIC_DRAW,
        UsageHint::Dynamic => gl::DYNAMIC_DRAW,
        UsageHint::Stream => gl::STREAM_DRAW,
    }
}

pub(crate) fn element_enum(ty: ElementType) -> GLenum {
    match ty {
        ElementType::Byte => gl::BYTE,
        ElementType::UnsignedByte => gl::UNSIGNED_BYTE,
        ElementType::Short => gl::SHORT,
        ElementType::UnsignedShort => gl::UNSIGNED_SHORT,
        ElementType::Int => gl::INT,
        ElementType::UnsignedInt => gl::UNSIGNED_INT,
        ElementType::Float => gl::FLOAT,
    }
}

pub(crate) fn index_enum(ty: IndexType) -> GLenum {
    match ty {
        IndexType::UnsignedByte => gl::UNSIGNED_BYTE,
        IndexType::UnsignedShort => gl::UNSIGNED_SHORT,
        IndexType::UnsignedInt => gl::UNSIGNED_INT,
    }
}

pub(crate) fn mode_enum(mode: DrawMode) -> GLenum {
    match mode {
        DrawMode::Points => gl::POINTS,
        DrawMode::Lines => gl::LINES,
        DrawMode::LineStrip => gl::LINE_STRIP,
        DrawMode::Triangles => gl::TRIANGLES,
        DrawMode::TriangleStrip => gl::TRIANGLE_STRIP,
        DrawMode::TriangleFan => gl::TRIANGLE_FAN,
    }
}

/// `(internal format, pixel format)` for an 8-bit-per-channel upload.
pub(crate) fn pixel_enums(format: PixelFormat) -> (GLenum, GLenum) {
    match format {
        PixelFormat::Rgb8 => (gl::RGB8, gl::RGB),
        PixelFormat::Rgba8 => (gl::RGBA8, gl::RGBA),
    }
}

pub(crate) fn wrap_enum(wrap: TextureWrap) -> GLenum {
    match wrap {
        TextureWrap::Repeat => gl::REPEAT,
        TextureWrap::MirroredRepeat => gl::MIRRORED_REPEAT,
        TextureWrap::ClampToEdge => gl::CLAMP_TO_EDGE,
    }
}

/// `(mag / non-mipmapped min filter, mipmapped min filter)`.
pub(crate) fn filter_enums(filter: TextureFilter) -> (GLenum, GLenum) {
    match filter {
        TextureFilter::Nearest => (gl::NEAREST, gl::NEAREST_MIPMAP_NEAREST),
        TextureFilter::Linear => (gl::LINEAR, gl::LINEAR_MIPMAP_LINEAR),
    }
}

/// Map a `glGetError` code. `GL_NO_ERROR` maps to `None`.
pub(crate) fn error_from_code(code: GLenum) -> Option<DeviceError> {
    match code {
        gl::NO_ERROR => None,
        gl::INVALID_ENUM => Some(DeviceError::InvalidEnum),
        gl::INVALID_VALUE => Some(DeviceError::InvalidValue),
        gl::INVALID_OPERATION => Some(DeviceError::InvalidOperation),
        gl::OUT_OF_MEMORY => Some(DeviceError::OutOfMemory),
        gl::INVALID_FRAMEBUFFER_OPERATION => Some(DeviceError::InvalidFramebufferOperation),
        other => Some(DeviceError::Unknown(other)),
    }
}

/// Shared body of `glGetShaderInfoLog` / `glGetProgramInfoLog`.
unsafe fn info_log(
    object: GLuint,
    get_iv: unsafe fn(GLuint, GLenum, *mut GLint),
    get_log: unsafe fn(GLuint, GLsizei, *mut GLsizei, *mut GLchar),
) -> String {
    let mut len: GLint = 0;
    get_iv(object, gl::INFO_LOG_LENGTH, &mut len);
    if len <= 0 {
        return String::new();
    }

    let mut buf = vec![0u8; len as usize];
    let mut written: GLsizei = 0;
    get_log(object, len, &mut written, buf.as_mut_ptr().cast());
    buf.truncate(written.max(0) as usize);
    String::from_utf8_lossy(&buf).into_owned()
}

impl GraphicsDevice for GlDevice {
    fn create_shader(&mut self, kind: StageKind) -> ShaderId {
        ShaderId(unsafe { gl::CreateShader(stage_enum(kind)) })
    }

    fn shader_source(&mut self, shader: ShaderId, source: &str) {
        let ptr = source.as_ptr().cast::<GLchar>();
        let len = source.len() as GLint;
        unsafe { gl::ShaderSource(shader.raw(), 1, &ptr, &len) };
    }

    fn compile_shader(&mut self, shader: ShaderId) {
        unsafe { gl::CompileShader(shader.raw()) };
    }

    fn shader_compile_status(&self, shader: ShaderId) -> bool {
        let mut status = GLint::from(gl::FALSE);
        unsafe { gl::GetShaderiv(shader.raw(), gl::COMPILE_STATUS, &mut status) };
        status == GLint::from(gl::TRUE)
    }

    fn shader_info_log(&self, shader: ShaderId) -> String {
        unsafe { info_log(shader.raw(), gl::GetShaderiv, gl::GetShaderInfoLog) }
    }

    fn delete_shader(&mut self, shader: ShaderId) {
        unsafe { gl::DeleteShader(shader.raw()) };
    }

    fn create_program(&mut self) -> ProgramId {
        ProgramId(unsafe { gl::CreateProgram() })
    }

    fn attach_shader(&mut self, program: ProgramId, shader: ShaderId) {
        unsafe { gl::AttachShader(program.raw(), shader.raw()) };
    }

    fn detach_shader(&mut self, program: ProgramId, shader: ShaderId) {
        unsafe { gl::DetachShader(program.raw(), shader.raw()) };
    }

    fn link_program(&mut self, program: ProgramId) {
        unsafe { gl::LinkProgram(program.raw()) };
    }

    fn program_link_status(&self, program: ProgramId) -> bool {
        let mut status = GLint::from(gl::FALSE);
        unsafe { gl::GetProgramiv(program.raw(), gl::LINK_STATUS, &mut status) };
        status == GLint::from(gl::TRUE)
    }

    fn program_info_log(&self, program: ProgramId) -> String {
        unsafe { info_log(program.raw(), gl::GetProgramiv, gl::GetProgramInfoLog) }
    }

    fn use_program(&mut self, program: ProgramId) {
        unsafe { gl::UseProgram(program.raw()) };
    }

    fn current_program(&self) -> ProgramId {
        let mut current: GLint = 0;
        unsafe { gl::GetIntegerv(gl::CURRENT_PROGRAM, &mut current) };
        ProgramId(current as GLuint)
    }

    fn delete_program(&mut self, program: ProgramId) {
        unsafe { gl::DeleteProgram(program.raw()) };
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> UniformLocation {
        // A name with an interior NUL can never match an active uniform.
        let Ok(name) = CString::new(name) else {
            return UniformLocation::NONE;
        };
        UniformLocation(unsafe { gl::GetUniformLocation(program.raw(), name.as_ptr()) })
    }

    fn uniform_1i(&mut self, location: UniformLocation, value: i32) {
        unsafe { gl::Uniform1i(location.0, value) };
    }

    fn uniform_1f(&mut self, location: UniformLocation, value: f32) {
        unsafe { gl::Uniform1f(location.0, value) };
    }

    fn create_buffer(&mut self) -> BufferId {
        let mut id: GLuint = 0;
        unsafe { gl::GenBuffers(1, &mut id) };
        BufferId(id)
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: BufferId) {
        unsafe { gl::BindBuffer(target_enum(target), buffer.raw()) };
    }

    fn buffer_data(&mut self, target: BufferTarget, data: &[u8], usage: UsageHint) {
        let ptr = if data.is_empty() {
            ptr::null()
        } else {
            data.as_ptr().cast::<c_void>()
        };
        unsafe {
            gl::BufferData(
                target_enum(target),
                data.len() as GLsizeiptr,
                ptr,
                usage_enum(usage),
            )
        };
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        unsafe { gl::DeleteBuffers(1, &buffer.raw()) };
    }

    fn create_vertex_array(&mut self) -> VertexArrayId {
        let mut id: GLuint = 0;
        unsafe { gl::GenVertexArrays(1, &mut id) };
        VertexArrayId(id)
    }

    fn bind_vertex_array(&mut self, vao: VertexArrayId) {
        unsafe { gl::BindVertexArray(vao.raw()) };
    }

    fn vertex_attrib_pointer(&mut self, attribute: &VertexAttribute) {
        let normalized = if attribute.normalized { gl::TRUE } else { gl::FALSE };
        unsafe {
            gl::VertexAttribPointer(
                attribute.location,
                attribute.components,
                element_enum(attribute.element_type),
                normalized,
                attribute.stride,
                // Byte offset into the bound ARRAY_BUFFER, passed as a pointer.
                attribute.offset as *const c_void,
            )
        };
    }

    fn enable_vertex_attrib_array(&mut self, location: u32) {
        unsafe { gl::EnableVertexAttribArray(location) };
    }

    fn delete_vertex_array(&mut self, vao: VertexArrayId) {
        unsafe { gl::DeleteVertexArrays(1, &vao.raw()) };
    }

    fn create_texture(&mut self) -> TextureId {
        let mut id: GLuint = 0;
        unsafe { gl::GenTextures(1, &mut id) };
        TextureId(id)
    }

    fn active_texture(&mut self, unit: u32) {
        unsafe { gl::ActiveTexture(gl::TEXTURE0 + unit) };
    }

    fn bind_texture(&mut self, texture: TextureId) {
        unsafe { gl::BindTexture(gl::TEXTURE_2D, texture.raw()) };
    }

    fn tex_image_2d(&mut self, width: u32, height: u32, format: PixelFormat, pixels: &[u8]) {
        let (internal, layout) = pixel_enums(format);
        unsafe {
            // Rows of RGB8 data are not 4-byte aligned.
            gl::PixelStorei(gl::UNPACK_ALIGNMENT, 1);
            gl::TexImage2D(
                gl::TEXTURE_2D,
                0,
                internal as GLint,
                width as GLsizei,
                height as GLsizei,
                0,
                layout,
                gl::UNSIGNED_BYTE,
                pixels.as_ptr().cast(),
            );
            gl::PixelStorei(gl::UNPACK_ALIGNMENT, 4);
        }
    }

    fn tex_parameters(&mut self, filter: TextureFilter, wrap: TextureWrap) {
        let (filter, _) = filter_enums(filter);
        let wrap = wrap_enum(wrap) as GLint;
        unsafe {
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_S, wrap);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_T, wrap);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MIN_FILTER, filter as GLint);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MAG_FILTER, filter as GLint);
        }
    }

    fn generate_mipmap(&mut self) {
        unsafe {
            gl::GenerateMipmap(gl::TEXTURE_2D);

            // Switch the min filter to its mipmapped variant now that the
            // levels exist; before that the texture would be incomplete.
            let mut mag: GLint = 0;
            gl::GetTexParameteriv(gl::TEXTURE_2D, gl::TEXTURE_MAG_FILTER, &mut mag);
            let filter = if mag as GLenum == gl::NEAREST {
                TextureFilter::Nearest
            } else {
                TextureFilter::Linear
            };
            let (_, min) = filter_enums(filter);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MIN_FILTER, min as GLint);
        }
    }

    fn delete_texture(&mut self, texture: TextureId) {
        unsafe { gl::DeleteTextures(1, &texture.raw()) };
    }

    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32) {
        unsafe { gl::Viewport(x, y, width, height) };
    }

    fn clear_color(&mut self, rgba: [f32; 4]) {
        let [r, g, b, a] = rgba;
        unsafe { gl::ClearColor(r, g, b, a) };
    }

    fn clear(&mut self) {
        unsafe { gl::Clear(gl::COLOR_BUFFER_BIT) };
    }

    fn draw_arrays(&mut self, mode: DrawMode, first: i32, count: i32) {
        unsafe { gl::DrawArrays(mode_enum(mode), first, count) };
    }

    fn draw_elements(&mut self, mode: DrawMode, count: i32, index_type: IndexType, offset: usize) {
        unsafe {
            gl::DrawElements(
                mode_enum(mode),
                count,
                index_enum(index_type),
                offset as *const c_void,
            )
        };
    }

    fn take_error(&mut self) -> Option<DeviceError> {
        error_from_code(unsafe { gl::GetError() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_map_to_device_errors() {
        assert_eq!(error_from_code(gl::NO_ERROR), None);
        assert_eq!(error_from_code(gl::INVALID_OPERATION), Some(DeviceError::InvalidOperation));
        assert_eq!(error_from_code(gl::OUT_OF_MEMORY), Some(DeviceError::OutOfMemory));
        assert_eq!(error_from_code(0x0503), Some(DeviceError::Unknown(0x0503)));
    }

    #[test]
    fn enums_match_gl_constants() {
        assert_eq!(stage_enum(StageKind::Vertex), 0x8B31);
        assert_eq!(stage_enum(StageKind::Fragment), 0x8B30);
        assert_eq!(target_enum(BufferTarget::ElementArray), 0x8893);
        assert_eq!(usage_enum(UsageHint::Static), 0x88E4);
        assert_eq!(index_enum(IndexType::UnsignedInt), 0x1405);
        assert_eq!(mode_enum(DrawMode::Triangles), 0x0004);
    }

    #[test]
    fn mipmapped_filters() {
        assert_eq!(
            filter_enums(TextureFilter::Linear),
            (gl::LINEAR, gl::LINEAR_MIPMAP_LINEAR)
        );
        assert_eq!(pixel_enums(PixelFormat::Rgb8), (gl::RGB8, gl::RGB));
    }
}
