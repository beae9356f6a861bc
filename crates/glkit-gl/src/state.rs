//! Inspect and reset the state of the current OpenGL context.

use std::ffi::CStr;

use gl::types::GLenum;

/// Driver identification strings of the current context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextInfo {
    pub vendor: String,
    pub renderer: String,
    pub version: String,
    pub glsl_version: String,
}

fn gl_string(name: GLenum) -> Option<String> {
    unsafe {
        let ptr = gl::GetString(name);
        if ptr.is_null() {
            return None;
        }
        Some(CStr::from_ptr(ptr.cast()).to_string_lossy().into_owned())
    }
}

/// Whether a context with loaded entry points is current on this thread.
pub fn is_context_current() -> bool {
    crate::loader::is_loaded() && gl_string(gl::VERSION).is_some()
}

/// Query the driver strings, or `None` without a current context.
pub fn context_info() -> Option<ContextInfo> {
    if !crate::loader::is_loaded() {
        return None;
    }
    Some(ContextInfo {
        vendor: gl_string(gl::VENDOR)?,
        renderer: gl_string(gl::RENDERER)?,
        version: gl_string(gl::VERSION)?,
        glsl_version: gl_string(gl::SHADING_LANGUAGE_VERSION)?,
    })
}

/// Unbind every program, texture, buffer and vertex array.
///
/// Objects stay alive; only the bindings are cleared. The element buffer
/// binding belongs to the vertex array and is left alone.
///
/// # Safety
///
/// Must be called with a valid OpenGL context current.
pub unsafe fn reset_bindings() {
    gl::UseProgram(0);

    let mut units = 0;
    gl::GetIntegerv(gl::MAX_COMBINED_TEXTURE_IMAGE_UNITS, &mut units);
    for unit in 0..units.max(0) as u32 {
        gl::ActiveTexture(gl::TEXTURE0 + unit);
        gl::BindTexture(gl::TEXTURE_2D, 0);
    }
    gl::ActiveTexture(gl::TEXTURE0);

    gl::BindVertexArray(0);
    gl::BindBuffer(gl::ARRAY_BUFFER, 0);
}
