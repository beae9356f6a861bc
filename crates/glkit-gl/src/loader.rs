//! Loading of GL function pointers for the `gl` crate.

use std::sync::Once;

static GL_INIT_ONCE: Once = Once::new();

/// Resolve every `gl::*` entry point through the system GL library.
///
/// Runs at most once per process. A context must be current on the calling
/// thread for the pointers to be usable, but not for them to be loaded.
pub(crate) fn load_gl() {
    GL_INIT_ONCE.call_once(|| {
        gl_loader::init_gl();
        gl::load_with(|s| gl_loader::get_proc_address(s).cast());
        tracing::debug!("GL entry points loaded");
    });
}

/// Whether [`load_gl`] has completed.
pub fn is_loaded() -> bool {
    GL_INIT_ONCE.is_completed()
}
