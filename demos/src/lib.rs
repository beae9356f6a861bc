//! The tutorial programs, one scene per step, plus the command line they
//! share.
//!
//! Every scene implements [`glkit_core::Demo`], so the binaries run them in a
//! window through [`glkit_gl::run`] and the tests run them against
//! [`glkit_core::headless::HeadlessDevice`].

use std::path::PathBuf;

pub mod cli;
pub mod scenes;

/// Path of a GLSL file shipped in this crate's `shaders/` directory.
pub fn shader_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("shaders").join(name)
}
