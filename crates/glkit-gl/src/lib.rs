//! OpenGL backend for `glkit-core`.
//!
//! - [`GlDevice`] implements [`glkit_core::GraphicsDevice`] over the `gl`
//!   crate.
//! - [`run`] opens a window with glium's glutin backend and drives a
//!   [`glkit_core::Demo`] until the window closes.
//! - [`logging::init`] installs the `tracing` subscriber the binaries use.
//!
//! ### Warning
//!
//! glium owns the window and context but never draws; every GL call after
//! context creation goes through [`GlDevice`]. glium's internal state cache
//! is therefore stale and must not be used to render alongside it.

pub mod device;
pub mod glsl;
pub mod host;
mod loader;
pub mod logging;
pub mod state;

pub use device::GlDevice;
pub use host::{run, HostConfig};
pub use loader::is_loaded;
