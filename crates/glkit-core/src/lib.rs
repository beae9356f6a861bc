//! Thin wrappers over the OpenGL 3.3 core object model.
//!
//! The wrappers never own a context. Each operation takes the device it runs
//! on as an explicit `&mut D where D: GraphicsDevice`, so the binding order a
//! caller writes is the binding order the driver sees.
//!
//! # Overview
//!
//! - [`ShaderProgram`] compiles and links a vertex + fragment pair and
//!   writes scalar uniforms.
//! - [`GeometryBuffer`] uploads vertex or index data once.
//! - [`VertexLayout`] records how buffer bytes feed shader inputs, and which
//!   element buffer indexed draws read.
//! - [`Texture`] decodes an image file into a sampled 2D texture.
//! - [`Demo`] is what a windowed program implements to be driven by a host
//!   loop such as `glkit_gl::run`.
//! - [`headless::HeadlessDevice`] runs all of the above without a GPU.

pub mod buffer;
pub mod demo;
pub mod device;
pub mod error;
pub mod glsl;
pub mod headless;
pub mod layout;
pub mod shader;
pub mod texture;

// Re-export primary types at crate root for convenience.
pub use buffer::GeometryBuffer;
pub use demo::{Demo, FrameInput};
pub use device::{
    drain_errors, BufferId, BufferTarget, DeviceError, DrawMode, GraphicsDevice, IndexType, ProgramId,
    StageKind, UsageHint, VertexArrayId, VertexAttribute,
};
pub use error::{Error, ObjectKind, Result};
pub use layout::VertexLayout;
pub use shader::{compile_stage, link_stages, ProgramState, ShaderProgram, ShaderSources, Uniform};
pub use texture::{Texture, TextureOptions};
