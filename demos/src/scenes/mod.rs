//! One [`glkit_core::Demo`] per tutorial step.

pub mod clear;
pub mod mesh;
pub mod quad;
pub mod shader_class;
pub mod textured;
pub mod triangle;

pub use clear::ClearScene;
pub use mesh::IndexedMesh;
pub use quad::QuadScene;
pub use shader_class::ShaderClassScene;
pub use textured::TexturedScene;
pub use triangle::TriangleScene;
