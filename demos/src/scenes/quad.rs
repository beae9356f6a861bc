//! Two triangles sharing four vertices through an element buffer.

use std::path::PathBuf;

use glkit_core::{Demo, FrameInput, GraphicsDevice, ShaderProgram, VertexAttribute};

use super::mesh::IndexedMesh;
use crate::shader_path;

#[rustfmt::skip]
pub const VERTICES: [f32; 24] = [
    // positions         // colors
    -0.5, -0.5, 0.0,     1.0, 0.0, 0.0, // lower left
    -0.5,  0.5, 0.0,     0.0, 1.0, 0.0, // upper left
     0.5,  0.5, 0.0,     0.0, 0.0, 1.0, // upper right
     0.5, -0.5, 0.0,     1.0, 1.0, 1.0, // lower right
];

pub const INDICES: [u32; 6] = [
    0, 2, 1, // upper triangle
    0, 3, 2, // lower triangle
];

pub const ATTRIBUTES: [VertexAttribute; 2] = [
    VertexAttribute::floats(0, 3, 6, 0),
    VertexAttribute::floats(1, 3, 6, 3),
];

#[derive(Debug)]
pub struct QuadScene {
    vertex_path: PathBuf,
    fragment_path: PathBuf,
    resources: Option<(ShaderProgram, IndexedMesh)>,
}

impl Default for QuadScene {
    fn default() -> Self {
        Self::new(shader_path("quad.vert"), shader_path("quad.frag"))
    }
}

impl QuadScene {
    pub fn new(vertex_path: impl Into<PathBuf>, fragment_path: impl Into<PathBuf>) -> Self {
        Self {
            vertex_path: vertex_path.into(),
            fragment_path: fragment_path.into(),
            resources: None,
        }
    }
}

impl Demo for QuadScene {
    fn init(&mut self, device: &mut dyn GraphicsDevice) -> glkit_core::Result<()> {
        let mut program = ShaderProgram::from_files(&self.vertex_path, &self.fragment_path)?;
        program.build(device)?;

        match IndexedMesh::new(device, &VERTICES, &INDICES, &ATTRIBUTES) {
            Ok(mesh) => {
                self.resources = Some((program, mesh));
                Ok(())
            }
            Err(e) => {
                program.destroy(device);
                Err(e)
            }
        }
    }

    fn frame(&mut self, device: &mut dyn GraphicsDevice, _input: &FrameInput) -> glkit_core::Result<()> {
        let Some((program, mesh)) = &mut self.resources else {
            return Ok(());
        };
        program.activate(device)?;
        mesh.draw(device);
        Ok(())
    }

    fn shutdown(&mut self, device: &mut dyn GraphicsDevice) {
        if let Some((mut program, mesh)) = self.resources.take() {
            program.destroy(device);
            mesh.destroy(device);
        }
    }
}
