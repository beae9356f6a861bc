//! A vertex-colored triangle whose brightness follows a `time` uniform,
//! with both shader stages loaded from files through [`ShaderProgram`].

use std::path::PathBuf;

use glkit_core::device::DrawMode;
use glkit_core::{
    Demo, FrameInput, GeometryBuffer, GraphicsDevice, ShaderProgram, VertexAttribute, VertexLayout,
};

use crate::shader_path;

#[rustfmt::skip]
pub const VERTICES: [f32; 18] = [
    // positions       // colors
     0.5, -0.5, 0.0,   1.0, 0.0, 0.0,
    -0.5, -0.5, 0.0,   0.0, 1.0, 0.0,
     0.0,  0.5, 0.0,   0.0, 0.0, 1.0,
];

fn upload_triangle<D: GraphicsDevice + ?Sized>(device: &mut D) -> glkit_core::Result<(VertexLayout, GeometryBuffer)> {
    let mut layout = VertexLayout::create(device)?;
    let vertices = GeometryBuffer::vertices(device, &VERTICES)?;
    layout.attach_buffer(device, &vertices, VertexAttribute::floats(0, 3, 6, 0))?;
    layout.attach_buffer(device, &vertices, VertexAttribute::floats(1, 3, 6, 3))?;
    layout.unbind(device);
    vertices.unbind(device);
    Ok((layout, vertices))
}

#[derive(Debug)]
struct Resources {
    program: ShaderProgram,
    layout: VertexLayout,
    vertices: GeometryBuffer,
}

#[derive(Debug)]
pub struct ShaderClassScene {
    vertex_path: PathBuf,
    fragment_path: PathBuf,
    resources: Option<Resources>,
}

impl Default for ShaderClassScene {
    fn default() -> Self {
        Self::new(shader_path("shader_class.vert"), shader_path("shader_class.frag"))
    }
}

impl ShaderClassScene {
    pub fn new(vertex_path: impl Into<PathBuf>, fragment_path: impl Into<PathBuf>) -> Self {
        Self {
            vertex_path: vertex_path.into(),
            fragment_path: fragment_path.into(),
            resources: None,
        }
    }

    pub fn program(&self) -> Option<&ShaderProgram> {
        self.resources.as_ref().map(|r| &r.program)
    }
}

impl Demo for ShaderClassScene {
    fn init(&mut self, device: &mut dyn GraphicsDevice) -> glkit_core::Result<()> {
        let mut program = ShaderProgram::from_files(&self.vertex_path, &self.fragment_path)?;
        program.build(device)?;

        match upload_triangle(device) {
            Ok((layout, vertices)) => {
                self.resources = Some(Resources {
                    program,
                    layout,
                    vertices,
                });
                Ok(())
            }
            Err(e) => {
                program.destroy(device);
                Err(e)
            }
        }
    }

    fn frame(&mut self, device: &mut dyn GraphicsDevice, input: &FrameInput) -> glkit_core::Result<()> {
        let Some(res) = &mut self.resources else {
            return Ok(());
        };
        res.program.set_float(device, "time", input.elapsed.as_secs_f32())?;
        res.layout.bind(device);
        device.draw_arrays(DrawMode::Triangles, 0, 3);
        Ok(())
    }

    fn shutdown(&mut self, device: &mut dyn GraphicsDevice) {
        if let Some(mut res) = self.resources.take() {
            res.program.destroy(device);
            res.layout.destroy(device);
            res.vertices.destroy(device);
        }
    }
}
