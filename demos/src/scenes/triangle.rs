//! A single triangle from shader strings compiled and linked by hand.

use glkit_core::device::{DrawMode, ProgramId, StageKind};
use glkit_core::{
    compile_stage, link_stages, Demo, FrameInput, GeometryBuffer, GraphicsDevice, VertexAttribute, VertexLayout,
};
use tracing::debug;

pub const VERTEX_SHADER: &str = "#version 330 core
layout (location = 0) in vec3 aPos;
void main()
{
    gl_Position = vec4(aPos.x, aPos.y, aPos.z, 1.0);
}
";

pub const FRAGMENT_SHADER: &str = "#version 330 core
out vec4 FragColor;
void main()
{
    FragColor = vec4(1.0, 0.5, 0.2, 1.0);
}
";

#[rustfmt::skip]
pub const VERTICES: [f32; 9] = [
    -0.5, -0.5, 0.0,
     0.5, -0.5, 0.0,
     0.0,  0.5, 0.0,
];

fn upload_triangle(device: &mut dyn GraphicsDevice) -> glkit_core::Result<(VertexLayout, GeometryBuffer)> {
    let mut layout = VertexLayout::create(device)?;
    let vertices = GeometryBuffer::vertices(device, &VERTICES)?;
    layout.attach_buffer(device, &vertices, VertexAttribute::floats(0, 3, 3, 0))?;
    layout.unbind(device);
    vertices.unbind(device);
    Ok((layout, vertices))
}

#[derive(Debug)]
struct Resources {
    program: ProgramId,
    layout: VertexLayout,
    vertices: GeometryBuffer,
}

#[derive(Debug, Default)]
pub struct TriangleScene {
    resources: Option<Resources>,
}

impl TriangleScene {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Demo for TriangleScene {
    fn init(&mut self, device: &mut dyn GraphicsDevice) -> glkit_core::Result<()> {
        let vertex = compile_stage(device, VERTEX_SHADER, StageKind::Vertex)?;
        let fragment = match compile_stage(device, FRAGMENT_SHADER, StageKind::Fragment) {
            Ok(shader) => shader,
            Err(e) => {
                device.delete_shader(vertex);
                return Err(e);
            }
        };
        let program = link_stages(device, vertex, fragment)?;

        let (layout, vertices) = match upload_triangle(device) {
            Ok(objects) => objects,
            Err(e) => {
                device.delete_program(program);
                return Err(e);
            }
        };

        debug!(program = program.raw(), "triangle ready");
        self.resources = Some(Resources {
            program,
            layout,
            vertices,
        });
        Ok(())
    }

    fn frame(&mut self, device: &mut dyn GraphicsDevice, _input: &FrameInput) -> glkit_core::Result<()> {
        let Some(res) = &self.resources else {
            return Ok(());
        };
        device.use_program(res.program);
        res.layout.bind(device);
        device.draw_arrays(DrawMode::Triangles, 0, 3);
        Ok(())
    }

    fn shutdown(&mut self, device: &mut dyn GraphicsDevice) {
        if let Some(res) = self.resources.take() {
            device.use_program(ProgramId::NONE);
            device.delete_program(res.program);
            res.layout.destroy(device);
            res.vertices.destroy(device);
        }
    }
}
