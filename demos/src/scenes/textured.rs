//! The indexed quad with per-vertex texture coordinates, sampled from
//! texture unit 0 and scaled by a `scale` uniform.

use std::path::PathBuf;

use glkit_core::{
    Demo, FrameInput, GraphicsDevice, ShaderProgram, Texture, TextureOptions, VertexAttribute,
};
use image::{Rgba, RgbaImage};
use tracing::info;

use super::mesh::IndexedMesh;
use crate::shader_path;

#[rustfmt::skip]
pub const VERTICES: [f32; 32] = [
    // positions         // colors          // uv
    -0.5, -0.5, 0.0,     1.0, 0.0, 0.0,     0.0, 0.0, // lower left
    -0.5,  0.5, 0.0,     0.0, 1.0, 0.0,     0.0, 1.0, // upper left
     0.5,  0.5, 0.0,     0.0, 0.0, 1.0,     1.0, 1.0, // upper right
     0.5, -0.5, 0.0,     1.0, 1.0, 1.0,     1.0, 0.0, // lower right
];

pub const INDICES: [u32; 6] = [0, 2, 1, 0, 3, 2];

pub const ATTRIBUTES: [VertexAttribute; 3] = [
    VertexAttribute::floats(0, 3, 8, 0),
    VertexAttribute::floats(1, 3, 8, 3),
    VertexAttribute::floats(2, 2, 8, 6),
];

/// Value written to the `scale` uniform every frame.
pub const SCALE: f32 = 0.5;

/// Sampler uniform the fragment shader reads the texture through.
pub const SAMPLER: &str = "tex0";

/// An 8x8 black and white checkerboard, used when no image is given.
pub fn checkerboard(size: u32) -> RgbaImage {
    RgbaImage::from_fn(size, size, |x, y| {
        if (x / (size / 8).max(1) + y / (size / 8).max(1)) % 2 == 0 {
            Rgba([255, 255, 255, 255])
        } else {
            Rgba([0, 0, 0, 255])
        }
    })
}

#[derive(Debug)]
struct Resources {
    program: ShaderProgram,
    mesh: IndexedMesh,
    texture: Texture,
}

#[derive(Debug)]
pub struct TexturedScene {
    vertex_path: PathBuf,
    fragment_path: PathBuf,
    texture_path: Option<PathBuf>,
    resources: Option<Resources>,
}

impl Default for TexturedScene {
    fn default() -> Self {
        Self::new(shader_path("textured.vert"), shader_path("textured.frag"), None)
    }
}

impl TexturedScene {
    pub fn new(
        vertex_path: impl Into<PathBuf>,
        fragment_path: impl Into<PathBuf>,
        texture_path: Option<PathBuf>,
    ) -> Self {
        Self {
            vertex_path: vertex_path.into(),
            fragment_path: fragment_path.into(),
            texture_path,
            resources: None,
        }
    }

    fn load_texture<D: GraphicsDevice + ?Sized>(&self, device: &mut D) -> glkit_core::Result<Texture> {
        let options = TextureOptions::default();
        match &self.texture_path {
            Some(path) => {
                info!(path = %path.display(), "loading texture");
                Texture::from_file(device, path, options)
            }
            None => Texture::from_rgba(device, &checkerboard(64), options),
        }
    }
}

impl Demo for TexturedScene {
    fn init(&mut self, device: &mut dyn GraphicsDevice) -> glkit_core::Result<()> {
        let mut program = ShaderProgram::from_files(&self.vertex_path, &self.fragment_path)?;
        program.build(device)?;

        let mesh = match IndexedMesh::new(device, &VERTICES, &INDICES, &ATTRIBUTES) {
            Ok(mesh) => mesh,
            Err(e) => {
                program.destroy(device);
                return Err(e);
            }
        };

        let texture = match self.load_texture(device) {
            Ok(texture) => texture,
            Err(e) => {
                program.destroy(device);
                mesh.destroy(device);
                return Err(e);
            }
        };
        if let Err(e) = texture.assign_unit(device, &mut program, SAMPLER) {
            program.destroy(device);
            mesh.destroy(device);
            texture.destroy(device);
            return Err(e);
        }

        self.resources = Some(Resources {
            program,
            mesh,
            texture,
        });
        Ok(())
    }

    fn frame(&mut self, device: &mut dyn GraphicsDevice, _input: &FrameInput) -> glkit_core::Result<()> {
        let Some(res) = &mut self.resources else {
            return Ok(());
        };
        res.program.set_float(device, "scale", SCALE)?;
        res.texture.bind(device);
        res.mesh.draw(device);
        Ok(())
    }

    fn shutdown(&mut self, device: &mut dyn GraphicsDevice) {
        if let Some(mut res) = self.resources.take() {
            res.program.destroy(device);
            res.mesh.destroy(device);
            res.texture.destroy(device);
        }
    }
}
