use std::path::PathBuf;

use crate::device::{BufferTarget, StageKind};
use crate::shader::ProgramState;

/// Kinds of device object, used when allocation fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Shader,
    Program,
    Buffer,
    VertexArray,
    Texture,
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ObjectKind::Shader => "shader",
            ObjectKind::Program => "program",
            ObjectKind::Buffer => "buffer",
            ObjectKind::VertexArray => "vertex array",
            ObjectKind::Texture => "texture",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read shader source {}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{stage} shader failed to compile:\n{log}")]
    Compile { stage: StageKind, log: String },

    #[error("program failed to link:\n{log}")]
    Link { log: String },

    #[error("device could not allocate a {0} object")]
    ObjectCreation(ObjectKind),

    #[error("program is {found:?}, expected {expected}")]
    InvalidState {
        expected: &'static str,
        found: ProgramState,
    },

    #[error("buffer bound to {found} cannot be used as {expected}")]
    WrongTarget {
        expected: BufferTarget,
        found: BufferTarget,
    },

    #[error("failed to decode image {}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
