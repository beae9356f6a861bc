//! Command line shared by the demo binaries.

use std::path::PathBuf;

use clap::Parser;
use glkit_gl::HostConfig;

use crate::shader_path;

/// Window options and optional asset overrides.
#[derive(Debug, Clone, Parser)]
#[command(version, about)]
pub struct DemoArgs {
    /// Window width in pixels.
    #[arg(long, env = "GLKIT_WIDTH", default_value_t = 800)]
    pub width: u32,

    /// Window height in pixels.
    #[arg(long, env = "GLKIT_HEIGHT", default_value_t = 600)]
    pub height: u32,

    #[arg(long, env = "GLKIT_TITLE", default_value = "LearnOpenGL")]
    pub title: String,

    /// Exit after this many frames.
    #[arg(long, env = "GLKIT_FRAMES")]
    pub frames: Option<u64>,

    /// Vertex shader file, for demos that load their shaders from disk.
    #[arg(long, value_name = "PATH")]
    pub vertex: Option<PathBuf>,

    /// Fragment shader file, for demos that load their shaders from disk.
    #[arg(long, value_name = "PATH")]
    pub fragment: Option<PathBuf>,

    /// Image to texture the quad with. A checkerboard is used otherwise.
    #[arg(long, value_name = "PATH")]
    pub texture: Option<PathBuf>,
}

impl DemoArgs {
    pub fn host_config(&self) -> HostConfig {
        HostConfig::default()
            .with_title(self.title.clone())
            .with_size(self.width, self.height)
            .with_frame_limit(self.frames)
    }

    /// The shader pair to load: the overrides if given, else the named files
    /// under `shaders/`.
    pub fn shader_paths(&self, vertex: &str, fragment: &str) -> (PathBuf, PathBuf) {
        (
            self.vertex.clone().unwrap_or_else(|| shader_path(vertex)),
            self.fragment.clone().unwrap_or_else(|| shader_path(fragment)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_host_defaults() {
        let args = DemoArgs::try_parse_from(["demo"]).unwrap();
        assert_eq!(args.host_config(), HostConfig::default());
    }

    #[test]
    fn size_and_frame_limit() {
        let args = DemoArgs::try_parse_from(["demo", "--width", "320", "--height", "200", "--frames", "3"]).unwrap();
        let config = args.host_config();
        assert_eq!((config.width, config.height), (320, 200));
        assert_eq!(config.frame_limit, Some(3));
    }

    #[test]
    fn shader_overrides_replace_defaults() {
        let args = DemoArgs::try_parse_from(["demo", "--vertex", "/tmp/a.vert"]).unwrap();
        let (vertex, fragment) = args.shader_paths("quad.vert", "quad.frag");
        assert_eq!(vertex, PathBuf::from("/tmp/a.vert"));
        assert_eq!(fragment, shader_path("quad.frag"));
    }

    #[test]
    fn rejects_non_numeric_size() {
        assert!(DemoArgs::try_parse_from(["demo", "--width", "wide"]).is_err());
    }
}
