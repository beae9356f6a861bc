//! Step 5: the quad with a texture and a `scale` uniform.

use anyhow::{Context, Result};
use clap::Parser;
use glkit_demos::cli::DemoArgs;
use glkit_demos::scenes::TexturedScene;

fn main() -> Result<()> {
    glkit_gl::logging::init();
    let args = DemoArgs::parse();
    let (vertex, fragment) = args.shader_paths("textured.vert", "textured.frag");
    if let Some(path) = &args.texture {
        anyhow::ensure!(path.is_file(), "texture {} does not exist", path.display());
    }
    let scene = TexturedScene::new(vertex, fragment, args.texture.clone());
    glkit_gl::run(args.host_config(), scene).context("textured quad demo failed")
}
