//! Step 3: shaders loaded from files, animated through a uniform.

use anyhow::Result;
use clap::Parser;
use glkit_demos::cli::DemoArgs;
use glkit_demos::scenes::ShaderClassScene;

fn main() -> Result<()> {
    glkit_gl::logging::init();
    let args = DemoArgs::parse();
    let (vertex, fragment) = args.shader_paths("shader_class.vert", "shader_class.frag");
    glkit_gl::run(args.host_config(), ShaderClassScene::new(vertex, fragment))
}
