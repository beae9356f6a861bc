//! Step 4: an indexed quad from a vertex buffer, an element buffer and a
//! vertex layout.

use anyhow::Result;
use clap::Parser;
use glkit_demos::cli::DemoArgs;
use glkit_demos::scenes::QuadScene;

fn main() -> Result<()> {
    glkit_gl::logging::init();
    let args = DemoArgs::parse();
    let (vertex, fragment) = args.shader_paths("quad.vert", "quad.frag");
    glkit_gl::run(args.host_config(), QuadScene::new(vertex, fragment))
}
