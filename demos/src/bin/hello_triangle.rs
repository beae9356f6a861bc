//! Step 2: one triangle from shader strings compiled by hand.

use anyhow::Result;
use clap::Parser;
use glkit_demos::cli::DemoArgs;
use glkit_demos::scenes::TriangleScene;

fn main() -> Result<()> {
    glkit_gl::logging::init();
    let args = DemoArgs::parse();
    glkit_gl::run(args.host_config(), TriangleScene::new())
}
