//! Step 1: a window cleared to a solid color.

use anyhow::Result;
use clap::Parser;
use glkit_demos::cli::DemoArgs;
use glkit_demos::scenes::ClearScene;

fn main() -> Result<()> {
    glkit_gl::logging::init();
    let args = DemoArgs::parse();
    glkit_gl::run(args.host_config(), ClearScene::default())
}
