//! An empty window cleared to one color.

use glkit_core::{Demo, FrameInput, GraphicsDevice};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClearScene {
    pub color: [f32; 4],
}

impl Default for ClearScene {
    fn default() -> Self {
        Self {
            color: [0.2, 0.3, 0.3, 1.0],
        }
    }
}

impl Demo for ClearScene {
    fn init(&mut self, _device: &mut dyn GraphicsDevice) -> glkit_core::Result<()> {
        Ok(())
    }

    fn frame(&mut self, device: &mut dyn GraphicsDevice, _input: &FrameInput) -> glkit_core::Result<()> {
        device.clear_color(self.color);
        device.clear();
        Ok(())
    }

    fn shutdown(&mut self, _device: &mut dyn GraphicsDevice) {}
}
