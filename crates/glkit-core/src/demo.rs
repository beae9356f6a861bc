//! The interface a windowed program implements to be driven by a frame loop.

use std::time::Duration;

use crate::device::GraphicsDevice;

/// Per-frame data handed to [`Demo::frame`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInput {
    /// Monotonic frame counter, starting at 0.
    pub frame: u64,
    /// Time since the loop started.
    pub elapsed: Duration,
    /// Drawable size in pixels.
    pub viewport: (u32, u32),
}

/// A program driven by a host loop.
///
/// The host calls [`Demo::init`] once with the device current, then
/// [`Demo::frame`] once per presented frame, then [`Demo::shutdown`] before the
/// context goes away. All three run on the thread owning the device.
pub trait Demo {
    /// Create shaders, buffers, and other device objects.
    fn init(&mut self, device: &mut dyn GraphicsDevice) -> crate::Result<()>;

    /// Record one frame. The host presents it afterwards and logs an error
    /// without stopping the loop.
    fn frame(&mut self, device: &mut dyn GraphicsDevice, input: &FrameInput) -> crate::Result<()>;

    /// Release every device object created in [`Demo::init`].
    fn shutdown(&mut self, device: &mut dyn GraphicsDevice);
}
