//! Vertex and element buffers.
//!
//! A [`GeometryBuffer`] is created with its full payload and never updated.
//! Creation leaves it bound to its target, matching what the driver does
//! during the upload.

use tracing::{debug, trace};

use crate::device::{BufferId, BufferTarget, GraphicsDevice, UsageHint};
use crate::error::{Error, ObjectKind, Result};

#[derive(Debug, PartialEq, Eq)]
pub struct GeometryBuffer {
    id: BufferId,
    target: BufferTarget,
    len: usize,
    usage: UsageHint,
}

impl GeometryBuffer {
    /// Allocate a buffer of exactly `bytes.len()` bytes and upload `bytes`.
    pub fn create<D: GraphicsDevice + ?Sized>(
        device: &mut D,
        target: BufferTarget,
        bytes: &[u8],
        usage: UsageHint,
    ) -> Result<Self> {
        let id = device.create_buffer();
        if id.is_none() {
            return Err(Error::ObjectCreation(ObjectKind::Buffer));
        }

        device.bind_buffer(target, id);
        device.buffer_data(target, bytes, usage);
        debug!(buffer = id.raw(), %target, len = bytes.len(), ?usage, "buffer created");

        Ok(Self {
            id,
            target,
            len: bytes.len(),
            usage,
        })
    }

    /// Upload a slice of plain values.
    pub fn from_slice<D, T>(device: &mut D, target: BufferTarget, data: &[T], usage: UsageHint) -> Result<Self>
    where
        D: GraphicsDevice + ?Sized,
        T: bytemuck::Pod,
    {
        Self::create(device, target, bytemuck::cast_slice(data), usage)
    }

    /// Static vertex buffer over `f32` attribute data.
    pub fn vertices<D: GraphicsDevice + ?Sized>(device: &mut D, data: &[f32]) -> Result<Self> {
        Self::from_slice(device, BufferTarget::Array, data, UsageHint::Static)
    }

    /// Static element buffer over `u32` indices.
    pub fn indices<D: GraphicsDevice + ?Sized>(device: &mut D, data: &[u32]) -> Result<Self> {
        Self::from_slice(device, BufferTarget::ElementArray, data, UsageHint::Static)
    }

    pub fn id(&self) -> BufferId {
        self.id
    }

    pub fn target(&self) -> BufferTarget {
        self.target
    }

    /// Size in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn usage(&self) -> UsageHint {
        self.usage
    }

    pub fn bind<D: GraphicsDevice + ?Sized>(&self, device: &mut D) {
        self.bind_to(device, self.target);
    }

    /// Bind to an explicit binding point.
    pub fn bind_to<D: GraphicsDevice + ?Sized>(&self, device: &mut D, target: BufferTarget) {
        trace!(buffer = self.id.raw(), %target, "bind");
        device.bind_buffer(target, self.id);
    }

    /// Clear the binding point this buffer was created for.
    pub fn unbind<D: GraphicsDevice + ?Sized>(&self, device: &mut D) {
        device.bind_buffer(self.target, BufferId::NONE);
    }

    pub fn destroy<D: GraphicsDevice + ?Sized>(self, device: &mut D) {
        device.delete_buffer(self.id);
        debug!(buffer = self.id.raw(), "buffer destroyed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::VertexArrayId;
    use crate::headless::HeadlessDevice;

    #[test]
    fn create_uploads_exact_bytes() {
        let mut dev = HeadlessDevice::new();
        let data = [0.0f32, 0.5, -0.5, 1.0];
        let buffer = GeometryBuffer::vertices(&mut dev, &data).unwrap();

        assert_eq!(buffer.len(), 16);
        assert_eq!(buffer.target(), BufferTarget::Array);
        assert_eq!(buffer.usage(), UsageHint::Static);
        assert_eq!(dev.buffer_contents(buffer.id()).unwrap(), bytemuck::cast_slice::<f32, u8>(&data));
        assert_eq!(dev.bound_buffer(BufferTarget::Array), buffer.id());

        buffer.destroy(&mut dev);
        assert_eq!(dev.live_buffers(), 0);
    }

    #[test]
    fn unbind_clears_only_its_target() {
        let mut dev = HeadlessDevice::new();
        let vao = dev.create_vertex_array();
        dev.bind_vertex_array(vao);

        let vbo = GeometryBuffer::vertices(&mut dev, &[1.0, 2.0, 3.0]).unwrap();
        let ebo = GeometryBuffer::indices(&mut dev, &[0, 1, 2]).unwrap();
        assert_eq!(dev.bound_buffer(BufferTarget::ElementArray), ebo.id());

        vbo.unbind(&mut dev);
        assert_eq!(dev.bound_buffer(BufferTarget::Array), BufferId::NONE);
        assert_eq!(dev.bound_buffer(BufferTarget::ElementArray), ebo.id());

        ebo.unbind(&mut dev);
        assert_eq!(dev.bound_buffer(BufferTarget::ElementArray), BufferId::NONE);

        dev.bind_vertex_array(VertexArrayId::NONE);
        dev.delete_vertex_array(vao);
        vbo.destroy(&mut dev);
        ebo.destroy(&mut dev);
        assert_eq!(dev.take_error(), None);
    }

    #[test]
    fn rebinding_is_always_legal() {
        let mut dev = HeadlessDevice::new();
        let a = GeometryBuffer::vertices(&mut dev, &[1.0]).unwrap();
        let b = GeometryBuffer::vertices(&mut dev, &[2.0]).unwrap();
        a.bind(&mut dev);
        a.bind(&mut dev);
        b.bind(&mut dev);
        assert_eq!(dev.bound_buffer(BufferTarget::Array), b.id());
        assert_eq!(dev.buffer_contents(a.id()).unwrap(), bytemuck::bytes_of(&1.0f32));
        assert_eq!(dev.take_error(), None);
        a.destroy(&mut dev);
        b.destroy(&mut dev);
    }

    #[test]
    fn bind_to_uses_the_given_target() {
        let mut dev = HeadlessDevice::new();
        let vao = dev.create_vertex_array();
        dev.bind_vertex_array(vao);
        let buffer = GeometryBuffer::indices(&mut dev, &[0, 1, 2]).unwrap();
        buffer.unbind(&mut dev);

        buffer.bind_to(&mut dev, BufferTarget::Array);
        assert_eq!(dev.bound_buffer(BufferTarget::Array), buffer.id());
        assert_eq!(dev.bound_buffer(BufferTarget::ElementArray), BufferId::NONE);
        assert_eq!(buffer.target(), BufferTarget::ElementArray);
        assert_eq!(dev.take_error(), None);

        dev.bind_vertex_array(VertexArrayId::NONE);
        dev.delete_vertex_array(vao);
        buffer.destroy(&mut dev);
    }

    #[test]
    fn empty_payload_is_allowed() {
        let mut dev = HeadlessDevice::new();
        let buffer = GeometryBuffer::create(&mut dev, BufferTarget::Array, &[], UsageHint::Dynamic).unwrap();
        assert!(buffer.is_empty());
        assert_eq!(dev.buffer_usage(buffer.id()), Some(UsageHint::Dynamic));
        buffer.destroy(&mut dev);
    }
}
