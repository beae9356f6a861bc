//! Vertex array objects: the mapping from buffer bytes to shader inputs.

use tracing::{debug, trace};

use crate::buffer::GeometryBuffer;
use crate::device::{BufferTarget, GraphicsDevice, VertexArrayId, VertexAttribute};
use crate::error::{Error, ObjectKind, Result};

#[derive(Debug)]
pub struct VertexLayout {
    id: VertexArrayId,
    attributes: Vec<VertexAttribute>,
}

impl VertexLayout {
    pub fn create<D: GraphicsDevice + ?Sized>(device: &mut D) -> Result<Self> {
        let id = device.create_vertex_array();
        if id.is_none() {
            return Err(Error::ObjectCreation(ObjectKind::VertexArray));
        }
        debug!(vao = id.raw(), "vertex layout created");
        Ok(Self {
            id,
            attributes: Vec::new(),
        })
    }

    pub fn id(&self) -> VertexArrayId {
        self.id
    }

    /// Attributes attached so far, in attach order.
    pub fn attributes(&self) -> &[VertexAttribute] {
        &self.attributes
    }

    /// Point `attribute.location` at `buffer` and enable it.
    ///
    /// Binds this layout and `buffer` first; both stay bound afterwards.
    /// The stride/offset pair is not checked against the buffer length.
    pub fn attach_buffer<D: GraphicsDevice + ?Sized>(
        &mut self,
        device: &mut D,
        buffer: &GeometryBuffer,
        attribute: VertexAttribute,
    ) -> Result<()> {
        if buffer.target() != BufferTarget::Array {
            return Err(Error::WrongTarget {
                expected: BufferTarget::Array,
                found: buffer.target(),
            });
        }

        self.bind(device);
        buffer.bind(device);
        device.vertex_attrib_pointer(&attribute);
        device.enable_vertex_attrib_array(attribute.location);
        trace!(vao = self.id.raw(), buffer = buffer.id().raw(), ?attribute, "attribute attached");

        self.attributes.retain(|a| a.location != attribute.location);
        self.attributes.push(attribute);
        Ok(())
    }

    /// Record `buffer` as this layout's index source.
    pub fn attach_index_buffer<D: GraphicsDevice + ?Sized>(
        &mut self,
        device: &mut D,
        buffer: &GeometryBuffer,
    ) -> Result<()> {
        if buffer.target() != BufferTarget::ElementArray {
            return Err(Error::WrongTarget {
                expected: BufferTarget::ElementArray,
                found: buffer.target(),
            });
        }
        self.bind(device);
        buffer.bind(device);
        Ok(())
    }

    pub fn bind<D: GraphicsDevice + ?Sized>(&self, device: &mut D) {
        device.bind_vertex_array(self.id);
    }

    pub fn unbind<D: GraphicsDevice + ?Sized>(&self, device: &mut D) {
        device.bind_vertex_array(VertexArrayId::NONE);
    }

    pub fn destroy<D: GraphicsDevice + ?Sized>(self, device: &mut D) {
        device.delete_vertex_array(self.id);
        debug!(vao = self.id.raw(), "vertex layout destroyed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{BufferId, DeviceError, DrawMode, IndexType};
    use crate::headless::HeadlessDevice;
    use crate::shader::{ShaderProgram, ShaderSources};

    const VERTEX: &str = "#version 330 core
layout (location = 0) in vec3 aPos;
layout (location = 1) in vec3 aColor;
out vec3 color;
void main() {
    gl_Position = vec4(aPos, 1.0);
    color = aColor;
}
";
    const FRAGMENT: &str = "#version 330 core
in vec3 color;
out vec4 FragColor;
void main() {
    FragColor = vec4(color, 1.0);
}
";

    #[test]
    fn interleaved_attributes_are_recorded() {
        let mut dev = HeadlessDevice::new();
        let vbo = GeometryBuffer::vertices(&mut dev, &[0.0; 12]).unwrap();
        let mut layout = VertexLayout::create(&mut dev).unwrap();

        layout.attach_buffer(&mut dev, &vbo, VertexAttribute::floats(0, 3, 6, 0)).unwrap();
        layout.attach_buffer(&mut dev, &vbo, VertexAttribute::floats(1, 3, 6, 3)).unwrap();

        assert_eq!(layout.attributes().len(), 2);
        let (attr, source, enabled) = dev.attribute(layout.id(), 1).unwrap();
        assert_eq!(attr.offset, 12);
        assert_eq!(attr.stride, 24);
        assert_eq!(source, vbo.id());
        assert!(enabled);
        assert_eq!(dev.take_error(), None);

        layout.destroy(&mut dev);
        vbo.destroy(&mut dev);
    }

    #[test]
    fn reattaching_a_location_replaces_it() {
        let mut dev = HeadlessDevice::new();
        let vbo = GeometryBuffer::vertices(&mut dev, &[0.0; 4]).unwrap();
        let mut layout = VertexLayout::create(&mut dev).unwrap();
        layout.attach_buffer(&mut dev, &vbo, VertexAttribute::floats(0, 2, 2, 0)).unwrap();
        layout.attach_buffer(&mut dev, &vbo, VertexAttribute::floats(0, 4, 4, 0)).unwrap();
        assert_eq!(layout.attributes().len(), 1);
        assert_eq!(layout.attributes()[0].components, 4);
        layout.destroy(&mut dev);
        vbo.destroy(&mut dev);
    }

    #[test]
    fn element_buffer_cannot_feed_attributes() {
        let mut dev = HeadlessDevice::new();
        let ebo = GeometryBuffer::indices(&mut dev, &[0, 1, 2]).unwrap();
        let mut layout = VertexLayout::create(&mut dev).unwrap();
        let err = layout
            .attach_buffer(&mut dev, &ebo, VertexAttribute::floats(0, 3, 3, 0))
            .unwrap_err();
        assert!(matches!(err, Error::WrongTarget { found: BufferTarget::ElementArray, .. }));
        layout.destroy(&mut dev);
        ebo.destroy(&mut dev);
    }

    #[test]
    fn layout_captures_index_buffer_across_unbind() {
        let mut dev = HeadlessDevice::new();
        let mut program = ShaderProgram::link(&mut dev, ShaderSources::new(VERTEX, FRAGMENT)).unwrap();

        #[rustfmt::skip]
        let vertices = [
            -0.5, -0.5, 0.0,  1.0, 0.0, 0.0,
            -0.5,  0.5, 0.0,  0.0, 1.0, 0.0,
             0.5,  0.5, 0.0,  0.0, 0.0, 1.0,
             0.5, -0.5, 0.0,  1.0, 1.0, 1.0,
        ];
        let indices = [0u32, 2, 1, 0, 3, 2];

        let mut layout = VertexLayout::create(&mut dev).unwrap();
        layout.bind(&mut dev);
        let vbo = GeometryBuffer::vertices(&mut dev, &vertices).unwrap();
        let ebo = GeometryBuffer::indices(&mut dev, &indices).unwrap();
        layout.attach_buffer(&mut dev, &vbo, VertexAttribute::floats(0, 3, 6, 0)).unwrap();
        layout.attach_buffer(&mut dev, &vbo, VertexAttribute::floats(1, 3, 6, 3)).unwrap();
        layout.attach_index_buffer(&mut dev, &ebo).unwrap();

        // Same teardown order as a typical setup block: layout first.
        layout.unbind(&mut dev);
        vbo.unbind(&mut dev);
        ebo.unbind(&mut dev);
        assert_eq!(dev.bound_buffer(BufferTarget::ElementArray), BufferId::NONE);

        program.activate(&mut dev).unwrap();
        layout.bind(&mut dev);
        assert_eq!(dev.bound_buffer(BufferTarget::ElementArray), ebo.id());
        dev.draw_elements(DrawMode::Triangles, 6, IndexType::UnsignedInt, 0);
        assert_eq!(dev.take_error(), None);

        let call = &dev.draw_calls()[0];
        assert_eq!(call.indices, indices);
        assert_eq!(call.primitive_count(), 2);
        // First vertex drawn is index 0: lower-left corner, red.
        assert_eq!(&call.attributes[&0][..3], &[-0.5, -0.5, 0.0]);
        assert_eq!(&call.attributes[&1][..3], &[1.0, 0.0, 0.0]);

        program.destroy(&mut dev);
        layout.destroy(&mut dev);
        vbo.destroy(&mut dev);
        ebo.destroy(&mut dev);
    }

    #[test]
    fn draw_without_layout_is_a_device_error() {
        let mut dev = HeadlessDevice::new();
        let mut program = ShaderProgram::link(&mut dev, ShaderSources::new(VERTEX, FRAGMENT)).unwrap();
        program.activate(&mut dev).unwrap();
        dev.draw_arrays(DrawMode::Triangles, 0, 3);
        assert_eq!(dev.take_error(), Some(DeviceError::InvalidOperation));
        assert!(dev.draw_calls().is_empty());
        program.destroy(&mut dev);
    }
}
