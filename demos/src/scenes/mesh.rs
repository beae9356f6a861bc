//! Indexed geometry: a vertex buffer, an element buffer, and the layout
//! joining them.

use glkit_core::device::{DrawMode, IndexType};
use glkit_core::{GeometryBuffer, GraphicsDevice, VertexAttribute, VertexLayout};

#[derive(Debug)]
pub struct IndexedMesh {
    layout: VertexLayout,
    vertices: GeometryBuffer,
    indices: GeometryBuffer,
    count: i32,
}

impl IndexedMesh {
    /// Upload interleaved `vertices` and `indices` and describe them with
    /// `attributes`.
    ///
    /// Leaves nothing bound: the layout is unbound first so that unbinding
    /// the element buffer afterwards does not detach it from the layout.
    pub fn new<D: GraphicsDevice + ?Sized>(
        device: &mut D,
        vertices: &[f32],
        indices: &[u32],
        attributes: &[VertexAttribute],
    ) -> glkit_core::Result<Self> {
        let mut layout = VertexLayout::create(device)?;
        layout.bind(device);

        let vertex_buffer = GeometryBuffer::vertices(device, vertices)?;
        let index_buffer = GeometryBuffer::indices(device, indices)?;

        for attribute in attributes {
            layout.attach_buffer(device, &vertex_buffer, *attribute)?;
        }
        layout.attach_index_buffer(device, &index_buffer)?;

        layout.unbind(device);
        vertex_buffer.unbind(device);
        index_buffer.unbind(device);

        Ok(Self {
            layout,
            vertices: vertex_buffer,
            indices: index_buffer,
            count: indices.len() as i32,
        })
    }

    pub fn index_count(&self) -> i32 {
        self.count
    }

    /// Bind the layout and draw every index as triangles.
    pub fn draw<D: GraphicsDevice + ?Sized>(&self, device: &mut D) {
        self.layout.bind(device);
        device.draw_elements(DrawMode::Triangles, self.count, IndexType::UnsignedInt, 0);
    }

    pub fn destroy<D: GraphicsDevice + ?Sized>(self, device: &mut D) {
        self.layout.destroy(device);
        self.vertices.destroy(device);
        self.indices.destroy(device);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glkit_core::device::BufferTarget;
    use glkit_core::headless::HeadlessDevice;

    #[test]
    fn leaves_nothing_bound() {
        let mut dev = HeadlessDevice::new();
        let mesh = IndexedMesh::new(
            &mut dev,
            &[0.0, 0.0, 1.0, 0.0, 0.0, 1.0],
            &[0, 1, 2],
            &[VertexAttribute::floats(0, 2, 2, 0)],
        )
        .unwrap();

        assert_eq!(mesh.index_count(), 3);
        assert!(dev.bound_vertex_array().is_none());
        assert!(dev.bound_buffer(BufferTarget::Array).is_none());
        assert_eq!(dev.take_error(), None);

        mesh.destroy(&mut dev);
        assert_eq!(dev.live_buffers(), 0);
        assert_eq!(dev.live_vertex_arrays(), 0);
    }
}
