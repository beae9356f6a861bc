//! Vertex fetch for the headless device.

use std::collections::BTreeMap;

use crate::device::{DrawMode, ElementType, IndexType, VertexAttribute};

/// One draw call as the device received it, with every enabled attribute
/// already fetched from its buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub mode: DrawMode,
    pub count: i32,
    /// Index type for `draw_elements`, `None` for `draw_arrays`.
    pub index_type: Option<IndexType>,
    /// Vertex indices in submission order.
    pub indices: Vec<u32>,
    /// Location -> components of every submitted vertex, concatenated.
    pub attributes: BTreeMap<u32, Vec<f32>>,
}

impl DrawCall {
    /// Number of primitives `count` vertices assemble into under `mode`.
    pub fn primitive_count(&self) -> usize {
        let n = self.count.max(0) as usize;
        match self.mode {
            DrawMode::Points => n,
            DrawMode::Lines => n / 2,
            DrawMode::LineStrip => n.saturating_sub(1),
            DrawMode::Triangles => n / 3,
            DrawMode::TriangleStrip | DrawMode::TriangleFan => n.saturating_sub(2),
        }
    }

    pub fn is_indexed(&self) -> bool {
        self.index_type.is_some()
    }
}

/// Read the components of `vertex` for `attribute` out of `data`.
///
/// Returns `None` if the read runs past the end of the buffer.
pub(crate) fn fetch(data: &[u8], attribute: &VertexAttribute, vertex: u32) -> Option<Vec<f32>> {
    let size = attribute.element_type.size();
    let components = attribute.components.max(0) as usize;
    let stride = match attribute.stride {
        0 => components * size,
        s => s as usize,
    };

    let base = attribute.offset.checked_add(stride.checked_mul(vertex as usize)?)?;
    let end = base.checked_add(components * size)?;
    let bytes = data.get(base..end)?;

    Some(
        bytes
            .chunks_exact(size)
            .map(|c| component(c, attribute.element_type, attribute.normalized))
            .collect(),
    )
}

fn component(bytes: &[u8], ty: ElementType, normalized: bool) -> f32 {
    let (value, max) = match ty {
        ElementType::Float => return f32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
        ElementType::Byte => (bytes[0] as i8 as f32, i8::MAX as f32),
        ElementType::UnsignedByte => (bytes[0] as f32, u8::MAX as f32),
        ElementType::Short => (i16::from_ne_bytes([bytes[0], bytes[1]]) as f32, i16::MAX as f32),
        ElementType::UnsignedShort => (u16::from_ne_bytes([bytes[0], bytes[1]]) as f32, u16::MAX as f32),
        ElementType::Int => (
            i32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f32,
            i32::MAX as f32,
        ),
        ElementType::UnsignedInt => (
            u32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f32,
            u32::MAX as f32,
        ),
    };
    if normalized {
        (value / max).max(-1.0)
    } else {
        value
    }
}

/// Read `count` indices starting at byte `offset`.
pub(crate) fn read_indices(data: &[u8], index_type: IndexType, offset: usize, count: usize) -> Option<Vec<u32>> {
    let size = index_type.size();
    let end = offset.checked_add(count.checked_mul(size)?)?;
    let bytes = data.get(offset..end)?;
    Some(
        bytes
            .chunks_exact(size)
            .map(|c| match index_type {
                IndexType::UnsignedByte => c[0] as u32,
                IndexType::UnsignedShort => u16::from_ne_bytes([c[0], c[1]]) as u32,
                IndexType::UnsignedInt => u32::from_ne_bytes([c[0], c[1], c[2], c[3]]),
            })
            .collect(),
    )
}
