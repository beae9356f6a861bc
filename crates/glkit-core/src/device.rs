//! The graphics device seam.
//!
//! Every wrapper in this crate talks to the driver through [`GraphicsDevice`],
//! passed explicitly to each call. Nothing here relies on a global "current
//! context": the binding order a caller performs is exactly the order the
//! device sees. [`crate::headless::HeadlessDevice`] implements the trait in
//! software for tests; `glkit_gl::GlDevice` implements it over a live OpenGL
//! context.

use std::fmt;

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[repr(transparent)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub struct $name(pub u32);

        impl $name {
            /// The "no object" handle.
            pub const NONE: Self = Self(0);

            pub fn is_none(self) -> bool {
                self.0 == 0
            }

            pub fn raw(self) -> u32 {
                self.0
            }
        }
    };
}

handle!(
    /// A compiled (or compiling) shader stage object.
    ShaderId
);
handle!(
    /// A program object.
    ProgramId
);
handle!(
    /// A buffer object.
    BufferId
);
handle!(
    /// A vertex array object.
    VertexArrayId
);
handle!(
    /// A texture object.
    TextureId
);

/// Location of an active uniform inside a linked program.
///
/// `-1` means the name did not resolve to an active uniform. Writes to that
/// location are accepted and ignored by the device.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub i32);

impl UniformLocation {
    pub const NONE: Self = Self(-1);

    pub fn is_none(self) -> bool {
        self.0 < 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    Vertex,
    Fragment,
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageKind::Vertex => f.write_str("vertex"),
            StageKind::Fragment => f.write_str("fragment"),
        }
    }
}

/// Binding point a buffer is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    /// Vertex attribute data.
    Array,
    /// Index data for indexed draws.
    ElementArray,
}

impl fmt::Display for BufferTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BufferTarget::Array => f.write_str("ARRAY_BUFFER"),
            BufferTarget::ElementArray => f.write_str("ELEMENT_ARRAY_BUFFER"),
        }
    }
}

/// Upload hint. Only affects where the driver places the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UsageHint {
    #[default]
    Static,
    Dynamic,
    Stream,
}

/// Component type of a vertex attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    Byte,
    UnsignedByte,
    Short,
    UnsignedShort,
    Int,
    UnsignedInt,
    Float,
}

impl ElementType {
    /// Size of one component in bytes.
    pub fn size(self) -> usize {
        match self {
            ElementType::Byte | ElementType::UnsignedByte => 1,
            ElementType::Short | ElementType::UnsignedShort => 2,
            ElementType::Int | ElementType::UnsignedInt | ElementType::Float => 4,
        }
    }
}

/// Index type of an element buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexType {
    UnsignedByte,
    UnsignedShort,
    UnsignedInt,
}

impl IndexType {
    pub fn size(self) -> usize {
        match self {
            IndexType::UnsignedByte => 1,
            IndexType::UnsignedShort => 2,
            IndexType::UnsignedInt => 4,
        }
    }
}

/// Primitive assembly mode for a draw call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawMode {
    Points,
    Lines,
    LineStrip,
    Triangles,
    TriangleStrip,
    TriangleFan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureFilter {
    Nearest,
    #[default]
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureWrap {
    #[default]
    Repeat,
    MirroredRepeat,
    ClampToEdge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    Rgb8,
    Rgba8,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgb8 => 3,
            PixelFormat::Rgba8 => 4,
        }
    }
}

/// Describes how one shader input reads from the bound vertex buffer.
///
/// `stride` and `offset` are in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    pub location: u32,
    pub components: i32,
    pub element_type: ElementType,
    pub normalized: bool,
    pub stride: i32,
    pub offset: usize,
}

impl VertexAttribute {
    /// Attribute over tightly interleaved `f32` data, with stride and offset
    /// given in floats rather than bytes.
    ///
    /// # Panics
    ///
    /// If the stride in bytes exceeds `i32::MAX` or the offset overflows
    /// `usize`. In a `const` item this is a compile error; use
    /// [`Self::try_floats`] for sizes computed at run time.
    pub const fn floats(location: u32, components: i32, stride_floats: usize, offset_floats: usize) -> Self {
        match Self::try_floats(location, components, stride_floats, offset_floats) {
            Some(attribute) => attribute,
            None => panic!("vertex attribute stride or offset out of range"),
        }
    }

    /// [`Self::floats`], or `None` when the byte stride does not fit the
    /// driver's `GLsizei`.
    pub const fn try_floats(
        location: u32,
        components: i32,
        stride_floats: usize,
        offset_floats: usize,
    ) -> Option<Self> {
        let float = std::mem::size_of::<f32>();
        let Some(stride) = stride_floats.checked_mul(float) else {
            return None;
        };
        let Some(offset) = offset_floats.checked_mul(float) else {
            return None;
        };
        if stride > i32::MAX as usize {
            return None;
        }
        Some(Self {
            location,
            components,
            element_type: ElementType::Float,
            normalized: false,
            stride: stride as i32,
            offset,
        })
    }
}

/// Error flag reported by the device, mirroring `glGetError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceError {
    InvalidEnum,
    InvalidValue,
    InvalidOperation,
    OutOfMemory,
    InvalidFramebufferOperation,
    Unknown(u32),
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::InvalidEnum => f.write_str("GL_INVALID_ENUM"),
            DeviceError::InvalidValue => f.write_str("GL_INVALID_VALUE"),
            DeviceError::InvalidOperation => f.write_str("GL_INVALID_OPERATION"),
            DeviceError::OutOfMemory => f.write_str("GL_OUT_OF_MEMORY"),
            DeviceError::InvalidFramebufferOperation => {
                f.write_str("GL_INVALID_FRAMEBUFFER_OPERATION")
            }
            DeviceError::Unknown(code) => write!(f, "unknown GL error {code:#06x}"),
        }
    }
}

/// The driver entry points the wrappers are expressed in.
///
/// Object-creating calls return the `NONE` handle when the device cannot
/// allocate. Calls taking a handle accept `NONE` where the driver does
/// (binding `NONE` clears the binding point).
pub trait GraphicsDevice {
    // -- shaders ----------------------------------------------------------

    fn create_shader(&mut self, kind: StageKind) -> ShaderId;
    fn shader_source(&mut self, shader: ShaderId, source: &str);
    fn compile_shader(&mut self, shader: ShaderId);
    fn shader_compile_status(&self, shader: ShaderId) -> bool;
    fn shader_info_log(&self, shader: ShaderId) -> String;
    fn delete_shader(&mut self, shader: ShaderId);

    // -- programs ---------------------------------------------------------

    fn create_program(&mut self) -> ProgramId;
    fn attach_shader(&mut self, program: ProgramId, shader: ShaderId);
    fn detach_shader(&mut self, program: ProgramId, shader: ShaderId);
    fn link_program(&mut self, program: ProgramId);
    fn program_link_status(&self, program: ProgramId) -> bool;
    fn program_info_log(&self, program: ProgramId) -> String;
    fn use_program(&mut self, program: ProgramId);
    fn current_program(&self) -> ProgramId;
    fn delete_program(&mut self, program: ProgramId);

    fn uniform_location(&self, program: ProgramId, name: &str) -> UniformLocation;
    /// Writes to the current program. `UniformLocation::NONE` is ignored.
    fn uniform_1i(&mut self, location: UniformLocation, value: i32);
    /// Writes to the current program. `UniformLocation::NONE` is ignored.
    fn uniform_1f(&mut self, location: UniformLocation, value: f32);

    // -- buffers ----------------------------------------------------------

    fn create_buffer(&mut self) -> BufferId;
    fn bind_buffer(&mut self, target: BufferTarget, buffer: BufferId);
    /// Replaces the storage of whatever buffer is bound to `target`.
    fn buffer_data(&mut self, target: BufferTarget, data: &[u8], usage: UsageHint);
    fn delete_buffer(&mut self, buffer: BufferId);

    // -- vertex arrays ----------------------------------------------------

    fn create_vertex_array(&mut self) -> VertexArrayId;
    fn bind_vertex_array(&mut self, vao: VertexArrayId);
    /// Records `attribute` against the buffer currently bound to
    /// [`BufferTarget::Array`], inside the currently bound vertex array.
    fn vertex_attrib_pointer(&mut self, attribute: &VertexAttribute);
    fn enable_vertex_attrib_array(&mut self, location: u32);
    fn delete_vertex_array(&mut self, vao: VertexArrayId);

    // -- textures ---------------------------------------------------------

    fn create_texture(&mut self) -> TextureId;
    /// Selects texture unit `unit` (0-based) for subsequent binds.
    fn active_texture(&mut self, unit: u32);
    fn bind_texture(&mut self, texture: TextureId);
    fn tex_image_2d(&mut self, width: u32, height: u32, format: PixelFormat, pixels: &[u8]);
    fn tex_parameters(&mut self, filter: TextureFilter, wrap: TextureWrap);
    fn generate_mipmap(&mut self);
    fn delete_texture(&mut self, texture: TextureId);

    // -- frame ------------------------------------------------------------

    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32);
    fn clear_color(&mut self, rgba: [f32; 4]);
    fn clear(&mut self);
    fn draw_arrays(&mut self, mode: DrawMode, first: i32, count: i32);
    /// `offset` is a byte offset into the bound element buffer.
    fn draw_elements(&mut self, mode: DrawMode, count: i32, index_type: IndexType, offset: usize);

    /// Pops the oldest pending error flag, if any.
    fn take_error(&mut self) -> Option<DeviceError>;
}

/// Drains every pending error flag.
pub fn drain_errors<D: GraphicsDevice + ?Sized>(device: &mut D) -> Vec<DeviceError> {
    std::iter::from_fn(|| device.take_error()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_attribute_converts_to_bytes() {
        let attr = VertexAttribute::floats(2, 2, 8, 6);
        assert_eq!(attr.stride, 32);
        assert_eq!(attr.offset, 24);
        assert_eq!(attr.element_type, ElementType::Float);
    }

    #[test]
    fn oversized_stride_is_rejected() {
        let max = i32::MAX as usize / 4;
        assert_eq!(VertexAttribute::try_floats(0, 3, max, 0).map(|a| a.stride), Some(max as i32 * 4));
        assert_eq!(VertexAttribute::try_floats(0, 3, max + 1, 0), None);
        assert_eq!(VertexAttribute::try_floats(0, 3, 8, usize::MAX), None);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn floats_panics_instead_of_truncating() {
        let _ = VertexAttribute::floats(0, 3, usize::MAX / 2, 0);
    }

    #[test]
    fn zero_handle_is_none() {
        assert!(BufferId::NONE.is_none());
        assert!(!ProgramId(3).is_none());
        assert!(UniformLocation::NONE.is_none());
        assert!(!UniformLocation(0).is_none());
    }
}
