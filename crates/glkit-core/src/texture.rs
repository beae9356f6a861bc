//! 2D textures sampled through a texture unit.

use std::path::Path;

use image::RgbaImage;
use tracing::{debug, error};

use crate::device::{GraphicsDevice, PixelFormat, TextureFilter, TextureId, TextureWrap};
use crate::error::{Error, ObjectKind, Result};
use crate::shader::ShaderProgram;

/// Sampling parameters applied at upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureOptions {
    /// Texture unit the texture binds to (0 is `GL_TEXTURE0`).
    pub unit: u32,
    pub filter: TextureFilter,
    pub wrap: TextureWrap,
    pub mipmaps: bool,
    /// Flip rows so that UV (0, 0) is the lower-left corner of the image.
    pub flip_vertically: bool,
}

impl Default for TextureOptions {
    fn default() -> Self {
        Self {
            unit: 0,
            filter: TextureFilter::Linear,
            wrap: TextureWrap::Repeat,
            mipmaps: true,
            flip_vertically: true,
        }
    }
}

#[derive(Debug)]
pub struct Texture {
    id: TextureId,
    unit: u32,
    size: (u32, u32),
}

impl Texture {
    /// Decode an image file and upload it as RGBA8.
    pub fn from_file<D: GraphicsDevice + ?Sized>(
        device: &mut D,
        path: impl AsRef<Path>,
        options: TextureOptions,
    ) -> Result<Self> {
        let path = path.as_ref();
        let image = image::open(path).map_err(|source| {
            error!(path = %path.display(), "texture not decodable: {source}");
            Error::Image {
                path: path.to_path_buf(),
                source,
            }
        })?;
        Self::from_rgba(device, &image.into_rgba8(), options)
    }

    pub fn from_rgba<D: GraphicsDevice + ?Sized>(
        device: &mut D,
        image: &RgbaImage,
        options: TextureOptions,
    ) -> Result<Self> {
        let id = device.create_texture();
        if id.is_none() {
            return Err(Error::ObjectCreation(ObjectKind::Texture));
        }

        let flipped;
        let pixels = if options.flip_vertically {
            flipped = image::imageops::flip_vertical(image);
            &flipped
        } else {
            image
        };

        let (width, height) = image.dimensions();
        device.active_texture(options.unit);
        device.bind_texture(id);
        device.tex_parameters(options.filter, options.wrap);
        device.tex_image_2d(width, height, PixelFormat::Rgba8, pixels.as_raw());
        if options.mipmaps {
            device.generate_mipmap();
        }
        device.bind_texture(TextureId::NONE);
        debug!(texture = id.raw(), width, height, unit = options.unit, "texture uploaded");

        Ok(Self {
            id,
            unit: options.unit,
            size: (width, height),
        })
    }

    pub fn id(&self) -> TextureId {
        self.id
    }

    pub fn unit(&self) -> u32 {
        self.unit
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    /// Point the sampler uniform `sampler` of `program` at this texture's unit.
    pub fn assign_unit<D: GraphicsDevice + ?Sized>(
        &self,
        device: &mut D,
        program: &mut ShaderProgram,
        sampler: &str,
    ) -> Result<()> {
        program.set_int(device, sampler, self.unit as i32)
    }

    pub fn bind<D: GraphicsDevice + ?Sized>(&self, device: &mut D) {
        device.active_texture(self.unit);
        device.bind_texture(self.id);
    }

    pub fn unbind<D: GraphicsDevice + ?Sized>(&self, device: &mut D) {
        device.active_texture(self.unit);
        device.bind_texture(TextureId::NONE);
    }

    pub fn destroy<D: GraphicsDevice + ?Sized>(self, device: &mut D) {
        device.delete_texture(self.id);
        debug!(texture = self.id.raw(), "texture destroyed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{HeadlessDevice, UniformValue};
    use crate::shader::ShaderSources;
    use image::Rgba;

    fn two_row_image() -> RgbaImage {
        // Top row red, bottom row blue.
        RgbaImage::from_fn(2, 2, |_, y| {
            if y == 0 {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 0, 255, 255])
            }
        })
    }

    #[test]
    fn upload_flips_rows_by_default() {
        let mut dev = HeadlessDevice::new();
        let texture = Texture::from_rgba(&mut dev, &two_row_image(), TextureOptions::default()).unwrap();

        assert_eq!(texture.size(), (2, 2));
        let pixels = dev.texture_pixels(texture.id()).unwrap();
        // First uploaded row is the image's bottom row.
        assert_eq!(&pixels[..4], &[0, 0, 255, 255]);
        assert!(dev.texture_has_mipmaps(texture.id()));
        assert_eq!(dev.take_error(), None);
        texture.destroy(&mut dev);
        assert_eq!(dev.live_textures(), 0);
    }

    #[test]
    fn unflipped_upload_keeps_row_order() {
        let mut dev = HeadlessDevice::new();
        let options = TextureOptions {
            flip_vertically: false,
            mipmaps: false,
            ..TextureOptions::default()
        };
        let texture = Texture::from_rgba(&mut dev, &two_row_image(), options).unwrap();
        let pixels = dev.texture_pixels(texture.id()).unwrap();
        assert_eq!(&pixels[..4], &[255, 0, 0, 255]);
        assert!(!dev.texture_has_mipmaps(texture.id()));
        texture.destroy(&mut dev);
    }

    #[test]
    fn sampling_options_reach_the_device() {
        let mut dev = HeadlessDevice::new();
        let options = TextureOptions {
            filter: TextureFilter::Nearest,
            wrap: TextureWrap::ClampToEdge,
            ..TextureOptions::default()
        };
        let texture = Texture::from_rgba(&mut dev, &two_row_image(), options).unwrap();

        assert_eq!(
            dev.texture_sampling(texture.id()),
            Some((TextureFilter::Nearest, TextureWrap::ClampToEdge))
        );
        assert_eq!(dev.texture_format(texture.id()), Some(PixelFormat::Rgba8));
        assert_eq!(dev.take_error(), None);
        texture.destroy(&mut dev);
    }

    #[test]
    fn default_sampling_is_linear_repeat() {
        let mut dev = HeadlessDevice::new();
        let texture = Texture::from_rgba(&mut dev, &two_row_image(), TextureOptions::default()).unwrap();
        assert_eq!(
            dev.texture_sampling(texture.id()),
            Some((TextureFilter::Linear, TextureWrap::Repeat))
        );
        texture.destroy(&mut dev);
    }

    #[test]
    fn bind_selects_the_configured_unit() {
        let mut dev = HeadlessDevice::new();
        let options = TextureOptions {
            unit: 3,
            ..TextureOptions::default()
        };
        let texture = Texture::from_rgba(&mut dev, &two_row_image(), options).unwrap();
        texture.bind(&mut dev);
        assert_eq!(dev.bound_texture(3), texture.id());
        assert_eq!(dev.bound_texture(0), TextureId::NONE);
        texture.unbind(&mut dev);
        assert_eq!(dev.bound_texture(3), TextureId::NONE);
        texture.destroy(&mut dev);
    }

    #[test]
    fn assign_unit_sets_the_sampler() {
        let mut dev = HeadlessDevice::new();
        let vertex = "#version 330 core
layout (location = 0) in vec3 aPos;
layout (location = 1) in vec2 aTex;
out vec2 texCoord;
void main() { gl_Position = vec4(aPos, 1.0); texCoord = aTex; }
";
        let fragment = "#version 330 core
in vec2 texCoord;
out vec4 FragColor;
uniform sampler2D tex0;
void main() { FragColor = texture(tex0, texCoord); }
";
        let mut program = ShaderProgram::link(&mut dev, ShaderSources::new(vertex, fragment)).unwrap();
        let options = TextureOptions {
            unit: 2,
            ..TextureOptions::default()
        };
        let texture = Texture::from_rgba(&mut dev, &two_row_image(), options).unwrap();
        texture.assign_unit(&mut dev, &mut program, "tex0").unwrap();

        assert_eq!(dev.uniform_value(program.id(), "tex0"), Some(UniformValue::Sampler(2)));
        assert_eq!(dev.take_error(), None);
        texture.destroy(&mut dev);
        program.destroy(&mut dev);
    }

    #[test]
    fn unreadable_file_is_an_image_error() {
        let mut dev = HeadlessDevice::new();
        let err = Texture::from_file(&mut dev, "/nonexistent/face.png", TextureOptions::default()).unwrap_err();
        assert!(matches!(err, Error::Image { .. }));
        assert_eq!(dev.live_textures(), 0);
    }
}
