//! Texture handles as handed out by the asset side.
//!
//! Decoding and GPU upload of pixel data happen elsewhere; this module only
//! tracks identity, the drawn region and the texture coordinates derived from it.

use std::fmt;

use image::{Rgba, RgbaImage};
use uuid::Uuid;

use crate::utils::{Position, Rectangle, Size};

/// Identity of a GPU texture. Regions cut from the same atlas share it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub Uuid);

impl TextureId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TextureId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TextureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    id: TextureId,
    owner_size: Size,
    region: Rectangle,
    anchor: Position,
}

impl Texture {
    /// A whole texture of the given pixel size.
    pub fn new(width: u32, height: u32) -> Self {
        let size = Size::new(width as f32, height as f32);
        Self {
            id: TextureId::new(),
            owner_size: size,
            region: Rectangle::new(0.0, 0.0, size.width, size.height),
            anchor: Position::ZERO,
        }
    }

    /// Wraps an existing GPU texture identity, e.g. one registered by the asset loader.
    pub fn from_id(id: TextureId, width: u32, height: u32) -> Self {
        Self {
            id,
            ..Self::new(width, height)
        }
    }

    /// A sub-region of this texture. The region shares the owner's identity.
    pub fn region(&self, rect: Rectangle) -> Texture {
        Texture {
            id: self.id,
            owner_size: self.owner_size,
            region: Rectangle::new(
                self.region.x + rect.x,
                self.region.y + rect.y,
                rect.width,
                rect.height,
            ),
            anchor: Position::ZERO,
        }
    }

    pub fn with_anchor(mut self, anchor: Position) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn id(&self) -> TextureId {
        self.id
    }

    pub fn width(&self) -> f32 {
        self.region.width
    }

    pub fn height(&self) -> f32 {
        self.region.height
    }

    pub fn size(&self) -> Size {
        self.region.size()
    }

    pub fn anchor(&self) -> Position {
        self.anchor
    }

    /// `(u, v, r)` per quad vertex, ordered top-left, top-right, bottom-right, bottom-left.
    pub fn tex_coords(&self) -> [f32; 12] {
        let u0 = self.region.x / self.owner_size.width;
        let v0 = self.region.y / self.owner_size.height;
        let u1 = (self.region.x + self.region.width) / self.owner_size.width;
        let v1 = (self.region.y + self.region.height) / self.owner_size.height;
        [
            u0, v0, 0.0, //
            u1, v0, 0.0, //
            u1, v1, 0.0, //
            u0, v1, 0.0,
        ]
    }
}

/// What the asset side must supply to visuals created without an explicit image.
pub trait TextureProvider {
    /// Texture shown when none was given.
    fn fallback_texture(&self) -> Texture;
    /// 1x1 opaque white texture, stretched for plain rectangles.
    fn pixel_texture(&self) -> Texture;
}

/// Generated stand-in textures together with their pixels for upload.
pub struct BuiltinTextures {
    error: Texture,
    error_pixels: RgbaImage,
    pixel: Texture,
    pixel_pixels: RgbaImage,
}

impl BuiltinTextures {
    pub const ERROR_SIZE: u32 = 16;

    pub fn new() -> Self {
        let error_pixels = RgbaImage::from_fn(Self::ERROR_SIZE, Self::ERROR_SIZE, |x, y| {
            // 8px magenta/black checkerboard
            if ((x / 8) + (y / 8)) % 2 == 0 {
                Rgba([0xFF, 0x00, 0xFF, 0xFF])
            } else {
                Rgba([0x00, 0x00, 0x00, 0xFF])
            }
        });
        let pixel_pixels = RgbaImage::from_pixel(1, 1, Rgba([0xFF, 0xFF, 0xFF, 0xFF]));
        Self {
            error: Texture::new(Self::ERROR_SIZE, Self::ERROR_SIZE),
            error_pixels,
            pixel: Texture::new(1, 1),
            pixel_pixels,
        }
    }

    pub fn error_pixels(&self) -> &RgbaImage {
        &self.error_pixels
    }

    pub fn pixel_pixels(&self) -> &RgbaImage {
        &self.pixel_pixels
    }
}

impl Default for BuiltinTextures {
    fn default() -> Self {
        Self::new()
    }
}

impl TextureProvider for BuiltinTextures {
    fn fallback_texture(&self) -> Texture {
        self.error.clone()
    }

    fn pixel_texture(&self) -> Texture {
        self.pixel.clone()
    }
}
