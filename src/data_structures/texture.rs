//! Texture records and their fixed binary layout.
//!
//! A texture record is what the client downloads for every sprite:
//!
//! | offset | field    | type  |
//! |--------|----------|-------|
//! | 0      | `x`      | `i16` |
//! | 2      | `y`      | `i16` |
//! | 4      | `width`  | `u16` |
//! | 6      | `height` | `u16` |
//! | 8      | `bitmap` | `width * height` palette indices |
//!
//! The byte order of the header fields is selected by [`ByteOrder`].

use std::{fmt, str::FromStr};

use anyhow::*;

use crate::data_structures::palette::Palette;

/// Size of the fixed header that precedes the bitmap.
pub const HEADER_LEN: usize = 8;

/// Byte order of the 16-bit header fields.
///
/// Big-endian is the default since that is what a browser `DataView`
/// reads when no endianness flag is given.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    #[default]
    BigEndian,
    LittleEndian,
}

impl ByteOrder {
    fn read_u16(self, bytes: [u8; 2]) -> u16 {
        match self {
            Self::BigEndian => u16::from_be_bytes(bytes),
            Self::LittleEndian => u16::from_le_bytes(bytes),
        }
    }

    fn read_i16(self, bytes: [u8; 2]) -> i16 {
        match self {
            Self::BigEndian => i16::from_be_bytes(bytes),
            Self::LittleEndian => i16::from_le_bytes(bytes),
        }
    }

    fn write_u16(self, value: u16) -> [u8; 2] {
        match self {
            Self::BigEndian => value.to_be_bytes(),
            Self::LittleEndian => value.to_le_bytes(),
        }
    }

    fn write_i16(self, value: i16) -> [u8; 2] {
        match self {
            Self::BigEndian => value.to_be_bytes(),
            Self::LittleEndian => value.to_le_bytes(),
        }
    }
}

impl FromStr for ByteOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "be" | "big" | "big-endian" => Ok(Self::BigEndian),
            "le" | "little" | "little-endian" => Ok(Self::LittleEndian),
            other => bail!("unknown byte order '{other}', expected 'be' or 'le'"),
        }
    }
}

impl fmt::Display for ByteOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BigEndian => f.write_str("be"),
            Self::LittleEndian => f.write_str("le"),
        }
    }
}

/// A decoded sprite: its draw offset, its size and one palette index per
/// pixel, stored row by row from the top.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Texture {
    pub x: i16,
    pub y: i16,
    pub width: u16,
    pub height: u16,
    pub bitmap: Vec<u8>,
}

impl Texture {
    /// Create a texture, checking that `bitmap` holds exactly
    /// `width * height` pixels.
    pub fn new(x: i16, y: i16, width: u16, height: u16, bitmap: Vec<u8>) -> Result<Self> {
        ensure!(
            bitmap.len() == pixel_count(width, height),
            "bitmap has {} bytes but a {}x{} texture needs {}",
            bitmap.len(),
            width,
            height,
            pixel_count(width, height)
        );
        Ok(Self {
            x,
            y,
            width,
            height,
            bitmap,
        })
    }

    /// Decode a texture record.
    ///
    /// Fails if the header is incomplete or the bitmap region is shorter
    /// than `width * height`. Bytes past the bitmap are ignored.
    pub fn from_bytes(bytes: &[u8], order: ByteOrder) -> Result<Self> {
        ensure!(
            bytes.len() >= HEADER_LEN,
            "texture record is {} bytes, the header alone needs {}",
            bytes.len(),
            HEADER_LEN
        );
        let field = |pos: usize| [bytes[pos], bytes[pos + 1]];
        let mut pos = 0;
        let x = order.read_i16(field(pos));
        pos += 2;
        let y = order.read_i16(field(pos));
        pos += 2;
        let width = order.read_u16(field(pos));
        pos += 2;
        let height = order.read_u16(field(pos));
        pos += 2;

        let len = pixel_count(width, height);
        let bitmap = bytes
            .get(pos..pos + len)
            .with_context(|| {
                format!(
                    "truncated bitmap: {width}x{height} needs {len} bytes, found {}",
                    bytes.len() - pos
                )
            })?
            .to_vec();
        if bytes.len() > pos + len {
            log::debug!(
                "ignoring {} trailing bytes after texture bitmap",
                bytes.len() - pos - len
            );
        }

        Ok(Self {
            x,
            y,
            width,
            height,
            bitmap,
        })
    }

    /// Encode the texture in the record layout read by [`Texture::from_bytes`].
    pub fn to_bytes(&self, order: ByteOrder) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + self.bitmap.len());
        out.extend_from_slice(&order.write_i16(self.x));
        out.extend_from_slice(&order.write_i16(self.y));
        out.extend_from_slice(&order.write_u16(self.width));
        out.extend_from_slice(&order.write_u16(self.height));
        out.extend_from_slice(&self.bitmap);
        out
    }

    /// Palette index at (`col`, `row`), counted from the top-left corner.
    pub fn pixel(&self, col: u16, row: u16) -> Option<u8> {
        if col >= self.width || row >= self.height {
            return None;
        }
        self.bitmap
            .get(row as usize * self.width as usize + col as usize)
            .copied()
    }

    /// Resolve every palette index and return an RGBA image.
    pub fn to_rgba_image(&self, palette: &Palette) -> Result<image::RgbaImage> {
        let pixels: Vec<[u8; 4]> = self.bitmap.iter().map(|&i| palette.color(i)).collect();
        let raw: Vec<u8> = bytemuck::cast_slice(&pixels).to_vec();
        image::RgbaImage::from_raw(self.width as u32, self.height as u32, raw).with_context(|| {
            format!(
                "bitmap of {} bytes does not fit a {}x{} image",
                self.bitmap.len(),
                self.width,
                self.height
            )
        })
    }
}

pub(crate) fn pixel_count(width: u16, height: u16) -> usize {
    width as usize * height as usize
}
