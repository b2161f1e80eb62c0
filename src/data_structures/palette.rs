use anyhow::*;

/// Number of colours addressable by an 8-bit bitmap.
pub const PALETTE_LEN: usize = 256;

/// Maps the palette indices stored in a texture bitmap to RGBA colours.
///
/// Index 0 is always transparent; sprites use it for their background.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<[u8; 4]>,
}

impl Palette {
    /// A linear gray ramp, useful for inspecting bitmaps without the game's
    /// palette files.
    pub fn grayscale() -> Self {
        let mut colors: Vec<[u8; 4]> = (0..PALETTE_LEN)
            .map(|i| [i as u8, i as u8, i as u8, 255])
            .collect();
        colors[0] = [0, 0, 0, 0];
        Self { colors }
    }

    /// Read a palette of 256 packed RGB triplets.
    pub fn from_rgb_bytes(bytes: &[u8]) -> Result<Self> {
        ensure!(
            bytes.len() == PALETTE_LEN * 3,
            "palette must be {} bytes of RGB triplets, got {}",
            PALETTE_LEN * 3,
            bytes.len()
        );
        let mut colors: Vec<[u8; 4]> = bytes
            .chunks_exact(3)
            .map(|rgb| [rgb[0], rgb[1], rgb[2], 255])
            .collect();
        colors[0][3] = 0;
        Ok(Self { colors })
    }

    pub fn color(&self, index: u8) -> [u8; 4] {
        self.colors[index as usize]
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::grayscale()
    }
}
