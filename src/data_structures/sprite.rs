//! Raw sprite data as stored in the game's sprite archive.

/// Index entry describing where a sprite's data block lives and how it is
/// positioned when drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpriteInfo {
    /// Byte offset of the data block in the archive.
    pub address: u32,
    /// Length of the data block, header included.
    pub size: u32,
    pub x_offset: i16,
    pub y_offset: i16,
    pub width: u16,
    pub height: u16,
}

/// A sprite's data block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteBlock {
    pub major: u8,
    pub minor: u8,
    pub data: Vec<u8>,
}

impl SpriteBlock {
    /// Major version of run-length compressed blocks.
    pub const RUN_LENGTH: u8 = 1;

    pub fn is_run_length(&self) -> bool {
        self.major == Self::RUN_LENGTH
    }
}
