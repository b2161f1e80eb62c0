//! Access to the sprite archive that textures are built from.
//!
//! The archive consists of two files:
//!
//! - an index of 16-byte little-endian records, one per sprite id in order:
//!   `address:u32 size:u32 x_offset:i16 y_offset:i16 width:u16 height:u16`
//! - a data file of blocks, each starting with a 16-byte little-endian
//!   header `"RD" major:u8 minor:u8 width:u32 height:u32 size:u32` followed
//!   by the payload.

use std::{
    collections::HashMap,
    fs::File,
    io::{Read, Seek, SeekFrom},
    path::Path,
    sync::Mutex,
};

use anyhow::*;

use crate::data_structures::sprite::{SpriteBlock, SpriteInfo};

pub const INDEX_ENTRY_LEN: usize = 16;
pub const BLOCK_HEADER_LEN: usize = 16;
const BLOCK_MAGIC: &[u8; 2] = b"RD";

/// Where the texture manager fetches sprite metadata and pixel data from.
pub trait SpriteSource {
    fn sprite_info(&self, id: u32) -> Result<SpriteInfo>;
    fn sprite_block(&self, address: u32, size: u32) -> Result<SpriteBlock>;
}

/// A sprite source held entirely in memory.
#[derive(Debug, Default)]
pub struct MemorySpriteSource {
    infos: HashMap<u32, SpriteInfo>,
    blocks: HashMap<u32, SpriteBlock>,
}

impl MemorySpriteSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sprite. Its block is stored at `info.address`.
    pub fn insert(&mut self, id: u32, info: SpriteInfo, block: SpriteBlock) {
        self.infos.insert(id, info);
        self.blocks.insert(info.address, block);
    }
}

impl SpriteSource for MemorySpriteSource {
    fn sprite_info(&self, id: u32) -> Result<SpriteInfo> {
        self.infos
            .get(&id)
            .copied()
            .with_context(|| format!("no sprite with id {id}"))
    }

    fn sprite_block(&self, address: u32, _size: u32) -> Result<SpriteBlock> {
        self.blocks
            .get(&address)
            .cloned()
            .with_context(|| format!("no sprite block at address {address}"))
    }
}

/// A sprite source backed by an index file and a data file on disk.
///
/// The index is read eagerly; blocks are read on demand.
#[derive(Debug)]
pub struct ArchiveSpriteSource {
    index: Vec<SpriteInfo>,
    data: Mutex<File>,
}

impl ArchiveSpriteSource {
    pub fn open(index_path: impl AsRef<Path>, data_path: impl AsRef<Path>) -> Result<Self> {
        let index_path = index_path.as_ref();
        let data_path = data_path.as_ref();
        let raw = std::fs::read(index_path)
            .with_context(|| format!("cannot read sprite index {}", index_path.display()))?;
        let index = parse_index(&raw)
            .with_context(|| format!("invalid sprite index {}", index_path.display()))?;
        let data = File::open(data_path)
            .with_context(|| format!("cannot open sprite data {}", data_path.display()))?;
        log::info!(
            "Opened sprite archive {} with {} sprites",
            index_path.display(),
            index.len()
        );
        Ok(Self {
            index,
            data: Mutex::new(data),
        })
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

impl SpriteSource for ArchiveSpriteSource {
    fn sprite_info(&self, id: u32) -> Result<SpriteInfo> {
        self.index.get(id as usize).copied().with_context(|| {
            format!("sprite id {id} is outside the index ({} entries)", self.index.len())
        })
    }

    fn sprite_block(&self, address: u32, size: u32) -> Result<SpriteBlock> {
        let raw = {
            let mut file = self
                .data
                .lock()
                .map_err(|_| anyhow!("sprite data file lock poisoned"))?;
            let file_len = file.metadata()?.len();
            ensure!(
                address as u64 + size as u64 <= file_len,
                "block of {size} bytes at address {address} runs past the end of the data file ({file_len} bytes)"
            );
            let mut raw = vec![0u8; size as usize];
            file.seek(SeekFrom::Start(address as u64))?;
            file.read_exact(&mut raw)
                .with_context(|| format!("cannot read {size} bytes at address {address}"))?;
            raw
        };
        parse_block(&raw).with_context(|| format!("invalid sprite block at address {address}"))
    }
}

pub fn parse_index(raw: &[u8]) -> Result<Vec<SpriteInfo>> {
    ensure!(
        raw.len() % INDEX_ENTRY_LEN == 0,
        "index length {} is not a multiple of {}",
        raw.len(),
        INDEX_ENTRY_LEN
    );
    Ok(raw
        .chunks_exact(INDEX_ENTRY_LEN)
        .map(|entry| SpriteInfo {
            address: u32::from_le_bytes([entry[0], entry[1], entry[2], entry[3]]),
            size: u32::from_le_bytes([entry[4], entry[5], entry[6], entry[7]]),
            x_offset: i16::from_le_bytes([entry[8], entry[9]]),
            y_offset: i16::from_le_bytes([entry[10], entry[11]]),
            width: u16::from_le_bytes([entry[12], entry[13]]),
            height: u16::from_le_bytes([entry[14], entry[15]]),
        })
        .collect())
}

pub fn parse_block(raw: &[u8]) -> Result<SpriteBlock> {
    ensure!(
        raw.len() >= BLOCK_HEADER_LEN,
        "block is {} bytes, shorter than its header",
        raw.len()
    );
    ensure!(&raw[..2] == BLOCK_MAGIC, "missing 'RD' block magic");
    let declared = u32::from_le_bytes([raw[12], raw[13], raw[14], raw[15]]) as usize;
    if declared != raw.len() {
        log::warn!(
            "sprite block declares {} bytes but {} were read",
            declared,
            raw.len()
        );
    }
    Ok(SpriteBlock {
        major: raw[2],
        minor: raw[3],
        data: raw[BLOCK_HEADER_LEN..].to_vec(),
    })
}

/// Encode an index entry in the archive layout.
pub fn encode_index_entry(info: &SpriteInfo) -> [u8; INDEX_ENTRY_LEN] {
    let mut out = [0u8; INDEX_ENTRY_LEN];
    out[0..4].copy_from_slice(&info.address.to_le_bytes());
    out[4..8].copy_from_slice(&info.size.to_le_bytes());
    out[8..10].copy_from_slice(&info.x_offset.to_le_bytes());
    out[10..12].copy_from_slice(&info.y_offset.to_le_bytes());
    out[12..14].copy_from_slice(&info.width.to_le_bytes());
    out[14..16].copy_from_slice(&info.height.to_le_bytes());
    out
}

/// Encode a data block in the archive layout.
pub fn encode_block(block: &SpriteBlock, width: u32, height: u32) -> Vec<u8> {
    let size = (BLOCK_HEADER_LEN + block.data.len()) as u32;
    let mut out = Vec::with_capacity(size as usize);
    out.extend_from_slice(BLOCK_MAGIC);
    out.push(block.major);
    out.push(block.minor);
    out.extend_from_slice(&width.to_le_bytes());
    out.extend_from_slice(&height.to_le_bytes());
    out.extend_from_slice(&size.to_le_bytes());
    out.extend_from_slice(&block.data);
    out
}
