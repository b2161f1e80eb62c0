//! Builds texture records from the sprite archive and caches them in memory
//! and on disk.
//!
//! Lookups go through three layers:
//! 1. the in-memory map,
//! 2. the disk cache at `<output_dir>/textures/<id>.bin`, stored in the
//!    texture record layout so it can be served to clients as-is,
//! 3. the sprite source, which is decoded, flipped and written to the disk
//!    cache.

use std::{
    collections::HashMap,
    fs,
    path::PathBuf,
    sync::{Arc, Mutex},
};

use anyhow::{Context as _, Result, anyhow, ensure};
use instant::Instant;

use crate::{
    context::Context,
    data_structures::{
        sprite::{SpriteBlock, SpriteInfo},
        texture::{ByteOrder, Texture, pixel_count},
    },
    resources::{
        rle::{decode_run_length, flip_vertical},
        sprites::SpriteSource,
    },
};

pub struct TextureManager<S: SpriteSource> {
    source: S,
    texture_dir: PathBuf,
    byte_order: ByteOrder,
    textures: Mutex<HashMap<u32, Arc<Texture>>>,
}

impl<S: SpriteSource> TextureManager<S> {
    /// Create a manager whose disk cache lives in `ctx.texture_dir()`.
    pub fn new(ctx: &Context, source: S) -> Result<Self> {
        let texture_dir = ctx.texture_dir();
        fs::create_dir_all(&texture_dir)
            .with_context(|| format!("cannot create {}", texture_dir.display()))?;
        Ok(Self {
            source,
            texture_dir,
            byte_order: ctx.byte_order,
            textures: Mutex::new(HashMap::new()),
        })
    }

    /// Path of the disk cache entry for `id`.
    pub fn texture_path(&self, id: u32) -> PathBuf {
        self.texture_dir.join(format!("{id}.bin"))
    }

    /// Number of textures held in memory.
    pub fn cached_len(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    /// Look up texture `id`, building it on a miss. The cache lock is held
    /// through the build, so concurrent callers share one texture.
    pub fn texture(&self, id: u32) -> Result<Arc<Texture>> {
        let mut textures = self.lock()?;
        if let Some(texture) = textures.get(&id) {
            return Ok(texture.clone());
        }

        let texture = match self.read_cached(id) {
            Some(texture) => texture,
            None => {
                let start = Instant::now();
                let texture = self.build(id)?;
                self.write_cached(id, &texture)?;
                log::debug!("Built texture {} in {:?}", id, start.elapsed());
                texture
            }
        };
        let texture = Arc::new(texture);
        textures.insert(id, texture.clone());
        Ok(texture)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<u32, Arc<Texture>>>> {
        self.textures
            .lock()
            .map_err(|_| anyhow!("texture cache lock poisoned"))
    }

    fn read_cached(&self, id: u32) -> Option<Texture> {
        let path = self.texture_path(id);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                log::warn!("Cannot read {}, rebuilding: {}", path.display(), e);
                return None;
            }
        };
        match Texture::from_bytes(&bytes, self.byte_order) {
            Ok(texture) => Some(texture),
            Err(e) => {
                log::warn!("Corrupt texture cache {}, rebuilding: {:#}", path.display(), e);
                None
            }
        }
    }

    fn write_cached(&self, id: u32, texture: &Texture) -> Result<()> {
        let path = self.texture_path(id);
        fs::write(&path, texture.to_bytes(self.byte_order))
            .with_context(|| format!("could not write {}", path.display()))
    }

    fn build(&self, id: u32) -> Result<Texture> {
        let info = self.source.sprite_info(id)?;
        let block = self
            .source
            .sprite_block(info.address, info.size)
            .with_context(|| format!("cannot load block of sprite {id}"))?;
        create_texture(&info, block).with_context(|| format!("cannot build texture {id}"))
    }
}

/// Turn a sprite's index entry and data block into a texture.
///
/// Compressed blocks are run-length decoded into a `width * height` bitmap;
/// raw blocks must hold at least that many bytes and are truncated to it.
/// Sprites are stored bottom-up, so rows are flipped.
pub fn create_texture(info: &SpriteInfo, block: SpriteBlock) -> Result<Texture> {
    let len = pixel_count(info.width, info.height);
    let mut bitmap = if block.is_run_length() {
        let mut bitmap = vec![0u8; len];
        let written = decode_run_length(&block.data, &mut bitmap)?;
        if written < len {
            log::warn!(
                "run-length data filled {} of {} pixels, the rest stays transparent",
                written,
                len
            );
        }
        bitmap
    } else {
        let mut data = block.data;
        ensure!(
            data.len() >= len,
            "raw block has {} bytes but {}x{} needs {}",
            data.len(),
            info.width,
            info.height,
            len
        );
        data.truncate(len);
        data
    };
    flip_vertical(&mut bitmap, info.width as usize, info.height as usize)?;
    Texture::new(info.x_offset, info.y_offset, info.width, info.height, bitmap)
}
