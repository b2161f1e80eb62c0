use std::{fs, sync::Arc};

use sw_resources::{
    ByteOrder, Context, Texture, TextureManager,
    data_structures::sprite::{SpriteBlock, SpriteInfo},
    resources::sprites::{
        ArchiveSpriteSource, MemorySpriteSource, encode_block, encode_index_entry, parse_block,
    },
};
use tempfile::TempDir;

use crate::common::test_utils::sprite;

mod common;

fn context(tmp: &TempDir) -> Context {
    Context::default().with_output_dir(tmp.path().join("output"))
}

fn source_with_raw_sprite() -> MemorySpriteSource {
    let mut source = MemorySpriteSource::new();
    // 2x3 sprite stored bottom-up, with one byte of padding
    let (info, block) = sprite(100, 2, 3, 0, vec![1, 2, 3, 4, 5, 6, 7]);
    source.insert(7, info, block);
    source
}

#[test]
fn builds_raw_sprites_flipped_and_truncated() {
    let tmp = TempDir::new().unwrap();
    let manager = TextureManager::new(&context(&tmp), source_with_raw_sprite()).unwrap();

    let texture = manager.texture(7).unwrap();
    assert_eq!((texture.x, texture.y), (-3, 12));
    assert_eq!((texture.width, texture.height), (2, 3));
    assert_eq!(texture.bitmap, vec![5, 6, 3, 4, 1, 2]);
}

#[test]
fn builds_run_length_sprites() {
    let tmp = TempDir::new().unwrap();
    let mut source = MemorySpriteSource::new();
    // row 0: three literal bytes, row 1: three transparent pixels
    let (info, block) = sprite(0, 3, 2, SpriteBlock::RUN_LENGTH, vec![0x03, 7, 8, 9, 0xc3]);
    source.insert(1, info, block);
    let manager = TextureManager::new(&context(&tmp), source).unwrap();

    let texture = manager.texture(1).unwrap();
    assert_eq!(texture.bitmap, vec![0, 0, 0, 7, 8, 9]);
}

#[test]
fn keeps_textures_in_memory() {
    let tmp = TempDir::new().unwrap();
    let manager = TextureManager::new(&context(&tmp), source_with_raw_sprite()).unwrap();

    let first = manager.texture(7).unwrap();
    let second = manager.texture(7).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(manager.cached_len().unwrap(), 1);
}

#[test]
fn writes_texture_records_to_disk_and_reuses_them() {
    let tmp = TempDir::new().unwrap();
    let ctx = context(&tmp).with_byte_order(ByteOrder::LittleEndian);
    let built = {
        let manager = TextureManager::new(&ctx, source_with_raw_sprite()).unwrap();
        let texture = manager.texture(7).unwrap();
        let on_disk = fs::read(manager.texture_path(7)).unwrap();
        assert_eq!(Texture::from_bytes(&on_disk, ByteOrder::LittleEndian).unwrap(), *texture);
        texture
    };

    // an empty source can only serve what is on disk
    let manager = TextureManager::new(&ctx, MemorySpriteSource::new()).unwrap();
    assert_eq!(*manager.texture(7).unwrap(), *built);
    assert!(manager.texture(8).is_err());
}

#[test]
fn rebuilds_corrupt_disk_cache_entries() {
    let tmp = TempDir::new().unwrap();
    let manager = TextureManager::new(&context(&tmp), source_with_raw_sprite()).unwrap();
    fs::write(manager.texture_path(7), [1u8, 2, 3]).unwrap();

    let texture = manager.texture(7).unwrap();
    assert_eq!(texture.bitmap, vec![5, 6, 3, 4, 1, 2]);
    let on_disk = fs::read(manager.texture_path(7)).unwrap();
    assert_eq!(on_disk.len(), 8 + 6);
}

#[test]
fn reports_missing_and_short_sprites() {
    let tmp = TempDir::new().unwrap();
    let mut source = MemorySpriteSource::new();
    let (info, block) = sprite(0, 4, 4, 0, vec![0; 10]);
    source.insert(2, info, block);
    let manager = TextureManager::new(&context(&tmp), source).unwrap();

    let err = manager.texture(1).unwrap_err();
    assert!(format!("{:#}", err).contains("no sprite with id 1"));
    let err = manager.texture(2).unwrap_err();
    assert!(format!("{:#}", err).contains("raw block has 10 bytes"));
    assert!(!manager.texture_path(2).exists());
}

#[test]
fn concurrent_lookups_share_one_texture() {
    let tmp = TempDir::new().unwrap();
    let manager = TextureManager::new(&context(&tmp), source_with_raw_sprite()).unwrap();

    let textures: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..8).map(|_| s.spawn(|| manager.texture(7).unwrap())).collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert!(textures.iter().all(|t| Arc::ptr_eq(t, &textures[0])));
}

#[test]
fn reads_sprites_from_archive_files() {
    let tmp = TempDir::new().unwrap();
    let (info_a, block_a) = sprite(0, 1, 2, 0, vec![10, 20]);
    let (info_b, block_b) = sprite(0, 2, 2, SpriteBlock::RUN_LENGTH, vec![0x84, 3]);

    let mut data = encode_block(&block_a, 1, 2);
    let info_a = SpriteInfo {
        address: 0,
        size: data.len() as u32,
        ..info_a
    };
    let encoded_b = encode_block(&block_b, 2, 2);
    let info_b = SpriteInfo {
        address: data.len() as u32,
        size: encoded_b.len() as u32,
        ..info_b
    };
    data.extend_from_slice(&encoded_b);
    let mut index = encode_index_entry(&info_a).to_vec();
    index.extend_from_slice(&encode_index_entry(&info_b));

    let index_path = tmp.path().join("sprites.idx");
    let data_path = tmp.path().join("sprites.dat");
    fs::write(&index_path, index).unwrap();
    fs::write(&data_path, data).unwrap();

    let source = ArchiveSpriteSource::open(&index_path, &data_path).unwrap();
    assert_eq!(source.len(), 2);
    let manager = TextureManager::new(&context(&tmp), source).unwrap();

    assert_eq!(manager.texture(0).unwrap().bitmap, vec![20, 10]);
    assert_eq!(manager.texture(1).unwrap().bitmap, vec![3, 3, 3, 3]);
    let err = manager.texture(2).unwrap_err();
    assert!(format!("{:#}", err).contains("outside the index"));
}

#[test]
fn rejects_malformed_archives() {
    let tmp = TempDir::new().unwrap();
    let index_path = tmp.path().join("bad.idx");
    let data_path = tmp.path().join("bad.dat");
    fs::write(&index_path, [0u8; 15]).unwrap();
    fs::write(&data_path, b"").unwrap();
    assert!(ArchiveSpriteSource::open(&index_path, &data_path).is_err());

    assert!(parse_block(&[b'X'; 16]).is_err());
}

#[test]
fn index_entries_past_the_data_file_are_rejected() {
    let tmp = TempDir::new().unwrap();
    let (info, block) = sprite(0, 1, 1, 0, vec![5]);
    let data = encode_block(&block, 1, 1);
    let huge = SpriteInfo {
        address: 4,
        size: u32::MAX,
        ..info
    };
    let index_path = tmp.path().join("sprites.idx");
    let data_path = tmp.path().join("sprites.dat");
    fs::write(&index_path, encode_index_entry(&huge)).unwrap();
    fs::write(&data_path, data).unwrap();

    let manager =
        TextureManager::new(&context(&tmp), ArchiveSpriteSource::open(&index_path, &data_path).unwrap())
            .unwrap();
    let err = manager.texture(0).unwrap_err();
    assert!(format!("{:#}", err).contains("runs past the end of the data file"));
    assert!(!manager.texture_path(0).exists());
}
