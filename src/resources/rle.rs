//! Run-length codec used by compressed sprite blocks.
//!
//! Every run starts with a header byte whose range selects the run kind
//! and how many count bytes follow:
//!
//! | header    | run                          | count bytes |
//! |-----------|------------------------------|-------------|
//! | `0x00..`  | copy literal bytes           | 0 (low nibble is the count) |
//! | `0x10..`  | copy literal bytes           | 1           |
//! | `0x20..`  | copy literal bytes           | 2           |
//! | `0x80..`  | repeat the next byte         | 0           |
//! | `0x90..`  | repeat the next byte         | 1           |
//! | `0xa0..`  | repeat the next byte         | 2           |
//! | `0xc0..`  | repeat zero (transparent)    | 0           |
//! | `0xd0..`  | repeat zero (transparent)    | 1           |
//! | `0xe0..`  | repeat zero (transparent)    | 2           |
//!
//! The header's offset within its range forms the most significant part of
//! the count; count bytes follow in big-endian order.

use anyhow::*;

enum Run {
    Copy,
    Fill(u8),
}

/// Decode `src` into `dst` and return the number of bytes written.
///
/// Runs are clamped to the space left in `dst`, and literal copies to the
/// input left in `src`. A header whose count or fill byte is missing is an
/// error.
pub fn decode_run_length(src: &[u8], dst: &mut [u8]) -> Result<usize> {
    let mut read = 0;
    let mut write = 0;
    let next = |read: &mut usize| -> Result<u8> {
        let byte = *src
            .get(*read)
            .with_context(|| format!("run-length data truncated at byte {}", *read))?;
        *read += 1;
        Ok(byte)
    };

    while read < src.len() {
        let head = next(&mut read)?;
        let (run, high, count_bytes) = match head {
            224..=255 => (Run::Fill(0), head - 224, 2),
            208..=223 => (Run::Fill(0), head - 208, 1),
            192..=207 => (Run::Fill(0), head - 192, 0),
            160..=191 => (Run::Fill(next(&mut read)?), head - 160, 2),
            144..=159 => (Run::Fill(next(&mut read)?), head - 144, 1),
            128..=143 => (Run::Fill(next(&mut read)?), head - 128, 0),
            32..=127 => (Run::Copy, head - 32, 2),
            16..=31 => (Run::Copy, head - 16, 1),
            _ => (Run::Copy, head, 0),
        };
        let mut total = high as usize;
        for _ in 0..count_bytes {
            total = (total << 8) | next(&mut read)? as usize;
        }

        let total = total.min(dst.len() - write);
        match run {
            Run::Copy => {
                let total = total.min(src.len() - read);
                dst[write..write + total].copy_from_slice(&src[read..read + total]);
                read += total;
                write += total;
            }
            Run::Fill(value) => {
                dst[write..write + total].fill(value);
                write += total;
            }
        }
    }

    Ok(write)
}

/// Reverse the row order of a `width * height` bitmap in place.
pub fn flip_vertical(data: &mut [u8], width: usize, height: usize) -> Result<()> {
    ensure!(
        data.len() >= width * height,
        "cannot flip {}x{} bitmap stored in {} bytes",
        width,
        height,
        data.len()
    );
    for row in 0..height / 2 {
        let (top, bottom) = data.split_at_mut((height - row - 1) * width);
        top[row * width..(row + 1) * width].swap_with_slice(&mut bottom[..width]);
    }
    Ok(())
}
