use std::io::Read;
use std::path::{Path, PathBuf};

use flate2::read::DeflateDecoder;

use super::{Handle, Header, Tile};
use crate::error::{Error, Result};
use crate::events::EventSender;

/// Merges a player's companion seen-map into a decoded tile grid.
///
/// The companion file lives in a directory named after the player file minus
/// its extension, named either by the world GUID or by the numeric world id.
/// When no companion exists the whole grid is marked seen, so a viewer shows
/// the map instead of solid fog.
pub(crate) fn overlay(
    player: &Path,
    header: &Header,
    tiles: &mut [Tile],
    width: usize,
    height: usize,
    events: &EventSender,
) -> Result<()> {
    events.status("Loading player map...");
    let Some(path) = locate(player, header) else {
        for tile in tiles.iter_mut() {
            tile.set_seen(true);
        }
        return Ok(());
    };

    let mut handle = Handle::open(&path)?;
    let version = handle.r32()?;
    if version <= 91 {
        decode_v1(&mut handle, version, tiles, width, height)
    } else {
        decode_v2(handle, version, tiles, width, height)
    }
}

fn locate(player: &Path, header: &Header) -> Option<PathBuf> {
    let base = player.with_extension("");
    if let Ok(guid) = header.get_bytes("guid") {
        if let Some(stem) = guid_file_stem(guid) {
            let candidate = base.join(format!("{stem}.map"));
            if candidate.exists() {
                return Some(candidate);
            }
        }
    }
    let world_id = header.get_i32("worldID").ok()?;
    let candidate = base.join(format!("{world_id}.map"));
    candidate.exists().then_some(candidate)
}

/// Filename form of the world GUID: first three groups little-endian, last
/// three big-endian. This is the map writer's own convention, not a standard
/// UUID rendering, so it is spelled out here rather than borrowed from one.
pub(crate) fn guid_file_stem(guid: &[u8]) -> Option<String> {
    let g: &[u8; 16] = guid.try_into().ok()?;
    let u1 = u32::from_le_bytes([g[0], g[1], g[2], g[3]]);
    let u2 = u16::from_le_bytes([g[4], g[5]]);
    let u3 = u16::from_le_bytes([g[6], g[7]]);
    let u4 = u16::from_be_bytes([g[8], g[9]]);
    let u5 = u16::from_be_bytes([g[10], g[11]]);
    let u6 = u32::from_be_bytes([g[12], g[13], g[14], g[15]]);
    Some(format!(
        "{u1:08x}-{u2:04x}-{u3:04x}-{u4:04x}-{u5:04x}-{u6:08x}"
    ))
}

/// Legacy layout: column-major presence records with i16 runs. The stored
/// dimensions are informational; the world's grid wins.
fn decode_v1(
    handle: &mut Handle,
    version: i32,
    tiles: &mut [Tile],
    width: usize,
    height: usize,
) -> Result<()> {
    handle.rs()?; // name
    handle.r32()?; // world id
    handle.r32()?; // rows
    handle.r32()?; // cols
    for x in 0..width {
        let mut offset = x;
        let mut y = 0usize;
        while y < height {
            let seen = handle.read_bool()?;
            if seen {
                if version <= 77 {
                    handle.r8()?; // tile id
                } else {
                    handle.r16()?; // tile id
                }
                handle.r8()?; // light
                handle.r8()?; // misc
                if version >= 50 {
                    handle.r8()?; // misc2
                }
                tiles[offset].set_seen(true);
            }
            let mut rle = handle.r16()? as u16 as usize;
            while rle > 0 {
                y += 1;
                offset += width;
                if y >= height {
                    return Err(Error::CorruptPlayerMap { at: handle.pos() });
                }
                tiles[offset].set_seen(seen);
                rle -= 1;
            }
            y += 1;
            offset += width;
        }
    }
    Ok(())
}

/// Modern layout: optional magic prologue, per-id metadata tables, then a
/// row-major seen body that is DEFLATE-compressed from version 93 on.
fn decode_v2(
    mut handle: Handle,
    version: i32,
    tiles: &mut [Tile],
    width: usize,
    height: usize,
) -> Result<()> {
    if version >= 135 {
        if handle.read_bytes(7)? != b"relogic" {
            return Err(Error::NotARelogicMap);
        }
        if handle.r8()? != 1 {
            return Err(Error::NotAMapFile);
        }
        handle.skip(4 + 8)?; // revision + favorites
    }

    handle.rs()?; // name
    handle.r32()?; // world id
    handle.r32()?; // rows
    handle.r32()?; // cols

    let num_tiles = handle.r16()?.max(0) as usize;
    let num_walls = handle.r16()?.max(0) as usize;
    for _ in 0..4 {
        handle.r16()?; // reserved id counts
    }
    let tile_present = handle.read_bit_vec(num_tiles)?;
    let wall_present = handle.read_bit_vec(num_walls)?;
    for &present in &tile_present {
        if present {
            handle.r8()?; // per-tile metadata
        }
    }
    for &present in &wall_present {
        if present {
            handle.r8()?; // per-wall metadata
        }
    }

    let mut handle = if version >= 93 {
        // remainder is a raw RFC 1951 stream, no zlib framing
        let n = handle.remaining();
        let compressed = handle.read_bytes(n)?;
        let mut payload = Vec::new();
        DeflateDecoder::new(compressed)
            .read_to_end(&mut payload)
            .map_err(|_| Error::DeflateFailed)?;
        Handle::from_vec(payload)
    } else {
        handle
    };

    let total = width * height;
    let mut offset = 0usize;
    for _y in 0..height {
        let mut x = 0usize;
        while x < width {
            if offset >= total {
                return Err(Error::CorruptPlayerMap { at: handle.pos() });
            }
            let flags = handle.r8()?;
            if flags & 1 != 0 {
                handle.r8()?; // color
            }
            let tile_kind = (flags >> 1) & 7;
            if matches!(tile_kind, 1 | 2 | 7) {
                if flags & 16 != 0 {
                    handle.r16()?; // tile id
                } else {
                    handle.r8()?; // tile id
                }
            }
            let light = if flags & 32 != 0 { handle.r8()? } else { 255 };
            let mut rle = match (flags >> 6) & 3 {
                1 => usize::from(handle.r8()?),
                2 => handle.r16()? as u16 as usize,
                _ => 0,
            };

            let seen = tile_kind != 0;
            tiles[offset].set_seen(seen);
            while rle > 0 {
                x += 1;
                offset += 1;
                if offset >= total {
                    return Err(Error::CorruptPlayerMap { at: handle.pos() });
                }
                if seen && light != 255 {
                    handle.r8()?; // per-cell light for lit runs
                }
                tiles[offset].set_seen(seen);
                rle -= 1;
            }
            x += 1;
            offset += 1;
        }
    }
    Ok(())
}
