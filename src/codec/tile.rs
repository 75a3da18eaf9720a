use bitflags::bitflags;

use super::Handle;
use crate::error::Result;

bitflags! {
    /// Packed per-tile state. `SEEN` is owned by the player-map overlay; every
    /// other bit is written only by the tile decoder.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct TileFlags: u16 {
        const ACTIVE      = 0x001;
        const LAVA        = 0x002;
        const HONEY       = 0x004;
        const RED_WIRE    = 0x008;
        const BLUE_WIRE   = 0x010;
        const GREEN_WIRE  = 0x020;
        const HALF        = 0x040;
        const ACTUATOR    = 0x080;
        const INACTIVE    = 0x100;
        const SEEN        = 0x200;
        const YELLOW_WIRE = 0x400;
        const SHIMMER     = 0x800;
    }
}

/// One cell of the world grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tile {
    pub kind: u16,
    pub wall: u16,
    pub u: i16,
    pub v: i16,
    pub wall_u: i16,
    pub wall_v: i16,
    pub color: u8,
    pub wall_color: u8,
    pub liquid: u8,
    pub slope: u8,
    pub flags: TileFlags,
}

impl Default for Tile {
    fn default() -> Self {
        Self {
            kind: 0,
            wall: 0,
            u: -1,
            v: -1,
            wall_u: -1,
            wall_v: -1,
            color: 0,
            wall_color: 0,
            liquid: 0,
            slope: 0,
            flags: TileFlags::empty(),
        }
    }
}

impl Tile {
    /// Decodes one tile record at the current cursor and returns the tile plus
    /// the run length: how many additional cells below it repeat this record.
    ///
    /// `extra` is the per-tile-kind bitmap from the file prologue; a set bit
    /// means the record carries u/v texture offsets for that kind.
    pub fn read(handle: &mut Handle, extra: &[bool]) -> Result<(Self, u32)> {
        let f1 = handle.r8()?;
        let mut f2 = 0u8;
        let mut f3 = 0u8;
        if f1 & 0x01 != 0 {
            f2 = handle.r8()?;
            if f2 & 0x01 != 0 {
                f3 = handle.r8()?;
            }
        }

        let mut tile = Tile::default();
        if f1 & 0x02 != 0 {
            tile.flags |= TileFlags::ACTIVE;
            let mut kind = u16::from(handle.r8()?);
            if f1 & 0x20 != 0 {
                kind |= u16::from(handle.r8()?) << 8;
            }
            tile.kind = kind;
            if extra.get(kind as usize).copied().unwrap_or(false) {
                tile.u = handle.r16()?;
                tile.v = handle.r16()?;
            }
            if f3 & 0x08 != 0 {
                tile.color = handle.r8()?;
            }
        }

        if f1 & 0x04 != 0 {
            tile.wall = u16::from(handle.r8()?);
            if f3 & 0x10 != 0 {
                tile.wall_color = handle.r8()?;
            }
        }

        if f1 & 0x18 != 0 {
            tile.liquid = handle.r8()?;
            if f1 & 0x18 == 0x10 {
                tile.flags |= TileFlags::LAVA;
            }
            if f1 & 0x18 == 0x18 {
                tile.flags |= TileFlags::HONEY;
            }
            if f3 & 0x80 != 0 {
                tile.flags |= TileFlags::SHIMMER;
            }
        }

        if f2 & 0x02 != 0 {
            tile.flags |= TileFlags::RED_WIRE;
        }
        if f2 & 0x04 != 0 {
            tile.flags |= TileFlags::BLUE_WIRE;
        }
        if f2 & 0x08 != 0 {
            tile.flags |= TileFlags::GREEN_WIRE;
        }
        let slop = (f2 >> 4) & 7;
        if slop == 1 {
            tile.flags |= TileFlags::HALF;
        }
        tile.slope = if slop > 1 { slop - 1 } else { 0 };

        if f3 & 0x02 != 0 {
            tile.flags |= TileFlags::ACTUATOR;
        }
        if f3 & 0x04 != 0 {
            tile.flags |= TileFlags::INACTIVE;
        }
        if f3 & 0x20 != 0 {
            tile.flags |= TileFlags::YELLOW_WIRE;
        }
        if f3 & 0x40 != 0 {
            // walls grew past 255; high byte trails the rest of the record
            tile.wall |= u16::from(handle.r8()?) << 8;
        }

        let rle = match f1 >> 6 {
            1 => u32::from(handle.r8()?),
            2 => u32::from(handle.r16()? as u16),
            _ => 0,
        };
        Ok((tile, rle))
    }

    pub fn active(&self) -> bool {
        self.flags.contains(TileFlags::ACTIVE)
    }

    pub fn lava(&self) -> bool {
        self.flags.contains(TileFlags::LAVA)
    }

    pub fn honey(&self) -> bool {
        self.flags.contains(TileFlags::HONEY)
    }

    pub fn shimmer(&self) -> bool {
        self.flags.contains(TileFlags::SHIMMER)
    }

    pub fn red_wire(&self) -> bool {
        self.flags.contains(TileFlags::RED_WIRE)
    }

    pub fn blue_wire(&self) -> bool {
        self.flags.contains(TileFlags::BLUE_WIRE)
    }

    pub fn green_wire(&self) -> bool {
        self.flags.contains(TileFlags::GREEN_WIRE)
    }

    pub fn yellow_wire(&self) -> bool {
        self.flags.contains(TileFlags::YELLOW_WIRE)
    }

    pub fn half(&self) -> bool {
        self.flags.contains(TileFlags::HALF)
    }

    pub fn actuator(&self) -> bool {
        self.flags.contains(TileFlags::ACTUATOR)
    }

    pub fn inactive(&self) -> bool {
        self.flags.contains(TileFlags::INACTIVE)
    }

    pub fn seen(&self) -> bool {
        self.flags.contains(TileFlags::SEEN)
    }

    pub fn set_seen(&mut self, seen: bool) {
        self.flags.set(TileFlags::SEEN, seen);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(bytes: &[u8], extra: &[bool]) -> (Tile, u32) {
        let mut h = Handle::from_vec(bytes.to_vec());
        Tile::read(&mut h, extra).unwrap()
    }

    #[test]
    fn test_empty_tile() {
        let (tile, rle) = decode(&[0x00], &[]);
        assert_eq!(tile, Tile::default());
        assert_eq!(rle, 0);
        assert!(!tile.active());
        assert_eq!(tile.u, -1);
        assert_eq!(tile.wall_u, -1);
    }

    #[test]
    fn test_empty_tile_with_byte_rle() {
        let (tile, rle) = decode(&[0x40, 0x09], &[]);
        assert_eq!(tile, Tile::default());
        assert_eq!(rle, 9);
    }

    #[test]
    fn test_active_tile_with_extras() {
        // f1: active | wall | lava-low | byte rle; f2 present with red+blue wire
        // and the flags3 chain carrying wall color
        let extra = {
            let mut e = vec![false; 8];
            e[5] = true;
            e
        };
        let bytes = [
            0x40 | 0x01 | 0x02 | 0x04 | 0x10, // f1 = 0x57
            0x01 | 0x02 | 0x04,               // f2: f3 follows, red, blue
            0x10,                             // f3: wall color
            5,                                // kind
            0x10, 0x00,                       // u = 16
            0x20, 0x00,                       // v = 32
            7,                                // wall
            3,                                // wall color
            128,                              // liquid
            3,                                // rle
        ];
        let (tile, rle) = decode(&bytes, &extra);
        assert!(tile.active());
        assert!(tile.lava());
        assert!(!tile.honey());
        assert!(tile.red_wire());
        assert!(tile.blue_wire());
        assert!(!tile.green_wire());
        assert_eq!(tile.kind, 5);
        assert_eq!(tile.u, 16);
        assert_eq!(tile.v, 32);
        assert_eq!(tile.wall, 7);
        assert_eq!(tile.wall_color, 3);
        assert_eq!(tile.liquid, 128);
        assert_eq!(rle, 3);
    }

    #[test]
    fn test_two_byte_kind_and_no_extra() {
        // f1: active | wide kind; kind = 0x0104, bitmap has no bit for it
        let (tile, rle) = decode(&[0x02 | 0x20, 0x04, 0x01], &[true; 4]);
        assert_eq!(tile.kind, 0x0104);
        assert_eq!(tile.u, -1);
        assert_eq!(tile.v, -1);
        assert_eq!(rle, 0);
    }

    #[test]
    fn test_honey_and_shimmer() {
        // f1: flags2 | honey (0x18); f2 chains f3; f3 shimmer bit
        let (tile, _) = decode(&[0x01 | 0x18, 0x01, 0x80, 42], &[]);
        assert!(tile.honey());
        assert!(!tile.lava());
        assert!(tile.shimmer());
        assert_eq!(tile.liquid, 42);
    }

    #[test]
    fn test_slope_and_half() {
        // slop nibble 1 means half-block, anything above shifts down by one
        let (tile, _) = decode(&[0x01, 0x10], &[]);
        assert!(tile.half());
        assert_eq!(tile.slope, 0);

        let (tile, _) = decode(&[0x01, 0x30], &[]);
        assert!(!tile.half());
        assert_eq!(tile.slope, 2);
    }

    #[test]
    fn test_wall_high_byte() {
        // f1: flags2 | wall; f2 chains f3; f3: wall high byte follows
        let (tile, _) = decode(&[0x01 | 0x04, 0x01, 0x40, 0x07, 0x01], &[]);
        assert_eq!(tile.wall, 0x0107);
    }

    #[test]
    fn test_actuator_inactive_yellow() {
        let (tile, _) = decode(&[0x01, 0x01, 0x02 | 0x04 | 0x20], &[]);
        assert!(tile.actuator());
        assert!(tile.inactive());
        assert!(tile.yellow_wire());
    }

    #[test]
    fn test_word_rle() {
        let (_, rle) = decode(&[0x80, 0x34, 0x12], &[]);
        assert_eq!(rle, 0x1234);
    }

    #[test]
    fn test_decode_is_deterministic() {
        let extra = vec![true; 8];
        let bytes = [0x57u8, 0x07, 0x10, 5, 0x10, 0, 0x20, 0, 7, 3, 128, 3];
        let a = decode(&bytes, &extra);
        let b = decode(&bytes, &extra);
        assert_eq!(a, b);
    }

    #[test]
    fn test_seen_bit_survives_copy() {
        let mut tile = Tile::default();
        tile.set_seen(true);
        let copy = tile;
        assert!(copy.seen());
        let mut copy = copy;
        copy.set_seen(false);
        assert!(!copy.seen());
        assert!(tile.seen());
    }
}
