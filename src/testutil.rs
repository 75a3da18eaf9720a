//! Fixture helpers for the in-module tests: a little-endian byte writer that
//! mirrors `Handle`'s read primitives, and a world-file builder producing
//! complete section-tabled files.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

pub(crate) struct ByteWriter(Vec<u8>);

impl ByteWriter {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }

    pub fn u8(&mut self, v: u8) {
        self.0.push(v);
    }

    pub fn i16(&mut self, v: i16) {
        self.0.extend_from_slice(&v.to_le_bytes());
    }

    pub fn i32(&mut self, v: i32) {
        self.0.extend_from_slice(&v.to_le_bytes());
    }

    pub fn i64(&mut self, v: i64) {
        self.0.extend_from_slice(&v.to_le_bytes());
    }

    pub fn f32(&mut self, v: f32) {
        self.0.extend_from_slice(&v.to_le_bytes());
    }

    pub fn f64(&mut self, v: f64) {
        self.0.extend_from_slice(&v.to_le_bytes());
    }

    pub fn bytes(&mut self, v: &[u8]) {
        self.0.extend_from_slice(v);
    }

    pub fn varint(&mut self, mut v: u32) {
        loop {
            let mut byte = (v & 0x7f) as u8;
            v >>= 7;
            if v != 0 {
                byte |= 0x80;
            }
            self.0.push(byte);
            if v == 0 {
                break;
            }
        }
    }

    pub fn string(&mut self, s: &str) {
        self.varint(s.len() as u32);
        self.0.extend_from_slice(s.as_bytes());
    }

    /// Inverse of `Handle::read_bit_vec`: same walking mask, writing side.
    pub fn bit_vec(&mut self, bits: &[bool]) {
        let mut mask = 0x80u8;
        let mut acc = 0u8;
        let mut started = false;
        for &bit in bits {
            if mask == 0x80 {
                if started {
                    self.0.push(acc);
                }
                acc = 0;
                mask = 1;
                started = true;
            } else {
                mask <<= 1;
            }
            if bit {
                acc |= mask;
            }
        }
        if started {
            self.0.push(acc);
        }
    }

    pub fn patch_i32(&mut self, at: usize, v: i32) {
        self.0[at..at + 4].copy_from_slice(&v.to_le_bytes());
    }
}

static COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Fresh directory under the system temp dir, unique per test.
pub(crate) fn temp_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "terra-world-test-{}-{}",
        std::process::id(),
        COUNTER.fetch_add(1, Ordering::Relaxed)
    ));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Builds complete world files: prologue, section table, a header matching the
/// builtin schema for the chosen version, and per-section byte blocks that
/// individual tests can override.
pub(crate) struct WorldFile {
    pub version: i32,
    pub width: usize,
    pub height: usize,
    pub world_id: i32,
    pub guid: [u8; 16],
    pub extra: Vec<bool>,
    pub tile_stream: Option<Vec<u8>>,
    pub chests: Option<Vec<u8>>,
    pub signs: Option<Vec<u8>>,
    pub npcs: Option<Vec<u8>>,
    pub entities: Option<Vec<u8>>,
    pub bestiary: Option<Vec<u8>>,
}

impl WorldFile {
    pub fn new(version: i32, width: usize, height: usize) -> Self {
        Self {
            version,
            width,
            height,
            world_id: 42,
            guid: [0; 16],
            extra: vec![false],
            tile_stream: None,
            chests: None,
            signs: None,
            npcs: None,
            entities: None,
            bestiary: None,
        }
    }

    fn header_block(&self) -> Vec<u8> {
        let v = self.version;
        let mut w = ByteWriter::new();
        w.string("Test World");
        if v >= 179 {
            w.string("123"); // seed text
            w.i64(4); // worldgen version
        }
        if v >= 181 {
            w.bytes(&self.guid);
        }
        w.i32(self.world_id);
        w.i32(0); // left
        w.i32((self.width * 16) as i32); // right
        w.i32(0); // top
        w.i32((self.height * 16) as i32); // bottom
        w.i32(self.height as i32);
        w.i32(self.width as i32);
        if v >= 209 {
            w.i32(0); // game mode
        }
        for gate in [222, 227, 238, 239, 241, 249, 266, 267] {
            if v >= gate {
                w.u8(0); // special-seed flags
            }
        }
        if (112..=208).contains(&v) {
            w.u8(0); // expert mode
        }
        if v >= 141 {
            w.i64(0); // creation time
        }
        w.u8(0); // moon type
        for _ in 0..3 {
            w.i32(0); // treeX
        }
        for _ in 0..4 {
            w.i32(0); // treeStyle
        }
        for _ in 0..3 {
            w.i32(0); // caveBackX
        }
        for _ in 0..4 {
            w.i32(0); // caveBackStyle
        }
        w.i32(0); // ice back
        w.i32(0); // jungle back
        w.i32(0); // hell back
        w.i32((self.width / 2) as i32); // spawn x
        w.i32(0); // spawn y
        w.f64(1.0); // ground level
        w.f64(2.0); // rock level
        w.f64(0.0); // time
        w.u8(1); // day
        w.i32(0); // moon phase
        w.u8(0); // blood moon
        w.u8(0); // eclipse
        w.i32(0); // dungeon x
        w.i32(0); // dungeon y
        w.u8(0); // crimson
        w.into_vec()
    }

    fn default_tile_stream(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        for _ in 0..self.width {
            if self.height == 1 {
                bytes.push(0x00);
            } else {
                // one empty record with a run filling the column
                bytes.push(0x40);
                bytes.push((self.height - 1) as u8);
            }
        }
        bytes
    }

    fn default_npcs(&self) -> Vec<u8> {
        let mut w = ByteWriter::new();
        if self.version >= 268 {
            w.i32(0); // shimmered count
        }
        w.u8(0); // homed stop
        if self.version >= 140 {
            w.u8(0); // homeless stop
        }
        w.into_vec()
    }

    pub fn build(&self) -> Vec<u8> {
        let mut w = ByteWriter::new();
        w.i32(self.version);
        if self.version >= 135 {
            w.bytes(b"relogic");
            w.u8(2);
            w.bytes(&[0; 4]); // revision
            w.bytes(&[0; 8]); // favorites
        }
        let num_sections = 11usize;
        w.i16(num_sections as i16);
        let table_at = w.len();
        for _ in 0..num_sections {
            w.i32(0);
        }
        w.i16(self.extra.len() as i16);
        w.bit_vec(&self.extra);

        let mut empty_count = ByteWriter::new();
        empty_count.i32(0);
        let default_bestiary = {
            let mut b = ByteWriter::new();
            for _ in 0..3 {
                b.i32(0);
            }
            b.into_vec()
        };

        let blocks: Vec<Vec<u8>> = vec![
            self.header_block(),
            self.tile_stream.clone().unwrap_or_else(|| self.default_tile_stream()),
            self.chests.clone().unwrap_or_else(|| vec![0, 0, 0, 0]),
            self.signs.clone().unwrap_or_else(|| vec![0, 0]),
            self.npcs.clone().unwrap_or_else(|| self.default_npcs()),
            self.entities.clone().unwrap_or_else(|| empty_count.into_vec()),
            {
                let mut b = ByteWriter::new();
                b.i32(0);
                b.into_vec()
            }, // pressure plates
            {
                let mut b = ByteWriter::new();
                b.i32(0);
                b.into_vec()
            }, // town manager
            self.bestiary.clone().unwrap_or(default_bestiary),
            Vec::new(), // creative powers
        ];

        let mut offsets = Vec::with_capacity(num_sections);
        for block in &blocks {
            offsets.push(w.len() as i32);
            w.bytes(block);
        }
        while offsets.len() < num_sections {
            offsets.push(w.len() as i32); // trailing sections point at EOF
        }
        for (i, off) in offsets.into_iter().enumerate() {
            w.patch_i32(table_at + 4 * i, off);
        }
        w.into_vec()
    }

    pub fn write_to(&self, path: &Path) {
        std::fs::write(path, self.build()).unwrap();
    }
}
