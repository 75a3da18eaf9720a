use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::codec::{player_map, Handle, Header, HeaderSchema, Tile};
use crate::error::{Error, Result};
use crate::events::EventSender;
use crate::info::InfoDb;
use crate::loader::CancelToken;
use crate::state::entity::{Chest, Entity, Npc, Sign};

/// Newest file version this decoder understands.
pub const HIGHEST_VERSION: i32 = 279;
/// Oldest supported version; earlier files predate the sectioned format.
pub const MINIMUM_VERSION: i32 = 88;

/// A fully decoded world: the tile grid plus everything the file's entity
/// sections carry. Produced whole by [`World::load`]; a failed load yields an
/// error instead of a partial world.
#[derive(Debug, Clone, Default)]
pub struct World {
    pub tiles_wide: usize,
    pub tiles_high: usize,
    /// Dense grid, row-major addressing: `tiles[y * tiles_wide + x]`.
    pub tiles: Vec<Tile>,
    pub header: Header,
    pub chests: Vec<Chest>,
    pub signs: Vec<Sign>,
    /// Homed NPCs first, homeless appended after.
    pub npcs: Vec<Npc>,
    pub entities: Vec<Entity>,
    /// Bestiary kill counts keyed by NPC internal name.
    pub kills: HashMap<String, i32>,
    pub seen_species: Vec<String>,
    pub chat_species: Vec<String>,
    pub shimmered: HashSet<i32>,
}

impl World {
    /// Decodes a world file, merging the player's seen-map when a player file
    /// path is supplied.
    pub fn load(
        world_path: &Path,
        player_path: Option<&Path>,
        db: &InfoDb,
        schema: &HeaderSchema,
    ) -> Result<World> {
        Self::load_with(
            world_path,
            player_path,
            db,
            schema,
            &EventSender::disabled(),
            &CancelToken::new(),
        )
    }

    /// As [`World::load`], reporting progress through `events` and honoring
    /// `cancel` at column boundaries and between sections.
    pub fn load_with(
        world_path: &Path,
        player_path: Option<&Path>,
        db: &InfoDb,
        schema: &HeaderSchema,
        events: &EventSender,
        cancel: &CancelToken,
    ) -> Result<World> {
        let mut handle = Handle::open(world_path)?;

        let version = handle.r32()?;
        if version > HIGHEST_VERSION {
            return Err(Error::UnsupportedVersion {
                found: version,
                highest: HIGHEST_VERSION,
            });
        }
        if version < MINIMUM_VERSION {
            return Err(Error::VersionTooOld {
                found: version,
                minimum: MINIMUM_VERSION,
            });
        }
        if version >= 135 {
            if handle.read_bytes(7)? != b"relogic" {
                return Err(Error::NotARelogicMap);
            }
            if handle.r8()? != 2 {
                return Err(Error::NotAMapFile);
            }
            handle.skip(4 + 8)?; // revision + favorites
        }

        let num_sections = handle.r16()?.max(0);
        let mut sections = Vec::with_capacity(num_sections as usize);
        for _ in 0..num_sections {
            sections.push(handle.r32()? as u64);
        }
        let num_tile_kinds = handle.r16()?.max(0) as usize;
        let extra = handle.read_bit_vec(num_tile_kinds)?;

        // each section is sought by table offset, so a decoder leaving
        // trailing bytes in its section is harmless
        handle.seek(section(&sections, 0)?);
        events.status("Reading header...");
        let header = schema.decode(&mut handle, version)?;
        let tiles_high = grid_dim(&header, "tilesHigh")?;
        let tiles_wide = grid_dim(&header, "tilesWide")?;
        let mut tiles = vec![Tile::default(); tiles_wide * tiles_high];

        handle.seek(section(&sections, 1)?);
        load_tiles(
            &mut handle,
            &extra,
            &mut tiles,
            tiles_wide,
            tiles_high,
            events,
            cancel,
        )?;

        cancel.check()?;
        handle.seek(section(&sections, 2)?);
        let chests = load_chests(&mut handle, db, events)?;

        cancel.check()?;
        handle.seek(section(&sections, 3)?);
        let signs = load_signs(&mut handle, events)?;

        cancel.check()?;
        handle.seek(section(&sections, 4)?);
        let (npcs, shimmered) = load_npcs(&mut handle, version, db, events)?;

        let mut entities = Vec::new();
        if version >= 116 {
            cancel.check()?;
            handle.seek(section(&sections, 5)?);
            if version < 122 {
                load_dummies(&mut handle, events)?;
            } else {
                entities = load_entities(&mut handle, events)?;
            }
        }
        if version >= 170 {
            cancel.check()?;
            handle.seek(section(&sections, 6)?);
            load_pressure_plates(&mut handle, events)?;
        }
        if version >= 189 {
            cancel.check()?;
            handle.seek(section(&sections, 7)?);
            load_town_manager(&mut handle, events)?;
        }

        let mut kills = HashMap::new();
        let mut seen_species = Vec::new();
        let mut chat_species = Vec::new();
        if version >= 210 {
            cancel.check()?;
            handle.seek(section(&sections, 8)?);
            load_bestiary(
                &mut handle,
                &mut kills,
                &mut seen_species,
                &mut chat_species,
                events,
            )?;
        }
        if version >= 220 {
            handle.seek(section(&sections, 9)?);
            // creative powers: present in the file, nothing the model keeps
        }

        let mut world = World {
            tiles_wide,
            tiles_high,
            tiles,
            header,
            chests,
            signs,
            npcs,
            entities,
            kills,
            seen_species,
            chat_species,
            shimmered,
        };
        if let Some(player) = player_path {
            world.overlay_player(player, events)?;
        }
        Ok(world)
    }

    /// Re-runs only the seen-map overlay against an already loaded world, for
    /// callers switching players without re-decoding the world file.
    pub fn overlay_player(&mut self, player: &Path, events: &EventSender) -> Result<()> {
        player_map::overlay(
            player,
            &self.header,
            &mut self.tiles,
            self.tiles_wide,
            self.tiles_high,
            events,
        )
    }

    pub fn tile(&self, x: usize, y: usize) -> Option<&Tile> {
        if x >= self.tiles_wide || y >= self.tiles_high {
            return None;
        }
        self.tiles.get(y * self.tiles_wide + x)
    }
}

fn section(sections: &[u64], index: usize) -> Result<u64> {
    sections
        .get(index)
        .copied()
        .ok_or(Error::MissingSection { index })
}

fn grid_dim(header: &Header, name: &str) -> Result<usize> {
    let value = header.get_i32(name)?;
    if value <= 0 {
        return Err(Error::HeaderField {
            name: name.to_owned(),
            problem: "not positive",
        });
    }
    Ok(value as usize)
}

/// Column-major tile grid decode. Each record's run is replicated straight
/// down its column, which carries every flag bit of the record.
fn load_tiles(
    handle: &mut Handle,
    extra: &[bool],
    tiles: &mut [Tile],
    width: usize,
    height: usize,
    events: &EventSender,
    cancel: &CancelToken,
) -> Result<()> {
    for x in 0..width {
        events.status(format!("Reading tiles: {}%", x * 100 / width));
        cancel.check()?;
        let mut offset = x;
        let mut y = 0usize;
        while y < height {
            let (tile, rle) = Tile::read(handle, extra)?;
            let rle = rle as usize;
            if y + rle >= height && rle > 0 {
                return Err(Error::CorruptTileStream {
                    x: x as i32,
                    y: y as i32,
                });
            }
            tiles[offset] = tile;
            let mut dest = offset + width;
            for _ in 0..rle {
                tiles[dest] = tile;
                dest += width;
            }
            offset = dest;
            y += rle + 1;
        }
    }
    Ok(())
}

fn load_chests(handle: &mut Handle, db: &InfoDb, events: &EventSender) -> Result<Vec<Chest>> {
    events.status("Loading Chests...");
    let num_chests = handle.r16()?.max(0);
    let items_per_chest = handle.r16()?;
    let mut chests = Vec::with_capacity(num_chests as usize);
    for _ in 0..num_chests {
        chests.push(Chest::read(handle, items_per_chest, db)?);
    }
    Ok(chests)
}

fn load_signs(handle: &mut Handle, events: &EventSender) -> Result<Vec<Sign>> {
    events.status("Loading Signs...");
    let num_signs = handle.r16()?.max(0);
    let mut signs = Vec::with_capacity(num_signs as usize);
    for _ in 0..num_signs {
        signs.push(Sign::read(handle)?);
    }
    Ok(signs)
}

fn load_npcs(
    handle: &mut Handle,
    version: i32,
    db: &InfoDb,
    events: &EventSender,
) -> Result<(Vec<Npc>, HashSet<i32>)> {
    events.status("Loading NPCs...");
    let mut shimmered = HashSet::new();
    if version >= 268 {
        let num = handle.r32()?.max(0);
        for _ in 0..num {
            shimmered.insert(handle.r32()?);
        }
    }
    let mut npcs = Vec::new();
    while handle.read_bool()? {
        npcs.push(Npc::read_homed(handle, version, db)?);
    }
    if version >= 140 {
        while handle.read_bool()? {
            npcs.push(Npc::read_homeless(handle, version, db)?);
        }
    }
    Ok((npcs, shimmered))
}

/// Pre-122 dummy records carry only a position nothing downstream wants.
fn load_dummies(handle: &mut Handle, events: &EventSender) -> Result<()> {
    events.status("Loading Dummies...");
    let num = handle.r32()?.max(0);
    for _ in 0..num {
        handle.r16()?; // x
        handle.r16()?; // y
    }
    Ok(())
}

fn load_entities(handle: &mut Handle, events: &EventSender) -> Result<Vec<Entity>> {
    events.status("Loading Entities...");
    let num = handle.r32()?.max(0);
    let mut entities = Vec::new();
    for _ in 0..num {
        entities.push(Entity::read(handle)?);
    }
    Ok(entities)
}

fn load_pressure_plates(handle: &mut Handle, events: &EventSender) -> Result<()> {
    events.status("Loading Pressure Plates...");
    let num = handle.r32()?.max(0);
    for _ in 0..num {
        handle.r32()?; // x
        handle.r32()?; // y
    }
    Ok(())
}

/// Rooms NPCs return to after death. The NPC records still carry their own
/// home coordinates, so these are consumed and dropped.
fn load_town_manager(handle: &mut Handle, events: &EventSender) -> Result<()> {
    events.status("Loading Town Manager...");
    let num = handle.r32()?.max(0);
    for _ in 0..num {
        handle.r32()?; // npc
        handle.r32()?; // x
        handle.r32()?; // y
    }
    Ok(())
}

fn load_bestiary(
    handle: &mut Handle,
    kills: &mut HashMap<String, i32>,
    seen_species: &mut Vec<String>,
    chat_species: &mut Vec<String>,
    events: &EventSender,
) -> Result<()> {
    events.status("Loading Bestiary...");
    let num_kills = handle.r32()?.max(0);
    for _ in 0..num_kills {
        let npc = handle.rs()?;
        kills.insert(npc, handle.r32()?);
    }
    let num_seen = handle.r32()?.max(0);
    for _ in 0..num_seen {
        seen_species.push(handle.rs()?);
    }
    let num_chat = handle.r32()?.max(0);
    for _ in 0..num_chat {
        chat_species.push(handle.rs()?);
    }
    Ok(())
}
