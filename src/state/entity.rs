use crate::codec::Handle;
use crate::error::{Error, Result};
use crate::info::InfoDb;

/// One occupied chest slot. Display names come from the registry; an id the
/// registry does not know resolves to an empty string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Item {
    pub stack: i16,
    pub name: String,
    pub prefix: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Chest {
    pub x: i32,
    pub y: i32,
    pub name: String,
    pub items: Vec<Item>,
}

impl Chest {
    /// Reads one chest record with `items_per_chest` slots. Empty slots
    /// (stack 0) are a bare count word and contribute no item.
    pub(crate) fn read(handle: &mut Handle, items_per_chest: i16, db: &InfoDb) -> Result<Self> {
        let mut chest = Chest {
            x: handle.r32()?,
            y: handle.r32()?,
            name: handle.rs()?,
            items: Vec::new(),
        };
        for _ in 0..items_per_chest.max(0) {
            let stack = handle.r16()?;
            if stack > 0 {
                let item_id = handle.r32()?;
                let prefix_id = handle.r8()?;
                chest.items.push(Item {
                    stack,
                    name: db.item_name(item_id).unwrap_or_default().to_owned(),
                    prefix: db.prefix_name(prefix_id).unwrap_or_default().to_owned(),
                });
            }
        }
        Ok(chest)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sign {
    pub x: i32,
    pub y: i32,
    pub text: String,
}

impl Sign {
    pub(crate) fn read(handle: &mut Handle) -> Result<Self> {
        Ok(Sign {
            text: handle.rs()?,
            x: handle.r32()?,
            y: handle.r32()?,
        })
    }
}

/// A town NPC. Homed NPCs carry a home position; homeless ones are appended
/// after the homed list with only a position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Npc {
    pub sprite: i32,
    pub head: i32,
    pub title: String,
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub homeless: bool,
    pub home_x: i32,
    pub home_y: i32,
    pub town_variation: Option<i32>,
}

impl Npc {
    /// Newer files key NPCs by sprite id, older ones by title string; the
    /// registry fills in whichever half the file omits.
    fn read_identity(handle: &mut Handle, version: i32, db: &InfoDb, homed: bool) -> Result<Self> {
        let mut npc = Npc::default();
        if version >= 190 {
            npc.sprite = handle.r32()?;
            if let Some(info) = db.npc_by_id(npc.sprite) {
                if homed {
                    npc.head = info.head;
                }
                npc.title = info.title.clone();
            }
        } else {
            npc.title = handle.rs()?;
            if let Some(info) = db.npc_by_title(&npc.title) {
                if homed {
                    npc.head = info.head;
                }
                npc.sprite = info.id;
            }
        }
        Ok(npc)
    }

    pub(crate) fn read_homed(handle: &mut Handle, version: i32, db: &InfoDb) -> Result<Self> {
        let mut npc = Self::read_identity(handle, version, db, true)?;
        npc.name = handle.rs()?;
        npc.x = handle.rf()?;
        npc.y = handle.rf()?;
        npc.homeless = handle.read_bool()?;
        npc.home_x = handle.r32()?;
        npc.home_y = handle.r32()?;
        if version >= 213 && handle.read_bool()? {
            npc.town_variation = Some(handle.r32()?);
        }
        Ok(npc)
    }

    pub(crate) fn read_homeless(handle: &mut Handle, version: i32, db: &InfoDb) -> Result<Self> {
        let mut npc = Self::read_identity(handle, version, db, false)?;
        npc.x = handle.rf()?;
        npc.y = handle.rf()?;
        npc.homeless = true;
        Ok(npc)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrainingDummy {
    pub id: i32,
    pub x: i16,
    pub y: i16,
    pub npc: i16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemFrame {
    pub id: i32,
    pub x: i16,
    pub y: i16,
    pub item_id: i16,
    pub prefix: u8,
    pub stack: i16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogicSensor {
    pub id: i32,
    pub x: i16,
    pub y: i16,
    pub kind: u8,
    pub on: bool,
}

/// Tile entity record. A tag byte outside the known set is a hard error:
/// record lengths differ per kind, so guessing would desynchronize every
/// record after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    TrainingDummy(TrainingDummy),
    ItemFrame(ItemFrame),
    LogicSensor(LogicSensor),
}

impl Entity {
    pub(crate) fn read(handle: &mut Handle) -> Result<Self> {
        let at = handle.pos();
        let kind = handle.r8()?;
        match kind {
            0 => Ok(Entity::TrainingDummy(TrainingDummy {
                id: handle.r32()?,
                x: handle.r16()?,
                y: handle.r16()?,
                npc: handle.r16()?,
            })),
            1 => Ok(Entity::ItemFrame(ItemFrame {
                id: handle.r32()?,
                x: handle.r16()?,
                y: handle.r16()?,
                item_id: handle.r16()?,
                prefix: handle.r8()?,
                stack: handle.r16()?,
            })),
            2 => Ok(Entity::LogicSensor(LogicSensor {
                id: handle.r32()?,
                x: handle.r16()?,
                y: handle.r16()?,
                kind: handle.r8()?,
                on: handle.read_bool()?,
            })),
            _ => Err(Error::UnknownEntityKind { kind, at }),
        }
    }
}
