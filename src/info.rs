use std::collections::HashMap;

use serde::Deserialize;

use crate::error::{Error, Result};

/// One NPC definition.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NpcInfo {
    pub id: i32,
    pub head: i32,
    pub title: String,
}

/// Read-only registry consulted during decode: item and prefix display names
/// plus NPC metadata. NPC records live in one arena; the id and title indices
/// both point into it, so a record is never duplicated between them.
#[derive(Debug, Clone, Default)]
pub struct InfoDb {
    npcs: Vec<NpcInfo>,
    items: HashMap<i32, String>,
    prefixes: HashMap<u8, String>,
    npcs_by_id: HashMap<i32, usize>,
    npcs_by_title: HashMap<String, usize>,
    tile_type_count: u16,
}

#[derive(Deserialize)]
struct InfoDoc {
    #[serde(rename = "tileTypeCount", default)]
    tile_type_count: u16,
    #[serde(default)]
    items: HashMap<i32, String>,
    #[serde(default)]
    prefixes: HashMap<u8, String>,
    #[serde(default)]
    npcs: Vec<NpcInfo>,
}

impl InfoDb {
    pub fn new(tile_type_count: u16) -> Self {
        Self {
            tile_type_count,
            ..Self::default()
        }
    }

    /// Builds a registry from a JSON document:
    /// `{"tileTypeCount": N, "items": {...}, "prefixes": {...}, "npcs": [...]}`.
    pub fn from_json(doc: &str) -> Result<Self> {
        let doc: InfoDoc = serde_json::from_str(doc).map_err(|e| Error::InitFailure {
            reason: format!("info registry: {e}"),
        })?;
        let mut db = Self::new(doc.tile_type_count);
        db.items = doc.items;
        db.prefixes = doc.prefixes;
        for npc in doc.npcs {
            db.add_npc(npc);
        }
        Ok(db)
    }

    pub fn add_item(&mut self, id: i32, name: impl Into<String>) {
        self.items.insert(id, name.into());
    }

    pub fn add_prefix(&mut self, id: u8, name: impl Into<String>) {
        self.prefixes.insert(id, name.into());
    }

    pub fn add_npc(&mut self, npc: NpcInfo) {
        let index = self.npcs.len();
        self.npcs_by_id.insert(npc.id, index);
        self.npcs_by_title.insert(npc.title.clone(), index);
        self.npcs.push(npc);
    }

    pub fn item_name(&self, id: i32) -> Option<&str> {
        self.items.get(&id).map(String::as_str)
    }

    pub fn prefix_name(&self, id: u8) -> Option<&str> {
        self.prefixes.get(&id).map(String::as_str)
    }

    pub fn npc_by_id(&self, id: i32) -> Option<&NpcInfo> {
        self.npcs_by_id.get(&id).map(|&i| &self.npcs[i])
    }

    pub fn npc_by_title(&self, title: &str) -> Option<&NpcInfo> {
        self.npcs_by_title.get(title).map(|&i| &self.npcs[i])
    }

    pub fn tile_type_count(&self) -> u16 {
        self.tile_type_count
    }
}
