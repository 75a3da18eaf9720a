//! Terraria World Decoder
//!
//! A Rust library for decoding Terraria world files and the companion
//! per-player map files that record which tiles a player has explored.
//!
//! The decoder reconstructs the full tile grid (run-length encoded,
//! column-major, with per-tile-kind extra data), the header property bag,
//! chests, signs, NPCs, tile entities, and bestiary records, across every
//! file version from the sectioned format onward. Loads run synchronously
//! via [`World::load`] or on a background worker via [`spawn_load`], which
//! streams progress events and supports cooperative cancellation.

pub mod codec;
pub mod error;
pub mod events;
pub mod info;
pub mod loader;
pub mod state;

#[cfg(test)]
mod testutil;

pub use codec::{FieldDesc, FieldKind, Handle, Header, HeaderSchema, ListLen, Tile, TileFlags, Value};
pub use error::{Error, Result};
pub use events::{Event, EventSender};
pub use info::{InfoDb, NpcInfo};
pub use loader::{spawn_load, CancelToken, LoadRequest, LoadTask};
pub use state::{
    Chest, Entity, Item, ItemFrame, LogicSensor, Npc, Sign, TrainingDummy, World,
    HIGHEST_VERSION, MINIMUM_VERSION,
};
