pub mod entity;
pub mod world;

pub use entity::{Chest, Entity, Item, ItemFrame, LogicSensor, Npc, Sign, TrainingDummy};
pub use world::{World, HIGHEST_VERSION, MINIMUM_VERSION};
