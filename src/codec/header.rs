use std::collections::HashMap;

use serde::Deserialize;

use super::Handle;
use crate::error::{Error, Result};

/// A decoded header value. The header is a property bag; which keys exist
/// depends on the file version, so values carry their own kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    U8(u8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
}

impl Value {
    pub fn as_i32(&self) -> Option<i32> {
        match *self {
            Value::Bool(b) => Some(i32::from(b)),
            Value::U8(n) => Some(i32::from(n)),
            Value::I16(n) => Some(i32::from(n)),
            Value::I32(n) => Some(n),
            Value::I64(n) => i32::try_from(n).ok(),
            Value::F32(n) => Some(n as i32),
            Value::F64(n) => Some(n as i32),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::I64(n) => Some(n),
            _ => self.as_i32().map(i64::from),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::F32(n) => Some(f64::from(n)),
            Value::F64(n) => Some(n),
            _ => self.as_i64().map(|n| n as f64),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Value::Bool(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Bool,
    U8,
    I16,
    I32,
    I64,
    F32,
    F64,
    String,
    Guid16,
}

/// Element count of a list field: a literal, or the name of an earlier
/// (numeric) field in the same schema.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ListLen {
    Fixed(u32),
    Field(String),
}

/// One ordered field of the header layout. `since`/`until` gate the field on
/// the file version, inclusive on both ends.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldDesc {
    pub name: String,
    pub kind: FieldKind,
    #[serde(default)]
    pub list: Option<ListLen>,
    #[serde(default)]
    pub since: Option<i32>,
    #[serde(default)]
    pub until: Option<i32>,
}

/// The header layout as data. The decoder walks the table in order and skips
/// fields whose version guard excludes the file being read, so one table
/// serves every supported version.
#[derive(Debug, Clone)]
pub struct HeaderSchema {
    fields: Vec<FieldDesc>,
}

/// Field order of the world header as written since the sectioned format,
/// truncated after the fields anything downstream consumes; the loader seeks
/// to the next section afterwards, so trailing header bytes are never read.
const BUILTIN_SCHEMA: &str = r#"[
    {"name": "worldName", "kind": "string"},
    {"name": "seedText", "kind": "string", "since": 179},
    {"name": "worldGenVersion", "kind": "i64", "since": 179},
    {"name": "guid", "kind": "guid16", "since": 181},
    {"name": "worldID", "kind": "i32"},
    {"name": "leftWorld", "kind": "i32"},
    {"name": "rightWorld", "kind": "i32"},
    {"name": "topWorld", "kind": "i32"},
    {"name": "bottomWorld", "kind": "i32"},
    {"name": "tilesHigh", "kind": "i32"},
    {"name": "tilesWide", "kind": "i32"},
    {"name": "gameMode", "kind": "i32", "since": 209},
    {"name": "drunkWorld", "kind": "bool", "since": 222},
    {"name": "goodWorld", "kind": "bool", "since": 227},
    {"name": "tenthAnniversaryWorld", "kind": "bool", "since": 238},
    {"name": "dontStarveWorld", "kind": "bool", "since": 239},
    {"name": "notTheBeesWorld", "kind": "bool", "since": 241},
    {"name": "remixWorld", "kind": "bool", "since": 249},
    {"name": "noTrapsWorld", "kind": "bool", "since": 266},
    {"name": "zenithWorld", "kind": "bool", "since": 267},
    {"name": "expertMode", "kind": "bool", "since": 112, "until": 208},
    {"name": "creationTime", "kind": "i64", "since": 141},
    {"name": "moonType", "kind": "u8"},
    {"name": "treeX", "kind": "i32", "list": 3},
    {"name": "treeStyle", "kind": "i32", "list": 4},
    {"name": "caveBackX", "kind": "i32", "list": 3},
    {"name": "caveBackStyle", "kind": "i32", "list": 4},
    {"name": "iceBackStyle", "kind": "i32"},
    {"name": "jungleBackStyle", "kind": "i32"},
    {"name": "hellBackStyle", "kind": "i32"},
    {"name": "spawnX", "kind": "i32"},
    {"name": "spawnY", "kind": "i32"},
    {"name": "groundLevel", "kind": "f64"},
    {"name": "rockLevel", "kind": "f64"},
    {"name": "time", "kind": "f64"},
    {"name": "dayTime", "kind": "bool"},
    {"name": "moonPhase", "kind": "i32"},
    {"name": "bloodMoon", "kind": "bool"},
    {"name": "eclipse", "kind": "bool"},
    {"name": "dungeonX", "kind": "i32"},
    {"name": "dungeonY", "kind": "i32"},
    {"name": "crimson", "kind": "bool"}
]"#;

impl HeaderSchema {
    /// The layout shipped with the crate.
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_SCHEMA)
    }

    /// Builds a schema from a JSON field table (same shape as the builtin).
    pub fn from_json(doc: &str) -> Result<Self> {
        let fields: Vec<FieldDesc> = serde_json::from_str(doc).map_err(|e| Error::InitFailure {
            reason: format!("header schema: {e}"),
        })?;
        Ok(Self { fields })
    }

    pub fn fields(&self) -> &[FieldDesc] {
        &self.fields
    }

    /// Reads the header fields admitted by `version`, in table order.
    pub fn decode(&self, handle: &mut Handle, version: i32) -> Result<Header> {
        let mut header = Header::default();
        for field in &self.fields {
            if field.since.is_some_and(|v| version < v)
                || field.until.is_some_and(|v| version > v)
            {
                continue;
            }
            let value = match &field.list {
                None => read_scalar(handle, field.kind)?,
                Some(len) => {
                    let n = match len {
                        ListLen::Fixed(n) => *n as usize,
                        ListLen::Field(name) => {
                            let n = header.get_i32(name)?;
                            usize::try_from(n).map_err(|_| Error::HeaderField {
                                name: name.clone(),
                                problem: "negative list length",
                            })?
                        }
                    };
                    let mut items = Vec::with_capacity(n);
                    for _ in 0..n {
                        items.push(read_scalar(handle, field.kind)?);
                    }
                    Value::List(items)
                }
            };
            header.insert(field.name.clone(), value);
        }
        Ok(header)
    }
}

fn read_scalar(handle: &mut Handle, kind: FieldKind) -> Result<Value> {
    Ok(match kind {
        FieldKind::Bool => Value::Bool(handle.read_bool()?),
        FieldKind::U8 => Value::U8(handle.r8()?),
        FieldKind::I16 => Value::I16(handle.r16()?),
        FieldKind::I32 => Value::I32(handle.r32()?),
        FieldKind::I64 => Value::I64(handle.r64()?),
        FieldKind::F32 => Value::F32(handle.rf()?),
        FieldKind::F64 => Value::F64(handle.rd()?),
        FieldKind::String => Value::Str(handle.rs()?),
        FieldKind::Guid16 => Value::Bytes(handle.read_bytes(16)?.to_vec()),
    })
}

/// The decoded header: string keys, typed values, presence varying by file
/// version.
#[derive(Debug, Clone, Default)]
pub struct Header {
    values: HashMap<String, Value>,
}

impl Header {
    pub fn has(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub(crate) fn insert(&mut self, name: String, value: Value) {
        self.values.insert(name, value);
    }

    pub fn get_i32(&self, name: &str) -> Result<i32> {
        self.get(name)
            .ok_or_else(|| Error::HeaderField {
                name: name.to_owned(),
                problem: "missing",
            })?
            .as_i32()
            .ok_or_else(|| Error::HeaderField {
                name: name.to_owned(),
                problem: "not numeric",
            })
    }

    pub fn get_str(&self, name: &str) -> Result<&str> {
        self.get(name)
            .ok_or_else(|| Error::HeaderField {
                name: name.to_owned(),
                problem: "missing",
            })?
            .as_str()
            .ok_or_else(|| Error::HeaderField {
                name: name.to_owned(),
                problem: "not a string",
            })
    }

    pub fn get_bytes(&self, name: &str) -> Result<&[u8]> {
        self.get(name)
            .ok_or_else(|| Error::HeaderField {
                name: name.to_owned(),
                problem: "missing",
            })?
            .as_bytes()
            .ok_or_else(|| Error::HeaderField {
                name: name.to_owned(),
                problem: "not a byte field",
            })
    }
}
