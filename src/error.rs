#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("unsupported map version {found} (newest supported is {highest})")]
    UnsupportedVersion { found: i32, highest: i32 },

    #[error("map version {found} is older than the oldest supported ({minimum})")]
    VersionTooOld { found: i32, minimum: i32 },

    #[error("not a relogic map file")]
    NotARelogicMap,

    #[error("wrong file type byte")]
    NotAMapFile,

    #[error("unexpected end of data at offset {at} ({needed} bytes needed)")]
    UnexpectedEof { at: u64, needed: u64 },

    #[error("invalid UTF-8 in string at offset {at}")]
    InvalidUtf8 { at: u64 },

    #[error("string length prefix overflows at offset {at}")]
    InvalidLength { at: u64 },

    #[error("tile run overruns the grid at column {x}, row {y}")]
    CorruptTileStream { x: i32, y: i32 },

    #[error("unknown entity kind {kind} at offset {at}")]
    UnknownEntityKind { kind: u8, at: u64 },

    #[error("seen-map run overruns the grid at offset {at}")]
    CorruptPlayerMap { at: u64 },

    #[error("player map inflate failed")]
    DeflateFailed,

    #[error("init failed: {reason}")]
    InitFailure { reason: String },

    #[error("section table has no entry {index}")]
    MissingSection { index: usize },

    #[error("header field {name}: {problem}")]
    HeaderField { name: String, problem: &'static str },

    #[error("load cancelled")]
    Cancelled,

    #[error("io error: {0}")]
    Io(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
