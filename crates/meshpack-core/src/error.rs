use std::fmt;
use std::path::PathBuf;

use crate::format::{AttributeKind, Format};
use crate::package::PackageKind;

/// Errors raised by the conversion and import pipeline.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("asset not found: {0}")]
    MissingAsset(PathBuf),

    #[error("corrupt package '{path}': {source}")]
    CorruptPackage {
        path: PathBuf,
        #[source]
        source: PackageError,
    },

    #[error("attribute '{attribute}' uses format {format}, which has no encoding")]
    UnsupportedFormat { attribute: String, format: Format },

    #[error("unknown mesh '{0}'")]
    UnknownMesh(String),

    #[error("{buffer} buffer too small: need {required} bytes, have {available}")]
    BufferTooSmall {
        buffer: BufferKind,
        required: usize,
        available: usize,
    },

    #[error("I/O error on '{0}': {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("failed to load source mesh '{0}': {1}")]
    SourceLoadFailed(PathBuf, String),

    #[error("source '{path}' has no {kind} data for attribute '{attribute}'")]
    MissingSourceAttribute {
        path: PathBuf,
        attribute: String,
        kind: AttributeKind,
    },

    #[error("invalid mesh name '{0}'")]
    InvalidMeshName(String),

    #[error("mesh '{0}' does not fit in 32-bit vertex and index addressing")]
    IndexOverflow(String),

    #[error("mesh '{name}' is defined more than once ({first} and {second})")]
    DuplicateMesh {
        name: String,
        first: String,
        second: String,
    },

    #[error("recipe cannot change after meshes have been loaded")]
    RecipeLocked,

    #[error("recipe has no attributes")]
    EmptyRecipe,
}

/// Which destination buffer a size check refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferKind {
    Vertex,
    Index,
}

impl fmt::Display for BufferKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BufferKind::Vertex => f.write_str("vertex"),
            BufferKind::Index => f.write_str("index"),
        }
    }
}

/// Reasons a package file fails validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PackageError {
    #[error("{0} bytes is shorter than the package header")]
    Truncated(usize),

    #[error("bad magic {0:?}")]
    BadMagic([u8; 4]),

    #[error("unsupported package version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("expected a {expected} package, found kind code {found}")]
    WrongKind { expected: PackageKind, found: u32 },

    #[error("checksum mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    ChecksumMismatch { stored: u32, computed: u32 },

    #[error("header declares {declared} payload bytes, file has {actual}")]
    LengthMismatch { declared: u64, actual: u64 },

    #[error("range {offset}+{len} lies outside the {size}-byte package")]
    OutOfBounds { offset: u64, len: u64, size: usize },

    #[error("string at offset {0} is not valid UTF-8")]
    InvalidUtf8(u64),

    #[error("unknown vertex format code {0}")]
    UnknownFormat(u32),

    #[error("unknown attribute kind code {0}")]
    UnknownAttributeKind(u32),

    #[error("mesh table is not sorted at '{0}'")]
    UnsortedMeshTable(String),

    #[error("attribute '{name}' starts at byte {offset}, expected {expected}")]
    BrokenLayout {
        name: String,
        offset: u64,
        expected: u64,
    },

    #[error("vertex or index counts of mesh '{0}' overflow the folder totals")]
    CountOverflow(String),

    #[error("index buffer of {0} bytes is not a whole number of indices")]
    RaggedIndices(u64),

    #[error("mesh data holds {actual_vertices}/{actual_indices} vertex/index bytes, format index expects {expected_vertices}/{expected_indices}")]
    RecordMismatch {
        expected_vertices: usize,
        expected_indices: usize,
        actual_vertices: usize,
        actual_indices: usize,
    },
}
