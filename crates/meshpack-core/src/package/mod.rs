//! Binary package layout
//!
//! A converted folder holds one vertex format index (`format.mpk`) and one
//! mesh data file per mesh (`<mesh>.mpk`). Both share a 24-byte header:
//!
//! ```text
//! 0   magic     [u8; 4] = "MPAK"
//! 4   version   u32
//! 8   kind      u32      1 = vertex format, 2 = mesh data
//! 12  checksum  u32      CRC-32 of every byte after the header
//! 16  length    u64      payload length
//! ```
//!
//! Tables, strings and byte buffers are referenced by [`Span`]s whose offsets
//! are relative to the start of the file, so a mapped file is read in place by
//! adding offsets to its base. Header and table integers are little-endian;
//! vertex and index bytes are stored exactly as they are uploaded.

mod encode;
mod header;
mod mapped;
mod view;

use std::collections::BTreeMap;
use std::fmt;

use crate::recipe::NamedAttribute;

pub use encode::{encode_mesh_data, encode_vertex_format};
pub use header::{Header, HEADER_LEN, MAGIC, VERSION};
pub use mapped::MappedPackage;
pub use view::{AttributeView, MeshDataView, MeshEntry, VertexFormatView};

/// Extension of every package file.
pub const EXTENSION: &str = "mpk";

/// File name of the vertex format index inside a converted folder.
pub const FORMAT_FILE_NAME: &str = "format.mpk";

/// File name of the mesh data for `mesh`.
pub fn mesh_file_name(mesh: &str) -> String {
    format!("{mesh}.{EXTENSION}")
}

/// Whether `name` can be used as a mesh file stem without escaping its folder
/// or colliding with the format index.
pub fn is_valid_mesh_name(name: &str) -> bool {
    !name.is_empty()
        && name != "format"
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}

/// What a package file contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageKind {
    VertexFormat,
    MeshData,
}

impl PackageKind {
    pub fn to_raw(self) -> u32 {
        match self {
            PackageKind::VertexFormat => 1,
            PackageKind::MeshData => 2,
        }
    }
}

impl fmt::Display for PackageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PackageKind::VertexFormat => f.write_str("vertex format"),
            PackageKind::MeshData => f.write_str("mesh data"),
        }
    }
}

/// Byte range inside a package file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub offset: u64,
    pub len: u64,
}

impl Span {
    pub const SIZE: usize = 16;
}

/// Per-mesh record of the vertex format index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MeshRecord {
    /// First index if every mesh of the folder is loaded, in name order.
    pub first_index: u32,
    pub index_count: u32,
    pub vertex_count: u32,
}

/// Owned form of a vertex format index, as built by the converter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VertexFormatData {
    /// Attributes in offset order.
    pub attributes: Vec<NamedAttribute>,
    pub meshes: BTreeMap<String, MeshRecord>,
}

/// Owned form of one mesh's geometry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeshData {
    /// Interleaved vertex records.
    pub vertices: Vec<u8>,
    /// 32-bit indices.
    pub indices: Vec<u8>,
}
