//! Borrowed, zero-copy views over package bytes

use std::cmp::Ordering;

use crate::error::PackageError;
use crate::format::{AttributeKind, Format};

use super::encode::{RECORD_LEN, ROOT_LEN};
use super::header::{read_u32, read_u64, Header, HEADER_LEN};
use super::{PackageKind, Span};

/// Read-only view of a vertex format index.
///
/// [`VertexFormatView::parse`] validates the whole file once; the accessors
/// then decode records straight out of the borrowed bytes.
#[derive(Debug, Clone, Copy)]
pub struct VertexFormatView<'a> {
    bytes: &'a [u8],
    attributes: Span,
    meshes: Span,
}

/// One attribute record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeView<'a> {
    pub name: &'a str,
    pub format: Format,
    pub kind: AttributeKind,
    pub offset: u64,
}

/// One mesh record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshEntry<'a> {
    pub name: &'a str,
    pub first_index: u32,
    pub index_count: u32,
    pub vertex_count: u32,
}

impl<'a> VertexFormatView<'a> {
    pub fn parse(bytes: &'a [u8]) -> Result<Self, PackageError> {
        Header::validate(bytes, PackageKind::VertexFormat)?;
        check_range(bytes, HEADER_LEN as u64, ROOT_LEN as u64)?;

        let attributes = read_span(bytes, HEADER_LEN);
        let meshes = read_span(bytes, HEADER_LEN + Span::SIZE);
        check_table(bytes, attributes)?;
        check_table(bytes, meshes)?;

        let view = Self {
            bytes,
            attributes,
            meshes,
        };

        let mut expected = 0u64;
        for i in 0..view.attribute_count() {
            let attribute = decode_attribute(bytes, record_at(attributes, i))?;
            if attribute.offset != expected {
                return Err(PackageError::BrokenLayout {
                    name: attribute.name.to_owned(),
                    offset: attribute.offset,
                    expected,
                });
            }
            expected += attribute.format.size() as u64;
        }

        let mut previous: Option<&str> = None;
        for i in 0..view.mesh_count() {
            let mesh = decode_mesh(bytes, record_at(meshes, i))?;
            if previous.is_some_and(|p| p >= mesh.name) {
                return Err(PackageError::UnsortedMeshTable(mesh.name.to_owned()));
            }
            previous = Some(mesh.name);
        }

        Ok(view)
    }

    pub fn attribute_count(&self) -> usize {
        self.attributes.len as usize
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len as usize
    }

    /// Attributes in offset order.
    pub fn attributes(&self) -> impl ExactSizeIterator<Item = AttributeView<'a>> + 'a {
        let (bytes, table) = (self.bytes, self.attributes);
        (0..self.attribute_count()).map(move |i| attribute_at(bytes, record_at(table, i)))
    }

    /// Meshes in name order.
    pub fn meshes(&self) -> impl ExactSizeIterator<Item = MeshEntry<'a>> + 'a {
        let (bytes, table) = (self.bytes, self.meshes);
        (0..self.mesh_count()).map(move |i| mesh_at(bytes, record_at(table, i)))
    }

    /// Look up a mesh record by binary search over the sorted table.
    pub fn mesh(&self, name: &str) -> Option<MeshEntry<'a>> {
        let (mut low, mut high) = (0, self.mesh_count());
        while low < high {
            let mid = low + (high - low) / 2;
            let entry = mesh_at(self.bytes, record_at(self.meshes, mid));
            match entry.name.cmp(name) {
                Ordering::Equal => return Some(entry),
                Ordering::Less => low = mid + 1,
                Ordering::Greater => high = mid,
            }
        }
        None
    }

    /// Size of one vertex in bytes.
    pub fn stride(&self) -> usize {
        self.attributes().map(|a| a.format.size()).sum()
    }
}

/// Read-only view of one mesh's geometry bytes.
#[derive(Debug, Clone, Copy)]
pub struct MeshDataView<'a> {
    vertices: &'a [u8],
    indices: &'a [u8],
}

impl<'a> MeshDataView<'a> {
    pub fn parse(bytes: &'a [u8]) -> Result<Self, PackageError> {
        Header::validate(bytes, PackageKind::MeshData)?;
        check_range(bytes, HEADER_LEN as u64, ROOT_LEN as u64)?;

        let vertices = read_span(bytes, HEADER_LEN);
        let indices = read_span(bytes, HEADER_LEN + Span::SIZE);
        check_range(bytes, vertices.offset, vertices.len)?;
        check_range(bytes, indices.offset, indices.len)?;
        if indices.len % 4 != 0 {
            return Err(PackageError::RaggedIndices(indices.len));
        }

        Ok(Self {
            vertices: slice(bytes, vertices),
            indices: slice(bytes, indices),
        })
    }

    /// Interleaved vertex bytes.
    pub fn vertices(&self) -> &'a [u8] {
        self.vertices
    }

    /// Index bytes, 32 bits per index.
    pub fn indices(&self) -> &'a [u8] {
        self.indices
    }

    pub fn index_count(&self) -> usize {
        self.indices.len() / 4
    }
}

fn read_span(bytes: &[u8], at: usize) -> Span {
    Span {
        offset: read_u64(bytes, at),
        len: read_u64(bytes, at + 8),
    }
}

fn check_range(bytes: &[u8], offset: u64, len: u64) -> Result<(), PackageError> {
    let out_of_bounds = PackageError::OutOfBounds {
        offset,
        len,
        size: bytes.len(),
    };
    match offset.checked_add(len) {
        Some(end) if end <= bytes.len() as u64 => Ok(()),
        _ => Err(out_of_bounds),
    }
}

fn check_table(bytes: &[u8], table: Span) -> Result<(), PackageError> {
    let size = table
        .len
        .checked_mul(RECORD_LEN as u64)
        .ok_or(PackageError::OutOfBounds {
            offset: table.offset,
            len: table.len,
            size: bytes.len(),
        })?;
    check_range(bytes, table.offset, size)
}

fn record_at(table: Span, index: usize) -> usize {
    table.offset as usize + index * RECORD_LEN
}

/// Slice for a span that has passed [`check_range`].
fn slice(bytes: &[u8], span: Span) -> &[u8] {
    let start = span.offset as usize;
    &bytes[start..start + span.len as usize]
}

fn decode_name(bytes: &[u8], at: usize) -> Result<&str, PackageError> {
    let span = read_span(bytes, at);
    check_range(bytes, span.offset, span.len)?;
    std::str::from_utf8(slice(bytes, span)).map_err(|_| PackageError::InvalidUtf8(span.offset))
}

fn decode_attribute(bytes: &[u8], at: usize) -> Result<AttributeView<'_>, PackageError> {
    let name = decode_name(bytes, at)?;
    let raw_format = read_u32(bytes, at + 16);
    let raw_kind = read_u32(bytes, at + 20);
    Ok(AttributeView {
        name,
        format: Format::from_raw(raw_format).ok_or(PackageError::UnknownFormat(raw_format))?,
        kind: AttributeKind::from_raw(raw_kind)
            .ok_or(PackageError::UnknownAttributeKind(raw_kind))?,
        offset: read_u64(bytes, at + 24),
    })
}

fn decode_mesh(bytes: &[u8], at: usize) -> Result<MeshEntry<'_>, PackageError> {
    Ok(MeshEntry {
        name: decode_name(bytes, at)?,
        first_index: read_u32(bytes, at + 16),
        index_count: read_u32(bytes, at + 20),
        vertex_count: read_u32(bytes, at + 24),
    })
}

// Records are only reachable through a view, and `parse` decoded every one of
// them successfully, so decoding again cannot fail.
fn attribute_at(bytes: &[u8], at: usize) -> AttributeView<'_> {
    match decode_attribute(bytes, at) {
        Ok(attribute) => attribute,
        Err(e) => unreachable!("attribute record validated on parse: {e}"),
    }
}

fn mesh_at(bytes: &[u8], at: usize) -> MeshEntry<'_> {
    match decode_mesh(bytes, at) {
        Ok(mesh) => mesh,
        Err(e) => unreachable!("mesh record validated on parse: {e}"),
    }
}
