use super::header::{seal, HEADER_LEN};
use super::{MeshData, PackageKind, Span, VertexFormatData};

/// Size of the root block of both payload kinds: two spans.
pub(super) const ROOT_LEN: usize = 2 * Span::SIZE;

/// Size of one attribute or mesh record.
pub(super) const RECORD_LEN: usize = 32;

/// Alignment of the index buffer inside mesh data files.
pub(super) const INDEX_ALIGN: usize = 8;

/// Serialize a vertex format index.
///
/// Attribute records keep their given order; mesh records follow the map's
/// name order, which is what lets readers binary-search the table. The
/// output depends only on `data`, so re-encoding is byte-identical.
pub fn encode_vertex_format(data: &VertexFormatData) -> Vec<u8> {
    let attribute_table = HEADER_LEN + ROOT_LEN;
    let mesh_table = attribute_table + data.attributes.len() * RECORD_LEN;
    let mut pool = mesh_table + data.meshes.len() * RECORD_LEN;

    let mut out = Vec::with_capacity(pool);
    out.resize(HEADER_LEN, 0);
    put_span(&mut out, attribute_table, data.attributes.len());
    put_span(&mut out, mesh_table, data.meshes.len());

    let mut strings = Vec::new();
    for named in &data.attributes {
        put_span(&mut out, pool, named.name.len());
        pool += named.name.len();
        strings.extend_from_slice(named.name.as_bytes());

        let attribute = named.attribute;
        out.extend_from_slice(&attribute.format.to_raw().to_le_bytes());
        out.extend_from_slice(&attribute.kind.to_raw().to_le_bytes());
        out.extend_from_slice(&u64::from(attribute.offset).to_le_bytes());
    }

    for (name, mesh) in &data.meshes {
        put_span(&mut out, pool, name.len());
        pool += name.len();
        strings.extend_from_slice(name.as_bytes());

        out.extend_from_slice(&mesh.first_index.to_le_bytes());
        out.extend_from_slice(&mesh.index_count.to_le_bytes());
        out.extend_from_slice(&mesh.vertex_count.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
    }

    out.extend_from_slice(&strings);
    seal(out, PackageKind::VertexFormat)
}

/// Serialize one mesh's vertex and index bytes.
pub fn encode_mesh_data(data: &MeshData) -> Vec<u8> {
    let vertices_at = HEADER_LEN + ROOT_LEN;
    let indices_at = align_up(vertices_at + data.vertices.len(), INDEX_ALIGN);

    let mut out = Vec::with_capacity(indices_at + data.indices.len());
    out.resize(HEADER_LEN, 0);
    put_span(&mut out, vertices_at, data.vertices.len());
    put_span(&mut out, indices_at, data.indices.len());
    out.extend_from_slice(&data.vertices);
    out.resize(indices_at, 0);
    out.extend_from_slice(&data.indices);
    seal(out, PackageKind::MeshData)
}

fn put_span(out: &mut Vec<u8>, offset: usize, len: usize) {
    out.extend_from_slice(&(offset as u64).to_le_bytes());
    out.extend_from_slice(&(len as u64).to_le_bytes());
}

fn align_up(value: usize, align: usize) -> usize {
    value.div_ceil(align) * align
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{AttributeKind, Format};
    use crate::package::MeshRecord;
    use crate::recipe::{AttributeRecipe, RecipeEntry};

    fn format_data() -> VertexFormatData {
        let recipe: AttributeRecipe = [
            RecipeEntry::new("inPositions", AttributeKind::Position, Format::R32G32B32Sfloat),
            RecipeEntry::new("inNormals", AttributeKind::Normal, Format::R32G32B32Sfloat),
        ]
        .into_iter()
        .collect();

        let mut data = VertexFormatData {
            attributes: recipe.layout().iter().cloned().collect(),
            ..Default::default()
        };
        data.meshes.insert(
            "sphere".into(),
            MeshRecord {
                first_index: 36,
                index_count: 96,
                vertex_count: 40,
            },
        );
        data.meshes.insert(
            "cube".into(),
            MeshRecord {
                first_index: 0,
                index_count: 36,
                vertex_count: 24,
            },
        );
        data
    }

    #[test]
    fn vertex_format_size_is_predictable() {
        let bytes = encode_vertex_format(&format_data());
        let strings = "inPositions".len() + "inNormals".len() + "cube".len() + "sphere".len();
        assert_eq!(bytes.len(), HEADER_LEN + ROOT_LEN + 4 * RECORD_LEN + strings);
    }

    #[test]
    fn encoding_is_deterministic() {
        let a = encode_vertex_format(&format_data());
        let b = encode_vertex_format(&format_data());
        assert_eq!(a, b);
    }

    #[test]
    fn index_buffer_is_aligned() {
        let data = MeshData {
            vertices: vec![1; 13],
            indices: vec![2; 8],
        };
        let bytes = encode_mesh_data(&data);
        let indices_at = bytes.len() - 8;
        assert_eq!(indices_at % INDEX_ALIGN, 0);
        assert_eq!(&bytes[indices_at..], &[2; 8]);
        assert!(bytes[HEADER_LEN + ROOT_LEN + 13..indices_at]
            .iter()
            .all(|&b| b == 0));
    }
}
