use serde::Serialize;

/// Size of one index in bytes. Indices are always 32-bit.
pub const INDEX_SIZE: usize = std::mem::size_of::<u32>();

/// Everything needed to issue one indexed draw call for a mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct MeshDrawInfo {
    /// First index, in index units.
    pub first_index: u32,
    pub index_count: u32,
    /// First vertex of the mesh, relative to its format group's vertex region.
    /// Index values are mesh-local, so this is the base vertex of the draw.
    pub vertex_offset: u32,
}

impl MeshDrawInfo {
    pub fn new(first_index: u32, index_count: u32, vertex_offset: u32) -> Self {
        Self {
            first_index,
            index_count,
            vertex_offset,
        }
    }

    /// Same draw with `first_index` moved by `indices`, or `None` if the
    /// result no longer fits a 32-bit index.
    pub fn shifted(self, indices: usize) -> Option<Self> {
        let indices = u32::try_from(indices).ok()?;
        Some(Self {
            first_index: self.first_index.checked_add(indices)?,
            ..self
        })
    }
}
