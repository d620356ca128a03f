use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use meshpack_core::package::{mesh_file_name, MappedPackage, FORMAT_FILE_NAME};
use meshpack_core::{
    AssetError, BufferKind, MeshDrawInfo, NamedAttribute, PackageError, VertexAttribute,
    VertexLayout, INDEX_SIZE,
};
use tracing::{debug, info};

/// Result of loading one folder: draw info per mesh, local to the folder's
/// regions of the destination buffers, and the folder's vertex layout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderMeshes {
    pub meshes: BTreeMap<String, MeshDrawInfo>,
    pub layout: VertexLayout,
}

#[derive(Debug, Clone)]
struct RetainedMesh {
    name: String,
    draw: MeshDrawInfo,
    vertex_bytes: usize,
    index_bytes: usize,
}

/// Importer for one converted folder, restricted to a set of requested meshes.
///
/// Retained meshes are packed in name order; their draw info is assigned from
/// that packing when the folder is opened, so sizing is known before any
/// geometry is read.
#[derive(Debug)]
pub struct MeshFolderImporter {
    folder: PathBuf,
    name: String,
    layout: VertexLayout,
    meshes: Vec<RetainedMesh>,
    size_for_vertices: usize,
    size_for_indices: usize,
}

impl MeshFolderImporter {
    /// Open `folder` and keep only the meshes named in `requested`. Names the
    /// folder does not contain are ignored.
    pub fn open<S: AsRef<str>>(
        folder: impl Into<PathBuf>,
        requested: &[S],
    ) -> Result<Self, AssetError> {
        let folder = folder.into();
        let format_path = folder.join(FORMAT_FILE_NAME);
        if !format_path.is_file() {
            return Err(AssetError::MissingAsset(format_path));
        }

        info!("Load mesh format: {}", format_path.display());

        let package = MappedPackage::open(&format_path)?;
        let view = package.vertex_format()?;

        let layout = VertexLayout::from_attributes(
            view.attributes()
                .map(|a| {
                    debug!("Attribute {}: {} at offset {}", a.name, a.format, a.offset);
                    NamedAttribute {
                        name: a.name.to_owned(),
                        attribute: VertexAttribute {
                            format: a.format,
                            kind: a.kind,
                            offset: a.offset as u32,
                        },
                    }
                })
                .collect(),
        );
        let stride = layout.stride();

        let wanted: BTreeSet<&str> = requested.iter().map(AsRef::as_ref).collect();
        let mut meshes = Vec::new();
        let (mut first_index, mut first_vertex) = (0u32, 0u32);
        let (mut size_for_vertices, mut size_for_indices) = (0usize, 0usize);

        for name in wanted {
            let Some(entry) = view.mesh(name) else {
                continue;
            };
            debug!("Found mesh: {}", name);

            let overflow = || package.corrupt(PackageError::CountOverflow(name.to_owned()));
            let vertex_bytes = (entry.vertex_count as usize)
                .checked_mul(stride)
                .ok_or_else(overflow)?;
            let index_bytes = (entry.index_count as usize)
                .checked_mul(INDEX_SIZE)
                .ok_or_else(overflow)?;
            meshes.push(RetainedMesh {
                name: name.to_owned(),
                draw: MeshDrawInfo::new(first_index, entry.index_count, first_vertex),
                vertex_bytes,
                index_bytes,
            });

            first_index = first_index
                .checked_add(entry.index_count)
                .ok_or_else(overflow)?;
            first_vertex = first_vertex
                .checked_add(entry.vertex_count)
                .ok_or_else(overflow)?;
            size_for_vertices = size_for_vertices
                .checked_add(vertex_bytes)
                .ok_or_else(overflow)?;
            size_for_indices = size_for_indices
                .checked_add(index_bytes)
                .ok_or_else(overflow)?;
        }

        let name = folder
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        info!(
            "Folder '{}': {} of {} meshes retained, {} vertex bytes, {} index bytes",
            name,
            meshes.len(),
            view.mesh_count(),
            size_for_vertices,
            size_for_indices
        );

        Ok(Self {
            folder,
            name,
            layout,
            meshes,
            size_for_vertices,
            size_for_indices,
        })
    }

    /// Folder name, which is also the name of its format group.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.folder
    }

    pub fn layout(&self) -> &VertexLayout {
        &self.layout
    }

    /// Bytes of vertex data the retained meshes occupy.
    pub fn size_for_vertices(&self) -> usize {
        self.size_for_vertices
    }

    /// Bytes of index data the retained meshes occupy.
    pub fn size_for_indices(&self) -> usize {
        self.size_for_indices
    }

    /// Retained mesh names, in packing order.
    pub fn mesh_names(&self) -> impl Iterator<Item = &str> {
        self.meshes.iter().map(|m| m.name.as_str())
    }

    pub fn contains(&self, mesh: &str) -> bool {
        self.meshes.iter().any(|m| m.name == mesh)
    }

    /// Copy every retained mesh into the front of `vertices` and `indices`.
    ///
    /// Both buffers are checked against the folder totals before anything is
    /// read or written.
    pub fn load(self, vertices: &mut [u8], indices: &mut [u8]) -> Result<FolderMeshes, AssetError> {
        check_capacity(BufferKind::Vertex, self.size_for_vertices, vertices.len())?;
        check_capacity(BufferKind::Index, self.size_for_indices, indices.len())?;

        info!("Loading vertices and indices of '{}' to buffer", self.name);

        let (mut vertex_cursor, mut index_cursor) = (0usize, 0usize);
        let mut draws = BTreeMap::new();

        for mesh in self.meshes {
            let path = self.folder.join(mesh_file_name(&mesh.name));
            debug!("Import mesh from: {}", path.display());

            let package = MappedPackage::open(&path)?;
            let data = package.mesh_data()?;
            if data.vertices().len() != mesh.vertex_bytes || data.indices().len() != mesh.index_bytes
            {
                return Err(package.corrupt(PackageError::RecordMismatch {
                    expected_vertices: mesh.vertex_bytes,
                    expected_indices: mesh.index_bytes,
                    actual_vertices: data.vertices().len(),
                    actual_indices: data.indices().len(),
                }));
            }

            vertices[vertex_cursor..vertex_cursor + mesh.vertex_bytes]
                .copy_from_slice(data.vertices());
            indices[index_cursor..index_cursor + mesh.index_bytes].copy_from_slice(data.indices());
            vertex_cursor += mesh.vertex_bytes;
            index_cursor += mesh.index_bytes;

            draws.insert(mesh.name, mesh.draw);
        }

        Ok(FolderMeshes {
            meshes: draws,
            layout: self.layout,
        })
    }
}

pub(crate) fn check_capacity(
    buffer: BufferKind,
    required: usize,
    available: usize,
) -> Result<(), AssetError> {
    if available < required {
        return Err(AssetError::BufferTooSmall {
            buffer,
            required,
            available,
        });
    }
    Ok(())
}
