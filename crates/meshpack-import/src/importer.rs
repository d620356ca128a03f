use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use meshpack_core::{AssetError, BufferKind};
use tracing::{info, warn};

use crate::folder::{check_capacity, MeshFolderImporter};
use crate::planner::{MeshDrawPlanner, MeshFormatGroup};

/// Imports requested meshes from every converted folder under a root.
///
/// Each immediate subdirectory is one folder with its own vertex layout.
/// Folders are registered in name order and each one gets a contiguous
/// region of the shared buffers, directly after the previous folder's.
#[derive(Debug)]
pub struct MeshImporter {
    root: PathBuf,
    folders: Vec<MeshFolderImporter>,
}

impl MeshImporter {
    pub fn open<S: AsRef<str>>(root: impl AsRef<Path>, requested: &[S]) -> Result<Self, AssetError> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(AssetError::MissingAsset(root));
        }

        let mut subfolders = Vec::new();
        for entry in fs::read_dir(&root).map_err(|e| AssetError::Io(root.clone(), e))? {
            let path = entry.map_err(|e| AssetError::Io(root.clone(), e))?.path();
            if path.is_dir() {
                subfolders.push(path);
            }
        }
        subfolders.sort();

        let mut owners: BTreeMap<String, PathBuf> = BTreeMap::new();
        let mut folders = Vec::with_capacity(subfolders.len());
        for path in subfolders {
            let folder = MeshFolderImporter::open(&path, requested)?;
            for name in folder.mesh_names() {
                if let Some(first) = owners.insert(name.to_owned(), path.clone()) {
                    return Err(AssetError::DuplicateMesh {
                        name: name.to_owned(),
                        first: first.display().to_string(),
                        second: path.display().to_string(),
                    });
                }
            }
            folders.push(folder);
        }

        let wanted: BTreeSet<&str> = requested.iter().map(AsRef::as_ref).collect();
        for name in wanted {
            if !owners.contains_key(name) {
                warn!("Mesh '{}' was requested but no folder contains it", name);
            }
        }

        info!(
            "Mesh importer on {}: {} folders, {} meshes",
            root.display(),
            folders.len(),
            owners.len()
        );

        Ok(Self { root, folders })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Folder names in registration order.
    pub fn folder_names(&self) -> impl Iterator<Item = &str> {
        self.folders.iter().map(MeshFolderImporter::name)
    }

    pub fn size_for_vertices(&self) -> usize {
        self.folders
            .iter()
            .map(MeshFolderImporter::size_for_vertices)
            .sum()
    }

    pub fn size_for_indices(&self) -> usize {
        self.folders
            .iter()
            .map(MeshFolderImporter::size_for_indices)
            .sum()
    }

    /// Load every folder into its region of `vertices` and `indices` and
    /// return a planner over the loaded meshes.
    pub fn load(
        self,
        vertices: &mut [u8],
        indices: &mut [u8],
    ) -> Result<MeshDrawPlanner, AssetError> {
        check_capacity(BufferKind::Vertex, self.size_for_vertices(), vertices.len())?;
        check_capacity(BufferKind::Index, self.size_for_indices(), indices.len())?;

        let mut bases = Vec::with_capacity(self.folders.len());
        let (mut vertex_offset, mut index_offset) = (0usize, 0usize);
        for folder in &self.folders {
            bases.push((vertex_offset, index_offset));
            vertex_offset += folder.size_for_vertices();
            index_offset += folder.size_for_indices();
        }

        let mut planner = MeshDrawPlanner::new();
        let mut vertices_left = vertices;
        let mut indices_left = indices;

        for (folder, (vertex_offset, index_offset)) in self.folders.into_iter().zip(bases) {
            let (folder_vertices, rest) =
                std::mem::take(&mut vertices_left).split_at_mut(folder.size_for_vertices());
            vertices_left = rest;
            let (folder_indices, rest) =
                std::mem::take(&mut indices_left).split_at_mut(folder.size_for_indices());
            indices_left = rest;

            let name = folder.name().to_owned();
            info!(
                "Loading folder '{}' at vertex byte {} and index byte {}",
                name, vertex_offset, index_offset
            );

            let loaded = folder.load(folder_vertices, folder_indices)?;
            let format = planner.push_format(MeshFormatGroup::new(
                name,
                loaded.layout,
                vertex_offset,
                index_offset,
            ));
            for (mesh, draw) in loaded.meshes {
                planner.insert_mesh(mesh, draw, format)?;
            }
        }

        Ok(planner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_root_is_missing_asset() {
        let root = std::env::temp_dir().join(format!("meshpack-absent-{}", uuid::Uuid::new_v4()));
        match MeshImporter::open(&root, &["cube"]) {
            Err(AssetError::MissingAsset(path)) => assert_eq!(path, root),
            other => panic!("expected MissingAsset, got: {:?}", other),
        }
    }

    #[test]
    fn empty_root_has_nothing_to_load() {
        let root = std::env::temp_dir().join(format!("meshpack-empty-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&root).unwrap();

        let importer = MeshImporter::open(&root, &["cube"]).unwrap();
        assert_eq!(importer.size_for_vertices(), 0);
        assert_eq!(importer.size_for_indices(), 0);
        let planner = importer.load(&mut [], &mut []).unwrap();
        assert!(planner.format_groups().is_empty());
        assert!(!planner.contains("cube"));

        fs::remove_dir_all(root).unwrap();
    }
}
