use std::fs::File;
use std::path::{Path, PathBuf};

use memmap2::Mmap;
use tracing::debug;

use crate::error::{AssetError, PackageError};

use super::header::HEADER_LEN;
use super::view::{MeshDataView, VertexFormatView};

/// A package file mapped read-only into memory.
///
/// The mapping is released when this value is dropped, so views borrowed from
/// it cannot outlive it.
pub struct MappedPackage {
    path: PathBuf,
    map: Mmap,
}

impl MappedPackage {
    /// Map the file at `path`.
    pub fn open(path: &Path) -> Result<Self, AssetError> {
        if !path.is_file() {
            return Err(AssetError::MissingAsset(path.to_path_buf()));
        }

        let file = File::open(path).map_err(|e| AssetError::Io(path.to_path_buf(), e))?;
        let len = file
            .metadata()
            .map_err(|e| AssetError::Io(path.to_path_buf(), e))?
            .len();
        if len < HEADER_LEN as u64 {
            return Err(AssetError::CorruptPackage {
                path: path.to_path_buf(),
                source: PackageError::Truncated(len as usize),
            });
        }

        // SAFETY: package files are written once by the converter and only
        // read afterwards; nothing truncates them while they are mapped.
        let map = unsafe { Mmap::map(&file) }.map_err(|e| AssetError::Io(path.to_path_buf(), e))?;

        debug!("Mapped package {} ({} bytes)", path.display(), len);
        Ok(Self {
            path: path.to_path_buf(),
            map,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn bytes(&self) -> &[u8] {
        &self.map
    }

    /// Validate and view the mapping as a vertex format index.
    pub fn vertex_format(&self) -> Result<VertexFormatView<'_>, AssetError> {
        VertexFormatView::parse(&self.map).map_err(|source| self.corrupt(source))
    }

    /// Validate and view the mapping as mesh data.
    pub fn mesh_data(&self) -> Result<MeshDataView<'_>, AssetError> {
        MeshDataView::parse(&self.map).map_err(|source| self.corrupt(source))
    }

    pub fn corrupt(&self, source: PackageError) -> AssetError {
        AssetError::CorruptPackage {
            path: self.path.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::{encode_mesh_data, MeshData};
    use std::fs;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("meshpack-mapped-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn missing_file_is_missing_asset() {
        let dir = temp_dir();
        let result = MappedPackage::open(&dir.join("nope.mpk"));
        assert!(matches!(result, Err(AssetError::MissingAsset(_))));
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn empty_file_is_truncated() {
        let dir = temp_dir();
        let path = dir.join("empty.mpk");
        fs::write(&path, b"").unwrap();
        match MappedPackage::open(&path) {
            Err(AssetError::CorruptPackage { source, .. }) => {
                assert_eq!(source, PackageError::Truncated(0))
            }
            Err(other) => panic!("expected CorruptPackage, got: {:?}", other),
            Ok(_) => panic!("expected CorruptPackage"),
        }
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn mapped_mesh_data_reads_in_place() {
        let dir = temp_dir();
        let path = dir.join("tri.mpk");
        let data = MeshData {
            vertices: vec![7; 24],
            indices: vec![0; 12],
        };
        fs::write(&path, encode_mesh_data(&data)).unwrap();

        let package = MappedPackage::open(&path).unwrap();
        let view = package.mesh_data().unwrap();
        assert_eq!(view.vertices(), data.vertices.as_slice());
        assert!(package.bytes().as_ptr_range().contains(&view.vertices().as_ptr()));

        match package.vertex_format() {
            Err(AssetError::CorruptPackage { path: p, .. }) => assert_eq!(p, path),
            Err(other) => panic!("expected CorruptPackage, got: {:?}", other),
            Ok(_) => panic!("mesh data parsed as a vertex format"),
        }

        drop(package);
        fs::remove_dir_all(dir).unwrap();
    }
}
