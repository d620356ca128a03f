use std::path::Path;

use meshpack_core::AssetError;

use crate::mesh::SourceSubMesh;

/// Parses a source model file into sub-meshes.
///
/// The converter checks that the path exists before calling `load`.
pub trait MeshSource {
    fn load(&self, path: &Path) -> Result<Vec<SourceSubMesh>, AssetError>;
}

impl<S: MeshSource + ?Sized> MeshSource for &S {
    fn load(&self, path: &Path) -> Result<Vec<SourceSubMesh>, AssetError> {
        (**self).load(path)
    }
}
