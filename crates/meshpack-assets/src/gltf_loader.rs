use std::path::Path;

use gltf::mesh::Mode;
use meshpack_core::AssetError;
use tracing::debug;

use crate::mesh::SourceSubMesh;
use crate::source::MeshSource;

/// Reads glTF 2.0 files (`.gltf` or `.glb`). Every triangle-list primitive of
/// every mesh becomes one sub-mesh, in document order.
#[derive(Debug, Clone, Copy, Default)]
pub struct GltfSource;

impl MeshSource for GltfSource {
    fn load(&self, path: &Path) -> Result<Vec<SourceSubMesh>, AssetError> {
        load_gltf(path)
    }
}

/// Load a glTF file and extract all primitives as sub-meshes.
pub fn load_gltf(path: &Path) -> Result<Vec<SourceSubMesh>, AssetError> {
    let (document, buffers, _images) = gltf::import(path)
        .map_err(|e| AssetError::SourceLoadFailed(path.to_path_buf(), e.to_string()))?;

    let mut sub_meshes = Vec::new();

    for mesh in document.meshes() {
        let name = mesh.name().unwrap_or("unnamed");

        for primitive in mesh.primitives() {
            if primitive.mode() != Mode::Triangles {
                return Err(AssetError::SourceLoadFailed(
                    path.to_path_buf(),
                    format!(
                        "mesh '{}' primitive {} uses {:?}, only triangle lists are supported",
                        name,
                        primitive.index(),
                        primitive.mode()
                    ),
                ));
            }

            let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

            let positions: Vec<[f32; 3]> = reader
                .read_positions()
                .map(|iter| iter.collect())
                .ok_or_else(|| {
                    AssetError::SourceLoadFailed(
                        path.to_path_buf(),
                        format!("mesh '{}' has a primitive without positions", name),
                    )
                })?;

            let normals: Option<Vec<[f32; 3]>> = reader.read_normals().map(|iter| iter.collect());

            let tex_coords: Option<Vec<[f32; 2]>> = reader
                .read_tex_coords(0)
                .map(|tc| tc.into_f32().collect());

            let colors: Option<Vec<[f32; 4]>> = reader
                .read_colors(0)
                .map(|c| c.into_rgba_f32().collect());

            let tangents: Option<Vec<[f32; 4]>> = reader.read_tangents().map(|t| t.collect());

            let indices: Option<Vec<u32>> = reader
                .read_indices()
                .map(|idx| idx.into_u32().collect());

            sub_meshes.push(SourceSubMesh {
                positions,
                normals,
                tex_coords,
                colors,
                tangents,
                indices,
            });
        }

        debug!("Read mesh '{}' from {}", name, path.display());
    }

    debug!(
        "glTF '{}': {} sub-meshes",
        path.display(),
        sub_meshes.len()
    );

    Ok(sub_meshes)
}
